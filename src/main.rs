//! bottlerocket-userdata - render Bottlerocket user-data for kubeadm nodes
//!
//! Reads a bootstrap request (YAML or JSON) and writes the TOML settings
//! document to stdout or a file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bottlerocket_userdata::config::loader::load_request;
use bottlerocket_userdata::manifest::{KUBE_VIP_MANIFEST_PATH, patch_manifest};
use bottlerocket_userdata::render_request;

#[derive(Parser)]
#[command(name = "bottlerocket-userdata")]
#[command(author, version, about = "Render Bottlerocket user-data for kubeadm nodes", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render user-data for a bootstrap request
    Render {
        /// Request document (YAML or JSON)
        #[arg(short, long, env = "BOTTLEROCKET_USERDATA_REQUEST")]
        input: PathBuf,

        /// Write the user-data here instead of stdout
        #[arg(short, long, env = "BOTTLEROCKET_USERDATA_OUTPUT")]
        output: Option<PathBuf>,
    },
    /// Apply the kube-vip hostPath patch to a manifest and print the result
    PatchManifest {
        /// kube-vip static pod manifest
        manifest: PathBuf,
    },
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG overrides -v
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // stdout carries the rendered document
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

async fn write_output(output: Option<&PathBuf>, data: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(path) => fs::write(path, data)
            .await
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(data).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render { input, output } => {
            let mut request = load_request(&input)
                .await
                .with_context(|| format!("failed to load request {}", input.display()))?;
            let userdata = render_request(&mut request)
                .with_context(|| format!("failed to render {} user-data", request.node.flow()))?;

            write_output(output.as_ref(), &userdata).await?;
            info!("Rendered {} bytes of user-data", userdata.len());
        }
        Commands::PatchManifest { manifest } => {
            let content = fs::read_to_string(&manifest)
                .await
                .with_context(|| format!("failed to read {}", manifest.display()))?;
            let patched = patch_manifest(KUBE_VIP_MANIFEST_PATH, &content)?;

            write_output(None, patched.as_bytes()).await?;
        }
    }

    Ok(())
}
