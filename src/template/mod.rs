//! Jinja2-compatible template rendering
//!
//! Every document this crate produces (the Bottlerocket settings sections, the
//! admin container user-data and the cloud-config handed to the bootstrap
//! container) is rendered through a minijinja [`Environment`] built here.
//!
//! Environments are cheap and built per render; nothing is cached between
//! calls.

use crate::BootstrapError;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use tracing::debug;

/// A named template source compiled into the binary
pub type NamedTemplate = (&'static str, &'static str);

/// Create an environment configured for user-data rendering
///
/// - undefined variables are an error instead of rendering as empty
/// - the template source is emitted byte for byte, trailing newline included
/// - `yaml_indent(n)` is available to nest text inside YAML block scalars
pub fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.add_filter("yaml_indent", yaml_indent);
    env
}

/// Register templates, failing on the first one that does not parse
pub fn add_templates(
    env: &mut Environment<'static>,
    templates: &[NamedTemplate],
) -> Result<(), BootstrapError> {
    for &(name, source) in templates {
        env.add_template(name, source)
            .map_err(|e| BootstrapError::template_parse(name, e))?;
    }
    Ok(())
}

/// Render a registered template by name
pub fn render<S: Serialize>(
    env: &Environment<'_>,
    name: &str,
    ctx: S,
) -> Result<String, BootstrapError> {
    debug!("Rendering template: {}", name);

    let tmpl = env
        .get_template(name)
        .map_err(|e| BootstrapError::template_render(name, e))?;

    tmpl.render(ctx)
        .map_err(|e| BootstrapError::template_render(name, e))
}

/// Prefix every line of `value` with `width` spaces
///
/// Blank lines are padded too, so a trailing newline in `value` yields a
/// final line of spaces. YAML block scalars treat it as empty.
pub fn yaml_indent(value: String, width: usize) -> String {
    let pad = " ".repeat(width);
    let mut out = String::with_capacity(value.len() + pad.len());
    for (i, line) in value.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&pad);
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_yaml_indent() {
        assert_eq!(yaml_indent("a: 1\nb: 2".to_string(), 2), "  a: 1\n  b: 2");
        assert_eq!(yaml_indent("a\n".to_string(), 4), "    a\n    ");
        assert_eq!(yaml_indent(String::new(), 3), "   ");
    }

    #[test]
    fn test_render_keeps_trailing_newline() {
        let mut env = environment();
        add_templates(&mut env, &[("greeting", "hello {{ name }}\n")]).unwrap();

        let rendered = render(&env, "greeting", context! { name => "node" }).unwrap();
        assert_eq!(rendered, "hello node\n");
    }

    #[test]
    fn test_render_indent_filter() {
        let mut env = environment();
        add_templates(&mut env, &[("block", "content: |\n{{ body | yaml_indent(6) }}")])
            .unwrap();

        let rendered = render(&env, "block", context! { body => "x: 1\ny: 2" }).unwrap();
        assert_eq!(rendered, "content: |\n      x: 1\n      y: 2");
    }

    #[test]
    fn test_render_include_shares_context() {
        let mut env = environment();
        add_templates(
            &mut env,
            &[
                ("inner", "[{{ value }}]"),
                ("outer", "{% include \"inner\" %}!"),
            ],
        )
        .unwrap();

        let rendered = render(&env, "outer", context! { value => "v" }).unwrap();
        assert_eq!(rendered, "[v]!");
    }

    #[test]
    fn test_parse_error_names_template() {
        let mut env = environment();
        let err = add_templates(&mut env, &[("broken", "value: {{ invalid")]).unwrap_err();

        assert!(matches!(err, BootstrapError::TemplateParse { .. }));
        assert_eq!(err.template_name(), Some("broken"));
    }

    #[test]
    fn test_missing_variable_is_error() {
        let mut env = environment();
        add_templates(&mut env, &[("strict", "value: {{ missing_var }}")]).unwrap();

        let err = render(&env, "strict", context! {}).unwrap_err();
        assert!(matches!(err, BootstrapError::TemplateRender { .. }));
        assert_eq!(err.template_name(), Some("strict"));
    }

    #[test]
    fn test_unknown_template_is_error() {
        let env = environment();
        let err = render(&env, "nope", context! {}).unwrap_err();
        assert_eq!(err.template_name(), Some("nope"));
    }
}
