//! Page bridge script loader and call builder.

use serde_json::Value;

/// Binding the page calls with the kind of each observed mutation.
pub(crate) const MUTATION_BINDING: &str = "__cordialMutation";

/// Binding the page calls when the user asks for a rewrite.
pub(crate) const TRIGGER_BINDING: &str = "__cordialTrigger";

/// The bridge JavaScript. Evaluating it twice is harmless.
pub(crate) fn bridge_script() -> &'static str {
    include_str!("bridge_script.js")
}

/// Expression calling `window.__cordial.<method>` with JSON-encoded arguments.
pub(crate) fn bridge_call(method: &str, args: &[Value]) -> String {
    let args = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("window.__cordial.{}({})", method, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_reports_through_bindings() {
        let script = bridge_script();
        assert!(script.contains(MUTATION_BINDING));
        assert!(script.contains(TRIGGER_BINDING));
        assert!(script.contains("return 'present'"));
    }

    #[test]
    fn test_bridge_call_encodes_arguments() {
        assert_eq!(
            bridge_call("query", &[json!("div[role=\"textbox\"]")]),
            r#"window.__cordial.query("div[role=\"textbox\"]")"#
        );
        assert_eq!(
            bridge_call("setInnerHTML", &[json!(4), json!("a<br>b\n`${x}`")]),
            r#"window.__cordial.setInnerHTML(4, "a<br>b\n`${x}`")"#
        );
        assert_eq!(bridge_call("installTriggers", &[]), "window.__cordial.installTriggers()");
    }
}
