//! Template interpolation for URLs and request paths
//!
//! Handles `{{ variable }}` interpolation in the base URL and in child stream
//! path templates. Supports nested access like `{{ config.account_name }}`
//! and `{{ parent_id }}`.

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template regex is valid")
});

/// Placeholder accepted in legacy path templates, e.g. `accounts/{}/invoices`
const LEGACY_PLACEHOLDER: &str = "{}";

/// Values a template can refer to
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Tap configuration values
    pub config: Value,
    /// Identifier of the parent record when rendering a child path
    pub parent_id: Option<Value>,
}

impl TemplateContext {
    /// Context exposing the tap configuration
    pub fn with_config(config: Value) -> Self {
        Self {
            config,
            parent_id: None,
        }
    }

    /// Context for rendering a child path
    pub fn with_parent_id(parent_id: Value) -> Self {
        Self {
            config: Value::Null,
            parent_id: Some(parent_id),
        }
    }

    /// Resolve a dotted name; bare names are looked up in the config
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut parts = name.split('.');
        match parts.next()? {
            "parent_id" => self.parent_id.as_ref().filter(|_| parts.next().is_none()),
            "config" => lookup(&self.config, parts),
            first => lookup(&self.config, std::iter::once(first).chain(parts)),
        }
    }
}

fn lookup<'a, 'p>(value: &'a Value, path: impl IntoIterator<Item = &'p str>) -> Option<&'a Value> {
    path.into_iter()
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Render a template string with the given context
///
/// Every undefined variable is reported in one error.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut undefined = Vec::new();
    let rendered = TEMPLATE_REGEX.replace_all(template, |caps: &Captures<'_>| {
        let name = &caps[1];
        if let Some(value) = ctx.get(name) {
            substitution(value)
        } else {
            undefined.push(name.to_string());
            String::new()
        }
    });

    if undefined.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(undefined.join(", ")))
    }
}

/// Render a child stream path, substituting the parent record's id
///
/// Both `{{ parent_id }}` and a bare `{}` placeholder are accepted.
pub fn render_path(template: &str, parent_id: &Value) -> Result<String> {
    let rendered = render(template, &TemplateContext::with_parent_id(parent_id.clone()))?;
    Ok(rendered.replace(LEGACY_PLACEHOLDER, &substitution(parent_id)))
}

/// Check if a path template has a slot for a parent id
pub fn has_parent_slot(s: &str) -> bool {
    s.contains(LEGACY_PLACEHOLDER) || variables(s).any(|v| v == "parent_id")
}

/// Variable names used by a template, in order
pub fn variables(template: &str) -> impl Iterator<Item = &str> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
}

/// Text substituted for a JSON value
fn substitution(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_substitution() {
        let ctx = TemplateContext::with_config(json!({
            "server_subdomain": "ws",
            "account_name": "acme"
        }));

        let result = render(
            "https://{{ config.server_subdomain }}.saasoptics.com/{{ config.account_name }}/api/v1.0",
            &ctx,
        )
        .unwrap();
        assert_eq!(result, "https://ws.saasoptics.com/acme/api/v1.0");
    }

    #[test]
    fn test_bare_name_resolves_config() {
        let ctx = TemplateContext::with_config(json!({"account_name": "acme"}));
        assert_eq!(render("/{{ account_name }}/", &ctx).unwrap(), "/acme/");
    }

    #[test]
    fn test_undefined_variables_reported_together() {
        let ctx = TemplateContext::with_config(json!({"a": 1}));
        let err = render("{{ config.missing }}/{{ a }}/{{ other }}", &ctx).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("config.missing, other"), "{message}");
    }

    #[test]
    fn test_render_path_with_parent_id() {
        assert_eq!(
            render_path("accounts/{{ parent_id }}/invoices", &json!(42)).unwrap(),
            "accounts/42/invoices"
        );
        assert_eq!(
            render_path("accounts/{}/invoices", &json!("a-1")).unwrap(),
            "accounts/a-1/invoices"
        );
    }

    #[test]
    fn test_parent_id_has_no_fields() {
        let ctx = TemplateContext::with_parent_id(json!({"id": 1}));
        assert!(ctx.get("parent_id.id").is_none());
    }

    #[test]
    fn test_has_parent_slot() {
        assert!(has_parent_slot("a/{{ parent_id }}/b"));
        assert!(has_parent_slot("a/{}/b"));
        assert!(!has_parent_slot("a/b"));
        assert!(!has_parent_slot("a/{{ config.x }}/b"));
    }

    #[test]
    fn test_whitespace_in_template() {
        let ctx = TemplateContext::with_config(json!({"key": "value"}));

        assert_eq!(render("{{config.key}}", &ctx).unwrap(), "value");
        assert_eq!(render("{{ config.key }}", &ctx).unwrap(), "value");
        assert_eq!(render("{{  config.key  }}", &ctx).unwrap(), "value");
    }

    #[test]
    fn test_scalar_substitution() {
        let ctx = TemplateContext::with_config(json!({"limit": 100, "enabled": true}));
        let result = render("limit={{ limit }}&enabled={{ config.enabled }}", &ctx).unwrap();
        assert_eq!(result, "limit=100&enabled=true");
    }
}
