//! The fixed helper set available to every compiled template.
//!
//! Helpers are registered as minijinja filters. The set is closed: templates
//! cannot register their own, and a template that references an unknown
//! filter fails to compile (see [`crate::CompiledTemplate::compile`]).
//!
//! | Helper | Usage | Result |
//! |--------|-------|--------|
//! | `quote` | `{{ path \| quote }}` | TOML basic string, `none` becomes `""` |
//! | `toml_bool` | `{{ flag \| toml_bool }}` | `true` or `false` |
//! | `absolute_url` | `{{ url \| absolute_url }}` | the URL, or a render error |
//! | `deschemify` | `{{ url \| deschemify }}` | `host[:port]` of an http(s) URL |
//! | `to_json` | `{{ value \| to_json }}` | compact JSON |

use minijinja::{Environment, Error, ErrorKind, Value};
use once_cell::sync::Lazy;
use regex::Regex;

/// Names of all helpers registered by [`register_helpers`].
pub const HELPER_NAMES: &[&str] = &["quote", "toml_bool", "absolute_url", "deschemify", "to_json"];

static ABSOLUTE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").expect("absolute url pattern")
});

static HTTP_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(?:[^@/?#]*@)?([^/?#]*)").expect("http host pattern"));

/// Registers the helper set on a minijinja environment.
pub fn register_helpers(env: &mut Environment<'static>) {
    env.add_filter("quote", |value: Value| -> String {
        quote_toml(&plain_text(&value))
    });

    env.add_filter("toml_bool", |value: Value| -> String {
        value.is_true().to_string()
    });

    env.add_filter("absolute_url", |value: Value| -> Result<String, Error> {
        let text = plain_text(&value);
        if ABSOLUTE_URL.is_match(&text) {
            Ok(text)
        } else {
            Err(Error::new(
                ErrorKind::InvalidOperation,
                format!("'{}' is not an absolute URL", text),
            ))
        }
    });

    env.add_filter("deschemify", |value: Value| -> String {
        deschemify(&plain_text(&value))
    });

    env.add_filter("to_json", |value: Value| -> Result<String, Error> {
        serde_json::to_string(&value).map_err(|e| {
            Error::new(ErrorKind::BadSerialization, "value cannot be encoded as JSON")
                .with_source(e)
        })
    });
}

/// Encodes `text` as a TOML basic string, quotes included.
///
/// ```rust
/// use ctrconf_template::quote_toml;
///
/// assert_eq!(quote_toml(r#"C:\certs\"ca".pem"#), r#""C:\\certs\\\"ca\".pem""#);
/// ```
pub fn quote_toml(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Strips the scheme from an http(s) URL, keeping `host[:port]`.
///
/// Anything that does not start with `http` is returned unchanged; an
/// `http`-prefixed value that is not a URL yields an empty string.
pub fn deschemify(text: &str) -> String {
    if !text.starts_with("http") {
        return text.to_string();
    }
    HTTP_HOST
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|host| host.as_str().to_string())
        .unwrap_or_default()
}

// none and undefined read as the empty string
fn plain_text(value: &Value) -> String {
    if value.is_none() || value.is_undefined() {
        String::new()
    } else if let Some(s) = value.as_str() {
        s.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn env() -> Environment<'static> {
        let mut env = Environment::new();
        register_helpers(&mut env);
        env
    }

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote_toml("/etc/ssl/ca.pem"), "\"/etc/ssl/ca.pem\"");
    }

    #[test]
    fn test_quote_escapes_controls() {
        assert_eq!(quote_toml("a\nb\tc"), "\"a\\nb\\tc\"");
        assert_eq!(quote_toml("\u{1}"), "\"\\u0001\"");
        assert_eq!(quote_toml("\u{7f}"), "\"\\u007F\"");
    }

    #[test]
    fn test_quote_filter_none_is_empty_string() {
        let out = env()
            .render_str("{{ v | quote }}", context! { v => Value::from(()) })
            .unwrap();
        assert_eq!(out, "\"\"");
    }

    #[test]
    fn test_toml_bool_filter() {
        let out = env()
            .render_str("{{ a | toml_bool }} {{ b | toml_bool }}", context! { a => true, b => "" })
            .unwrap();
        assert_eq!(out, "true false");
    }

    #[test]
    fn test_absolute_url_accepts_urls() {
        let out = env()
            .render_str(
                "{{ u | absolute_url }}",
                context! { u => "https://registry-1.docker.io/v2" },
            )
            .unwrap();
        assert_eq!(out, "https://registry-1.docker.io/v2");
    }

    #[test]
    fn test_absolute_url_rejects_relative_and_empty() {
        for bad in ["", "mirror.local", "https://", "/v2/"] {
            let result = env().render_str("{{ u | absolute_url }}", context! { u => bad });
            assert!(result.is_err(), "expected {:?} to be rejected", bad);
        }
    }

    #[test]
    fn test_deschemify() {
        assert_eq!(deschemify("https://mirror.local:5000/v2"), "mirror.local:5000");
        assert_eq!(deschemify("http://user:pw@mirror.local"), "mirror.local");
        assert_eq!(deschemify("docker.io"), "docker.io");
        assert_eq!(deschemify("httpfoo"), "");
    }

    #[test]
    fn test_to_json_filter() {
        let out = env()
            .render_str("{{ v | to_json }}", context! { v => vec!["a", "b"] })
            .unwrap();
        assert_eq!(out, r#"["a","b"]"#);
    }
}
