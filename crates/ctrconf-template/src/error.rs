//! Error types for template compilation and rendering.
//!
//! Compilation and rendering fail in different ways and are reported by
//! different types: [`CompileError`] when template text cannot be turned into
//! a [`CompiledTemplate`](crate::CompiledTemplate), [`RenderError`] when a
//! compiled template cannot be evaluated against a model.

use thiserror::Error;

/// A template could not be compiled.
///
/// Raised for malformed template syntax and for references to helpers that
/// are neither part of the fixed helper set nor minijinja built-ins.
#[derive(Debug, Clone, Error)]
#[error("failed to compile template '{template}': {message}")]
pub struct CompileError {
    template: String,
    message: String,
}

impl CompileError {
    pub(crate) fn new(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            message: message.into(),
        }
    }

    pub(crate) fn from_minijinja(template: &str, err: &minijinja::Error) -> Self {
        let message = match err.line() {
            Some(line) => format!("{} (line {})", err.detail().unwrap_or("syntax error"), line),
            None => err.to_string(),
        };
        Self::new(template, message)
    }

    /// Name of the template that failed: the root template or an attached one.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Human readable description of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A compiled template could not be rendered against a model.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Evaluation failed: a field lookup against the model failed, a helper
    /// rejected its input, or the execution budget ran out.
    #[error("failed to render template '{template}': {source}")]
    Evaluation {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// The model cannot be rendered as valid output by this template.
    #[error("cannot render template '{template}': {message}")]
    InvalidModel { template: String, message: String },

    /// The rendered text is larger than the configured output bound.
    #[error("rendered output is {actual} bytes, exceeding the {limit} byte limit")]
    OutputLimit { limit: usize, actual: usize },
}

impl RenderError {
    pub(crate) fn evaluation(template: &str, source: minijinja::Error) -> Self {
        RenderError::Evaluation {
            template: template.to_string(),
            source,
        }
    }

    pub fn invalid_model(template: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::InvalidModel {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Returns true when evaluation stopped because the fuel budget was spent.
    pub fn is_out_of_fuel(&self) -> bool {
        matches!(
            self,
            RenderError::Evaluation { source, .. }
                if source.kind() == minijinja::ErrorKind::OutOfFuel
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::new("compiled_template", "unexpected end of input");
        let msg = err.to_string();
        assert!(msg.contains("compiled_template"));
        assert!(msg.contains("unexpected end of input"));
        assert_eq!(err.template(), "compiled_template");
    }

    #[test]
    fn test_render_error_keeps_source() {
        let source = minijinja::Error::new(minijinja::ErrorKind::UndefinedError, "missing field");
        let err = RenderError::evaluation("hosts", source);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("hosts"));
        assert!(!err.is_out_of_fuel());
    }

    #[test]
    fn test_invalid_model_display() {
        let err = RenderError::invalid_model("hosts", "endpoint 'https://m1' is listed twice");
        assert_eq!(
            err.to_string(),
            "cannot render template 'hosts': endpoint 'https://m1' is listed twice"
        );
        assert!(!err.is_out_of_fuel());
    }

    #[test]
    fn test_output_limit_display() {
        let err = RenderError::OutputLimit {
            limit: 10,
            actual: 42,
        };
        assert_eq!(
            err.to_string(),
            "rendered output is 42 bytes, exceeding the 10 byte limit"
        );
    }
}
