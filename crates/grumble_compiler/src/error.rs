//! Driver errors.

use grumble_core::text::TextSpan;
use grumble_diagnostics::{messages, Diagnostic};
use grumble_scope::ScopeError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("'return' outside function")]
    ReturnOutsideFunction { span: Option<TextSpan> },

    /// `break` or `continue` with no enclosing loop in the same scope.
    #[error("'{keyword}' not properly in loop")]
    LoopControlOutsideLoop {
        keyword: &'static str,
        span: Option<TextSpan>,
    },

    /// A construct whose code generation lives outside this driver.
    #[error("{what} is not supported")]
    Unsupported { what: String, span: Option<TextSpan> },
}

impl CompileError {
    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        CompileError::Unsupported {
            what: what.into(),
            span: None,
        }
    }

    pub fn span(&self) -> Option<TextSpan> {
        match self {
            CompileError::Scope(err) => err.span(),
            CompileError::ReturnOutsideFunction { span }
            | CompileError::LoopControlOutsideLoop { span, .. }
            | CompileError::Unsupported { span, .. } => *span,
        }
    }

    /// Attach `at` if the error does not carry a location yet.
    pub fn with_span(self, at: TextSpan) -> Self {
        match self {
            CompileError::Scope(err) => CompileError::Scope(err.with_span(at)),
            CompileError::ReturnOutsideFunction { span } => CompileError::ReturnOutsideFunction {
                span: span.or(Some(at)),
            },
            CompileError::LoopControlOutsideLoop { keyword, span } => CompileError::LoopControlOutsideLoop {
                keyword,
                span: span.or(Some(at)),
            },
            CompileError::Unsupported { what, span } => CompileError::Unsupported {
                what,
                span: span.or(Some(at)),
            },
        }
    }

    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        match self {
            CompileError::Scope(err) => err.to_diagnostic(file),
            CompileError::ReturnOutsideFunction { span } => {
                Diagnostic::new(file.to_string(), *span, &messages::RETURN_OUTSIDE_FUNCTION, &[])
            }
            CompileError::LoopControlOutsideLoop { keyword, span } => {
                Diagnostic::new(file.to_string(), *span, &messages::_0_NOT_PROPERLY_IN_LOOP, &[*keyword])
            }
            CompileError::Unsupported { what, span } => {
                Diagnostic::new(file.to_string(), *span, &messages::_0_IS_NOT_SUPPORTED, &[what.as_str()])
            }
        }
    }
}
