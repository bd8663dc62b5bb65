//! Compile-time scope errors.

use grumble_core::text::TextSpan;
use grumble_diagnostics::{messages, Diagnostic, DiagnosticMessage};

/// A failure that aborts compilation of the current scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("duplicate argument '{name}' in function definition")]
    DuplicateArgument { name: String, span: Option<TextSpan> },

    #[error("name '{name}' is parameter and global")]
    ParameterAndGlobal { name: String, span: Option<TextSpan> },

    #[error("name '{name}' is used prior to global declaration")]
    UsedPriorToGlobal { name: String, span: Option<TextSpan> },

    #[error("cannot delete nonexistent local: {name}")]
    DeleteNonexistentLocal { name: String, span: Option<TextSpan> },

    /// A function scope was asked to bind a name its classification never saw.
    #[error("name '{name}' was not classified in this scope")]
    UnclassifiedName { name: String, span: Option<TextSpan> },

    #[error("scratch variable '{name}' is not in use")]
    TempNotInUse { name: String },
}

impl ScopeError {
    pub fn span(&self) -> Option<TextSpan> {
        match self {
            ScopeError::DuplicateArgument { span, .. }
            | ScopeError::ParameterAndGlobal { span, .. }
            | ScopeError::UsedPriorToGlobal { span, .. }
            | ScopeError::DeleteNonexistentLocal { span, .. }
            | ScopeError::UnclassifiedName { span, .. } => *span,
            ScopeError::TempNotInUse { .. } => None,
        }
    }

    /// Attach `span` if the error does not carry a location yet.
    pub fn with_span(mut self, at: TextSpan) -> Self {
        match &mut self {
            ScopeError::DuplicateArgument { span, .. }
            | ScopeError::ParameterAndGlobal { span, .. }
            | ScopeError::UsedPriorToGlobal { span, .. }
            | ScopeError::DeleteNonexistentLocal { span, .. }
            | ScopeError::UnclassifiedName { span, .. } => {
                span.get_or_insert(at);
            }
            ScopeError::TempNotInUse { .. } => {}
        }
        self
    }

    fn name(&self) -> &str {
        match self {
            ScopeError::DuplicateArgument { name, .. }
            | ScopeError::ParameterAndGlobal { name, .. }
            | ScopeError::UsedPriorToGlobal { name, .. }
            | ScopeError::DeleteNonexistentLocal { name, .. }
            | ScopeError::UnclassifiedName { name, .. }
            | ScopeError::TempNotInUse { name } => name,
        }
    }

    pub fn message(&self) -> &'static DiagnosticMessage {
        match self {
            ScopeError::DuplicateArgument { .. } => &messages::DUPLICATE_ARGUMENT_0_IN_FUNCTION_DEFINITION,
            ScopeError::ParameterAndGlobal { .. } => &messages::NAME_0_IS_PARAMETER_AND_GLOBAL,
            ScopeError::UsedPriorToGlobal { .. } => &messages::NAME_0_IS_USED_PRIOR_TO_GLOBAL_DECLARATION,
            ScopeError::DeleteNonexistentLocal { .. } => &messages::CANNOT_DELETE_NONEXISTENT_LOCAL_0,
            ScopeError::UnclassifiedName { .. } => &messages::NAME_0_WAS_NOT_CLASSIFIED,
            ScopeError::TempNotInUse { .. } => &messages::SCRATCH_VARIABLE_0_IS_NOT_IN_USE,
        }
    }

    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        Diagnostic::new(file.to_string(), self.span(), self.message(), &[self.name()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_diagnostic_text() {
        let err = ScopeError::UsedPriorToGlobal {
            name: "x".to_string(),
            span: Some(TextSpan::new(3, 8)),
        };
        let diag = err.to_diagnostic("m.py");
        assert_eq!(err.to_string(), diag.message_text);
        assert_eq!(diag.code, 9003);
        assert_eq!(diag.span, Some(TextSpan::new(3, 8)));
    }

    #[test]
    fn test_with_span_keeps_existing_location() {
        let err = ScopeError::DeleteNonexistentLocal {
            name: "y".to_string(),
            span: Some(TextSpan::new(1, 1)),
        };
        assert_eq!(err.with_span(TextSpan::new(9, 9)).span(), Some(TextSpan::new(1, 1)));

        let err = ScopeError::DeleteNonexistentLocal { name: "y".to_string(), span: None };
        assert_eq!(err.with_span(TextSpan::new(9, 9)).span(), Some(TextSpan::new(9, 9)));
    }
}
