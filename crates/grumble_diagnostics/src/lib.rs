//! grumble_diagnostics: Diagnostic messages and error reporting.
//!
//! Compile-time failures found while classifying scopes or generating code
//! are reported as diagnostics: a message template with a stable code, the
//! file being compiled and an optional span.

use grumble_core::text::TextSpan;
use std::fmt;

/// A diagnostic message template with a stable code.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub code: u32,
    /// Template text. `{0}`, `{1}`, ... are replaced by arguments.
    pub message: &'static str,
}

/// A compile error tied to the unit that produced it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file: String,
    pub span: Option<TextSpan>,
    pub message_text: String,
    pub code: u32,
}

impl Diagnostic {
    pub fn new(file: String, span: Option<TextSpan>, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file,
            span,
            message_text: format_message(message.message, args),
            code: message.code,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(span) = self.span {
            write!(f, "({})", span.start)?;
        }
        write!(f, ": error GR{}: {}", self.code, self.message_text)
    }
}

/// Replace `{0}`, `{1}`, etc. in `template` with `args`.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, $msg:expr) => {
            DiagnosticMessage { code: $code, message: $msg }
        };
    }

    // ========================================================================
    // Scope classification errors (9000-9049)
    // ========================================================================
    pub const DUPLICATE_ARGUMENT_0_IN_FUNCTION_DEFINITION: DiagnosticMessage = diag!(9001, "duplicate argument '{0}' in function definition");
    pub const NAME_0_IS_PARAMETER_AND_GLOBAL: DiagnosticMessage = diag!(9002, "name '{0}' is parameter and global");
    pub const NAME_0_IS_USED_PRIOR_TO_GLOBAL_DECLARATION: DiagnosticMessage = diag!(9003, "name '{0}' is used prior to global declaration");
    pub const CANNOT_DELETE_NONEXISTENT_LOCAL_0: DiagnosticMessage = diag!(9004, "cannot delete nonexistent local: {0}");
    pub const NAME_0_WAS_NOT_CLASSIFIED: DiagnosticMessage = diag!(9005, "name '{0}' was not classified in this scope");
    pub const SCRATCH_VARIABLE_0_IS_NOT_IN_USE: DiagnosticMessage = diag!(9010, "scratch variable '{0}' is not in use");

    // ========================================================================
    // Code generation errors (9050-9099)
    // ========================================================================
    pub const RETURN_OUTSIDE_FUNCTION: DiagnosticMessage = diag!(9050, "'return' outside function");
    pub const _0_NOT_PROPERLY_IN_LOOP: DiagnosticMessage = diag!(9051, "'{0}' not properly in loop");
    pub const _0_IS_NOT_SUPPORTED: DiagnosticMessage = diag!(9052, "{0} is not supported");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        let msg = format_message("name '{0}' is parameter and global", &["x"]);
        assert_eq!(msg, "name 'x' is parameter and global");
    }

    #[test]
    fn test_format_message_no_args() {
        let msg = format_message("'return' outside function", &[]);
        assert_eq!(msg, "'return' outside function");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(
            "foo.py".to_string(),
            Some(TextSpan::new(10, 5)),
            &messages::DUPLICATE_ARGUMENT_0_IN_FUNCTION_DEFINITION,
            &["a"],
        );
        assert_eq!(
            diag.to_string(),
            "foo.py(10): error GR9001: duplicate argument 'a' in function definition"
        );
    }

    #[test]
    fn test_diagnostic_without_span() {
        let diag = Diagnostic::new("m.py".to_string(), None, &messages::CANNOT_DELETE_NONEXISTENT_LOCAL_0, &["y"]);
        assert_eq!(diag.code, 9004);
        assert_eq!(diag.to_string(), "m.py: error GR9004: cannot delete nonexistent local: y");
    }
}
