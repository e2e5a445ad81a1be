//! Assembly generation error type.

/// Error raised while emitting assembly.
///
/// Formatting errors come from `write!` into the output buffer; logic
/// errors indicate an IR invariant was broken (they should be
/// unreachable once type checking has accepted the module). Both
/// propagate with `?`.
#[derive(Debug)]
pub enum CodeGenError {
    /// Broken invariant in the incoming IR (internal compiler error)
    Logic(String),
    /// Failure writing assembly text
    Format(std::fmt::Error),
}

impl std::fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeGenError::Logic(message) => {
                write!(f, "internal compiler error in assembly generation: {}", message)
            }
            CodeGenError::Format(e) => write!(f, "failed to write assembly: {}", e),
        }
    }
}

impl std::error::Error for CodeGenError {}

impl From<String> for CodeGenError {
    fn from(message: String) -> Self {
        CodeGenError::Logic(message)
    }
}

impl From<std::fmt::Error> for CodeGenError {
    fn from(e: std::fmt::Error) -> Self {
        CodeGenError::Format(e)
    }
}
