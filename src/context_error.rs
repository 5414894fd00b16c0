use thiserror::Error;

/// Errors surfaced by the read path of a context kind.
///
/// Constructor failures are never wrapped here: `enter` returns the kind's
/// own `ContextKind::Error` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// `current` was called while no scope for the kind is active in this flow.
    #[error("No active binding for context kind: {type_name}")]
    Unbound { type_name: &'static str },
}

impl ContextError {
    /// Name of the context kind the error refers to.
    pub fn type_name(&self) -> &'static str {
        match self {
            ContextError::Unbound { type_name } => type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_display() {
        let err = ContextError::Unbound {
            type_name: "app::Session",
        };
        assert_eq!(
            err.to_string(),
            "No active binding for context kind: app::Session"
        );
    }

    #[test]
    fn test_debug_format() {
        let err = ContextError::Unbound { type_name: "u8" };
        assert_eq!(format!("{:?}", err), "Unbound { type_name: \"u8\" }");
    }

    #[test]
    fn test_type_name_accessor() {
        assert_eq!(ContextError::Unbound { type_name: "a" }.type_name(), "a");
    }

    #[test]
    fn test_error_trait() {
        let err: &dyn std::error::Error = &ContextError::Unbound { type_name: "u8" };
        assert_eq!(err.to_string(), "No active binding for context kind: u8");
    }
}
