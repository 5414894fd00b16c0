/// Events emitted while kinds are registered, entered, left and read.
///
/// These events are passed to the tracing callback set via `set_trace_callback`
/// and are also logged through `tracing` under the `context_local` target.
///
/// # Examples
///
/// ```rust
/// use context_local::ContextEvent;
///
/// let event = ContextEvent::Register { type_name: "app::Session" };
/// assert_eq!(event.to_string(), "register { type_name: app::Session }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextEvent {
    /// A storage cell was created for a kind (first use in the process).
    Register {
        /// The type name of the kind, e.g. `"app::Session"`
        type_name: &'static str,
    },

    /// A scope was entered and a new value bound.
    Enter {
        type_name: &'static str,
        /// Whether the new value shadows an outer binding in the same flow.
        shadowed: bool,
    },

    /// A scope was left and the previous binding restored.
    Exit {
        type_name: &'static str,
        /// Whether a previous value was put back (`false` means the cell is empty again).
        restored: bool,
    },

    /// The current value was requested.
    Current {
        type_name: &'static str,
        found: bool,
    },
}

impl ContextEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContextEvent::Register { type_name }
            | ContextEvent::Enter { type_name, .. }
            | ContextEvent::Exit { type_name, .. }
            | ContextEvent::Current { type_name, .. } => type_name,
        }
    }
}

impl std::fmt::Display for ContextEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextEvent::Register { type_name } => {
                write!(f, "register {{ type_name: {} }}", type_name)
            }
            ContextEvent::Enter {
                type_name,
                shadowed,
            } => {
                write!(
                    f,
                    "enter {{ type_name: {}, shadowed: {} }}",
                    type_name, shadowed
                )
            }
            ContextEvent::Exit {
                type_name,
                restored,
            } => {
                write!(
                    f,
                    "exit {{ type_name: {}, restored: {} }}",
                    type_name, restored
                )
            }
            ContextEvent::Current { type_name, found } => {
                write!(f, "current {{ type_name: {}, found: {} }}", type_name, found)
            }
        }
    }
}
