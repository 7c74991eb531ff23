use gazeland_common::EntityId;
use gazeland_dwell::DwellError;

/// Errors from target interactions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InteractError {
    /// A required collaborator was never bound.
    #[error("{target} has no {binding} bound")]
    MissingBinding {
        target: EntityId,
        binding: &'static str,
    },
    #[error(transparent)]
    Dwell(#[from] DwellError),
    #[error("no target named {0}")]
    UnknownTarget(String),
}

impl InteractError {
    /// Whether the host must surface this to the user instead of carrying on.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::MissingBinding {
                binding: "avatar",
                ..
            }
        )
    }
}
