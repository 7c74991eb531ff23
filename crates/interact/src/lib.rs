//! Interaction layer: targets that react to gaze dwell, the avatar they move,
//! and the session that wires them to one shared timer and tracker.
//!
//! # Invariants
//! - Every target shares the scene's single [`DwellTimer`](gazeland_dwell::DwellTimer);
//!   none owns it.
//! - A gaze target's visibility toggle is reversible; its progress
//!   contribution is one-shot.
//! - A teleport target is consumed at most once and never re-enabled.
//! - An answer option judges a choice only after the unlock has revealed it.

pub mod answer_option;
pub mod avatar;
pub mod error;
pub mod gaze_target;
pub mod router;
pub mod session;
pub mod teleport_target;

pub use answer_option::{AnswerOption, AnswerStatus, SharedAnswerOption};
pub use avatar::{Avatar, PlayerRig, SharedAvatar};
pub use error::InteractError;
pub use gaze_target::{GazeTarget, SharedGazeTarget};
pub use router::{GazeInteractive, GazeRouter};
pub use session::{Session, TickReport};
pub use teleport_target::{HoverNotice, SharedTeleportTarget, TeleportTarget};

pub fn crate_info() -> &'static str {
    "gazeland-interact v0.1.0"
}
