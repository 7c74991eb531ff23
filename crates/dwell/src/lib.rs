//! Dwell timing: one shared timer for the whole scene, two completion channels.
//!
//! # Invariants
//! - At most one dwell mode is active at a time; the first caller holds it.
//! - Elapsed time stays in `[0, threshold)` while a mode is active and returns
//!   to zero on cancel or completion.
//! - Completion dispatch iterates a snapshot of subscribers taken at the start
//!   of the tick, so handlers may subscribe or unsubscribe freely.

mod channel;
mod timer;

pub use channel::{Channel, Handler, SubscriptionId};
pub use timer::{
    DwellCompletion, DwellError, DwellMode, DwellTimer, IndicatorSink, IndicatorState,
    Thresholds,
};

pub fn crate_info() -> &'static str {
    "gazeland-dwell v0.1.0"
}
