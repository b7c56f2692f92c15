//! Data types for the progress engine
//!
//! Plain records shared by the storage layer, the scheduler and the
//! collaborator traits. Behaviour lives next to the component that owns it.

mod event;
mod gem;
mod mastery;
mod snapshot;

pub use event::{
    Envelope, EventPayload, GemAwardEvent, MasteryTransitionEvent, RawEnvelope,
    ReviewAnswerEvent,
};
pub use gem::{GemAward, GemReason, Rarity};
pub use mastery::{triggers, MasteryInfo, MasteryRecord, MasteryState, MasteryTransition};
pub use snapshot::{LearnerState, Snapshot};
