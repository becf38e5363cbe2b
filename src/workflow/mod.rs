//! The job lifecycle: which actions exist, where they may start, what they
//! check, and which dashboard tab each status lands in.

pub mod actions;
pub mod guards;
pub mod invoice;
pub mod transitions;
pub mod worklist;

pub use actions::{ActionKind, ClientIntent, JobAction};
pub use worklist::Section;
