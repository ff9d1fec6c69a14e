pub mod entry;
pub mod viewport;

pub use entry::{EntryKind, Milestones, TimelineEntry};
pub use viewport::{Viewport, ZoomPreset, MAX_DAY_WIDTH, MIN_DAY_WIDTH};
