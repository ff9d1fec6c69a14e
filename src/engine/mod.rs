//! The timeline engine: coordinate axis, kinetic panning, lane packing,
//! header bands, drag rescheduling and phase derivation. Everything in here
//! is independent of the rendering layer; inputs are plain pixels, seconds
//! and calendar dates.

pub mod axis;
pub mod drag;
pub mod header;
pub mod kinetic;
pub mod lanes;
pub mod phases;
