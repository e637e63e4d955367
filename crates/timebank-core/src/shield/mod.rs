//! The shield: the single shared blocked-target slot.

mod controller;
mod resource;
pub mod screen;

pub use controller::{ShieldButton, ShieldController, ShieldVerdict};
pub use resource::{InProcessShield, ShieldResource};
pub use screen::{ShieldScreen, TargetKind};
