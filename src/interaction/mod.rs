//! Foreground interaction: input sampling and probe gestures

mod controller;
mod input;
mod mode;

pub use controller::{InteractionController, InteractionEvent, RaycastHit};
pub use input::{InputSample, InputSampler};
pub use mode::InteractionMode;
