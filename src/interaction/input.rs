//! Per-tick input sampling abstraction
//!
//! Front ends map whatever physical device they have (VR controller,
//! keyboard, test script) onto one `InputSample` per foreground tick.

/// One frame's worth of interaction input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSample {
    /// The toggle/destroy button is held this tick
    pub toggle_pressed: bool,
    /// The highlight control is held this tick
    pub highlight_pressed: bool,
    /// Signed power-adjustment input, in control units (scaled by the
    /// configured sensitivity before it reaches any probe)
    pub power_delta: f64,
}

impl InputSample {
    /// A tick with nothing pressed
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Supplies the per-tick input sample, whatever the device
pub trait InputSampler {
    fn sample(&mut self) -> InputSample;
}
