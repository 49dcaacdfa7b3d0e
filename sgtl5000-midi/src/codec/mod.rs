//! SGTL5000 codec control module.
//!
//! The driver in [`sgtl5000`](self) maps MIDI CC values onto the chip's
//! control registers; [`automation`] ramps the graphic-EQ band gains so
//! changes stay click-free; `registers` holds the register map.

pub(crate) mod automation;
pub(crate) mod registers;
mod sgtl5000;

pub use automation::{BAND_COUNT, RAMP_STEP};
pub use sgtl5000::{
    AdcHighPass, DacRamp, DapMode, EqMode, HeadphoneSource, InputSource, Sgtl5000, SurroundMode,
};
