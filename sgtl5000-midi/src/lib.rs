//! # sgtl5000-midi
//!
//! A `no_std` MIDI Continuous-Controller control layer for the NXP SGTL5000
//! audio codec, as used in a multi-device mixing/looping rig where a control
//! surface drives the codec (and a companion audio hub) over serial MIDI.
//!
//! Incoming CC messages are mapped onto the codec's 16-bit control registers:
//! each control carries its own scaling, inversion, and bit-packing rules, and
//! the graphic-EQ bands are never written directly — gain changes ramp toward
//! their target in bounded steps, driven by a periodic [`tick`](Sgtl5000::tick),
//! so band changes stay click-free.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Message | [`midi`] | Bit-packed USB-MIDI event packet, channel routing |
//! | Metadata | [`table`] | Versioned CC descriptor table (name / max / write-only) |
//! | Codec | [`codec`] | CC dispatcher, register mapper, EQ band ramping |
//! | Hub | [`hub`] | Companion hub device: mixer sends + monadic commands |
//! | Errors | [`error`] | Bus and usage errors |
//!
//! ## Quick start
//!
//! ```ignore
//! let mut codec = Sgtl5000::new(i2c, delay);
//! codec.enable()?;
//! codec.set_defaults()?;
//!
//! // From the MIDI receive path:
//! if let Some(midi::CcTarget::Codec) = msg.cc_target() {
//!     codec.dispatch(msg.param1(), msg.param2())?;
//! }
//!
//! // From a periodic timer, to advance any pending EQ band ramps:
//! codec.tick()?;
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `defmt` | no | Logging for the `DUMP` command and error formatting |

#![no_std]

pub mod error;
pub mod midi;
pub mod table;
pub mod hub;
pub mod codec;

pub use codec::Sgtl5000;
pub use error::Error;
pub use table::{CcMap, Control};
