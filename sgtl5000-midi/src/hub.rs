//! Companion audio hub device.
//!
//! The hub sits between the codec's I2S stream, the USB audio interface,
//! and the looper, and mixes four sends into the monitor output. It speaks
//! the same CC protocol as the codec on its own MIDI channel
//! ([`crate::midi::HUB_CHANNEL`]), with a much smaller control block: three
//! monadic commands and the four mixer sends.
//!
//! The hub holds no hardware registers of its own — the mixer gains live in
//! the audio path on the same MCU — so dispatch here validates and stores
//! the values, and hands the monadic commands back to the firmware layer as
//! a [`HubAction`] (a library cannot reboot the processor it runs on).

use crate::table::MONADIC_MAX;

/// First CC number of the hub control block.
pub const HUB_CC_BASE: u8 = 30;

/// Mixer send value that corresponds to unity (0 dB) gain.
pub const HUB_UNITY_GAIN: u8 = 100;

/// Hub controls, keyed by CC number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HubCc {
    /// Dump hub state to the debug output. Write-only monadic command.
    Dump = 30,
    /// Reboot the hub processor. Write-only monadic command.
    Reboot = 31,
    /// Reset hub state to power-on defaults. Write-only monadic command.
    Reset = 32,
    /// Monitor level of the codec's I2S input.
    MixIn = 33,
    /// Monitor level of the USB return.
    MixUsb = 34,
    /// Monitor level of the looper return.
    MixLoop = 35,
    /// Monitor level of the auxiliary send.
    MixAux = 36,
}

impl HubCc {
    pub fn from_cc(cc: u8) -> Option<HubCc> {
        match cc {
            30 => Some(HubCc::Dump),
            31 => Some(HubCc::Reboot),
            32 => Some(HubCc::Reset),
            33 => Some(HubCc::MixIn),
            34 => Some(HubCc::MixUsb),
            35 => Some(HubCc::MixLoop),
            36 => Some(HubCc::MixAux),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            HubCc::Dump => "DUMP_AUDIO",
            HubCc::Reboot => "REBOOT_AUDIO",
            HubCc::Reset => "RESET_AUDIO",
            HubCc::MixIn => "MIX_IN",
            HubCc::MixUsb => "MIX_USB",
            HubCc::MixLoop => "MIX_LOOP",
            HubCc::MixAux => "MIX_AUX",
        }
    }

    pub const fn max(self) -> u8 {
        match self {
            HubCc::Dump | HubCc::Reboot | HubCc::Reset => MONADIC_MAX,
            _ => 127,
        }
    }

    pub const fn is_write_only(self) -> bool {
        matches!(self, HubCc::Dump | HubCc::Reboot | HubCc::Reset)
    }
}

/// `name(cc)` contract for the hub block; sentinel for unmapped numbers.
pub fn name(cc: u8) -> &'static str {
    match HubCc::from_cc(cc) {
        Some(c) => c.name(),
        None => crate::table::UNKNOWN_CC_NAME,
    }
}

/// `max(cc)` contract for the hub block.
pub fn max(cc: u8) -> u8 {
    match HubCc::from_cc(cc) {
        Some(c) => c.max(),
        None => MONADIC_MAX,
    }
}

/// `is_write_only(cc)` contract for the hub block.
pub fn is_write_only(cc: u8) -> bool {
    HubCc::from_cc(cc).is_some_and(|c| c.is_write_only())
}

/// One of the four mixer sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MixSend {
    In,
    Usb,
    Loop,
    Aux,
}

/// A command the firmware layer must carry out after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HubAction {
    /// Nothing further to do.
    None,
    /// Dump hub state to the debug output.
    Dump,
    /// Reboot the hub processor.
    Reboot,
    /// Reset hub state (the gain store has already been reset).
    Reset,
}

/// Hub dispatch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HubError {
    /// A CC value exceeded the control's maximum; nothing was stored.
    ValueOutOfRange { cc: HubCc, value: u8, max: u8 },
}

/// Mixer-send gain store for the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hub {
    mix_in: u8,
    mix_usb: u8,
    mix_loop: u8,
    mix_aux: u8,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    /// Power-on defaults: only the looper return is audible.
    pub const fn new() -> Self {
        Hub {
            mix_in: 0,
            mix_usb: 0,
            mix_loop: HUB_UNITY_GAIN,
            mix_aux: 0,
        }
    }

    /// Dispatch a (cc, value) pair addressed to the hub.
    ///
    /// Unknown CC numbers are ignored. Monadic commands are returned as a
    /// [`HubAction`] for the caller to perform.
    pub fn dispatch(&mut self, cc: u8, value: u8) -> Result<HubAction, HubError> {
        let Some(hub_cc) = HubCc::from_cc(cc) else {
            return Ok(HubAction::None);
        };
        let max = hub_cc.max();
        if max != MONADIC_MAX && value > max {
            return Err(HubError::ValueOutOfRange {
                cc: hub_cc,
                value,
                max,
            });
        }
        match hub_cc {
            HubCc::Dump => Ok(HubAction::Dump),
            HubCc::Reboot => Ok(HubAction::Reboot),
            HubCc::Reset => {
                *self = Hub::new();
                Ok(HubAction::Reset)
            }
            HubCc::MixIn => {
                self.mix_in = value;
                Ok(HubAction::None)
            }
            HubCc::MixUsb => {
                self.mix_usb = value;
                Ok(HubAction::None)
            }
            HubCc::MixLoop => {
                self.mix_loop = value;
                Ok(HubAction::None)
            }
            HubCc::MixAux => {
                self.mix_aux = value;
                Ok(HubAction::None)
            }
        }
    }

    /// Current value of a CC; 0 for the write-only commands and unknown
    /// numbers, never touching anything.
    pub fn get_cc(&self, cc: u8) -> u8 {
        match HubCc::from_cc(cc) {
            Some(HubCc::MixIn) => self.mix_in,
            Some(HubCc::MixUsb) => self.mix_usb,
            Some(HubCc::MixLoop) => self.mix_loop,
            Some(HubCc::MixAux) => self.mix_aux,
            _ => 0,
        }
    }

    /// Stored send level on the CC scale (0..=127, 100 = 0 dB).
    pub fn level(&self, send: MixSend) -> u8 {
        match send {
            MixSend::In => self.mix_in,
            MixSend::Usb => self.mix_usb,
            MixSend::Loop => self.mix_loop,
            MixSend::Aux => self.mix_aux,
        }
    }

    /// Linear gain factor for the audio-side mixer (1.0 at 0 dB).
    pub fn gain(&self, send: MixSend) -> f32 {
        self.level(send) as f32 / HUB_UNITY_GAIN as f32
    }
}
