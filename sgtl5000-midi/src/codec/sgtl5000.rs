//! SGTL5000 CC dispatcher and register mapper.
//!
//! Maps 7-bit MIDI CC values onto the codec's control registers: every
//! control carries its own scaling and inversion rules, several share bits
//! of one register, and the graphic-EQ bands are written only through the
//! ramping engine in [`super::automation`].
//!
//! The driver is generic over any [`embedded_hal::i2c::I2c`] and
//! [`embedded_hal::delay::DelayNs`] implementation; the delay is used only
//! during the power-on sequence.
//!
//! # Example
//!
//! ```ignore
//! let mut codec = Sgtl5000::new(i2c, delay);
//! codec.enable()?;
//! codec.set_defaults()?;
//! codec.dispatch(cc, value)?;   // from the MIDI receive path
//! codec.tick()?;                // from a periodic timer
//! ```
//!
//! # Concurrency
//!
//! One device, one execution context: `dispatch` and `tick` must not run
//! concurrently against the same driver. The ramp guard bit only protects
//! against a nested/re-entered `tick` (e.g. a timer firing into a pass
//! still on the bus); it is cooperative, not a lock.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::automation::{EqRamp, BAND_COUNT};
use super::registers as reg;
use super::registers::AnaCtrl;
use crate::error::Error;
use crate::table::{CcMap, Control, MONADIC_MAX};

// ── Public enums ───────────────────────────────────────────────────────────

/// ADC input selection. Selecting an input changes no gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputSource {
    /// Stereo line-in.
    LineIn = 0,
    /// Microphone.
    Mic = 1,
}

/// Headphone amplifier source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeadphoneSource {
    /// Normal mode: DAC output.
    Dac = 0,
    /// Bypass mode: line-in routed straight to the amplifier. Line-in
    /// level has no effect here; headphone volume and mute still do.
    LineIn = 1,
}

/// DAC volume ramping behaviour for ordinary volume changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DacRamp {
    Exponential = 0,
    Linear = 1,
    Disabled = 2,
}

/// ADC high-pass filter state.
///
/// Bypassing may improve bass response at the cost of letting DC through;
/// freezing holds the current offset estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcHighPass {
    Enabled = 0,
    Frozen = 1,
    Bypassed = 2,
}

/// Digital audio processor placement.
///
/// Mute the outputs around changes to this; re-routing the DAP thumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DapMode {
    /// DAP out of the signal path.
    Off = 0,
    /// Process the analog input before it reaches the I2S output.
    Pre = 1,
    /// Process the I2S input on its way to the DAC.
    Post = 2,
}

/// Surround processing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SurroundMode {
    Off = 0,
    Mono = 1,
    Stereo = 2,
}

/// EQ mode selection for the DAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EqMode {
    /// Flat response, no EQ processing.
    Off = 0,
    /// 7-band parametric EQ (coefficients not managed by this layer).
    ParametricEq = 1,
    /// 2-band tone control (band 0 = bass, band 4 = treble).
    ToneControls = 2,
    /// 5-band graphic EQ.
    GraphicEq = 3,
}

// ── Driver struct ──────────────────────────────────────────────────────────

/// SGTL5000 MIDI CC driver.
///
/// Owns the soft state the chip cannot be trusted to read back: the
/// `CHIP_ANA_CTRL` mirror, both mute flags, and the EQ band ramp.
pub struct Sgtl5000<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    map: CcMap,
    /// Soft mirror of CHIP_ANA_CTRL, refreshed on every write to it.
    ana_ctrl: AnaCtrl,
    hp_muted: bool,
    lineout_muted: bool,
    eq: EqRamp,
}

impl<I2C, D> Sgtl5000<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Default I2C address (CTRL_ADR0_CS pin low).
    pub const DEFAULT_ADDRESS: u8 = reg::I2C_ADDR_CS_LOW;

    /// Alternate I2C address (CTRL_ADR0_CS pin high).
    pub const ALT_ADDRESS: u8 = reg::I2C_ADDR_CS_HIGH;

    /// Create a driver with the default I2C address and current CC map.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, Self::DEFAULT_ADDRESS)
    }

    /// Create a driver with a specific I2C address.
    pub fn with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            map: CcMap::default(),
            ana_ctrl: AnaCtrl::default(),
            hp_muted: true,
            lineout_muted: false,
            eq: EqRamp::new(),
        }
    }

    /// Select the CC numbering profile (for legacy control surfaces).
    pub fn set_cc_map(&mut self, map: CcMap) {
        self.map = map;
    }

    /// The active CC numbering profile.
    pub fn cc_map(&self) -> CcMap {
        self.map
    }

    // ── Low-level register access ──────────────────────────────────────

    /// Write a 16-bit value to a 16-bit register.
    pub fn write_register(&mut self, register: u16, value: u16) -> Result<(), I2C::Error> {
        // Keep the ANA_CTRL mirror current for read-modify-write of mutes
        // and input selects; the register cannot be read back reliably.
        if register == reg::CHIP_ANA_CTRL {
            self.ana_ctrl = AnaCtrl::from_bits(value);
        }
        let buf = [
            (register >> 8) as u8,
            register as u8,
            (value >> 8) as u8,
            value as u8,
        ];
        self.i2c.write(self.address, &buf)
    }

    /// Read a 16-bit value from a 16-bit register.
    pub fn read_register(&mut self, register: u16) -> Result<u16, I2C::Error> {
        let reg_buf = [(register >> 8) as u8, register as u8];
        let mut val_buf = [0u8; 2];
        self.i2c.write_read(self.address, &reg_buf, &mut val_buf)?;
        Ok(((val_buf[0] as u16) << 8) | val_buf[1] as u16)
    }

    /// Read-modify-write: `new = (current & !mask) | value`.
    fn modify(&mut self, register: u16, value: u16, mask: u16) -> Result<u16, I2C::Error> {
        let current = self.read_register(register)?;
        let new_val = (current & !mask) | value;
        self.write_register(register, new_val)?;
        Ok(new_val)
    }

    // ── Power-on ───────────────────────────────────────────────────────

    /// Full power-on sequence for I2S slave mode at 44.1 kHz.
    ///
    /// Leaves the chip with ADC → I2S out, I2S in → DAC routing, DAC at
    /// 0 dB, the headphone amp floored and muted, zero-cross detectors on
    /// and line-in selected. Includes a 400 ms delay for the analog ramp.
    ///
    /// If the chip is already configured (warm restart of the MCU without
    /// a codec power cycle), the sequence is skipped entirely — re-running
    /// it pops loudly — and the soft state is reseeded from the hardware
    /// instead. DAP registers keep whatever they held; call
    /// [`set_defaults`](Self::set_defaults) for a known state.
    pub fn enable(&mut self) -> Result<(), Error<I2C::Error>> {
        self.delay.delay_ms(5);

        let i2s_ctrl = self.read_register(reg::CHIP_I2S_CTRL)?;
        if i2s_ctrl == 0x0030 {
            self.ana_ctrl = AnaCtrl::from_bits(self.read_register(reg::CHIP_ANA_CTRL)?);
            self.hp_muted = self.ana_ctrl.hp_muted();
            self.lineout_muted = self.ana_ctrl.lineout_muted();
            return Ok(());
        }

        self.hp_muted = true;
        self.lineout_muted = false;

        // VDDD is externally driven with 1.8V
        self.write_register(reg::CHIP_ANA_POWER, 0x4060)?;
        // VDDA & VDDIO both over 3.1V
        self.write_register(reg::CHIP_LINREG_CTRL, 0x006C)?;
        // VAG=1.575V, normal ramp, +12.5% bias current
        self.write_register(reg::CHIP_REF_CTRL, 0x01F2)?;
        // LO_VAGCNTRL=1.65V, OUT_CURRENT=0.54mA
        self.write_register(reg::CHIP_LINE_OUT_CTRL, 0x0F22)?;
        // Short circuit protection: allow up to 125mA
        self.write_register(reg::CHIP_SHORT_CTRL, 0x4446)?;
        // Enable zero cross detectors
        self.write_register(reg::CHIP_ANA_CTRL, 0x0137)?;

        // Power up: lineout, hp, adc, dac (slave mode)
        self.write_register(reg::CHIP_ANA_POWER, 0x40FF)?;
        // Power up all digital blocks
        self.write_register(reg::CHIP_DIG_POWER, 0x0073)?;

        // Wait for analog power ramp
        self.delay.delay_ms(400);

        // Default ~1.3Vpp line output
        self.write_register(reg::CHIP_LINE_OUT_VOL, 0x1D1D)?;
        // 44.1 kHz, 256×Fs
        self.write_register(reg::CHIP_CLK_CTRL, 0x0004)?;
        // SCLK=64×Fs, 16-bit, I2S format
        self.write_register(reg::CHIP_I2S_CTRL, 0x0030)?;
        // ADC → I2S output, I2S input → DAC
        self.write_register(reg::CHIP_SSS_CTRL, reg::SSS_ROUTE_DEFAULT)?;
        // Disable DAC mute, exponential volume ramp
        self.write_register(reg::CHIP_ADCDAC_CTRL, 0x0000)?;
        // DAC digital volume = 0 dB
        self.write_register(reg::CHIP_DAC_VOL, 0x3C3C)?;
        // Headphone amp floored (−51.5 dB)
        self.write_register(reg::CHIP_ANA_HP_CTRL, 0x7F7F)?;
        // Zero-cross detectors on, line-in selected, headphone muted
        self.write_register(reg::CHIP_ANA_CTRL, 0x0036)?;

        Ok(())
    }

    // ── CC dispatch ────────────────────────────────────────────────────

    /// Apply one (cc, value) pair from the control surface.
    ///
    /// CC numbers outside the descriptor table are ignored (permissive
    /// MIDI handling). A value above the control's maximum is rejected
    /// without touching the device. Stereo aggregates attempt both
    /// channels even if the first fails.
    pub fn dispatch(&mut self, cc: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let Some(control) = self.map.control(cc) else {
            return Ok(());
        };
        match control {
            Control::Dump => self.dump(),
            Control::SetDefaults => self.set_defaults(),
            Control::InputSelect => {
                self.check(control, value)?;
                self.set_input(if value == 0 {
                    InputSource::LineIn
                } else {
                    InputSource::Mic
                })
            }
            Control::MicGain => self.set_mic_gain(value),
            Control::LineInLevel => self.set_line_in_level(value),
            Control::LineInLevelLeft => self.set_line_in_level_left(value),
            Control::LineInLevelRight => self.set_line_in_level_right(value),
            Control::DacVolume => self.set_dac_volume(value),
            Control::DacVolumeLeft => self.set_dac_volume_left(value),
            Control::DacVolumeRight => self.set_dac_volume_right(value),
            Control::DacVolumeRamp => {
                self.check(control, value)?;
                self.set_dac_volume_ramp(match value {
                    0 => DacRamp::Exponential,
                    1 => DacRamp::Linear,
                    _ => DacRamp::Disabled,
                })
            }
            Control::LineOutLevel => self.set_line_out_level(value),
            Control::LineOutLevelLeft => self.set_line_out_level_left(value),
            Control::LineOutLevelRight => self.set_line_out_level_right(value),
            Control::HpSelect => {
                self.check(control, value)?;
                self.set_headphone_select(if value == 0 {
                    HeadphoneSource::Dac
                } else {
                    HeadphoneSource::LineIn
                })
            }
            Control::HpVolume => self.set_headphone_volume(value),
            Control::HpVolumeLeft => self.set_headphone_volume_left(value),
            Control::HpVolumeRight => self.set_headphone_volume_right(value),
            Control::MuteHp => {
                self.check(control, value)?;
                self.set_mute_headphone(value != 0)
            }
            Control::MuteLineOut => {
                self.check(control, value)?;
                self.set_mute_lineout(value != 0)
            }
            Control::AdcHighPass => {
                self.check(control, value)?;
                self.set_adc_high_pass(match value {
                    0 => AdcHighPass::Enabled,
                    1 => AdcHighPass::Frozen,
                    _ => AdcHighPass::Bypassed,
                })
            }
            Control::DapEnable => {
                self.check(control, value)?;
                self.set_dap_enable(match value {
                    0 => DapMode::Off,
                    1 => DapMode::Pre,
                    _ => DapMode::Post,
                })
            }
            Control::SurroundEnable => {
                self.check(control, value)?;
                self.set_surround_enable(match value {
                    0 => SurroundMode::Off,
                    1 => SurroundMode::Mono,
                    _ => SurroundMode::Stereo,
                })
            }
            Control::SurroundWidth => self.set_surround_width(value),
            Control::BassEnhanceEnable => {
                self.check(control, value)?;
                self.set_bass_enhance_enable(value != 0)
            }
            Control::BassCutoffEnable => {
                self.check(control, value)?;
                self.set_bass_cutoff_enable(value != 0)
            }
            Control::BassCutoffFreq => self.set_bass_cutoff_freq(value),
            Control::BassBoost => self.set_bass_boost(value),
            Control::BassVolume => self.set_bass_volume(value),
            Control::EqSelect => {
                self.check(control, value)?;
                self.set_eq_select(match value {
                    0 => EqMode::Off,
                    1 => EqMode::ParametricEq,
                    2 => EqMode::ToneControls,
                    _ => EqMode::GraphicEq,
                })
            }
            Control::EqBand0 => self.set_eq_band(0, value),
            Control::EqBand1 => self.set_eq_band(1, value),
            Control::EqBand2 => self.set_eq_band(2, value),
            Control::EqBand3 => self.set_eq_band(3, value),
            Control::EqBand4 => self.set_eq_band(4, value),
        }
    }

    /// Read back the current value of a CC.
    ///
    /// Write-only and unmapped CC numbers return 0 without any bus
    /// traffic — they have no readable state, and a register read there
    /// would be meaningless.
    pub fn get_cc(&mut self, cc: u8) -> Result<u8, Error<I2C::Error>> {
        let Some(control) = self.map.control(cc) else {
            return Ok(0);
        };
        match control {
            Control::Dump
            | Control::SetDefaults
            | Control::LineInLevel
            | Control::DacVolume
            | Control::LineOutLevel
            | Control::HpVolume => Ok(0),
            Control::InputSelect => Ok(self.input() as u8),
            Control::MicGain => self.mic_gain(),
            Control::LineInLevelLeft => self.line_in_level_left(),
            Control::LineInLevelRight => self.line_in_level_right(),
            Control::DacVolumeLeft => self.dac_volume_left(),
            Control::DacVolumeRight => self.dac_volume_right(),
            Control::DacVolumeRamp => Ok(self.dac_volume_ramp()? as u8),
            Control::LineOutLevelLeft => self.line_out_level_left(),
            Control::LineOutLevelRight => self.line_out_level_right(),
            Control::HpSelect => Ok(self.headphone_select() as u8),
            Control::HpVolumeLeft => self.headphone_volume_left(),
            Control::HpVolumeRight => self.headphone_volume_right(),
            Control::MuteHp => Ok(self.hp_muted() as u8),
            Control::MuteLineOut => Ok(self.lineout_muted() as u8),
            Control::AdcHighPass => Ok(self.adc_high_pass()? as u8),
            Control::DapEnable => Ok(self.dap_enable()? as u8),
            Control::SurroundEnable => Ok(self.surround_enable()? as u8),
            Control::SurroundWidth => self.surround_width(),
            Control::BassEnhanceEnable => self.bass_enhance_enable().map(u8::from),
            Control::BassCutoffEnable => self.bass_cutoff_enable().map(u8::from),
            Control::BassCutoffFreq => self.bass_cutoff_freq(),
            Control::BassBoost => self.bass_boost(),
            Control::BassVolume => self.bass_volume(),
            Control::EqSelect => Ok(self.eq_select()? as u8),
            Control::EqBand0 => self.eq_band(0),
            Control::EqBand1 => self.eq_band(1),
            Control::EqBand2 => self.eq_band(2),
            Control::EqBand3 => self.eq_band(3),
            Control::EqBand4 => self.eq_band(4),
        }
    }

    // ── Input and microphone ───────────────────────────────────────────

    /// Select the ADC source. Gains are left exactly as they are.
    pub fn set_input(&mut self, source: InputSource) -> Result<(), Error<I2C::Error>> {
        let ctrl = self
            .ana_ctrl
            .with_linein_selected(source == InputSource::LineIn);
        self.write_register(reg::CHIP_ANA_CTRL, ctrl.bits())?;
        Ok(())
    }

    /// Currently selected ADC source, from the soft mirror.
    pub fn input(&self) -> InputSource {
        if self.ana_ctrl.linein_selected() {
            InputSource::LineIn
        } else {
            InputSource::Mic
        }
    }

    /// Set mic preamp gain: 0/1/2/3 = 0/+20/+30/+40 dB. Bias configuration
    /// in the same register is untouched.
    pub fn set_mic_gain(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::MicGain, value)?;
        self.modify(reg::CHIP_MIC_CTRL, value as u16, 0x3)?;
        Ok(())
    }

    pub fn mic_gain(&mut self) -> Result<u8, Error<I2C::Error>> {
        Ok((self.read_register(reg::CHIP_MIC_CTRL)? & 0x3) as u8)
    }

    // ── Line-in level ──────────────────────────────────────────────────

    /// Set line-in (analog ADC) gain for one channel, 0..=15 in 1.5 dB
    /// steps, independent of the mic gain.
    pub fn set_line_in_level_left(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::LineInLevelLeft, value)?;
        self.modify(reg::CHIP_ANA_ADC_CTRL, value as u16, 0xF)?;
        Ok(())
    }

    pub fn set_line_in_level_right(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::LineInLevelRight, value)?;
        self.modify(reg::CHIP_ANA_ADC_CTRL, (value as u16) << 4, 0xF << 4)?;
        Ok(())
    }

    /// Set both line-in channels. Both writes are attempted regardless of
    /// the first outcome; the result fails if either did.
    pub fn set_line_in_level(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        let left = self.set_line_in_level_left(value);
        let right = self.set_line_in_level_right(value);
        left.and(right)
    }

    pub fn line_in_level_left(&mut self) -> Result<u8, Error<I2C::Error>> {
        Ok((self.read_register(reg::CHIP_ANA_ADC_CTRL)? & 0xF) as u8)
    }

    pub fn line_in_level_right(&mut self) -> Result<u8, Error<I2C::Error>> {
        Ok(((self.read_register(reg::CHIP_ANA_ADC_CTRL)? >> 4) & 0xF) as u8)
    }

    // ── DAC volume ─────────────────────────────────────────────────────

    /// Attenuate the digital signal ahead of the DAC. The scale is
    /// deliberately inverted relative to every other level control:
    ///
    /// - 0 — 0 dB, no attenuation
    /// - 1..=126 — −0.5 dB per step, down to −63 dB
    /// - 127 — hard mute
    ///
    /// The chip's full −90 dB range is not reachable from a 7-bit CC.
    pub fn set_dac_volume_left(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::DacVolumeLeft, value)?;
        self.modify(reg::CHIP_DAC_VOL, Self::dac_field(value), 0x00FF)?;
        Ok(())
    }

    /// Right-channel variant of [`set_dac_volume_left`](Self::set_dac_volume_left).
    pub fn set_dac_volume_right(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::DacVolumeRight, value)?;
        self.modify(reg::CHIP_DAC_VOL, Self::dac_field(value) << 8, 0xFF00)?;
        Ok(())
    }

    /// Set both DAC channels; both writes are always attempted.
    pub fn set_dac_volume(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        let left = self.set_dac_volume_left(value);
        let right = self.set_dac_volume_right(value);
        left.and(right)
    }

    pub fn dac_volume_left(&mut self) -> Result<u8, Error<I2C::Error>> {
        let v = self.read_register(reg::CHIP_DAC_VOL)? & 0xFF;
        Ok(Self::dac_user(v))
    }

    pub fn dac_volume_right(&mut self) -> Result<u8, Error<I2C::Error>> {
        let v = (self.read_register(reg::CHIP_DAC_VOL)? >> 8) & 0xFF;
        Ok(Self::dac_user(v))
    }

    /// Select how the chip slews ordinary DAC volume changes.
    pub fn set_dac_volume_ramp(&mut self, ramp: DacRamp) -> Result<(), Error<I2C::Error>> {
        let bits = match ramp {
            DacRamp::Exponential => 0x300,
            DacRamp::Linear => 0x200,
            DacRamp::Disabled => 0x000,
        };
        self.modify(reg::CHIP_ADCDAC_CTRL, bits, 0x300)?;
        Ok(())
    }

    pub fn dac_volume_ramp(&mut self) -> Result<DacRamp, Error<I2C::Error>> {
        Ok(match self.read_register(reg::CHIP_ADCDAC_CTRL)? & 0x300 {
            0x300 => DacRamp::Exponential,
            0x200 => DacRamp::Linear,
            _ => DacRamp::Disabled,
        })
    }

    // ── Line-out level ─────────────────────────────────────────────────

    /// Set line-out level for one channel, 0..=31 in 0.5 dB steps,
    /// ascending (0 is the quietest). The raw register field runs the
    /// other way, so the value is flipped on the way in. Values above 18
    /// can clip the output stage.
    ///
    /// A non-zero level on a muted line-out unmutes it; muting is only
    /// ever explicit via [`set_mute_lineout`](Self::set_mute_lineout).
    pub fn set_line_out_level_left(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::LineOutLevelLeft, value)?;
        self.modify(reg::CHIP_LINE_OUT_VOL, (31 - value) as u16, 0x1F)?;
        self.unmute_lineout_for(value)
    }

    pub fn set_line_out_level_right(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::LineOutLevelRight, value)?;
        self.modify(reg::CHIP_LINE_OUT_VOL, ((31 - value) as u16) << 8, 0x1F << 8)?;
        self.unmute_lineout_for(value)
    }

    /// Set both line-out channels; both writes are always attempted.
    pub fn set_line_out_level(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        let left = self.set_line_out_level_left(value);
        let right = self.set_line_out_level_right(value);
        left.and(right)
    }

    pub fn line_out_level_left(&mut self) -> Result<u8, Error<I2C::Error>> {
        let field = self.read_register(reg::CHIP_LINE_OUT_VOL)? & 0x1F;
        Ok(31 - field as u8)
    }

    pub fn line_out_level_right(&mut self) -> Result<u8, Error<I2C::Error>> {
        let field = (self.read_register(reg::CHIP_LINE_OUT_VOL)? >> 8) & 0x1F;
        Ok(31 - field as u8)
    }

    // ── Headphone ──────────────────────────────────────────────────────

    /// Route the headphone amplifier to the DAC or straight to line-in.
    pub fn set_headphone_select(&mut self, source: HeadphoneSource) -> Result<(), Error<I2C::Error>> {
        let ctrl = self
            .ana_ctrl
            .with_hp_bypass(source == HeadphoneSource::LineIn);
        self.write_register(reg::CHIP_ANA_CTRL, ctrl.bits())?;
        Ok(())
    }

    /// Current headphone source, from the soft mirror.
    pub fn headphone_select(&self) -> HeadphoneSource {
        if self.ana_ctrl.hp_bypass() {
            HeadphoneSource::LineIn
        } else {
            HeadphoneSource::Dac
        }
    }

    /// Set headphone volume for one channel, 0..=127 in 0.5 dB steps
    /// ascending from −51.5 dB to +12 dB (97 ≈ 0 dB).
    ///
    /// A non-zero volume on a muted headphone output unmutes it; muting is
    /// only ever explicit via [`set_mute_headphone`](Self::set_mute_headphone).
    pub fn set_headphone_volume_left(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::HpVolumeLeft, value)?;
        self.modify(reg::CHIP_ANA_HP_CTRL, (0x7F - value) as u16, 0x7F)?;
        self.unmute_headphone_for(value)
    }

    pub fn set_headphone_volume_right(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::HpVolumeRight, value)?;
        self.modify(reg::CHIP_ANA_HP_CTRL, ((0x7F - value) as u16) << 8, 0x7F << 8)?;
        self.unmute_headphone_for(value)
    }

    /// Set both headphone channels; both writes are always attempted.
    pub fn set_headphone_volume(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        let left = self.set_headphone_volume_left(value);
        let right = self.set_headphone_volume_right(value);
        left.and(right)
    }

    pub fn headphone_volume_left(&mut self) -> Result<u8, Error<I2C::Error>> {
        let field = self.read_register(reg::CHIP_ANA_HP_CTRL)? & 0x7F;
        Ok(0x7F - field as u8)
    }

    pub fn headphone_volume_right(&mut self) -> Result<u8, Error<I2C::Error>> {
        let field = (self.read_register(reg::CHIP_ANA_HP_CTRL)? >> 8) & 0x7F;
        Ok(0x7F - field as u8)
    }

    // ── Mutes ──────────────────────────────────────────────────────────

    /// Mute or unmute the headphone amplifier. Only the MUTE_HP bit of the
    /// shared analog control register is touched.
    pub fn set_mute_headphone(&mut self, muted: bool) -> Result<(), Error<I2C::Error>> {
        let ctrl = self.ana_ctrl.with_hp_muted(muted);
        self.write_register(reg::CHIP_ANA_CTRL, ctrl.bits())?;
        self.hp_muted = muted;
        Ok(())
    }

    /// Mute or unmute the line output. Only the MUTE_LO bit is touched.
    pub fn set_mute_lineout(&mut self, muted: bool) -> Result<(), Error<I2C::Error>> {
        let ctrl = self.ana_ctrl.with_lineout_muted(muted);
        self.write_register(reg::CHIP_ANA_CTRL, ctrl.bits())?;
        self.lineout_muted = muted;
        Ok(())
    }

    /// Cached headphone mute state.
    pub fn hp_muted(&self) -> bool {
        self.hp_muted
    }

    /// Cached line-out mute state.
    pub fn lineout_muted(&self) -> bool {
        self.lineout_muted
    }

    // ── ADC high-pass filter ───────────────────────────────────────────

    pub fn set_adc_high_pass(&mut self, mode: AdcHighPass) -> Result<(), Error<I2C::Error>> {
        let bits = match mode {
            AdcHighPass::Enabled => 0,
            AdcHighPass::Frozen => 2,
            AdcHighPass::Bypassed => 1,
        };
        self.modify(reg::CHIP_ADCDAC_CTRL, bits, 0x3)?;
        Ok(())
    }

    pub fn adc_high_pass(&mut self) -> Result<AdcHighPass, Error<I2C::Error>> {
        let bits = self.read_register(reg::CHIP_ADCDAC_CTRL)? & 0x3;
        Ok(if bits & 1 != 0 {
            AdcHighPass::Bypassed
        } else if bits & 2 != 0 {
            AdcHighPass::Frozen
        } else {
            AdcHighPass::Enabled
        })
    }

    // ── Digital audio processor ────────────────────────────────────────

    /// Place the DAP in the signal path, or take it out.
    pub fn set_dap_enable(&mut self, mode: DapMode) -> Result<(), Error<I2C::Error>> {
        match mode {
            DapMode::Off => {
                self.write_register(reg::CHIP_SSS_CTRL, reg::SSS_ROUTE_DEFAULT)?;
                self.write_register(reg::DAP_CONTROL, 0)?;
            }
            DapMode::Pre => {
                self.write_register(reg::DAP_CONTROL, 1)?;
                self.write_register(reg::CHIP_SSS_CTRL, reg::SSS_ROUTE_DAP_PRE)?;
            }
            DapMode::Post => {
                self.write_register(reg::DAP_CONTROL, 1)?;
                self.write_register(reg::CHIP_SSS_CTRL, reg::SSS_ROUTE_DAP_POST)?;
            }
        }
        Ok(())
    }

    pub fn dap_enable(&mut self) -> Result<DapMode, Error<I2C::Error>> {
        Ok(match self.read_register(reg::CHIP_SSS_CTRL)? {
            reg::SSS_ROUTE_DAP_PRE => DapMode::Pre,
            reg::SSS_ROUTE_DAP_POST => DapMode::Post,
            _ => DapMode::Off,
        })
    }

    // ── Surround ───────────────────────────────────────────────────────

    pub fn set_surround_enable(&mut self, mode: SurroundMode) -> Result<(), Error<I2C::Error>> {
        let select = match mode {
            SurroundMode::Off => 0,
            SurroundMode::Mono => 2,
            SurroundMode::Stereo => 3,
        };
        self.modify(reg::DAP_SGTL_SURROUND, select, 0x3)?;
        Ok(())
    }

    pub fn surround_enable(&mut self) -> Result<SurroundMode, Error<I2C::Error>> {
        Ok(match self.read_register(reg::DAP_SGTL_SURROUND)? & 0x3 {
            2 => SurroundMode::Mono,
            3 => SurroundMode::Stereo,
            _ => SurroundMode::Off,
        })
    }

    /// Set surround width, 0..=7 (widest).
    pub fn set_surround_width(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::SurroundWidth, value)?;
        self.modify(reg::DAP_SGTL_SURROUND, (value as u16) << 4, 0x7 << 4)?;
        Ok(())
    }

    pub fn surround_width(&mut self) -> Result<u8, Error<I2C::Error>> {
        Ok(((self.read_register(reg::DAP_SGTL_SURROUND)? >> 4) & 0x7) as u8)
    }

    // ── Bass enhance ───────────────────────────────────────────────────

    pub fn set_bass_enhance_enable(&mut self, enabled: bool) -> Result<(), Error<I2C::Error>> {
        self.modify(reg::DAP_BASS_ENHANCE, enabled as u16, 0x1)?;
        Ok(())
    }

    pub fn bass_enhance_enable(&mut self) -> Result<bool, Error<I2C::Error>> {
        Ok(self.read_register(reg::DAP_BASS_ENHANCE)? & 0x1 != 0)
    }

    /// Enable the high-pass cutoff ahead of the bass enhancer.
    pub fn set_bass_cutoff_enable(&mut self, enabled: bool) -> Result<(), Error<I2C::Error>> {
        self.modify(reg::DAP_BASS_ENHANCE, (enabled as u16) << 8, 0x1 << 8)?;
        Ok(())
    }

    pub fn bass_cutoff_enable(&mut self) -> Result<bool, Error<I2C::Error>> {
        Ok(self.read_register(reg::DAP_BASS_ENHANCE)? & (1 << 8) != 0)
    }

    /// Cutoff frequency index: 0..=6 = 80/100/125/150/175/200/225 Hz.
    pub fn set_bass_cutoff_freq(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::BassCutoffFreq, value)?;
        self.modify(reg::DAP_BASS_ENHANCE, (value as u16) << 4, 0x7 << 4)?;
        Ok(())
    }

    pub fn bass_cutoff_freq(&mut self) -> Result<u8, Error<I2C::Error>> {
        Ok(((self.read_register(reg::DAP_BASS_ENHANCE)? >> 4) & 0x7) as u8)
    }

    /// Harmonics boost amount, 0..=127 ascending. The register field is
    /// inverted, so the value is flipped on the way in.
    pub fn set_bass_boost(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::BassBoost, value)?;
        self.modify(reg::DAP_BASS_ENHANCE_CTRL, (0x7F - value) as u16, 0x7F)?;
        Ok(())
    }

    pub fn bass_boost(&mut self) -> Result<u8, Error<I2C::Error>> {
        let field = self.read_register(reg::DAP_BASS_ENHANCE_CTRL)? & 0x7F;
        Ok(0x7F - field as u8)
    }

    /// Bass-enhanced channel level, 0..=63 ascending (up to +6 dB).
    pub fn set_bass_volume(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.check(Control::BassVolume, value)?;
        self.modify(
            reg::DAP_BASS_ENHANCE_CTRL,
            ((0x3F - value) as u16) << 8,
            0x3F << 8,
        )?;
        Ok(())
    }

    pub fn bass_volume(&mut self) -> Result<u8, Error<I2C::Error>> {
        let field = (self.read_register(reg::DAP_BASS_ENHANCE_CTRL)? >> 8) & 0x3F;
        Ok(0x3F - field as u8)
    }

    // ── Equalizer ──────────────────────────────────────────────────────

    /// Select the frequency-shaping mode.
    pub fn set_eq_select(&mut self, mode: EqMode) -> Result<(), Error<I2C::Error>> {
        self.modify(reg::DAP_AUDIO_EQ, mode as u16, 0x3)?;
        Ok(())
    }

    pub fn eq_select(&mut self) -> Result<EqMode, Error<I2C::Error>> {
        Ok(match self.read_register(reg::DAP_AUDIO_EQ)? & 0x3 {
            1 => EqMode::ParametricEq,
            2 => EqMode::ToneControls,
            3 => EqMode::GraphicEq,
            _ => EqMode::Off,
        })
    }

    /// Retarget one EQ band, 0..=95 (−11.75 dB to +12 dB in 0.25 dB steps,
    /// 47 = flat).
    ///
    /// Nothing is written here: the band ramps toward the new target in
    /// 0.5 dB steps on subsequent [`tick`](Self::tick) calls, as an
    /// arbitrary jump on these registers pops audibly.
    pub fn set_eq_band(&mut self, band: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let idx = self.band_index(band)?;
        self.check(Self::band_control(idx), value)?;
        self.eq.set_target(idx, value);
        Ok(())
    }

    /// Write one EQ band immediately, bypassing the ramp, and leave the
    /// ramp synchronised to it. For initialisation to a known value; not
    /// click-free.
    pub fn set_eq_band_now(&mut self, band: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let idx = self.band_index(band)?;
        self.check(Self::band_control(idx), value)?;
        self.modify(reg::eq_band_addr(band), value as u16, 0x7F)?;
        self.eq.set_now(idx, value);
        Ok(())
    }

    /// The band gain currently in the hardware register (a ramp may still
    /// be in flight toward a different target).
    pub fn eq_band(&mut self, band: u8) -> Result<u8, Error<I2C::Error>> {
        self.band_index(band)?;
        Ok((self.read_register(reg::eq_band_addr(band))? & 0x7F) as u8)
    }

    /// The value the band is ramping toward.
    pub fn eq_band_target(&self, band: u8) -> Result<u8, Error<I2C::Error>> {
        let idx = self.band_index(band)?;
        Ok(self.eq.target(idx))
    }

    /// Whether a band still has a ramp in flight.
    pub fn eq_band_ramping(&self, band: u8) -> Result<bool, Error<I2C::Error>> {
        let idx = self.band_index(band)?;
        Ok(self.eq.is_pending(idx))
    }

    // ── Ramp tick ──────────────────────────────────────────────────────

    /// Advance every pending EQ band ramp by one bounded step and write
    /// the moved bands to the hardware — one register write per moved
    /// band, nothing at all for idle bands.
    ///
    /// Call this on a regular cadence: fast enough that a full-range ramp
    /// (48 steps) completes in an acceptable time, slow enough not to
    /// saturate the bus. If a pass is already in progress the call is a
    /// complete no-op; the guard only covers re-entry, it is not a lock
    /// (see the module docs).
    pub fn tick(&mut self) -> Result<(), Error<I2C::Error>> {
        if !self.eq.begin_pass() {
            return Ok(());
        }
        for band in 0..BAND_COUNT {
            if let Some(value) = self.eq.step(band) {
                if let Err(e) = self.modify(reg::eq_band_addr(band as u8), value as u16, 0x7F) {
                    self.eq.end_pass();
                    return Err(Error::Bus(e));
                }
            }
        }
        self.eq.end_pass();
        Ok(())
    }

    // ── Defaults and debugging ─────────────────────────────────────────

    /// Drive every control to the rig's known starting state: line-in
    /// selected at a mid-scale level, DAC at 0 dB, line-out and headphones
    /// at working levels and unmuted, every DAP block off, EQ flat with
    /// the bands written directly (no ramping) so the ramp engine starts
    /// in sync with the hardware.
    pub fn set_defaults(&mut self) -> Result<(), Error<I2C::Error>> {
        self.set_input(InputSource::LineIn)?;
        self.set_mic_gain(1)?; // +20 dB
        self.set_line_in_level(7)?;
        self.set_dac_volume(0)?; // 0 dB
        self.set_dac_volume_ramp(DacRamp::Exponential)?;
        self.set_line_out_level(13)?;
        self.set_headphone_select(HeadphoneSource::Dac)?;
        self.set_headphone_volume(97)?; // ~0 dB
        self.set_mute_headphone(false)?;
        self.set_mute_lineout(false)?;
        self.set_adc_high_pass(AdcHighPass::Enabled)?;
        self.set_dap_enable(DapMode::Off)?;
        self.set_surround_enable(SurroundMode::Off)?;
        self.set_surround_width(4)?;
        self.set_bass_enhance_enable(false)?;
        self.set_bass_cutoff_enable(false)?;
        self.set_bass_cutoff_freq(4)?; // 175 Hz
        self.set_bass_boost(96)?;
        self.set_bass_volume(58)?;
        self.set_eq_select(EqMode::Off)?;
        for band in 0..BAND_COUNT as u8 {
            self.set_eq_band_now(band, reg::EQ_BAND_FLAT)?;
        }
        Ok(())
    }

    /// Log every readable CC value (`defmt` feature; otherwise a no-op).
    pub fn dump(&mut self) -> Result<(), Error<I2C::Error>> {
        #[cfg(feature = "defmt")]
        for control in Control::ALL {
            if control.is_write_only() {
                continue;
            }
            let Some(cc) = self.map.cc(control) else {
                continue;
            };
            let value = self.get_cc(cc)?;
            defmt::info!("cc {=u8} {=str} = {=u8}", cc, control.name(), value);
        }
        Ok(())
    }

    // ── Release ────────────────────────────────────────────────────────

    /// Consume the driver and return the I2C bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    // ── Private helpers ────────────────────────────────────────────────

    /// Reject values the Control Descriptor rules out. Monadic commands
    /// have no bounded range.
    fn check(&self, control: Control, value: u8) -> Result<(), Error<I2C::Error>> {
        let max = control.max();
        if max != MONADIC_MAX && value > max {
            return Err(Error::ValueOutOfRange {
                control,
                value,
                max,
            });
        }
        Ok(())
    }

    fn band_index(&self, band: u8) -> Result<usize, Error<I2C::Error>> {
        if (band as usize) < BAND_COUNT {
            Ok(band as usize)
        } else {
            Err(Error::InvalidBand(band))
        }
    }

    fn band_control(idx: usize) -> Control {
        match idx {
            0 => Control::EqBand0,
            1 => Control::EqBand1,
            2 => Control::EqBand2,
            3 => Control::EqBand3,
            _ => Control::EqBand4,
        }
    }

    /// DAC register field for a user value: 0x3C = 0 dB, 0xFC = mute.
    fn dac_field(value: u8) -> u16 {
        if value == 127 {
            reg::DAC_VOL_MUTE
        } else {
            reg::DAC_VOL_0DB + value as u16
        }
    }

    /// Inverse of [`dac_field`](Self::dac_field), tolerant of the chip's
    /// wider native range.
    fn dac_user(field: u16) -> u8 {
        if field >= reg::DAC_VOL_MUTE {
            127
        } else {
            field.saturating_sub(reg::DAC_VOL_0DB).min(126) as u8
        }
    }

    fn unmute_headphone_for(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        if value > 0 && self.hp_muted {
            self.set_mute_headphone(false)?;
        }
        Ok(())
    }

    fn unmute_lineout_for(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        if value > 0 && self.lineout_muted {
            self.set_mute_lineout(false)?;
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{self, ErrorType, Operation};

    // ── Mock I2C with register file ───────────────────────────────────

    #[derive(Debug, PartialEq)]
    struct MockError;

    impl i2c::Error for MockError {
        fn kind(&self) -> i2c::ErrorKind {
            i2c::ErrorKind::Other
        }
    }

    /// Mock I2C that maintains a register file and records writes, with
    /// optional failure injection on the nth write.
    struct MockI2c {
        regs: [(u16, u16); 64],
        reg_count: usize,
        /// Write log in chronological order.
        log: [(u16, u16); 256],
        log_count: usize,
        /// Index of the write operation that should fail, if any.
        fail_write_at: Option<usize>,
    }

    impl MockI2c {
        fn new() -> Self {
            Self {
                regs: [(0, 0); 64],
                reg_count: 0,
                log: [(0, 0); 256],
                log_count: 0,
                fail_write_at: None,
            }
        }

        /// Look up current register value, returning 0 if never written.
        fn read_reg(&self, addr: u16) -> u16 {
            for i in 0..self.reg_count {
                if self.regs[i].0 == addr {
                    return self.regs[i].1;
                }
            }
            0
        }

        /// Set a register value (update or insert).
        fn set_reg(&mut self, addr: u16, val: u16) {
            for i in 0..self.reg_count {
                if self.regs[i].0 == addr {
                    self.regs[i].1 = val;
                    return;
                }
            }
            self.regs[self.reg_count] = (addr, val);
            self.reg_count += 1;
        }
    }

    impl ErrorType for MockI2c {
        type Error = MockError;
    }

    impl i2c::I2c for MockI2c {
        fn read(&mut self, _addr: u8, _buf: &mut [u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn write(&mut self, _addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
            if bytes.len() == 4 {
                if self.fail_write_at == Some(self.log_count) {
                    return Err(MockError);
                }
                let reg = ((bytes[0] as u16) << 8) | bytes[1] as u16;
                let val = ((bytes[2] as u16) << 8) | bytes[3] as u16;
                self.set_reg(reg, val);
                self.log[self.log_count] = (reg, val);
                self.log_count += 1;
            }
            Ok(())
        }

        fn write_read(
            &mut self,
            _addr: u8,
            wr: &[u8],
            rd: &mut [u8],
        ) -> Result<(), Self::Error> {
            if wr.len() >= 2 && rd.len() >= 2 {
                let reg = ((wr[0] as u16) << 8) | wr[1] as u16;
                let val = self.read_reg(reg);
                rd[0] = (val >> 8) as u8;
                rd[1] = val as u8;
            }
            Ok(())
        }

        fn transaction(
            &mut self,
            _addr: u8,
            _ops: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    // ── Mock delay (no-op) ────────────────────────────────────────────

    struct MockDelay;

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    // ── Helpers ───────────────────────────────────────────────────────

    fn enabled_codec() -> Sgtl5000<MockI2c, MockDelay> {
        let mut c = Sgtl5000::new(MockI2c::new(), MockDelay);
        c.enable().unwrap();
        c
    }

    // ── Power-on ──────────────────────────────────────────────────────

    #[test]
    fn enable_writes_configuration_sequence() {
        let codec = enabled_codec();
        assert_eq!(codec.i2c.log_count, 16);

        // spot-check the critical writes
        assert_eq!(codec.i2c.log[0], (reg::CHIP_ANA_POWER, 0x4060));
        assert_eq!(codec.i2c.log[6], (reg::CHIP_ANA_POWER, 0x40FF));
        assert_eq!(codec.i2c.log[7], (reg::CHIP_DIG_POWER, 0x0073));
        assert_eq!(codec.i2c.log[10], (reg::CHIP_I2S_CTRL, 0x0030));
        assert_eq!(codec.i2c.log[13], (reg::CHIP_DAC_VOL, 0x3C3C));
        assert_eq!(codec.i2c.log[15], (reg::CHIP_ANA_CTRL, 0x0036));

        // soft state after power-on: mirror current, headphones muted
        assert_eq!(codec.ana_ctrl.bits(), 0x0036);
        assert!(codec.hp_muted());
        assert!(!codec.lineout_muted());
        assert_eq!(codec.input(), InputSource::LineIn);
    }

    #[test]
    fn enable_bails_on_warm_restart() {
        let mut i2c = MockI2c::new();
        // chip already configured from a previous boot, headphones live
        i2c.set_reg(reg::CHIP_I2S_CTRL, 0x0030);
        i2c.set_reg(reg::CHIP_ANA_CTRL, 0x0026);

        let mut codec = Sgtl5000::new(i2c, MockDelay);
        codec.enable().unwrap();

        assert_eq!(codec.i2c.log_count, 0, "warm restart must not rewrite");
        assert_eq!(codec.ana_ctrl.bits(), 0x0026);
        assert!(!codec.hp_muted());
        assert!(!codec.lineout_muted());
    }

    // ── Dispatch basics ───────────────────────────────────────────────

    #[test]
    fn unknown_cc_is_a_silent_no_op() {
        let mut codec = enabled_codec();
        let before = codec.i2c.log_count;
        assert_eq!(codec.dispatch(0, 127), Ok(()));
        assert_eq!(codec.dispatch(127, 5), Ok(()));
        assert_eq!(codec.i2c.log_count, before);
    }

    #[test]
    fn out_of_range_value_is_rejected_before_the_bus() {
        let mut codec = enabled_codec();
        let before = codec.i2c.log_count;
        // MIC_GAIN tops out at 3
        assert_eq!(
            codec.dispatch(33, 4),
            Err(Error::ValueOutOfRange {
                control: Control::MicGain,
                value: 4,
                max: 3
            })
        );
        assert_eq!(codec.i2c.log_count, before);
    }

    #[test]
    fn write_only_ccs_read_zero() {
        let mut codec = enabled_codec();
        codec.dispatch(38, 50).unwrap();
        codec.dispatch(39, 50).unwrap();
        // the aggregate has no state of its own, the halves do
        assert_eq!(codec.get_cc(37), Ok(0));
        assert_eq!(codec.get_cc(38), Ok(50));
        assert_eq!(codec.get_cc(39), Ok(50));
        // dump / set-defaults likewise
        assert_eq!(codec.get_cc(30), Ok(0));
        assert_eq!(codec.get_cc(31), Ok(0));
        // unmapped numbers too
        assert_eq!(codec.get_cc(0), Ok(0));
    }

    // ── DAC volume inversion ──────────────────────────────────────────

    #[test]
    fn dac_volume_zero_is_unity_gain() {
        let mut codec = enabled_codec();
        codec.dispatch(38, 0).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_DAC_VOL) & 0xFF, 0x3C);
    }

    #[test]
    fn dac_volume_full_scale_is_mute() {
        let mut codec = enabled_codec();
        codec.dispatch(38, 127).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_DAC_VOL) & 0xFF, 0xFC);
        assert_eq!(codec.get_cc(38), Ok(127));
    }

    #[test]
    fn dac_volume_attenuation_grows_with_value() {
        let mut codec = enabled_codec();
        let mut last = 0;
        for v in [0u8, 1, 40, 126] {
            codec.dispatch(38, v).unwrap();
            let field = codec.i2c.read_reg(reg::CHIP_DAC_VOL) & 0xFF;
            assert!(field >= last, "attenuation must not decrease");
            assert_eq!(field, 0x3C + v as u16);
            last = field;
            // and the getter inverts it back
            assert_eq!(codec.get_cc(38), Ok(v));
        }
    }

    #[test]
    fn dac_volume_pair_packs_both_bytes() {
        let mut codec = enabled_codec();
        codec.dispatch(38, 10).unwrap();
        codec.dispatch(39, 20).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_DAC_VOL), (0x50 << 8) | 0x46);
    }

    // ── Stereo aggregates ─────────────────────────────────────────────

    #[test]
    fn stereo_setter_applies_left_even_when_right_fails() {
        let mut codec = enabled_codec();
        // enable leaves LINE_OUT_VOL at 0x1D1D; fail the right-channel
        // write (the 18th write overall: 16 enable + left + right)
        codec.i2c.fail_write_at = Some(17);

        let result = codec.set_line_out_level(13);
        assert_eq!(result, Err(Error::Bus(MockError)));

        let vol = codec.i2c.read_reg(reg::CHIP_LINE_OUT_VOL);
        assert_eq!(vol & 0x1F, 18, "left write must have taken effect");
        assert_eq!((vol >> 8) & 0x1F, 0x1D, "right field untouched");
    }

    #[test]
    fn stereo_setter_success_needs_both() {
        let mut codec = enabled_codec();
        assert_eq!(codec.set_headphone_volume(97), Ok(()));
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_HP_CTRL), 0x1E1E);
    }

    // ── Line levels ───────────────────────────────────────────────────

    #[test]
    fn line_in_levels_pack_nibbles_independently() {
        let mut codec = enabled_codec();
        codec.dispatch(35, 15).unwrap();
        codec.dispatch(36, 3).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_ADC_CTRL), 0x3F);
        assert_eq!(codec.get_cc(35), Ok(15));
        assert_eq!(codec.get_cc(36), Ok(3));
    }

    #[test]
    fn line_out_scale_is_flipped_into_the_register() {
        let mut codec = enabled_codec();
        codec.dispatch(42, 18).unwrap();
        // 18 on the ascending scale is the chip's 13
        assert_eq!(codec.i2c.read_reg(reg::CHIP_LINE_OUT_VOL) & 0x1F, 13);
        assert_eq!(codec.get_cc(42), Ok(18));
    }

    // ── Mute semantics ────────────────────────────────────────────────

    #[test]
    fn nonzero_headphone_volume_clears_the_mute() {
        let mut codec = enabled_codec();
        assert!(codec.hp_muted());

        codec.dispatch(46, 97).unwrap();
        assert!(!codec.hp_muted());
        assert!(!codec.ana_ctrl.hp_muted());
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_CTRL), 0x0026);
    }

    #[test]
    fn zero_volume_does_not_mute_by_itself() {
        let mut codec = enabled_codec();
        codec.dispatch(46, 97).unwrap();
        assert!(!codec.hp_muted());

        codec.dispatch(46, 0).unwrap();
        assert!(!codec.hp_muted(), "muting is only ever explicit");
    }

    #[test]
    fn nonzero_lineout_level_clears_the_mute() {
        let mut codec = enabled_codec();
        codec.dispatch(49, 1).unwrap();
        assert!(codec.lineout_muted());

        codec.dispatch(42, 5).unwrap();
        assert!(!codec.lineout_muted());
    }

    #[test]
    fn explicit_mute_owns_only_its_bit() {
        let mut codec = enabled_codec();
        codec.dispatch(49, 1).unwrap();
        // MUTE_LO set, everything else from enable() preserved
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_CTRL), 0x0136);
        assert_eq!(codec.get_cc(49), Ok(1));

        codec.dispatch(48, 0).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_CTRL), 0x0126);
        assert_eq!(codec.get_cc(48), Ok(0));
    }

    // ── Shared-register packing ───────────────────────────────────────

    #[test]
    fn mic_gain_preserves_bias_configuration() {
        let mut codec = enabled_codec();
        codec.write_register(reg::CHIP_MIC_CTRL, 0x0170).unwrap();
        codec.dispatch(33, 2).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_MIC_CTRL), 0x0172);
        assert_eq!(codec.get_cc(33), Ok(2));
    }

    #[test]
    fn headphone_select_toggles_one_bit() {
        let mut codec = enabled_codec();
        codec.dispatch(44, 1).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_CTRL), 0x0076);
        assert_eq!(codec.get_cc(44), Ok(1));

        codec.dispatch(44, 0).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_CTRL), 0x0036);
        assert_eq!(codec.get_cc(44), Ok(0));
    }

    #[test]
    fn input_select_changes_no_gains() {
        let mut codec = enabled_codec();
        codec.dispatch(35, 9).unwrap();
        codec.dispatch(32, 1).unwrap(); // mic
        assert_eq!(codec.input(), InputSource::Mic);
        // the line-in gain register is untouched by input selection
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_ADC_CTRL) & 0xF, 9);
        codec.dispatch(32, 0).unwrap(); // back to line-in
        assert_eq!(codec.get_cc(32), Ok(0));
    }

    // ── DAP blocks ────────────────────────────────────────────────────

    #[test]
    fn dap_routing_modes() {
        let mut codec = enabled_codec();

        codec.dispatch(51, 1).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::DAP_CONTROL), 1);
        assert_eq!(codec.i2c.read_reg(reg::CHIP_SSS_CTRL), reg::SSS_ROUTE_DAP_PRE);
        assert_eq!(codec.get_cc(51), Ok(1));

        codec.dispatch(51, 2).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_SSS_CTRL), reg::SSS_ROUTE_DAP_POST);

        codec.dispatch(51, 0).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::DAP_CONTROL), 0);
        assert_eq!(codec.i2c.read_reg(reg::CHIP_SSS_CTRL), reg::SSS_ROUTE_DEFAULT);
        assert_eq!(codec.get_cc(51), Ok(0));
    }

    #[test]
    fn surround_and_width_share_a_register() {
        let mut codec = enabled_codec();
        codec.dispatch(52, 2).unwrap(); // stereo
        codec.dispatch(53, 7).unwrap(); // widest
        assert_eq!(codec.i2c.read_reg(reg::DAP_SGTL_SURROUND), (7 << 4) | 3);
        assert_eq!(codec.get_cc(52), Ok(2));
        assert_eq!(codec.get_cc(53), Ok(7));
    }

    #[test]
    fn bass_enhance_fields_roundtrip() {
        let mut codec = enabled_codec();
        codec.dispatch(54, 1).unwrap();
        codec.dispatch(55, 1).unwrap();
        codec.dispatch(56, 6).unwrap();
        codec.dispatch(57, 96).unwrap();
        codec.dispatch(58, 58).unwrap();

        assert_eq!(
            codec.i2c.read_reg(reg::DAP_BASS_ENHANCE),
            (1 << 8) | (6 << 4) | 1
        );
        // both level fields are inverted in the register
        assert_eq!(
            codec.i2c.read_reg(reg::DAP_BASS_ENHANCE_CTRL),
            ((0x3F - 58) << 8) | (0x7F - 96)
        );
        assert_eq!(codec.get_cc(54), Ok(1));
        assert_eq!(codec.get_cc(55), Ok(1));
        assert_eq!(codec.get_cc(56), Ok(6));
        assert_eq!(codec.get_cc(57), Ok(96));
        assert_eq!(codec.get_cc(58), Ok(58));
    }

    #[test]
    fn adc_high_pass_modes() {
        let mut codec = enabled_codec();
        codec.dispatch(50, 2).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ADCDAC_CTRL) & 0x3, 1);
        assert_eq!(codec.get_cc(50), Ok(2));

        codec.dispatch(50, 1).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ADCDAC_CTRL) & 0x3, 2);
        assert_eq!(codec.get_cc(50), Ok(1));

        codec.dispatch(50, 0).unwrap();
        assert_eq!(codec.get_cc(50), Ok(0));
    }

    #[test]
    fn dac_ramp_and_hpf_share_their_register() {
        let mut codec = enabled_codec();
        codec.dispatch(40, 0).unwrap(); // exponential ramp
        codec.dispatch(50, 2).unwrap(); // HPF bypass
        let v = codec.i2c.read_reg(reg::CHIP_ADCDAC_CTRL);
        assert_eq!(v & 0x300, 0x300, "ramp bits preserved");
        assert_eq!(v & 0x3, 1, "bypass set");
        assert_eq!(codec.get_cc(40), Ok(0));
    }

    // ── EQ bands and ramping ──────────────────────────────────────────

    #[test]
    fn eq_band_dispatch_defers_to_the_ramp() {
        let mut codec = enabled_codec();
        let before = codec.i2c.log_count;
        codec.dispatch(60, 95).unwrap();
        assert_eq!(codec.i2c.log_count, before, "no direct register write");
        assert_eq!(codec.eq_band_target(0), Ok(95));
        assert_eq!(codec.eq_band_ramping(0), Ok(true));
    }

    #[test]
    fn ramp_converges_monotonically_in_forty_ticks() {
        let mut codec = enabled_codec();
        codec.set_eq_band_now(0, 15).unwrap();
        codec.dispatch(60, 95).unwrap();

        let mut last = 15u16;
        for tick in 1..=40 {
            let before = codec.i2c.log_count;
            codec.tick().unwrap();
            assert_eq!(codec.i2c.log_count, before + 1, "one write per tick");

            let v = codec.i2c.read_reg(reg::eq_band_addr(0)) & 0x7F;
            assert!(v > last && v - last <= 2, "bounded monotonic step");
            assert!(v <= 95, "no overshoot");
            last = v;

            let ramping = codec.eq_band_ramping(0).unwrap();
            assert_eq!(ramping, tick < 40, "pending until the final tick");
        }
        assert_eq!(last, 95);
    }

    #[test]
    fn tick_at_target_is_idempotent() {
        let mut codec = enabled_codec();
        codec.set_eq_band_now(2, 60).unwrap();
        let before = codec.i2c.log_count;
        codec.tick().unwrap();
        codec.tick().unwrap();
        assert_eq!(codec.i2c.log_count, before, "no writes once settled");
        assert_eq!(codec.eq_band_ramping(2), Ok(false));
    }

    #[test]
    fn reentered_tick_is_a_complete_no_op() {
        let mut codec = enabled_codec();
        codec.dispatch(61, 80).unwrap();

        // simulate re-entry while a pass is still on the bus
        assert!(codec.eq.begin_pass());
        let before = codec.i2c.log_count;
        codec.tick().unwrap();
        assert_eq!(codec.i2c.log_count, before);
        assert_eq!(codec.eq.value(1), reg::EQ_BAND_FLAT);

        codec.eq.end_pass();
        codec.tick().unwrap();
        assert_eq!(codec.i2c.log_count, before + 1);
    }

    #[test]
    fn tick_releases_the_guard_on_bus_failure() {
        let mut codec = enabled_codec();
        codec.dispatch(60, 95).unwrap();
        codec.i2c.fail_write_at = Some(codec.i2c.log_count);

        assert_eq!(codec.tick(), Err(Error::Bus(MockError)));
        // next tick must still be able to claim the guard
        codec.i2c.fail_write_at = None;
        let before = codec.i2c.log_count;
        codec.tick().unwrap();
        assert_eq!(codec.i2c.log_count, before + 1);
    }

    #[test]
    fn direct_band_write_bypasses_the_ramp() {
        let mut codec = enabled_codec();
        codec.dispatch(64, 90).unwrap();
        codec.set_eq_band_now(4, 20).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::eq_band_addr(4)) & 0x7F, 20);
        assert_eq!(codec.eq_band_ramping(4), Ok(false));
        assert_eq!(codec.eq_band(4), Ok(20));
    }

    #[test]
    fn band_index_is_validated() {
        let mut codec = enabled_codec();
        assert_eq!(codec.set_eq_band(5, 10), Err(Error::InvalidBand(5)));
        assert_eq!(codec.eq_band(9), Err(Error::InvalidBand(9)));
    }

    // ── Defaults ──────────────────────────────────────────────────────

    #[test]
    fn set_defaults_reaches_the_documented_state() {
        let mut codec = enabled_codec();
        codec.dispatch(31, 0).unwrap();

        assert_eq!(codec.i2c.read_reg(reg::CHIP_MIC_CTRL) & 0x3, 1);
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_ADC_CTRL), 0x77);
        assert_eq!(codec.i2c.read_reg(reg::CHIP_DAC_VOL), 0x3C3C);
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ADCDAC_CTRL) & 0x303, 0x300);
        assert_eq!(codec.i2c.read_reg(reg::CHIP_LINE_OUT_VOL), 0x1212);
        assert_eq!(codec.i2c.read_reg(reg::CHIP_ANA_HP_CTRL), 0x1E1E);
        assert!(!codec.hp_muted());
        assert!(!codec.lineout_muted());
        assert_eq!(codec.i2c.read_reg(reg::CHIP_SSS_CTRL), reg::SSS_ROUTE_DEFAULT);
        assert_eq!(codec.i2c.read_reg(reg::DAP_CONTROL), 0);
        assert_eq!(codec.i2c.read_reg(reg::DAP_SGTL_SURROUND), 4 << 4);
        assert_eq!(codec.i2c.read_reg(reg::DAP_BASS_ENHANCE), 4 << 4);
        assert_eq!(codec.i2c.read_reg(reg::DAP_AUDIO_EQ) & 0x3, 0);
        for band in 0..BAND_COUNT as u8 {
            assert_eq!(
                codec.i2c.read_reg(reg::eq_band_addr(band)) & 0x7F,
                reg::EQ_BAND_FLAT as u16
            );
            assert_eq!(codec.eq_band_ramping(band), Ok(false));
            assert_eq!(codec.eq_band_target(band), Ok(reg::EQ_BAND_FLAT));
        }
    }

    // ── CC map profiles ───────────────────────────────────────────────

    #[test]
    fn legacy_map_shifts_the_numbering() {
        let mut codec = enabled_codec();
        codec.set_cc_map(CcMap::V1);
        assert_eq!(codec.cc_map(), CcMap::V1);

        // 37 is DAC_VOLUME_LEFT on the legacy map (38 on the current one)
        codec.dispatch(37, 10).unwrap();
        assert_eq!(codec.i2c.read_reg(reg::CHIP_DAC_VOL) & 0xFF, 0x46);
        assert_eq!(codec.get_cc(37), Ok(10));

        // 64 is past the legacy block
        let before = codec.i2c.log_count;
        codec.dispatch(64, 5).unwrap();
        assert_eq!(codec.i2c.log_count, before);
    }

    // ── Addressing ────────────────────────────────────────────────────

    #[test]
    fn custom_address() {
        let codec = Sgtl5000::with_address(MockI2c::new(), MockDelay, 0x2A);
        assert_eq!(
            codec.address,
            Sgtl5000::<MockI2c, MockDelay>::ALT_ADDRESS
        );
    }

    #[test]
    fn release_returns_peripherals() {
        let codec = enabled_codec();
        let (_i2c, _delay) = codec.release();
    }
}
