//! SGTL5000 register addresses and bitfield definitions.
//!
//! Register addresses are 16-bit and every register holds a 16-bit value;
//! the I2C protocol is big-endian for both. Only the registers the CC
//! dispatcher touches are listed; the parametric-EQ coefficient and
//! auto-volume-control blocks are deliberately absent.

// A few band registers exist only so tests can name them directly.
#![allow(dead_code)]

// ── I2C addresses ──────────────────────────────────────────────────────────

/// Default I2C address (CTRL_ADR0_CS pin low).
pub const I2C_ADDR_CS_LOW: u8 = 0x0A;

/// Alternate I2C address (CTRL_ADR0_CS pin high).
pub const I2C_ADDR_CS_HIGH: u8 = 0x2A;

// ── Digital power and clocking ─────────────────────────────────────────────

/// Digital block power control.
/// - Bit 6 — ADC_POWERUP
/// - Bit 5 — DAC_POWERUP
/// - Bit 4 — DAP_POWERUP
/// - Bit 1 — I2S_OUT_POWERUP
/// - Bit 0 — I2S_IN_POWERUP
pub const CHIP_DIG_POWER: u16 = 0x0002;

/// Clock control.
/// - Bits 5:4 — RATE_MODE
/// - Bits 3:2 — SYS_FS (0=32k, 1=44.1k, 2=48k, 3=96k)
/// - Bits 1:0 — MCLK_FREQ (0=256Fs, 1=384Fs, 2=512Fs, 3=PLL)
pub const CHIP_CLK_CTRL: u16 = 0x0004;

/// I2S port control.
/// - Bit 8   — SCLKFREQ (0=64Fs, 1=32Fs)
/// - Bit 7   — MS (0=slave, 1=master)
/// - Bits 5:4 — DLEN (0=32bit, 1=24bit, 2=20bit, 3=16bit)
/// - Bits 3:2 — I2S_MODE
pub const CHIP_I2S_CTRL: u16 = 0x0006;

// ── Signal routing ─────────────────────────────────────────────────────────

/// Source-select control for signal routing.
/// - Bits 9:8 — DAP_MIX_SELECT (0=ADC, 1=I2S)
/// - Bits 7:6 — DAP_SELECT     (0=ADC, 1=I2S)
/// - Bits 5:4 — DAC_SELECT     (0=ADC, 1=I2S, 3=DAP)
/// - Bits 1:0 — I2S_SELECT     (0=ADC, 1=I2S, 3=DAP)
pub const CHIP_SSS_CTRL: u16 = 0x000A;

/// I2S input → DAC, ADC → I2S output (DAP out of the path).
pub const SSS_ROUTE_DEFAULT: u16 = 0x0010;

/// ADC → DAP → I2S output: processing applied before the stream leaves.
pub const SSS_ROUTE_DAP_PRE: u16 = 0x0013;

/// I2S input → DAP → DAC: processing applied on the way to the outputs.
pub const SSS_ROUTE_DAP_POST: u16 = 0x0070;

// ── ADC/DAC control ────────────────────────────────────────────────────────

/// ADC/DAC shared control.
/// - Bit  9 — VOL_RAMP_EN
/// - Bit  8 — VOL_EXPO_RAMP
/// - Bit  3 — DAC_MUTE_RIGHT
/// - Bit  2 — DAC_MUTE_LEFT
/// - Bit  1 — ADC_HPF_FREEZE
/// - Bit  0 — ADC_HPF_BYPASS
pub const CHIP_ADCDAC_CTRL: u16 = 0x000E;

/// DAC digital volume, 0.5 dB steps.
/// - Bits 15:8 — DAC_VOL_RIGHT (0x3C = 0 dB, 0xFC and up = muted)
/// - Bits  7:0 — DAC_VOL_LEFT
pub const CHIP_DAC_VOL: u16 = 0x0010;

/// Register field for 0 dB DAC volume.
pub const DAC_VOL_0DB: u16 = 0x3C;

/// Lowest register field that mutes the DAC outright.
pub const DAC_VOL_MUTE: u16 = 0xFC;

// ── Analog section ─────────────────────────────────────────────────────────

/// Analog ADC gain control.
/// - Bit 8   — ADC_VOL_M6DB (extra −6 dB range shift)
/// - Bits 7:4 — ADC_VOL_RIGHT (0..=15, 1.5 dB steps)
/// - Bits 3:0 — ADC_VOL_LEFT
pub const CHIP_ANA_ADC_CTRL: u16 = 0x0020;

/// Headphone amplifier volume, 0.5 dB steps.
/// - Bits 14:8 — HP_VOL_RIGHT (0x00 = +12 dB, 0x7F = −51.5 dB)
/// - Bits  6:0 — HP_VOL_LEFT
pub const CHIP_ANA_HP_CTRL: u16 = 0x0022;

/// Analog control: mutes, input/output selection, zero-cross detect.
/// See [`AnaCtrl`] for the named bit accessors.
pub const CHIP_ANA_CTRL: u16 = 0x0024;

/// Linear regulator control.
pub const CHIP_LINREG_CTRL: u16 = 0x0026;

/// Reference voltage / bias control.
/// - Bits 8:4 — VAG_VAL (analog ground, 25 mV steps)
/// - Bits 3:1 — BIAS_CTRL
/// - Bit    0 — SMALL_POP (slow VAG ramp)
pub const CHIP_REF_CTRL: u16 = 0x0028;

/// Microphone gain and bias control.
/// - Bits 9:8 — BIAS_RESISTOR
/// - Bits 6:4 — BIAS_VOLT
/// - Bits 1:0 — GAIN (0=0dB, 1=+20dB, 2=+30dB, 3=+40dB)
pub const CHIP_MIC_CTRL: u16 = 0x002A;

/// Line-out amplifier bias / analog ground control.
pub const CHIP_LINE_OUT_CTRL: u16 = 0x002C;

/// Line-out volume, 0.5 dB steps. The raw field is inverted: larger
/// values mean less output swing.
/// - Bits 12:8 — LO_VOL_RIGHT
/// - Bits  4:0 — LO_VOL_LEFT
pub const CHIP_LINE_OUT_VOL: u16 = 0x002E;

/// Analog power-down control.
pub const CHIP_ANA_POWER: u16 = 0x0030;

/// Short-circuit detection control.
pub const CHIP_SHORT_CTRL: u16 = 0x003C;

// ── Digital Audio Processor (DAP) ──────────────────────────────────────────

/// DAP master enable.
pub const DAP_CONTROL: u16 = 0x0100;

/// Bass enhancement enable/config.
/// - Bit 8   — HPF bypass (cutoff enable)
/// - Bits 6:4 — cutoff frequency (0=80Hz .. 6=225Hz)
/// - Bit 0   — enable
pub const DAP_BASS_ENHANCE: u16 = 0x0104;

/// Bass enhancement level control. Both fields are inverted: 0 is the
/// loudest setting.
/// - Bits 13:8 — LR_LEVEL (main channel, 6-bit)
/// - Bits  6:0 — BASS_LEVEL (harmonics boost, 7-bit)
pub const DAP_BASS_ENHANCE_CTRL: u16 = 0x0106;

/// Audio EQ mode select (0=off, 1=PEQ, 2=tone controls, 3=graphic EQ).
pub const DAP_AUDIO_EQ: u16 = 0x0108;

/// Surround-sound control.
/// - Bits 6:4 — WIDTH (0..=7)
/// - Bits 1:0 — SELECT (0/1=off, 2=mono, 3=stereo)
pub const DAP_SGTL_SURROUND: u16 = 0x010A;

/// 5-band graphic EQ band registers, 2 apart. Each holds a 0..=0x5F gain,
/// 0.25 dB per step, 0x2F = 0 dB; band 0 doubles as the tone-control bass
/// and band 4 as the treble.
pub const DAP_AUDIO_EQ_BASS_BAND0: u16 = 0x0116; // 115 Hz
pub const DAP_AUDIO_EQ_BAND1: u16 = 0x0118; // 330 Hz
pub const DAP_AUDIO_EQ_BAND2: u16 = 0x011A; // 990 Hz
pub const DAP_AUDIO_EQ_BAND3: u16 = 0x011C; // 3000 Hz
pub const DAP_AUDIO_EQ_TREBLE_BAND4: u16 = 0x011E; // 9900 Hz

/// EQ band register field for 0 dB (flat).
pub const EQ_BAND_FLAT: u8 = 0x2F;

/// Address of a graphic-EQ band register, band in 0..=4.
pub const fn eq_band_addr(band: u8) -> u16 {
    DAP_AUDIO_EQ_BASS_BAND0 + 2 * band as u16
}

// ── CHIP_ANA_CTRL bitfield ─────────────────────────────────────────────────

/// Value type for the shared `CHIP_ANA_CTRL` register.
///
/// Several unrelated controls live as single bits in this register, and the
/// chip gives no trustworthy read-back, so the driver keeps one of these as
/// a soft mirror and edits it through the named accessors instead of
/// open-coded mask arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnaCtrl(u16);

impl AnaCtrl {
    const MUTE_ADC: u16 = 1 << 0;
    const EN_ZCD_ADC: u16 = 1 << 1;
    const SELECT_ADC_LINEIN: u16 = 1 << 2;
    const MUTE_HP: u16 = 1 << 4;
    const EN_ZCD_HP: u16 = 1 << 5;
    const SELECT_HP_LINEIN: u16 = 1 << 6;
    const MUTE_LO: u16 = 1 << 8;

    pub const fn from_bits(bits: u16) -> Self {
        AnaCtrl(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    const fn with(self, mask: u16, on: bool) -> Self {
        if on {
            AnaCtrl(self.0 | mask)
        } else {
            AnaCtrl(self.0 & !mask)
        }
    }

    pub const fn hp_muted(self) -> bool {
        self.0 & Self::MUTE_HP != 0
    }

    pub const fn with_hp_muted(self, muted: bool) -> Self {
        self.with(Self::MUTE_HP, muted)
    }

    pub const fn lineout_muted(self) -> bool {
        self.0 & Self::MUTE_LO != 0
    }

    pub const fn with_lineout_muted(self, muted: bool) -> Self {
        self.with(Self::MUTE_LO, muted)
    }

    /// ADC source: true = line-in, false = microphone.
    pub const fn linein_selected(self) -> bool {
        self.0 & Self::SELECT_ADC_LINEIN != 0
    }

    pub const fn with_linein_selected(self, linein: bool) -> Self {
        self.with(Self::SELECT_ADC_LINEIN, linein)
    }

    /// Headphone source: true = line-in bypass, false = DAC.
    pub const fn hp_bypass(self) -> bool {
        self.0 & Self::SELECT_HP_LINEIN != 0
    }

    pub const fn with_hp_bypass(self, bypass: bool) -> Self {
        self.with(Self::SELECT_HP_LINEIN, bypass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ana_ctrl_edits_only_the_owned_bit() {
        // post-enable value: zero-cross on, line-in selected, HP muted
        let v = AnaCtrl::from_bits(0x0036);
        assert!(v.hp_muted());
        assert!(v.linein_selected());
        assert!(!v.lineout_muted());

        let v = v.with_hp_muted(false);
        assert_eq!(v.bits(), 0x0026);
        assert!(v.linein_selected());

        let v = v.with_lineout_muted(true);
        assert_eq!(v.bits(), 0x0126);
        assert!(!v.hp_muted());

        let v = v.with_hp_bypass(true).with_linein_selected(false);
        assert!(v.hp_bypass());
        assert!(!v.linein_selected());
        assert!(v.lineout_muted());
    }

    #[test]
    fn eq_band_addresses() {
        assert_eq!(eq_band_addr(0), DAP_AUDIO_EQ_BASS_BAND0);
        assert_eq!(eq_band_addr(1), DAP_AUDIO_EQ_BAND1);
        assert_eq!(eq_band_addr(2), DAP_AUDIO_EQ_BAND2);
        assert_eq!(eq_band_addr(3), DAP_AUDIO_EQ_BAND3);
        assert_eq!(eq_band_addr(4), DAP_AUDIO_EQ_TREBLE_BAND4);
    }
}
