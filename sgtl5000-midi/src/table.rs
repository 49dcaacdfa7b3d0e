//! Control Descriptor Table: CC number → control metadata.
//!
//! The CC numbering drifted between firmware revisions of the rig (a
//! command slot was inserted at the base of the range), so the number↔control
//! mapping is selected by a [`CcMap`] profile while the per-control metadata
//! (name, maximum, write-only flag) hangs off the stable [`Control`]
//! identity. Both directions are pure functions; there is no mutable state
//! anywhere in this module.

/// Maximum reported for monadic (fire-and-forget) commands and unmapped CC
/// numbers: no bounded value range exists.
pub const MONADIC_MAX: u8 = 255;

/// Name reported for CC numbers outside the descriptor table.
pub const UNKNOWN_CC_NAME: &str = "UNKNOWN_CC";

/// First CC number of the codec control block.
pub const CC_BASE: u8 = 30;

/// Logical codec controls, independent of CC numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    Dump,
    SetDefaults,
    InputSelect,
    MicGain,
    LineInLevel,
    LineInLevelLeft,
    LineInLevelRight,
    DacVolume,
    DacVolumeLeft,
    DacVolumeRight,
    DacVolumeRamp,
    LineOutLevel,
    LineOutLevelLeft,
    LineOutLevelRight,
    HpSelect,
    HpVolume,
    HpVolumeLeft,
    HpVolumeRight,
    MuteHp,
    MuteLineOut,
    AdcHighPass,
    DapEnable,
    SurroundEnable,
    SurroundWidth,
    BassEnhanceEnable,
    BassCutoffEnable,
    BassCutoffFreq,
    BassBoost,
    BassVolume,
    EqSelect,
    EqBand0,
    EqBand1,
    EqBand2,
    EqBand3,
    EqBand4,
}

impl Control {
    /// Every control, in CC order of the current profile.
    pub const ALL: [Control; 35] = [
        Control::Dump,
        Control::SetDefaults,
        Control::InputSelect,
        Control::MicGain,
        Control::LineInLevel,
        Control::LineInLevelLeft,
        Control::LineInLevelRight,
        Control::DacVolume,
        Control::DacVolumeLeft,
        Control::DacVolumeRight,
        Control::DacVolumeRamp,
        Control::LineOutLevel,
        Control::LineOutLevelLeft,
        Control::LineOutLevelRight,
        Control::HpSelect,
        Control::HpVolume,
        Control::HpVolumeLeft,
        Control::HpVolumeRight,
        Control::MuteHp,
        Control::MuteLineOut,
        Control::AdcHighPass,
        Control::DapEnable,
        Control::SurroundEnable,
        Control::SurroundWidth,
        Control::BassEnhanceEnable,
        Control::BassCutoffEnable,
        Control::BassCutoffFreq,
        Control::BassBoost,
        Control::BassVolume,
        Control::EqSelect,
        Control::EqBand0,
        Control::EqBand1,
        Control::EqBand2,
        Control::EqBand3,
        Control::EqBand4,
    ];

    /// Display name used by debug/CLI tooling.
    pub const fn name(self) -> &'static str {
        match self {
            Control::Dump => "DUMP_SGTL",
            Control::SetDefaults => "SET_DEFAULTS",
            Control::InputSelect => "INPUT_SELECT",
            Control::MicGain => "MIC_GAIN",
            Control::LineInLevel => "LINEIN_LEVEL",
            Control::LineInLevelLeft => "LINEIN_LEVEL_LEFT",
            Control::LineInLevelRight => "LINEIN_LEVEL_RIGHT",
            Control::DacVolume => "DAC_VOLUME",
            Control::DacVolumeLeft => "DAC_VOLUME_LEFT",
            Control::DacVolumeRight => "DAC_VOLUME_RIGHT",
            Control::DacVolumeRamp => "DAC_VOLUME_RAMP",
            Control::LineOutLevel => "LINEOUT_LEVEL",
            Control::LineOutLevelLeft => "LINEOUT_LEVEL_LEFT",
            Control::LineOutLevelRight => "LINEOUT_LEVEL_RIGHT",
            Control::HpSelect => "HP_SELECT",
            Control::HpVolume => "HP_VOLUME",
            Control::HpVolumeLeft => "HP_VOLUME_LEFT",
            Control::HpVolumeRight => "HP_VOLUME_RIGHT",
            Control::MuteHp => "MUTE_HP",
            Control::MuteLineOut => "MUTE_LINEOUT",
            Control::AdcHighPass => "ADC_HIGH_PASS",
            Control::DapEnable => "DAP_ENABLE",
            Control::SurroundEnable => "SURROUND_ENABLE",
            Control::SurroundWidth => "SURROUND_WIDTH",
            Control::BassEnhanceEnable => "BASS_ENHANCE_ENABLE",
            Control::BassCutoffEnable => "BASS_CUTOFF_ENABLE",
            Control::BassCutoffFreq => "BASS_CUTOFF_FREQ",
            Control::BassBoost => "BASS_BOOST",
            Control::BassVolume => "BASS_VOLUME",
            Control::EqSelect => "EQ_SELECT",
            Control::EqBand0 => "EQ_BAND0",
            Control::EqBand1 => "EQ_BAND1",
            Control::EqBand2 => "EQ_BAND2",
            Control::EqBand3 => "EQ_BAND3",
            Control::EqBand4 => "EQ_BAND4",
        }
    }

    /// Largest legal CC value for this control.
    ///
    /// [`MONADIC_MAX`] for the fire-and-forget commands.
    pub const fn max(self) -> u8 {
        match self {
            Control::Dump | Control::SetDefaults => MONADIC_MAX,
            Control::InputSelect => 1,
            Control::MicGain => 3,
            Control::LineInLevel
            | Control::LineInLevelLeft
            | Control::LineInLevelRight => 15,
            Control::DacVolume
            | Control::DacVolumeLeft
            | Control::DacVolumeRight => 127,
            Control::DacVolumeRamp => 2,
            Control::LineOutLevel
            | Control::LineOutLevelLeft
            | Control::LineOutLevelRight => 31,
            Control::HpSelect => 1,
            Control::HpVolume
            | Control::HpVolumeLeft
            | Control::HpVolumeRight => 127,
            Control::MuteHp | Control::MuteLineOut => 1,
            Control::AdcHighPass => 2,
            Control::DapEnable => 2,
            Control::SurroundEnable => 2,
            Control::SurroundWidth => 7,
            Control::BassEnhanceEnable | Control::BassCutoffEnable => 1,
            Control::BassCutoffFreq => 6,
            Control::BassBoost => 127,
            Control::BassVolume => 0x3F,
            Control::EqSelect => 3,
            Control::EqBand0
            | Control::EqBand1
            | Control::EqBand2
            | Control::EqBand3
            | Control::EqBand4 => 0x5F,
        }
    }

    /// Whether the control has no readable state of its own.
    ///
    /// Covers the monadic commands and the stereo aggregates that exist
    /// purely to set the left+right pair in one message; reading one of
    /// these never touches the device.
    pub const fn is_write_only(self) -> bool {
        matches!(
            self,
            Control::Dump
                | Control::SetDefaults
                | Control::LineInLevel
                | Control::DacVolume
                | Control::LineOutLevel
                | Control::HpVolume
        )
    }
}

/// CC-number profile, one per firmware revision of the rig.
///
/// `V2` inserted the `DUMP_SGTL` command at the base of the block, pushing
/// every other control up one CC; a `V1` control surface therefore needs
/// the legacy numbering to talk to the same codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CcMap {
    /// Legacy numbering: `SET_DEFAULTS` = 30 … `EQ_BAND4` = 63, no dump.
    V1,
    /// Current numbering: `DUMP_SGTL` = 30 … `EQ_BAND4` = 64.
    #[default]
    V2,
}

impl CcMap {
    /// Resolve a CC number to its control, if the profile maps it.
    pub fn control(self, cc: u8) -> Option<Control> {
        match self {
            CcMap::V2 => Self::control_current(cc),
            // V1 is the current layout minus the dump slot, one CC lower.
            CcMap::V1 => match cc {
                30..=63 => Self::control_current(cc + 1),
                _ => None,
            },
        }
    }

    /// The CC number this profile assigns to a control.
    ///
    /// `None` only for [`Control::Dump`] under [`CcMap::V1`], which has no
    /// dump slot.
    pub fn cc(self, control: Control) -> Option<u8> {
        let current = Self::cc_current(control);
        match self {
            CcMap::V2 => Some(current),
            CcMap::V1 => match control {
                Control::Dump => None,
                _ => Some(current - 1),
            },
        }
    }

    /// `name(cc)` contract: never fails, unmapped numbers get a sentinel.
    pub fn name(self, cc: u8) -> &'static str {
        match self.control(cc) {
            Some(control) => control.name(),
            None => UNKNOWN_CC_NAME,
        }
    }

    /// `max(cc)` contract: [`MONADIC_MAX`] for unmapped numbers.
    pub fn max(self, cc: u8) -> u8 {
        match self.control(cc) {
            Some(control) => control.max(),
            None => MONADIC_MAX,
        }
    }

    /// `is_write_only(cc)` contract: false for unmapped numbers.
    pub fn is_write_only(self, cc: u8) -> bool {
        match self.control(cc) {
            Some(control) => control.is_write_only(),
            None => false,
        }
    }

    fn control_current(cc: u8) -> Option<Control> {
        let index = cc.checked_sub(CC_BASE)? as usize;
        Control::ALL.get(index).copied()
    }

    // ALL is laid out in current CC order, so the assigned number is just
    // the control's position in it.
    const fn cc_current(control: Control) -> u8 {
        CC_BASE + control as u8
    }
}
