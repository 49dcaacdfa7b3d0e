//! Click-free ramping for the tone-control / graphic-EQ band gains.
//!
//! The chip documentation requires that these gain registers never jump:
//! changes must proceed in steps of at most 0.5 dB (2 register units at
//! 0.25 dB per unit) or the output pops audibly. [`EqRamp`] holds a
//! (value, target) pair per band and a shared bitmask of bands still in
//! flight; the driver retargets bands from CC dispatch and advances the
//! ramp from a periodic tick, writing one register per band per step.

use super::registers::EQ_BAND_FLAT;

/// Number of graphic-EQ bands (band 0 = bass, band 4 = treble).
pub const BAND_COUNT: usize = 5;

/// Largest per-tick change, in register units (0.5 dB).
pub const RAMP_STEP: u8 = 2;

/// Bit flagging a ramp pass already in progress.
const PASS_GUARD: u8 = 1 << 6;

/// Per-band ramp state.
///
/// Invariant: bit *k* of `pending` is set exactly when
/// `value[k] != target[k]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EqRamp {
    value: [u8; BAND_COUNT],
    target: [u8; BAND_COUNT],
    pending: u8,
}

impl EqRamp {
    /// All bands flat, nothing pending — the chip's reset state.
    pub const fn new() -> Self {
        EqRamp {
            value: [EQ_BAND_FLAT; BAND_COUNT],
            target: [EQ_BAND_FLAT; BAND_COUNT],
            pending: 0,
        }
    }

    /// Retarget a band. No hardware is touched; the ramp catches up on
    /// subsequent passes.
    pub fn set_target(&mut self, band: usize, v: u8) {
        self.target[band] = v;
        if self.value[band] == v {
            self.pending &= !(1 << band);
        } else {
            self.pending |= 1 << band;
        }
    }

    /// Force a band to a known value immediately. The caller has already
    /// written the register; the ramp just resynchronises.
    pub fn set_now(&mut self, band: usize, v: u8) {
        self.value[band] = v;
        self.target[band] = v;
        self.pending &= !(1 << band);
    }

    pub fn value(&self, band: usize) -> u8 {
        self.value[band]
    }

    pub fn target(&self, band: usize) -> u8 {
        self.target[band]
    }

    pub fn is_pending(&self, band: usize) -> bool {
        self.pending & (1 << band) != 0
    }

    /// Claim the pass guard. Returns false if a pass is already running,
    /// in which case the caller must do nothing at all.
    pub fn begin_pass(&mut self) -> bool {
        if self.pending & PASS_GUARD != 0 {
            return false;
        }
        self.pending |= PASS_GUARD;
        true
    }

    /// Release the pass guard.
    pub fn end_pass(&mut self) {
        self.pending &= !PASS_GUARD;
    }

    /// Advance one band by at most [`RAMP_STEP`] toward its target.
    ///
    /// Returns the new value when the band moved (the caller owes the
    /// hardware exactly one register write), or `None` for an idle band.
    /// Snaps to the target and clears the pending bit once the remaining
    /// distance fits in a single step.
    pub fn step(&mut self, band: usize) -> Option<u8> {
        if !self.is_pending(band) {
            return None;
        }
        let current = self.value[band];
        let target = self.target[band];
        let distance = (target as i16 - current as i16).unsigned_abs();
        let new = if distance <= RAMP_STEP as u16 {
            self.pending &= !(1 << band);
            target
        } else if target > current {
            current + RAMP_STEP
        } else {
            current - RAMP_STEP
        };
        self.value[band] = new;
        Some(new)
    }
}
