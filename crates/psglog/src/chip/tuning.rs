//! Tone divider math for moving SN76489 music between master clocks.
//!
//! A tone channel toggles its output every `divider` ticks of `clock / 16`,
//! so one full period takes `2 * divider * 16` master-clock cycles:
//!
//! ```text
//! hz = clock / (2 * divider * 16)
//! ```
//!
//! Moving a tune to a chip with a different clock means solving the same
//! formula for the divider that reproduces `hz` under the new clock. The
//! result is rounded with `f64::round` (nearest, ties away from zero).
//!
//! # Examples
//!
//! ```rust
//! use psglog::chip::tuning::{ClockPair, tone_frequency_hz};
//!
//! let pair = ClockPair::new(3_579_545, 4_000_000);
//! let hz = tone_frequency_hz(3_579_545, 100).unwrap();
//! assert!((hz - 1118.607).abs() < 0.001);
//! assert_eq!(pair.retune(100, false).round() as u16, 112);
//! ```

/// Cycles of the master clock per half-period step of a tone counter.
pub const CLOCK_DIVIDER: f64 = 16.0;

/// Width of the noise shift register on BBC Micro class hardware. Sega
/// consoles use 16, which is why the periodic-noise pitch differs by 15/16.
pub const PERIODIC_NOISE_RATIO: f64 = 15.0 / 16.0;

/// Master clock of the BBC Micro's SN76489.
pub const BBC_MICRO_CLOCK_HZ: u32 = 4_000_000;

/// Typical NTSC Sega clock.
pub const NTSC_CLOCK_HZ: u32 = 3_579_545;

/// Frequency in Hz produced by `divider` under `clock_hz`.
///
/// Returns `None` for a zero divider, which has no defined pitch.
pub fn tone_frequency_hz(clock_hz: u32, divider: u16) -> Option<f64> {
    if divider == 0 {
        return None;
    }
    Some(clock_hz as f64 / (2.0 * divider as f64 * CLOCK_DIVIDER))
}

/// Unrounded divider that produces `hz` under `clock_hz`.
pub fn divider_for_frequency(clock_hz: u32, hz: f64) -> f64 {
    clock_hz as f64 / (2.0 * hz * CLOCK_DIVIDER)
}

/// Source and target master clocks of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockPair {
    pub source_hz: u32,
    pub target_hz: u32,
}

impl ClockPair {
    pub fn new(source_hz: u32, target_hz: u32) -> Self {
        Self {
            source_hz,
            target_hz,
        }
    }

    /// Both sides run at `clock_hz`.
    pub fn unity(clock_hz: u32) -> Self {
        Self::new(clock_hz, clock_hz)
    }

    /// Retuning is a no-op when both clocks match.
    pub fn is_identity(&self) -> bool {
        self.source_hz == self.target_hz
    }

    /// Unrounded divider for the target clock.
    ///
    /// With `periodic_noise` set the divider drives the noise generator
    /// rather than an audible tone, and the target's 15-bit shift register
    /// needs an extra 15/16 correction on top of the clock ratio.
    ///
    /// `divider` must be non-zero.
    pub fn retune(&self, divider: u16, periodic_noise: bool) -> f64 {
        if periodic_noise {
            let noise_ratio =
                PERIODIC_NOISE_RATIO * (self.source_hz as f64 / self.target_hz as f64);
            divider as f64 / noise_ratio
        } else {
            let hz = self.source_hz as f64 / (2.0 * divider as f64 * CLOCK_DIVIDER);
            divider_for_frequency(self.target_hz, hz)
        }
    }
}

/// Chip settings written into the output header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetChip {
    pub clock_hz: u32,
    /// White-noise feedback pattern (VGM header 0x28).
    pub feedback: u16,
    /// Noise shift register width (VGM header 0x2A).
    pub shift_register_width: u8,
}

impl TargetChip {
    /// BBC Micro: 4 MHz, feedback 0x0003, 15-bit shift register.
    pub const BBC_MICRO: TargetChip = TargetChip {
        clock_hz: BBC_MICRO_CLOCK_HZ,
        feedback: 0x0003,
        shift_register_width: 15,
    };
}

impl Default for TargetChip {
    fn default() -> Self {
        Self::BBC_MICRO
    }
}
