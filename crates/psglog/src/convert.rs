//! Conversion of an SN76489 log to a fixed tick rate and a new chip clock.
//!
//! A conversion runs four stages over an owned operation list:
//!
//! 1. decode (`vgm::parser`)
//! 2. quantize onto the tick grid and drop redundant writes (`Quantizer`)
//! 3. retune tone dividers for the target clock (`Retuner`)
//! 4. encode (`vgm::writer`) and, for whole files, re-frame the container
//!
//! Every knob lives in `ConvertConfig`, which is built once and handed to
//! `Converter::new`. Stages never read configuration from anywhere else.
use std::fmt;

use crate::binutil::ParseError;
use crate::chip::{Channel, ChannelMask, TargetChip};

mod pipeline;
mod quantize;
mod retune;

pub use pipeline::{CommandInput, ConvertOutput, Converter};
pub use quantize::{QuantizeStats, Quantizer, eliminate_redundant_writes};
pub use retune::{RetuneFault, RetuneStats, Retuner};

/// What to do when a retuned divider does not fit in ten bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Abort the conversion with `ConvertError::RetuningFault`.
    #[default]
    Fail,
    /// Clamp into `1..=1023` and log a warning.
    Clamp,
}

/// Conversion settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Sample rate of the source timestamps. VGM is always 44100.
    pub source_sample_rate: u32,
    /// Output ticks per second.
    pub target_tick_rate: u32,
    /// Chip to convert for; `None` keeps the source clock and noise settings.
    pub target: Option<TargetChip>,
    /// Drop writes made redundant by a later write in the same tick.
    pub optimize_writes: bool,
    /// Rewrite tone dividers for the target clock.
    pub retune: bool,
    /// Apply the 15/16 correction to a silent channel 2 driving periodic noise.
    pub retune_periodic_noise: bool,
    /// Channels whose writes are removed from the output.
    pub channel_filter: ChannelMask,
    /// Drop second-chip writes and clear the dual-chip header bit.
    pub strip_dual_chip: bool,
    pub overflow: OverflowPolicy,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            source_sample_rate: 44100,
            target_tick_rate: 50,
            target: Some(TargetChip::BBC_MICRO),
            optimize_writes: true,
            retune: true,
            retune_periodic_noise: true,
            channel_filter: ChannelMask::NONE,
            strip_dual_chip: true,
            overflow: OverflowPolicy::Fail,
        }
    }
}

impl ConvertConfig {
    /// Source samples per output tick (integer division).
    pub fn tick_samples(&self) -> Result<u32, ConvertError> {
        if self.target_tick_rate == 0 {
            return Err(ConvertError::InvalidConfig("tick rate must be non-zero".into()));
        }
        let tick = self.source_sample_rate / self.target_tick_rate;
        if tick == 0 {
            return Err(ConvertError::InvalidConfig(format!(
                "tick rate {} Hz exceeds sample rate {} Hz",
                self.target_tick_rate, self.source_sample_rate
            )));
        }
        Ok(tick)
    }

    /// Check every setting that can make a conversion impossible.
    pub fn validate(&self) -> Result<(), ConvertError> {
        self.tick_samples()?;
        if matches!(self.target, Some(TargetChip { clock_hz: 0, .. })) {
            return Err(ConvertError::InvalidConfig("target clock must be non-zero".into()));
        }
        Ok(())
    }
}

/// Counters collected while converting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertReport {
    pub input_operations: usize,
    pub output_operations: usize,
    pub input_bytes: usize,
    pub output_bytes: usize,
    /// Source samples per tick.
    pub tick_samples: u32,
    /// Ticks that carried at least one write.
    pub ticks_emitted: usize,
    pub redundant_writes_removed: usize,
    pub filtered_writes: usize,
    pub dropped_foreign: usize,
    pub dropped_secondary: usize,
    pub dropped_data_blocks: usize,
    pub retuned_tones: usize,
    pub clamped_tones: usize,
    pub degenerate_tones: usize,
    pub unpaired_tone_data: usize,
}

/// Stage-level conversion failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// The command stream could not be decoded.
    MalformedStream(ParseError),
    /// The VGM framing around the commands is broken.
    InvalidContainer(ParseError),
    /// The header declares a version outside the supported table.
    UnsupportedFormatVersion(u32),
    /// A retuned divider fell outside `1..=1023`.
    RetuningFault(RetuneFault),
    InvalidConfig(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::MalformedStream(e) => write!(f, "malformed command stream: {}", e),
            ConvertError::InvalidContainer(e) => write!(f, "invalid vgm container: {}", e),
            ConvertError::UnsupportedFormatVersion(v) => {
                write!(f, "unsupported vgm version {}", version_string(*v))
            }
            ConvertError::RetuningFault(fault) => write!(f, "{}", fault),
            ConvertError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::MalformedStream(e) | ConvertError::InvalidContainer(e) => Some(e),
            ConvertError::RetuningFault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<RetuneFault> for ConvertError {
    fn from(fault: RetuneFault) -> Self {
        ConvertError::RetuningFault(fault)
    }
}

impl ConvertError {
    /// Classify a container-level parse failure.
    pub(crate) fn from_container(e: ParseError) -> Self {
        match e {
            ParseError::UnsupportedVersion(v) => ConvertError::UnsupportedFormatVersion(v),
            other => ConvertError::InvalidContainer(other),
        }
    }

    /// Channel and position of a retuning fault.
    pub fn fault_channel(&self) -> Option<Channel> {
        match self {
            ConvertError::RetuningFault(fault) => Some(fault.channel),
            _ => None,
        }
    }
}

/// `0x00000151` -> `"1.51"`
pub fn version_string(version: u32) -> String {
    format!("{:X}.{:02X}", version >> 8, version & 0xFF)
}
