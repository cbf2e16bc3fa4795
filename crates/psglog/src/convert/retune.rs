//! Tone divider retuning for a different master clock.
//!
//! Walks the operation list with one latch state per chip instance. Each
//! tone latch on channels 0-2 is paired with the data byte right after it
//! (same instance) and the full divider is recomputed for the target clock.
//! The new value's low nibble goes back into the latch byte and bits 4-9
//! into the paired data byte. Channel 3 carries noise settings, not a
//! divider, and is never touched.
use std::fmt;

use crate::chip::register::{TONE_MAX, VOLUME_SILENT};
use crate::chip::{Channel, ClockPair, PsgLatchState, RegisterByte, RegisterKind};
use crate::convert::OverflowPolicy;
use crate::vgm::command::{Operation, PsgWrite};

/// A retuned divider that does not fit the 10-bit register.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetuneFault {
    pub channel: Channel,
    /// Source divider.
    pub register: u16,
    /// Rounded divider for the target clock.
    pub computed: f64,
    /// Index of the latch write in the operation list.
    pub position: usize,
}

impl fmt::Display for RetuneFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tone divider {} on {} retunes to {} (outside 1..={}) at operation {}",
            self.register, self.channel, self.computed, TONE_MAX, self.position
        )
    }
}

impl std::error::Error for RetuneFault {}

/// Counters from one retuning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetuneStats {
    pub retuned: usize,
    pub clamped: usize,
    /// Tone latches whose divider was zero.
    pub degenerate: usize,
    /// Tone data bytes that arrived without a latch right before them.
    pub unpaired_data: usize,
}

/// Rewrites tone writes for a new clock.
#[derive(Debug, Clone)]
pub struct Retuner {
    clocks: ClockPair,
    periodic_noise: bool,
    overflow: OverflowPolicy,
}

impl Retuner {
    pub fn new(clocks: ClockPair, periodic_noise: bool, overflow: OverflowPolicy) -> Self {
        Retuner {
            clocks,
            periodic_noise,
            overflow,
        }
    }

    pub fn clocks(&self) -> ClockPair {
        self.clocks
    }

    /// Retune every tone write in `ops` in place.
    pub fn retune(&self, ops: &mut [Operation]) -> Result<RetuneStats, RetuneFault> {
        let mut stats = RetuneStats::default();
        if self.clocks.is_identity() {
            log::debug!(
                "retune skipped: source and target clock are both {} Hz",
                self.clocks.source_hz
            );
            return Ok(stats);
        }

        let mut latches = [PsgLatchState::new(), PsgLatchState::new()];
        let mut i = 0usize;
        while i < ops.len() {
            let Operation::Write(write) = ops[i] else {
                i += 1;
                continue;
            };
            let state = &mut latches[write.instance.index()];

            match state.apply(write.value) {
                RegisterByte::Latch {
                    channel,
                    kind: RegisterKind::ToneNoise,
                    ..
                } if !channel.is_noise() => {
                    let paired = match ops.get(i + 1) {
                        Some(Operation::Write(next))
                            if next.instance == write.instance
                                && next.register_byte().is_data() =>
                        {
                            Some(*next)
                        }
                        _ => None,
                    };
                    if let Some(next) = paired {
                        state.apply(next.value);
                    }

                    let divider = state.tone(channel);
                    if divider == 0 {
                        log::warn!("zero tone divider on {} at operation {}, left as is", channel, i);
                        stats.degenerate += 1;
                    } else {
                        let bass = self.periodic_noise
                            && channel == Channel::Tone2
                            && state.volume(Channel::Tone2) == VOLUME_SILENT;
                        let new = self.retuned_divider(channel, divider, bass, i, &mut stats)?;
                        log::trace!(
                            "{}: divider {} -> {}{}",
                            channel,
                            divider,
                            new,
                            if bass { " (bass)" } else { "" }
                        );

                        ops[i] = Operation::Write(PsgWrite {
                            value: RegisterByte::tone_latch(channel, new).into(),
                            ..write
                        });
                        if let Some(next) = paired {
                            ops[i + 1] = Operation::Write(PsgWrite {
                                value: RegisterByte::tone_data(new).into(),
                                ..next
                            });
                        }
                        stats.retuned += 1;
                    }

                    i += if paired.is_some() { 2 } else { 1 };
                    continue;
                }
                RegisterByte::Data(_) => {
                    let tone_cursor = state
                        .cursor()
                        .filter(|c| c.kind == RegisterKind::ToneNoise && !c.channel.is_noise());
                    if let Some(cursor) = tone_cursor {
                        log::trace!("unpaired tone data on {} at operation {}", cursor.channel, i);
                        stats.unpaired_data += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }

        log::debug!(
            "retuned {} tone writes {} Hz -> {} Hz ({} clamped, {} zero, {} unpaired)",
            stats.retuned,
            self.clocks.source_hz,
            self.clocks.target_hz,
            stats.clamped,
            stats.degenerate,
            stats.unpaired_data
        );
        Ok(stats)
    }

    fn retuned_divider(
        &self,
        channel: Channel,
        divider: u16,
        bass: bool,
        position: usize,
        stats: &mut RetuneStats,
    ) -> Result<u16, RetuneFault> {
        let computed = self.clocks.retune(divider, bass).round();
        if (1.0..=TONE_MAX as f64).contains(&computed) {
            return Ok(computed as u16);
        }

        let fault = RetuneFault {
            channel,
            register: divider,
            computed,
            position,
        };
        match self.overflow {
            OverflowPolicy::Fail => Err(fault),
            OverflowPolicy::Clamp => {
                log::warn!("{}, clamped", fault);
                stats.clamped += 1;
                Ok(computed.clamp(1.0, TONE_MAX as f64) as u16)
            }
        }
    }
}
