//! Stream statistics.
//!
//! Counts what a converted (or source) operation list contains so the size
//! and shape of a tune can be judged before packing it for a target player.
//! Writes that happen with no wait in between form one *event*; per-channel
//! event counts say how often each register really changes over time.
use std::collections::BTreeSet;

use crate::chip::{Channel, PsgLatchState, RegisterByte, RegisterKind};
use crate::vgm::command::Operation;
use crate::vgm::writer::encode_operations;

/// Summary of an operation list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub commands: usize,
    pub writes: usize,
    pub tone_latches: usize,
    pub volume_latches: usize,
    pub data_writes: usize,
    pub waits: usize,
    /// Other-chip commands and data block markers.
    pub foreign: usize,
    /// Most writes in a row without a wait between them.
    pub longest_write_run: usize,
    pub unique_writes: BTreeSet<u8>,
    pub unique_waits: BTreeSet<u32>,
    /// Complete tone dividers (channels 0-2) set by latch + data pairs.
    pub unique_tones: BTreeSet<u16>,
    pub shortest_wait: Option<u32>,
    pub largest_data: Option<u8>,
    pub total_wait_samples: u64,
    /// Events per channel that changed its tone/noise register.
    pub tone_events: [usize; 4],
    /// Events per channel that changed its attenuation.
    pub volume_events: [usize; 4],
    /// Bytes the list takes when encoded.
    pub encoded_bytes: usize,
}

impl StreamStats {
    pub fn from_operations(ops: &[Operation]) -> Self {
        let mut stats = StreamStats {
            commands: ops.len(),
            encoded_bytes: encode_operations(ops).len(),
            ..StreamStats::default()
        };
        let mut latches = [PsgLatchState::new(), PsgLatchState::new()];
        let mut run = 0usize;
        // Registers touched since the last wait.
        let mut tone_touched = [false; 4];
        let mut volume_touched = [false; 4];

        for op in ops {
            match op {
                Operation::Write(w) => {
                    stats.writes += 1;
                    run += 1;
                    stats.longest_write_run = stats.longest_write_run.max(run);
                    stats.unique_writes.insert(w.value);

                    let state = &mut latches[w.instance.index()];
                    match state.apply(w.value) {
                        RegisterByte::Latch { channel, kind, .. } => match kind {
                            RegisterKind::ToneNoise => {
                                stats.tone_latches += 1;
                                tone_touched[channel.index()] = true;
                            }
                            RegisterKind::Volume => {
                                stats.volume_latches += 1;
                                volume_touched[channel.index()] = true;
                            }
                        },
                        RegisterByte::Data(d) => {
                            stats.data_writes += 1;
                            stats.largest_data = stats.largest_data.max(Some(d));
                            if let Some(cursor) = state.cursor() {
                                let ch = cursor.channel;
                                match cursor.kind {
                                    RegisterKind::ToneNoise => {
                                        tone_touched[ch.index()] = true;
                                        if !ch.is_noise() {
                                            stats.unique_tones.insert(state.tone(ch));
                                        }
                                    }
                                    RegisterKind::Volume => volume_touched[ch.index()] = true,
                                }
                            }
                        }
                    }
                }
                op if op.is_wait() => {
                    let samples = op.wait_samples();
                    stats.waits += 1;
                    stats.total_wait_samples += samples as u64;
                    stats.unique_waits.insert(samples);
                    stats.shortest_wait = Some(stats.shortest_wait.map_or(samples, |s| s.min(samples)));
                    run = 0;
                    close_event(&mut stats, &mut tone_touched, &mut volume_touched);
                }
                Operation::End => {}
                other => {
                    stats.foreign += 1;
                    stats.total_wait_samples += other.wait_samples() as u64;
                }
            }
        }
        close_event(&mut stats, &mut tone_touched, &mut volume_touched);
        stats
    }

    /// Size if every write and wait could be packed into one byte.
    pub fn one_byte_per_command_size(&self) -> usize {
        self.writes + self.waits
    }

    /// Tone events packed as 10-bit values plus a 2-byte delay each.
    pub fn packed_tone_bytes(&self) -> usize {
        let n: usize = self.tone_events.iter().sum();
        n * 10 / 8 + n * 2
    }

    /// Volume events packed as 4-bit values plus a 2-bit delay each.
    pub fn packed_volume_bytes(&self) -> usize {
        let n: usize = self.volume_events.iter().sum();
        n * 4 / 8 + n * 2 / 4
    }

    pub fn tone_events(&self, channel: Channel) -> usize {
        self.tone_events[channel.index()]
    }

    pub fn volume_events(&self, channel: Channel) -> usize {
        self.volume_events[channel.index()]
    }
}

fn close_event(stats: &mut StreamStats, tone: &mut [bool; 4], volume: &mut [bool; 4]) {
    for ch in 0..4 {
        stats.tone_events[ch] += tone[ch] as usize;
        stats.volume_events[ch] += volume[ch] as usize;
    }
    *tone = [false; 4];
    *volume = [false; 4];
}
