//! Time quantization.
//!
//! Source timestamps are grouped into half-open buckets of `tick` samples:
//! bucket `k` covers `[k * tick, (k + 1) * tick)`. All writes whose
//! timestamp falls inside a bucket are emitted together at the bucket start,
//! preceded by whatever wait brings the output clock there. With `tick == 1`
//! every sample is its own bucket and the write/wait sequence survives
//! unchanged apart from wait encoding.
use crate::chip::{Channel, ChannelMask, PsgLatchState, RegisterByte, RegisterKind};
use crate::vgm::command::{Instance, Operation};
use crate::vgm::writer::wait_operations;

/// Counters from one quantization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuantizeStats {
    pub ticks_emitted: usize,
    pub redundant_writes_removed: usize,
    pub filtered_writes: usize,
    pub dropped_foreign: usize,
    /// Source samples covered, the larger of the declared total and the
    /// sum of all waits.
    pub source_samples: u64,
}

/// Resamples a write/wait sequence onto a fixed tick grid.
#[derive(Debug, Clone)]
pub struct Quantizer {
    tick: u64,
    optimize_writes: bool,
    channel_filter: ChannelMask,
}

impl Quantizer {
    /// `tick_samples` must be at least 1.
    pub fn new(tick_samples: u32, optimize_writes: bool, channel_filter: ChannelMask) -> Self {
        Quantizer {
            tick: tick_samples.max(1) as u64,
            optimize_writes,
            channel_filter,
        }
    }

    pub fn tick_samples(&self) -> u64 {
        self.tick
    }

    /// Quantize `ops` and return the new sequence.
    ///
    /// Foreign-chip commands are dropped; the wait carried by a DAC write is
    /// kept. Input after `End` is ignored. The output ends with `End` only if
    /// the input had one, preceded by the wait up to the bucket holding the
    /// end of the input, so total duration matches to within one tick.
    pub fn quantize(&self, ops: &[Operation], total_samples: u32) -> (Vec<Operation>, QuantizeStats) {
        let mut stats = QuantizeStats::default();
        let mut out = Vec::with_capacity(ops.len());
        let mut latches = [PsgLatchState::new(), PsgLatchState::new()];

        let mut idx = 0usize;
        let mut source_time = 0u64;
        let mut emitted_time = 0u64;
        let mut bucket_start = 0u64;
        let mut saw_end = false;
        let mut batch = Vec::new();

        while !saw_end && idx < ops.len() {
            // Buckets between here and the next timestamp would stay empty.
            if source_time >= bucket_start + self.tick {
                bucket_start = source_time / self.tick * self.tick;
            }
            let boundary = bucket_start + self.tick;

            while !saw_end && idx < ops.len() && source_time < boundary {
                let op = ops[idx];
                idx += 1;
                match op {
                    Operation::Write(w) => {
                        let state = &mut latches[w.instance.index()];
                        let channel = match state.apply(w.value) {
                            RegisterByte::Latch { channel, .. } => channel,
                            RegisterByte::Data(_) => state.latched_channel(),
                        };
                        if self.channel_filter.contains(channel) {
                            stats.filtered_writes += 1;
                        } else {
                            batch.push(op);
                        }
                    }
                    Operation::End => saw_end = true,
                    op if op.is_foreign() => {
                        stats.dropped_foreign += 1;
                        source_time += op.wait_samples() as u64;
                    }
                    op => source_time += op.wait_samples() as u64,
                }
            }

            if self.optimize_writes {
                stats.redundant_writes_removed += eliminate_redundant_writes(&mut batch);
            }
            if !batch.is_empty() {
                out.extend(wait_operations(bucket_start - emitted_time));
                emitted_time = bucket_start;
                out.append(&mut batch);
                stats.ticks_emitted += 1;
            }
            bucket_start = boundary;
        }

        // Trailing time is kept down to the start of the last bucket.
        let end_time = source_time / self.tick * self.tick;
        out.extend(wait_operations(end_time - emitted_time));
        if saw_end {
            out.push(Operation::End);
        }

        stats.source_samples = source_time.max(total_samples as u64);
        log::debug!(
            "quantized {} ops into {} ops over {} ticks of {} samples ({} redundant, {} filtered, {} foreign)",
            ops.len(),
            out.len(),
            stats.ticks_emitted,
            self.tick,
            stats.redundant_writes_removed,
            stats.filtered_writes,
            stats.dropped_foreign
        );
        (out, stats)
    }
}

#[derive(Debug, Clone, Copy)]
struct Group {
    instance: Instance,
    channel: Channel,
    kind: RegisterKind,
    has_data: bool,
}

impl Group {
    fn same_register(&self, other: &Group) -> bool {
        self.instance == other.instance && self.channel == other.channel && self.kind == other.kind
    }

    /// Whether a later write to the same register makes this one redundant.
    ///
    /// A tone latch without data only replaces the low nibble, so it cannot
    /// stand in for an earlier write that also set the high bits.
    fn superseded_by(&self, later: &Group) -> bool {
        self.same_register(later)
            && (self.kind != RegisterKind::ToneNoise || !self.has_data || later.has_data)
    }
}

/// Remove writes overwritten later in the same batch.
///
/// A group is a latch byte plus the data bytes that follow it on the same
/// chip instance up to that instance's next latch. Data bytes with no latch
/// before them in the batch belong to no group and are always kept. Returns
/// the number of writes removed; running it twice removes nothing more.
pub fn eliminate_redundant_writes(batch: &mut Vec<Operation>) -> usize {
    let mut groups: Vec<Group> = Vec::new();
    let mut owner: Vec<Option<usize>> = Vec::with_capacity(batch.len());
    let mut open: [Option<usize>; 2] = [None, None];

    for op in batch.iter() {
        let Some(w) = op.as_write() else {
            owner.push(None);
            continue;
        };
        let slot = w.instance.index();
        match w.register_byte() {
            RegisterByte::Latch { channel, kind, .. } => {
                groups.push(Group {
                    instance: w.instance,
                    channel,
                    kind,
                    has_data: false,
                });
                open[slot] = Some(groups.len() - 1);
                owner.push(open[slot]);
            }
            RegisterByte::Data(_) => {
                if let Some(g) = open[slot] {
                    groups[g].has_data = true;
                }
                owner.push(open[slot]);
            }
        }
    }

    let removed: Vec<bool> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| groups[i + 1..].iter().any(|later| g.superseded_by(later)))
        .collect();
    if !removed.contains(&true) {
        return 0;
    }

    for (g, _) in groups.iter().zip(&removed).filter(|(_, r)| **r) {
        log::trace!(
            "redundant {:?} write on {} ({:?})",
            g.kind,
            g.channel,
            g.instance
        );
    }

    let before = batch.len();
    let mut owners = owner.into_iter();
    batch.retain(|_| match owners.next().flatten() {
        Some(g) => !removed[g],
        None => true,
    });
    before - batch.len()
}
