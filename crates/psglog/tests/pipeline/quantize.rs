// Quantizer tests: tick placement, redundancy removal, filtering, timing.
use psglog::chip::{Channel, ChannelMask, ClockPair, PsgLatchState};
use psglog::convert::{
    CommandInput, ConvertConfig, Converter, Quantizer, eliminate_redundant_writes,
};
use psglog::vgm::command::Operation;
use psglog::vgm::{encode_operations, parse_commands};

use super::{attributed_writes, psg, psg2, random_stream, timeline, tone, total_wait, volume};

fn unity_converter() -> Converter {
    Converter::new(ConvertConfig {
        source_sample_rate: 44100,
        target_tick_rate: 44100,
        target: None,
        optimize_writes: false,
        retune: false,
        ..ConvertConfig::default()
    })
    .unwrap()
}

#[test]
fn redundant_tone_write_in_one_tick() {
    // ch0 tone 0x025, wait 100, ch0 tone 0x027, end; tick = 200 samples
    let ops = [
        psg(0x85),
        psg(0x02),
        Operation::WaitExact(100),
        psg(0x87),
        psg(0x02),
        Operation::End,
    ];
    let (out, stats) = Quantizer::new(200, true, ChannelMask::NONE).quantize(&ops, 100);
    assert_eq!(out, vec![psg(0x87), psg(0x02), Operation::End]);
    assert_eq!(stats.ticks_emitted, 1);
    assert_eq!(stats.redundant_writes_removed, 2);
}

#[test]
fn unity_tick_reproduces_the_stream_bytes() {
    let bytes = [
        0x50, 0x84, 0x50, 0x06, 0x61, 0xE8, 0x03, 0x50, 0x9F, 0x62, 0x50, 0x90, 0x7F, 0x66,
    ];
    let output = unity_converter()
        .convert_stream(&CommandInput {
            bytes: &bytes,
            start: 0,
            total_samples: 1000 + 735 + 16,
            dual_chip: false,
            clocks: ClockPair::unity(3_579_545),
        })
        .unwrap();
    assert_eq!(output.bytes, bytes);
    assert_eq!(output.report.tick_samples, 1);
}

#[test]
fn unity_tick_keeps_every_write_at_its_sample() {
    for seed in 0..8 {
        let ops = random_stream(seed, 300);
        let (out, _) = Quantizer::new(1, false, ChannelMask::NONE).quantize(&ops, 0);

        assert_eq!(timeline(&out), timeline(&ops), "seed {}", seed);
        assert_eq!(total_wait(&out), total_wait(&ops), "seed {}", seed);

        // and survives an encode/decode cycle
        let reparsed = parse_commands(&encode_operations(&out), 0, false).unwrap();
        assert_eq!(timeline(&reparsed.operations), timeline(&ops), "seed {}", seed);
    }
}

#[test]
fn redundancy_pass_is_idempotent() {
    for seed in 0..16 {
        let mut batch: Vec<Operation> = random_stream(seed, 40)
            .into_iter()
            .filter(|op| op.as_write().is_some())
            .collect();
        eliminate_redundant_writes(&mut batch);
        let once = batch.clone();
        assert_eq!(eliminate_redundant_writes(&mut batch), 0, "seed {}", seed);
        assert_eq!(batch, once, "seed {}", seed);
    }
}

#[test]
fn redundancy_pass_leaves_final_register_values() {
    for seed in 0..16 {
        let original: Vec<Operation> = random_stream(seed, 40)
            .into_iter()
            .filter(|op| op.as_write().is_some())
            .collect();
        let mut optimized = original.clone();
        eliminate_redundant_writes(&mut optimized);

        let replay = |ops: &[Operation]| {
            let mut state = PsgLatchState::new();
            for op in ops {
                if let Some(w) = op.as_write() {
                    state.apply(w.value);
                }
            }
            Channel::ALL.map(|ch| (state.tone(ch), state.volume(ch)))
        };
        assert_eq!(replay(&optimized), replay(&original), "seed {}", seed);
    }
}

#[test]
fn waits_are_conserved_within_one_tick() {
    for (seed, tick) in [(1u64, 882u32), (2, 735), (3, 441), (4, 1), (5, 7)] {
        let ops = random_stream(seed, 500);
        let (out, _) = Quantizer::new(tick, true, ChannelMask::NONE).quantize(&ops, 0);
        let input = total_wait(&ops);
        let output = total_wait(&out);
        assert!(output <= input, "tick {}: {} > {}", tick, output, input);
        assert!(input - output < tick as u64, "tick {}: {} vs {}", tick, output, input);
        assert_eq!(out.last(), Some(&Operation::End));
    }
}

#[test]
fn writes_land_on_tick_boundaries() {
    let ops = random_stream(9, 400);
    let (out, _) = Quantizer::new(882, true, ChannelMask::NONE).quantize(&ops, 0);
    for (t, _) in timeline(&out) {
        assert_eq!(t % 882, 0);
    }
}

#[test]
fn filtered_channel_never_appears() {
    for ch in Channel::ALL {
        let ops = random_stream(ch.index() as u64 + 20, 400);
        let mask = ChannelMask::NONE.with(ch);
        let (out, stats) = Quantizer::new(882, true, mask).quantize(&ops, 0);

        assert!(stats.filtered_writes > 0);
        assert!(
            attributed_writes(&out).iter().all(|(_, c, _)| *c != ch),
            "channel {} leaked",
            ch
        );
    }
}

#[test]
fn data_byte_follows_its_latch_into_the_filter() {
    // ch1 tone pair then a lone data byte still aimed at ch1
    let ops = [
        tone(Channel::Tone1, 0x155)[0],
        tone(Channel::Tone1, 0x155)[1],
        Operation::WaitExact(882),
        psg(0x12),
        volume(Channel::Tone0, 0),
        Operation::End,
    ];
    let mask = ChannelMask::NONE.with(Channel::Tone1);
    let (out, stats) = Quantizer::new(882, true, mask).quantize(&ops, 0);
    assert_eq!(out, vec![Operation::WaitFixed50, volume(Channel::Tone0, 0), Operation::End]);
    assert_eq!(stats.filtered_writes, 3);
}

#[test]
fn second_chip_writes_are_tracked_separately() {
    let ops = [
        psg(0xC0),
        psg2(0x90),
        psg(0x01), // extends ch2 tone on the first chip
        psg2(0x9F),
        Operation::End,
    ];
    let mask = ChannelMask::NONE.with(Channel::Tone0);
    let (out, stats) = Quantizer::new(1, true, mask).quantize(&ops, 0);
    assert_eq!(out, vec![psg(0xC0), psg(0x01), Operation::End]);
    assert_eq!(stats.filtered_writes, 2);
}

#[test]
fn foreign_commands_are_dropped_but_dac_waits_count() {
    let ops = [
        psg(0x90),
        Operation::ForeignWrite {
            opcode: 0x52,
            register: 0x2A,
            value: 0x80,
        },
        Operation::DacWriteWait(15),
        Operation::DacWriteWait(15),
        psg(0x9F),
        Operation::End,
    ];
    let (out, stats) = Quantizer::new(1, false, ChannelMask::NONE).quantize(&ops, 0);
    assert_eq!(
        out,
        vec![psg(0x90), Operation::WaitExact(30), psg(0x9F), Operation::End]
    );
    assert_eq!(stats.dropped_foreign, 3);
}
