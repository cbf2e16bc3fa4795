// Retuner tests: clock ratios, periodic noise bass, overflow, noise channel.
use approx::assert_relative_eq;
use psglog::chip::{Channel, ClockPair, TargetChip};
use psglog::convert::{ConvertConfig, ConvertError, Converter, OverflowPolicy, Retuner};
use psglog::vgm::command::Operation;

use super::{BBC, NTSC, attributed_writes, psg, random_stream, tone, volume};

fn retuner(periodic: bool) -> Retuner {
    Retuner::new(ClockPair::new(NTSC, BBC), periodic, OverflowPolicy::Fail)
}

#[test]
fn ntsc_divider_retunes_to_bbc() {
    // 100 * 4000000 / 3579545 = 111.75
    assert_relative_eq!(
        ClockPair::new(NTSC, BBC).retune(100, false),
        100.0 * BBC as f64 / NTSC as f64,
        epsilon = 1e-9
    );

    let mut ops = tone(Channel::Tone0, 100).to_vec();
    let stats = retuner(true).retune(&mut ops).unwrap();
    assert_eq!(ops, tone(Channel::Tone0, 112).to_vec());
    assert_eq!(ops, vec![psg(0x80), psg(0x07)]);
    assert_eq!(stats.retuned, 1);
}

#[test]
fn silent_channel_two_gets_the_bass_correction() {
    let mut ops = vec![volume(Channel::Tone2, 15)];
    ops.extend(tone(Channel::Tone2, 100));
    let stats = retuner(true).retune(&mut ops).unwrap();
    // 111.75 * 16 / 15 = 119.2
    assert_eq!(ops, vec![psg(0xDF), psg(0xC7), psg(0x07)]);
    assert_eq!(stats.retuned, 1);
}

#[test]
fn bass_correction_needs_the_option_and_silence() {
    let mut without_option = vec![volume(Channel::Tone2, 15)];
    without_option.extend(tone(Channel::Tone2, 100));
    retuner(false).retune(&mut without_option).unwrap();
    assert_eq!(&without_option[1..], &[psg(0xC0), psg(0x07)]);

    let mut audible = vec![volume(Channel::Tone2, 4)];
    audible.extend(tone(Channel::Tone2, 100));
    retuner(true).retune(&mut audible).unwrap();
    assert_eq!(&audible[1..], &[psg(0xC0), psg(0x07)]);

    // only channel 2 drives the noise generator
    let mut other = vec![volume(Channel::Tone1, 15)];
    other.extend(tone(Channel::Tone1, 100));
    retuner(true).retune(&mut other).unwrap();
    assert_eq!(&other[1..], &tone(Channel::Tone1, 112));
}

#[test]
fn equal_clocks_leave_the_stream_alone() {
    for seed in 0..8 {
        let original = random_stream(seed, 200);
        let mut ops = original.clone();
        let stats = Retuner::new(ClockPair::unity(NTSC), true, OverflowPolicy::Fail)
            .retune(&mut ops)
            .unwrap();
        assert_eq!(ops, original, "seed {}", seed);
        assert_eq!(stats.retuned, 0);
    }
}

#[test]
fn noise_channel_and_timing_are_untouched() {
    let pairs = [
        ClockPair::new(NTSC, BBC),
        ClockPair::new(BBC, NTSC),
        ClockPair::new(NTSC, NTSC * 2),
    ];
    for (seed, clocks) in pairs.into_iter().enumerate() {
        let original = random_stream(seed as u64 + 40, 300);
        let mut ops = original.clone();
        Retuner::new(clocks, true, OverflowPolicy::Clamp)
            .retune(&mut ops)
            .unwrap();

        let noise = |ops: &[Operation]| {
            attributed_writes(ops)
                .into_iter()
                .filter(|(_, ch, _)| *ch == Channel::Noise)
                .collect::<Vec<_>>()
        };
        assert_eq!(noise(&ops), noise(&original), "{:?}", clocks);
        assert_eq!(ops.len(), original.len());
        for (a, b) in ops.iter().zip(&original) {
            if a.as_write().is_none() {
                assert_eq!(a, b);
            }
        }
    }
}

#[test]
fn zero_divider_is_counted_and_kept() {
    let mut ops = tone(Channel::Tone0, 0).to_vec();
    let stats = retuner(true).retune(&mut ops).unwrap();
    assert_eq!(ops, vec![psg(0x80), psg(0x00)]);
    assert_eq!(stats.degenerate, 1);
    assert_eq!(stats.retuned, 0);
}

#[test]
fn overflow_fails_the_conversion_unless_clamped() {
    let mut ops = tone(Channel::Tone1, 1000).to_vec();
    ops.push(Operation::End);
    let clocks = ClockPair::new(NTSC, BBC);

    let strict = Converter::new(ConvertConfig::default()).unwrap();
    let err = strict.convert_operations(&ops, 0, clocks).unwrap_err();
    assert_eq!(err.fault_channel(), Some(Channel::Tone1));
    match err {
        ConvertError::RetuningFault(fault) => {
            assert_eq!(fault.register, 1000);
            assert_eq!(fault.position, 0);
            assert!(fault.computed > 1023.0);
        }
        other => panic!("unexpected error {:?}", other),
    }

    let lenient = Converter::new(ConvertConfig {
        overflow: OverflowPolicy::Clamp,
        target: Some(TargetChip::BBC_MICRO),
        ..ConvertConfig::default()
    })
    .unwrap();
    let (out, report) = lenient.convert_operations(&ops, 0, clocks).unwrap();
    assert_eq!(out, vec![psg(0xA8 | 0x0F), psg(0x3F), Operation::End]);
    assert_eq!(report.clamped_tones, 1);
    assert_eq!(report.retuned_tones, 1);
}
