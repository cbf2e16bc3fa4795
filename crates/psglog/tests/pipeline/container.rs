// Whole-file conversion tests: header rewrite, GD3 carry-over, error classes.
use psglog::chip::{Channel, ClockPair};
use psglog::convert::{ConvertConfig, ConvertError, Converter};
use psglog::meta::{Gd3, Gd3Field};
use psglog::vgm::command::Operation;
use psglog::{ParseError, StreamStats, VgmDocument};

use super::{BBC, NTSC, build_vgm, get_u32, maybe_write_vgm, psg, psg2, put_u32};

const DUAL_CHIP: u32 = 0x4000_0000;

fn default_converter() -> Converter {
    Converter::new(ConvertConfig::default()).unwrap()
}

// ch0 tone 100 at full volume for one 50 Hz frame, then silence for one more
const TUNE: [u8; 11] = [0x50, 0x84, 0x50, 0x06, 0x50, 0x90, 0x63, 0x50, 0x9F, 0x63, 0x66];

fn tags() -> Gd3 {
    let mut gd3 = Gd3::default();
    gd3.set(Gd3Field::TrackNameEn, "Title Screen")
        .set(Gd3Field::GameNameJp, "ソニック")
        .set(Gd3Field::SystemNameEn, "Sega Master System")
        .set(Gd3Field::Creator, "psglog");
    gd3
}

#[test]
fn converted_file_has_a_bbc_header_and_the_same_tags() {
    let gd3 = tags();
    let mut source = build_vgm(0x150, NTSC, 1764, &TUNE, Some(&gd3));
    // loop and FM fields that must not survive
    put_u32(&mut source, 0x1C, 0x30);
    put_u32(&mut source, 0x20, 882);
    put_u32(&mut source, 0x2C, 7_670_453);

    let out = default_converter().convert_vgm(&source).unwrap();
    let bytes = &out.bytes;
    maybe_write_vgm("converted_bbc.vgm", bytes);

    let body: [u8; 11] = [0x50, 0x80, 0x50, 0x07, 0x50, 0x90, 0x63, 0x50, 0x9F, 0x63, 0x66];
    assert_eq!(&bytes[0..4], b"Vgm ");
    assert_eq!(get_u32(bytes, 0x04) as usize, bytes.len() - 4);
    assert_eq!(get_u32(bytes, 0x08), 0x151);
    assert_eq!(get_u32(bytes, 0x0C), BBC);
    assert_eq!(get_u32(bytes, 0x14), (0x40 - 0x14 + body.len()) as u32);
    assert_eq!(get_u32(bytes, 0x18), 1764);
    assert_eq!(get_u32(bytes, 0x1C), 0);
    assert_eq!(get_u32(bytes, 0x20), 0);
    assert_eq!(get_u32(bytes, 0x24), 60);
    assert_eq!(&bytes[0x28..0x2B], &[0x03, 0x00, 15]);
    assert_eq!(get_u32(bytes, 0x2C), 0);
    assert_eq!(get_u32(bytes, 0x34), 0x0C);
    assert_eq!(&bytes[0x40..0x40 + body.len()], &body);

    let doc = VgmDocument::try_from(&bytes[..]).unwrap();
    assert_eq!(doc.gd3.as_ref(), Some(&gd3));
    assert_eq!(doc.gd3.as_ref().map(|g| g.get(Gd3Field::GameNameJp)), Some("ソニック"));
    assert_eq!(doc.operations(), &out.operations[..]);
    assert_eq!(out.clocks, ClockPair::new(NTSC, BBC));
    assert_eq!(out.report.retuned_tones, 1);
}

#[test]
fn converted_file_survives_a_reparse() {
    let source = build_vgm(0x110, NTSC, 1764, &TUNE, Some(&tags()));
    let out = default_converter().convert_vgm(&source).unwrap();

    let doc = VgmDocument::try_from(&out.bytes[..]).unwrap();
    assert_eq!(Vec::<u8>::from(&doc), out.bytes);
    assert_eq!(doc.header.data_start(), 0x40);
}

#[test]
fn legacy_file_without_tags() {
    let source = build_vgm(0x101, NTSC, 1764, &TUNE, None);
    let out = default_converter().convert_vgm(&source).unwrap();

    assert_eq!(get_u32(&out.bytes, 0x14), 0);
    assert_eq!(get_u32(&out.bytes, 0x04) as usize, out.bytes.len() - 4);
    // 1.01 has no noise fields; the target's are written anyway
    assert_eq!(&out.bytes[0x28..0x2B], &[0x03, 0x00, 15]);
    assert!(VgmDocument::try_from(&out.bytes[..]).unwrap().gd3.is_none());
}

#[test]
fn data_offset_is_honoured() {
    let mut source = build_vgm(0x150, NTSC, 0, &[], None);
    // 16 bytes of padding between header and commands
    source.extend_from_slice(&[0u8; 16]);
    source.extend_from_slice(&[0x50, 0x9F, 0x66]);
    put_u32(&mut source, 0x34, 0x0C + 16);
    let eof = (source.len() - 4) as u32;
    put_u32(&mut source, 0x04, eof);

    let out = default_converter().convert_vgm(&source).unwrap();
    assert_eq!(out.operations, vec![psg(0x9F), Operation::End]);
    assert_eq!(out.report.input_bytes, 3);
}

#[test]
fn keeping_the_clock_skips_retuning() {
    let source = build_vgm(0x150, NTSC, 1764, &TUNE, None);
    let converter = Converter::new(ConvertConfig {
        target: None,
        ..ConvertConfig::default()
    })
    .unwrap();
    let out = converter.convert_vgm(&source).unwrap();

    assert_eq!(get_u32(&out.bytes, 0x0C), NTSC);
    assert_eq!(&out.bytes[0x28..0x2B], &[0x09, 0x00, 16]);
    assert_eq!(&out.bytes[0x40..0x44], &[0x50, 0x84, 0x50, 0x06]);
    assert_eq!(out.report.retuned_tones, 0);
}

#[test]
fn second_chip_is_stripped_by_default() {
    let commands = [0x50, 0x90, 0x30, 0x9F, 0x66];
    let source = build_vgm(0x151, NTSC | DUAL_CHIP, 0, &commands, None);

    let out = default_converter().convert_vgm(&source).unwrap();
    assert_eq!(get_u32(&out.bytes, 0x0C), BBC);
    assert_eq!(out.operations, vec![psg(0x90), Operation::End]);
    assert_eq!(out.report.dropped_secondary, 1);

    let keep = Converter::new(ConvertConfig {
        strip_dual_chip: false,
        ..ConvertConfig::default()
    })
    .unwrap();
    let out = keep.convert_vgm(&source).unwrap();
    assert_eq!(get_u32(&out.bytes, 0x0C), BBC | DUAL_CHIP);
    assert_eq!(out.operations, vec![psg(0x90), psg2(0x9F), Operation::End]);
    assert_eq!(&out.bytes[0x40..], &commands);
    assert_eq!(out.report.dropped_secondary, 0);
}

#[test]
fn unsupported_version_is_its_own_error() {
    let source = build_vgm(0x171, NTSC, 0, &[0x66], None);
    assert_eq!(
        default_converter().convert_vgm(&source).unwrap_err(),
        ConvertError::UnsupportedFormatVersion(0x171)
    );
}

#[test]
fn broken_framing_is_a_container_error() {
    let mut source = build_vgm(0x151, NTSC, 0, &[0x66], None);
    source[0..4].copy_from_slice(b"Vgz ");
    assert_eq!(
        default_converter().convert_vgm(&source).unwrap_err(),
        ConvertError::InvalidContainer(ParseError::InvalidIdent(*b"Vgz "))
    );

    let err = default_converter().convert_vgm(&source[..0x20]).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidContainer(ParseError::HeaderTooShort(_))));

    // no SN76489 in the file
    let source = build_vgm(0x151, 0, 0, &[0x66], None);
    assert!(matches!(
        default_converter().convert_vgm(&source),
        Err(ConvertError::InvalidContainer(_))
    ));
}

#[test]
fn bad_command_reports_its_file_offset() {
    let source = build_vgm(0x101, NTSC, 0, &[0x50, 0x90, 0xA0, 0x00, 0x66], None);
    let err = default_converter().convert_vgm(&source).unwrap_err();
    assert_eq!(
        err,
        ConvertError::MalformedStream(ParseError::UnknownOpcode {
            opcode: 0xA0,
            offset: 0x42
        })
    );
}

#[test]
fn statistics_of_a_converted_file() {
    let source = build_vgm(0x150, NTSC, 1764, &TUNE, None);
    let out = default_converter().convert_vgm(&source).unwrap();
    let stats = StreamStats::from_operations(&out.operations);

    assert_eq!(stats.commands, 7);
    assert_eq!(stats.writes, 4);
    assert_eq!(stats.tone_latches, 1);
    assert_eq!(stats.volume_latches, 2);
    assert_eq!(stats.data_writes, 1);
    assert_eq!(stats.waits, 2);
    assert_eq!(stats.total_wait_samples, 1764);
    assert_eq!(stats.unique_tones.iter().copied().collect::<Vec<_>>(), vec![112]);
    assert_eq!(stats.tone_events(Channel::Tone0), 1);
    assert_eq!(stats.volume_events(Channel::Tone0), 2);
    assert_eq!(stats.encoded_bytes, out.bytes.len() - 0x40);
}
