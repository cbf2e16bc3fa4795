// Command stream decoder and encoder tests.
use psglog::ParseError;
use psglog::vgm::command::Operation;
use psglog::vgm::{encode_operations, parse_commands, wait_operations};

use super::{psg, psg2};

#[test]
fn decodes_every_sn76489_opcode() {
    let bytes = [
        0x50, 0x9F, // write
        0x61, 0x10, 0x27, // wait 10000
        0x62, // wait 735
        0x63, // wait 882
        0x75, // wait 6
        0x66, // end
    ];
    let stream = parse_commands(&bytes, 0, false).unwrap();
    assert_eq!(
        stream.operations,
        vec![
            psg(0x9F),
            Operation::WaitExact(10000),
            Operation::WaitFixed60,
            Operation::WaitFixed50,
            Operation::WaitSmall(5),
            Operation::End,
        ]
    );
    assert_eq!(stream.total_wait_samples(), 10000 + 735 + 882 + 6);
}

#[test]
fn decoding_stops_at_end() {
    // bytes after 0x66 are not commands (0xFF would be unknown)
    let bytes = [0x50, 0x90, 0x66, 0xFF, 0xFF];
    let stream = parse_commands(&bytes, 0, false).unwrap();
    assert_eq!(stream.operations, vec![psg(0x90), Operation::End]);
}

#[test]
fn missing_end_is_not_an_error() {
    let stream = parse_commands(&[0x50, 0x90, 0x62], 0, false).unwrap();
    assert_eq!(stream.operations, vec![psg(0x90), Operation::WaitFixed60]);
}

#[test]
fn unknown_opcode_reports_absolute_offset() {
    // commands start at 0x40 inside a larger buffer
    let mut bytes = vec![0u8; 0x40];
    bytes.extend_from_slice(&[0x50, 0x90, 0x62, 0xA0, 0x00, 0x66]);

    let err = parse_commands(&bytes, 0x40, false).unwrap_err();
    assert_eq!(
        err,
        ParseError::UnknownOpcode {
            opcode: 0xA0,
            offset: 0x43
        }
    );
    assert_eq!(err.offset(), Some(0x43));
    assert_eq!(err.to_string(), "unknown opcode 0xA0 at offset 0x43");
}

#[test]
fn truncated_payloads_fail() {
    for bytes in [&[0x50][..], &[0x61, 0x10][..], &[0x52, 0x00][..], &[0xE0, 1, 2][..]] {
        let err = parse_commands(bytes, 0, false).unwrap_err();
        assert!(
            matches!(err, ParseError::OffsetOutOfRange { offset: 1, .. }),
            "bytes {:02X?} gave {:?}",
            bytes,
            err
        );
    }
}

#[test]
fn secondary_writes_need_dual_chip() {
    let bytes = [0x50, 0x90, 0x30, 0x9F, 0x66];

    let single = parse_commands(&bytes, 0, false).unwrap();
    assert_eq!(single.operations, vec![psg(0x90), Operation::End]);
    assert_eq!(single.dropped_secondary_writes, 1);

    let dual = parse_commands(&bytes, 0, true).unwrap();
    assert_eq!(dual.operations, vec![psg(0x90), psg2(0x9F), Operation::End]);
    assert_eq!(dual.dropped_secondary_writes, 0);
}

#[test]
fn foreign_commands_keep_the_decoder_in_sync() {
    let bytes = [
        0x4F, 0xFF, // game gear stereo
        0x52, 0x2B, 0x80, // ym2612 port 0
        0x54, 0x08, 0x00, // ym2151
        0xE0, 0x00, 0x01, 0x00, 0x00, // pcm seek
        0x81, // dac write + wait 1
        0x67, 0x66, 0x00, 0x02, 0x00, 0x00, 0x00, 0x80, 0x7F, // data block
        0x50, 0x9F, 0x66,
    ];
    let stream = parse_commands(&bytes, 0, false).unwrap();
    assert_eq!(stream.operations.len(), 7);
    assert_eq!(stream.operations[5], psg(0x9F));
    assert_eq!(stream.data_blocks.len(), 1);
    assert_eq!(stream.data_blocks[0].offset, 14);
    assert_eq!(stream.total_wait_samples(), 1);
    assert!(stream.operations[..5].iter().all(|op| op.is_foreign()));
}

#[test]
fn long_gap_flushes_as_two_waits() {
    let ops = wait_operations(70000);
    assert_eq!(ops, vec![Operation::WaitExact(65535), Operation::WaitExact(4465)]);
    assert_eq!(
        encode_operations(&ops),
        vec![0x61, 0xFF, 0xFF, 0x61, 0x71, 0x11]
    );
}

#[test]
fn encoder_inverts_decoder_for_canonical_streams() {
    let bytes = [
        0x50, 0x84, 0x50, 0x06, 0x61, 0xE8, 0x03, 0x50, 0x9F, 0x62, 0x30, 0x90, 0x63, 0x7F, 0x66,
    ];
    let stream = parse_commands(&bytes, 0, true).unwrap();
    assert_eq!(encode_operations(&stream.operations), bytes);
}
