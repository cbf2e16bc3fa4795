//! VGM parser
//!
//! Decodes the VGM container header and the command stream that follows it
//! into the typed structures used by the rest of the crate.
//!
//! Entry points:
//! - `parse_commands(bytes, start, dual_chip)`: decode a command stream
//!   starting at `start` into a `CommandStream`.
//! - `parse_command(bytes, off, dual_chip)`: decode one command.
//! - `parse_vgm_header(bytes)`: validate and read the fixed header.
//! - `parse_vgm(bytes, strip_dual_chip)`: header, commands and GD3 tags.
//!
//! Decoding is strict. An unknown opcode or a payload cut short by the end
//! of the buffer aborts with a `ParseError` carrying the absolute offset:
//! command lengths depend on the opcode, so continuing past a bad byte would
//! misread everything after it.
use crate::binutil::{ParseError, read_slice, read_u8_at, read_u16_le_at, read_u32_le_at};
use crate::meta::{Gd3, parse_gd3};
use crate::vgm::command::{CommandStream, DataBlock, Operation, PsgWrite, opcode};
use crate::vgm::document::VgmDocument;
use crate::vgm::header::{
    LEGACY_DATA_START, SUPPORTED_VERSIONS, VGM_IDENT, VgmHeader, VgmHeaderField,
};

/// What a single opcode decoded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Operation(Operation),
    DataBlock(DataBlock),
    /// A secondary-chip write consumed while dual-chip mode is off.
    DroppedSecondary,
}

/// Decode the command at `off`.
///
/// Returns the decoded item and the number of bytes it occupied, opcode
/// included.
pub fn parse_command(
    bytes: &[u8],
    off: usize,
    dual_chip: bool,
) -> Result<(Decoded, usize), ParseError> {
    let op = read_u8_at(bytes, off)?;
    let payload = off + 1;

    let decoded = match op {
        opcode::PSG_WRITE => {
            let value = read_u8_at(bytes, payload).map_err(|e| e.with_context("psg write"))?;
            (Decoded::Operation(Operation::Write(PsgWrite::new(value))), 2)
        }
        opcode::PSG_WRITE_SECONDARY => {
            let value = read_u8_at(bytes, payload).map_err(|e| e.with_context("psg write"))?;
            if dual_chip {
                (Decoded::Operation(Operation::Write(PsgWrite::secondary(value))), 2)
            } else {
                (Decoded::DroppedSecondary, 2)
            }
        }
        opcode::GAME_GEAR_STEREO => {
            let value =
                read_u8_at(bytes, payload).map_err(|e| e.with_context("game gear stereo"))?;
            (Decoded::Operation(Operation::GameGearStereo(value)), 2)
        }
        opcode::YM2413_WRITE..=opcode::YM2151_WRITE => {
            let s = read_slice(bytes, payload, 2).map_err(|e| e.with_context("fm write"))?;
            (
                Decoded::Operation(Operation::ForeignWrite {
                    opcode: op,
                    register: s[0],
                    value: s[1],
                }),
                3,
            )
        }
        opcode::WAIT_SAMPLES => {
            let n = read_u16_le_at(bytes, payload).map_err(|e| e.with_context("wait"))?;
            (Decoded::Operation(Operation::WaitExact(n)), 3)
        }
        opcode::WAIT_735 => (Decoded::Operation(Operation::WaitFixed60), 1),
        opcode::WAIT_882 => (Decoded::Operation(Operation::WaitFixed50), 1),
        opcode::END_OF_DATA => (Decoded::Operation(Operation::End), 1),
        opcode::DATA_BLOCK => {
            let (block, len) = parse_data_block(bytes, off)?;
            (Decoded::DataBlock(block), len)
        }
        0x70..=0x7F => (Decoded::Operation(Operation::WaitSmall(op & 0x0F)), 1),
        0x80..=0x8F => (Decoded::Operation(Operation::DacWriteWait(op & 0x0F)), 1),
        opcode::PCM_SEEK => {
            let d = read_u32_le_at(bytes, payload).map_err(|e| e.with_context("pcm seek"))?;
            (Decoded::Operation(Operation::PcmSeek(d)), 5)
        }
        _ => return Err(ParseError::UnknownOpcode { opcode: op, offset: off }),
    };

    Ok(decoded)
}

/// `0x67 0x66 tt ss ss ss ss <data>`
fn parse_data_block(bytes: &[u8], off: usize) -> Result<(DataBlock, usize), ParseError> {
    // Compatibility byte (always 0x66) and block type precede the size.
    let compat = read_u8_at(bytes, off + 1).map_err(|e| e.with_context("data block"))?;
    let data_type = read_u8_at(bytes, off + 2).map_err(|e| e.with_context("data block"))?;
    let size = read_u32_le_at(bytes, off + 3).map_err(|e| e.with_context("data block size"))?;
    let data = read_slice(bytes, off + 7, size as usize)
        .map_err(|e| e.with_context("data block"))?
        .to_vec();

    if compat != opcode::END_OF_DATA {
        log::debug!(
            "data block at 0x{:X}: unexpected compatibility byte 0x{:02X}",
            off,
            compat
        );
    }
    log::debug!(
        "data block at 0x{:X}: type 0x{:02X}, {} bytes",
        off,
        data_type,
        size
    );

    Ok((
        DataBlock {
            offset: off,
            data_type,
            data,
        },
        7 + size as usize,
    ))
}

/// Decode commands from `start` until `End` or the end of `bytes`.
///
/// Pass a slice that ends where the command area ends (for example at the
/// GD3 block) so trailing metadata is not read as commands. Running out of
/// input exactly between two commands is accepted; running out inside one
/// is not.
pub fn parse_commands(
    bytes: &[u8],
    start: usize,
    dual_chip: bool,
) -> Result<CommandStream, ParseError> {
    let mut stream = CommandStream::default();
    let mut off = start;

    while off < bytes.len() {
        let (decoded, len) = parse_command(bytes, off, dual_chip)?;
        off += len;
        match decoded {
            Decoded::Operation(op) => {
                stream.operations.push(op);
                if op == Operation::End {
                    break;
                }
            }
            Decoded::DataBlock(block) => stream.data_blocks.push(block),
            Decoded::DroppedSecondary => stream.dropped_secondary_writes += 1,
        }
    }

    log::debug!(
        "decoded {} operations, {} data blocks from 0x{:X}..0x{:X}",
        stream.operations.len(),
        stream.data_blocks.len(),
        start,
        off
    );
    Ok(stream)
}

/// Parse the fixed VGM header at the start of `bytes`.
///
/// Validates the `"Vgm "` ident and the version against the supported
/// table. Fields that a version does not define are filled with the
/// defaults the format prescribes for it.
pub fn parse_vgm_header(bytes: &[u8]) -> Result<VgmHeader, ParseError> {
    if bytes.len() < LEGACY_DATA_START {
        return Err(ParseError::HeaderTooShort("vgm: base header (0x40)".into()));
    }

    let ident = read_slice(bytes, 0x00, 4)?;
    if ident != VGM_IDENT {
        let mut id = [0u8; 4];
        id.copy_from_slice(ident);
        return Err(ParseError::InvalidIdent(id));
    }

    let version = read_u32_le_at(bytes, VgmHeaderField::Version.offset())?;
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(ParseError::UnsupportedVersion(version));
    }

    let u32_at = |field: VgmHeaderField| read_u32_le_at(bytes, field.offset());

    let mut h = VgmHeader {
        eof_offset: u32_at(VgmHeaderField::EofOffset)?,
        version,
        sn76489_clock: u32_at(VgmHeaderField::Sn76489Clock)?,
        ym2413_clock: u32_at(VgmHeaderField::Ym2413Clock)?,
        gd3_offset: u32_at(VgmHeaderField::Gd3Offset)?,
        total_samples: u32_at(VgmHeaderField::TotalSamples)?,
        loop_offset: u32_at(VgmHeaderField::LoopOffset)?,
        loop_samples: u32_at(VgmHeaderField::LoopSamples)?,
        sample_rate: u32_at(VgmHeaderField::SampleRate)?,
        ..VgmHeader::default()
    };

    // SN76489 feedback/width and the split FM clocks arrived in 1.10.
    if version >= 0x0000_0110 {
        h.sn_fb = read_u16_le_at(bytes, VgmHeaderField::SnFb.offset())?;
        h.snw = read_u8_at(bytes, VgmHeaderField::Snw.offset())?;
        h.ym2612_clock = u32_at(VgmHeaderField::Ym2612Clock)?;
        h.ym2151_clock = u32_at(VgmHeaderField::Ym2151Clock)?;
    }
    if version >= 0x0000_0151 {
        h.sf = read_u8_at(bytes, VgmHeaderField::Sf.offset())?;
    }
    if version >= 0x0000_0150 {
        h.data_offset = u32_at(VgmHeaderField::DataOffset)?;
    }

    let data_start = h.data_start();
    if data_start > bytes.len() {
        return Err(ParseError::OffsetOutOfRange {
            offset: data_start,
            needed: 1,
            available: bytes.len(),
            context: Some("data_offset".into()),
        });
    }

    Ok(h)
}

/// Parse a whole VGM file.
///
/// When `strip_dual_chip` is set, writes for the second chip are consumed
/// and dropped even if the header enables dual-chip mode.
pub fn parse_vgm(bytes: &[u8], strip_dual_chip: bool) -> Result<VgmDocument, ParseError> {
    let header = parse_vgm_header(bytes)?;
    let commands = parse_commands(
        command_area(&header, bytes),
        header.data_start(),
        header.is_dual_chip() && !strip_dual_chip,
    )?;

    let gd3 = parse_gd3_at(&header, bytes)?;

    Ok(VgmDocument {
        header,
        commands,
        gd3,
    })
}

/// Parse the GD3 block the header points at, if any.
pub(crate) fn parse_gd3_at(header: &VgmHeader, bytes: &[u8]) -> Result<Option<Gd3>, ParseError> {
    match header.gd3_start() {
        Some(start) if start < bytes.len() => parse_gd3(&bytes[start..]).map(Some),
        Some(start) => Err(ParseError::OffsetOutOfRange {
            offset: start,
            needed: 12,
            available: 0,
            context: Some("gd3".into()),
        }),
        None => Ok(None),
    }
}

/// The part of `bytes` that holds commands: up to the GD3 block when it
/// follows the data, the whole buffer otherwise.
pub(crate) fn command_area<'a>(header: &VgmHeader, bytes: &'a [u8]) -> &'a [u8] {
    match header.gd3_start() {
        Some(gd3) if gd3 > header.data_start() && gd3 <= bytes.len() => &bytes[..gd3],
        _ => bytes,
    }
}
