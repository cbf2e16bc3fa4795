//! VGM main header.
//!
//! Only the first 0x40 bytes are modelled: everything an SN76489 log needs
//! (clock, GD3 pointer, sample count, noise configuration, data offset)
//! lives there. Clocks of later chips are never read and never written.
use crate::binutil::{write_u8, write_u16, write_u32};

/// `"Vgm "`
pub const VGM_IDENT: [u8; 4] = *b"Vgm ";

/// Header versions this crate reads.
pub const SUPPORTED_VERSIONS: [u32; 5] = [
    0x0000_0101,
    0x0000_0110,
    0x0000_0150,
    0x0000_0151,
    0x0000_0160,
];

/// Version written into converted files.
pub const OUTPUT_VERSION: u32 = 0x0000_0151;

/// Size of the header written into converted files.
pub const OUTPUT_HEADER_SIZE: usize = 0x40;

/// Start of the command data when the header has no usable data offset.
pub const LEGACY_DATA_START: usize = 0x40;

/// SN76489 clock bit marking a second chip.
pub const DUAL_CHIP_FLAG: u32 = 0x4000_0000;

/// SN76489 clock bit selecting T6W28 (NeoGeo Pocket) mode.
const T6W28_FLAG: u32 = 0x8000_0000;

/// Header fields and their on-disk offsets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VgmHeaderField {
    Ident,
    EofOffset,
    Version,
    Sn76489Clock,
    Ym2413Clock,
    Gd3Offset,
    TotalSamples,
    LoopOffset,
    LoopSamples,
    SampleRate,
    SnFb,
    Snw,
    Sf,
    Ym2612Clock,
    Ym2151Clock,
    DataOffset,
}

impl VgmHeaderField {
    pub fn offset(self) -> usize {
        match self {
            VgmHeaderField::Ident => 0x00,
            VgmHeaderField::EofOffset => 0x04,
            VgmHeaderField::Version => 0x08,
            VgmHeaderField::Sn76489Clock => 0x0C,
            VgmHeaderField::Ym2413Clock => 0x10,
            VgmHeaderField::Gd3Offset => 0x14,
            VgmHeaderField::TotalSamples => 0x18,
            VgmHeaderField::LoopOffset => 0x1C,
            VgmHeaderField::LoopSamples => 0x20,
            VgmHeaderField::SampleRate => 0x24,
            VgmHeaderField::SnFb => 0x28,
            VgmHeaderField::Snw => 0x2A,
            VgmHeaderField::Sf => 0x2B,
            VgmHeaderField::Ym2612Clock => 0x2C,
            VgmHeaderField::Ym2151Clock => 0x30,
            VgmHeaderField::DataOffset => 0x34,
        }
    }

    pub fn len(self) -> usize {
        match self {
            VgmHeaderField::SnFb => 2,
            VgmHeaderField::Snw | VgmHeaderField::Sf => 1,
            _ => 4,
        }
    }
}

/// The fixed part of a VGM header.
///
/// Offsets (`eof_offset`, `gd3_offset`, `loop_offset`, `data_offset`) are
/// stored relative to their own field, exactly as on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgmHeader {
    pub eof_offset: u32,
    pub version: u32,
    /// Raw clock field, flag bits included.
    pub sn76489_clock: u32,
    pub ym2413_clock: u32,
    pub gd3_offset: u32,
    pub total_samples: u32,
    pub loop_offset: u32,
    pub loop_samples: u32,
    pub sample_rate: u32,
    pub sn_fb: u16,
    pub snw: u8,
    pub sf: u8,
    pub ym2612_clock: u32,
    pub ym2151_clock: u32,
    pub data_offset: u32,
}

impl Default for VgmHeader {
    fn default() -> Self {
        VgmHeader {
            eof_offset: 0,
            version: OUTPUT_VERSION,
            sn76489_clock: 0,
            ym2413_clock: 0,
            gd3_offset: 0,
            total_samples: 0,
            loop_offset: 0,
            loop_samples: 0,
            sample_rate: 0,
            // Sega VDP PSG defaults for files that predate these fields.
            sn_fb: 0x0009,
            snw: 16,
            sf: 0,
            ym2612_clock: 0,
            ym2151_clock: 0,
            data_offset: 0,
        }
    }
}

impl VgmHeader {
    /// True when bit 30 of the SN76489 clock announces a second chip.
    pub fn is_dual_chip(&self) -> bool {
        self.sn76489_clock & DUAL_CHIP_FLAG != 0
    }

    /// SN76489 clock in Hz with the flag bits removed.
    pub fn sn76489_clock_hz(&self) -> u32 {
        self.sn76489_clock & !(DUAL_CHIP_FLAG | T6W28_FLAG)
    }

    /// Clear the dual-chip bit.
    pub fn clear_dual_chip(&mut self) {
        self.sn76489_clock &= !DUAL_CHIP_FLAG;
    }

    /// Absolute offset of the first command byte.
    ///
    /// Files before 1.50 have no data offset field and always start at 0x40;
    /// a zero offset means the same thing in later versions.
    pub fn data_start(&self) -> usize {
        if self.version >= 0x0000_0150 && self.data_offset != 0 {
            VgmHeaderField::DataOffset.offset() + self.data_offset as usize
        } else {
            LEGACY_DATA_START
        }
    }

    /// Absolute offset of the GD3 block, `None` when the file has none.
    pub fn gd3_start(&self) -> Option<usize> {
        if self.gd3_offset == 0 {
            None
        } else {
            Some(VgmHeaderField::Gd3Offset.offset() + self.gd3_offset as usize)
        }
    }

    /// Serialize into a `OUTPUT_HEADER_SIZE` byte buffer.
    ///
    /// `eof_offset`, `gd3_offset` and `data_offset` are written as given so
    /// the document serializer can fill them in once the body length is known.
    pub(crate) fn to_bytes(&self, eof_offset: u32, gd3_offset: u32, data_offset: u32) -> Vec<u8> {
        let mut buf = vec![0u8; OUTPUT_HEADER_SIZE];
        buf[..4].copy_from_slice(&VGM_IDENT);

        let u32_fields = [
            (VgmHeaderField::EofOffset, eof_offset),
            (VgmHeaderField::Version, self.version),
            (VgmHeaderField::Sn76489Clock, self.sn76489_clock),
            (VgmHeaderField::Ym2413Clock, self.ym2413_clock),
            (VgmHeaderField::Gd3Offset, gd3_offset),
            (VgmHeaderField::TotalSamples, self.total_samples),
            (VgmHeaderField::LoopOffset, self.loop_offset),
            (VgmHeaderField::LoopSamples, self.loop_samples),
            (VgmHeaderField::SampleRate, self.sample_rate),
            (VgmHeaderField::Ym2612Clock, self.ym2612_clock),
            (VgmHeaderField::Ym2151Clock, self.ym2151_clock),
            (VgmHeaderField::DataOffset, data_offset),
        ];
        for (field, value) in u32_fields {
            write_u32(&mut buf, field.offset(), value);
        }
        write_u16(&mut buf, VgmHeaderField::SnFb.offset(), self.sn_fb);
        write_u8(&mut buf, VgmHeaderField::Snw.offset(), self.snw);
        write_u8(&mut buf, VgmHeaderField::Sf.offset(), self.sf);

        buf
    }
}

impl TryFrom<&[u8]> for VgmHeader {
    type Error = crate::binutil::ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        crate::vgm::parser::parse_vgm_header(bytes)
    }
}
