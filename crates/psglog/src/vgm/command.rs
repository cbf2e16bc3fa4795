//! Typed VGM command operations.
//!
//! `Operation` is the unit every pipeline stage consumes and produces. The
//! six SN76489-relevant variants (`Write`, the four wait forms and `End`)
//! carry the music; the remaining variants exist so the decoder can step
//! over commands for other chips without losing its place.
use crate::chip::RegisterByte;

/// VGM opcodes understood by the decoder and writer.
pub mod opcode {
    pub const PSG_WRITE_SECONDARY: u8 = 0x30;
    pub const GAME_GEAR_STEREO: u8 = 0x4F;
    pub const PSG_WRITE: u8 = 0x50;
    pub const YM2413_WRITE: u8 = 0x51;
    pub const YM2151_WRITE: u8 = 0x54;
    pub const WAIT_SAMPLES: u8 = 0x61;
    pub const WAIT_735: u8 = 0x62;
    pub const WAIT_882: u8 = 0x63;
    pub const END_OF_DATA: u8 = 0x66;
    pub const DATA_BLOCK: u8 = 0x67;
    pub const WAIT_N_BASE: u8 = 0x70;
    pub const DAC_WRITE_WAIT_BASE: u8 = 0x80;
    pub const PCM_SEEK: u8 = 0xE0;
}

/// Samples in one 60 Hz frame at 44100 Hz.
pub const WAIT_60HZ_SAMPLES: u32 = 735;
/// Samples in one 50 Hz frame at 44100 Hz.
pub const WAIT_50HZ_SAMPLES: u32 = 882;
/// Longest wait a single `0x61` command can express.
pub const MAX_WAIT_SAMPLES: u32 = u16::MAX as u32;

/// Which of two chips a write addresses in a dual-chip log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Instance {
    #[default]
    Primary,
    Secondary,
}

impl Instance {
    pub fn index(self) -> usize {
        match self {
            Instance::Primary => 0,
            Instance::Secondary => 1,
        }
    }
}

/// One byte written to an SN76489.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PsgWrite {
    pub instance: Instance,
    pub value: u8,
}

impl PsgWrite {
    pub fn new(value: u8) -> Self {
        Self {
            instance: Instance::Primary,
            value,
        }
    }

    pub fn secondary(value: u8) -> Self {
        Self {
            instance: Instance::Secondary,
            value,
        }
    }

    pub fn register_byte(&self) -> RegisterByte {
        RegisterByte::from(self.value)
    }
}

/// A decoded VGM command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// SN76489 register write (`0x50 dd`, or `0x30 dd` for the second chip).
    Write(PsgWrite),
    /// Wait 0..=65535 samples (`0x61 nn nn`).
    WaitExact(u16),
    /// Wait 735 samples (`0x62`).
    WaitFixed60,
    /// Wait 882 samples (`0x63`).
    WaitFixed50,
    /// Wait `n + 1` samples (`0x7n`).
    WaitSmall(u8),
    /// End of sound data (`0x66`).
    End,
    /// Game Gear stereo mask (`0x4F dd`).
    GameGearStereo(u8),
    /// Two-byte register write for an FM chip (`0x51`..=`0x54`).
    ForeignWrite { opcode: u8, register: u8, value: u8 },
    /// YM2612 DAC write from the data bank followed by an `n` sample wait (`0x8n`).
    DacWriteWait(u8),
    /// Seek in the PCM data bank (`0xE0 dddddddd`).
    PcmSeek(u32),
}

impl Operation {
    /// Samples this operation advances time by.
    pub fn wait_samples(&self) -> u32 {
        match self {
            Operation::WaitExact(n) => *n as u32,
            Operation::WaitFixed60 => WAIT_60HZ_SAMPLES,
            Operation::WaitFixed50 => WAIT_50HZ_SAMPLES,
            Operation::WaitSmall(n) => (*n & 0x0F) as u32 + 1,
            Operation::DacWriteWait(n) => (*n & 0x0F) as u32,
            _ => 0,
        }
    }

    /// True for the wait forms the converted stream may contain.
    pub fn is_wait(&self) -> bool {
        matches!(
            self,
            Operation::WaitExact(_)
                | Operation::WaitFixed60
                | Operation::WaitFixed50
                | Operation::WaitSmall(_)
        )
    }

    pub fn as_write(&self) -> Option<&PsgWrite> {
        match self {
            Operation::Write(w) => Some(w),
            _ => None,
        }
    }

    /// True for commands that target some other chip than the SN76489.
    pub fn is_foreign(&self) -> bool {
        matches!(
            self,
            Operation::GameGearStereo(_)
                | Operation::ForeignWrite { .. }
                | Operation::DacWriteWait(_)
                | Operation::PcmSeek(_)
        )
    }
}

impl From<PsgWrite> for Operation {
    fn from(w: PsgWrite) -> Self {
        Operation::Write(w)
    }
}

/// A `0x67` data block, kept aside from the operation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    /// Offset of the `0x67` opcode in the input.
    pub offset: usize,
    pub data_type: u8,
    pub data: Vec<u8>,
}

/// Result of decoding a command stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandStream {
    pub operations: Vec<Operation>,
    pub data_blocks: Vec<DataBlock>,
    /// Secondary-chip writes dropped because dual-chip mode was off.
    pub dropped_secondary_writes: usize,
}

impl CommandStream {
    /// Sum of every wait in the stream.
    pub fn total_wait_samples(&self) -> u64 {
        self.operations.iter().map(|op| op.wait_samples() as u64).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }
}

impl<'a> IntoIterator for &'a CommandStream {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
