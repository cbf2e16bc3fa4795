//! SN76489 command byte layout.
//!
//! The chip has a single write port. Each byte is either a latch byte or a
//! data byte:
//!
//! ```text
//! 1 c c t d d d d   latch: channel cc, type t (1 = volume, 0 = tone/noise),
//!                   dddd = low 4 bits of the selected register
//! 0 - D D D D D D   data:  DDDDDD extends the register selected by the
//!                   most recent latch byte
//! ```
//!
//! Tone registers are 10 bits wide (`DDDDDDdddd`). The noise register uses
//! only three bits (`-trr`: mode and shift rate) and volume registers four
//! bits of attenuation (0 = loudest, 15 = silent).
use std::fmt;

/// Bit 7 marks a latch byte.
pub const LATCH_FLAG: u8 = 0x80;
/// Bit 4 of a latch byte selects the volume register.
pub const VOLUME_FLAG: u8 = 0x10;
/// Low nibble carried by a latch byte.
pub const LATCH_DATA_MASK: u8 = 0x0F;
/// Six data bits carried by a data byte.
pub const DATA_MASK: u8 = 0x3F;
/// Largest value a 10-bit tone register can hold.
pub const TONE_MAX: u16 = 0x3FF;
/// Attenuation value that silences a channel.
pub const VOLUME_SILENT: u8 = 0x0F;

/// One of the four SN76489 channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Tone0,
    Tone1,
    Tone2,
    Noise,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Tone0, Channel::Tone1, Channel::Tone2, Channel::Noise];

    /// Channel from the two `cc` bits of a latch byte (higher bits ignored).
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Channel::Tone0,
            1 => Channel::Tone1,
            2 => Channel::Tone2,
            _ => Channel::Noise,
        }
    }

    /// Channel by index, `None` above 3.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_noise(self) -> bool {
        self == Channel::Noise
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.index())
    }
}

/// Which register of a channel a latch byte selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    /// Tone divider on channels 0-2, noise control on channel 3.
    ToneNoise,
    /// 4-bit attenuation.
    Volume,
}

/// A decoded command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterByte {
    Latch {
        channel: Channel,
        kind: RegisterKind,
        /// Low 4 bits written into the selected register.
        data: u8,
    },
    /// Six data bits for whatever register the cursor points at.
    Data(u8),
}

impl RegisterByte {
    pub fn is_latch(&self) -> bool {
        matches!(self, RegisterByte::Latch { .. })
    }

    pub fn is_data(&self) -> bool {
        matches!(self, RegisterByte::Data(_))
    }

    /// True for a latch byte addressing a tone/noise register.
    pub fn is_tone_latch(&self) -> bool {
        matches!(
            self,
            RegisterByte::Latch {
                kind: RegisterKind::ToneNoise,
                ..
            }
        )
    }

    /// True for a latch byte addressing a volume register.
    pub fn is_volume_latch(&self) -> bool {
        matches!(
            self,
            RegisterByte::Latch {
                kind: RegisterKind::Volume,
                ..
            }
        )
    }

    /// Channel addressed by a latch byte.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            RegisterByte::Latch { channel, .. } => Some(*channel),
            RegisterByte::Data(_) => None,
        }
    }

    /// Build a tone latch byte carrying the low nibble of `value`.
    pub fn tone_latch(channel: Channel, value: u16) -> Self {
        RegisterByte::Latch {
            channel,
            kind: RegisterKind::ToneNoise,
            data: (value & LATCH_DATA_MASK as u16) as u8,
        }
    }

    /// Build the data byte carrying bits 4-9 of a tone `value`.
    pub fn tone_data(value: u16) -> Self {
        RegisterByte::Data(((value >> 4) & DATA_MASK as u16) as u8)
    }

    /// Build a volume latch byte.
    pub fn volume_latch(channel: Channel, attenuation: u8) -> Self {
        RegisterByte::Latch {
            channel,
            kind: RegisterKind::Volume,
            data: attenuation & LATCH_DATA_MASK,
        }
    }
}

impl From<u8> for RegisterByte {
    fn from(value: u8) -> Self {
        if value & LATCH_FLAG != 0 {
            RegisterByte::Latch {
                channel: Channel::from_bits(value >> 5),
                kind: if value & VOLUME_FLAG != 0 {
                    RegisterKind::Volume
                } else {
                    RegisterKind::ToneNoise
                },
                data: value & LATCH_DATA_MASK,
            }
        } else {
            // Bit 6 is unused by the chip but kept so bytes survive a round trip.
            RegisterByte::Data(value & 0x7F)
        }
    }
}

impl From<RegisterByte> for u8 {
    fn from(byte: RegisterByte) -> u8 {
        match byte {
            RegisterByte::Latch {
                channel,
                kind,
                data,
            } => {
                let kind_bit = match kind {
                    RegisterKind::Volume => VOLUME_FLAG,
                    RegisterKind::ToneNoise => 0,
                };
                LATCH_FLAG | ((channel.index() as u8) << 5) | kind_bit | (data & LATCH_DATA_MASK)
            }
            RegisterByte::Data(d) => d & 0x7F,
        }
    }
}

/// Set of channels, one bit per channel index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChannelMask(u8);

impl ChannelMask {
    pub const NONE: ChannelMask = ChannelMask(0);

    pub fn from_bits(bits: u8) -> Self {
        ChannelMask(bits & 0x0F)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn with(self, channel: Channel) -> Self {
        ChannelMask(self.0 | (1 << channel.index()))
    }

    pub fn contains(self, channel: Channel) -> bool {
        self.0 & (1 << channel.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Channel> for ChannelMask {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        iter.into_iter().fold(ChannelMask::NONE, ChannelMask::with)
    }
}
