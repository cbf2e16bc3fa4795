//! SN76489 latch state tracking.
//!
//! The chip exposes one write port. A latch byte selects a channel and
//! register kind and writes its low bits; every following data byte extends
//! whatever register that latch selected, until the next latch byte moves
//! the cursor. `PsgLatchState` replays a byte stream through that model so
//! later passes can ask what a channel's tone divider or attenuation is at
//! any point of the stream.
use super::register::{
    Channel, DATA_MASK, LATCH_DATA_MASK, RegisterByte, RegisterKind, TONE_MAX,
};

/// Mask of the 3-bit noise control register (`-trr`).
const NOISE_MASK: u16 = 0x07;

/// The register a data byte will extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LatchCursor {
    pub channel: Channel,
    pub kind: RegisterKind,
}

/// Latched register values for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelLatch {
    /// 10-bit tone divider (channels 0-2) or 3-bit noise control (channel 3).
    pub tone: u16,
    /// 4-bit attenuation.
    pub volume: u8,
}

/// Register state of one SN76489 as seen through its command bytes.
///
/// All registers start at zero and the cursor starts unset; a data byte that
/// arrives before any latch byte has nothing to extend and is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PsgLatchState {
    channels: [ChannelLatch; 4],
    cursor: Option<LatchCursor>,
}

impl PsgLatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor, `None` until the first latch byte.
    pub fn cursor(&self) -> Option<LatchCursor> {
        self.cursor
    }

    /// Channel the next data byte would be attributed to.
    ///
    /// Before any latch byte the chip powers up pointing at channel 0.
    pub fn latched_channel(&self) -> Channel {
        self.cursor.map(|c| c.channel).unwrap_or(Channel::Tone0)
    }

    pub fn channel(&self, channel: Channel) -> &ChannelLatch {
        &self.channels[channel.index()]
    }

    pub fn tone(&self, channel: Channel) -> u16 {
        self.channels[channel.index()].tone
    }

    pub fn volume(&self, channel: Channel) -> u8 {
        self.channels[channel.index()].volume
    }

    /// Apply one command byte and return its decoded form.
    pub fn apply(&mut self, value: u8) -> RegisterByte {
        let byte = RegisterByte::from(value);
        match byte {
            RegisterByte::Latch {
                channel,
                kind,
                data,
            } => {
                self.cursor = Some(LatchCursor { channel, kind });
                let latch = &mut self.channels[channel.index()];
                match kind {
                    RegisterKind::Volume => latch.volume = data & LATCH_DATA_MASK,
                    RegisterKind::ToneNoise if channel.is_noise() => {
                        // The top bit of the nibble has no register behind it.
                        latch.tone = data as u16 & NOISE_MASK;
                    }
                    RegisterKind::ToneNoise => {
                        latch.tone = (latch.tone & !(LATCH_DATA_MASK as u16)) | data as u16;
                    }
                }
            }
            RegisterByte::Data(data) => {
                if let Some(LatchCursor { channel, kind }) = self.cursor {
                    let latch = &mut self.channels[channel.index()];
                    match kind {
                        RegisterKind::Volume => latch.volume = data & LATCH_DATA_MASK,
                        RegisterKind::ToneNoise if channel.is_noise() => {
                            latch.tone = data as u16 & NOISE_MASK;
                        }
                        RegisterKind::ToneNoise => {
                            latch.tone = (latch.tone & LATCH_DATA_MASK as u16)
                                | (((data & DATA_MASK) as u16) << 4);
                        }
                    }
                }
            }
        }
        debug_assert!(self.channels.iter().all(|c| c.tone <= TONE_MAX));
        byte
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
