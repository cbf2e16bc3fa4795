//! psglog — SN76489 command log converter
//!
//! `psglog` reads VGM logs of the SN76489 PSG (Sega Master System, Game
//! Gear, BBC Micro, ...) and rewrites them for playback on a slower target:
//! a fixed tick rate instead of 44100 Hz sample timing, fewer register
//! writes, and tone dividers retuned for a different master clock.
//!
//! Key pieces:
//! - `chip`: the single-port register protocol (latch and data bytes), a
//!   latch-state tracker and the divider/frequency math.
//! - `vgm`: the typed `Operation` list, decoder, encoder and file framing.
//! - `convert`: `Quantizer`, `Retuner` and the `Converter` that chains
//!   decode, quantize, retune and encode under one `ConvertConfig`.
//! - `analysis`: command statistics for a converted or source stream.
//! - `meta`: GD3 tags.
//!
//! Example: convert bare command bytes
//!
//! ```rust
//! use psglog::chip::ClockPair;
//! use psglog::convert::{CommandInput, ConvertConfig, Converter};
//!
//! // ch0 tone = 100, volume 0, one 60 Hz frame, end
//! let bytes = [0x50, 0x84, 0x50, 0x06, 0x50, 0x90, 0x62, 0x66];
//!
//! let converter = Converter::new(ConvertConfig::default()).unwrap();
//! let output = converter
//!     .convert_stream(&CommandInput {
//!         bytes: &bytes,
//!         start: 0,
//!         total_samples: 735,
//!         dual_chip: false,
//!         clocks: ClockPair::new(3_579_545, 4_000_000),
//!     })
//!     .unwrap();
//!
//! // Divider 100 becomes 112 (0x070) for the 4 MHz clock. The trailing
//! // 735 samples are shorter than one 882-sample tick and are dropped.
//! assert_eq!(output.bytes, vec![0x50, 0x80, 0x50, 0x07, 0x50, 0x90, 0x66]);
//! assert_eq!(output.report.retuned_tones, 1);
//! ```
//!
//! Example: whole files
//!
//! ```no_run
//! use psglog::convert::{ConvertConfig, Converter};
//!
//! let input = std::fs::read("song.vgm").unwrap();
//! let output = Converter::new(ConvertConfig::default())
//!     .unwrap()
//!     .convert_vgm(&input)
//!     .unwrap();
//! std::fs::write("song.bbc.vgm", &output.bytes).unwrap();
//! ```
mod binutil;
pub mod analysis;
pub mod chip;
pub mod convert;
pub mod meta;
pub mod vgm;

pub use analysis::StreamStats;
pub use binutil::ParseError;
pub use convert::{ConvertConfig, ConvertError, ConvertReport, Converter, OverflowPolicy};
pub use vgm::command::{Instance, Operation, PsgWrite};
pub use vgm::{VgmDocument, VgmHeader};
