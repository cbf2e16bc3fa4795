//! VGM container and command stream.
//!
//! - `command`: the typed `Operation` every stage works on.
//! - `parser`: bytes to operations, plus the header and GD3 readers.
//! - `writer`: operations back to bytes with canonical waits.
//! - `header` / `document`: the file framing around the commands.
pub mod command;
mod document;
mod header;
pub mod parser;
pub mod writer;

pub use command::{CommandStream, DataBlock, Instance, Operation, PsgWrite};
pub use document::VgmDocument;
pub use header::{
    DUAL_CHIP_FLAG, LEGACY_DATA_START, OUTPUT_HEADER_SIZE, OUTPUT_VERSION, SUPPORTED_VERSIONS,
    VGM_IDENT, VgmHeader, VgmHeaderField,
};
pub use parser::{parse_commands, parse_vgm, parse_vgm_header};
pub use writer::{encode_operations, wait_operations};
