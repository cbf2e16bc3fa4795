//! A whole VGM file: header, decoded commands and optional GD3 tags.
use crate::binutil::ParseError;
use crate::meta::Gd3;
use crate::vgm::command::{CommandStream, Operation};
use crate::vgm::header::{OUTPUT_HEADER_SIZE, OUTPUT_VERSION, VgmHeader, VgmHeaderField};
use crate::vgm::writer::encode_operations;

/// Parsed VGM file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgmDocument {
    pub header: VgmHeader,
    pub commands: CommandStream,
    pub gd3: Option<Gd3>,
}

impl VgmDocument {
    /// Build a document around `operations` using `header` for the chip
    /// fields.
    pub fn new(header: VgmHeader, operations: Vec<Operation>, gd3: Option<Gd3>) -> Self {
        VgmDocument {
            header,
            commands: CommandStream {
                operations,
                ..CommandStream::default()
            },
            gd3,
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.commands.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.commands.operations.iter()
    }

    /// Serialize as a version 1.51 file.
    ///
    /// The 64-byte header is followed directly by the commands (data offset
    /// 0x0C), then the GD3 block if there is one. Loop fields are zeroed and
    /// data blocks are not written back.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = encode_operations(&self.commands.operations);
        let gd3 = self.gd3.as_ref().map(Gd3::to_bytes);

        let gd3_offset = match gd3 {
            Some(_) => (OUTPUT_HEADER_SIZE - VgmHeaderField::Gd3Offset.offset() + body.len()) as u32,
            None => 0,
        };
        let gd3_len = gd3.as_ref().map_or(0, Vec::len);
        let eof_offset = (OUTPUT_HEADER_SIZE + body.len() + gd3_len
            - VgmHeaderField::EofOffset.offset()) as u32;
        let data_offset = (OUTPUT_HEADER_SIZE - VgmHeaderField::DataOffset.offset()) as u32;

        let header = VgmHeader {
            version: OUTPUT_VERSION,
            loop_offset: 0,
            loop_samples: 0,
            ..self.header.clone()
        };

        let mut out = header.to_bytes(eof_offset, gd3_offset, data_offset);
        out.extend_from_slice(&body);
        if let Some(gd3) = gd3 {
            out.extend_from_slice(&gd3);
        }
        out
    }
}

impl TryFrom<&[u8]> for VgmDocument {
    type Error = ParseError;

    /// Parse keeping secondary-chip writes when the header enables them.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        crate::vgm::parser::parse_vgm(bytes, false)
    }
}

impl From<&VgmDocument> for Vec<u8> {
    fn from(document: &VgmDocument) -> Vec<u8> {
        document.to_bytes()
    }
}

impl<'a> IntoIterator for &'a VgmDocument {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
