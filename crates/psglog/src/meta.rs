//! GD3 tag block.
//!
//! A GD3 block is `"Gd3 "`, a version, the byte length of what follows, and
//! eleven UTF-16LE strings each terminated by a NUL code unit. Converted
//! files carry the source tags over unchanged.
use crate::binutil::{ParseError, read_slice, read_u16_le_at, read_u32_le_at};

/// `"Gd3 "`
pub const GD3_IDENT: [u8; 4] = *b"Gd3 ";

/// Version 1.00, the only one in use.
pub const GD3_VERSION: u32 = 0x0000_0100;

/// Number of strings in a GD3 block.
pub const GD3_FIELD_COUNT: usize = 11;

/// Position of each string in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gd3Field {
    TrackNameEn,
    TrackNameJp,
    GameNameEn,
    GameNameJp,
    SystemNameEn,
    SystemNameJp,
    AuthorNameEn,
    AuthorNameJp,
    ReleaseDate,
    Creator,
    Notes,
}

impl Gd3Field {
    pub const ALL: [Gd3Field; GD3_FIELD_COUNT] = [
        Gd3Field::TrackNameEn,
        Gd3Field::TrackNameJp,
        Gd3Field::GameNameEn,
        Gd3Field::GameNameJp,
        Gd3Field::SystemNameEn,
        Gd3Field::SystemNameJp,
        Gd3Field::AuthorNameEn,
        Gd3Field::AuthorNameJp,
        Gd3Field::ReleaseDate,
        Gd3Field::Creator,
        Gd3Field::Notes,
    ];

    /// Label used when printing tags.
    pub fn label(self) -> &'static str {
        match self {
            Gd3Field::TrackNameEn => "Track",
            Gd3Field::TrackNameJp => "Track (JP)",
            Gd3Field::GameNameEn => "Game",
            Gd3Field::GameNameJp => "Game (JP)",
            Gd3Field::SystemNameEn => "System",
            Gd3Field::SystemNameJp => "System (JP)",
            Gd3Field::AuthorNameEn => "Author",
            Gd3Field::AuthorNameJp => "Author (JP)",
            Gd3Field::ReleaseDate => "Date",
            Gd3Field::Creator => "Ripper",
            Gd3Field::Notes => "Notes",
        }
    }
}

/// Parsed GD3 tags. Empty strings are stored as empty, not absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gd3 {
    pub version: u32,
    fields: [String; GD3_FIELD_COUNT],
}

impl Default for Gd3 {
    fn default() -> Self {
        Gd3 {
            version: GD3_VERSION,
            fields: Default::default(),
        }
    }
}

impl Gd3 {
    pub fn get(&self, field: Gd3Field) -> &str {
        &self.fields[field as usize]
    }

    pub fn set(&mut self, field: Gd3Field, value: impl Into<String>) -> &mut Self {
        self.fields[field as usize] = value.into();
        self
    }

    /// Non-empty tags in block order.
    pub fn iter(&self) -> impl Iterator<Item = (Gd3Field, &str)> {
        Gd3Field::ALL
            .into_iter()
            .map(|f| (f, self.get(f)))
            .filter(|(_, v)| !v.is_empty())
    }

    /// Serialize the full block, ident included.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for s in &self.fields {
            for unit in s.encode_utf16() {
                body.extend_from_slice(&unit.to_le_bytes());
            }
            body.extend_from_slice(&[0, 0]);
        }

        let mut out = Vec::with_capacity(12 + body.len());
        out.extend_from_slice(&GD3_IDENT);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }
}

/// Parse a GD3 block starting at offset 0 of `bytes`.
///
/// A body that ends before all eleven strings are terminated leaves the
/// remaining fields empty; the declared length running past the buffer is
/// an error.
pub(crate) fn parse_gd3(bytes: &[u8]) -> Result<Gd3, ParseError> {
    if bytes.len() < 12 {
        return Err(ParseError::HeaderTooShort("gd3".into()));
    }

    let ident = read_slice(bytes, 0, 4)?;
    if ident != GD3_IDENT {
        let mut id = [0u8; 4];
        id.copy_from_slice(ident);
        return Err(ParseError::InvalidIdent(id));
    }

    let version = read_u32_le_at(bytes, 4)?;
    let len = read_u32_le_at(bytes, 8)? as usize;
    let body = read_slice(bytes, 12, len).map_err(|e| e.with_context("gd3 body"))?;

    let mut gd3 = Gd3 {
        version,
        ..Gd3::default()
    };
    let mut pos = 0usize;
    for field in gd3.fields.iter_mut() {
        let mut units = Vec::new();
        let mut terminated = false;
        while pos + 1 < body.len() {
            let unit = read_u16_le_at(body, pos)?;
            pos += 2;
            if unit == 0 {
                terminated = true;
                break;
            }
            units.push(unit);
        }
        *field = String::from_utf16(&units)
            .map_err(|e| ParseError::Other(format!("invalid utf16 in gd3: {}", e)))?;
        if !terminated {
            break;
        }
    }

    Ok(gd3)
}

impl TryFrom<&[u8]> for Gd3 {
    type Error = ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_gd3(bytes)
    }
}
