use crate::header::{BspVersion, Header};
use crate::lump::LumpId;
use thiserror::Error;

/// Every fallible outcome this crate can produce. Operations are not
/// retried; on error, the caller's input (and, for [`crate::BspFile::save`],
/// any existing file on disk) is left untouched.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BspError {
    #[error("not a BSP file: expected magic `VBSP`, got header {0:?}")]
    NotBspFile(Header),

    #[error("version mismatch: expected {expected}, file has {actual}")]
    VersionMismatch { expected: i32, actual: i32 },

    #[error("unsupported static prop version {0}, only versions 4..=11 are supported")]
    UnsupportedStaticPropVersion(u16),

    #[error("invalid static prop solidity byte {0}, expected 0..=7")]
    InvalidSolidType(u8),

    #[error("no game lump with id {0:?} present")]
    MissingGameLump(crate::game_lump::GameLumpId),

    #[error("lump {lump:?} data ({offset}..{offset_len}) is out of bounds of the file")]
    LumpOutOfBounds {
        lump: LumpId,
        offset: i64,
        offset_len: i64,
    },

    #[error("game lump data is out of bounds of the file")]
    GameLumpOutOfBounds,

    #[error(transparent)]
    EntityParse(#[from] EntityParseError),

    #[error("no NUL terminator found within 128 bytes of texture string offset {0}")]
    BadTextureString(i32),

    #[error("cannot multiply two vectors; use dot() or cross()")]
    AmbiguousVectorProduct,

    #[error("operation requires an axis-aligned, non-zero vector")]
    ZeroAxisVector,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("binary parsing error: {0}")]
    Binary(#[from] binrw::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl BspError {
    pub(crate) fn version_mismatch(expected: BspVersion, actual: i32) -> BspError {
        BspError::VersionMismatch {
            expected: expected.raw(),
            actual,
        }
    }
}

/// Problems found while parsing the entity text lump (spec.md §4.3).
#[derive(Debug, Error)]
pub enum EntityParseError {
    #[error("unbalanced braces: {0}")]
    UnbalancedBraces(&'static str),
    #[error("no worldspawn entity found, or it was misplaced")]
    MissingWorldspawn,
    #[error("data follows the terminating NUL byte")]
    TrailingData,
    #[error("expected `\"key\" \"value\"`, got {0:?}")]
    MalformedKeyValue(String),
    #[error("keyvalue found outside of `{{ }}` braces")]
    OutsideBraces,
}

/// Structural problems found after an otherwise well-formed BSP parses
/// (spec.md §7).
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{from_kind} references {target} index {index}, which is out of range for size {size}")]
    ReferenceOutOfRange {
        from_kind: &'static str,
        target: &'static str,
        index: i64,
        size: usize,
    },
    #[error("BSP contains no root vis node")]
    NoRootNode,
}
