use crate::error::BspError;
use binrw::{BinRead, BinWrite};

/// The 8-byte magic + version header every BSP file starts with.
#[derive(Debug, Clone, Copy, BinRead, BinWrite)]
#[brw(little)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: i32,
}

pub(crate) const MAGIC: &[u8; 4] = b"VBSP";

impl Header {
    pub(crate) fn check_magic(&self) -> bool {
        &self.magic == MAGIC
    }
}

/// A BSP file version number. Well-known numbers map to a symbolic game
/// name via [`BspVersion::game`]; unrecognized numbers round-trip verbatim
/// instead of being rejected (spec.md §3).
///
/// The source format's version enum compares equal to its bare integer
/// value; rather than override structural equality to do that implicitly,
/// this is exposed as an explicit `PartialEq<i32>` impl (spec.md §9 Open
/// Questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BspVersion(i32);

impl BspVersion {
    pub fn new(raw: i32) -> Self {
        BspVersion(raw)
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn check(self, actual: i32) -> Result<(), BspError> {
        if self.0 == actual {
            Ok(())
        } else {
            Err(BspError::version_mismatch(self, actual))
        }
    }

    /// The symbolic game name(s) for well-known versions, if any.
    pub fn game(self) -> Option<&'static [&'static str]> {
        Some(match self.0 {
            17 => &["VER_17"],
            18 => &["VER_18"],
            19 => &["HL2", "CS_SOURCE", "DOF_SOURCE"],
            20 => &[
                "HL2_EP1", "HL2_EP2", "HL2_LC", "GARYS_MOD", "TF2", "PORTAL", "L4D",
                "ZENO_CLASH", "DARK_MESSIAH", "VINDICTUS", "THE_SHIP", "BLOODY_GOOD_TIME",
            ],
            21 => &[
                "L4D2", "ALIEN_SWARM", "PORTAL_2", "CS_GO", "DEAR_ESTHER", "STANLEY_PARABLE",
            ],
            22 => &["DOTA2"],
            23 => &["CONTAGION"],
            29 => &["VER_29"],
            42 => &["DESOLATION"],
            _ => return None,
        })
    }
}

impl From<i32> for BspVersion {
    fn from(raw: i32) -> Self {
        BspVersion(raw)
    }
}

impl PartialEq<i32> for BspVersion {
    fn eq(&self, other: &i32) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for BspVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.game() {
            Some(names) => write!(f, "{} ({})", self.0, names.join("/")),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_compares_equal_to_raw_int() {
        let v = BspVersion::new(20);
        assert_eq!(v, 20);
        assert_ne!(v, 19);
    }

    #[test]
    fn unknown_version_has_no_game_name() {
        assert!(BspVersion::new(9999).game().is_none());
    }
}
