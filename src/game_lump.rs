use crate::error::BspError;
use crate::static_prop::StaticPropLump;
use binrw::{BinRead, BinReaderExt, BinWrite};
use bitflags::bitflags;

/// A game lump's 4-byte identifier. On disk these are stored byte-reversed
/// relative to their ASCII spelling (`sprp` is written as the bytes of
/// `"prps"`); this type stores the identifier the way callers spell it and
/// hides the reversal in `from_disk_bytes`/`to_disk_bytes`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameLumpId(pub [u8; 4]);

impl GameLumpId {
    pub const STATIC_PROPS: GameLumpId = GameLumpId(*b"sprp");

    fn from_disk_bytes(mut bytes: [u8; 4]) -> GameLumpId {
        bytes.reverse();
        GameLumpId(bytes)
    }

    fn to_disk_bytes(self) -> [u8; 4] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

impl std::fmt::Debug for GameLumpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if s.chars().all(|c| c.is_ascii_graphic()) => write!(f, "GameLumpId({s:?})"),
            _ => write!(f, "GameLumpId({:?})", self.0),
        }
    }
}

bitflags! {
    /// Flags on a single game lump's directory entry. `COMPRESSED` marks a
    /// per-lump LZMA payload; this crate does not support reading or
    /// writing compressed game lumps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GameLumpFlags: u16 {
        const COMPRESSED = 0x1;
    }
}

#[derive(Debug, Clone, Copy, BinRead, BinWrite)]
#[brw(little)]
struct RawGameLumpEntry {
    id: [u8; 4],
    flags: u16,
    version: u16,
    offset: i32,
    length: i32,
}

/// One entry of the nested directory embedded in the `GAME_LUMP` lump
/// (spec.md §4.2). `offset` is an absolute file offset, unlike the
/// lump-relative offsets used by the top-level directory.
#[derive(Debug, Clone)]
pub struct GameLump {
    pub id: GameLumpId,
    pub flags: GameLumpFlags,
    pub version: u16,
    pub data: Vec<u8>,
}

/// The parsed contents of the `GAME_LUMP` lump: a small directory followed
/// by each game lump's payload.
#[derive(Debug, Clone, Default)]
pub struct GameLumpHeader {
    pub lumps: Vec<GameLump>,
}

impl GameLumpHeader {
    pub fn find(&self, id: GameLumpId) -> Option<&GameLump> {
        self.lumps.iter().find(|l| l.id == id)
    }

    pub fn find_mut(&mut self, id: GameLumpId) -> Option<&mut GameLump> {
        self.lumps.iter_mut().find(|l| l.id == id)
    }

    /// Like [`GameLumpHeader::find`], but fails with
    /// [`BspError::MissingGameLump`] instead of returning `None`.
    pub fn require(&self, id: GameLumpId) -> Result<&GameLump, BspError> {
        self.find(id).ok_or(BspError::MissingGameLump(id))
    }

    /// Decode this file's static prop dictionary, if a `sprp` game lump is
    /// present.
    pub fn static_props(&self) -> Result<Option<StaticPropLump>, BspError> {
        match self.find(GameLumpId::STATIC_PROPS) {
            Some(lump) => Ok(Some(StaticPropLump::parse(lump.version, &lump.data)?)),
            None => Ok(None),
        }
    }

    /// Parse the `GAME_LUMP` lump's bytes: a lump-relative directory of
    /// `count` entries, each with an absolute file offset into `whole_file`.
    pub(crate) fn parse(lump_data: &[u8], whole_file: &[u8]) -> Result<GameLumpHeader, BspError> {
        if lump_data.is_empty() {
            return Ok(GameLumpHeader::default());
        }

        let mut cursor = binrw::io::Cursor::new(lump_data);
        let count: i32 = cursor.read_le()?;

        let mut entries = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            entries.push(RawGameLumpEntry::read(&mut cursor)?);
        }

        let mut lumps = Vec::with_capacity(entries.len());
        for entry in entries {
            let flags = GameLumpFlags::from_bits_truncate(entry.flags);
            if flags.contains(GameLumpFlags::COMPRESSED) {
                return Err(BspError::GameLumpOutOfBounds);
            }
            let start = entry.offset as i64;
            let end = start + entry.length as i64;
            if start < 0 || end > whole_file.len() as i64 {
                return Err(BspError::GameLumpOutOfBounds);
            }
            lumps.push(GameLump {
                id: GameLumpId::from_disk_bytes(entry.id),
                flags,
                version: entry.version,
                data: whole_file[start as usize..end as usize].to_vec(),
            });
        }

        Ok(GameLumpHeader { lumps })
    }

    /// Write the nested directory plus every game lump's payload. Returns
    /// the bytes to place into the top-level `GAME_LUMP` lump; `base_offset`
    /// is the absolute file offset this lump's data will itself start at, so
    /// that the nested entries' absolute offsets can be computed up front.
    pub(crate) fn write(&self, base_offset: i64) -> Result<Vec<u8>, BspError> {
        // The count is always written, even when there are no game lumps,
        // matching `original_source/srctools/bsp.py`'s `save` (it always
        // emits `struct.pack('<i', len(game_lumps))` unconditionally).
        let header_len = 4 + self.lumps.len() * 16;
        let mut out = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut out);
        (self.lumps.len() as i32).write_le(&mut cursor)?;

        let mut offset = base_offset + header_len as i64;
        let mut entries = Vec::with_capacity(self.lumps.len());
        for lump in &self.lumps {
            entries.push(RawGameLumpEntry {
                id: lump.id.to_disk_bytes(),
                flags: lump.flags.bits(),
                version: lump.version,
                offset: offset as i32,
                length: lump.data.len() as i32,
            });
            offset += lump.data.len() as i64;
        }
        for entry in &entries {
            entry.write(&mut cursor)?;
        }
        for lump in &self.lumps {
            std::io::Write::write_all(&mut cursor, &lump.data)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_through_disk_reversal() {
        let id = GameLumpId::STATIC_PROPS;
        let disk = id.to_disk_bytes();
        assert_eq!(GameLumpId::from_disk_bytes(disk), id);
        assert_eq!(&disk, b"prps");
    }

    #[test]
    fn debug_shows_ascii_spelling() {
        assert_eq!(format!("{:?}", GameLumpId::STATIC_PROPS), "GameLumpId(\"sprp\")");
    }

    #[test]
    fn write_with_no_lumps_still_emits_zero_count() {
        let header = GameLumpHeader::default();
        let bytes = header.write(1024).unwrap();
        assert_eq!(bytes, 0i32.to_le_bytes());
    }

    #[test]
    fn require_errors_on_absent_lump() {
        let header = GameLumpHeader::default();
        assert!(matches!(
            header.require(GameLumpId::STATIC_PROPS),
            Err(BspError::MissingGameLump(id)) if id == GameLumpId::STATIC_PROPS
        ));
    }
}
