use crate::error::BspError;
use std::io::Cursor;
use zip::write::FileOptions;
use zip::ZipWriter;

/// A scoped editing session over the `PAKFILE` lump's ZIP archive (spec.md
/// §4.5). The caller writes files through this session; calling
/// [`PackfileSession::finish`] commits the rewritten bytes back to the lump
/// this session was opened from. Dropping the session without calling
/// `finish` discards any changes, leaving the original bytes untouched.
pub struct PackfileSession<'a> {
    original: &'a mut Vec<u8>,
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl<'a> PackfileSession<'a> {
    /// Opens the existing lump bytes for appending, or starts a fresh
    /// archive if the lump is currently empty.
    pub(crate) fn open(lump_data: &'a mut Vec<u8>) -> Result<PackfileSession<'a>, BspError> {
        let writer = if lump_data.is_empty() {
            ZipWriter::new(Cursor::new(Vec::new()))
        } else {
            ZipWriter::new_append(Cursor::new(lump_data.clone()))?
        };
        Ok(PackfileSession {
            original: lump_data,
            writer,
        })
    }

    /// Add or replace a file in the archive, using the default (deflate)
    /// compression method.
    pub fn write_file(&mut self, name: &str, data: &[u8]) -> Result<(), BspError> {
        self.writer.start_file(name, FileOptions::default())?;
        std::io::Write::write_all(&mut self.writer, data)?;
        Ok(())
    }

    /// Finalize the archive and write its bytes back to the lump this
    /// session was opened from. On any error, the lump keeps its original
    /// bytes.
    pub fn finish(self) -> Result<(), BspError> {
        let mut writer = self.writer;
        let cursor = writer.finish()?;
        *self.original = cursor.into_inner();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writing_and_finishing_produces_a_readable_zip() {
        let mut lump = Vec::new();
        let mut session = PackfileSession::open(&mut lump).unwrap();
        session.write_file("materials/foo.vmt", b"bar").unwrap();
        session.finish().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(lump)).unwrap();
        let mut file = archive.by_name("materials/foo.vmt").unwrap();
        let mut contents = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut contents).unwrap();
        assert_eq!(contents, b"bar");
    }

    #[test]
    fn dropping_without_finish_leaves_lump_untouched() {
        let mut lump = Vec::new();
        {
            let mut session = PackfileSession::open(&mut lump).unwrap();
            session.write_file("a.txt", b"x").unwrap();
        }
        assert!(lump.is_empty());
    }
}
