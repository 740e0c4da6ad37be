use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes a file by first writing to a sibling temp file, flushing and
/// syncing it, then renaming it over the destination. Readers never see a
/// partially-written file, and a failure before the rename leaves any
/// existing file at `path` untouched (spec.md §4.1 `BspFile::save`,
/// mirroring `srctools.AtomicWriter`).
pub(crate) struct AtomicWriter {
    dest: PathBuf,
    tmp_path: PathBuf,
    file: File,
}

impl AtomicWriter {
    pub fn new(dest: &Path) -> io::Result<Self> {
        let tmp_path = tmp_path_for(dest);
        let file = File::create(&tmp_path)?;
        Ok(AtomicWriter {
            dest: dest.to_path_buf(),
            tmp_path,
            file,
        })
    }

    /// Flush, sync, and rename the temp file into place. Consumes `self` so
    /// a writer can only be committed once.
    pub fn commit(mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        fs::rename(&self.tmp_path, &self.dest)
    }
}

impl Write for AtomicWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl io::Seek for AtomicWriter {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl Drop for AtomicWriter {
    fn drop(&mut self) {
        if self.tmp_path.exists() {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}

fn tmp_path_for(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{file_name}.tmp"))
}
