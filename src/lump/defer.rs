use binrw::io::{Seek, SeekFrom, Write};
use binrw::BinWrite;
use std::collections::HashMap;
use std::hash::Hash;

/// Records stream positions whose contents aren't known until later bytes
/// have been written, then rewrites them once the real values are
/// available (spec.md §4.1 "Deferred writes").
///
/// Two shapes are used by this crate: a `(offset, length)` pair patched
/// after a payload has been written, and a single `offset` patched once its
/// target address is known.
pub(crate) struct DeferredWrites<K> {
    marks: HashMap<K, u64>,
}

impl<K: Eq + Hash + Copy + std::fmt::Debug> DeferredWrites<K> {
    pub fn new() -> Self {
        DeferredWrites { marks: HashMap::new() }
    }

    /// Remember the current stream position under `key`, then write a
    /// zeroed placeholder of `placeholder_len` bytes so the caller can
    /// continue writing sequentially.
    pub fn defer<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        key: K,
        placeholder_len: usize,
    ) -> binrw::BinResult<()> {
        let pos = writer.stream_position()?;
        self.marks.insert(key, pos);
        writer.write_all(&vec![0u8; placeholder_len])?;
        Ok(())
    }

    /// Seek back to the deferred position for `key` and write `offset` and
    /// `length` there (as little-endian `i32`s), then restore the writer's
    /// position.
    pub fn set_pair<W: Write + Seek>(
        &self,
        writer: &mut W,
        key: K,
        offset: i32,
        length: i32,
    ) -> binrw::BinResult<()> {
        let &pos = self
            .marks
            .get(&key)
            .unwrap_or_else(|| panic!("no deferred write registered for {key:?}"));
        let back = writer.stream_position()?;
        writer.seek(SeekFrom::Start(pos))?;
        offset.write_le(writer)?;
        length.write_le(writer)?;
        writer.seek(SeekFrom::Start(back))?;
        Ok(())
    }

    /// Seek back to the deferred position for `key` and write a single
    /// little-endian `i32`, then restore the writer's position.
    pub fn set_single<W: Write + Seek>(
        &self,
        writer: &mut W,
        key: K,
        value: i32,
    ) -> binrw::BinResult<()> {
        let &pos = self
            .marks
            .get(&key)
            .unwrap_or_else(|| panic!("no deferred write registered for {key:?}"));
        let back = writer.stream_position()?;
        writer.seek(SeekFrom::Start(pos))?;
        value.write_le(writer)?;
        writer.seek(SeekFrom::Start(back))?;
        Ok(())
    }
}
