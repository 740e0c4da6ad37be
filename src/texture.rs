use crate::error::BspError;
use binrw::BinReaderExt;

/// Maximum distance to scan forward from a string-table offset for a NUL
/// terminator before giving up (spec.md §4.7).
const MAX_STRING_LEN: usize = 128;

/// Decodes `TEXDATA_STRING_TABLE` (a flat array of offsets into
/// `TEXDATA_STRING_DATA`) into the texture name each offset points at.
pub fn read_texture_table(table: &[u8], string_data: &[u8]) -> Result<Vec<String>, BspError> {
    let mut cursor = binrw::io::Cursor::new(table);
    let entry_count = table.len() / 4;
    let mut names = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let offset: i32 = cursor.read_le()?;
        names.push(read_texture_name(string_data, offset)?);
    }
    Ok(names)
}

fn read_texture_name(string_data: &[u8], offset: i32) -> Result<String, BspError> {
    if offset < 0 {
        return Err(BspError::BadTextureString(offset));
    }
    let start = offset as usize;
    let slice = string_data
        .get(start..)
        .ok_or(BspError::BadTextureString(offset))?;
    let end = slice
        .iter()
        .take(MAX_STRING_LEN)
        .position(|&b| b == 0)
        .ok_or(BspError::BadTextureString(offset))?;
    Ok(String::from_utf8_lossy(&slice[..end]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_names_at_offsets() {
        let string_data = b"metal/floor\0dev/dev_grey\0";
        let offsets: Vec<i32> = vec![0, 12];
        let mut table = Vec::new();
        for o in &offsets {
            table.extend_from_slice(&o.to_le_bytes());
        }
        let names = read_texture_table(&table, string_data).unwrap();
        assert_eq!(names, vec!["metal/floor", "dev/dev_grey"]);
    }

    #[test]
    fn missing_terminator_within_128_bytes_errors() {
        let string_data = vec![b'a'; 200];
        let table = 0i32.to_le_bytes().to_vec();
        assert!(read_texture_table(&table, &string_data).is_err());
    }
}
