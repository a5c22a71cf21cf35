//! End-of-central-directory scan and central directory parsing.

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, ErrorKind, Result};

const EOCD_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0201_4b50;
const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const EOCD_FIXED_SIZE: u64 = 22;
const MAX_COMMENT_LEN: u64 = 0xFFFF;

fn io_err(e: io::Error) -> Error {
    Error::new(ErrorKind::Format, format!("zip i/o error: {e}"))
}

/// The parsed end-of-central-directory record.
pub struct Eocd {
    pub central_directory_offset: u64,
    pub central_directory_size: u64,
    pub total_entries: u16,
}

/// Scans backward up to 64 KiB + the fixed record size to tolerate an
/// archive comment, and returns the first (rightmost) structurally
/// consistent EOCD record found.
pub fn find_eocd<R: Read + Seek>(reader: &mut R) -> Result<Eocd> {
    let file_len = reader.seek(SeekFrom::End(0)).map_err(io_err)?;
    let search_len = (EOCD_FIXED_SIZE + MAX_COMMENT_LEN).min(file_len);
    let start = file_len - search_len;
    reader.seek(SeekFrom::Start(start)).map_err(io_err)?;

    let mut buf = vec![0u8; search_len as usize];
    reader.read_exact(&mut buf).map_err(io_err)?;

    for i in (0..buf.len().saturating_sub(3)).rev() {
        if buf[i..i + 4] != EOCD_SIGNATURE {
            continue;
        }
        if i + 22 > buf.len() {
            continue;
        }
        let mut cursor = &buf[i + 4..];
        let _disk_number = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let _cd_start_disk = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let _entries_this_disk = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let total_entries = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let central_directory_size = cursor.read_u32::<LittleEndian>().map_err(io_err)? as u64;
        let central_directory_offset = cursor.read_u32::<LittleEndian>().map_err(io_err)? as u64;
        let comment_len = cursor.read_u16::<LittleEndian>().map_err(io_err)? as usize;
        if i + 22 + comment_len <= buf.len() {
            return Ok(Eocd { central_directory_offset, central_directory_size, total_entries });
        }
    }

    Err(Error::new(ErrorKind::Format, "end-of-central-directory record not found"))
}

/// A single parsed central directory file header.
pub struct CentralDirectoryEntry {
    pub name: String,
    pub compression_method: u16,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
}

/// Reads and parses every entry in the central directory described by
/// `eocd`.
pub fn parse_central_directory<R: Read + Seek>(
    reader: &mut R,
    eocd: &Eocd,
) -> Result<Vec<CentralDirectoryEntry>> {
    reader
        .seek(SeekFrom::Start(eocd.central_directory_offset))
        .map_err(io_err)?;
    let mut buf = vec![0u8; eocd.central_directory_size as usize];
    reader.read_exact(&mut buf).map_err(io_err)?;

    let mut entries = Vec::with_capacity(eocd.total_entries as usize);
    let mut offset = 0usize;
    while offset + 46 <= buf.len() {
        let mut cursor = &buf[offset..];
        let signature = cursor.read_u32::<LittleEndian>().map_err(io_err)?;
        if signature != CENTRAL_DIRECTORY_SIGNATURE {
            return Err(Error::new(ErrorKind::Format, "malformed central directory entry"));
        }
        let _version_made_by = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let _version_needed = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let _flags = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let compression_method = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let _mod_time = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let _mod_date = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let _crc32 = cursor.read_u32::<LittleEndian>().map_err(io_err)?;
        let compressed_size = cursor.read_u32::<LittleEndian>().map_err(io_err)? as u64;
        let uncompressed_size = cursor.read_u32::<LittleEndian>().map_err(io_err)? as u64;
        let name_len = cursor.read_u16::<LittleEndian>().map_err(io_err)? as usize;
        let extra_len = cursor.read_u16::<LittleEndian>().map_err(io_err)? as usize;
        let comment_len = cursor.read_u16::<LittleEndian>().map_err(io_err)? as usize;
        let _disk_start = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>().map_err(io_err)?;
        let _external_attrs = cursor.read_u32::<LittleEndian>().map_err(io_err)?;
        let local_header_offset = cursor.read_u32::<LittleEndian>().map_err(io_err)? as u64;

        let name_start = offset + 46;
        let name_end = name_start + name_len;
        if name_end > buf.len() {
            return Err(Error::new(ErrorKind::Format, "central directory entry name overruns buffer"));
        }
        let name = String::from_utf8_lossy(&buf[name_start..name_end]).into_owned();

        entries.push(CentralDirectoryEntry {
            name,
            compression_method,
            compressed_size,
            uncompressed_size,
            local_header_offset,
        });

        offset = name_end + extra_len + comment_len;
    }

    Ok(entries)
}

/// Resolves the byte offset of a local file header's data, by reading
/// the header's variable-length name/extra fields to skip past them.
pub fn resolve_data_offset<R: Read + Seek>(reader: &mut R, local_header_offset: u64) -> Result<u64> {
    reader.seek(SeekFrom::Start(local_header_offset)).map_err(io_err)?;
    let mut fixed = [0u8; 30];
    reader.read_exact(&mut fixed).map_err(io_err)?;
    let signature = (&fixed[0..4]).read_u32::<LittleEndian>().map_err(io_err)?;
    if signature != LOCAL_FILE_HEADER_SIGNATURE {
        return Err(Error::new(ErrorKind::Format, "malformed local file header"));
    }
    let name_len = (&fixed[26..28]).read_u16::<LittleEndian>().map_err(io_err)? as u64;
    let extra_len = (&fixed[28..30]).read_u16::<LittleEndian>().map_err(io_err)? as u64;
    Ok(local_header_offset + 30 + name_len + extra_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn find_eocd_locates_trailing_record() {
        let mut data = vec![0u8; 10];
        data.extend_from_slice(&EOCD_SIGNATURE);
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&3u16.to_le_bytes());
        data.extend_from_slice(&3u16.to_le_bytes());
        data.extend_from_slice(&123u32.to_le_bytes());
        data.extend_from_slice(&456u32.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());

        let mut cursor = Cursor::new(data);
        let eocd = find_eocd(&mut cursor).unwrap();
        assert_eq!(eocd.total_entries, 3);
        assert_eq!(eocd.central_directory_size, 123);
        assert_eq!(eocd.central_directory_offset, 456);
    }

    #[test]
    fn find_eocd_fails_without_a_record() {
        let mut cursor = Cursor::new(vec![0u8; 64]);
        assert!(find_eocd(&mut cursor).is_err());
    }
}
