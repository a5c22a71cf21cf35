//! ZIP archive reader: end-of-central-directory scan, a sorted path
//! index, and DEFLATE/stored entry streams.

mod central_directory;
mod index;
mod inflate;

use std::io::{Read, Seek};

use central_directory::{find_eocd, parse_central_directory, resolve_data_offset, CentralDirectoryEntry};
pub use index::PathStatus;
use index::ZipIndex;
pub use inflate::EntryStream;

use crate::error::{Error, ErrorKind, Result};

/// A kind returned by [`ZipArchive::next_directory_entry`] for a single
/// child of a directory being iterated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// An opened ZIP archive: its central directory has been parsed and
/// indexed, but entry data is only read on demand.
pub struct ZipArchive<R> {
    reader: R,
    entries: Vec<CentralDirectoryEntry>,
    index: ZipIndex,
}

impl<R: Read + Seek> ZipArchive<R> {
    /// Parses `reader`'s end-of-central-directory record and central
    /// directory, and builds the path index.
    pub fn open(mut reader: R) -> Result<Self> {
        let eocd = find_eocd(&mut reader)?;
        let entries = parse_central_directory(&mut reader, &eocd)?;
        log::debug!("opened zip archive with {} entries", entries.len());
        let index = ZipIndex::build(&entries);
        Ok(ZipArchive { reader, entries, index })
    }

    /// Status of `path`: an existing file, an existing directory
    /// (explicit or implied by a deeper entry), or missing.
    pub fn path_status(&self, path: &str) -> PathStatus {
        self.index.path_status(path)
    }

    /// Opens a read stream positioned at `path`'s file data. Fails with
    /// [`ErrorKind::NoEntry`] if `path` doesn't name a file.
    pub fn open_file(&mut self, path: &str) -> Result<EntryStream<'_, R>> {
        let central_index = self
            .index
            .central_index(path)
            .ok_or_else(|| Error::new(ErrorKind::NoEntry, "no such file in archive"))?;
        let record = &self.entries[central_index];
        let data_offset = resolve_data_offset(&mut self.reader, record.local_header_offset)?;

        match record.compression_method {
            0 => Ok(EntryStream::Stored(inflate::StoredEntryReader::new(
                &mut self.reader,
                data_offset,
                record.uncompressed_size,
            )?)),
            8 => Ok(EntryStream::Deflate(inflate::DeflateEntryReader::new(
                &mut self.reader,
                record.compressed_size,
            ))),
            other => Err(Error::new(ErrorKind::Format, format!("unsupported compression method {other}"))),
        }
    }

    /// Begins iterating the immediate children of `path`.
    pub fn open_directory(&self, path: &str) -> Result<DirectoryIter> {
        if !matches!(self.index.path_status(path), PathStatus::ExistsDirectory) && !path.is_empty() && path != "." {
            return Err(Error::new(ErrorKind::NoEntry, "no such directory in archive"));
        }
        Ok(DirectoryIter { children: self.index.list_directory(path), cursor: 0 })
    }
}

/// Iterator over a directory's immediate children, produced by
/// [`ZipArchive::open_directory`].
pub struct DirectoryIter {
    children: Vec<(String, PathStatus)>,
    cursor: usize,
}

impl DirectoryIter {
    /// Returns the next child as `(name, kind)`, or `None` once the
    /// directory is exhausted.
    pub fn next_directory_entry(&mut self) -> Option<(String, EntryKind)> {
        let (name, status) = self.children.get(self.cursor)?.clone();
        self.cursor += 1;
        let kind = match status {
            PathStatus::ExistsDirectory => EntryKind::Directory,
            _ => EntryKind::File,
        };
        Some((name, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn build_test_archive() -> Vec<u8> {
        let mut buf = Vec::new();
        let mut central = Vec::new();
        let mut count = 0u16;

        let mut write_stored = |buf: &mut Vec<u8>, central: &mut Vec<u8>, name: &str, data: &[u8]| {
            let offset = buf.len() as u32;
            buf.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
            buf.extend_from_slice(&20u16.to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes());
            buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
            buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
            buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
            buf.extend_from_slice(&0u16.to_le_bytes());
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(data);

            central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u32.to_le_bytes());
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&0u32.to_le_bytes());
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name.as_bytes());
        };

        write_stored(&mut buf, &mut central, "hello.txt", b"hello, deepsea");
        write_stored(&mut buf, &mut central, "dir/", b"");
        write_stored(&mut buf, &mut central, "dir/child", b"nested");
        count += 3;

        let cd_offset = buf.len() as u32;
        buf.extend_from_slice(&central);
        let cd_size = central.len() as u32;

        buf.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&cd_size.to_le_bytes());
        buf.extend_from_slice(&cd_offset.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());

        buf
    }

    #[test]
    fn open_and_read_a_stored_entry() {
        let data = build_test_archive();
        let mut archive = ZipArchive::open(Cursor::new(data)).unwrap();
        assert_eq!(archive.path_status("hello.txt"), PathStatus::ExistsFile);
        assert_eq!(archive.path_status("dir"), PathStatus::ExistsDirectory);

        let mut stream = archive.open_file("hello.txt").unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello, deepsea");
    }

    #[test]
    fn directory_iteration_yields_immediate_children() {
        let data = build_test_archive();
        let archive = ZipArchive::open(Cursor::new(data)).unwrap();
        let mut iter = archive.open_directory(".").unwrap();
        let mut names = Vec::new();
        while let Some((name, _)) = iter.next_directory_entry() {
            names.push(name);
        }
        assert_eq!(names, vec!["dir", "hello.txt"]);
    }

    #[test]
    fn missing_file_is_no_entry() {
        let data = build_test_archive();
        let mut archive = ZipArchive::open(Cursor::new(data)).unwrap();
        let err = archive.open_file("missing.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoEntry);
    }

    #[test]
    fn deflate_entry_round_trips_through_flate2() {
        let mut compressed = Vec::new();
        {
            let mut encoder = DeflateEncoder::new(&mut compressed, Compression::default());
            encoder.write_all(b"deflate me").unwrap();
            encoder.finish().unwrap();
        }

        let mut buf = Vec::new();
        let mut central = Vec::new();
        let name = "entry.bin";
        let offset = buf.len() as u32;
        buf.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        buf.extend_from_slice(&20u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&8u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&compressed);

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&8u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        central.extend_from_slice(&10u32.to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());

        let cd_offset = buf.len() as u32;
        buf.extend_from_slice(&central);
        let cd_size = central.len() as u32;
        buf.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&cd_size.to_le_bytes());
        buf.extend_from_slice(&cd_offset.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());

        let mut archive = ZipArchive::open(Cursor::new(buf)).unwrap();
        let mut stream = archive.open_file("entry.bin").unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, "deflate me");
        assert!(stream.seek(0).is_err());
    }
}
