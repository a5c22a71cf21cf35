//! Readable streams over a single ZIP entry's file data: a trivial slice
//! for stored (method 0) entries, an inflating stream for DEFLATE
//! (method 8) entries.

use std::io::{self, Read, Seek, SeekFrom};

use flate2::read::DeflateDecoder;

use crate::error::{Error, ErrorKind, Result};

/// Reader positioned over an uncompressed (stored) entry's data.
pub struct StoredEntryReader<'a, R> {
    reader: &'a mut R,
    start: u64,
    len: u64,
    pos: u64,
}

impl<'a, R: Read + Seek> StoredEntryReader<'a, R> {
    pub(super) fn new(reader: &'a mut R, start: u64, len: u64) -> Result<Self> {
        reader
            .seek(SeekFrom::Start(start))
            .map_err(|e| Error::new(ErrorKind::Format, format!("zip seek failed: {e}")))?;
        Ok(StoredEntryReader { reader, start, len, pos: 0 })
    }

    /// Seeks within the entry's uncompressed data.
    pub fn seek(&mut self, offset: u64) -> Result<u64> {
        if offset > self.len {
            return Err(Error::new(ErrorKind::OutOfRange, "seek past end of entry"));
        }
        self.reader
            .seek(SeekFrom::Start(self.start + offset))
            .map_err(|e| Error::new(ErrorKind::Format, format!("zip seek failed: {e}")))?;
        self.pos = offset;
        Ok(offset)
    }
}

impl<'a, R: Read> Read for StoredEntryReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len - self.pos;
        if remaining == 0 {
            return Ok(0);
        }
        let cap = remaining.min(buf.len() as u64) as usize;
        let n = self.reader.read(&mut buf[..cap])?;
        self.pos += n as u64;
        Ok(n)
    }
}

/// Reader inflating a DEFLATE (method 8) entry's data as it's read.
/// Non-seekable: DEFLATE streams can't jump to an arbitrary uncompressed
/// offset without re-inflating from the start, so `seek` always fails.
pub struct DeflateEntryReader<'a, R> {
    inner: DeflateDecoder<io::Take<&'a mut R>>,
}

impl<'a, R: Read> DeflateEntryReader<'a, R> {
    pub(super) fn new(reader: &'a mut R, compressed_len: u64) -> Self {
        DeflateEntryReader { inner: DeflateDecoder::new(reader.take(compressed_len)) }
    }

    /// Always fails: DEFLATE entry streams are not seekable.
    pub fn seek(&mut self, _offset: u64) -> Result<u64> {
        Err(Error::new(ErrorKind::PermissionDenied, "cannot seek a deflate entry stream"))
    }
}

impl<'a, R: Read> Read for DeflateEntryReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// A stream over one ZIP entry's file data, stored or inflated depending
/// on the entry's compression method.
pub enum EntryStream<'a, R> {
    Stored(StoredEntryReader<'a, R>),
    Deflate(DeflateEntryReader<'a, R>),
}

impl<'a, R: Read + Seek> EntryStream<'a, R> {
    /// Seeks within the entry, when the underlying stream supports it.
    pub fn seek(&mut self, offset: u64) -> Result<u64> {
        match self {
            EntryStream::Stored(s) => s.seek(offset),
            EntryStream::Deflate(s) => s.seek(offset),
        }
    }
}

impl<'a, R: Read> Read for EntryStream<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntryStream::Stored(s) => s.read(buf),
            EntryStream::Deflate(s) => s.read(buf),
        }
    }
}
