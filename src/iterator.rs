//! Buffered, exhaustive directory-entry reader
//!
//! [`DirentReader`] turns a stream of raw directory-record bytes into entry
//! names. Records may be split across reads at any byte offset; unconsumed
//! bytes are carried over and completed by the next read. Once the stream
//! ends or fails, every later call reports the same terminal condition.

use crate::error::replay_io_error;
use fs_dirent::dirent;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::os::fd::BorrowedFd;
use tracing::{trace, warn};

/// Source of raw directory-record bytes
pub trait DirentSource {
    /// Fill `buf` with the next chunk of records; `Ok(0)` means end of stream
    ///
    /// # Errors
    ///
    /// Returns the OS error of the underlying read.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl DirentSource for BorrowedFd<'_> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        dirent::read_chunk(*self, buf)
    }
}

/// Reads entry names from a [`DirentSource`], skipping `.`, `..` and deleted
/// records
pub struct DirentReader<S> {
    source: S,
    /// Bytes read but not yet parsed
    data: Vec<u8>,
    /// Scratch buffer for one read
    buf: Vec<u8>,
    /// Names parsed but not yet returned
    names: VecDeque<OsString>,
    eof: bool,
    err: Option<io::Error>,
}

impl<S: DirentSource> DirentReader<S> {
    /// Create a reader with a scratch buffer of one memory page
    pub fn new(source: S) -> Self {
        Self::with_buffer_size(source, dirent::page_size())
    }

    /// Create a reader with an explicit scratch buffer size
    ///
    /// A buffer smaller than one record still works because partial records
    /// accumulate across reads, but the real syscall rejects buffers that
    /// cannot hold the next record, so production readers use [`Self::new`].
    pub fn with_buffer_size(source: S, size: usize) -> Self {
        Self {
            source,
            data: Vec::new(),
            buf: vec![0; size.max(1)],
            names: VecDeque::new(),
            eof: false,
            err: None,
        }
    }

    /// Rebind to a new source and clear all state
    ///
    /// The scratch buffer is kept, so one reader can serve many directories.
    pub fn reset(&mut self, source: S) {
        self.source = source;
        self.data.clear();
        self.names.clear();
        self.eof = false;
        self.err = None;
    }

    /// Return the next entry name, or `None` once the directory is exhausted
    ///
    /// # Errors
    ///
    /// Returns the read or parse error that ended the stream. The same error
    /// is returned again by every later call.
    pub fn next_name(&mut self) -> io::Result<Option<OsString>> {
        if let Some(err) = &self.err {
            return Err(replay_io_error(err));
        }
        if let Some(name) = self.names.pop_front() {
            return Ok(Some(name));
        }
        if self.eof {
            return Ok(None);
        }

        loop {
            let consumed = match dirent::parse_records(&self.data, &mut self.names) {
                Ok(consumed) => consumed,
                Err(err) => return Err(self.fail(err)),
            };
            self.data.drain(..consumed);
            if let Some(name) = self.names.pop_front() {
                return Ok(Some(name));
            }

            let read = match self.source.read_chunk(&mut self.buf) {
                Ok(read) => read,
                Err(err) => return Err(self.fail(err)),
            };
            if read == 0 {
                if !self.data.is_empty() {
                    warn!(
                        "discarding {} bytes of incomplete directory record at end of stream",
                        self.data.len()
                    );
                    self.data.clear();
                }
                self.eof = true;
                return Ok(None);
            }
            trace!("read {} bytes of directory records", read);
            self.data.extend_from_slice(&self.buf[..read]);
        }
    }

    fn fail(&mut self, err: io::Error) -> io::Error {
        let replay = replay_io_error(&err);
        self.err = Some(err);
        replay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;
    use std::fs;
    use std::os::fd::AsFd;
    use std::os::unix::ffi::OsStrExt;
    use tempfile::TempDir;

    fn encode_record(ino: u64, name: &[u8]) -> Vec<u8> {
        let reclen = (dirent::RECORD_HEADER_LEN + name.len() + 1).next_multiple_of(8);
        let mut record = vec![0u8; reclen];
        record[..8].copy_from_slice(&ino.to_ne_bytes());
        record[16..18].copy_from_slice(&u16::try_from(reclen).unwrap().to_ne_bytes());
        record[18] = libc::DT_REG;
        record[19..19 + name.len()].copy_from_slice(name);
        record
    }

    /// Hands out a fixed byte stream a few bytes at a time
    struct ChunkedSource {
        stream: Vec<u8>,
        pos: usize,
        chunk: usize,
        fail_at_end: Option<i32>,
        reads: usize,
    }

    impl ChunkedSource {
        fn new(stream: Vec<u8>, chunk: usize) -> Self {
            Self {
                stream,
                pos: 0,
                chunk,
                fail_at_end: None,
                reads: 0,
            }
        }
    }

    impl DirentSource for ChunkedSource {
        fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            let remaining = self.stream.len() - self.pos;
            if remaining == 0 {
                if let Some(code) = self.fail_at_end {
                    return Err(io::Error::from_raw_os_error(code));
                }
                return Ok(0);
            }
            let n = remaining.min(self.chunk).min(buf.len());
            buf[..n].copy_from_slice(&self.stream[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn sample_stream() -> Vec<u8> {
        [
            encode_record(1, b"."),
            encode_record(2, b".."),
            encode_record(10, b"alpha"),
            encode_record(0, b"deleted"),
            encode_record(11, b"a-much-longer-entry-name.txt"),
            encode_record(12, b"z"),
        ]
        .concat()
    }

    fn drain<S: DirentSource>(reader: &mut DirentReader<S>) -> io::Result<Vec<OsString>> {
        let mut names = Vec::new();
        while let Some(name) = reader.next_name()? {
            names.push(name);
        }
        Ok(names)
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(7)]
    #[case(19)]
    #[case(24)]
    #[case(64)]
    #[case(4096)]
    fn test_records_split_at_any_offset(#[case] chunk: usize) {
        let mut reader = DirentReader::new(ChunkedSource::new(sample_stream(), chunk));
        let names = drain(&mut reader).unwrap();
        assert_eq!(
            names,
            vec![
                OsString::from("alpha"),
                OsString::from("a-much-longer-entry-name.txt"),
                OsString::from("z"),
            ]
        );
    }

    #[test]
    fn test_buffer_smaller_than_record() {
        let mut reader =
            DirentReader::with_buffer_size(ChunkedSource::new(sample_stream(), 4096), 5);
        assert_eq!(drain(&mut reader).unwrap().len(), 3);
    }

    #[test]
    fn test_end_of_stream_is_sticky() {
        let mut reader = DirentReader::new(ChunkedSource::new(sample_stream(), 16));
        drain(&mut reader).unwrap();
        let reads = reader.source.reads;

        assert!(reader.next_name().unwrap().is_none());
        assert!(reader.next_name().unwrap().is_none());
        assert_eq!(reader.source.reads, reads, "no reads after end of stream");
    }

    #[test]
    fn test_read_error_is_sticky() {
        let mut source = ChunkedSource::new(encode_record(5, b"only"), 4096);
        source.fail_at_end = Some(libc::EIO);
        let mut reader = DirentReader::new(source);

        assert_eq!(reader.next_name().unwrap(), Some(OsString::from("only")));
        for _ in 0..3 {
            let err = reader.next_name().unwrap_err();
            assert_eq!(err.raw_os_error(), Some(libc::EIO));
        }
        assert_eq!(reader.source.reads, 2);
    }

    #[test]
    fn test_corrupt_record_is_sticky() {
        let mut stream = encode_record(5, b"bad");
        stream[16..18].copy_from_slice(&4u16.to_ne_bytes());
        let mut reader = DirentReader::new(ChunkedSource::new(stream, 4096));

        assert_eq!(
            reader.next_name().unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
        assert_eq!(
            reader.next_name().unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
    }

    #[test]
    fn test_reset_clears_terminal_state() {
        let mut failing = ChunkedSource::new(Vec::new(), 8);
        failing.fail_at_end = Some(libc::EBADF);
        let mut reader = DirentReader::new(failing);
        assert!(reader.next_name().is_err());

        reader.reset(ChunkedSource::new(encode_record(9, b"fresh"), 8));
        assert_eq!(drain(&mut reader).unwrap(), vec![OsString::from("fresh")]);
    }

    #[test]
    fn test_reset_discards_partial_data() {
        let stream = encode_record(9, b"first");
        let mut reader = DirentReader::new(ChunkedSource::new(stream[..10].to_vec(), 10));
        assert!(reader.next_name().unwrap().is_none());

        reader.reset(ChunkedSource::new(encode_record(3, b"second"), 10));
        assert_eq!(drain(&mut reader).unwrap(), vec![OsString::from("second")]);
    }

    #[test]
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn test_real_directory_is_read_exhaustively() {
        let temp_dir = TempDir::new().unwrap();
        let mut expected = HashSet::new();
        // Long names force many getdents calls with a page-sized buffer
        for i in 0..2000 {
            let name = format!("entry-{i:05}-{}", "x".repeat(100));
            fs::write(temp_dir.path().join(&name), "").unwrap();
            expected.insert(OsString::from(name));
        }

        let dir = fs::File::open(temp_dir.path()).unwrap();
        let mut reader = DirentReader::new(dir.as_fd());
        let names = drain(&mut reader).unwrap();

        assert_eq!(names.len(), expected.len());
        let seen: HashSet<OsString> = names.into_iter().collect();
        assert_eq!(seen, expected);
        assert!(seen.iter().all(|n| n.as_bytes() != b"." && n.as_bytes() != b".."));
    }

    #[test]
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn test_reset_to_another_directory() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("one"), "").unwrap();
        fs::write(second.path().join("two"), "").unwrap();

        let first_dir = fs::File::open(first.path()).unwrap();
        let second_dir = fs::File::open(second.path()).unwrap();

        let mut reader = DirentReader::new(first_dir.as_fd());
        assert_eq!(drain(&mut reader).unwrap(), vec![OsString::from("one")]);
        reader.reset(second_dir.as_fd());
        assert_eq!(drain(&mut reader).unwrap(), vec![OsString::from("two")]);
    }
}
