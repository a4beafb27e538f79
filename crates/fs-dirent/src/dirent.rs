//! Raw directory-record reading and parsing
//!
//! Reading a directory is split into two primitives:
//!
//! - [`read_chunk`] fills a caller-owned buffer with the next batch of raw
//!   kernel directory records for an open directory descriptor. This is the
//!   only platform-specific piece (`getdents64(2)` on Linux and Android).
//! - [`parse_records`] decodes as many complete records as a byte slice holds
//!   and reports how many bytes it consumed, so a record split across two
//!   reads stays in the caller's buffer until the rest of it arrives.
//!
//! `.` and `..` are consumed but never surfaced.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::os::fd::BorrowedFd;
use std::os::unix::ffi::OsStringExt;

/// Offset of `d_reclen` within a `linux_dirent64` record
const RECLEN_OFFSET: usize = 16;

/// Size of the fixed `linux_dirent64` header preceding `d_name`
pub const RECORD_HEADER_LEN: usize = 19;

/// Fallback used when the page size cannot be queried
const DEFAULT_PAGE_SIZE: usize = 4096;

/// Size of one memory page, used as the scratch buffer size for raw reads
#[must_use]
pub fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(size)
        .ok()
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Read the next chunk of raw directory records from `fd` into `buf`
///
/// Returns the number of bytes written; `0` means the directory stream is
/// exhausted. `EINTR` is retried.
///
/// # Errors
///
/// Returns the OS error reported by `getdents64(2)`, e.g. `ENOTDIR` when
/// `fd` is not a directory or `EINVAL` when `buf` cannot hold one record.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn read_chunk(fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize> {
    use std::os::fd::AsRawFd;

    loop {
        // SAFETY: buf is valid for writes of buf.len() bytes and fd is a live
        // descriptor for the duration of the borrow.
        let n = unsafe {
            libc::syscall(
                libc::SYS_getdents64,
                fd.as_raw_fd(),
                buf.as_mut_ptr().cast::<libc::c_void>(),
                buf.len(),
            )
        };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        return usize::try_from(n).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
    }
}

/// Read the next chunk of raw directory records from `fd` into `buf`
///
/// # Errors
///
/// Always returns [`io::ErrorKind::Unsupported`]: raw record reading is only
/// implemented for Linux and Android.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn read_chunk(_fd: BorrowedFd<'_>, _buf: &mut [u8]) -> io::Result<usize> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "raw directory records are not supported on this platform",
    ))
}

/// Parse complete `linux_dirent64` records from `data`
///
/// Every surfaced entry name is appended to `names` in record order. A
/// trailing partial record is left unconsumed.
///
/// # Returns
///
/// The number of bytes consumed from the front of `data`.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidData`] if a record header declares a
/// length shorter than the header itself.
pub fn parse_records(data: &[u8], names: &mut VecDeque<OsString>) -> io::Result<usize> {
    let mut consumed = 0;

    while data.len() - consumed >= RECORD_HEADER_LEN {
        let record = &data[consumed..];
        let reclen = usize::from(u16::from_ne_bytes([
            record[RECLEN_OFFSET],
            record[RECLEN_OFFSET + 1],
        ]));
        if reclen < RECORD_HEADER_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("corrupt directory record: length {reclen}"),
            ));
        }
        if reclen > record.len() {
            break;
        }

        let mut ino = [0u8; 8];
        ino.copy_from_slice(&record[..8]);
        let name_field = &record[RECORD_HEADER_LEN..reclen];
        let name_len = name_field
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(name_field.len());
        let name = &name_field[..name_len];

        consumed += reclen;

        // Deleted entries are reported with inode 0
        if u64::from_ne_bytes(ino) == 0 || name == b"." || name == b".." {
            continue;
        }
        names.push_back(OsString::from_vec(name.to_vec()));
    }

    Ok(consumed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::fd::AsFd;
    use tempfile::TempDir;

    /// Encode one `linux_dirent64` record padded to 8 bytes
    fn encode_record(ino: u64, name: &[u8]) -> Vec<u8> {
        let reclen = (RECORD_HEADER_LEN + name.len() + 1).next_multiple_of(8);
        let mut record = Vec::with_capacity(reclen);
        record.extend_from_slice(&ino.to_ne_bytes());
        record.extend_from_slice(&0i64.to_ne_bytes());
        record.extend_from_slice(&u16::try_from(reclen).unwrap().to_ne_bytes());
        record.push(libc::DT_REG);
        record.extend_from_slice(name);
        record.resize(reclen, 0);
        record
    }

    #[test]
    fn test_parse_complete_records() {
        let mut data = encode_record(1, b".");
        data.extend(encode_record(2, b".."));
        data.extend(encode_record(3, b"alpha"));
        data.extend(encode_record(4, b"beta.txt"));

        let mut names = VecDeque::new();
        let consumed = parse_records(&data, &mut names).unwrap();

        assert_eq!(consumed, data.len());
        assert_eq!(names, ["alpha", "beta.txt"]);
    }

    #[test]
    fn test_parse_leaves_partial_record() {
        let mut data = encode_record(3, b"alpha");
        let first_len = data.len();
        let second = encode_record(4, b"beta");
        data.extend_from_slice(&second[..second.len() - 3]);

        let mut names = VecDeque::new();
        let consumed = parse_records(&data, &mut names).unwrap();

        assert_eq!(consumed, first_len);
        assert_eq!(names, ["alpha"]);
    }

    #[test]
    fn test_parse_short_header_consumes_nothing() {
        let data = encode_record(3, b"alpha");
        let mut names = VecDeque::new();
        let consumed = parse_records(&data[..RECORD_HEADER_LEN - 1], &mut names).unwrap();
        assert_eq!(consumed, 0);
        assert!(names.is_empty());
    }

    #[test]
    fn test_parse_skips_deleted_entries() {
        let mut data = encode_record(0, b"gone");
        data.extend(encode_record(9, b"kept"));

        let mut names = VecDeque::new();
        parse_records(&data, &mut names).unwrap();
        assert_eq!(names, ["kept"]);
    }

    #[test]
    fn test_parse_rejects_corrupt_length() {
        let mut data = encode_record(3, b"alpha");
        data[RECLEN_OFFSET..RECLEN_OFFSET + 2].copy_from_slice(&4u16.to_ne_bytes());

        let mut names = VecDeque::new();
        let err = parse_records(&data, &mut names).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_page_size_is_sane() {
        let size = page_size();
        assert!(size >= 1024);
        assert!(size.is_power_of_two());
    }

    #[test]
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn test_read_chunk_lists_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one"), "1").unwrap();
        fs::create_dir(temp_dir.path().join("two")).unwrap();

        let dir = fs::File::open(temp_dir.path()).unwrap();
        let mut buf = vec![0u8; page_size()];
        let mut names = VecDeque::new();
        loop {
            let n = read_chunk(dir.as_fd(), &mut buf).unwrap();
            if n == 0 {
                break;
            }
            let consumed = parse_records(&buf[..n], &mut names).unwrap();
            assert_eq!(consumed, n);
        }

        let mut names: Vec<_> = names.into_iter().collect();
        names.sort();
        assert_eq!(names, ["one", "two"]);
    }

    #[test]
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn test_read_chunk_on_regular_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file");
        fs::write(&path, "data").unwrap();

        let file = fs::File::open(&path).unwrap();
        let mut buf = vec![0u8; page_size()];
        assert!(read_chunk(file.as_fd(), &mut buf).is_err());
    }
}
