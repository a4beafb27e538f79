//! Handle capability set exposed to visit callbacks and policy hooks
//!
//! A visited entry is handed out as `&mut dyn WalkFile`: the callback can read
//! its bytes, classify it, or close it early. The walker closes every handle
//! itself once the entry is processed, so callbacks never have to.

use fs_dirent::{FileMetadata, LazyFile};
use std::io::{self, Read};

/// File operations available for a visited entry
///
/// # Examples
///
/// ```rust,no_run
/// use fswalker::{CancellationToken, Walker, WalkFile};
/// use std::io::Read;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut total = 0u64;
/// Walker::builder().build().walk(&CancellationToken::new(), &["/etc"], |_, _, file| {
///     if file.stat()?.is_regular() {
///         let mut contents = Vec::new();
///         file.read_to_end(&mut contents)?;
///         total += contents.len() as u64;
///     }
///     Ok(())
/// })?;
/// # Ok(())
/// # }
/// ```
pub trait WalkFile: Read {
    /// Content-following metadata of the entry
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be opened or stated.
    fn stat(&mut self) -> io::Result<FileMetadata>;

    /// Release the entry's descriptor; later reads and stats fail
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the descriptor fails.
    fn close(&mut self) -> io::Result<()>;
}

impl WalkFile for LazyFile {
    fn stat(&mut self) -> io::Result<FileMetadata> {
        Self::stat(self)
    }

    fn close(&mut self) -> io::Result<()> {
        Self::close(self)
    }
}
