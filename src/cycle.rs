//! Lexical symbolic-link cycle heuristic
//!
//! Decides whether following a link would loop back into the tree being
//! walked, using only the link's path and its raw target. No file system
//! access is made. The check is a byte-prefix comparison of cleaned paths,
//! which has false positives (`/data2` "contains" `/data`) and false
//! negatives (an absolute target naming an ancestor through another route).

use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Whether following a link at `path` pointing to `target` is assumed to loop
///
/// The link is treated as cyclic when:
/// - the cleaned target is `.` or `..`
/// - the cleaned link path starts with the cleaned target
/// - the raw target starts with `../`
///
/// # Examples
///
/// ```rust
/// use fswalker::is_cycle;
/// use std::path::Path;
///
/// assert!(is_cycle(Path::new("/data/loop"), Path::new(".")));
/// assert!(is_cycle(Path::new("/data/loop"), Path::new("/data")));
/// assert!(!is_cycle(Path::new("/data/alias"), Path::new("/srv/shared")));
/// ```
#[must_use]
pub fn is_cycle(path: &Path, target: &Path) -> bool {
    let raw_target = target.as_os_str().as_bytes();
    let target = clean(raw_target);
    if target == b"." || target == b".." {
        return true;
    }
    if clean(path.as_os_str().as_bytes()).starts_with(&target) {
        return true;
    }
    raw_target.starts_with(b"../")
}

/// Lexically normalize a path
///
/// Collapses repeated separators, drops `.` elements, resolves `..` against
/// the preceding element where possible and strips trailing separators. A
/// rooted path never climbs above `/`; a relative path keeps leading `..`
/// elements. An empty result becomes `.`.
pub(crate) fn clean(path: &[u8]) -> Vec<u8> {
    if path.is_empty() {
        return b".".to_vec();
    }

    let rooted = path[0] == b'/';
    let n = path.len();
    let mut out = Vec::with_capacity(n);
    let mut r = 0;
    // Bytes of `out` that `..` must not backtrack into
    let mut dotdot = 0;
    if rooted {
        out.push(b'/');
        r = 1;
        dotdot = 1;
    }

    while r < n {
        let at_end = |i: usize| i == n || path[i] == b'/';
        if path[r] == b'/' {
            r += 1;
        } else if path[r] == b'.' && at_end(r + 1) {
            r += 1;
        } else if path[r] == b'.' && r + 1 < n && path[r + 1] == b'.' && at_end(r + 2) {
            r += 2;
            if out.len() > dotdot {
                let mut w = out.len() - 1;
                while w > dotdot && out[w] != b'/' {
                    w -= 1;
                }
                out.truncate(w);
            } else if !rooted {
                if !out.is_empty() {
                    out.push(b'/');
                }
                out.extend_from_slice(b"..");
                dotdot = out.len();
            }
        } else {
            if (rooted && out.len() != 1) || (!rooted && !out.is_empty()) {
                out.push(b'/');
            }
            while r < n && path[r] != b'/' {
                out.push(path[r]);
                r += 1;
            }
        }
    }

    if out.is_empty() {
        out.push(b'.');
    }
    out
}
