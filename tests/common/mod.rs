use fswalker::{BoxError, CancellationToken, TraversalPolicy, WalkError, Walker};
use std::fs;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

/// Number of entries visited in a tree built by [`build_sample_tree`]
#[allow(dead_code)]
pub const SAMPLE_TREE_ENTRIES: usize = 11;

/// Route walker logs through the test harness; set `RUST_LOG` to see them
#[allow(dead_code)]
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Build the reference tree under `root`:
///
/// ```text
/// root/
///   a.txt b.txt c.txt d.txt e.txt
///   sub/ f.txt g.txt h.txt
///   loop -> .
///   pipe  (named pipe, never visited)
///   sock  (socket, never visited)
/// ```
#[allow(dead_code)]
pub fn build_sample_tree(root: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(root.join("sub"))?;
    for name in ["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"] {
        fs::write(root.join(name), name)?;
    }
    for name in ["f.txt", "g.txt", "h.txt"] {
        fs::write(root.join("sub").join(name), name)?;
    }
    std::os::unix::fs::symlink(".", root.join("loop"))?;
    nix::unistd::mkfifo(root.join("pipe").as_path(), nix::sys::stat::Mode::S_IRWXU)?;
    // The socket file outlives the listener
    drop(UnixListener::bind(root.join("sock"))?);
    Ok(())
}

/// Walk `locations` and collect every visited path
#[allow(dead_code)]
pub fn collect_paths<P: TraversalPolicy, S: AsRef<str>>(
    walker: &Walker<P>,
    locations: &[S],
) -> (Result<usize, WalkError>, Vec<PathBuf>) {
    let mut seen = Vec::new();
    let result = walker.walk(&CancellationToken::new(), locations, |_, path, _| {
        seen.push(path.to_path_buf());
        Ok::<(), BoxError>(())
    });
    (result, seen)
}

/// A location string for a temporary path
#[allow(dead_code)]
pub fn location(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[allow(dead_code)]
pub struct TestTimeoutGuard {
    cancelled: Arc<AtomicBool>,
}

impl Drop for TestTimeoutGuard {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Abort the test process if a traversal hangs
#[allow(dead_code)]
pub fn test_timeout_guard(duration: Duration) -> TestTimeoutGuard {
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = Arc::clone(&cancelled);
    std::thread::spawn(move || {
        std::thread::sleep(duration);
        if !cancelled_clone.load(Ordering::SeqCst) {
            eprintln!("Test timeout exceeded ({}s). Aborting.", duration.as_secs());
            std::process::abort();
        }
    });
    TestTimeoutGuard { cancelled }
}
