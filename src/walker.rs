//! Recursive file-system traversal
//!
//! [`Walker::walk_file_system`] visits a root and everything below it in
//! pre-order: a directory is passed to the visit callback before its
//! children. Sub-directories are opened relative to their parent's
//! descriptor and each entry is classified with a link-aware stat on that
//! descriptor, so renaming an ancestor mid-walk does not redirect the
//! traversal.
//!
//! Per entry the walker:
//! 1. checks for cancellation and asks `skip_path`
//! 2. link-stats the entry and drops sockets, named pipes and files of
//!    unknown type unseen
//! 3. asks `skip_file`, and `skip_link` for symbolic links
//! 4. counts the entry and calls the visit callback
//! 5. stats the entry's content and descends into directories, following a
//!    symbolic link only when [`is_cycle`] does not flag it

use crate::cached::CachedHandle;
use crate::cancel::CancellationToken;
use crate::cycle::is_cycle;
use crate::error::{replay_io_error, BoxError, Result, WalkError, WalkErrorKind};
use crate::file::WalkFile;
use crate::iterator::DirentReader;
use crate::policy::{Decision, DefaultPolicy, LinkStatDecision, TraversalPolicy};
use fs_dirent::{DirectoryFd, FileMetadata, LazyFile};
use std::ffi::OsStr;
use std::io;
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Upper bound on the number of entries visited by one traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Limit {
    /// Visit everything
    #[default]
    Unbounded,
    /// Visit at most this many entries
    AtMost(usize),
}

impl Limit {
    /// Whether no further entries may be visited
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        matches!(self, Self::AtMost(0))
    }

    /// The limit left after visiting `count` entries
    #[must_use]
    pub const fn consume(self, count: usize) -> Self {
        match self {
            Self::Unbounded => Self::Unbounded,
            Self::AtMost(max) => Self::AtMost(max.saturating_sub(count)),
        }
    }
}

impl From<Option<usize>> for Limit {
    fn from(max: Option<usize>) -> Self {
        max.map_or(Self::Unbounded, Self::AtMost)
    }
}

/// Entries visited by a traversal and the limit left for later work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Number of visit-callback invocations
    pub visited: usize,
    /// Limit remaining after this traversal
    pub remaining: Limit,
}

impl Progress {
    const fn start(limit: Limit) -> Self {
        Self {
            visited: 0,
            remaining: limit,
        }
    }

    fn count_visit(&mut self) {
        self.visited += 1;
        self.remaining = self.remaining.consume(1);
    }
}

/// Walker configuration
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig<P = DefaultPolicy> {
    /// Skip and error-recovery hooks
    pub policy: P,
    /// Maximum entries visited by one [`Walker::walk`] call
    pub limit: Limit,
}

/// Builder for [`Walker`]
///
/// # Examples
///
/// ```rust
/// use fswalker::{Limit, WalkerBuilder};
///
/// let walker = WalkerBuilder::new().max_entries(100).build();
/// assert_eq!(walker.limit(), Limit::AtMost(100));
/// ```
#[derive(Debug, Clone, Default)]
pub struct WalkerBuilder<P = DefaultPolicy> {
    config: WalkerConfig<P>,
}

impl WalkerBuilder {
    /// Start from the default policy with no limit
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P> WalkerBuilder<P> {
    /// Replace the policy
    #[must_use]
    pub fn policy<Q: TraversalPolicy>(self, policy: Q) -> WalkerBuilder<Q> {
        WalkerBuilder {
            config: WalkerConfig {
                policy,
                limit: self.config.limit,
            },
        }
    }

    /// Set the entry limit
    #[must_use]
    pub fn limit(mut self, limit: Limit) -> Self {
        self.config.limit = limit;
        self
    }

    /// Visit at most `max` entries
    #[must_use]
    pub fn max_entries(self, max: usize) -> Self {
        self.limit(Limit::AtMost(max))
    }

    /// Build the walker
    #[must_use]
    pub fn build(self) -> Walker<P> {
        Walker {
            policy: self.config.policy,
            limit: self.config.limit,
        }
    }
}

/// Depth-first, pre-order directory walker
#[derive(Debug, Clone, Default)]
pub struct Walker<P = DefaultPolicy> {
    policy: P,
    limit: Limit,
}

impl Walker {
    /// Start building a walker with the default policy and no limit
    #[must_use]
    pub fn builder() -> WalkerBuilder {
        WalkerBuilder::new()
    }
}

impl<P: TraversalPolicy> Walker<P> {
    /// Create a walker from a configuration
    pub fn new(config: WalkerConfig<P>) -> Self {
        Self {
            policy: config.policy,
            limit: config.limit,
        }
    }

    /// The configured policy
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// The configured entry limit
    pub fn limit(&self) -> Limit {
        self.limit
    }

    /// Walk a local root and everything below it
    ///
    /// The root is visited first (unless skipped or filtered). If it is a
    /// directory, or a symbolic link to one, its contents are walked. At most
    /// `limit` entries are visited; the returned [`Progress`] reports how
    /// many were and how much of the limit is left.
    ///
    /// # Errors
    ///
    /// Returns an error when the root cannot be classified or opened, when a
    /// hook fails, when the policy aborts on an error, when a directory read
    /// fails, or when `ctx` is cancelled. The error carries the number of
    /// entries visited before the abort.
    pub fn walk_file_system<F>(
        &self,
        ctx: &CancellationToken,
        root: &Path,
        visit: &mut F,
        limit: Limit,
    ) -> Result<Progress>
    where
        F: FnMut(&CancellationToken, &Path, &mut dyn WalkFile) -> Result<(), BoxError>,
    {
        let mut progress = Progress::start(limit);
        if limit.is_exhausted() {
            return Ok(progress);
        }
        if ctx.is_cancelled() {
            return Err(WalkErrorKind::Cancelled.after(0));
        }
        debug!("Walking root: {}", root.display());

        if self.skip_path(root, 0)? {
            trace!("Skipping root by path: {}", root.display());
            return Ok(progress);
        }

        let link_metadata = match std::fs::symlink_metadata(root) {
            Ok(metadata) => Some(FileMetadata::from_std(&metadata)),
            Err(error) => {
                let retained = replay_io_error(&error);
                match self.policy.on_link_stat_error(root, error) {
                    LinkStatDecision::Proceed => None,
                    LinkStatDecision::Skip => {
                        return Err(link_stat_error(root, retained.into(), 0));
                    }
                    LinkStatDecision::Abort(source) => {
                        return Err(link_stat_error(root, source, 0));
                    }
                }
            }
        };
        if link_metadata.is_some_and(|metadata| is_special(&metadata)) {
            trace!("Skipping special root: {}", root.display());
            return Ok(progress);
        }

        let mut file = CachedHandle::new(LazyFile::new(root));
        if let Err(source) = file.inner_mut().open() {
            return Err(WalkErrorKind::Open {
                path: root.to_path_buf(),
                source,
            }
            .after(0));
        }

        let result = self.walk_root(ctx, root, link_metadata, &mut file, visit, &mut progress);
        close_quietly(&mut file);
        result.map(|()| progress)
    }

    fn walk_root<F>(
        &self,
        ctx: &CancellationToken,
        root: &Path,
        link_metadata: Option<FileMetadata>,
        file: &mut CachedHandle<LazyFile>,
        visit: &mut F,
        progress: &mut Progress,
    ) -> Result<()>
    where
        F: FnMut(&CancellationToken, &Path, &mut dyn WalkFile) -> Result<(), BoxError>,
    {
        if self.skip_file(root, file, progress.visited)? {
            trace!("Skipping root by handle: {}", root.display());
            return Ok(());
        }
        if self.policy.inspects_links() && link_metadata.is_some_and(|m| m.is_symlink()) {
            let target = lenient_link_target(std::fs::read_link(root), root, progress.visited)?;
            if self.skip_link(root, &target, progress.visited)? {
                trace!("Skipping root link: {}", root.display());
                return Ok(());
            }
        }

        progress.count_visit();
        self.call_visit(ctx, root, file, visit, progress.visited)?;
        if progress.remaining.is_exhausted() {
            return Ok(());
        }

        let Some(metadata) = self.stat(root, file, progress.visited)? else {
            return Ok(());
        };
        if !metadata.is_dir() {
            return Ok(());
        }

        // A root given as a link to a directory is always followed
        let dir_fd = file.directory_fd().map_err(|source| {
            WalkErrorKind::Open {
                path: root.to_path_buf(),
                source,
            }
            .after(progress.visited)
        })?;
        let child = self
            .walk_directory(ctx, root, &dir_fd, visit, progress.remaining)
            .map_err(|err| err.offset_visited(progress.visited))?;
        progress.visited += child.visited;
        progress.remaining = child.remaining;
        Ok(())
    }

    /// Walk the entries of an open directory
    fn walk_directory<F>(
        &self,
        ctx: &CancellationToken,
        dir: &Path,
        dir_fd: &DirectoryFd,
        visit: &mut F,
        limit: Limit,
    ) -> Result<Progress>
    where
        F: FnMut(&CancellationToken, &Path, &mut dyn WalkFile) -> Result<(), BoxError>,
    {
        let mut progress = Progress::start(limit);
        debug!("Processing directory: {}", dir.display());

        let mut reader = DirentReader::new(dir_fd.as_fd());
        while !progress.remaining.is_exhausted() {
            if ctx.is_cancelled() {
                return Err(WalkErrorKind::Cancelled.after(progress.visited));
            }

            let name = match reader.next_name() {
                Ok(Some(name)) => name,
                Ok(None) => break,
                Err(source) => {
                    return Err(WalkErrorKind::ReadDir {
                        path: dir.to_path_buf(),
                        source,
                    }
                    .after(progress.visited));
                }
            };
            let path = dir.join(&name);

            if self.skip_path(&path, progress.visited)? {
                trace!("Skipping by path: {}", path.display());
                continue;
            }

            let link_metadata = match dir_fd.symlink_metadata_at(&name) {
                Ok(metadata) => Some(metadata),
                Err(error) => match self.policy.on_link_stat_error(&path, error) {
                    LinkStatDecision::Proceed => {
                        debug!("Proceeding without link status: {}", path.display());
                        None
                    }
                    LinkStatDecision::Skip => {
                        trace!("Skipping after link stat error: {}", path.display());
                        continue;
                    }
                    LinkStatDecision::Abort(source) => {
                        return Err(link_stat_error(&path, source, progress.visited));
                    }
                },
            };
            if link_metadata.is_some_and(|metadata| is_special(&metadata)) {
                trace!("Skipping special file: {}", path.display());
                continue;
            }

            let mut file = CachedHandle::new(LazyFile::at(dir_fd, &name, path.clone()));
            let result = self.walk_entry(
                ctx,
                dir_fd,
                &name,
                &path,
                link_metadata,
                &mut file,
                visit,
                &mut progress,
            );
            close_quietly(&mut file);
            result?;
        }

        Ok(progress)
    }

    /// Filter, visit and possibly descend into one directory entry
    #[allow(clippy::too_many_arguments)]
    fn walk_entry<F>(
        &self,
        ctx: &CancellationToken,
        dir_fd: &DirectoryFd,
        name: &OsStr,
        path: &Path,
        link_metadata: Option<FileMetadata>,
        file: &mut CachedHandle<LazyFile>,
        visit: &mut F,
        progress: &mut Progress,
    ) -> Result<()>
    where
        F: FnMut(&CancellationToken, &Path, &mut dyn WalkFile) -> Result<(), BoxError>,
    {
        if self.skip_file(path, file, progress.visited)? {
            trace!("Skipping by handle: {}", path.display());
            return Ok(());
        }

        let is_link = link_metadata.is_some_and(|m| m.is_symlink());
        if is_link && self.policy.inspects_links() {
            let target = lenient_link_target(dir_fd.readlinkat(name), path, progress.visited)?;
            if self.skip_link(path, &target, progress.visited)? {
                trace!("Skipping link: {}", path.display());
                return Ok(());
            }
        }

        progress.count_visit();
        self.call_visit(ctx, path, file, visit, progress.visited)?;
        if progress.remaining.is_exhausted() {
            return Ok(());
        }

        let Some(metadata) = self.stat(path, file, progress.visited)? else {
            return Ok(());
        };
        if !metadata.is_dir() {
            return Ok(());
        }

        match link_metadata {
            None => {
                warn!(
                    "Not descending into directory with unknown link status: {}",
                    path.display()
                );
                return Ok(());
            }
            Some(_) if is_link => {
                let target = dir_fd.readlinkat(name).map_err(|source| {
                    WalkErrorKind::ReadLink {
                        path: path.to_path_buf(),
                        source,
                    }
                    .after(progress.visited)
                })?;
                if is_cycle(path, &target) {
                    debug!(
                        "Not following cyclic link: {} -> {}",
                        path.display(),
                        target.display()
                    );
                    return Ok(());
                }
            }
            Some(_) => {}
        }

        let child_fd = file.directory_fd().map_err(|source| {
            WalkErrorKind::Open {
                path: path.to_path_buf(),
                source,
            }
            .after(progress.visited)
        })?;
        let child = self
            .walk_directory(ctx, path, &child_fd, visit, progress.remaining)
            .map_err(|err| err.offset_visited(progress.visited))?;
        progress.visited += child.visited;
        progress.remaining = child.remaining;
        Ok(())
    }

    fn call_visit<F>(
        &self,
        ctx: &CancellationToken,
        path: &Path,
        file: &mut CachedHandle<LazyFile>,
        visit: &mut F,
        visited: usize,
    ) -> Result<()>
    where
        F: FnMut(&CancellationToken, &Path, &mut dyn WalkFile) -> Result<(), BoxError>,
    {
        let Err(error) = visit(ctx, path, file) else {
            return Ok(());
        };
        match self.policy.on_walk_error(path, file, error) {
            Decision::Continue => {
                debug!("Continuing after walk function error: {}", path.display());
                Ok(())
            }
            Decision::Abort(source) => Err(WalkErrorKind::Visit {
                path: path.to_path_buf(),
                source,
            }
            .after(visited)),
        }
    }

    /// Content-following stat; `None` when the policy chose to continue
    fn stat(
        &self,
        path: &Path,
        file: &mut CachedHandle<LazyFile>,
        visited: usize,
    ) -> Result<Option<FileMetadata>> {
        let error = match file.stat() {
            Ok(metadata) => return Ok(Some(metadata)),
            Err(error) => error,
        };
        match self.policy.on_stat_error(path, file, error) {
            Decision::Continue => {
                debug!("Continuing after stat error: {}", path.display());
                Ok(None)
            }
            Decision::Abort(source) => Err(WalkErrorKind::Stat {
                path: path.to_path_buf(),
                source,
            }
            .after(visited)),
        }
    }

    fn skip_path(&self, path: &Path, visited: usize) -> Result<bool> {
        self.policy
            .skip_path(path)
            .map_err(|source| hook_error("skip_path", path, source, visited))
    }

    fn skip_file(
        &self,
        path: &Path,
        file: &mut CachedHandle<LazyFile>,
        visited: usize,
    ) -> Result<bool> {
        self.policy
            .skip_file(path, file)
            .map_err(|source| hook_error("skip_file", path, source, visited))
    }

    fn skip_link(&self, path: &Path, target: &Path, visited: usize) -> Result<bool> {
        self.policy
            .skip_link(path, target)
            .map_err(|source| hook_error("skip_link", path, source, visited))
    }
}

/// Sockets, pipes and unknown types are never visited
fn is_special(metadata: &FileMetadata) -> bool {
    metadata.is_socket() || metadata.is_named_pipe() || metadata.is_irregular()
}

/// Read a link target for `skip_link`, tolerating a vanished or unreadable
/// link with an empty target
fn lenient_link_target(
    target: io::Result<PathBuf>,
    path: &Path,
    visited: usize,
) -> Result<PathBuf> {
    match target {
        Ok(target) => Ok(target),
        Err(error)
            if matches!(
                error.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ) =>
        {
            debug!("Unreadable link target for {}: {}", path.display(), error);
            Ok(PathBuf::new())
        }
        Err(source) => Err(WalkErrorKind::ReadLink {
            path: path.to_path_buf(),
            source,
        }
        .after(visited)),
    }
}

fn link_stat_error(path: &Path, source: BoxError, visited: usize) -> WalkError {
    WalkErrorKind::LinkStat {
        path: path.to_path_buf(),
        source,
    }
    .after(visited)
}

fn hook_error(
    hook: &'static str,
    path: &Path,
    source: BoxError,
    visited: usize,
) -> WalkError {
    WalkErrorKind::Hook {
        hook,
        path: path.to_path_buf(),
        source,
    }
    .after(visited)
}

fn close_quietly(file: &mut CachedHandle<LazyFile>) {
    if let Err(err) = file.close() {
        warn!("Failed to close {}: {}", file.path().display(), err);
    }
}
