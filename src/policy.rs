//! Traversal policy hooks
//!
//! A [`TraversalPolicy`] decides which entries are skipped and how errors are
//! handled. Every hook has a default, so a policy implements only what it
//! needs. [`HookPolicy`] builds a policy from closures.
//!
//! | Hook                 | Default                                   |
//! |----------------------|-------------------------------------------|
//! | `skip_path`          | never skip                                |
//! | `skip_file`          | never skip                                |
//! | `skip_link`          | not consulted (`inspects_links` is false) |
//! | `on_link_stat_error` | skip the entry                            |
//! | `on_stat_error`      | abort with the error                      |
//! | `on_walk_error`      | abort with the error                      |

use crate::error::BoxError;
use crate::file::WalkFile;
use std::fmt;
use std::io;
use std::path::Path;

/// Outcome of a stat or visit error hook
#[derive(Debug)]
pub enum Decision {
    /// Keep walking; the entry's remaining processing is abandoned
    Continue,
    /// Stop the whole traversal, surfacing this error
    Abort(BoxError),
}

/// Outcome of a link-aware stat error hook
#[derive(Debug)]
pub enum LinkStatDecision {
    /// Process the entry without a link classification
    ///
    /// The special-file filter cannot run and the walker will not descend
    /// into the entry even if it turns out to be a directory.
    Proceed,
    /// Skip the entry without visiting it
    Skip,
    /// Stop the whole traversal, surfacing this error
    Abort(BoxError),
}

/// Skip and error-recovery decisions consulted during traversal
///
/// Hooks returning `Result` abort the traversal when they fail.
pub trait TraversalPolicy {
    /// Skip an entry by path alone, before any system call on it
    ///
    /// # Errors
    ///
    /// An error aborts the traversal.
    fn skip_path(&self, _path: &Path) -> Result<bool, BoxError> {
        Ok(false)
    }

    /// Skip an entry after its link classification, before it is visited
    ///
    /// # Errors
    ///
    /// An error aborts the traversal.
    fn skip_file(&self, _path: &Path, _file: &mut dyn WalkFile) -> Result<bool, BoxError> {
        Ok(false)
    }

    /// Whether [`Self::skip_link`] should be consulted for symbolic links
    fn inspects_links(&self) -> bool {
        false
    }

    /// Skip a symbolic link given its raw target
    ///
    /// The target is empty when it could not be read because the link
    /// vanished or permission was denied.
    ///
    /// # Errors
    ///
    /// An error aborts the traversal.
    fn skip_link(&self, _path: &Path, _target: &Path) -> Result<bool, BoxError> {
        Ok(false)
    }

    /// Recover from a failed link-aware stat
    fn on_link_stat_error(&self, _path: &Path, _error: io::Error) -> LinkStatDecision {
        LinkStatDecision::Skip
    }

    /// Recover from a failed content-following stat
    fn on_stat_error(&self, _path: &Path, _file: &mut dyn WalkFile, error: io::Error) -> Decision {
        Decision::Abort(error.into())
    }

    /// Recover from a failed visit callback
    fn on_walk_error(&self, _path: &Path, _file: &mut dyn WalkFile, error: BoxError) -> Decision {
        Decision::Abort(error)
    }
}

/// Policy with every hook at its default
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl TraversalPolicy for DefaultPolicy {}

impl<P: TraversalPolicy + ?Sized> TraversalPolicy for Box<P> {
    fn skip_path(&self, path: &Path) -> Result<bool, BoxError> {
        (**self).skip_path(path)
    }

    fn skip_file(&self, path: &Path, file: &mut dyn WalkFile) -> Result<bool, BoxError> {
        (**self).skip_file(path, file)
    }

    fn inspects_links(&self) -> bool {
        (**self).inspects_links()
    }

    fn skip_link(&self, path: &Path, target: &Path) -> Result<bool, BoxError> {
        (**self).skip_link(path, target)
    }

    fn on_link_stat_error(&self, path: &Path, error: io::Error) -> LinkStatDecision {
        (**self).on_link_stat_error(path, error)
    }

    fn on_stat_error(&self, path: &Path, file: &mut dyn WalkFile, error: io::Error) -> Decision {
        (**self).on_stat_error(path, file, error)
    }

    fn on_walk_error(&self, path: &Path, file: &mut dyn WalkFile, error: BoxError) -> Decision {
        (**self).on_walk_error(path, file, error)
    }
}

type SkipPathFn = Box<dyn Fn(&Path) -> Result<bool, BoxError>>;
type SkipFileFn = Box<dyn Fn(&Path, &mut dyn WalkFile) -> Result<bool, BoxError>>;
type SkipLinkFn = Box<dyn Fn(&Path, &Path) -> Result<bool, BoxError>>;
type LinkStatErrorFn = Box<dyn Fn(&Path, io::Error) -> LinkStatDecision>;
type StatErrorFn = Box<dyn Fn(&Path, &mut dyn WalkFile, io::Error) -> Decision>;
type WalkErrorFn = Box<dyn Fn(&Path, &mut dyn WalkFile, BoxError) -> Decision>;

/// Policy assembled from optional closures
///
/// Unset hooks behave like [`DefaultPolicy`]. Setting a link hook turns on
/// link inspection.
///
/// # Examples
///
/// ```rust
/// use fswalker::{HookPolicy, WalkerBuilder};
///
/// let policy = HookPolicy::new()
///     .with_skip_path(|path| Ok(path.ends_with(".git")))
///     .with_skip_link(|_, target| Ok(target.is_absolute()));
/// let walker = WalkerBuilder::new().policy(policy).build();
/// # let _ = walker;
/// ```
#[derive(Default)]
pub struct HookPolicy {
    skip_path: Option<SkipPathFn>,
    skip_file: Option<SkipFileFn>,
    skip_link: Option<SkipLinkFn>,
    link_stat_error: Option<LinkStatErrorFn>,
    stat_error: Option<StatErrorFn>,
    walk_error: Option<WalkErrorFn>,
}

impl HookPolicy {
    /// Create a policy with no hooks set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path filter
    #[must_use]
    pub fn with_skip_path(
        mut self,
        hook: impl Fn(&Path) -> Result<bool, BoxError> + 'static,
    ) -> Self {
        self.skip_path = Some(Box::new(hook));
        self
    }

    /// Set the handle filter
    #[must_use]
    pub fn with_skip_file(
        mut self,
        hook: impl Fn(&Path, &mut dyn WalkFile) -> Result<bool, BoxError> + 'static,
    ) -> Self {
        self.skip_file = Some(Box::new(hook));
        self
    }

    /// Set the link filter
    #[must_use]
    pub fn with_skip_link(
        mut self,
        hook: impl Fn(&Path, &Path) -> Result<bool, BoxError> + 'static,
    ) -> Self {
        self.skip_link = Some(Box::new(hook));
        self
    }

    /// Set the link-aware stat error handler
    #[must_use]
    pub fn with_link_stat_error(
        mut self,
        hook: impl Fn(&Path, io::Error) -> LinkStatDecision + 'static,
    ) -> Self {
        self.link_stat_error = Some(Box::new(hook));
        self
    }

    /// Set the content-following stat error handler
    #[must_use]
    pub fn with_stat_error(
        mut self,
        hook: impl Fn(&Path, &mut dyn WalkFile, io::Error) -> Decision + 'static,
    ) -> Self {
        self.stat_error = Some(Box::new(hook));
        self
    }

    /// Set the visit error handler
    #[must_use]
    pub fn with_walk_error(
        mut self,
        hook: impl Fn(&Path, &mut dyn WalkFile, BoxError) -> Decision + 'static,
    ) -> Self {
        self.walk_error = Some(Box::new(hook));
        self
    }
}

impl TraversalPolicy for HookPolicy {
    fn skip_path(&self, path: &Path) -> Result<bool, BoxError> {
        self.skip_path.as_ref().map_or(Ok(false), |hook| hook(path))
    }

    fn skip_file(&self, path: &Path, file: &mut dyn WalkFile) -> Result<bool, BoxError> {
        self.skip_file
            .as_ref()
            .map_or(Ok(false), |hook| hook(path, file))
    }

    fn inspects_links(&self) -> bool {
        self.skip_link.is_some()
    }

    fn skip_link(&self, path: &Path, target: &Path) -> Result<bool, BoxError> {
        self.skip_link
            .as_ref()
            .map_or(Ok(false), |hook| hook(path, target))
    }

    fn on_link_stat_error(&self, path: &Path, error: io::Error) -> LinkStatDecision {
        match &self.link_stat_error {
            Some(hook) => hook(path, error),
            None => DefaultPolicy.on_link_stat_error(path, error),
        }
    }

    fn on_stat_error(&self, path: &Path, file: &mut dyn WalkFile, error: io::Error) -> Decision {
        match &self.stat_error {
            Some(hook) => hook(path, file, error),
            None => DefaultPolicy.on_stat_error(path, file, error),
        }
    }

    fn on_walk_error(&self, path: &Path, file: &mut dyn WalkFile, error: BoxError) -> Decision {
        match &self.walk_error {
            Some(hook) => hook(path, file, error),
            None => DefaultPolicy.on_walk_error(path, file, error),
        }
    }
}

impl fmt::Debug for HookPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookPolicy")
            .field("skip_path", &self.skip_path.is_some())
            .field("skip_file", &self.skip_file.is_some())
            .field("skip_link", &self.skip_link.is_some())
            .field("link_stat_error", &self.link_stat_error.is_some())
            .field("stat_error", &self.stat_error.is_some())
            .field("walk_error", &self.walk_error.is_some())
            .finish()
    }
}
