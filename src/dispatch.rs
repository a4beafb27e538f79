//! Multi-location entry point
//!
//! A location is a bare local path, a `file://` URI naming a local path, or
//! an `s3://bucket/prefix` URI naming an object-store prefix. Locations are
//! walked in order and share one entry limit.

use crate::cancel::CancellationToken;
use crate::error::{BoxError, Result, WalkErrorKind};
use crate::file::WalkFile;
use crate::policy::TraversalPolicy;
use crate::walker::{Limit, Progress, Walker};
use std::path::Path;
use tracing::debug;

/// A parsed traversal location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location<'a> {
    /// A local file-system path
    FileSystem(&'a Path),
    /// An object-store bucket and key prefix
    Bucket {
        /// Bucket name
        bucket: &'a str,
        /// Key prefix, empty for the whole bucket
        prefix: &'a str,
    },
}

impl<'a> Location<'a> {
    /// Parse a location string
    ///
    /// # Errors
    ///
    /// Returns [`WalkErrorKind::UnknownScheme`] for a scheme other than
    /// `file` or `s3`. `index` is the location's position in its input list
    /// and is only used for the error.
    pub fn parse(location: &'a str, index: usize) -> Result<Self, WalkErrorKind> {
        match split_uri(location) {
            (None, path) | (Some("file"), path) => Ok(Self::FileSystem(Path::new(path))),
            (Some("s3"), rest) => {
                let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
                Ok(Self::Bucket { bucket, prefix })
            }
            (Some(scheme), _) => Err(WalkErrorKind::UnknownScheme {
                location: location.to_string(),
                index,
                scheme: scheme.to_string(),
            }),
        }
    }
}

/// Split `scheme://rest` into its parts; a string without `://` has no scheme
#[must_use]
pub fn split_uri(uri: &str) -> (Option<&str>, &str) {
    match uri.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, uri),
    }
}

impl<P: TraversalPolicy> Walker<P> {
    /// Walk every location in order, returning the total number of entries
    /// visited
    ///
    /// The walker's limit applies to the whole call: entries visited under
    /// one location reduce what later locations may visit.
    ///
    /// # Errors
    ///
    /// Returns the first error from any location, or an
    /// [`WalkErrorKind::UnknownScheme`] error when reaching a location with
    /// an unsupported scheme. Locations before the failing one have been
    /// fully walked and their entries are included in
    /// [`WalkError::visited`](crate::WalkError::visited).
    pub fn walk<S, F>(&self, ctx: &CancellationToken, locations: &[S], mut visit: F) -> Result<usize>
    where
        S: AsRef<str>,
        F: FnMut(&CancellationToken, &Path, &mut dyn WalkFile) -> Result<(), BoxError>,
    {
        let mut total = 0;
        let mut remaining = self.limit();

        // An exhausted limit still parses every location, so a bad scheme
        // fails even after the budget is spent
        for (index, location) in locations.iter().enumerate() {
            let location = location.as_ref();
            let progress = match Location::parse(location, index)
                .map_err(|kind| kind.after(total))?
            {
                Location::FileSystem(path) => {
                    self.walk_file_system(ctx, path, &mut visit, remaining)
                }
                Location::Bucket { bucket, prefix } => {
                    self.walk_bucket(ctx, bucket, prefix, &mut visit, remaining)
                }
            }
            .map_err(|err| err.offset_visited(total))?;

            total += progress.visited;
            remaining = progress.remaining;
        }

        debug!("Walked {} entries across {} locations", total, locations.len());
        Ok(total)
    }

    /// Walk an object-store prefix
    ///
    /// No object-store backend is built in, so this visits nothing. An
    /// exhausted `limit` returns immediately.
    ///
    /// # Errors
    ///
    /// Never fails today; a backend reports its failures as
    /// [`WalkErrorKind::Bucket`].
    pub fn walk_bucket<F>(
        &self,
        _ctx: &CancellationToken,
        bucket: &str,
        prefix: &str,
        _visit: &mut F,
        limit: Limit,
    ) -> Result<Progress>
    where
        F: FnMut(&CancellationToken, &Path, &mut dyn WalkFile) -> Result<(), BoxError>,
    {
        if limit.is_exhausted() {
            return Ok(Progress {
                visited: 0,
                remaining: limit,
            });
        }
        debug!(
            "No object-store backend, skipping bucket {:?} prefix {:?}",
            bucket, prefix
        );
        Ok(Progress {
            visited: 0,
            remaining: limit,
        })
    }
}
