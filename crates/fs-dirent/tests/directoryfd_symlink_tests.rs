//! Tests for how DirectoryFd *at methods and LazyFile treat symlinks
//!
//! Link-aware metadata must describe the link itself, while opening a child
//! follows the link to its target.

use fs_dirent::{DirectoryFd, LazyFile};
use std::fs;
use std::os::unix::fs::MetadataExt;
use tempfile::TempDir;

#[test]
fn test_symlink_metadata_at_describes_link_not_target() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("target.txt"), "content")?;
    std::os::unix::fs::symlink("target.txt", temp_dir.path().join("link"))?;

    let dir_fd = DirectoryFd::open(temp_dir.path())?;
    let link_metadata = dir_fd.symlink_metadata_at("link".as_ref())?;
    let expected = fs::symlink_metadata(temp_dir.path().join("link"))?;

    assert!(link_metadata.is_symlink());
    assert_eq!(link_metadata.ino, expected.ino());
    assert_eq!(link_metadata.size(), "target.txt".len() as u64);
    Ok(())
}

#[test]
fn test_lazy_child_follows_directory_symlink() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let real = temp_dir.path().join("real");
    fs::create_dir(&real)?;
    fs::write(real.join("inside.txt"), "x")?;
    std::os::unix::fs::symlink("real", temp_dir.path().join("alias"))?;

    let dir_fd = DirectoryFd::open(temp_dir.path())?;
    let mut alias = LazyFile::at(&dir_fd, "alias".as_ref(), temp_dir.path().join("alias"));

    let metadata = alias.stat()?;
    assert!(metadata.is_dir());
    assert_eq!(metadata.ino, fs::metadata(&real)?.ino());

    let alias_fd = alias.directory_fd()?;
    assert!(alias_fd
        .symlink_metadata_at("inside.txt".as_ref())?
        .is_regular());
    alias.close()?;

    // The shared descriptor stays usable until its last owner is dropped
    assert!(alias_fd.symlink_metadata_at("inside.txt".as_ref()).is_ok());
    Ok(())
}

#[test]
fn test_dangling_symlink() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    std::os::unix::fs::symlink("nowhere", temp_dir.path().join("dangling"))?;

    let dir_fd = DirectoryFd::open(temp_dir.path())?;
    assert!(dir_fd.symlink_metadata_at("dangling".as_ref())?.is_symlink());
    assert_eq!(
        dir_fd.readlinkat("dangling".as_ref())?,
        std::path::Path::new("nowhere")
    );

    let mut dangling = LazyFile::at(&dir_fd, "dangling".as_ref(), temp_dir.path().join("dangling"));
    let err = dangling.stat().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    Ok(())
}

#[test]
fn test_operations_survive_parent_rename() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let before = temp_dir.path().join("before");
    fs::create_dir(&before)?;
    fs::write(before.join("file"), "x")?;

    let dir_fd = DirectoryFd::open(&before)?;
    fs::rename(&before, temp_dir.path().join("after"))?;

    // Still resolves against the original directory, not the old path
    assert!(dir_fd.symlink_metadata_at("file".as_ref())?.is_regular());
    assert!(dir_fd.open_at("file".as_ref()).is_ok());
    Ok(())
}
