//! Filesystem helpers shared by publishing and the watch loop.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// Write a file by writing a sibling temp file and renaming it over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
  let mut temp_name = path.file_name().map(OsString::from).unwrap_or_default();
  temp_name.push(".tmp");
  let temp_path = path.with_file_name(temp_name);

  fs::write(&temp_path, contents)?;
  fs::rename(&temp_path, path)
}

/// Copy a directory recursively. Symlinks are not followed.
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
  fs::create_dir_all(dst)?;
  for entry in fs::read_dir(src)? {
    let entry = entry?;
    let ty = entry.file_type()?;
    let dst_path = dst.join(entry.file_name());
    if ty.is_dir() {
      copy_dir_all(&entry.path(), &dst_path)?;
    } else if ty.is_file() {
      fs::copy(entry.path(), dst_path)?;
    }
  }
  Ok(())
}

/// Point `link` at `target`, replacing any existing link in one rename.
pub fn replace_symlink(target: &Path, link: &Path) -> io::Result<()> {
  let mut temp_name = link.file_name().map(OsString::from).unwrap_or_default();
  temp_name.push(".next");
  let temp_link = link.with_file_name(temp_name);

  match fs::remove_file(&temp_link) {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(e),
  }
  symlink_dir(target, &temp_link)?;
  fs::rename(&temp_link, link)
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

/// Directory symlinks need elevation on Windows; junctions do not.
#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
  std::os::windows::fs::symlink_dir(target, link).or_else(|_| junction::create(target, link))
}
