//! Local file lifecycle for one transfer.
//!
//! Bytes stream into `<final>.part`; on success the scheduler checks the
//! part file is non-empty and renames it over the final path.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const PART_SUFFIX: &str = ".part";

/// Path for the part file: appends `.part` to the final path (`a.mp4` → `a.mp4.part`).
pub fn part_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(PART_SUFFIX);
    PathBuf::from(o)
}

/// Sequential writer for a part file. Creating it truncates any previous attempt.
pub struct PartFile {
    path: PathBuf,
    out: BufWriter<File>,
}

impl PartFile {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::with_capacity(64 * 1024, file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.out.write_all(data)
    }

    /// Flush buffered bytes and fsync.
    pub fn finish(self) -> io::Result<()> {
        let file = self.out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}

/// Size of the file at `path` if it exists and holds at least one byte.
pub fn non_empty_len(path: &Path) -> io::Result<Option<u64>> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(Some(meta.len())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Atomically move the finished part file to its final name.
pub fn finalize(part: &Path, final_path: &Path) -> io::Result<()> {
    fs::rename(part, final_path)
}

/// Remove a file, treating "already gone" as success.
pub fn discard(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
