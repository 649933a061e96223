//! Browsable sources: directories and ZIP archives.
//!
//! A `Walkable` is the root of whatever is currently shown in the thumbnail
//! grid. Each variant enumerates its own children; callers dispatch on the
//! variant with `match` or ask for its `SourceKind`.

use crate::error::{AppError, Result};
use crate::file_utils::{self, PathExt};
use chrono::NaiveDateTime;
use log::{debug, warn};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use zip::ZipArchive;

/// Which variant of `Walkable` is active. An unset source counts as a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceKind {
    #[default]
    Directory,
    Archive,
}

/// A child file of a directory.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Sub-directory or archive that can be opened as a new source.
    pub walkable: bool,
}

/// An entry of a ZIP archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub archive: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: Option<NaiveDateTime>,
}

impl ArchiveEntry {
    /// Reads the uncompressed bytes of this entry.
    pub fn read(&self) -> Result<Vec<u8>> {
        ArchiveSource::new(self.archive.clone()).read_entry(&self.name)
    }
}

/// One child item of a walkable source.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    File(FileEntry),
    Archive(ArchiveEntry),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::File(file) => &file.name,
            Entry::Archive(entry) => &entry.name,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Entry::File(file) => file.size,
            Entry::Archive(entry) => entry.size,
        }
    }

    pub fn is_walkable(&self) -> bool {
        matches!(self, Entry::File(file) if file.walkable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sub-directories, archives and supported images directly inside the root.
    pub fn children(&self) -> Result<Vec<Entry>> {
        let start = std::time::Instant::now();
        let entries = fs::read_dir(&self.root).map_err(|e| {
            AppError::DirectoryScan(format!("{}: {}", self.root.display(), e))
        })?;

        let children: Vec<Entry> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter_map(|path| {
                let walkable = path.is_dir() || file_utils::is_archive(&path);
                if !walkable && !file_utils::is_supported_image(&path) {
                    return None;
                }
                let metadata = match fs::metadata(&path) {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!("Skipping {}: {}", path.format_for_log(), e);
                        return None;
                    }
                };
                Some(Entry::File(FileEntry {
                    name: path.format_for_log(),
                    size: metadata.len(),
                    modified: metadata.modified().ok(),
                    walkable,
                    path,
                }))
            })
            .collect();

        debug!(
            "Scanned {} children of {:?} in {:?}",
            children.len(),
            self.root,
            start.elapsed()
        );
        Ok(children)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSource {
    path: PathBuf,
}

impl ArchiveSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<ZipArchive<File>> {
        let file = File::open(&self.path).map_err(|e| {
            AppError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(ZipArchive::new(file)?)
    }

    /// Image entries of the archive, in archive order.
    pub fn children(&self) -> Result<Vec<Entry>> {
        let mut archive = self.open()?;
        let mut children = Vec::new();
        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            if file.is_dir() || !file_utils::is_supported_image_name(file.name()) {
                continue;
            }
            children.push(Entry::Archive(ArchiveEntry {
                archive: self.path.clone(),
                name: file.name().to_string(),
                size: file.size(),
                modified: zip_datetime(file.last_modified()),
            }));
        }
        debug!(
            "Listed {} image entries in {}",
            children.len(),
            self.path.format_for_log()
        );
        Ok(children)
    }

    /// Reads one entry fully into memory.
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.open()?;
        let mut file = archive.by_name(name)?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }
}

fn zip_datetime(dt: zip::DateTime) -> Option<NaiveDateTime> {
    chrono::NaiveDate::from_ymd_opt(dt.year() as i32, dt.month() as u32, dt.day() as u32)?
        .and_hms_opt(dt.hour() as u32, dt.minute() as u32, dt.second() as u32)
}

/// A source of enumerable child items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Walkable {
    Directory(DirectorySource),
    Archive(ArchiveSource),
}

impl Walkable {
    /// Opens a directory or ZIP archive. Plain files are not walkable.
    pub fn from_path(path: &Path) -> Option<Walkable> {
        if path.is_dir() {
            Some(Walkable::Directory(DirectorySource::new(path.to_path_buf())))
        } else if file_utils::is_archive(path) {
            Some(Walkable::Archive(ArchiveSource::new(path.to_path_buf())))
        } else {
            None
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Walkable::Directory(_) => SourceKind::Directory,
            Walkable::Archive(_) => SourceKind::Archive,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Walkable::Directory(dir) => dir.root(),
            Walkable::Archive(archive) => archive.path(),
        }
    }

    pub fn children(&self) -> Result<Vec<Entry>> {
        match self {
            Walkable::Directory(dir) => dir.children(),
            Walkable::Archive(archive) => archive.children(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_zip(path: &Path, entries: &[(&str, usize)]) {
        let mut zip_file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(&mut zip_file);
        let opts = FileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, len) in entries {
            writer.start_file(*name, opts).unwrap();
            writer.write_all(&vec![7u8; *len]).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn from_path_picks_variant() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("album.zip");
        write_zip(&zip_path, &[("a.png", 3)]);
        let plain = dir.path().join("a.png");
        fs::write(&plain, b"x").unwrap();

        assert_eq!(
            Walkable::from_path(dir.path()).map(|w| w.kind()),
            Some(SourceKind::Directory)
        );
        assert_eq!(
            Walkable::from_path(&zip_path).map(|w| w.kind()),
            Some(SourceKind::Archive)
        );
        assert!(Walkable::from_path(&plain).is_none());
    }

    #[test]
    fn directory_children_skip_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"123").unwrap();
        fs::write(dir.path().join("readme.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let walkable = Walkable::from_path(dir.path()).unwrap();
        let mut names: Vec<(String, bool)> = walkable
            .children()
            .unwrap()
            .iter()
            .map(|e| (e.name().to_string(), e.is_walkable()))
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![("a.jpg".to_string(), false), ("nested".to_string(), true)]
        );
    }

    #[test]
    fn archive_children_list_image_entries_with_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("album.zip");
        write_zip(&zip_path, &[("one.png", 100), ("notes.txt", 10), ("two.jpg", 50)]);

        let walkable = Walkable::from_path(&zip_path).unwrap();
        let children = walkable.children().unwrap();
        let listed: Vec<(&str, u64)> = children.iter().map(|e| (e.name(), e.size())).collect();
        assert_eq!(listed, vec![("one.png", 100), ("two.jpg", 50)]);
        assert!(matches!(&children[0], Entry::Archive(e) if e.modified.is_some()));
    }

    #[test]
    fn read_entry_returns_bytes_and_reports_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("album.zip");
        write_zip(&zip_path, &[("one.png", 4)]);
        let source = ArchiveSource::new(zip_path);

        assert_eq!(source.read_entry("one.png").unwrap(), vec![7u8; 4]);
        assert!(matches!(
            source.read_entry("missing.png"),
            Err(AppError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn missing_directory_is_a_scan_error() {
        let source = DirectorySource::new(PathBuf::from("/definitely/not/here"));
        assert!(matches!(source.children(), Err(AppError::DirectoryScan(_))));
    }
}
