//! Comparator selection for the thumbnail grid.
//!
//! The comparator for a sort key depends on the active source variant:
//! directories compare file metadata, archives compare entry metadata.
//! `ImageProperties` is the same for both. The most recent selection lives in
//! a `SortContext` owned by the caller so that `reverse` has something to act on.

mod comparators;

pub use comparators::Delegate;

use crate::thumbnail::Thumbnail;
use crate::walkable::{SourceKind, Walkable};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Field the grid can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    Size,
    LastModified,
    ImageProperties,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "size" => Ok(SortKey::Size),
            "modified" | "last-modified" | "lastmodified" => Ok(SortKey::LastModified),
            "properties" | "image-properties" => Ok(SortKey::ImageProperties),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SortKey::Name => "Name",
            SortKey::Size => "Size",
            SortKey::LastModified => "Last modified",
            SortKey::ImageProperties => "Image properties",
        };
        f.write_str(label)
    }
}

/// An ordering over thumbnails: a delegate plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Comparator {
    delegate: Delegate,
    reversed: bool,
}

impl Comparator {
    pub fn new(delegate: Delegate) -> Self {
        Self {
            delegate,
            reversed: false,
        }
    }

    pub fn delegate(&self) -> Delegate {
        self.delegate
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// The order-inverting counterpart of this comparator.
    pub fn reversed(&self) -> Self {
        Self {
            delegate: self.delegate,
            reversed: !self.reversed,
        }
    }

    pub fn compare(&self, a: &Thumbnail, b: &Thumbnail) -> Ordering {
        let ord = self.delegate.compare(a, b);
        if self.reversed { ord.reverse() } else { ord }
    }
}

/// Maps a sort key and source variant to its comparator.
pub fn select_comparator(key: SortKey, kind: SourceKind) -> Comparator {
    let delegate = match (key, kind) {
        (SortKey::Name, SourceKind::Directory) => Delegate::FileName,
        (SortKey::Name, SourceKind::Archive) => Delegate::ArchiveEntryName,
        (SortKey::Size, SourceKind::Directory) => Delegate::FileSize,
        (SortKey::Size, SourceKind::Archive) => Delegate::ArchiveEntrySize,
        (SortKey::LastModified, SourceKind::Directory) => Delegate::FileLastModified,
        (SortKey::LastModified, SourceKind::Archive) => Delegate::ArchiveEntryLastModified,
        (SortKey::ImageProperties, _) => Delegate::ImageProperties,
    };
    Comparator::new(delegate)
}

/// Tracks the active source variant and the last selected comparator.
#[derive(Debug, Clone, Default)]
pub struct SortContext {
    kind: SourceKind,
    current: Option<Comparator>,
}

impl SortContext {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            current: None,
        }
    }

    /// Context for the given source, or the directory default when unset.
    pub fn for_source(walkable: Option<&Walkable>) -> Self {
        Self::new(walkable.map(Walkable::kind).unwrap_or_default())
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Switches the source variant. A selection made for the other variant is
    /// dropped, so `reverse` does nothing until a key is selected again.
    pub fn set_kind(&mut self, kind: SourceKind) {
        if self.kind != kind {
            self.current = None;
        }
        self.kind = kind;
    }

    pub fn current(&self) -> Option<Comparator> {
        self.current
    }

    /// Selects the comparator for `key` and makes it current.
    pub fn select(&mut self, key: SortKey) -> Comparator {
        let comparator = select_comparator(key, self.kind);
        self.current = Some(comparator);
        comparator
    }

    /// Reverses the current comparator. Does nothing without a prior selection.
    pub fn reverse(&mut self) -> Option<Comparator> {
        self.current = self.current.map(|c| c.reversed());
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walkable::{ArchiveEntry, Entry, FileEntry};
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn file(name: &str, size: u64, secs: u64) -> Thumbnail {
        Thumbnail::new(
            Entry::File(FileEntry {
                path: PathBuf::from("/photos").join(name),
                name: name.to_string(),
                size,
                modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)),
                walkable: false,
            }),
            None,
            None,
        )
    }

    fn entry(name: &str, size: u64) -> Thumbnail {
        Thumbnail::new(
            Entry::Archive(ArchiveEntry {
                archive: PathBuf::from("album.zip"),
                name: name.to_string(),
                size,
                modified: None,
            }),
            None,
            None,
        )
    }

    #[test]
    fn selection_follows_mapping_table() {
        use Delegate::*;
        let table = [
            (SortKey::Name, SourceKind::Directory, FileName),
            (SortKey::Name, SourceKind::Archive, ArchiveEntryName),
            (SortKey::Size, SourceKind::Directory, FileSize),
            (SortKey::Size, SourceKind::Archive, ArchiveEntrySize),
            (SortKey::LastModified, SourceKind::Directory, FileLastModified),
            (SortKey::LastModified, SourceKind::Archive, ArchiveEntryLastModified),
            (SortKey::ImageProperties, SourceKind::Directory, ImageProperties),
            (SortKey::ImageProperties, SourceKind::Archive, ImageProperties),
        ];
        for (key, kind, expected) in table {
            let comparator = select_comparator(key, kind);
            assert_eq!(comparator.delegate(), expected, "{:?}/{:?}", key, kind);
            assert!(!comparator.is_reversed());
        }
    }

    #[test]
    fn unset_source_defaults_to_directory() {
        let mut ctx = SortContext::for_source(None);
        assert_eq!(ctx.kind(), SourceKind::Directory);
        assert_eq!(ctx.select(SortKey::Size).delegate(), Delegate::FileSize);
    }

    #[test]
    fn reverse_without_selection_is_noop() {
        let mut ctx = SortContext::default();
        assert_eq!(ctx.reverse(), None);
        assert_eq!(ctx.current(), None);
    }

    #[test]
    fn switching_variant_drops_selection() {
        let mut ctx = SortContext::new(SourceKind::Directory);
        ctx.select(SortKey::Name);
        ctx.set_kind(SourceKind::Directory);
        assert!(ctx.current().is_some());

        ctx.set_kind(SourceKind::Archive);
        assert_eq!(ctx.current(), None);
        assert_eq!(ctx.reverse(), None);
        assert_eq!(ctx.select(SortKey::Name).delegate(), Delegate::ArchiveEntryName);
    }

    #[test]
    fn double_reverse_restores_ordering() {
        let mut ctx = SortContext::new(SourceKind::Directory);
        let base = ctx.select(SortKey::Size);
        ctx.reverse();
        let twice = ctx.reverse().unwrap();
        assert_eq!(twice, base);

        let small = file("a.jpg", 1, 0);
        let large = file("b.jpg", 9, 0);
        assert_eq!(twice.compare(&small, &large), base.compare(&small, &large));
        assert_eq!(
            base.reversed().compare(&small, &large),
            std::cmp::Ordering::Greater
        );
    }

    #[test]
    fn last_modified_orders_files_by_time() {
        let comparator = select_comparator(SortKey::LastModified, SourceKind::Directory);
        let old = file("z.jpg", 0, 10);
        let new = file("a.jpg", 0, 20);
        assert_eq!(comparator.compare(&old, &new), std::cmp::Ordering::Less);
    }

    #[test]
    fn file_name_is_case_sensitive() {
        let comparator = select_comparator(SortKey::Name, SourceKind::Directory);
        assert_eq!(
            comparator.compare(&file("B.jpg", 0, 0), &file("a.jpg", 0, 0)),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn mismatched_variants_compare_equal() {
        let comparator = select_comparator(SortKey::Size, SourceKind::Directory);
        assert_eq!(
            comparator.compare(&file("a.jpg", 1, 0), &entry("b.jpg", 500)),
            std::cmp::Ordering::Equal
        );
    }

    #[test]
    fn image_properties_orders_by_area() {
        let comparator = select_comparator(SortKey::ImageProperties, SourceKind::Archive);
        let small = Thumbnail::new(entry("s.png", 1).entry().clone(), None, Some((10, 10)));
        let big = Thumbnail::new(entry("b.png", 1).entry().clone(), None, Some((40, 30)));
        let unknown = entry("u.png", 1);
        assert_eq!(comparator.compare(&small, &big), std::cmp::Ordering::Less);
        assert_eq!(comparator.compare(&unknown, &small), std::cmp::Ordering::Less);
    }
}
