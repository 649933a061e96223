//! Ordering delegates over thumbnails, one per sort field and source variant.

use crate::thumbnail::Thumbnail;
use crate::walkable::{ArchiveEntry, Entry, FileEntry};
use std::cmp::Ordering;

/// The fixed set of ordering functions a comparator can delegate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delegate {
    FileName,
    FileSize,
    FileLastModified,
    ArchiveEntryName,
    ArchiveEntrySize,
    ArchiveEntryLastModified,
    ImageProperties,
}

impl Delegate {
    pub fn compare(&self, a: &Thumbnail, b: &Thumbnail) -> Ordering {
        match self {
            Delegate::FileName => files(a, b, |x, y| x.name.cmp(&y.name)),
            Delegate::FileSize => files(a, b, |x, y| x.size.cmp(&y.size)),
            Delegate::FileLastModified => files(a, b, |x, y| x.modified.cmp(&y.modified)),
            Delegate::ArchiveEntryName => entries(a, b, |x, y| x.name.cmp(&y.name)),
            Delegate::ArchiveEntrySize => entries(a, b, |x, y| x.size.cmp(&y.size)),
            Delegate::ArchiveEntryLastModified => {
                entries(a, b, |x, y| x.modified.cmp(&y.modified))
            }
            Delegate::ImageProperties => image_properties(a, b),
        }
    }
}

// Pairs from the other variant compare equal so a stable sort leaves them in place.
fn files(a: &Thumbnail, b: &Thumbnail, cmp: impl Fn(&FileEntry, &FileEntry) -> Ordering) -> Ordering {
    match (a.entry(), b.entry()) {
        (Entry::File(x), Entry::File(y)) => cmp(x, y),
        _ => Ordering::Equal,
    }
}

fn entries(
    a: &Thumbnail,
    b: &Thumbnail,
    cmp: impl Fn(&ArchiveEntry, &ArchiveEntry) -> Ordering,
) -> Ordering {
    match (a.entry(), b.entry()) {
        (Entry::Archive(x), Entry::Archive(y)) => cmp(x, y),
        _ => Ordering::Equal,
    }
}

/// Pixel area first, then width. Unknown dimensions sort first.
fn image_properties(a: &Thumbnail, b: &Thumbnail) -> Ordering {
    let key = |t: &Thumbnail| {
        t.dimensions()
            .map(|(w, h)| (u64::from(w) * u64::from(h), w))
    };
    key(a).cmp(&key(b))
}
