//! Decoding of images from streams, files and URIs.

use crate::error::{AppError, Result};
use image::{DynamicImage, ImageReader};
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identity of a loaded source, used by the single-slot cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceId {
    Path(PathBuf),
    Uri(String),
    /// Streams and bitmaps have no stable identity; every one is unique.
    Token(u64),
}

impl SourceId {
    pub(crate) fn unique() -> Self {
        SourceId::Token(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where an image to preview comes from.
pub enum ImageSource {
    Stream(Box<dyn Read + Send>),
    File(PathBuf),
    Uri(String),
    Bitmap(DynamicImage),
}

impl ImageSource {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        ImageSource::Stream(Box::new(Cursor::new(data)))
    }

    /// Identity of this source. Files and `file://` URIs share the path form.
    pub fn id(&self) -> SourceId {
        match self {
            ImageSource::File(path) => SourceId::Path(path.clone()),
            ImageSource::Uri(uri) => match file_uri_path(uri) {
                Some(path) => SourceId::Path(path),
                None => SourceId::Uri(uri.clone()),
            },
            ImageSource::Stream(_) | ImageSource::Bitmap(_) => SourceId::unique(),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Stream(_) => f.write_str("Stream"),
            ImageSource::File(path) => f.debug_tuple("File").field(path).finish(),
            ImageSource::Uri(uri) => f.debug_tuple("Uri").field(uri).finish(),
            ImageSource::Bitmap(img) => write!(f, "Bitmap({}x{})", img.width(), img.height()),
        }
    }
}

fn file_uri_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    // file://localhost/tmp/x and file:///tmp/x both name /tmp/x
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    Some(PathBuf::from(percent_decode(rest)))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]));
            if let (Some(hi), Some(lo)) = hex {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

pub fn decode_file(path: &Path) -> Result<DynamicImage> {
    let img = ImageReader::open(path)
        .map_err(|e| AppError::SourceUnavailable(format!("{}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| AppError::SourceUnavailable(format!("{}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| AppError::ImageDecode(format!("{}: {}", path.display(), e)))?;
    Ok(img)
}

pub fn decode_bytes(data: &[u8]) -> Result<DynamicImage> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;
    Ok(img)
}

/// Fully decodes `source`.
pub fn decode(source: ImageSource) -> Result<DynamicImage> {
    match source {
        ImageSource::Stream(mut reader) => {
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            decode_bytes(&data)
        }
        ImageSource::File(path) => decode_file(&path),
        ImageSource::Uri(uri) => match file_uri_path(&uri) {
            Some(path) => decode_file(&path),
            None => Err(AppError::SourceUnavailable(format!(
                "unsupported URI scheme: {}",
                uri
            ))),
        },
        ImageSource::Bitmap(image) => Ok(image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn file_uri_and_path_share_identity() {
        let path = PathBuf::from("/photos/a b.jpg");
        assert_eq!(
            ImageSource::Uri("file:///photos/a%20b.jpg".to_string()).id(),
            ImageSource::File(path.clone()).id()
        );
        assert_eq!(
            ImageSource::Uri("file://localhost/photos/a%20b.jpg".to_string()).id(),
            SourceId::Path(path)
        );
    }

    #[test]
    fn streams_never_share_identity() {
        let a = ImageSource::from_bytes(vec![]).id();
        let b = ImageSource::from_bytes(vec![]).id();
        assert_ne!(a, b);
    }

    #[test]
    fn decodes_stream() {
        let img = decode(ImageSource::from_bytes(png_bytes(7, 3))).unwrap();
        assert_eq!((img.width(), img.height()), (7, 3));
    }

    #[test]
    fn corrupt_bytes_are_decode_failures() {
        let err = decode(ImageSource::from_bytes(b"garbage".to_vec())).unwrap_err();
        assert!(matches!(err, AppError::ImageDecode(_)));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = decode(ImageSource::File(PathBuf::from("/no/such/file.png"))).unwrap_err();
        assert!(matches!(err, AppError::SourceUnavailable(_)));
    }

    #[test]
    fn remote_uris_are_unavailable() {
        let err = decode(ImageSource::Uri("https://example.com/a.png".to_string())).unwrap_err();
        assert!(matches!(err, AppError::SourceUnavailable(_)));
    }
}
