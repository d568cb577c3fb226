//! Named image resources and their decoding for embedding
//!
//! Every lookup is by logical name. A missing or undecodable resource is
//! never an error for the render: callers substitute a fallback or leave
//! the element out.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::debug;

/// Logical names the report refers to
pub mod names {
    pub const COVER: &str = "cover";
    pub const BACK_COVER: &str = "back_cover";
    pub const LOGOS: [&str; 3] = ["logo_primary", "logo_secondary", "logo_tertiary"];
}

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Lookup of raw resource bytes by logical name
pub trait ResourceLookup {
    fn load(&self, name: &str) -> Option<Vec<u8>>;

    /// The resource as an embeddable image
    ///
    /// Bytes that are present but cannot be decoded count as missing.
    fn image(&self, name: &str) -> Option<EmbeddedImage> {
        let bytes = self.load(name)?;
        let image = decode_image(&bytes);
        if image.is_none() {
            debug!(resource = name, len = bytes.len(), "Resource is not a decodable image");
        }
        image
    }
}

/// Resources stored as `<dir>/<name>.png|jpg|jpeg`
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
    }
}

impl ResourceLookup for DirectoryResources {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.path_for(name)?;
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Resource unreadable");
                None
            }
        }
    }
}

/// In-memory resources, keyed by logical name
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(name.into(), bytes);
    }

    pub fn with(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl ResourceLookup for MemoryResources {
    fn load(&self, name: &str) -> Option<Vec<u8>> {
        self.entries.get(name).cloned()
    }
}

/// Stream filter of an embedded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// JPEG bytes passed through as-is
    Dct,
    /// zlib-compressed samples
    Flate,
}

impl ImageFilter {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ImageFilter::Dct => "DCTDecode",
            ImageFilter::Flate => "FlateDecode",
        }
    }
}

/// Image data ready to become an XObject
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub filter: ImageFilter,
    pub data: Vec<u8>,
    /// Flate-compressed 8-bit alpha channel
    pub soft_mask: Option<Vec<u8>>,
}

/// Decode PNG or JPEG bytes; `None` for anything else
pub fn decode_image(bytes: &[u8]) -> Option<EmbeddedImage> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        decode_png(bytes)
            .map_err(|e| debug!(error = %e, "PNG decode failed"))
            .ok()
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        decode_jpeg(bytes)
    } else {
        None
    }
}

fn decode_png(bytes: &[u8]) -> Result<EmbeddedImage, String> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(|e| e.to_string())?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(|e| e.to_string())?;
    let samples = &buf[..info.buffer_size()];

    let (channels, has_alpha, color_space) = match info.color_type {
        png::ColorType::Grayscale => (1, false, "DeviceGray"),
        png::ColorType::GrayscaleAlpha => (2, true, "DeviceGray"),
        png::ColorType::Rgb => (3, false, "DeviceRGB"),
        png::ColorType::Rgba => (4, true, "DeviceRGB"),
        png::ColorType::Indexed => return Err("indexed color was not expanded".to_string()),
    };

    let (color, alpha) = if has_alpha {
        let color_channels = channels - 1;
        let mut color = Vec::with_capacity(samples.len() / channels * color_channels);
        let mut alpha = Vec::with_capacity(samples.len() / channels);
        for pixel in samples.chunks_exact(channels) {
            color.extend_from_slice(&pixel[..color_channels]);
            alpha.push(pixel[color_channels]);
        }
        (color, Some(alpha))
    } else {
        (samples.to_vec(), None)
    };

    Ok(EmbeddedImage {
        width: info.width,
        height: info.height,
        color_space,
        filter: ImageFilter::Flate,
        data: deflate(&color).map_err(|e| e.to_string())?,
        soft_mask: alpha
            .map(|a| deflate(&a))
            .transpose()
            .map_err(|e| e.to_string())?,
    })
}

/// Read dimensions and component count from the first SOF marker
fn decode_jpeg(bytes: &[u8]) -> Option<EmbeddedImage> {
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let segment = bytes.get(pos + 4..pos + 2 + length)?;
            let height = u16::from_be_bytes([*segment.get(1)?, *segment.get(2)?]) as u32;
            let width = u16::from_be_bytes([*segment.get(3)?, *segment.get(4)?]) as u32;
            let color_space = match segment.get(5)? {
                1 => "DeviceGray",
                3 => "DeviceRGB",
                4 => "DeviceCMYK",
                _ => return None,
            };
            return Some(EmbeddedImage {
                width,
                height,
                color_space,
                filter: ImageFilter::Dct,
                data: bytes.to_vec(),
                soft_mask: None,
            });
        }
        pos += 2 + length;
    }
    None
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inflate a zlib stream; used to check embedded samples
pub fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tiny_png(color: png::ColorType, pixel: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, 2, 1);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            let data: Vec<u8> = pixel.iter().chain(pixel.iter()).copied().collect();
            writer.write_image_data(&data).unwrap();
        }
        out
    }

    #[test]
    fn test_rgb_png_decodes() {
        let image = decode_image(&tiny_png(png::ColorType::Rgb, &[10, 20, 30])).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.color_space, "DeviceRGB");
        assert_eq!(image.filter, ImageFilter::Flate);
        assert!(image.soft_mask.is_none());
        assert_eq!(inflate(&image.data).unwrap(), vec![10, 20, 30, 10, 20, 30]);
    }

    #[test]
    fn test_alpha_is_split_into_soft_mask() {
        let image = decode_image(&tiny_png(png::ColorType::Rgba, &[1, 2, 3, 128])).unwrap();
        assert_eq!(inflate(&image.data).unwrap(), vec![1, 2, 3, 1, 2, 3]);
        let mask = image.soft_mask.unwrap();
        assert_eq!(inflate(&mask).unwrap(), vec![128, 128]);
    }

    #[test]
    fn test_jpeg_header_is_parsed() {
        // SOI, APP0 (length 4), SOF0 with 3 components, 40x30
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
        jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x1E, 0x00, 0x28, 0x03]);
        jpeg.extend_from_slice(&[0; 9]);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        let image = decode_image(&jpeg).unwrap();
        assert_eq!((image.width, image.height), (40, 30));
        assert_eq!(image.color_space, "DeviceRGB");
        assert_eq!(image.filter, ImageFilter::Dct);
        assert_eq!(image.data, jpeg);
    }

    #[test]
    fn test_unknown_bytes_are_not_images() {
        assert!(decode_image(b"GIF89a").is_none());
        assert!(decode_image(&[0x89, b'P', b'N', b'G', 0, 0]).is_none());
    }

    #[test]
    fn test_memory_lookup() {
        let resources = MemoryResources::new().with(names::COVER, vec![1, 2]);
        assert_eq!(resources.load(names::COVER), Some(vec![1, 2]));
        assert!(resources.load(names::BACK_COVER).is_none());
    }

    #[test]
    fn test_directory_lookup_tries_extensions() {
        let dir = std::env::temp_dir().join(format!("esg-resources-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("logo_primary.jpg"), [0xFF, 0xD8]).unwrap();
        let resources = DirectoryResources::new(&dir);
        assert_eq!(resources.load("logo_primary"), Some(vec![0xFF, 0xD8]));
        assert!(resources.load("cover").is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_undecodable_bytes_are_not_an_image() {
        let resources = MemoryResources::new()
            .with(names::COVER, b"GIF89a not an image".to_vec())
            .with(names::BACK_COVER, tiny_png(png::ColorType::Rgb, &[0, 0, 0]));
        assert!(resources.load(names::COVER).is_some());
        assert!(resources.image(names::COVER).is_none());
        assert_eq!(
            resources.image(names::BACK_COVER).map(|i| (i.width, i.height)),
            Some((2, 1))
        );
        assert!(resources.image(names::LOGOS[0]).is_none());
    }
}
