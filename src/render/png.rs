//! PNG input and output for spritesheets.
//!
//! Sprites are decoded to 8-bit RGBA with alpha added when missing; an
//! embedded ICC profile is applied to bring them into sRGB. Sheets are
//! written with best compression, as RGBA or as an indexed palette PNG.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngDecoder, PngEncoder};
use image::{DynamicImage, ImageDecoder, ImageEncoder, RgbaImage};
use qcms::{DataType, Intent, Profile, Transform};

use super::quantize::IndexedImage;
use crate::error::{Result, TileError};

/// What happened to a sprite's embedded colour profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColourProfile {
    /// No profile; the pixels are taken as sRGB.
    None,
    /// The pixels were converted to sRGB.
    Applied,
    /// The profile could not be used; the pixels are left as decoded.
    Failed(String),
}

/// A decoded sprite.
#[derive(Debug, Clone)]
pub struct LoadedSprite {
    pub image: RgbaImage,
    pub profile: ColourProfile,
}

impl LoadedSprite {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode a sprite file to RGBA.
pub fn load_sprite(path: &Path) -> Result<LoadedSprite> {
    let file = File::open(path).map_err(|e| TileError::Image {
        path: path.to_path_buf(),
        message: format!("Cannot load {}: {}", path.display(), e),
    })?;

    let mut decoder = PngDecoder::new(BufReader::new(file)).map_err(|e| image_error(path, e))?;
    let icc = decoder.icc_profile().ok().flatten();

    let mut image = DynamicImage::from_decoder(decoder)
        .map_err(|e| image_error(path, e))?
        .to_rgba8();

    let profile = match icc {
        None => ColourProfile::None,
        Some(icc) => match to_srgb(&icc, &mut image) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "applied embedded ICC profile");
                ColourProfile::Applied
            }
            Err(reason) => ColourProfile::Failed(reason.to_string()),
        },
    };

    Ok(LoadedSprite { image, profile })
}

/// Convert RGBA pixels from an ICC profile to sRGB in place.
fn to_srgb(icc: &[u8], image: &mut RgbaImage) -> std::result::Result<(), &'static str> {
    let input = Profile::new_from_slice(icc, false).ok_or("unreadable ICC profile")?;
    let output = Profile::new_sRGB();
    let transform = Transform::new(&input, &output, DataType::RGBA8, Intent::Perceptual)
        .ok_or("ICC profile cannot be converted to sRGB")?;
    transform.apply(image);
    Ok(())
}

/// Encode an RGBA image to a PNG file.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| TileError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write PNG: {}", e),
    })?;

    let encoder = PngEncoder::new_with_quality(
        BufWriter::new(file),
        CompressionType::Best,
        FilterType::Adaptive,
    );
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| TileError::Image {
            path: path.to_path_buf(),
            message: format!("Failed to encode PNG: {}", e),
        })?;

    Ok(())
}

/// Encode an indexed image as an 8-bit palette PNG with transparency.
pub fn write_indexed_png(image: &IndexedImage, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| TileError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write PNG: {}", e),
    })?;

    let rgb: Vec<u8> = image.palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    let alpha: Vec<u8> = image.palette.iter().map(|c| c[3]).collect();

    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width, image.height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(rgb);
    encoder.set_trns(alpha);
    encoder.set_compression(png::Compression::Best);

    let encode_error = |e: png::EncodingError| TileError::Image {
        path: path.to_path_buf(),
        message: format!("Failed to encode PNG: {}", e),
    };
    let mut writer = encoder.write_header().map_err(encode_error)?;
    writer.write_image_data(&image.indices).map_err(encode_error)?;
    writer.finish().map_err(encode_error)?;

    Ok(())
}

fn image_error(path: &Path, e: image::ImageError) -> TileError {
    TileError::Image {
        path: path.to_path_buf(),
        message: format!("Cannot load {}: {}", path.display(), e),
    }
}

/// Insert an `iCCP` chunk right after `IHDR` of an encoded PNG.
#[cfg(test)]
pub(crate) fn embed_icc_profile(png: &[u8], profile: &[u8]) -> Vec<u8> {
    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = !0u32;
        for &b in bytes {
            crc ^= u32::from(b);
            for _ in 0..8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
            }
        }
        !crc
    }

    fn adler32(bytes: &[u8]) -> u32 {
        let (mut a, mut b) = (1u32, 0u32);
        for &x in bytes {
            a = (a + u32::from(x)) % 65521;
            b = (b + a) % 65521;
        }
        (b << 16) | a
    }

    // zlib stream holding one stored deflate block.
    let len = profile.len() as u16;
    let mut zlib = vec![0x78, 0x01, 0x01];
    zlib.extend(len.to_le_bytes());
    zlib.extend((!len).to_le_bytes());
    zlib.extend(profile);
    zlib.extend(adler32(profile).to_be_bytes());

    let mut chunk = b"iCCP".to_vec();
    chunk.extend(b"sprite\0\0");
    chunk.extend(zlib);

    // Signature (8) plus the IHDR chunk (25).
    let mut out = png[..33].to_vec();
    out.extend(((chunk.len() - 4) as u32).to_be_bytes());
    out.extend(&chunk);
    out.extend(crc32(&chunk).to_be_bytes());
    out.extend(&png[33..]);
    out
}
