//! Palette quantization for spritesheets.
//!
//! Reduces a sheet to at most 256 palette indices. Sheets with few enough
//! colours keep them exactly. Otherwise the palette is built from the most
//! frequent colours (bucketed to 5 bits per channel, averaged within a
//! bucket) and every pixel maps to the nearest entry by CIE Lab distance.
//! Fully transparent pixels share the transparent slot 0.

use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use palette::{IntoColor, Lab, Srgb};

/// Largest palette a quantized sheet may use.
pub const MAX_COLOURS: usize = 256;

/// One palette colour with its Lab coordinates.
#[derive(Debug, Clone, Copy)]
struct Entry {
    rgba: [u8; 4],
    lab: Lab,
}

impl Entry {
    fn new(rgba: [u8; 4]) -> Self {
        Self {
            rgba,
            lab: to_lab(rgba),
        }
    }
}

#[derive(Default)]
struct Bucket {
    count: u64,
    sums: [u64; 4],
}

/// Build the palette for an image.
pub fn build_palette(image: &RgbaImage) -> Vec<[u8; 4]> {
    let mut buckets: HashMap<[u8; 4], Bucket> = HashMap::new();
    for pixel in image.pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        let bucket = buckets.entry(bucket_key(pixel.0)).or_default();
        bucket.count += 1;
        for (sum, channel) in bucket.sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }

    let mut ranked: Vec<([u8; 4], Bucket)> = buckets.into_iter().collect();
    // Frequency first; key order keeps ties deterministic.
    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));

    // Slot 0 is reserved for transparency.
    let mut colours = vec![[0, 0, 0, 0]];
    colours.extend(ranked.into_iter().take(MAX_COLOURS - 1).map(|(_, bucket)| {
        let mut rgba = [0u8; 4];
        for (out, sum) in rgba.iter_mut().zip(bucket.sums) {
            *out = (sum / bucket.count) as u8;
        }
        rgba
    }));
    colours
}

/// An image stored as palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: u32,
    pub height: u32,
    /// At most [`MAX_COLOURS`] RGBA entries; slot 0 is transparent.
    pub palette: Vec<[u8; 4]>,
    /// One palette index per pixel, row-major.
    pub indices: Vec<u8>,
}

impl IndexedImage {
    /// Expand back to RGBA.
    pub fn to_rgba(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        for (pixel, index) in image.pixels_mut().zip(&self.indices) {
            *pixel = Rgba(self.palette[usize::from(*index)]);
        }
        image
    }
}

/// Quantize an image to a palette of at most [`MAX_COLOURS`] entries.
///
/// Images that fit the palette keep their exact colours, in order of
/// first appearance. Fully transparent pixels all map to slot 0.
pub fn quantize(image: &RgbaImage) -> IndexedImage {
    let palette = exact_palette(image).unwrap_or_else(|| build_palette(image));
    let entries: Vec<Entry> = palette.iter().copied().map(Entry::new).collect();
    let mut cache: HashMap<[u8; 4], u8> = HashMap::new();

    let indices = image
        .pixels()
        .map(|pixel| {
            if pixel.0[3] == 0 {
                return 0;
            }
            *cache
                .entry(pixel.0)
                .or_insert_with(|| nearest(&entries, pixel.0))
        })
        .collect();

    IndexedImage {
        width: image.width(),
        height: image.height(),
        palette,
        indices,
    }
}

/// The image's own colours behind the transparent slot, if they fit.
fn exact_palette(image: &RgbaImage) -> Option<Vec<[u8; 4]>> {
    let mut colours = vec![[0, 0, 0, 0]];
    let mut seen = std::collections::HashSet::new();
    for pixel in image.pixels() {
        if pixel.0[3] == 0 || !seen.insert(pixel.0) {
            continue;
        }
        if colours.len() == MAX_COLOURS {
            return None;
        }
        colours.push(pixel.0);
    }
    Some(colours)
}

/// Count distinct colours, stopping once `limit` is reached.
pub fn count_colours(image: &RgbaImage, limit: usize) -> usize {
    let mut seen = std::collections::HashSet::new();
    for pixel in image.pixels() {
        seen.insert(pixel.0);
        if seen.len() >= limit {
            break;
        }
    }
    seen.len()
}

/// Index of the closest palette entry. Exact matches win outright.
fn nearest(palette: &[Entry], rgba: [u8; 4]) -> u8 {
    let lab = to_lab(rgba);
    let mut best = 0;
    let mut best_dist = f32::MAX;

    // Skip the transparent slot; visible pixels never map to it.
    for (index, entry) in palette.iter().enumerate().skip(1) {
        if entry.rgba == rgba {
            return index as u8;
        }
        let dist = distance(&lab, rgba[3], entry);
        if dist < best_dist {
            best_dist = dist;
            best = index;
        }
    }
    best as u8
}

/// Squared Lab distance plus a scaled alpha term.
fn distance(lab: &Lab, alpha: u8, entry: &Entry) -> f32 {
    let dl = lab.l - entry.lab.l;
    let da = lab.a - entry.lab.a;
    let db = lab.b - entry.lab.b;
    let dalpha = (f32::from(alpha) - f32::from(entry.rgba[3])) / 2.55;
    dl * dl + da * da + db * db + dalpha * dalpha
}

fn to_lab(rgba: [u8; 4]) -> Lab {
    let rgb: Srgb<f32> = Srgb::new(rgba[0], rgba[1], rgba[2]).into_format();
    rgb.into_color()
}

fn bucket_key(rgba: [u8; 4]) -> [u8; 4] {
    [rgba[0] >> 3, rgba[1] >> 3, rgba[2] >> 3, rgba[3] >> 3]
}
