//! Rendering module for tilecomp.
//!
//! Decodes sprites, packs them into spritesheet grids and encodes the
//! result, optionally reduced to a 256-colour palette.

mod png;
mod quantize;
mod sheet;

pub use self::png::{load_sprite, write_indexed_png, write_png, ColourProfile, LoadedSprite};
pub use quantize::{build_palette, count_colours, quantize, IndexedImage, MAX_COLOURS};
pub use sheet::GridPacker;

#[cfg(test)]
pub(crate) use self::png::embed_icc_profile;
