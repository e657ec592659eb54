//! Core data types for tileset composing.

mod entry;
mod sheet;

pub use entry::{entry_ids, list_or_first, Layer, LayerPart, TileEntry, Variation, ADDITIONAL_KEY};
pub use sheet::Sheet;
