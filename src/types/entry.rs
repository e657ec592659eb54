//! Tile entries as read from JSON fragments.
//!
//! An entry maps one or more game-object ids to foreground/background
//! sprite references. Only `id`, `fg`, `bg` and `additional_tiles` are
//! interpreted; every other key is carried through untouched and in its
//! original position.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Key holding nested entries.
pub const ADDITIONAL_KEY: &str = "additional_tiles";

/// A raw tile entry and the fragment it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TileEntry {
    pub data: Map<String, Value>,
    pub source: PathBuf,
}

impl TileEntry {
    /// Wrap a JSON value. Non-object values become an empty entry.
    pub fn new(value: Value, source: impl Into<PathBuf>) -> Self {
        let data = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            data,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// A sprite reference in `fg` or `bg`.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// `"fg": "t_grass"`
    Single(String),
    /// `"fg": ["f_fridge_S", {"weight": 2, "sprite": "f_fridge_W"}]`
    List(Vec<LayerPart>),
}

/// One element of a list-valued layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerPart {
    Name(String),
    /// A weighted variation object; `sprite` is parsed, the rest is kept.
    Weighted {
        object: Map<String, Value>,
        sprite: Option<Variation>,
    },
}

/// The `sprite` field of a weighted variation.
#[derive(Debug, Clone, PartialEq)]
pub enum Variation {
    Single(String),
    Alternatives(Vec<String>),
}

impl Layer {
    /// Interpret a JSON value as a layer.
    ///
    /// Returns `None` for values that hold no sprite reference at all
    /// (null, empty string, empty list, numbers).
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Layer::Single(s.clone())),
            Value::Array(items) if !items.is_empty() => {
                let parts = items.iter().filter_map(LayerPart::parse).collect();
                Some(Layer::List(parts))
            }
            _ => None,
        }
    }
}

impl LayerPart {
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(LayerPart::Weighted {
                sprite: object.get("sprite").and_then(Variation::parse),
                object: object.clone(),
            }),
            Value::String(s) => Some(LayerPart::Name(s.clone())),
            _ => None,
        }
    }
}

impl Variation {
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Variation::Single(s.clone())),
            Value::Array(items) => Some(Variation::Alternatives(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            )),
            _ => None,
        }
    }
}

/// Ids of an entry, normalised to a list.
///
/// A string gives one id, a list gives its string elements; anything
/// else, an empty string or an empty list gives none.
pub fn entry_ids(data: &Map<String, Value>) -> Vec<String> {
    match data.get("id") {
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => vec![],
    }
}

/// Collapse a one-element list to its element.
pub fn list_or_first(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}
