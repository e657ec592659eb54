//! Tile entry resolution.
//!
//! Converts the symbolic sprite names in a tile entry into registry
//! indices, claims the entry's ids in the global processed-id set and
//! clears every referenced sprite from the unreferenced bookkeeping.
//!
//! Keys other than `id`, `fg`, `bg` and `additional_tiles` pass through
//! untouched, and the converted entry keeps the original key order.
//!
//! # Example
//!
//! ```ignore
//! use tilecomp::resolve::Resolver;
//!
//! let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "tile_config.json");
//! let converted = resolver.convert(&entry);
//! ```

use std::path::Path;

use serde_json::{Map, Value};

use crate::diagnostics::{Arg, MessageKind, Reporter};
use crate::registry::{Category, SheetKind, SpriteRegistry};
use crate::types::{entry_ids, list_or_first, Layer, LayerPart, TileEntry, Variation, ADDITIONAL_KEY};

/// Separator between a parent id and a nested entry's id.
pub const ID_SEPARATOR: &str = "_";

/// Resolves tile entries of one sheet against the registry.
pub struct Resolver<'a> {
    registry: &'a mut SpriteRegistry,
    reporter: &'a Reporter,
    kind: SheetKind,
    config_file: &'a str,
    warn_filler_skips: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a mut SpriteRegistry,
        reporter: &'a Reporter,
        kind: SheetKind,
        config_file: &'a str,
    ) -> Self {
        Self {
            registry,
            reporter,
            kind,
            config_file,
            warn_filler_skips: false,
        }
    }

    /// Report ids dropped from filler sheets as warnings.
    pub fn warn_filler_skips(mut self, enabled: bool) -> Self {
        self.warn_filler_skips = enabled;
        self
    }

    /// Convert a top-level entry. `None` means the entry is dropped.
    pub fn convert(&mut self, entry: &TileEntry) -> Option<Map<String, Value>> {
        self.convert_object(&entry.data, "", entry.source())
    }

    fn convert_object(
        &mut self,
        data: &Map<String, Value>,
        prefix: &str,
        source: &Path,
    ) -> Option<Map<String, Value>> {
        let ids = entry_ids(data);
        let fg_raw = data.get("fg").filter(|v| is_truthy(v));
        let bg_raw = data.get("bg").filter(|v| is_truthy(v));

        if ids.is_empty() || (fg_raw.is_none() && bg_raw.is_none()) {
            self.report_empty(data, prefix, source, ids.is_empty());
            return None;
        }

        let fg = fg_raw.and_then(|v| self.convert_layer(v, source));
        let bg = bg_raw.and_then(|v| self.convert_layer(v, source));

        let additional = match data.get(ADDITIONAL_KEY) {
            Some(Value::Array(children)) => {
                let child_prefix = format!("{}{}", ids[0], ID_SEPARATOR);
                let converted: Vec<Value> = children
                    .iter()
                    .filter_map(|child| match child {
                        Value::Object(map) => self.convert_object(map, &child_prefix, source),
                        _ => None,
                    })
                    .map(Value::Object)
                    .collect();
                Some(converted)
            }
            _ => None,
        };

        let surviving = self.claim_ids(ids, prefix, source);
        if surviving.is_empty() {
            return None;
        }

        let mut out = Map::new();
        for (key, value) in data {
            match key.as_str() {
                "id" => {
                    let ids = surviving.iter().cloned().map(Value::String).collect();
                    out.insert(key.clone(), list_or_first(ids));
                }
                "fg" => {
                    if let Some(fg) = &fg {
                        out.insert(key.clone(), fg.clone());
                    }
                }
                "bg" => {
                    if let Some(bg) = &bg {
                        out.insert(key.clone(), bg.clone());
                    }
                }
                ADDITIONAL_KEY => match &additional {
                    Some(children) if children.is_empty() => {}
                    Some(children) => {
                        out.insert(key.clone(), Value::Array(children.clone()));
                    }
                    None => {
                        out.insert(key.clone(), value.clone());
                    }
                },
                _ => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }

        Some(out)
    }

    /// Convert one `fg`/`bg` value. `None` when nothing resolved.
    fn convert_layer(&mut self, value: &Value, source: &Path) -> Option<Value> {
        let mut output = Vec::new();

        match Layer::parse(value)? {
            Layer::Single(name) => {
                if let Some(index) = self.resolve_sprite(&name, source) {
                    output.push(Value::from(index));
                }
            }
            Layer::List(parts) => {
                for part in parts {
                    match part {
                        LayerPart::Name(name) => {
                            if let Some(index) = self.resolve_sprite(&name, source) {
                                output.push(Value::from(index));
                            }
                        }
                        LayerPart::Weighted { mut object, sprite } => {
                            let Some(sprite) = sprite else {
                                continue;
                            };
                            if let Some(converted) = self.convert_random_variations(&sprite, source)
                            {
                                object.insert("sprite".to_string(), converted);
                                output.push(Value::Object(object));
                            }
                        }
                    }
                }
            }
        }

        if output.is_empty() {
            None
        } else {
            Some(list_or_first(output))
        }
    }

    /// Convert the `sprite` of a weighted variation. `None` unless at least
    /// one alternative resolved.
    fn convert_random_variations(&mut self, sprite: &Variation, source: &Path) -> Option<Value> {
        let indices: Vec<Value> = match sprite {
            Variation::Single(name) => self
                .resolve_sprite(name, source)
                .map(Value::from)
                .into_iter()
                .collect(),
            Variation::Alternatives(names) => names
                .iter()
                .filter_map(|name| self.resolve_sprite(name, source))
                .map(Value::from)
                .collect(),
        };

        if indices.is_empty() {
            None
        } else {
            Some(list_or_first(indices))
        }
    }

    /// Look up a sprite name, marking it referenced on success.
    fn resolve_sprite(&mut self, name: &str, source: &Path) -> Option<u32> {
        if name.is_empty() {
            return None;
        }

        match self.registry.resolve(name) {
            Some(index) => {
                self.registry.mark_referenced(name, self.kind.category());
                Some(index)
            }
            None => {
                let file = format!("{}.png", name);
                self.reporter.error(
                    MessageKind::SpriteNotFound,
                    "{} file for {} value from {} was not found. It will not be added to {}",
                    vec![
                        Arg::Sprite(file.clone()),
                        Arg::Sprite(file),
                        Arg::Path(source.to_path_buf()),
                        Arg::Text(self.config_file.to_string()),
                    ],
                );
                None
            }
        }
    }

    /// Insert each prefixed id into the processed set; return the ids that
    /// were claimed for the first time.
    fn claim_ids(&mut self, ids: Vec<String>, prefix: &str, source: &Path) -> Vec<String> {
        let mut surviving = Vec::with_capacity(ids.len());

        for id in ids {
            let full_id = format!("{}{}", prefix, id);
            if self.registry.processed_ids_mut().insert(&full_id) {
                surviving.push(id);
                continue;
            }

            if self.kind.category() == Category::Filler {
                if self.warn_filler_skips {
                    self.reporter.warning(
                        MessageKind::FillerSkip,
                        "Skipping filler for {} from {}.",
                        vec![Arg::Id(full_id), Arg::Path(source.to_path_buf())],
                    );
                }
            } else {
                self.reporter.error(
                    MessageKind::DuplicateId,
                    "ID {} encountered more than once, last time in {}.",
                    vec![Arg::Id(full_id), Arg::Path(source.to_path_buf())],
                );
            }
        }

        surviving
    }

    fn report_empty(&self, data: &Map<String, Value>, prefix: &str, source: &Path, no_ids: bool) {
        if no_ids {
            self.reporter.warning(
                MessageKind::EmptyEntry,
                "Skipping empty entry in {}.",
                vec![Arg::Path(source.to_path_buf())],
            );
        } else {
            let raw_ids = data.get("id").map(Value::to_string).unwrap_or_default();
            self.reporter.warning(
                MessageKind::EmptyEntry,
                "Skipping empty entry in {} with IDs {}{}.",
                vec![
                    Arg::Path(source.to_path_buf()),
                    Arg::Text(prefix.to_string()),
                    Arg::Text(raw_ids),
                ],
            );
        }
    }
}

/// JSON truthiness: null, false, zero and empty strings/lists/objects are
/// treated as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::diagnostics::{EventKind, EventLog};
    use serde_json::json;
    use std::sync::Arc;

    fn registry_with(names: &[&str]) -> SpriteRegistry {
        let mut registry = SpriteRegistry::new();
        for name in names {
            registry.register(name, Category::Main);
        }
        registry
    }

    fn entry(value: Value) -> TileEntry {
        TileEntry::new(value, "tiles/a.json")
    }

    fn logged() -> (Reporter, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        (Reporter::new(log.clone(), CancelToken::new()), log)
    }

    #[test]
    fn test_single_layers() {
        let mut registry = registry_with(&["t_grass", "t_dirt"]);
        let reporter = Reporter::silent();
        let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "c.json");

        let out = resolver
            .convert(&entry(json!({"id": "t_grass", "fg": "t_grass", "bg": "t_dirt", "rotates": true})))
            .unwrap();

        assert_eq!(
            Value::Object(out),
            json!({"id": "t_grass", "fg": 1, "bg": 2, "rotates": true})
        );
        assert!(!registry.is_unreferenced("t_grass", Category::Main));
        assert!(!registry.is_unreferenced("t_dirt", Category::Main));
    }

    #[test]
    fn test_key_order_is_kept() {
        let mut registry = registry_with(&["a"]);
        let reporter = Reporter::silent();
        let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "c.json");

        let out = resolver
            .convert(&entry(json!({"fg": "a", "rotates": false, "id": "x"})))
            .unwrap();
        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["fg", "rotates", "id"]);
    }

    #[test]
    fn test_list_and_weighted_variations() {
        let mut registry = registry_with(&["n", "e", "s", "w"]);
        let reporter = Reporter::silent();
        let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "c.json");

        let out = resolver
            .convert(&entry(json!({
                "id": "f_fridge",
                "fg": [
                    {"weight": 3, "sprite": ["n", "e"]},
                    {"weight": 1, "sprite": "s"},
                    {"weight": 1, "sprite": "missing"}
                ],
                "bg": ["w", "nope"]
            })))
            .unwrap();

        assert_eq!(
            Value::Object(out),
            json!({
                "id": "f_fridge",
                "fg": [
                    {"weight": 3, "sprite": [1, 2]},
                    {"weight": 1, "sprite": 3}
                ],
                "bg": 4
            })
        );
    }

    #[test]
    fn test_missing_sprite_is_omitted() {
        let mut registry = registry_with(&["a"]);
        let (reporter, log) = logged();
        let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "c.json");

        let out = resolver
            .convert(&entry(json!({"id": "x", "fg": "ghost", "bg": "a"})))
            .unwrap();

        assert_eq!(Value::Object(out), json!({"id": "x", "bg": 1}));
        let not_found = log.of_class(MessageKind::SpriteNotFound);
        assert_eq!(not_found.len(), 1);
        assert_eq!(
            not_found[0].render(),
            "ghost.png file for ghost.png value from tiles/a.json was not found. It will not be added to c.json"
        );
    }

    #[test]
    fn test_null_image_never_resolves() {
        let mut registry = registry_with(&[]);
        let reporter = Reporter::silent();
        let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "c.json");

        let out = resolver
            .convert(&entry(json!({"id": "x", "fg": "null_image"})))
            .unwrap();
        assert_eq!(Value::Object(out), json!({"id": "x"}));
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        let mut registry = registry_with(&["a"]);
        let (reporter, log) = logged();
        let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "c.json");

        assert!(resolver.convert(&entry(json!({"fg": "a"}))).is_none());
        assert!(resolver.convert(&entry(json!({"id": "x"}))).is_none());
        assert!(resolver.convert(&entry(json!({"id": "y", "fg": ""}))).is_none());

        let events = log.of_class(MessageKind::EmptyEntry);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].render(), "Skipping empty entry in tiles/a.json.");
        assert_eq!(
            events[1].render(),
            "Skipping empty entry in tiles/a.json with IDs \"x\"."
        );
    }

    #[test]
    fn test_duplicate_id_in_main_is_error() {
        let mut registry = registry_with(&["door"]);
        let (reporter, log) = logged();
        let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "c.json");

        assert!(resolver.convert(&entry(json!({"id": "door", "fg": "door"}))).is_some());
        assert!(resolver.convert(&entry(json!({"id": "door", "fg": "door"}))).is_none());

        assert_eq!(log.count(EventKind::Error), 1);
        assert_eq!(log.of_class(MessageKind::DuplicateId).len(), 1);
    }

    #[test]
    fn test_partial_duplicate_keeps_survivors() {
        let mut registry = registry_with(&["a"]);
        let reporter = Reporter::silent();
        let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "c.json");

        resolver.convert(&entry(json!({"id": "x", "fg": "a"})));
        let out = resolver
            .convert(&entry(json!({"id": ["x", "y", "z"], "fg": "a"})))
            .unwrap();
        assert_eq!(out["id"], json!(["y", "z"]));
    }

    #[test]
    fn test_filler_duplicate_warning_is_optional() {
        let mut registry = registry_with(&["door"]);
        registry.processed_ids_mut().insert("door");
        let (reporter, log) = logged();

        let mut quiet = Resolver::new(&mut registry, &reporter, SheetKind::Filler, "c.json");
        assert!(quiet.convert(&entry(json!({"id": "door", "fg": "door"}))).is_none());
        assert!(log.is_empty());

        let mut loud = Resolver::new(&mut registry, &reporter, SheetKind::Filler, "c.json")
            .warn_filler_skips(true);
        assert!(loud.convert(&entry(json!({"id": "door", "fg": "door"}))).is_none());
        assert_eq!(log.count(EventKind::Warning), 1);
        assert_eq!(log.of_class(MessageKind::FillerSkip).len(), 1);
    }

    #[test]
    fn test_additional_tiles_are_namespaced() {
        let mut registry = registry_with(&["wall", "wall_corner", "wall_end"]);
        let (reporter, log) = logged();
        let mut resolver = Resolver::new(&mut registry, &reporter, SheetKind::Main, "c.json");

        let out = resolver
            .convert(&entry(json!({
                "id": "t_wall",
                "fg": "wall",
                "additional_tiles": [
                    {"id": "corner", "fg": "wall_corner"},
                    {"id": "end", "fg": "wall_end"},
                    {"id": "broken", "fg": ""}
                ]
            })))
            .unwrap();

        assert_eq!(
            out[ADDITIONAL_KEY],
            json!([{"id": "corner", "fg": 2}, {"id": "end", "fg": 3}])
        );
        assert!(registry.processed_ids().contains("t_wall_corner"));
        assert!(registry.processed_ids().contains("t_wall_end"));
        assert!(!registry.processed_ids().contains("corner"));
        assert_eq!(log.of_class(MessageKind::EmptyEntry).len(), 1);
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!("a")));
        assert!(is_truthy(&json!([1])));
    }
}
