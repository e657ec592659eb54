//! Sprite index registry.
//!
//! Owns the global sprite-name → index map. Every sprite basename gets
//! exactly one index, minted the first time a sheet scan discovers it;
//! index 0 is reserved for the blank placeholder sprite.
//!
//! The registry also remembers which sprites have not been referenced by
//! any tile entry yet (per [`Category`]) and which tile ids have already
//! been claimed.
//!
//! # Example
//!
//! ```ignore
//! use tilecomp::registry::{Category, SpriteRegistry};
//!
//! let mut registry = SpriteRegistry::new();
//! let door = registry.register("t_door", Category::Main).index();
//! assert_eq!(registry.resolve("t_door"), Some(door));
//! ```

mod types;

use std::collections::{BTreeMap, HashMap, HashSet};

pub use types::{Category, Registration, SheetKind};

/// Basename bound to the reserved index 0.
pub const NULL_SPRITE: &str = "null_image";

/// Global sprite bookkeeping.
///
/// Mutated only during the sequential indexing and merging phases.
#[derive(Debug, Clone)]
pub struct SpriteRegistry {
    /// Highest index handed out so far (including grid padding).
    next_index: u32,
    name_to_index: HashMap<String, u32>,
    /// Per category, unreferenced sprites keyed by index so iteration
    /// follows discovery order.
    unreferenced: [BTreeMap<u32, String>; 2],
    processed_ids: IdSet,
}

impl Default for SpriteRegistry {
    fn default() -> Self {
        let mut name_to_index = HashMap::new();
        name_to_index.insert(NULL_SPRITE.to_string(), 0);
        Self {
            next_index: 0,
            name_to_index,
            unreferenced: [BTreeMap::new(), BTreeMap::new()],
            processed_ids: IdSet::new(),
        }
    }
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sprite basename, minting an index on first sight.
    pub fn register(&mut self, name: &str, category: Category) -> Registration {
        if let Some(&index) = self.name_to_index.get(name) {
            return Registration::Duplicate(index);
        }

        self.next_index += 1;
        let index = self.next_index;
        self.name_to_index.insert(name.to_string(), index);
        self.unreferenced[types::slot(category)].insert(index, name.to_string());
        Registration::New(index)
    }

    /// Look up a sprite index. The placeholder never resolves.
    pub fn resolve(&self, name: &str) -> Option<u32> {
        self.name_to_index.get(name).copied().filter(|&i| i != 0)
    }

    /// Forget `name` as unreferenced in `category`. Idempotent.
    pub fn mark_referenced(&mut self, name: &str, category: Category) {
        if let Some(&index) = self.name_to_index.get(name) {
            self.unreferenced[types::slot(category)].remove(&index);
        }
    }

    /// Unreferenced sprites of a category, in discovery order.
    pub fn unreferenced(&self, category: Category) -> impl Iterator<Item = (u32, &str)> {
        self.unreferenced[types::slot(category)]
            .iter()
            .map(|(&i, name)| (i, name.as_str()))
    }

    pub fn is_unreferenced(&self, name: &str, category: Category) -> bool {
        self.name_to_index
            .get(name)
            .is_some_and(|i| self.unreferenced[types::slot(category)].contains_key(i))
    }

    /// Advance the index counter without binding names (grid padding).
    pub fn skip(&mut self, count: u32) {
        self.next_index += count;
    }

    /// Highest index handed out so far.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Number of registered sprite names, placeholder excluded.
    pub fn len(&self) -> usize {
        self.name_to_index.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn processed_ids(&self) -> &IdSet {
        &self.processed_ids
    }

    pub fn processed_ids_mut(&mut self) -> &mut IdSet {
        &mut self.processed_ids
    }
}

/// Insertion-ordered set of claimed tile ids.
#[derive(Debug, Clone, Default)]
pub struct IdSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl IdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an id. Returns `false` if it was already claimed.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string());
        self.order.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_mints_sequential_indices() {
        let mut registry = SpriteRegistry::new();
        assert_eq!(registry.register("a", Category::Main), Registration::New(1));
        assert_eq!(registry.register("b", Category::Main), Registration::New(2));
        assert_eq!(registry.next_index(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reregister_keeps_index() {
        let mut registry = SpriteRegistry::new();
        registry.register("a", Category::Main);
        registry.register("b", Category::Main);

        assert_eq!(registry.register("a", Category::Main), Registration::Duplicate(1));
        assert_eq!(registry.register("a", Category::Filler), Registration::Duplicate(1));
        assert_eq!(registry.next_index(), 2);
        assert_eq!(registry.unreferenced(Category::Filler).count(), 0);
    }

    #[test]
    fn test_placeholder_is_reserved() {
        let mut registry = SpriteRegistry::new();
        assert_eq!(registry.resolve(NULL_SPRITE), None);
        assert_eq!(
            registry.register(NULL_SPRITE, Category::Main),
            Registration::Duplicate(0)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_missing() {
        let registry = SpriteRegistry::new();
        assert_eq!(registry.resolve("nope"), None);
    }

    #[test]
    fn test_mark_referenced_is_per_category() {
        let mut registry = SpriteRegistry::new();
        registry.register("grass", Category::Main);
        registry.register("dirt", Category::Filler);

        registry.mark_referenced("grass", Category::Filler);
        assert!(registry.is_unreferenced("grass", Category::Main));

        registry.mark_referenced("grass", Category::Main);
        registry.mark_referenced("grass", Category::Main);
        assert!(!registry.is_unreferenced("grass", Category::Main));

        let filler: Vec<_> = registry.unreferenced(Category::Filler).collect();
        assert_eq!(filler, vec![(2, "dirt")]);
    }

    #[test]
    fn test_unreferenced_in_discovery_order() {
        let mut registry = SpriteRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(name, Category::Main);
        }
        let names: Vec<_> = registry.unreferenced(Category::Main).map(|(_, n)| n).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_skip_advances_counter() {
        let mut registry = SpriteRegistry::new();
        registry.register("a", Category::Main);
        registry.skip(3);
        assert_eq!(registry.register("b", Category::Main), Registration::New(5));
    }

    #[test]
    fn test_id_set() {
        let mut ids = IdSet::new();
        assert!(ids.insert("t_wall"));
        assert!(ids.insert("t_floor"));
        assert!(!ids.insert("t_wall"));
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec!["t_wall", "t_floor"]);
        assert_eq!(ids.len(), 2);
    }
}
