//! Sheet and sprite category types.

use std::fmt;

/// The role a sheet plays in the tileset.
///
/// Fallback takes precedence: a sheet flagged both fallback and filler is
/// a fallback sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    Main,
    Filler,
    Fallback,
}

impl SheetKind {
    pub fn from_flags(filler: bool, fallback: bool) -> Self {
        if fallback {
            SheetKind::Fallback
        } else if filler {
            SheetKind::Filler
        } else {
            SheetKind::Main
        }
    }

    /// Bookkeeping category for sprites registered by this sheet.
    pub fn category(&self) -> Category {
        match self {
            SheetKind::Filler => Category::Filler,
            SheetKind::Main | SheetKind::Fallback => Category::Main,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SheetKind::Main => "main",
            SheetKind::Filler => "filler",
            SheetKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Unreferenced-sprite bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Main,
    Filler,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Main => "main",
            Category::Filler => "filler",
        }
    }

    fn slot(&self) -> usize {
        match self {
            Category::Main => 0,
            Category::Filler => 1,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub(super) fn slot(category: Category) -> usize {
    category.slot()
}

/// Outcome of registering a sprite basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A fresh index was minted.
    New(u32),
    /// The name was already known; carries the original index.
    Duplicate(u32),
}

impl Registration {
    pub fn index(&self) -> u32 {
        match self {
            Registration::New(i) | Registration::Duplicate(i) => *i,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Registration::New(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_takes_precedence() {
        assert_eq!(SheetKind::from_flags(true, true), SheetKind::Fallback);
        assert_eq!(SheetKind::from_flags(true, false), SheetKind::Filler);
        assert_eq!(SheetKind::from_flags(false, false), SheetKind::Main);
    }

    #[test]
    fn test_category_of_kind() {
        assert_eq!(SheetKind::Main.category(), Category::Main);
        assert_eq!(SheetKind::Fallback.category(), Category::Main);
        assert_eq!(SheetKind::Filler.category(), Category::Filler);
    }

    #[test]
    fn test_registration_index() {
        assert_eq!(Registration::New(3).index(), 3);
        assert_eq!(Registration::Duplicate(5).index(), 5);
        assert!(!Registration::Duplicate(5).is_new());
    }
}
