use std::fmt;

use clap::ValueEnum;

/// The catalog categories scraped from the wiki.
///
/// The kebab-case name of each variant is both its CLI value and its cache
/// key prefix, so the shared cache never collides across categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Category {
    Ammo,
    Armor,
    AshesOfWar,
    Classes,
    Incantations,
    Items,
    Shields,
    Sorceries,
    Spirits,
    Talismans,
    WeaponCategories,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Ammo,
        Category::Armor,
        Category::AshesOfWar,
        Category::Classes,
        Category::Incantations,
        Category::Items,
        Category::Shields,
        Category::Sorceries,
        Category::Spirits,
        Category::Talismans,
        Category::WeaponCategories,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Ammo => "ammo",
            Category::Armor => "armor",
            Category::AshesOfWar => "ashes-of-war",
            Category::Classes => "classes",
            Category::Incantations => "incantations",
            Category::Items => "items",
            Category::Shields => "shields",
            Category::Sorceries => "sorceries",
            Category::Spirits => "spirits",
            Category::Talismans => "talismans",
            Category::WeaponCategories => "weapon-categories",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_prefixes() {
        let mut seen = std::collections::HashSet::new();
        for category in Category::ALL {
            assert!(seen.insert(category.as_str()));
        }
        assert_eq!(seen.len(), 11);
    }
}
