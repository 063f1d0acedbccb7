//! The fixed item record rules are written against.
//!
//! An [`Item`] is built by whoever extracts item state from the game; rules
//! only read it. Optional components ([`Weapon`], [`Armour`]) are absent on
//! items that do not carry them, and reading through an absent component is
//! an evaluation error for that item only. Use `has(weapon)` to test for
//! presence first.

mod schema;

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Item rarity, exposed to rules as a string (`"Normal"`, `"Magic"`,
/// `"Rare"`, `"Unique"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rarity {
    #[default]
    Normal,
    Magic,
    Rare,
    Unique,
}

impl Rarity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Normal => "Normal",
            Rarity::Magic => "Magic",
            Rarity::Rare => "Rare",
            Rarity::Unique => "Unique",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One socket; sockets sharing a `group` are linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Socket {
    pub colour: char,
    pub group: u8,
}

impl Socket {
    #[must_use]
    pub fn new(colour: char, group: u8) -> Self {
        Self { colour, group }
    }
}

/// An affix rolled on the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub name: String,
    /// 1 is the best tier.
    pub tier: i64,
    pub values: Vec<i64>,
}

impl Modifier {
    #[must_use]
    pub fn new(name: impl Into<String>, tier: i64, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            tier,
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    pub physical_min: i64,
    pub physical_max: i64,
    pub attacks_per_second: f64,
    pub critical_chance: f64,
}

impl Weapon {
    #[must_use]
    pub fn new(
        physical_min: i64,
        physical_max: i64,
        attacks_per_second: f64,
        critical_chance: f64,
    ) -> Self {
        Self {
            physical_min,
            physical_max,
            attacks_per_second,
            critical_chance,
        }
    }

    /// Average physical damage per second.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn dps(&self) -> f64 {
        (self.physical_min + self.physical_max) as f64 / 2.0 * self.attacks_per_second
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Armour {
    pub armour: i64,
    pub evasion: i64,
    pub energy_shield: i64,
}

impl Armour {
    #[must_use]
    pub fn new(armour: i64, evasion: i64, energy_shield: i64) -> Self {
        Self {
            armour,
            evasion,
            energy_shield,
        }
    }
}

/// A dropped item, as seen by rules.
///
/// ```
/// use itemrule::{Item, Rarity, RuleSet};
///
/// let rules: RuleSet<Item> = RuleSet::load_from_string("rarity == \"Unique\" and links >= 5");
/// let item = Item::new("Tabula Rasa")
///     .with_rarity(Rarity::Unique)
///     .with_sockets((0..6).map(|_| itemrule::Socket::new('W', 0)).collect());
/// assert!(rules.matches(&item, false));
/// ```
#[derive(Debug, Clone)]
pub struct Item {
    name: String,
    base_name: String,
    class: String,
    rarity: Rarity,
    item_level: i64,
    quality: i64,
    stack_size: i64,
    width: i64,
    height: i64,
    identified: bool,
    corrupted: bool,
    sockets: Vec<Socket>,
    mods: Vec<Modifier>,
    tags: Vec<String>,
    stats: HashMap<String, i64>,
    weapon: Option<Weapon>,
    armour: Option<Armour>,
    links: OnceLock<i64>,
}

impl Item {
    /// A normal, identified 1x1 item of the given base type.
    #[must_use]
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            base_name: base_name.into(),
            class: String::new(),
            rarity: Rarity::Normal,
            item_level: 1,
            quality: 0,
            stack_size: 1,
            width: 1,
            height: 1,
            identified: true,
            corrupted: false,
            sockets: Vec::new(),
            mods: Vec::new(),
            tags: Vec::new(),
            stats: HashMap::new(),
            weapon: None,
            armour: None,
            links: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    #[must_use]
    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    #[must_use]
    pub fn with_item_level(mut self, item_level: i64) -> Self {
        self.item_level = item_level;
        self
    }

    #[must_use]
    pub fn with_quality(mut self, quality: i64) -> Self {
        self.quality = quality;
        self
    }

    #[must_use]
    pub fn with_stack_size(mut self, stack_size: i64) -> Self {
        self.stack_size = stack_size;
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: i64, height: i64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_identified(mut self, identified: bool) -> Self {
        self.identified = identified;
        self
    }

    #[must_use]
    pub fn with_corrupted(mut self, corrupted: bool) -> Self {
        self.corrupted = corrupted;
        self
    }

    #[must_use]
    pub fn with_sockets(mut self, sockets: Vec<Socket>) -> Self {
        self.sockets = sockets;
        self.links = OnceLock::new();
        self
    }

    #[must_use]
    pub fn with_mod(mut self, modifier: Modifier) -> Self {
        self.mods.push(modifier);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set a named numeric stat, read by rules through `stat(name)`.
    #[must_use]
    pub fn with_stat(mut self, name: impl Into<String>, value: i64) -> Self {
        self.stats.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapon = Some(weapon);
        self
    }

    #[must_use]
    pub fn with_armour(mut self, armour: Armour) -> Self {
        self.armour = Some(armour);
        self
    }

    /// Display name, falling back to the base type for unnamed items.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.base_name
        } else {
            &self.name
        }
    }

    #[must_use]
    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    #[must_use]
    pub fn sockets(&self) -> &[Socket] {
        &self.sockets
    }

    /// Size of the largest group of linked sockets. Computed on first use
    /// and cached in the item.
    #[must_use]
    pub fn links(&self) -> i64 {
        *self.links.get_or_init(|| {
            let mut groups: HashMap<u8, i64> = HashMap::new();
            for socket in &self.sockets {
                *groups.entry(socket.group).or_default() += 1;
            }
            groups.into_values().max().unwrap_or(0)
        })
    }

    #[must_use]
    pub fn stat(&self, name: &str) -> i64 {
        self.stats.get(name).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    #[must_use]
    pub fn has_mod(&self, name: &str) -> bool {
        self.mods.iter().any(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_counts_largest_group() {
        let item = Item::new("Astral Plate").with_sockets(vec![
            Socket::new('R', 0),
            Socket::new('R', 0),
            Socket::new('G', 1),
            Socket::new('G', 1),
            Socket::new('G', 1),
            Socket::new('B', 2),
        ]);
        assert_eq!(item.links(), 3);
        assert_eq!(item.links(), 3);
    }

    #[test]
    fn links_reset_when_sockets_change() {
        let item = Item::new("Astral Plate").with_sockets(vec![Socket::new('R', 0)]);
        assert_eq!(item.links(), 1);
        let item = item.with_sockets(vec![Socket::new('R', 0), Socket::new('B', 0)]);
        assert_eq!(item.links(), 2);
        assert_eq!(Item::new("Gold Ring").links(), 0);
    }

    #[test]
    fn display_name_falls_back_to_base() {
        assert_eq!(Item::new("Gold Ring").display_name(), "Gold Ring");
        assert_eq!(
            Item::new("Gold Ring").with_name("Vermillion Hold").display_name(),
            "Vermillion Hold"
        );
    }

    #[test]
    fn stats_default_to_zero() {
        let item = Item::new("Gold Ring").with_stat("life", 40);
        assert_eq!(item.stat("life"), 40);
        assert_eq!(item.stat("mana"), 0);
    }

    #[test]
    fn weapon_dps() {
        let weapon = Weapon::new(10, 30, 1.25, 5.0);
        assert!((weapon.dps() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rarity_names() {
        assert_eq!(Rarity::Unique.to_string(), "Unique");
        assert_eq!(Rarity::default(), Rarity::Normal);
    }
}
