//! Load a rule file (or a built-in filter) and run it over a few items.
//!
//! ```text
//! cargo run --example filter -- path/to/rules.filter
//! RUST_LOG=debug cargo run --example filter
//! ```

use itemrule::{Armour, Item, Modifier, Rarity, RuleSet, Socket, Weapon};

const BUILTIN: &str = r#"
// Always show uniques.
rarity == "Unique"

// Five- and six-links.
links >= 5

// Rares with two top-tier mods.
rarity == "Rare" and mods.count(m => m.tier <= 2) >= 2

// Weapons worth checking.
has(weapon) and weapon.dps() >= 250

// Deliberately broken: reported at load, never matches.
quality >>> 5

// Faults on items without armour, isolated per item.
armour.energy_shield > 300
"#;

fn items() -> Vec<Item> {
    vec![
        Item::new("Leather Belt")
            .with_name("Headhunter")
            .with_rarity(Rarity::Unique),
        Item::new("Astral Plate").with_sockets(
            ['R', 'R', 'G', 'G', 'B', 'W']
                .into_iter()
                .map(|c| Socket::new(c, 0))
                .collect(),
        ),
        Item::new("Two-Stone Ring")
            .with_name("Storm Loop")
            .with_rarity(Rarity::Rare)
            .with_mod(Modifier::new("IncreasedLife", 1, vec![79]))
            .with_mod(Modifier::new("LightningResistance", 2, vec![45])),
        Item::new("Jewelled Foil").with_weapon(Weapon::new(80, 300, 1.6, 5.5)),
        Item::new("Vaal Regalia").with_armour(Armour::new(0, 0, 420)),
        Item::new("Scroll of Wisdom").with_class("Stackable Currency"),
    ]
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let rules: RuleSet<Item> = match std::env::args().nth(1) {
        Some(path) => match RuleSet::load_from_path(&path) {
            Ok(rules) => rules,
            Err(err) => {
                tracing::error!(error = %err, "could not load rules");
                std::process::exit(1);
            }
        },
        None => RuleSet::load_from_string(BUILTIN),
    };
    println!("{rules}");

    for item in items() {
        let report = rules.evaluate_detailed(&item);
        let verdict = match rules.find_match(&item, true) {
            Some(rule) => format!("show (line {})", rule.start_line()),
            None => "hide".to_owned(),
        };
        println!("{:<20} {verdict:<16} {report}", item.display_name());
    }
}
