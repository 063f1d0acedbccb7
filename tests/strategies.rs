use itemrule::{Item, Modifier, Rarity, Socket, Weapon};
use proptest::prelude::*;

// --- Fixed vocabulary ---
// Small alphabets so generated rules and items collide often.

const CLASSES: &[&str] = &["Rings", "Body Armours", "Stackable Currency", "Bows"];
const TAGS: &[&str] = &["rare", "currency", "armour", "weapon"];
const MODS: &[&str] = &["IncreasedLife", "FireResistance", "AddedPhysical"];
const COLOURS: &[char] = &['R', 'G', 'B', 'W'];
const INT_FIELDS: &[&str] = &[
    "item_level",
    "quality",
    "stack_size",
    "width",
    "height",
    "links",
    "socket_count",
];
const OPS: &[&str] = &["==", "!=", ">", ">=", "<", "<="];

fn arb_rarity() -> impl Strategy<Value = Rarity> {
    prop_oneof![
        Just(Rarity::Normal),
        Just(Rarity::Magic),
        Just(Rarity::Rare),
        Just(Rarity::Unique),
    ]
}

fn arb_modifier() -> impl Strategy<Value = Modifier> {
    (
        prop::sample::select(MODS),
        1_i64..=5,
        prop::collection::vec(0_i64..200, 0..3),
    )
        .prop_map(|(name, tier, values)| Modifier::new(name, tier, values))
}

/// Generate an item drawn from the fixed vocabulary.
pub fn arb_item() -> impl Strategy<Value = Item> {
    (
        (
            arb_rarity(),
            prop::sample::select(CLASSES),
            1_i64..=100,
            0_i64..=20,
            any::<bool>(),
        ),
        prop::collection::vec((prop::sample::select(COLOURS), 0_u8..3), 0..=6),
        prop::collection::vec(arb_modifier(), 0..4),
        prop::sample::subsequence(TAGS, 0..=TAGS.len()),
        prop::option::of((0_i64..100, 100_i64..300, 0.8_f64..2.0)),
        (0_i64..100, 1_i64..=40),
    )
        .prop_map(|(base, sockets, mods, tags, weapon, (life, stack))| {
            let (rarity, class, level, quality, corrupted) = base;
            let mut item = Item::new("Generated Base")
                .with_rarity(rarity)
                .with_class(class)
                .with_item_level(level)
                .with_quality(quality)
                .with_corrupted(corrupted)
                .with_stack_size(stack)
                .with_stat("life", life)
                .with_sockets(sockets.into_iter().map(|(c, g)| Socket::new(c, g)).collect());
            for m in mods {
                item = item.with_mod(m);
            }
            for t in tags {
                item = item.with_tag(t);
            }
            if let Some((min, max, aps)) = weapon {
                item = item.with_weapon(Weapon::new(min, max, aps, 5.0));
            }
            item
        })
}

/// Generate a single well-typed boolean condition over the item schema.
fn arb_leaf_rule() -> impl Strategy<Value = String> {
    prop_oneof![arb_field_rule(), arb_computed_rule()]
}

/// Direct reads of fields and methods.
fn arb_field_rule() -> impl Strategy<Value = String> {
    prop_oneof![
        (
            prop::sample::select(INT_FIELDS),
            prop::sample::select(OPS),
            0_i64..=100,
        )
            .prop_map(|(f, op, v)| format!("{f} {op} {v}")),
        prop::sample::select(CLASSES).prop_map(|c| format!("class == \"{c}\"")),
        prop::sample::select(&["Normal", "Magic", "Rare", "Unique"][..])
            .prop_map(|r| format!("rarity == \"{r}\"")),
        Just("corrupted".to_owned()),
        Just("identified".to_owned()),
        prop::sample::select(TAGS).prop_map(|t| format!("has_tag(\"{t}\")")),
        prop::sample::select(MODS).prop_map(|m| format!("has_mod(\"{m}\")")),
        (0_i64..100).prop_map(|v| format!("stat(\"life\") >= {v}")),
    ]
}

/// Quantifiers, arithmetic and set membership.
fn arb_computed_rule() -> impl Strategy<Value = String> {
    prop_oneof![
        (1_i64..=5).prop_map(|t| format!("mods.any(m => m.tier <= {t})")),
        (0_i64..=6, prop::sample::select(COLOURS))
            .prop_map(|(n, c)| format!("sockets.count(s => s.colour == \"{c}\") >= {n}")),
        (0_i64..=400).prop_map(|v| format!("(has(weapon) and weapon.dps() > {v})")),
        (0_i64..=300).prop_map(|v| format!("quality * 2 + item_level > {v}")),
        (0_i64..=50).prop_map(|v| format!("item_level / (quality + 1) >= {v}")),
        prop::sample::subsequence(CLASSES, 1..=CLASSES.len()).prop_map(|cs| {
            let set: Vec<String> = cs.iter().map(|c| format!("\"{c}\"")).collect();
            format!("class in [{}]", set.join(", "))
        }),
    ]
}

/// Generate a composite rule (and, or, not of leaves), bounded depth.
pub fn arb_rule(max_depth: u32) -> impl Strategy<Value = String> {
    arb_leaf_rule().prop_recursive(max_depth, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a}) and ({b})")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a}) or ({b})")),
            inner.prop_map(|e| format!("not ({e})")),
        ]
    })
}

/// Generate an ordered list of 1..=8 rules.
pub fn arb_rule_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_rule(2), 1..=8)
}
