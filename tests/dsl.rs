use itemrule::parse::parse;
use itemrule::{
    compile, compile_with, CompileErrorKind, Item, Modifier, Rarity, Record, RuleSet, Socket,
    Weapon,
};

const FILTER: &str = r#"
// Show every unique.
rarity == "Unique"

// Six-links, whatever the base.
links == 6

// Good rares: two top-tier mods and life.
rarity == "Rare"
  and mods.count(m => m.tier <= 2) >= 2
  and stat("life") >= 70

// Fast, hard-hitting weapons.
has(weapon)
  and weapon.dps() >= 300
  and weapon.attacks_per_second > 1.4

// Currency and divination cards.
class in ["Stackable Currency", "Divination Cards"]
"#;

fn filter() -> RuleSet<Item> {
    RuleSet::load_from_string(FILTER)
}

fn matched_line(rules: &RuleSet<Item>, item: &Item) -> Option<usize> {
    rules.find_match(item, false).map(|r| r.start_line())
}

#[test]
fn filter_compiles_cleanly() {
    let rules = filter();
    assert_eq!(rules.len(), 5);
    assert_eq!(rules.failed_count(), 0);
    let starts: Vec<usize> = rules.rules().iter().map(|r| r.start_line()).collect();
    assert_eq!(starts, vec![2, 5, 8, 13, 18]);
}

#[test]
fn filter_matches_uniques_and_links() {
    let rules = filter();
    let unique = Item::new("Leather Belt").with_rarity(Rarity::Unique);
    assert_eq!(matched_line(&rules, &unique), Some(2));

    let six_link =
        Item::new("Astral Plate").with_sockets((0..6).map(|_| Socket::new('R', 0)).collect());
    assert_eq!(matched_line(&rules, &six_link), Some(5));

    let five_link = Item::new("Astral Plate").with_sockets(
        (0..6)
            .map(|i| Socket::new('R', u8::from(i == 5)))
            .collect(),
    );
    assert_eq!(matched_line(&rules, &five_link), None);
}

#[test]
fn filter_matches_good_rares() {
    let rules = filter();
    let rare = Item::new("Two-Stone Ring")
        .with_rarity(Rarity::Rare)
        .with_mod(Modifier::new("IncreasedLife", 1, vec![78]))
        .with_mod(Modifier::new("FireResistance", 2, vec![44]))
        .with_stat("life", 78);
    assert_eq!(matched_line(&rules, &rare), Some(8));

    let weak = rare.clone().with_stat("life", 20);
    assert_eq!(matched_line(&rules, &weak), None);
}

#[test]
fn filter_matches_weapons_without_faulting_on_armour() {
    let rules = filter();
    let bow = Item::new("Thicket Bow").with_weapon(Weapon::new(150, 300, 1.5, 6.0));
    assert_eq!(matched_line(&rules, &bow), Some(13));

    let slow = Item::new("Thicket Bow").with_weapon(Weapon::new(150, 300, 1.3, 6.0));
    assert_eq!(matched_line(&rules, &slow), None);

    let report = rules.evaluate_detailed(&Item::new("Iron Hat"));
    assert!(report.failures().is_empty());
    assert_eq!(report.evaluated(), 5);
}

#[test]
fn filter_matches_currency() {
    let rules = filter();
    let orb = Item::new("Chaos Orb")
        .with_class("Stackable Currency")
        .with_stack_size(20);
    assert_eq!(matched_line(&rules, &orb), Some(18));
}

#[test]
fn keywords_in_either_case() {
    let item = Item::new("Gold Ring").with_quality(5);
    for text in [
        "quality > 1 and quality < 10",
        "quality > 1 AND quality < 10",
        "quality > 1 && quality < 10",
        "quality > 50 or quality == 5",
        "quality > 50 OR quality == 5",
        "quality > 50 || quality == 5",
        "not corrupted",
        "NOT corrupted",
        "!corrupted",
    ] {
        let predicate = compile::<Item>(text).unwrap();
        assert_eq!(predicate.test(&item), Ok(true), "{text}");
    }
}

#[test]
fn not_binds_tighter_than_or() {
    let item = Item::new("Gold Ring");
    let rules: RuleSet<Item> = RuleSet::load_from_string("not identified or item_level >= 1");
    assert!(rules.matches(&item, false));
}

#[test]
fn string_escapes() {
    let item = Item::new("Gold Ring").with_name("The \"Ring\"");
    let predicate = compile::<Item>(r#"name == "The \"Ring\"""#).unwrap();
    assert_eq!(predicate.test(&item), Ok(true));
}

#[test]
fn precedence_of_arithmetic_and_logic() {
    let expr = parse("a + b * c > 3 or not d and e").unwrap();
    assert_eq!(
        expr.to_string(),
        "(((a + (b * c)) > 3) OR ((NOT d) AND e))"
    );
}

#[test]
fn compile_errors_point_into_the_rule() {
    let err = compile::<Item>("quality > 5 and rarty == \"Rare\"").unwrap_err();
    assert_eq!(err.offset(), Some(16));
    assert_eq!(&err.text()[16..21], "rarty");
    assert_eq!(err.to_string(), "unknown identifier 'rarty' at offset 16");

    let err = compile::<Item>("weapon.dps > 1").unwrap_err();
    assert_eq!(
        err.kind(),
        &CompileErrorKind::MissingCall { name: "dps".into() }
    );
}

#[test]
fn compile_with_explicit_schema() {
    let predicate = compile_with(Item::schema(), "socket_count == 0").unwrap();
    assert_eq!(predicate.test(&Item::new("Gold Ring")), Ok(true));
}

fn deep_parens(depth: usize) -> String {
    format!("{}quality > 1{}", "(".repeat(depth), ")".repeat(depth))
}

fn failed_then_fallback(broken: &str) -> RuleSet<Item> {
    RuleSet::load_from_string(&format!("{broken}\n\nquality > 5"))
}

#[test]
fn deeply_nested_rule_fails_alone() {
    let item = Item::new("Gold Ring").with_quality(10);
    for broken in [
        deep_parens(1_000),
        format!("{}corrupted", "!".repeat(1_000)),
        format!("has_tag({}\"rare\"{})", "(".repeat(1_000), ")".repeat(1_000)),
    ] {
        let rules = failed_then_fallback(&broken);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.failed_count(), 1);
        assert!(matches!(
            rules.rules()[0].error().map(|e| e.kind()),
            Some(CompileErrorKind::Syntax(_))
        ));
        assert!(rules.rules()[0].error().and_then(|e| e.offset()).is_some());
        assert_eq!(matched_line(&rules, &item), Some(3));
    }
}

#[test]
fn moderate_nesting_still_compiles() {
    let rules = failed_then_fallback(&deep_parens(40));
    assert_eq!(rules.failed_count(), 0);
    let item = Item::new("Gold Ring").with_quality(2);
    assert_eq!(matched_line(&rules, &item), Some(1));
}

#[test]
fn long_arithmetic_chain_fails_alone() {
    let broken = format!("{} > 0", vec!["quality"; 20_000].join(" + "));
    let rules = failed_then_fallback(&broken);
    assert_eq!(rules.failed_count(), 1);
    let item = Item::new("Gold Ring").with_quality(10);
    assert_eq!(matched_line(&rules, &item), Some(3));
}

#[test]
fn long_connective_chains_compile_and_short_circuit() {
    let all = vec!["quality > 1"; 20_000].join(" and ");
    let rules = failed_then_fallback(&all);
    assert_eq!(rules.failed_count(), 0);
    let good = Item::new("Gold Ring").with_quality(10);
    let poor = Item::new("Gold Ring").with_quality(1);
    assert_eq!(matched_line(&rules, &good), Some(1));
    assert_eq!(matched_line(&rules, &poor), None);

    let mut alternatives = vec!["has_tag(\"never\")"; 20_000];
    alternatives.push("corrupted");
    let rules: RuleSet<Item> = RuleSet::load_from_string(&alternatives.join(" or "));
    assert_eq!(rules.failed_count(), 0);
    assert!(rules.matches(&Item::new("Gold Ring").with_corrupted(true), false));
    assert!(!rules.matches(&Item::new("Gold Ring"), false));
}
