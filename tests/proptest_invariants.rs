mod strategies;

use itemrule::{compile, Item, RuleSet};
use proptest::prelude::*;
use strategies::{arb_item, arb_rule, arb_rule_list};

proptest! {
    /// Generated rules always compile.
    #[test]
    fn generated_rules_compile(rule in arb_rule(3)) {
        let result = compile::<Item>(&rule);
        prop_assert!(result.is_ok(), "{}: {:?}", rule, result.err());
    }

    /// Evaluation terminates with a boolean for every record and is
    /// deterministic.
    #[test]
    fn evaluation_is_deterministic(rule in arb_rule(3), item in arb_item()) {
        let predicate = compile::<Item>(&rule).unwrap();
        let first = predicate.test(&item);
        prop_assert!(first.is_ok(), "{}: {:?}", rule, first);
        prop_assert_eq!(first, predicate.test(&item));
    }

    /// not(not(x)) == x.
    #[test]
    fn double_negation(rule in arb_rule(3), item in arb_item()) {
        let single = compile::<Item>(&rule).unwrap();
        let double = compile::<Item>(&format!("not (not ({rule}))")).unwrap();
        prop_assert_eq!(single.test(&item), double.test(&item));
    }

    /// Logical operators agree with Rust's on the operands' results.
    #[test]
    fn connectives_agree(a in arb_rule(1), b in arb_rule(1), item in arb_item()) {
        let ra = compile::<Item>(&a).unwrap().test(&item).unwrap();
        let rb = compile::<Item>(&b).unwrap().test(&item).unwrap();
        let and = compile::<Item>(&format!("({a}) and ({b})")).unwrap();
        let or = compile::<Item>(&format!("({a}) || ({b})")).unwrap();
        prop_assert_eq!(and.test(&item), Ok(ra && rb));
        prop_assert_eq!(or.test(&item), Ok(ra || rb));
    }

    /// A rule set matches exactly when some rule holds, and reports the
    /// first such rule.
    #[test]
    fn first_true_rule_wins(rules in arb_rule_list(), item in arb_item()) {
        let set: RuleSet<Item> = RuleSet::load_from_list("generated", &rules);
        let individually: Vec<bool> = rules
            .iter()
            .map(|r| compile::<Item>(r).unwrap().test(&item).unwrap())
            .collect();
        let first = individually.iter().position(|hit| *hit).map(|i| i + 1);

        prop_assert_eq!(set.matches(&item, false), first.is_some());
        prop_assert_eq!(set.find_match(&item, false).map(|r| r.start_line()), first);
        prop_assert_eq!(set.evaluate_detailed(&item).matched_line(), first);
    }

    /// Trailing comments never change what a file-loaded rule matches.
    #[test]
    fn comments_are_inert(rule in arb_rule(2), item in arb_item()) {
        let plain: RuleSet<Item> = RuleSet::load_from_string(&rule);
        let commented: RuleSet<Item> =
            RuleSet::load_from_string(&format!("// leading note\n{rule} // trailing note"));
        prop_assert_eq!(plain.matches(&item, false), commented.matches(&item, false));
        prop_assert_eq!(commented.rules()[0].start_line(), 1);
    }

    /// Loading the same text twice yields the same rules.
    #[test]
    fn loading_is_idempotent(rules in arb_rule_list(), item in arb_item()) {
        let text = rules.join("\n\n");
        let a: RuleSet<Item> = RuleSet::load_from_string(&text);
        let b: RuleSet<Item> = RuleSet::load_from_string(&text);
        prop_assert_eq!(a.len(), rules.len());
        for (x, y) in a.rules().iter().zip(b.rules()) {
            prop_assert_eq!(x.start_line(), y.start_line());
            prop_assert_eq!(x.source_text(), y.source_text());
        }
        prop_assert_eq!(a.matches(&item, false), b.matches(&item, false));
    }
}
