use blockwright::rules::{Adjacency, CountType, MatchRule};
use blockwright::*;
use proptest::prelude::*;

/// Leaf rules that satisfy every adjacency invariant
fn leaf() -> impl Strategy<Value = MatchRule> {
    let types = prop::sample::select(vec!["coil", "bearing", "magnet", "cooler", "yoke", "glass"]);
    let names = prop::option::of(prop::sample::select(vec!["gold", "magnesium", "nether_brick"]));
    let counts = prop::sample::select(vec![CountType::AtLeast, CountType::Exactly, CountType::AtMost]);
    (types, names, counts, 0u8..=6, 0usize..6, any::<bool>()).prop_map(
        |(type_name, name, count, amount, kind, flag)| {
            let mut rule = MatchRule::new(type_name, amount).with_count(count);
            rule.name = name.map(str::to_string);
            match kind {
                3 => {
                    rule.adjacency = Adjacency::Axial;
                    rule.amount = (amount / 2 * 2).max(2);
                }
                4 | 5 => {
                    rule.adjacency = if kind == 4 { Adjacency::Vertex } else { Adjacency::Edge };
                    rule.amount = if kind == 4 { 3 } else { 2 };
                    if count == CountType::AtMost {
                        rule.count = CountType::AtLeast;
                    }
                }
                2 if amount >= 2 => rule.axial = true,
                _ => {}
            }
            if rule.amount == 0 {
                rule.count = CountType::Exactly;
            }
            if flag && rule.name.is_none() && rule.amount >= 2 {
                rule.different = true;
            }
            rule
        },
    )
}

/// `&&` of leaves and `||` groups, or `||` of leaves and `&&` groups
fn rule() -> impl Strategy<Value = PlacementRule> {
    let leaf_rule = leaf().prop_map(PlacementRule::Match).boxed();
    let any_of = prop::collection::vec(leaf_rule.clone(), 2..4).prop_map(PlacementRule::or);
    let all_of = prop::collection::vec(leaf_rule.clone(), 2..4).prop_map(PlacementRule::and);
    prop_oneof![
        leaf_rule.clone(),
        prop::collection::vec(prop_oneof![leaf_rule.clone(), any_of], 2..4).prop_map(PlacementRule::and),
        prop::collection::vec(prop_oneof![leaf_rule, all_of], 2..4).prop_map(PlacementRule::or),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_generated_leaves_are_valid(rule in leaf()) {
        prop_assert!(rule.validate().is_ok(), "'{}' rejected", rule);
    }

    #[test]
    fn prop_display_parses_back(rule in rule()) {
        let text = rule.to_string();
        let parsed = parse_rule(&text);
        prop_assert_eq!(parsed, Ok(rule), "text '{}'", text);
    }

    #[test]
    fn prop_parser_never_panics(text in "\\PC{0,64}") {
        let _ = parse_rule(&text);
    }

    #[test]
    fn prop_rule_like_text_never_panics(
        words in prop::collection::vec(
            prop::sample::select(vec![
                "one", "two", "six", "zero", "exactly", "at", "most", "axial", "opposing",
                "vertex", "edge", "different", "coil", "coils", "gold", "&&", "||", "(", ")",
            ]),
            0..10,
        )
    ) {
        let text = words.join(" ");
        if let Ok(rule) = parse_rule(&text) {
            prop_assert_eq!(parse_rule(&rule.to_string()), Ok(rule));
        }
    }

    #[test]
    fn prop_mirrored_rows_are_symmetric(
        halves in prop::collection::vec(prop::collection::vec(any::<bool>(), 2), 1..5),
        middle in prop::collection::vec(any::<bool>(), 1..5),
    ) {
        let rows = halves.len().min(middle.len());
        let air = Component::unnamed(ComponentKind::Air);
        let casing = Component::unnamed(ComponentKind::Casing);
        let pick = |solid: bool| if solid { casing.clone() } else { air.clone() };
        let mut cells = Vec::new();
        for r in 0..rows {
            let half = &halves[r];
            cells.extend(half.iter().map(|&s| pick(s)));
            cells.push(pick(middle[r]));
            cells.extend(half.iter().rev().map(|&s| pick(s)));
        }
        let grid = Grid::new(cells, vec![rows, 5]).unwrap();
        let mirrored = Constraint::Symmetry { axis: 1 }.is_satisfied(&grid).unwrap();
        prop_assert!(mirrored);
    }
}
