#![no_main]

use blockwright::parse_rule;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(rule) = parse_rule(s) {
            let text = rule.to_string();
            let reparsed = parse_rule(&text).expect("displayed rule must parse");
            assert_eq!(reparsed, rule, "'{}' displayed as '{}'", s, text);
        }
    }
});
