//! Rule evaluation and argument template interpretation.

use std::collections::HashSet;

use pocketmc::rule::{self, Argument, Rule};
use pocketmc::platform;


fn parse_rules(value: serde_json::Value) -> Vec<Rule> {
    serde_json::from_value(value).unwrap()
}

fn parse_args(value: serde_json::Value) -> Vec<Argument> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn rules_empty_disallow() {
    let features = HashSet::new();
    assert!(!rule::interpret_rules(&[], &features));
}

#[test]
fn rules_last_match_wins() {

    let features = HashSet::new();

    let rules = parse_rules(serde_json::json!([
        { "action": "allow" },
        { "action": "disallow" },
    ]));
    assert!(!rule::interpret_rules(&rules, &features));

    let rules = parse_rules(serde_json::json!([
        { "action": "disallow" },
        { "action": "allow" },
    ]));
    assert!(rule::interpret_rules(&rules, &features));

}

#[test]
fn rules_os_gated_disallow() {

    // Allow everywhere, then disallow on linux: the outcome depends on the
    // platform the test runs on.
    let rules = parse_rules(serde_json::json!([
        { "action": "allow" },
        { "action": "disallow", "os": { "name": "linux" } },
    ]));

    let on_linux = platform::os_name() == Some("linux");
    assert_eq!(rule::interpret_rules(&rules, &HashSet::new()), !on_linux);

}

#[test]
fn rules_features() {

    let rules = parse_rules(serde_json::json!([
        { "action": "allow", "features": { "is_demo_user": true } },
    ]));

    let mut features = HashSet::new();
    assert!(!rule::interpret_rules(&rules, &features));

    features.insert("is_demo_user".to_string());
    assert!(rule::interpret_rules(&rules, &features));

    // An absent feature has an actual value of false.
    let rules = parse_rules(serde_json::json!([
        { "action": "allow", "features": { "is_demo_user": false } },
    ]));
    assert!(rule::interpret_rules(&rules, &HashSet::new()));

}

#[test]
fn args_template() {

    let args = parse_args(serde_json::json!([
        "--plain",
        { "value": "--single", "rules": [{ "action": "allow" }] },
        { "value": ["--multi", "1"], "rules": [{ "action": "allow" }] },
        { "value": "--rejected", "rules": [{ "action": "disallow" }] },
        { "value": "--demo", "rules": [{ "action": "allow", "features": { "is_demo_user": true } }] },
    ]));

    let mut dst = Vec::new();
    rule::interpret_args(&args, &HashSet::new(), &mut dst);
    assert_eq!(dst, ["--plain", "--single", "--multi", "1"]);

    let mut dst = Vec::new();
    let features = HashSet::from(["is_demo_user".to_string()]);
    rule::interpret_args(&args, &features, &mut dst);
    assert_eq!(dst, ["--plain", "--single", "--multi", "1", "--demo"]);

}

#[test]
fn replace_args() {

    let mut s = "--dir ${game_directory} --keep ${unknown} --v ${version_name}".to_string();
    rule::replace_string_args(&mut s, |name| {
        match name {
            "game_directory" => Some("/work".to_string()),
            "version_name" => Some("1.19.4".to_string()),
            _ => None,
        }
    });

    // Unresolved tokens stay literally in place.
    assert_eq!(s, "--dir /work --keep ${unknown} --v 1.19.4");

    let mut args = vec!["${a}${a}".to_string(), "x".to_string()];
    rule::replace_strings_args(&mut args, |name| (name == "a").then(|| "longer".to_string()));
    assert_eq!(args, ["longerlonger", "x"]);

}
