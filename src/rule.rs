//! Rule and argument template evaluation.
//!
//! Version metadata gates libraries and arguments behind `rules` arrays, and
//! argument templates mix plain strings with rule-bearing objects. This module
//! owns both the serde schema of these documents and their interpretation.

use std::collections::HashSet;

use crate::serde::RegexString;
use crate::platform;


/// A single allow/disallow rule, with optional OS and feature predicates.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: RuleOs,
    #[serde(default)]
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub features: std::collections::HashMap<String, bool>,
}

/// OS predicates of a rule, each present field must match the probe.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RuleOs {
    pub name: Option<String>,
    pub arch: Option<String>,
    /// Matched as a regex against the platform version string.
    pub version: Option<RegexString>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Allow,
    Disallow,
}

/// An element of an `arguments.jvm` or `arguments.game` template.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum Argument {
    Raw(String),
    Conditional(ConditionalArgument),
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalArgument {
    pub value: SingleOrVec<String>,
    pub rules: Option<Vec<Rule>>,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum SingleOrVec<T> {
    Single(T),
    Vec(Vec<T>),
}

/// Evaluate a rule list against the platform probe and the given enabled
/// features, returning true if the outcome is allowed.
///
/// The decision is the action of the last rule whose predicates all match,
/// starting from a disallowed state: this is last-matching-rule wins, not a
/// short-circuit.
pub fn interpret_rules(rules: &[Rule], features: &HashSet<String>) -> bool {

    let mut allowed = false;

    for rule in rules {
        match interpret_rule(rule, features) {
            Some(RuleAction::Allow) => allowed = true,
            Some(RuleAction::Disallow) => allowed = false,
            None => (),
        }
    }

    allowed

}

/// Evaluate a single rule, returning its action if all predicates match.
fn interpret_rule(rule: &Rule, features: &HashSet<String>) -> Option<RuleAction> {

    if !interpret_rule_os(&rule.os) {
        return None;
    }

    // A feature absent from the set has an actual value of false.
    for (feature, expected) in &rule.features {
        if features.contains(feature) != *expected {
            return None;
        }
    }

    Some(rule.action)

}

/// Return true if the OS predicates of a rule match the platform probe.
fn interpret_rule_os(os: &RuleOs) -> bool {

    if let (Some(name), probed) = (&os.name, platform::os_name()) {
        if probed != Some(name.as_str()) {
            return false;
        }
    }

    if let (Some(arch), probed) = (&os.arch, platform::os_arch()) {
        if probed != Some(arch.as_str()) {
            return false;
        }
    }

    if let Some(version) = &os.version {
        match platform::os_version() {
            Some(probed) if version.is_match(probed) => (),
            _ => return false,
        }
    }

    true

}

/// Flatten an argument template into `dst`, keeping plain strings and the
/// values of conditional arguments whose rules pass.
pub fn interpret_args(args: &[Argument], features: &HashSet<String>, dst: &mut Vec<String>) {

    for arg in args {

        if let Argument::Conditional(cond) = arg {
            if let Some(rules) = &cond.rules {
                if !interpret_rules(rules, features) {
                    continue;
                }
            }
        }

        match arg {
            Argument::Raw(value) => dst.push(value.clone()),
            Argument::Conditional(cond) => match &cond.value {
                SingleOrVec::Single(value) => dst.push(value.clone()),
                SingleOrVec::Vec(values) => dst.extend_from_slice(values),
            },
        }

    }

}

/// Apply [`replace_string_args`] to every string of a slice.
pub fn replace_strings_args<F>(args: &mut [String], mut func: F)
where
    F: FnMut(&str) -> Option<String>,
{
    for arg in args {
        replace_string_args(arg, &mut func);
    }
}

/// Search the string for each token of the form `${name}`, give its name to
/// the closure, and replace the token when some value is returned. Tokens the
/// closure does not resolve are left literally in place.
pub fn replace_string_args<F>(s: &mut String, mut func: F)
where
    F: FnMut(&str) -> Option<String>,
{

    // Everything before the cursor has already been checked.
    let mut cursor = 0;

    while let Some(open_idx) = s[cursor..].find("${") {

        let open_idx = cursor + open_idx;
        let Some(close_idx) = s[open_idx + 2..].find('}') else { break };
        let close_idx = open_idx + 2 + close_idx + 1;
        cursor = close_idx;

        if let Some(value) = func(&s[open_idx + 2..close_idx - 1]) {

            s.replace_range(open_idx..close_idx, &value);

            let repl_len = close_idx - open_idx;
            let repl_diff = value.len() as isize - repl_len as isize;
            cursor = cursor.checked_add_signed(repl_diff).unwrap();

        }

    }

}
