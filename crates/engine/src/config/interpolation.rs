//! `{dotted.key}` references inside configuration values.
//!
//! A string such as `"/data/{project}/{sample.name}.fq"` is rewritten using
//! other values of the same document. References are resolved against the
//! whole document, so they may point anywhere in it, and chains of references
//! resolve over repeated passes.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Upper bound on passes, which also stops reference cycles.
const MAX_PASSES: usize = 8;

static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_-]*(?:\.[A-Za-z0-9_-]+)*)\}").expect("valid reference regex"));

/// Resolve references in every string of `document`.
///
/// A string that is exactly one reference to a number or boolean takes that
/// value with its type. References to strings are spliced in place. References
/// to mappings, sequences, null or unknown keys are left as written.
pub fn interpolate(document: &mut Value) {
    for _ in 0..MAX_PASSES {
        let snapshot = document.clone();
        if !interpolate_value(document, &snapshot) {
            break;
        }
    }
}

fn interpolate_value(value: &mut Value, root: &Value) -> bool {
    match value {
        Value::String(text) => match interpolate_text(text, root) {
            Some(replacement) => {
                *value = replacement;
                true
            }
            None => false,
        },
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |changed, item| interpolate_value(item, root) | changed),
        Value::Object(map) => map
            .values_mut()
            .fold(false, |changed, item| interpolate_value(item, root) | changed),
        _ => false,
    }
}

fn interpolate_text(text: &str, root: &Value) -> Option<Value> {
    if let Some(captures) = REFERENCE.captures(text)
        && captures.get(0).is_some_and(|whole| whole.as_str() == text)
        && let Some(target) = lookup(root, &captures[1])
        && (target.is_number() || target.is_boolean())
    {
        return Some(target.clone());
    }

    let replaced = REFERENCE.replace_all(text, |captures: &Captures| match lookup(root, &captures[1]) {
        Some(Value::String(target)) => target.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => captures[0].to_string(),
    });
    (replaced != text).then(|| Value::String(replaced.into_owned()))
}

/// Follow a dotted path through mappings and sequence indices.
fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splices_nested_references() {
        let mut document = json!({
            "project": "p1",
            "sample": {"name": "s1", "files": ["/data/{project}/{sample.name}_R1.fq"]},
            "library_folder": "{project}/{sample.name}"
        });
        interpolate(&mut document);
        assert_eq!(document["library_folder"], json!("p1/s1"));
        assert_eq!(document["sample"]["files"][0], json!("/data/p1/s1_R1.fq"));
    }

    #[test]
    fn chained_references_resolve() {
        let mut document = json!({"a": "x", "b": "{a}-y", "c": "{b}-z"});
        interpolate(&mut document);
        assert_eq!(document["c"], json!("x-y-z"));
    }

    #[test]
    fn whole_reference_keeps_scalar_type() {
        let mut document = json!({"depth": 10, "keep": true, "params": {"min": "{depth}", "flag": "{keep}", "label": "d{depth}"}});
        interpolate(&mut document);
        assert_eq!(document["params"]["min"], json!(10));
        assert_eq!(document["params"]["flag"], json!(true));
        assert_eq!(document["params"]["label"], json!("d10"));
    }

    #[test]
    fn unknown_and_structured_references_stay_verbatim() {
        let mut document = json!({"sample": {"name": "s1"}, "a": "{missing.key}", "b": "{sample}", "c": "${sample_name}"});
        interpolate(&mut document);
        assert_eq!(document["a"], json!("{missing.key}"));
        assert_eq!(document["b"], json!("{sample}"));
        assert_eq!(document["c"], json!("${sample_name}"));
    }

    #[test]
    fn cycles_terminate() {
        let mut document = json!({"a": "{b}", "b": "{a}"});
        interpolate(&mut document);
        assert!(document["a"].is_string());
    }

    #[test]
    fn sequence_indices_resolve() {
        let mut document = json!({"files": ["r1.fq", "r2.fq"], "first": "{files.0}"});
        interpolate(&mut document);
        assert_eq!(document["first"], json!("r1.fq"));
    }
}
