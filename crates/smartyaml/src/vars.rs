//! `{{name}}` variable substitution.
//!
//! Variables come from two places: the caller (`LoadOptions::variables`)
//! and `__vars` blocks in the loaded documents. Caller variables always win.
//! Substitution is flat: a placeholder is replaced by the variable's text,
//! and nothing else is evaluated.

use crate::context::LoadContext;
use crate::draft::Draft;
use crate::error::{Error, ErrorContext, Result};
use crate::options::{MAX_VARIABLE_EXPANSION_PASSES, VARS_KEY, Variables};
use crate::value::Value;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use smartyaml_parser::SourceInfo;

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("valid regex"));

/// Variables in text form, by name.
pub type VariablesMap = IndexMap<String, String>;

/// Names referenced by placeholders in `text`, in order, without duplicates.
pub fn placeholder_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_PATTERN.captures_iter(text) {
        let name = caps[1].trim().to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Replace every placeholder whose variable is known.
///
/// Returns the new text and the names that were not found; their
/// placeholders are left untouched.
pub fn substitute_partial(text: &str, vars: &VariablesMap) -> (String, Vec<String>) {
    let mut missing: Vec<String> = Vec::new();
    let result = PLACEHOLDER_PATTERN.replace_all(text, |caps: &Captures<'_>| {
        let name = caps[1].trim();
        match vars.get(name) {
            Some(value) => value.clone(),
            None => {
                if !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
                caps[0].to_string()
            }
        }
    });
    (result.into_owned(), missing)
}

/// Replace every placeholder, failing with the missing names.
pub fn substitute(text: &str, vars: &VariablesMap) -> Result<String> {
    let (result, missing) = substitute_partial(text, vars);
    if missing.is_empty() {
        Ok(result)
    } else {
        Err(Error::MissingVariable { names: missing })
    }
}

/// Text form of caller variables. Collections have no text form and are
/// dropped.
pub fn stringify_variables(vars: &Variables) -> VariablesMap {
    vars.iter()
        .filter_map(|(name, value)| match value.to_text() {
            Some(text) => Some((name.clone(), text)),
            None => {
                tracing::debug!(
                    variable = name.as_str(),
                    kind = value.type_name(),
                    "ignoring non-scalar variable"
                );
                None
            }
        })
        .collect()
}

/// Variables declared in a document's top-level `__vars` mapping.
///
/// Scalars are stringified and deferred expansions keep their raw text so
/// they can refer to other variables. Collections are skipped.
pub fn extract_vars_metadata(document: &Draft) -> VariablesMap {
    let Some(Draft::Mapping(vars)) = document.as_mapping().and_then(|root| root.get(VARS_KEY))
    else {
        return VariablesMap::new();
    };

    vars.iter()
        .filter_map(|(name, value)| {
            let text = match value {
                Draft::Deferred(deferred) => Some(deferred.text.clone()),
                other => other.scalar_text(),
            };
            text.map(|t| (name.clone(), t))
        })
        .collect()
}

/// Combine discovered and caller variables; caller values win.
pub fn merge_variables(discovered: &VariablesMap, caller: &VariablesMap) -> VariablesMap {
    let mut merged = discovered.clone();
    for (name, value) in caller {
        merged.insert(name.clone(), value.clone());
    }
    merged
}

/// Resolve variables that reference other variables.
///
/// Runs a bounded number of passes; unresolvable references stay as
/// placeholders.
pub fn expand_variables_recursively(mut vars: VariablesMap) -> VariablesMap {
    for _ in 0..MAX_VARIABLE_EXPANSION_PASSES {
        let snapshot = vars.clone();
        let mut changed = false;
        for value in vars.values_mut() {
            if !PLACEHOLDER_PATTERN.is_match(value) {
                continue;
            }
            let (expanded, _) = substitute_partial(value, &snapshot);
            if expanded != *value {
                *value = expanded;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    vars
}

/// Finish a draft: substitute every deferred expansion and degrade any
/// unconsumed `!extend` marker into its plain sequence.
///
/// All missing variable names across the document are reported together.
/// A name whose value still holds placeholders after expansion counts as
/// missing too. The error points at the first failing `!expand`.
pub fn resolve_deferred(draft: Draft, vars: &VariablesMap, ctx: &LoadContext) -> Result<Value> {
    let mut resolver = DeferredResolver {
        vars,
        missing: Vec::new(),
        first_failure: None,
        resolved: 0,
    };
    let value = resolver.resolve(draft);

    if !resolver.missing.is_empty() {
        let err = Error::MissingVariable {
            names: resolver.missing,
        };
        return Err(err.with_context(ErrorContext {
            directive: "expand".into(),
            location: resolver.first_failure,
            base_path: Some(ctx.base_path.clone()),
            template_path: ctx.template_root.clone(),
            max_recursion_depth: ctx.max_recursion_depth,
            ..Default::default()
        }));
    }
    if resolver.resolved > 0 {
        tracing::debug!(count = resolver.resolved, "resolved deferred expansions");
    }
    Ok(value)
}

struct DeferredResolver<'a> {
    vars: &'a VariablesMap,
    missing: Vec<String>,
    first_failure: Option<SourceInfo>,
    resolved: usize,
}

impl DeferredResolver<'_> {
    fn resolve(&mut self, draft: Draft) -> Value {
        match draft {
            Draft::Null => Value::Null,
            Draft::Bool(b) => Value::Bool(b),
            Draft::Integer(i) => Value::Integer(i),
            Draft::Float(f) => Value::Float(f),
            Draft::String(s) => Value::String(s),
            Draft::Sequence(items) | Draft::Extend(items) => {
                Value::Sequence(items.into_iter().map(|item| self.resolve(item)).collect())
            }
            Draft::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(key, value)| (key, self.resolve(value)))
                    .collect(),
            ),
            Draft::Deferred(deferred) => {
                let (text, _) = substitute_partial(&deferred.text, self.vars);
                let unresolved = placeholder_names(&text);
                if !unresolved.is_empty() && self.first_failure.is_none() {
                    self.first_failure = Some(deferred.source_info);
                }
                for name in unresolved {
                    if !self.missing.contains(&name) {
                        self.missing.push(name);
                    }
                }
                self.resolved += 1;
                Value::String(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{DeferredExpansion, DraftMapping};
    use crate::error::ErrorKind;
    use crate::options::LoadOptions;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn vars(pairs: &[(&str, &str)]) -> VariablesMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ctx() -> LoadContext {
        LoadContext::from_options(&LoadOptions::new(), PathBuf::from("/"))
    }

    fn deferred(text: &str) -> Draft {
        Draft::Deferred(DeferredExpansion {
            text: text.to_string(),
            source_info: SourceInfo::default(),
        })
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(
            placeholder_names("{{a}}-{{ b }}-{{a}}"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(placeholder_names("no placeholders {here}").is_empty());
    }

    #[test]
    fn test_substitute_trims_names() {
        let v = vars(&[("name", "api"), ("env", "prod")]);
        assert_eq!(substitute("{{ name }}-{{env}}", &v).unwrap(), "api-prod");
    }

    #[test]
    fn test_substitute_reports_missing() {
        let v = vars(&[("name", "api")]);
        let err = substitute("{{name}} {{region}} {{zone}}", &v).unwrap_err();
        match err {
            Error::MissingVariable { names } => {
                assert_eq!(names, vec!["region".to_string(), "zone".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_caller_wins() {
        let discovered = vars(&[("env", "dev"), ("region", "eu")]);
        let caller = vars(&[("env", "prod")]);
        let merged = merge_variables(&discovered, &caller);
        assert_eq!(merged.get("env").map(String::as_str), Some("prod"));
        assert_eq!(merged.get("region").map(String::as_str), Some("eu"));
    }

    #[test]
    fn test_recursive_expansion() {
        let v = vars(&[
            ("full", "{{service}}.{{domain}}"),
            ("service", "api-{{env}}"),
            ("env", "prod"),
            ("domain", "example.com"),
            ("loop", "{{loop}}"),
        ]);
        let expanded = expand_variables_recursively(v);
        assert_eq!(expanded["full"], "api-prod.example.com");
        assert_eq!(expanded["loop"], "{{loop}}");
    }

    #[test]
    fn test_extract_vars_metadata() {
        let mut block = DraftMapping::new();
        block.insert("name".into(), Draft::from("api"));
        block.insert("port".into(), Draft::Integer(8080));
        block.insert("host".into(), deferred("{{name}}.local"));
        block.insert("list".into(), Draft::Sequence(vec![Draft::Integer(1)]));
        let mut root = DraftMapping::new();
        root.insert(VARS_KEY.into(), Draft::Mapping(block));

        let extracted = extract_vars_metadata(&Draft::Mapping(root));
        assert_eq!(
            extracted,
            vars(&[("name", "api"), ("port", "8080"), ("host", "{{name}}.local")])
        );
        assert!(extract_vars_metadata(&Draft::Null).is_empty());
    }

    #[test]
    fn test_resolve_deferred() {
        let mut root = DraftMapping::new();
        root.insert("greeting".into(), deferred("Hello {{name}}"));
        root.insert(
            "tags".into(),
            Draft::Extend(vec![Draft::from("a"), Draft::from("b")]),
        );
        let value =
            resolve_deferred(Draft::Mapping(root), &vars(&[("name", "World")]), &ctx()).unwrap();

        assert_eq!(
            value.get("greeting").and_then(Value::as_str),
            Some("Hello World")
        );
        assert_eq!(
            value.get("tags"),
            Some(&Value::Sequence(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn test_resolve_deferred_lists_all_missing() {
        let draft = Draft::Sequence(vec![deferred("{{a}}"), deferred("{{b}} {{a}}")]);
        let err = resolve_deferred(draft, &VariablesMap::new(), &ctx()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingVariable);
        assert!(err.to_string().contains("a, b"));
    }

    #[test]
    fn test_resolve_deferred_reports_unexpanded_values() {
        let v = expand_variables_recursively(vars(&[
            ("a", "{{nope}}"),
            ("loop", "{{loop}}"),
        ]));
        let draft = Draft::Sequence(vec![deferred("x={{a}}"), deferred("{{loop}}")]);
        let err = resolve_deferred(draft, &v, &ctx()).unwrap_err();
        match err.root() {
            Error::MissingVariable { names } => {
                assert_eq!(names, &vec!["nope".to_string(), "loop".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_deferred_points_at_first_failure() {
        let located = Draft::Deferred(DeferredExpansion {
            text: "{{missing}}".to_string(),
            source_info: SourceInfo {
                line: 4,
                col: 7,
                ..Default::default()
            },
        });
        let draft = Draft::Sequence(vec![deferred("{{known}}"), located]);
        let err = resolve_deferred(draft, &vars(&[("known", "1")]), &ctx()).unwrap_err();

        let context = err.context().expect("error context");
        assert_eq!(context.directive, "expand");
        assert_eq!(context.location.as_ref().map(|l| l.line), Some(4));
        assert!(err.to_string().contains("line 4:7"));
    }
}
