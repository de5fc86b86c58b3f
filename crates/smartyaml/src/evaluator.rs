//! Tree-walking evaluation of parsed documents.
//!
//! The evaluator turns a [`YamlNode`] tree into a [`Draft`], handing every
//! local tag to the [`DirectiveRegistry`]. File directives call back into
//! [`Evaluator::load_yaml_file`] for nested documents; all of them share the
//! one [`LoadState`] of the top-level load.

use crate::context::{LoadContext, LoadState};
use crate::directive::{DirectiveCall, DirectiveRegistry};
use crate::draft::{Draft, DraftMapping};
use crate::error::{Error, Result};
use crate::merge::{apply_merge_key, apply_template_inheritance};
use crate::validation::{check_recursion_limit, ensure_contained, validate_template_name};
use crate::vars::extract_vars_metadata;
use once_cell::sync::Lazy;
use regex::Regex;
use smartyaml_parser::{
    NodeKind, ScalarStyle, ScalarValue, YamlHashEntry, YamlNode, harvest_anchors,
    parse_with_anchors,
};
use std::path::{Path, PathBuf};

/// `!template(name)` or `!template name`, for the anchor pre-scan.
static TEMPLATE_REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!template(?:\(\s*([A-Za-z_][A-Za-z0-9_-]*)\s*\)|[ \t]+([A-Za-z_][A-Za-z0-9_-]*))")
        .expect("valid regex")
});

const MERGE_KEY: &str = "<<";

pub struct Evaluator<'a> {
    registry: &'a DirectiveRegistry,
    state: &'a mut LoadState,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a DirectiveRegistry, state: &'a mut LoadState) -> Self {
        Self { registry, state }
    }

    pub fn registry(&self) -> &'a DirectiveRegistry {
        self.registry
    }

    pub fn state(&self) -> &LoadState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut LoadState {
        &mut *self.state
    }

    /// Evaluate one node.
    pub fn evaluate(&mut self, node: &YamlNode, ctx: &LoadContext) -> Result<Draft> {
        if let Some(tag) = node.tag.as_ref().filter(|tag| tag.is_local()) {
            let call = DirectiveCall::new(&tag.suffix, node, &tag.source_info);
            let registry = self.registry;
            return registry.dispatch(&call, ctx, self);
        }

        match &node.kind {
            NodeKind::Scalar { .. } => Ok(node.resolved_scalar().map_or(Draft::Null, scalar_draft)),
            NodeKind::Sequence(items) => Ok(Draft::Sequence(
                items
                    .iter()
                    .map(|item| self.evaluate(item, ctx))
                    .collect::<Result<_>>()?,
            )),
            NodeKind::Mapping(entries) => self.evaluate_mapping(entries, ctx),
        }
    }

    fn evaluate_mapping(&mut self, entries: &[YamlHashEntry], ctx: &LoadContext) -> Result<Draft> {
        let mut local = DraftMapping::new();
        let mut merge_sources: Vec<DraftMapping> = Vec::new();
        let mut has_merge_key = false;

        for entry in entries {
            if is_merge_key(&entry.key) {
                has_merge_key = true;
                let merged = self.evaluate(&entry.value, ctx)?;
                collect_merge_sources(merged, &mut merge_sources)?;
                continue;
            }
            let key = self.mapping_key(&entry.key, ctx)?;
            let value = self.evaluate(&entry.value, ctx)?;
            local.insert(key, value);
        }

        if has_merge_key {
            Ok(Draft::Mapping(apply_merge_key(merge_sources, local)))
        } else {
            Ok(Draft::Mapping(local))
        }
    }

    /// Mapping keys are strings; untagged scalars keep their source text.
    fn mapping_key(&mut self, key: &YamlNode, ctx: &LoadContext) -> Result<String> {
        if let (None, Some(text)) = (&key.tag, key.as_scalar_str()) {
            return Ok(text.to_string());
        }
        let evaluated = self.evaluate(key, ctx)?;
        if let Draft::Deferred(deferred) = &evaluated {
            return Err(Error::constructor(format!(
                "Mapping key '{}' at line {} uses variables that are only known after loading; \
                 pass them through the `variables` option instead",
                deferred.text, key.source_info.line
            )));
        }
        evaluated.scalar_text().ok_or_else(|| {
            Error::constructor(format!(
                "Mapping keys must be scalars, got {} at line {}",
                evaluated.type_name(),
                key.source_info.line
            ))
        })
    }

    /// Parse and evaluate a document.
    ///
    /// Anchors of the templates it references are harvested first. After
    /// evaluation, `__template` inheritance is applied and the document's
    /// `__vars` are added to the shared state.
    pub fn evaluate_document(
        &mut self,
        content: &str,
        source_name: Option<&str>,
        ctx: &LoadContext,
    ) -> Result<Draft> {
        self.harvest_template_anchors(content, ctx);

        let node = parse_with_anchors(content, source_name, &self.state.anchors)?;
        let draft = apply_template_inheritance(self.evaluate(&node, ctx)?);
        self.state.accumulate_variables(extract_vars_metadata(&draft));
        Ok(draft)
    }

    /// Load a YAML file as a nested document.
    ///
    /// `path` must be canonical. Relative references inside the file resolve
    /// against `base_path`.
    pub fn load_yaml_file(
        &mut self,
        path: &Path,
        base_path: PathBuf,
        ctx: &LoadContext,
    ) -> Result<Draft> {
        check_recursion_limit(&ctx.import_stack, path, ctx.max_recursion_depth)?;
        let content = ctx.read_file(path)?;
        let child = ctx.child(path.to_path_buf(), base_path);
        let source_name = path.display().to_string();

        let draft = self.evaluate_document(&content, Some(&source_name), &child)?;
        tracing::debug!(
            path = %path.display(),
            depth = child.import_stack.len(),
            "loaded YAML file"
        );
        Ok(draft)
    }

    /// Pre-scan `content` for `!template` references and harvest the anchors
    /// of every template found. Failures only cost the anchors.
    fn harvest_template_anchors(&mut self, content: &str, ctx: &LoadContext) {
        if !content.contains("!template") {
            return;
        }
        for caps in TEMPLATE_REFERENCE_PATTERN.captures_iter(content) {
            let Some(name) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
                continue;
            };
            match read_template_source(name, ctx) {
                Ok((path, text)) => {
                    let source_name = path.display().to_string();
                    let anchors = harvest_anchors(&text, Some(&source_name));
                    tracing::debug!(
                        template = name,
                        anchors = anchors.len(),
                        "harvested template anchors"
                    );
                    self.state.anchors.merge(anchors);
                }
                Err(err) => {
                    tracing::debug!(template = name, error = %err, "template anchor pre-scan skipped");
                }
            }
        }
    }
}

fn read_template_source(name: &str, ctx: &LoadContext) -> Result<(PathBuf, String)> {
    validate_template_name(name, "template")?;
    let root = ctx.template_root()?;
    let path = ctx.canonicalize(&root.join(format!("{name}.yaml")))?;
    ensure_contained(&path, &root)?;
    let text = ctx.read_file(&path)?;
    Ok((path, text))
}

fn is_merge_key(key: &YamlNode) -> bool {
    key.tag.is_none()
        && matches!(
            &key.kind,
            NodeKind::Scalar { value, style: ScalarStyle::Plain } if value == MERGE_KEY
        )
}

fn collect_merge_sources(value: Draft, sources: &mut Vec<DraftMapping>) -> Result<()> {
    match value {
        Draft::Null => Ok(()),
        Draft::Mapping(map) => {
            sources.push(map);
            Ok(())
        }
        Draft::Sequence(items) => {
            for item in items {
                match item {
                    Draft::Mapping(map) => sources.push(map),
                    Draft::Null => {}
                    other => return Err(merge_key_error(&other)),
                }
            }
            Ok(())
        }
        other => Err(merge_key_error(&other)),
    }
}

fn merge_key_error(value: &Draft) -> Error {
    Error::constructor(format!(
        "Merge key '<<' expects a mapping or a list of mappings, got {}",
        value.type_name()
    ))
}

fn scalar_draft(value: ScalarValue) -> Draft {
    match value {
        ScalarValue::Null => Draft::Null,
        ScalarValue::Bool(b) => Draft::Bool(b),
        ScalarValue::Integer(i) => Draft::Integer(i),
        ScalarValue::Float(f) => Draft::Float(f),
        ScalarValue::String(s) => Draft::String(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::options::LoadOptions;
    use pretty_assertions::assert_eq;

    fn evaluate_str(content: &str) -> Result<Draft> {
        let registry = DirectiveRegistry::with_defaults();
        let mut state = LoadState::new();
        let ctx = LoadContext::from_options(&LoadOptions::new(), PathBuf::from("/"));
        Evaluator::new(&registry, &mut state).evaluate_document(content, None, &ctx)
    }

    #[test]
    fn test_plain_document() {
        let draft = evaluate_str("name: app\nport: 8080\ndebug: yes\nratio: 0.5\nnothing: ~\n")
            .unwrap();
        let map = draft.as_mapping().unwrap();
        assert_eq!(map["name"], Draft::from("app"));
        assert_eq!(map["port"], Draft::Integer(8080));
        assert_eq!(map["debug"], Draft::Bool(true));
        assert_eq!(map["ratio"], Draft::Float(0.5));
        assert_eq!(map["nothing"], Draft::Null);
    }

    #[test]
    fn test_keys_keep_source_text() {
        let draft = evaluate_str("1: one\ntrue: yes\n").unwrap();
        let keys: Vec<&str> = draft.as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["1", "true"]);
    }

    #[test]
    fn test_merge_key() {
        let draft = evaluate_str(
            "base: &base\n  a: 1\n  b: 2\nother: &other\n  b: 3\n  c: 3\n\
             child:\n  <<: [*base, *other]\n  c: 4\n",
        )
        .unwrap();
        let child = draft.as_mapping().unwrap()["child"].as_mapping().unwrap().clone();
        assert_eq!(child["a"], Draft::Integer(1));
        assert_eq!(child["b"], Draft::Integer(2));
        assert_eq!(child["c"], Draft::Integer(4));
    }

    #[test]
    fn test_merge_key_rejects_scalars() {
        let err = evaluate_str("child:\n  <<: 5\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Constructor);
    }

    #[test]
    fn test_deferred_mapping_key_is_rejected() {
        let err = evaluate_str("__vars:\n  k: name\n? !expand '{{k}}'\n: 1\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Constructor);
        let message = err.to_string();
        assert!(message.contains("'{{k}}'"));
        assert!(message.contains("`variables` option"));
    }

    #[test]
    fn test_expand_mapping_key_with_caller_variables() {
        let registry = DirectiveRegistry::with_defaults();
        let mut state = LoadState::new();
        let options = LoadOptions::new().with_variable("k", "name");
        let ctx = LoadContext::from_options(&options, PathBuf::from("/"));
        let draft = Evaluator::new(&registry, &mut state)
            .evaluate_document("? !expand '{{k}}'\n: 1\n", None, &ctx)
            .unwrap();
        assert_eq!(draft.as_mapping().unwrap()["name"], Draft::Integer(1));
    }

    #[test]
    fn test_template_inheritance_and_vars() {
        let registry = DirectiveRegistry::with_defaults();
        let mut state = LoadState::new();
        let ctx = LoadContext::from_options(&LoadOptions::new(), PathBuf::from("/"));
        let draft = Evaluator::new(&registry, &mut state)
            .evaluate_document(
                "__vars:\n  env: dev\n__template:\n  name: base\n  tags: [a]\ntags: !extend [b]\n",
                None,
                &ctx,
            )
            .unwrap();

        let map = draft.as_mapping().unwrap();
        assert_eq!(map["name"], Draft::from("base"));
        assert_eq!(
            map["tags"],
            Draft::Sequence(vec![Draft::from("a"), Draft::from("b")])
        );
        assert_eq!(state.variables.get("env").map(String::as_str), Some("dev"));
    }

    #[test]
    fn test_template_prescan_pattern() {
        let names: Vec<String> = TEMPLATE_REFERENCE_PATTERN
            .captures_iter("a: !template(base)\nb: !template other\nc: !template( x_1 )\n")
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["base", "other", "x_1"]);
    }

    #[test]
    fn test_prescan_without_template_root_is_harmless() {
        let registry = DirectiveRegistry::with_defaults();
        let mut state = LoadState::new();
        let options = LoadOptions::new().with_template_path("/nonexistent/templates");
        let ctx = LoadContext::from_options(&options, PathBuf::from("/"));
        let mut evaluator = Evaluator::new(&registry, &mut state);
        evaluator.harvest_template_anchors("a: !template(base)\n", &ctx);
        assert!(evaluator.state().anchors.is_empty());
    }

    #[test]
    fn test_load_yaml_file_detects_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("self.yaml");
        std::fs::write(&path, "me: !import_yaml self.yaml\n").unwrap();
        let path = path.canonicalize().unwrap();

        let registry = DirectiveRegistry::with_defaults();
        let mut state = LoadState::new();
        let ctx = LoadContext::from_options(&LoadOptions::new(), dir.path().to_path_buf());
        let err = Evaluator::new(&registry, &mut state)
            .load_yaml_file(&path, dir.path().to_path_buf(), &ctx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecursionLimit);
        assert!(err.to_string().contains("Circular import detected"));
    }
}
