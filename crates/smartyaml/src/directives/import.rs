//! `!import` and `!import_yaml`.

use crate::context::LoadContext;
use crate::directive::{Directive, DirectiveCall};
use crate::draft::Draft;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::merge::deep_merge;
use crate::validation::{ArgCount, validate_arg_count, validate_filename};
use std::path::{Path, PathBuf};

/// Parameters of a directive that takes one filename.
#[derive(Debug, Clone)]
pub struct FileParams {
    pub filename: String,
    /// Canonical path, filled in by the security checks
    pub path: PathBuf,
}

pub(crate) fn extract_filename(
    call: &DirectiveCall<'_>,
    ctx: &LoadContext,
    eval: &mut Evaluator<'_>,
) -> Result<FileParams> {
    let args = call.arguments(ctx, eval)?;
    validate_arg_count(args.len(), ArgCount::Exact(1), call.name)?;
    Ok(FileParams {
        filename: call.string_argument(&args[0], "filename")?,
        path: PathBuf::new(),
    })
}

/// Directory of a canonical file path.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map_or_else(PathBuf::new, Path::to_path_buf)
}

/// Merge the call's local overrides onto an imported document.
///
/// Overrides are deep-merged onto a mapping; anything else is replaced.
pub(crate) fn apply_overrides(
    imported: Draft,
    call: &DirectiveCall<'_>,
    ctx: &LoadContext,
    eval: &mut Evaluator<'_>,
) -> Result<Draft> {
    let Some(node) = call.overrides() else {
        return Ok(imported);
    };
    let overrides = eval.evaluate(node, ctx)?;
    Ok(match imported {
        Draft::Mapping(_) => deep_merge(imported, overrides),
        _ => overrides,
    })
}

/// `!import file.txt`: the file's text, verbatim.
pub struct ImportDirective;

impl Directive for ImportDirective {
    type Params = FileParams;

    fn name(&self) -> &'static str {
        "import"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<FileParams> {
        extract_filename(call, ctx, eval)
    }

    fn validate_parameters(&self, params: &FileParams) -> Result<()> {
        validate_filename(&params.filename, "import")
    }

    fn apply_security_checks(&self, params: &mut FileParams, ctx: &LoadContext) -> Result<()> {
        params.path = ctx.resolve_existing(&params.filename)?;
        Ok(())
    }

    fn execute(
        &self,
        params: FileParams,
        _call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        _eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        ctx.read_file(&params.path).map(Draft::String)
    }

    fn context_params(&self, params: &FileParams) -> Vec<(&'static str, String)> {
        vec![("filename", params.filename.clone())]
    }
}

/// `!import_yaml file.yaml`, or `!import_yaml(file.yaml)` with a mapping of
/// local overrides.
pub struct ImportYamlDirective;

impl Directive for ImportYamlDirective {
    type Params = FileParams;

    fn name(&self) -> &'static str {
        "import_yaml"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<FileParams> {
        extract_filename(call, ctx, eval)
    }

    fn validate_parameters(&self, params: &FileParams) -> Result<()> {
        validate_filename(&params.filename, "import_yaml")
    }

    fn apply_security_checks(&self, params: &mut FileParams, ctx: &LoadContext) -> Result<()> {
        params.path = ctx.resolve_existing(&params.filename)?;
        Ok(())
    }

    fn execute(
        &self,
        params: FileParams,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        let imported = eval.load_yaml_file(&params.path, parent_dir(&params.path), ctx)?;
        apply_overrides(imported, call, ctx, eval)
    }

    fn context_params(&self, params: &FileParams) -> Vec<(&'static str, String)> {
        vec![("filename", params.filename.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::test_support::{evaluate_in, field};
    use crate::error::ErrorKind;
    use crate::options::LoadOptions;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_import_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("motd.txt"), "Hello\nWorld\n").unwrap();

        let draft = evaluate_in("motd: !import motd.txt\n", dir.path(), &LoadOptions::new()).unwrap();
        assert_eq!(field(&draft, "motd"), Draft::from("Hello\nWorld\n"));
    }

    #[test]
    fn test_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = evaluate_in("x: !import nope.txt\n", dir.path(), &LoadOptions::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert!(err.to_string().contains("filename=nope.txt"));
    }

    #[test]
    fn test_import_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.txt"), "x".repeat(64)).unwrap();
        let options = LoadOptions::new().with_max_file_size(16);
        let err = evaluate_in("x: !import big.txt\n", dir.path(), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceLimit);
    }

    #[test]
    fn test_import_empty_filename() {
        let dir = tempfile::tempdir().unwrap();
        let err = evaluate_in("x: !import ''\n", dir.path(), &LoadOptions::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Constructor);
    }

    #[test]
    fn test_import_yaml_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("db.yaml"),
            "host: localhost\nport: 5432\nreplicas: [a]\n",
        )
        .unwrap();

        let draft = evaluate_in(
            "db: !import_yaml(db.yaml)\n  host: prod\n  replicas: !extend [b]\n",
            dir.path(),
            &LoadOptions::new(),
        )
        .unwrap();
        let db = field(&draft, "db");
        assert_eq!(field(&db, "host"), Draft::from("prod"));
        assert_eq!(field(&db, "port"), Draft::Integer(5432));
        assert_eq!(
            field(&db, "replicas"),
            Draft::Sequence(vec![Draft::from("a"), Draft::from("b")])
        );
    }

    #[test]
    fn test_import_yaml_resolves_relative_to_imported_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/outer.yaml"), "inner: !import_yaml inner.yaml\n").unwrap();
        fs::write(dir.path().join("sub/inner.yaml"), "value: 42\n").unwrap();

        let draft = evaluate_in(
            "outer: !import_yaml sub/outer.yaml\n",
            dir.path(),
            &LoadOptions::new(),
        )
        .unwrap();
        let inner = field(&field(&draft, "outer"), "inner");
        assert_eq!(field(&inner, "value"), Draft::Integer(42));
    }

    #[test]
    fn test_overrides_replace_non_mapping_import() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("list.yaml"), "- a\n- b\n").unwrap();

        let draft = evaluate_in(
            "x: !import_yaml(list.yaml)\n  k: v\n",
            dir.path(),
            &LoadOptions::new(),
        )
        .unwrap();
        assert_eq!(field(&field(&draft, "x"), "k"), Draft::from("v"));
    }
}
