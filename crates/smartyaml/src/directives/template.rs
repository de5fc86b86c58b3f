//! `!template name`: a named document from the template root.

use crate::context::LoadContext;
use crate::directive::{Directive, DirectiveCall};
use crate::directives::import::apply_overrides;
use crate::draft::Draft;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::validation::{ArgCount, ensure_contained, validate_arg_count, validate_template_name};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TemplateParams {
    pub name: String,
    /// Canonical template root
    pub root: PathBuf,
    /// Canonical template file
    pub path: PathBuf,
}

pub struct TemplateDirective;

impl Directive for TemplateDirective {
    type Params = TemplateParams;

    fn name(&self) -> &'static str {
        "template"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<TemplateParams> {
        let args = call.arguments(ctx, eval)?;
        validate_arg_count(args.len(), ArgCount::Exact(1), call.name)?;
        Ok(TemplateParams {
            name: call.string_argument(&args[0], "template name")?,
            root: PathBuf::new(),
            path: PathBuf::new(),
        })
    }

    fn validate_parameters(&self, params: &TemplateParams) -> Result<()> {
        validate_template_name(&params.name, "template")
    }

    fn apply_security_checks(&self, params: &mut TemplateParams, ctx: &LoadContext) -> Result<()> {
        let root = ctx.template_root()?;
        let path = ctx.canonicalize(&root.join(format!("{}.yaml", params.name)))?;
        ensure_contained(&path, &root)?;
        params.root = root;
        params.path = path;
        Ok(())
    }

    fn execute(
        &self,
        params: TemplateParams,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        let loaded = eval.load_yaml_file(&params.path, params.root, ctx)?;
        apply_overrides(loaded, call, ctx, eval)
    }

    fn context_params(&self, params: &TemplateParams) -> Vec<(&'static str, String)> {
        vec![("template_name", params.name.clone())]
    }
}
