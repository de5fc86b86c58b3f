//! `!include_if [CONDITION, file]` and `!include_yaml_if [CONDITION, file]`.
//!
//! The condition names an environment variable. When its value is not
//! truthy the directive yields null and never touches the file system.

use crate::context::LoadContext;
use crate::directive::{Directive, DirectiveCall};
use crate::directives::import::parent_dir;
use crate::draft::Draft;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::validation::{
    ArgCount, is_truthy, validate_arg_count, validate_env_var_name, validate_filename,
};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ConditionalParams {
    pub condition: String,
    pub filename: String,
    /// Canonical path; only resolved when the condition holds
    pub path: Option<PathBuf>,
}

fn extract(
    call: &DirectiveCall<'_>,
    ctx: &LoadContext,
    eval: &mut Evaluator<'_>,
) -> Result<ConditionalParams> {
    let args = call.arguments(ctx, eval)?;
    validate_arg_count(args.len(), ArgCount::Exact(2), call.name)?;
    Ok(ConditionalParams {
        condition: call.string_argument(&args[0], "condition")?,
        filename: call.string_argument(&args[1], "filename")?,
        path: None,
    })
}

fn validate(params: &ConditionalParams, directive: &str) -> Result<()> {
    validate_env_var_name(&params.condition, directive)?;
    validate_filename(&params.filename, directive)
}

fn resolve_if_enabled(params: &mut ConditionalParams, ctx: &LoadContext) -> Result<()> {
    if is_truthy(ctx.runtime.env_var(&params.condition).as_deref()) {
        params.path = Some(ctx.resolve_existing(&params.filename)?);
    }
    Ok(())
}

fn context(params: &ConditionalParams) -> Vec<(&'static str, String)> {
    vec![
        ("condition", params.condition.clone()),
        ("filename", params.filename.clone()),
    ]
}

pub struct IncludeIfDirective;

impl Directive for IncludeIfDirective {
    type Params = ConditionalParams;

    fn name(&self) -> &'static str {
        "include_if"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<ConditionalParams> {
        extract(call, ctx, eval)
    }

    fn validate_parameters(&self, params: &ConditionalParams) -> Result<()> {
        validate(params, "include_if")
    }

    fn apply_security_checks(&self, params: &mut ConditionalParams, ctx: &LoadContext) -> Result<()> {
        resolve_if_enabled(params, ctx)
    }

    fn execute(
        &self,
        params: ConditionalParams,
        _call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        _eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        match params.path {
            Some(path) => ctx.read_file(&path).map(Draft::String),
            None => Ok(Draft::Null),
        }
    }

    fn context_params(&self, params: &ConditionalParams) -> Vec<(&'static str, String)> {
        context(params)
    }
}

pub struct IncludeYamlIfDirective;

impl Directive for IncludeYamlIfDirective {
    type Params = ConditionalParams;

    fn name(&self) -> &'static str {
        "include_yaml_if"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<ConditionalParams> {
        extract(call, ctx, eval)
    }

    fn validate_parameters(&self, params: &ConditionalParams) -> Result<()> {
        validate(params, "include_yaml_if")
    }

    fn apply_security_checks(&self, params: &mut ConditionalParams, ctx: &LoadContext) -> Result<()> {
        resolve_if_enabled(params, ctx)
    }

    fn execute(
        &self,
        params: ConditionalParams,
        _call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        match params.path {
            Some(path) => eval.load_yaml_file(&path, parent_dir(&path), ctx),
            None => Ok(Draft::Null),
        }
    }

    fn context_params(&self, params: &ConditionalParams) -> Vec<(&'static str, String)> {
        context(params)
    }
}
