//! `!env NAME` and `!env [NAME, default]`.

use crate::context::LoadContext;
use crate::directive::{Directive, DirectiveCall};
use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::validation::{ArgCount, validate_arg_count, validate_env_var_name};

#[derive(Debug, Clone)]
pub struct EnvParams {
    pub name: String,
    /// Returned as-is when the variable is unset
    pub default: Option<Draft>,
}

pub struct EnvDirective;

impl Directive for EnvDirective {
    type Params = EnvParams;

    fn name(&self) -> &'static str {
        "env"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<EnvParams> {
        let mut args = call.arguments(ctx, eval)?;
        validate_arg_count(args.len(), ArgCount::Range(1, 2), call.name)?;
        let default = if args.len() == 2 { args.pop() } else { None };
        Ok(EnvParams {
            name: call.string_argument(&args[0], "variable name")?,
            default,
        })
    }

    fn validate_parameters(&self, params: &EnvParams) -> Result<()> {
        validate_env_var_name(&params.name, "env")
    }

    fn execute(
        &self,
        params: EnvParams,
        _call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        _eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        if let Some(value) = ctx.runtime.env_var(&params.name) {
            return Ok(Draft::String(value));
        }
        match params.default {
            Some(default) if !default.is_null() => Ok(default),
            _ => Err(Error::environment(format!(
                "Environment variable '{}' not found and no default provided",
                params.name
            ))),
        }
    }

    fn context_params(&self, params: &EnvParams) -> Vec<(&'static str, String)> {
        vec![("var_name", params.name.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::test_support::{evaluate_in, field};
    use crate::error::ErrorKind;
    use crate::options::LoadOptions;
    use crate::runtime::NativeRuntime;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Arc;

    fn options() -> LoadOptions {
        LoadOptions::new().with_runtime(Arc::new(
            NativeRuntime::new()
                .with_env("SY_HOST", "db.internal")
                .without_env("SY_MISSING"),
        ))
    }

    #[test]
    fn test_env_lookup_and_defaults() {
        let draft = evaluate_in(
            "host: !env SY_HOST\nport: !env [SY_MISSING, 5432]\nflag: !env [SY_MISSING, true]\nalso: !env(SY_HOST)\n",
            Path::new("/"),
            &options(),
        )
        .unwrap();
        assert_eq!(field(&draft, "host"), Draft::from("db.internal"));
        assert_eq!(field(&draft, "port"), Draft::Integer(5432));
        assert_eq!(field(&draft, "flag"), Draft::Bool(true));
        assert_eq!(field(&draft, "also"), Draft::from("db.internal"));
    }

    #[test]
    fn test_env_missing() {
        for doc in ["x: !env SY_MISSING\n", "x: !env [SY_MISSING, null]\n"] {
            let err = evaluate_in(doc, Path::new("/"), &options()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::EnvironmentVariable);
            assert!(
                err.to_string()
                    .starts_with("Environment variable 'SY_MISSING' not found and no default provided")
            );
            assert!(err.to_string().contains("var_name=SY_MISSING"));
        }
    }

    #[test]
    fn test_env_invalid_name() {
        let err = evaluate_in("x: !env '1BAD'\n", Path::new("/"), &options()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Constructor);

        let err = evaluate_in("x: !env [A, b, c]\n", Path::new("/"), &options()).unwrap_err();
        assert!(err.to_string().contains("expects 1-2 argument(s), got 3"));
    }
}
