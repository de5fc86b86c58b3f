//! `!expand "text with {{placeholders}}"`.
//!
//! Substituted on the spot when the caller supplied every variable, since
//! those can never be overridden, and their values leave no placeholders
//! behind. Otherwise the text is deferred until the whole load has
//! collected its `__vars`.

use crate::context::LoadContext;
use crate::directive::{Directive, DirectiveCall};
use crate::draft::{DeferredExpansion, Draft};
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::validation::{ArgCount, validate_arg_count};
use crate::vars::{placeholder_names, substitute};

pub struct ExpandDirective;

impl Directive for ExpandDirective {
    type Params = String;

    fn name(&self) -> &'static str {
        "expand"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<String> {
        let args = call.arguments(ctx, eval)?;
        validate_arg_count(args.len(), ArgCount::Exact(1), call.name)?;
        call.string_argument(&args[0], "text")
    }

    fn execute(
        &self,
        text: String,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        _eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        let names = placeholder_names(&text);
        if names.is_empty() {
            return Ok(Draft::String(text));
        }
        if names
            .iter()
            .all(|name| ctx.caller_variables.contains_key(name))
        {
            let expanded = substitute(&text, &ctx.caller_variables)?;
            // A caller value may itself refer to `__vars` entries.
            if placeholder_names(&expanded).is_empty() {
                return Ok(Draft::String(expanded));
            }
        }
        Ok(Draft::Deferred(DeferredExpansion {
            text,
            source_info: call.source_info.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::test_support::{evaluate_in, field};
    use crate::options::LoadOptions;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_caller_variables_substitute_immediately() {
        let options = LoadOptions::new().with_variable("env", "prod");
        let draft = evaluate_in(
            "url: !expand 'https://{{ env }}.example.com'\nplain: !expand no placeholders\n",
            Path::new("/"),
            &options,
        )
        .unwrap();
        assert_eq!(field(&draft, "url"), Draft::from("https://prod.example.com"));
        assert_eq!(field(&draft, "plain"), Draft::from("no placeholders"));
    }

    #[test]
    fn test_caller_value_with_placeholders_is_deferred() {
        let options = LoadOptions::new().with_variable("a", "{{b}}");
        let draft = evaluate_in("x: !expand '{{a}}'\n", Path::new("/"), &options).unwrap();
        match field(&draft, "x") {
            Draft::Deferred(deferred) => assert_eq!(deferred.text, "{{a}}"),
            other => panic!("expected a deferred expansion, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_variables_are_deferred() {
        let options = LoadOptions::new().with_variable("env", "prod");
        let draft = evaluate_in(
            "name: !expand '{{app}}-{{env}}'\n",
            Path::new("/"),
            &options,
        )
        .unwrap();
        match field(&draft, "name") {
            Draft::Deferred(deferred) => {
                assert_eq!(deferred.text, "{{app}}-{{env}}");
                assert_eq!(deferred.source_info.line, 1);
            }
            other => panic!("expected a deferred expansion, got {other:?}"),
        }
    }
}
