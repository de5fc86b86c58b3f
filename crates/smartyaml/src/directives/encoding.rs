//! `!base64` and `!base64_decode`.

use crate::context::LoadContext;
use crate::directive::{Directive, DirectiveCall};
use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Join the call's arguments into the data to transcode.
fn extract_data(
    call: &DirectiveCall<'_>,
    ctx: &LoadContext,
    eval: &mut Evaluator<'_>,
    separator: &str,
) -> Result<String> {
    let args = call.arguments(ctx, eval)?;
    let parts = args
        .iter()
        .map(|arg| {
            arg.scalar_text().ok_or_else(|| {
                Error::base64(
                    format!("!{} data must be a string, got {}", call.name, arg.type_name()),
                    None,
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(separator))
}

pub struct Base64Directive;

impl Directive for Base64Directive {
    type Params = String;

    fn name(&self) -> &'static str {
        "base64"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<String> {
        extract_data(call, ctx, eval, ", ")
    }

    fn execute(
        &self,
        data: String,
        _call: &DirectiveCall<'_>,
        _ctx: &LoadContext,
        _eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        Ok(Draft::String(STANDARD.encode(data.as_bytes())))
    }
}

pub struct Base64DecodeDirective;

impl Directive for Base64DecodeDirective {
    type Params = String;

    fn name(&self) -> &'static str {
        "base64_decode"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<String> {
        extract_data(call, ctx, eval, "")
    }

    fn execute(
        &self,
        data: String,
        _call: &DirectiveCall<'_>,
        _ctx: &LoadContext,
        _eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|err| Error::base64("Failed to decode base64 data", Some(Box::new(err))))?;
        let text = String::from_utf8(bytes).map_err(|err| {
            Error::base64("Decoded base64 data is not valid UTF-8", Some(Box::new(err)))
        })?;
        Ok(Draft::String(text))
    }
}
