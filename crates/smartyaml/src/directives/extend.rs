//! `!extend [items]`: append to the inherited sequence instead of replacing
//! it.

use crate::context::LoadContext;
use crate::directive::{Directive, DirectiveCall};
use crate::draft::Draft;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use smartyaml_parser::NodeKind;

pub struct ExtendDirective;

impl Directive for ExtendDirective {
    type Params = Vec<Draft>;

    fn name(&self) -> &'static str {
        "extend"
    }

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<Vec<Draft>> {
        let NodeKind::Sequence(items) = &call.node.kind else {
            return Err(Error::constructor(format!(
                "!extend requires a list/array, got {}",
                call.node.kind_name()
            )));
        };
        items.iter().map(|item| eval.evaluate(item, ctx)).collect()
    }

    fn execute(
        &self,
        items: Vec<Draft>,
        _call: &DirectiveCall<'_>,
        _ctx: &LoadContext,
        _eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        Ok(Draft::Extend(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::test_support::{evaluate_in, field};
    use crate::error::ErrorKind;
    use crate::options::LoadOptions;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_extend_marker() {
        let draft = evaluate_in(
            "items: !extend [a, 2, {k: v}]\nempty: !extend []\n",
            Path::new("/"),
            &LoadOptions::new(),
        )
        .unwrap();
        match field(&draft, "items") {
            Draft::Extend(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[1], Draft::Integer(2));
            }
            other => panic!("expected an extend marker, got {other:?}"),
        }
        assert_eq!(field(&draft, "empty"), Draft::Extend(Vec::new()));
    }

    #[test]
    fn test_extend_requires_sequence() {
        for doc in ["x: !extend scalar\n", "x: !extend\n  k: v\n"] {
            let err = evaluate_in(doc, Path::new("/"), &LoadOptions::new()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Constructor);
            assert!(err.to_string().contains("list/array"), "{err}");
        }
    }
}
