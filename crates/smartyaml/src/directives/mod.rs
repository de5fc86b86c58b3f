//! Built-in directives.

mod conditional;
mod encoding;
mod env;
mod expand;
mod extend;
mod import;
mod template;

pub use conditional::{ConditionalParams, IncludeIfDirective, IncludeYamlIfDirective};
pub use encoding::{Base64DecodeDirective, Base64Directive};
pub use env::{EnvDirective, EnvParams};
pub use expand::ExpandDirective;
pub use extend::ExtendDirective;
pub use import::{FileParams, ImportDirective, ImportYamlDirective};
pub use template::{TemplateDirective, TemplateParams};

use crate::directive::DirectiveRegistry;

pub(crate) fn register_defaults(registry: &mut DirectiveRegistry) {
    registry.register(ImportDirective);
    registry.register(ImportYamlDirective);
    registry.register(TemplateDirective);
    registry.register(IncludeIfDirective);
    registry.register(IncludeYamlIfDirective);
    registry.register(EnvDirective);
    registry.register(Base64Directive);
    registry.register(Base64DecodeDirective);
    registry.register(ExpandDirective);
    registry.register(ExtendDirective);
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::{LoadContext, LoadState};
    use crate::directive::DirectiveRegistry;
    use crate::draft::Draft;
    use crate::error::Result;
    use crate::evaluator::Evaluator;
    use crate::options::LoadOptions;
    use std::path::Path;

    /// Evaluate `content` as a document rooted at `base`.
    pub fn evaluate_in(content: &str, base: &Path, options: &LoadOptions) -> Result<Draft> {
        let registry = DirectiveRegistry::with_defaults();
        let mut state = LoadState::new();
        let ctx = LoadContext::from_options(options, base.to_path_buf());
        Evaluator::new(&registry, &mut state).evaluate_document(content, None, &ctx)
    }

    /// Value of `key` in an evaluated root mapping.
    pub fn field(draft: &Draft, key: &str) -> Draft {
        draft
            .as_mapping()
            .and_then(|map| map.get(key))
            .cloned()
            .unwrap_or_default()
    }
}
