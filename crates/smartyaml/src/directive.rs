/*
 * directive.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Directive trait, registry and dispatcher.
 */

//! Directive trait, registry and dispatcher.
//!
//! A directive is a local YAML tag (`!name`) resolved at load time. Each
//! directive implements [`Directive`], a four-step contract:
//!
//! 1. [`extract_parameters`](Directive::extract_parameters) turns the tagged
//!    node into typed parameters
//! 2. [`validate_parameters`](Directive::validate_parameters) checks them
//! 3. [`apply_security_checks`](Directive::apply_security_checks) resolves and
//!    vets anything that touches the file system
//! 4. [`execute`](Directive::execute) produces the value
//!
//! Every `Directive` is also a [`DirectiveHandler`], the object-safe form
//! stored in the [`DirectiveRegistry`]. The handler runs the steps in order and
//! attaches an [`ErrorContext`] to the first failure.
//!
//! # Syntax
//!
//! - `!name(arg)`: inline argument in the tag. The tagged node is empty or,
//!   for `!import_yaml` and `!template`, a mapping of local overrides.
//! - `!name scalar`: a single argument.
//! - `!name [a, b]`: a sequence of arguments, each evaluated first.
//!
//! Inline arguments are split on `,`, but the YAML scanner rejects commas in
//! tags, so multiple arguments need the sequence form.

use crate::context::LoadContext;
use crate::draft::Draft;
use crate::error::{Error, ErrorContext, Result};
use crate::evaluator::Evaluator;
use smartyaml_parser::{NodeKind, ScalarStyle, SourceInfo, YamlNode};
use std::collections::HashMap;

/// One tagged node being resolved.
#[derive(Debug, Clone)]
pub struct DirectiveCall<'n> {
    /// Directive name without the leading `!`
    pub name: &'n str,

    /// Arguments from a `!name(...)` tag
    pub inline_args: Option<Vec<String>>,

    /// The node the tag is attached to
    pub node: &'n YamlNode,

    pub source_info: &'n SourceInfo,
}

impl<'n> DirectiveCall<'n> {
    /// Build a call from a local tag suffix.
    pub fn new(suffix: &'n str, node: &'n YamlNode, source_info: &'n SourceInfo) -> Self {
        let (name, inline_args) = parse_directive_tag(suffix);
        Self {
            name,
            inline_args,
            node,
            source_info,
        }
    }

    /// The positional arguments of this call.
    ///
    /// Inline arguments come back as strings. Sequence items are evaluated,
    /// so they may themselves be directives. A scalar is one argument, taken
    /// as its raw text; an empty plain scalar is no argument at all.
    pub fn arguments(&self, ctx: &LoadContext, eval: &mut Evaluator<'_>) -> Result<Vec<Draft>> {
        if let Some(args) = &self.inline_args {
            return Ok(args.iter().cloned().map(Draft::String).collect());
        }
        match &self.node.kind {
            NodeKind::Sequence(items) => items.iter().map(|item| eval.evaluate(item, ctx)).collect(),
            NodeKind::Scalar { value, style } => {
                if value.is_empty() && *style == ScalarStyle::Plain {
                    Ok(Vec::new())
                } else {
                    Ok(vec![Draft::String(value.clone())])
                }
            }
            NodeKind::Mapping(_) => Err(Error::constructor(format!(
                "!{} does not accept a mapping argument",
                self.name
            ))),
        }
    }

    /// Text of a scalar argument.
    pub fn string_argument(&self, arg: &Draft, what: &str) -> Result<String> {
        arg.scalar_text().ok_or_else(|| {
            Error::constructor(format!(
                "!{} {what} must be a string, got {}",
                self.name,
                arg.type_name()
            ))
        })
    }

    /// Local override mapping for `!name(arg)` forms.
    pub fn overrides(&self) -> Option<&'n YamlNode> {
        match (&self.inline_args, &self.node.kind) {
            (Some(_), NodeKind::Mapping(_)) => Some(self.node),
            _ => None,
        }
    }
}

/// Split a tag suffix into the directive name and its inline arguments.
///
/// `import_yaml(base.yaml)` gives `("import_yaml", Some(["base.yaml"]))`;
/// `env` gives `("env", None)`.
pub fn parse_directive_tag(suffix: &str) -> (&str, Option<Vec<String>>) {
    match suffix.find('(') {
        Some(open) if suffix.ends_with(')') => {
            let inner = &suffix[open + 1..suffix.len() - 1];
            let args = if inner.trim().is_empty() {
                Vec::new()
            } else {
                inner.split(',').map(|arg| arg.trim().to_string()).collect()
            };
            (&suffix[..open], Some(args))
        }
        _ => (suffix, None),
    }
}

/// A typed directive.
///
/// Implement this for new directives and register them with
/// [`DirectiveRegistry::register`].
pub trait Directive: Send + Sync {
    type Params;

    /// Tag name without the leading `!`.
    fn name(&self) -> &'static str;

    fn extract_parameters(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<Self::Params>;

    fn validate_parameters(&self, _params: &Self::Params) -> Result<()> {
        Ok(())
    }

    /// Resolve and vet paths or other resources before execution.
    fn apply_security_checks(&self, _params: &mut Self::Params, _ctx: &LoadContext) -> Result<()> {
        Ok(())
    }

    fn execute(
        &self,
        params: Self::Params,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<Draft>;

    /// Parameters safe to show in error messages.
    fn context_params(&self, _params: &Self::Params) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Object-safe directive, as stored in the registry.
pub trait DirectiveHandler: Send + Sync {
    fn name(&self) -> &str;

    fn handle(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<Draft>;
}

impl<D: Directive> DirectiveHandler for D {
    fn name(&self) -> &str {
        Directive::name(self)
    }

    fn handle(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        tracing::trace!(
            directive = call.name,
            line = call.source_info.line,
            "dispatching directive"
        );
        let mut safe_params = Vec::new();
        let result = run_steps(self, call, ctx, eval, &mut safe_params);
        result.map_err(|err| err.with_context(error_context(call, ctx, safe_params)))
    }
}

fn run_steps<D: Directive>(
    directive: &D,
    call: &DirectiveCall<'_>,
    ctx: &LoadContext,
    eval: &mut Evaluator<'_>,
    safe_params: &mut Vec<(&'static str, String)>,
) -> Result<Draft> {
    let mut params = directive.extract_parameters(call, ctx, eval)?;
    *safe_params = directive.context_params(&params);
    directive.validate_parameters(&params)?;
    directive.apply_security_checks(&mut params, ctx)?;
    directive.execute(params, call, ctx, eval)
}

fn error_context(
    call: &DirectiveCall<'_>,
    ctx: &LoadContext,
    params: Vec<(&'static str, String)>,
) -> ErrorContext {
    ErrorContext {
        directive: call.name.to_string(),
        location: Some(call.source_info.clone()),
        base_path: Some(ctx.base_path.clone()),
        template_path: ctx.template_root.clone(),
        params,
        import_depth: ctx.import_stack.len(),
        import_chain: ctx.import_chain_tail(),
        max_recursion_depth: ctx.max_recursion_depth,
    }
}

/// Directive handlers by tag name.
pub struct DirectiveRegistry {
    handlers: HashMap<String, Box<dyn DirectiveHandler>>,
}

impl DirectiveRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with every built-in directive.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::directives::register_defaults(&mut registry);
        registry
    }

    /// Register a handler, returning the one it replaces.
    pub fn register<H: DirectiveHandler + 'static>(
        &mut self,
        handler: H,
    ) -> Option<Box<dyn DirectiveHandler>> {
        let name = DirectiveHandler::name(&handler).to_string();
        self.handlers.insert(name, Box::new(handler))
    }

    pub fn get(&self, name: &str) -> Option<&dyn DirectiveHandler> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler registered for `call.name`.
    pub fn dispatch(
        &self,
        call: &DirectiveCall<'_>,
        ctx: &LoadContext,
        eval: &mut Evaluator<'_>,
    ) -> Result<Draft> {
        match self.handlers.get(call.name) {
            Some(handler) => handler.handle(call, ctx, eval),
            None => Err(Error::UnknownDirective {
                name: call.name.to_string(),
            }
            .with_context(error_context(call, ctx, Vec::new()))),
        }
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
