//! Error types for smartyaml

use smartyaml_parser::SourceInfo;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed underlying cause for codec failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("{message}")]
    EnvironmentVariable { message: String },

    #[error("Template path error: {message}")]
    TemplatePath { message: String },

    #[error("{message}")]
    Base64 {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Resource limit exceeded: {message}")]
    ResourceLimit { message: String },

    #[error("{message}")]
    RecursionLimit { message: String },

    #[error("{message}")]
    Constructor { message: String },

    #[error(
        "Unresolved variables in !expand: {}. Pass them via the `variables` option or define them in a `__vars` block",
        names.join(", ")
    )]
    MissingVariable { names: Vec<String> },

    #[error("Unknown directive '!{name}'")]
    UnknownDirective { name: String },

    #[error(transparent)]
    Parse(#[from] smartyaml_parser::Error),

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML emit error: {message}")]
    Emit { message: String },

    /// A directive failure enriched with where and how it happened.
    #[error("{source} ({context})")]
    WithContext {
        #[source]
        source: Box<Error>,
        context: Box<ErrorContext>,
    },
}

/// Error category, independent of any attached context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    InvalidPath,
    EnvironmentVariable,
    TemplatePath,
    Base64,
    ResourceLimit,
    RecursionLimit,
    Constructor,
    MissingVariable,
    UnknownDirective,
    Parse,
    Io,
    Emit,
}

impl Error {
    pub fn constructor(message: impl Into<String>) -> Self {
        Self::Constructor {
            message: message.into(),
        }
    }

    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath {
            message: message.into(),
        }
    }

    pub fn environment(message: impl Into<String>) -> Self {
        Self::EnvironmentVariable {
            message: message.into(),
        }
    }

    pub fn template_path(message: impl Into<String>) -> Self {
        Self::TemplatePath {
            message: message.into(),
        }
    }

    pub fn base64(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::Base64 {
            message: message.into(),
            source,
        }
    }

    pub fn resource_limit(message: impl Into<String>) -> Self {
        Self::ResourceLimit {
            message: message.into(),
        }
    }

    pub fn recursion_limit(message: impl Into<String>) -> Self {
        Self::RecursionLimit {
            message: message.into(),
        }
    }

    /// Category of this error, looking through any attached context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound { .. } => ErrorKind::FileNotFound,
            Error::InvalidPath { .. } => ErrorKind::InvalidPath,
            Error::EnvironmentVariable { .. } => ErrorKind::EnvironmentVariable,
            Error::TemplatePath { .. } => ErrorKind::TemplatePath,
            Error::Base64 { .. } => ErrorKind::Base64,
            Error::ResourceLimit { .. } => ErrorKind::ResourceLimit,
            Error::RecursionLimit { .. } => ErrorKind::RecursionLimit,
            Error::Constructor { .. } => ErrorKind::Constructor,
            Error::MissingVariable { .. } => ErrorKind::MissingVariable,
            Error::UnknownDirective { .. } => ErrorKind::UnknownDirective,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Io { .. } => ErrorKind::Io,
            Error::Emit { .. } => ErrorKind::Emit,
            Error::WithContext { source, .. } => source.kind(),
        }
    }

    /// The context attached by the directive dispatcher, if any.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The error without its context wrapper.
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Attach context. An error that already carries context is returned
    /// unchanged, so the innermost directive's context is the one kept.
    pub fn with_context(self, context: ErrorContext) -> Self {
        match self {
            Error::WithContext { .. } => self,
            other => Error::WithContext {
                source: Box::new(other),
                context: Box::new(context),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Where a directive failure happened.
///
/// Rendered as a comma-separated list: location, then file information,
/// then directive parameters, then the import chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// Directive name without the leading `!`
    pub directive: String,
    pub location: Option<SourceInfo>,
    pub base_path: Option<PathBuf>,
    pub template_path: Option<PathBuf>,
    /// Non-sensitive directive parameters (filename, variable name, ...)
    pub params: Vec<(&'static str, String)>,
    pub import_depth: usize,
    /// Tail of the import chain
    pub import_chain: Vec<String>,
    pub max_recursion_depth: usize,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        if let Some(location) = &self.location {
            parts.push(format!("line {}:{}", location.line, location.col));
            if let Some(file) = &location.file {
                parts.push(format!("in {file}"));
            }
        }
        if let Some(base_path) = &self.base_path {
            parts.push(format!("base_path={}", base_path.display()));
        }
        if let Some(template_path) = &self.template_path {
            parts.push(format!("template_path={}", template_path.display()));
        }
        for (name, value) in &self.params {
            parts.push(format!("{name}={value}"));
        }
        if self.import_depth > 0 {
            parts.push(format!("import_depth={}", self.import_depth));
            parts.push(format!("import_chain={}", self.import_chain.join(" -> ")));
        }
        parts.push(format!("max_recursion_depth={}", self.max_recursion_depth));

        write!(f, "{}", parts.join(", "))
    }
}
