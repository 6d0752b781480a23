use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::patch::PatchError;

/// Fatal errors raised while loading or editing a database configuration.
///
/// Any of these aborts the addition of a database before a patch is issued.
/// An environment that already references the database is not an error; see
/// [`Wiring::AlreadyWired`](crate::Wiring::AlreadyWired).
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("{message}")]
    #[diagnostic(code(dbyaml::parse))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
        message: String,
    },

    #[error("expected a mapping of environment names: {message}")]
    #[diagnostic(
        code(dbyaml::parse::root),
        help("the top level of database.yml maps environment names to their configuration")
    )]
    NotEnvironmentMap { message: String },

    #[error("environment `{environment}` is a {found}, expected a mapping or an alias")]
    #[diagnostic(code(dbyaml::structure))]
    Structure {
        environment: String,
        found: &'static str,
    },

    #[error("invalid database name `{name}`: {reason}")]
    #[diagnostic(code(dbyaml::name))]
    InvalidName { name: String, reason: &'static str },

    #[error(transparent)]
    #[diagnostic(code(dbyaml::patch))]
    Patch(#[from] PatchError),

    #[error("cannot rewrite environment `{environment}`")]
    #[diagnostic(
        code(dbyaml::patch::rewrite),
        help("the environment block is not formatted the way it would be emitted; edit it by hand")
    )]
    Rewrite {
        environment: String,
        #[source]
        source: PatchError,
    },
}

impl Error {
    pub(crate) fn parse(source: &str, offset: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            src: NamedSource::new("database.yml", source.to_string()),
            span: offset.into(),
            message: message.into(),
        }
    }

    /// Environment name associated with this error, if any.
    pub fn environment(&self) -> Option<&str> {
        match self {
            Error::Structure { environment, .. } | Error::Rewrite { environment, .. } => {
                Some(environment)
            }
            _ => None,
        }
    }

    /// Attach the real file name to the source shown with a parse error.
    #[must_use]
    pub fn in_file(self, file_name: &str) -> Self {
        match self {
            Error::Parse { src, span, message } => Error::Parse {
                src: NamedSource::new(file_name, src.inner().clone()),
                span,
                message,
            },
            other => other,
        }
    }
}
