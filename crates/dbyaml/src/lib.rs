#![doc = include_str!("../README.md")]
#![allow(unused_assignments)] // thiserror/miette derive macros trigger false positives

extern crate alloc;

pub mod ast;
mod emitter;
mod error;
mod loader;
pub mod patch;
mod placeholder;
mod scalar;
pub mod synthesize;
mod utilities;
pub mod walker;

use alloc::borrow::Cow;

use tracing::{debug, info};

pub use emitter::{emit, render};
pub use error::Error;
pub use loader::{Loaded, load, parse};
pub use patch::{PatchEngine, PatchError, TextPatcher};
pub use placeholder::{COMMENTED, Placeholder, UNCOMMENTED};
pub use synthesize::{DatabaseTemplate, Rewrite, Wiring};

/// Whether the database's shared block was written by this addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Definition {
    Inserted,
    AlreadyPresent,
}

/// The outcome of [`add_database`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addition {
    pub name: String,
    /// The full file content after the addition.
    pub content: String,
    pub definition: Definition,
    /// Environments that now reference the database.
    pub wired: Vec<String>,
    /// Environments that already referenced it.
    pub skipped: Vec<String>,
    /// Three-tier environments that configure a database of that name themselves.
    pub defined: Vec<String>,
}

impl Addition {
    pub fn changed(&self) -> bool {
        self.definition == Definition::Inserted || !self.wired.is_empty()
    }
}

/// How far a database is set up in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub name: String,
    pub defined: bool,
    /// Each environment with whether it references the database.
    pub environments: Vec<(String, bool)>,
}

impl Status {
    pub fn is_complete(&self) -> bool {
        self.defined && self.environments.iter().all(|(_, wired)| *wired)
    }

    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.environments
            .iter()
            .filter(|(_, wired)| !wired)
            .map(|(name, _)| name.as_str())
    }
}

/// Define the database `name` next to the default block and reference it
/// from every environment.
///
/// The input is not modified; the edited text is returned in
/// [`Addition::content`]. Running this on its own output changes nothing.
/// Files with CRLF line endings are edited as LF and written back as CRLF.
///
/// # Errors
///
/// Returns an error if `name` cannot be used as a key and anchor, the file is
/// not a valid `database.yml`, the default block cannot be found, or an
/// environment's text does not match its canonical rendering. No partial
/// result is returned.
#[tracing::instrument(skip(source, template))]
pub fn add_database(source: &str, name: &str, template: &DatabaseTemplate) -> Result<Addition, Error> {
    validate_name(name)?;
    let crlf = source.contains("\r\n");
    let source = if crlf {
        Cow::Owned(source.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(source)
    };
    let loaded = load(&source)?;
    let wirings = synthesize::rewrite_all(&loaded.stream, name, loaded.placeholder)?;

    let mut patcher = TextPatcher::new(source.as_ref());

    let definition = if walker::has_definition(&loaded.stream, name) {
        debug!("definition already present");
        Definition::AlreadyPresent
    } else {
        let block = synthesize::definition_block(name, template, loaded.placeholder);
        let anchor = synthesize::definition_anchor_pattern(&template.default_anchor)?;
        patcher.insert_after(&anchor, &format!("\n{block}\n"))?;
        info!("defined database");
        Definition::Inserted
    };

    let mut wired = Vec::new();
    let mut skipped = Vec::new();
    let mut defined = Vec::new();
    for wiring in wirings {
        match wiring {
            Wiring::Rewrite(rewrite) => {
                patcher
                    .replace(&rewrite.old, &rewrite.new)
                    .map_err(|source| Error::Rewrite {
                        environment: rewrite.environment.clone(),
                        source,
                    })?;
                info!(environment = %rewrite.environment, "wired database");
                wired.push(rewrite.environment);
            }
            Wiring::AlreadyWired { environment } => skipped.push(environment),
            Wiring::Defined { environment } => {
                tracing::warn!(%environment, "environment configures this database itself");
                defined.push(environment);
            }
        }
    }

    let content = patcher.into_content();
    Ok(Addition {
        name: name.to_string(),
        content: if crlf { content.replace('\n', "\r\n") } else { content },
        definition,
        wired,
        skipped,
        defined,
    })
}

/// Report whether `name` is defined and wired into every environment.
///
/// # Errors
///
/// Returns an error if the file is not a valid `database.yml`.
pub fn check_database(source: &str, name: &str) -> Result<Status, Error> {
    let loaded = load(source)?;
    let environments = walker::list_environments(&loaded.stream)?
        .iter()
        .map(|env| (env.name.to_string(), walker::already_wired(env.value, name)))
        .collect();
    Ok(Status {
        name: name.to_string(),
        defined: walker::has_definition(&loaded.stream, name),
        environments,
    })
}

/// Check that `name` works as both a mapping key and an anchor.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] describing the first problem found.
pub fn validate_name(name: &str) -> Result<(), Error> {
    let reason = if name.is_empty() {
        Some("the name is empty")
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Some("only ASCII letters, digits, `_` and `-` are allowed")
    } else if name.starts_with('-') {
        Some("the name cannot start with `-`")
    } else if name == synthesize::PRIMARY {
        Some("`primary` holds an environment's existing configuration")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
