use saphyr_parser::ScalarStyle;
use tracing::debug;

use crate::ast::{MERGE_KEY, Node, Stream};
use crate::error::Error;

/// A top-level entry that configures one Rails environment.
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    pub name: &'a str,
    pub key: &'a Node,
    pub value: &'a Node,
}

/// How an environment lays out its databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// The environment configures a single database directly, usually by
    /// merging the default block (`<<: *default`).
    TwoTier,
    /// The environment maps database names to their configurations.
    ThreeTier,
}

/// Collect every environment in the stream, in document order.
///
/// Entries whose value carries an anchor are shared definitions (`default`,
/// or a database added earlier) and are skipped.
///
/// # Errors
///
/// Returns [`Error::NotEnvironmentMap`] if the stream has no content, a
/// document root is not a mapping, or a top-level key is not a scalar, and
/// [`Error::Structure`] if an environment is neither a mapping nor an alias.
pub fn list_environments(stream: &Stream) -> Result<Vec<Environment<'_>>, Error> {
    let mut environments = Vec::new();
    let mut roots = 0;

    for root in stream.documents.iter().filter_map(|d| d.root.as_ref()) {
        roots += 1;
        let Node::Mapping(mapping) = root else {
            return Err(Error::NotEnvironmentMap {
                message: format!("the document root is a {}", root.kind()),
            });
        };

        for entry in &mapping.entries {
            let Some(name) = entry.key.as_scalar() else {
                return Err(Error::NotEnvironmentMap {
                    message: format!("found a {} as a top-level key", entry.key.kind()),
                });
            };

            if let Some(anchor) = entry.value.anchor() {
                debug!(name, anchor, "skipping anchored definition");
                continue;
            }

            match &entry.value {
                Node::Mapping(_) | Node::Alias(_) => environments.push(Environment {
                    name,
                    key: &entry.key,
                    value: &entry.value,
                }),
                other => {
                    return Err(Error::Structure {
                        environment: name.to_string(),
                        found: other.kind(),
                    });
                }
            }
        }
    }

    if roots == 0 {
        return Err(Error::NotEnvironmentMap {
            message: "the file has no content".to_string(),
        });
    }
    Ok(environments)
}

/// Whether the environment already has `name: *name`.
///
/// Only a scalar key paired with an alias to the same name counts; text that
/// merely mentions the name does not.
pub fn already_wired(value: &Node, name: &str) -> bool {
    value.as_mapping().is_some_and(|mapping| {
        mapping
            .entries
            .iter()
            .any(|e| e.key.as_scalar() == Some(name) && e.value.is_alias_to(name))
    })
}

pub fn tier(value: &Node) -> Tier {
    match value {
        Node::Alias(_) => Tier::TwoTier,
        Node::Mapping(mapping) if mapping.keys().any(is_merge_key) => Tier::TwoTier,
        _ => Tier::ThreeTier,
    }
}

/// A plain `<<` key. A quoted `"<<"` is an ordinary string.
pub(crate) fn is_merge_key(key: &Node) -> bool {
    matches!(key, Node::Scalar(s) if s.style == ScalarStyle::Plain && s.value == MERGE_KEY)
}

/// Whether a top-level `name: &name` mapping exists in any document.
pub fn has_definition(stream: &Stream, name: &str) -> bool {
    stream
        .documents
        .iter()
        .filter_map(|d| d.root.as_ref().and_then(Node::as_mapping))
        .flat_map(|root| &root.entries)
        .any(|e| {
            e.key.as_scalar() == Some(name)
                && matches!(&e.value, Node::Mapping(m) if m.anchor.as_deref() == Some(name))
        })
}
