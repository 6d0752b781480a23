use regex::Regex;
use tracing::debug;

use crate::ast::{MERGE_KEY, MappingNode, Node, Stream};
use crate::emitter::render;
use crate::error::Error;
use crate::patch::PatchError;
use crate::placeholder::Placeholder;
use crate::walker::{self, Environment, Tier};

/// Key under which a two-tier environment's existing configuration is kept.
pub const PRIMARY: &str = "primary";

/// Shape of a newly defined database block. `{name}` in a pattern is
/// replaced with the database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTemplate {
    /// Anchor of the shared block the new database merges from.
    pub default_anchor: String,
    pub migrations_paths: String,
    pub database: String,
}

impl Default for DatabaseTemplate {
    fn default() -> Self {
        Self {
            default_anchor: "default".to_string(),
            migrations_paths: "db/{name}_migrate".to_string(),
            database: "storage/<%= Rails.env %>-{name}.sqlite3".to_string(),
        }
    }
}

impl DatabaseTemplate {
    fn expand(pattern: &str, name: &str) -> String {
        pattern.replace("{name}", name)
    }
}

/// Before and after renderings of one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub environment: String,
    pub old: String,
    pub new: String,
}

/// What wiring a database into an environment comes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wiring {
    Rewrite(Rewrite),
    /// The environment already has `name: *name`.
    AlreadyWired { environment: String },
    /// A three-tier environment configures a database of that name itself.
    Defined { environment: String },
}

/// The anchored mapping for a new database:
///
/// ```yaml
/// cache: &cache
///   <<: *default
///   migrations_paths: db/cache_migrate
///   database: storage/<%= Rails.env %>-cache.sqlite3
/// ```
pub fn new_definition(name: &str, template: &DatabaseTemplate) -> Node {
    let mut mapping = MappingNode::from_entries([
        (Node::plain(MERGE_KEY), Node::alias(&template.default_anchor)),
        (
            Node::plain("migrations_paths"),
            Node::plain(DatabaseTemplate::expand(&template.migrations_paths, name)),
        ),
        (
            Node::plain("database"),
            Node::plain(DatabaseTemplate::expand(&template.database, name)),
        ),
    ]);
    mapping.anchor = Some(name.to_string());
    Node::Mapping(mapping)
}

/// The rendered definition, ready to insert into the file.
pub fn definition_block(name: &str, template: &DatabaseTemplate, placeholder: Placeholder) -> String {
    render(&Node::plain(name), &new_definition(name, template), placeholder)
}

/// Matches the `anchor: &anchor` line and the indented lines of its block.
///
/// # Errors
///
/// Returns [`PatchError::Pattern`] if the pattern cannot be compiled.
pub fn definition_anchor_pattern(anchor: &str) -> Result<Regex, PatchError> {
    let anchor = regex::escape(anchor);
    Ok(Regex::new(&format!(r"{anchor}: &{anchor}\n(?:[ \t]+.*\n)+"))?)
}

/// Decide how `name` is wired into one environment.
pub fn wire(env: &Environment<'_>, name: &str, placeholder: Placeholder) -> Wiring {
    let environment = env.name.to_string();
    if walker::already_wired(env.value, name) {
        return Wiring::AlreadyWired { environment };
    }

    let reference = (Node::plain(name), Node::alias(name));
    let wired = match walker::tier(env.value) {
        Tier::TwoTier => MappingNode::from_entries([
            (Node::plain(PRIMARY), primary_reference(env.value)),
            reference,
        ]),
        Tier::ThreeTier => {
            let existing = env.value.as_mapping().map(|m| m.entries.as_slice()).unwrap_or_default();
            if existing.iter().any(|e| e.key.as_scalar() == Some(name)) {
                return Wiring::Defined { environment };
            }
            MappingNode::from_entries(
                existing
                    .iter()
                    .map(|e| (e.key.clone(), e.value.clone()))
                    .chain([reference]),
            )
        }
    };

    Wiring::Rewrite(Rewrite {
        environment,
        old: render(env.key, env.value, placeholder),
        new: render(env.key, &Node::Mapping(wired), placeholder),
    })
}

/// The rewrite that wires `name` into `env`, or `None` if nothing changes.
pub fn add_to_environment(env: &Environment<'_>, name: &str, placeholder: Placeholder) -> Option<Rewrite> {
    match wire(env, name, placeholder) {
        Wiring::Rewrite(rewrite) => Some(rewrite),
        Wiring::AlreadyWired { .. } | Wiring::Defined { .. } => None,
    }
}

/// Wire `name` into every environment of the stream.
///
/// # Errors
///
/// Propagates the walker's errors; see [`walker::list_environments`].
pub fn rewrite_all(stream: &Stream, name: &str, placeholder: Placeholder) -> Result<Vec<Wiring>, Error> {
    let environments = walker::list_environments(stream)?;
    Ok(environments
        .iter()
        .map(|env| {
            let wiring = wire(env, name, placeholder);
            debug!(environment = env.name, ?wiring, "planned");
            wiring
        })
        .collect())
}

/// What a two-tier environment keeps under `primary`.
///
/// A mapping that only merges an alias collapses to that alias.
fn primary_reference(value: &Node) -> Node {
    if let Node::Mapping(mapping) = value
        && let [only] = mapping.entries.as_slice()
        && walker::is_merge_key(&only.key)
        && matches!(only.value, Node::Alias(_))
    {
        return only.value.clone();
    }
    value.clone()
}
