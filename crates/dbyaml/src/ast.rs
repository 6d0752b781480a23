use saphyr_parser::ScalarStyle;

/// The YAML merge key (`<<`).
pub const MERGE_KEY: &str = "<<";

/// A parsed YAML stream: every document in the file, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stream {
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// `None` for an empty document (e.g. a bare `---`).
    pub root: Option<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Scalar(ScalarNode),
    Mapping(MappingNode),
    Sequence(SequenceNode),
    Alias(AliasNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarNode {
    pub value: String,
    pub style: ScalarStyle,
    pub anchor: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MappingNode {
    pub entries: Vec<MappingEntry>,
    /// Written as `{ ... }` in the source.
    pub flow: bool,
    pub anchor: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub key: Node,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceNode {
    pub items: Vec<Node>,
    /// Written as `[ ... ]` in the source.
    pub flow: bool,
    pub anchor: Option<String>,
    pub tag: Option<String>,
}

/// A reference to an anchored node, by name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasNode {
    pub name: String,
}

impl Node {
    /// A plain, untagged, unanchored scalar.
    pub fn plain(value: impl Into<String>) -> Self {
        Node::Scalar(ScalarNode {
            value: value.into(),
            style: ScalarStyle::Plain,
            anchor: None,
            tag: None,
        })
    }

    pub fn alias(name: impl Into<String>) -> Self {
        Node::Alias(AliasNode { name: name.into() })
    }

    /// The scalar text, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(&s.value),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&MappingNode> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// The anchor defined on this node. Aliases never define one.
    pub fn anchor(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => s.anchor.as_deref(),
            Node::Mapping(m) => m.anchor.as_deref(),
            Node::Sequence(s) => s.anchor.as_deref(),
            Node::Alias(_) => None,
        }
    }

    /// Whether this node is an alias to `name`.
    pub fn is_alias_to(&self, name: &str) -> bool {
        matches!(self, Node::Alias(a) if a.name == name)
    }

    /// Short human-readable kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "scalar",
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::Alias(_) => "alias",
        }
    }
}

impl MappingNode {
    /// A block mapping built from key/value pairs.
    pub fn from_entries(entries: impl IntoIterator<Item = (Node, Node)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| MappingEntry { key, value })
                .collect(),
            ..Self::default()
        }
    }

    /// Look up the value for a scalar key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|e| e.key.as_scalar() == Some(key))
            .map(|e| &e.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Node> {
        self.entries.iter().map(|e| &e.key)
    }
}
