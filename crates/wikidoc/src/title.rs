use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::WikidocError;

pub const NS_MAIN: i32 = 0;
pub const NS_TALK: i32 = 1;
pub const NS_USER: i32 = 2;
pub const NS_USER_TALK: i32 = 3;
pub const NS_PROJECT: i32 = 4;
pub const NS_PROJECT_TALK: i32 = 5;
pub const NS_CATEGORY: i32 = 14;

const CANONICAL_NAMESPACES: &[(i32, &str)] = &[
    (-2, "Media"),
    (-1, "Special"),
    (1, "Talk"),
    (2, "User"),
    (3, "User talk"),
    (4, "Wikipedia"),
    (5, "Wikipedia talk"),
    (6, "File"),
    (7, "File talk"),
    (8, "MediaWiki"),
    (9, "MediaWiki talk"),
    (10, "Template"),
    (11, "Template talk"),
    (12, "Help"),
    (13, "Help talk"),
    (14, "Category"),
    (15, "Category talk"),
    (100, "Portal"),
    (101, "Portal talk"),
    (118, "Draft"),
    (119, "Draft talk"),
];

const NAMESPACE_ALIASES: &[(&str, i32)] = &[
    ("project", 4),
    ("project talk", 5),
    ("wp", 4),
    ("wt", 5),
    ("image", 6),
    ("image talk", 7),
];

const ILLEGAL_TITLE_CHARS: &[char] = &['#', '<', '>', '[', ']', '|', '{', '}'];

/// Maps namespace prefixes to ids and back.
#[derive(Clone, Debug)]
pub struct NamespaceTable {
    names: BTreeMap<i32, String>,
    lookup: BTreeMap<String, i32>,
}

impl Default for NamespaceTable {
    fn default() -> Self {
        let mut table = Self {
            names: BTreeMap::new(),
            lookup: BTreeMap::new(),
        };
        for (id, name) in CANONICAL_NAMESPACES {
            table.names.insert(*id, (*name).to_string());
            table.lookup.insert(lookup_key(name), *id);
        }
        for (alias, id) in NAMESPACE_ALIASES {
            table.lookup.insert((*alias).to_string(), *id);
        }
        table
    }
}

impl NamespaceTable {
    /// Default table extended with site-specific prefixes.
    ///
    /// A prefix for an id the table does not know yet (e.g. `Module: 828`) also becomes that
    /// namespace's display name; the first such prefix in iteration order wins.
    pub fn with_aliases<'a>(aliases: impl IntoIterator<Item = (&'a String, &'a i32)>) -> Self {
        let mut table = Self::default();
        for (alias, id) in aliases {
            table
                .names
                .entry(*id)
                .or_insert_with(|| uppercase_first(&collapse_whitespace(&alias.replace('_', " "))));
            table.lookup.insert(lookup_key(alias), *id);
        }
        table
    }

    pub fn id_for(&self, prefix: &str) -> Option<i32> {
        self.lookup.get(&lookup_key(prefix)).copied()
    }

    pub fn name_for(&self, id: i32) -> Option<&str> {
        if id == NS_MAIN {
            return Some("");
        }
        self.names.get(&id).map(String::as_str)
    }
}

fn lookup_key(prefix: &str) -> String {
    collapse_whitespace(&prefix.replace('_', " ")).to_lowercase()
}

/// Normalized identity of a wiki document: namespace id plus base name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Title {
    namespace: i32,
    name: String,
    prefixed: String,
}

impl Title {
    /// Parses a full page name such as `Wikipedia_talk:Articles for creation/Foo`.
    pub fn parse(raw: &str, namespaces: &NamespaceTable) -> Result<Self, WikidocError> {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix(':').unwrap_or(trimmed);
        if let Some((prefix, rest)) = trimmed.split_once(':') {
            if let Some(id) = namespaces.id_for(prefix) {
                return Self::new(id, rest, namespaces);
            }
        }
        Self::new(NS_MAIN, trimmed, namespaces)
    }

    /// Builds a title from an explicit namespace id and a base name without prefix.
    pub fn new(namespace: i32, name: &str, namespaces: &NamespaceTable) -> Result<Self, WikidocError> {
        let name = normalize_name(name)?;
        let prefix = namespaces
            .name_for(namespace)
            .ok_or_else(|| WikidocError::Title(format!("unknown namespace id {namespace}")))?;
        let prefixed = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}:{name}")
        };
        Ok(Self {
            namespace,
            name,
            prefixed,
        })
    }

    pub fn namespace(&self) -> i32 {
        self.namespace
    }

    /// Base name without the namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full display title, e.g. `Wikipedia talk:Foo`.
    pub fn prefixed_text(&self) -> &str {
        &self.prefixed
    }

    /// Odd namespace ids are talk namespaces; negative ids are virtual and have none.
    pub fn is_talk(&self) -> bool {
        self.namespace % 2 != 0
    }

    pub fn has_talk_namespace(&self) -> bool {
        self.namespace >= 0
    }

    /// The title in the paired talk namespace, or `None` when this already is one.
    pub fn talk(&self, namespaces: &NamespaceTable) -> Result<Option<Self>, WikidocError> {
        if self.is_talk() || !self.has_talk_namespace() {
            return Ok(None);
        }
        Self::new(self.namespace + 1, &self.name, namespaces).map(Some)
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefixed)
    }
}

fn normalize_name(raw: &str) -> Result<String, WikidocError> {
    let spaced: String = raw.replace('_', " ").nfc().collect();
    let collapsed = collapse_whitespace(&spaced);
    if collapsed.is_empty() {
        return Err(WikidocError::Title("title must not be empty".into()));
    }
    if let Some(bad) = collapsed.chars().find(|c| ILLEGAL_TITLE_CHARS.contains(c)) {
        return Err(WikidocError::Title(format!(
            "title {collapsed:?} contains illegal character {bad:?}"
        )));
    }
    Ok(uppercase_first(&collapsed))
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercases only the first character, following wiki title casing.
pub fn uppercase_first(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
