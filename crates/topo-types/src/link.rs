//! Link descriptions and the per-poll link set.

use crate::ConnectPoint;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Kind of link between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Physical point-to-point link.
    Direct,
    /// Link traversing an intermediate fabric.
    Indirect,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Direct => write!(f, "DIRECT"),
            LinkType::Indirect => write!(f, "INDIRECT"),
        }
    }
}

/// Whether a link description covers one or both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directionality {
    /// `src` to `dst` only.
    Unidirectional,
    /// Both directions.
    Bidirectional,
}

/// A discovered edge between two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkDescription {
    pub src: ConnectPoint,
    pub dst: ConnectPoint,
    pub link_type: LinkType,
    pub directionality: Directionality,
}

impl LinkDescription {
    /// Creates a unidirectional `src -> dst` link.
    pub fn new(src: ConnectPoint, dst: ConnectPoint, link_type: LinkType) -> Self {
        Self {
            src,
            dst,
            link_type,
            directionality: Directionality::Unidirectional,
        }
    }

    pub fn with_directionality(mut self, directionality: Directionality) -> Self {
        self.directionality = directionality;
        self
    }
}

impl fmt::Display for LinkDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.directionality {
            Directionality::Unidirectional => "->",
            Directionality::Bidirectional => "<->",
        };
        write!(f, "{} {} {} ({})", self.src, arrow, self.dst, self.link_type)
    }
}

/// Deduplicated, unordered set of links produced by one poll.
///
/// A poll builds a fresh set and hands it over whole; sets are never
/// patched across polls. Use [`LinkSet::diff`] to compare two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    links: HashSet<LinkDescription>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a link; returns false if an identical link was already present.
    pub fn insert(&mut self, link: LinkDescription) -> bool {
        self.links.insert(link)
    }

    pub fn contains(&self, link: &LinkDescription) -> bool {
        self.links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkDescription> {
        self.links.iter()
    }

    /// Returns the links in a stable order.
    pub fn to_sorted_vec(&self) -> Vec<LinkDescription> {
        let mut links: Vec<_> = self.links.iter().cloned().collect();
        links.sort();
        links
    }

    /// Compares this snapshot against an earlier one.
    pub fn diff(&self, previous: &LinkSet) -> LinkSetDiff {
        let mut added: Vec<_> = self.links.difference(&previous.links).cloned().collect();
        let mut removed: Vec<_> = previous.links.difference(&self.links).cloned().collect();
        added.sort();
        removed.sort();
        LinkSetDiff { added, removed }
    }
}

impl FromIterator<LinkDescription> for LinkSet {
    fn from_iter<I: IntoIterator<Item = LinkDescription>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for LinkSet {
    type Item = LinkDescription;
    type IntoIter = std::collections::hash_set::IntoIter<LinkDescription>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.into_iter()
    }
}

impl Serialize for LinkSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_sorted_vec().serialize(serializer)
    }
}

/// Links that appeared or disappeared between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSetDiff {
    pub added: Vec<LinkDescription>,
    pub removed: Vec<LinkDescription>,
}

impl LinkSetDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
