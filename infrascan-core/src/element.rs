//! Raw geographic elements as reported by the upstream geodata source.

use std::collections::BTreeMap;
use std::fmt;

use geo::Coord;

/// `OpenStreetMap`-style free-form tags.
///
/// A `BTreeMap` keeps iteration order stable so derived properties serialise
/// identically across runs.
pub type Tags = BTreeMap<String, String>;

/// Element discriminator reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// A single located node.
    Node,
    /// An ordered chain of nodes.
    Way,
    /// A grouping of other elements.
    Relation,
    /// Any discriminator this crate does not recognise.
    Other,
}

impl ElementKind {
    /// Map a source type name (`"node"`, `"way"`, `"relation"`) to a kind.
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "node" => Self::Node,
            "way" => Self::Way,
            "relation" => Self::Relation,
            _ => Self::Other,
        }
    }

    /// The source type name for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single feature fetched from the source, before classification.
///
/// Coordinates use `x = longitude` and `y = latitude`.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use infrascan_core::{ElementKind, RawElement, Tags};
///
/// let tags = Tags::from([("amenity".to_owned(), "hospital".to_owned())]);
/// let node = RawElement::node(7, Coord { x: 0.5, y: 0.5 }, tags);
/// assert_eq!(node.kind, ElementKind::Node);
/// assert_eq!(node.tag("amenity"), Some("hospital"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    /// Element discriminator.
    pub kind: ElementKind,
    /// Source identifier, unique per kind.
    pub id: i64,
    /// Location of a node; `None` for ways and relations.
    pub location: Option<Coord<f64>>,
    /// Ordered vertices of a way; empty for nodes and relations.
    pub geometry: Vec<Coord<f64>>,
    /// Free-form tags.
    pub tags: Tags,
}

impl RawElement {
    /// A node at `location`.
    #[must_use]
    pub const fn node(id: i64, location: Coord<f64>, tags: Tags) -> Self {
        Self {
            kind: ElementKind::Node,
            id,
            location: Some(location),
            geometry: Vec::new(),
            tags,
        }
    }

    /// A way through `geometry`, in order.
    #[must_use]
    pub const fn way(id: i64, geometry: Vec<Coord<f64>>, tags: Tags) -> Self {
        Self {
            kind: ElementKind::Way,
            id,
            location: None,
            geometry,
            tags,
        }
    }

    /// A relation carrying only tags.
    #[must_use]
    pub const fn relation(id: i64, tags: Tags) -> Self {
        Self {
            kind: ElementKind::Relation,
            id,
            location: None,
            geometry: Vec::new(),
            tags,
        }
    }

    /// Look up a tag, treating empty values as absent.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        tag_value(&self.tags, key)
    }
}

/// Look up `key` in `tags`, treating empty values as absent.
pub(crate) fn tag_value<'a>(tags: &'a Tags, key: &str) -> Option<&'a str> {
    tags.get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("node", ElementKind::Node)]
    #[case("way", ElementKind::Way)]
    #[case("relation", ElementKind::Relation)]
    #[case("area", ElementKind::Other)]
    fn parses_type_names(#[case] name: &str, #[case] expected: ElementKind) {
        assert_eq!(ElementKind::from_type_name(name), expected);
    }

    #[rstest]
    fn empty_tag_values_read_as_absent() {
        let tags = Tags::from([
            ("building".to_owned(), String::new()),
            ("highway".to_owned(), "primary".to_owned()),
        ]);
        let way = RawElement::way(1, Vec::new(), tags);
        assert_eq!(way.tag("building"), None);
        assert_eq!(way.tag("highway"), Some("primary"));
        assert_eq!(way.tag("railway"), None);
    }
}
