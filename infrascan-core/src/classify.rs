//! Tag-based asset classification.
//!
//! Classification walks [`CLASSIFICATION_RULES`] in order and stops at the
//! first rule whose predicate matches. Precedence is therefore the table
//! order: an element tagged both `building` and `highway` is a building.

use crate::AssetKind;
use crate::element::{Tags, tag_value};

/// A test against an element's tags. Empty tag values never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPredicate {
    /// The key carries any non-empty value.
    Present(&'static str),
    /// The key carries one of the listed values.
    OneOf(&'static str, &'static [&'static str]),
}

impl TagPredicate {
    /// Evaluate the predicate against `tags`.
    #[must_use]
    pub fn matches(&self, tags: &Tags) -> bool {
        match *self {
            Self::Present(key) => tag_value(tags, key).is_some(),
            Self::OneOf(key, values) => {
                tag_value(tags, key).is_some_and(|value| values.contains(&value))
            }
        }
    }
}

/// One entry of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    /// Test applied to the element's tags.
    pub predicate: TagPredicate,
    /// Kind assigned when the predicate matches.
    pub kind: AssetKind,
}

/// Classification rules in precedence order.
pub const CLASSIFICATION_RULES: [ClassificationRule; 7] = [
    ClassificationRule {
        predicate: TagPredicate::Present("building"),
        kind: AssetKind::Building,
    },
    ClassificationRule {
        predicate: TagPredicate::Present("highway"),
        kind: AssetKind::Road,
    },
    ClassificationRule {
        predicate: TagPredicate::OneOf("power", &["line"]),
        kind: AssetKind::PowerLine,
    },
    ClassificationRule {
        predicate: TagPredicate::OneOf("power", &["tower", "pole"]),
        kind: AssetKind::PowerInfrastructure,
    },
    ClassificationRule {
        predicate: TagPredicate::Present("railway"),
        kind: AssetKind::Railway,
    },
    ClassificationRule {
        predicate: TagPredicate::OneOf("amenity", &["hospital"]),
        kind: AssetKind::Hospital,
    },
    ClassificationRule {
        predicate: TagPredicate::OneOf("amenity", &["fire_station"]),
        kind: AssetKind::FireStation,
    },
];

/// Classify an element by its tags, or `None` when no rule matches.
///
/// # Examples
///
/// ```
/// use infrascan_core::{AssetKind, Tags, classify};
///
/// let tags = Tags::from([("power".to_owned(), "pole".to_owned())]);
/// assert_eq!(classify(&tags), Some(AssetKind::PowerInfrastructure));
/// assert_eq!(classify(&Tags::new()), None);
/// ```
#[must_use]
pub fn classify(tags: &Tags) -> Option<AssetKind> {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.predicate.matches(tags))
        .map(|rule| rule.kind)
}
