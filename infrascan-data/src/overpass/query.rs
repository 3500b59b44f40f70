//! Overpass QL rendering.

use std::fmt;

use infrascan_core::Bounds;

/// Server-side timeout, in seconds, requested in the query header.
pub const SERVER_TIMEOUT_SECS: u32 = 60;

/// One `element["key"="value"](bbox);` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryClause {
    /// Element type: `node`, `way`, or `relation`.
    pub element: &'static str,
    /// Tag key to filter on.
    pub key: &'static str,
    /// Required value; `None` matches any value.
    pub value: Option<&'static str>,
}

impl QueryClause {
    const fn any(element: &'static str, key: &'static str) -> Self {
        Self {
            element,
            key,
            value: None,
        }
    }

    const fn exact(element: &'static str, key: &'static str, value: &'static str) -> Self {
        Self {
            element,
            key,
            value: Some(value),
        }
    }

    fn render(&self, bbox: &str) -> String {
        match self.value {
            Some(value) => format!("{}[\"{}\"=\"{value}\"]({bbox});", self.element, self.key),
            None => format!("{}[\"{}\"]({bbox});", self.element, self.key),
        }
    }
}

/// Clauses requested for every area, in emission order.
pub const QUERY_CLAUSES: [QueryClause; 11] = [
    QueryClause::any("way", "building"),
    QueryClause::any("relation", "building"),
    QueryClause::any("way", "highway"),
    QueryClause::exact("way", "power", "line"),
    QueryClause::exact("node", "power", "tower"),
    QueryClause::exact("node", "power", "pole"),
    QueryClause::any("way", "railway"),
    QueryClause::exact("node", "amenity", "hospital"),
    QueryClause::exact("node", "amenity", "fire_station"),
    QueryClause::exact("way", "amenity", "hospital"),
    QueryClause::exact("way", "amenity", "fire_station"),
];

/// A rendered Overpass QL query.
///
/// Rendering is pure: equal bounds always produce byte-identical text.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use infrascan_core::Bounds;
/// use infrascan_data::OverpassQuery;
///
/// let bounds = Bounds::from_corners(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
/// let query = OverpassQuery::for_bounds(&bounds);
/// assert!(query.as_str().starts_with("[out:json][timeout:60];"));
/// assert!(query.as_str().contains("way[\"building\"](0.000000,0.000000,1.000000,1.000000);"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverpassQuery(String);

impl OverpassQuery {
    /// Render the query selecting every infrastructure clause within `bounds`.
    #[must_use]
    pub fn for_bounds(bounds: &Bounds) -> Self {
        let bbox = bbox_filter(bounds);
        let clauses: String = QUERY_CLAUSES
            .iter()
            .map(|clause| format!("  {}\n", clause.render(&bbox)))
            .collect();
        Self(format!(
            "[out:json][timeout:{SERVER_TIMEOUT_SECS}];\n(\n{clauses});\nout geom;\n"
        ))
    }

    /// Wrap pre-rendered query text.
    #[must_use]
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the query, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OverpassQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `south,west,north,east` with six decimal places.
fn bbox_filter(bounds: &Bounds) -> String {
    format!(
        "{:.6},{:.6},{:.6},{:.6}",
        bounds.min_lat(),
        bounds.min_lon(),
        bounds.max_lat(),
        bounds.max_lon()
    )
}
