//! GeoJSON features as the quiz sees them.
//!
//! Only the parts of GeoJSON the quiz needs are modelled: a feature
//! collection, feature properties and the handful of geometry types that
//! can be drawn. Property keys are the ones used by the existing data files
//! and must not be renamed.

use std::fmt;
use std::sync::Arc;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Property holding a street's display name.
pub const STREET_NAME_KEY: &str = "name";
/// Property holding a street's rank; 1 and 2 are quiz-worthy.
pub const STREET_RANK_KEY: &str = "rank";
/// Property holding an intersection's name.
pub const CROSSING_NAME_KEY: &str = "交差点名";
pub const FIRST_STREET_KEY: &str = "Street1";
pub const SECOND_STREET_KEY: &str = "street2";

/// A longitude/latitude pair. Extra ordinates (altitude) are dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionVisitor;

        impl<'de> Visitor<'de> for PositionVisitor {
            type Value = Position;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a position array of at least two numbers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Position, A::Error> {
                let lon: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let lat: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                while seq.next_element::<de::IgnoredAny>()?.is_some() {}
                Ok(Position { lon, lat })
            }
        }

        deserializer.deserialize_seq(PositionVisitor)
    }
}

/// Axis-aligned lon/lat bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Position,
    pub max: Position,
}

impl Bounds {
    pub fn around(p: Position) -> Self {
        Self { min: p, max: p }
    }

    pub fn extend(&mut self, p: Position) {
        self.min.lon = self.min.lon.min(p.lon);
        self.min.lat = self.min.lat.min(p.lat);
        self.max.lon = self.max.lon.max(p.lon);
        self.max.lat = self.max.lat.max(p.lat);
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.min.lon + self.max.lon) / 2.0,
            (self.min.lat + self.max.lat) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max.lon - self.min.lon
    }

    pub fn height(&self) -> f64 {
        self.max.lat - self.min.lat
    }

    pub fn contains(&self, p: Position) -> bool {
        (self.min.lon..=self.max.lon).contains(&p.lon)
            && (self.min.lat..=self.max.lat).contains(&p.lat)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Any geometry that does not decode as one of the drawable types,
    /// whatever its members, becomes `Unsupported` instead of failing the
    /// whole collection.
    pub fn from_value(value: Value) -> Self {
        Geometry::deserialize(value).unwrap_or(Geometry::Unsupported)
    }

    /// The point of a Point geometry.
    pub fn point(&self) -> Option<Position> {
        match self {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }

    /// Every drawable path of the geometry. Polygon rings are returned as
    /// closed paths; points yield nothing.
    pub fn paths(&self) -> Vec<&[Position]> {
        match self {
            Geometry::LineString(line) => vec![line.as_slice()],
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().map(Vec::as_slice).collect()
            }
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter().map(Vec::as_slice))
                .collect(),
            Geometry::Point(_) | Geometry::Unsupported => Vec::new(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        if let Some(p) = self.point() {
            return Some(Bounds::around(p));
        }
        let mut positions = self.paths().into_iter().flatten();
        let mut bounds = Bounds::around(*positions.next()?);
        for p in positions {
            bounds.extend(*p);
        }
        Some(bounds)
    }
}

/// Index of a feature within the file it was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Option<Geometry>, properties: Map<String, Value>) -> Self {
        Self {
            id,
            geometry,
            properties,
        }
    }

    /// A non-empty string property. Numbers are not coerced.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.properties.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    pub fn street_name(&self) -> Option<&str> {
        self.text(STREET_NAME_KEY)
    }

    pub fn crossing_name(&self) -> Option<&str> {
        self.text(CROSSING_NAME_KEY)
    }

    /// The two street names of an intersection, if both are present.
    pub fn crossing_streets(&self) -> Option<(&str, &str)> {
        Some((self.text(FIRST_STREET_KEY)?, self.text(SECOND_STREET_KEY)?))
    }

    /// Rank 1 or 2 streets with a name are eligible for the street quiz.
    pub fn is_quiz_street(&self) -> bool {
        matches!(self.number(STREET_RANK_KEY), Some(r) if r == 1.0 || r == 2.0)
            && self.street_name().is_some()
    }

    /// Named intersections with both street names and a point location.
    pub fn is_quiz_intersection(&self) -> bool {
        self.crossing_name().is_some()
            && self.crossing_streets().is_some()
            && self.point().is_some()
    }

    pub fn point(&self) -> Option<Position> {
        self.geometry.as_ref().and_then(Geometry::point)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.geometry.as_ref().and_then(Geometry::bounds)
    }
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawDocument {
    FeatureCollection { features: Vec<RawFeature> },
    #[serde(other)]
    Other,
}

/// Parses a GeoJSON document. Returns `None` if the document is valid JSON
/// but not a FeatureCollection.
pub fn parse_feature_collection(bytes: &[u8]) -> serde_json::Result<Option<Vec<Arc<Feature>>>> {
    match serde_json::from_slice::<RawDocument>(bytes)? {
        RawDocument::FeatureCollection { features } => Ok(Some(
            features
                .into_iter()
                .enumerate()
                .map(|(idx, raw)| {
                    Arc::new(Feature::new(
                        FeatureId(idx),
                        raw.geometry.map(Geometry::from_value),
                        raw.properties.unwrap_or_default(),
                    ))
                })
                .collect(),
        )),
        RawDocument::Other => Ok(None),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collection_with_mixed_geometries() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "Oike-dori", "rank": 1},
                 "geometry": {"type": "LineString", "coordinates": [[135.75, 35.01, 0.0], [135.77, 35.01]]}},
                {"type": "Feature", "properties": {"交差点名": "烏丸御池", "Street1": "烏丸通", "street2": "御池通"},
                 "geometry": {"type": "Point", "coordinates": [135.759, 35.010]}},
                {"type": "Feature", "properties": null, "geometry": null},
                {"type": "Feature", "properties": {}, "geometry": {"type": "GeometryCollection", "geometries": []}}
            ]
        }"#;

        let features = parse_feature_collection(doc.as_bytes()).unwrap().unwrap();
        assert_eq!(features.len(), 4);
        assert_eq!(features[0].street_name(), Some("Oike-dori"));
        assert!(features[0].is_quiz_street());
        assert_eq!(features[1].crossing_name(), Some("烏丸御池"));
        assert_eq!(features[1].crossing_streets(), Some(("烏丸通", "御池通")));
        assert!(features[1].is_quiz_intersection());
        assert!(features[2].geometry.is_none());
        assert_eq!(features[3].geometry, Some(Geometry::Unsupported));
        assert_eq!(features[3].id, FeatureId(3));
    }

    #[test]
    fn unknown_geometry_with_coordinates_keeps_collection() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "Oike-dori", "rank": 1},
                 "geometry": {"type": "LineString", "coordinates": [[135.75, 35.01], [135.77, 35.01]]}},
                {"type": "Feature", "properties": {"name": "Stops"},
                 "geometry": {"type": "MultiPoint", "coordinates": [[1, 2], [3, 4]]}}
            ]
        }"#;

        let features = parse_feature_collection(doc.as_bytes()).unwrap().unwrap();
        assert_eq!(features.len(), 2);
        assert!(features[0].is_quiz_street());
        assert_eq!(features[1].geometry, Some(Geometry::Unsupported));
        assert!(features[1].bounds().is_none());
    }

    #[test]
    fn geometry_with_bbox_member_still_decodes() {
        let geometry = Geometry::from_value(serde_json::json!({
            "type": "Point",
            "bbox": [135.0, 35.0, 136.0, 36.0],
            "coordinates": [135.759, 35.010]
        }));
        assert_eq!(geometry.point().map(|p| p.lon), Some(135.759));
    }

    #[test]
    fn non_collection_document_is_rejected() {
        let doc = r#"{"type": "Feature", "properties": {}, "geometry": null}"#;
        assert!(parse_feature_collection(doc.as_bytes()).unwrap().is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_feature_collection(b"{\"type\": \"FeatureCollection\"").is_err());
    }

    #[test]
    fn rank_must_be_one_or_two() {
        assert!(fixtures::street(0, "A", 1).is_quiz_street());
        assert!(fixtures::street(0, "A", 2).is_quiz_street());
        assert!(!fixtures::street(0, "A", 3).is_quiz_street());
        assert!(!fixtures::street(0, "", 1).is_quiz_street());
    }

    #[test]
    fn string_rank_is_not_eligible() {
        let mut props = Map::new();
        props.insert("name".into(), Value::from("A"));
        props.insert("rank".into(), Value::from("1"));
        let f = Feature::new(FeatureId(0), None, props);
        assert!(!f.is_quiz_street());
    }

    #[test]
    fn intersection_requires_point_geometry() {
        let f = fixtures::intersection(0, "X", "A", "B");
        let line = Feature::new(
            FeatureId(1),
            Some(Geometry::LineString(vec![Position::new(0.0, 0.0)])),
            f.properties.clone(),
        );
        assert!(f.is_quiz_intersection());
        assert!(!line.is_quiz_intersection());
    }

    #[test]
    fn bounds_cover_every_path() {
        let g = Geometry::MultiLineString(vec![
            vec![Position::new(1.0, 2.0), Position::new(3.0, 1.0)],
            vec![Position::new(-1.0, 5.0)],
        ]);
        let b = g.bounds().unwrap();
        assert_eq!(b.min, Position::new(-1.0, 1.0));
        assert_eq!(b.max, Position::new(3.0, 5.0));
        assert_eq!(b.center(), Position::new(1.0, 3.0));
    }

    #[test]
    fn point_bounds_are_degenerate() {
        let b = Geometry::Point(Position::new(1.0, 2.0)).bounds().unwrap();
        assert_eq!(b.width(), 0.0);
        assert!(b.contains(Position::new(1.0, 2.0)));
    }
}
