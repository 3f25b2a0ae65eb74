use crate::constants::FEATURE_ID_PROPERTY;
use crate::core::geo::{LatLng, LatLngBounds};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A GeoJSON position. Only longitude and latitude are kept; altitude is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn to_lat_lng(self) -> LatLng {
        LatLng::from_lng_lat(self.lng, self.lat)
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.lng, self.lat].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let coords = Vec::<f64>::deserialize(deserializer)?;
        match coords.as_slice() {
            [lng, lat, ..] => Ok(Position::new(*lng, *lat)),
            _ => Err(serde::de::Error::invalid_length(
                coords.len(),
                &"a position with at least two coordinates",
            )),
        }
    }
}

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

impl GeoJsonGeometry {
    const TYPE_NAMES: [&'static str; 7] = [
        "Point",
        "LineString",
        "Polygon",
        "MultiPoint",
        "MultiLineString",
        "MultiPolygon",
        "GeometryCollection",
    ];

    /// Point geometries are drawn as markers rather than paths
    pub fn is_point_like(&self) -> bool {
        matches!(
            self,
            GeoJsonGeometry::Point { .. } | GeoJsonGeometry::MultiPoint { .. }
        )
    }

    /// All vertices of the geometry, in document order
    pub fn lat_lngs(&self) -> Vec<LatLng> {
        let mut out = Vec::new();
        self.collect_lat_lngs(&mut out);
        out
    }

    fn collect_lat_lngs(&self, out: &mut Vec<LatLng>) {
        match self {
            GeoJsonGeometry::Point { coordinates } => out.push(coordinates.to_lat_lng()),
            GeoJsonGeometry::LineString { coordinates }
            | GeoJsonGeometry::MultiPoint { coordinates } => {
                out.extend(coordinates.iter().map(|p| p.to_lat_lng()))
            }
            GeoJsonGeometry::Polygon { coordinates }
            | GeoJsonGeometry::MultiLineString { coordinates } => out.extend(
                coordinates
                    .iter()
                    .flat_map(|ring| ring.iter().map(|p| p.to_lat_lng())),
            ),
            GeoJsonGeometry::MultiPolygon { coordinates } => out.extend(
                coordinates
                    .iter()
                    .flatten()
                    .flat_map(|ring| ring.iter().map(|p| p.to_lat_lng())),
            ),
            GeoJsonGeometry::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.collect_lat_lngs(out);
                }
            }
        }
    }

    /// Gets the bounding box of the geometry; `None` when it has no finite vertex
    pub fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(&self.lat_lngs())
    }
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl GeoJsonFeature {
    pub fn from_geometry(geometry: GeoJsonGeometry) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: Map::new(),
        }
    }

    /// Row id used to open the feature inspector (`properties._id`)
    pub fn inspect_id(&self) -> Option<String> {
        match self.properties.get(FEATURE_ID_PROPERTY)? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let geometry = match object.get("geometry") {
            None | Some(Value::Null) => None,
            Some(geometry) => Some(GeoJsonGeometry::deserialize(geometry).ok()?),
        };
        let properties = match object.get("properties") {
            Some(Value::Object(properties)) => properties.clone(),
            _ => Map::new(),
        };
        Some(Self {
            id: object.get("id").cloned(),
            geometry,
            properties,
        })
    }
}

/// Features extracted from an arbitrary GeoJSON payload.
///
/// Parsing never fails: unrecognized documents yield no features and broken
/// features inside a collection are counted in `skipped` and left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedGeoJson {
    pub features: Vec<GeoJsonFeature>,
    pub skipped: usize,
}

impl ParsedGeoJson {
    /// Accepts a FeatureCollection, a Feature or a bare geometry
    pub fn from_value(value: &Value) -> Self {
        let mut parsed = ParsedGeoJson::default();
        match value.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => {
                let features = value
                    .get("features")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                for feature in features {
                    parsed.push(GeoJsonFeature::from_value(feature));
                }
            }
            Some("Feature") => parsed.push(GeoJsonFeature::from_value(value)),
            Some(kind) if GeoJsonGeometry::TYPE_NAMES.contains(&kind) => parsed.push(
                GeoJsonGeometry::deserialize(value)
                    .ok()
                    .map(GeoJsonFeature::from_geometry),
            ),
            _ => parsed.skipped += 1,
        }
        parsed
    }

    fn push(&mut self, feature: Option<GeoJsonFeature>) {
        match feature {
            Some(feature) => self.features.push(feature),
            None => self.skipped += 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Gets the bounding box of all features
    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref().and_then(GeoJsonGeometry::bounds))
            .reduce(|acc, b| acc.union(&b))
    }
}
