//! Annotation types and their string codec
//!
//! All coordinates are normalized to the image bounding box and clamped to
//! [0,1] on every write. The persisted form is a JSON array:
//!
//! ```text
//! [{"id":"..","type":"dot","x":0.5,"y":0.5},
//!  {"id":"..","type":"arrow","x":0.3,"y":0.5,"x2":0.7,"y2":0.5}]
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use super::geometry::{Point, clamp_unit};

/// Which end of an arrow a handle controls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Origin,
    Terminus,
}

/// Single point marker
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dot {
    id: String,
    x: f64,
    y: f64,
}

impl Dot {
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        let position = position.clamped();
        Self {
            id: id.into(),
            x: position.x,
            y: position.y,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Straight arrow pointing from origin to terminus
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Arrow {
    id: String,
    x: f64,
    y: f64,
    x2: f64,
    y2: f64,
}

impl Arrow {
    pub fn new(id: impl Into<String>, origin: Point, terminus: Point) -> Self {
        let origin = origin.clamped();
        let terminus = terminus.clamped();
        Self {
            id: id.into(),
            x: origin.x,
            y: origin.y,
            x2: terminus.x,
            y2: terminus.y,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn terminus(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> Point {
        match endpoint {
            Endpoint::Origin => self.origin(),
            Endpoint::Terminus => self.terminus(),
        }
    }
}

/// Closed set of annotation kinds
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Annotation {
    Dot(Dot),
    Arrow(Arrow),
}

impl Annotation {
    /// Dot placed at the image center
    pub fn default_dot(id: impl Into<String>) -> Self {
        Annotation::Dot(Dot::new(id, Point::new(0.5, 0.5)))
    }

    /// Short horizontal arrow starting left of center
    pub fn default_arrow(id: impl Into<String>) -> Self {
        Annotation::Arrow(Arrow::new(
            id,
            Point::new(0.3, 0.5),
            Point::new(0.7, 0.5),
        ))
    }

    pub fn id(&self) -> &str {
        match self {
            Annotation::Dot(dot) => dot.id(),
            Annotation::Arrow(arrow) => arrow.id(),
        }
    }

    /// Move one point of the annotation. Dots ignore `endpoint`; an arrow
    /// with no endpoint given moves its origin.
    pub fn set_point(&mut self, endpoint: Option<Endpoint>, point: Point) {
        let point = point.clamped();
        match self {
            Annotation::Dot(dot) => {
                dot.x = point.x;
                dot.y = point.y;
            }
            Annotation::Arrow(arrow) => match endpoint.unwrap_or(Endpoint::Origin) {
                Endpoint::Origin => {
                    arrow.x = point.x;
                    arrow.y = point.y;
                }
                Endpoint::Terminus => {
                    arrow.x2 = point.x;
                    arrow.y2 = point.y;
                }
            },
        }
    }

    /// Lenient parse of one persisted entry
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match obj.get("type").and_then(Value::as_str)? {
            "dot" => Some(Annotation::Dot(Dot::new(
                id,
                Point::new(coord(obj, "x"), coord(obj, "y")),
            ))),
            "arrow" => Some(Annotation::Arrow(Arrow::new(
                id,
                Point::new(coord(obj, "x"), coord(obj, "y")),
                Point::new(coord(obj, "x2"), coord(obj, "y2")),
            ))),
            _ => None,
        }
    }
}

/// Missing or non-numeric coordinates read as 0
fn coord(obj: &Map<String, Value>, key: &str) -> f64 {
    clamp_unit(obj.get(key).and_then(Value::as_f64).unwrap_or(0.0))
}

/// Ordered annotations of one image; later entries paint on top
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnnotationSet(Vec<Annotation>);

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the persisted string. Never fails: absent, empty or malformed
    /// input yields an empty set and malformed entries are dropped.
    pub fn decode(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };
        let entries = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                log::warn!("Annotation data is not an array, ignoring it");
                return Self::default();
            }
            Err(err) => {
                log::warn!("Malformed annotation data, ignoring it: {}", err);
                return Self::default();
            }
        };

        let total = entries.len();
        let annotations: Vec<Annotation> =
            entries.iter().filter_map(Annotation::from_value).collect();
        if annotations.len() != total {
            log::debug!(
                "Dropped {} malformed annotation entries",
                total - annotations.len()
            );
        }
        Self(annotations)
    }

    /// Serialize in paint order
    pub fn encode(&self) -> String {
        match serde_json::to_string(self) {
            Ok(s) => s,
            Err(err) => {
                log::error!("Failed to encode annotations: {}", err);
                "[]".to_string()
            }
        }
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.0.push(annotation);
    }

    /// Remove the annotation with `id`; returns whether one was removed
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|a| a.id() != id);
        self.0.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.0.iter().find(|a| a.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Annotation> {
        self.0.iter_mut().find(|a| a.id() == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Annotation>> for AnnotationSet {
    fn from(annotations: Vec<Annotation>) -> Self {
        Self(annotations)
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
