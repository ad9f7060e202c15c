//! Shape records emitted by the interpreter.
//!
//! A run's output is an ordered list of [`Shape`]s. Each shape carries a
//! stable per-type id (`P0`, `L1`, `Pg0`, ...), a hex color, and optional
//! label/group metadata. The list serializes to the JSON consumed by the
//! embedding host's renderer.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Fallback swatches, cycled by emission order when a command supplies no
/// `#color` argument.
pub const PALETTE: [&str; 9] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c",
];

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// A polygon vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

/// One emitted drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    /// Stable id, unique within the shape's type prefix.
    pub id: String,
    /// Hex color; a palette fallback when the script gave none.
    pub color: String,
    /// Optional display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Id of the innermost enclosing `group` block, if any.
    #[serde(rename = "groupId", skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// The geometry payload.
    #[serde(flatten)]
    pub kind: ShapeKind,
}

/// The geometry payload of a shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Point {
        x: f64,
        y: f64,
    },
    /// An infinite line through two points; the extent is a rendering
    /// concern.
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Segment {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Circle {
        x: f64,
        y: f64,
        r: f64,
    },
    Polygon {
        points: Vec<Vertex>,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        #[serde(rename = "fontSize")]
        font_size: f64,
    },
}

// ---------------------------------------------------------------------------
// Id generation
// ---------------------------------------------------------------------------

/// Per-type id counters, each starting at 0.
#[derive(Debug, Default)]
pub struct ShapeIds {
    point: u32,
    line: u32,
    segment: u32,
    circle: u32,
    polygon: u32,
    text: u32,
}

impl ShapeIds {
    /// Mint the next id for a shape of the given kind.
    pub fn next_id(&mut self, kind: &ShapeKind) -> String {
        let (prefix, counter) = match kind {
            ShapeKind::Point { .. } => ("P", &mut self.point),
            ShapeKind::Line { .. } => ("L", &mut self.line),
            ShapeKind::Segment { .. } => ("S", &mut self.segment),
            ShapeKind::Circle { .. } => ("C", &mut self.circle),
            ShapeKind::Polygon { .. } => ("Pg", &mut self.polygon),
            ShapeKind::Text { .. } => ("Tx", &mut self.text),
        };
        let id = format!("{prefix}{counter}");
        *counter += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_count_per_type() {
        let mut ids = ShapeIds::default();
        let point = ShapeKind::Point { x: 0.0, y: 0.0 };
        let circle = ShapeKind::Circle { x: 0.0, y: 0.0, r: 1.0 };
        assert_eq!(ids.next_id(&point), "P0");
        assert_eq!(ids.next_id(&point), "P1");
        assert_eq!(ids.next_id(&circle), "C0");
        assert_eq!(ids.next_id(&point), "P2");
    }

    #[test]
    fn polygon_and_text_prefixes() {
        let mut ids = ShapeIds::default();
        let poly = ShapeKind::Polygon { points: Vec::new() };
        let text = ShapeKind::Text {
            x: 0.0,
            y: 0.0,
            content: String::new(),
            font_size: 12.0,
        };
        assert_eq!(ids.next_id(&poly), "Pg0");
        assert_eq!(ids.next_id(&text), "Tx0");
    }

    #[test]
    fn shape_serializes_with_type_tag() {
        let shape = Shape {
            id: "P0".to_owned(),
            color: "#ff0000".to_owned(),
            label: None,
            group_id: None,
            kind: ShapeKind::Point { x: 1.0, y: 2.0 },
        };
        let json = serde_json::to_string(&shape).expect("serialize");
        assert!(json.contains("\"type\":\"point\""), "json: {json}");
        assert!(json.contains("\"id\":\"P0\""), "json: {json}");
        assert!(!json.contains("label"), "absent label must be omitted: {json}");
    }

    #[test]
    fn text_serializes_camel_case_font_size() {
        let shape = Shape {
            id: "Tx0".to_owned(),
            color: "#000000".to_owned(),
            label: None,
            group_id: Some("g".to_owned()),
            kind: ShapeKind::Text {
                x: 0.0,
                y: 0.0,
                content: "hi".to_owned(),
                font_size: 14.0,
            },
        };
        let json = serde_json::to_string(&shape).expect("serialize");
        assert!(json.contains("\"fontSize\":14.0"), "json: {json}");
        assert!(json.contains("\"groupId\":\"g\""), "json: {json}");
    }
}
