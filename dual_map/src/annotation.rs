//! User drawn measurement shapes, one collection per viewport.
//!
//! Shapes are never mirrored between viewports; only cameras are synced.

use std::collections::BTreeMap;

use log::debug;

use crate::geodesy::{self, Measurement};
use crate::viewport::{LatLng, Side};

pub type ShapeId = u64;

/// Geometry type produced by the draw tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Point,
    LineString,
    Polygon,
}

/// A drawn shape and its current measurement label.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationShape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub vertices: Vec<LatLng>,
    pub side: Side,
    pub measurement: Option<Measurement>,
    pub label: Option<String>,
}

/// Events emitted by the external draw/edit tool.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    Created {
        kind: ShapeKind,
        vertices: Vec<LatLng>,
    },
    Edited {
        id: ShapeId,
        vertices: Vec<LatLng>,
    },
    Deleted {
        id: ShapeId,
    },
}

/// Measures a shape. Points and shapes with too few vertices have no
/// measurement.
pub fn measure(kind: ShapeKind, vertices: &[LatLng]) -> Option<Measurement> {
    match kind {
        ShapeKind::Point => None,
        ShapeKind::LineString if vertices.len() >= 2 => Some(Measurement::Distance {
            meters: geodesy::distance(vertices),
        }),
        ShapeKind::Polygon if vertices.len() >= 3 => Some(Measurement::Area {
            square_meters: geodesy::area(vertices),
            perimeter_meters: geodesy::perimeter(vertices),
        }),
        _ => None,
    }
}

/// Annotation collection of a single viewport.
#[derive(Debug, Clone)]
pub struct AnnotationLayer {
    side: Side,
    shapes: BTreeMap<ShapeId, AnnotationShape>,
    next_id: ShapeId,
    open_label: Option<ShapeId>,
}

impl AnnotationLayer {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            shapes: BTreeMap::new(),
            next_id: 1,
            open_label: None,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Stores a finished shape, measures it and opens its label.
    pub fn on_shape_created(&mut self, kind: ShapeKind, vertices: Vec<LatLng>) -> ShapeId {
        let id = self.next_id;
        self.next_id += 1;
        let mut shape = AnnotationShape {
            id,
            kind,
            vertices,
            side: self.side,
            measurement: None,
            label: None,
        };
        self.relabel(&mut shape);
        self.shapes.insert(id, shape);
        id
    }

    /// Replaces the vertices of an existing shape and refreshes its label.
    /// Unknown ids are ignored.
    pub fn on_shape_edited(&mut self, id: ShapeId, vertices: Vec<LatLng>) -> Option<&AnnotationShape> {
        let mut shape = self.shapes.remove(&id)?;
        shape.vertices = vertices;
        self.relabel(&mut shape);
        self.shapes.insert(id, shape);
        self.shapes.get(&id)
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<AnnotationShape> {
        if self.open_label == Some(id) {
            self.open_label = None;
        }
        self.shapes.remove(&id)
    }

    /// Routes a draw tool event. Returns the affected shape id.
    pub fn handle(&mut self, event: DrawEvent) -> Option<ShapeId> {
        match event {
            DrawEvent::Created { kind, vertices } => Some(self.on_shape_created(kind, vertices)),
            DrawEvent::Edited { id, vertices } => self.on_shape_edited(id, vertices).map(|s| s.id),
            DrawEvent::Deleted { id } => self.remove(id).map(|s| s.id),
        }
    }

    pub fn get(&self, id: ShapeId) -> Option<&AnnotationShape> {
        self.shapes.get(&id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &AnnotationShape> {
        self.shapes.values()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shape whose label overlay is currently open.
    pub fn open_label(&self) -> Option<&AnnotationShape> {
        self.open_label.and_then(|id| self.shapes.get(&id))
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.open_label = None;
    }

    fn relabel(&mut self, shape: &mut AnnotationShape) {
        shape.measurement = measure(shape.kind, &shape.vertices);
        shape.label = shape.measurement.map(|m| m.label());
        match &shape.label {
            Some(label) => {
                debug!("{} shape {}: {}", self.side, shape.id, label.replace('\n', ", "));
                self.open_label = Some(shape.id);
            }
            None if self.open_label == Some(shape.id) => self.open_label = None,
            None => {}
        }
    }
}
