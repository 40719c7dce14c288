//! Live overlay drawn over the image in the editor
//!
//! Handles are positioned with percentage offsets so they follow the image
//! when it is resized. Pointer events on the overlay are routed to the
//! [`InteractionController`].

use super::SurfaceRenderer;
use super::geometry::PercentSpace;
use crate::annotations::{BlockPropertyStore, Handle, InteractionController};
use crate::domain::{
    Annotation, AnnotationSet, BoundingBox, Endpoint, ImageContext, Point, normalized_to_percent,
};

/// Extra grab radius around a handle, in CSS px (the white border)
const HANDLE_SLACK_PX: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleShape {
    Circle,
    /// Rotated square marking an arrow's end
    Diamond,
}

/// One draggable handle
#[derive(Clone, Debug, PartialEq)]
pub struct HandleView {
    pub handle: Handle,
    /// Normalized center
    pub position: Point,
    /// CSS `left`, e.g. `"30%"`
    pub left: String,
    /// CSS `top`
    pub top: String,
    pub size_px: f64,
    pub shape: HandleShape,
    pub title: &'static str,
}

/// A stroke in [`PercentSpace`] units
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeView {
    pub annotation_id: String,
    pub from: Point,
    pub to: Point,
}

/// Output of the interactive surface
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    /// Image the editor shows under the handles
    pub src: String,
    pub space: PercentSpace,
    /// In paint order; the last one is on top
    pub handles: Vec<HandleView>,
    pub shafts: Vec<StrokeView>,
    /// Two per arrow, tip to each wing
    pub head_strokes: Vec<StrokeView>,
}

/// Pointer input in client pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down { position: Point, shift: bool },
    Move { position: Point },
    Up,
}

impl Overlay {
    /// Topmost handle under `position`
    pub fn handle_at(&self, position: Point, bbox: &BoundingBox) -> Option<&HandleView> {
        self.handles.iter().rev().find(|view| {
            let center = bbox.to_pixels(view.position);
            center.distance(position) <= view.size_px / 2.0 + HANDLE_SLACK_PX
        })
    }

    /// Route a pointer event. Returns whether the controller acted on it.
    pub fn dispatch<S>(
        &self,
        controller: &mut InteractionController,
        store: &mut S,
        block_id: &str,
        event: PointerEvent,
        bbox: &BoundingBox,
    ) -> bool
    where
        S: BlockPropertyStore + ?Sized,
    {
        match event {
            PointerEvent::Down { position, shift } => {
                let Some(view) = self.handle_at(position, bbox) else {
                    return false;
                };
                if shift {
                    controller.shift_click(store, block_id, &view.handle)
                } else {
                    controller.pointer_down(block_id, &view.handle)
                }
            }
            PointerEvent::Move { position } => controller.pointer_move(store, position, bbox),
            PointerEvent::Up => controller.pointer_up(),
        }
    }
}

/// Builds the live overlay
#[derive(Clone, Copy, Debug, Default)]
pub struct InteractiveRenderer;

impl SurfaceRenderer for InteractiveRenderer {
    type Output = Overlay;

    fn render(&self, image: &ImageContext, annotations: &AnnotationSet) -> Overlay {
        let space = PercentSpace::new(image.aspect());
        let mut overlay = Overlay {
            src: image.display_src().to_string(),
            space,
            handles: Vec::new(),
            shafts: Vec::new(),
            head_strokes: Vec::new(),
        };

        for annotation in annotations {
            match annotation {
                Annotation::Dot(dot) => {
                    overlay.handles.push(handle_view(
                        Handle::dot(dot.id()),
                        dot.position(),
                        14.0,
                        HandleShape::Circle,
                        "Drag to move. Shift+Click to delete",
                    ));
                }
                Annotation::Arrow(arrow) => {
                    let head = space.arrowhead(arrow.origin(), arrow.terminus());
                    let id = arrow.id().to_string();
                    overlay.shafts.push(StrokeView {
                        annotation_id: id.clone(),
                        from: space.project(arrow.origin()),
                        to: head.tip,
                    });
                    for wing in [head.left_wing, head.right_wing] {
                        overlay.head_strokes.push(StrokeView {
                            annotation_id: id.clone(),
                            from: head.tip,
                            to: wing,
                        });
                    }
                    for (endpoint, shape, title) in [
                        (Endpoint::Origin, HandleShape::Circle, "Drag arrow start"),
                        (
                            Endpoint::Terminus,
                            HandleShape::Diamond,
                            "Drag arrow end (shift+click to delete)",
                        ),
                    ] {
                        overlay.handles.push(handle_view(
                            Handle::arrow(arrow.id(), endpoint),
                            arrow.endpoint(endpoint),
                            12.0,
                            shape,
                            title,
                        ));
                    }
                }
            }
        }

        overlay
    }
}

fn handle_view(
    handle: Handle,
    position: Point,
    size_px: f64,
    shape: HandleShape,
    title: &'static str,
) -> HandleView {
    HandleView {
        handle,
        position,
        left: normalized_to_percent(position.x),
        top: normalized_to_percent(position.y),
        size_px,
        shape,
        title,
    }
}
