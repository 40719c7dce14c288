//! Pointer-driven editing of an image's annotations
//!
//! The controller is the only code that writes annotation strings. It never
//! caches a decoded set: every operation reads the block's property, applies
//! the change and writes the re-encoded set straight back.

use uuid::Uuid;

use super::store::BlockPropertyStore;
use crate::domain::{Annotation, AnnotationSet, BoundingBox, Endpoint, Point};

/// Drag target for one coordinate pair of an annotation
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    pub annotation_id: String,
    /// `None` for a dot, the arrow end otherwise
    pub endpoint: Option<Endpoint>,
}

impl Handle {
    pub fn dot(annotation_id: impl Into<String>) -> Self {
        Self {
            annotation_id: annotation_id.into(),
            endpoint: None,
        }
    }

    pub fn arrow(annotation_id: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            annotation_id: annotation_id.into(),
            endpoint: Some(endpoint),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        block_id: String,
        annotation_id: String,
        endpoint: Option<Endpoint>,
    },
}

/// State machine for drag, delete and add gestures. One drag at a time.
#[derive(Debug, Default)]
pub struct InteractionController {
    state: DragState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start dragging `handle`. Ignored while another drag is active.
    pub fn pointer_down(&mut self, block_id: &str, handle: &Handle) -> bool {
        if self.is_dragging() {
            log::debug!("Ignoring pointer down on {:?}: drag already active", handle);
            return false;
        }
        self.state = DragState::Dragging {
            block_id: block_id.to_string(),
            annotation_id: handle.annotation_id.clone(),
            endpoint: handle.endpoint,
        };
        true
    }

    /// Move the dragged point under the pointer and persist the result.
    ///
    /// `position` is in client pixels; `bbox` is the image's on-screen box.
    /// Returns whether the store was written.
    pub fn pointer_move<S>(&mut self, store: &mut S, position: Point, bbox: &BoundingBox) -> bool
    where
        S: BlockPropertyStore + ?Sized,
    {
        let DragState::Dragging {
            block_id,
            annotation_id,
            endpoint,
        } = &self.state
        else {
            return false;
        };

        let mut set = AnnotationSet::decode(store.get(block_id).as_deref());
        let Some(annotation) = set.get_mut(annotation_id) else {
            log::debug!("Dragged annotation {} no longer exists", annotation_id);
            return false;
        };
        annotation.set_point(*endpoint, bbox.normalize(position));
        store.set(block_id, set.encode());
        true
    }

    /// End the drag, wherever the pointer is. Returns whether a drag ended.
    pub fn pointer_up(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }

    /// Delete the annotation owning `handle`. Does nothing mid-drag.
    pub fn shift_click<S>(&mut self, store: &mut S, block_id: &str, handle: &Handle) -> bool
    where
        S: BlockPropertyStore + ?Sized,
    {
        if self.is_dragging() {
            return false;
        }
        let mut set = AnnotationSet::decode(store.get(block_id).as_deref());
        if !set.remove(&handle.annotation_id) {
            return false;
        }
        log::debug!("Removed annotation {} from block {}", handle.annotation_id, block_id);
        store.set(block_id, set.encode());
        true
    }

    /// Append a dot at the image center; returns its id
    pub fn add_dot<S>(&mut self, store: &mut S, block_id: &str) -> String
    where
        S: BlockPropertyStore + ?Sized,
    {
        self.append(store, block_id, Annotation::default_dot(new_id()))
    }

    /// Append the default arrow; returns its id
    pub fn add_arrow<S>(&mut self, store: &mut S, block_id: &str) -> String
    where
        S: BlockPropertyStore + ?Sized,
    {
        self.append(store, block_id, Annotation::default_arrow(new_id()))
    }

    fn append<S>(&mut self, store: &mut S, block_id: &str, annotation: Annotation) -> String
    where
        S: BlockPropertyStore + ?Sized,
    {
        let id = annotation.id().to_string();
        let mut set = AnnotationSet::decode(store.get(block_id).as_deref());
        set.push(annotation);
        store.set(block_id, set.encode());
        id
    }
}

fn new_id() -> String {
    Uuid::now_v7().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::store::MemoryStore;

    const BLOCK: &str = "block-1";

    fn bbox() -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 200.0, 100.0)
    }

    fn load(store: &MemoryStore) -> AnnotationSet {
        AnnotationSet::decode(store.get(BLOCK).as_deref())
    }

    #[test]
    fn test_add_appends_default_placements() {
        let mut store = MemoryStore::new();
        let mut controller = InteractionController::new();
        let dot = controller.add_dot(&mut store, BLOCK);
        let arrow = controller.add_arrow(&mut store, BLOCK);
        assert_ne!(dot, arrow);
        assert!(!controller.is_dragging());

        let set = load(&store);
        let ids: Vec<&str> = set.iter().map(Annotation::id).collect();
        assert_eq!(ids, vec![dot.as_str(), arrow.as_str()]);
        assert_eq!(set.get(&dot), Some(&Annotation::default_dot(dot.clone())));
        assert_eq!(set.get(&arrow), Some(&Annotation::default_arrow(arrow.clone())));
    }

    #[test]
    fn test_drag_dot_writes_every_move() {
        let mut store = MemoryStore::new();
        let mut controller = InteractionController::new();
        let id = controller.add_dot(&mut store, BLOCK);

        assert!(controller.pointer_down(BLOCK, &Handle::dot(&id)));
        assert!(controller.pointer_move(&mut store, Point::new(50.0, 25.0), &bbox()));
        let Some(Annotation::Dot(dot)) = load(&store).get(&id).cloned() else {
            panic!("expected a dot");
        };
        assert_eq!(dot.position(), Point::new(0.25, 0.25));

        // Leaving the image clamps
        assert!(controller.pointer_move(&mut store, Point::new(-40.0, 400.0), &bbox()));
        let Some(Annotation::Dot(dot)) = load(&store).get(&id).cloned() else {
            panic!("expected a dot");
        };
        assert_eq!(dot.position(), Point::new(0.0, 1.0));
    }

    #[test]
    fn test_drag_arrow_terminus_only() {
        let mut store = MemoryStore::new();
        let mut controller = InteractionController::new();
        let id = controller.add_arrow(&mut store, BLOCK);

        controller.pointer_down(BLOCK, &Handle::arrow(&id, Endpoint::Terminus));
        controller.pointer_move(&mut store, Point::new(180.0, 10.0), &bbox());
        controller.pointer_up();

        let Some(Annotation::Arrow(arrow)) = load(&store).get(&id).cloned() else {
            panic!("expected an arrow");
        };
        assert_eq!(arrow.origin(), Point::new(0.3, 0.5));
        assert_eq!(arrow.terminus(), Point::new(0.9, 0.1));
    }

    #[test]
    fn test_idle_events_are_noops() {
        let mut store = MemoryStore::new();
        let mut controller = InteractionController::new();
        let id = controller.add_dot(&mut store, BLOCK);
        let before = store.get(BLOCK);

        assert!(!controller.pointer_up());
        assert!(!controller.pointer_move(&mut store, Point::new(10.0, 10.0), &bbox()));
        assert_eq!(store.get(BLOCK), before);

        controller.pointer_down(BLOCK, &Handle::dot(&id));
        assert!(controller.pointer_up());
        assert!(!controller.pointer_move(&mut store, Point::new(10.0, 10.0), &bbox()));
        assert_eq!(store.get(BLOCK), before);
        assert_eq!(controller.state(), &DragState::Idle);
    }

    #[test]
    fn test_single_active_drag() {
        let mut store = MemoryStore::new();
        let mut controller = InteractionController::new();
        let first = controller.add_dot(&mut store, BLOCK);
        let second = controller.add_dot(&mut store, BLOCK);

        assert!(controller.pointer_down(BLOCK, &Handle::dot(&first)));
        assert!(!controller.pointer_down(BLOCK, &Handle::dot(&second)));
        controller.pointer_move(&mut store, Point::new(0.0, 0.0), &bbox());

        let set = load(&store);
        let moved = crate::domain::Dot::new(first.clone(), Point::new(0.0, 0.0));
        assert_eq!(set.get(&first), Some(&Annotation::Dot(moved)));
        assert_eq!(set.get(&second), Some(&Annotation::default_dot(second.clone())));
    }

    #[test]
    fn test_drag_leaves_other_annotations_untouched() {
        let mut store = MemoryStore::new();
        let mut controller = InteractionController::new();
        let raw = concat!(
            r#"[{"type":"dot","id":"still","x":0.9856906946328695,"y":0.1234567890123457},"#,
            r#"{"type":"arrow","id":"moving","x":0.3,"y":0.5,"x2":0.7,"y2":0.5},"#,
            r#"{"type":"dot","id":"also","x":0.333333333333333,"y":0.6666666666666666}]"#
        );
        store.set(BLOCK, raw.to_string());

        controller.pointer_down(BLOCK, &Handle::arrow("moving", Endpoint::Origin));
        assert!(controller.pointer_move(&mut store, Point::new(20.0, 10.0), &bbox()));

        let encoded = store.get(BLOCK).unwrap_or_default();
        let expected = concat!(
            r#"[{"type":"dot","id":"still","x":0.9856906946328695,"y":0.1234567890123457},"#,
            r#"{"type":"arrow","id":"moving","x":0.1,"y":0.1,"x2":0.7,"y2":0.5},"#,
            r#"{"type":"dot","id":"also","x":0.333333333333333,"y":0.6666666666666666}]"#
        );
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_shift_click_deletes_without_dragging() {
        let mut store = MemoryStore::new();
        let mut controller = InteractionController::new();
        let keep = controller.add_dot(&mut store, BLOCK);
        let gone = controller.add_arrow(&mut store, BLOCK);

        assert!(controller.shift_click(&mut store, BLOCK, &Handle::arrow(&gone, Endpoint::Origin)));
        assert!(!controller.is_dragging());
        let set = load(&store);
        assert_eq!(set.len(), 1);
        assert!(set.get(&keep).is_some());
        assert!(!controller.shift_click(&mut store, BLOCK, &Handle::dot("missing")));
    }

    #[test]
    fn test_move_after_delete_is_noop() {
        let mut store = MemoryStore::new();
        let mut controller = InteractionController::new();
        let id = controller.add_dot(&mut store, BLOCK);
        controller.pointer_down(BLOCK, &Handle::dot(&id));
        store.set(BLOCK, "[]".to_string());
        assert!(!controller.pointer_move(&mut store, Point::new(1.0, 1.0), &bbox()));
        assert_eq!(store.get(BLOCK).as_deref(), Some("[]"));
    }

    #[test]
    fn test_blocks_are_independent() {
        let mut store = MemoryStore::new();
        let mut controller = InteractionController::new();
        controller.add_dot(&mut store, "a");
        controller.add_dot(&mut store, "b");
        store.forget("a");
        assert!(store.get("a").is_none());
        assert_eq!(AnnotationSet::decode(store.get("b").as_deref()).len(), 1);
    }
}
