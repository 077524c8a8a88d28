//! In-memory page
//!
//! A tiny element tree with fixed rects. Drives the headless demo and every
//! test that needs a page without a browser.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{CloneId, ElementId, PageSurface, RenderTarget, ScrollMetrics, SyntheticPart, Viewport};
use crate::Rect;
use crate::renderer::css::Transform;
use crate::sim::{CloneTransform, Debris};

#[derive(Debug, Clone)]
struct MemoryNode {
    parent: Option<ElementId>,
    rect: Option<Rect>,
    selectors: Vec<String>,
    hidden: bool,
    overlay: bool,
}

/// A copy living in the overlay
#[derive(Debug, Clone)]
pub struct MemoryClone {
    pub source: Option<ElementId>,
    pub part: Option<SyntheticPart>,
    pub rect: Rect,
    pub transform: CloneTransform,
}

#[derive(Debug, Clone)]
pub struct MemorySurface {
    viewport: Viewport,
    scroll: ScrollMetrics,
    nodes: Vec<MemoryNode>,
    clones: BTreeMap<CloneId, MemoryClone>,
    next_clone: u32,
    shaking: bool,
    controls_visible: bool,
    debris_drawn: usize,
    refuse_clones: bool,
}

impl MemorySurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Viewport { width, height },
            scroll: ScrollMetrics {
                document_height: height,
                scroll_y: 0.0,
            },
            nodes: Vec::new(),
            clones: BTreeMap::new(),
            next_clone: 0,
            shaking: false,
            controls_visible: false,
            debris_drawn: 0,
            refuse_clones: false,
        }
    }

    pub fn with_scroll(mut self, document_height: f32, scroll_y: f32) -> Self {
        self.scroll = ScrollMetrics {
            document_height,
            scroll_y,
        };
        self
    }

    /// Add an element matched by each of `selectors` (compared verbatim)
    pub fn add_element(
        &mut self,
        parent: Option<ElementId>,
        selectors: &[&str],
        rect: Rect,
    ) -> ElementId {
        self.push_node(parent, selectors, Some(rect), false)
    }

    /// Element inside the effect overlay; never a break target
    pub fn add_overlay_element(&mut self, selectors: &[&str], rect: Rect) -> ElementId {
        self.push_node(None, selectors, Some(rect), true)
    }

    fn push_node(
        &mut self,
        parent: Option<ElementId>,
        selectors: &[&str],
        rect: Option<Rect>,
        overlay: bool,
    ) -> ElementId {
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(MemoryNode {
            parent,
            rect,
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            hidden: false,
            overlay,
        });
        id
    }

    /// `None` makes the element unmeasurable (detached)
    pub fn set_rect(&mut self, element: ElementId, rect: Option<Rect>) {
        if let Some(node) = self.nodes.get_mut(element.0 as usize) {
            node.rect = rect;
        }
    }

    /// Make every later `attach_clone` fail
    pub fn refuse_clones(&mut self, refuse: bool) {
        self.refuse_clones = refuse;
    }

    pub fn clones(&self) -> impl Iterator<Item = (CloneId, &MemoryClone)> {
        self.clones.iter().map(|(id, c)| (*id, c))
    }

    pub fn clone_count(&self) -> usize {
        self.clones.len()
    }

    pub fn clone_of(&self, element: ElementId) -> Option<&MemoryClone> {
        self.clones.values().find(|c| c.source == Some(element))
    }

    pub fn is_hidden(&self, element: ElementId) -> bool {
        self.nodes
            .get(element.0 as usize)
            .is_some_and(|node| node.hidden)
    }

    pub fn hidden_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.hidden).count()
    }

    pub fn is_shaking(&self) -> bool {
        self.shaking
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    /// Pieces passed to the last `draw_debris`
    pub fn debris_drawn(&self) -> usize {
        self.debris_drawn
    }
}

impl PageSurface for MemorySurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        self.scroll
    }

    fn query_all(&mut self, selector: &str) -> Vec<ElementId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.selectors.iter().any(|s| s == selector))
            .map(|(i, _)| ElementId(i as u32))
            .collect()
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.nodes.get(id.0 as usize).and_then(|n| n.parent);
        }
        false
    }

    fn in_overlay(&self, element: ElementId) -> bool {
        self.nodes
            .get(element.0 as usize)
            .is_some_and(|node| node.overlay)
    }

    fn measure(&self, element: ElementId) -> Option<Rect> {
        self.nodes
            .get(element.0 as usize)
            .and_then(|node| node.rect)
            .filter(Rect::is_measurable)
    }

    fn attach_clone(&mut self, element: ElementId, rect: Rect) -> Option<CloneId> {
        if self.refuse_clones || element.0 as usize >= self.nodes.len() {
            return None;
        }
        Some(self.insert_clone(Some(element), None, rect))
    }

    fn attach_synthetic(&mut self, part: SyntheticPart, rect: Rect) -> Option<CloneId> {
        Some(self.insert_clone(None, Some(part), rect))
    }

    fn set_clone_transform(&mut self, clone: CloneId, transform: &CloneTransform) {
        if let Some(c) = self.clones.get_mut(&clone) {
            c.transform = *transform;
        }
    }

    fn remove_clone(&mut self, clone: CloneId) {
        self.clones.remove(&clone);
    }

    fn hide(&mut self, element: ElementId) {
        if let Some(node) = self.nodes.get_mut(element.0 as usize) {
            node.hidden = true;
        }
    }

    fn restore(&mut self, element: ElementId) {
        if let Some(node) = self.nodes.get_mut(element.0 as usize) {
            node.hidden = false;
        }
    }

    fn set_shaking(&mut self, shaking: bool) {
        self.shaking = shaking;
    }

    fn set_controls_visible(&mut self, visible: bool) {
        self.controls_visible = visible;
    }

    fn draw_debris(&mut self, debris: &[Debris]) {
        self.debris_drawn = debris.len();
    }
}

impl MemorySurface {
    fn insert_clone(
        &mut self,
        source: Option<ElementId>,
        part: Option<SyntheticPart>,
        rect: Rect,
    ) -> CloneId {
        let id = CloneId(self.next_clone);
        self.next_clone += 1;
        self.clones.insert(
            id,
            MemoryClone {
                source,
                part,
                rect,
                transform: CloneTransform::default(),
            },
        );
        id
    }
}

/// Render target that records what was written to it.
///
/// `measure` reports the layout box shifted by the last translation, the way
/// a browser's bounding rect includes transforms.
#[derive(Debug)]
pub struct RecordingTarget {
    layout: Cell<Option<Rect>>,
    transform: Cell<Transform>,
    styles: RefCell<BTreeMap<String, String>>,
    active: Cell<bool>,
    text: RefCell<String>,
    transform_writes: Cell<usize>,
}

impl RecordingTarget {
    pub fn new(layout: Rect) -> Self {
        Self::with_layout(Some(layout))
    }

    pub fn detached() -> Self {
        Self::with_layout(None)
    }

    fn with_layout(layout: Option<Rect>) -> Self {
        Self {
            layout: Cell::new(layout),
            transform: Cell::new(Transform::IDENTITY),
            styles: RefCell::new(BTreeMap::new()),
            active: Cell::new(false),
            text: RefCell::new(String::new()),
            transform_writes: Cell::new(0),
        }
    }

    pub fn set_layout(&self, layout: Option<Rect>) {
        self.layout.set(layout);
    }

    pub fn transform(&self) -> Transform {
        self.transform.get()
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.styles.borrow().get(property).cloned()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn transform_writes(&self) -> usize {
        self.transform_writes.get()
    }
}

impl RenderTarget for RecordingTarget {
    fn measure(&self) -> Option<Rect> {
        let offset = self.transform.get().translate;
        self.layout.get().map(|r| Rect {
            left: r.left + offset.x,
            top: r.top + offset.y,
            ..r
        })
    }

    fn set_transform(&self, transform: &Transform) {
        self.transform.set(*transform);
        self.transform_writes.set(self.transform_writes.get() + 1);
    }

    fn set_style(&self, property: &str, value: &str) {
        self.styles
            .borrow_mut()
            .insert(property.to_string(), value.to_string());
    }

    fn clear_style(&self, property: &str) {
        if property == "transform" {
            self.transform.set(Transform::IDENTITY);
        }
        self.styles.borrow_mut().remove(property);
    }

    fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_contains_walks_parents() {
        let mut page = MemorySurface::new(800.0, 600.0);
        let card = page.add_element(None, &[".card"], Rect::new(0.0, 0.0, 200.0, 200.0));
        let inner = page.add_element(Some(card), &["p"], Rect::new(10.0, 10.0, 100.0, 20.0));
        assert!(page.contains(card, inner));
        assert!(page.contains(card, card));
        assert!(!page.contains(inner, card));
    }

    #[test]
    fn test_recording_target_measure_includes_translation() {
        let target = RecordingTarget::new(Rect::new(100.0, 100.0, 50.0, 20.0));
        target.set_transform(&Transform::translate(Vec2::new(5.0, -3.0)));
        let rect = target.measure().unwrap();
        assert_eq!((rect.left, rect.top), (105.0, 97.0));
        target.clear_style("transform");
        assert_eq!(target.measure().unwrap().left, 100.0);
    }
}
