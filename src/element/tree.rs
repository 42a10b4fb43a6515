use std::fmt;
use std::rc::Rc;

use crate::animation::callback::FunctionMap;
use crate::animation::steps::scenario::ScenarioTarget;
use crate::element::node::{Collection, Element, ElementId};
use crate::foundation::core::{CanvasSize, Point, Rect, Rgba, Vec2};
use crate::foundation::error::{FigureError, FigureResult};
use crate::scheduler::global::GlobalAnimation;
use crate::transform::chain::Transform;

/// Name of the root collection.
pub const ROOT_NAME: &str = "figureRoot";

/// Arena of elements rooted at a single collection.
///
/// Elements refer to each other by [`ElementId`]. A parent owns its children; removing an
/// element frees its whole subtree. Slots are never reused, so stale ids resolve to `None`.
pub struct ElementTree {
    nodes: Vec<Option<Element>>,
    root: ElementId,
    pub functions: FunctionMap,
    pub(crate) global: Rc<GlobalAnimation>,
    redraw: Option<Rc<dyn Fn()>>,
    /// Figure-space rectangle mapped onto the whole canvas.
    pub limits: Rect,
    pub canvas: CanvasSize,
    animation_counter: u64,
}

impl fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementTree")
            .field("elements", &self.nodes.iter().filter(|n| n.is_some()).count())
            .field("limits", &self.limits)
            .field("functions", &self.functions)
            .finish()
    }
}

impl ElementTree {
    pub fn new(global: Rc<GlobalAnimation>) -> Self {
        let root = Element::collection(ROOT_NAME)
            .with_transform(Transform::new().scale(1.0, 1.0).translate(0.0, 0.0));
        Self {
            nodes: vec![Some(root)],
            root: ElementId(0),
            functions: FunctionMap::default(),
            global,
            redraw: None,
            limits: Rect::new(-1.0, -1.0, 1.0, 1.0),
            canvas: CanvasSize::default(),
            animation_counter: 0,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn global(&self) -> &Rc<GlobalAnimation> {
        &self.global
    }

    /// Scheduler time in seconds.
    pub fn now(&self) -> f64 {
        self.global.now() * 0.001
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Like [`get`](Self::get) but a missing element is an error.
    pub fn element(&self, id: ElementId) -> FigureResult<&Element> {
        self.get(id)
            .ok_or_else(|| FigureError::validation(format!("element {} does not exist", id.0)))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn set_redraw_hook(&mut self, hook: impl Fn() + 'static) {
        self.redraw = Some(Rc::new(hook));
    }

    /// Ask the owner to schedule a draw.
    pub fn request_redraw(&self) {
        if let Some(hook) = self.redraw.clone() {
            hook();
        }
    }

    pub(crate) fn next_animation_name(&mut self) -> String {
        self.animation_counter += 1;
        format!("_auto_{}", self.animation_counter)
    }

    fn collection_mut(&mut self, id: ElementId) -> FigureResult<&mut Collection> {
        self.get_mut(id)
            .and_then(Element::as_collection_mut)
            .ok_or_else(|| FigureError::validation(format!("element {} is not a collection", id.0)))
    }

    /// Add `element` under `parent` as the last drawn child.
    ///
    /// A name already present under `parent` is a validation error; use
    /// [`replace`](Self::replace) to overwrite.
    pub fn add(&mut self, parent: ElementId, element: Element) -> FigureResult<ElementId> {
        let name = element.name.clone();
        if name.is_empty() || name.contains(['.', '/']) {
            return Err(FigureError::validation(format!(
                "element name '{name}' must be non-empty and free of '.' and '/'"
            )));
        }
        if self.collection_mut(parent)?.names.contains_key(&name) {
            return Err(FigureError::validation(format!(
                "'{}' already has an element named '{name}'",
                self.display_path(parent)
            )));
        }
        Ok(self.insert(parent, element))
    }

    fn insert(&mut self, parent: ElementId, mut element: Element) -> ElementId {
        let id = ElementId(self.nodes.len());
        element.parent = Some(parent);
        let name = element.name.clone();
        self.nodes.push(Some(element));
        if let Ok(c) = self.collection_mut(parent) {
            c.names.insert(name, id);
            c.draw_order.push(id);
        }
        self.request_redraw();
        id
    }

    /// Add or overwrite. An existing child keeps its draw order position.
    pub fn replace(&mut self, parent: ElementId, element: Element) -> FigureResult<ElementId> {
        let existing = self.collection_mut(parent)?.names.get(&element.name).copied();
        let Some(old) = existing else {
            return self.add(parent, element);
        };
        let position = self.get(parent).and_then(|p| p.children().iter().position(|c| *c == old));
        self.remove(old);
        let id = self.add(parent, element)?;
        if let (Some(position), Ok(c)) = (position, self.collection_mut(parent)) {
            c.draw_order.retain(|c| *c != id);
            c.draw_order.insert(position.min(c.draw_order.len()), id);
        }
        Ok(id)
    }

    /// Remove an element and its subtree. Removing the root is refused.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        if id == self.root {
            tracing::warn!("refusing to remove the root collection");
            return None;
        }
        let parent = self.get(id)?.parent;
        let name = self.get(id)?.name.clone();
        if let Some(c) = parent.and_then(|p| self.get_mut(p)).and_then(Element::as_collection_mut) {
            c.names.remove(&name);
            c.draw_order.retain(|c| *c != id);
        }
        let descendants = self.get_all_elements(id);
        for d in descendants.into_iter().filter(|d| *d != id) {
            if let Some(slot) = self.nodes.get_mut(d.0) {
                *slot = None;
            }
        }
        let removed = self.nodes.get_mut(id.0).and_then(Option::take);
        self.request_redraw();
        removed
    }

    fn reorder(&mut self, id: ElementId, to_front: bool) {
        let Some(parent) = self.get(id).and_then(|e| e.parent) else {
            return;
        };
        if let Ok(c) = self.collection_mut(parent) {
            c.draw_order.retain(|c| *c != id);
            if to_front {
                c.draw_order.push(id);
            } else {
                c.draw_order.insert(0, id);
            }
        }
        self.request_redraw();
    }

    /// Draw last among siblings.
    pub fn to_front(&mut self, id: ElementId) {
        self.reorder(id, true);
    }

    /// Draw first among siblings.
    pub fn to_back(&mut self, id: ElementId) {
        self.reorder(id, false);
    }

    /// Resolve a `.` or `/` separated path from the root.
    pub fn get_element(&self, path: &str) -> Option<ElementId> {
        self.get_element_in(self.root, path)
    }

    /// Resolve `path` relative to `from`. An empty path is `from` itself.
    pub fn get_element_in(&self, from: ElementId, path: &str) -> Option<ElementId> {
        path.split(['.', '/'])
            .filter(|s| !s.is_empty())
            .try_fold(from, |id, segment| self.get(id)?.as_collection()?.get(segment))
    }

    /// Dotted path from the root. The root itself has an empty path.
    pub fn get_path(&self, id: ElementId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            if c == self.root {
                break;
            }
            let Some(el) = self.get(c) else {
                break;
            };
            names.push(el.name.as_str());
            cursor = el.parent;
        }
        names.reverse();
        names.join(".")
    }

    /// Path for messages; the root shows under its own name.
    pub(crate) fn display_path(&self, id: ElementId) -> String {
        let path = self.get_path(id);
        if path.is_empty() { ROOT_NAME.to_owned() } else { path }
    }

    /// `id` and every descendant, depth first in draw order.
    pub fn get_all_elements(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(el) = self.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(el.children().iter().rev());
        }
        out
    }

    /// Element followed by each ancestor up to the root.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            let Some(el) = self.get(c) else {
                break;
            };
            out.push(c);
            cursor = el.parent;
        }
        out
    }

    /// Set the local transform, clipped to the element's move bounds.
    pub fn set_transform(&mut self, id: ElementId, transform: Transform) {
        let clipped = match self.move_bounds(id) {
            Some(bounds) => bounds.clip(&transform),
            None => transform,
        };
        let Some(el) = self.get_mut(id) else {
            return;
        };
        let notifications = el.notifications.clone();
        notifications.publish(
            "beforeSetTransform",
            &serde_json::to_value(&clipped).unwrap_or_default(),
        );
        el.transform = clipped;
        notifications.publish(
            "setTransform",
            &serde_json::to_value(&el.transform).unwrap_or_default(),
        );
        self.request_redraw();
    }

    fn update_transform(&mut self, id: ElementId, f: impl FnOnce(&mut Transform) -> bool) {
        let Some(el) = self.get(id) else {
            return;
        };
        let mut next = el.transform.clone();
        if f(&mut next) {
            self.set_transform(id, next);
        } else {
            tracing::debug!(path = %self.get_path(id), "transform has no matching component");
        }
    }

    pub fn set_position(&mut self, id: ElementId, p: Point) {
        self.update_transform(id, |t| t.update_translation(p, None));
    }

    pub fn set_rotation(&mut self, id: ElementId, r: f64) {
        self.update_transform(id, |t| t.update_rotation(r, None));
    }

    pub fn set_scale(&mut self, id: ElementId, s: Vec2) {
        self.update_transform(id, |t| t.update_scale(s, None));
    }

    fn visual(&mut self, id: ElementId, f: impl FnOnce(&mut Element)) {
        if let Some(el) = self.get_mut(id) {
            f(el);
            self.request_redraw();
        }
    }

    pub fn set_color(&mut self, id: ElementId, color: Rgba) {
        self.visual(id, |el| el.color = color);
    }

    /// Set the color the element returns to when undimmed, and use it now.
    pub fn set_default_color(&mut self, id: ElementId, color: Rgba) {
        self.visual(id, |el| {
            el.default_color = color;
            el.color = color;
        });
    }

    pub fn dim(&mut self, id: ElementId) {
        self.visual(id, |el| el.color = el.dim_color);
    }

    pub fn undim(&mut self, id: ElementId) {
        self.visual(id, |el| el.color = el.default_color);
    }

    pub fn set_opacity(&mut self, id: ElementId, opacity: f64) {
        self.visual(id, |el| el.opacity = opacity);
    }

    pub fn show(&mut self, id: ElementId) {
        self.visual(id, |el| el.is_shown = true);
    }

    pub fn hide(&mut self, id: ElementId) {
        self.visual(id, |el| el.is_shown = false);
    }

    /// Show an element and everything below it.
    pub fn show_all(&mut self, id: ElementId) {
        for e in self.get_all_elements(id) {
            self.show(e);
        }
    }

    pub fn hide_all(&mut self, id: ElementId) {
        for e in self.get_all_elements(id) {
            self.hide(e);
        }
    }

    pub fn set_scenario(&mut self, id: ElementId, name: &str, target: ScenarioTarget) {
        if let Some(el) = self.get_mut(id) {
            el.scenarios.insert(name.to_owned(), target);
        }
    }

    /// Jump straight to a named scenario. Returns `false` if it does not exist.
    pub fn set_scenario_now(&mut self, id: ElementId, name: &str) -> bool {
        let Some(el) = self.get(id) else {
            return false;
        };
        let Some(target) = el.scenarios.get(name) else {
            tracing::warn!(path = %self.get_path(id), scenario = name, "unknown scenario");
            return false;
        };
        let resolved = target.resolve(el);
        if let Some(transform) = resolved.transform {
            self.set_transform(id, transform);
        }
        if let Some(color) = resolved.color {
            self.set_color(id, color);
        }
        if let Some(opacity) = resolved.opacity {
            self.set_opacity(id, opacity);
        }
        match resolved.is_shown {
            Some(true) => self.show(id),
            Some(false) => self.hide(id),
            None => {}
        }
        true
    }

    /// Whether the element or anything below it is animating, moving freely or pulsing.
    ///
    /// Hidden elements never count.
    pub fn is_animating(&self, id: ElementId) -> bool {
        let Some(el) = self.get(id) else {
            return false;
        };
        el.is_shown
            && (el.is_active() || el.children().iter().any(|c| self.is_animating(*c)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/tree.rs"]
mod tests;
