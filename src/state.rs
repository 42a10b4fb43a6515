//! Snapshots of an element tree.
//!
//! Every value serializes either as plain JSON or as a tagged `{f1Type, state}` object:
//! `"p"` points, `"tf"` transforms, `"rect"` rectangles, `"de"` element references, and one
//! tag per animation step variant.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::animation::manager::AnimationManager;
use crate::animation::steps::scenario::ScenarioTarget;
use crate::element::movement::{MoveConfig, Movement};
use crate::element::node::ElementId;
use crate::element::pulse::PulseState;
use crate::element::tree::ElementTree;
use crate::foundation::core::Rgba;
use crate::foundation::error::{FigureError, FigureResult};
use crate::transform::chain::Transform;

/// Everything about one element that can change while a figure runs.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementState {
    pub transform: Transform,
    pub color: Rgba,
    pub default_color: Rgba,
    pub dim_color: Rgba,
    pub opacity: f64,
    pub is_shown: bool,
    pub is_touchable: bool,
    pub is_movable: bool,
    #[serde(rename = "move")]
    pub move_config: MoveConfig,
    pub movement: Movement,
    pub pulse: PulseState,
    pub animations: AnimationManager,
    pub copy_transforms: Vec<Transform>,
    pub scenarios: BTreeMap<String, ScenarioTarget>,
    /// Children by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub elements: BTreeMap<String, ElementState>,
}

impl ElementState {
    /// Snapshot `id` and its subtree.
    pub fn capture(tree: &ElementTree, id: ElementId) -> Option<Self> {
        let el = tree.get(id)?;
        let elements = el
            .children()
            .iter()
            .filter_map(|c| {
                let child = tree.get(*c)?;
                Some((child.name.clone(), Self::capture(tree, *c)?))
            })
            .collect();
        Some(Self {
            transform: el.transform.clone(),
            color: el.color,
            default_color: el.default_color,
            dim_color: el.dim_color,
            opacity: el.opacity,
            is_shown: el.is_shown,
            is_touchable: el.is_touchable,
            is_movable: el.is_movable,
            move_config: el.move_config.clone(),
            movement: el.movement.clone(),
            pulse: el.pulse.clone(),
            animations: el.animations.clone(),
            copy_transforms: el.copy_transforms.clone(),
            scenarios: el.scenarios.clone(),
            elements,
        })
    }

    /// Depth-first `(element, state)` pairs matched by name under `id`.
    ///
    /// Names with no element in the tree are skipped.
    pub(crate) fn pairs<'a>(
        &'a self,
        tree: &ElementTree,
        id: ElementId,
    ) -> Vec<(ElementId, &'a ElementState)> {
        let mut out = vec![(id, self)];
        for (name, child_state) in &self.elements {
            let child = tree
                .get(id)
                .and_then(|e| e.as_collection())
                .and_then(|c| c.get(name));
            if let Some(child) = child {
                out.extend(child_state.pairs(tree, child));
            }
        }
        out
    }
}

/// Snapshot of a whole figure.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureState {
    /// Scheduler time of the capture, in seconds.
    pub state_time: f64,
    /// Transition duration this state asks for, honored over the caller's with
    /// `prioritize_form_duration`.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Root collection; children nest by name.
    pub elements: ElementState,
}

impl FigureState {
    pub fn capture(tree: &ElementTree, now: f64) -> FigureResult<Self> {
        let elements = ElementState::capture(tree, tree.root())
            .ok_or_else(|| FigureError::state("element tree has no root"))?;
        Ok(Self {
            state_time: now,
            duration: None,
            elements,
        })
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Apply to the whole tree. Clocks inside the snapshot shift by `now - state_time`.
    pub fn restore(&self, tree: &mut ElementTree, now: f64) -> FigureResult<()> {
        let root = tree.root();
        tree.set_element_state(root, &self.elements, now - self.state_time)
    }

    pub fn to_value(&self) -> FigureResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> FigureResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

impl ElementTree {
    pub fn get_element_state(&self, id: ElementId) -> Option<ElementState> {
        ElementState::capture(self, id)
    }

    /// Restore `id` and, by name, its descendants.
    ///
    /// Restored animation, pulse and movement clocks shift by `time_delta` seconds. Unknown
    /// child names are skipped; children under a primitive are an error.
    pub fn set_element_state(
        &mut self,
        id: ElementId,
        state: &ElementState,
        time_delta: f64,
    ) -> FigureResult<()> {
        self.set_own_state(id, state, time_delta)?;
        self.set_children_state(id, state, time_delta)
    }

    /// Restore only the descendants of `id`.
    pub(crate) fn set_children_state(
        &mut self,
        id: ElementId,
        state: &ElementState,
        time_delta: f64,
    ) -> FigureResult<()> {
        if state.elements.is_empty() {
            return Ok(());
        }
        let Some(collection) = self.get(id).and_then(|e| e.as_collection()) else {
            return Err(FigureError::state(format!(
                "'{}' is not a collection but the snapshot has children for it",
                self.display_path(id)
            )));
        };
        let children: Vec<(ElementId, &ElementState)> = state
            .elements
            .iter()
            .filter_map(|(name, s)| match collection.get(name) {
                Some(child) => Some((child, s)),
                None => {
                    tracing::warn!(
                        parent = %self.display_path(id),
                        child = %name,
                        "no element for snapshot entry"
                    );
                    None
                }
            })
            .collect();
        for (child, child_state) in children {
            self.set_element_state(child, child_state, time_delta)?;
        }
        Ok(())
    }

    fn set_own_state(
        &mut self,
        id: ElementId,
        state: &ElementState,
        time_delta: f64,
    ) -> FigureResult<()> {
        let Some(el) = self.get_mut(id) else {
            return Err(FigureError::state(format!("element {} no longer exists", id.index())));
        };
        el.transform = state.transform.clone();
        el.color = state.color;
        el.default_color = state.default_color;
        el.dim_color = state.dim_color;
        el.opacity = state.opacity;
        el.is_shown = state.is_shown;
        el.is_touchable = state.is_touchable;
        el.is_movable = state.is_movable;
        el.move_config = state.move_config.clone();
        el.copy_transforms = state.copy_transforms.clone();
        el.scenarios = state.scenarios.clone();

        el.movement = state.movement.clone();
        el.movement.previous_time = el.movement.previous_time.map(|t| t + time_delta);
        el.pulse = state.pulse.clone();
        el.pulse.start_time = el.pulse.start_time.map(|t| t + time_delta);

        let manager = &mut el.animations;
        manager.animations = state.animations.animations.clone();
        manager.state = state.animations.state;
        manager.animation_speed = state.animations.animation_speed;
        manager.paused_at = state.animations.paused_at.map(|t| t + time_delta);
        manager.set_time_delta(Some(time_delta));
        self.request_redraw();
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/state/state.rs"]
mod tests;
