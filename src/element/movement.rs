use serde_json::Value;

use crate::element::node::{ElementId, StopSource};
use crate::element::tree::ElementTree;
use crate::foundation::core::{Force, Point, Rect, Space, StopHow};
use crate::geometry::bounds::{PointBounds, RectBounds, TransformBounds};
use crate::geometry::deceleration::{Decelerated, FreelyConfig, decelerate_transform};
use crate::transform::chain::Transform;

const STALE_MOVE_SECONDS: f64 = 0.05;
const MIN_VELOCITY_DT: f64 = 0.0001;

/// Where an element may be moved to.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveBounds {
    #[default]
    None,
    /// The visible figure area, expressed in the element's parent space.
    Figure,
    Transform(TransformBounds),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoveConfig {
    pub bounds: MoveBounds,
    /// Keep the whole element inside the bounds rather than just its origin.
    pub size_in_bounds: bool,
    pub max_velocity: f64,
    pub freely: FreelyConfig,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            bounds: MoveBounds::None,
            size_in_bounds: false,
            max_velocity: 5.0,
            freely: FreelyConfig::default(),
        }
    }
}

/// Drag and free-motion state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub velocity: Transform,
    pub previous_time: Option<f64>,
    pub previous_transform: Transform,
    pub is_being_moved: bool,
    pub is_moving_freely: bool,
}

impl Movement {
    pub fn at_rest(transform: &Transform) -> Self {
        Self {
            velocity: transform.zero(),
            previous_time: None,
            previous_transform: transform.clone(),
            is_being_moved: false,
            is_moving_freely: false,
        }
    }
}

impl ElementTree {
    /// Bounds `set_transform` clips to, or `None` when unbounded.
    pub fn move_bounds(&self, id: ElementId) -> Option<TransformBounds> {
        let el = self.get(id)?;
        let mut bounds = match &el.move_config.bounds {
            MoveBounds::None => return None,
            MoveBounds::Transform(b) => *b,
            MoveBounds::Figure => {
                let parent_to_figure = el
                    .parent
                    .map_or(kurbo::Affine::IDENTITY, |p| self.figure_matrix(p));
                let rect = parent_to_figure.inverse().transform_rect_bbox(self.limits);
                TransformBounds::translation(PointBounds::Rect(RectBounds::from_rect(rect)))
            }
        };
        if el.move_config.size_in_bounds {
            let position = el.transform.t().unwrap_or(Point::ZERO);
            if let (Some(PointBounds::Rect(r)), Some(local)) = (
                bounds.translation.as_mut(),
                self.get_bounding_rect(id, Space::Local),
            ) {
                shrink(r, local, position);
            }
        }
        Some(bounds)
    }

    pub fn start_being_moved(&mut self, id: ElementId) {
        let now = self.now();
        self.cancel_all_animations(id, Some(Force::Freeze));
        self.stop_moving_freely(id, StopHow::Freeze);
        let Some(el) = self.get_mut(id) else {
            return;
        };
        el.movement.velocity = el.transform.zero();
        el.movement.previous_transform = el.transform.clone();
        el.movement.previous_time = Some(now);
        el.movement.is_being_moved = true;
        el.notifications.notify("startBeingMoved");
    }

    /// A drag moved the element to `transform`; record the implied velocity.
    pub fn moved(&mut self, id: ElementId, transform: Transform) {
        let Some(previous) = self.get(id).map(|e| e.transform.clone()) else {
            return;
        };
        self.set_transform(id, transform);
        let now = self.now();
        let Some(el) = self.get_mut(id) else {
            return;
        };
        let Some(previous_time) = el.movement.previous_time else {
            el.movement.previous_time = Some(now);
            return;
        };
        let dt = now - previous_time;
        if dt < MIN_VELOCITY_DT {
            return;
        }
        let cfg = &el.move_config;
        match el.transform.velocity(
            &previous,
            dt,
            cfg.freely.zero_velocity_threshold,
            Some(cfg.max_velocity),
        ) {
            Ok(v) => el.movement.velocity = v,
            Err(err) => tracing::warn!(%err, "could not derive drag velocity"),
        }
        el.movement.previous_transform = previous;
        el.movement.previous_time = Some(now);
    }

    pub fn stop_being_moved(&mut self, id: ElementId) {
        let now = self.now();
        let Some(el) = self.get_mut(id) else {
            return;
        };
        if !el.movement.is_being_moved {
            return;
        }
        if el
            .movement
            .previous_time
            .is_some_and(|t| now - t > STALE_MOVE_SECONDS)
        {
            el.movement.velocity = el.transform.zero();
        }
        el.notifications.notify("stopBeingMoved");
        el.movement.is_being_moved = false;
        el.movement.previous_time = None;
    }

    /// Release the element to coast on its recorded velocity.
    pub fn start_moving_freely(&mut self, id: ElementId) {
        self.cancel_all_animations(id, Some(Force::Freeze));
        self.stop_being_moved(id);
        let now = self.now();
        let Some(el) = self.get_mut(id) else {
            return;
        };
        el.movement.is_moving_freely = true;
        el.movement.previous_time = Some(now);
        let cfg = &el.move_config;
        el.movement.velocity = el
            .movement
            .velocity
            .clip_mag(cfg.freely.zero_velocity_threshold, Some(cfg.max_velocity));
        el.notifications.notify("startMovingFreely");
        self.request_redraw();
    }

    pub fn stop_moving_freely(&mut self, id: ElementId, how: StopHow) {
        if how == StopHow::AnimateToComplete {
            return;
        }
        let Some(was_moving) = self.get(id).map(|e| e.movement.is_moving_freely) else {
            return;
        };
        if how == StopHow::Complete && was_moving {
            if let Some(end) = self.decelerate(id, None) {
                self.set_transform(id, end.value);
            }
        }
        let Some(el) = self.get_mut(id) else {
            return;
        };
        el.movement.is_moving_freely = false;
        el.movement.previous_time = None;
        if was_moving {
            let notifications = el.notifications.clone();
            self.source_finished(id, StopSource::MovingFreely);
            notifications.publish("animationFinished", &Value::from("movingFreely"));
            notifications.notify("stopMovingFreely");
        }
        self.request_redraw();
    }

    /// Deceleration of the current velocity over `dt`, or to rest with `None`.
    pub fn decelerate(&self, id: ElementId, dt: Option<f64>) -> Option<Decelerated<Transform>> {
        let el = self.get(id)?;
        let bounds = self.move_bounds(id);
        Some(decelerate_transform(
            &el.transform,
            &el.movement.velocity,
            dt,
            bounds.as_ref(),
            &el.move_config.freely,
        ))
    }

    /// Seconds until free motion stops. `None` unless moving freely with finite decay.
    pub fn get_remaining_moving_freely_time(&self, id: ElementId) -> Option<f64> {
        if !self.get(id)?.movement.is_moving_freely {
            return None;
        }
        self.decelerate(id, None)?.duration
    }

    /// One frame of free motion. The first frame only records the time.
    pub(crate) fn moving_freely_frame(&mut self, id: ElementId, now: f64) {
        let Some(el) = self.get_mut(id) else {
            return;
        };
        if !el.movement.is_moving_freely {
            return;
        }
        let Some(previous) = el.movement.previous_time else {
            el.movement.previous_time = Some(now);
            return;
        };
        let Some(next) = self.decelerate(id, Some(now - previous)) else {
            return;
        };
        let threshold = self
            .get(id)
            .map_or(0.0, |e| e.move_config.freely.zero_velocity_threshold);
        let stopped = next.velocity.is_zero(threshold);
        if let Some(el) = self.get_mut(id) {
            el.movement.velocity = next.velocity;
            el.movement.previous_time = Some(now);
        }
        self.set_transform(id, next.value);
        if stopped {
            self.stop_moving_freely(id, StopHow::Complete);
        }
    }
}

fn shrink(bounds: &mut RectBounds, local: Rect, position: Point) {
    let left = local.x0 - position.x;
    let right = local.x1 - position.x;
    let bottom = local.y0 - position.y;
    let top = local.y1 - position.y;
    bounds.left = bounds.left.map(|b| b - left);
    bounds.right = bounds.right.map(|b| b - right);
    bounds.bottom = bounds.bottom.map(|b| b - bottom);
    bounds.top = bounds.top.map(|b| b - top);
}

#[cfg(test)]
#[path = "../../tests/unit/element/movement.rs"]
mod tests;
