use crate::foundation::core::{Point, Vec2};
use crate::foundation::math::round;
use crate::geometry::bounds::{PointBounds, RangeBounds, TransformBounds};
use crate::transform::chain::{Component, Transform};

const MIN_DECELERATION: f64 = 0.000_000_1;
const MAX_BOUNCES: u32 = 1000;

/// Parameters for free motion after a drag is released.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FreelyConfig {
    pub zero_velocity_threshold: f64,
    pub deceleration: f64,
    /// Fraction of speed lost at each bounce. `1` stops at the wall.
    pub bounce_loss: f64,
    pub precision: u32,
}

impl Default for FreelyConfig {
    fn default() -> Self {
        Self {
            zero_velocity_threshold: 0.0001,
            deceleration: 5.0,
            bounce_loss: 0.5,
            precision: 8,
        }
    }
}

/// Result of decelerating over some time.
///
/// `duration` is the time actually spent moving, or with no time given, the total time until
/// the motion stops. `None` means the motion never decays.
#[derive(Clone, Debug, PartialEq)]
pub struct Decelerated<T, V = T> {
    pub value: T,
    pub velocity: V,
    pub duration: Option<f64>,
}

/// Distance covered and time used, capped at the moment speed reaches the threshold.
fn distance(speed: f64, dt: Option<f64>, deceleration: f64, threshold: f64) -> (f64, f64) {
    let v0 = speed.abs();
    let stop_time = ((v0 - threshold) / deceleration).abs();
    let dt = match dt {
        Some(dt) if dt <= stop_time => dt,
        _ => stop_time,
    };
    (v0 * dt - 0.5 * deceleration * dt * dt, dt)
}

/// Time to cover `distance` from `speed`, and the speed on arrival.
fn time_from_vs(speed: f64, distance: f64, deceleration: f64) -> (f64, f64) {
    let v0 = speed.abs();
    if deceleration == 0.0 {
        return (distance / v0, v0);
    }
    let a = -0.5 * deceleration;
    let disc = (v0 * v0 + 4.0 * a * distance).max(0.0);
    let t = (-v0 + disc.sqrt()) / (2.0 * a);
    (t, v0 - deceleration * t)
}

fn never_decays(dt: Option<f64>, cfg: &FreelyConfig, bounded: bool) -> bool {
    dt.is_none()
        && round(cfg.deceleration, cfg.precision) == 0.0
        && (cfg.bounce_loss == 0.0 || !bounded)
}

/// Decelerate a scalar, bouncing off `bounds` when given.
pub fn decelerate_value(
    value: f64,
    velocity: f64,
    dt: Option<f64>,
    bounds: Option<&RangeBounds>,
    cfg: &FreelyConfig,
) -> Decelerated<f64> {
    decelerate_value_inner(value, velocity, dt, bounds, cfg, 0)
}

fn decelerate_value_inner(
    value: f64,
    velocity: f64,
    dt: Option<f64>,
    bounds: Option<&RangeBounds>,
    cfg: &FreelyConfig,
    bounces: u32,
) -> Decelerated<f64> {
    if never_decays(dt, cfg, bounds.is_some_and(RangeBounds::is_defined)) {
        return Decelerated {
            value,
            velocity,
            duration: None,
        };
    }
    if velocity.abs() <= cfg.zero_velocity_threshold {
        return Decelerated {
            value,
            velocity: 0.0,
            duration: Some(0.0),
        };
    }
    let value = bounds.map_or(value, |b| b.clip(value));
    let deceleration = cfg.deceleration.max(MIN_DECELERATION);
    let direction = velocity.signum();
    let (travelled, used) = distance(velocity, dt, deceleration, cfg.zero_velocity_threshold);
    let next = value + direction * travelled;

    let bounds = match bounds {
        Some(b) if !b.contains(next) => b,
        _ => {
            if dt.is_none() {
                return Decelerated {
                    value: next,
                    velocity: 0.0,
                    duration: Some(used),
                };
            }
            let mut v1 = velocity.abs() - deceleration * used;
            if round(v1, cfg.precision) <= round(cfg.zero_velocity_threshold, cfg.precision) {
                v1 = 0.0;
            }
            return Decelerated {
                value: next,
                velocity: v1 * direction,
                duration: Some(used),
            };
        }
    };

    let hit = bounds.intersect(value, direction);
    let Some(wall) = hit.intersect else {
        tracing::warn!(value, velocity, "bounds rejected a value with no wall ahead");
        return Decelerated {
            value: bounds.clip(next),
            velocity: 0.0,
            duration: Some(used),
        };
    };
    let (t_hit, v_hit) = time_from_vs(velocity, hit.distance, deceleration);
    if cfg.bounce_loss >= 1.0 || bounces >= MAX_BOUNCES {
        return Decelerated {
            value: wall,
            velocity: 0.0,
            duration: Some(t_hit),
        };
    }
    let bounce_velocity = v_hit * (1.0 - cfg.bounce_loss) * hit.reflection;
    match dt {
        None => {
            let rest =
                decelerate_value_inner(wall, bounce_velocity, None, Some(bounds), cfg, bounces + 1);
            Decelerated {
                value: rest.value,
                velocity: 0.0,
                duration: Some(t_hit + rest.duration.unwrap_or(0.0)),
            }
        }
        Some(_) => decelerate_value_inner(
            wall,
            bounce_velocity,
            Some(used - t_hit),
            Some(bounds),
            cfg,
            bounces + 1,
        ),
    }
}

/// Decelerate a point moving with a 2D velocity, bouncing off `bounds` when given.
pub fn decelerate_vector(
    position: Point,
    velocity: Vec2,
    dt: Option<f64>,
    bounds: Option<&PointBounds>,
    cfg: &FreelyConfig,
) -> Decelerated<Point, Vec2> {
    let (value, velocity, duration) =
        decelerate_vector_inner(position, velocity, dt, bounds, cfg, 0);
    Decelerated {
        value,
        velocity,
        duration,
    }
}

fn decelerate_vector_inner(
    position: Point,
    velocity: Vec2,
    dt: Option<f64>,
    bounds: Option<&PointBounds>,
    cfg: &FreelyConfig,
    bounces: u32,
) -> (Point, Vec2, Option<f64>) {
    if never_decays(dt, cfg, bounds.is_some_and(PointBounds::is_defined)) {
        return (position, velocity, None);
    }
    let velocity = bounds.map_or(velocity, |b| b.project_velocity(velocity));
    let speed = velocity.hypot();
    if speed <= cfg.zero_velocity_threshold {
        return (position, Vec2::ZERO, Some(0.0));
    }
    let direction = velocity / speed;
    let position = bounds.map_or(position, |b| b.clip(position));
    let deceleration = cfg.deceleration.max(MIN_DECELERATION);
    let (travelled, used) = distance(speed, dt, deceleration, cfg.zero_velocity_threshold);
    let next = position + direction * travelled;

    let bounds = match bounds {
        Some(b) if !b.contains(next) => b,
        _ => {
            if dt.is_none() {
                return (next, Vec2::ZERO, Some(used));
            }
            let mut v1 = speed - deceleration * used;
            if round(v1, cfg.precision) <= round(cfg.zero_velocity_threshold, cfg.precision) {
                v1 = 0.0;
            }
            return (next, direction * v1, Some(used));
        }
    };

    let hit = bounds.intersect(position, direction);
    let Some(wall) = hit.intersect else {
        tracing::warn!(?position, ?velocity, "bounds rejected a point with no wall ahead");
        return (bounds.clip(next), Vec2::ZERO, Some(used));
    };
    let (t_hit, v_hit) = time_from_vs(speed, hit.distance, deceleration);
    if cfg.bounce_loss >= 1.0 || bounces >= MAX_BOUNCES {
        return (wall, Vec2::ZERO, Some(t_hit));
    }
    let bounce_velocity = hit.reflection * (v_hit * (1.0 - cfg.bounce_loss));
    match dt {
        None => {
            let (p, _, rest) = decelerate_vector_inner(
                wall,
                bounce_velocity,
                None,
                Some(bounds),
                cfg,
                bounces + 1,
            );
            (p, Vec2::ZERO, Some(t_hit + rest.unwrap_or(0.0)))
        }
        Some(_) => decelerate_vector_inner(
            wall,
            bounce_velocity,
            Some(used - t_hit),
            Some(bounds),
            cfg,
            bounces + 1,
        ),
    }
}

/// Decelerate every component of `transform` by the matching component of `velocity`.
///
/// Shapes must match. The reported duration is the longest component's, or `None` if any
/// component never stops.
pub fn decelerate_transform(
    transform: &Transform,
    velocity: &Transform,
    dt: Option<f64>,
    bounds: Option<&TransformBounds>,
    cfg: &FreelyConfig,
) -> Decelerated<Transform> {
    if !transform.is_equal_shape_to(velocity) {
        tracing::warn!("velocity shape does not match transform; stopping motion");
        return Decelerated {
            value: transform.clone(),
            velocity: transform.zero(),
            duration: Some(0.0),
        };
    }
    let mut values = Vec::with_capacity(transform.len());
    let mut velocities = Vec::with_capacity(transform.len());
    let mut duration = Some(0.0_f64);
    let mut merge = |d: Option<f64>| {
        duration = match (duration, d) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
    };

    for (t, v) in transform.steps().iter().zip(velocity.steps()) {
        match (t.component, v.component) {
            (Component::Translation { x, y }, Component::Translation { x: vx, y: vy }) => {
                let next = decelerate_vector(
                    Point::new(x, y),
                    Vec2::new(vx, vy),
                    dt,
                    bounds.and_then(|b| b.translation.as_ref()),
                    cfg,
                );
                merge(next.duration);
                values.push(Component::Translation {
                    x: next.value.x,
                    y: next.value.y,
                });
                velocities.push(Component::Translation {
                    x: next.velocity.x,
                    y: next.velocity.y,
                });
            }
            (Component::Rotation { r }, Component::Rotation { r: vr }) => {
                let next =
                    decelerate_value(r, vr, dt, bounds.and_then(|b| b.rotation.as_ref()), cfg);
                merge(next.duration);
                values.push(Component::Rotation { r: next.value });
                velocities.push(Component::Rotation { r: next.velocity });
            }
            (Component::Scale { x, y }, Component::Scale { x: vx, y: vy }) => {
                let b = bounds.and_then(|b| b.scale.as_ref());
                let nx = decelerate_value(x, vx, dt, b, cfg);
                let ny = decelerate_value(y, vy, dt, b, cfg);
                merge(nx.duration);
                merge(ny.duration);
                values.push(Component::Scale {
                    x: nx.value,
                    y: ny.value,
                });
                velocities.push(Component::Scale {
                    x: nx.velocity,
                    y: ny.velocity,
                });
            }
            (value, velocity) => {
                values.push(value);
                velocities.push(velocity);
            }
        }
    }

    let mut value = transform.clone();
    let mut next_velocity = velocity.clone();
    value.set_components(values);
    next_velocity.set_components(velocities);
    Decelerated {
        value,
        velocity: next_velocity,
        duration,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/deceleration.rs"]
mod tests;
