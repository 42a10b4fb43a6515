use std::f64::consts::FRAC_PI_2;

use serde_json::Value;

use crate::element::node::{ElementId, StopSource};
use crate::element::tree::ElementTree;
use crate::foundation::core::{Point, Space, StopHow, When};
use crate::foundation::math::{round, sinusoid};
use crate::transform::chain::Transform;

/// Point the pulse scales or rotates about, in draw space.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PulseCenter {
    /// Center of the element's own bounds.
    #[default]
    Element,
    Origin,
    Point(#[serde(with = "crate::foundation::tagged::point")] Point),
}

/// How an element pulses.
///
/// Scale is the default pulse. Setting `rotation` pulses the angle, and setting `translation`
/// pulses a shift along `angle`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PulseOptions {
    /// Seconds. `0` pulses until stopped.
    pub duration: f64,
    /// Hz. `0` means one cycle over `duration`.
    pub frequency: f64,
    pub scale: f64,
    pub rotation: Option<f64>,
    pub translation: Option<f64>,
    pub angle: f64,
    pub min: Option<f64>,
    pub start: Option<f64>,
    pub center: PulseCenter,
    /// Number of stacked copies, spread between `min` and the peak.
    pub num: u32,
    pub when: When,
}

impl Default for PulseOptions {
    fn default() -> Self {
        Self {
            duration: 1.0,
            frequency: 0.0,
            scale: 2.0,
            rotation: None,
            translation: None,
            angle: 0.0,
            min: None,
            start: None,
            center: PulseCenter::Element,
            num: 1,
            when: When::SyncNow,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PulseKind {
    #[default]
    Scale,
    Rotation,
    Translation,
}

/// Resolved sinusoid parameters, one `(bias, magnitude, phase)` per copy.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseSettings {
    pub time: f64,
    pub frequency: f64,
    pub kind: PulseKind,
    pub angle: f64,
    #[serde(with = "crate::foundation::tagged::point")]
    pub center: Point,
    pub waves: Vec<[f64; 3]>,
}

impl PulseSettings {
    fn new(options: &PulseOptions, center: Point) -> Self {
        let frequency = if options.frequency == 0.0 {
            if options.duration == 0.0 { 1.0 } else { 1.0 / options.duration }
        } else {
            options.frequency
        };
        let (kind, start, max) = match (options.translation, options.rotation) {
            (Some(t), _) => (PulseKind::Translation, options.start.unwrap_or(0.0), t),
            (None, Some(r)) => (PulseKind::Rotation, options.start.unwrap_or(0.0), r),
            (None, None) => (PulseKind::Scale, options.start.unwrap_or(1.0), options.scale),
        };
        let min = options.min.unwrap_or(start);
        let range = max - min;
        let waves = if options.num > 1 {
            let step = range / f64::from(options.num - 1);
            (0..options.num)
                .map(|i| {
                    let peak = max - f64::from(i) * step;
                    if peak < start {
                        let r = start - peak;
                        [start - r / 2.0, r / 2.0, FRAC_PI_2]
                    } else {
                        let r = peak - start;
                        [start + r / 2.0, r / 2.0, -FRAC_PI_2]
                    }
                })
                .collect()
        } else {
            let mid = range / 2.0 + min;
            let normalized = if range == 0.0 { start } else { (start - mid) / (range / 2.0) };
            vec![[mid, range / 2.0, round(normalized, 10).clamp(-1.0, 1.0).asin()]]
        };
        Self {
            time: options.duration,
            frequency,
            kind,
            angle: options.angle,
            center,
            waves,
        }
    }

    fn transforms(&self, dt: f64) -> Vec<Transform> {
        let d = self.center;
        self.waves
            .iter()
            .map(|&[bias, mag, phase]| {
                let m = sinusoid(dt, self.frequency, bias, mag, phase);
                match self.kind {
                    PulseKind::Scale => {
                        Transform::new().translate(-d.x, -d.y).scale(m, m).translate(d.x, d.y)
                    }
                    PulseKind::Rotation => {
                        Transform::new().translate(-d.x, -d.y).rotate(m).translate(d.x, d.y)
                    }
                    PulseKind::Translation => {
                        Transform::new().translate(m * self.angle.cos(), m * self.angle.sin())
                    }
                }
            })
            .collect()
    }
}

/// Transient pulse applied on top of the committed transform.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseState {
    pub is_pulsing: bool,
    pub start_time: Option<f64>,
    pub settings: PulseSettings,
    /// Transforms for the current frame, applied in draw space.
    pub transforms: Vec<Transform>,
    /// Left behind by a frozen pulse and kept until the next pulse starts.
    pub frozen: Vec<Transform>,
}

impl PulseState {
    /// Transforms to apply this frame, live then frozen.
    pub fn active_transforms(&self) -> impl Iterator<Item = &Transform> {
        self.transforms.iter().chain(&self.frozen)
    }

    /// Seconds of pulsing left, `0` when not pulsing.
    pub fn remaining_time(&self, now: f64) -> f64 {
        if !self.is_pulsing {
            return 0.0;
        }
        match self.start_time {
            None => self.settings.time,
            Some(start) => self.settings.time - (now - start),
        }
    }
}

impl ElementTree {
    /// Start pulsing `id`.
    pub fn pulse(&mut self, id: ElementId, options: &PulseOptions) {
        let center = match options.center {
            PulseCenter::Origin => Point::ZERO,
            PulseCenter::Point(p) => p,
            PulseCenter::Element => self
                .get_bounding_rect(id, Space::Draw)
                .map_or(Point::ZERO, |r| r.center()),
        };
        let start = self.global.get_when(options.when);
        let Some(el) = self.get_mut(id) else {
            return;
        };
        el.pulse.settings = PulseSettings::new(options, center);
        el.pulse.is_pulsing = true;
        el.pulse.start_time = start;
        el.pulse.frozen.clear();
        self.request_redraw();
    }

    pub fn stop_pulsing(&mut self, id: ElementId, how: StopHow) {
        if how == StopHow::AnimateToComplete {
            return;
        }
        let Some(el) = self.get_mut(id) else {
            return;
        };
        let was_pulsing = el.pulse.is_pulsing;
        match how {
            StopHow::Freeze if was_pulsing => {
                el.pulse.frozen = std::mem::take(&mut el.pulse.transforms);
            }
            StopHow::Cancel | StopHow::Complete => el.pulse.transforms.clear(),
            _ => {}
        }
        el.pulse.is_pulsing = false;
        el.pulse.settings.waves.truncate(1);
        if was_pulsing {
            let notifications = el.notifications.clone();
            self.source_finished(id, StopSource::Pulse);
            notifications.publish("animationFinished", &Value::from("pulse"));
            notifications.notify("stopPulsing");
        }
        self.request_redraw();
    }

    /// Refresh the pulse transforms for this frame, ending the pulse once its time is up.
    pub(crate) fn pulse_frame(&mut self, id: ElementId, now: f64) {
        let Some(el) = self.get_mut(id) else {
            return;
        };
        if !el.pulse.is_pulsing {
            return;
        }
        let start = *el.pulse.start_time.get_or_insert(now);
        let mut dt = now - start;
        let time = el.pulse.settings.time;
        let done = time != 0.0 && dt >= time;
        if done {
            dt = time;
        }
        el.pulse.transforms = el.pulse.settings.transforms(dt);
        if done {
            self.stop_pulsing(id, StopHow::Complete);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/pulse.rs"]
mod tests;
