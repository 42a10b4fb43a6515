use serde_json::Value;

use crate::animation::callback::{Callback, CustomFn, TriggerFn, opt_callback};
use crate::element::tree::ElementTree;

/// Calls a function once when its start instant is reached.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerStep {
    #[serde(with = "opt_callback")]
    pub callback: Option<Callback<TriggerFn>>,
    /// Runs instead of `callback` when the step is completed without having fired.
    #[serde(with = "opt_callback")]
    pub set_to_end: Option<Callback<TriggerFn>>,
    pub payload: Value,
    /// Take a number returned by the callback as this step's duration.
    pub auto_duration: bool,
    pub(crate) fired: bool,
}

impl Default for TriggerStep {
    fn default() -> Self {
        Self {
            callback: None,
            set_to_end: None,
            payload: Value::Null,
            auto_duration: true,
            fired: false,
        }
    }
}

impl TriggerStep {
    pub fn new(callback: Callback<TriggerFn>) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Run the main callback. Returns the duration it asked for, if any.
    pub(crate) fn fire(&mut self, tree: &mut ElementTree) -> Option<f64> {
        if self.fired {
            return None;
        }
        self.fired = true;
        let f = self.callback.as_ref().and_then(|cb| tree.functions.resolve(cb))?;
        let requested = f(tree, &self.payload);
        requested.filter(|_| self.auto_duration)
    }

    pub(crate) fn fire_end(&mut self, tree: &mut ElementTree) {
        match &self.set_to_end {
            Some(cb) => {
                if let Some(f) = tree.functions.resolve(cb) {
                    f(tree, &self.payload);
                }
                self.fired = true;
            }
            None => {
                self.fire(tree);
            }
        }
    }
}

/// Calls a function every frame with eased progress.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomStep {
    #[serde(with = "opt_callback")]
    pub callback: Option<Callback<CustomFn>>,
    pub payload: Value,
    /// Begin partway through, as a progress fraction.
    pub start_percent: f64,
}

impl CustomStep {
    pub fn new(callback: Callback<CustomFn>) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn start_percent(mut self, percent: f64) -> Self {
        self.start_percent = percent;
        self
    }

    /// `true` when the callback asks to stop.
    pub(crate) fn call(&self, progress: f64, tree: &mut ElementTree) -> bool {
        let Some(f) = self.callback.as_ref().and_then(|cb| tree.functions.resolve(cb)) else {
            return false;
        };
        f(tree, progress, &self.payload)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/animation/steps/control.rs"]
mod tests;
