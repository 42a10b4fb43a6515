use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::element::tree::ElementTree;

/// Trigger body. A returned number becomes the step duration when auto duration is on.
pub type TriggerFn = dyn Fn(&mut ElementTree, &Value) -> Option<f64>;
/// Custom step body, called with progress and payload. Returning `true` cancels the step.
pub type CustomFn = dyn Fn(&mut ElementTree, f64, &Value) -> bool;
/// Called once when a step finishes, with whether it was cancelled.
pub type FinishFn = dyn Fn(&mut ElementTree, bool);

/// A callback given inline or by its name in a [`FunctionMap`].
///
/// Named callbacks survive a state round-trip. Inline ones serialize as `null` and are dropped.
pub enum Callback<F: ?Sized> {
    Named(String),
    Inline(Rc<F>),
}

impl<F: ?Sized> Callback<F> {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        match self {
            Self::Named(n) => Self::Named(n.clone()),
            Self::Inline(f) => Self::Inline(Rc::clone(f)),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => f.debug_tuple("Named").field(n).finish(),
            Self::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

/// Serde for `Option<Callback<_>>`: names as strings, inline closures as `null`.
pub(crate) mod opt_callback {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Callback;

    pub(crate) fn serialize<F: ?Sized, S: Serializer>(
        cb: &Option<Callback<F>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match cb {
            Some(Callback::Named(n)) => n.serialize(s),
            _ => s.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, F: ?Sized, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Callback<F>>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.map(Callback::Named))
    }
}

/// Which table of a [`FunctionMap`] holds callbacks of this signature.
pub trait Registered {
    fn table(map: &FunctionMap) -> &HashMap<String, Rc<Self>>;
}

impl Registered for TriggerFn {
    fn table(map: &FunctionMap) -> &HashMap<String, Rc<Self>> {
        &map.triggers
    }
}

impl Registered for CustomFn {
    fn table(map: &FunctionMap) -> &HashMap<String, Rc<Self>> {
        &map.customs
    }
}

impl Registered for FinishFn {
    fn table(map: &FunctionMap) -> &HashMap<String, Rc<Self>> {
        &map.finishes
    }
}

/// Named callbacks, so steps referring to them can be serialized.
#[derive(Default, Clone)]
pub struct FunctionMap {
    triggers: HashMap<String, Rc<TriggerFn>>,
    customs: HashMap<String, Rc<CustomFn>>,
    finishes: HashMap<String, Rc<FinishFn>>,
}

impl fmt::Debug for FunctionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionMap")
            .field("triggers", &self.triggers.keys().collect::<Vec<_>>())
            .field("customs", &self.customs.keys().collect::<Vec<_>>())
            .field("finishes", &self.finishes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionMap {
    pub fn add_trigger(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&mut ElementTree, &Value) -> Option<f64> + 'static,
    ) {
        self.triggers.insert(name.into(), Rc::new(f));
    }

    pub fn add_custom(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&mut ElementTree, f64, &Value) -> bool + 'static,
    ) {
        self.customs.insert(name.into(), Rc::new(f));
    }

    pub fn add_finish(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&mut ElementTree, bool) + 'static,
    ) {
        self.finishes.insert(name.into(), Rc::new(f));
    }

    /// Resolve to a callable. Unknown names log and resolve to nothing.
    pub fn resolve<F: Registered + ?Sized>(&self, cb: &Callback<F>) -> Option<Rc<F>> {
        match cb {
            Callback::Inline(f) => Some(Rc::clone(f)),
            Callback::Named(name) => {
                let found = F::table(self).get(name).cloned();
                if found.is_none() {
                    tracing::warn!(name = %name, "no function registered under this name");
                }
                found
            }
        }
    }
}

/// Inline trigger callback.
pub fn trigger_fn(
    f: impl Fn(&mut ElementTree, &Value) -> Option<f64> + 'static,
) -> Callback<TriggerFn> {
    Callback::Inline(Rc::new(f))
}

/// Inline custom step callback.
pub fn custom_fn(
    f: impl Fn(&mut ElementTree, f64, &Value) -> bool + 'static,
) -> Callback<CustomFn> {
    Callback::Inline(Rc::new(f))
}

/// Inline finish callback.
pub fn finish_fn(f: impl Fn(&mut ElementTree, bool) + 'static) -> Callback<FinishFn> {
    Callback::Inline(Rc::new(f))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/callback.rs"]
mod tests;
