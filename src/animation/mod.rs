//! Animation steps, their per-element manager and the fluent builder.

pub mod builder;
/// Named and inline callbacks used by trigger, custom and finish hooks.
pub mod callback;
/// Progression curves.
pub mod ease;
pub mod manager;
pub mod step;
pub mod steps;
