//! The element tree: an arena of primitives and collections addressed by [`ElementId`].
//!
//! [`ElementId`]: node::ElementId

/// Two-phase draw: setup then emit.
pub mod draw;
/// Drag and move-freely hooks.
pub mod movement;
pub mod node;
/// Sinusoidal pulse transforms.
pub mod pulse;
/// Spaces, bounding rects and hit testing.
pub mod query;
/// String-keyed element factories.
pub mod registry;
/// Stop semantics and pending-stop tracking.
pub mod stop;
pub mod tree;
