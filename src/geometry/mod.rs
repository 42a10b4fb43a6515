//! Movement bounds and deceleration physics.

/// Range, rectangle and line bounds.
pub mod bounds;
/// Closed-form deceleration with bouncing.
pub mod deceleration;
