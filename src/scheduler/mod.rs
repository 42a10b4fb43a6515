//! Frame clock and draw scheduling shared by a figure and its element tree.
//!
//! A [`GlobalAnimation`] is constructed explicitly and handed to everything that needs time.
//! Hosts drive it from their animation-frame callback; tests drive it with manual frames.

/// `GlobalAnimation`: draw queue, clock, timers.
pub mod global;
/// Time sources.
pub mod source;
