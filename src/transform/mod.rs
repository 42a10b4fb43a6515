//! Transform chains and velocity helpers.

/// Named scale/rotation/translation chains and their matrix fold.
pub mod chain;
/// Duration-from-velocity helpers.
pub mod velocity;
