#![forbid(unsafe_code)]

pub mod animation;
pub mod element;
pub mod figure;
mod foundation;
pub mod geometry;
pub mod notify;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod transform;

pub use animation::builder::AnimationBuilder;
pub use animation::callback::{Callback, FunctionMap, custom_fn, finish_fn, trigger_fn};
pub use animation::ease::Progression;
pub use animation::manager::{AnimationManager, ManagerState};
pub use animation::step::{AnimationStep, StepKind, StepState};
pub use element::node::{Element, ElementId, Primitive};
pub use element::registry::ElementRegistry;
pub use element::tree::ElementTree;
pub use figure::{Figure, FigureOptions, SetStateOptions, StateDuration, StateHow};
pub use foundation::core::{
    Affine, CanvasSize, Force, Point, Rect, Rgba, RotDirection, Space, StopHow, Vec2, When,
};
pub use foundation::error::{FigureError, FigureResult};
pub use foundation::math::{ClipAngle, Lerp, delta_angle, round};
pub use notify::Notifications;
pub use render::{DrawCall, RecordingRenderer, Renderer, TextMetrics};
pub use scheduler::global::GlobalAnimation;
pub use scheduler::source::{FrameSource, ManualFrameSource, SystemFrameSource};
pub use state::{ElementState, FigureState};
pub use transform::chain::Transform;
