use std::cell::RefCell;
use std::rc::Rc;

use crate::element::node::ElementId;
use crate::foundation::core::{Affine, Point, Rgba};
use crate::transform::chain::Transform;

/// One primitive drawn once with a fully composed transform.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub element: ElementId,
    /// Composed chain: copy and pulse, element, then every ancestor.
    pub transform: Transform,
    /// `transform.matrix()`, from draw space to figure space.
    pub matrix: Affine,
    /// Color with alpha already multiplied by the accumulated opacity.
    pub color: Rgba,
    pub opacity: f64,
    pub vertices: Vec<Point>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

/// Drawing surface the figure emits to. The core never rasterizes anything itself.
pub trait Renderer {
    fn draw(&mut self, call: &DrawCall);

    fn measure_text(&self, text: &str, font: &str) -> TextMetrics;

    fn resize(&mut self) {}

    /// Start of a frame. Called before any `draw`.
    fn begin_frame(&mut self) {}
}

/// Shared handle, so the caller can inspect a renderer the figure owns.
impl<R: Renderer> Renderer for Rc<RefCell<R>> {
    fn draw(&mut self, call: &DrawCall) {
        self.borrow_mut().draw(call);
    }

    fn measure_text(&self, text: &str, font: &str) -> TextMetrics {
        self.borrow().measure_text(text, font)
    }

    fn resize(&mut self) {
        self.borrow_mut().resize();
    }

    fn begin_frame(&mut self) {
        self.borrow_mut().begin_frame();
    }
}

/// Keeps the calls of the most recent frame. Useful headless and in tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<DrawCall>,
    pub frames: usize,
    pub resizes: usize,
}

impl RecordingRenderer {
    pub fn calls_for(&self, element: ElementId) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(move |c| c.element == element)
    }
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, call: &DrawCall) {
        self.calls.push(call.clone());
    }

    /// Fixed-advance estimate: 0.6 em per character at a 1 unit em.
    fn measure_text(&self, text: &str, _font: &str) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f64 * 0.6,
            ascent: 0.8,
            descent: 0.2,
        }
    }

    fn resize(&mut self) {
        self.resizes += 1;
    }

    fn begin_frame(&mut self) {
        self.calls.clear();
        self.frames += 1;
    }
}
