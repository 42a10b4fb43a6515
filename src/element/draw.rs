use crate::element::node::{ElementId, ElementKind};
use crate::element::tree::ElementTree;
use crate::render::{DrawCall, Renderer};
use crate::transform::chain::Transform;

/// Every `with` transform followed by every input transform, input-major.
///
/// An empty `with` leaves the inputs unchanged.
pub(crate) fn transform_by(inputs: Vec<Transform>, with: &[&Transform]) -> Vec<Transform> {
    if with.is_empty() {
        return inputs;
    }
    inputs
        .iter()
        .flat_map(|input| with.iter().map(move |t| t.transform(input)))
        .collect()
}

impl ElementTree {
    /// First draw phase: advance animations, free motion and pulses for the whole subtree.
    ///
    /// Nothing is emitted here, so every transform is final before the second phase runs.
    pub fn setup_draw(&mut self, id: ElementId, now: f64) {
        let Some(el) = self.get(id) else {
            return;
        };
        if !el.is_shown {
            return;
        }
        self.animations_next_frame(id, now);
        self.moving_freely_frame(id, now);
        self.pulse_frame(id, now);
        let children = self.get(id).map(|e| e.children().to_vec()).unwrap_or_default();
        for child in children {
            self.setup_draw(child, now);
        }
    }

    /// Chains this element draws with, given its parent's draw chains.
    pub fn draw_transforms(&self, id: ElementId, parents: &[Transform]) -> Vec<Transform> {
        let Some(el) = self.get(id) else {
            return Vec::new();
        };
        let own = parents.iter().map(|p| el.transform.transform(p)).collect();
        let copies: Vec<&Transform> = el.copy_transforms.iter().collect();
        let pulses: Vec<&Transform> = el.pulse.active_transforms().collect();
        transform_by(transform_by(own, &copies), &pulses)
    }

    /// Second draw phase: emit one call per primitive per copy and pulse transform.
    pub fn draw(
        &self,
        id: ElementId,
        parents: &[Transform],
        parent_opacity: f64,
        renderer: &mut dyn Renderer,
    ) {
        let Some(el) = self.get(id) else {
            return;
        };
        if !el.is_shown {
            return;
        }
        let transforms = self.draw_transforms(id, parents);
        let opacity = el.opacity * parent_opacity;
        match &el.kind {
            ElementKind::Collection(c) => {
                for child in &c.draw_order {
                    self.draw(*child, &transforms, opacity, renderer);
                }
            }
            ElementKind::Primitive(p) => {
                let color = el.color.with_alpha(el.color.a * opacity);
                for transform in transforms {
                    renderer.draw(&DrawCall {
                        element: id,
                        matrix: transform.matrix(),
                        transform,
                        color,
                        opacity,
                        vertices: p.points.clone(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/draw.rs"]
mod tests;
