use crate::animation::callback::{Callback, FinishFn, TriggerFn};
use crate::animation::step::AnimationStep;
use crate::animation::steps::color::{ColorStep, OpacityStep};
use crate::animation::steps::control::{CustomStep, TriggerStep};
use crate::animation::steps::motion::{PositionStep, RotationStep, ScaleStep, TransformStep};
use crate::animation::steps::pulse::PulseStep;
use crate::animation::steps::scenario::ScenarioStep;
use crate::element::node::ElementId;
use crate::element::pulse::PulseOptions;
use crate::element::tree::ElementTree;
use crate::foundation::core::When;

/// Fluent serial chain for one element.
///
/// ```ignore
/// tree.animate(id)
///     .position(PositionStep::to(Point::new(1.0, 1.0)), 1.0)
///     .delay(0.5)
///     .dissolve_out(0.4)
///     .start(&mut tree, When::Now);
/// ```
#[derive(Clone, Debug)]
pub struct AnimationBuilder {
    element: ElementId,
    name: String,
    steps: Vec<AnimationStep>,
    on_finish: Option<Callback<FinishFn>>,
}

impl AnimationBuilder {
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            name: String::new(),
            steps: Vec::new(),
            on_finish: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append any step as the next in the chain.
    pub fn then(mut self, step: AnimationStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn position(self, step: PositionStep, duration: f64) -> Self {
        self.then(AnimationStep::position(step).with_duration(duration))
    }

    pub fn rotation(self, step: RotationStep, duration: f64) -> Self {
        self.then(AnimationStep::rotation(step).with_duration(duration))
    }

    pub fn scale(self, step: ScaleStep, duration: f64) -> Self {
        self.then(AnimationStep::scale(step).with_duration(duration))
    }

    pub fn transform(self, step: TransformStep, duration: f64) -> Self {
        self.then(AnimationStep::transform(step).with_duration(duration))
    }

    pub fn color(self, step: ColorStep, duration: f64) -> Self {
        self.then(AnimationStep::color(step).with_duration(duration))
    }

    pub fn opacity(self, step: OpacityStep, duration: f64) -> Self {
        self.then(AnimationStep::opacity(step).with_duration(duration))
    }

    pub fn dissolve_in(self, duration: f64) -> Self {
        self.then(
            AnimationStep::opacity(OpacityStep::dissolve_in())
                .with_duration(duration)
                .complete_on_cancel(true),
        )
    }

    pub fn dissolve_out(self, duration: f64) -> Self {
        self.then(
            AnimationStep::opacity(OpacityStep::dissolve_out())
                .with_duration(duration)
                .complete_on_cancel(true),
        )
    }

    pub fn dim(self, duration: f64) -> Self {
        self.then(
            AnimationStep::color(ColorStep::dim())
                .with_duration(duration)
                .complete_on_cancel(true),
        )
    }

    pub fn undim(self, duration: f64) -> Self {
        self.then(
            AnimationStep::color(ColorStep::undim())
                .with_duration(duration)
                .complete_on_cancel(true),
        )
    }

    /// `None` keeps the scenario's own default: 1s, or velocity-derived.
    pub fn scenario(self, step: ScenarioStep, duration: Option<f64>) -> Self {
        let step = AnimationStep::scenario(step);
        match duration {
            Some(d) => self.then(step.with_duration(d)),
            None => self.then(step),
        }
    }

    pub fn pulse(self, options: PulseOptions) -> Self {
        self.then(AnimationStep::pulse(PulseStep::new(options)))
    }

    pub fn custom(self, step: CustomStep, duration: f64) -> Self {
        self.then(AnimationStep::custom(step).with_duration(duration))
    }

    pub fn trigger(self, callback: Callback<TriggerFn>) -> Self {
        self.then(AnimationStep::trigger(TriggerStep::new(callback)))
    }

    pub fn delay(self, seconds: f64) -> Self {
        self.then(AnimationStep::delay_for(seconds))
    }

    /// Run `steps` together as the next link of the chain.
    pub fn in_parallel(self, steps: Vec<AnimationStep>) -> Self {
        self.then(AnimationStep::parallel(steps))
    }

    pub fn when_finished(mut self, callback: Callback<FinishFn>) -> Self {
        self.on_finish = Some(callback);
        self
    }

    /// The chain as one serial step targeting the builder's element.
    pub fn build(self) -> AnimationStep {
        let mut step = AnimationStep::serial(self.steps)
            .named(self.name)
            .on(self.element);
        step.on_finish = self.on_finish;
        step
    }

    /// Queue the chain without starting it. Returns the animation name.
    pub fn add(self, tree: &mut ElementTree) -> String {
        let element = self.element;
        tree.add_animation(element, self.build())
    }

    /// Queue and start the chain. Returns the animation name.
    pub fn start(self, tree: &mut ElementTree, when: When) -> String {
        let element = self.element;
        tree.start_animation(element, self.build(), when)
    }
}

impl ElementTree {
    /// Begin a serial animation chain on `id`.
    pub fn animate(&self, id: ElementId) -> AnimationBuilder {
        AnimationBuilder::new(id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/builder.rs"]
mod tests;
