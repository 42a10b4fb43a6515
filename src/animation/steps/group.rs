use crate::animation::step::AnimationStep;
use crate::element::tree::ElementTree;
use crate::foundation::core::When;

/// Children of a serial or parallel step. `index` is the serial cursor.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupStep {
    pub steps: Vec<AnimationStep>,
    pub index: usize,
}

impl GroupStep {
    pub fn new(steps: Vec<AnimationStep>) -> Self {
        Self { steps, index: 0 }
    }

    /// Start the child at `index`, skipping over children that finish as soon as they start.
    ///
    /// Returns `true` once every child has finished.
    pub(crate) fn start_from_index(&mut self, when: When, tree: &mut ElementTree) -> bool {
        while let Some(step) = self.steps.get_mut(self.index) {
            step.start(when, tree);
            step.finish_if_zero_duration(tree);
            if !step.is_finished() {
                return false;
            }
            self.index += 1;
        }
        true
    }
}
