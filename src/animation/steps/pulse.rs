use crate::element::node::ElementId;
use crate::element::pulse::PulseOptions;
use crate::element::tree::ElementTree;
use crate::foundation::core::StopHow;

/// Starts an element pulse on its first frame and, by default, ends it with the step.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PulseStep {
    pub options: PulseOptions,
    pub stop_after_duration: bool,
    pub(crate) to_start: bool,
}

impl Default for PulseStep {
    fn default() -> Self {
        Self {
            options: PulseOptions::default(),
            stop_after_duration: true,
            to_start: true,
        }
    }
}

impl PulseStep {
    pub fn new(options: PulseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub(crate) fn frame(&mut self, element: ElementId, tree: &mut ElementTree) {
        if self.to_start {
            tree.pulse(element, &self.options);
            self.to_start = false;
        }
    }

    pub(crate) fn end(&self, element: ElementId, tree: &mut ElementTree) {
        if self.stop_after_duration {
            tree.stop_pulsing(element, StopHow::Complete);
        }
    }
}
