/// Maps a time fraction in `[0, 1]` to a progress fraction in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Progression {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

fn sigmoid(x: f64) -> f64 {
    let x2 = x * x;
    x2 / (x2 + (1.0 - x) * (1.0 - x))
}

/// Inverse of [`sigmoid`] on `[0, 1]`.
fn sigmoid_inverse(p: f64) -> f64 {
    if (p - 0.5).abs() < 1e-12 {
        return 0.5;
    }
    (2.0 * p - (-4.0 * p * p + 4.0 * p).max(0.0).sqrt()) / (4.0 * p - 2.0)
}

impl Progression {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => sigmoid(t / 2.0) * 2.0,
            Self::EaseOut => (sigmoid(0.5 + t / 2.0) - 0.5) * 2.0,
            Self::EaseInOut => sigmoid(t),
        }
    }

    /// Time fraction at which `apply` reaches `p`.
    pub fn invert(self, p: f64) -> f64 {
        let p = p.clamp(0.0, 1.0);
        match self {
            Self::Linear => p,
            Self::EaseIn => {
                if p == 1.0 {
                    1.0
                } else {
                    sigmoid_inverse(p / 2.0) * 2.0
                }
            }
            Self::EaseOut => {
                if p == 0.0 {
                    0.0
                } else {
                    (sigmoid_inverse(p / 2.0 + 0.5) - 0.5) * 2.0
                }
            }
            Self::EaseInOut => sigmoid_inverse(p),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
