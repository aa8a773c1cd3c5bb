use serde::{Deserialize, Serialize};

/// Easing curve applied to normalised behavior progress. Every variant maps
/// `[0, 1]` onto `[0, 1]` with `0 -> 0` and `1 -> 1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Interpolator {
    #[default]
    Linear,
    ExponentialIn(f64),
    ExponentialOut(f64),
    ExponentialInOut(f64),
    BounceOut,
}

impl Interpolator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::ExponentialIn(_) => "exponential-in",
            Self::ExponentialOut(_) => "exponential-out",
            Self::ExponentialInOut(_) => "exponential-in-out",
            Self::BounceOut => "bounce-out",
        }
    }

    pub fn interpolate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Self::Linear => t,
            Self::ExponentialIn(exponent) => t.powf(exponent),
            Self::ExponentialOut(exponent) => 1.0 - (1.0 - t).powf(exponent),
            Self::ExponentialInOut(exponent) => {
                if t < 0.5 {
                    (2.0 * t).powf(exponent) / 2.0
                } else {
                    1.0 - (2.0 * (1.0 - t)).powf(exponent) / 2.0
                }
            }
            Self::BounceOut => bounce_out(t),
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn endpoints_are_fixed() {
        for interpolator in [
            Interpolator::Linear,
            Interpolator::ExponentialIn(2.0),
            Interpolator::ExponentialOut(3.0),
            Interpolator::ExponentialInOut(2.0),
            Interpolator::BounceOut,
        ] {
            assert_relative_eq!(interpolator.interpolate(0.0), 0.0);
            assert_relative_eq!(interpolator.interpolate(1.0), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn ease_in_lags_linear() {
        let ease = Interpolator::ExponentialIn(2.0);
        assert_relative_eq!(ease.interpolate(0.5), 0.25);
        assert_relative_eq!(Interpolator::ExponentialInOut(2.0).interpolate(0.5), 0.5);
    }
}
