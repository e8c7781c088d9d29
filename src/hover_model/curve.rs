// ==============================================================================
// curve.rs — ACCELERATION RESPONSE CURVE
// ------------------------------------------------------------------------------
// Piecewise-linear lookup used to shape drive force against speed ratio:
//
//     multiplier = curve(clamp01(forward_speed / max_speed))
//
// Keys are sorted by `t` on construction. Inputs outside the key range take the
// value of the nearest end key. A curve with no keys behaves like "no curve"
// (flat multiplier of 1).
// ==============================================================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub t: f32,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct ResponseCurve {
    keys: Vec<CurveKey>,
}

impl ResponseCurve {
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.retain(|k| k.t.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.t.total_cmp(&b.t));
        Self { keys }
    }

    /// Build from `(t, value)` pairs.
    pub fn from_pairs(pairs: &[(f32, f32)]) -> Self {
        Self::new(pairs.iter().map(|&(t, value)| CurveKey { t, value }).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 1.0;
        };

        if !t.is_finite() || t <= first.t {
            return first.value;
        }
        if t >= last.t {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.t {
                let span = b.t - a.t;
                if span <= f32::EPSILON {
                    return b.value;
                }
                let u = (t - a.t) / span;
                return a.value + (b.value - a.value) * u;
            }
        }

        last.value
    }
}

impl From<Vec<CurveKey>> for ResponseCurve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<ResponseCurve> for Vec<CurveKey> {
    fn from(curve: ResponseCurve) -> Self {
        curve.keys
    }
}
