use rand::Rng;
use serde::Serialize;

/// Which way to swerve when a wall is ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvoidDirection {
    Left,
    Right,
}

impl AvoidDirection {
    /// -1 for left, +1 for right (matches positive steering = right).
    pub fn sign(self) -> f32 {
        match self {
            AvoidDirection::Left => -1.0,
            AvoidDirection::Right => 1.0,
        }
    }
}

/// Source of avoidance directions; one pick per avoidance episode.
pub trait DirectionSource {
    fn pick(&mut self) -> AvoidDirection;
}

/// Fair coin over any `rand` generator (seeded ChaCha in the simulation).
#[derive(Debug, Clone)]
pub struct RandomDirection<R> {
    rng: R,
}

impl<R: Rng> RandomDirection<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DirectionSource for RandomDirection<R> {
    fn pick(&mut self) -> AvoidDirection {
        if self.rng.gen_bool(0.5) { AvoidDirection::Right } else { AvoidDirection::Left }
    }
}

/// Always the same answer; counts how often it was asked.
#[derive(Debug, Clone)]
pub struct FixedDirection {
    pub direction: AvoidDirection,
    pub picks: usize,
}

impl FixedDirection {
    pub fn new(direction: AvoidDirection) -> Self {
        Self { direction, picks: 0 }
    }
}

impl DirectionSource for FixedDirection {
    fn pick(&mut self) -> AvoidDirection {
        self.picks += 1;
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn seeded_source_is_deterministic_and_uses_both_sides() {
        let mut a = RandomDirection::new(ChaCha8Rng::seed_from_u64(42));
        let mut b = RandomDirection::new(ChaCha8Rng::seed_from_u64(42));
        let xs: Vec<_> = (0..64).map(|_| a.pick()).collect();
        let ys: Vec<_> = (0..64).map(|_| b.pick()).collect();
        assert_eq!(xs, ys);
        assert!(xs.contains(&AvoidDirection::Left));
        assert!(xs.contains(&AvoidDirection::Right));
    }

    #[test]
    fn sign_matches_steering_convention() {
        assert_eq!(AvoidDirection::Left.sign(), -1.0);
        assert_eq!(AvoidDirection::Right.sign(), 1.0);
    }
}
