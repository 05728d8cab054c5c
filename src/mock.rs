//! Last link of the resolution chain: synthesizes a plausible prediction
//! without any model or network call.

use rand::Rng;

use crate::models::Prediction;

pub const MUTATION_MIN: f64 = 0.2;
pub const MUTATION_MAX: f64 = 0.8;

/// Synthetic processing time is `BASE + U[0, JITTER)` seconds.
pub const PROCESSING_BASE_SECS: f64 = 0.5;
pub const PROCESSING_JITTER_SECS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MockPrediction {
    pub prediction: Prediction,
    pub mutation_probability: f64,
    pub non_mutation_probability: f64,
    pub confidence: f64,
    pub processing_time: f64,
}

impl MockPrediction {
    /// Model-output pair in `[non_mutation, mutation]` order.
    pub fn raw_prediction(&self) -> Vec<Vec<f64>> {
        vec![vec![self.non_mutation_probability, self.mutation_probability]]
    }
}

pub fn generate() -> MockPrediction {
    generate_with(&mut rand::rng())
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> MockPrediction {
    let mutation = round_to(rng.random_range(MUTATION_MIN..=MUTATION_MAX), 4);
    let non_mutation = round_to(1.0 - mutation, 4);
    let processing_time = round_to(
        PROCESSING_BASE_SECS + rng.random_range(0.0..PROCESSING_JITTER_SECS),
        3,
    );

    MockPrediction {
        prediction: Prediction::from_mutation_probability(mutation),
        mutation_probability: mutation,
        non_mutation_probability: non_mutation,
        confidence: mutation.max(non_mutation),
        processing_time,
    }
}

pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn invariants_hold_across_draws() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let mock = generate_with(&mut rng);
            assert!((MUTATION_MIN..=MUTATION_MAX).contains(&mock.mutation_probability));
            assert_eq!(
                mock.prediction == Prediction::Dspd,
                mock.mutation_probability > 0.5
            );
            assert_eq!(
                mock.confidence,
                mock.mutation_probability.max(mock.non_mutation_probability)
            );
            assert!((mock.mutation_probability + mock.non_mutation_probability - 1.0).abs() < 1e-9);
            assert!(mock.processing_time >= PROCESSING_BASE_SECS);
            assert!(mock.processing_time <= PROCESSING_BASE_SECS + PROCESSING_JITTER_SECS);
        }
    }

    #[test]
    fn both_labels_occur() {
        let mut rng = StdRng::seed_from_u64(42);
        let draws: Vec<_> = (0..200).map(|_| generate_with(&mut rng).prediction).collect();
        assert!(draws.contains(&Prediction::Dspd));
        assert!(draws.contains(&Prediction::NoDspd));
    }

    #[test]
    fn raw_prediction_order() {
        let mock = generate();
        assert_eq!(
            mock.raw_prediction(),
            vec![vec![mock.non_mutation_probability, mock.mutation_probability]]
        );
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(1.23456, 3), 1.235);
    }
}
