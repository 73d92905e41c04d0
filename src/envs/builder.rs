use rand::distributions::WeightedError;
use thiserror::Error;

pub trait EnvBuilder<E> {
    /// Build an environment instance.
    ///
    /// # Args
    /// * `seed` - Seed for pseudo-randomness used to generate the environment structure.
    ///     Configurations with fully specified parameters ignore it.
    fn build_env(&self, seed: u64) -> Result<E, BuildEnvError>;
}

/// Error building an environment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildEnvError {
    #[error("demand distribution is empty")]
    EmptyDemand,
    #[error("invalid probability {probability} for demand {demand}")]
    InvalidProbability { demand: u32, probability: f64 },
    #[error("demand probabilities sum to {total}, expected 1")]
    DemandNotNormalized { total: f64 },
    #[error("discount factor {0} is not in [0, 1]")]
    InvalidDiscountFactor(f64),
    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },
    #[error("initial stock {stock} exceeds capacity {capacity}")]
    StockAboveCapacity { stock: u32, capacity: u32 },
    #[error("expected {expected} {name} entries, got {actual}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("demand {demand} in period {period} exceeds capacity {capacity}")]
    DemandAboveCapacity {
        period: usize,
        demand: u32,
        capacity: u32,
    },
    #[error(transparent)]
    Weights(#[from] WeightedError),
    #[error("invalid {name} range [{low}, {high}]")]
    InvalidRange {
        name: &'static str,
        low: f64,
        high: f64,
    },
}

/// Check that a discount factor lies in `[0, 1]`.
pub fn check_discount_factor(discount_factor: f64) -> Result<(), BuildEnvError> {
    if (0.0..=1.0).contains(&discount_factor) {
        Ok(())
    } else {
        Err(BuildEnvError::InvalidDiscountFactor(discount_factor))
    }
}

/// Check that `[low, high]` is a non-empty finite range.
pub(crate) fn check_range(name: &'static str, low: f64, high: f64) -> Result<(), BuildEnvError> {
    if low.is_finite() && high.is_finite() && low <= high {
        Ok(())
    } else {
        Err(BuildEnvError::InvalidRange { name, low, high })
    }
}

/// Check that a cost or price parameter is finite.
pub(super) fn check_finite(name: &'static str, value: f64) -> Result<(), BuildEnvError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BuildEnvError::NonFiniteParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(0.95)]
    #[case(1.0)]
    fn discount_factor_in_range(#[case] discount_factor: f64) {
        assert_eq!(check_discount_factor(discount_factor), Ok(()));
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn discount_factor_out_of_range(#[case] discount_factor: f64) {
        assert!(check_discount_factor(discount_factor).is_err());
    }

    #[rstest]
    #[case(1.0, 1.0, true)]
    #[case(1.0, 3.0, true)]
    #[case(3.0, 1.0, false)]
    #[case(0.0, f64::INFINITY, false)]
    fn ranges(#[case] low: f64, #[case] high: f64, #[case] valid: bool) {
        assert_eq!(check_range("cost", low, high).is_ok(), valid);
    }

    #[test]
    fn non_finite_cost() {
        assert_eq!(
            check_finite("holding_cost", f64::INFINITY),
            Err(BuildEnvError::NonFiniteParameter {
                name: "holding_cost",
                value: f64::INFINITY
            })
        );
    }
}
