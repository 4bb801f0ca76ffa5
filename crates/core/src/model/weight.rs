use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum WeightError {
    #[error("weight must be a finite number, got {0}")]
    NotFinite(f64),

    #[error("weight cannot be negative, got {0}")]
    Negative(f64),

    #[error("weight {0} kg is too large")]
    TooLarge(f64),
}

/// A load in fixed-point grams.
///
/// Weights are entered in kilograms but stored as whole grams so that
/// equal loads compare equal exactly, including fractional plate math
/// such as 102.5 kg or 61.25 kg.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weight(u32);

impl Weight {
    pub const ZERO: Self = Self(0);

    /// Builds a weight from whole grams.
    #[must_use]
    pub fn from_grams(grams: u32) -> Self {
        Self(grams)
    }

    /// Builds a weight from kilograms, rounding to the nearest gram.
    ///
    /// # Errors
    ///
    /// Returns `WeightError` if `kg` is negative, not finite, or does not fit.
    pub fn from_kg(kg: f64) -> Result<Self, WeightError> {
        if !kg.is_finite() {
            return Err(WeightError::NotFinite(kg));
        }
        if kg < 0.0 {
            return Err(WeightError::Negative(kg));
        }
        let grams = (kg * 1000.0).round();
        if grams > f64::from(u32::MAX) {
            return Err(WeightError::TooLarge(kg));
        }
        // Range checked above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Self(grams as u32))
    }

    #[must_use]
    pub fn grams(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn kg(&self) -> f64 {
        f64::from(self.0) / 1000.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Weight({}kg)", self.kg())
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kg", self.kg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_plates_compare_exactly() {
        let a = Weight::from_kg(61.25).unwrap();
        let b = Weight::from_kg(60.0 + 1.25).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.grams(), 61_250);
    }

    #[test]
    fn float_noise_collapses_to_same_gram() {
        let summed = Weight::from_kg(0.1 + 0.2).unwrap();
        let literal = Weight::from_kg(0.3).unwrap();
        assert_eq!(summed, literal);
    }

    #[test]
    fn rejects_negative_and_nan() {
        assert!(matches!(
            Weight::from_kg(-1.0),
            Err(WeightError::Negative(_))
        ));
        assert!(matches!(
            Weight::from_kg(f64::NAN),
            Err(WeightError::NotFinite(_))
        ));
    }

    #[test]
    fn orders_by_load() {
        let light = Weight::from_kg(80.0).unwrap();
        let heavy = Weight::from_kg(100.0).unwrap();
        assert!(heavy > light);
        assert_eq!(heavy.kg(), 100.0);
    }
}
