use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

use crate::config::ConfigError;

pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// 本番ランキング用の重み
/// 立地と時間帯を最重視し、設備は補助的に扱う
pub const CANONICAL_WEIGHTS: WeightVector = WeightVector {
    location: 0.30,
    time: 0.25,
    category: 0.20,
    capacity: 0.10,
    price: 0.10,
    facility: 0.05,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    Location,
    Time,
    Category,
    Capacity,
    Price,
    Facility,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub location: f64,
    pub time: f64,
    pub category: f64,
    pub capacity: f64,
    pub price: f64,
    pub facility: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        CANONICAL_WEIGHTS
    }
}

impl WeightVector {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Location => self.location,
            Dimension::Time => self.time,
            Dimension::Category => self.category,
            Dimension::Capacity => self.capacity,
            Dimension::Price => self.price,
            Dimension::Facility => self.facility,
        }
    }

    pub fn sum(&self) -> f64 {
        self.location + self.time + self.category + self.capacity + self.price + self.facility
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        use strum::IntoEnumIterator;

        for dimension in Dimension::iter() {
            let value = self.get(dimension);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    dimension: dimension.as_ref().to_string(),
                    value,
                });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        assert!((CANONICAL_WEIGHTS.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
        assert!(CANONICAL_WEIGHTS.validate().is_ok());
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let weights = WeightVector {
            facility: 0.10,
            ..CANONICAL_WEIGHTS
        };

        match weights.validate() {
            Err(ConfigError::WeightSum(sum)) => assert!((sum - 1.05).abs() < 1e-9),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_weights_even_when_sum_is_one() {
        let weights = WeightVector {
            location: 0.40,
            facility: -0.05,
            ..CANONICAL_WEIGHTS
        };

        assert!(matches!(
            weights.validate(),
            Err(ConfigError::InvalidWeight { ref dimension, .. }) if dimension == "facility"
        ));
    }
}
