//! Shared nutrition data structure
//!
//! The six numeric nutrients tracked for entries, reports, and daily buckets.

use serde::{Deserialize, Serialize};

/// Numeric nutrient quantities
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64, // kcal
    pub protein: f64,  // grams
    pub carbs: f64,    // grams
    pub fat: f64,      // grams
    pub fiber: f64,    // grams
    pub sugar: f64,    // grams
}

impl Nutrition {
    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Field-wise sum, saturating at `f64::MAX` so totals stay finite
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: saturating_sum(self.calories, other.calories),
            protein: saturating_sum(self.protein, other.protein),
            carbs: saturating_sum(self.carbs, other.carbs),
            fat: saturating_sum(self.fat, other.fat),
            fiber: saturating_sum(self.fiber, other.fiber),
            sugar: saturating_sum(self.sugar, other.sugar),
        }
    }

    /// Divide every field by `divisor`; zero divisor yields zero
    pub fn divide(&self, divisor: f64) -> Self {
        if divisor == 0.0 {
            return Self::zero();
        }
        Self {
            calories: self.calories / divisor,
            protein: self.protein / divisor,
            carbs: self.carbs / divisor,
            fat: self.fat / divisor,
            fiber: self.fiber / divisor,
            sugar: self.sugar / divisor,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

fn saturating_sum(a: f64, b: f64) -> f64 {
    (a + b).min(f64::MAX)
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::AddAssign<&Nutrition> for Nutrition {
    fn add_assign(&mut self, other: &Nutrition) {
        *self = Nutrition::add(self, other);
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

impl<'a> std::iter::Sum<&'a Nutrition> for Nutrition {
    fn sum<I: Iterator<Item = &'a Nutrition>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + *n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(calories: f64, protein: f64) -> Nutrition {
        Nutrition { calories, protein, ..Nutrition::zero() }
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total: Nutrition = Vec::<Nutrition>::new().into_iter().sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_add_assign_accumulates() {
        let mut total = Nutrition::zero();
        total += &sample(95.0, 0.0);
        total += &sample(52.0, 2.0);
        assert_eq!(total.calories, 147.0);
        assert_eq!(total.protein, 2.0);
    }

    #[test]
    fn test_divide_by_zero_is_zero() {
        assert!(sample(100.0, 5.0).divide(0.0).is_zero());
        assert_eq!(sample(100.0, 5.0).divide(2.0).calories, 50.0);
    }

    #[test]
    fn test_add_saturates_instead_of_overflowing() {
        let huge = sample(1e308, 1e308);
        let total: Nutrition = [huge, huge, huge].iter().sum();
        assert_eq!(total.calories, f64::MAX);
        assert!(total.protein.is_finite());

        let json = serde_json::to_value(total).unwrap();
        assert!(json["calories"].is_number());
    }
}
