//! Daily calorie target derivation.
//!
//! Basal metabolic rate via the Mifflin-St Jeor linear formula, scaled by a
//! fixed sedentary activity factor. Every number is a named constant, so a
//! target is exactly reproducible from the four inputs.

use crate::error::{Result, StoreError};
use crate::models::Sex;

/// Weight multiplier of the BMR formula (kcal per kg).
pub const WEIGHT_FACTOR: f64 = 10.0;
/// Height multiplier of the BMR formula (kcal per cm).
pub const HEIGHT_FACTOR: f64 = 6.25;
/// Age multiplier of the BMR formula (kcal per year).
pub const AGE_FACTOR: f64 = 5.0;
/// Constant offset for male profiles.
pub const MALE_OFFSET: f64 = 5.0;
/// Constant offset for female profiles.
pub const FEMALE_OFFSET: f64 = -161.0;
/// Fixed sedentary activity multiplier applied to the BMR.
pub const ACTIVITY_FACTOR: f64 = 1.2;

/// Derive the daily calorie target from physical attributes.
///
/// Pure and deterministic; the result is rounded to the nearest whole
/// calorie. Fails with [`StoreError::InvalidAttribute`] naming the first
/// offending field.
pub fn estimate(sex: Sex, age_years: i32, height_cm: f64, weight_kg: f64) -> Result<i32> {
    if age_years <= 0 {
        return Err(StoreError::invalid(
            "age_years",
            "must be a positive number of years",
        ));
    }
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(StoreError::invalid(
            "height_cm",
            "must be a positive number of centimeters",
        ));
    }
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(StoreError::invalid(
            "weight_kg",
            "must be a positive number of kilograms",
        ));
    }

    let offset = match sex {
        Sex::Male => MALE_OFFSET,
        Sex::Female => FEMALE_OFFSET,
    };
    let bmr = WEIGHT_FACTOR * weight_kg + HEIGHT_FACTOR * height_cm
        - AGE_FACTOR * f64::from(age_years)
        + offset;
    Ok((bmr * ACTIVITY_FACTOR).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_male_baseline() {
        // BMR 10*75 + 6.25*180 - 5*30 + 5 = 1730, times 1.2 = 2076.
        assert_eq!(estimate(Sex::Male, 30, 180.0, 75.0).unwrap(), 2076);
    }

    #[test]
    fn test_female_baseline() {
        // BMR 10*60 + 6.25*165 - 5*30 - 161 = 1320.25, times 1.2 = 1584.3.
        assert_eq!(estimate(Sex::Female, 30, 165.0, 60.0).unwrap(), 1584);
    }

    #[test]
    fn test_rounds_to_nearest_calorie() {
        // BMR 10*50 + 6.25*160 - 5*21 - 161 = 1234, times 1.2 = 1480.8;
        // truncation would give 1480.
        assert_eq!(estimate(Sex::Female, 21, 160.0, 50.0).unwrap(), 1481);
    }

    #[test]
    fn test_deterministic() {
        let first = estimate(Sex::Male, 42, 177.5, 83.2).unwrap();
        for _ in 0..10 {
            assert_eq!(estimate(Sex::Male, 42, 177.5, 83.2).unwrap(), first);
        }
    }

    fn invalid_field(result: Result<i32>) -> &'static str {
        match result {
            Err(StoreError::InvalidAttribute { field, .. }) => field,
            other => panic!("expected InvalidAttribute, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_attributes() {
        assert_eq!(invalid_field(estimate(Sex::Male, 0, 180.0, 75.0)), "age_years");
        assert_eq!(invalid_field(estimate(Sex::Male, -4, 180.0, 75.0)), "age_years");
        assert_eq!(invalid_field(estimate(Sex::Male, 30, 0.0, 75.0)), "height_cm");
        assert_eq!(
            invalid_field(estimate(Sex::Male, 30, f64::NAN, 75.0)),
            "height_cm"
        );
        assert_eq!(invalid_field(estimate(Sex::Male, 30, 180.0, -1.0)), "weight_kg");
        assert_eq!(
            invalid_field(estimate(Sex::Female, 30, 180.0, f64::INFINITY)),
            "weight_kg"
        );
    }
}
