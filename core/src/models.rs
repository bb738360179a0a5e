use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Longest stored food name, in characters. Longer names are shortened with
/// a trailing ellipsis before they reach the database.
pub const MAX_FOOD_NAME_CHARS: usize = 50;

/// Biological sex, as used by the calorie estimator. Stored as lowercase
/// text on both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(StoreError::invalid(
                "sex",
                format!("expected 'male' or 'female', got '{other}'"),
            )),
        }
    }
}

impl TryFrom<String> for Sex {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How an intake event was captured. Stored as lowercase text on both
/// backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeSource {
    Image,
    Text,
    Voice,
}

impl IntakeSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IntakeSource::Image => "image",
            IntakeSource::Text => "text",
            IntakeSource::Voice => "voice",
        }
    }
}

impl fmt::Display for IntakeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntakeSource {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(IntakeSource::Image),
            "text" => Ok(IntakeSource::Text),
            "voice" => Ok(IntakeSource::Voice),
            other => Err(StoreError::invalid(
                "source",
                format!("expected 'image', 'text' or 'voice', got '{other}'"),
            )),
        }
    }
}

impl TryFrom<String> for IntakeSource {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One stored profile row.
///
/// `daily_calorie_target` is derived by the service on every write and is
/// never accepted from a caller.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub user_id: i64,
    pub handle: Option<String>,
    pub display_name: String,
    #[sqlx(try_from = "String")]
    pub sex: Sex,
    pub age_years: i32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub daily_calorie_target: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One logged food entry. Rows are append-only.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct IntakeEvent {
    pub id: i64,
    pub user_id: i64,
    pub food_name: String,
    pub calories: i32,
    #[sqlx(try_from = "String")]
    pub source: IntakeSource,
    pub created_at: DateTime<Utc>,
}

/// Caller input for a profile upsert. Carries no derived or timestamp
/// fields; the service fills those in.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: i64,
    pub handle: Option<String>,
    pub display_name: String,
    pub sex: Sex,
    pub age_years: i32,
    pub height_cm: f64,
    pub weight_kg: f64,
}

/// Caller input for one intake event.
#[derive(Debug, Clone)]
pub struct NewIntakeEvent {
    pub user_id: i64,
    pub food_name: String,
    pub calories: i32,
    pub source: IntakeSource,
}

/// Shorten a food name to [`MAX_FOOD_NAME_CHARS`], character-based so
/// multi-byte input cannot be split mid code point.
pub(crate) fn shorten_food_name(name: &str) -> String {
    if name.chars().count() <= MAX_FOOD_NAME_CHARS {
        return name.to_string();
    }
    let mut short: String = name.chars().take(MAX_FOOD_NAME_CHARS - 3).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_round_trip() {
        assert_eq!("male".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!("female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!(Sex::Male.as_str(), "male");
        assert!("other".parse::<Sex>().is_err());
    }

    #[test]
    fn test_source_round_trip() {
        assert_eq!("image".parse::<IntakeSource>().unwrap(), IntakeSource::Image);
        assert_eq!("text".parse::<IntakeSource>().unwrap(), IntakeSource::Text);
        assert_eq!("voice".parse::<IntakeSource>().unwrap(), IntakeSource::Voice);
        assert!("photo".parse::<IntakeSource>().is_err());
    }

    #[test]
    fn test_shorten_food_name_keeps_short_names() {
        assert_eq!(shorten_food_name("Борщ"), "Борщ");
        let exact: String = "x".repeat(MAX_FOOD_NAME_CHARS);
        assert_eq!(shorten_food_name(&exact), exact);
    }

    #[test]
    fn test_shorten_food_name_truncates_long_names() {
        let long: String = "щ".repeat(MAX_FOOD_NAME_CHARS + 10);
        let short = shorten_food_name(&long);
        assert_eq!(short.chars().count(), MAX_FOOD_NAME_CHARS);
        assert!(short.ends_with("..."));
    }
}
