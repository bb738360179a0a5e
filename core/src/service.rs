use chrono::{DateTime, Utc};

use crate::config::BackendConfig;
use crate::db::{self, StoreBackend};
use crate::error::{Result, StoreError};
use crate::estimator;
use crate::models::{IntakeEvent, NewIntakeEvent, NewProfile, UserProfile, shorten_food_name};

/// Public facade over the configured storage backend.
///
/// Owns the process-wide connection state: construct once at startup and
/// share. Caller input is validated here, `daily_calorie_target` is derived
/// here, and timestamps are stamped here, so both engines behave
/// identically.
pub struct KcalService {
    backend: Box<dyn StoreBackend>,
}

impl KcalService {
    /// Connect to the configured backend and ensure the schema exists.
    ///
    /// Fails fast: an unreachable backend or a failed schema init means no
    /// service value is ever handed out, so no store operation can run.
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        let backend = db::connect(config).await?;
        Ok(Self { backend })
    }

    /// In-memory SQLite service, used by tests and one-off tooling.
    pub async fn connect_in_memory() -> Result<Self> {
        let backend = db::connect_in_memory().await?;
        Ok(Self { backend })
    }

    // --- Profile store ---

    /// Insert the profile, or fully update it when `new.user_id` already
    /// has a row.
    ///
    /// `daily_calorie_target` is recomputed from the supplied attributes on
    /// every call; the previously stored value never survives a write.
    /// `created_at` is set on insert only, `updated_at` on every write.
    pub async fn upsert_profile(&self, new: &NewProfile) -> Result<UserProfile> {
        validate_user_id(new.user_id)?;
        let target = estimator::estimate(new.sex, new.age_years, new.height_cm, new.weight_kg)?;
        let now = Utc::now();
        let row = UserProfile {
            user_id: new.user_id,
            handle: new.handle.clone(),
            display_name: new.display_name.clone(),
            sex: new.sex,
            age_years: new.age_years,
            height_cm: new.height_cm,
            weight_kg: new.weight_kg,
            daily_calorie_target: target,
            created_at: now,
            updated_at: now,
        };
        let stored = self.backend.upsert_profile(&row).await?;
        tracing::debug!(
            user_id = stored.user_id,
            target = stored.daily_calorie_target,
            "profile upserted"
        );
        Ok(stored)
    }

    /// Read one profile. `None` means "not yet registered".
    pub async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        self.backend.get_profile(user_id).await
    }

    // --- History log ---

    /// Append one intake event. Always inserts; `created_at` comes from the
    /// store clock, never from the caller. Over-long food names are
    /// shortened before the write.
    pub async fn log_intake(&self, new: &NewIntakeEvent) -> Result<IntakeEvent> {
        validate_user_id(new.user_id)?;
        if new.calories < 0 {
            return Err(StoreError::invalid("calories", "must be zero or positive"));
        }
        let event = NewIntakeEvent {
            food_name: shorten_food_name(&new.food_name),
            ..new.clone()
        };
        let stored = self.backend.insert_event(&event, Utc::now()).await?;
        tracing::debug!(
            user_id = stored.user_id,
            calories = stored.calories,
            "intake event logged"
        );
        Ok(stored)
    }

    /// Events for one user, oldest first, with optional inclusive bounds.
    /// Empty when the user has no events in range.
    pub async fn list_events(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<IntakeEvent>> {
        self.backend.list_events(user_id, since, until).await
    }

    /// The newest `limit` events for one user, newest first.
    pub async fn recent_events(&self, user_id: i64, limit: u32) -> Result<Vec<IntakeEvent>> {
        self.backend.recent_events(user_id, limit).await
    }

    /// Sum of calories over the same filtered set as [`Self::list_events`].
    pub async fn sum_calories(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        self.backend.sum_calories(user_id, since, until).await
    }
}

fn validate_user_id(user_id: i64) -> Result<()> {
    if user_id <= 0 {
        return Err(StoreError::invalid("user_id", "must be a positive identity"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{IntakeSource, MAX_FOOD_NAME_CHARS, Sex};

    fn ivan() -> NewProfile {
        NewProfile {
            user_id: 1,
            handle: Some("ivan".to_string()),
            display_name: "Иван Петров".to_string(),
            sex: Sex::Male,
            age_years: 30,
            height_cm: 180.0,
            weight_kg: 75.0,
        }
    }

    fn meal(user_id: i64, food: &str, calories: i32, source: IntakeSource) -> NewIntakeEvent {
        NewIntakeEvent {
            user_id,
            food_name: food.to_string(),
            calories,
            source,
        }
    }

    async fn service() -> KcalService {
        KcalService::connect_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_first_upsert_creates_profile() {
        let svc = service().await;
        let profile = svc.upsert_profile(&ivan()).await.unwrap();

        assert_eq!(profile.user_id, 1);
        assert_eq!(profile.handle.as_deref(), Some("ivan"));
        assert_eq!(profile.display_name, "Иван Петров");
        assert_eq!(profile.daily_calorie_target, 2076);
        assert_eq!(profile.created_at, profile.updated_at);

        let fetched = svc.get_profile(1).await.unwrap().unwrap();
        assert_eq!(fetched.daily_calorie_target, 2076);
    }

    #[tokio::test]
    async fn test_second_upsert_updates_in_place() {
        let svc = service().await;
        let first = svc.upsert_profile(&ivan()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let mut changed = ivan();
        changed.weight_kg = 80.0;
        changed.handle = None;
        let second = svc.upsert_profile(&changed).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert!(second.handle.is_none());
        // BMR 10*80 + 6.25*180 - 5*30 + 5 = 1780, times 1.2 = 2136.
        assert_eq!(second.daily_calorie_target, 2136);

        let fetched = svc.get_profile(1).await.unwrap().unwrap();
        assert_eq!(fetched.daily_calorie_target, 2136);
        assert_eq!(fetched.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_target_matches_estimator() {
        let svc = service().await;
        let profile = svc.upsert_profile(&ivan()).await.unwrap();
        let direct = estimator::estimate(
            profile.sex,
            profile.age_years,
            profile.height_cm,
            profile.weight_kg,
        )
        .unwrap();
        assert_eq!(profile.daily_calorie_target, direct);
    }

    #[tokio::test]
    async fn test_missing_profile_is_none() {
        let svc = service().await;
        assert!(svc.get_profile(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_age_writes_nothing() {
        let svc = service().await;
        let mut bad = ivan();
        bad.age_years = 0;
        let err = svc.upsert_profile(&bad).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidAttribute {
                field: "age_years",
                ..
            }
        ));
        assert!(svc.get_profile(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_user_id_is_rejected() {
        let svc = service().await;
        let mut bad = ivan();
        bad.user_id = 0;
        let err = svc.upsert_profile(&bad).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidAttribute { field: "user_id", .. }
        ));

        let err = svc
            .log_intake(&meal(-3, "Чай", 5, IntakeSource::Text))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidAttribute { field: "user_id", .. }
        ));
    }

    #[tokio::test]
    async fn test_negative_calories_write_nothing() {
        let svc = service().await;
        let err = svc
            .log_intake(&meal(1, "Борщ", -1, IntakeSource::Image))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidAttribute { field: "calories", .. }
        ));
        assert!(svc.list_events(1, None, None).await.unwrap().is_empty());
        assert_eq!(svc.sum_calories(1, None, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_logged_day_scenario() {
        let svc = service().await;
        let profile = svc.upsert_profile(&ivan()).await.unwrap();
        assert_eq!(profile.daily_calorie_target, 2076);

        svc.log_intake(&meal(1, "Борщ", 250, IntakeSource::Image)).await.unwrap();
        svc.log_intake(&meal(1, "Чай", 5, IntakeSource::Text)).await.unwrap();
        svc.log_intake(&meal(1, "Яблоко", 80, IntakeSource::Text)).await.unwrap();

        assert_eq!(svc.sum_calories(1, None, None).await.unwrap(), 335);

        let events = svc.list_events(1, None, None).await.unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.food_name.as_str()).collect();
        assert_eq!(names, ["Борщ", "Чай", "Яблоко"]);
        assert_eq!(events[0].source, IntakeSource::Image);
        assert_eq!(
            svc.sum_calories(1, None, None).await.unwrap(),
            i64::from(events.iter().map(|e| e.calories).sum::<i32>())
        );
    }

    #[tokio::test]
    async fn test_events_are_ordered_and_partitioned_by_user() {
        let svc = service().await;
        for i in 0..5 {
            svc.log_intake(&meal(1, &format!("meal {i}"), 100, IntakeSource::Text))
                .await
                .unwrap();
        }
        svc.log_intake(&meal(2, "other", 999, IntakeSource::Voice)).await.unwrap();

        let events = svc.list_events(1, None, None).await.unwrap();
        assert_eq!(events.len(), 5);
        for pair in events.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
            assert!(pair[0].id < pair[1].id);
        }
        assert_eq!(svc.sum_calories(1, None, None).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_range_bounds_are_inclusive() {
        let svc = service().await;
        let mut logged = Vec::new();
        for (food, calories) in [("Борщ", 250), ("Чай", 5), ("Яблоко", 80)] {
            logged.push(
                svc.log_intake(&meal(1, food, calories, IntakeSource::Text)).await.unwrap(),
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let (t1, t2, t3) = (logged[0].created_at, logged[1].created_at, logged[2].created_at);

        let middle = svc.list_events(1, Some(t2), Some(t2)).await.unwrap();
        assert_eq!(middle.len(), 1);
        assert_eq!(middle[0].food_name, "Чай");

        let tail = svc.list_events(1, Some(t2), None).await.unwrap();
        assert_eq!(tail.len(), 2);

        let head = svc.list_events(1, None, Some(t2)).await.unwrap();
        assert_eq!(head.len(), 2);

        assert_eq!(svc.sum_calories(1, Some(t1), Some(t3)).await.unwrap(), 335);
        assert_eq!(svc.sum_calories(1, Some(t2), Some(t2)).await.unwrap(), 5);

        // An inverted range matches nothing.
        let empty = svc.list_events(1, Some(t3), Some(t1)).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(svc.sum_calories(1, Some(t3), Some(t1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recent_events_returns_newest_first() {
        let svc = service().await;
        for i in 0..4 {
            svc.log_intake(&meal(1, &format!("meal {i}"), 100, IntakeSource::Text))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let recent = svc.recent_events(1, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].food_name, "meal 3");
        assert_eq!(recent[1].food_name, "meal 2");
    }

    #[tokio::test]
    async fn test_long_food_names_are_shortened() {
        let svc = service().await;
        let long = "очень длинное название блюда ".repeat(4);
        let event = svc
            .log_intake(&meal(1, &long, 120, IntakeSource::Voice))
            .await
            .unwrap();
        assert_eq!(event.food_name.chars().count(), MAX_FOOD_NAME_CHARS);
        assert!(event.food_name.ends_with("..."));

        let stored = &svc.list_events(1, None, None).await.unwrap()[0];
        assert_eq!(stored.food_name, event.food_name);
    }
}
