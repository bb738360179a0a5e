use anyhow::Result;
use chrono::Local;

use kcal_core::KcalService;
use kcal_core::models::{IntakeSource, NewIntakeEvent};

use super::local_day_bounds;

pub(crate) async fn cmd_log(
    service: &KcalService,
    user_id: i64,
    food: &str,
    calories: i32,
    source: &str,
    json: bool,
) -> Result<()> {
    let source: IntakeSource = source.parse()?;
    let event = service
        .log_intake(&NewIntakeEvent {
            user_id,
            food_name: food.to_string(),
            calories,
            source,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&event)?);
        return Ok(());
    }

    println!(
        "Logged {} ({} kcal, {})",
        event.food_name, event.calories, event.source
    );

    let (start, end) = local_day_bounds(Local::now().date_naive())?;
    let today = service.sum_calories(user_id, Some(start), Some(end)).await?;
    match service.get_profile(user_id).await? {
        Some(profile) => println!("Today: {today} / {} kcal", profile.daily_calorie_target),
        None => println!("Today: {today} kcal"),
    }
    Ok(())
}
