use anyhow::Result;
use serde::Serialize;

use kcal_core::KcalService;

use super::{local_day_bounds, parse_date};

#[derive(Serialize)]
struct DaySummary {
    date: String,
    consumed: i64,
    events: usize,
    target: Option<i32>,
    remaining: Option<i64>,
}

pub(crate) async fn cmd_summary(
    service: &KcalService,
    user_id: i64,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let (start, end) = local_day_bounds(date)?;

    let consumed = service.sum_calories(user_id, Some(start), Some(end)).await?;
    let events = service.list_events(user_id, Some(start), Some(end)).await?.len();
    let target = service
        .get_profile(user_id)
        .await?
        .map(|p| p.daily_calorie_target);

    let summary = DaySummary {
        date: date.to_string(),
        consumed,
        events,
        target,
        remaining: target.map(|t| i64::from(t) - consumed),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Summary for {}", summary.date);
    println!("Consumed: {} kcal over {} events", summary.consumed, summary.events);
    match (summary.target, summary.remaining) {
        (Some(target), Some(remaining)) => {
            println!("Target:   {target} kcal ({remaining} remaining)");
        }
        _ => println!("No profile registered, so no daily target."),
    }
    Ok(())
}
