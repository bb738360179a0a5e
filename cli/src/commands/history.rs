use anyhow::Result;
use chrono::Local;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use kcal_core::KcalService;
use kcal_core::models::IntakeEvent;

use super::{local_day_bounds, parse_date};

pub(crate) async fn cmd_history(
    service: &KcalService,
    user_id: i64,
    since: Option<&str>,
    until: Option<&str>,
    last: Option<u32>,
    json: bool,
) -> Result<()> {
    let events = if let Some(limit) = last {
        service.recent_events(user_id, limit).await?
    } else {
        let since = match since {
            Some(s) => Some(local_day_bounds(parse_date(Some(s))?)?.0),
            None => None,
        };
        let until = match until {
            Some(s) => Some(local_day_bounds(parse_date(Some(s))?)?.1),
            None => None,
        };
        service.list_events(user_id, since, until).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No events logged.");
        return Ok(());
    }

    print_event_table(&events);
    let total: i64 = events.iter().map(|e| i64::from(e.calories)).sum();
    println!("Total: {total} kcal over {} events", events.len());
    Ok(())
}

fn print_event_table(events: &[IntakeEvent]) {
    #[derive(Tabled)]
    struct EventRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Kcal")]
        calories: i32,
        #[tabled(rename = "Source")]
        source: String,
    }

    let rows: Vec<EventRow> = events
        .iter()
        .map(|e| EventRow {
            id: e.id,
            time: e
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            food: e.food_name.clone(),
            calories: e.calories,
            source: e.source.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
