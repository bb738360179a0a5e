use std::process;

use anyhow::Result;
use chrono::Local;

use kcal_core::KcalService;
use kcal_core::models::{NewProfile, Sex};

use super::json_error;

#[allow(clippy::too_many_arguments)]
pub(crate) async fn cmd_register(
    service: &KcalService,
    user_id: i64,
    name: &str,
    sex: &str,
    age: i32,
    height: f64,
    weight: f64,
    handle: Option<String>,
    json: bool,
) -> Result<()> {
    let sex: Sex = sex.parse()?;
    let profile = service
        .upsert_profile(&NewProfile {
            user_id,
            handle,
            display_name: name.to_string(),
            sex,
            age_years: age,
            height_cm: height,
            weight_kg: weight,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!(
            "Registered {} (user {}). Daily target: {} kcal",
            profile.display_name, profile.user_id, profile.daily_calorie_target
        );
    }
    Ok(())
}

pub(crate) async fn cmd_profile(service: &KcalService, user_id: i64, json: bool) -> Result<()> {
    let Some(profile) = service.get_profile(user_id).await? else {
        if json {
            println!("{}", json_error(&format!("No profile for user {user_id}")));
        } else {
            eprintln!("No profile for user {user_id}");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("User {}  {}", profile.user_id, profile.display_name);
        if let Some(handle) = &profile.handle {
            println!("Handle: @{handle}");
        }
        println!(
            "Sex: {}  Age: {}  Height: {:.1} cm  Weight: {:.1} kg",
            profile.sex, profile.age_years, profile.height_cm, profile.weight_kg
        );
        println!("Daily target: {} kcal", profile.daily_calorie_target);
        println!(
            "Registered: {}",
            profile
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
