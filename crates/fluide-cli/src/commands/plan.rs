use fluide_core::curriculum::Curriculum;
use fluide_core::{CustomChunkRepository, Database, WeeklyPlan};
use serde_json::json;

use super::{resolve_day, CliResult};

pub fn run(day: Option<&str>, as_json: bool) -> CliResult {
    let day = resolve_day(day)?;
    let plan = WeeklyPlan::standard();
    let Some(day_plan) = plan.plan(day) else {
        return Err(format!("no plan for {day}").into());
    };

    let db = Database::open()?;
    let repo = CustomChunkRepository::load(&db);
    let chunks = repo.list_for_day(day, &plan);

    if as_json {
        let out = json!({
            "day": day.to_string(),
            "theme": day_plan.theme,
            "description": day_plan.description,
            "task": day_plan.task(),
            "chunks": chunks,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{day}: {}", day_plan.theme);
    println!("{}", day_plan.description);
    if let Some(task) = day_plan.task() {
        println!("Task: {task}");
    }
    println!();
    for chunk in &chunks {
        let marker = if chunk.is_custom() { "*" } else { " " };
        print!("{marker} {:<32} {}", chunk.text, chunk.translation);
        if let Some(phonetic) = &chunk.phonetic {
            print!("  [{phonetic}]");
        }
        println!();
    }
    if chunks.iter().any(|c| c.is_custom()) {
        println!("\n* your own chunks");
    }
    Ok(())
}
