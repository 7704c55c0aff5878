use crate::cli::resolve::attach_slug;
use crate::error::StoreError;
use crate::output;
use crate::store::query;
use crate::workspace;

pub fn run_ready(limit: u32, json: bool) -> i32 {
    match run_ready_inner(limit, json) {
        Ok(code) => code,
        Err(e) => fail(&e, json),
    }
}

fn run_ready_inner(limit: u32, json: bool) -> Result<i32, StoreError> {
    let conn = workspace::open_db()?;
    let tasks = query::ready_tasks(&conn, limit)?
        .into_iter()
        .map(|t| attach_slug(&conn, t))
        .collect::<Result<Vec<_>, _>>()?;

    if json {
        let data: Vec<_> = tasks.iter().map(output::json::task_with_slug_json).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(serde_json::json!(data))).unwrap()
        );
    } else {
        output::text::print_task_list(&tasks);
    }
    Ok(0)
}

pub fn run_blocked(json: bool) -> i32 {
    match run_blocked_inner(json) {
        Ok(code) => code,
        Err(e) => fail(&e, json),
    }
}

fn run_blocked_inner(json: bool) -> Result<i32, StoreError> {
    let conn = workspace::open_db()?;
    let blocked = query::blocked_tasks(&conn)?;

    if json {
        let data: Vec<_> = blocked.iter().map(output::json::blocked_task_json).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(serde_json::json!(data))).unwrap()
        );
    } else {
        output::text::print_blocked_list(&blocked);
    }
    Ok(0)
}

pub fn run_stats(json: bool) -> i32 {
    match run_stats_inner(json) {
        Ok(code) => code,
        Err(e) => fail(&e, json),
    }
}

fn run_stats_inner(json: bool) -> Result<i32, StoreError> {
    let conn = workspace::open_db()?;
    let stats = query::system_stats(&conn)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(output::json::stats_json(&stats))).unwrap()
        );
    } else {
        output::text::print_stats(&stats);
    }
    Ok(0)
}

fn fail(e: &StoreError, json: bool) -> i32 {
    if json {
        println!("{}", serde_json::to_string_pretty(&output::json::error(e)).unwrap());
    } else {
        eprintln!("Error: {e}");
    }
    1
}
