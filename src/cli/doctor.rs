use crate::error::StoreError;
use crate::output;
use crate::store::health;
use crate::workspace;

/// Runs the health checker. Exits `1` if any error-level finding exists so
/// the caller can script on the exit code, even under `--json`.
pub fn run(json: bool) -> i32 {
    match run_inner(json) {
        Ok(code) => code,
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&output::json::error(&e)).unwrap());
            } else {
                eprintln!("Error: {e}");
            }
            1
        }
    }
}

fn run_inner(json: bool) -> Result<i32, StoreError> {
    let conn = workspace::open_db()?;
    let report = health::run(&conn)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(output::json::health_json(&report))).unwrap()
        );
    } else {
        output::text::print_health(&report);
    }
    Ok(if report.is_healthy() { 0 } else { 1 })
}
