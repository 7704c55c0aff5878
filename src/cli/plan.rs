use crate::cli::commands::PlanCommands;
use crate::cli::resolve::parse_plan_status;
use crate::error::StoreError;
use crate::output;
use crate::store::plan_store;
use crate::workspace;

pub fn run(cmd: PlanCommands, json: bool) -> i32 {
    match run_inner(cmd, json) {
        Ok(code) => code,
        Err(e) => {
            print_error(&e, json);
            1
        }
    }
}

fn print_error(e: &StoreError, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(&output::json::error(e)).unwrap());
    } else {
        eprintln!("Error: {e}");
        if e.is_bug() {
            eprintln!("This looks like a store bug; run `taskgraph doctor` for a health report.");
        }
    }
}

fn run_inner(cmd: PlanCommands, json: bool) -> Result<i32, StoreError> {
    let conn = workspace::open_db()?;

    match cmd {
        PlanCommands::Create { slug, title, description } => {
            let plan = plan_store::create(&conn, &slug, &title, description.as_deref())?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(output::json::plan_json(&plan))).unwrap()
                );
            } else {
                println!("Created plan {}", plan.slug);
                output::text::print_plan(&plan);
            }
        }
        PlanCommands::List { status } => {
            let status = status.as_deref().map(parse_plan_status).transpose()?;
            let plans = plan_store::list(&conn, status)?;
            if json {
                let data: Vec<_> = plans.iter().map(output::json::plan_summary_json).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(serde_json::json!(data))).unwrap()
                );
            } else {
                output::text::print_plan_list(&plans);
            }
        }
        PlanCommands::Show { slug } => {
            let summary = plan_store::get_summary(&conn, &slug)?
                .ok_or_else(|| StoreError::InvalidData(format!("plan '{slug}' not found")))?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(output::json::plan_summary_json(&summary)))
                        .unwrap()
                );
            } else {
                output::text::print_plan_summary(&summary);
            }
        }
        PlanCommands::Update { slug, title, description } => {
            let description = description.map(|d| if d.is_empty() { None } else { Some(d) });
            let plan = plan_store::update(&conn, &slug, title.as_deref(), description.as_ref().map(|d| d.as_deref()))?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(output::json::plan_json(&plan))).unwrap()
                );
            } else {
                println!("Updated plan {}", plan.slug);
                output::text::print_plan(&plan);
            }
        }
        PlanCommands::Delete { slug } => {
            let affected = plan_store::delete(&conn, &slug)?;
            if affected == 0 {
                return Err(StoreError::InvalidData(format!("plan '{slug}' not found")));
            }
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(serde_json::json!({ "deleted": slug })))
                        .unwrap()
                );
            } else {
                println!("Deleted plan {slug}");
            }
        }
    }
    Ok(0)
}
