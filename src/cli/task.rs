use serde_json::json;

use crate::cli::commands::{DepCommands, TaskCommands};
use crate::cli::resolve::{attach_slug, parse_status, resolve_task};
use crate::error::StoreError;
use crate::output;
use crate::store::{dependency_store, lifecycle, plan_store, task_store};
use crate::workspace;

pub fn run(cmd: TaskCommands, json: bool) -> i32 {
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

fn run_inner(cmd: TaskCommands, json: bool) -> Result<i32, StoreError> {
    match cmd {
        TaskCommands::Create { plan, title, description } => run_create(&plan, &title, description.as_deref(), json),
        TaskCommands::List { status, plan } => run_list(status.as_deref(), plan.as_deref(), json),
        TaskCommands::Show { id } => run_show(&id, json),
        TaskCommands::Update { id, title, description, status } => {
            run_update(&id, title.as_deref(), description, status.as_deref(), json)
        }
        TaskCommands::Start { id } => run_start(&id, json),
        TaskCommands::Complete { id } => run_complete(&id, json),
        TaskCommands::CompleteBulk { ids, cascade } => run_complete_bulk(&ids, cascade, json),
        TaskCommands::Delete { id } => run_delete(&id, json),
        TaskCommands::Dep(dep_cmd) => run_dep(dep_cmd, json),
    }
}

fn run_create(plan_slug: &str, title: &str, description: Option<&str>, json: bool) -> Result<i32, StoreError> {
    let mut conn = workspace::open_db()?;
    let plan = plan_store::get_by_slug(&conn, plan_slug)?
        .ok_or_else(|| StoreError::InvalidData(format!("plan '{plan_slug}' not found")))?;
    let task = task_store::create(&mut conn, plan.id, title, description)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "id": crate::identifiers::format_task_id(plan_slug, task.plan_task_number),
                "internal_id": task.id,
                "plan_task_number": task.plan_task_number,
            })))
            .unwrap()
        );
    } else {
        println!(
            "Created task {}",
            crate::identifiers::format_task_id(plan_slug, task.plan_task_number)
        );
    }
    Ok(0)
}

fn run_list(status: Option<&str>, plan: Option<&str>, json: bool) -> Result<i32, StoreError> {
    let conn = workspace::open_db()?;
    let status = status.map(parse_status).transpose()?;
    let plan_id = plan
        .map(|slug| {
            plan_store::get_by_slug(&conn, slug)?
                .ok_or_else(|| StoreError::InvalidData(format!("plan '{slug}' not found")))
                .map(|p| p.id)
        })
        .transpose()?;
    let tasks = task_store::list(&conn, status, plan_id)?
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

fn run_show(id: &str, json: bool) -> Result<i32, StoreError> {
    let conn = workspace::open_db()?;
    let task = resolve_task(&conn, id)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(output::json::task_with_slug_json(&task))).unwrap()
        );
    } else {
        output::text::print_task_with_slug(&task);
    }
    Ok(0)
}

fn run_update(
    id: &str,
    title: Option<&str>,
    description: Option<String>,
    status: Option<&str>,
    json: bool,
) -> Result<i32, StoreError> {
    let conn = workspace::open_db()?;
    let existing = resolve_task(&conn, id)?;
    let description = description.map(|d| if d.is_empty() { None } else { Some(d) });
    let status = status.map(parse_status).transpose()?;
    let task = task_store::update(
        &conn,
        existing.task.id,
        title,
        description.as_ref().map(|d| d.as_deref()),
        status,
    )?;
    let task = attach_slug(&conn, task)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(output::json::task_with_slug_json(&task))).unwrap()
        );
    } else {
        println!("Updated task {}", task.external_id());
        output::text::print_task_with_slug(&task);
    }
    Ok(0)
}

fn run_start(id: &str, json: bool) -> Result<i32, StoreError> {
    let mut conn = workspace::open_db()?;
    let existing = resolve_task(&conn, id)?;
    lifecycle::start(&mut conn, existing.task.id)?;
    let refreshed = task_store::get(&conn, existing.task.id)?
        .ok_or_else(|| StoreError::InvalidData(format!("task {} vanished after start", existing.task.id)))?;
    let task = attach_slug(&conn, refreshed)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(output::json::task_with_slug_json(&task))).unwrap()
        );
    } else {
        println!("Started task {}", task.external_id());
    }
    Ok(0)
}

fn run_complete(id: &str, json: bool) -> Result<i32, StoreError> {
    let mut conn = workspace::open_db()?;
    let existing = resolve_task(&conn, id)?;
    lifecycle::complete(&mut conn, existing.task.id)?;
    let refreshed = task_store::get(&conn, existing.task.id)?
        .ok_or_else(|| StoreError::InvalidData(format!("task {} vanished after complete", existing.task.id)))?;
    let task = attach_slug(&conn, refreshed)?;
    let plan = plan_store::get_by_id(&conn, task.task.plan_id)?
        .ok_or_else(|| StoreError::InvalidData(format!("task {} has no owning plan", task.task.id)))?;

    if json {
        let mut data = output::json::task_with_slug_json(&task);
        data["plan_completed"] = json!(plan.status == crate::models::PlanStatus::Completed);
        println!("{}", serde_json::to_string_pretty(&output::json::success(data)).unwrap());
    } else {
        println!("Completed task {}", task.external_id());
        if plan.status == crate::models::PlanStatus::Completed {
            println!("Plan {} completed!", plan.slug);
        }
    }
    Ok(0)
}

fn run_complete_bulk(ids: &[String], cascade: bool, json: bool) -> Result<i32, StoreError> {
    let mut conn = workspace::open_db()?;
    let resolved: Vec<_> = ids
        .iter()
        .map(|id| resolve_task(&conn, id))
        .collect::<Result<Vec<_>, _>>()?;
    let internal_ids: Vec<i64> = resolved.iter().map(|t| t.task.id).collect();
    lifecycle::complete_bulk(&mut conn, &internal_ids, cascade)?;

    if json {
        let external_ids: Vec<_> = resolved.iter().map(|t| t.external_id()).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({ "completed": external_ids }))).unwrap()
        );
    } else {
        println!("Completed {} task(s)", resolved.len());
    }
    Ok(0)
}

fn run_delete(id: &str, json: bool) -> Result<i32, StoreError> {
    let conn = workspace::open_db()?;
    let existing = resolve_task(&conn, id)?;
    task_store::delete(&conn, existing.task.id)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({ "deleted": existing.external_id() })))
                .unwrap()
        );
    } else {
        println!("Deleted task {}", existing.external_id());
    }
    Ok(0)
}

fn run_dep(cmd: DepCommands, json: bool) -> Result<i32, StoreError> {
    let mut conn = workspace::open_db()?;
    match cmd {
        DepCommands::Add { id, blocks_on } => {
            let task = resolve_task(&conn, &id)?;
            let blocker = resolve_task(&conn, &blocks_on)?;
            dependency_store::add(&mut conn, task.task.id, blocker.task.id)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(json!({
                        "task": task.external_id(),
                        "blocks_on": blocker.external_id(),
                    })))
                    .unwrap()
                );
            } else {
                println!("{} now blocks on {}", task.external_id(), blocker.external_id());
            }
        }
        DepCommands::Remove { id, blocks_on } => {
            let task = resolve_task(&conn, &id)?;
            let blocker = resolve_task(&conn, &blocks_on)?;
            dependency_store::remove(&mut conn, task.task.id, blocker.task.id)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(json!({
                        "task": task.external_id(),
                        "blocks_on": blocker.external_id(),
                    })))
                    .unwrap()
                );
            } else {
                println!("{} no longer blocks on {}", task.external_id(), blocker.external_id());
            }
        }
        DepCommands::Blockers { id } => {
            let task = resolve_task(&conn, &id)?;
            let blockers = dependency_store::blockers(&conn, task.task.id)?;
            if json {
                let data: Vec<_> = blockers.iter().map(output::json::depth_annotated_json).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(serde_json::json!(data))).unwrap()
                );
            } else {
                output::text::print_depth_annotated(&blockers);
            }
        }
        DepCommands::Dependents { id } => {
            let task = resolve_task(&conn, &id)?;
            let dependents = dependency_store::dependents(&conn, task.task.id)?;
            if json {
                let data: Vec<_> = dependents.iter().map(output::json::depth_annotated_json).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(serde_json::json!(data))).unwrap()
                );
            } else {
                output::text::print_depth_annotated(&dependents);
            }
        }
    }
    Ok(0)
}
