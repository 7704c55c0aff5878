use serde_json::{json, Value};

use crate::error::StoreError;
use crate::identifiers::format_task_id;
use crate::models::{BlockedTask, DepthAnnotatedTask, Plan, PlanSummary, Task, TaskWithSlug};
use crate::store::health::HealthReport;
use crate::store::query::SystemStats;

pub fn success(data: Value) -> Value {
    json!({ "success": true, "data": data })
}

pub fn error(err: &StoreError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code(),
            "message": err.to_string(),
            "is_bug": err.is_bug(),
        }
    })
}

pub fn plan_json(p: &Plan) -> Value {
    json!({
        "slug": p.slug,
        "title": p.title,
        "description": p.description,
        "status": p.status.as_str(),
        "task_counter": p.task_counter,
        "created_at": p.created_at,
        "updated_at": p.updated_at,
        "execution_started_at": p.execution_started_at,
        "completed_at": p.completed_at,
    })
}

pub fn plan_summary_json(s: &PlanSummary) -> Value {
    let mut v = plan_json(&s.plan);
    v["tasks"] = json!({
        "open": s.tasks.open,
        "in_progress": s.tasks.in_progress,
        "completed": s.tasks.completed,
        "total": s.tasks.total(),
    });
    v
}

pub fn task_json(t: &Task, plan_slug: &str) -> Value {
    json!({
        "id": format_task_id(plan_slug, t.plan_task_number),
        "internal_id": t.id,
        "plan": plan_slug,
        "title": t.title,
        "description": t.description,
        "status": t.status.as_str(),
        "created_at": t.created_at,
        "updated_at": t.updated_at,
        "started_at": t.started_at,
        "completed_at": t.completed_at,
    })
}

pub fn task_with_slug_json(t: &TaskWithSlug) -> Value {
    task_json(&t.task, &t.plan_slug)
}

pub fn depth_annotated_json(d: &DepthAnnotatedTask) -> Value {
    let mut v = task_json(&d.task, &d.plan_slug);
    v["depth"] = json!(d.depth);
    v
}

pub fn blocked_task_json(b: &BlockedTask) -> Value {
    let mut v = task_json(&b.task, &b.plan_slug);
    v["blocker_count"] = json!(b.blocker_count);
    v
}

pub fn stats_json(s: &SystemStats) -> Value {
    json!({
        "plans_total": s.plans_total,
        "plans_completed": s.plans_completed,
        "tasks_total": s.tasks_total,
        "tasks_open": s.tasks_open,
        "tasks_in_progress": s.tasks_in_progress,
        "tasks_completed": s.tasks_completed,
        "ready_count": s.ready_count,
        "blocked_count": s.blocked_count,
    })
}

pub fn health_json(r: &HealthReport) -> Value {
    let finding = |f: &crate::store::health::HealthFinding| {
        json!({ "check": f.check, "detail": f.detail })
    };
    json!({
        "healthy": r.is_healthy(),
        "errors": r.errors.iter().map(finding).collect::<Vec<_>>(),
        "warnings": r.warnings.iter().map(finding).collect::<Vec<_>>(),
    })
}
