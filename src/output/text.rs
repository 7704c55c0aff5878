use crate::identifiers::format_task_id;
use crate::models::{BlockedTask, DepthAnnotatedTask, Plan, PlanSummary, Task, TaskWithSlug};
use crate::store::health::HealthReport;
use crate::store::query::SystemStats;

pub fn print_plan(p: &Plan) {
    println!("Plan: {} [{}]", p.slug, p.status.as_str());
    if !p.title.is_empty() {
        println!("  Title: {}", p.title);
    }
    println!("  Tasks created: {}", p.task_counter);
    println!("  Created: {}", p.created_at);
    if let Some(started) = p.execution_started_at {
        println!("  Execution started: {started}");
    }
    if let Some(completed) = p.completed_at {
        println!("  Completed: {completed}");
    }
}

pub fn print_plan_summary(s: &PlanSummary) {
    print_plan(&s.plan);
    println!(
        "  Task counts: open={} in_progress={} completed={} total={}",
        s.tasks.open,
        s.tasks.in_progress,
        s.tasks.completed,
        s.tasks.total()
    );
}

pub fn print_plan_list(plans: &[PlanSummary]) {
    if plans.is_empty() {
        println!("No plans found.");
        return;
    }
    for s in plans {
        println!(
            "  {} [{}] {}/{} tasks complete",
            s.plan.slug,
            s.plan.status.as_str(),
            s.tasks.completed,
            s.tasks.total()
        );
    }
}

pub fn print_task(t: &Task, plan_slug: &str) {
    println!("Task: {} [{}]", format_task_id(plan_slug, t.plan_task_number), t.status.as_str());
    if !t.title.is_empty() {
        println!("  Title: {}", t.title);
    }
    if let Some(desc) = &t.description {
        println!("  Description: {desc}");
    }
    if let Some(started) = t.started_at {
        println!("  Started: {started}");
    }
    if let Some(completed) = t.completed_at {
        println!("  Completed: {completed}");
    }
}

pub fn print_task_with_slug(t: &TaskWithSlug) {
    print_task(&t.task, &t.plan_slug);
}

pub fn print_task_list(tasks: &[TaskWithSlug]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        println!(
            "  [{}] {} {}",
            t.task.status.as_str(),
            t.external_id(),
            t.task.title
        );
    }
}

pub fn print_depth_annotated(tasks: &[DepthAnnotatedTask]) {
    if tasks.is_empty() {
        println!("(none)");
        return;
    }
    for d in tasks {
        println!(
            "  depth={} {}:{:03} [{}] {}",
            d.depth,
            d.plan_slug,
            d.task.plan_task_number,
            d.task.status.as_str(),
            d.task.title
        );
    }
}

pub fn print_blocked_list(tasks: &[BlockedTask]) {
    if tasks.is_empty() {
        println!("No blocked tasks.");
        return;
    }
    for b in tasks {
        println!(
            "  {}:{:03} [{}] blocked by {} task(s) — {}",
            b.plan_slug, b.task.plan_task_number, b.task.status.as_str(), b.blocker_count, b.task.title
        );
    }
}

pub fn print_stats(s: &SystemStats) {
    println!("Plans: {} total, {} completed", s.plans_total, s.plans_completed);
    println!(
        "Tasks: {} total ({} open, {} in_progress, {} completed)",
        s.tasks_total, s.tasks_open, s.tasks_in_progress, s.tasks_completed
    );
    println!("Ready: {}  Blocked: {}", s.ready_count, s.blocked_count);
}

pub fn print_health(r: &HealthReport) {
    if r.is_healthy() && r.warnings.is_empty() {
        println!("Workspace is healthy.");
        return;
    }
    if !r.errors.is_empty() {
        println!("Errors:");
        for e in &r.errors {
            println!("  [{}] {}", e.check, e.detail);
        }
    }
    if !r.warnings.is_empty() {
        println!("Warnings:");
        for w in &r.warnings {
            println!("  [{}] {}", w.check, w.detail);
        }
    }
}
