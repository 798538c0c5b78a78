use serde_json::{json, Value};

use crate::db::task_repo::TicketProgress;
use crate::error::TasktimeError;
use crate::estimate::{self, GaugeView};
use crate::graph::tree::TaskNode;
use crate::models::{Achievement, Plan, Task, Term, Ticket};
use crate::tracker::BridgeStats;

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &TasktimeError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

/// Pretty-print an envelope on stdout.
pub fn print(value: &Value) {
    println!("{value:#}");
}

pub fn ticket_json(t: &Ticket) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "status": t.status.as_str(),
        "created_at": t.created_at
    })
}

pub fn progress_json(p: &TicketProgress) -> Value {
    json!({
        "total": p.total,
        "todo": p.todo,
        "running": p.running,
        "pending": p.pending,
        "done": p.done
    })
}

pub fn task_json(t: &Task) -> Value {
    json!({
        "id": t.id,
        "ticket_id": t.ticket_id,
        "parent_id": t.parent_id,
        "title": t.title,
        "status": t.status.as_str(),
        "type": t.task_type.as_str(),
        "is_survey_task": t.is_survey_task,
        "progress_rate": t.progress_rate,
        "created_at": t.created_at,
        "updated_at": t.updated_at
    })
}

pub fn plan_json(p: &Plan) -> Value {
    json!({
        "id": p.id,
        "predicted_required_time_first": p.predicted_required_time_first,
        "predicted_required_time_final": p.predicted_required_time_final,
        "predicted_survey_time_first": p.predicted_survey_time_first,
        "predicted_survey_time_final": p.predicted_survey_time_final,
        "survey_detail": p.survey_detail
    })
}

pub fn achievement_json(a: &Achievement) -> Value {
    let histories: Vec<Value> = a
        .histories
        .iter()
        .map(|h| {
            json!({
                "id": h.id,
                "day": h.day,
                "operating_time": h.operating_time,
                "survey_time": h.survey_time,
                "created_at": h.created_at,
                "updated_at": h.updated_at
            })
        })
        .collect();
    json!({
        "id": a.id,
        "operating_time": a.operating_time,
        "survey_time": a.survey_time,
        "done_at": a.done_at,
        "histories": histories
    })
}

pub fn gauge_json(g: &GaugeView) -> Value {
    json!({
        "progress_rate": g.progress_rate,
        "done_time_rate": g.done_time_rate,
        "primary_danger_limit": g.primary_danger_limit,
        "secondary": g.secondary.map(|s| json!({ "value": s.value, "safe_limit": s.safe_limit }))
    })
}

pub fn node_json(n: &TaskNode) -> Value {
    let mut v = task_json(&n.task);
    v["plan"] = plan_json(&n.plan);
    v["achievement"] = achievement_json(&n.achievement);
    v["check"] = json!({ "id": n.check.id });
    v["feedback"] = json!({ "id": n.feedback.id });
    v["done_time_rate"] = json!(n.done_time_rate);
    v["assessment"] = json!(estimate::assess(
        n.task.progress_rate,
        n.done_time_rate,
        n.plan.predicted_required_time_first
    )
    .as_str());
    v["children"] = Value::Array(n.children.iter().map(node_json).collect());
    v
}

pub fn term_json(t: &Term) -> Value {
    json!({
        "task_id": t.task_id,
        "term_id": t.term_id,
        "start": t.started_at.to_rfc3339(),
        "end": t.ended_at.to_rfc3339(),
        "duration_secs": t.duration_secs()
    })
}

pub fn bridge_stats_json(s: &BridgeStats) -> Value {
    json!({
        "created": s.created,
        "updated": s.updated,
        "terms_saved": s.terms_saved,
        "failures": s.failures
    })
}
