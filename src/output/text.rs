use crate::db::task_repo::TicketProgress;
use crate::estimate::{self, GaugeView};
use crate::graph::tree::TaskNode;
use crate::models::{Task, Term, Ticket};

/// `h:mm:ss` for a number of seconds.
pub fn hms(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

fn short(id: &str) -> &str {
    &id[..std::cmp::min(8, id.len())]
}

fn mode_label(t: &Task) -> &'static str {
    if t.is_survey_task {
        "survey"
    } else {
        "operating"
    }
}

pub fn print_ticket_list(tickets: &[Ticket]) {
    if tickets.is_empty() {
        println!("No tickets found.");
        return;
    }
    for t in tickets {
        println!("  {} [{}] {}", short(&t.id), t.status.as_str(), t.title);
    }
}

pub fn print_progress(p: &TicketProgress) {
    println!(
        "Tasks: {} (todo={} running={} pending={} done={})",
        p.total, p.todo, p.running, p.pending, p.done
    );
}

pub fn print_tree(nodes: &[TaskNode]) {
    if nodes.is_empty() {
        println!("No open tasks.");
        return;
    }
    for n in nodes {
        print_node(n, 0);
    }
}

fn print_node(n: &TaskNode, indent: usize) {
    println!(
        "{:indent$}[{}] {} ({}) {} op={} sv={} progress={}% time={}%",
        "",
        n.task.status.as_str(),
        n.task.title,
        short(&n.task.id),
        mode_label(&n.task),
        hms(n.achievement.operating_time),
        hms(n.achievement.survey_time),
        n.task.progress_rate,
        n.done_time_rate,
        indent = indent * 2 + 2
    );
    for child in &n.children {
        print_node(child, indent + 1);
    }
}

pub fn print_task_detail(n: &TaskNode) {
    let t = &n.task;
    println!("Task: {} ({})", t.title, t.id);
    println!("  Ticket: {}", t.ticket_id);
    if let Some(ref parent) = t.parent_id {
        println!("  Parent: {parent}");
    }
    println!("  Status: {}", t.status.as_str());
    println!("  Type: {}", t.task_type.as_str());
    println!("  Mode: {}", mode_label(t));
    if let Some(first) = n.plan.predicted_required_time_first {
        println!("  Predicted (first pass): {first}h");
    }
    if let Some(fin) = n.plan.predicted_required_time_final {
        println!("  Predicted (final): {fin}h");
    }
    if let Some(ref detail) = n.plan.survey_detail {
        println!("  Survey detail: {detail}");
    }
    println!(
        "  Time: operating {} / survey {}",
        hms(n.achievement.operating_time),
        hms(n.achievement.survey_time)
    );
    if let Some(ref done_at) = n.achievement.done_at {
        println!("  Done at: {done_at}");
    }
    print_gauge(&estimate::gauge_view(t.progress_rate, n.done_time_rate));
    let assessment = estimate::assess(t.progress_rate, n.done_time_rate, n.plan.predicted_required_time_first);
    println!("  Assessment: {}", assessment.as_str());
    if !n.achievement.histories.is_empty() {
        println!("\nHistory:");
        for h in &n.achievement.histories {
            println!("  {} operating {} survey {}", h.day, hms(h.operating_time), hms(h.survey_time));
        }
    }
    if !n.children.is_empty() {
        println!("\nChildren:");
        for c in &n.children {
            println!("  [{}] {} ({})", c.task.status.as_str(), c.task.title, short(&c.task.id));
        }
    }
}

pub fn print_gauge(g: &GaugeView) {
    print!("  Progress: {}%  Time-based: {}%", g.progress_rate, g.done_time_rate);
    if let Some(s) = g.secondary {
        print!("  (safe up to {}%)", s.safe_limit);
    }
    println!();
}

pub fn print_terms(terms: &[Term]) {
    if terms.is_empty() {
        println!("No terms found.");
        return;
    }
    for t in terms {
        let start = t.started_at.with_timezone(&chrono::Local);
        let end = t.ended_at.with_timezone(&chrono::Local);
        println!(
            "  {} - {}  {}  ({})",
            start.format("%Y-%m-%d %H:%M:%S"),
            end.format("%H:%M:%S"),
            hms(t.duration_secs()),
            short(&t.term_id)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hms() {
        assert_eq!(hms(0), "0:00:00");
        assert_eq!(hms(61), "0:01:01");
        assert_eq!(hms(3600 * 26 + 5), "26:00:05");
        assert_eq!(hms(-3), "0:00:00");
    }
}
