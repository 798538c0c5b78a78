use rusqlite::Connection;
use serde::Serialize;

use crate::db::{achievement_repo, plan_repo, task_repo};
use crate::error::TasktimeError;
use crate::estimate;
use crate::models::{Achievement, Check, Feedback, Plan, Task};

use super::ancestry::MAX_TREE_DEPTH;

/// A task with its one-to-one records and its open children.
#[derive(Debug, Clone, Serialize)]
pub struct TaskNode {
    pub task: Task,
    pub plan: Plan,
    pub achievement: Achievement,
    pub check: Check,
    pub feedback: Feedback,
    pub done_time_rate: i64,
    pub children: Vec<TaskNode>,
}

impl TaskNode {
    /// Load `task` and its related rows, without children.
    pub fn load(conn: &Connection, task: Task) -> Result<Self, TasktimeError> {
        let plan = plan_repo::get_plan_for_task(conn, &task.id)?;
        let achievement = achievement_repo::get_achievement_for_task(conn, &task.id)?;
        let check = plan_repo::get_check_for_task(conn, &task.id)?;
        let feedback = plan_repo::get_feedback_for_task(conn, &task.id)?;
        let done_time_rate = estimate::done_time_rate(
            achievement.operating_time,
            achievement.survey_time,
            plan.predicted_required_time_first,
        );
        Ok(Self {
            task,
            plan,
            achievement,
            check,
            feedback,
            done_time_rate,
            children: Vec::new(),
        })
    }

    /// Number of nodes in this subtree, self included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TaskNode::count).sum::<usize>()
    }
}

/// Open tasks of a ticket as a forest, nested at most `MAX_TREE_DEPTH` levels.
pub fn fetch_tree(conn: &Connection, ticket_id: &str) -> Result<Vec<TaskNode>, TasktimeError> {
    task_repo::list_open_roots(conn, ticket_id)?
        .into_iter()
        .map(|task| load_subtree(conn, task, 1))
        .collect()
}

fn load_subtree(conn: &Connection, task: Task, level: usize) -> Result<TaskNode, TasktimeError> {
    let mut node = TaskNode::load(conn, task)?;
    if level < MAX_TREE_DEPTH {
        node.children = task_repo::list_open_children(conn, &node.task.id)?
            .into_iter()
            .map(|child| load_subtree(conn, child, level + 1))
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, ticket_repo};
    use crate::db::task_repo::NewTask;
    use crate::models::{TaskStatus, TaskType};

    fn add(conn: &Connection, ticket: &str, parent: Option<&str>, title: &str) -> Task {
        task_repo::create_task(
            conn,
            &NewTask {
                ticket_id: ticket,
                parent_id: parent,
                title,
                task_type: TaskType::FirstPass,
                is_survey_task: true,
                predicted_required_time_first: Some(1.0),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_tree_skips_done_and_nests_children() {
        let conn = open_in_memory().unwrap();
        ticket_repo::create_ticket(&conn, "TK1", "ticket").unwrap();
        let root = add(&conn, "TK1", None, "root");
        let child = add(&conn, "TK1", Some(&root.id), "child");
        add(&conn, "TK1", Some(&child.id), "grandchild");
        let mut finished = add(&conn, "TK1", None, "finished");
        finished.status = TaskStatus::Done;
        task_repo::save_task(&conn, &finished).unwrap();

        let tree = fetch_tree(&conn, "TK1").unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].task.title, "root");
        assert_eq!(tree[0].count(), 3);
        assert_eq!(tree[0].children[0].children[0].task.title, "grandchild");
    }

    #[test]
    fn test_tree_stops_at_max_depth() {
        let conn = open_in_memory().unwrap();
        ticket_repo::create_ticket(&conn, "TK1", "ticket").unwrap();
        let mut parent: Option<String> = None;
        for i in 0..MAX_TREE_DEPTH + 1 {
            let task = add(&conn, "TK1", parent.as_deref(), &format!("level {}", i + 1));
            parent = Some(task.id);
        }
        let tree = fetch_tree(&conn, "TK1").unwrap();
        assert_eq!(tree[0].count(), MAX_TREE_DEPTH);
    }
}
