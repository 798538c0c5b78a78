use std::collections::HashMap;

use crate::error::TasktimeError;

/// Deepest level a task tree may reach; a root task is level 1.
pub const MAX_TREE_DEPTH: usize = 6;

/// Parent links of one ticket's tasks.
/// edges: Vec<(task_id, parent_id)>.
pub struct Ancestry<'a> {
    parents: HashMap<&'a str, Option<&'a str>>,
    children: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Ancestry<'a> {
    pub fn new(edges: &'a [(String, Option<String>)]) -> Self {
        let mut parents = HashMap::new();
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for (id, parent) in edges {
            parents.insert(id.as_str(), parent.as_deref());
            if let Some(p) = parent {
                children.entry(p.as_str()).or_default().push(id.as_str());
            }
        }
        Self { parents, children }
    }

    /// Level of `id` counted from its root (root = 1).
    pub fn depth(&self, id: &str) -> usize {
        let mut depth = 1;
        let mut current = id;
        // stop on a corrupt loop in stored links
        while let Some(Some(parent)) = self.parents.get(current) {
            depth += 1;
            current = *parent;
            if depth > self.parents.len() {
                break;
            }
        }
        depth
    }

    /// Levels in the subtree rooted at `id` (a leaf = 1).
    pub fn height(&self, id: &str) -> usize {
        self.height_bounded(id, self.parents.len() + 1)
    }

    fn height_bounded(&self, id: &str, budget: usize) -> usize {
        if budget == 0 {
            return 0;
        }
        1 + self
            .children
            .get(id)
            .map(|kids| kids.iter().map(|k| self.height_bounded(k, budget - 1)).max().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Whether `ancestor` appears on the path from `id` up to its root.
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = id;
        let mut steps = 0;
        while let Some(Some(parent)) = self.parents.get(current) {
            if *parent == ancestor {
                return true;
            }
            current = *parent;
            steps += 1;
            if steps > self.parents.len() {
                break;
            }
        }
        false
    }

    /// Every task below `id`, nearest first.
    pub fn descendants(&self, id: &str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut queue = vec![id];
        while let Some(current) = queue.pop() {
            if let Some(kids) = self.children.get(current) {
                for &kid in kids {
                    if kid != id && !out.contains(&kid) {
                        out.push(kid);
                        queue.push(kid);
                    }
                }
            }
        }
        out
    }
}

/// Check that hanging `task_id` (or a new task when `None`) under `parent_id` keeps the
/// tree acyclic and within `MAX_TREE_DEPTH`.
pub fn validate_parent(
    edges: &[(String, Option<String>)],
    task_id: Option<&str>,
    parent_id: &str,
) -> Result<(), TasktimeError> {
    let ancestry = Ancestry::new(edges);
    let subtree_height = match task_id {
        Some(id) => {
            if id == parent_id || ancestry.is_ancestor(id, parent_id) {
                return Err(TasktimeError::parent_cycle(id, parent_id));
            }
            ancestry.height(id)
        }
        None => 1,
    };
    if ancestry.depth(parent_id) + subtree_height > MAX_TREE_DEPTH {
        return Err(TasktimeError::tree_too_deep(MAX_TREE_DEPTH));
    }
    Ok(())
}
