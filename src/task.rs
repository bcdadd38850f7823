//! The task forest: WBS summary nodes and leaf activities in an arena.
//!
//! Nodes are referenced by [`NodeIndex`] rather than by pointer. The arena is
//! append-only and a parent has to exist before a child can be attached to
//! it, so the forest cannot contain cycles. Activities never get children.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::calendar::CalendarId;
use crate::clash::{Id, IdHasher};
use crate::duration::Duration;
use crate::error::{ReconcileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// A WBS element; its schedule data is rolled up from below.
    Summary,
    /// A schedulable unit of work.
    Activity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// Start/finish pairs carried by a task.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaskDates {
    pub start: Option<NaiveDateTime>,
    pub finish: Option<NaiveDateTime>,
    pub planned_start: Option<NaiveDateTime>,
    pub planned_finish: Option<NaiveDateTime>,
    pub actual_start: Option<NaiveDateTime>,
    pub actual_finish: Option<NaiveDateTime>,
    pub early_start: Option<NaiveDateTime>,
    pub early_finish: Option<NaiveDateTime>,
    pub remaining_early_start: Option<NaiveDateTime>,
    pub remaining_early_finish: Option<NaiveDateTime>,
    pub late_start: Option<NaiveDateTime>,
    pub late_finish: Option<NaiveDateTime>,
    pub remaining_late_start: Option<NaiveDateTime>,
    pub remaining_late_finish: Option<NaiveDateTime>,
    pub baseline_start: Option<NaiveDateTime>,
    pub baseline_finish: Option<NaiveDateTime>,
    pub suspend: Option<NaiveDateTime>,
    pub resume: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaskDurations {
    pub duration: Option<Duration>,
    pub planned: Option<Duration>,
    pub actual: Option<Duration>,
    pub remaining: Option<Duration>,
    pub percent_complete: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaskWork {
    pub work: Option<Duration>,
    pub planned: Option<Duration>,
    pub actual: Option<Duration>,
    pub remaining: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaskCost {
    pub cost: Option<f64>,
    pub planned: Option<f64>,
    pub actual: Option<f64>,
    pub remaining: Option<f64>,
    pub fixed: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Task {
    unique_id: Id,
    kind: TaskKind,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
    pub name: String,
    pub calendar: Option<CalendarId>,
    pub status: ActivityStatus,
    pub dates: TaskDates,
    pub durations: TaskDurations,
    pub work: TaskWork,
    pub cost: TaskCost,
    pub longest_path: bool,
    pub critical: bool,
}

impl Task {
    fn new(unique_id: Id, kind: TaskKind, parent: Option<NodeIndex>, name: String) -> Self {
        Self {
            unique_id,
            kind,
            parent,
            children: Vec::new(),
            name,
            calendar: None,
            status: ActivityStatus::default(),
            dates: TaskDates::default(),
            durations: TaskDurations::default(),
            work: TaskWork::default(),
            cost: TaskCost::default(),
            longest_path: false,
            critical: false,
        }
    }
    pub fn unique_id(&self) -> Id {
        self.unique_id
    }
    pub fn kind(&self) -> TaskKind {
        self.kind
    }
    pub fn is_summary(&self) -> bool {
        self.kind == TaskKind::Summary
    }
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }
}

#[derive(Debug, Default)]
pub struct TaskTree {
    nodes: Vec<Task>,
    roots: Vec<NodeIndex>,
    lookup: HashMap<Id, NodeIndex, IdHasher>,
}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a WBS node under `parent`, or as a root when there is none.
    pub fn add_summary(
        &mut self,
        unique_id: Id,
        name: impl Into<String>,
        parent: Option<NodeIndex>,
    ) -> Result<NodeIndex> {
        self.add(unique_id, TaskKind::Summary, name.into(), parent)
    }

    /// Adds an activity under `parent`, or as a root when there is none.
    pub fn add_activity(
        &mut self,
        unique_id: Id,
        name: impl Into<String>,
        parent: Option<NodeIndex>,
    ) -> Result<NodeIndex> {
        self.add(unique_id, TaskKind::Activity, name.into(), parent)
    }

    fn add(
        &mut self,
        unique_id: Id,
        kind: TaskKind,
        name: String,
        parent: Option<NodeIndex>,
    ) -> Result<NodeIndex> {
        if self.lookup.contains_key(&unique_id) {
            return Err(ReconcileError::Structure(format!("task {unique_id} already exists")));
        }
        let index = NodeIndex(self.nodes.len());
        match parent {
            Some(p) => {
                let parent_task = self
                    .nodes
                    .get_mut(p.0)
                    .ok_or_else(|| {
                        ReconcileError::Structure(format!("unknown parent node {}", p.0))
                    })?;
                if parent_task.kind == TaskKind::Activity {
                    return Err(ReconcileError::Structure(format!(
                        "activity {} cannot have child {unique_id}",
                        parent_task.unique_id
                    )));
                }
                parent_task.children.push(index);
            }
            None => self.roots.push(index),
        }
        self.nodes.push(Task::new(unique_id, kind, parent, name));
        self.lookup.insert(unique_id, index);
        Ok(index)
    }

    pub fn get(&self, index: NodeIndex) -> &Task {
        &self.nodes[index.0]
    }
    pub fn get_mut(&mut self, index: NodeIndex) -> &mut Task {
        &mut self.nodes[index.0]
    }
    pub fn find(&self, unique_id: Id) -> Option<NodeIndex> {
        self.lookup.get(&unique_id).copied()
    }
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Task)> {
        self.nodes.iter().enumerate().map(|(i, t)| (NodeIndex(i), t))
    }
    pub fn activities(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.iter().filter(|(_, t)| t.kind == TaskKind::Activity).map(|(i, _)| i)
    }

    /// Every node, children before their parent, roots in insertion order.
    pub fn post_order(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeIndex, bool)> =
            self.roots.iter().rev().map(|r| (*r, false)).collect();
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                order.push(node);
                continue;
            }
            stack.push((node, true));
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push((*child, false));
            }
        }
        order
    }
}
