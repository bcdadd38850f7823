//! Predecessor/successor links between activities.
//!
//! Links are read after the activities, so both ends are resolved through the
//! activity clash map. A link that leaves the loaded data is kept as an
//! [`ExternalRelation`] on the task that is present.

use tracing::debug;

use crate::clash::Id;
use crate::duration::Duration;
use crate::schedule::Schedule;
use crate::task::NodeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationType {
    #[default]
    FinishStart,
    StartStart,
    FinishFinish,
    StartFinish,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub predecessor: NodeIndex,
    pub successor: NodeIndex,
    pub kind: RelationType,
    pub lag: Duration,
}

/// A link whose other end is outside the loaded data.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRelation {
    pub task: NodeIndex,
    /// Original identifier of the missing task.
    pub external_id: Id,
    /// True when the missing task is the predecessor.
    pub external_predecessor: bool,
    pub kind: RelationType,
    pub lag: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    Internal(Relation),
    External(ExternalRelation),
    /// Neither end was loaded.
    Dropped,
}

impl Schedule {
    fn resolve_activity(&self, original: Id) -> Option<NodeIndex> {
        self.activity_ids.get_id(original).and_then(|assigned| self.tasks.find(assigned))
    }

    /// Resolves a link given by original activity identifiers and records it.
    pub fn link(
        &mut self,
        predecessor: Id,
        successor: Id,
        kind: RelationType,
        lag: Duration,
    ) -> Link {
        let ends = (self.resolve_activity(predecessor), self.resolve_activity(successor));
        let link = match ends {
            (Some(p), Some(s)) => {
                Link::Internal(Relation { predecessor: p, successor: s, kind, lag })
            }
            (None, Some(s)) => Link::External(ExternalRelation {
                task: s,
                external_id: predecessor,
                external_predecessor: true,
                kind,
                lag,
            }),
            (Some(p), None) => Link::External(ExternalRelation {
                task: p,
                external_id: successor,
                external_predecessor: false,
                kind,
                lag,
            }),
            (None, None) => Link::Dropped,
        };
        match &link {
            Link::Internal(relation) => self.relations.push(relation.clone()),
            Link::External(external) => {
                debug!(predecessor, successor, "relation leaves the loaded data");
                self.external_relations.push(external.clone());
            }
            Link::Dropped => debug!(predecessor, successor, "relation dropped, neither end loaded"),
        }
        link
    }
}
