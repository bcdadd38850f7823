//! Resource assignments and their time-phased work.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::clash::Id;
use crate::duration::Duration;
use crate::error::Result;
use crate::schedule::Schedule;
use crate::task::NodeIndex;
use crate::timephased::TimephasedCurve;

/// Encoded curves as they are stored on an assignment record.
#[derive(Debug, Clone, Default)]
pub struct EncodedCurves {
    pub planned: Option<String>,
    pub actual: Option<String>,
    pub remaining: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub task: NodeIndex,
    pub resource: Id,
    pub planned_work: Option<Duration>,
    pub actual_work: Option<Duration>,
    pub remaining_work: Option<Duration>,
    pub planned_start: Option<NaiveDateTime>,
    pub actual_start: Option<NaiveDateTime>,
    pub remaining_early_start: Option<NaiveDateTime>,
    pub planned: TimephasedCurve,
    pub actual: TimephasedCurve,
    pub remaining: TimephasedCurve,
}

impl Assignment {
    pub fn new(task: NodeIndex, resource: Id) -> Self {
        Self {
            task,
            resource,
            planned_work: None,
            actual_work: None,
            remaining_work: None,
            planned_start: None,
            actual_start: None,
            remaining_early_start: None,
            planned: TimephasedCurve::default(),
            actual: TimephasedCurve::default(),
            remaining: TimephasedCurve::default(),
        }
    }
}

/// Planned, actual and remaining curve anchors. The assignment's own starts
/// win; the assigned task's matching dates fill the gaps.
struct Anchors {
    planned: Option<NaiveDateTime>,
    actual: Option<NaiveDateTime>,
    remaining: Option<NaiveDateTime>,
}

impl Schedule {
    fn anchors(&self, assignment: &Assignment) -> Anchors {
        let dates = &self.tasks.get(assignment.task).dates;
        Anchors {
            planned: assignment.planned_start.or(dates.planned_start),
            actual: assignment.actual_start.or(dates.actual_start),
            remaining: assignment.remaining_early_start.or(dates.remaining_early_start),
        }
    }

    /// Decodes the curves stored on an assignment, each anchored at the
    /// matching start of the assignment. Curves from foreign data are left
    /// empty; a curve that fails to decode is left empty and recorded when
    /// tolerant.
    pub fn read_curves(
        &mut self,
        assignment: &mut Assignment,
        encoded: &EncodedCurves,
    ) -> Result<()> {
        let Some(codec) = self.timephased_codec() else {
            return Ok(());
        };
        let Some(calendar) = self.effective_calendar(assignment.task) else {
            let task = self.tasks.get(assignment.task).unique_id();
            warn!(task, "no calendar for time-phased work");
            return Ok(());
        };
        let anchors = self.anchors(assignment);
        let curves = [
            (&mut assignment.planned, anchors.planned, encoded.planned.as_deref()),
            (&mut assignment.actual, anchors.actual, encoded.actual.as_deref()),
            (&mut assignment.remaining, anchors.remaining, encoded.remaining.as_deref()),
        ];
        let mode = self.decode_mode;
        for (curve, anchor, text) in curves {
            match codec.decode(&calendar, anchor, text) {
                Ok(decoded) => *curve = decoded,
                Err(error) => mode.absorb(error, self.ignored_errors_mut())?,
            }
        }
        Ok(())
    }

    /// Encodes an assignment's curves against the same anchors `read_curves`
    /// uses. A curve without an anchor is written as absent.
    pub fn write_curves(&self, assignment: &Assignment) -> Result<EncodedCurves> {
        let codec = self.timephased_codec();
        let calendar = self.effective_calendar(assignment.task);
        let (Some(codec), Some(calendar)) = (codec, calendar) else {
            return Ok(EncodedCurves::default());
        };
        let anchors = self.anchors(assignment);
        let encode = |curve: &TimephasedCurve, anchor: Option<NaiveDateTime>| match anchor {
            Some(anchor) if !curve.is_empty() => codec.encode(&calendar, anchor, curve).map(Some),
            _ => Ok(None),
        };
        Ok(EncodedCurves {
            planned: encode(&assignment.planned, anchors.planned)?,
            actual: encode(&assignment.actual, anchors.actual)?,
            remaining: encode(&assignment.remaining, anchors.remaining)?,
        })
    }
}
