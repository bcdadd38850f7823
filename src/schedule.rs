//! The canonical schedule model shared by every reader and writer.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::calendar::{Calendar, CalendarId, CalendarKeeper};
use crate::clash::ClashMap;
use crate::error::ReconcileError;
use crate::relation::{ExternalRelation, Relation};
use crate::settings::Settings;
use crate::structured_text::DecodeMode;
use crate::task::{NodeIndex, TaskTree};
use crate::timephased::{Provenance, TimephasedCodec};

/// How the source marked activities as critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalActivityType {
    #[default]
    TotalFloat,
    LongestPath,
}

/// Everything one import or export operation works on. Nothing in here is
/// shared between operations.
#[derive(Debug, Default)]
pub struct Schedule {
    pub tasks: TaskTree,
    pub calendars: CalendarKeeper,
    pub default_calendar: Option<CalendarId>,
    pub status_date: Option<NaiveDateTime>,
    pub provenance: Provenance,
    pub decode_mode: DecodeMode,
    pub critical_activity_type: CriticalActivityType,
    // activities merged from several projects share one id space
    pub activity_ids: ClashMap,
    // roles share their id space with resources
    pub role_ids: ClashMap,
    pub relations: Vec<Relation>,
    pub external_relations: Vec<ExternalRelation>,
    ignored_errors: Vec<ReconcileError>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            provenance: settings.provenance,
            decode_mode: settings.decode_mode,
            critical_activity_type: settings.critical_activity_type,
            ..Self::default()
        }
    }

    pub fn default_calendar(&self) -> Option<Arc<Calendar>> {
        self.default_calendar.and_then(|id| self.calendars.get(id))
    }

    /// The task's own calendar, or the schedule default.
    pub fn effective_calendar(&self, node: NodeIndex) -> Option<Arc<Calendar>> {
        let id = self.tasks.get(node).calendar.or(self.default_calendar)?;
        self.calendars.get(id)
    }

    /// Present only when the data came from the product whose curve
    /// encoding we understand.
    pub fn timephased_codec(&self) -> Option<TimephasedCodec> {
        TimephasedCodec::for_provenance(self.provenance)
    }

    pub fn ignored_errors(&self) -> &[ReconcileError] {
        &self.ignored_errors
    }
    pub fn ignored_errors_mut(&mut self) -> &mut Vec<ReconcileError> {
        &mut self.ignored_errors
    }
}
