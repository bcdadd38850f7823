//! Operation settings, layered from defaults, an optional file and the
//! environment (`RECONCILE_DECODE_MODE=tolerant` and so on).

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::schedule::CriticalActivityType;
use crate::structured_text::DecodeMode;
use crate::timephased::Provenance;

pub const DEFAULT_SETTINGS_FILE: &str = "reconcile.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub decode_mode: DecodeMode,
    pub provenance: Provenance,
    pub critical_activity_type: CriticalActivityType,
    /// Directive string for the log filter, e.g. `info` or `schedule_reconcile=debug`.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            decode_mode: DecodeMode::default(),
            provenance: Provenance::default(),
            critical_activity_type: CriticalActivityType::default(),
            log_filter: String::from("info"),
        }
    }
}

impl Settings {
    /// Reads `path` (or `reconcile.json` when none is given) if it exists,
    /// then applies `RECONCILE_*` environment variables on top.
    pub fn load(path: Option<&str>) -> Result<Settings> {
        let settings = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_SETTINGS_FILE)).required(false))
            .add_source(Environment::with_prefix("RECONCILE"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
