//! Schedule reconciliation – a canonical project-schedule model shared by two
//! interchange formats of one scheduling product.
//!
//! One format is relational and tabular, the other a hierarchical document.
//! Both are read into, and written from, the same in-memory [`schedule::Schedule`]:
//! * A [`task::TaskTree`] is a forest of WBS summary nodes and leaf activities.
//! * A [`calendar::Calendar`] is a weekly working pattern with dated exceptions,
//!   optionally derived from a parent calendar.
//! * A [`clash::ClashMap`] hands out collision-free identifiers when several
//!   source projects (or several entity kinds) share one id space.
//!
//! Completed calendars are owned by a [`calendar::CalendarKeeper`] and shared
//! from there through `Arc`; tasks refer to them by id.
//!
//! ## Modules
//! * [`clash`] – Identifier generator and the clash map.
//! * [`structured_text`] – Parser and writer for the nested record format found
//!   inside single text fields. Grammar details live in `structured_text.pest`.
//! * [`calendar`] – Working-time calendars and time arithmetic.
//! * [`calendar_text`] – Calendars to and from structured text.
//! * [`duration`] – Durations, units and null-safe arithmetic.
//! * [`timephased`] – Per-period work curves of resource assignments.
//! * [`task`], [`relation`], [`assignment`] – The schedule's entities.
//! * [`rollup`] – Derives summary data from the leaves once a schedule is read.
//! * [`datatype`] – Field data types and their conversions from source text.
//! * [`settings`] – Layered configuration of an operation.
//!
//! ## Quick Start
//! ```
//! use schedule_reconcile::calendar_text::{CalendarDecoder, encode_calendar_data};
//! use schedule_reconcile::structured_text::DecodeMode;
//! let mut ignored = Vec::new();
//! let calendar = CalendarDecoder::new(DecodeMode::Strict)
//!     .read(1, "Standard", None, None, [None; 4], &mut ignored)
//!     .unwrap();
//! assert_eq!(calendar.capacities().minutes_per_week, 40 * 60);
//! assert!(encode_calendar_data(&calendar).starts_with("(0||CalendarData()("));
//! ```
//!
//! ## Failure
//! Reading tolerates partial data. Decoders either raise a
//! [`error::ReconcileError`] or, in tolerant mode, record it on the schedule
//! and carry on. The rollup never fails: missing values stay unknown and
//! inconsistent spans count as zero.

pub mod assignment;
pub mod calendar;
pub mod calendar_text;
pub mod clash;
pub mod datatype;
pub mod duration;
pub mod error;
pub mod relation;
pub mod rollup;
pub mod schedule;
pub mod settings;
pub mod structured_text;
pub mod task;
pub mod timephased;
