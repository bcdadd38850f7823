//! Collision-safe remapping of externally sourced identifiers.
//!
//! Source projects reuse numeric identifiers freely: activities merged from
//! several projects may share ids, and roles live in the same numeric space as
//! resources. A [`ClashMap`] sits between the source ids and the canonical
//! model so that every entity receives an id nobody else holds, while
//! references processed later (relations, role links) can still be resolved
//! through [`ClashMap::get_id`].

use core::hash::BuildHasherDefault;
use std::collections::HashSet;

use bimap::BiMap;
use seahash::SeaHasher;
use tracing::{debug, warn};

// ------------- Id -------------
pub type Id = i32;

// used for hashmaps keyed by plain identifiers
pub type IdHasher = BuildHasherDefault<SeaHasher>;

pub const GENESIS: Id = 0;

/// Mints identifiers strictly above every identifier it has been told about.
#[derive(Debug)]
pub struct IdGenerator {
    lower_bound: Id,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { lower_bound: GENESIS }
    }
    // Identifiers read from source data must be retained before anything is
    // generated, otherwise a generated id may later collide with a real one.
    pub fn retain(&mut self, id: Id) {
        if id > self.lower_bound {
            self.lower_bound = id;
        }
    }
    /// The next identifier above the bound, or `None` once the bound is `Id::MAX`.
    pub fn generate(&mut self) -> Option<Id> {
        self.lower_bound = self.lower_bound.checked_add(1)?;
        Some(self.lower_bound)
    }
    pub fn lower_bound(&self) -> Id {
        self.lower_bound
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- ClashMap -------------
/// Bijection from original identifiers (left) to assigned identifiers (right).
/// Entities that arrive without an identifier only occupy the assigned side.
#[derive(Debug, Default)]
pub struct ClashMap {
    ids: BiMap<Id, Id>,
    anonymous: HashSet<Id, IdHasher>,
    generator: IdGenerator,
}

impl ClashMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the counter past an identifier observed elsewhere in the data.
    pub fn reserve(&mut self, id: Id) {
        self.generator.retain(id);
    }

    /// Assigns an identifier for `original`. Calling this twice with the same
    /// original returns the same assigned identifier.
    pub fn add_id(&mut self, original: Option<Id>) -> Id {
        let Some(original) = original else {
            let minted = self.mint();
            self.anonymous.insert(minted);
            return minted;
        };

        if let Some(assigned) = self.ids.get_by_left(&original) {
            return *assigned;
        }

        self.generator.retain(original);
        let assigned = if self.is_assigned(original) {
            let minted = self.mint();
            debug!(original, assigned = minted, "identifier clash resolved");
            minted
        } else {
            original
        };
        self.ids.insert(original, assigned);
        assigned
    }

    pub fn get_id(&self, original: Id) -> Option<Id> {
        self.ids.get_by_left(&original).copied()
    }

    pub fn original_id(&self, assigned: Id) -> Option<Id> {
        self.ids.get_by_right(&assigned).copied()
    }

    /// Number of identifiers handed out.
    pub fn len(&self) -> usize {
        self.ids.len() + self.anonymous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_assigned(&self, id: Id) -> bool {
        self.ids.contains_right(&id) || self.anonymous.contains(&id)
    }

    fn is_free(&self, id: Id) -> bool {
        !self.is_assigned(id) && !self.ids.contains_left(&id)
    }

    fn mint(&mut self) -> Id {
        while let Some(candidate) = self.generator.generate() {
            if self.is_free(candidate) {
                return candidate;
            }
        }
        // counter exhausted, take the highest identifier still free
        warn!("identifier counter exhausted, searching downward for a free id");
        let mut candidate = Id::MAX;
        while !self.is_free(candidate) {
            candidate = candidate.wrapping_sub(1);
        }
        candidate
    }
}
