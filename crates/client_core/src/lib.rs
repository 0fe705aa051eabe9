use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use shared::{
    domain::{Entity, EntityPk, PluralForm, Translation},
    protocol::SiblingBundle,
};
use tracing::warn;

pub mod config;
pub mod gateway;
pub mod session;
pub mod stats;

pub use gateway::{EntityGateway, HttpEntityGateway, MissingEntityGateway};
pub use session::{EntityListEvent, EntityListSession, SessionError};
pub use stats::{NoopStatsSink, StatsSink};

/// Ordered, deduplicated collection of the entities currently shown for one
/// resource view, plus the fetch-lifecycle flags driving the paging UI.
///
/// Entities are held behind `Arc` so that a transition can return a fresh
/// top-level state while untouched entries stay pointer-identical with the
/// previous snapshot. Old snapshots remain valid to read while a new one is
/// being computed; no transition mutates its receiver.
#[derive(Debug, Clone)]
pub struct EntityListState {
    entities: Vec<Arc<Entity>>,
    index_by_pk: HashMap<EntityPk, usize>,
    fetching: bool,
    fetch_count: u64,
    has_more: bool,
}

impl Default for EntityListState {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityListState {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            index_by_pk: HashMap::new(),
            fetching: false,
            fetch_count: 0,
            has_more: true,
        }
    }

    pub fn entities(&self) -> &[Arc<Entity>] {
        &self.entities
    }

    pub fn fetching(&self) -> bool {
        self.fetching
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetch_count
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, pk: EntityPk) -> bool {
        self.index_by_pk.contains_key(&pk)
    }

    pub fn position_of(&self, pk: EntityPk) -> Option<usize> {
        self.index_by_pk.get(&pk).copied()
    }

    pub fn get(&self, pk: EntityPk) -> Option<&Arc<Entity>> {
        self.position_of(pk).map(|index| &self.entities[index])
    }

    /// A page fetch went out. `has_more` turns pessimistic until the
    /// response decides it.
    pub fn request(&self) -> Self {
        let mut next = self.clone();
        next.fetching = true;
        next.has_more = false;
        next
    }

    /// A page fetch failed before delivering entities. Restores `has_more`
    /// so the view can ask again; without this the pessimistic `request()`
    /// flags would stick forever.
    pub fn request_failed(&self) -> Self {
        let mut next = self.clone();
        next.fetching = false;
        next.has_more = true;
        next
    }

    /// Appends a received page. Entities whose pk is already present, or
    /// repeated within the batch, are dropped: each pk occurs at most once
    /// in the list, and backends may return overlapping pages.
    pub fn receive(&self, page: Vec<Entity>, has_more: bool) -> Self {
        let mut next = self.clone();
        for entity in page {
            if next.index_by_pk.contains_key(&entity.pk) {
                warn!(pk = entity.pk.0, "dropping duplicate entity on ingest");
                continue;
            }
            next.index_by_pk.insert(entity.pk, next.entities.len());
            next.entities.push(Arc::new(entity));
        }
        next.fetching = false;
        next.fetch_count += 1;
        next.has_more = has_more;
        next
    }

    /// Back to the initial list state. `fetch_count` is intentionally kept;
    /// the paging UI uses it to tell "never fetched" from "fetched, empty".
    pub fn reset(&self) -> Self {
        Self {
            entities: Vec::new(),
            index_by_pk: HashMap::new(),
            fetching: false,
            fetch_count: self.fetch_count,
            has_more: true,
        }
    }

    /// Replaces one plural-form translation of one entity. Every other
    /// entity in the returned state is the same `Arc` as before, and within
    /// the matched entity only the addressed slot changes.
    ///
    /// An unknown pk is a no-op: the triggering UI event can race a
    /// concurrent reset, and that race is legal. A slot beyond the entity's
    /// translation list is likewise a no-op; transitions never error and
    /// growing the list would require fabricating a placeholder translation.
    pub fn update_translation(
        &self,
        pk: EntityPk,
        plural_form: PluralForm,
        translation: Translation,
    ) -> Self {
        let Some(index) = self.position_of(pk) else {
            return self.clone();
        };
        let slot = plural_form.slot();
        let current = &self.entities[index];
        if slot >= current.translation.len() {
            warn!(
                pk = pk.0,
                slot,
                slots = current.translation.len(),
                "ignoring translation update for out-of-range plural form"
            );
            return self.clone();
        }

        let mut updated = Entity::clone(current);
        updated.translation[slot] = translation;

        let mut next = self.clone();
        next.entities[index] = Arc::new(updated);
        next
    }

    /// Splices sibling context strings into the list, replacing the target's
    /// slot with `preceding ++ target ++ succeeding`.
    ///
    /// A sibling already visible elsewhere in the list is suppressed at the
    /// sibling position and left untouched at its original one. Membership is
    /// decided once against the pre-splice list, so suppressing one candidate
    /// cannot change the verdict for another in the same call. Unknown target
    /// pk is a no-op.
    pub fn receive_siblings(&self, siblings: &SiblingBundle, target: EntityPk) -> Self {
        let Some(index) = self.position_of(target) else {
            return self.clone();
        };

        let mut admitted: HashSet<EntityPk> = HashSet::new();
        let mut admit = |run: &mut Vec<Arc<Entity>>, sibling: &Entity| {
            // The target-pk and in-bundle-duplicate guards keep the global
            // pk-uniqueness invariant even for malformed bundles.
            if sibling.pk == target
                || self.index_by_pk.contains_key(&sibling.pk)
                || !admitted.insert(sibling.pk)
            {
                return;
            }
            run.push(Arc::new(sibling.clone()));
        };

        let mut preceding = Vec::with_capacity(siblings.preceding.len());
        for sibling in &siblings.preceding {
            admit(&mut preceding, sibling);
        }
        let mut succeeding = Vec::with_capacity(siblings.succeeding.len());
        for sibling in &siblings.succeeding {
            admit(&mut succeeding, sibling);
        }

        let mut entities =
            Vec::with_capacity(self.entities.len() + preceding.len() + succeeding.len());
        entities.extend_from_slice(&self.entities[..index]);
        entities.extend(preceding);
        entities.push(Arc::clone(&self.entities[index]));
        entities.extend(succeeding);
        entities.extend_from_slice(&self.entities[index + 1..]);

        let index_by_pk = entities
            .iter()
            .enumerate()
            .map(|(position, entity)| (entity.pk, position))
            .collect();

        Self {
            entities,
            index_by_pk,
            fetching: self.fetching,
            fetch_count: self.fetch_count,
            has_more: self.has_more,
        }
    }
}

impl PartialEq for EntityListState {
    fn eq(&self, other: &Self) -> bool {
        self.fetching == other.fetching
            && self.fetch_count == other.fetch_count
            && self.has_more == other.has_more
            && self.entities.len() == other.entities.len()
            && self
                .entities
                .iter()
                .zip(&other.entities)
                .all(|(a, b)| a == b)
    }
}

impl Eq for EntityListState {}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
