use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Entity, EntityPk};

/// One page of entities as returned by the backend's `get-entities` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPage {
    pub entities: Vec<Entity>,
    pub has_next: bool,
    #[serde(default)]
    pub stats: EntityStats,
}

/// Translation progress counters attached to each page response. Consumed by
/// the stats side-channel only; never read by the entity list store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub approved: u64,
    #[serde(default)]
    pub pretranslated: u64,
    #[serde(default)]
    pub fuzzy: u64,
    #[serde(default)]
    pub warnings: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub unreviewed: u64,
}

/// Context strings adjacent to one entity in the untouched resource order,
/// as returned by `get-sibling-entities`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiblingBundle {
    #[serde(default)]
    pub preceding: Vec<Entity>,
    #[serde(default)]
    pub succeeding: Vec<Entity>,
}

/// Inclusive edit-time window, serialized to the backend's compact
/// `YYYYMMDDHHMM-YYYYMMDDHHMM` query form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn to_query(&self) -> String {
        format!(
            "{}-{}",
            self.start.format("%Y%m%d%H%M"),
            self.end.format("%Y%m%d%H%M")
        )
    }
}

/// Facets narrowing a `get-entities` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSet {
    /// Restrict the page to exactly these entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_ids: Option<Vec<EntityPk>>,
    /// Entities already shown, excluded from the next page.
    #[serde(default)]
    pub exclude_entities: Vec<EntityPk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeWindow>,
}
