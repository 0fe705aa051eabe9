use std::sync::Arc;

use shared::{
    domain::{EntityPk, PluralForm, Translation},
    protocol::FilterSet,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::{gateway::EntityGateway, stats::StatsSink, EntityListState};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Gateway failures surfaced to the caller. The store itself never ends up
/// corrupted by one of these; flags are rolled back before returning.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("entity page fetch failed: {0}")]
    PageFetch(#[source] anyhow::Error),
    #[error("sibling fetch failed for entity {entity}: {source}")]
    SiblingFetch {
        entity: i64,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityListEvent {
    PageReceived { fetch_count: u64, total: usize },
    SiblingsSpliced { entity: EntityPk },
    TranslationUpdated { entity: EntityPk },
    Reset,
}

struct SessionInner {
    state: EntityListState,
    /// Bumped on every reset. A page or sibling bundle resolved under an
    /// older epoch is stale and must not resurrect discarded entities.
    epoch: u64,
}

/// Owns the entity list for one resource view and orchestrates gateway calls
/// around it. The store itself is the single source of truth; consumers read
/// consistent snapshots and listen for change events.
pub struct EntityListSession {
    gateway: Arc<dyn EntityGateway>,
    stats: Arc<dyn StatsSink>,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<EntityListEvent>,
}

impl EntityListSession {
    pub fn new(gateway: Arc<dyn EntityGateway>, stats: Arc<dyn StatsSink>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            gateway,
            stats,
            inner: Mutex::new(SessionInner {
                state: EntityListState::new(),
                epoch: 0,
            }),
            events,
        }
    }

    pub async fn snapshot(&self) -> EntityListState {
        self.inner.lock().await.state.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EntityListEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: EntityListEvent) {
        // Nobody listening is fine; events are advisory.
        let _ = self.events.send(event);
    }

    /// Fetches the next page of entities and appends it to the list.
    ///
    /// The gateway round-trip happens outside the state lock. If a reset
    /// lands while the request is in flight, the response epoch no longer
    /// matches and the page is dropped instead of resurrecting stale data.
    pub async fn load_entities(
        &self,
        locale: &str,
        project: &str,
        resource: &str,
        filters: &FilterSet,
    ) -> Result<(), SessionError> {
        let epoch = {
            let mut inner = self.inner.lock().await;
            inner.state = inner.state.request();
            inner.epoch
        };

        match self
            .gateway
            .fetch_page(locale, project, resource, filters)
            .await
        {
            Ok(page) => {
                let event = {
                    let mut inner = self.inner.lock().await;
                    if inner.epoch != epoch {
                        warn!(epoch, current = inner.epoch, "dropping stale entity page");
                        return Ok(());
                    }
                    inner.state = inner.state.receive(page.entities, page.has_next);
                    EntityListEvent::PageReceived {
                        fetch_count: inner.state.fetch_count(),
                        total: inner.state.len(),
                    }
                };
                info!(locale, project, resource, "entity page received");
                self.stats.page_received(&page.stats);
                self.emit(event);
                Ok(())
            }
            Err(err) => {
                error!(locale, project, resource, error = %err, "entity page fetch failed");
                let mut inner = self.inner.lock().await;
                if inner.epoch == epoch {
                    inner.state = inner.state.request_failed();
                }
                Err(SessionError::PageFetch(err))
            }
        }
    }

    /// Fetches sibling context strings for one entity and splices them in.
    /// Same staleness discipline as `load_entities`; a target that vanished
    /// while the request was in flight makes the splice a no-op.
    pub async fn load_sibling_entities(
        &self,
        entity: EntityPk,
        locale: &str,
    ) -> Result<(), SessionError> {
        let epoch = self.inner.lock().await.epoch;

        match self.gateway.fetch_siblings(entity, locale).await {
            Ok(bundle) => {
                {
                    let mut inner = self.inner.lock().await;
                    if inner.epoch != epoch {
                        warn!(
                            entity = entity.0,
                            epoch,
                            current = inner.epoch,
                            "dropping stale sibling bundle"
                        );
                        return Ok(());
                    }
                    inner.state = inner.state.receive_siblings(&bundle, entity);
                }
                self.emit(EntityListEvent::SiblingsSpliced { entity });
                Ok(())
            }
            Err(err) => {
                error!(entity = entity.0, error = %err, "sibling fetch failed");
                Err(SessionError::SiblingFetch {
                    entity: entity.0,
                    source: err,
                })
            }
        }
    }

    /// Replaces the active translation of one entity's plural form.
    pub async fn update_translation(
        &self,
        entity: EntityPk,
        plural_form: PluralForm,
        translation: Translation,
    ) {
        {
            let mut inner = self.inner.lock().await;
            inner.state = inner.state.update_translation(entity, plural_form, translation);
        }
        self.emit(EntityListEvent::TranslationUpdated { entity });
    }

    /// Clears the list for a navigation change and invalidates every
    /// outstanding fetch.
    pub async fn reset(&self) {
        {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.state = inner.state.reset();
        }
        self.emit(EntityListEvent::Reset);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
