use shared::protocol::EntityStats;

/// Fire-and-forget side-channel for translation progress counters attached
/// to page responses. Sinks must not panic; the entity list never depends on
/// a notification being delivered.
pub trait StatsSink: Send + Sync {
    fn page_received(&self, stats: &EntityStats);
}

pub struct NoopStatsSink;

impl StatsSink for NoopStatsSink {
    fn page_received(&self, _stats: &EntityStats) {}
}
