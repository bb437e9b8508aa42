use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_objects::{boosts::BoostCredits, plans::ContentGate};

/// Raw counters read in one round trip. Boosted counts already apply the 72h window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub commerces: i64,
    pub offers: i64,
    pub events: i64,
    pub boosted_commerces: i64,
    pub boosted_offers: i64,
    pub boosted_events: i64,
}

/// Immutable view of everything the dashboard badges show. A refresh builds a new one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub commerce_count: i64,
    pub offer_count: i64,
    pub event_count: i64,
    pub boosted_commerces: i64,
    pub boosted_offers: i64,
    pub boosted_events: i64,
    pub credits: BoostCredits,
    pub content_gate: ContentGate,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn new(
        counts: DashboardCounts,
        credits: BoostCredits,
        content_gate: ContentGate,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            commerce_count: counts.commerces,
            offer_count: counts.offers,
            event_count: counts.events,
            boosted_commerces: counts.boosted_commerces,
            boosted_offers: counts.boosted_offers,
            boosted_events: counts.boosted_events,
            credits,
            content_gate,
            generated_at,
        }
    }
}
