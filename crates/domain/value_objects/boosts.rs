use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::{boost_types::BoostType, entity_types::EntityType};

/// How long a boost stays live after it is applied.
pub const BOOST_DURATION_HOURS: i64 = 72;

pub fn boost_duration() -> Duration {
    Duration::hours(BOOST_DURATION_HOURS)
}

pub fn boost_expires_at(boosted_at: DateTime<Utc>) -> DateTime<Utc> {
    boosted_at + boost_duration()
}

/// True when there is no boost timestamp or the 72h window has fully elapsed.
/// Display-only: client/server clock skew is not compensated.
pub fn is_boost_expired_at(boosted_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match boosted_at {
        Some(boosted_at) => now - boosted_at >= boost_duration(),
        None => true,
    }
}

pub fn is_boost_expired(boosted_at: Option<DateTime<Utc>>) -> bool {
    is_boost_expired_at(boosted_at, Utc::now())
}

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

impl Locale {
    /// Accepts `fr`, `fr-CA`, `en_US`... Anything that is not English falls back to French.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "en" => Locale::En,
            _ => Locale::Fr,
        }
    }

    /// Picks the highest-weighted range of an `Accept-Language` header. A missing `q` counts as 1,
    /// ties go to the earlier range and `q=0` ranges are skipped.
    pub fn from_accept_language(header: Option<&str>) -> Self {
        let mut best: Option<(&str, f32)> = None;

        for range in header.unwrap_or_default().split(',') {
            let mut parts = range.split(';');
            let tag = parts.next().unwrap_or_default().trim();
            if tag.is_empty() {
                continue;
            }

            let weight = parts
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            if weight <= 0.0 {
                continue;
            }

            if best.is_none_or(|(_, top)| weight > top) {
                best = Some((tag, weight));
            }
        }

        best.map(|(tag, _)| Self::from_tag(tag)).unwrap_or_default()
    }
}

pub fn format_boost_remaining_time_at(
    boosted_at: Option<DateTime<Utc>>,
    locale: Locale,
    now: DateTime<Utc>,
) -> String {
    let Some(boosted_at) = boosted_at else {
        return match locale {
            Locale::Fr => "Inconnu".to_string(),
            Locale::En => "Unknown".to_string(),
        };
    };

    let remaining = boost_expires_at(boosted_at) - now;
    if remaining <= Duration::zero() {
        return match locale {
            Locale::Fr => "Expiré".to_string(),
            Locale::En => "Expired".to_string(),
        };
    }

    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;

    match locale {
        Locale::Fr => format!("{hours}h {minutes}min restantes"),
        Locale::En => format!("{hours}h {minutes}min remaining"),
    }
}

pub fn format_boost_remaining_time(boosted_at: Option<DateTime<Utc>>, locale: Locale) -> String {
    format_boost_remaining_time_at(boosted_at, locale, Utc::now())
}

/// The boost triplet stored on commerces, offers and events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoostState {
    pub boosted: bool,
    pub boost_type: Option<BoostType>,
    pub boosted_at: Option<DateTime<Utc>>,
}

impl BoostState {
    pub fn from_columns(
        boosted: bool,
        boost_type: Option<&str>,
        boosted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            boosted,
            boost_type: boost_type.and_then(BoostType::from_str),
            boosted_at,
        }
    }

    /// The stored flag alone is never trusted; the 72h window is re-derived here.
    pub fn is_currently_boosted_at(&self, now: DateTime<Utc>) -> bool {
        self.boosted && !is_boost_expired_at(self.boosted_at, now)
    }

    pub fn active_boost_type_at(&self, now: DateTime<Utc>) -> Option<BoostType> {
        if self.is_currently_boosted_at(now) {
            self.boost_type
        } else {
            None
        }
    }

    pub fn to_dto(&self, locale: Locale, now: DateTime<Utc>) -> BoostInfoDto {
        let boosted = self.is_currently_boosted_at(now);
        BoostInfoDto {
            boosted,
            boost_type: self.active_boost_type_at(now),
            boosted_at: self.boosted_at.filter(|_| boosted),
            boost_expires_at: self.boosted_at.filter(|_| boosted).map(boost_expires_at),
            boost_remaining: boosted
                .then(|| format_boost_remaining_time_at(self.boosted_at, locale, now)),
        }
    }
}

/// Live boost view attached to every entity read.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BoostInfoDto {
    pub boosted: bool,
    pub boost_type: Option<BoostType>,
    pub boosted_at: Option<DateTime<Utc>>,
    pub boost_expires_at: Option<DateTime<Utc>>,
    pub boost_remaining: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoostTarget {
    Commerce(Uuid),
    Offer(Uuid),
    Event(Uuid),
}

impl BoostTarget {
    pub fn new(entity_type: EntityType, entity_id: Uuid) -> Self {
        match entity_type {
            EntityType::Commerce => BoostTarget::Commerce(entity_id),
            EntityType::Offer => BoostTarget::Offer(entity_id),
            EntityType::Event => BoostTarget::Event(entity_id),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            BoostTarget::Commerce(_) => EntityType::Commerce,
            BoostTarget::Offer(_) => EntityType::Offer,
            BoostTarget::Event(_) => EntityType::Event,
        }
    }

    pub fn entity_id(&self) -> Uuid {
        match self {
            BoostTarget::Commerce(id) | BoostTarget::Offer(id) | BoostTarget::Event(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct BoostCredits {
    pub available_en_vedette: i32,
    pub available_visibilite: i32,
}

impl BoostCredits {
    pub fn available(&self, boost_type: BoostType) -> i32 {
        match boost_type {
            BoostType::EnVedette => self.available_en_vedette,
            BoostType::Visibilite => self.available_visibilite,
        }
    }
}

/// Result of the transactional apply step. The three failure variants cover races
/// lost between the advisory pre-checks and the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyBoostOutcome {
    Applied {
        boosted_at: DateTime<Utc>,
        remaining_credits: i32,
    },
    InsufficientCredits,
    AlreadyBoosted,
    NotFound,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyBoostRequest {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub boost_type: BoostType,
}

impl ApplyBoostRequest {
    pub fn target(&self) -> BoostTarget {
        BoostTarget::new(self.entity_type, self.entity_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveBoostRequest {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
}

impl RemoveBoostRequest {
    pub fn target(&self) -> BoostTarget {
        BoostTarget::new(self.entity_type, self.entity_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoostCheckoutRequest {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub boost_type: BoostType,
}

impl BoostCheckoutRequest {
    pub fn target(&self) -> BoostTarget {
        BoostTarget::new(self.entity_type, self.entity_id)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BoostAppliedDto {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub boost_type: BoostType,
    pub boosted_at: DateTime<Utc>,
    pub boost_expires_at: DateTime<Utc>,
    pub remaining_credits: i32,
}

/// Rows touched by one expiry sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ExpiredBoostCounts {
    pub commerces: usize,
    pub offers: usize,
    pub events: usize,
    pub deactivated_offers: usize,
    pub deactivated_events: usize,
}

impl ExpiredBoostCounts {
    pub fn total(&self) -> usize {
        self.commerces + self.offers + self.events + self.deactivated_offers + self.deactivated_events
    }
}
