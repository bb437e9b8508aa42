use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::events::{EventEntity, InsertEventEntity, UpdateEventEntity},
    value_objects::{
        boosts::{BoostInfoDto, Locale},
        content::{ValidationErrors, clean_optional, dedupe_additional_commerces},
    },
};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventForm {
    pub commerce_id: Option<Uuid>,
    pub category_events_id: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub image_url: Option<String>,
    #[serde(default)]
    pub additional_commerce_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidEvent {
    pub commerce_id: Uuid,
    pub category_events_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub image_url: Option<String>,
    /// Deduplicated, never contains `commerce_id`.
    pub additional_commerce_ids: Vec<Uuid>,
}

impl EventForm {
    pub fn validate(self) -> Result<ValidEvent, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let commerce_id = errors.require("commerce_id", self.commerce_id);
        errors.require_text("title", &self.title);
        errors.require_text("description", &self.description);
        let start_date = errors.require("start_date", self.start_date);
        let end_date = errors.require("end_date", self.end_date);
        errors.check_date_range(start_date, end_date);

        match (commerce_id, start_date, end_date) {
            (Some(commerce_id), Some(start_date), Some(end_date)) if errors.is_empty() => {
                Ok(ValidEvent {
                    commerce_id,
                    category_events_id: self.category_events_id,
                    title: self.title.trim().to_string(),
                    description: self.description.trim().to_string(),
                    start_date,
                    end_date,
                    is_active: self.is_active,
                    image_url: clean_optional(self.image_url),
                    additional_commerce_ids: dedupe_additional_commerces(
                        commerce_id,
                        self.additional_commerce_ids,
                    ),
                })
            }
            _ => Err(errors),
        }
    }
}

impl ValidEvent {
    /// Primary commerce first, then the additional ones.
    pub fn all_commerce_ids(&self) -> Vec<Uuid> {
        std::iter::once(self.commerce_id)
            .chain(self.additional_commerce_ids.iter().copied())
            .collect()
    }

    pub fn to_insert(&self, user_id: Uuid) -> InsertEventEntity {
        InsertEventEntity {
            commerce_id: self.commerce_id,
            user_id,
            category_events_id: self.category_events_id,
            title: self.title.clone(),
            description: self.description.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active,
            image_url: self.image_url.clone(),
        }
    }

    pub fn to_update(&self, now: DateTime<Utc>) -> UpdateEventEntity {
        UpdateEventEntity {
            commerce_id: self.commerce_id,
            category_events_id: self.category_events_id,
            title: self.title.clone(),
            description: self.description.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active,
            image_url: self.image_url.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventDto {
    pub id: Uuid,
    pub commerce_id: Uuid,
    pub additional_commerce_ids: Vec<Uuid>,
    pub category_events_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub boost: BoostInfoDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventDto {
    pub fn from_entity(
        entity: EventEntity,
        additional_commerce_ids: Vec<Uuid>,
        locale: Locale,
        now: DateTime<Utc>,
    ) -> Self {
        let boost = entity.boost_state().to_dto(locale, now);
        let is_active = entity.is_live_on(now.date_naive());
        Self {
            id: entity.id,
            commerce_id: entity.commerce_id,
            additional_commerce_ids,
            category_events_id: entity.category_events_id,
            title: entity.title,
            description: entity.description,
            start_date: entity.start_date,
            end_date: entity.end_date,
            is_active,
            image_url: entity.image_url,
            boost,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
