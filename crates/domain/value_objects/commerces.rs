use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::commerces::{CommerceEntity, InsertCommerceEntity, UpdateCommerceEntity},
    value_objects::{
        boosts::{BoostInfoDto, Locale},
        content::{ValidationErrors, clean_optional},
    },
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommerceForm {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub address: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub category: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
}

impl CommerceForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name);
        errors.require_text("address", &self.address);
        errors.require_text("category", &self.category);

        if let Some(email) = self.email.as_deref().map(str::trim) {
            if !email.is_empty() && !email.contains('@') {
                errors.push("email is invalid");
            }
        }
        if let Some(latitude) = self.latitude {
            if !(-90.0..=90.0).contains(&latitude) {
                errors.push("latitude must be between -90 and 90");
            }
        }
        if let Some(longitude) = self.longitude {
            if !(-180.0..=180.0).contains(&longitude) {
                errors.push("longitude must be between -180 and 180");
            }
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            errors.push("latitude and longitude must be provided together");
        }

        errors.into_result()
    }

    pub fn into_insert(self, user_id: Uuid) -> InsertCommerceEntity {
        InsertCommerceEntity {
            user_id,
            name: self.name.trim().to_string(),
            description: clean_optional(self.description),
            address: self.address.trim().to_string(),
            postal_code: clean_optional(self.postal_code),
            latitude: self.latitude,
            longitude: self.longitude,
            category: self.category.trim().to_string(),
            email: clean_optional(self.email),
            phone: clean_optional(self.phone),
            website: clean_optional(self.website),
            image_url: clean_optional(self.image_url),
        }
    }

    pub fn into_update(self, now: DateTime<Utc>) -> UpdateCommerceEntity {
        UpdateCommerceEntity {
            name: self.name.trim().to_string(),
            description: clean_optional(self.description),
            address: self.address.trim().to_string(),
            postal_code: clean_optional(self.postal_code),
            latitude: self.latitude,
            longitude: self.longitude,
            category: self.category.trim().to_string(),
            email: clean_optional(self.email),
            phone: clean_optional(self.phone),
            website: clean_optional(self.website),
            image_url: clean_optional(self.image_url),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommerceDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub boost: BoostInfoDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommerceDto {
    pub fn from_entity(entity: CommerceEntity, locale: Locale, now: DateTime<Utc>) -> Self {
        let boost = entity.boost_state().to_dto(locale, now);
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            address: entity.address,
            postal_code: entity.postal_code,
            latitude: entity.latitude,
            longitude: entity.longitude,
            category: entity.category,
            email: entity.email,
            phone: entity.phone,
            website: entity.website,
            image_url: entity.image_url,
            boost,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// What a cascading commerce delete did to the content attached to it.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CommerceDeletionSummary {
    pub reassigned_offers: usize,
    pub deleted_offers: usize,
    pub reassigned_events: usize,
    pub deleted_events: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CommerceForm {
        CommerceForm {
            name: "Café Gosholo".to_string(),
            address: "123 rue Principale".to_string(),
            category: "restaurant".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_form_is_valid() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn reports_all_missing_fields() {
        let err = CommerceForm::default().validate().unwrap_err();
        assert_eq!(err.errors().len(), 3);
    }

    #[test]
    fn rejects_half_coordinates_and_bad_email() {
        let err = CommerceForm {
            latitude: Some(45.5),
            email: Some("not-an-email".to_string()),
            ..form()
        }
        .validate()
        .unwrap_err();

        assert!(err.errors().contains(&"email is invalid".to_string()));
        assert!(
            err.errors()
                .contains(&"latitude and longitude must be provided together".to_string())
        );
    }

    #[test]
    fn insert_trims_and_drops_blank_fields() {
        let user_id = Uuid::new_v4();
        let insert = CommerceForm {
            name: "  Café  ".to_string(),
            phone: Some("   ".to_string()),
            ..form()
        }
        .into_insert(user_id);

        assert_eq!(insert.name, "Café");
        assert_eq!(insert.phone, None);
        assert_eq!(insert.user_id, user_id);
    }
}
