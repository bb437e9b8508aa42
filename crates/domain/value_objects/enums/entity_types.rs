use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Commerce,
    Offer,
    Event,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Commerce => "commerce",
            EntityType::Offer => "offer",
            EntityType::Event => "event",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "commerce" => Some(EntityType::Commerce),
            "offer" => Some(EntityType::Offer),
            "event" => Some(EntityType::Event),
            _ => None,
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
