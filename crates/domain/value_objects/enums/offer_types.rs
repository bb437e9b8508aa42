use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    #[default]
    InStore,
    Online,
    Both,
}

impl OfferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferType::InStore => "in_store",
            OfferType::Online => "online",
            OfferType::Both => "both",
        }
    }

    /// Unknown values read back as `InStore`, the column default.
    pub fn from_str(value: &str) -> Self {
        match value {
            "online" => OfferType::Online,
            "both" => OfferType::Both,
            _ => OfferType::InStore,
        }
    }
}

impl Display for OfferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
