use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::plans::PlanLimits;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    #[default]
    Free,
    Pro,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Free => "free",
            PlanType::Pro => "pro",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "pro" => PlanType::Pro,
            _ => PlanType::Free,
        }
    }

    pub fn limits(&self) -> PlanLimits {
        match self {
            PlanType::Free => PlanLimits::FREE,
            PlanType::Pro => PlanLimits::PRO,
        }
    }
}

impl Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
