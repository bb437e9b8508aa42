use serde::Serialize;

use crate::domain::value_objects::enums::plan_types::PlanType;

/// Ceilings and monthly grants attached to a plan.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlanLimits {
    /// Maximum number of offers + events a partner may hold.
    pub content: i64,
    pub monthly_en_vedette: i32,
    pub monthly_visibilite: i32,
}

impl PlanLimits {
    pub const FREE: PlanLimits = PlanLimits {
        content: 2,
        monthly_en_vedette: 0,
        monthly_visibilite: 0,
    };

    pub const PRO: PlanLimits = PlanLimits {
        content: 10,
        monthly_en_vedette: 1,
        monthly_visibilite: 1,
    };
}

pub fn plan_limit(plan_type: PlanType) -> i64 {
    plan_type.limits().content
}

/// Advisory view for the dashboard. Creation paths re-count inside the insert transaction.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ContentGate {
    pub plan_type: PlanType,
    pub content_limit: i64,
    pub total_content: i64,
    pub can_create_content: bool,
}

impl ContentGate {
    pub fn new(plan_type: PlanType, total_content: i64) -> Self {
        let content_limit = plan_limit(plan_type);
        Self {
            plan_type,
            content_limit,
            total_content,
            can_create_content: total_content < content_limit,
        }
    }
}
