//! Priority → SLA time budget table. Pure and stateless.

use serde::{Deserialize, Serialize};

/// Resolution target used when the priority label is not in the table.
pub const DEFAULT_RESOLUTION_MINUTES: i64 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaTargets {
    pub resolution_minutes: i64,
    pub response_minutes: i64,
}

/// Resolve the time budgets for a priority label, case-insensitively.
///
/// The response budget is always a quarter of the resolution budget.
pub fn targets_for(priority: &str) -> SlaTargets {
    let resolution = match priority.trim().to_ascii_lowercase().as_str() {
        "critical" | "urgent" => 60,
        "high" => 240,
        "medium" => 480,
        "low" | "other" => 960,
        _ => DEFAULT_RESOLUTION_MINUTES,
    };
    SlaTargets {
        resolution_minutes: resolution,
        response_minutes: resolution / 4,
    }
}
