// ── Analysis collaborator boundary ──
//
// The engine condenses the network into a compact brief and hands it to an
// external analyst for a free-text assessment. The analyst is optional:
// any failure collapses to a fixed fallback message.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::error::AnalysisError;
use crate::model::{Department, Facility, Item, Network};

/// Returned whenever the analyst fails, times out, or answers with nothing.
pub const ANALYSIS_FALLBACK: &str = "System Offline. AI Analysis unavailable.";

/// An external service that turns a network brief into prose.
pub trait Analyst: Send + Sync {
    /// Assess the serialized [`NetworkBrief`].
    fn assess(&self, brief_json: &str)
    -> impl Future<Output = Result<String, AnalysisError>> + Send;
}

/// Compact view of the network sent to the analyst.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NetworkBrief {
    pub facilities: Vec<FacilityBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityBrief {
    pub name: String,
    pub capacity: u32,
    pub departments: Vec<DepartmentBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentBrief {
    pub name: String,
    /// `"{count} {title}"`, e.g. `"15 Trauma Surgeons"`.
    pub specialists: String,
    pub supplies: Vec<SupplyBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyBrief {
    pub item: String,
    pub stock: u32,
    /// Days of supply with one decimal place.
    pub days_supply: String,
}

impl NetworkBrief {
    pub fn from_network(network: &Network) -> Self {
        Self {
            facilities: network.facilities.iter().map(|f| FacilityBrief::from_facility(f)).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FacilityBrief {
    fn from_facility(facility: &Facility) -> Self {
        Self {
            name: facility.name.clone(),
            capacity: facility.max_capacity,
            departments: facility
                .departments
                .iter()
                .map(|d| DepartmentBrief::from_department(d))
                .collect(),
        }
    }
}

impl DepartmentBrief {
    fn from_department(department: &Department) -> Self {
        Self {
            name: department.name.clone(),
            specialists: format!(
                "{} {}",
                department.specialist_count, department.specialist_title
            ),
            supplies: department.inventory.iter().map(|i| SupplyBrief::from_item(i)).collect(),
        }
    }
}

impl SupplyBrief {
    fn from_item(item: &Item) -> Self {
        // A zero rate would divide by zero; the brief treats it as one unit/day.
        let rate = if item.daily_usage_rate > 0.0 {
            item.daily_usage_rate
        } else {
            1.0
        };
        Self {
            item: item.category.to_string(),
            stock: item.quantity,
            days_supply: format!("{:.1}", f64::from(item.quantity) / rate),
        }
    }
}

/// Ask the analyst for an assessment, falling back to
/// [`ANALYSIS_FALLBACK`] on any failure.
pub async fn assess_or_fallback<A: Analyst>(
    analyst: &A,
    brief: &NetworkBrief,
    timeout: Duration,
) -> String {
    match try_assess(analyst, brief, timeout).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "analysis unavailable, using fallback");
            ANALYSIS_FALLBACK.to_owned()
        }
    }
}

async fn try_assess<A: Analyst>(
    analyst: &A,
    brief: &NetworkBrief,
    timeout: Duration,
) -> Result<String, AnalysisError> {
    let json = brief.to_json()?;
    let text = tokio::time::timeout(timeout, analyst.assess(&json))
        .await
        .map_err(|_| AnalysisError::Timeout {
            timeout_ms: timeout.as_millis(),
        })??;
    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(text)
}
