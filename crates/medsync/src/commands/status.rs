//! Stock status handler.

use serde::Serialize;
use tabled::Tabled;

use medsync_core::{
    EntityId, ItemCategory, RunwayThresholds, StockFilter, StockLocation, StockStatus,
};

use crate::cli::{StatusArgs, StatusLevel};
use crate::commands::{self, Session};
use crate::error::CliError;
use crate::output;

/// One stocked item with its derived runway and status.
#[derive(Debug, Serialize)]
pub struct StockLine {
    pub facility_id: EntityId,
    pub facility: String,
    pub department: String,
    pub category: ItemCategory,
    pub quantity: u32,
    pub daily_usage_rate: f64,
    pub runway_days: f64,
    pub status: StockStatus,
}

#[derive(Tabled)]
struct StockRow {
    #[tabled(rename = "Facility")]
    facility: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Supply")]
    category: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Use/day")]
    rate: String,
    #[tabled(rename = "Runway (d)")]
    runway: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn handle(args: &StatusArgs, session: &Session) -> Result<(), CliError> {
    let network = &session.network;
    let thresholds = session.engine_config.thresholds;

    let mut filters = Vec::new();
    if let Some(ref facility) = args.facility {
        let id = EntityId::from(facility.as_str());
        network.require_facility(&id)?;
        filters.push(StockFilter::ByFacility(id));
    }
    if let Some(ref category) = args.category {
        filters.push(StockFilter::ByCategory(commands::parse_category(category)?));
    }
    if let Some(level) = args.status {
        filters.push(StockFilter::ByStatus(stock_status(level), thresholds));
    }
    if args.attention {
        filters.push(StockFilter::NeedsAttention(thresholds));
    }

    let lines: Vec<StockLine> = network
        .stock()
        .filter(|loc| filters.iter().all(|f| f.matches(loc)))
        .map(|loc| stock_line(&loc, thresholds))
        .collect();

    let color = session.color;
    let out = output::render_list(session.format, &lines, |l| StockRow {
        facility: l.facility.clone(),
        department: l.department.clone(),
        category: l.category.to_string(),
        quantity: l.quantity,
        rate: format!("{:.1}", l.daily_usage_rate),
        runway: format!("{:.1}", l.runway_days),
        status: output::paint_status(l.status, color),
    })?;
    session.print(&out);
    Ok(())
}

fn stock_status(level: StatusLevel) -> StockStatus {
    match level {
        StatusLevel::Critical => StockStatus::Critical,
        StatusLevel::Low => StockStatus::Low,
        StatusLevel::Adequate => StockStatus::Adequate,
    }
}

fn stock_line(loc: &StockLocation<'_>, thresholds: RunwayThresholds) -> StockLine {
    StockLine {
        facility_id: loc.facility.id.clone(),
        facility: loc.facility.name.clone(),
        department: loc.department.name.clone(),
        category: loc.item.category,
        quantity: loc.item.quantity,
        daily_usage_rate: loc.item.daily_usage_rate,
        runway_days: loc.item.runway_days(),
        status: loc.item.status(thresholds),
    }
}
