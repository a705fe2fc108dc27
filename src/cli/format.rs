//! Output formatting for console display.

use jiff::civil::DateTime;

use crate::model::{DispatchRecord, StatusFilter};

/// Full timestamp, or `N/A` when unknown.
pub(super) fn format_timestamp(at: Option<DateTime>) -> String {
    at.map_or_else(
        || "N/A".to_string(),
        |at| at.strftime("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Minute-precision timestamp, used when picking a dispatch to complete.
pub(super) fn format_short_timestamp(at: Option<DateTime>) -> String {
    at.map_or_else(
        || "N/A".to_string(),
        |at| at.strftime("%Y-%m-%d %H:%M").to_string(),
    )
}

pub(super) fn format_record(record: &DispatchRecord) -> String {
    format!(
        "ID: {:<15} | Type: {:<15} | Status: {:<12} | Start: {:<20} | End: {:<20} | Notes: {}",
        record.id,
        record.kind,
        record.status,
        format_timestamp(record.started_at),
        format_timestamp(record.finished_at),
        record.notes,
    )
}

pub(super) fn filter_title(filter: StatusFilter) -> &'static str {
    match filter {
        StatusFilter::All => "All dispatches",
        StatusFilter::InProgress => "Dispatches in progress",
        StatusFilter::Completed => "Completed dispatches",
    }
}

/// A titled listing, one line per dispatch.
pub(super) fn format_listing(records: &[&DispatchRecord], filter: StatusFilter) -> String {
    let mut out = format!("--- {} ---", filter_title(filter));
    if records.is_empty() {
        out.push_str("\nNo dispatches to show in this category.");
        return out;
    }
    for record in records {
        out.push('\n');
        out.push_str(&format_record(record));
    }
    out
}
