//! Core data model for dispatch tracking.
//!
//! A dispatch is one unit of outbound warehouse work: it starts when the
//! record is created and finishes when it is marked completed.

mod dispatch_type;
mod filter;
mod record;

pub use dispatch_type::DispatchType;
pub use filter::StatusFilter;
pub use record::{DispatchRecord, DispatchStatus, now};
