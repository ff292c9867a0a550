//! Line parsers for external text
//!
//! Each format has a single-line entry point returning `Option<_>` and a
//! whole-output helper. Malformed lines are never an error: they simply
//! produce no record, so a noisy log or a garbled listing degrades to fewer
//! records instead of a failure.

mod firewall;
mod log_line;
mod ports;
mod services;

pub use firewall::{parse_firewall_line, parse_firewall_rules};
pub use log_line::{infer_severity, parse_log_line, parse_log_line_at, parse_log_line_in_year, parse_log_text};
pub use ports::{parse_port_line, parse_port_listing, service_for_port};
pub use services::{parse_service_line, parse_service_listing};
