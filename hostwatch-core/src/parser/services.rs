//! Service unit listing (`systemctl list-units --type=service --plain --no-legend`)

use crate::model::{ServiceRecord, ServiceState};

const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("nginx", "Nginx web server"),
    ("apache2", "Apache web server"),
    ("mysql", "MySQL database"),
    ("postgresql", "PostgreSQL database"),
    ("mongodb", "MongoDB database"),
    ("redis", "Redis"),
    ("ssh", "SSH"),
    ("ufw", "UFW firewall"),
    ("fail2ban", "Fail2Ban"),
];

fn display_name(unit: &str) -> String {
    DISPLAY_NAMES
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, display)| display.to_string())
        .unwrap_or_else(|| unit.to_string())
}

/// Map the SUB column to a service state
fn state_from_sub(sub: &str) -> ServiceState {
    match sub.to_lowercase().as_str() {
        "running" => ServiceState::Active,
        "dead" => ServiceState::Inactive,
        "failed" => ServiceState::Failed,
        _ => ServiceState::Unknown,
    }
}

/// Parse `UNIT LOAD ACTIVE SUB DESCRIPTION...`; fewer than 4 columns is rejected.
pub fn parse_service_line(line: &str) -> Option<ServiceRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return None;
    }

    let name = fields[0].strip_suffix(".service").unwrap_or(fields[0]).to_string();
    Some(ServiceRecord {
        display_name: display_name(&name),
        status: state_from_sub(fields[3]),
        description: fields[4..].join(" "),
        name,
    })
}

pub fn parse_service_listing(output: &str) -> Vec<ServiceRecord> {
    output.lines().filter_map(parse_service_line).collect()
}
