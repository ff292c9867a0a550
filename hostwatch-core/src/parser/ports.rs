//! Listening socket listing (`ss -tuln`)

use crate::model::PortRecord;

const WELL_KNOWN_PORTS: &[(u16, &str)] = &[
    (22, "SSH"),
    (80, "HTTP"),
    (443, "HTTPS"),
    (3306, "MySQL"),
    (5432, "PostgreSQL"),
    (6379, "Redis"),
    (27017, "MongoDB"),
];

/// Best-effort service name for a port number
pub fn service_for_port(port: u16) -> &'static str {
    WELL_KNOWN_PORTS
        .iter()
        .find(|(number, _)| *number == port)
        .map(|(_, name)| *name)
        .unwrap_or("unknown")
}

/// Protocol from the leading token: `tcp`, `udp`, or `LISTEN_tcp` style.
fn protocol_from_token(token: &str) -> String {
    let protocol = token
        .strip_prefix("LISTEN")
        .unwrap_or(token)
        .trim_start_matches(['_', '-', ':'])
        .to_lowercase();
    if protocol.is_empty() {
        "unknown".to_string()
    } else {
        protocol
    }
}

/// Parse one listing line whose 5th field is `address:port`.
///
/// Addresses that do not split into exactly two parts (IPv6 such as
/// `[::]:22`) are rejected along with non-numeric ports.
pub fn parse_port_line(line: &str) -> Option<PortRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return None;
    }

    let parts: Vec<&str> = fields[4].split(':').collect();
    let [_, port] = parts.as_slice() else {
        return None;
    };
    let number = port.parse::<u16>().ok()?;

    Some(PortRecord {
        number,
        protocol: protocol_from_token(fields[0]),
        status: "open".to_string(),
        service: service_for_port(number).to_string(),
    })
}

/// Parse a whole listing; the first line is the column header.
pub fn parse_port_listing(output: &str) -> Vec<PortRecord> {
    output.lines().skip(1).filter_map(parse_port_line).collect()
}
