//! Numbered firewall rule listing (`ufw status numbered`)

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::FirewallRule;

static RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[\s*(\d+)\]\s*(.+)$").expect("rule pattern is valid"));

/// Parse `[<index>] <action> <fields...>`.
///
/// `from`, `port` and `proto` each consume the token after them; anything
/// else is skipped. Fewer than 3 tokens after the index is rejected.
pub fn parse_firewall_line(line: &str) -> Option<FirewallRule> {
    let caps = RULE_RE.captures(line.trim())?;
    let id = caps[1].parse::<u32>().ok()?;

    let fields: Vec<&str> = caps[2].split_whitespace().collect();
    if fields.len() < 3 {
        return None;
    }

    let mut rule = FirewallRule {
        id,
        action: fields[0].to_string(),
        protocol: "any".to_string(),
        port: 0,
        source: String::new(),
        enabled: true,
    };

    let mut tokens = fields[1..].iter();
    while let Some(token) = tokens.next() {
        match *token {
            "from" => {
                if let Some(value) = tokens.next() {
                    rule.source = value.to_string();
                }
            }
            "port" => {
                if let Some(value) = tokens.next() {
                    rule.port = value.parse().unwrap_or(0);
                }
            }
            "proto" => {
                if let Some(value) = tokens.next() {
                    rule.protocol = value.to_string();
                }
            }
            _ => {}
        }
    }

    Some(rule)
}

/// Parse a whole rule listing; status/header lines fall out as non-matches.
pub fn parse_firewall_rules(output: &str) -> Vec<FirewallRule> {
    output.lines().filter_map(parse_firewall_line).collect()
}
