//! Relay counter name grammar: `{category}>>>{key}>>>traffic>>>{direction}`.

use ledger_store::Traffic;

const SEPARATOR: &str = ">>>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterCategory {
    /// Per-credential counter; the key is the credential's correlation key.
    User,
    /// Aggregate counter for a whole inbound; the key is the inbound tag.
    Inbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Uplink,
    Downlink,
}

impl Direction {
    /// A traffic value carrying `bytes` in this direction only.
    pub fn traffic(self, bytes: u64) -> Traffic {
        match self {
            Direction::Uplink => Traffic::new(bytes, 0),
            Direction::Downlink => Traffic::new(0, bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterName<'a> {
    pub category: CounterCategory,
    pub key: &'a str,
    pub direction: Direction,
}

/// Parse a counter name. Anything that is not exactly
/// `user|inbound >>> key >>> traffic >>> uplink|downlink` with a non-empty
/// key yields `None`.
pub fn parse_counter_name(name: &str) -> Option<CounterName<'_>> {
    let mut parts = name.split(SEPARATOR);

    let category = match parts.next()? {
        "user" => CounterCategory::User,
        "inbound" => CounterCategory::Inbound,
        _ => return None,
    };
    let key = parts.next().filter(|k| !k.is_empty())?;
    if parts.next()? != "traffic" {
        return None;
    }
    let direction = match parts.next()? {
        "uplink" => Direction::Uplink,
        "downlink" => Direction::Downlink,
        _ => return None,
    };
    if parts.next().is_some() {
        return None;
    }

    Some(CounterName {
        category,
        key,
        direction,
    })
}
