//! Match dimensions shared by firewall predicates and the relation algebra
//! used to compare them.

use std::{
    collections::BTreeSet,
    fmt,
    net::IpAddr,
};

use ipnetwork::IpNetwork;
use serde::Serialize;

use crate::error::ParseError;

/// How the traffic matched by one predicate relates to the traffic matched by another.
///
/// Always read as "left compared to right": `Subset` means the left side matches
/// strictly less traffic than the right side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Equal,
    Subset,
    Superset,
    /// Partial or undecidable overlap
    Overlap,
    Disjoint,
}

impl Relation {
    /// Combine the relations of two independent dimensions of the same predicate.
    pub fn combine(self, other: Relation) -> Relation {
        match (self, other) {
            (Relation::Disjoint, _) | (_, Relation::Disjoint) => Relation::Disjoint,
            (Relation::Equal, r) | (r, Relation::Equal) => r,
            (Relation::Subset, Relation::Subset) => Relation::Subset,
            (Relation::Superset, Relation::Superset) => Relation::Superset,
            _ => Relation::Overlap,
        }
    }

    /// Relation between two sets of additional constraints. More constraints
    /// means less traffic, so the inclusion direction flips.
    pub fn of_constraints<T: Ord>(left: &BTreeSet<T>, right: &BTreeSet<T>) -> Relation {
        if left == right {
            Relation::Equal
        } else if left.is_superset(right) {
            Relation::Subset
        } else if left.is_subset(right) {
            Relation::Superset
        } else {
            Relation::Overlap
        }
    }
}

/// Source or destination address match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AddrMatch {
    #[default]
    Any,
    Network(IpNetwork),
    /// Host name or address list kept verbatim; only comparable for equality.
    Host(String),
}

impl AddrMatch {
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ParseError::malformed("empty address"));
        }
        if value.eq_ignore_ascii_case("any") {
            return Ok(AddrMatch::Any);
        }

        let network = if let Some((addr, prefix)) = value.split_once('/') {
            match addr.parse::<IpAddr>() {
                Ok(addr) => {
                    let prefix = prefix_len(addr, prefix).ok_or_else(|| {
                        ParseError::malformed(format!("invalid prefix length in '{value}'"))
                    })?;
                    Some(
                        IpNetwork::new(addr, prefix).map_err(|e| {
                            ParseError::malformed(format!("invalid network '{value}': {e}"))
                        })?,
                    )
                }
                Err(_) => None,
            }
        } else {
            value.parse::<IpAddr>().ok().map(IpNetwork::from)
        };

        match network {
            Some(net) if net.prefix() == 0 => Ok(AddrMatch::Any),
            Some(net) => {
                let normalized = IpNetwork::new(net.network(), net.prefix())
                    .map_err(|e| ParseError::malformed(format!("invalid network '{value}': {e}")))?;
                Ok(AddrMatch::Network(normalized))
            }
            None => Ok(AddrMatch::Host(value.to_ascii_lowercase())),
        }
    }

    pub fn relation(&self, other: &AddrMatch) -> Relation {
        match (self, other) {
            (AddrMatch::Any, AddrMatch::Any) => Relation::Equal,
            (AddrMatch::Any, _) => Relation::Superset,
            (_, AddrMatch::Any) => Relation::Subset,
            (AddrMatch::Network(a), AddrMatch::Network(b)) => network_relation(a, b),
            (AddrMatch::Host(a), AddrMatch::Host(b)) if a == b => Relation::Equal,
            _ => Relation::Overlap,
        }
    }
}

impl fmt::Display for AddrMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddrMatch::Any => f.write_str("any"),
            AddrMatch::Network(net) => write!(f, "{}/{}", net.network(), net.prefix()),
            AddrMatch::Host(host) => f.write_str(host),
        }
    }
}

/// Prefix length given either as a number or as a dotted mask (`255.0.0.0`)
fn prefix_len(addr: IpAddr, prefix: &str) -> Option<u8> {
    if let Ok(len) = prefix.parse::<u8>() {
        return Some(len);
    }
    match (addr, prefix.parse::<IpAddr>().ok()?) {
        (IpAddr::V4(_), IpAddr::V4(mask)) => ipnetwork::ipv4_mask_to_prefix(mask).ok(),
        (IpAddr::V6(_), IpAddr::V6(mask)) => ipnetwork::ipv6_mask_to_prefix(mask).ok(),
        _ => None,
    }
}

fn network_relation(a: &IpNetwork, b: &IpNetwork) -> Relation {
    if a.is_ipv4() != b.is_ipv4() {
        return Relation::Disjoint;
    }
    if a.prefix() == b.prefix() {
        if a.network() == b.network() {
            Relation::Equal
        } else {
            Relation::Disjoint
        }
    } else if a.prefix() > b.prefix() && b.contains(a.network()) {
        Relation::Subset
    } else if b.prefix() > a.prefix() && a.contains(b.network()) {
        Relation::Superset
    } else {
        // CIDR blocks are either nested or disjoint
        Relation::Disjoint
    }
}

/// Protocol match, `Any` when the rule does not restrict it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProtocolMatch {
    #[default]
    Any,
    Named(String),
}

impl ProtocolMatch {
    pub fn parse(value: &str) -> Self {
        let lowered = value.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "all" | "0" | "" => ProtocolMatch::Any,
            "1" => ProtocolMatch::Named("icmp".to_string()),
            "6" => ProtocolMatch::Named("tcp".to_string()),
            "17" => ProtocolMatch::Named("udp".to_string()),
            _ => ProtocolMatch::Named(lowered),
        }
    }

    pub fn relation(&self, other: &ProtocolMatch) -> Relation {
        match (self, other) {
            (ProtocolMatch::Any, ProtocolMatch::Any) => Relation::Equal,
            (ProtocolMatch::Any, _) => Relation::Superset,
            (_, ProtocolMatch::Any) => Relation::Subset,
            (ProtocolMatch::Named(a), ProtocolMatch::Named(b)) if a == b => Relation::Equal,
            _ => Relation::Disjoint,
        }
    }
}

impl fmt::Display for ProtocolMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolMatch::Any => f.write_str("all"),
            ProtocolMatch::Named(name) => f.write_str(name),
        }
    }
}

/// Inclusive port range, `Any` when the rule does not restrict it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortMatch {
    #[default]
    Any,
    Range { start: u16, end: u16 },
}

impl PortMatch {
    /// Parse `80`, `1000:2000`, `:1024` or `1024:`.
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let value = value.trim();
        let parse_port = |s: &str, default: u16| -> Result<u16, ParseError> {
            if s.is_empty() {
                return Ok(default);
            }
            s.parse::<u16>()
                .map_err(|_| ParseError::malformed(format!("invalid port '{s}'")))
        };

        let (start, end) = match value.split_once(':') {
            Some((start, end)) => (parse_port(start, 0)?, parse_port(end, u16::MAX)?),
            None => {
                let port = parse_port(value, 0)?;
                if value.is_empty() {
                    return Err(ParseError::malformed("empty port"));
                }
                (port, port)
            }
        };

        if start > end {
            return Err(ParseError::malformed(format!(
                "port range '{value}' is reversed"
            )));
        }
        if start == 0 && end == u16::MAX {
            return Ok(PortMatch::Any);
        }
        Ok(PortMatch::Range { start, end })
    }

    fn bounds(&self) -> (u16, u16) {
        match self {
            PortMatch::Any => (0, u16::MAX),
            PortMatch::Range { start, end } => (*start, *end),
        }
    }

    pub fn relation(&self, other: &PortMatch) -> Relation {
        let (a_start, a_end) = self.bounds();
        let (b_start, b_end) = other.bounds();
        if a_start == b_start && a_end == b_end {
            Relation::Equal
        } else if a_end < b_start || b_end < a_start {
            Relation::Disjoint
        } else if a_start >= b_start && a_end <= b_end {
            Relation::Subset
        } else if b_start >= a_start && b_end <= a_end {
            Relation::Superset
        } else {
            Relation::Overlap
        }
    }
}

impl fmt::Display for PortMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortMatch::Any => f.write_str("any"),
            PortMatch::Range { start, end } if start == end => write!(f, "{start}"),
            PortMatch::Range { start, end } => write!(f, "{start}:{end}"),
        }
    }
}
