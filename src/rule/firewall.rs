use std::{collections::BTreeSet, fmt, iter::Peekable, vec::IntoIter};

use serde::Serialize;

use super::predicate::{AddrMatch, PortMatch, ProtocolMatch, Relation};
use crate::error::ParseError;

const DEFAULT_TABLE: &str = "filter";

/// Address family, taken from the command token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FirewallFamily {
    Ipv4,
    Ipv6,
}

impl FirewallFamily {
    fn from_command(command: &str) -> Option<Self> {
        match command {
            "iptables" => Some(FirewallFamily::Ipv4),
            "ip6tables" => Some(FirewallFamily::Ipv6),
            _ => None,
        }
    }
}

/// Terminal or non-terminal target of an iptables rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FirewallAction {
    Accept,
    Drop,
    Reject,
    Log,
    Return,
}

impl FirewallAction {
    pub const ALL: [FirewallAction; 5] = [
        FirewallAction::Accept,
        FirewallAction::Drop,
        FirewallAction::Reject,
        FirewallAction::Log,
        FirewallAction::Return,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FirewallAction::Accept => "ACCEPT",
            FirewallAction::Drop => "DROP",
            FirewallAction::Reject => "REJECT",
            FirewallAction::Log => "LOG",
            FirewallAction::Return => "RETURN",
        }
    }

    fn from_target(target: &str) -> Result<Self, ParseError> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == target)
            .ok_or_else(|| ParseError::InvalidAction {
                action: target.to_string(),
                expected: Self::ALL.map(|a| a.as_str()).join(", "),
            })
    }

    /// Whether matching traffic stops being evaluated by later rules of the chain.
    /// `RETURN` leaves the chain, so it counts.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FirewallAction::Log)
    }

    /// Whether one action lets traffic through and the other drops it silently.
    pub fn is_accept_drop_pair(&self, other: &FirewallAction) -> bool {
        matches!(
            (self, other),
            (FirewallAction::Accept, FirewallAction::Drop)
                | (FirewallAction::Drop, FirewallAction::Accept)
        )
    }
}

impl fmt::Display for FirewallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A match flag that is not modelled as a dedicated dimension (`-m state`,
/// `-i eth0`, a negated `! -s ...`). Treated as an extra restriction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MatchOption {
    pub flag: String,
    pub value: String,
}

/// Traffic selector of a firewall rule
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FirewallPredicate {
    pub source: AddrMatch,
    pub destination: AddrMatch,
    pub protocol: ProtocolMatch,
    pub source_port: PortMatch,
    pub dest_port: PortMatch,
    pub extra: BTreeSet<MatchOption>,
}

impl FirewallPredicate {
    /// Relation of the traffic matched by `self` to the traffic matched by `other`.
    pub fn relation(&self, other: &FirewallPredicate) -> Relation {
        self.source
            .relation(&other.source)
            .combine(self.destination.relation(&other.destination))
            .combine(self.protocol.relation(&other.protocol))
            .combine(self.source_port.relation(&other.source_port))
            .combine(self.dest_port.relation(&other.dest_port))
            .combine(Relation::of_constraints(&self.extra, &other.extra))
    }
}

impl fmt::Display for FirewallPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} -> {}:{}",
            self.protocol, self.source, self.source_port, self.destination, self.dest_port
        )?;
        for option in &self.extra {
            write!(f, " [{} {}]", option.flag, option.value)?;
        }
        Ok(())
    }
}

/// Parsed iptables rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    pub family: FirewallFamily,
    pub table: String,
    pub chain: String,
    pub predicate: FirewallPredicate,
    pub action: FirewallAction,
    /// Options following the jump target, e.g. `--reject-with`
    pub target_options: Vec<MatchOption>,
}

impl FirewallRule {
    /// Whether two rules are evaluated in the same chain of the same table.
    /// IPv4 and IPv6 rule sets never see the same packet.
    pub fn shares_chain(&self, other: &FirewallRule) -> bool {
        self.family == other.family && self.table == other.table && self.chain == other.chain
    }
}

/// Parse an iptables command line into a structured rule
///
/// The content must start with the `iptables` (or `ip6tables`) command token,
/// carry exactly one insertion flag (`-A`/`-I`) and exactly one jump flag (`-j`).
///
/// # Examples
/// ```
/// use ruleward::rule::firewall::{parse_firewall_rule, FirewallAction};
///
/// let rule = parse_firewall_rule("iptables -A INPUT -p tcp --dport 22 -j DROP").unwrap();
/// assert_eq!(rule.chain, "INPUT");
/// assert_eq!(rule.action, FirewallAction::Drop);
/// ```
pub fn parse_firewall_rule(content: &str) -> Result<FirewallRule, ParseError> {
    let tokens = shlex::split(content).ok_or_else(|| ParseError::malformed("unbalanced quotes"))?;
    let mut tokens = tokens.into_iter().peekable();

    let family = match tokens.next() {
        Some(command) => FirewallFamily::from_command(&command).ok_or_else(|| {
            ParseError::malformed(format!("expected iptables command, found '{command}'"))
        })?,
        None => return Err(ParseError::malformed("empty rule")),
    };

    let mut table = DEFAULT_TABLE.to_string();
    let mut chain: Option<String> = None;
    let mut action: Option<FirewallAction> = None;
    let mut predicate = FirewallPredicate::default();
    let mut target_options = Vec::new();
    let mut negate = false;

    while let Some(token) = tokens.next() {
        if token == "!" {
            if negate {
                return Err(ParseError::malformed("double negation"));
            }
            negate = true;
            continue;
        }

        match (token.as_str(), negate) {
            ("-t" | "--table", false) => table = take_value(&mut tokens, &token)?,
            ("-A" | "--append" | "-I" | "--insert", false) => {
                if chain.is_some() {
                    return Err(ParseError::malformed("multiple insertion flags"));
                }
                chain = Some(take_value(&mut tokens, &token)?);
                if matches!(token.as_str(), "-I" | "--insert") {
                    // optional rule number
                    tokens.next_if(|t| t.chars().all(|c| c.is_ascii_digit()));
                }
            }
            ("-j" | "--jump", false) => {
                if action.is_some() {
                    return Err(ParseError::malformed("multiple jump flags"));
                }
                let target = take_value(&mut tokens, &token)?;
                action = Some(FirewallAction::from_target(&target)?);
            }
            ("-s" | "--source" | "--src", false) => {
                predicate.source = AddrMatch::parse(&take_value(&mut tokens, &token)?)?;
            }
            ("-d" | "--destination" | "--dst", false) => {
                predicate.destination = AddrMatch::parse(&take_value(&mut tokens, &token)?)?;
            }
            ("-p" | "--protocol", false) => {
                predicate.protocol = ProtocolMatch::parse(&take_value(&mut tokens, &token)?);
            }
            ("--sport" | "--source-port", false) => {
                predicate.source_port = PortMatch::parse(&take_value(&mut tokens, &token)?)?;
            }
            ("--dport" | "--destination-port", false) => {
                predicate.dest_port = PortMatch::parse(&take_value(&mut tokens, &token)?)?;
            }
            (flag, negated) if flag.starts_with('-') => {
                let value = tokens
                    .next_if(|t| !t.starts_with('-') && t != "!")
                    .unwrap_or_default();
                let flag = canonical_flag(flag);
                let option = MatchOption {
                    flag: if negated { format!("! {flag}") } else { flag.to_string() },
                    value,
                };
                if action.is_some() && !negated {
                    target_options.push(option);
                } else {
                    predicate.extra.insert(option);
                }
            }
            (other, _) => {
                return Err(ParseError::malformed(format!("unexpected token '{other}'")));
            }
        }
        negate = false;
    }

    if negate {
        return Err(ParseError::malformed("dangling negation"));
    }
    let chain = chain
        .ok_or_else(|| ParseError::malformed("missing insertion flag (-A/--append or -I/--insert)"))?;
    let action = action.ok_or_else(|| ParseError::malformed("missing jump flag (-j/--jump)"))?;

    Ok(FirewallRule {
        family,
        table,
        chain,
        predicate,
        action,
        target_options,
    })
}

fn take_value(tokens: &mut Peekable<IntoIter<String>>, flag: &str) -> Result<String, ParseError> {
    tokens
        .next_if(|t| !t.starts_with('-') && t != "!")
        .ok_or_else(|| ParseError::malformed(format!("flag {flag} requires a value")))
}

fn canonical_flag(flag: &str) -> &str {
    match flag {
        "--match" => "-m",
        "--in-interface" => "-i",
        "--out-interface" => "-o",
        "--fragment" => "-f",
        other => other,
    }
}
