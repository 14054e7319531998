use std::{collections::BTreeSet, fmt};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::ParseError;

/// `action protocol src_addr src_port -> dst_addr dst_port (options)`
static RULE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(->|<>)\s+(\S+)\s+(\S+)\s*\((.*)\)\s*$")
        .expect("IDS header pattern is valid")
});

const ACTIONS: [&str; 7] = [
    "alert",
    "pass",
    "drop",
    "reject",
    "rejectsrc",
    "rejectdst",
    "rejectboth",
];

/// Generator id of rules that do not set `gid`
pub const DEFAULT_GID: u32 = 1;

/// Keywords that describe a signature rather than what it matches.
const METADATA_KEYWORDS: [&str; 9] = [
    "msg",
    "sid",
    "rev",
    "gid",
    "classtype",
    "reference",
    "metadata",
    "priority",
    "target",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IdsOption {
    pub keyword: String,
    pub value: Option<String>,
}

impl IdsOption {
    pub fn is_metadata(&self) -> bool {
        METADATA_KEYWORDS.contains(&self.keyword.as_str())
    }
}

impl fmt::Display for IdsOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}:{}", self.keyword, value),
            None => f.write_str(&self.keyword),
        }
    }
}

/// Parsed Suricata-style signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdsRule {
    pub action: String,
    pub protocol: String,
    pub src_addr: String,
    pub src_port: String,
    pub bidirectional: bool,
    pub dst_addr: String,
    pub dst_port: String,
    pub gid: u32,
    pub sid: u32,
    pub options: Vec<IdsOption>,
}

impl IdsRule {
    /// Options that constrain which traffic matches, in a comparable form.
    pub fn detection_options(&self) -> BTreeSet<&IdsOption> {
        self.options.iter().filter(|o| !o.is_metadata()).collect()
    }

    /// Whether both signatures claim the same `(gid, sid)` identity.
    pub fn same_signature_id(&self, other: &IdsRule) -> bool {
        self.gid == other.gid && self.sid == other.sid
    }

    /// Whether both signatures inspect the same flow header.
    pub fn shares_header(&self, other: &IdsRule) -> bool {
        self.protocol == other.protocol
            && self.src_addr == other.src_addr
            && self.dst_addr == other.dst_addr
    }

    pub fn message(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.keyword == "msg")
            .and_then(|o| o.value.as_deref())
    }
}

/// Parse a Suricata-style signature
///
/// # Examples
/// ```
/// use ruleward::rule::ids::parse_ids_rule;
///
/// let rule = parse_ids_rule(
///     r#"alert tcp any any -> $HOME_NET 22 (msg:"SSH probe"; flags:S; sid:1001; rev:1;)"#,
/// ).unwrap();
/// assert_eq!(rule.sid, 1001);
/// assert_eq!(rule.message(), Some("SSH probe"));
/// ```
pub fn parse_ids_rule(content: &str) -> Result<IdsRule, ParseError> {
    let caps = RULE_HEADER.captures(content).ok_or_else(|| {
        ParseError::malformed(
            "expected 'action protocol src_addr src_port -> dst_addr dst_port (options)'",
        )
    })?;

    let action = caps[1].to_ascii_lowercase();
    if !ACTIONS.contains(&action.as_str()) {
        return Err(ParseError::InvalidAction {
            action: caps[1].to_string(),
            expected: ACTIONS.join(", "),
        });
    }

    let options = split_options(&caps[8])?;
    let sid = extract_sid(&options)?;
    let gid = extract_gid(&options)?;

    Ok(IdsRule {
        action,
        protocol: caps[2].to_ascii_lowercase(),
        src_addr: caps[3].to_string(),
        src_port: caps[4].to_string(),
        bidirectional: &caps[5] == "<>",
        dst_addr: caps[6].to_string(),
        dst_port: caps[7].to_string(),
        gid,
        sid,
        options,
    })
}

/// Split the option body on `;`, honouring quoted values and backslash escapes.
fn split_options(body: &str) -> Result<Vec<IdsOption>, ParseError> {
    let mut raw = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in body.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            ';' if !in_quotes => raw.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(ParseError::malformed("unterminated quoted option value"));
    }
    raw.push(current);

    Ok(raw
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| match s.split_once(':') {
            Some((keyword, value)) => IdsOption {
                keyword: keyword.trim().to_ascii_lowercase(),
                value: Some(unquote(value.trim()).to_string()),
            },
            None => IdsOption {
                keyword: s.to_ascii_lowercase(),
                value: None,
            },
        })
        .collect())
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn extract_sid(options: &[IdsOption]) -> Result<u32, ParseError> {
    let mut sids = options.iter().filter(|o| o.keyword == "sid");
    let sid = sids.next().ok_or_else(|| ParseError::MissingOrInvalidSid {
        reason: "no sid option".to_string(),
    })?;
    if sids.next().is_some() {
        return Err(ParseError::MissingOrInvalidSid {
            reason: "sid given more than once".to_string(),
        });
    }

    let value = sid.value.as_deref().unwrap_or("").trim();
    match value.parse::<i64>() {
        Ok(n) if n > 0 => u32::try_from(n).map_err(|_| ParseError::MissingOrInvalidSid {
            reason: format!("sid {n} out of range"),
        }),
        Ok(n) => Err(ParseError::MissingOrInvalidSid {
            reason: format!("sid must be positive, got {n}"),
        }),
        Err(_) => Err(ParseError::MissingOrInvalidSid {
            reason: format!("sid '{value}' is not an integer"),
        }),
    }
}

fn extract_gid(options: &[IdsOption]) -> Result<u32, ParseError> {
    let mut gids = options.iter().filter(|o| o.keyword == "gid");
    let Some(gid) = gids.next() else {
        return Ok(DEFAULT_GID);
    };
    if gids.next().is_some() {
        return Err(ParseError::malformed("gid given more than once"));
    }

    let value = gid.value.as_deref().unwrap_or("").trim();
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::malformed(format!("invalid gid '{value}'"))),
    }
}
