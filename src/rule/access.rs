use serde::Serialize;

use crate::error::ParseError;

/// Shortest content accepted for an access-control rule
pub const MIN_CONTENT_LEN: usize = 10;

/// Access-control rule. This family has no structural grammar, only a
/// length check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessControlRule {
    pub body: String,
    pub raw_validated: bool,
}

pub fn parse_access_control_rule(content: &str) -> Result<AccessControlRule, ParseError> {
    let body = content.trim();
    let len = body.chars().count();
    if len < MIN_CONTENT_LEN {
        return Err(ParseError::TooShort {
            len,
            min: MIN_CONTENT_LEN,
        });
    }
    Ok(AccessControlRule {
        body: body.to_string(),
        raw_validated: true,
    })
}
