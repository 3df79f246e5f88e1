use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::CodeError;

pub const CODE_PREFIX: &str = "fc";
/// Host search expression matching anything shaped like a code.
pub const CODE_PATTERN: &str = r"fc-[0-9]{3}-[0-9]{3}";
pub const GROUP_RANGE: RangeInclusive<u16> = 100..=999;
/// 900 × 900 possible codes.
pub const MAX_UNIQUE_CODES: usize = 810_000;
/// Shown while nothing is pending.
pub const PLACEHOLDER: &str = "fc-000-000";

/// A marker of the form `fc-DDD-DDD`, both groups within 100..=999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code {
    left: u16,
    right: u16,
}

impl Code {
    pub fn new(left: u16, right: u16) -> Result<Self, CodeError> {
        if !GROUP_RANGE.contains(&left) || !GROUP_RANGE.contains(&right) {
            return Err(CodeError::InvalidCode(format!(
                "{CODE_PREFIX}-{left:03}-{right:03}"
            )));
        }
        Ok(Self { left, right })
    }

    pub fn left(&self) -> u16 {
        self.left
    }

    pub fn right(&self) -> u16 {
        self.right
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CODE_PREFIX}-{}-{}", self.left, self.right)
    }
}

impl FromStr for Code {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CodeError::InvalidCode(s.to_string());
        let mut parts = s.split('-');
        let (Some(CODE_PREFIX), Some(left), Some(right), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        let group = |digits: &str| {
            if digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()) {
                digits.parse::<u16>().map_err(|_| invalid())
            } else {
                Err(invalid())
            }
        };
        Code::new(group(left)?, group(right)?).map_err(|_| invalid())
    }
}
