//! Kubernetes label selectors
//!
//! Parses the selector syntax accepted by `kubectl -l` and matches it against
//! resource labels. Requirements are comma separated and all must hold:
//!
//! - `key=value`, `key==value`, `key!=value`
//! - `key in (a, b)`, `key notin (a, b)`
//! - `key` (label present), `!key` (label absent)
//!
//! `!=` and `notin` also match resources that do not carry the label.

use std::collections::BTreeMap;
use std::str::FromStr;

/// Operator of a single selector requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOperator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// One comma separated term of a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: String,
    pub operator: SelectorOperator,
    pub values: Vec<String>,
}

impl Requirement {
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            SelectorOperator::Equals | SelectorOperator::In => {
                value.is_some_and(|v| self.values.contains(v))
            }
            SelectorOperator::NotEquals | SelectorOperator::NotIn => {
                value.is_none_or(|v| !self.values.contains(v))
            }
            SelectorOperator::Exists => value.is_some(),
            SelectorOperator::DoesNotExist => value.is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty requirement in label selector")]
    EmptyRequirement,

    #[error("unbalanced parentheses in label selector")]
    Unbalanced,

    #[error("invalid label key {0:?}")]
    InvalidKey(String),

    #[error("invalid requirement {0:?}")]
    InvalidRequirement(String),

    #[error("set requirement on {0:?} has no values")]
    MissingValues(String),
}

/// A parsed label selector. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|req| req.matches(labels))
    }
}

impl FromStr for LabelSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        let requirements = split_terms(s)?
            .into_iter()
            .map(parse_requirement)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { requirements })
    }
}

/// Split on commas that are not inside a value list
fn split_terms(s: &str) -> Result<Vec<&str>, SelectorError> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or(SelectorError::Unbalanced)?,
            ',' if depth == 0 => {
                terms.push(&s[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(SelectorError::Unbalanced);
    }
    terms.push(&s[start..]);
    Ok(terms)
}

fn parse_requirement(term: &str) -> Result<Requirement, SelectorError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(SelectorError::EmptyRequirement);
    }

    if let Some(open) = term.find('(') {
        return parse_set_requirement(term, open);
    }

    if let Some(key) = term.strip_prefix('!') {
        return Ok(Requirement {
            key: label_key(key.trim())?,
            operator: SelectorOperator::DoesNotExist,
            values: Vec::new(),
        });
    }

    for (token, operator) in [
        ("!=", SelectorOperator::NotEquals),
        ("==", SelectorOperator::Equals),
        ("=", SelectorOperator::Equals),
    ] {
        if let Some((key, value)) = term.split_once(token) {
            return Ok(Requirement {
                key: label_key(key.trim())?,
                operator,
                values: vec![value.trim().to_string()],
            });
        }
    }

    Ok(Requirement {
        key: label_key(term)?,
        operator: SelectorOperator::Exists,
        values: Vec::new(),
    })
}

fn parse_set_requirement(term: &str, open: usize) -> Result<Requirement, SelectorError> {
    let values = term[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| SelectorError::InvalidRequirement(term.to_string()))?;

    let mut head = term[..open].split_whitespace();
    let (key, operator) = match (head.next(), head.next(), head.next()) {
        (Some(key), Some("in"), None) => (key, SelectorOperator::In),
        (Some(key), Some("notin"), None) => (key, SelectorOperator::NotIn),
        _ => return Err(SelectorError::InvalidRequirement(term.to_string())),
    };

    let values: Vec<String> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    if values.is_empty() {
        return Err(SelectorError::MissingValues(key.to_string()));
    }

    Ok(Requirement {
        key: label_key(key)?,
        operator,
        values,
    })
}

fn label_key(key: &str) -> Result<String, SelectorError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));
    if valid {
        Ok(key.to_string())
    } else {
        Err(SelectorError::InvalidKey(key.to_string()))
    }
}
