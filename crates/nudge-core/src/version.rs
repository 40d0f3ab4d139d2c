//! Package version numbers and requirement matching.
//!
//! Versions are compared the way package registries for dynamic languages
//! compare them: segment by segment, missing segments count as zero and
//! alphabetic segments mark a pre-release that sorts below any number, so
//! `5.1 == 5.1.0` and `6.0.rc1 < 6.0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VersionError;

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Num(u64),
    Pre(String),
}

impl Segment {
    fn cmp_segment(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Num(a), Segment::Num(b)) => a.cmp(b),
            (Segment::Pre(a), Segment::Pre(b)) => a.cmp(b),
            (Segment::Pre(_), Segment::Num(_)) => Ordering::Less,
            (Segment::Num(_), Segment::Pre(_)) => Ordering::Greater,
        }
    }
}

/// A dotted version number such as `5.1.1` or `7.0.0.rc2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    segments: Vec<Segment>,
}

impl Version {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let raw = input.trim();
        let valid = raw.chars().next().is_some_and(|c| c.is_ascii_digit())
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !valid {
            return Err(VersionError::InvalidVersion(input.to_string()));
        }

        // `1.0-rc1` is spelled `1.0.pre.rc1` by the registries we talk to.
        let normalized = raw.replace('-', ".pre.");
        let mut segments = Vec::new();
        let mut chars = normalized.chars().peekable();

        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                let mut digits = String::new();
                while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    digits.push(d);
                    chars.next();
                }
                let n = digits
                    .parse::<u64>()
                    .map_err(|_| VersionError::InvalidVersion(input.to_string()))?;
                segments.push(Segment::Num(n));
            } else if c.is_ascii_alphabetic() {
                let mut word = String::new();
                while let Some(&a) = chars.peek().filter(|a| a.is_ascii_alphabetic()) {
                    word.push(a);
                    chars.next();
                }
                segments.push(Segment::Pre(word));
            } else {
                chars.next();
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_prerelease(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Pre(_)))
    }

    fn numeric_prefix(&self) -> Vec<u64> {
        self.segments
            .iter()
            .map_while(|s| match s {
                Segment::Num(n) => Some(*n),
                Segment::Pre(_) => None,
            })
            .collect()
    }

    fn from_numbers(numbers: &[u64]) -> Self {
        let raw = numbers
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            raw,
            segments: numbers.iter().copied().map(Segment::Num).collect(),
        }
    }

    /// The version with any pre-release part removed.
    pub fn release(&self) -> Self {
        if self.is_prerelease() {
            Self::from_numbers(&self.numeric_prefix())
        } else {
            self.clone()
        }
    }

    /// Upper bound of a pessimistic constraint: `5.1.2 -> 5.2`, `5.1 -> 6`.
    pub fn bump(&self) -> Self {
        let mut numbers = self.numeric_prefix();
        if numbers.len() > 1 {
            numbers.pop();
        }
        match numbers.last_mut() {
            Some(last) => *last += 1,
            None => numbers.push(1),
        }
        Self::from_numbers(&numbers)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        let zero = Segment::Num(0);
        (0..len)
            .map(|i| {
                let lhs = self.segments.get(i).unwrap_or(&zero);
                let rhs = other.segments.get(i).unwrap_or(&zero);
                lhs.cmp_segment(rhs)
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.raw
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ---------------------------------------------------------------------------
// Requirement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Pessimistic,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Pessimistic => "~>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Constraint {
    op: Op,
    version: Version,
}

impl Constraint {
    fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        // Two-character operators first so `>=` is not read as `>`.
        let (op, rest) = [
            (">=", Op::Ge),
            ("<=", Op::Le),
            ("!=", Op::Ne),
            ("~>", Op::Pessimistic),
            (">", Op::Gt),
            ("<", Op::Lt),
            ("=", Op::Eq),
        ]
        .iter()
        .find_map(|(prefix, op)| trimmed.strip_prefix(prefix).map(|rest| (*op, rest)))
        .unwrap_or((Op::Eq, trimmed));

        let version = Version::parse(rest)
            .map_err(|_| VersionError::InvalidRequirement(input.to_string()))?;
        Ok(Self { op, version })
    }

    fn matches(&self, v: &Version) -> bool {
        let c = &self.version;
        match self.op {
            Op::Eq => v == c,
            Op::Ne => v != c,
            Op::Gt => v > c,
            Op::Ge => v >= c,
            Op::Lt => v < c,
            Op::Le => v <= c,
            Op::Pessimistic => v >= c && v.release() < c.bump(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.as_str(), self.version)
    }
}

/// A set of constraints that must all hold, e.g. `> 5.1, < 7`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    constraints: Vec<Constraint>,
}

impl Requirement {
    /// Parse one constraint per entry. No entries means `>= 0`.
    pub fn parse<S: AsRef<str>>(inputs: &[S]) -> Result<Self, VersionError> {
        let constraints = if inputs.is_empty() {
            vec![Constraint {
                op: Op::Ge,
                version: Version::from_numbers(&[0]),
            }]
        } else {
            inputs
                .iter()
                .map(|s| Constraint::parse(s.as_ref()))
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(Self { constraints })
    }

    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn req(parts: &[&str]) -> Requirement {
        Requirement::parse(parts).unwrap()
    }

    #[test]
    fn test_missing_segments_are_zero() {
        assert_eq!(v("5.1"), v("5.1.0"));
        assert!(v("5.1.1") > v("5.1"));
        assert!(v("10.0") > v("9.9.9"));
    }

    #[test]
    fn test_prerelease_sorts_below_release() {
        assert!(v("6.0.rc1") < v("6.0"));
        assert!(v("6.0.0.beta") < v("6.0.0.rc"));
        assert!(v("1.0-rc1").is_prerelease());
        assert!(v("1.0-rc1") < v("1.0"));
    }

    #[test]
    fn test_invalid_versions() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("abc").is_err());
        assert!(Version::parse("1.0 beta").is_err());
    }

    #[test]
    fn test_bump_and_release() {
        assert_eq!(v("5.1.2").bump().to_string(), "5.2");
        assert_eq!(v("5.1").bump().to_string(), "6");
        assert_eq!(v("5").bump().to_string(), "6");
        assert_eq!(v("5.1.rc1").bump().to_string(), "6");
        assert_eq!(v("5.1.0.rc1").release().to_string(), "5.1.0");
    }

    #[test]
    fn test_basic_operators() {
        assert!(req(&["> 5.1"]).is_satisfied_by(&v("5.1.1")));
        assert!(!req(&["> 5.1"]).is_satisfied_by(&v("5.1")));
        assert!(req(&[">= 5.1"]).is_satisfied_by(&v("5.1.0")));
        assert!(req(&["<5"]).is_satisfied_by(&v("4.9")));
        assert!(req(&["<= 5"]).is_satisfied_by(&v("5.0")));
        assert!(req(&["!= 1.2"]).is_satisfied_by(&v("1.3")));
        assert!(req(&["1.3.0"]).is_satisfied_by(&v("1.3")));
        assert!(!req(&["1.3.0"]).is_satisfied_by(&v("1.2.1")));
    }

    #[test]
    fn test_pessimistic_operator() {
        let minor = req(&["~> 5.1"]);
        assert!(minor.is_satisfied_by(&v("5.1")));
        assert!(minor.is_satisfied_by(&v("5.9.3")));
        assert!(!minor.is_satisfied_by(&v("6.0")));
        assert!(!minor.is_satisfied_by(&v("5.0.9")));

        let patch = req(&["~> 5.1.2"]);
        assert!(patch.is_satisfied_by(&v("5.1.9")));
        assert!(!patch.is_satisfied_by(&v("5.2.0")));
    }

    #[test]
    fn test_all_constraints_must_hold() {
        let range = req(&["> 5.1", "< 7"]);
        assert!(range.is_satisfied_by(&v("6.1")));
        assert!(!range.is_satisfied_by(&v("7.0")));
        assert_eq!(range.to_string(), "> 5.1, < 7");
    }

    #[test]
    fn test_empty_requirement_matches_anything() {
        let any = Requirement::parse::<&str>(&[]).unwrap();
        assert!(any.is_satisfied_by(&v("0.0.1")));
        assert_eq!(any.to_string(), ">= 0");
    }

    #[test]
    fn test_invalid_requirement() {
        assert_eq!(
            Requirement::parse(&["~~ 1"]),
            Err(VersionError::InvalidRequirement("~~ 1".to_string()))
        );
    }
}
