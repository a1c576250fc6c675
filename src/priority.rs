use std::cmp::Reverse;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::SubjectDemand;

/// How two subject names are compared.
///
/// `Exact` compares trimmed names case-insensitively. `Substring` treats the
/// names as equal when either contains the other, which lets "Math" match
/// "Mathematics" but also lets "Chemistry" match "Organic Chemistry".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    #[default]
    Exact,
    Substring,
}

impl NameMatch {
    pub fn matches(self, a: &str, b: &str) -> bool {
        let a = a.trim().to_lowercase();
        let b = b.trim().to_lowercase();
        match self {
            NameMatch::Exact => a == b,
            NameMatch::Substring => {
                !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
            }
        }
    }
}

impl FromStr for NameMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(NameMatch::Exact),
            "substring" => Ok(NameMatch::Substring),
            other => Err(format!("unknown name match policy: {other}")),
        }
    }
}

pub fn is_weak(name: &str, weak_subjects: &[String], matching: NameMatch) -> bool {
    weak_subjects.iter().any(|w| matching.matches(name, w))
}

// Order subjects for placement.
//
// Sorting rules:
// 1) Weak subjects first
// 2) More hours first
// Ties keep input order (stable sort).
pub fn prioritize(
    subjects: &[SubjectDemand],
    weak_subjects: &[String],
    matching: NameMatch,
) -> Vec<SubjectDemand> {
    let mut ordered = subjects.to_vec();
    ordered.sort_by_key(|s| {
        let rank = if is_weak(&s.name, weak_subjects, matching) { 1 } else { 2 };
        (rank, Reverse(s.hours))
    });
    ordered
}
