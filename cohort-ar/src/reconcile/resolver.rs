//! Identity resolution
//!
//! Maps report rows to roster members in three tiers, first success wins:
//!
//! 1. **Email**: case-insensitive exact match
//! 2. **Name**: normalized name equal to the member's, or equal once
//!    whitespace is removed from either side
//! 3. **Token subset**: one name's tokens contained in the other's with
//!    enough tokens in common (`"Aditi Nayak"` vs `"Aditi H Nayak"`)
//!
//! A member answers to its display name and, when known, its username;
//! the name tiers succeed if either form does.
//! Members are always tried in roster order. Within a tier there is no
//! scoring; [`AmbiguityPolicy`] decides what happens when several members
//! satisfy the token-subset tier.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::types::{ReportRow, RosterMember};

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)").expect("parenthetical pattern"));

/// Minimum Jaro-Winkler similarity for an unmatched-name suggestion
pub const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Tier that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Email,
    Name,
    TokenSubset,
}

/// Handling of a row that satisfies the token-subset tier for several members
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Take the first candidate in roster order
    #[default]
    FirstInOrder,
    /// Leave the row unmatched and report it for manual review
    Report,
}

/// Tunable fuzzy-matching thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Shared tokens required by the token-subset tier
    pub min_common_tokens: usize,
    /// Accept two single-token names that are identical
    pub allow_single_token_exact: bool,
    pub ambiguity: AmbiguityPolicy,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            min_common_tokens: 2,
            allow_single_token_exact: true,
            ambiguity: AmbiguityPolicy::FirstInOrder,
        }
    }
}

impl MatchPolicy {
    /// Token-subset predicate
    pub fn tokens_match(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
        if !(a.is_subset(b) || b.is_subset(a)) {
            return false;
        }
        let common = a.intersection(b).count();
        common >= self.min_common_tokens
            || (self.allow_single_token_exact && a.len() == 1 && b.len() == 1 && common == 1)
    }
}

/// Outcome of resolving one report row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched { member_index: usize, tier: MatchTier },
    Ambiguous { candidate_ids: Vec<i64> },
    Unmatched,
}

/// Closest roster name for an unmatched row; never used for matching
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub report_name: String,
    pub member_id: i64,
    pub display_name: String,
    pub similarity: f64,
}

/// Strip parenthetical groups, trim, lowercase and collapse whitespace
///
/// ```
/// use cohort_ar::reconcile::resolver::normalize_name;
///
/// assert_eq!(normalize_name("  Aditi  H Nayak (Guest) "), "aditi h nayak");
/// ```
pub fn normalize_name(raw: &str) -> String {
    PARENTHETICAL
        .replace_all(raw, "")
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn tokens(normalized: &str) -> BTreeSet<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    (!email.is_empty()).then_some(email)
}

struct NameForm {
    name: String,
    compact: String,
    tokens: BTreeSet<String>,
}

impl NameForm {
    fn new(raw: &str) -> Option<Self> {
        let name = normalize_name(raw);
        if name.is_empty() {
            return None;
        }
        Some(Self {
            compact: name.replace(' ', ""),
            tokens: tokens(&name),
            name,
        })
    }
}

struct PreparedMember {
    email: Option<String>,
    /// Display name first, then the username if it differs
    forms: Vec<NameForm>,
}

impl PreparedMember {
    fn new(member: &RosterMember) -> Self {
        let mut forms: Vec<NameForm> = NameForm::new(&member.display_name).into_iter().collect();
        if let Some(username) = member.username.as_deref().and_then(NameForm::new) {
            if forms.iter().all(|form| form.name != username.name) {
                forms.push(username);
            }
        }
        Self {
            email: member.email.as_deref().and_then(normalize_email),
            forms,
        }
    }
}

/// Resolver over a fixed roster; member names are normalized once
pub struct IdentityResolver<'a> {
    roster: &'a [RosterMember],
    members: Vec<PreparedMember>,
    policy: MatchPolicy,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(roster: &'a [RosterMember], policy: MatchPolicy) -> Self {
        let members = roster.iter().map(PreparedMember::new).collect();

        Self {
            roster,
            members,
            policy,
        }
    }

    pub fn roster(&self) -> &'a [RosterMember] {
        self.roster
    }

    /// Resolve one row against the roster
    pub fn resolve(&self, row: &ReportRow) -> Resolution {
        if let Some(email) = row.email.as_deref().and_then(normalize_email) {
            if let Some(index) = self
                .members
                .iter()
                .position(|m| m.email.as_deref() == Some(email.as_str()))
            {
                return Resolution::Matched {
                    member_index: index,
                    tier: MatchTier::Email,
                };
            }
        }

        let name = normalize_name(&row.name);
        if name.is_empty() {
            return Resolution::Unmatched;
        }
        let compact = name.replace(' ', "");

        if let Some(index) = self
            .members
            .iter()
            .position(|m| {
                m.forms
                    .iter()
                    .any(|f| f.name == name || f.name == compact || f.compact == name)
            })
        {
            return Resolution::Matched {
                member_index: index,
                tier: MatchTier::Name,
            };
        }

        let row_tokens = tokens(&name);
        let candidates: Vec<usize> = self
            .members
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                m.forms
                    .iter()
                    .any(|f| self.policy.tokens_match(&row_tokens, &f.tokens))
            })
            .map(|(index, _)| index)
            .collect();

        match (candidates.as_slice(), self.policy.ambiguity) {
            ([], _) => Resolution::Unmatched,
            ([index], _) | ([index, ..], AmbiguityPolicy::FirstInOrder) => Resolution::Matched {
                member_index: *index,
                tier: MatchTier::TokenSubset,
            },
            (indices, AmbiguityPolicy::Report) => Resolution::Ambiguous {
                candidate_ids: indices.iter().map(|&i| self.roster[i].id).collect(),
            },
        }
    }

    /// Most similar roster name for a row no tier matched
    pub fn suggest(&self, row: &ReportRow) -> Option<Suggestion> {
        let name = normalize_name(&row.name);
        if name.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (index, member) in self.members.iter().enumerate() {
            for form in &member.forms {
                let similarity = strsim::jaro_winkler(&name, &form.name);
                if best.map_or(true, |(_, top)| similarity > top) {
                    best = Some((index, similarity));
                }
            }
        }

        let (index, similarity) = best.filter(|(_, s)| *s >= SUGGESTION_THRESHOLD)?;
        let member = &self.roster[index];
        Some(Suggestion {
            report_name: row.name.clone(),
            member_id: member.id,
            display_name: member.display_name.clone(),
            similarity,
        })
    }
}
