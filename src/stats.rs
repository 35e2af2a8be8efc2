//! Derived dashboard statistics.
//!
//! Pure computation over a candidate record set and the service metrics
//! object: no I/O, no logging, recomputed from scratch on every refresh.

use std::collections::HashMap;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::api::{Candidate, Metrics};

/// Number of entries in the skill frequency ranking.
pub const TOP_SKILL_COUNT: usize = 5;

/// One skill with its occurrence count across all candidates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkillFrequency {
    pub skill: String,
    pub count: usize,
}

/// Summary figures displayed on the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_candidates: usize,
    /// Candidates created strictly within the trailing 7 days.
    pub candidates_this_week: usize,
    /// Candidates created strictly within the trailing 30 days.
    pub candidates_this_month: usize,
    /// Integer-rounded mean skill count per candidate; 0 for an empty set.
    pub avg_skills_per_candidate: u32,
    /// Top skills by frequency, ties broken by first-seen order.
    pub top_skills: Vec<SkillFrequency>,
    /// Candidates created within the trailing 24 hours.
    pub recent_uploads: Vec<Candidate>,
    /// Service metrics carried along unmodified.
    pub metrics: Metrics,
}

/// Derive statistics as of now. `now` is captured once so the three time
/// windows are consistent with each other within one call.
pub fn derive(candidates: &[Candidate], metrics: Metrics) -> DashboardStats {
    derive_at(candidates, metrics, OffsetDateTime::now_utc())
}

/// Derive statistics against an explicit reference instant.
pub fn derive_at(
    candidates: &[Candidate],
    metrics: Metrics,
    now: OffsetDateTime,
) -> DashboardStats {
    DashboardStats {
        total_candidates: candidates.len(),
        candidates_this_week: count_created_after(candidates, now - Duration::days(7)),
        candidates_this_month: count_created_after(candidates, now - Duration::days(30)),
        avg_skills_per_candidate: average_skill_count(candidates),
        top_skills: top_skills(candidates),
        recent_uploads: candidates
            .iter()
            .filter(|candidate| candidate.created_at > now - Duration::hours(24))
            .cloned()
            .collect(),
        metrics,
    }
}

fn count_created_after(candidates: &[Candidate], cutoff: OffsetDateTime) -> usize {
    candidates
        .iter()
        .filter(|candidate| candidate.created_at > cutoff)
        .count()
}

fn average_skill_count(candidates: &[Candidate]) -> u32 {
    if candidates.is_empty() {
        return 0;
    }
    let total: usize = candidates.iter().map(|candidate| candidate.skills.len()).sum();
    (total as f64 / candidates.len() as f64).round() as u32
}

/// Frequency ranking over all skills in all records. Grouping is by exact
/// string; ties rank by first-seen order in the input sequence.
fn top_skills(candidates: &[Candidate]) -> Vec<SkillFrequency> {
    let mut order: Vec<SkillFrequency> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for candidate in candidates {
        for skill in &candidate.skills {
            match index.get(skill.as_str()) {
                Some(&at) => order[at].count += 1,
                None => {
                    index.insert(skill.as_str(), order.len());
                    order.push(SkillFrequency {
                        skill: skill.clone(),
                        count: 1,
                    });
                }
            }
        }
    }
    // Stable sort preserves first-seen order among equal counts.
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(TOP_SKILL_COUNT);
    order
}
