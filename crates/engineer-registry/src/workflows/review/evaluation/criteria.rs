use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::workflows::WorkflowError;

/// Number of evenly spaced score choices offered per criterion.
pub const SCORE_BUCKETS: usize = 5;
/// Criterion weights for one application must add up to this.
pub const REQUIRED_WEIGHT_TOTAL: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriterionId(pub String);

/// One weighted dimension of the scoring rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub label: String,
    pub weight: u16,
    pub max_score: u16,
    #[serde(default)]
    pub score: Option<u16>,
}

impl Criterion {
    /// Unscored criterion worth one point per weight percent.
    pub fn weighted(id: &str, label: &str, weight: u16) -> Self {
        Self {
            id: CriterionId(id.to_string()),
            label: label.to_string(),
            weight,
            max_score: weight,
            score: None,
        }
    }

    /// Scores a reviewer may pick: `max * k / 5` for `k` in `1..=5`, rounded.
    pub fn score_options(&self) -> [u16; SCORE_BUCKETS] {
        let mut options = [0; SCORE_BUCKETS];
        for (step, option) in options.iter_mut().enumerate() {
            let fraction = (step + 1) as f64 / SCORE_BUCKETS as f64;
            *option = (f64::from(self.max_score) * fraction).round() as u16;
        }
        options
    }
}

/// Ordered criteria whose weights are known to total [`REQUIRED_WEIGHT_TOTAL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Criterion>", into = "Vec<Criterion>")]
pub struct Criteria(Vec<Criterion>);

impl Criteria {
    pub fn new(items: Vec<Criterion>) -> Result<Self, WorkflowError> {
        let weight_total: u32 = items.iter().map(|item| u32::from(item.weight)).sum();
        if weight_total != REQUIRED_WEIGHT_TOTAL {
            return Err(WorkflowError::invalid(format!(
                "criterion weights total {weight_total}, expected {REQUIRED_WEIGHT_TOTAL}"
            )));
        }

        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(&item.id) {
                return Err(WorkflowError::invalid(format!(
                    "criterion '{}' appears more than once",
                    item.id.0
                )));
            }
            if let Some(score) = item.score {
                if score > item.max_score {
                    return Err(WorkflowError::invalid(format!(
                        "criterion '{}' scored {score} above its maximum {}",
                        item.id.0, item.max_score
                    )));
                }
            }
        }

        Ok(Self(items))
    }

    /// Skips validation; only for rubric tables covered by tests.
    pub(super) fn from_trusted(items: Vec<Criterion>) -> Self {
        Self(items)
    }

    pub fn as_slice(&self) -> &[Criterion] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.0.iter()
    }

    pub fn get(&self, id: &CriterionId) -> Option<&Criterion> {
        self.0.iter().find(|criterion| &criterion.id == id)
    }

    pub fn total_score(&self) -> u32 {
        total_score(&self.0)
    }

    pub fn max_possible_score(&self) -> u32 {
        max_possible_score(&self.0)
    }

    pub fn score_percentage(&self) -> f64 {
        score_percentage(&self.0)
    }
}

impl TryFrom<Vec<Criterion>> for Criteria {
    type Error = WorkflowError;

    fn try_from(items: Vec<Criterion>) -> Result<Self, Self::Error> {
        Criteria::new(items)
    }
}

impl From<Criteria> for Vec<Criterion> {
    fn from(criteria: Criteria) -> Self {
        criteria.0
    }
}

/// Record a reviewer score, clamped to the criterion's ceiling.
///
/// Returns a new collection; `criteria` is left untouched.
pub fn set_criterion_score(
    criteria: &Criteria,
    criterion_id: &CriterionId,
    raw_score: u16,
) -> Result<Criteria, WorkflowError> {
    let position = criteria
        .0
        .iter()
        .position(|criterion| &criterion.id == criterion_id)
        .ok_or_else(|| WorkflowError::not_found("criterion", criterion_id.0.clone()))?;

    let mut updated = criteria.0.clone();
    let criterion = &mut updated[position];
    criterion.score = Some(raw_score.min(criterion.max_score));

    Ok(Criteria(updated))
}

/// Sum of recorded scores; unscored criteria count as zero.
pub fn total_score(criteria: &[Criterion]) -> u32 {
    criteria
        .iter()
        .map(|criterion| u32::from(criterion.score.unwrap_or(0)))
        .sum()
}

pub fn max_possible_score(criteria: &[Criterion]) -> u32 {
    criteria
        .iter()
        .map(|criterion| u32::from(criterion.max_score))
        .sum()
}

/// Percentage of the attainable score; `0.0` when nothing is attainable.
pub fn score_percentage(criteria: &[Criterion]) -> f64 {
    let max = max_possible_score(criteria);
    if max == 0 {
        return 0.0;
    }
    100.0 * f64::from(total_score(criteria)) / f64::from(max)
}
