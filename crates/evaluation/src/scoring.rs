use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rfq_sourcing_types::{Bid, BidEvaluation, Rfq, RfqEvaluation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("score {score} for {dimension} is outside 0-100")]
    ScoreOutOfRange { dimension: String, score: Decimal },

    #[error("weight {weight} for criterion {criterion} is outside 0-100")]
    WeightOutOfRange { criterion: String, weight: Decimal },

    #[error("evaluation must score at least one dimension")]
    NoDimensions,

    #[error("criterion name cannot be empty")]
    EmptyCriterion,
}

/// One evaluator's standardized scores for one bid. Absent dimensions are
/// simply left out of the weighted composite.
#[derive(Debug, Clone)]
pub struct RfqScoreInput {
    pub bid_id: String,
    pub technical_score: Option<Decimal>,
    pub financial_score: Option<Decimal>,
    pub delivery_score: Option<Decimal>,
    pub quality_score: Option<Decimal>,
    pub evaluated_by: String,
    pub comments: Option<String>,
}

/// Aggregated standing of one bid after ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BidStanding {
    pub bid_id: String,
    pub mean_technical: Option<Decimal>,
    pub mean_financial: Option<Decimal>,
    pub mean_delivery: Option<Decimal>,
    pub mean_quality: Option<Decimal>,
    pub mean_overall: Decimal,
    pub evaluator_count: usize,
    pub rank: u32,
}

/// Record one evaluator's standardized scores against a bid, then re-rank.
///
/// The entry is upserted keyed by `(bid_id, evaluated_by)`: the same
/// evaluator re-scoring the same bid replaces their earlier entry. The
/// composite is the sum of `score * dimension_weight / 100` over whichever
/// dimensions are present.
pub fn record_rfq_evaluation(
    rfq: &mut Rfq,
    input: RfqScoreInput,
    now: DateTime<Utc>,
) -> Result<Vec<BidStanding>, EvaluationError> {
    let dimensions = [
        ("technical", input.technical_score, rfq.evaluation_criteria.technical_weight),
        ("financial", input.financial_score, rfq.evaluation_criteria.financial_weight),
        ("delivery", input.delivery_score, rfq.evaluation_criteria.delivery_weight),
        ("quality", input.quality_score, rfq.evaluation_criteria.quality_weight),
    ];

    let mut overall = Decimal::ZERO;
    let mut present = 0usize;
    for (dimension, score, weight) in dimensions {
        if let Some(score) = score {
            check_score_range(dimension, score)?;
            overall += score * weight / Decimal::ONE_HUNDRED;
            present += 1;
        }
    }
    if present == 0 {
        return Err(EvaluationError::NoDimensions);
    }

    let key = Rfq::evaluation_key(&input.bid_id, &input.evaluated_by);
    rfq.evaluation_results.insert(
        key,
        RfqEvaluation {
            bid_id: input.bid_id,
            technical_score: input.technical_score,
            financial_score: input.financial_score,
            delivery_score: input.delivery_score,
            quality_score: input.quality_score,
            overall_score: overall,
            rank: None,
            evaluated_by: input.evaluated_by,
            evaluated_at: now,
            comments: input.comments,
        },
    );

    Ok(update_evaluation_ranks(rfq))
}

/// Recompute the rank ordering across all evaluation entries.
///
/// Entries are grouped by bid; per bid the arithmetic mean of each dimension
/// and of the composite is taken across the evaluators who scored it. Bids
/// are ordered descending by mean composite with a stable sort over
/// first-evaluation order, so ties keep first-scored-first order. The rank is
/// written back into every entry of each bid.
pub fn update_evaluation_ranks(rfq: &mut Rfq) -> Vec<BidStanding> {
    #[derive(Default)]
    struct Group {
        first_at: Option<DateTime<Utc>>,
        technical: (Decimal, usize),
        financial: (Decimal, usize),
        delivery: (Decimal, usize),
        quality: (Decimal, usize),
        overall: Decimal,
        count: usize,
    }

    fn accumulate(slot: &mut (Decimal, usize), score: Option<Decimal>) {
        if let Some(score) = score {
            slot.0 += score;
            slot.1 += 1;
        }
    }

    fn mean(slot: (Decimal, usize)) -> Option<Decimal> {
        (slot.1 > 0).then(|| slot.0 / Decimal::from(slot.1))
    }

    let mut groups: HashMap<String, Group> = HashMap::new();
    for entry in rfq.evaluation_results.values() {
        let group = groups.entry(entry.bid_id.clone()).or_default();
        group.first_at = Some(match group.first_at {
            Some(first) => first.min(entry.evaluated_at),
            None => entry.evaluated_at,
        });
        accumulate(&mut group.technical, entry.technical_score);
        accumulate(&mut group.financial, entry.financial_score);
        accumulate(&mut group.delivery, entry.delivery_score);
        accumulate(&mut group.quality, entry.quality_score);
        group.overall += entry.overall_score;
        group.count += 1;
    }

    let mut standings: Vec<(DateTime<Utc>, BidStanding)> = groups
        .into_iter()
        .map(|(bid_id, group)| {
            let first_at = group.first_at.unwrap_or_default();
            let standing = BidStanding {
                bid_id,
                mean_technical: mean(group.technical),
                mean_financial: mean(group.financial),
                mean_delivery: mean(group.delivery),
                mean_quality: mean(group.quality),
                mean_overall: group.overall / Decimal::from(group.count),
                evaluator_count: group.count,
                rank: 0,
            };
            (first_at, standing)
        })
        .collect();

    // Pre-sort by first evaluation time (bid id as final determinism), then
    // a stable sort descending by mean composite so ties keep that order.
    standings.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.bid_id.cmp(&b.1.bid_id)));
    standings.sort_by(|a, b| b.1.mean_overall.cmp(&a.1.mean_overall));

    let mut ranks: HashMap<String, u32> = HashMap::new();
    let mut result = Vec::with_capacity(standings.len());
    for (position, (_, mut standing)) in standings.into_iter().enumerate() {
        standing.rank = position as u32 + 1;
        ranks.insert(standing.bid_id.clone(), standing.rank);
        result.push(standing);
    }

    for entry in rfq.evaluation_results.values_mut() {
        entry.rank = ranks.get(&entry.bid_id).copied();
    }

    result
}

/// One evaluator's score for one ad-hoc criterion
#[derive(Debug, Clone)]
pub struct BidScoreInput {
    pub criterion: String,
    pub score: Decimal,
    pub weight: Decimal,
    pub evaluated_by: String,
    pub comments: Option<String>,
}

/// Record one evaluator's ad-hoc criterion score against a bid.
///
/// The entry is upserted keyed by `(criterion, evaluated_by)`. The bid's
/// overall score is the sum of `score * weight / 100` across all entries,
/// additive across evaluators. Returns the recomputed overall score.
pub fn record_bid_evaluation(
    bid: &mut Bid,
    input: BidScoreInput,
    now: DateTime<Utc>,
) -> Result<Decimal, EvaluationError> {
    if input.criterion.trim().is_empty() {
        return Err(EvaluationError::EmptyCriterion);
    }
    check_score_range(&input.criterion, input.score)?;
    if input.weight < Decimal::ZERO || input.weight > Decimal::ONE_HUNDRED {
        return Err(EvaluationError::WeightOutOfRange {
            criterion: input.criterion,
            weight: input.weight,
        });
    }

    let weighted_score = input.score * input.weight / Decimal::ONE_HUNDRED;
    let key = Bid::evaluation_key(&input.criterion, &input.evaluated_by);
    bid.evaluation_results.insert(
        key,
        BidEvaluation {
            criterion: input.criterion,
            score: input.score,
            weight: input.weight,
            weighted_score,
            evaluated_by: input.evaluated_by,
            evaluated_at: now,
            comments: input.comments,
        },
    );

    recompute_bid_overall(bid);
    Ok(bid.overall_score.unwrap_or_default())
}

/// Re-derive the bid's overall score from its evaluation entries. `None`
/// when there are no entries.
pub fn recompute_bid_overall(bid: &mut Bid) {
    bid.overall_score = if bid.evaluation_results.is_empty() {
        None
    } else {
        Some(
            bid.evaluation_results
                .values()
                .map(|e| e.weighted_score)
                .sum(),
        )
    };
}

fn check_score_range(dimension: &str, score: Decimal) -> Result<(), EvaluationError> {
    if score < Decimal::ZERO || score > Decimal::ONE_HUNDRED {
        return Err(EvaluationError::ScoreOutOfRange {
            dimension: dimension.to_string(),
            score,
        });
    }
    Ok(())
}
