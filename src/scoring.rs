// src/scoring.rs
//! Composite value/quality/growth score over parsed metrics.
//!
//! Three independently clamped sub-scores are summed: value (<= 70 pts),
//! quality (<= 40 pts), growth (<= 10 pts). A missing metric contributes 0
//! to its term; only threshold selection disqualifies. The reference
//! constants are inherited heuristics with no documented derivation --
//! preserve them, don't tune them.

use std::cmp::Ordering;

use crate::candidate::{Candidate, Metrics};
use crate::queue::QueueRecord;

pub const MAX_PE_DEFAULT: f64 = 25.0;
pub const MIN_ROE_DEFAULT: f64 = 15.0;
pub const MAX_DEBT_TO_EQUITY_DEFAULT: f64 = 1.0;

// Sub-score caps.
const PE_POINTS: f64 = 40.0;
const FORWARD_PE_POINTS: f64 = 20.0;
const PRICE_TO_BOOK_POINTS: f64 = 10.0;
const ROE_POINTS: f64 = 10.0;
const ROIC_POINTS: f64 = 10.0;
const OPERATING_MARGIN_POINTS: f64 = 10.0;
const PROFIT_MARGIN_POINTS: f64 = 5.0;
const DEBT_POINTS: f64 = 5.0;
const GROWTH_POINTS: f64 = 10.0;

// Reference scales at which each capped term maxes out.
const PRICE_TO_BOOK_REF: f64 = 6.0;
const ROE_REF_PCT: f64 = 30.0;
const ROIC_REF_PCT: f64 = 25.0;
const OPERATING_MARGIN_REF_PCT: f64 = 25.0;
const PROFIT_MARGIN_REF_PCT: f64 = 20.0;
const EPS_GROWTH_REF_PCT: f64 = 15.0;

/// Tunable selection thresholds; `max_pe` and `max_debt_to_equity` also
/// feed the score itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreThresholds {
    pub max_pe: f64,
    pub min_roe: f64,
    pub max_debt_to_equity: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            max_pe: MAX_PE_DEFAULT,
            min_roe: MIN_ROE_DEFAULT,
            max_debt_to_equity: MAX_DEBT_TO_EQUITY_DEFAULT,
        }
    }
}

/// A candidate accepted for the queue, with its ranking signal and a
/// derived one-line thesis. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredIdea {
    pub candidate: Candidate,
    pub score: f64,
    pub thesis: String,
}

impl From<ScoredIdea> for QueueRecord {
    fn from(idea: ScoredIdea) -> Self {
        QueueRecord {
            ticker: idea.candidate.ticker,
            company: idea.candidate.company,
            exchange: idea.candidate.exchange,
            sector: idea.candidate.sector,
            industry: idea.candidate.industry,
            market: idea.candidate.market,
            exchange_country: idea.candidate.exchange_country,
            thesis: idea.thesis,
        }
    }
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Capped linear term: `points * value / reference`, missing value -> 0.
fn scaled(value: Option<f64>, reference: f64, points: f64) -> f64 {
    match value {
        Some(v) => points * clamp01(v / reference),
        None => 0.0,
    }
}

fn value_score(metrics: &Metrics, max_pe: f64) -> f64 {
    let mut total = 0.0;
    if max_pe > 0.0 {
        if let Some(pe) = metrics.pe {
            total += PE_POINTS * clamp01((max_pe - pe) / max_pe);
        }
        if let Some(forward_pe) = metrics.forward_pe {
            total += FORWARD_PE_POINTS * clamp01((max_pe - forward_pe) / max_pe);
        }
    }
    if let Some(pb) = metrics.price_to_book {
        total += PRICE_TO_BOOK_POINTS * clamp01((PRICE_TO_BOOK_REF - pb) / PRICE_TO_BOOK_REF);
    }
    total
}

fn quality_score(metrics: &Metrics, max_debt_to_equity: f64) -> f64 {
    let mut total = scaled(metrics.roe_pct, ROE_REF_PCT, ROE_POINTS)
        + scaled(metrics.roic_pct, ROIC_REF_PCT, ROIC_POINTS)
        + scaled(
            metrics.operating_margin_pct,
            OPERATING_MARGIN_REF_PCT,
            OPERATING_MARGIN_POINTS,
        )
        + scaled(
            metrics.profit_margin_pct,
            PROFIT_MARGIN_REF_PCT,
            PROFIT_MARGIN_POINTS,
        );
    // A non-positive ceiling makes the leverage term meaningless; score it 0.
    if max_debt_to_equity > 0.0 {
        if let Some(debt) = metrics.debt_to_equity {
            total += DEBT_POINTS * clamp01(1.0 - debt / max_debt_to_equity);
        }
    }
    total
}

fn growth_score(metrics: &Metrics) -> f64 {
    scaled(metrics.eps_next_5y_pct, EPS_GROWTH_REF_PCT, GROWTH_POINTS)
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The composite score, >= 0, rounded to 2 decimals. Pure and reproducible
/// bit-for-bit for identical inputs and thresholds.
pub fn score(metrics: &Metrics, max_pe: f64, max_debt_to_equity: f64) -> f64 {
    round2(
        value_score(metrics, max_pe)
            + quality_score(metrics, max_debt_to_equity)
            + growth_score(metrics),
    )
}

/// Every threshold must be satisfied by a present metric; a missing metric
/// fails selection (it only zeroes out scoring terms).
pub fn passes_thresholds(metrics: &Metrics, thresholds: &ScoreThresholds) -> bool {
    matches!(metrics.pe, Some(pe) if pe <= thresholds.max_pe)
        && matches!(metrics.roe_pct, Some(roe) if roe >= thresholds.min_roe)
        && matches!(metrics.debt_to_equity, Some(debt) if debt <= thresholds.max_debt_to_equity)
}

/// One-line human-readable rationale, derived from the metrics that feed
/// the score.
pub fn build_thesis(candidate: &Candidate, score: f64, thresholds: &ScoreThresholds) -> String {
    let m = &candidate.metrics;
    let mut parts = Vec::new();
    if let Some(pe) = m.pe {
        parts.push(format!("P/E {pe:.1} vs max {:.0}", thresholds.max_pe));
    }
    if let Some(roe) = m.roe_pct {
        parts.push(format!("ROE {roe:.1}%"));
    }
    if let Some(roic) = m.roic_pct {
        parts.push(format!("ROIC {roic:.1}%"));
    }
    if let Some(debt) = m.debt_to_equity {
        parts.push(format!("D/E {debt:.2}"));
    }
    if let Some(growth) = m.eps_next_5y_pct {
        parts.push(format!("EPS next 5y {growth:.1}%"));
    }
    if parts.is_empty() {
        format!("Composite screen score {score:.2}.")
    } else {
        format!("Composite screen score {score:.2}: {}.", parts.join(", "))
    }
}

fn by_score_desc(a: &(f64, &str), b: &(f64, &str)) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.1.cmp(b.1))
}

/// Sort candidates by descending score (ticker ascending on ties, so runs
/// are reproducible).
pub fn rank_candidates(candidates: Vec<Candidate>, thresholds: &ScoreThresholds) -> Vec<Candidate> {
    let mut scored: Vec<(f64, Candidate)> = candidates
        .into_iter()
        .map(|c| {
            (
                score(&c.metrics, thresholds.max_pe, thresholds.max_debt_to_equity),
                c,
            )
        })
        .collect();
    scored.sort_by(|a, b| by_score_desc(&(a.0, a.1.ticker.as_str()), &(b.0, b.1.ticker.as_str())));
    scored.into_iter().map(|(_, c)| c).collect()
}

/// Threshold selection: candidates whose metrics satisfy every threshold,
/// scored, sorted descending, truncated to `limit`.
pub fn select_ideas(
    candidates: &[Candidate],
    thresholds: &ScoreThresholds,
    limit: usize,
) -> Vec<ScoredIdea> {
    let mut ideas: Vec<ScoredIdea> = candidates
        .iter()
        .filter(|c| passes_thresholds(&c.metrics, thresholds))
        .map(|c| {
            let s = score(&c.metrics, thresholds.max_pe, thresholds.max_debt_to_equity);
            ScoredIdea {
                candidate: c.clone(),
                score: s,
                thesis: build_thesis(c, s, thresholds),
            }
        })
        .collect();
    ideas.sort_by(|a, b| {
        by_score_desc(
            &(a.score, a.candidate.ticker.as_str()),
            &(b.score, b.candidate.ticker.as_str()),
        )
    });
    ideas.truncate(limit);
    ideas
}
