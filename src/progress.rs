//! Progress Calculation
//!
//! Pure evaluation of a participation's progress against its promotion goal.
//! The calculator never mutates anything; the engine applies the resulting
//! snapshot and lifecycle transitions.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::{
    participations::{Participation, ProgressSnapshot},
    promotions::{Promotion, PromotionGoal},
    serials::{SerialRecord, counting_serials},
};

/// Progress calculation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    /// Promotion configured with a target of zero.
    #[error("promotion target must be greater than zero")]
    ZeroTarget,
}

/// Outcome of evaluating a participation's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvaluation {
    /// Snapshot to store on the participation
    pub snapshot: ProgressSnapshot,

    /// Whether the goal is met.
    ///
    /// Judged on the raw progress value, not the capped percentage, so
    /// overshooting the target still completes.
    pub completed: bool,
}

/// Evaluate a participation's progress against its promotion goal.
///
/// Only serials installed on or after the participation's counting-start
/// date with a status other than inactive count. The percentage is capped
/// at 100% while the raw value keeps accruing past the target.
///
/// # Errors
///
/// Returns [`ProgressError::ZeroTarget`] if the promotion's target is zero.
pub fn evaluate(
    participation: &Participation,
    promotion: &Promotion,
    serials: &[SerialRecord],
) -> Result<ProgressEvaluation, ProgressError> {
    let target = promotion.goal.target();

    if target == 0 {
        return Err(ProgressError::ZeroTarget);
    }

    let valid = counting_serials(serials, participation.counting_start());

    let (current, completed) = match &promotion.goal {
        PromotionGoal::InstallationTarget { target } => {
            let current = count(valid.len());

            (current, current >= *target)
        }
        PromotionGoal::QualityTarget {
            target,
            min_average_rating,
        } => {
            let current = count(valid.len());
            let quality_met =
                average_rating(&valid).is_some_and(|average| average >= *min_average_rating);

            (current, current >= *target && quality_met)
        }
        PromotionGoal::GeographicExpansion { target } => {
            let current = distinct_cities(&valid);

            (current, current >= *target)
        }
        PromotionGoal::Milestone { target } => {
            let current = count(valid.len());

            (current, current >= *target)
        }
    };

    let snapshot = ProgressSnapshot {
        current,
        target,
        percentage: progress_fraction(current, target),
        valid_serials: valid
            .iter()
            .map(|serial| serial.serial_number.clone())
            .collect(),
    };

    Ok(ProgressEvaluation {
        snapshot,
        completed,
    })
}

/// Fraction of `target` reached by `current`, capped at 1.0.
///
/// Zero progress is always a zero fraction, so a fresh participation never
/// reports a spurious percentage.
#[must_use]
pub fn progress_fraction(current: u32, target: u32) -> Percentage {
    if current == 0 || target == 0 {
        return Percentage::from(0.0);
    }

    let ratio = Decimal::from(current) / Decimal::from(target);

    Percentage::from(ratio.min(Decimal::ONE))
}

/// Clamp a collection length into the progress domain.
fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Number of distinct installation cities among the given serials.
fn distinct_cities(serials: &[&SerialRecord]) -> u32 {
    let cities: FxHashSet<&str> = serials
        .iter()
        .map(|serial| serial.city.as_str())
        .collect();

    count(cities.len())
}

/// Average customer rating across the rated serials.
///
/// Returns `None` when no serial carries a rating; unrated serials are left
/// out of the average rather than dragging it down.
fn average_rating(serials: &[&SerialRecord]) -> Option<Decimal> {
    let rated: Vec<Decimal> = serials
        .iter()
        .filter_map(|serial| serial.customer_rating)
        .collect();

    if rated.is_empty() {
        return None;
    }

    let sum: Decimal = rated.iter().copied().sum();

    Some(sum / Decimal::from(rated.len()))
}
