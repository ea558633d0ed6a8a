//! Milestones
//!
//! The milestone ladder rewards every block of ten valid installations
//! across the installer's lifetime, independent of any promotion. The state
//! is always derived from the serial count and the payment history; nothing
//! here is persisted.

use decimal_percentage::Percentage;
use rustc_hash::FxHashSet;

use crate::{
    payments::{Payment, PaymentStatus},
    progress::progress_fraction,
};

/// Valid installations per milestone tier.
pub const MILESTONE_TIER_SIZE: u32 = 10;

/// Derived milestone ladder position for an installer.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneState {
    /// Fully completed tiers
    pub completed_milestones: u32,

    /// Valid installations into the current tier
    pub current_progress: u32,

    /// Fraction of the current tier completed
    pub progress_percentage: Percentage,

    /// Installations remaining until the next tier; `None` right after
    /// completing a tier
    pub next_milestone_at: Option<u32>,

    /// Whether the latest completed tier has no paid payment yet
    pub has_unclaimed_milestone: bool,
}

/// Compute the milestone ladder position from a lifetime installation count.
///
/// `claimed_tiers` holds the tiers whose milestone payment has been paid
/// out; see [`claimed_tiers`].
#[must_use]
pub fn milestone_state(total_valid_installations: u32, claimed: &FxHashSet<u32>) -> MilestoneState {
    let completed_milestones = total_valid_installations / MILESTONE_TIER_SIZE;
    let current_progress = total_valid_installations % MILESTONE_TIER_SIZE;

    let next_milestone_at = if current_progress == 0 {
        None
    } else {
        Some(MILESTONE_TIER_SIZE - current_progress)
    };

    MilestoneState {
        completed_milestones,
        current_progress,
        progress_percentage: progress_fraction(current_progress, MILESTONE_TIER_SIZE),
        next_milestone_at,
        has_unclaimed_milestone: completed_milestones > 0
            && !claimed.contains(&completed_milestones),
    }
}

/// Tiers whose milestone payment reached the paid status.
///
/// Pending and approved payments do not claim a tier, and a rejected payment
/// releases it, so the tier can be requested again.
#[must_use]
pub fn claimed_tiers(milestone_payments: &[Payment]) -> FxHashSet<u32> {
    milestone_payments
        .iter()
        .filter(|payment| payment.status() == PaymentStatus::Paid)
        .filter_map(Payment::milestone_tier)
        .collect()
}
