//! Payments

use std::fmt;

use jiff::Timestamp;
use rusty_money::{
    Money,
    iso::{Currency, GBP},
};
use slotmap::new_key_type;

use crate::{installers::InstallerKey, milestones::MilestoneState};

new_key_type! {
    /// Payment Key
    pub struct PaymentKey;
}

/// What a payment rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    /// Milestone tier payout.
    Milestone,

    /// Promotion completion payout.
    Promotion,

    /// Anything else, such as manual adjustments.
    Other,
}

impl PaymentKind {
    /// Lowercase label used in fixtures and display output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentKind::Milestone => "milestone",
            PaymentKind::Promotion => "promotion",
            PaymentKind::Other => "other",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Submitted, awaiting review.
    Pending,

    /// Approved, awaiting payout.
    Approved,

    /// Paid out.
    Paid,

    /// Declined; the requested tier is released.
    Rejected,
}

impl PaymentStatus {
    /// Lowercase label used in fixtures and display output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment request in an installer's history.
///
/// Milestone payments always carry the tier they pay for; other kinds never
/// do. The constructors keep that pairing intact.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    installer: InstallerKey,
    kind: PaymentKind,
    milestone_tier: Option<u32>,
    amount: Money<'static, Currency>,
    status: PaymentStatus,
    requested_at: Timestamp,
}

impl Payment {
    /// Create a pending milestone payment request for `tier`.
    #[must_use]
    pub fn milestone(
        installer: InstallerKey,
        tier: u32,
        amount: Money<'static, Currency>,
        requested_at: Timestamp,
    ) -> Self {
        Self {
            installer,
            kind: PaymentKind::Milestone,
            milestone_tier: Some(tier),
            amount,
            status: PaymentStatus::Pending,
            requested_at,
        }
    }

    /// Create a pending promotion reward payment.
    #[must_use]
    pub fn promotion_reward(
        installer: InstallerKey,
        amount: Money<'static, Currency>,
        requested_at: Timestamp,
    ) -> Self {
        Self {
            installer,
            kind: PaymentKind::Promotion,
            milestone_tier: None,
            amount,
            status: PaymentStatus::Pending,
            requested_at,
        }
    }

    /// Create a pending payment outside the milestone and promotion flows.
    #[must_use]
    pub fn other(
        installer: InstallerKey,
        amount: Money<'static, Currency>,
        requested_at: Timestamp,
    ) -> Self {
        Self {
            installer,
            kind: PaymentKind::Other,
            milestone_tier: None,
            amount,
            status: PaymentStatus::Pending,
            requested_at,
        }
    }

    /// Installer the payment belongs to.
    #[must_use]
    pub fn installer(&self) -> InstallerKey {
        self.installer
    }

    /// What the payment rewards.
    #[must_use]
    pub fn kind(&self) -> PaymentKind {
        self.kind
    }

    /// Tier a milestone payment pays for.
    #[must_use]
    pub fn milestone_tier(&self) -> Option<u32> {
        self.milestone_tier
    }

    /// Requested amount.
    #[must_use]
    pub fn amount(&self) -> Money<'static, Currency> {
        self.amount
    }

    /// Review state.
    #[must_use]
    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    /// When the payment was requested.
    #[must_use]
    pub fn requested_at(&self) -> Timestamp {
        self.requested_at
    }

    /// Record a review decision.
    pub fn set_status(&mut self, status: PaymentStatus) {
        self.status = status;
    }
}

/// Flat payout configured per milestone tier.
///
/// Milestone payouts are not derived from promotion rewards; every tier pays
/// the same configured amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MilestoneRewardPolicy {
    /// Amount paid per completed tier
    pub amount_per_tier: Money<'static, Currency>,
}

impl MilestoneRewardPolicy {
    /// Default payout per tier, in minor units.
    pub const DEFAULT_AMOUNT_MINOR: i64 = 500_000;

    /// Policy paying `amount_per_tier` for every completed tier.
    #[must_use]
    pub const fn new(amount_per_tier: Money<'static, Currency>) -> Self {
        Self { amount_per_tier }
    }

    /// Amount a milestone payment request should ask for.
    #[must_use]
    pub const fn request_amount(&self) -> Money<'static, Currency> {
        self.amount_per_tier
    }
}

impl Default for MilestoneRewardPolicy {
    fn default() -> Self {
        Self::new(Money::from_minor(Self::DEFAULT_AMOUNT_MINOR, GBP))
    }
}

/// Whether the installer may request a payment for their latest completed
/// milestone tier.
///
/// Requires an unclaimed completed tier with no pending or approved request
/// already open for it. A rejected request releases the tier, so it can be
/// requested again. Never mutates anything.
#[must_use]
pub fn can_request_milestone_payment(
    state: &MilestoneState,
    milestone_payments: &[Payment],
) -> bool {
    if !state.has_unclaimed_milestone {
        return false;
    }

    !has_open_request_for_tier(milestone_payments, state.completed_milestones)
}

/// Whether a pending or approved milestone request exists for `tier`.
fn has_open_request_for_tier(payments: &[Payment], tier: u32) -> bool {
    payments.iter().any(|payment| {
        payment.milestone_tier() == Some(tier)
            && matches!(
                payment.status(),
                PaymentStatus::Pending | PaymentStatus::Approved
            )
    })
}
