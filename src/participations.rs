//! Participations

use std::fmt;

use decimal_percentage::Percentage;
use jiff::Timestamp;

use crate::{installers::InstallerKey, promotions::PromotionKey};

/// Lifecycle state of a participation.
///
/// Completed and expired are terminal; recomputing progress never moves a
/// participation out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationStatus {
    /// Progress is still being accrued.
    Active,

    /// The goal was met.
    Completed,

    /// The promotion window closed before the goal was met.
    Expired,
}

impl ParticipationStatus {
    /// Lowercase label used in display output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ParticipationStatus::Active => "active",
            ParticipationStatus::Completed => "completed",
            ParticipationStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payout state of a participation's reward.
///
/// This enum is the single source of truth; whether the reward has been
/// claimed is derived from it, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardStatus {
    /// Not yet reviewed.
    Pending,

    /// Approved for payout.
    Approved,

    /// Paid out.
    Paid,

    /// Declined.
    Rejected,
}

impl RewardStatus {
    /// Lowercase label used in display output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RewardStatus::Pending => "pending",
            RewardStatus::Approved => "approved",
            RewardStatus::Paid => "paid",
            RewardStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time progress numbers stored on a participation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Raw progress value; may exceed the target
    pub current: u32,

    /// Target the promotion requires
    pub target: u32,

    /// Fraction of the target reached, capped at 1.0
    pub percentage: Percentage,

    /// Serial numbers of the records that counted
    pub valid_serials: Vec<String>,
}

impl ProgressSnapshot {
    /// An empty snapshot for a participation that has just joined.
    #[must_use]
    pub fn zeroed(target: u32) -> Self {
        Self {
            current: 0,
            target,
            percentage: Percentage::from(0.0),
            valid_serials: Vec::new(),
        }
    }
}

/// An installer's enrolment in a promotion.
///
/// One participation exists per installer and promotion pair; re-joining
/// after completing or expiring is not supported.
#[derive(Debug, Clone, PartialEq)]
pub struct Participation {
    installer: InstallerKey,
    promotion: PromotionKey,
    joined_at: Timestamp,
    counting_start: Timestamp,
    status: ParticipationStatus,
    progress: ProgressSnapshot,
    completed_at: Option<Timestamp>,
    reward_status: RewardStatus,
}

impl Participation {
    /// Create an active participation joined at `joined_at`.
    ///
    /// The counting-start date equals the join date; only serials installed
    /// on or after it count toward progress.
    #[must_use]
    pub fn new(
        installer: InstallerKey,
        promotion: PromotionKey,
        joined_at: Timestamp,
        target: u32,
    ) -> Self {
        Self {
            installer,
            promotion,
            joined_at,
            counting_start: joined_at,
            status: ParticipationStatus::Active,
            progress: ProgressSnapshot::zeroed(target),
            completed_at: None,
            reward_status: RewardStatus::Pending,
        }
    }

    /// The participating installer.
    #[must_use]
    pub fn installer(&self) -> InstallerKey {
        self.installer
    }

    /// The promotion joined.
    #[must_use]
    pub fn promotion(&self) -> PromotionKey {
        self.promotion
    }

    /// When the installer joined.
    #[must_use]
    pub fn joined_at(&self) -> Timestamp {
        self.joined_at
    }

    /// Date from which serials count toward progress.
    #[must_use]
    pub fn counting_start(&self) -> Timestamp {
        self.counting_start
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> ParticipationStatus {
        self.status
    }

    /// Latest stored progress snapshot.
    #[must_use]
    pub fn progress(&self) -> &ProgressSnapshot {
        &self.progress
    }

    /// When the goal was first met, if it has been.
    #[must_use]
    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    /// Payout state of the reward.
    #[must_use]
    pub fn reward_status(&self) -> RewardStatus {
        self.reward_status
    }

    /// Whether the reward has been paid out.
    #[must_use]
    pub fn reward_claimed(&self) -> bool {
        self.reward_status == RewardStatus::Paid
    }

    /// Replace the stored progress snapshot.
    pub fn set_progress(&mut self, snapshot: ProgressSnapshot) {
        self.progress = snapshot;
    }

    /// Mark the goal as met at `at`.
    ///
    /// The first completion wins; calling again keeps the original timestamp.
    pub fn complete(&mut self, at: Timestamp) {
        if self.completed_at.is_none() {
            self.completed_at = Some(at);
        }

        self.status = ParticipationStatus::Completed;
    }

    /// Mark the participation as expired.
    ///
    /// Has no effect unless the participation is still active.
    pub fn expire(&mut self) {
        if self.status == ParticipationStatus::Active {
            self.status = ParticipationStatus::Expired;
        }
    }

    /// Record a change in reward payout state.
    pub fn set_reward_status(&mut self, status: RewardStatus) {
        self.reward_status = status;
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn participation() -> TestResult<Participation> {
        let joined_at: Timestamp = "2026-03-01T00:00:00Z".parse()?;

        Ok(Participation::new(
            InstallerKey::default(),
            PromotionKey::default(),
            joined_at,
            5,
        ))
    }

    #[test]
    fn new_participation_starts_active_with_zeroed_progress() -> TestResult {
        let row = participation()?;

        assert_eq!(row.status(), ParticipationStatus::Active);
        assert_eq!(row.counting_start(), row.joined_at());
        assert_eq!(row.progress().current, 0);
        assert_eq!(row.progress().target, 5);
        assert_eq!(row.progress().percentage, Percentage::from(0.0));
        assert!(row.completed_at().is_none());
        assert_eq!(row.reward_status(), RewardStatus::Pending);

        Ok(())
    }

    #[test]
    fn completing_twice_keeps_the_first_timestamp() -> TestResult {
        let mut row = participation()?;

        let first: Timestamp = "2026-03-10T00:00:00Z".parse()?;
        let second: Timestamp = "2026-03-20T00:00:00Z".parse()?;

        row.complete(first);
        row.complete(second);

        assert_eq!(row.status(), ParticipationStatus::Completed);
        assert_eq!(row.completed_at(), Some(first));

        Ok(())
    }

    #[test]
    fn expire_does_not_touch_a_completed_participation() -> TestResult {
        let mut row = participation()?;
        let at: Timestamp = "2026-03-10T00:00:00Z".parse()?;

        row.complete(at);
        row.expire();

        assert_eq!(row.status(), ParticipationStatus::Completed);

        Ok(())
    }

    #[test]
    fn reward_claimed_is_derived_from_reward_status() -> TestResult {
        let mut row = participation()?;

        assert!(!row.reward_claimed());

        row.set_reward_status(RewardStatus::Approved);
        assert!(!row.reward_claimed());

        row.set_reward_status(RewardStatus::Paid);
        assert!(row.reward_claimed());

        row.set_reward_status(RewardStatus::Rejected);
        assert!(!row.reward_claimed());

        Ok(())
    }
}
