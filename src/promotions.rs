//! Promotions

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;
use thiserror::Error;

use crate::installers::{Installer, InstallerStatus};

new_key_type! {
    /// Promotion Key
    pub struct PromotionKey;
}

/// Reporting period a promotion's target is framed in.
///
/// The period is informational; progress is always computed over the whole
/// participation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPeriod {
    /// Daily target framing
    Daily,

    /// Weekly target framing
    Weekly,

    /// Monthly target framing
    Monthly,

    /// One target for the whole promotion
    Total,
}

impl TargetPeriod {
    /// Lowercase label used in fixtures and display output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TargetPeriod::Daily => "daily",
            TargetPeriod::Weekly => "weekly",
            TargetPeriod::Monthly => "monthly",
            TargetPeriod::Total => "total",
        }
    }
}

impl fmt::Display for TargetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a participant must achieve to complete a promotion.
///
/// Every variant carries its own target so a goal cannot exist without one.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionGoal {
    /// Install a number of qualifying inverters.
    InstallationTarget {
        /// Valid installations required
        target: u32,
    },

    /// Install a number of qualifying inverters while keeping the average
    /// customer rating at or above a threshold.
    QualityTarget {
        /// Valid installations required
        target: u32,

        /// Minimum average customer rating across rated valid installations
        min_average_rating: Decimal,
    },

    /// Install in a number of distinct cities.
    GeographicExpansion {
        /// Distinct installation cities required
        target: u32,
    },

    /// Reach an installation count tied to the milestone ladder.
    Milestone {
        /// Valid installations required
        target: u32,
    },
}

impl PromotionGoal {
    /// The count this goal requires, whatever it counts.
    #[must_use]
    pub const fn target(&self) -> u32 {
        match self {
            PromotionGoal::InstallationTarget { target }
            | PromotionGoal::QualityTarget { target, .. }
            | PromotionGoal::GeographicExpansion { target }
            | PromotionGoal::Milestone { target } => *target,
        }
    }

    /// Short label for display output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            PromotionGoal::InstallationTarget { .. } => "installation target",
            PromotionGoal::QualityTarget { .. } => "quality target",
            PromotionGoal::GeographicExpansion { .. } => "geographic expansion",
            PromotionGoal::Milestone { .. } => "milestone",
        }
    }

    /// What a unit of progress represents for this goal.
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        match self {
            PromotionGoal::InstallationTarget { .. }
            | PromotionGoal::QualityTarget { .. }
            | PromotionGoal::Milestone { .. } => "installations",
            PromotionGoal::GeographicExpansion { .. } => "cities",
        }
    }
}

/// Why an installer fails a promotion's eligibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IneligibilityReason {
    /// Fewer lifetime valid installations than the promotion requires.
    #[error("requires at least {required} installations, installer has {actual}")]
    BelowMinimumInstallations {
        /// Installations the rules require
        required: u32,

        /// Installations the installer has
        actual: u32,
    },

    /// The installer's account status does not match the required status.
    #[error("requires {required} status, installer is {actual}")]
    StatusNotAllowed {
        /// Status the rules require
        required: InstallerStatus,

        /// Status the installer holds
        actual: InstallerStatus,
    },

    /// The promotion is restricted to installers who registered after it started.
    #[error("restricted to installers who registered after the promotion started")]
    NotANewInstaller,
}

/// Conditions an installer must meet to join a promotion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibilityRules {
    /// Minimum lifetime valid installations at join time
    pub min_installations: Option<u32>,

    /// Account status the installer must hold
    pub required_status: Option<InstallerStatus>,

    /// Restrict joining to installers who registered after the promotion started
    pub new_installers_only: bool,
}

impl EligibilityRules {
    /// Rules that admit every installer.
    #[must_use]
    pub const fn open_to_all() -> Self {
        Self {
            min_installations: None,
            required_status: None,
            new_installers_only: false,
        }
    }

    /// Rules requiring a minimum lifetime installation count only.
    #[must_use]
    pub const fn with_min_installations(min: u32) -> Self {
        Self {
            min_installations: Some(min),
            required_status: None,
            new_installers_only: false,
        }
    }

    /// Rules requiring a specific account status only.
    #[must_use]
    pub const fn with_required_status(status: InstallerStatus) -> Self {
        Self {
            min_installations: None,
            required_status: Some(status),
            new_installers_only: false,
        }
    }

    /// Whether any rule is set.
    #[must_use]
    pub const fn has_rules(&self) -> bool {
        self.min_installations.is_some()
            || self.required_status.is_some()
            || self.new_installers_only
    }

    /// Check an installer against these rules.
    ///
    /// `lifetime_installations` is the installer's valid installation count at
    /// the time of joining; `promotion_start` anchors the new-installer rule.
    ///
    /// # Errors
    ///
    /// Returns the first [`IneligibilityReason`] the installer fails on.
    pub fn check(
        &self,
        installer: &Installer,
        lifetime_installations: u32,
        promotion_start: Timestamp,
    ) -> Result<(), IneligibilityReason> {
        if let Some(required) = self.min_installations
            && lifetime_installations < required
        {
            return Err(IneligibilityReason::BelowMinimumInstallations {
                required,
                actual: lifetime_installations,
            });
        }

        if let Some(required) = self.required_status
            && installer.status != required
        {
            return Err(IneligibilityReason::StatusNotAllowed {
                required,
                actual: installer.status,
            });
        }

        if self.new_installers_only && installer.registered_at < promotion_start {
            return Err(IneligibilityReason::NotANewInstaller);
        }

        Ok(())
    }
}

/// Reward granted when a participation completes.
#[derive(Debug, Clone, PartialEq)]
pub struct Reward {
    /// Reward amount
    pub amount: Money<'static, Currency>,

    /// What the reward is, for display output
    pub description: String,
}

/// Campaign window state relative to a point in time.
///
/// Always derived from the promotion window; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionStatus {
    /// The end date has not passed.
    Active,

    /// The end date has passed.
    Expired,
}

/// A loyalty campaign installers can join.
#[derive(Debug, Clone)]
pub struct Promotion {
    /// Campaign title
    pub title: String,

    /// Campaign description
    pub description: String,

    /// What participants must achieve
    pub goal: PromotionGoal,

    /// Period the target is framed in
    pub period: TargetPeriod,

    /// Who may join
    pub eligibility: EligibilityRules,

    /// What completing pays out
    pub reward: Reward,

    /// When the campaign opens
    pub starts_at: Timestamp,

    /// When the campaign closes
    pub ends_at: Timestamp,
}

impl Promotion {
    /// Window state at `now`.
    #[must_use]
    pub fn status(&self, now: Timestamp) -> PromotionStatus {
        if now > self.ends_at {
            PromotionStatus::Expired
        } else {
            PromotionStatus::Active
        }
    }

    /// Whether the campaign accepts joins at `now`.
    #[must_use]
    pub fn is_open(&self, now: Timestamp) -> bool {
        now >= self.starts_at && now <= self.ends_at
    }
}
