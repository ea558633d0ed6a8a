//! Promotion Fixtures

use jiff::Timestamp;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, installers::parse_installer_status, serials::parse_rating},
    promotions::{EligibilityRules, Promotion, PromotionGoal, Reward, TargetPeriod},
};

/// Wrapper for promotions in YAML
#[derive(Debug, Deserialize)]
pub struct PromotionsFixture {
    /// Map of promotion key -> promotion fixture
    pub promotions: FxHashMap<String, PromotionFixture>,
}

/// Promotion fixture from YAML
#[derive(Debug, Deserialize)]
pub struct PromotionFixture {
    /// Campaign title
    pub title: String,

    /// Campaign description
    #[serde(default)]
    pub description: String,

    /// Goal configuration
    pub goal: GoalFixture,

    /// Target period label (e.g., "total")
    pub period: String,

    /// Eligibility rules; open to all when omitted
    #[serde(default)]
    pub eligibility: EligibilityFixture,

    /// Reward configuration
    pub reward: RewardFixture,

    /// Window open date
    pub starts_at: Timestamp,

    /// Window close date
    pub ends_at: Timestamp,
}

/// Goal fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalFixture {
    /// Installation count goal
    InstallationTarget {
        /// Valid installations required
        target: u32,
    },

    /// Installation count goal with a rating threshold
    QualityTarget {
        /// Valid installations required
        target: u32,

        /// Minimum average rating (e.g., "4.5")
        min_average_rating: String,
    },

    /// Distinct city goal
    GeographicExpansion {
        /// Distinct installation cities required
        target: u32,
    },

    /// Milestone ladder goal
    Milestone {
        /// Valid installations required
        target: u32,
    },
}

impl TryFrom<GoalFixture> for PromotionGoal {
    type Error = FixtureError;

    fn try_from(fixture: GoalFixture) -> Result<Self, Self::Error> {
        match fixture {
            GoalFixture::InstallationTarget { target } => {
                Ok(PromotionGoal::InstallationTarget { target })
            }
            GoalFixture::QualityTarget {
                target,
                min_average_rating,
            } => Ok(PromotionGoal::QualityTarget {
                target,
                min_average_rating: parse_rating(&min_average_rating)?,
            }),
            GoalFixture::GeographicExpansion { target } => {
                Ok(PromotionGoal::GeographicExpansion { target })
            }
            GoalFixture::Milestone { target } => Ok(PromotionGoal::Milestone { target }),
        }
    }
}

/// Eligibility fixture from YAML
#[derive(Debug, Default, Deserialize)]
pub struct EligibilityFixture {
    /// Minimum lifetime valid installations
    #[serde(default)]
    pub min_installations: Option<u32>,

    /// Required account status label
    #[serde(default)]
    pub required_status: Option<String>,

    /// Restrict to installers who registered after the start
    #[serde(default)]
    pub new_installers_only: bool,
}

impl TryFrom<EligibilityFixture> for EligibilityRules {
    type Error = FixtureError;

    fn try_from(fixture: EligibilityFixture) -> Result<Self, Self::Error> {
        let required_status = match fixture.required_status {
            Some(status) => Some(parse_installer_status(&status)?),
            None => None,
        };

        Ok(EligibilityRules {
            min_installations: fixture.min_installations,
            required_status,
            new_installers_only: fixture.new_installers_only,
        })
    }
}

/// Reward fixture from YAML
#[derive(Debug, Deserialize)]
pub struct RewardFixture {
    /// Reward amount (e.g., "250.00 GBP")
    pub amount: String,

    /// What the reward is
    pub description: String,
}

impl TryFrom<PromotionFixture> for Promotion {
    type Error = FixtureError;

    fn try_from(fixture: PromotionFixture) -> Result<Self, Self::Error> {
        let goal: PromotionGoal = fixture.goal.try_into()?;
        let period = parse_target_period(&fixture.period)?;
        let eligibility: EligibilityRules = fixture.eligibility.try_into()?;
        let amount = parse_amount(&fixture.reward.amount)?;

        Ok(Promotion {
            title: fixture.title,
            description: fixture.description,
            goal,
            period,
            eligibility,
            reward: Reward {
                amount,
                description: fixture.reward.description,
            },
            starts_at: fixture.starts_at,
            ends_at: fixture.ends_at,
        })
    }
}

/// Parse a target period label (e.g., "monthly")
///
/// # Errors
///
/// Returns an error if the label is not a known target period.
pub fn parse_target_period(s: &str) -> Result<TargetPeriod, FixtureError> {
    match s {
        "daily" => Ok(TargetPeriod::Daily),
        "weekly" => Ok(TargetPeriod::Weekly),
        "monthly" => Ok(TargetPeriod::Monthly),
        "total" => Ok(TargetPeriod::Total),
        other => Err(FixtureError::UnknownPeriod(other.to_string())),
    }
}

/// Parse an amount string (e.g., "250.00 GBP") into [`Money`]
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognised.
pub fn parse_amount(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidAmount(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidAmount(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidAmount(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidAmount(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidAmount(s.to_string()))?;

    let currency = match *currency_code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok(Money::from_minor(minor_units, currency))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_amount_reads_major_units() -> Result<(), FixtureError> {
        let amount = parse_amount("250.00 GBP")?;

        assert_eq!(amount, Money::from_minor(25_000, GBP));

        Ok(())
    }

    #[test]
    fn parse_amount_accepts_usd_and_eur() -> Result<(), FixtureError> {
        let usd = parse_amount("1.00 USD")?;
        let eur = parse_amount("2.50 EUR")?;

        assert_eq!(usd, Money::from_minor(100, USD));
        assert_eq!(eur, Money::from_minor(250, EUR));

        Ok(())
    }

    #[test]
    fn parse_amount_rejects_missing_currency() {
        let result = parse_amount("250.00");

        assert!(matches!(result, Err(FixtureError::InvalidAmount(_))));
    }

    #[test]
    fn parse_amount_rejects_unknown_currency() {
        let result = parse_amount("250.00 NGN");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "NGN"));
    }

    #[test]
    fn parse_target_period_rejects_unknown_labels() {
        let result = parse_target_period("fortnightly");

        assert!(matches!(result, Err(FixtureError::UnknownPeriod(_))));
    }

    #[test]
    fn goal_fixture_rejects_unknown_type() {
        let yaml = "type: sales_target\ntarget: 5\n";
        let result: Result<GoalFixture, _> = serde_norway::from_str(yaml);

        assert!(result.is_err());
    }

    #[test]
    fn quality_goal_parses_its_rating_threshold() -> TestResult {
        let yaml = "type: quality_target\ntarget: 3\nmin_average_rating: \"4.5\"\n";
        let fixture: GoalFixture = serde_norway::from_str(yaml)?;
        let goal: PromotionGoal = fixture.try_into()?;

        assert_eq!(
            goal,
            PromotionGoal::QualityTarget {
                target: 3,
                min_average_rating: Decimal::new(45, 1),
            }
        );

        Ok(())
    }

    #[test]
    fn omitted_eligibility_is_open_to_all() -> TestResult {
        let yaml = concat!(
            "title: Spring Installation Sprint\n",
            "goal:\n",
            "  type: installation_target\n",
            "  target: 5\n",
            "period: total\n",
            "reward:\n",
            "  amount: 250.00 GBP\n",
            "  description: Completion bonus\n",
            "starts_at: 2026-03-01T00:00:00Z\n",
            "ends_at: 2026-03-31T23:59:59Z\n",
        );

        let fixture: PromotionFixture = serde_norway::from_str(yaml)?;
        let promotion: Promotion = fixture.try_into()?;

        assert!(!promotion.eligibility.has_rules());
        assert!(promotion.description.is_empty());

        Ok(())
    }
}
