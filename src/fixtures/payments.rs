//! Payment Fixtures

use jiff::Timestamp;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, promotions::parse_amount},
    installers::InstallerKey,
    payments::{Payment, PaymentKind, PaymentStatus},
};

/// Wrapper for payments in YAML
#[derive(Debug, Deserialize)]
pub struct PaymentsFixture {
    /// Vector of payment fixtures
    pub payments: Vec<PaymentFixture>,
}

/// Payment Fixture
#[derive(Debug, Deserialize)]
pub struct PaymentFixture {
    /// Installer key reference
    pub installer: String,

    /// Payment kind label (e.g., "milestone")
    pub kind: String,

    /// Tier a milestone payment pays for; required for milestone payments
    #[serde(default)]
    pub milestone_tier: Option<u32>,

    /// Requested amount (e.g., "5000.00 GBP")
    pub amount: String,

    /// Review status label (e.g., "paid")
    pub status: String,

    /// Request date
    pub requested_at: Timestamp,
}

impl PaymentFixture {
    /// Convert to a [`Payment`] owned by `installer`
    ///
    /// # Errors
    ///
    /// Returns an error if a label or the amount is invalid, or if a
    /// milestone payment is missing its tier.
    pub fn try_into_payment(self, installer: InstallerKey) -> Result<Payment, FixtureError> {
        let amount = parse_amount(&self.amount)?;
        let status = parse_payment_status(&self.status)?;

        let mut payment = match parse_payment_kind(&self.kind)? {
            PaymentKind::Milestone => {
                let Some(tier) = self.milestone_tier else {
                    return Err(FixtureError::MissingMilestoneTier(self.installer));
                };

                Payment::milestone(installer, tier, amount, self.requested_at)
            }
            PaymentKind::Promotion => {
                Payment::promotion_reward(installer, amount, self.requested_at)
            }
            PaymentKind::Other => Payment::other(installer, amount, self.requested_at),
        };

        payment.set_status(status);

        Ok(payment)
    }
}

/// Parse a payment kind label (e.g., "milestone")
///
/// # Errors
///
/// Returns an error if the label is not a known payment kind.
pub fn parse_payment_kind(s: &str) -> Result<PaymentKind, FixtureError> {
    match s {
        "milestone" => Ok(PaymentKind::Milestone),
        "promotion" => Ok(PaymentKind::Promotion),
        "other" => Ok(PaymentKind::Other),
        other => Err(FixtureError::UnknownPaymentKind(other.to_string())),
    }
}

/// Parse a payment status label (e.g., "paid")
///
/// # Errors
///
/// Returns an error if the label is not a known payment status.
pub fn parse_payment_status(s: &str) -> Result<PaymentStatus, FixtureError> {
    match s {
        "pending" => Ok(PaymentStatus::Pending),
        "approved" => Ok(PaymentStatus::Approved),
        "paid" => Ok(PaymentStatus::Paid),
        "rejected" => Ok(PaymentStatus::Rejected),
        other => Err(FixtureError::UnknownStatus(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn milestone_payment_fixture_converts_with_its_tier() -> TestResult {
        let yaml = concat!(
            "installer: amara\n",
            "kind: milestone\n",
            "milestone_tier: 1\n",
            "amount: 5000.00 GBP\n",
            "status: paid\n",
            "requested_at: 2026-02-15T09:00:00Z\n",
        );

        let fixture: PaymentFixture = serde_norway::from_str(yaml)?;
        let payment = fixture.try_into_payment(InstallerKey::default())?;

        assert_eq!(payment.kind(), PaymentKind::Milestone);
        assert_eq!(payment.milestone_tier(), Some(1));
        assert_eq!(payment.status(), PaymentStatus::Paid);
        assert_eq!(payment.amount(), Money::from_minor(500_000, GBP));

        Ok(())
    }

    #[test]
    fn milestone_payment_without_a_tier_is_rejected() -> TestResult {
        let yaml = concat!(
            "installer: amara\n",
            "kind: milestone\n",
            "amount: 5000.00 GBP\n",
            "status: pending\n",
            "requested_at: 2026-02-15T09:00:00Z\n",
        );

        let fixture: PaymentFixture = serde_norway::from_str(yaml)?;
        let result = fixture.try_into_payment(InstallerKey::default());

        assert!(matches!(
            result,
            Err(FixtureError::MissingMilestoneTier(key)) if key == "amara"
        ));

        Ok(())
    }

    #[test]
    fn promotion_payment_fixture_ignores_tiers() -> TestResult {
        let yaml = concat!(
            "installer: bayo\n",
            "kind: promotion\n",
            "amount: 250.00 GBP\n",
            "status: approved\n",
            "requested_at: 2026-04-02T09:00:00Z\n",
        );

        let fixture: PaymentFixture = serde_norway::from_str(yaml)?;
        let payment = fixture.try_into_payment(InstallerKey::default())?;

        assert_eq!(payment.kind(), PaymentKind::Promotion);
        assert_eq!(payment.milestone_tier(), None);
        assert_eq!(payment.status(), PaymentStatus::Approved);

        Ok(())
    }

    #[test]
    fn parse_payment_kind_rejects_unknown_labels() {
        let result = parse_payment_kind("bonus");

        assert!(matches!(result, Err(FixtureError::UnknownPaymentKind(_))));
    }

    #[test]
    fn parse_payment_status_rejects_unknown_labels() {
        let result = parse_payment_status("settled");

        assert!(matches!(result, Err(FixtureError::UnknownStatus(_))));
    }
}
