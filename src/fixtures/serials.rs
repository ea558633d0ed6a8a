//! Serial Record Fixtures

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    installers::InstallerKey,
    serials::{SerialRecord, SerialStatus},
};

/// Wrapper for serial records in YAML
#[derive(Debug, Deserialize)]
pub struct SerialsFixture {
    /// Vector of serial record fixtures
    pub serials: Vec<SerialFixture>,
}

/// Serial Record Fixture
#[derive(Debug, Deserialize)]
pub struct SerialFixture {
    /// Installer key reference
    pub installer: String,

    /// Manufacturer serial number
    pub serial_number: String,

    /// Installation date
    pub installed_at: Timestamp,

    /// Operational status (e.g., "active")
    pub status: String,

    /// Installation city
    pub city: String,

    /// Customer rating (e.g., "4.5"), where the customer left one
    #[serde(default)]
    pub rating: Option<String>,

    /// Registration date; defaults to the installation date
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl SerialFixture {
    /// Convert to a [`SerialRecord`] owned by `installer`
    ///
    /// # Errors
    ///
    /// Returns an error if the status label or rating is invalid.
    pub fn try_into_record(self, installer: InstallerKey) -> Result<SerialRecord, FixtureError> {
        let status = parse_serial_status(&self.status)?;

        let customer_rating = match self.rating {
            Some(rating) => Some(parse_rating(&rating)?),
            None => None,
        };

        Ok(SerialRecord {
            installer,
            serial_number: self.serial_number,
            installed_at: self.installed_at,
            status,
            city: self.city,
            customer_rating,
            created_at: self.created_at.unwrap_or(self.installed_at),
        })
    }
}

/// Parse a serial status label (e.g., "maintenance")
///
/// # Errors
///
/// Returns an error if the label is not a known serial status.
pub fn parse_serial_status(s: &str) -> Result<SerialStatus, FixtureError> {
    match s {
        "active" => Ok(SerialStatus::Active),
        "inactive" => Ok(SerialStatus::Inactive),
        "maintenance" => Ok(SerialStatus::Maintenance),
        other => Err(FixtureError::UnknownStatus(other.to_string())),
    }
}

/// Parse a customer rating string (e.g., "4.5") into a `Decimal`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed as a decimal.
pub fn parse_rating(s: &str) -> Result<Decimal, FixtureError> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidRating(s.to_string()))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_serial_status_rejects_unknown_labels() {
        let result = parse_serial_status("scrapped");

        assert!(matches!(result, Err(FixtureError::UnknownStatus(_))));
    }

    #[test]
    fn parse_rating_accepts_decimals() -> Result<(), FixtureError> {
        assert_eq!(parse_rating("4.5")?, Decimal::new(45, 1));
        assert_eq!(parse_rating(" 5 ")?, Decimal::new(5, 0));

        Ok(())
    }

    #[test]
    fn parse_rating_rejects_garbage() {
        let result = parse_rating("five stars");

        assert!(matches!(result, Err(FixtureError::InvalidRating(_))));
    }

    #[test]
    fn serial_fixture_converts_to_record() -> TestResult {
        let yaml = concat!(
            "installer: amara\n",
            "serial_number: SX-2031-0042\n",
            "installed_at: 2026-03-03T10:30:00Z\n",
            "status: maintenance\n",
            "city: Ibadan\n",
            "rating: \"4.5\"\n",
        );

        let fixture: SerialFixture = serde_norway::from_str(yaml)?;
        let record = fixture.try_into_record(InstallerKey::default())?;

        assert_eq!(record.serial_number, "SX-2031-0042");
        assert_eq!(record.status, SerialStatus::Maintenance);
        assert_eq!(record.customer_rating, Some(Decimal::new(45, 1)));
        assert_eq!(record.created_at, record.installed_at);

        Ok(())
    }
}
