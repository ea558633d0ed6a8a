//! Installer Fixtures

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    installers::{Installer, InstallerStatus},
};

/// Wrapper for installers in YAML
#[derive(Debug, Deserialize)]
pub struct InstallersFixture {
    /// Map of installer key -> installer fixture
    pub installers: FxHashMap<String, InstallerFixture>,
}

/// Installer Fixture
#[derive(Debug, Deserialize)]
pub struct InstallerFixture {
    /// Display name
    pub name: String,

    /// Account status (e.g., "active")
    pub status: String,

    /// Registration date
    pub registered_at: Timestamp,
}

impl TryFrom<InstallerFixture> for Installer {
    type Error = FixtureError;

    fn try_from(fixture: InstallerFixture) -> Result<Self, Self::Error> {
        let status = parse_installer_status(&fixture.status)?;

        Ok(Installer {
            name: fixture.name,
            status,
            registered_at: fixture.registered_at,
        })
    }
}

/// Parse an installer status label (e.g., "active")
///
/// # Errors
///
/// Returns an error if the label is not a known installer status.
pub fn parse_installer_status(s: &str) -> Result<InstallerStatus, FixtureError> {
    match s {
        "pending" => Ok(InstallerStatus::Pending),
        "active" => Ok(InstallerStatus::Active),
        "suspended" => Ok(InstallerStatus::Suspended),
        other => Err(FixtureError::UnknownStatus(other.to_string())),
    }
}
