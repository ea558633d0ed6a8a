//! Serial Records

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use slotmap::new_key_type;

use crate::installers::InstallerKey;

new_key_type! {
    /// Serial Record Key
    pub struct SerialKey;
}

/// Operational status of an installed inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialStatus {
    /// Installed and generating.
    Active,

    /// Deactivated; never counts toward progress.
    Inactive,

    /// Under maintenance; still counts toward progress.
    Maintenance,
}

impl SerialStatus {
    /// Lowercase label used in fixtures and display output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SerialStatus::Active => "active",
            SerialStatus::Inactive => "inactive",
            SerialStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for SerialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered inverter installation.
///
/// Records are immutable once registered apart from status changes made by
/// administrators, so progress can always be recomputed from them.
#[derive(Debug, Clone)]
pub struct SerialRecord {
    /// Installer who registered the installation
    pub installer: InstallerKey,

    /// Manufacturer serial number (unique, treated as opaque)
    pub serial_number: String,

    /// When the inverter was installed
    pub installed_at: Timestamp,

    /// Operational status
    pub status: SerialStatus,

    /// City of the installation site
    pub city: String,

    /// Customer satisfaction rating, where the customer left one
    pub customer_rating: Option<Decimal>,

    /// When the record was registered
    pub created_at: Timestamp,
}

impl SerialRecord {
    /// Whether this record counts toward progress measured from `counting_start`.
    ///
    /// A record counts when it was installed on or after the counting-start
    /// date and its status is not inactive.
    #[must_use]
    pub fn counts_from(&self, counting_start: Timestamp) -> bool {
        self.installed_at >= counting_start && self.status != SerialStatus::Inactive
    }
}

/// Filter `serials` down to the records counting from `counting_start`,
/// preserving the input order.
#[must_use]
pub fn counting_serials(serials: &[SerialRecord], counting_start: Timestamp) -> Vec<&SerialRecord> {
    serials
        .iter()
        .filter(|serial| serial.counts_from(counting_start))
        .collect()
}
