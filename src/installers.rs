//! Installers

use std::fmt;

use jiff::Timestamp;
use slotmap::new_key_type;

new_key_type! {
    /// Installer Key
    pub struct InstallerKey;
}

/// Account status of an installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerStatus {
    /// Registered but not yet approved.
    Pending,

    /// Approved and allowed to participate in promotions.
    Active,

    /// Barred from joining promotions.
    Suspended,
}

impl InstallerStatus {
    /// Lowercase label used in fixtures and display output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            InstallerStatus::Pending => "pending",
            InstallerStatus::Active => "active",
            InstallerStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for InstallerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installer profile
#[derive(Debug, Clone)]
pub struct Installer {
    /// Display name
    pub name: String,

    /// Account status
    pub status: InstallerStatus,

    /// When the installer registered with the programme
    pub registered_at: Timestamp,
}
