//! Utils

use clap::Parser;
use jiff::Timestamp;

/// Arguments for the statement examples
#[derive(Debug, Parser)]
pub struct StatementArgs {
    /// Fixture set to load the programme from
    #[clap(short, long, default_value = "solar_south")]
    pub fixture: String,

    /// Installer to report on, by fixture key
    #[clap(short, long, default_value = "amara")]
    pub installer: String,

    /// Point in time the statement is taken at
    #[clap(short, long, default_value = "2026-04-15T12:00:00Z")]
    pub as_of: Timestamp,
}
