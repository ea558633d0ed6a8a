//! Collaborator Stores
//!
//! The engine reads serials, promotions, participations and payment history
//! through these traits and writes participations back through the guarded
//! upsert. Real persistence lives behind them; [`memory::MemoryStore`] is
//! the reference implementation used by tests and demos.

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    installers::InstallerKey,
    participations::Participation,
    payments::{Payment, PaymentKind},
    promotions::{Promotion, PromotionKey},
    serials::SerialRecord,
};

pub mod memory;

/// Participation write conflicts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A write tried to change a completion that is already recorded.
    #[error("participation write conflicts with the recorded completion")]
    CompletionConflict,

    /// A completing write carried less progress than the stored row.
    #[error("completing write regressed progress from {stored} to {incoming}")]
    StaleProgress {
        /// Progress value already stored
        stored: u32,

        /// Progress value the write carried
        incoming: u32,
    },
}

/// Read access to an installer's serial records.
pub trait SerialStore {
    /// All valid serial records for the installer, ordered by installation
    /// date. Inactive records are excluded.
    fn valid_serials(&self, installer: InstallerKey) -> Vec<SerialRecord>;
}

/// Read access to promotion definitions.
pub trait PromotionStore {
    /// Look up a promotion by key.
    fn promotion(&self, key: PromotionKey) -> Option<Promotion>;

    /// Promotions open for joining at `now`, ordered by start date.
    fn active_promotions(&self, now: Timestamp) -> Vec<(PromotionKey, Promotion)>;
}

/// Read and guarded write access to participations.
pub trait ParticipationStore {
    /// The participation for an installer and promotion pair, if one exists.
    fn participation(
        &self,
        installer: InstallerKey,
        promotion: PromotionKey,
    ) -> Option<Participation>;

    /// Insert or replace the row for the participation's installer and
    /// promotion pair. Atomic per row.
    ///
    /// A recorded completion is immutable: a write that would change or drop
    /// a stored completed-at is rejected, as is a completing write whose
    /// progress regressed below the stored value. Plain snapshot refreshes
    /// are last-write-wins.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the write loses one of those races.
    fn upsert_participation(&mut self, participation: Participation) -> Result<(), StoreError>;
}

/// Read access to payment history.
pub trait PaymentStore {
    /// The installer's payments of the given kind, ordered by request date.
    fn payments_by_kind(&self, installer: InstallerKey, kind: PaymentKind) -> Vec<Payment>;
}
