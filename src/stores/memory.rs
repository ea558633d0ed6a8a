//! In-memory store
//!
//! Backs all four collaborator seams with slotmaps and a keyed participation
//! table. Used by tests and demos; nothing here persists.

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::{
    installers::{Installer, InstallerKey},
    participations::Participation,
    payments::{Payment, PaymentKey, PaymentKind, PaymentStatus},
    promotions::{Promotion, PromotionKey},
    serials::{SerialKey, SerialRecord, SerialStatus},
    stores::{ParticipationStore, PaymentStore, PromotionStore, SerialStore, StoreError},
};

/// In-memory implementation of every collaborator store.
#[derive(Debug)]
pub struct MemoryStore {
    installers: SlotMap<InstallerKey, Installer>,
    serials: SlotMap<SerialKey, SerialRecord>,
    promotions: SlotMap<PromotionKey, Promotion>,
    payments: SlotMap<PaymentKey, Payment>,
    participations: FxHashMap<(InstallerKey, PromotionKey), Participation>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            installers: SlotMap::with_key(),
            serials: SlotMap::with_key(),
            promotions: SlotMap::with_key(),
            payments: SlotMap::with_key(),
            participations: FxHashMap::default(),
        }
    }

    /// Register an installer profile.
    pub fn insert_installer(&mut self, installer: Installer) -> InstallerKey {
        self.installers.insert(installer)
    }

    /// Look up an installer profile.
    #[must_use]
    pub fn installer(&self, key: InstallerKey) -> Option<&Installer> {
        self.installers.get(key)
    }

    /// Register a serial record.
    pub fn insert_serial(&mut self, serial: SerialRecord) -> SerialKey {
        self.serials.insert(serial)
    }

    /// Change a serial record's operational status.
    ///
    /// Returns false when the record does not exist.
    pub fn set_serial_status(&mut self, key: SerialKey, status: SerialStatus) -> bool {
        let Some(serial) = self.serials.get_mut(key) else {
            return false;
        };

        serial.status = status;

        true
    }

    /// Register a promotion.
    pub fn insert_promotion(&mut self, promotion: Promotion) -> PromotionKey {
        self.promotions.insert(promotion)
    }

    /// Record a payment request.
    pub fn insert_payment(&mut self, payment: Payment) -> PaymentKey {
        self.payments.insert(payment)
    }

    /// Record a review decision on a payment.
    ///
    /// Returns false when the payment does not exist.
    pub fn set_payment_status(&mut self, key: PaymentKey, status: PaymentStatus) -> bool {
        let Some(payment) = self.payments.get_mut(key) else {
            return false;
        };

        payment.set_status(status);

        true
    }

    /// All stored participations for an installer.
    #[must_use]
    pub fn participations_for_installer(&self, installer: InstallerKey) -> Vec<Participation> {
        let mut rows: Vec<Participation> = self
            .participations
            .values()
            .filter(|participation| participation.installer() == installer)
            .cloned()
            .collect();

        rows.sort_by_key(Participation::joined_at);

        rows
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialStore for MemoryStore {
    fn valid_serials(&self, installer: InstallerKey) -> Vec<SerialRecord> {
        let mut serials: Vec<SerialRecord> = self
            .serials
            .values()
            .filter(|serial| {
                serial.installer == installer && serial.status != SerialStatus::Inactive
            })
            .cloned()
            .collect();

        serials.sort_by_key(|serial| serial.installed_at);

        serials
    }
}

impl PromotionStore for MemoryStore {
    fn promotion(&self, key: PromotionKey) -> Option<Promotion> {
        self.promotions.get(key).cloned()
    }

    fn active_promotions(&self, now: Timestamp) -> Vec<(PromotionKey, Promotion)> {
        let mut open: Vec<(PromotionKey, Promotion)> = self
            .promotions
            .iter()
            .filter(|(_, promotion)| promotion.is_open(now))
            .map(|(key, promotion)| (key, promotion.clone()))
            .collect();

        open.sort_by_key(|(_, promotion)| promotion.starts_at);

        open
    }
}

impl ParticipationStore for MemoryStore {
    fn participation(
        &self,
        installer: InstallerKey,
        promotion: PromotionKey,
    ) -> Option<Participation> {
        self.participations.get(&(installer, promotion)).cloned()
    }

    fn upsert_participation(&mut self, participation: Participation) -> Result<(), StoreError> {
        let row_key = (participation.installer(), participation.promotion());

        if let Some(stored) = self.participations.get(&row_key) {
            if let Some(stored_at) = stored.completed_at()
                && participation.completed_at() != Some(stored_at)
            {
                return Err(StoreError::CompletionConflict);
            }

            if participation.completed_at().is_some()
                && participation.progress().current < stored.progress().current
            {
                return Err(StoreError::StaleProgress {
                    stored: stored.progress().current,
                    incoming: participation.progress().current,
                });
            }
        }

        self.participations.insert(row_key, participation);

        Ok(())
    }
}

impl PaymentStore for MemoryStore {
    fn payments_by_kind(&self, installer: InstallerKey, kind: PaymentKind) -> Vec<Payment> {
        let mut payments: Vec<Payment> = self
            .payments
            .values()
            .filter(|payment| payment.installer() == installer && payment.kind() == kind)
            .cloned()
            .collect();

        payments.sort_by_key(Payment::requested_at);

        payments
    }
}
