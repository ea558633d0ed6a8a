//! Fixtures

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    fixtures::{
        installers::InstallersFixture, payments::PaymentsFixture, promotions::PromotionsFixture,
        serials::SerialsFixture,
    },
    installers::{Installer, InstallerKey},
    promotions::{Promotion, PromotionKey},
    stores::{PromotionStore, memory::MemoryStore},
};

pub mod installers;
pub mod payments;
pub mod promotions;
pub mod serials;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid amount format
    #[error("Invalid amount format: {0}")]
    InvalidAmount(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Invalid customer rating
    #[error("Invalid rating: {0}")]
    InvalidRating(String),

    /// Unknown status label
    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    /// Unknown target period label
    #[error("Unknown target period: {0}")]
    UnknownPeriod(String),

    /// Unknown payment kind label
    #[error("Unknown payment kind: {0}")]
    UnknownPaymentKind(String),

    /// Milestone payment without a tier
    #[error("Milestone payment for {0} is missing its tier")]
    MissingMilestoneTier(String),

    /// Installer not found
    #[error("Installer not found: {0}")]
    InstallerNotFound(String),

    /// Promotion not found
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Store the loaded records land in
    store: MemoryStore,

    /// String key -> store key mappings for lookups
    installer_keys: FxHashMap<String, InstallerKey>,
    promotion_keys: FxHashMap<String, PromotionKey>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            store: MemoryStore::new(),
            installer_keys: FxHashMap::default(),
            promotion_keys: FxHashMap::default(),
        }
    }

    /// Load installers from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a status
    /// label is unknown.
    pub fn load_installers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self
            .base_path
            .join("installers")
            .join(format!("{name}.yml"));

        let contents = fs::read_to_string(&file_path)?;
        let fixture: InstallersFixture = serde_norway::from_str(&contents)?;

        for (key, installer_fixture) in fixture.installers {
            let installer: Installer = installer_fixture.try_into()?;
            let installer_key = self.store.insert_installer(installer);

            self.installer_keys.insert(key, installer_key);
        }

        Ok(self)
    }

    /// Load serial records from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a record
    /// references an installer that has not been loaded.
    pub fn load_serials(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("serials").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: SerialsFixture = serde_norway::from_str(&contents)?;

        for serial_fixture in fixture.serials {
            let installer_key = self.installer_key(&serial_fixture.installer)?;
            let record = serial_fixture.try_into_record(installer_key)?;

            self.store.insert_serial(record);
        }

        Ok(self)
    }

    /// Load promotions from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an
    /// amount, rating, status or period label is invalid.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self
            .base_path
            .join("promotions")
            .join(format!("{name}.yml"));

        let contents = fs::read_to_string(&file_path)?;
        let fixture: PromotionsFixture = serde_norway::from_str(&contents)?;

        for (key, promotion_fixture) in fixture.promotions {
            let promotion: Promotion = promotion_fixture.try_into()?;
            let promotion_key = self.store.insert_promotion(promotion);

            self.promotion_keys.insert(key, promotion_key);
        }

        Ok(self)
    }

    /// Load payment history from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a payment
    /// references an installer that has not been loaded, or if a milestone
    /// payment is missing its tier.
    pub fn load_payments(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("payments").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: PaymentsFixture = serde_norway::from_str(&contents)?;

        for payment_fixture in fixture.payments {
            let installer_key = self.installer_key(&payment_fixture.installer)?;
            let payment = payment_fixture.try_into_payment(installer_key)?;

            self.store.insert_payment(payment);
        }

        Ok(self)
    }

    /// Load a complete fixture set (installers, serials, promotions and
    /// payments with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_installers(name)?
            .load_serials(name)?
            .load_promotions(name)?
            .load_payments(name)?;

        Ok(fixture)
    }

    /// Get an installer key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the installer is not found.
    pub fn installer_key(&self, key: &str) -> Result<InstallerKey, FixtureError> {
        self.installer_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::InstallerNotFound(key.to_string()))
    }

    /// Get an installer profile by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the installer is not found.
    pub fn installer(&self, key: &str) -> Result<&Installer, FixtureError> {
        let installer_key = self.installer_key(key)?;

        self.store
            .installer(installer_key)
            .ok_or_else(|| FixtureError::InstallerNotFound(key.to_string()))
    }

    /// Get a promotion key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the promotion is not found.
    pub fn promotion_key(&self, key: &str) -> Result<PromotionKey, FixtureError> {
        self.promotion_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))
    }

    /// Iterate the loaded promotions as (fixture key, store key) pairs
    pub fn promotion_keys(&self) -> impl Iterator<Item = (&str, PromotionKey)> {
        self.promotion_keys
            .iter()
            .map(|(key, promotion_key)| (key.as_str(), *promotion_key))
    }

    /// Get a promotion by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the promotion is not found.
    pub fn promotion(&self, key: &str) -> Result<Promotion, FixtureError> {
        let promotion_key = self.promotion_key(key)?;

        self.store
            .promotion(promotion_key)
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))
    }

    /// Read access to the populated store
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Write access to the populated store
    pub fn store_mut(&mut self) -> &mut MemoryStore {
        &mut self.store
    }

    /// Consume the fixture, returning the populated store
    #[must_use]
    pub fn into_store(self) -> MemoryStore {
        self.store
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
