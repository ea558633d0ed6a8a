//! Programme Engine
//!
//! Orchestrates the loyalty programme over the collaborator stores: joining
//! promotions, recomputing participation progress, and answering milestone
//! and payment-eligibility queries. All calculation is delegated to the pure
//! modules; the engine loads records, applies transitions and persists.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::info;

use crate::{
    installers::{Installer, InstallerKey},
    milestones::{self, MilestoneState},
    notifications::{NoopObserver, ProgramObserver},
    participations::{Participation, ParticipationStatus},
    payments::{self, MilestoneRewardPolicy, PaymentKind},
    progress::{self, ProgressError},
    promotions::{IneligibilityReason, PromotionKey, PromotionStatus},
    stores::{ParticipationStore, PaymentStore, PromotionStore, SerialStore, StoreError},
};

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// No participation exists for the installer and promotion pair.
    #[error("no participation for installer {installer:?} in promotion {promotion:?}")]
    ParticipationNotFound {
        /// Installer queried
        installer: InstallerKey,

        /// Promotion queried
        promotion: PromotionKey,
    },

    /// Unknown promotion key.
    #[error("promotion not found: {0:?}")]
    PromotionNotFound(PromotionKey),

    /// The promotion does not accept joins at the requested time.
    #[error("promotion \"{title}\" is not open at {at}")]
    NotOpen {
        /// Promotion title
        title: String,

        /// Requested join time
        at: Timestamp,
    },

    /// The installer already has a participation for this promotion.
    #[error("installer {installer:?} has already joined promotion {promotion:?}")]
    AlreadyJoined {
        /// Installer who tried to join
        installer: InstallerKey,

        /// Promotion already joined
        promotion: PromotionKey,
    },

    /// The installer fails the promotion's eligibility rules.
    #[error("installer is not eligible to join: {0}")]
    Ineligible(#[from] IneligibilityReason),

    /// Invalid promotion configuration.
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// Conflicting participation write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The loyalty programme engine.
///
/// Generic over a store so tests and demos can run against
/// [`crate::stores::memory::MemoryStore`] while production wires in real
/// persistence behind the same traits.
#[derive(Debug)]
pub struct ProgramEngine<S> {
    store: S,
    policy: MilestoneRewardPolicy,
}

impl<S> ProgramEngine<S>
where
    S: SerialStore + PromotionStore + ParticipationStore + PaymentStore,
{
    /// Create an engine with the default milestone reward policy.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_policy(store, MilestoneRewardPolicy::default())
    }

    /// Create an engine with a specific milestone reward policy.
    #[must_use]
    pub const fn with_policy(store: S, policy: MilestoneRewardPolicy) -> Self {
        Self { store, policy }
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write access to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the engine, returning the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// The configured milestone reward policy.
    #[must_use]
    pub const fn policy(&self) -> &MilestoneRewardPolicy {
        &self.policy
    }

    /// Amount a milestone payment request submitted now would ask for.
    #[must_use]
    pub const fn default_payment_amount(&self) -> Money<'static, Currency> {
        self.policy.request_amount()
    }

    /// Enrol an installer in a promotion at `now`.
    ///
    /// The promotion must be open, the installer must not already hold a
    /// participation for it, and the eligibility rules must pass. The new
    /// participation starts active with a zeroed snapshot and a
    /// counting-start date equal to the join date.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the promotion is unknown, closed or
    /// misconfigured, when the pair already exists, or when the installer is
    /// ineligible.
    #[tracing::instrument(name = "engine.join_promotion", skip(self, profile), err)]
    pub fn join_promotion(
        &mut self,
        installer: InstallerKey,
        profile: &Installer,
        promotion_key: PromotionKey,
        now: Timestamp,
    ) -> Result<Participation, EngineError> {
        let Some(promotion) = self.store.promotion(promotion_key) else {
            return Err(EngineError::PromotionNotFound(promotion_key));
        };

        if !promotion.is_open(now) {
            return Err(EngineError::NotOpen {
                title: promotion.title.clone(),
                at: now,
            });
        }

        if self.store.participation(installer, promotion_key).is_some() {
            return Err(EngineError::AlreadyJoined {
                installer,
                promotion: promotion_key,
            });
        }

        let target = promotion.goal.target();

        if target == 0 {
            return Err(EngineError::Progress(ProgressError::ZeroTarget));
        }

        let lifetime_installations = count(self.store.valid_serials(installer).len());

        promotion
            .eligibility
            .check(profile, lifetime_installations, promotion.starts_at)?;

        let participation = Participation::new(installer, promotion_key, now, target);

        self.store.upsert_participation(participation.clone())?;

        info!(title = %promotion.title, "installer joined promotion");

        Ok(participation)
    }

    /// Recompute a participation's progress at `now` and persist the result.
    ///
    /// Completed and expired participations are terminal and returned
    /// unchanged, which also keeps the completed-at timestamp stable across
    /// repeated calls. An active participation whose goal is met transitions
    /// to completed even when the window has already closed; expiry only
    /// applies when the goal was not met.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the participation or promotion is
    /// missing, the promotion is misconfigured, or the write loses a
    /// completion race.
    pub fn recompute_progress(
        &mut self,
        installer: InstallerKey,
        promotion_key: PromotionKey,
        now: Timestamp,
    ) -> Result<Participation, EngineError> {
        self.recompute_progress_with_observer(installer, promotion_key, now, &mut NoopObserver)
    }

    /// [`Self::recompute_progress`] with an observer receiving transition
    /// events.
    ///
    /// # Errors
    ///
    /// Same as [`Self::recompute_progress`].
    #[tracing::instrument(
        name = "engine.recompute_progress",
        skip(self, observer),
        err
    )]
    pub fn recompute_progress_with_observer(
        &mut self,
        installer: InstallerKey,
        promotion_key: PromotionKey,
        now: Timestamp,
        observer: &mut dyn ProgramObserver,
    ) -> Result<Participation, EngineError> {
        let Some(mut participation) = self.store.participation(installer, promotion_key) else {
            return Err(EngineError::ParticipationNotFound {
                installer,
                promotion: promotion_key,
            });
        };

        if participation.status() != ParticipationStatus::Active {
            return Ok(participation);
        }

        let Some(promotion) = self.store.promotion(promotion_key) else {
            return Err(EngineError::PromotionNotFound(promotion_key));
        };

        let serials = self.store.valid_serials(installer);
        let evaluation = progress::evaluate(&participation, &promotion, &serials)?;

        participation.set_progress(evaluation.snapshot);

        if evaluation.completed {
            participation.complete(now);
        } else if promotion.status(now) == PromotionStatus::Expired {
            participation.expire();
        }

        self.store.upsert_participation(participation.clone())?;

        match participation.status() {
            ParticipationStatus::Completed => {
                info!(title = %promotion.title, "participation completed");
                observer.on_participation_completed(&participation);
            }
            ParticipationStatus::Expired => {
                info!(title = %promotion.title, "participation expired");
            }
            ParticipationStatus::Active => {}
        }

        Ok(participation)
    }

    /// The installer's milestone ladder position, derived from their valid
    /// installation count and milestone payment history.
    #[must_use]
    pub fn milestone_state(&self, installer: InstallerKey) -> MilestoneState {
        self.milestone_state_with_observer(installer, &mut NoopObserver)
    }

    /// [`Self::milestone_state`] with an observer notified when the state
    /// holds an unclaimed completed tier.
    pub fn milestone_state_with_observer(
        &self,
        installer: InstallerKey,
        observer: &mut dyn ProgramObserver,
    ) -> MilestoneState {
        let total = count(self.store.valid_serials(installer).len());

        let milestone_payments = self
            .store
            .payments_by_kind(installer, PaymentKind::Milestone);

        let claimed = milestones::claimed_tiers(&milestone_payments);
        let state = milestones::milestone_state(total, &claimed);

        if state.has_unclaimed_milestone {
            observer.on_milestone_unlocked(installer, &state);
        }

        state
    }

    /// Whether the installer may request a payment for their latest
    /// completed milestone tier.
    #[must_use]
    pub fn can_request_milestone_payment(&self, installer: InstallerKey) -> bool {
        let milestone_payments = self
            .store
            .payments_by_kind(installer, PaymentKind::Milestone);

        let claimed = milestones::claimed_tiers(&milestone_payments);
        let total = count(self.store.valid_serials(installer).len());
        let state = milestones::milestone_state(total, &claimed);

        payments::can_request_milestone_payment(&state, &milestone_payments)
    }
}

/// Clamp a collection length into the progress domain.
fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use crate::{
        installers::InstallerStatus,
        promotions::{EligibilityRules, Promotion, PromotionGoal, Reward, TargetPeriod},
        serials::{SerialRecord, SerialStatus},
        stores::memory::MemoryStore,
    };

    use super::*;

    fn installer() -> TestResult<Installer> {
        Ok(Installer {
            name: "Amara Okafor".to_string(),
            status: InstallerStatus::Active,
            registered_at: "2025-11-02T09:00:00Z".parse()?,
        })
    }

    fn promotion(goal: PromotionGoal) -> TestResult<Promotion> {
        Ok(Promotion {
            title: "Spring Sprint".to_string(),
            description: String::new(),
            goal,
            period: TargetPeriod::Total,
            eligibility: EligibilityRules::open_to_all(),
            reward: Reward {
                amount: Money::from_minor(25_000, GBP),
                description: "Flat bonus".to_string(),
            },
            starts_at: "2026-03-01T00:00:00Z".parse()?,
            ends_at: "2026-03-31T23:59:59Z".parse()?,
        })
    }

    fn serial(
        installer: InstallerKey,
        number: &str,
        installed_at: &str,
    ) -> TestResult<SerialRecord> {
        let installed_at: Timestamp = installed_at.parse()?;

        Ok(SerialRecord {
            installer,
            serial_number: number.to_string(),
            installed_at,
            status: SerialStatus::Active,
            city: "Lagos".to_string(),
            customer_rating: None,
            created_at: installed_at,
        })
    }

    #[derive(Default)]
    struct RecordingObserver {
        completions: Vec<String>,
        unlocked_tiers: Vec<u32>,
    }

    impl ProgramObserver for RecordingObserver {
        fn on_participation_completed(&mut self, participation: &Participation) {
            self.completions
                .push(format!("{:?}", participation.promotion()));
        }

        fn on_milestone_unlocked(&mut self, _installer: InstallerKey, state: &MilestoneState) {
            self.unlocked_tiers.push(state.completed_milestones);
        }
    }

    #[test]
    fn joining_an_unknown_promotion_fails() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());
        let profile = installer()?;
        let amara = engine.store_mut().insert_installer(profile.clone());

        let now: Timestamp = "2026-03-02T00:00:00Z".parse()?;

        let result = engine.join_promotion(amara, &profile, PromotionKey::default(), now);

        assert!(matches!(result, Err(EngineError::PromotionNotFound(_))));

        Ok(())
    }

    #[test]
    fn joining_twice_is_rejected() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());
        let profile = installer()?;
        let amara = engine.store_mut().insert_installer(profile.clone());

        let promo = engine
            .store_mut()
            .insert_promotion(promotion(PromotionGoal::InstallationTarget { target: 5 })?);

        let now: Timestamp = "2026-03-02T00:00:00Z".parse()?;

        engine.join_promotion(amara, &profile, promo, now)?;

        let result = engine.join_promotion(amara, &profile, promo, now);

        assert!(matches!(result, Err(EngineError::AlreadyJoined { .. })));

        Ok(())
    }

    #[test]
    fn joining_outside_the_window_is_rejected() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());
        let profile = installer()?;
        let amara = engine.store_mut().insert_installer(profile.clone());

        let promo = engine
            .store_mut()
            .insert_promotion(promotion(PromotionGoal::InstallationTarget { target: 5 })?);

        let before: Timestamp = "2026-02-20T00:00:00Z".parse()?;

        let result = engine.join_promotion(amara, &profile, promo, before);

        assert!(matches!(result, Err(EngineError::NotOpen { .. })));

        Ok(())
    }

    #[test]
    fn ineligible_installer_cannot_join() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());

        let mut profile = installer()?;
        profile.status = InstallerStatus::Suspended;

        let amara = engine.store_mut().insert_installer(profile.clone());

        let mut promo = promotion(PromotionGoal::InstallationTarget { target: 5 })?;
        promo.eligibility = EligibilityRules::with_required_status(InstallerStatus::Active);

        let promo = engine.store_mut().insert_promotion(promo);
        let now: Timestamp = "2026-03-02T00:00:00Z".parse()?;

        let result = engine.join_promotion(amara, &profile, promo, now);

        assert!(matches!(
            result,
            Err(EngineError::Ineligible(
                IneligibilityReason::StatusNotAllowed { .. }
            ))
        ));

        Ok(())
    }

    #[test]
    fn zero_target_promotion_cannot_be_joined() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());
        let profile = installer()?;
        let amara = engine.store_mut().insert_installer(profile.clone());

        let promo = engine
            .store_mut()
            .insert_promotion(promotion(PromotionGoal::InstallationTarget { target: 0 })?);

        let now: Timestamp = "2026-03-02T00:00:00Z".parse()?;

        let result = engine.join_promotion(amara, &profile, promo, now);

        assert!(matches!(
            result,
            Err(EngineError::Progress(ProgressError::ZeroTarget))
        ));

        Ok(())
    }

    #[test]
    fn recompute_for_an_unknown_pair_fails() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());
        let amara = engine.store_mut().insert_installer(installer()?);

        let now: Timestamp = "2026-03-02T00:00:00Z".parse()?;

        let result = engine.recompute_progress(amara, PromotionKey::default(), now);

        assert!(matches!(
            result,
            Err(EngineError::ParticipationNotFound { .. })
        ));

        Ok(())
    }

    #[test]
    fn completion_fires_the_observer_once() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());
        let profile = installer()?;
        let amara = engine.store_mut().insert_installer(profile.clone());

        let promo = engine
            .store_mut()
            .insert_promotion(promotion(PromotionGoal::InstallationTarget { target: 2 })?);

        let joined: Timestamp = "2026-03-02T00:00:00Z".parse()?;
        engine.join_promotion(amara, &profile, promo, joined)?;

        engine
            .store_mut()
            .insert_serial(serial(amara, "SX-1", "2026-03-03T00:00:00Z")?);

        engine
            .store_mut()
            .insert_serial(serial(amara, "SX-2", "2026-03-04T00:00:00Z")?);

        let now: Timestamp = "2026-03-05T00:00:00Z".parse()?;
        let mut observer = RecordingObserver::default();

        let first = engine.recompute_progress_with_observer(amara, promo, now, &mut observer)?;
        let later: Timestamp = "2026-03-06T00:00:00Z".parse()?;
        let second = engine.recompute_progress_with_observer(amara, promo, later, &mut observer)?;

        assert_eq!(first.status(), ParticipationStatus::Completed);
        assert_eq!(first.completed_at(), Some(now));
        assert_eq!(second.completed_at(), Some(now));
        assert_eq!(observer.completions.len(), 1);

        Ok(())
    }

    #[test]
    fn completion_wins_when_the_goal_was_met_after_the_window_closed() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());
        let profile = installer()?;
        let amara = engine.store_mut().insert_installer(profile.clone());

        let promo = engine
            .store_mut()
            .insert_promotion(promotion(PromotionGoal::InstallationTarget { target: 1 })?);

        let joined: Timestamp = "2026-03-02T00:00:00Z".parse()?;
        engine.join_promotion(amara, &profile, promo, joined)?;

        engine
            .store_mut()
            .insert_serial(serial(amara, "SX-1", "2026-03-10T00:00:00Z")?);

        // First recompute happens after the promotion has already ended.
        let after_end: Timestamp = "2026-04-05T00:00:00Z".parse()?;
        let row = engine.recompute_progress(amara, promo, after_end)?;

        assert_eq!(row.status(), ParticipationStatus::Completed);

        Ok(())
    }

    #[test]
    fn unmet_goal_past_the_window_expires() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());
        let profile = installer()?;
        let amara = engine.store_mut().insert_installer(profile.clone());

        let promo = engine
            .store_mut()
            .insert_promotion(promotion(PromotionGoal::InstallationTarget { target: 5 })?);

        let joined: Timestamp = "2026-03-02T00:00:00Z".parse()?;
        engine.join_promotion(amara, &profile, promo, joined)?;

        let after_end: Timestamp = "2026-04-05T00:00:00Z".parse()?;
        let row = engine.recompute_progress(amara, promo, after_end)?;

        assert_eq!(row.status(), ParticipationStatus::Expired);
        assert!(row.completed_at().is_none());

        Ok(())
    }

    #[test]
    fn milestone_query_notifies_when_a_tier_is_unclaimed() -> TestResult {
        let mut engine = ProgramEngine::new(MemoryStore::new());
        let amara = engine.store_mut().insert_installer(installer()?);

        for i in 0..10 {
            let number = format!("SX-{i}");
            let installed = format!("2026-01-{:02}T00:00:00Z", i + 1);

            engine
                .store_mut()
                .insert_serial(serial(amara, &number, &installed)?);
        }

        let mut observer = RecordingObserver::default();
        let state = engine.milestone_state_with_observer(amara, &mut observer);

        assert_eq!(state.completed_milestones, 1);
        assert_eq!(observer.unlocked_tiers, vec![1]);
        assert!(engine.can_request_milestone_payment(amara));

        Ok(())
    }
}
