//! Solstice prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    engine::{EngineError, ProgramEngine},
    fixtures::{Fixture, FixtureError},
    installers::{Installer, InstallerKey, InstallerStatus},
    milestones::{MILESTONE_TIER_SIZE, MilestoneState, claimed_tiers, milestone_state},
    notifications::{NoopObserver, ProgramObserver},
    participations::{Participation, ParticipationStatus, ProgressSnapshot, RewardStatus},
    payments::{
        MilestoneRewardPolicy, Payment, PaymentKey, PaymentKind, PaymentStatus,
        can_request_milestone_payment,
    },
    progress::{ProgressError, ProgressEvaluation, evaluate, progress_fraction},
    promotions::{
        EligibilityRules, IneligibilityReason, Promotion, PromotionGoal, PromotionKey,
        PromotionStatus, Reward, TargetPeriod,
    },
    report::{Statement, StatementError, StatementRow},
    serials::{SerialKey, SerialRecord, SerialStatus},
    stores::{
        ParticipationStore, PaymentStore, PromotionStore, SerialStore, StoreError,
        memory::MemoryStore,
    },
};
