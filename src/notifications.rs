//! Notifications
//!
//! Observer hooks fired by the engine when progress evaluation crosses a
//! boundary worth telling someone about. Delivery (email, SMS, in-app) is a
//! collaborator concern; observers receive the event and the engine moves
//! on without waiting.

use crate::{installers::InstallerKey, milestones::MilestoneState, participations::Participation};

/// Observer for programme events.
///
/// All hooks default to no-ops, so an observer only implements the events
/// it cares about. The engine calls hooks after the relevant state has been
/// persisted, and ignores whatever the observer does with them.
pub trait ProgramObserver {
    /// Called when a participation first transitions to completed.
    fn on_participation_completed(&mut self, _participation: &Participation) {}

    /// Called when evaluation finds a completed milestone tier with no paid
    /// payment.
    fn on_milestone_unlocked(&mut self, _installer: InstallerKey, _state: &MilestoneState) {}
}

/// No-op observer for unobserved engine calls.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ProgramObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingObserver {
        completions: usize,
    }

    impl ProgramObserver for CountingObserver {
        fn on_participation_completed(&mut self, _participation: &Participation) {
            self.completions += 1;
        }
    }

    #[test]
    fn default_hooks_are_callable_without_an_implementation() {
        let mut observer = CountingObserver::default();
        let obs: &mut dyn ProgramObserver = &mut observer;

        let state = crate::milestones::milestone_state(0, &rustc_hash::FxHashSet::default());

        obs.on_milestone_unlocked(InstallerKey::default(), &state);

        assert_eq!(observer.completions, 0);
    }
}
