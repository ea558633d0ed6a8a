//! Solstice
//!
//! Solstice is a loyalty programme engine for solar inverter installers, covering promotion progress tracking, milestone ladders and payment eligibility.

pub mod engine;
pub mod fixtures;
pub mod installers;
pub mod milestones;
pub mod notifications;
pub mod participations;
pub mod payments;
pub mod prelude;
pub mod progress;
pub mod promotions;
pub mod report;
pub mod serials;
pub mod stores;
pub mod utils;
