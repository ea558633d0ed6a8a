//! Statement Example
//!
//! Replays an installer's season through the loyalty programme: joins each
//! campaign on its opening day, recomputes progress as of the statement
//! date, then prints the resulting statement.
//!
//! Use `-f` to load a fixture set by name
//! Use `-i` to pick the installer by fixture key
//! Use `-a` to change the statement date

use std::{
    io::{self, Write},
    time::Instant,
};

use anyhow::Result;
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use solstice::{
    engine::{EngineError, ProgramEngine},
    fixtures::Fixture,
    promotions::{Promotion, PromotionKey},
    report::{Statement, StatementRow},
    stores::{ParticipationStore, PromotionStore},
    utils::StatementArgs,
};

/// Statement Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let args = StatementArgs::parse();

    let fixture = Fixture::from_set(&args.fixture)?;
    let installer = fixture.installer_key(&args.installer)?;
    let profile = fixture.installer(&args.installer)?.clone();

    let mut campaigns: Vec<(PromotionKey, Promotion)> = fixture
        .promotion_keys()
        .filter_map(|(_, key)| {
            fixture
                .store()
                .promotion(key)
                .map(|promotion| (key, promotion))
        })
        .collect();

    campaigns.sort_by(|a, b| {
        a.1.starts_at
            .cmp(&b.1.starts_at)
            .then_with(|| a.1.title.cmp(&b.1.title))
    });

    let mut engine = ProgramEngine::new(fixture.into_store());

    let start = Instant::now();

    // Join each campaign the day it opens; ineligible ones are reported and
    // skipped rather than aborting the replay.
    for (key, promotion) in &campaigns {
        match engine.join_promotion(installer, &profile, *key, promotion.starts_at) {
            Ok(_participation) => {}
            Err(EngineError::Ineligible(reason)) => {
                println!(" Skipping \"{}\": {reason}", promotion.title);
            }
            Err(error) => return Err(error.into()),
        }
    }

    for (key, _promotion) in &campaigns {
        if engine.store().participation(installer, *key).is_some() {
            engine.recompute_progress(installer, *key, args.as_of)?;
        }
    }

    let milestone = engine.milestone_state(installer);
    let can_request = engine.can_request_milestone_payment(installer);
    let payment_amount = engine.default_payment_amount();

    let mut rows: Vec<StatementRow> = engine
        .store()
        .participations_for_installer(installer)
        .into_iter()
        .filter_map(|participation| {
            engine
                .store()
                .promotion(participation.promotion())
                .map(|promotion| StatementRow {
                    promotion,
                    participation,
                })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.participation
            .joined_at()
            .cmp(&b.participation.joined_at())
            .then_with(|| a.promotion.title.cmp(&b.promotion.title))
    });

    let elapsed = start.elapsed();

    let statement = Statement::new(
        profile,
        args.as_of,
        rows,
        milestone,
        can_request,
        payment_amount,
    );

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    statement.write_to(&mut handle)?;

    writeln!(
        handle,
        " {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}
