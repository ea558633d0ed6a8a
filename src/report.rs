//! Statement Rendering
//!
//! Renders an installer's loyalty statement: one table row per promotion
//! participation, followed by a milestone summary block. Output is plain
//! text with ANSI colour, suitable for a terminal.

use std::io;

use decimal_percentage::Percentage;
use jiff::Timestamp;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::{SmallVec, smallvec};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    installers::Installer,
    milestones::{MILESTONE_TIER_SIZE, MilestoneState},
    participations::{Participation, ParticipationStatus},
    promotions::Promotion,
};

/// Cells in the statement progress bar.
const BAR_CELLS: usize = 10;

/// Errors that can occur when rendering a statement.
#[derive(Debug, Error)]
pub enum StatementError {
    /// IO error
    #[error("IO error")]
    IO,
}

/// One participation line in a statement.
#[derive(Debug, Clone)]
pub struct StatementRow {
    /// Promotion definition the row reports on
    pub promotion: Promotion,

    /// The installer's participation in it
    pub participation: Participation,
}

/// An installer's loyalty statement at a point in time.
#[derive(Debug, Clone)]
pub struct Statement {
    installer: Installer,
    as_of: Timestamp,
    rows: Vec<StatementRow>,
    milestone: MilestoneState,
    can_request_payment: bool,
    payment_amount: Money<'static, Currency>,
}

impl Statement {
    /// Assemble a statement from already-loaded rows.
    ///
    /// `can_request_payment` and `payment_amount` come from the engine's
    /// milestone gate; the statement only displays them.
    #[must_use]
    pub fn new(
        installer: Installer,
        as_of: Timestamp,
        rows: Vec<StatementRow>,
        milestone: MilestoneState,
        can_request_payment: bool,
        payment_amount: Money<'static, Currency>,
    ) -> Self {
        Self {
            installer,
            as_of,
            rows,
            milestone,
            can_request_payment,
            payment_amount,
        }
    }

    /// The installer the statement is for.
    #[must_use]
    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    /// When the statement was taken.
    #[must_use]
    pub fn as_of(&self) -> Timestamp {
        self.as_of
    }

    /// Participation lines, in the order supplied.
    #[must_use]
    pub fn rows(&self) -> &[StatementRow] {
        &self.rows
    }

    /// The installer's milestone ladder position.
    #[must_use]
    pub fn milestone(&self) -> &MilestoneState {
        &self.milestone
    }

    /// Whether a milestone payment can be requested right now.
    #[must_use]
    pub fn can_request_payment(&self) -> bool {
        self.can_request_payment
    }

    /// Amount a milestone payment request would ask for.
    #[must_use]
    pub fn payment_amount(&self) -> Money<'static, Currency> {
        self.payment_amount
    }

    /// Render the statement.
    ///
    /// # Errors
    ///
    /// Returns a [`StatementError`] if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), StatementError> {
        writeln!(
            out,
            "\n Loyalty statement for \x1b[1m{}\x1b[0m as of {}",
            self.installer.name,
            self.as_of.strftime("%Y-%m-%d"),
        )
        .map_err(|_err| StatementError::IO)?;

        if self.rows.is_empty() {
            writeln!(out, "\n No promotions joined.").map_err(|_err| StatementError::IO)?;
        } else {
            write_participation_table(&mut out, &self.rows)?;
        }

        write_milestone_summary(&mut out, self)?;

        Ok(())
    }
}

fn write_participation_table(
    out: &mut impl io::Write,
    rows: &[StatementRow],
) -> Result<(), StatementError> {
    let mut builder = Builder::default();

    builder.push_record(["Promotion", "Goal", "Status", "Progress", "%", "Reward"]);

    let mut color_ops: SmallVec<[(usize, usize, Color); 32]> = smallvec![];

    for (idx, row) in rows.iter().enumerate() {
        let snapshot = row.participation.progress();
        let table_row = idx + 1;

        builder.push_record([
            row.promotion.title.clone(),
            format!("{} {}", row.promotion.goal.target(), row.promotion.goal.unit()),
            status_cell(&row.participation),
            format!(
                "{} {}/{}",
                progress_bar(snapshot.percentage),
                snapshot.current,
                snapshot.target,
            ),
            format!("{}%", percent_points(snapshot.percentage)),
            reward_cell(row),
        ]);

        color_ops.push((table_row, 1, color_dark_grey()));

        match row.participation.status() {
            ParticipationStatus::Completed => color_ops.push((table_row, 2, Color::FG_GREEN)),
            ParticipationStatus::Expired => color_ops.push((table_row, 2, color_dark_grey())),
            ParticipationStatus::Active => {}
        }
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..6), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    let table_str = grey_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| StatementError::IO)
}

fn write_milestone_summary(
    out: &mut impl io::Write,
    statement: &Statement,
) -> Result<(), StatementError> {
    let milestone = &statement.milestone;
    let total = milestone.completed_milestones * MILESTONE_TIER_SIZE + milestone.current_progress;

    let installations_label = " Installations:";
    let tier_label = " Milestone tier:";
    let progress_label = " Tier progress:";
    let payment_label = " \x1b[1mMilestone payment:\x1b[0m";

    let installations_val = format!("{total} valid");

    let tier_val = match milestone.next_milestone_at {
        Some(remaining) => format!(
            "{} completed, {remaining} to go",
            milestone.completed_milestones,
        ),
        None => format!("{} completed", milestone.completed_milestones),
    };

    let progress_val = format!(
        "({}%) {}/{}",
        percent_points(milestone.progress_percentage),
        milestone.current_progress,
        MILESTONE_TIER_SIZE,
    );

    let payment_val = if statement.can_request_payment {
        format!(
            "\x1b[1m{} available to request\x1b[0m",
            statement.payment_amount,
        )
    } else if milestone.has_unclaimed_milestone {
        "request in review".to_string()
    } else {
        "up to date".to_string()
    };

    let label_width = display_width(installations_label)
        .max(display_width(tier_label))
        .max(display_width(progress_label))
        .max(display_width(payment_label));

    write_aligned_line(out, installations_label, &installations_val, label_width)?;
    write_aligned_line(out, tier_label, &tier_val, label_width)?;
    write_aligned_line(out, progress_label, &progress_val, label_width)?;
    write_aligned_line(out, payment_label, &payment_val, label_width)?;

    writeln!(out).map_err(|_err| StatementError::IO)
}

/// Status cell text; completed rows carry the completion date.
fn status_cell(participation: &Participation) -> String {
    match participation.status() {
        ParticipationStatus::Active => "active".to_string(),
        ParticipationStatus::Expired => "expired".to_string(),
        ParticipationStatus::Completed => match participation.completed_at() {
            Some(at) => format!("completed {}", at.strftime("%Y-%m-%d")),
            None => "completed".to_string(),
        },
    }
}

/// Reward cell text; paid-out rewards are marked.
fn reward_cell(row: &StatementRow) -> String {
    if row.participation.reward_claimed() {
        format!("{} (paid)", row.promotion.reward.amount)
    } else {
        row.promotion.reward.amount.to_string()
    }
}

/// Ten-cell progress bar for a capped fraction.
fn progress_bar(percentage: Percentage) -> String {
    let cells = ((percentage * Decimal::ONE) * Decimal::from(BAR_CELLS)).round_dp(0);
    let filled = cells.to_usize().unwrap_or(0).min(BAR_CELLS);

    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
}

/// Converts a fractional percentage to percent points for display.
fn percent_points(percentage: Percentage) -> Decimal {
    ((percentage * Decimal::ONE) * Decimal::from(100_u32)).round_dp(2)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes,
/// leaving cell content untouched.
fn grey_borders(rendered: &str) -> String {
    let mut out = String::with_capacity(rendered.len() + 256);
    let mut in_run = false;

    for ch in rendered.chars() {
        let border = ('\u{2500}'..='\u{257F}').contains(&ch);

        match (border, in_run) {
            (true, false) => {
                out.push_str("\x1b[90m");
                in_run = true;
            }
            (false, true) => {
                out.push_str("\x1b[0m");
                in_run = false;
            }
            _ => {}
        }

        out.push(ch);
    }

    if in_run {
        out.push_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn display_width(s: &str) -> usize {
    let mut width = 0_usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes one summary line with a right-aligned label column.
fn write_aligned_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
) -> Result<(), StatementError> {
    let label_pad = label_col_width.saturating_sub(display_width(label));

    writeln!(out, "{:>label_pad$}{label}  {value}", "").map_err(|_err| StatementError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}
