use std::fmt::Write;

use anyhow::Result;
use chrono::Duration;

use crate::{
    query::{ranked, Period, PeriodSummary},
    store::{entity::Category, TimeSeriesStore},
    utils::{
        percentage::{duration_percentage, Percentage},
        time::date_to_record_name,
    },
};

#[derive(Debug, Clone, clap::Args)]
pub struct ReportCommand {
    #[arg(short, long, default_value = "today", help = "Period to summarize")]
    pub period: Period,
    #[arg(short, long, help = "List websites instead of applications")]
    pub websites: bool,
    #[arg(short, long, default_value_t = 10, help = "Number of entries listed")]
    pub top: usize,
    #[arg(short = 'm', long = "min-share", help = "Hide entries below this share of the period", default_value_t = Percentage::ZERO)]
    pub min_share: Percentage,
}

/// Renders totals of both categories followed by the longest used entities of one of them.
pub fn render_report(store: &TimeSeriesStore, command: &ReportCommand) -> Result<String> {
    let summary = PeriodSummary::compute(store, command.period);
    let mut out = String::new();

    match command.period.range(summary.today) {
        Some((from, to)) if from == to => writeln!(
            out,
            "Screen time {} ({})",
            command.period,
            date_to_record_name(from)
        )?,
        Some((from, to)) => writeln!(
            out,
            "Screen time {} ({} - {})",
            command.period,
            date_to_record_name(from),
            date_to_record_name(to)
        )?,
        None => writeln!(out, "Screen time {}", command.period)?,
    }
    for (name, category) in [
        ("Applications", Category::Application),
        ("Websites", Category::Website),
    ] {
        let totals = summary.of(category);
        writeln!(
            out,
            "{name}\t{}\t{} switches\t{} used",
            format_duration(totals.total_time),
            totals.switches,
            totals.distinct
        )?;
    }

    let category = if command.websites {
        Category::Website
    } else {
        Category::Application
    };
    let whole = summary.of(category).total_time;
    let entries = ranked(store.entities(category), command.period, summary.today)
        .into_iter()
        .map(|(entity, time)| (entity, time, duration_percentage(time, whole)))
        .filter(|(_, _, share)| *share >= command.min_share)
        .take(command.top)
        .collect::<Vec<_>>();
    if !entries.is_empty() {
        writeln!(out)?;
    }
    for (entity, time, share) in entries {
        writeln!(
            out,
            "{}%\t{}\t{}",
            share.round() as i32,
            format_duration(time),
            entity.key
        )?;
    }
    Ok(out)
}

pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}
