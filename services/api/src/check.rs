use crate::infra::{parse_timestamp, InMemoryIntervenantRepository};
use chrono::{DateTime, Utc};
use clap::Args;
use intervenant_availability::config::AppConfig;
use intervenant_availability::error::AppError;
use intervenant_availability::workflows::availability::{
    AvailabilityPageView, AvailabilityService,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Access key to validate
    #[arg(long)]
    pub(crate) key: String,
    /// JSON seed file with intervenant records (defaults to APP_SEED_PATH)
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
    /// Instant used for the expiry check, RFC 3339 (defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let seed = args.seed.or(config.availability.seed_path.clone());
    let repository = InMemoryIntervenantRepository::from_seed(seed.as_deref())?;

    let service = AvailabilityService::new(
        Arc::new(repository),
        Arc::new(config.availability.workweek_calendar()?),
        config.availability.engagement()?,
    );

    let now = args.now.unwrap_or_else(Utc::now);
    let report = service.report(&args.key, now)?;
    let view = AvailabilityPageView::from_report(&report)?;

    println!("{}", render_page(&view));
    Ok(())
}

fn render_page(view: &AvailabilityPageView) -> String {
    let mut lines = vec![view.title.clone()];

    if let Some(last_modified) = &view.last_modified {
        lines.push(format!("Dernière modification : {last_modified}"));
    }
    if let Some(notice) = &view.missing_weeks_notice {
        lines.push(String::new());
        lines.push(notice.clone());
    }
    if let Some(notice) = &view.insufficient_hours_notice {
        lines.push(String::new());
        lines.push(notice.heading.clone());
        lines.extend(notice.lines.iter().map(|line| format!("  - {line}")));
    }
    if view.result.is_complete() {
        lines.push(String::new());
        lines.push("Toutes les semaines sont complètes.".to_string());
    }

    lines.push(String::new());
    lines.push("Créneaux saisis :".to_string());
    if view.calendar.is_empty() {
        lines.push("  (aucun)".to_string());
    }
    lines.extend(
        view.calendar
            .iter()
            .map(|entry| format!("  {} {}-{}", entry.days, entry.from, entry.to)),
    );

    lines.join("\n")
}
