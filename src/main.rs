mod chart;
mod cleaning;
mod cli;
mod config;
mod enrich;
mod errors;
mod ingest;
mod report;
mod sentiment;
mod views;

use crate::cli::{Cli, Commands};
use crate::config::ReportConfig;
use crate::sentiment::LexiconModel;
use crate::views::Dataset;
use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            apps,
            reviews,
            out,
            open,
        } => {
            let config = ReportConfig::from_args(apps, reviews, out, open);
            let mut rng = StdRng::from_entropy();
            run_report_pipeline(&config, &mut rng)
        }
        Commands::Doctor { apps, reviews, out } => {
            let config = ReportConfig::from_args(apps, reviews, out, false);
            handle_doctor(&config)
        }
    }
}

/// One linear batch pass: load, clean, derive, join, then evaluate the 16
/// views in order. Every per-chart file lands before the dashboard is
/// composed; any structural error aborts the run with no report.
fn run_report_pipeline<R: Rng>(config: &ReportConfig, rng: &mut R) -> Result<()> {
    let mut apps_table = ingest::load_table(&config.apps_path, "apps", ingest::APP_COLUMNS)?;
    let mut reviews_table =
        ingest::load_table(&config.reviews_path, "reviews", ingest::REVIEW_COLUMNS)?;
    info!(
        apps = apps_table.len(),
        reviews = reviews_table.len(),
        "loaded datasets"
    );

    cleaning::clean_apps(&mut apps_table)?;
    cleaning::clean_reviews(&mut reviews_table)?;

    let model = LexiconModel::new();
    let apps = enrich::derive_apps(&apps_table)?;
    let reviews = enrich::derive_reviews(&reviews_table, &model)?;
    let dataset = Dataset::new(apps, reviews, rng);
    info!(
        apps = dataset.apps.len(),
        joined_reviews = dataset.joined.len(),
        "derived features"
    );

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    let mut fragments = Vec::with_capacity(views::VIEWS.len());
    for view in &views::VIEWS {
        let figure = (view.build)(&dataset);

        let chart_path = config.chart_path(&view.file_name());
        fs::write(&chart_path, chart::render_standalone(&figure, view.title)?)
            .with_context(|| format!("Failed to write chart: {}", chart_path.display()))?;

        fragments.push(report::ChartFragment::new(view, &figure)?);
    }
    info!(charts = fragments.len(), "rendered chart files");

    let dashboard =
        report::write_dashboard(&config.output_dir, config::DASHBOARD_FILE, &fragments)?;
    info!(dashboard = %dashboard.display(), "composed dashboard");

    if config.open_report {
        report::open_in_viewer(&dashboard);
    }

    Ok(())
}

fn handle_doctor(config: &ReportConfig) -> Result<()> {
    let mut issues = Vec::new();

    match ingest::load_table(&config.apps_path, "apps", ingest::APP_COLUMNS) {
        Ok(table) => println!(
            "[OK] apps dataset readable: {} ({} rows)",
            config.apps_path.display(),
            table.len()
        ),
        Err(error) => {
            println!("[WARN] apps dataset check failed: {error}");
            issues.push("apps dataset unusable");
        }
    }

    match ingest::load_table(&config.reviews_path, "reviews", ingest::REVIEW_COLUMNS) {
        Ok(table) => println!(
            "[OK] reviews dataset readable: {} ({} rows)",
            config.reviews_path.display(),
            table.len()
        ),
        Err(error) => {
            println!("[WARN] reviews dataset check failed: {error}");
            issues.push("reviews dataset unusable");
        }
    }

    match fs::create_dir_all(&config.output_dir) {
        Ok(()) => println!(
            "[OK] output directory ready: {}",
            config.output_dir.display()
        ),
        Err(error) => {
            println!("[WARN] output directory unavailable: {error}");
            issues.push("output directory unavailable");
        }
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run_report_pipeline;
    use crate::config::ReportConfig;
    use crate::views::VIEWS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;

    const APPS_CSV: &str = concat!(
        "App,Category,Rating,Reviews,Size,Installs,Type,Price,Content Rating,Genres,Last Updated,Android Ver\n",
        "Chat Hub,COMMUNICATION,4.4,12000,25M,\"1,000,000+\",Free,0,Everyone,Communication,\"January 7, 2018\",4.0.3 and up\n",
        "Pixel Draw,ART_AND_DESIGN,4.1,970,5.3M,\"10,000+\",Free,0,Everyone,Art & Design;Creativity,\"February 11, 2018\",4.2 and up\n",
        "Budget Pro,FINANCE,4.7,310,Varies with device,\"5,000+\",Paid,$4.99,Everyone,Finance,\"March 1, 2018\",5.0 and up\n",
    );

    const REVIEWS_CSV: &str = concat!(
        "App,Translated_Review,Sentiment_Subjectivity\n",
        "Chat Hub,Great app I love it,0.9\n",
        "Chat Hub,Terrible update it crashes,0.7\n",
        "Pixel Draw,Nice and easy to use,0.6\n",
        "Pixel Draw,Not good,0.4\n",
        "Budget Pro,Love the clean design,0.8\n",
    );

    #[test]
    fn end_to_end_run_produces_all_charts_and_the_dashboard() {
        let dir = tempfile::tempdir().expect("temp dir");
        let apps_path = dir.path().join("apps.csv");
        let reviews_path = dir.path().join("reviews.csv");
        fs::write(&apps_path, APPS_CSV).expect("write apps fixture");
        fs::write(&reviews_path, REVIEWS_CSV).expect("write reviews fixture");

        let out = dir.path().join("report");
        let config = ReportConfig::from_args(
            Some(apps_path),
            Some(reviews_path),
            Some(out.clone()),
            false,
        );

        let mut rng = StdRng::seed_from_u64(1);
        run_report_pipeline(&config, &mut rng).expect("pipeline");

        for view in &VIEWS {
            assert!(
                out.join(view.file_name()).exists(),
                "missing chart file for '{}'",
                view.title
            );
        }

        let dashboard = fs::read_to_string(out.join("index.html")).expect("dashboard");
        let mut last_position = 0;
        for view in &VIEWS {
            let marker = format!("id=\"{}\"", view.div_id());
            let position = dashboard
                .find(&marker)
                .unwrap_or_else(|| panic!("container missing for '{}'", view.title));
            assert!(position > last_position, "containers out of order");
            last_position = position;
        }
    }

    #[test]
    fn missing_apps_file_aborts_with_no_dashboard() {
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("report");
        let config = ReportConfig::from_args(
            Some(dir.path().join("absent.csv")),
            Some(dir.path().join("also-absent.csv")),
            Some(out.clone()),
            false,
        );

        let mut rng = StdRng::seed_from_u64(1);
        assert!(run_report_pipeline(&config, &mut rng).is_err());
        assert!(!out.join("index.html").exists());
    }
}
