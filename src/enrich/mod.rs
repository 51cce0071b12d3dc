use crate::errors::DataError;
use crate::ingest::{Table, is_missing};
use crate::sentiment::SentimentModel;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;
use tracing::warn;

const DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AppKind {
    Free,
    Paid,
}

impl AppKind {
    fn parse(raw: &str) -> Result<Self, DataError> {
        match raw.trim() {
            "Free" => Ok(Self::Free),
            "Paid" => Ok(Self::Paid),
            other => Err(DataError::parse("type", other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Paid => "Paid",
        }
    }
}

/// Rating buckets; each bound is inclusive on the lower end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RatingGroup {
    TopRated,
    AboveAverage,
    Average,
    BelowAverage,
}

impl RatingGroup {
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 4.0 {
            Self::TopRated
        } else if rating >= 3.0 {
            Self::AboveAverage
        } else if rating >= 2.0 {
            Self::Average
        } else {
            Self::BelowAverage
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TopRated => "Top rated app",
            Self::AboveAverage => "Above average",
            Self::Average => "Average",
            Self::BelowAverage => "Below average",
        }
    }
}

/// One application, fully typed, with every derived column materialized.
#[derive(Debug, Clone, Serialize)]
pub struct AppRecord {
    pub name: String,
    pub category: String,
    pub rating: f64,
    pub reviews: i64,
    pub size_mb: Option<f64>,
    pub installs: i64,
    pub kind: AppKind,
    pub price: f64,
    pub content_rating: String,
    pub genres: String,
    pub last_updated: Option<NaiveDate>,
    pub android_version: Option<f64>,
    pub log_installs: f64,
    pub log_reviews: f64,
    pub rating_group: RatingGroup,
    pub revenue: f64,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewRecord {
    pub app: String,
    pub text: String,
    pub subjectivity: Option<f64>,
    pub sentiment: f64,
}

/// One surviving (app, review) pair from the inner join. Apps with zero
/// reviews never produce a row here.
#[derive(Debug, Clone)]
pub struct JoinedReview {
    pub app_index: usize,
    pub sentiment: f64,
    pub subjectivity: Option<f64>,
}

pub fn derive_apps(table: &Table) -> Result<Vec<AppRecord>> {
    let name = table.required_column("apps", "App")?;
    let category = table.required_column("apps", "Category")?;
    let rating = table.required_column("apps", "Rating")?;
    let reviews = table.required_column("apps", "Reviews")?;
    let size = table.required_column("apps", "Size")?;
    let installs = table.required_column("apps", "Installs")?;
    let kind = table.required_column("apps", "Type")?;
    let price = table.required_column("apps", "Price")?;
    let content_rating = table.required_column("apps", "Content Rating")?;
    let genres = table.required_column("apps", "Genres")?;
    let last_updated = table.required_column("apps", "Last Updated")?;
    let android_version = table.required_column("apps", "Android Ver")?;

    let version_pattern =
        Regex::new(r"\d+(?:\.\d+)?").context("Failed to compile android version pattern")?;

    let mut records = Vec::with_capacity(table.len());
    for row in &table.rows {
        let rating_value = parse_f64("rating", &row[rating])?;
        let reviews_value = parse_i64("reviews", &row[reviews])?;
        let installs_value = parse_i64("installs", &row[installs])?;
        let price_value = parse_f64("price", &row[price])?;
        let updated = parse_date(&row[last_updated]);

        records.push(AppRecord {
            name: row[name].clone(),
            category: row[category].clone(),
            rating: rating_value,
            reviews: reviews_value,
            size_mb: parse_size_mb(&row[size]),
            installs: installs_value,
            kind: AppKind::parse(&row[kind])?,
            price: price_value,
            content_rating: row[content_rating].clone(),
            genres: row[genres].clone(),
            last_updated: updated,
            android_version: leading_version(&version_pattern, &row[android_version]),
            log_installs: (installs_value as f64).ln_1p(),
            log_reviews: (reviews_value as f64).ln_1p(),
            rating_group: RatingGroup::from_rating(rating_value),
            revenue: installs_value as f64 * price_value,
            year: updated.map(|date| date.year()),
        });
    }

    let missing_dates = records
        .iter()
        .filter(|record| record.last_updated.is_none())
        .count();
    if missing_dates * 10 > records.len() {
        warn!(
            missing_dates,
            "many update dates did not parse; date-bucketed views will exclude those rows"
        );
    }

    Ok(records)
}

pub fn derive_reviews(table: &Table, model: &dyn SentimentModel) -> Result<Vec<ReviewRecord>> {
    let app = table.required_column("reviews", "App")?;
    let text = table.required_column("reviews", "Translated_Review")?;
    let subjectivity = table.required_column("reviews", "Sentiment_Subjectivity")?;

    let records = table
        .rows
        .iter()
        .map(|row| ReviewRecord {
            app: row[app].clone(),
            text: row[text].clone(),
            subjectivity: parse_optional_f64(&row[subjectivity]),
            sentiment: model.compound(&row[text]),
        })
        .collect::<Vec<_>>();

    Ok(records)
}

/// Inner join on app name, many-to-one. Review order is preserved; a review
/// whose app is absent from the cleaned apps table is silently excluded, as
/// is any app without reviews. When a name survives de-duplication more than
/// once, the first occurrence wins as join target.
pub fn inner_join(apps: &[AppRecord], reviews: &[ReviewRecord]) -> Vec<JoinedReview> {
    let mut by_name = std::collections::HashMap::new();
    for (index, app) in apps.iter().enumerate() {
        by_name.entry(app.name.as_str()).or_insert(index);
    }

    reviews
        .iter()
        .filter_map(|review| {
            by_name.get(review.app.as_str()).map(|&app_index| JoinedReview {
                app_index,
                sentiment: review.sentiment,
                subjectivity: review.subjectivity,
            })
        })
        .collect()
}

/// `"19M"` is megabytes as-is, `"512k"` converts to megabytes; anything else
/// (`"Varies with device"` is common) is unknown, not an error.
pub fn parse_size_mb(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();

    if let Some(megabytes) = trimmed.strip_suffix('M') {
        return megabytes.parse::<f64>().ok();
    }
    if let Some(kilobytes) = trimmed.strip_suffix('k') {
        return kilobytes.parse::<f64>().ok().map(|value| value / 1024.0);
    }

    None
}

/// Free-text dates like `January 7, 2018`; an unparseable date degrades to
/// missing and date-bucketed views exclude the row.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn leading_version(pattern: &Regex, raw: &str) -> Option<f64> {
    pattern
        .find(raw)
        .and_then(|found| found.as_str().parse::<f64>().ok())
}

fn parse_f64(field: &'static str, raw: &str) -> Result<f64, DataError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DataError::parse(field, raw))
}

fn parse_i64(field: &'static str, raw: &str) -> Result<i64, DataError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| DataError::parse(field, raw))
}

fn parse_optional_f64(raw: &str) -> Option<f64> {
    if is_missing(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::{
        AppKind, AppRecord, RatingGroup, ReviewRecord, derive_apps, derive_reviews, inner_join,
        parse_date, parse_size_mb,
    };
    use crate::errors::DataError;
    use crate::ingest::Table;
    use crate::sentiment::SentimentModel;
    use chrono::NaiveDate;

    struct CannedModel(f64);

    impl SentimentModel for CannedModel {
        fn compound(&self, _text: &str) -> f64 {
            self.0
        }
    }

    fn app_record(name: &str, category: &str, installs: i64) -> AppRecord {
        AppRecord {
            name: name.to_string(),
            category: category.to_string(),
            rating: 4.0,
            reviews: 100,
            size_mb: Some(20.0),
            installs,
            kind: AppKind::Free,
            price: 0.0,
            content_rating: "Everyone".to_string(),
            genres: "Tools".to_string(),
            last_updated: NaiveDate::from_ymd_opt(2018, 1, 7),
            android_version: Some(4.1),
            log_installs: (installs as f64).ln_1p(),
            log_reviews: 100f64.ln_1p(),
            rating_group: RatingGroup::TopRated,
            revenue: 0.0,
            year: Some(2018),
        }
    }

    fn apps_table(rows: &[&[&str]]) -> Table {
        Table {
            headers: [
                "App",
                "Category",
                "Rating",
                "Reviews",
                "Size",
                "Installs",
                "Type",
                "Price",
                "Content Rating",
                "Genres",
                "Last Updated",
                "Android Ver",
            ]
            .iter()
            .map(|header| header.to_string())
            .collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn size_parsing_handles_both_units_and_unknowns() {
        assert_eq!(parse_size_mb("19M"), Some(19.0));
        assert_eq!(parse_size_mb("512k"), Some(0.5));
        assert_eq!(parse_size_mb("Varies with device"), None);
        assert_eq!(parse_size_mb(""), None);
    }

    #[test]
    fn rating_buckets_are_lower_bound_inclusive() {
        assert_eq!(RatingGroup::from_rating(4.5), RatingGroup::TopRated);
        assert_eq!(RatingGroup::from_rating(4.0), RatingGroup::TopRated);
        assert_eq!(RatingGroup::from_rating(3.2), RatingGroup::AboveAverage);
        assert_eq!(RatingGroup::from_rating(2.0), RatingGroup::Average);
        assert_eq!(RatingGroup::from_rating(1.9), RatingGroup::BelowAverage);
    }

    #[test]
    fn derives_revenue_logs_and_year() {
        let table = apps_table(&[&[
            "Alpha",
            "TOOLS",
            "4.5",
            "120",
            "19M",
            "1000",
            "Paid",
            "2.50",
            "Everyone",
            "Tools",
            "January 7, 2018",
            "4.0.3 and up",
        ]]);

        let apps = derive_apps(&table).expect("derive");
        let app = &apps[0];

        assert_eq!(app.revenue, 2500.0);
        assert_eq!(app.kind, AppKind::Paid);
        assert!((app.log_installs - 1001f64.ln()).abs() < 1e-9);
        assert!((app.log_reviews - 121f64.ln()).abs() < 1e-9);
        assert_eq!(app.year, Some(2018));
        assert_eq!(app.android_version, Some(4.0));
        assert_eq!(app.last_updated, NaiveDate::from_ymd_opt(2018, 1, 7));
    }

    #[test]
    fn free_apps_have_zero_revenue_regardless_of_installs() {
        let table = apps_table(&[&[
            "Alpha",
            "TOOLS",
            "4.5",
            "120",
            "19M",
            "50000000",
            "Free",
            "0",
            "Everyone",
            "Tools",
            "January 7, 2018",
            "4.0.3 and up",
        ]]);

        let apps = derive_apps(&table).expect("derive");
        assert_eq!(apps[0].revenue, 0.0);
    }

    #[test]
    fn non_numeric_reviews_count_is_fatal() {
        let table = apps_table(&[&[
            "Alpha",
            "TOOLS",
            "4.5",
            "many",
            "19M",
            "1000",
            "Free",
            "0",
            "Everyone",
            "Tools",
            "January 7, 2018",
            "4.0.3 and up",
        ]]);

        let error = derive_apps(&table)
            .expect_err("parse error")
            .downcast::<DataError>()
            .expect("typed error");
        assert_eq!(error, DataError::parse("reviews", "many"));
    }

    #[test]
    fn unparseable_date_and_version_degrade_to_missing() {
        let table = apps_table(&[&[
            "Alpha",
            "TOOLS",
            "4.5",
            "120",
            "Varies with device",
            "1000",
            "Free",
            "0",
            "Everyone",
            "Tools",
            "soon",
            "Varies with device",
        ]]);

        let apps = derive_apps(&table).expect("derive");
        assert_eq!(apps[0].last_updated, None);
        assert_eq!(apps[0].year, None);
        assert_eq!(apps[0].android_version, None);
        assert_eq!(apps[0].size_mb, None);
    }

    #[test]
    fn date_parsing_accepts_the_export_format() {
        assert_eq!(
            parse_date("January 7, 2018"),
            NaiveDate::from_ymd_opt(2018, 1, 7)
        );
        assert_eq!(
            parse_date("August 22, 2017"),
            NaiveDate::from_ymd_opt(2017, 8, 22)
        );
        assert_eq!(parse_date("Varies with device"), None);
    }

    #[test]
    fn reviews_carry_model_scores_and_degraded_subjectivity() {
        let table = Table {
            headers: vec![
                "App".to_string(),
                "Translated_Review".to_string(),
                "Sentiment_Subjectivity".to_string(),
            ],
            rows: vec![
                vec!["Alpha".to_string(), "Great".to_string(), "0.53".to_string()],
                vec!["Alpha".to_string(), "Meh".to_string(), "nan".to_string()],
            ],
        };

        let reviews = derive_reviews(&table, &CannedModel(0.25)).expect("derive");
        assert_eq!(reviews[0].sentiment, 0.25);
        assert_eq!(reviews[0].subjectivity, Some(0.53));
        assert_eq!(reviews[1].subjectivity, None);
    }

    #[test]
    fn join_excludes_apps_without_reviews_and_orphan_reviews() {
        let apps = vec![
            app_record("Alpha", "TOOLS", 100),
            app_record("Beta", "GAME", 200),
        ];
        let reviews = vec![
            ReviewRecord {
                app: "Alpha".to_string(),
                text: "Great".to_string(),
                subjectivity: Some(0.6),
                sentiment: 0.8,
            },
            ReviewRecord {
                app: "Ghost".to_string(),
                text: "Fine".to_string(),
                subjectivity: Some(0.2),
                sentiment: 0.1,
            },
            ReviewRecord {
                app: "Alpha".to_string(),
                text: "Bad".to_string(),
                subjectivity: Some(0.4),
                sentiment: -0.6,
            },
        ];

        let joined = inner_join(&apps, &reviews);

        assert_eq!(joined.len(), 2);
        assert!(joined.iter().all(|pair| pair.app_index == 0));
        assert_eq!(joined[0].sentiment, 0.8);
        assert_eq!(joined[1].sentiment, -0.6);
    }
}
