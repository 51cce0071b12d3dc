pub mod catalog;

use crate::chart::Figure;
use crate::enrich::{AppKind, AppRecord, JoinedReview, ReviewRecord, inner_join};
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use std::collections::HashMap;

pub use catalog::VIEWS;

/// Everything the view builders read: the cleaned, enriched tables plus the
/// synthetic country column (illustrative only, never real geography).
pub struct Dataset {
    pub apps: Vec<AppRecord>,
    pub reviews: Vec<ReviewRecord>,
    pub joined: Vec<JoinedReview>,
    pub synthetic_country: Vec<&'static str>,
}

impl Dataset {
    pub fn new<R: Rng>(apps: Vec<AppRecord>, reviews: Vec<ReviewRecord>, rng: &mut R) -> Self {
        let joined = inner_join(&apps, &reviews);
        let synthetic_country = assign_countries(apps.len(), rng);

        Self {
            apps,
            reviews,
            joined,
            synthetic_country,
        }
    }
}

/// Hourly visibility window, half-open: a chart shows while
/// `start <= local_hour < end`. `(0, 24)` is always visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: u8,
    pub end: u8,
}

impl Window {
    pub const ALWAYS: Self = Self { start: 0, end: 24 };

    pub const fn hours(start: u8, end: u8) -> Self {
        Self { start, end }
    }
}

/// One view definition: a fixed filter/group/aggregate recipe plus its chart
/// metadata. The 16 instances live in [`catalog::VIEWS`] and are consumed
/// uniformly by the pipeline.
pub struct ViewDef {
    pub title: &'static str,
    pub slug: &'static str,
    pub window: Window,
    pub insight: &'static str,
    pub build: fn(&Dataset) -> Figure,
}

impl ViewDef {
    pub fn file_name(&self) -> String {
        format!("{}.html", self.slug)
    }

    pub fn div_id(&self) -> String {
        self.slug
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect()
    }
}

pub enum NumField {
    Rating,
    Installs,
    Reviews,
    SizeMb,
    Revenue,
    AndroidVersion,
}

/// One conjunctive filter clause. A row passes a view's filter only if every
/// clause holds; comparisons against a missing numeric field never hold.
pub enum Clause {
    AtLeast(NumField, f64),
    Above(NumField, f64),
    Between(NumField, f64, f64),
    Present(NumField),
    KindIs(AppKind),
    ContentRatingIs(&'static str),
    CategoryIn(Vec<String>),
    CategoryStartsWithAny(&'static [char]),
    CategoryStartsWithNone(&'static [char]),
    NameLenAtMost(usize),
    NameLacksCharFold(char),
    NameStartsWithNone(&'static [char]),
    NameHasNoDigit,
    UpdatedInMonth(u32),
}

impl Clause {
    pub fn matches(&self, app: &AppRecord) -> bool {
        match self {
            Self::AtLeast(field, bound) => numeric(app, field).is_some_and(|v| v >= *bound),
            Self::Above(field, bound) => numeric(app, field).is_some_and(|v| v > *bound),
            Self::Between(field, low, high) => {
                numeric(app, field).is_some_and(|v| v >= *low && v <= *high)
            }
            Self::Present(field) => numeric(app, field).is_some(),
            Self::KindIs(kind) => app.kind == *kind,
            Self::ContentRatingIs(rating) => app.content_rating == *rating,
            Self::CategoryIn(categories) => categories.iter().any(|c| c == &app.category),
            Self::CategoryStartsWithAny(prefixes) => starts_with_any(&app.category, prefixes),
            Self::CategoryStartsWithNone(prefixes) => !starts_with_any(&app.category, prefixes),
            Self::NameLenAtMost(max) => app.name.chars().count() <= *max,
            Self::NameLacksCharFold(needle) => {
                !app.name.to_lowercase().contains(needle.to_ascii_lowercase())
            }
            Self::NameStartsWithNone(prefixes) => !starts_with_any(&app.name, prefixes),
            Self::NameHasNoDigit => !app.name.chars().any(|c| c.is_ascii_digit()),
            Self::UpdatedInMonth(month) => {
                app.last_updated.is_some_and(|date| date.month() == *month)
            }
        }
    }
}

fn numeric(app: &AppRecord, field: &NumField) -> Option<f64> {
    match field {
        NumField::Rating => Some(app.rating),
        NumField::Installs => Some(app.installs as f64),
        NumField::Reviews => Some(app.reviews as f64),
        NumField::SizeMb => app.size_mb,
        NumField::Revenue => Some(app.revenue),
        NumField::AndroidVersion => app.android_version,
    }
}

fn starts_with_any(value: &str, prefixes: &[char]) -> bool {
    value
        .chars()
        .next()
        .map(|first| prefixes.contains(&first))
        .unwrap_or(false)
}

pub fn retain<'a>(apps: &'a [AppRecord], clauses: &[Clause]) -> Vec<&'a AppRecord> {
    apps.iter()
        .filter(|app| clauses.iter().all(|clause| clause.matches(app)))
        .collect()
}

/// Per-key sums in first-seen key order.
pub fn sum_by<T>(
    items: &[T],
    key: impl Fn(&T) -> String,
    value: impl Fn(&T) -> f64,
) -> Vec<(String, f64)> {
    let mut order = Vec::new();
    let mut totals: HashMap<String, f64> = HashMap::new();

    for item in items {
        let item_key = key(item);
        if !totals.contains_key(&item_key) {
            order.push(item_key.clone());
        }
        *totals.entry(item_key).or_insert(0.0) += value(item);
    }

    order
        .into_iter()
        .map(|item_key| {
            let total = totals.get(&item_key).copied().unwrap_or_default();
            (item_key, total)
        })
        .collect()
}

pub fn count_by<T>(items: &[T], key: impl Fn(&T) -> String) -> Vec<(String, f64)> {
    sum_by(items, key, |_| 1.0)
}

/// Per-key means in first-seen key order.
pub fn mean_by<T>(
    items: &[T],
    key: impl Fn(&T) -> String,
    value: impl Fn(&T) -> f64,
) -> Vec<(String, f64)> {
    let counts = count_by(items, &key);
    let sums = sum_by(items, &key, value);

    sums.into_iter()
        .zip(counts)
        .map(|((item_key, sum), (_, count))| (item_key, if count > 0.0 { sum / count } else { 0.0 }))
        .collect()
}

/// Largest-N by value, descending. The sort is stable, so equal values keep
/// their first-seen order.
pub fn top_n(mut series: Vec<(String, f64)>, n: usize) -> Vec<(String, f64)> {
    series.sort_by(|left, right| {
        right
            .1
            .partial_cmp(&left.1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    series.truncate(n);
    series
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthPoint {
    pub month: NaiveDate,
    pub total: f64,
    /// Month-over-month relative change; None for the group's first bucket
    /// (and after an empty previous bucket, where the ratio is undefined).
    pub growth: Option<f64>,
}

/// Buckets items into calendar months per group, sums a metric, and derives
/// month-over-month growth. Groups come out in first-seen order, months
/// ascending within each group. Items without a date are excluded.
pub fn monthly_series<T>(
    items: &[T],
    group: impl Fn(&T) -> String,
    date: impl Fn(&T) -> Option<NaiveDate>,
    value: impl Fn(&T) -> f64,
) -> Vec<(String, Vec<MonthPoint>)> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, std::collections::BTreeMap<NaiveDate, f64>> = HashMap::new();

    for item in items {
        let Some(item_date) = date(item) else {
            continue;
        };
        let item_key = group(item);
        if !buckets.contains_key(&item_key) {
            order.push(item_key.clone());
        }
        *buckets
            .entry(item_key)
            .or_default()
            .entry(month_start(item_date))
            .or_insert(0.0) += value(item);
    }

    order
        .into_iter()
        .map(|item_key| {
            let months = buckets.remove(&item_key).unwrap_or_default();
            let mut points = Vec::with_capacity(months.len());
            let mut previous: Option<f64> = None;

            for (month, total) in months {
                let growth = previous
                    .filter(|value| *value != 0.0)
                    .map(|value| (total - value) / value);
                points.push(MonthPoint {
                    month,
                    total,
                    growth,
                });
                previous = Some(total);
            }

            (item_key, points)
        })
        .collect()
}

/// Decorative localized category labels; codes absent from the lookup pass
/// through unchanged.
pub fn translate(lookup: &[(&str, &str)], category: &str) -> String {
    lookup
        .iter()
        .find(|(code, _)| *code == category)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| category.to_string())
}

/// Closed list of ISO-3 codes for the synthetic geography column.
pub const COUNTRY_CODES: &[&str] = &[
    "USA", "IND", "CHN", "BRA", "RUS", "GBR", "DEU", "FRA", "JPN", "CAN", "AUS", "MEX", "IDN",
    "PAK", "NGA", "BGD", "EGY", "VNM", "TUR", "IRN", "THA", "ZAF", "ITA", "ESP", "KOR", "COL",
    "ARG", "POL", "UKR", "SAU",
];

/// Uniformly-random country per row. Illustrative mapping data only; every
/// consumer must label it as synthetic.
pub fn assign_countries<R: Rng>(count: usize, rng: &mut R) -> Vec<&'static str> {
    (0..count)
        .map(|_| COUNTRY_CODES[rng.gen_range(0..COUNTRY_CODES.len())])
        .collect()
}
