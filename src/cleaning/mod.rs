use crate::errors::DataError;
use crate::ingest::{Table, is_missing};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Cleans the apps table in place. Steps run in a fixed order and each is a
/// no-op when re-applied to already-clean data; surviving rows keep their
/// relative order throughout.
pub fn clean_apps(table: &mut Table) -> Result<()> {
    let rows_in = table.len();
    let rating = table.required_column("apps", "Rating")?;

    drop_unrated_rows(table, rating);
    mode_fill_missing(table, rating);
    drop_duplicate_rows(table);
    drop_out_of_range_ratings(table, rating);

    let installs = table.required_column("apps", "Installs")?;
    normalize_installs(table, installs)?;

    let price = table.required_column("apps", "Price")?;
    normalize_price(table, price)?;

    info!(rows_in, rows_out = table.len(), "cleaned apps table");
    Ok(())
}

/// Cleans the reviews table in place: rows without review text carry nothing
/// the sentiment stage can score, so they are dropped.
pub fn clean_reviews(table: &mut Table) -> Result<()> {
    let rows_in = table.len();
    let text = table.required_column("reviews", "Translated_Review")?;

    table.rows.retain(|row| !is_missing(&row[text]));

    info!(rows_in, rows_out = table.len(), "cleaned reviews table");
    Ok(())
}

/// An app without a rating cannot be scored, so the row is existentially
/// useless; a rating cell that does not read as a number counts as missing.
fn drop_unrated_rows(table: &mut Table, rating: usize) {
    table
        .rows
        .retain(|row| !is_missing(&row[rating]) && row[rating].trim().parse::<f64>().is_ok());
}

/// Fills missing cells of every column except the rating with that column's
/// most frequent value. Ties resolve to the first mode in first-seen order of
/// distinct values. Only raw source columns exist at this point; derived
/// columns are computed strictly after cleaning and are never filled.
fn mode_fill_missing(table: &mut Table, rating: usize) {
    for column in 0..table.headers.len() {
        if column == rating {
            continue;
        }

        let Some(mode) = column_mode(&table.rows, column) else {
            continue;
        };

        for row in &mut table.rows {
            if is_missing(&row[column]) {
                row[column] = mode.clone();
            }
        }
    }
}

fn column_mode(rows: &[Vec<String>], column: usize) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for row in rows {
        let cell = row[column].as_str();
        if is_missing(cell) {
            continue;
        }
        if !counts.contains_key(cell) {
            first_seen.push(cell);
        }
        *counts.entry(cell).or_insert(0) += 1;
    }

    let mut mode: Option<(&str, usize)> = None;
    for value in first_seen {
        let count = counts.get(value).copied().unwrap_or_default();
        if mode.map(|(_, best)| count > best).unwrap_or(true) {
            mode = Some((value, count));
        }
    }

    mode.map(|(value, _)| value.to_string())
}

fn drop_duplicate_rows(table: &mut Table) {
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    table.rows.retain(|row| seen.insert(row.clone()));
}

/// Malformed exports have been observed with ratings above 5; the lower bound
/// is checked as well since both are invariants downstream.
fn drop_out_of_range_ratings(table: &mut Table, rating: usize) {
    table.rows.retain(|row| {
        row[rating]
            .trim()
            .parse::<f64>()
            .map(|value| (0.0..=5.0).contains(&value))
            .unwrap_or(false)
    });
}

/// Rewrites install counts like `1,000,000+` to plain digits. A remainder
/// that is not purely numeric is a fatal parse error.
fn normalize_installs(table: &mut Table, installs: usize) -> Result<()> {
    for row in &mut table.rows {
        let raw = row[installs].trim();
        let stripped = raw.strip_suffix('+').unwrap_or(raw).replace(',', "");

        if stripped.is_empty() || !stripped.chars().all(|c| c.is_ascii_digit()) {
            return Err(DataError::parse("installs", raw).into());
        }
        row[installs] = stripped;
    }
    Ok(())
}

/// Rewrites prices like `$2.50` to a bare decimal. A remainder that is not
/// numeric is a fatal parse error.
fn normalize_price(table: &mut Table, price: usize) -> Result<()> {
    for row in &mut table.rows {
        let raw = row[price].trim();
        let stripped = raw.strip_prefix('$').unwrap_or(raw);

        if stripped.parse::<f64>().is_err() {
            return Err(DataError::parse("price", raw).into());
        }
        row[price] = stripped.to_string();
    }
    Ok(())
}
