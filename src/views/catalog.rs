//! The 16 fixed view definitions. Each entry is a declarative
//! filter/group/aggregate recipe; the pipeline consumes them uniformly and in
//! order, and the dashboard depends on that order.

use super::{
    Clause, Dataset, NumField, ViewDef, Window, count_by, mean_by, monthly_series, next_month,
    retain, sum_by, top_n, translate,
};
use crate::chart::{
    BLUES, Figure, GREENS, ORRD, PASTEL, PLASMA, QUALITATIVE, RDBU, RDPU, VIVID, axis,
    band_shape, base_layout, color_cycle,
};
use crate::enrich::AppKind;
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};

pub const VIEWS: [ViewDef; 16] = [
    ViewDef {
        title: "Top Categories on Play Store",
        slug: "Category Graph 1",
        window: Window::ALWAYS,
        insight: "The top categories on the Play Store are dominated by tools, entertainment, and productivity apps.",
        build: top_categories,
    },
    ViewDef {
        title: "App Types Distribution",
        slug: "Type Graph 2",
        window: Window::ALWAYS,
        insight: "Most apps on the Play Store are free, indicating a strategy to attract users first and monetize through ads or in-app purchases.",
        build: kind_distribution,
    },
    ViewDef {
        title: "Rating Distribution",
        slug: "Rating Graph 3",
        window: Window::ALWAYS,
        insight: "Ratings are skewed towards higher values, suggesting that most apps are rated favorably by users.",
        build: rating_distribution,
    },
    ViewDef {
        title: "Sentiment Distribution",
        slug: "Sentiment Graph 4",
        window: Window::ALWAYS,
        insight: "Sentiments in reviews show a mix of positive and negative feedback, with a slight lean towards positive sentiments.",
        build: sentiment_distribution,
    },
    ViewDef {
        title: "Installs by Category",
        slug: "Installs Graph 5",
        window: Window::ALWAYS,
        insight: "The categories with the most installs are social and communication apps, reflecting their broad appeal and daily usage.",
        build: installs_by_category,
    },
    ViewDef {
        title: "Number of Updates Over the Years",
        slug: "Updates Graph 6",
        window: Window::ALWAYS,
        insight: "Updates have been increasing over the years, indicating that developers are actively maintaining and improving their apps.",
        build: updates_per_year,
    },
    ViewDef {
        title: "Revenue by Category",
        slug: "Revenue Graph 7",
        window: Window::ALWAYS,
        insight: "Categories such as Family and Lifestyle lead in revenue generation, indicating their monetization potential.",
        build: revenue_by_category,
    },
    ViewDef {
        title: "Top Genres",
        slug: "Genre Graph 8",
        window: Window::ALWAYS,
        insight: "Action and Entertainment genres are the most common, reflecting users' preference for engaging and easy-to-play games.",
        build: top_genres,
    },
    ViewDef {
        title: "Impact of Last Update on Rating",
        slug: "Update X Rating Graph 9",
        window: Window::ALWAYS,
        insight: "The scatter shows a weak correlation between the last update and ratings, suggesting that more frequent updates don't always result in better ratings.",
        build: update_impact,
    },
    ViewDef {
        title: "Rating for Paid vs Free Apps",
        slug: "Paid Free Graph 10",
        window: Window::ALWAYS,
        insight: "Paid apps generally have higher ratings compared to free apps, suggesting that users expect higher quality from apps they pay for.",
        build: rating_by_kind,
    },
    ViewDef {
        title: "Average Rating vs Total Reviews by Installs",
        slug: "Average Rating vs Total Reviews Graph 11",
        window: Window::hours(15, 17),
        insight: "High review counts (popularity) don't always guarantee a perfect average rating, even for top-tier apps.",
        build: rating_vs_reviews,
    },
    ViewDef {
        title: "Global Installs by Category (>1M, Synthetic Data)",
        slug: "Category Choropleth Graph 12",
        window: Window::hours(18, 20),
        insight: "Install volume concentrates in a handful of countries; the country assignment is synthetic and for illustration only.",
        build: global_installs,
    },
    ViewDef {
        title: "Avg Installs vs. Avg Revenue",
        slug: "Dual Axis Chart Graph 13",
        window: Window::hours(13, 14),
        insight: "'GAME' revenue depends on high installs, but 'PRODUCTIVITY' apps can succeed with a high-price, niche-user model.",
        build: installs_vs_revenue,
    },
    ViewDef {
        title: "Monthly Installs Trend",
        slug: "TimeSeries Graph 14",
        window: Window::hours(18, 21),
        insight: "'BUSINESS' app growth is volatile and spiky, whereas 'ENTERTAINMENT' app growth is stable and more predictable.",
        build: monthly_installs_trend,
    },
    ViewDef {
        title: "App Size vs. Rating",
        slug: "Bubble Chart Graph 15",
        window: Window::hours(17, 19),
        insight: "For popular apps, users clearly do not care about large file sizes as long as the quality (rating) is high.",
        build: size_vs_rating,
    },
    ViewDef {
        title: "Cumulative Installs Over Time",
        slug: "Stacked Area Graph 16",
        window: Window::hours(16, 18),
        insight: "'PHOTOGRAPHY' is the established market leader in installs, but 'PRODUCTIVITY' is the high-velocity challenger closing the gap.",
        build: cumulative_installs,
    },
];

const GROWTH_THRESHOLD_TREND: f64 = 0.20;
const GROWTH_THRESHOLD_CUMULATIVE: f64 = 0.25;
const MAP_INSTALL_FLOOR: f64 = 1_000_000.0;
const BUBBLE_SIZE_MAX: f64 = 50.0;

const TRANSLATIONS_TREND: &[(&str, &str)] = &[
    ("BEAUTY", "सौंदर्य (Beauty)"),
    ("BUSINESS", "வணிகம் (Business)"),
    ("DATING", "Dating"),
];

const TRANSLATIONS_BUBBLE: &[(&str, &str)] = &[
    ("BEAUTY", "सौंदर्य (Beauty)"),
    ("BUSINESS", "வணிகம் (Business)"),
    ("DATING", "Dating (German)"),
];

const TRANSLATIONS_CUMULATIVE: &[(&str, &str)] = &[
    ("TRAVEL_AND_LOCAL", "Voyage et local (Travel & Local)"),
    ("PRODUCTIVITY", "Productividad (Productivity)"),
    ("PHOTOGRAPHY", "写真 (Photography)"),
];

const BUBBLE_CATEGORIES: &[&str] = &[
    "GAME",
    "BEAUTY",
    "BUSINESS",
    "COMICS",
    "COMMUNICATION",
    "DATING",
    "ENTERTAINMENT",
    "SOCIAL",
    "EVENTS",
];

fn set(layout: &mut Value, key: &str, value: Value) {
    if let Some(object) = layout.as_object_mut() {
        object.insert(key.to_string(), value);
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn legend_below() -> Value {
    json!({
        "orientation": "h",
        "yanchor": "bottom",
        "y": -0.6,
        "xanchor": "center",
        "x": 0.5,
    })
}

fn top_categories(ds: &Dataset) -> Figure {
    let counts = top_n(count_by(&ds.apps, |app| app.category.clone()), 10);
    let (labels, values): (Vec<_>, Vec<_>) = counts.into_iter().unzip();
    let colors = color_cycle(PLASMA, labels.len());

    let trace = json!({
        "type": "bar",
        "x": labels,
        "y": values,
        "marker": {"color": colors},
    });

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Category"));
    set(&mut layout, "yaxis", axis("Count"));

    Figure::new(vec![trace], layout)
}

fn kind_distribution(ds: &Dataset) -> Figure {
    let counts = top_n(count_by(&ds.apps, |app| app.kind.label().to_string()), 2);
    let (labels, values): (Vec<_>, Vec<_>) = counts.into_iter().unzip();
    let colors = color_cycle(RDBU, labels.len());

    let trace = json!({
        "type": "pie",
        "labels": labels,
        "values": values,
        "marker": {"colors": colors},
    });

    Figure::new(vec![trace], base_layout())
}

fn rating_distribution(ds: &Dataset) -> Figure {
    let ratings = ds.apps.iter().map(|app| app.rating).collect::<Vec<_>>();

    let trace = json!({
        "type": "histogram",
        "x": ratings,
        "nbinsx": 20,
        "marker": {"color": "#636EFA"},
    });

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Rating"));
    set(&mut layout, "yaxis", axis("Count"));

    Figure::new(vec![trace], layout)
}

/// Counts per distinct compound score, most frequent first.
fn sentiment_distribution(ds: &Dataset) -> Figure {
    let mut order: Vec<f64> = Vec::new();
    let mut counts: HashMap<u64, f64> = HashMap::new();

    for review in &ds.reviews {
        let bits = review.sentiment.to_bits();
        if !counts.contains_key(&bits) {
            order.push(review.sentiment);
        }
        *counts.entry(bits).or_insert(0.0) += 1.0;
    }

    let mut series = order
        .into_iter()
        .map(|score| {
            let count = counts.get(&score.to_bits()).copied().unwrap_or_default();
            (score, count)
        })
        .collect::<Vec<_>>();
    series.sort_by(|left, right| {
        right
            .1
            .partial_cmp(&left.1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let (scores, tallies): (Vec<_>, Vec<_>) = series.into_iter().unzip();
    let colors = color_cycle(RDPU, scores.len());
    let trace = json!({
        "type": "bar",
        "x": scores,
        "y": tallies,
        "marker": {"color": colors},
    });

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Sentiment Score"));
    set(&mut layout, "yaxis", axis("Count"));

    Figure::new(vec![trace], layout)
}

fn installs_by_category(ds: &Dataset) -> Figure {
    let totals = top_n(
        sum_by(&ds.apps, |app| app.category.clone(), |app| app.installs as f64),
        10,
    );
    let (labels, values): (Vec<_>, Vec<_>) = totals.into_iter().unzip();
    let colors = color_cycle(BLUES, labels.len());

    let trace = json!({
        "type": "bar",
        "orientation": "h",
        "x": values,
        "y": labels,
        "marker": {"color": colors},
    });

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Installs"));
    set(&mut layout, "yaxis", axis("Category"));

    Figure::new(vec![trace], layout)
}

fn updates_per_year(ds: &Dataset) -> Figure {
    let mut per_year: std::collections::BTreeMap<i32, f64> = std::collections::BTreeMap::new();
    for app in &ds.apps {
        if let Some(year) = app.year {
            *per_year.entry(year).or_insert(0.0) += 1.0;
        }
    }

    let (years, counts): (Vec<_>, Vec<_>) = per_year.into_iter().unzip();
    let trace = json!({
        "type": "scatter",
        "mode": "lines",
        "x": years,
        "y": counts,
        "line": {"color": "#AB63FA"},
    });

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Year"));
    set(&mut layout, "yaxis", axis("Number of Updates"));

    Figure::new(vec![trace], layout)
}

fn revenue_by_category(ds: &Dataset) -> Figure {
    let totals = top_n(
        sum_by(&ds.apps, |app| app.category.clone(), |app| app.revenue),
        10,
    );
    let (labels, values): (Vec<_>, Vec<_>) = totals.into_iter().unzip();
    let colors = color_cycle(GREENS, labels.len());

    let trace = json!({
        "type": "bar",
        "x": labels,
        "y": values,
        "marker": {"color": colors},
    });

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Category"));
    set(&mut layout, "yaxis", axis("Revenue"));

    Figure::new(vec![trace], layout)
}

fn top_genres(ds: &Dataset) -> Figure {
    let genres = ds
        .apps
        .iter()
        .flat_map(|app| {
            app.genres
                .split(';')
                .map(|genre| genre.trim().to_string())
                .filter(|genre| !genre.is_empty())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let counts = top_n(count_by(&genres, |genre| genre.clone()), 10);
    let (labels, values): (Vec<_>, Vec<_>) = counts.into_iter().unzip();
    let colors = color_cycle(ORRD, labels.len());

    let trace = json!({
        "type": "bar",
        "x": labels,
        "y": values,
        "marker": {"color": colors},
    });

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Genre"));
    set(&mut layout, "yaxis", axis("Count"));

    Figure::new(vec![trace], layout)
}

fn update_impact(ds: &Dataset) -> Figure {
    let traces = [AppKind::Free, AppKind::Paid]
        .iter()
        .enumerate()
        .map(|(index, kind)| {
            let dated = ds
                .apps
                .iter()
                .filter(|app| app.kind == *kind && app.last_updated.is_some())
                .collect::<Vec<_>>();

            let dates = dated
                .iter()
                .filter_map(|app| app.last_updated.map(iso))
                .collect::<Vec<_>>();
            let ratings = dated.iter().map(|app| app.rating).collect::<Vec<_>>();

            json!({
                "type": "scatter",
                "mode": "markers",
                "x": dates,
                "y": ratings,
                "name": kind.label(),
                "marker": {"color": VIVID[index % VIVID.len()]},
            })
        })
        .collect::<Vec<_>>();

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Last Updated"));
    set(&mut layout, "yaxis", axis("Rating"));

    Figure::new(traces, layout)
}

fn rating_by_kind(ds: &Dataset) -> Figure {
    let traces = [AppKind::Free, AppKind::Paid]
        .iter()
        .enumerate()
        .map(|(index, kind)| {
            let ratings = ds
                .apps
                .iter()
                .filter(|app| app.kind == *kind)
                .map(|app| app.rating)
                .collect::<Vec<_>>();

            json!({
                "type": "box",
                "y": ratings,
                "name": kind.label(),
                "marker": {"color": PASTEL[index % PASTEL.len()]},
            })
        })
        .collect::<Vec<_>>();

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Type"));
    set(&mut layout, "yaxis", axis("Rating"));

    Figure::new(traces, layout)
}

/// Large January-updated apps, only categories averaging 4.0+, ranked by
/// installs; mean rating on the left axis against summed reviews on the right.
fn rating_vs_reviews(ds: &Dataset) -> Figure {
    let sized = retain(
        &ds.apps,
        &[
            Clause::AtLeast(NumField::SizeMb, 10.0),
            Clause::UpdatedInMonth(1),
        ],
    );

    let qualified = mean_by(&sized, |app| app.category.clone(), |app| app.rating)
        .into_iter()
        .filter(|(_, rating)| *rating >= 4.0)
        .map(|(category, _)| category)
        .collect::<Vec<_>>();
    let sized = sized
        .into_iter()
        .filter(|app| qualified.contains(&app.category))
        .collect::<Vec<_>>();

    let ranked = top_n(
        sum_by(&sized, |app| app.category.clone(), |app| app.installs as f64),
        10,
    )
    .into_iter()
    .map(|(category, _)| category)
    .collect::<Vec<_>>();
    let kept = sized
        .into_iter()
        .filter(|app| ranked.contains(&app.category))
        .collect::<Vec<_>>();

    let mut ratings = mean_by(&kept, |app| app.category.clone(), |app| app.rating);
    ratings.sort_by(|left, right| {
        right
            .1
            .partial_cmp(&left.1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let review_totals = sum_by(&kept, |app| app.category.clone(), |app| app.reviews as f64)
        .into_iter()
        .collect::<HashMap<_, _>>();

    let categories = ratings
        .iter()
        .map(|(category, _)| category.clone())
        .collect::<Vec<_>>();
    let averages = ratings.iter().map(|(_, rating)| *rating).collect::<Vec<_>>();
    let totals = categories
        .iter()
        .map(|category| review_totals.get(category).copied().unwrap_or_default())
        .collect::<Vec<_>>();

    let average_labels = averages
        .iter()
        .map(|value| format!("{value:.2}"))
        .collect::<Vec<_>>();
    let rating_trace = json!({
        "type": "bar",
        "x": categories.clone(),
        "y": averages,
        "name": "Average Rating",
        "marker": {"color": "rgb(26, 118, 255)"},
        "text": average_labels,
        "textposition": "auto",
    });
    let review_trace = json!({
        "type": "bar",
        "x": categories,
        "y": totals.clone(),
        "name": "Total Reviews",
        "yaxis": "y2",
        "marker": {"color": "rgb(255, 127, 14)"},
        "text": totals,
        "texttemplate": "%{text:.2s}",
        "textposition": "auto",
    });

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Category"));
    set(
        &mut layout,
        "yaxis",
        json!({
            "title": {"text": "Average Rating (out of 5)", "font": {"size": 12}},
            "range": [3.5, 5],
            "gridcolor": "gray",
        }),
    );
    set(
        &mut layout,
        "yaxis2",
        json!({
            "title": {"text": "Total Number of Reviews", "font": {"size": 12}},
            "overlaying": "y",
            "side": "right",
            "gridcolor": "gray",
        }),
    );
    set(&mut layout, "legend", legend_below());

    Figure::new(vec![rating_trace, review_trace], layout)
}

/// Synthetic-geography view: excludes a fixed set of category initials,
/// keeps the top-5 remaining categories by installs, sums installs per
/// random-assigned country, and maps countries above the floor.
fn global_installs(ds: &Dataset) -> Figure {
    let exclusion = Clause::CategoryStartsWithNone(&['A', 'C', 'G', 'S']);
    let rows = ds
        .apps
        .iter()
        .zip(ds.synthetic_country.iter().copied())
        .filter(|(app, _)| exclusion.matches(app))
        .collect::<Vec<_>>();

    let top5 = top_n(
        sum_by(&rows, |(app, _)| app.category.clone(), |(app, _)| app.installs as f64),
        5,
    )
    .into_iter()
    .map(|(category, _)| category)
    .collect::<Vec<_>>();
    let kept = rows
        .into_iter()
        .filter(|(app, _)| top5.contains(&app.category))
        .collect::<Vec<_>>();

    let per_country = sum_by(&kept, |(_, country)| country.to_string(), |(app, _)| {
        app.installs as f64
    })
    .into_iter()
    .filter(|(_, installs)| *installs > MAP_INSTALL_FLOOR)
    .collect::<Vec<_>>();

    let (locations, installs): (Vec<_>, Vec<_>) = per_country.into_iter().unzip();
    let trace = json!({
        "type": "choropleth",
        "locations": locations,
        "z": installs,
        "locationmode": "ISO-3",
        "colorscale": "Plasma",
        "colorbar": {"title": {"text": "Installs"}},
    });

    let mut layout = base_layout();
    set(
        &mut layout,
        "geo",
        json!({
            "bgcolor": "black",
            "lakecolor": "black",
            "landcolor": "gray",
            "subunitcolor": "white",
            "scope": "world",
        }),
    );

    Figure::new(vec![trace], layout)
}

/// Free and Paid legs over the top-3 categories; mean installs against mean
/// revenue on a grouped dual-axis bar.
fn installs_vs_revenue(ds: &Dataset) -> Figure {
    let top3 = top_n(count_by(&ds.apps, |app| app.category.clone()), 3)
        .into_iter()
        .map(|(category, _)| category)
        .collect::<Vec<_>>();

    let shared = |kind: AppKind| -> Vec<Clause> {
        vec![
            Clause::KindIs(kind),
            Clause::AtLeast(NumField::Installs, 10_000.0),
            Clause::Above(NumField::AndroidVersion, 4.0),
            Clause::Above(NumField::SizeMb, 15.0),
            Clause::ContentRatingIs("Everyone"),
            Clause::NameLenAtMost(30),
            Clause::CategoryIn(top3.clone()),
        ]
    };

    let free = retain(&ds.apps, &shared(AppKind::Free));
    let mut paid_clauses = shared(AppKind::Paid);
    paid_clauses.push(Clause::AtLeast(NumField::Revenue, 10_000.0));
    let paid = retain(&ds.apps, &paid_clauses);

    let legs = [
        ("F", free, "#1f77b4", "#d62728"),
        ("P", paid, "#aec7e8", "#ff9896"),
    ];

    let mut traces = Vec::with_capacity(4);
    for (tag, rows, install_color, revenue_color) in legs {
        let install_means = mean_by(&rows, |app| app.category.clone(), |app| app.installs as f64);
        let revenue_means = mean_by(&rows, |app| app.category.clone(), |app| app.revenue)
            .into_iter()
            .collect::<HashMap<_, _>>();

        let categories = install_means
            .iter()
            .map(|(category, _)| category.clone())
            .collect::<Vec<_>>();
        let installs = install_means
            .iter()
            .map(|(_, mean)| *mean)
            .collect::<Vec<_>>();
        let revenue = categories
            .iter()
            .map(|category| revenue_means.get(category).copied().unwrap_or_default())
            .collect::<Vec<_>>();

        traces.push(json!({
            "type": "bar",
            "x": categories.clone(),
            "y": installs,
            "name": format!("Avg-Inst({tag})"),
            "marker": {"color": install_color},
        }));
        traces.push(json!({
            "type": "bar",
            "x": categories,
            "y": revenue,
            "name": format!("Avg-Rev({tag})"),
            "yaxis": "y2",
            "marker": {"color": revenue_color},
        }));
    }

    let mut layout = base_layout();
    set(&mut layout, "barmode", json!("group"));
    set(&mut layout, "xaxis", axis("Top 3 Categories"));
    set(&mut layout, "yaxis", axis("Average Installs"));
    set(
        &mut layout,
        "yaxis2",
        json!({
            "title": {"text": "Average Revenue ($)", "font": {"size": 12}},
            "overlaying": "y",
            "side": "right",
            "gridcolor": "#444",
        }),
    );
    set(&mut layout, "legend", legend_below());

    Figure::new(traces, layout)
}

/// Monthly summed installs per translated category, with highlight bands on
/// months whose month-over-month growth clears the threshold.
fn monthly_installs_trend(ds: &Dataset) -> Figure {
    let filtered = retain(
        &ds.apps,
        &[
            Clause::Above(NumField::Reviews, 500.0),
            Clause::NameStartsWithNone(&['x', 'y', 'z', 'X', 'Y', 'Z']),
            Clause::NameLacksCharFold('s'),
            Clause::CategoryStartsWithAny(&['E', 'C', 'B']),
        ],
    );

    let series = monthly_series(
        &filtered,
        |app| translate(TRANSLATIONS_TREND, &app.category),
        |app| app.last_updated,
        |app| app.installs as f64,
    );

    let mut shapes = Vec::new();
    let mut traces = Vec::with_capacity(series.len());
    for (index, (group, points)) in series.iter().enumerate() {
        for point in points {
            if point.growth.is_some_and(|growth| growth > GROWTH_THRESHOLD_TREND) {
                shapes.push(band_shape(
                    &iso(point.month),
                    &iso(next_month(point.month)),
                    "lightgreen",
                    0.2,
                ));
            }
        }

        traces.push(json!({
            "type": "scatter",
            "mode": "lines",
            "x": points.iter().map(|point| iso(point.month)).collect::<Vec<_>>(),
            "y": points.iter().map(|point| point.total).collect::<Vec<_>>(),
            "name": group,
            "line": {"color": QUALITATIVE[index % QUALITATIVE.len()]},
        }));
    }

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Month"));
    set(&mut layout, "yaxis", axis("Total Installs"));
    set(&mut layout, "shapes", Value::Array(shapes));
    set(&mut layout, "legend", json!({"font": {"size": 10}}));

    Figure::new(traces, layout)
}

/// Bubble chart of size against rating for high-subjectivity, widely
/// installed apps; bubble area tracks installs.
fn size_vs_rating(ds: &Dataset) -> Figure {
    let mut subjectivity_sums: HashMap<usize, (f64, f64)> = HashMap::new();
    for pair in &ds.joined {
        if let Some(subjectivity) = pair.subjectivity {
            let entry = subjectivity_sums.entry(pair.app_index).or_insert((0.0, 0.0));
            entry.0 += subjectivity;
            entry.1 += 1.0;
        }
    }
    let mean_subjectivity = subjectivity_sums
        .into_iter()
        .map(|(index, (sum, count))| (index, sum / count))
        .collect::<HashMap<_, _>>();

    let clauses = [
        Clause::Above(NumField::Rating, 3.5),
        Clause::CategoryIn(
            BUBBLE_CATEGORIES
                .iter()
                .map(|category| category.to_string())
                .collect(),
        ),
        Clause::Above(NumField::Reviews, 500.0),
        Clause::NameLacksCharFold('s'),
        Clause::Above(NumField::Installs, 50_000.0),
        Clause::Present(NumField::SizeMb),
    ];
    let kept = ds
        .apps
        .iter()
        .enumerate()
        .filter(|(index, app)| {
            clauses.iter().all(|clause| clause.matches(app))
                && mean_subjectivity
                    .get(index)
                    .is_some_and(|subjectivity| *subjectivity > 0.5)
        })
        .map(|(_, app)| app)
        .collect::<Vec<_>>();

    let max_installs = kept
        .iter()
        .map(|app| app.installs as f64)
        .fold(1.0f64, f64::max);
    let sizeref = 2.0 * max_installs / (BUBBLE_SIZE_MAX * BUBBLE_SIZE_MAX);

    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&crate::enrich::AppRecord>> = HashMap::new();
    for app in kept {
        let label = translate(TRANSLATIONS_BUBBLE, &app.category);
        if !groups.contains_key(&label) {
            group_order.push(label.clone());
        }
        groups.entry(label).or_default().push(app);
    }

    let mut palette_cursor = 0usize;
    let traces = group_order
        .iter()
        .map(|label| {
            let rows = groups.get(label).map(Vec::as_slice).unwrap_or_default();
            let color = if label == "GAME" {
                "pink".to_string()
            } else {
                let color = QUALITATIVE[palette_cursor % QUALITATIVE.len()].to_string();
                palette_cursor += 1;
                color
            };

            json!({
                "type": "scatter",
                "mode": "markers",
                "x": rows.iter().filter_map(|app| app.size_mb).collect::<Vec<_>>(),
                "y": rows.iter().map(|app| app.rating).collect::<Vec<_>>(),
                "name": label,
                "text": rows.iter().map(|app| app.name.clone()).collect::<Vec<_>>(),
                "marker": {
                    "size": rows.iter().map(|app| app.installs as f64).collect::<Vec<_>>(),
                    "sizemode": "area",
                    "sizeref": sizeref,
                    "color": color,
                },
            })
        })
        .collect::<Vec<_>>();

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Size (MB)"));
    set(&mut layout, "yaxis", axis("Average Rating"));
    set(&mut layout, "legend", json!({"font": {"size": 9}}));

    Figure::new(traces, layout)
}

/// Cumulative monthly installs per translated category as a stacked area,
/// with bands over months where any category's growth clears the threshold.
fn cumulative_installs(ds: &Dataset) -> Figure {
    let filtered = retain(
        &ds.apps,
        &[
            Clause::AtLeast(NumField::Rating, 4.2),
            Clause::NameHasNoDigit,
            Clause::CategoryStartsWithAny(&['T', 'P']),
            Clause::Above(NumField::Reviews, 1000.0),
            Clause::Between(NumField::SizeMb, 20.0, 80.0),
        ],
    );

    let series = monthly_series(
        &filtered,
        |app| translate(TRANSLATIONS_CUMULATIVE, &app.category),
        |app| app.last_updated,
        |app| app.installs as f64,
    );

    let mut growth_months: HashSet<NaiveDate> = HashSet::new();
    for (_, points) in &series {
        for point in points {
            if point
                .growth
                .is_some_and(|growth| growth > GROWTH_THRESHOLD_CUMULATIVE)
            {
                growth_months.insert(point.month);
            }
        }
    }
    let mut band_months = growth_months.into_iter().collect::<Vec<_>>();
    band_months.sort();
    let shapes = band_months
        .into_iter()
        .map(|month| band_shape(&iso(month), &iso(next_month(month)), "yellow", 0.3))
        .collect::<Vec<_>>();

    let traces = series
        .iter()
        .enumerate()
        .map(|(index, (group, points))| {
            let mut running = 0.0;
            let cumulative = points
                .iter()
                .map(|point| {
                    running += point.total;
                    running
                })
                .collect::<Vec<_>>();

            json!({
                "type": "scatter",
                "mode": "lines",
                "stackgroup": "one",
                "x": points.iter().map(|point| iso(point.month)).collect::<Vec<_>>(),
                "y": cumulative,
                "name": group,
                "line": {"color": QUALITATIVE[index % QUALITATIVE.len()]},
            })
        })
        .collect::<Vec<_>>();

    let mut layout = base_layout();
    set(&mut layout, "xaxis", axis("Month"));
    set(&mut layout, "yaxis", axis("Cumulative Installs"));
    set(&mut layout, "shapes", Value::Array(shapes));
    set(&mut layout, "legend", json!({"font": {"size": 9}}));

    Figure::new(traces, layout)
}

#[cfg(test)]
mod tests {
    use super::VIEWS;
    use crate::enrich::{AppKind, AppRecord, RatingGroup, ReviewRecord};
    use crate::views::Dataset;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn app(name: &str, category: &str, installs: i64) -> AppRecord {
        AppRecord {
            name: name.to_string(),
            category: category.to_string(),
            rating: 4.1,
            reviews: 600,
            size_mb: Some(25.0),
            installs,
            kind: AppKind::Free,
            price: 0.0,
            content_rating: "Everyone".to_string(),
            genres: "Tools".to_string(),
            last_updated: NaiveDate::from_ymd_opt(2018, 1, 7),
            android_version: Some(4.1),
            log_installs: (installs as f64).ln_1p(),
            log_reviews: 600f64.ln_1p(),
            rating_group: RatingGroup::TopRated,
            revenue: 0.0,
            year: Some(2018),
        }
    }

    fn review(app_name: &str, sentiment: f64, subjectivity: f64) -> ReviewRecord {
        ReviewRecord {
            app: app_name.to_string(),
            text: "canned".to_string(),
            subjectivity: Some(subjectivity),
            sentiment,
        }
    }

    fn dataset(apps: Vec<AppRecord>, reviews: Vec<ReviewRecord>) -> Dataset {
        let mut rng = StdRng::seed_from_u64(42);
        Dataset::new(apps, reviews, &mut rng)
    }

    #[test]
    fn catalog_has_sixteen_unique_well_formed_views() {
        assert_eq!(VIEWS.len(), 16);

        let slugs = VIEWS.iter().map(|view| view.slug).collect::<HashSet<_>>();
        assert_eq!(slugs.len(), 16);

        for view in &VIEWS {
            assert!(view.window.start < view.window.end);
            assert!(view.window.end <= 24);
            assert!(!view.title.is_empty());
            assert!(!view.insight.is_empty());
            assert!(!view.div_id().contains(' '));
        }
    }

    #[test]
    fn every_view_builds_a_figure_from_a_small_dataset() {
        let ds = dataset(
            vec![
                app("Alpha", "TOOLS", 1000),
                app("Beta", "GAME", 2_000_000),
                app("Gamma", "PHOTOGRAPHY", 500),
            ],
            vec![
                review("Alpha", 0.4, 0.6),
                review("Alpha", -0.2, 0.3),
                review("Beta", 0.9, 0.8),
            ],
        );

        for view in &VIEWS {
            let figure = (view.build)(&ds);
            assert!(
                figure.layout.is_object(),
                "view '{}' produced no layout",
                view.title
            );
        }
    }

    #[test]
    fn top_install_ranking_is_descending_with_first_seen_ties() {
        // GAME and TOOLS tie on summed installs; GAME appears first in the
        // table, so it must rank ahead after the stable sort.
        let ds = dataset(
            vec![
                app("A", "GAME", 300),
                app("B", "FAMILY", 1000),
                app("C", "TOOLS", 200),
                app("D", "TOOLS", 100),
                app("E", "FAMILY", 500),
            ],
            vec![
                review("A", 0.5, 0.6),
                review("A", 0.1, 0.4),
                review("B", -0.3, 0.2),
                review("C", 0.7, 0.9),
                review("E", 0.2, 0.5),
            ],
        );

        let figure = (VIEWS[4].build)(&ds);
        let labels = figure.traces[0]["y"]
            .as_array()
            .expect("labels")
            .iter()
            .map(|value| value.as_str().expect("label").to_string())
            .collect::<Vec<_>>();

        assert_eq!(labels, vec!["FAMILY", "GAME", "TOOLS"]);
    }

    #[test]
    fn review_dependent_views_exclude_unreviewed_apps() {
        let ds = dataset(
            vec![app("Reviewed", "TOOLS", 1000), app("Silent", "GAME", 9000)],
            vec![review("Reviewed", 0.8, 0.9)],
        );

        assert_eq!(ds.joined.len(), 1);
        assert_eq!(ds.joined[0].app_index, 0);

        let figure = (VIEWS[3].build)(&ds);
        let scores = figure.traces[0]["x"].as_array().expect("scores");
        assert_eq!(scores.len(), 1);
    }

    #[test]
    fn trend_view_translates_categories_and_flags_growth() {
        let mut apps = Vec::new();
        for (month, installs) in [(1, 100), (2, 150), (3, 90)] {
            let mut record = app(&format!("Bright{month}"), "BUSINESS", installs);
            record.last_updated = NaiveDate::from_ymd_opt(2018, month, 10);
            apps.push(record);
        }
        let ds = dataset(apps, Vec::new());

        let figure = (VIEWS[13].build)(&ds);
        assert_eq!(figure.traces.len(), 1);
        assert_eq!(figure.traces[0]["name"], "வணிகம் (Business)");

        // Only the 50% February jump clears the 20% threshold.
        let shapes = figure.layout["shapes"].as_array().expect("shapes");
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0]["x0"], "2018-02-01");
        assert_eq!(shapes[0]["x1"], "2018-03-01");
    }

    #[test]
    fn choropleth_only_maps_countries_above_the_floor() {
        // TOOLS passes the initial-letter exclusion; two million installs on
        // one app guarantees its country clears the 1M floor.
        let ds = dataset(
            vec![app("Alpha", "TOOLS", 2_000_000), app("Beta", "TOOLS", 10)],
            Vec::new(),
        );

        let figure = (VIEWS[11].build)(&ds);
        let locations = figure.traces[0]["locations"].as_array().expect("locations");
        let installs = figure.traces[0]["z"].as_array().expect("installs");

        assert_eq!(locations.len(), 1);
        assert!(installs[0].as_f64().expect("installs") > 1_000_000.0);
    }

    #[test]
    fn excluded_category_initials_never_reach_the_map() {
        let ds = dataset(
            vec![
                app("Alpha", "ART_AND_DESIGN", 5_000_000),
                app("Beta", "COMICS", 5_000_000),
                app("Gamma", "GAME", 5_000_000),
                app("Delta", "SOCIAL", 5_000_000),
            ],
            Vec::new(),
        );

        let figure = (VIEWS[11].build)(&ds);
        let locations = figure.traces[0]["locations"].as_array().expect("locations");
        assert!(locations.is_empty());
    }

    #[test]
    fn bubble_view_pins_game_pink_and_respects_subjectivity() {
        let mut game = app("Arcade", "GAME", 100_000);
        game.rating = 4.6;
        game.reviews = 900;
        let mut muted = app("Quiet", "COMICS", 100_000);
        muted.rating = 4.6;
        muted.reviews = 900;

        let ds = dataset(
            vec![game, muted],
            vec![
                review("Arcade", 0.9, 0.8),
                // Low subjectivity keeps COMICS out of the bubble view.
                review("Quiet", 0.9, 0.1),
            ],
        );

        let figure = (VIEWS[14].build)(&ds);
        assert_eq!(figure.traces.len(), 1);
        assert_eq!(figure.traces[0]["name"], "GAME");
        assert_eq!(figure.traces[0]["marker"]["color"], "pink");
    }

    #[test]
    fn cumulative_view_accumulates_per_category() {
        let mut apps = Vec::new();
        for (name, month, installs) in [("PhotoJan", 1, 100), ("PhotoFeb", 2, 200), ("PhotoMar", 3, 400)] {
            let mut record = app(name, "PHOTOGRAPHY", installs);
            record.rating = 4.5;
            record.reviews = 2000;
            record.last_updated = NaiveDate::from_ymd_opt(2018, month, 3);
            apps.push(record);
        }
        let ds = dataset(apps, Vec::new());

        let figure = (VIEWS[15].build)(&ds);
        assert_eq!(figure.traces.len(), 1);
        assert_eq!(figure.traces[0]["name"], "写真 (Photography)");

        let cumulative = figure.traces[0]["y"]
            .as_array()
            .expect("cumulative")
            .iter()
            .map(|value| value.as_f64().expect("number"))
            .collect::<Vec<_>>();
        assert_eq!(cumulative, vec![100.0, 300.0, 700.0]);

        // Both the 100% and 100% monthly jumps clear the 25% threshold.
        let shapes = figure.layout["shapes"].as_array().expect("shapes");
        assert_eq!(shapes.len(), 2);
    }

    #[test]
    fn dual_axis_view_separates_free_and_paid_legs() {
        let mut free = app("Casual", "GAME", 50_000);
        free.size_mb = Some(40.0);
        free.android_version = Some(5.0);
        let mut paid = app("Pro", "GAME", 20_000);
        paid.kind = AppKind::Paid;
        paid.price = 5.0;
        paid.revenue = 100_000.0;
        paid.size_mb = Some(40.0);
        paid.android_version = Some(5.0);

        let ds = dataset(vec![free, paid], Vec::new());
        let figure = (VIEWS[12].build)(&ds);

        assert_eq!(figure.traces.len(), 4);
        assert_eq!(figure.traces[0]["name"], "Avg-Inst(F)");
        assert_eq!(figure.traces[3]["name"], "Avg-Rev(P)");
        assert_eq!(figure.layout["barmode"], "group");
    }
}
