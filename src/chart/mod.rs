use anyhow::{Context, Result};
use serde_json::{Value, json};

pub const PLOT_WIDTH: u32 = 400;
pub const PLOT_HEIGHT: u32 = 300;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

pub const PLASMA: &[&str] = &[
    "#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953", "#fb9f3a",
    "#fdca26", "#f0f921",
];
pub const RDBU: &[&str] = &[
    "#053061", "#2166ac", "#4393c3", "#92c5de", "#d1e5f0", "#f7f7f7", "#fddbc7", "#f4a582",
    "#d6604d", "#b2182b", "#67001f",
];
pub const BLUES: &[&str] = &[
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];
pub const GREENS: &[&str] = &[
    "#f7fcf5", "#e5f5e0", "#c7e9c0", "#a1d99b", "#74c476", "#41ab5d", "#238b45", "#006d2c",
    "#00441b",
];
pub const ORRD: &[&str] = &[
    "#fff7ec", "#fee8c8", "#fdd49e", "#fdbb84", "#fc8d59", "#ef6548", "#d7301f", "#b30000",
    "#7f0000",
];
pub const RDPU: &[&str] = &[
    "#fff7f3", "#fde0dd", "#fcc5c0", "#fa9fb5", "#f768a1", "#dd3497", "#ae017e", "#7a0177",
    "#49006a",
];
pub const VIVID: &[&str] = &[
    "#E58606", "#5D69B1", "#52BCA3", "#99C945", "#CC61B0", "#24796C", "#DAA51B", "#2F8AC4",
    "#764E9F", "#ED645A", "#CC3A8E",
];
pub const PASTEL: &[&str] = &[
    "#66C5CC", "#F6CF71", "#F89C74", "#DCB0F2", "#87C55F", "#9EB9F3", "#FE88B1", "#C9DB74",
    "#8BE0A4", "#B497E7", "#D3B484",
];
pub const QUALITATIVE: &[&str] = &[
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// One chart specification: Plotly traces plus layout, built once per view
/// and never mutated after construction. Drawing itself happens in the
/// Plotly runtime loaded by the emitted HTML.
#[derive(Debug, Clone)]
pub struct Figure {
    pub traces: Vec<Value>,
    pub layout: Value,
}

impl Figure {
    pub fn new(traces: Vec<Value>, layout: Value) -> Self {
        Self { traces, layout }
    }
}

/// Shared dark styling: 400x300, black plot and paper background, white text,
/// tight margins. View builders extend this with axes and chart-specific keys.
pub fn base_layout() -> Value {
    json!({
        "width": PLOT_WIDTH,
        "height": PLOT_HEIGHT,
        "plot_bgcolor": "black",
        "paper_bgcolor": "black",
        "font": {"color": "white"},
        "margin": {"l": 10, "r": 10, "t": 30, "b": 10},
    })
}

pub fn axis(label: &str) -> Value {
    json!({
        "title": {"text": label, "font": {"size": 12}},
        "gridcolor": "#444",
    })
}

/// Repeats a palette to cover `count` marks.
pub fn color_cycle(palette: &[&str], count: usize) -> Vec<String> {
    (0..count)
        .map(|index| palette[index % palette.len()].to_string())
        .collect()
}

/// Translucent highlight band over the full plot height, x in data space.
pub fn band_shape(x0: &str, x1: &str, color: &str, opacity: f64) -> Value {
    json!({
        "type": "rect",
        "xref": "x",
        "yref": "paper",
        "x0": x0,
        "y0": 0,
        "x1": x1,
        "y1": 1,
        "fillcolor": color,
        "opacity": opacity,
        "layer": "below",
        "line": {"width": 0},
    })
}

fn layout_with_title(figure: &Figure, title: &str) -> Value {
    let mut layout = figure.layout.clone();
    if let Some(object) = layout.as_object_mut() {
        object.insert(
            "title".to_string(),
            json!({"text": title, "font": {"size": 16}}),
        );
    }
    layout
}

/// The `Plotly.newPlot` call for one chart; the div itself is provided by the
/// surrounding document.
pub fn render_plot_script(figure: &Figure, div_id: &str, title: &str) -> Result<String> {
    let traces =
        serde_json::to_string(&figure.traces).context("Failed to serialize chart traces")?;
    let layout = serde_json::to_string(&layout_with_title(figure, title))
        .context("Failed to serialize chart layout")?;

    Ok(format!(
        "<script>Plotly.newPlot(\"{div_id}\", {traces}, {layout}, {{\"displayModeBar\": false}});</script>"
    ))
}

/// A self-contained HTML file for one chart, loading Plotly from the CDN.
pub fn render_standalone(figure: &Figure, title: &str) -> Result<String> {
    let script = render_plot_script(figure, "chart", title)?;

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n"));
    html.push_str(&format!("<script src=\"{PLOTLY_CDN}\"></script>\n"));
    html.push_str("<style>body { margin: 0; background-color: black; }</style>\n");
    html.push_str("</head>\n<body>\n<div id=\"chart\"></div>\n");
    html.push_str(&script);
    html.push_str("\n</body>\n</html>\n");

    Ok(html)
}

pub fn plotly_script_tag() -> String {
    format!("<script src=\"{PLOTLY_CDN}\"></script>")
}
