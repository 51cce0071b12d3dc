use crate::chart::{self, Figure, PLOT_HEIGHT, PLOT_WIDTH};
use crate::views::{ViewDef, Window};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::warn;

pub const DASHBOARD_TITLE: &str = "Google Play Store Review Analysis";

/// One rendered chart plus the interaction metadata its dashboard container
/// carries. The composer owns an explicit ordered list of these; the
/// document lays them out in exactly that order.
pub struct ChartFragment {
    pub file_name: String,
    pub div_id: String,
    pub window: Window,
    pub insight: String,
    plot_script: String,
}

impl ChartFragment {
    pub fn new(view: &ViewDef, figure: &Figure) -> Result<Self> {
        let div_id = view.div_id();
        let plot_script =
            chart::render_plot_script(figure, &format!("{div_id}-plot"), view.title)?;

        Ok(Self {
            file_name: view.file_name(),
            div_id,
            window: view.window,
            insight: view.insight.to_string(),
            plot_script,
        })
    }

    fn container_html(&self) -> String {
        format!(
            concat!(
                "<div class=\"plot-container\" id=\"{id}\" data-start=\"{start}\" ",
                "data-end=\"{end}\" onclick=\"openPlot('{file}')\">\n",
                "  <div class=\"plot\" id=\"{id}-plot\"></div>\n",
                "  <div class=\"insight\">{insight}</div>\n",
                "</div>\n",
                "{script}\n",
            ),
            id = self.div_id,
            start = self.window.start,
            end = self.window.end,
            file = self.file_name,
            insight = self.insight,
            script = self.plot_script,
        )
    }
}

pub fn compose_dashboard(fragments: &[ChartFragment]) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("<title>{DASHBOARD_TITLE}</title>\n"));
    html.push_str(&chart::plotly_script_tag());
    html.push('\n');
    html.push_str(&styles());
    html.push_str(&interaction_script());
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!(
        "<div class=\"header\">\n  <h1>{DASHBOARD_TITLE}</h1>\n</div>\n"
    ));
    html.push_str("<div class=\"container\">\n");

    for fragment in fragments {
        html.push_str(&fragment.container_html());
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

pub fn write_dashboard(
    output_dir: &Path,
    file_name: &str,
    fragments: &[ChartFragment],
) -> Result<PathBuf> {
    let path = output_dir.join(file_name);
    fs::write(&path, compose_dashboard(fragments))
        .with_context(|| format!("Failed to write dashboard: {}", path.display()))?;

    Ok(path)
}

/// Best-effort viewer launch; a missing opener downgrades to a warning since
/// the report is already on disk.
pub fn open_in_viewer(path: &Path) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(not(target_os = "macos"))]
    let opener = "xdg-open";

    let result = Command::new(opener)
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(error) = result {
        warn!(error = %error, "failed to open the dashboard in a viewer");
    }
}

fn styles() -> String {
    format!(
        concat!(
            "<style>\n",
            "  body {{ font-family: Arial, sans-serif; background-color: #333; color: #fff; margin: 0; padding: 0; }}\n",
            "  .header {{ display: flex; align-items: center; justify-content: center; padding: 20px; background-color: #444; }}\n",
            "  .container {{ display: flex; flex-wrap: wrap; justify-content: center; padding: 20px; }}\n",
            "  .plot-container {{ border: 2px solid #555; margin: 10px; padding: 10px; width: {width}px; height: {height}px; overflow: hidden; position: relative; cursor: pointer; }}\n",
            "  .insight {{ display: none; position: absolute; right: 10px; top: 10px; background-color: rgba(0, 0, 0, 0.7); padding: 5px; border-radius: 5px; color: #fff; }}\n",
            "  .plot-container:hover .insight {{ display: block; }}\n",
            "</style>\n",
        ),
        width = PLOT_WIDTH,
        height = PLOT_HEIGHT,
    )
}

/// Shared per-chart interactions: click-through to the standalone file and
/// the time-of-day visibility gate. Each container carries its own window in
/// `data-start`/`data-end`; the gate is cosmetic, evaluated against the
/// viewer's local clock at load time.
fn interaction_script() -> &'static str {
    concat!(
        "<script>\n",
        "function openPlot(filename) {\n",
        "  window.open(filename, '_blank');\n",
        "}\n",
        "function hourLabel(hour) {\n",
        "  if (hour === 0 || hour === 24) { return '12:00 AM'; }\n",
        "  if (hour === 12) { return '12:00 PM'; }\n",
        "  return hour > 12 ? (hour - 12) + ':00 PM' : hour + ':00 AM';\n",
        "}\n",
        "document.addEventListener('DOMContentLoaded', function () {\n",
        "  var currentHour = new Date().getHours();\n",
        "  document.querySelectorAll('.plot-container').forEach(function (container) {\n",
        "    var start = parseInt(container.dataset.start, 10);\n",
        "    var end = parseInt(container.dataset.end, 10);\n",
        "    if (currentHour >= start && currentHour < end) { return; }\n",
        "    container.innerHTML = \"<h3 style='color:white; text-align:center; padding-top:50%;'>\" +\n",
        "      'This plot is available between ' + hourLabel(start) + ' and ' + hourLabel(end) + ' local time</h3>';\n",
        "  });\n",
        "});\n",
        "</script>\n",
    )
}
