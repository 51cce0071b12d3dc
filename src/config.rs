use std::path::PathBuf;

const DEFAULT_APPS_FILE: &str = "Play Store Data.csv";
const DEFAULT_REVIEWS_FILE: &str = "User Reviews.csv";
const DEFAULT_OUTPUT_DIR: &str = "report";
pub const DASHBOARD_FILE: &str = "index.html";

/// Run parameters for one report pass. There is deliberately no other
/// configuration surface: the view recipes, palettes, and plot geometry are
/// fixed, and the only knobs are the input/output paths and whether to open
/// the finished dashboard.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub apps_path: PathBuf,
    pub reviews_path: PathBuf,
    pub output_dir: PathBuf,
    pub open_report: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            apps_path: PathBuf::from(DEFAULT_APPS_FILE),
            reviews_path: PathBuf::from(DEFAULT_REVIEWS_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            open_report: false,
        }
    }
}

impl ReportConfig {
    pub fn from_args(
        apps: Option<PathBuf>,
        reviews: Option<PathBuf>,
        out: Option<PathBuf>,
        open_report: bool,
    ) -> Self {
        let defaults = Self::default();

        Self {
            apps_path: apps.unwrap_or(defaults.apps_path),
            reviews_path: reviews.unwrap_or(defaults.reviews_path),
            output_dir: out.unwrap_or(defaults.output_dir),
            open_report,
        }
    }

    pub fn dashboard_path(&self) -> PathBuf {
        self.output_dir.join(DASHBOARD_FILE)
    }

    pub fn chart_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
