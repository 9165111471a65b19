use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;

use crate::units::Units;

const ABOUT: &str = "OpenWeatherMap three-day weather TUI";

const LONG_ABOUT: &str = "
TUI for viewing current conditions and a three-day outlook sourced from OpenWeatherMap.

The user supplies a ZIP code (e.g. 10001) and optionally an ISO 3166 country code. An
OpenWeatherMap API key is required, either in the config file (wx.toml), the OWM_API_KEY
environment variable, or the --api-key flag.

Saved feed documents can be viewed offline with --current-file and --forecast-file.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug, Default)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "ZIP code to show the weather for (e.g. 10001)")]
    pub zip_code: Option<String>,

    /// ISO 3166 country code of the ZIP code
    #[arg(short = 'C', long)]
    pub country: Option<String>,

    /// Path to config file (TOML format)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Unit system to request
    #[arg(short, long, value_enum)]
    pub units: Option<Units>,

    /// OpenWeatherMap API key
    #[arg(long, env = "OWM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "WX_LOG_LEVEL")]
    pub level: Option<String>,

    /// File the TUI writes its log to
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Read current conditions from a saved XML document instead of the network
    #[arg(long, requires = "forecast_file")]
    pub current_file: Option<PathBuf>,

    /// Read the forecast from a saved XML document instead of the network
    #[arg(long, requires = "current_file")]
    pub forecast_file: Option<PathBuf>,

    /// Fetch once and print the summaries as JSON instead of starting the TUI
    #[arg(short, long)]
    pub print: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from(["wx", "60601", "-C", "us", "--units", "metric", "--print"])
            .unwrap();
        assert_eq!(args.zip_code.as_deref(), Some("60601"));
        assert_eq!(args.country.as_deref(), Some("us"));
        assert_eq!(args.units, Some(Units::Metric));
        assert!(args.print);
    }

    #[test]
    fn test_offline_files_come_in_pairs() {
        assert!(Args::try_parse_from(["wx", "--current-file", "current.xml"]).is_err());
        let args = Args::try_parse_from([
            "wx",
            "--current-file",
            "current.xml",
            "--forecast-file",
            "forecast.xml",
        ])
        .unwrap();
        assert_eq!(args.forecast_file, Some(PathBuf::from("forecast.xml")));
    }
}
