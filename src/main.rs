use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::{error::Error, io};

use chrono::Utc;
use clap::Parser;
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::json;

use wx_digest::cli::Args;
use wx_digest::config::Settings;
use wx_digest::logging::{setup_logger, LogTarget};
use wx_digest::owm::OpenWeatherMap;
use wx_digest::{FileSource, WeatherSource, WeatherState};

mod app;

use crate::app::{run_app, App};

fn print_summaries(state: &mut WeatherState, source: &dyn WeatherSource) -> Result<(), Box<dyn Error>> {
    state.update(Utc::now(), source)?;
    let output = json!({
        "location": state.location(),
        "current": state.current.as_ref().map(|c| c.to_properties()),
        "forecast": state.forecast.as_ref().map(|f| f.to_properties()),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let (settings, config_source) = Settings::load(args)?;

    let target = if settings.print {
        LogTarget::Stderr
    } else {
        LogTarget::File(settings.log_file.clone())
    };
    setup_logger(settings.level, &target)?;
    log::info!("configuration loaded from {}", config_source);

    let source: Box<dyn WeatherSource> = match settings.offline_files {
        Some((ref current, ref forecast)) => Box::new(FileSource::new(current, forecast)),
        None => Box::new(OpenWeatherMap::new(
            settings.api_key.clone().unwrap_or_default(),
            settings.units,
        )?),
    };
    let mut state = WeatherState::new(settings.location.clone());

    if settings.print {
        return print_summaries(&mut state, source.as_ref());
    }

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let mut app = App::new(state, source.as_ref(), settings.units);
    let res = run_app(&mut terminal, &mut app);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("{}", err);
        println!("{:?}", err)
    }

    Ok(())
}
