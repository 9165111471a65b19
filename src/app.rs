use std::io;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};

use wx_digest::forecast::{DayOffset, DaySummary, NO_DATA as MISSING};
use wx_digest::units::{direction, Units};
use wx_digest::{CurrentConditions, Location, WeatherError, WeatherSource, WeatherState};

enum Status {
    Idle,
    Info(String),
    Error(String),
}

pub struct App<'a> {
    state: WeatherState,
    source: &'a dyn WeatherSource,
    units: Units,
    status: Status,
    zip_input: Option<String>,
}

impl<'a> App<'a> {
    pub fn new(state: WeatherState, source: &'a dyn WeatherSource, units: Units) -> Self {
        Self {
            state,
            source,
            units,
            status: Status::Idle,
            zip_input: None,
        }
    }

    fn refresh(&mut self) {
        self.status = match self.state.update(Utc::now(), self.source) {
            Ok(()) => Status::Info("Weather updated".to_string()),
            Err(WeatherError::AlreadyUpToDate) => {
                Status::Info(WeatherError::AlreadyUpToDate.to_string())
            }
            Err(err) => {
                log::error!("refresh failed: {}", err);
                Status::Error(match &err {
                    WeatherError::NoConnectivity => err.to_string(),
                    WeatherError::Decode(_) => format!("Invalid input or zip code ({err})"),
                    _ => format!("Unable to fetch weather: {err}"),
                })
            }
        };
    }

    /// Returns `false` once the user asked to quit.
    fn on_key(&mut self, code: KeyCode) -> bool {
        if let Some(input) = self.zip_input.as_mut() {
            match code {
                KeyCode::Char(c) if c.is_ascii_alphanumeric() => input.push(c),
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Esc => self.zip_input = None,
                KeyCode::Enter => {
                    if let Some(zip) = self.zip_input.take().filter(|z| !z.is_empty()) {
                        let country = self.state.location().country_code.clone();
                        self.state.set_location(Location::new(zip, country));
                        self.refresh();
                    }
                }
                _ => {}
            }
            return true;
        }

        match code {
            KeyCode::Char('q') => return false,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('z') => self.zip_input = Some(String::new()),
            _ => {}
        }
        true
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    app.refresh();
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(1000))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.on_key(key.code) {
                    return Ok(());
                }
            }
        }

        if app.zip_input.is_none() && app.state.can_update(Utc::now()) {
            app.refresh();
        }
    }
}

fn text_or_missing(value: Option<&str>) -> String {
    value.map_or_else(|| MISSING.to_string(), str::to_string)
}

fn temperature(value: f32, units: Units) -> String {
    if value.is_finite() {
        format!("{value:.1} {}", units.temperature_symbol())
    } else {
        MISSING.to_string()
    }
}

fn row<'a>(label: &'a str, value: String) -> Row<'a> {
    Row::new(vec![
        Cell::from(format!(" {label}")),
        Cell::from(value).style(Style::default().fg(Color::Green)),
    ])
}

fn panel(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, Style::default().fg(Color::Yellow)))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded)
}

fn display_today(
    current: Option<&CurrentConditions>,
    today: Option<&DaySummary>,
    units: Units,
) -> Table<'static> {
    let c = current.cloned().unwrap_or_default();
    let with_unit = |value: Option<&str>, unit: &str| match value {
        Some(v) => format!("{v} {unit}"),
        None => MISSING.to_string(),
    };

    let temp = with_unit(c.temperature.as_deref(), units.temperature_symbol());
    let feels = with_unit(c.feels_like.as_deref(), units.temperature_symbol());
    let wind = match (
        c.wind_speed.as_deref(),
        c.wind_direction_value
            .as_deref()
            .and_then(direction::compass_from_attr),
    ) {
        (Some(speed), Some(compass)) => format!("{speed} {} {compass}", units.speed_symbol()),
        (speed, None) => with_unit(speed, units.speed_symbol()),
        _ => MISSING.to_string(),
    };
    let humidity = c
        .humidity
        .as_deref()
        .map_or_else(|| MISSING.to_string(), |h| format!("{h}%"));
    let pressure = with_unit(c.pressure.as_deref(), "mbar");

    let rows = vec![
        Row::new(vec![Cell::from("")]),
        row("Temperature", temp),
        row("Feels like", feels),
        row(
            "Precipitation",
            today.map_or_else(|| MISSING.to_string(), DaySummary::precipitation_percent),
        ),
        row("Humidity", humidity),
        row("Pressure", pressure),
        row("Wind", wind),
        row(
            "Conditions",
            text_or_missing(current.and_then(CurrentConditions::weather_name)),
        ),
    ];

    Table::new(rows, [Constraint::Length(15), Constraint::Min(10)]).block(panel(" Today ".to_string()))
}

fn display_day(day: Option<&DaySummary>, offset: DayOffset, units: Units) -> Table<'static> {
    let title = match (offset, day) {
        (DayOffset::TodayPlusOne, _) => " Tomorrow ".to_string(),
        (_, Some(day)) => format!(" {} ", day.date.format("%A")),
        (_, None) => " Day after tomorrow ".to_string(),
    };

    let rows = match day {
        None => vec![Row::new(vec![Cell::from(format!("\n  {MISSING}"))])],
        Some(day) => vec![
            Row::new(vec![Cell::from("")]),
            row("Max", temperature(day.max_temperature, units)),
            row("Min", temperature(day.min_temperature, units)),
            row("Precipitation", day.precipitation_percent()),
            row(
                "Humidity",
                day.max_humidity
                    .map_or_else(|| MISSING.to_string(), |h| format!("{h:.0}%")),
            ),
            row(
                "Pressure",
                day.max_pressure
                    .map_or_else(|| MISSING.to_string(), |p| format!("{p} mbar")),
            ),
            row(
                "Conditions",
                text_or_missing(day.condition.map(|c| c.display_name())),
            ),
        ],
    };

    Table::new(rows, [Constraint::Length(15), Constraint::Min(10)]).block(panel(title))
}

fn display_headline(app: &App) -> Paragraph<'static> {
    let location = app.state.location();
    let city = text_or_missing(
        app.state
            .current
            .as_ref()
            .and_then(|c| c.city_name.as_deref()),
    );
    let updated = match app.state.last_update() {
        Some(at) => {
            let local: DateTime<Local> = DateTime::from(at);
            format!(" Updated {}", local.format("%d-%m-%Y %H:%M"))
        }
        None => format!(" {MISSING}"),
    };

    Paragraph::new(vec![
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                format!("{},{}", location.zip_code, location.country_code),
                Style::default().fg(Color::Blue),
            ),
            Span::raw(" : "),
            Span::styled(city, Style::default().fg(Color::Yellow)),
        ]),
        Line::from(updated),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .border_type(BorderType::Rounded),
    )
}

fn display_status(app: &App) -> Paragraph<'static> {
    let line = if let Some(ref input) = app.zip_input {
        Line::from(vec![
            Span::raw(" ZIP code: "),
            Span::styled(
                format!("{input}_"),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  (Enter to apply, Esc to cancel)"),
        ])
    } else {
        let status = match &app.status {
            Status::Idle => Span::raw(""),
            Status::Info(msg) => Span::styled(msg.clone(), Style::default().fg(Color::Green)),
            Status::Error(msg) => Span::styled(msg.clone(), Style::default().fg(Color::Red)),
        };
        Line::from(vec![Span::raw(" q quit  r refresh  z zip code  "), status])
    };

    Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .border_type(BorderType::Rounded),
    )
}

fn ui(f: &mut Frame, app: &App) {
    let vert_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(f.area());

    f.render_widget(display_headline(app), vert_layout[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(vert_layout[1]);

    let forecast = app.state.forecast.as_ref();
    let today = display_today(
        app.state.current.as_ref(),
        forecast.map(|fc| fc.day(DayOffset::Today)),
        app.units,
    );
    f.render_widget(today, chunks[0]);

    for (chunk, offset) in chunks[1..]
        .iter()
        .zip([DayOffset::TodayPlusOne, DayOffset::TodayPlusTwo])
    {
        let day = display_day(forecast.map(|fc| fc.day(offset)), offset, app.units);
        f.render_widget(day, *chunk);
    }

    f.render_widget(display_status(app), vert_layout[2]);
}
