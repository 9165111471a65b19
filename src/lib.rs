//! Current conditions and a three-day outlook from the OpenWeatherMap XML feeds.
//!
//! The feeds are streamed through [`event::drive`] into two reducers:
//! [`current::CurrentConditionsDecoder`] for the single observation and
//! [`forecast::ForecastAggregator`] for the hourly forecast records. Both share
//! the condition classification in [`weather`].

pub mod cli;
pub mod config;
pub mod current;
pub mod error;
pub mod event;
pub mod forecast;
pub mod logging;
pub mod owm;
pub mod source;
pub mod state;
pub mod units;
pub mod weather;

pub use current::{CurrentConditions, CurrentConditionsDecoder, Properties};
pub use error::{DecodeError, WeatherError};
pub use event::{drive, FeedHandler, ParseEvent};
pub use forecast::{DayOffset, DaySummary, ForecastAggregator, ForecastSummary, HourlySample};
pub use source::{read_current, read_forecast, FileSource, Location, WeatherSource};
pub use state::WeatherState;
pub use weather::{classify, Classification, ConditionCategory};
