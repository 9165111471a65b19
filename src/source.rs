use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use serde::Serialize;

use crate::current::{CurrentConditions, CurrentConditionsDecoder};
use crate::error::{DecodeError, WeatherError};
use crate::event::drive;
use crate::forecast::{ForecastAggregator, ForecastSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub zip_code: String,
    /// ISO 3166 country code.
    pub country_code: String,
}

impl Location {
    pub fn new(zip_code: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            zip_code: zip_code.into(),
            country_code: country_code.into(),
        }
    }
}

/// Where the two feed documents come from.
pub trait WeatherSource {
    fn check_connection(&self) -> Result<(), WeatherError> {
        Ok(())
    }

    fn current(&self, location: &Location) -> Result<CurrentConditions, WeatherError>;

    fn forecast(&self, location: &Location) -> Result<ForecastSummary, WeatherError>;
}

/// Decodes a complete current-conditions document from `reader`.
pub fn read_current<R: Read>(reader: R) -> Result<CurrentConditions, DecodeError> {
    let mut decoder = CurrentConditionsDecoder::new();
    drive(reader, &mut decoder)?;
    decoder.read_summary()
}

/// Aggregates a complete forecast document from `reader`.
pub fn read_forecast<R: Read>(reader: R) -> Result<ForecastSummary, DecodeError> {
    let mut aggregator = ForecastAggregator::new();
    drive(reader, &mut aggregator)?;
    aggregator.read_summary()
}

/// Reads previously saved feed documents from disk. The location is ignored.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub current_path: PathBuf,
    pub forecast_path: PathBuf,
}

impl FileSource {
    pub fn new(current_path: impl Into<PathBuf>, forecast_path: impl Into<PathBuf>) -> Self {
        Self {
            current_path: current_path.into(),
            forecast_path: forecast_path.into(),
        }
    }
}

impl WeatherSource for FileSource {
    fn current(&self, _location: &Location) -> Result<CurrentConditions, WeatherError> {
        let file = File::open(&self.current_path)?;
        log::info!("reading current conditions from {}", self.current_path.display());
        Ok(read_current(file)?)
    }

    fn forecast(&self, _location: &Location) -> Result<ForecastSummary, WeatherError> {
        let file = File::open(&self.forecast_path)?;
        log::info!("reading forecast from {}", self.forecast_path.display());
        Ok(read_forecast(file)?)
    }
}
