use chrono::{DateTime, Duration, Utc};

use crate::current::CurrentConditions;
use crate::error::WeatherError;
use crate::forecast::ForecastSummary;
use crate::source::{Location, WeatherSource};

/// Minimum time between two refreshes of the same location, in minutes.
pub const REFRESH_INTERVAL_MINUTES: i64 = 10;

/// Latest weather for the selected location plus the refresh throttle.
#[derive(Debug)]
pub struct WeatherState {
    location: Location,
    location_changed: bool,
    last_update: Option<DateTime<Utc>>,
    pub current: Option<CurrentConditions>,
    pub forecast: Option<ForecastSummary>,
}

impl WeatherState {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            location_changed: false,
            last_update: None,
            current: None,
            forecast: None,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Switches location. A different zip code lifts the throttle.
    pub fn set_location(&mut self, location: Location) {
        if location != self.location {
            self.location_changed = true;
        }
        self.location = location;
    }

    pub fn can_update(&self, now: DateTime<Utc>) -> bool {
        match self.last_update {
            None => true,
            Some(_) if self.location_changed => true,
            Some(last) => now > last + Duration::minutes(REFRESH_INTERVAL_MINUTES),
        }
    }

    /// Fetches both documents from `source` unless the stored ones are fresh.
    ///
    /// On failure the previously stored results are kept.
    pub fn update<S: WeatherSource + ?Sized>(
        &mut self,
        now: DateTime<Utc>,
        source: &S,
    ) -> Result<(), WeatherError> {
        if !self.can_update(now) {
            return Err(WeatherError::AlreadyUpToDate);
        }

        source.check_connection()?;
        let current = source.current(&self.location)?;
        let forecast = source.forecast(&self.location)?;

        self.current = Some(current);
        self.forecast = Some(forecast);
        self.last_update = Some(now);
        self.location_changed = false;
        Ok(())
    }
}
