use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::current::CurrentConditions;
use crate::error::WeatherError;
use crate::forecast::ForecastSummary;
use crate::source::{read_current, read_forecast, Location, WeatherSource};
use crate::units::Units;

const BASE_URL: &str = "http://api.openweathermap.org/";

/// Records requested from the forecast endpoint, three days of 3-hour steps.
const FORECAST_COUNT: usize = 24;

/// OpenWeatherMap client speaking the XML flavour of the 2.5 API.
pub struct OpenWeatherMap {
    client: Client,
    base_url: String,
    api_key: String,
    units: Units,
}

impl OpenWeatherMap {
    pub fn new(api_key: impl Into<String>, units: Units) -> Result<Self, WeatherError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WeatherError::MissingApiKey);
        }
        let client = Client::builder()
            .user_agent("wx-digest")
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            api_key,
            units,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn current_url(&self, location: &Location) -> String {
        self.url("data/2.5/weather", location, None)
    }

    pub fn forecast_url(&self, location: &Location) -> String {
        self.url("data/2.5/forecast", location, Some(FORECAST_COUNT))
    }

    fn url(&self, path: &str, location: &Location, count: Option<usize>) -> String {
        let mut url = format!(
            "{}{}?zip={},{}&mode=xml&units={}",
            self.base_url,
            path,
            location.zip_code,
            location.country_code,
            self.units.query_value()
        );
        if let Some(count) = count {
            url.push_str(&format!("&cnt={count}"));
        }
        url.push_str(&format!("&appid={}", self.api_key));
        url
    }

    fn get_web_xml(&self, url: &str) -> Result<Response, reqwest::Error> {
        self.client.get(url).send()?.error_for_status()
    }
}

impl WeatherSource for OpenWeatherMap {
    fn check_connection(&self) -> Result<(), WeatherError> {
        match self.client.head(&self.base_url).send() {
            Ok(_) => Ok(()),
            Err(err) => {
                log::warn!("connectivity check against {} failed: {}", self.base_url, err);
                Err(WeatherError::NoConnectivity)
            }
        }
    }

    fn current(&self, location: &Location) -> Result<CurrentConditions, WeatherError> {
        log::info!("fetching current conditions for {}", location.zip_code);
        let response = self.get_web_xml(&self.current_url(location))?;
        Ok(read_current(response)?)
    }

    fn forecast(&self, location: &Location) -> Result<ForecastSummary, WeatherError> {
        log::info!("fetching forecast for {}", location.zip_code);
        let response = self.get_web_xml(&self.forecast_url(location))?;
        Ok(read_forecast(response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let owm = OpenWeatherMap::new("KEY", Units::Metric).unwrap();
        let location = Location::new("10001", "us");
        assert_eq!(
            owm.current_url(&location),
            "http://api.openweathermap.org/data/2.5/weather?zip=10001,us&mode=xml&units=metric&appid=KEY"
        );
        assert_eq!(
            owm.forecast_url(&location),
            "http://api.openweathermap.org/data/2.5/forecast?zip=10001,us&mode=xml&units=metric&cnt=24&appid=KEY"
        );
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            OpenWeatherMap::new("  ", Units::Imperial),
            Err(WeatherError::MissingApiKey)
        ));
    }
}
