//! Decoder for the single-observation ("current conditions") document.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::DecodeError;
use crate::event::{Attributes, FeedHandler, ParseEvent};
use crate::weather::{classify, Classification};

/// Flat field-name to value mapping handed to the display layer.
pub type Properties = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    AwaitingRecord,
    AccumulatingFields,
    Emitted,
}

/// Fields whose value arrives as the element's text rather than an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Country,
    Timezone,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub city_id: Option<String>,
    pub city_name: Option<String>,
    pub longitude: Option<String>,
    pub latitude: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub temperature: Option<String>,
    pub temperature_min: Option<String>,
    pub temperature_max: Option<String>,
    pub feels_like: Option<String>,
    pub humidity: Option<String>,
    pub pressure: Option<String>,
    pub wind_speed: Option<String>,
    pub wind_name: Option<String>,
    pub wind_direction_value: Option<String>,
    pub wind_direction_code: Option<String>,
    pub wind_direction_name: Option<String>,
    pub clouds_value: Option<String>,
    pub clouds_name: Option<String>,
    pub visibility: Option<String>,
    pub precipitation_mode: Option<String>,
    /// Condition code exactly as the feed reported it.
    pub weather_number: Option<String>,
    pub weather_value: Option<String>,
    pub weather_icon: Option<String>,
    pub last_update: Option<String>,
    /// Set by [`CurrentConditionsDecoder::read_summary`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Classification>,
}

impl CurrentConditions {
    /// Condition name after classification, falling back to the feed's text.
    pub fn weather_name(&self) -> Option<&str> {
        match self.condition {
            Some(Classification::Known(category)) => Some(category.display_name()),
            _ => self.weather_value.as_deref(),
        }
    }

    pub fn weather_code(&self) -> Option<String> {
        match self.condition {
            Some(Classification::Known(category)) => Some(category.canonical_code().to_string()),
            _ => self.weather_number.clone(),
        }
    }

    /// Flattens the record into the key names the display layer looks up.
    ///
    /// Absent fields are left out. An unclassified condition passes the
    /// feed's raw number and text through.
    pub fn to_properties(&self) -> Properties {
        let fields: [(&str, Option<String>); 27] = [
            ("cityID", self.city_id.clone()),
            ("cityName", self.city_name.clone()),
            ("longitude", self.longitude.clone()),
            ("latitude", self.latitude.clone()),
            ("country", self.country.clone()),
            ("timezone", self.timezone.clone()),
            ("sunrise", self.sunrise.clone()),
            ("sunset", self.sunset.clone()),
            ("currentTemperature", self.temperature.clone()),
            ("minimumTemperature", self.temperature_min.clone()),
            ("maximumTemperature", self.temperature_max.clone()),
            ("feelsLike", self.feels_like.clone()),
            ("humidity", self.humidity.clone()),
            ("pressure", self.pressure.clone()),
            ("windSpeed", self.wind_speed.clone()),
            ("windName", self.wind_name.clone()),
            ("windDirectionValue", self.wind_direction_value.clone()),
            ("windDirectionCode", self.wind_direction_code.clone()),
            ("windDirectionName", self.wind_direction_name.clone()),
            ("cloudyValue", self.clouds_value.clone()),
            ("cloudyName", self.clouds_name.clone()),
            ("visibility", self.visibility.clone()),
            ("precipitationMode", self.precipitation_mode.clone()),
            ("weatherNumber", self.weather_code()),
            ("weatherValue", self.weather_name().map(str::to_string)),
            ("weatherIcon", self.weather_icon.clone()),
            ("lastUpdate", self.last_update.clone()),
        ];

        fields
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect()
    }
}

/// Accumulates one observation document.
#[derive(Debug)]
pub struct CurrentConditionsDecoder {
    state: DecoderState,
    expecting_text: Option<TextField>,
    fields: CurrentConditions,
}

impl Default for CurrentConditionsDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentConditionsDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::AwaitingRecord,
            expecting_text: None,
            fields: CurrentConditions::default(),
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    fn on_element_start(&mut self, name: &str, attrs: &Attributes) {
        let f = &mut self.fields;
        let tag = name.to_ascii_lowercase();
        match tag.as_str() {
            "city" => {
                f.city_id = attrs.value("id");
                f.city_name = attrs.value("name");
            }
            "coord" => {
                f.longitude = attrs.value("lon");
                f.latitude = attrs.value("lat");
            }
            "country" => self.expecting_text = Some(TextField::Country),
            "timezone" => self.expecting_text = Some(TextField::Timezone),
            "sun" => {
                f.sunrise = attrs.value("rise");
                f.sunset = attrs.value("set");
            }
            "temperature" => {
                f.temperature = attrs.value("value");
                f.temperature_min = attrs.value("min");
                f.temperature_max = attrs.value("max");
            }
            "feels_like" => f.feels_like = attrs.value("value"),
            "humidity" => f.humidity = attrs.value("value"),
            "pressure" => f.pressure = attrs.value("value"),
            "speed" => {
                f.wind_speed = attrs.value("value");
                f.wind_name = attrs.value("name");
            }
            "direction" => {
                f.wind_direction_value = attrs.value("value");
                f.wind_direction_code = attrs.value("code");
                f.wind_direction_name = attrs.value("name");
            }
            "clouds" => {
                f.clouds_value = attrs.value("value");
                f.clouds_name = attrs.value("name");
            }
            "visibility" => f.visibility = attrs.value("value"),
            "precipitation" => f.precipitation_mode = attrs.value("mode"),
            "weather" => {
                f.weather_number = attrs.value("number");
                f.weather_value = attrs.value("value");
                f.weather_icon = attrs.value("icon");
            }
            "lastupdate" => f.last_update = attrs.value("value"),
            _ => return,
        }
        if self.state == DecoderState::AwaitingRecord {
            self.state = DecoderState::AccumulatingFields;
        }
    }

    fn on_text(&mut self, text: &str) {
        match self.expecting_text.take() {
            Some(TextField::Country) => self.fields.country = Some(text.to_string()),
            Some(TextField::Timezone) => self.fields.timezone = Some(text.to_string()),
            None => {}
        }
    }

    /// Classifies the reported condition and returns the decoded record.
    ///
    /// Can be called repeatedly; each call yields the same record until new
    /// events arrive.
    pub fn read_summary(&mut self) -> Result<CurrentConditions, DecodeError> {
        if self.state == DecoderState::AwaitingRecord {
            return Err(DecodeError::NoData);
        }

        let raw = self
            .fields
            .weather_number
            .as_deref()
            .ok_or(DecodeError::MissingField {
                field: "weather.number",
                record: None,
            })?;
        let code: i32 = raw.trim().parse().map_err(|_| DecodeError::InvalidNumber {
            field: "weather.number",
            value: raw.to_string(),
            record: None,
        })?;

        let condition = classify(code);
        if !condition.is_classified() {
            log::debug!("current condition code {} is unclassified", code);
        }

        self.state = DecoderState::Emitted;
        Ok(CurrentConditions {
            condition: Some(condition),
            ..self.fields.clone()
        })
    }
}

impl FeedHandler for CurrentConditionsDecoder {
    fn handle(&mut self, event: ParseEvent) -> Result<(), DecodeError> {
        match event {
            ParseEvent::ElementStart { name, attributes } => {
                self.on_element_start(&name, &attributes)
            }
            ParseEvent::Text(text) => self.on_text(&text),
            // An empty <country/> must not swallow unrelated text later on.
            ParseEvent::ElementEnd { .. } => self.expecting_text = None,
            ParseEvent::DocumentEnd => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::ConditionCategory;

    fn no_attrs() -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }

    fn feed(decoder: &mut CurrentConditionsDecoder, events: Vec<ParseEvent>) {
        for event in events {
            decoder.handle(event).unwrap();
        }
    }

    #[test]
    fn test_read_before_data_is_an_error() {
        let mut decoder = CurrentConditionsDecoder::new();
        assert_eq!(decoder.read_summary(), Err(DecodeError::NoData));
        assert_eq!(decoder.state(), DecoderState::AwaitingRecord);
    }

    #[test]
    fn test_unknown_elements_do_not_start_a_record() {
        let mut decoder = CurrentConditionsDecoder::new();
        feed(
            &mut decoder,
            vec![ParseEvent::start("current", no_attrs()), ParseEvent::end("current")],
        );
        assert_eq!(decoder.state(), DecoderState::AwaitingRecord);
        assert_eq!(decoder.read_summary(), Err(DecodeError::NoData));
    }

    #[test]
    fn test_text_fields_are_one_shot() {
        let mut decoder = CurrentConditionsDecoder::new();
        feed(
            &mut decoder,
            vec![
                ParseEvent::start("city", [("id", "1"), ("name", "Springfield")]),
                ParseEvent::start("country", no_attrs()),
                ParseEvent::text("US"),
                ParseEvent::text("ignored"),
                ParseEvent::end("country"),
                ParseEvent::start("timezone", no_attrs()),
                ParseEvent::end("timezone"),
                ParseEvent::text("stray"),
                ParseEvent::start("weather", [("number", "800"), ("value", "clear sky")]),
            ],
        );
        assert_eq!(decoder.state(), DecoderState::AccumulatingFields);

        let current = decoder.read_summary().unwrap();
        assert_eq!(current.country.as_deref(), Some("US"));
        assert_eq!(current.timezone, None);
        assert_eq!(decoder.state(), DecoderState::Emitted);
    }

    #[test]
    fn test_condition_is_canonicalised() {
        let mut decoder = CurrentConditionsDecoder::new();
        feed(
            &mut decoder,
            vec![
                ParseEvent::start("Weather", [("number", "502"), ("value", "heavy intensity rain"), ("icon", "10d")]),
                ParseEvent::start("lastupdate", [("value", "2024-05-01T12:00:00")]),
            ],
        );
        let current = decoder.read_summary().unwrap();
        assert_eq!(current.condition, Some(Classification::Known(ConditionCategory::Rain)));

        let props = current.to_properties();
        assert_eq!(props["weatherNumber"], "501");
        assert_eq!(props["weatherValue"], "Rain");
        assert_eq!(props["weatherIcon"], "10d");
        assert_eq!(props["lastUpdate"], "2024-05-01T12:00:00");
        assert!(!props.contains_key("cityName"));
    }

    #[test]
    fn test_unclassified_condition_passes_raw_values_through() {
        let mut decoder = CurrentConditionsDecoder::new();
        feed(
            &mut decoder,
            vec![ParseEvent::start("weather", [("number", "905"), ("value", "windy")])],
        );
        let current = decoder.read_summary().unwrap();
        assert_eq!(current.condition, Some(Classification::Unclassified { code: 905 }));

        let props = current.to_properties();
        assert_eq!(props["weatherNumber"], "905");
        assert_eq!(props["weatherValue"], "windy");
    }

    #[test]
    fn test_bad_condition_code_is_a_decode_error() {
        let mut decoder = CurrentConditionsDecoder::new();
        feed(
            &mut decoder,
            vec![ParseEvent::start("weather", [("number", "n/a")])],
        );
        assert_eq!(
            decoder.read_summary(),
            Err(DecodeError::InvalidNumber {
                field: "weather.number",
                value: "n/a".to_string(),
                record: None,
            })
        );

        let mut decoder = CurrentConditionsDecoder::new();
        feed(
            &mut decoder,
            vec![ParseEvent::start("humidity", [("value", "40")])],
        );
        assert!(matches!(
            decoder.read_summary(),
            Err(DecodeError::MissingField { field: "weather.number", .. })
        ));
    }

    #[test]
    fn test_read_summary_is_repeatable() {
        let mut decoder = CurrentConditionsDecoder::new();
        feed(
            &mut decoder,
            vec![
                ParseEvent::start("temperature", [("value", "71.2"), ("min", "68"), ("max", "74.1")]),
                ParseEvent::start("weather", [("number", "211")]),
            ],
        );
        let first = decoder.read_summary().unwrap();
        let second = decoder.read_summary().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_properties()["maximumTemperature"], "74.1");
    }
}
