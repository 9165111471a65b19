//! Reduction of the hourly forecast feed into three daily summaries.
//!
//! Records are collected in parse order while the document streams past.
//! Bucketing into days happens only in [`ForecastAggregator::read_summary`],
//! against the UTC calendar date at the time of the call.

use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::current::Properties;
use crate::error::DecodeError;
use crate::event::{Attributes, FeedHandler, ParseEvent};
use crate::weather::{classify, Classification, ConditionCategory};

/// Leading records that cover the part of the feed's first day already under
/// way. Humidity, pressure and the condition vote skip them.
pub const ELAPSED_SAMPLES: usize = 8;

/// Rendered for humidity, pressure or condition when no record qualified.
///
/// Such a day used to read as `0.0` humidity, `0` pressure and a
/// Thunderstorm (`211`) condition; it now shows this marker instead.
pub const NO_DATA: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DayOffset {
    Today,
    TodayPlusOne,
    TodayPlusTwo,
}

impl DayOffset {
    pub const ALL: [DayOffset; 3] = [
        DayOffset::Today,
        DayOffset::TodayPlusOne,
        DayOffset::TodayPlusTwo,
    ];

    /// Bucket for `date` relative to `today`, `None` outside the window.
    pub fn bucket(today: NaiveDate, date: NaiveDate) -> Option<Self> {
        match date.signed_duration_since(today).num_days() {
            0 => Some(DayOffset::Today),
            1 => Some(DayOffset::TodayPlusOne),
            2 => Some(DayOffset::TodayPlusTwo),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            DayOffset::Today => 0,
            DayOffset::TodayPlusOne => 1,
            DayOffset::TodayPlusTwo => 2,
        }
    }

    pub fn date(&self, today: NaiveDate) -> NaiveDate {
        today + Days::new(self.index() as u64)
    }

    fn key_suffix(&self) -> &'static str {
        match self {
            DayOffset::Today => "Today",
            DayOffset::TodayPlusOne => "TodayPlusOne",
            DayOffset::TodayPlusTwo => "TodayPlusTwo",
        }
    }
}

/// One parsed forecast record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySample {
    pub timestamp: NaiveDateTime,
    pub temperature: f32,
    pub humidity: f32,
    pub pressure: i32,
    pub precipitation_probability: f32,
    pub condition_code: i32,
}

impl HourlySample {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Default)]
struct ScratchSample {
    timestamp: Option<String>,
    temperature: Option<String>,
    humidity: Option<String>,
    pressure: Option<String>,
    precipitation: Option<String>,
    condition_code: Option<String>,
}

impl ScratchSample {
    fn finish(self, record: usize) -> Result<HourlySample, DecodeError> {
        let raw = self.timestamp.ok_or(DecodeError::MissingField {
            field: "time.from",
            record: Some(record),
        })?;
        let timestamp = NaiveDateTime::from_str(raw.trim()).map_err(|_| {
            DecodeError::InvalidTimestamp {
                value: raw.clone(),
                record: Some(record),
            }
        })?;

        Ok(HourlySample {
            timestamp,
            temperature: parse_field(self.temperature, "temperature.value", record)?,
            humidity: parse_field(self.humidity, "humidity.value", record)?,
            pressure: parse_field(self.pressure, "pressure.value", record)?,
            precipitation_probability: parse_field(
                self.precipitation,
                "precipitation.probability",
                record,
            )?,
            condition_code: parse_field(self.condition_code, "symbol.number", record)?,
        })
    }
}

fn parse_field<T: FromStr>(
    raw: Option<String>,
    field: &'static str,
    record: usize,
) -> Result<T, DecodeError> {
    let raw = raw.ok_or(DecodeError::MissingField {
        field,
        record: Some(record),
    })?;
    raw.trim().parse().map_err(|_| DecodeError::InvalidNumber {
        field,
        value: raw,
        record: Some(record),
    })
}

/// Running reductions for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    min_temp: f32,
    max_temp: f32,
    max_precip: f32,
    max_humidity: Option<f32>,
    max_pressure: Option<i32>,
    votes: [u32; ConditionCategory::COUNT],
    unclassified_votes: u32,
}

impl Default for DayBucket {
    fn default() -> Self {
        Self {
            min_temp: f32::INFINITY,
            max_temp: f32::NEG_INFINITY,
            max_precip: 0.0,
            max_humidity: None,
            max_pressure: None,
            votes: [0; ConditionCategory::COUNT],
            unclassified_votes: 0,
        }
    }
}

impl DayBucket {
    // A new maximum is never also tested against the minimum.
    fn fold_temperature(&mut self, temperature: f32) {
        if temperature > self.max_temp {
            self.max_temp = temperature;
        } else if temperature < self.min_temp {
            self.min_temp = temperature;
        }
    }

    fn fold_precipitation(&mut self, probability: f32) {
        if probability > self.max_precip {
            self.max_precip = probability;
        }
    }

    fn fold_humidity(&mut self, humidity: f32) {
        if self.max_humidity.map_or(true, |max| humidity > max) {
            self.max_humidity = Some(humidity);
        }
    }

    fn fold_pressure(&mut self, pressure: i32) {
        if self.max_pressure.map_or(true, |max| pressure > max) {
            self.max_pressure = Some(pressure);
        }
    }

    fn vote(&mut self, code: i32) {
        match classify(code) {
            Classification::Known(category) => self.votes[category.index()] += 1,
            Classification::Unclassified { .. } => {
                log::debug!("condition code {} is unclassified, not counted", code);
                self.unclassified_votes += 1;
            }
        }
    }

    /// Category with the strictly greatest tally. Ties go to the category
    /// declared first.
    fn dominant(&self) -> Option<ConditionCategory> {
        let mut best: Option<(ConditionCategory, u32)> = None;
        for category in ConditionCategory::ALL {
            let count = self.votes[category.index()];
            if count > best.map_or(0, |(_, n)| n) {
                best = Some((category, count));
            }
        }
        best.map(|(category, _)| category)
    }

    fn finish(&self, offset: DayOffset, today: NaiveDate) -> DaySummary {
        DaySummary {
            offset,
            date: offset.date(today),
            min_temperature: self.min_temp,
            max_temperature: self.max_temp,
            precipitation_chance: self.max_precip,
            max_humidity: self.max_humidity,
            max_pressure: self.max_pressure,
            condition: self.dominant(),
            unclassified_votes: self.unclassified_votes,
        }
    }
}

/// Finished reduction for one day.
///
/// Temperatures keep their `+inf`/`-inf` seeds when no record fell on the
/// day; use [`DaySummary::has_temperature`] before treating them as readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub offset: DayOffset,
    pub date: NaiveDate,
    pub min_temperature: f32,
    pub max_temperature: f32,
    /// Peak probability, 0 to 1.
    pub precipitation_chance: f32,
    pub max_humidity: Option<f32>,
    pub max_pressure: Option<i32>,
    pub condition: Option<ConditionCategory>,
    pub unclassified_votes: u32,
}

impl DaySummary {
    pub fn has_temperature(&self) -> bool {
        self.min_temperature.is_finite() || self.max_temperature.is_finite()
    }

    pub fn precipitation_percent(&self) -> String {
        format!("{:.1}%", f64::from(self.precipitation_chance) * 100.0)
    }

    fn write_properties(&self, props: &mut Properties) {
        let suffix = self.offset.key_suffix();
        props.insert(
            format!("minTemperature{suffix}"),
            format_float(self.min_temperature),
        );
        props.insert(
            format!("maxTemperature{suffix}"),
            format_float(self.max_temperature),
        );
        props.insert(
            format!("precipitationChance{suffix}"),
            self.precipitation_percent(),
        );

        if self.offset == DayOffset::Today {
            return;
        }

        props.insert(
            format!("maxHumidity{suffix}"),
            self.max_humidity
                .map_or_else(|| NO_DATA.to_string(), format_float),
        );
        props.insert(
            format!("maxPressure{suffix}"),
            self.max_pressure
                .map_or_else(|| NO_DATA.to_string(), |p| p.to_string()),
        );

        // "todayPlusOneWeatherName" rather than "weatherNameTodayPlusOne"
        let prefix = format!("t{}", &suffix[1..]);
        let (name, code) = match self.condition {
            Some(category) => (
                category.display_name().to_string(),
                category.canonical_code().to_string(),
            ),
            None => (NO_DATA.to_string(), NO_DATA.to_string()),
        };
        props.insert(format!("{prefix}WeatherName"), name);
        props.insert(format!("{prefix}WeatherNum"), code);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub today: DaySummary,
    pub today_plus_one: DaySummary,
    pub today_plus_two: DaySummary,
    /// Records whose date fell outside the three-day window.
    pub dropped_samples: usize,
}

impl ForecastSummary {
    pub fn day(&self, offset: DayOffset) -> &DaySummary {
        match offset {
            DayOffset::Today => &self.today,
            DayOffset::TodayPlusOne => &self.today_plus_one,
            DayOffset::TodayPlusTwo => &self.today_plus_two,
        }
    }

    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        for offset in DayOffset::ALL {
            self.day(offset).write_properties(&mut props);
        }
        props
    }
}

/// Renders a float the way the property store always has: `20.0`, `19.5`,
/// `Infinity`.
pub fn format_float(value: f32) -> String {
    if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if value.is_nan() {
        "NaN".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e7 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Collects `<time>` records from the forecast document.
#[derive(Debug, Default)]
pub struct ForecastAggregator {
    samples: Vec<HourlySample>,
    scratch: ScratchSample,
}

impl ForecastAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the record currently being filled will get.
    pub fn record_index(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[HourlySample] {
        &self.samples
    }

    fn on_element_start(&mut self, name: &str, attrs: &Attributes) {
        if name.eq_ignore_ascii_case("weatherdata") {
            self.samples.clear();
            self.scratch = ScratchSample::default();
            return;
        }

        let s = &mut self.scratch;
        match name.to_ascii_lowercase().as_str() {
            "time" => s.timestamp = attrs.value("from"),
            "symbol" => s.condition_code = attrs.value("number"),
            "precipitation" => s.precipitation = attrs.value("probability"),
            "temperature" => s.temperature = attrs.value("value"),
            "pressure" => s.pressure = attrs.value("value"),
            "humidity" => s.humidity = attrs.value("value"),
            _ => {}
        }
    }

    fn on_element_end(&mut self, name: &str) -> Result<(), DecodeError> {
        if name.eq_ignore_ascii_case("time") {
            let record = self.record_index();
            let sample = std::mem::take(&mut self.scratch).finish(record)?;
            self.samples.push(sample);
        }
        Ok(())
    }

    /// Summarises the collected records against today's UTC date.
    pub fn read_summary(&self) -> Result<ForecastSummary, DecodeError> {
        self.read_summary_at(Utc::now().date_naive())
    }

    pub fn read_summary_at(&self, today: NaiveDate) -> Result<ForecastSummary, DecodeError> {
        if self.samples.is_empty() {
            return Err(DecodeError::NoData);
        }

        let mut buckets: [DayBucket; 3] = Default::default();
        let mut dropped_samples = 0;

        for (i, sample) in self.samples.iter().enumerate() {
            let Some(offset) = DayOffset::bucket(today, sample.date()) else {
                log::debug!(
                    "record {} dated {} is outside the forecast window",
                    i,
                    sample.date()
                );
                dropped_samples += 1;
                continue;
            };
            let bucket = &mut buckets[offset.index()];
            bucket.fold_temperature(sample.temperature);
            bucket.fold_precipitation(sample.precipitation_probability);
        }

        for sample in self.samples.iter().skip(ELAPSED_SAMPLES) {
            let offset = match DayOffset::bucket(today, sample.date()) {
                Some(DayOffset::Today) | None => continue,
                Some(offset) => offset,
            };
            let bucket = &mut buckets[offset.index()];
            bucket.fold_humidity(sample.humidity);
            bucket.fold_pressure(sample.pressure);
            bucket.vote(sample.condition_code);
        }

        let [today_bucket, plus_one, plus_two] = &buckets;
        Ok(ForecastSummary {
            today: today_bucket.finish(DayOffset::Today, today),
            today_plus_one: plus_one.finish(DayOffset::TodayPlusOne, today),
            today_plus_two: plus_two.finish(DayOffset::TodayPlusTwo, today),
            dropped_samples,
        })
    }
}

impl FeedHandler for ForecastAggregator {
    fn handle(&mut self, event: ParseEvent) -> Result<(), DecodeError> {
        match event {
            ParseEvent::ElementStart { name, attributes } => {
                self.on_element_start(&name, &attributes);
                Ok(())
            }
            ParseEvent::ElementEnd { name } => self.on_element_end(&name),
            ParseEvent::Text(_) | ParseEvent::DocumentEnd => Ok(()),
        }
    }
}
