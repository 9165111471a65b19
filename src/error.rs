use thiserror::Error;

/// Failures while turning a feed document into a summary.
///
/// `record` is the zero-based index of the forecast record the failure
/// belongs to, `None` for the single-observation document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("no weather data has been read")]
    NoData,

    #[error("missing field `{field}`{}", at_record(.record))]
    MissingField {
        field: &'static str,
        record: Option<usize>,
    },

    #[error("invalid number `{value}` for `{field}`{}", at_record(.record))]
    InvalidNumber {
        field: &'static str,
        value: String,
        record: Option<usize>,
    },

    #[error("invalid timestamp `{value}`{}", at_record(.record))]
    InvalidTimestamp { value: String, record: Option<usize> },

    #[error("malformed document: {0}")]
    Markup(String),
}

fn at_record(record: &Option<usize>) -> String {
    match record {
        Some(i) => format!(" in record {i}"),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("bad weather data: {0}")]
    Decode(#[from] DecodeError),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("no active internet connection, please connect and try again")]
    NoConnectivity,

    #[error("weather information already up to date")]
    AlreadyUpToDate,

    #[error("no OpenWeatherMap API key configured")]
    MissingApiKey,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_record() {
        let err = DecodeError::InvalidNumber {
            field: "temperature",
            value: "warm".to_string(),
            record: Some(3),
        };
        assert_eq!(
            err.to_string(),
            "invalid number `warm` for `temperature` in record 3"
        );

        let err = DecodeError::MissingField {
            field: "weather.number",
            record: None,
        };
        assert_eq!(err.to_string(), "missing field `weather.number`");
    }
}
