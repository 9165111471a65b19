use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Unit system the feed is requested in. Conversion happens server side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
    Standard,
}

impl Units {
    pub fn query_value(&self) -> &'static str {
        match self {
            Units::Imperial => "imperial",
            Units::Metric => "metric",
            Units::Standard => "standard",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Imperial => "°F",
            Units::Metric => "°C",
            Units::Standard => "K",
        }
    }

    pub fn speed_symbol(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Standard => "m/s",
        }
    }
}

pub mod direction {
    const COMPASS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];

    pub fn degree_to_compass(deg: f32) -> &'static str {
        let deg = (deg % 360.0) + 360.0;
        let val = (deg / 22.5 + 0.5) as usize;
        COMPASS[val % 16]
    }

    /// Compass point for a direction attribute as the feed sends it ("203").
    pub fn compass_from_attr(value: &str) -> Option<&'static str> {
        value.trim().parse::<f32>().ok().map(degree_to_compass)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_degree_to_compass() {
            assert_eq!(degree_to_compass(0.0), "N");
            assert_eq!(degree_to_compass(90.0), "E");
            assert_eq!(degree_to_compass(180.0), "S");
            assert_eq!(degree_to_compass(270.0), "W");
            assert_eq!(degree_to_compass(360.0), "N");
            assert_eq!(degree_to_compass(-45.0), "NW");
        }

        #[test]
        fn test_compass_from_attr() {
            assert_eq!(compass_from_attr("203"), Some("SSW"));
            assert_eq!(compass_from_attr("calm"), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_query_and_symbols() {
        assert_eq!(Units::default(), Units::Imperial);
        assert_eq!(Units::Metric.query_value(), "metric");
        assert_eq!(Units::Metric.temperature_symbol(), "°C");
        assert_eq!(Units::Imperial.speed_symbol(), "mph");
    }
}
