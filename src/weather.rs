use serde::Serialize;
use std::fmt;

/// Coarse weather categories the OpenWeatherMap condition codes fall into.
///
/// The discriminant doubles as the index into a day's vote tally, so the
/// declaration order is also the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConditionCategory {
    Thunderstorm = 0,
    Drizzle = 1,
    Rain = 2,
    Snow = 3,
    Mist = 4,
    ClearSky = 5,
    Cloudy = 6,
}

impl ConditionCategory {
    pub const COUNT: usize = 7;

    pub const ALL: [ConditionCategory; Self::COUNT] = [
        ConditionCategory::Thunderstorm,
        ConditionCategory::Drizzle,
        ConditionCategory::Rain,
        ConditionCategory::Snow,
        ConditionCategory::Mist,
        ConditionCategory::ClearSky,
        ConditionCategory::Cloudy,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            200..=232 => Some(ConditionCategory::Thunderstorm),
            300..=321 => Some(ConditionCategory::Drizzle),
            500..=531 => Some(ConditionCategory::Rain),
            600..=622 => Some(ConditionCategory::Snow),
            701..=781 => Some(ConditionCategory::Mist),
            800 => Some(ConditionCategory::ClearSky),
            801..=804 => Some(ConditionCategory::Cloudy),
            _ => None,
        }
    }

    /// Representative code re-emitted for every member of the category.
    pub fn canonical_code(&self) -> i32 {
        match self {
            ConditionCategory::Thunderstorm => 211,
            ConditionCategory::Drizzle => 301,
            ConditionCategory::Rain => 501,
            ConditionCategory::Snow => 601,
            ConditionCategory::Mist => 701,
            ConditionCategory::ClearSky => 800,
            ConditionCategory::Cloudy => 801,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConditionCategory::Thunderstorm => "Thunderstorm",
            ConditionCategory::Drizzle => "Drizzle",
            ConditionCategory::Rain => "Rain",
            ConditionCategory::Snow => "Snow",
            ConditionCategory::Mist => "Mist",
            ConditionCategory::ClearSky => "Clear Sky",
            ConditionCategory::Cloudy => "Cloudy",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Result of classifying a raw condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    Known(ConditionCategory),
    /// The code lies outside every documented range.
    Unclassified { code: i32 },
}

impl Classification {
    pub fn category(&self) -> Option<ConditionCategory> {
        match self {
            Classification::Known(category) => Some(*category),
            Classification::Unclassified { .. } => None,
        }
    }

    pub fn canonical_code(&self) -> Option<i32> {
        self.category().map(|c| c.canonical_code())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Classification::Known(category) => category.display_name(),
            Classification::Unclassified { .. } => "Unclassified",
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, Classification::Known(_))
    }
}

pub fn classify(code: i32) -> Classification {
    match ConditionCategory::from_code(code) {
        Some(category) => Classification::Known(category),
        None => Classification::Unclassified { code },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_range_edges() {
        let cases = [
            (200, ConditionCategory::Thunderstorm),
            (232, ConditionCategory::Thunderstorm),
            (300, ConditionCategory::Drizzle),
            (321, ConditionCategory::Drizzle),
            (500, ConditionCategory::Rain),
            (531, ConditionCategory::Rain),
            (600, ConditionCategory::Snow),
            (622, ConditionCategory::Snow),
            (701, ConditionCategory::Mist),
            (781, ConditionCategory::Mist),
            (800, ConditionCategory::ClearSky),
            (801, ConditionCategory::Cloudy),
            (804, ConditionCategory::Cloudy),
        ];
        for (code, expected) in cases {
            assert_eq!(classify(code), Classification::Known(expected), "code {code}");
        }
    }

    #[test]
    fn test_canonical_codes() {
        let codes: Vec<i32> = ConditionCategory::ALL
            .iter()
            .map(|c| c.canonical_code())
            .collect();
        assert_eq!(codes, vec![211, 301, 501, 601, 701, 800, 801]);
        for category in ConditionCategory::ALL {
            assert_eq!(classify(category.canonical_code()).category(), Some(category));
        }
    }

    #[test]
    fn test_unclassified_codes() {
        for code in [805, 199, 233, 400, 700, 0, -1] {
            let result = classify(code);
            assert_eq!(result, Classification::Unclassified { code });
            assert!(!result.is_classified());
            assert_eq!(result.canonical_code(), None);
            assert_eq!(result.display_name(), "Unclassified");
        }
    }

    #[test]
    fn test_index_matches_declaration_order() {
        for (i, category) in ConditionCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
        assert_eq!(ConditionCategory::ClearSky.to_string(), "Clear Sky");
    }
}
