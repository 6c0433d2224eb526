/// Display polarity assumed when preprocessing a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Dark digits on a light background
    Standard,
    /// Light digits on a dark background
    Inverted,
}

/// Outcome of the recognition pipeline for a single ROI
#[derive(Debug, Clone, PartialEq)]
pub struct RoiReading {
    pub label: String,
    pub value: Option<f64>,
    /// Polarity of the attempt that produced `value`
    pub polarity: Option<Polarity>,
    pub raw_text: Option<String>,
}

impl RoiReading {
    pub fn absent(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
            polarity: None,
            raw_text: None,
        }
    }
}

/// Per-cycle collection of optional values, one per ROI label, in ROI order.
///
/// `None` means recognition failed for that label and is kept distinct
/// from a legitimate zero reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingSet {
    values: Vec<(String, Option<f64>)>,
}

impl ReadingSet {
    pub fn from_readings(readings: &[RoiReading]) -> Self {
        readings
            .iter()
            .map(|r| (r.label.clone(), r.value))
            .collect()
    }

    /// `None` if the label is unknown, `Some(None)` if it was not recognized
    pub fn get(&self, label: &str) -> Option<Option<f64>> {
        self.values
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn recognized_count(&self) -> usize {
        self.values.iter().filter(|(_, v)| v.is_some()).count()
    }
}

impl FromIterator<(String, Option<f64>)> for ReadingSet {
    fn from_iter<I: IntoIterator<Item = (String, Option<f64>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A persisted row: id, write timestamp and one nullable value per metric column
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSample {
    pub id: i64,
    pub timestamp: String,
    pub values: Vec<(String, Option<f64>)>,
}

impl StoredSample {
    /// `None` if the column does not exist, `Some(None)` for a NULL value
    pub fn value(&self, column: &str) -> Option<Option<f64>> {
        self.values
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| *v)
    }
}

/// Map a ROI label to its metric column name.
///
/// Lowercases, turns whitespace into `_` and drops every other
/// non-alphanumeric character: `PM2.5` -> `pm25`, `Water Level` -> `water_level`.
pub fn column_for_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '_' {
                Some('_')
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_for_label() {
        assert_eq!(column_for_label("PM2.5"), "pm25");
        assert_eq!(column_for_label("PM10"), "pm10");
        assert_eq!(column_for_label("NO2"), "no2");
        assert_eq!(column_for_label("pH"), "ph");
        assert_eq!(column_for_label("Water Level"), "water_level");
    }

    #[test]
    fn test_reading_set_keeps_absent_distinct_from_zero() {
        let set: ReadingSet = vec![
            ("CO".to_string(), Some(0.0)),
            ("O3".to_string(), None),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.get("CO"), Some(Some(0.0)));
        assert_eq!(set.get("O3"), Some(None));
        assert_eq!(set.get("PM10"), None);
        assert_eq!(set.recognized_count(), 1);
    }

    #[test]
    fn test_reading_set_preserves_roi_order() {
        let readings = vec![
            RoiReading::absent("b"),
            RoiReading {
                label: "a".to_string(),
                value: Some(1.5),
                polarity: Some(Polarity::Inverted),
                raw_text: Some("1.5".to_string()),
            },
        ];
        let set = ReadingSet::from_readings(&readings);
        let labels: Vec<&str> = set.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["b", "a"]);
    }
}
