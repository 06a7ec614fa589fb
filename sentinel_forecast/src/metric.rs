//! Tracked scene-classification metrics and a fixed-size per-metric table

use crate::error::ForecastError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Scene classification percentages reported for a Sentinel-2 capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "vegetation_pct")]
    Vegetation,
    #[serde(rename = "not_vegetated_pct")]
    NotVegetated,
    #[serde(rename = "water_pct")]
    Water,
    #[serde(rename = "cloud_cover")]
    CloudCover,
    #[serde(rename = "snow_ice_pct")]
    SnowIce,
    #[serde(rename = "unclassified_pct")]
    Unclassified,
}

impl Metric {
    /// Number of tracked metrics
    pub const COUNT: usize = 6;

    /// Every tracked metric, in table order
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::Vegetation,
        Metric::NotVegetated,
        Metric::Water,
        Metric::CloudCover,
        Metric::SnowIce,
        Metric::Unclassified,
    ];

    /// Metrics forecast when no explicit selection is configured
    pub const DEFAULT_FORECAST: [Metric; 5] = [
        Metric::Vegetation,
        Metric::NotVegetated,
        Metric::Water,
        Metric::CloudCover,
        Metric::SnowIce,
    ];

    /// Slot of the metric in a [`MetricTable`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column header used in tabular input and output
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::Vegetation => "vegetation_pct",
            Metric::NotVegetated => "not_vegetated_pct",
            Metric::Water => "water_pct",
            Metric::CloudCover => "cloud_cover",
            Metric::SnowIce => "snow_ice_pct",
            Metric::Unclassified => "unclassified_pct",
        }
    }

    /// STAC property key carrying the metric in scene metadata
    pub fn property_key(self) -> &'static str {
        match self {
            Metric::Vegetation => "s2:vegetation_percentage",
            Metric::NotVegetated => "s2:not_vegetated_percentage",
            Metric::Water => "s2:water_percentage",
            Metric::CloudCover => "eo:cloud_cover",
            Metric::SnowIce => "s2:snow_ice_percentage",
            Metric::Unclassified => "s2:unclassified_percentage",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Metric::Vegetation => "Vegetation",
            Metric::NotVegetated => "Not vegetated",
            Metric::Water => "Water",
            Metric::CloudCover => "Cloud cover",
            Metric::SnowIce => "Snow/ice",
            Metric::Unclassified => "Unclassified",
        }
    }

    /// Look up a metric by column name or property key, ignoring case
    pub fn from_column_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Metric::ALL.into_iter().find(|metric| {
            metric.column_name().eq_ignore_ascii_case(name)
                || metric.property_key().eq_ignore_ascii_case(name)
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Metric {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::from_column_name(s)
            .ok_or_else(|| ForecastError::InvalidParameter(format!("Unknown metric: {}", s)))
    }
}

/// Fixed-size association from [`Metric`] to a value.
///
/// Iteration always follows [`Metric::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable<T> {
    slots: [Option<T>; Metric::COUNT],
}

impl<T> MetricTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Store a value, returning the previous one
    pub fn insert(&mut self, metric: Metric, value: T) -> Option<T> {
        self.slots[metric.index()].replace(value)
    }

    pub fn get(&self, metric: Metric) -> Option<&T> {
        self.slots[metric.index()].as_ref()
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.slots[metric.index()].is_some()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Occupied entries in metric order
    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> + '_ {
        Metric::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(metric, slot)| slot.as_ref().map(|value| (metric, value)))
    }

    /// Metrics with a value, in metric order
    pub fn metrics(&self) -> Vec<Metric> {
        self.iter().map(|(metric, _)| metric).collect()
    }
}

impl<T> Default for MetricTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(Metric, T)> for MetricTable<T> {
    fn from_iter<I: IntoIterator<Item = (Metric, T)>>(iter: I) -> Self {
        let mut table = MetricTable::new();
        for (metric, value) in iter {
            table.insert(metric, value);
        }
        table
    }
}

impl<T: Serialize> Serialize for MetricTable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (metric, value) in self.iter() {
            map.serialize_entry(metric.column_name(), value)?;
        }
        map.end()
    }
}
