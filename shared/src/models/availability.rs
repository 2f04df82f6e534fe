//! Satellite imagery availability snapshots

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Result of one availability check for a zone and date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAvailability {
    pub total_images: u32,
    #[serde(default)]
    pub available_dates: Vec<AvailableDate>,
    #[serde(default)]
    pub date_range: Option<AvailabilityRange>,
}

/// One acquisition date with its cloud cover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableDate {
    pub date: NaiveDate,
    pub cloud_coverage: f64,
    pub quality: ImageQuality,
}

/// Range actually covered by the imagery found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Image usability derived from cloud cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Good,
    Medium,
    Poor,
}

impl ImageQuality {
    /// Cloud cover below 20% is good, below 50% medium, otherwise poor
    pub fn from_cloud_coverage(percent: f64) -> Self {
        if percent < 20.0 {
            ImageQuality::Good
        } else if percent < 50.0 {
            ImageQuality::Medium
        } else {
            ImageQuality::Poor
        }
    }
}

impl DataAvailability {
    /// Number of acquisition dates listed under the panel
    pub const RECENT_DATES_SHOWN: usize = 10;

    pub fn has_imagery(&self) -> bool {
        self.total_images > 0
    }

    /// Dates shown in the availability panel
    pub fn recent_dates(&self) -> &[AvailableDate] {
        let n = self.available_dates.len().min(Self::RECENT_DATES_SHOWN);
        &self.available_dates[..n]
    }

    /// Both ends of the covered range, when the backend reported them
    pub fn covered_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let range = self.date_range.as_ref()?;
        Some((range.start?, range.end?))
    }
}
