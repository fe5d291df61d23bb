//! # Evaluation Input Module
//!
//! Loads a recorded evaluation (test bounds, participant, raw samples) from
//! a JSON document and turns it into an `AnalysisRequest`.
//!
//! The participant's age is derived from their birth date and the calendar
//! date the test started on.

use crate::analysis::AnalysisRequest;
use crate::error::InputError;
use crate::filter_service::FilterRequest;
use crate::sample::SensorSample;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_m: Option<f64>,
    #[serde(default)]
    pub sex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub evaluation_id: String,
    pub time_init: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub participant: Participant,
    pub samples: Vec<SensorSample>,
}

/// Whole years between `birth_date` and `on_date`
///
/// Counts down by one when the birthday has not yet come around in the
/// year of `on_date`. Dates before the birth date give 0.
pub fn age_on(birth_date: NaiveDate, on_date: NaiveDate) -> u32 {
    let mut years = on_date.year() - birth_date.year();
    if (on_date.month(), on_date.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

impl EvaluationInput {
    /// Read and validate an evaluation document
    pub fn load_from_path(path: &Path) -> Result<Self, InputError> {
        let contents = fs::read_to_string(path).map_err(InputError::ReadFailed)?;
        let input = Self::from_json(&contents)?;
        log::debug!(
            "Loaded evaluation {} with {} samples from {}",
            input.evaluation_id,
            input.samples.len(),
            path.display()
        );
        Ok(input)
    }

    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let input: Self = serde_json::from_str(json).map_err(InputError::ParseFailed)?;
        if input.time_end < input.time_init {
            return Err(InputError::InvalidBounds {
                evaluation_id: input.evaluation_id,
            });
        }
        Ok(input)
    }

    /// Participant age on the day the test started
    pub fn participant_age(&self) -> u32 {
        age_on(self.participant.birth_date, self.time_init.date_naive())
    }

    /// Payload for the external filtering service
    ///
    /// `None` unless weight, height and sex are all known.
    pub fn filter_request(&self) -> Option<FilterRequest> {
        let participant = &self.participant;
        Some(FilterRequest::new(
            &self.samples,
            participant.weight_kg?,
            participant.height_m?,
            self.participant_age(),
            participant.sex.clone()?,
        ))
    }

    pub fn into_request(self) -> AnalysisRequest {
        let age = self.participant_age();
        AnalysisRequest {
            samples: self.samples,
            time_init: self.time_init,
            time_end: self.time_end,
            age,
        }
    }
}
