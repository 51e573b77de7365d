//! Well log input features
//!
//! The four measurements the DT model was trained on, in the exact order
//! the model expects them.

use crate::error::FieldError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Number of model input features
pub const FEATURE_COUNT: usize = 4;

/// A single well log measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Feature {
    /// Bulk density (g/cm³)
    Rhob,
    /// Gamma ray (API)
    Gr,
    /// Neutron porosity (v/v)
    Nphi,
    /// Photoelectric factor (b/e)
    Pef,
}

impl Feature {
    /// All features in model input order
    pub const ALL: [Feature; FEATURE_COUNT] =
        [Feature::Rhob, Feature::Gr, Feature::Nphi, Feature::Pef];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Rhob => "RHOB",
            Feature::Gr => "GR",
            Feature::Nphi => "NPHI",
            Feature::Pef => "PEF",
        }
    }

    /// Form label including the unit
    pub fn label(self) -> &'static str {
        match self {
            Feature::Rhob => "RHOB (Density, g/cm³)",
            Feature::Gr => "GR (Gamma Ray, API)",
            Feature::Nphi => "NPHI (Neutron Porosity, v/v)",
            Feature::Pef => "PEF (Photoelectric Factor, b/e)",
        }
    }

    /// Inclusive range of typical values
    pub fn range(self) -> (f64, f64) {
        match self {
            Feature::Rhob => (1.0, 3.0),
            Feature::Gr => (0.0, 200.0),
            Feature::Nphi => (0.0, 1.0),
            Feature::Pef => (0.0, 10.0),
        }
    }

    pub fn default_value(self) -> f64 {
        match self {
            Feature::Rhob => 2.5,
            Feature::Gr => 50.0,
            Feature::Nphi => 0.2,
            Feature::Pef => 5.0,
        }
    }

    /// Input increment used by the form
    pub fn step(self) -> f64 {
        match self {
            Feature::Rhob | Feature::Nphi => 0.01,
            Feature::Gr | Feature::Pef => 0.1,
        }
    }

    /// Column index in the model input row
    pub fn index(self) -> usize {
        match self {
            Feature::Rhob => 0,
            Feature::Gr => 1,
            Feature::Nphi => 2,
            Feature::Pef => 3,
        }
    }

    /// Check a value against this feature's range
    pub fn check(self, value: f64) -> Result<f64, FieldError> {
        let (min, max) = self.range();
        if min <= value && value <= max {
            Ok(value)
        } else {
            Err(FieldError::OutOfRange {
                feature: self,
                value,
                min,
                max,
            })
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of model input.
///
/// Fields may be absent while the row is being assembled; the inference
/// boundary refuses rows with missing fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "RHOB", default, skip_serializing_if = "Option::is_none")]
    pub rhob: Option<f64>,

    #[serde(rename = "GR", default, skip_serializing_if = "Option::is_none")]
    pub gr: Option<f64>,

    #[serde(rename = "NPHI", default, skip_serializing_if = "Option::is_none")]
    pub nphi: Option<f64>,

    #[serde(rename = "PEF", default, skip_serializing_if = "Option::is_none")]
    pub pef: Option<f64>,
}

impl FeatureVector {
    /// Create a complete feature vector
    pub fn new(rhob: f64, gr: f64, nphi: f64, pef: f64) -> Self {
        Self {
            rhob: Some(rhob),
            gr: Some(gr),
            nphi: Some(nphi),
            pef: Some(pef),
        }
    }

    /// The form's initial values
    pub fn defaults() -> Self {
        Self::from_row(Feature::ALL.map(Feature::default_value))
    }

    pub fn from_row(row: [f64; FEATURE_COUNT]) -> Self {
        Self::new(row[0], row[1], row[2], row[3])
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Rhob => self.rhob,
            Feature::Gr => self.gr,
            Feature::Nphi => self.nphi,
            Feature::Pef => self.pef,
        }
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        *self.slot(feature) = Some(value);
    }

    /// Copy of this vector with one field removed
    pub fn without(mut self, feature: Feature) -> Self {
        *self.slot(feature) = None;
        self
    }

    fn slot(&mut self, feature: Feature) -> &mut Option<f64> {
        match feature {
            Feature::Rhob => &mut self.rhob,
            Feature::Gr => &mut self.gr,
            Feature::Nphi => &mut self.nphi,
            Feature::Pef => &mut self.pef,
        }
    }

    /// Features that have no value yet
    pub fn missing(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|&f| self.get(f).is_none())
            .collect()
    }

    /// Model input row. Checks presence only.
    pub fn to_row(&self) -> Result<[f64; FEATURE_COUNT], Vec<FieldError>> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(missing
                .into_iter()
                .map(|feature| FieldError::Missing { feature })
                .collect());
        }

        let mut row = [0.0; FEATURE_COUNT];
        for feature in Feature::ALL {
            row[feature.index()] = self.get(feature).unwrap_or_default();
        }
        Ok(row)
    }

    /// Model input row with every value checked against its range
    pub fn validate(&self) -> Result<[f64; FEATURE_COUNT], Vec<FieldError>> {
        let row = self.to_row()?;

        let errors: Vec<FieldError> = Feature::ALL
            .into_iter()
            .filter_map(|f| f.check(row[f.index()]).err())
            .collect();

        if errors.is_empty() {
            Ok(row)
        } else {
            Err(errors)
        }
    }

    /// Build a vector from submitted form fields keyed by feature name.
    ///
    /// Blank or absent fields are reported as missing, unparseable text as
    /// not-a-number. Ranges are not checked here.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, Vec<FieldError>> {
        let mut vector = FeatureVector::default();
        let mut errors = Vec::new();

        for feature in Feature::ALL {
            let raw = fields
                .get(feature.name())
                .map(|value| value.trim())
                .unwrap_or_default();

            if raw.is_empty() {
                errors.push(FieldError::Missing { feature });
                continue;
            }

            match raw.parse::<f64>() {
                Ok(value) => vector.set(feature, value),
                Err(_) => errors.push(FieldError::NotANumber {
                    feature,
                    raw: raw.to_string(),
                }),
            }
        }

        if errors.is_empty() {
            Ok(vector)
        } else {
            Err(errors)
        }
    }
}
