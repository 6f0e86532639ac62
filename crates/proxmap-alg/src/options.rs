//! Algorithm options and their `KEY=VALUE` parsing.

use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Unit in which distances are measured and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum DistUnits {
    /// Grid steps between pixel centers.
    #[default]
    Pixel,
    /// Georeferenced units, scaled by the input's pixel size.
    Geo,
}

impl FromStr for DistUnits {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("PIXEL") {
            Ok(DistUnits::Pixel)
        } else if s.trim().eq_ignore_ascii_case("GEO") {
            Ok(DistUnits::Geo)
        } else {
            Err(EngineError::invalid_option("DISTUNITS", s, "should be GEO or PIXEL"))
        }
    }
}

impl TryFrom<String> for DistUnits {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for DistUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DistUnits::Pixel => "PIXEL",
            DistUnits::Geo => "GEO",
        })
    }
}

/// Options controlling a proximity run.
///
/// Build one field by field, from `KEY=VALUE` strings with
/// [`ProximityOptions::from_strings`], or deserialize it (keys `values`,
/// `distunits`, `maxdist`, `nodata`, `use_input_nodata`, `fixed_buf_val`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityOptions {
    /// Input values marking source cells. Empty means every non-zero cell.
    #[serde(rename = "values")]
    pub target_values: Vec<f64>,
    /// Distance unit.
    #[serde(rename = "distunits")]
    pub dist_units: DistUnits,
    /// Largest distance reported; farther cells get no-data.
    #[serde(rename = "maxdist")]
    pub max_dist: Option<f64>,
    /// Output no-data value. Defaults to the output band's, else 65535.
    pub nodata: Option<f64>,
    /// Treat input no-data cells as never-source, always-no-data.
    pub use_input_nodata: bool,
    /// Value written instead of the distance for cells within range.
    pub fixed_buf_val: Option<f64>,
}

impl ProximityOptions {
    /// Parse `KEY=VALUE` strings. Keys are case-insensitive; unknown keys
    /// are ignored with a warning.
    pub fn from_strings<S: AsRef<str>>(options: &[S]) -> Result<Self> {
        let mut parsed = Self::default();
        for option in options {
            let option = option.as_ref();
            let (key, value) = option
                .split_once('=')
                .ok_or_else(|| EngineError::invalid_option(option, "", "expected KEY=VALUE"))?;
            parsed.set(key, value)?;
        }
        parsed.validate()?;
        Ok(parsed)
    }

    /// Set a single option from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        match key.to_ascii_uppercase().as_str() {
            "VALUES" => {
                self.target_values = value
                    .split(',')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(|token| parse_number(key, token))
                    .collect::<Result<_>>()?;
            }
            "DISTUNITS" => self.dist_units = value.parse()?,
            "MAXDIST" => self.max_dist = Some(parse_number(key, value)?),
            "NODATA" => self.nodata = Some(parse_number(key, value)?),
            "USE_INPUT_NODATA" => self.use_input_nodata = parse_bool(key, value)?,
            "FIXED_BUF_VAL" => self.fixed_buf_val = Some(parse_number(key, value)?),
            _ => warn!("ignoring unknown proximity option {}={}", key, value),
        }
        Ok(())
    }

    /// Check value ranges that individual setters cannot.
    pub fn validate(&self) -> Result<()> {
        if let Some(max_dist) = self.max_dist {
            if max_dist.is_nan() || max_dist < 0.0 {
                return Err(EngineError::invalid_option(
                    "MAXDIST",
                    &max_dist.to_string(),
                    "must be a non-negative number",
                ));
            }
        }
        if let Some(v) = self.target_values.iter().find(|v| v.is_nan()) {
            return Err(EngineError::invalid_option("VALUES", &v.to_string(), "NaN cannot be a target"));
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| EngineError::invalid_option(key, value, "not a number"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_uppercase().as_str() {
        "YES" | "TRUE" | "ON" | "1" => Ok(true),
        "NO" | "FALSE" | "OFF" | "0" => Ok(false),
        _ => Err(EngineError::invalid_option(key, value, "expected YES or NO")),
    }
}
