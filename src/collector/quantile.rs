use std::fmt;
use std::str::FromStr;

use crate::error::CollectorError;

/// Separator between a quantile and its error
pub const QUANTILE_ERROR_SEPARATOR: char = ',';

/// Separator between quantile definitions
pub const QUANTILE_DEFINITION_SEPARATOR: char = '|';

/// A target quantile and the error tolerated when estimating it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileDefinition {
    pub quantile: f64,
    pub error: f64,
}

impl QuantileDefinition {
    pub const fn new(quantile: f64, error: f64) -> Self {
        Self { quantile, error }
    }
}

impl fmt::Display for QuantileDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.quantile, QUANTILE_ERROR_SEPARATOR, self.error)
    }
}

impl FromStr for QuantileDefinition {
    type Err = CollectorError;

    /// Parse a `quantile,error` pair
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(QUANTILE_ERROR_SEPARATOR).map(str::trim).collect();
        if parts.len() != 2 {
            return Err(CollectorError::Parse(format!(
                "quantiles need exactly 2 parameters, {} given",
                parts.len()
            )));
        }

        let quantile = parts[0]
            .parse::<f64>()
            .map_err(|e| CollectorError::Parse(format!("bad quantile '{}': {}", parts[0], e)))?;
        let error = parts[1]
            .parse::<f64>()
            .map_err(|e| CollectorError::Parse(format!("bad error '{}': {}", parts[1], e)))?;

        Ok(Self { quantile, error })
    }
}

/// Render definitions in their `q,e|q,e` text form
pub fn quantiles_to_string(definitions: &[QuantileDefinition]) -> String {
    definitions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(QUANTILE_DEFINITION_SEPARATOR.to_string().as_str())
}
