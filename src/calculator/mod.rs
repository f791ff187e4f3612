//! Compound growth calculator
//!
//! Periodic compounding with a fixed contribution added at the end of every
//! period. All arithmetic is done in `Decimal`; results are rounded to cents.


use crate::error::{ForecastError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest horizon the calculator accepts
pub const MAX_YEARS: u32 = 100;

/// How often interest compounds and contributions are made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Monthly,
    Quarterly,
    Annually,
}

impl Frequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Annually => 1,
        }
    }
}

impl FromStr for Frequency {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "annually" => Ok(Frequency::Annually),
            _ => Err(ForecastError::InvalidFrequency(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Annually => "annually",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRequest {
    pub years: u32,
    /// Annual rate in percent
    pub rate: Decimal,
    pub principal: Decimal,
    /// Added once per period
    pub contribution: Decimal,
    pub frequency: String,
}

/// Balance at the end of a completed year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub year: u32,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthResult {
    pub final_value: Decimal,
    pub total_invested: Decimal,
    pub total_gain: Decimal,
    #[serde(rename = "growth_data")]
    pub growth_series: Vec<GrowthPoint>,
}

fn overflow() -> ForecastError {
    ForecastError::Numerical("compound growth balance overflowed".to_string())
}

/// Run the period recurrence `balance ← balance·(1 + r) + contribution`
pub fn compound_growth(request: &GrowthRequest) -> Result<GrowthResult> {
    let frequency: Frequency = request.frequency.parse()?;
    if request.years > MAX_YEARS {
        return Err(ForecastError::InvalidInput(format!(
            "years must be at most {}, got {}",
            MAX_YEARS, request.years
        )));
    }

    let periods_per_year = frequency.periods_per_year();
    let total_periods = request.years * periods_per_year;
    let growth = Decimal::ONE + request.rate / dec!(100) / Decimal::from(periods_per_year);

    let mut balance = request.principal;
    let mut growth_series = Vec::with_capacity(request.years as usize);

    for period in 1..=total_periods {
        balance = balance
            .checked_mul(growth)
            .and_then(|b| b.checked_add(request.contribution))
            .ok_or_else(overflow)?;

        if period % periods_per_year == 0 {
            growth_series.push(GrowthPoint {
                year: period / periods_per_year,
                value: balance.round_dp(2),
            });
        }
    }

    let total_invested = request
        .contribution
        .checked_mul(Decimal::from(total_periods))
        .and_then(|c| c.checked_add(request.principal))
        .ok_or_else(overflow)?;

    Ok(GrowthResult {
        final_value: balance.round_dp(2),
        total_invested: total_invested.round_dp(2),
        total_gain: (balance - total_invested).round_dp(2),
        growth_series,
    })
}
