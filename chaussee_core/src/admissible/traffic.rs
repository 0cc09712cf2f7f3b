//! Cumulative heavy traffic over the service life.
//!
//! ```text
//! arithmetic:  TC = 365 · MJA · n · (1 + (n − 1) · τ / 2)
//! geometric:   TC = 365 · MJA · ((1 + τ)^n − 1) / τ      (τ = 0 → 365 · MJA · n)
//! ```
//!
//! `MJA` is the mean daily heavy-vehicle count on the design lane, `n` the
//! service life in years and `τ` the yearly growth rate. The equivalent
//! axle count is `NE = TC × CAM`.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// How traffic grows from one year to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GrowthLaw {
    #[default]
    Arithmetic,
    Geometric,
}

impl GrowthLaw {
    pub fn display_name(&self) -> &'static str {
        match self {
            GrowthLaw::Arithmetic => "arithmetic (%)",
            GrowthLaw::Geometric => "geometric (%)",
        }
    }
}

impl std::fmt::Display for GrowthLaw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Traffic assumptions of a project.
///
/// # Example
/// ```
/// use chaussee_core::admissible::{GrowthLaw, TrafficInput};
///
/// let traffic = TrafficInput::new(150.0, 2.0, 20, GrowthLaw::Arithmetic);
/// let tc = traffic.cumulative().unwrap();
/// assert!((tc - 1_303_050.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficInput {
    /// Heavy vehicles per day (MJA)
    pub daily_heavy_vehicles: f64,
    /// Yearly growth rate (%)
    pub growth_rate_pct: f64,
    pub service_years: u32,
    pub growth: GrowthLaw,
}

impl Default for TrafficInput {
    fn default() -> Self {
        TrafficInput {
            daily_heavy_vehicles: 150.0,
            growth_rate_pct: 2.0,
            service_years: 20,
            growth: GrowthLaw::Arithmetic,
        }
    }
}

impl TrafficInput {
    pub fn new(daily_heavy_vehicles: f64, growth_rate_pct: f64, service_years: u32, growth: GrowthLaw) -> Self {
        TrafficInput {
            daily_heavy_vehicles,
            growth_rate_pct,
            service_years,
            growth,
        }
    }

    fn validate(&self) -> CalcResult<()> {
        if !(self.daily_heavy_vehicles > 0.0) {
            return Err(CalcError::invalid_input(
                "daily_heavy_vehicles",
                self.daily_heavy_vehicles.to_string(),
                "daily heavy traffic must be positive",
            ));
        }
        if !(self.growth_rate_pct >= 0.0) {
            return Err(CalcError::invalid_input(
                "growth_rate_pct",
                self.growth_rate_pct.to_string(),
                "growth rate cannot be negative",
            ));
        }
        if self.service_years == 0 {
            return Err(CalcError::invalid_input(
                "service_years",
                "0",
                "service life must be at least one year",
            ));
        }
        Ok(())
    }

    /// Cumulative heavy traffic over the service life, rounded to 2 decimals
    pub fn cumulative(&self) -> CalcResult<f64> {
        self.validate()?;

        let mja = self.daily_heavy_vehicles;
        let n = f64::from(self.service_years);
        let rate = self.growth_rate_pct * 0.01;

        let total = match self.growth {
            GrowthLaw::Arithmetic => 365.0 * mja * n * (1.0 + (n - 1.0) * rate / 2.0),
            GrowthLaw::Geometric if rate > 0.0 => 365.0 * mja * ((1.0 + rate).powf(n) - 1.0) / rate,
            GrowthLaw::Geometric => 365.0 * mja * n,
        };
        Ok((total * 100.0).round() / 100.0)
    }

    /// Equivalent standard axle count NE = TC × CAM
    pub fn equivalent_axles(&self, cam: f64) -> CalcResult<f64> {
        if !(cam > 0.0) {
            return Err(CalcError::invalid_input("cam", cam.to_string(), "CAM must be positive"));
        }
        Ok(self.cumulative()? * cam)
    }
}
