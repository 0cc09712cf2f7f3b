//! Fatigue laws giving the admissible value of a course.
//!
//! ```text
//! EpsiT:  εt,adm = ε6 · (NE / 10⁶)^b · kc · kr · ks · kθ       (µdef)
//! SigmaT: σt,adm = σ6 · (NE / 10⁶)^b · kc · kr · ks · kd       (MPa)
//! EpsiZ:  εz,adm = A · NE^(−0.222)                           (µdef)
//!
//! kr = 10^(−u · b · δ),   δ = √(Sn² + (c / b)² · Sh²),   c = 0.02 cm⁻¹
//! ```
//!
//! `u` is the fractile of the standard normal distribution for the chosen
//! risk. A 10 % risk gives u ≈ −1.2816 and, with b < 0, kr < 1.

use crate::errors::{CalcError, CalcResult};

use super::{AdmissibleValueRow, FatigueCriterion};

/// Exponent of the rutting law on unbound layers and platform
pub const RUTTING_EXPONENT: f64 = -0.222;

/// Ratio between a thickness deviation and the log of fatigue life (cm⁻¹)
pub const THICKNESS_SENSITIVITY: f64 = 0.02;

/// Inverse of the standard normal distribution function.
///
/// Rational approximation by P. J. Acklam, relative error below 1.2e-9.
/// `p` must lie in (0, 1).
pub fn standard_normal_fractile(p: f64) -> CalcResult<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(CalcError::invalid_input(
            "probability",
            p.to_string(),
            "must lie strictly between 0 and 1",
        ));
    }

    const A: [f64; 6] = [
        -3.969683028665376e1,
        2.209460984245205e2,
        -2.759285104469687e2,
        1.383577518672690e2,
        -3.066479806614716e1,
        2.506628277459239,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e1,
        1.615858368580409e2,
        -1.556989798598866e2,
        6.680131188771972e1,
        -1.328068155288572e1,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -3.223964580411365e-1,
        -2.400758277161838,
        -2.549732539343734,
        4.374664141464968,
        2.938163982698783,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        3.224671290700398e-1,
        2.445134137142996,
        3.754408661907416,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    let u = if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p > 1.0 - P_LOW {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    };
    Ok(u)
}

/// Risk coefficient kr for a risk (%), fatigue slope and scatters.
pub fn risk_coefficient(risk_pct: f64, b: f64, sn: f64, sh_cm: f64) -> CalcResult<f64> {
    if b == 0.0 || b.is_nan() {
        return Err(CalcError::invalid_input("b", b.to_string(), "fatigue slope cannot be zero"));
    }
    let u = standard_normal_fractile(risk_pct / 100.0)?;
    let ratio = THICKNESS_SENSITIVITY / b;
    let delta = (sn * sn + ratio * ratio * sh_cm * sh_cm).sqrt();
    Ok(10f64.powf(-u * b * delta))
}

/// Admissible value of a row for `ne` equivalent cycles.
pub fn admissible_value(row: &AdmissibleValueRow, ne: f64) -> CalcResult<f64> {
    if !(ne > 0.0) {
        return Err(CalcError::invalid_input("ne", ne.to_string(), "cycle count must be positive"));
    }

    let law_factor = |b: f64| -> CalcResult<f64> {
        if b == 0.0 || b.is_nan() {
            return Err(CalcError::invalid_input("b", b.to_string(), "fatigue slope cannot be zero"));
        }
        Ok((ne / 1e6).powf(b))
    };

    let value = match row.criterion {
        FatigueCriterion::EpsiT => {
            row.epsilon6 * law_factor(row.b)? * row.kc * row.kr * row.ks * row.ktheta()
        }
        FatigueCriterion::SigmaT => row.sigma6 * law_factor(row.b)? * row.kc * row.kr * row.ks * row.kd,
        FatigueCriterion::EpsiZ => row.amplitude * ne.powf(RUTTING_EXPONENT),
    };
    Ok(value)
}

impl AdmissibleValueRow {
    /// Recompute kr from the risk, slope and scatters of the row
    pub fn update_kr(&mut self) -> CalcResult<f64> {
        self.kr = risk_coefficient(self.risk_pct, self.b, self.sn, self.sh)?;
        Ok(self.kr)
    }

    /// Compute, store and return the admissible value for `ne` cycles
    pub fn compute(&mut self, ne: f64) -> CalcResult<f64> {
        let value = admissible_value(self, ne)?;
        self.ne = ne;
        self.admissible_value = value;
        Ok(value)
    }
}
