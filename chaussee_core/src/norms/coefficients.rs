//! Structural (ks) and deformation (kd) coefficients.
//!
//! Both are pure functions of the course description. They are never
//! cached: every read recomputes them from the current role, family and
//! thickness.
//!
//! ```text
//! kd = round2(kd_base(family) × band(thickness))     (non-platform)
//! kd = round2(kd_base(family))                       (platform)
//! ```
//!
//! | Thickness band (m) | Factor |
//! |--------------------|--------|
//! | < 0.10             | 1.20   |
//! | [0.10, 0.15)       | 1.10   |
//! | [0.15, 0.20)       | 1.00   |
//! | [0.20, 0.30)       | 0.95   |
//! | >= 0.30            | 0.90   |

use crate::materials::MaterialFamily;

use super::LayerRole;

/// Structural coefficient ks (NF P98-086 §6.2.2)
pub fn ks(role: LayerRole, family: MaterialFamily) -> f64 {
    use MaterialFamily as F;

    match role {
        LayerRole::Wearing => match family {
            F::BituminousConcrete => 1.0,
            F::HydraulicBinder => 1.15,
            F::CementConcrete => 1.35,
            _ => 1.0,
        },
        LayerRole::Base => match family {
            F::UnboundGranular => 1.0,
            F::HydraulicBinder => 1.3,
            F::BituminousConcrete => 1.2,
            F::CementConcrete => 1.5,
            _ => 1.0,
        },
        LayerRole::Foundation => match family {
            F::UnboundGranular => 1.0,
            F::HydraulicBinder => 1.2,
            _ => 1.0,
        },
        LayerRole::Platform => 1.0,
    }
}

/// Deformation coefficient kd (NF P98-086 §6.2.3)
pub fn kd(role: LayerRole, family: MaterialFamily, thickness_m: f64) -> f64 {
    let base = kd_base(family);
    if role.is_platform() {
        return round2(base);
    }
    round2(base * thickness_band_factor(thickness_m))
}

/// Family base value of kd
pub fn kd_base(family: MaterialFamily) -> f64 {
    match family {
        MaterialFamily::UnboundGranular => 2.0,
        MaterialFamily::HydraulicBinder => 1.5,
        MaterialFamily::BituminousConcrete => 1.0,
        MaterialFamily::CementConcrete => 0.8,
        MaterialFamily::LibraryDefined => 1.8,
    }
}

/// Thickness adjustment of kd (NF P98-086 §6.2.3.2)
pub fn thickness_band_factor(thickness_m: f64) -> f64 {
    if thickness_m < 0.10 {
        1.2
    } else if thickness_m < 0.15 {
        1.1
    } else if thickness_m < 0.20 {
        1.0
    } else if thickness_m < 0.30 {
        0.95
    } else {
        0.9
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ks_table() {
        assert_eq!(ks(LayerRole::Wearing, MaterialFamily::BituminousConcrete), 1.0);
        assert_eq!(ks(LayerRole::Wearing, MaterialFamily::HydraulicBinder), 1.15);
        assert_eq!(ks(LayerRole::Wearing, MaterialFamily::CementConcrete), 1.35);
        assert_eq!(ks(LayerRole::Base, MaterialFamily::UnboundGranular), 1.0);
        assert_eq!(ks(LayerRole::Base, MaterialFamily::HydraulicBinder), 1.3);
        assert_eq!(ks(LayerRole::Base, MaterialFamily::BituminousConcrete), 1.2);
        assert_eq!(ks(LayerRole::Base, MaterialFamily::CementConcrete), 1.5);
        assert_eq!(ks(LayerRole::Foundation, MaterialFamily::UnboundGranular), 1.0);
        assert_eq!(ks(LayerRole::Foundation, MaterialFamily::HydraulicBinder), 1.2);
        assert_eq!(ks(LayerRole::Foundation, MaterialFamily::CementConcrete), 1.0);
        assert_eq!(ks(LayerRole::Platform, MaterialFamily::CementConcrete), 1.0);
        assert_eq!(ks(LayerRole::Wearing, MaterialFamily::LibraryDefined), 1.0);
    }

    #[test]
    fn test_kd_bands_for_gnt() {
        let gnt = MaterialFamily::UnboundGranular;
        assert_eq!(kd(LayerRole::Base, gnt, 0.05), 2.4);
        assert_eq!(kd(LayerRole::Base, gnt, 0.10), 2.2);
        assert_eq!(kd(LayerRole::Base, gnt, 0.15), 2.0);
        assert_eq!(kd(LayerRole::Base, gnt, 0.20), 1.9);
        assert_eq!(kd(LayerRole::Base, gnt, 0.30), 1.8);
    }

    #[test]
    fn test_kd_rounding() {
        // 0.8 × 0.95 = 0.76, 1.8 × 1.1 = 1.98, 1.5 × 0.95 is 1.42499... in f64 -> 1.42
        assert_eq!(kd(LayerRole::Base, MaterialFamily::CementConcrete, 0.25), 0.76);
        assert_eq!(kd(LayerRole::Base, MaterialFamily::LibraryDefined, 0.12), 1.98);
        assert_eq!(kd(LayerRole::Base, MaterialFamily::HydraulicBinder, 0.25), 1.42);
    }

    #[test]
    fn test_kd_platform_ignores_thickness() {
        let fam = MaterialFamily::UnboundGranular;
        assert_eq!(kd(LayerRole::Platform, fam, super::super::PLATFORM_THICKNESS_M), 2.0);
        assert_eq!(kd(LayerRole::Platform, fam, 0.01), 2.0);
    }

    proptest! {
        #[test]
        fn kd_is_non_increasing_with_thickness(
            idx in 0usize..5,
            role_idx in 0usize..3,
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let family = MaterialFamily::ALL[idx];
            let role = LayerRole::ALL[role_idx];
            let (thin, thick) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(kd(role, family, thin) >= kd(role, family, thick));
        }

        #[test]
        fn kd_is_rounded_to_two_decimals(idx in 0usize..5, t in 0.0f64..2.0) {
            let value = kd(LayerRole::Base, MaterialFamily::ALL[idx], t);
            prop_assert!(((value * 100.0).round() - value * 100.0).abs() < 1e-9);
        }
    }
}
