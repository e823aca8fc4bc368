use crate::config::ZeroPolicy;
use crate::models::Calibrated;

/// Converts pixel counts to cm² using a reference patch of known physical area
#[derive(Debug, Clone, Copy)]
pub struct CalibrationModel {
    pub reference_area_cm2: f64,
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self {
            reference_area_cm2: 10.0,
        }
    }
}

impl CalibrationModel {
    pub fn new(reference_area_cm2: f64) -> Self {
        Self { reference_area_cm2 }
    }

    /// Physical area covered by `target_pixels`, given that the reference
    /// patch covers `reference_pixels`. Zero in either count is undetermined.
    pub fn calibrate(&self, target_pixels: u64, reference_pixels: u64) -> Calibrated {
        if target_pixels == 0 || reference_pixels == 0 {
            return Calibrated::Undetermined;
        }
        let pixels_per_cm2 = reference_pixels as f64 / self.reference_area_cm2;
        Calibrated::Area(target_pixels as f64 / pixels_per_cm2)
    }

    /// Same as [`calibrate`](Self::calibrate), resolved according to `policy`
    pub fn area_cm2(&self, target_pixels: u64, reference_pixels: u64, policy: ZeroPolicy) -> Option<f64> {
        match (self.calibrate(target_pixels, reference_pixels), policy) {
            (Calibrated::Area(area), _) => Some(area),
            (Calibrated::Undetermined, ZeroPolicy::Compatible) => Some(0.0),
            (Calibrated::Undetermined, ZeroPolicy::Undetermined) => None,
        }
    }
}
