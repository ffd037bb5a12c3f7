use std::str::FromStr;

use serde::Serialize;

use super::{DesignConfig, DesignMode, SmoothingConfig};
use crate::BundError;

/// validated, immutable design parameters of a run.
#[derive(Serialize, Clone, Debug)]
pub struct DesignParameters {
    pub mode: DesignMode,
    pub height_field: Option<String>,
    pub hag_field: Option<String>,
    pub start_height: Option<f64>,
    pub end_height: Option<f64>,
    pub hag_value: Option<f64>,
    pub crest_width: f64,
    pub maintain_crest: bool,
    pub batter: f64,
    pub taper: f64,
    pub strip_depth: f64,
    pub extra_buffer: f64,
    pub datum: String,
    pub suffix_names: bool,
    pub merge_by_id: bool,
    pub crest_smoothing: f64,
    pub design_smoothing: f64,
}

impl DesignParameters {
    pub fn new(
        design: &DesignConfig,
        smoothing: &SmoothingConfig,
    ) -> Result<DesignParameters, BundError> {
        let mode = DesignMode::from_str(&design.mode)?;
        let missing = |parameter: &str| BundError::MissingParameter {
            mode: mode.to_string(),
            parameter: parameter.to_string(),
        };
        match mode {
            DesignMode::ConstantAbsolute if design.height_field.is_none() => {
                return Err(missing("height_field"))
            }
            DesignMode::HagField if design.hag_field.is_none() => return Err(missing("hag_field")),
            DesignMode::HagValue if design.hag_value.is_none() => return Err(missing("hag_value")),
            DesignMode::Gradient if design.start_height.is_none() => {
                return Err(missing("start_height"))
            }
            DesignMode::Gradient if design.end_height.is_none() => {
                return Err(missing("end_height"))
            }
            _ => {}
        }

        if !(design.batter.is_finite() && design.batter > 0.0) {
            return Err(BundError::InvalidUserInput(format!(
                "batter must be a positive number, found {}",
                design.batter
            )));
        }
        let finite_non_negative = [
            ("crest_width", design.crest_width),
            ("strip_depth", design.strip_depth),
            ("crest_radius", smoothing.crest_radius),
            ("design_radius", smoothing.design_radius),
        ];
        for (name, value) in finite_non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BundError::InvalidUserInput(format!(
                    "{name} must be a non-negative number, found {value}"
                )));
            }
        }
        let scalars = [
            ("taper", Some(design.taper)),
            ("extra_buffer", Some(design.extra_buffer)),
            ("start_height", design.start_height),
            ("end_height", design.end_height),
            ("hag_value", design.hag_value),
        ];
        for (name, value) in scalars {
            if let Some(v) = value.filter(|v| !v.is_finite()) {
                return Err(BundError::InvalidUserInput(format!(
                    "{name} must be a finite number, found {v}"
                )));
            }
        }

        Ok(DesignParameters {
            mode,
            height_field: design.height_field.clone(),
            hag_field: design.hag_field.clone(),
            start_height: design.start_height,
            end_height: design.end_height,
            hag_value: design.hag_value,
            crest_width: design.crest_width,
            maintain_crest: design.maintain_crest,
            batter: design.batter,
            taper: design.taper,
            strip_depth: design.strip_depth,
            extra_buffer: design.extra_buffer,
            datum: design.datum.clone(),
            suffix_names: design.name_suffix,
            merge_by_id: design.merge_by_id,
            crest_smoothing: smoothing.crest_radius,
            design_smoothing: smoothing.design_radius,
        })
    }

    /// distance from the centreline beyond which a feature can never raise the
    /// surface. bounds the per-feature processing mask.
    pub fn reach(&self) -> f64 {
        self.batter * 10.0
            + self.crest_width / 2.0
            + self.taper.max(0.0)
            + self.extra_buffer.max(0.0)
    }

    /// half width of the crest zone. with maintain-crest the zone grows by half a
    /// cell so that cells straddling the crest edge keep the crest elevation.
    pub fn crest_half_width(&self, cell_size: f64) -> f64 {
        let pad = if self.maintain_crest {
            cell_size * 0.5
        } else {
            0.0
        };
        self.crest_width / 2.0 + pad
    }

    /// the per-feature numeric property read in this mode, if any.
    pub fn carry_field(&self) -> Option<&str> {
        match self.mode {
            DesignMode::ConstantAbsolute => self.height_field.as_deref(),
            DesignMode::HagField => self.hag_field.as_deref(),
            DesignMode::Gradient | DesignMode::HagValue => None,
        }
    }

    /// suffix appended to output names, `_<datum>` when requested.
    pub fn output_suffix(&self) -> String {
        if self.suffix_names && !self.datum.is_empty() {
            format!("_{}", self.datum)
        } else {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(mode: &str) -> DesignConfig {
        DesignConfig {
            mode: mode.to_string(),
            height_field: None,
            start_height: None,
            end_height: None,
            hag_field: None,
            hag_value: None,
            crest_width: 4.0,
            maintain_crest: false,
            batter: 2.0,
            taper: 5.0,
            strip_depth: 0.1,
            extra_buffer: 20.0,
            datum: String::from("AHD"),
            name_suffix: true,
            merge_by_id: false,
        }
    }

    #[test]
    fn test_gradient_requires_both_heights() {
        let mut conf = design("Gradient");
        conf.start_height = Some(10.0);
        let result = DesignParameters::new(&conf, &SmoothingConfig::default());
        match result {
            Err(BundError::MissingParameter { parameter, .. }) => {
                assert_eq!(parameter, "end_height")
            }
            other => panic!("expected missing end_height, found {other:?}"),
        }
        conf.end_height = Some(12.0);
        let params = DesignParameters::new(&conf, &SmoothingConfig::default())
            .expect("test invariant failed: gradient parameters");
        assert_eq!(params.carry_field(), None);
    }

    #[test]
    fn test_reach_and_crest_zone() {
        let mut conf = design("HagValue");
        conf.hag_value = Some(1.0);
        let mut params = DesignParameters::new(&conf, &SmoothingConfig::default())
            .expect("test invariant failed: parameters");
        assert_eq!(params.reach(), 2.0 * 10.0 + 2.0 + 5.0 + 20.0);
        assert_eq!(params.crest_half_width(1.0), 2.0);
        params.maintain_crest = true;
        assert_eq!(params.crest_half_width(1.0), 2.5);
        assert_eq!(params.output_suffix(), "_AHD");
    }

    #[test]
    fn test_rejects_zero_batter() {
        let mut conf = design("HagValue");
        conf.hag_value = Some(1.0);
        conf.batter = 0.0;
        assert!(matches!(
            DesignParameters::new(&conf, &SmoothingConfig::default()),
            Err(BundError::InvalidUserInput(_))
        ));
    }

    #[test]
    fn test_unknown_mode_is_fatal() {
        assert!(matches!(
            DesignParameters::new(&design("Diagonal"), &SmoothingConfig::default()),
            Err(BundError::UnknownDesignMode(_))
        ));
    }

    #[test]
    fn test_carry_field_by_mode() {
        let mut conf = design("ConstantAbsolute");
        conf.height_field = Some(String::from("crest"));
        let params = DesignParameters::new(&conf, &SmoothingConfig::default())
            .expect("test invariant failed: parameters");
        assert_eq!(params.carry_field(), Some("crest"));
    }
}
