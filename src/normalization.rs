//! Per-feature normalization statistics and the width they induce on a network's input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{NetBuilderErr, Result};

/// Normalization parameters keyed by feature id.
pub type NormalizationMap = BTreeMap<i32, NormalizationParameters>;

/// How a raw feature value is transformed before reaching a network.
///
/// The declaration order is the canonical column order: features are grouped by type in this
/// order and sorted by id within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Binary,
    Probability,
    Continuous,
    Boxcox,
    Quantile,
    Enum,
    ContinuousAction,
    DoNotPreprocess,
}

/// Statistics describing a single feature. Which fields are required depends on `feature_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParameters {
    pub feature_type: FeatureType,
    pub boxcox_lambda: Option<f32>,
    pub boxcox_shift: Option<f32>,
    pub mean: Option<f32>,
    pub stddev: Option<f32>,
    pub possible_values: Option<Vec<f32>>,
    pub quantiles: Option<Vec<f32>>,
    pub min_value: Option<f32>,
    pub max_value: Option<f32>,
}

impl NormalizationParameters {
    fn of_type(feature_type: FeatureType) -> Self {
        Self {
            feature_type,
            boxcox_lambda: None,
            boxcox_shift: None,
            mean: None,
            stddev: None,
            possible_values: None,
            quantiles: None,
            min_value: None,
            max_value: None,
        }
    }

    pub fn binary() -> Self {
        Self::of_type(FeatureType::Binary)
    }

    pub fn probability() -> Self {
        Self::of_type(FeatureType::Probability)
    }

    pub fn continuous(mean: f32, stddev: f32) -> Self {
        Self {
            mean: Some(mean),
            stddev: Some(stddev),
            ..Self::of_type(FeatureType::Continuous)
        }
    }

    pub fn boxcox(lambda: f32, shift: f32, mean: f32, stddev: f32) -> Self {
        Self {
            boxcox_lambda: Some(lambda),
            boxcox_shift: Some(shift),
            mean: Some(mean),
            stddev: Some(stddev),
            ..Self::of_type(FeatureType::Boxcox)
        }
    }

    pub fn quantile(quantiles: Vec<f32>) -> Self {
        Self {
            quantiles: Some(quantiles),
            ..Self::of_type(FeatureType::Quantile)
        }
    }

    pub fn enumeration(possible_values: Vec<f32>) -> Self {
        Self {
            possible_values: Some(possible_values),
            ..Self::of_type(FeatureType::Enum)
        }
    }

    pub fn continuous_action(min_value: f32, max_value: f32) -> Self {
        Self {
            min_value: Some(min_value),
            max_value: Some(max_value),
            ..Self::of_type(FeatureType::ContinuousAction)
        }
    }

    pub fn do_not_preprocess() -> Self {
        Self::of_type(FeatureType::DoNotPreprocess)
    }

    /// Checks that the statistics required by `feature_type` are present and usable.
    ///
    /// # Errors
    /// A `MalformedNormalization` naming `feature_id` and the first problem found.
    pub fn validate(&self, feature_id: i32) -> Result<()> {
        let malformed = |reason: &str| NetBuilderErr::MalformedNormalization {
            feature_id,
            reason: reason.to_string(),
        };

        match self.feature_type {
            FeatureType::Binary | FeatureType::Probability | FeatureType::DoNotPreprocess => {}
            FeatureType::Continuous => {
                self.mean.ok_or_else(|| malformed("missing mean"))?;
                self.checked_stddev()
                    .ok_or_else(|| malformed("stddev must be finite and positive"))?;
            }
            FeatureType::Boxcox => {
                self.boxcox_lambda.ok_or_else(|| malformed("missing boxcox_lambda"))?;
                self.mean.ok_or_else(|| malformed("missing mean"))?;
                self.checked_stddev()
                    .ok_or_else(|| malformed("stddev must be finite and positive"))?;
            }
            FeatureType::Quantile => {
                let quantiles = self
                    .quantiles
                    .as_deref()
                    .ok_or_else(|| malformed("missing quantiles"))?;
                if quantiles.len() < 2 {
                    return Err(malformed("at least two quantiles are required"));
                }
                if quantiles.windows(2).any(|w| !(w[0] <= w[1])) {
                    return Err(malformed("quantiles must be ascending"));
                }
            }
            FeatureType::Enum => {
                let values = self
                    .possible_values
                    .as_deref()
                    .ok_or_else(|| malformed("missing possible_values"))?;
                if values.is_empty() {
                    return Err(malformed("possible_values is empty"));
                }
            }
            FeatureType::ContinuousAction => {
                let (Some(min), Some(max)) = (self.min_value, self.max_value) else {
                    return Err(malformed("missing min_value or max_value"));
                };
                if !(min < max) {
                    return Err(malformed("min_value must be smaller than max_value"));
                }
            }
        }

        Ok(())
    }

    /// The amount of columns this feature occupies after preprocessing.
    pub fn output_width(&self) -> usize {
        match (self.feature_type, &self.possible_values) {
            (FeatureType::Enum, Some(values)) => values.len(),
            (FeatureType::Enum, None) => 0,
            _ => 1,
        }
    }

    fn checked_stddev(&self) -> Option<f32> {
        self.stddev.filter(|s| s.is_finite() && *s > 0.)
    }
}

/// Returns the flattened width of the preprocessed state: one column per feature, except `enum`
/// features which take one column per possible value.
///
/// # Errors
/// A `MalformedNormalization` if any entry is malformed.
pub fn get_num_output_features(normalization: &NormalizationMap) -> Result<usize> {
    normalization.iter().try_fold(0, |width, (&id, params)| {
        params.validate(id)?;
        Ok(width + params.output_width())
    })
}

/// The features in canonical column order: grouped by type, then sorted by id.
pub fn sorted_features(normalization: &NormalizationMap) -> Vec<(i32, &NormalizationParameters)> {
    let mut features: Vec<_> = normalization.iter().map(|(&id, p)| (id, p)).collect();
    features.sort_by_key(|&(id, p)| (p.feature_type, id));
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalization() -> NormalizationMap {
        BTreeMap::from([
            (3, NormalizationParameters::continuous(0., 1.)),
            (1, NormalizationParameters::enumeration(vec![0., 1., 2.])),
            (2, NormalizationParameters::binary()),
            (7, NormalizationParameters::probability()),
        ])
    }

    #[test]
    fn enum_features_expand_to_their_values() {
        assert_eq!(get_num_output_features(&normalization()).unwrap(), 6);
    }

    #[test]
    fn empty_normalization_has_no_width() {
        assert_eq!(get_num_output_features(&NormalizationMap::new()).unwrap(), 0);
    }

    #[test]
    fn malformed_entries_are_reported() {
        let mut norm = normalization();
        norm.insert(9, NormalizationParameters::enumeration(vec![]));

        match get_num_output_features(&norm).unwrap_err() {
            NetBuilderErr::MalformedNormalization { feature_id, .. } => assert_eq!(feature_id, 9),
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn validation_per_type() {
        assert!(NormalizationParameters::continuous(0., 0.).validate(0).is_err());
        assert!(NormalizationParameters::continuous(0., f32::INFINITY).validate(0).is_err());
        assert!(NormalizationParameters::quantile(vec![1.]).validate(0).is_err());
        assert!(NormalizationParameters::quantile(vec![2., 1.]).validate(0).is_err());
        assert!(NormalizationParameters::quantile(vec![1., 1., 2.]).validate(0).is_ok());
        assert!(NormalizationParameters::continuous_action(1., 1.).validate(0).is_err());
        assert!(NormalizationParameters::boxcox(0.5, 0., 0., 1.).validate(0).is_ok());
        assert!(NormalizationParameters::do_not_preprocess().validate(0).is_ok());
    }

    #[test]
    fn features_are_grouped_by_type_then_id() {
        let norm = normalization();
        let ids: Vec<i32> = sorted_features(&norm).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 7, 3, 1]);
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "4": { "feature_type": "continuous", "mean": 1.5, "stddev": 2.0 },
            "5": { "feature_type": "enum", "possible_values": [10, 20] }
        }"#;
        let norm: NormalizationMap = serde_json::from_str(json).unwrap();

        assert_eq!(norm[&4], NormalizationParameters::continuous(1.5, 2.));
        assert_eq!(norm[&5].possible_values, Some(vec![10., 20.]));
        assert_eq!(get_num_output_features(&norm).unwrap(), 3);
    }
}
