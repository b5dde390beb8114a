//! Turns raw state features into the normalized dense input of a q-network.

use log::debug;
use machine_learning::arch::Device;
use ndarray::{Array2, ArrayView2, ArrayViewMut1, Axis, Zip};

use crate::{
    error::{NetBuilderErr, Result},
    normalization::{FeatureType, NormalizationMap, NormalizationParameters, sorted_features},
};

const MIN_FEATURE_VALUE: f32 = -6.;
const MAX_FEATURE_VALUE: f32 = 6.;
const PROBABILITY_EPS: f32 = 1e-5;
const CONTINUOUS_ACTION_EPS: f32 = 1e-6;
const BOXCOX_MIN_SHIFTED: f32 = 1e-6;

/// A single feature's transform, with its statistics unpacked.
#[derive(Debug, Clone)]
enum Transform {
    Binary,
    Probability,
    Continuous { mean: f32, stddev: f32 },
    Boxcox { lambda: f32, shift: f32, mean: f32, stddev: f32 },
    Quantile { quantiles: Vec<f32> },
    Enum { values: Vec<f32> },
    ContinuousAction { min: f32, scale: f32 },
    Identity,
}

impl Transform {
    fn new(params: &NormalizationParameters) -> Self {
        let mean = params.mean.unwrap_or_default();
        let stddev = params.stddev.unwrap_or(1.);

        match params.feature_type {
            FeatureType::Binary => Self::Binary,
            FeatureType::Probability => Self::Probability,
            FeatureType::Continuous => Self::Continuous { mean, stddev },
            FeatureType::Boxcox => Self::Boxcox {
                lambda: params.boxcox_lambda.unwrap_or_default(),
                shift: params.boxcox_shift.unwrap_or_default(),
                mean,
                stddev,
            },
            FeatureType::Quantile => Self::Quantile {
                quantiles: params.quantiles.clone().unwrap_or_default(),
            },
            FeatureType::Enum => Self::Enum {
                values: params.possible_values.clone().unwrap_or_default(),
            },
            FeatureType::ContinuousAction => {
                let min = params.min_value.unwrap_or(-1.);
                let max = params.max_value.unwrap_or(1.);
                let range = 2. * (1. - CONTINUOUS_ACTION_EPS);
                Self::ContinuousAction {
                    min,
                    scale: range / (max - min),
                }
            }
            FeatureType::DoNotPreprocess => Self::Identity,
        }
    }

    fn width(&self) -> usize {
        match self {
            Self::Enum { values } => values.len(),
            _ => 1,
        }
    }

    /// Writes the transformed `x` into `out`, which is `width()` columns wide.
    fn apply(&self, x: f32, mut out: ArrayViewMut1<f32>) {
        let y = match self {
            Self::Binary => {
                if x != 0. {
                    1.
                } else {
                    0.
                }
            }
            Self::Probability => {
                let p = x.clamp(PROBABILITY_EPS, 1. - PROBABILITY_EPS);
                -(1. / p - 1.).ln()
            }
            Self::Continuous { mean, stddev } => (x - mean) / stddev,
            Self::Boxcox {
                lambda,
                shift,
                mean,
                stddev,
            } => {
                // non-positive inputs have no box-cox image
                let shifted = (x + shift).max(BOXCOX_MIN_SHIFTED);
                let y = if *lambda == 0. {
                    shifted.ln()
                } else {
                    (shifted.powf(*lambda) - 1.) / lambda
                };
                (y - mean) / stddev
            }
            Self::Quantile { quantiles } => quantile_position(quantiles, x),
            Self::Enum { values } => {
                out.fill(0.);
                if let Some(idx) = values.iter().position(|&v| v == x) {
                    out[idx] = 1.;
                }
                return;
            }
            Self::ContinuousAction { min, scale } => {
                (x - min) * scale - 1. + CONTINUOUS_ACTION_EPS
            }
            Self::Identity => {
                out[0] = x;
                return;
            }
        };

        out[0] = y.clamp(MIN_FEATURE_VALUE, MAX_FEATURE_VALUE);
    }
}

/// The position of `x` among ascending `quantiles`, linearly interpolated within the bucket it
/// falls in and saturated to `[0, 1]` outside of them.
fn quantile_position(quantiles: &[f32], x: f32) -> f32 {
    let (first, last) = match (quantiles.first(), quantiles.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return 0.,
    };

    // also catches nan
    if !(x > first) {
        return 0.;
    }
    if x >= last {
        return 1.;
    }

    let buckets = (quantiles.len() - 1) as f32;
    let upper = quantiles.partition_point(|&q| q <= x);
    let (lo, hi) = (quantiles[upper - 1], quantiles[upper]);
    let within = if hi > lo { (x - lo) / (hi - lo) } else { 0. };

    ((upper - 1) as f32 + within) / buckets
}

/// Normalizes raw state features.
///
/// The raw input has one column per feature and the output one column per feature (or one per
/// possible value for `enum` features); both follow the canonical order of `sorted_features`.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    feature_ids: Vec<i32>,
    transforms: Vec<Transform>,
    output_dim: usize,
    device: Device,
}

impl Preprocessor {
    /// Creates a new `Preprocessor`.
    ///
    /// # Arguments
    /// * `normalization` - The statistics of every state feature.
    /// * `device` - The placement of the preprocessor.
    ///
    /// # Errors
    /// A `MalformedNormalization` if any entry is malformed.
    pub fn new(normalization: &NormalizationMap, device: Device) -> Result<Self> {
        let features = sorted_features(normalization);

        let mut feature_ids = Vec::with_capacity(features.len());
        let mut transforms = Vec::with_capacity(features.len());
        for (id, params) in features {
            params.validate(id)?;
            feature_ids.push(id);
            transforms.push(Transform::new(params));
        }

        let output_dim = transforms.iter().map(Transform::width).sum();
        debug!(input_dim = feature_ids.len(), output_dim = output_dim; "built preprocessor");

        Ok(Self {
            feature_ids,
            transforms,
            output_dim,
            device,
        })
    }

    /// The feature ids in the order the raw input columns are expected.
    pub fn feature_ids(&self) -> &[i32] {
        &self.feature_ids
    }

    pub fn input_dim(&self) -> usize {
        self.feature_ids.len()
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Normalizes a batch of raw features.
    ///
    /// # Arguments
    /// * `values` - The raw values, `(batch, input_dim)`.
    /// * `presence` - Whether each raw value is present; absent features output zeros. A nan
    ///   value counts as absent.
    ///
    /// # Returns
    /// The normalized features, `(batch, output_dim)`.
    pub fn forward(
        &self,
        values: ArrayView2<f32>,
        presence: ArrayView2<bool>,
    ) -> Result<Array2<f32>> {
        if values.ncols() != self.input_dim() {
            return Err(NetBuilderErr::ShapeMismatch {
                what: "preprocessor input columns",
                got: values.ncols(),
                expected: self.input_dim(),
            });
        }
        if presence.nrows() != values.nrows() {
            return Err(NetBuilderErr::ShapeMismatch {
                what: "presence rows",
                got: presence.nrows(),
                expected: values.nrows(),
            });
        }
        if presence.ncols() != values.ncols() {
            return Err(NetBuilderErr::ShapeMismatch {
                what: "presence columns",
                got: presence.ncols(),
                expected: values.ncols(),
            });
        }

        let mut out = Array2::zeros((values.nrows(), self.output_dim));
        Zip::from(out.axis_iter_mut(Axis(0)))
            .and(values.axis_iter(Axis(0)))
            .and(presence.axis_iter(Axis(0)))
            .for_each(|mut out_row, raw_row, present_row| {
                let mut col = 0;
                for ((transform, &x), &present) in
                    self.transforms.iter().zip(&raw_row).zip(&present_row)
                {
                    let width = transform.width();
                    if present && !x.is_nan() {
                        let slot = out_row.slice_mut(ndarray::s![col..col + width]);
                        transform.apply(x, slot);
                    }
                    col += width;
                }
            });

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ndarray::array;

    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{a} != {b}");
    }

    fn single(params: NormalizationParameters, x: f32) -> Vec<f32> {
        let norm = BTreeMap::from([(0, params)]);
        let pre = Preprocessor::new(&norm, Device::Cpu).unwrap();
        let present = Array2::from_elem((1, 1), true);
        pre.forward(array![[x]].view(), present.view())
            .unwrap()
            .into_raw_vec_and_offset()
            .0
    }

    #[test]
    fn binary_marks_non_zero_values() {
        assert_eq!(single(NormalizationParameters::binary(), 3.), vec![1.]);
        assert_eq!(single(NormalizationParameters::binary(), 0.), vec![0.]);
    }

    #[test]
    fn probability_is_a_clamped_logit() {
        assert_close(single(NormalizationParameters::probability(), 0.5)[0], 0.);
        assert_close(
            single(NormalizationParameters::probability(), 0.8)[0],
            (0.8f32 / 0.2).ln(),
        );
        // logit(1 - 1e-5) is beyond the clamp range
        assert_close(single(NormalizationParameters::probability(), 1.)[0], MAX_FEATURE_VALUE);
    }

    #[test]
    fn continuous_is_standardized() {
        assert_close(single(NormalizationParameters::continuous(2., 4.), 10.)[0], 2.);
        assert_close(
            single(NormalizationParameters::continuous(0., 1.), 100.)[0],
            MAX_FEATURE_VALUE,
        );
    }

    #[test]
    fn boxcox_transforms_then_standardizes() {
        let y = single(NormalizationParameters::boxcox(0.5, 1., 1., 2.), 3.)[0];
        // ((3 + 1)^0.5 - 1) / 0.5 = 2, then (2 - 1) / 2
        assert_close(y, 0.5);

        let y = single(NormalizationParameters::boxcox(0., 0., 0., 1.), std::f32::consts::E)[0];
        assert_close(y, 1.);
    }

    #[test]
    fn quantile_interpolates_within_buckets() {
        let params = || NormalizationParameters::quantile(vec![0., 10., 20.]);
        assert_close(single(params(), -5.)[0], 0.);
        assert_close(single(params(), 5.)[0], 0.25);
        assert_close(single(params(), 10.)[0], 0.5);
        assert_close(single(params(), 15.)[0], 0.75);
        assert_close(single(params(), 25.)[0], 1.);
    }

    #[test]
    fn nan_values_count_as_absent() {
        let quantile = NormalizationParameters::quantile(vec![0., 10.]);
        assert_eq!(single(quantile, f32::NAN), vec![0.]);
        assert_eq!(single(NormalizationParameters::continuous(5., 1.), f32::NAN), vec![0.]);
        assert_eq!(quantile_position(&[0., 10.], f32::NAN), 0.);
    }

    #[test]
    fn boxcox_of_non_positive_inputs_saturates() {
        let y = single(NormalizationParameters::boxcox(0., 0., 0., 1.), -1.)[0];
        assert_eq!(y, MIN_FEATURE_VALUE);
    }

    #[test]
    fn enum_is_one_hot() {
        let params = || NormalizationParameters::enumeration(vec![3., 5., 7.]);
        assert_eq!(single(params(), 5.), vec![0., 1., 0.]);
        assert_eq!(single(params(), 4.), vec![0., 0., 0.]);
    }

    #[test]
    fn continuous_action_maps_to_unit_range() {
        let params = || NormalizationParameters::continuous_action(0., 10.);
        assert_close(single(params(), 0.)[0], -1. + CONTINUOUS_ACTION_EPS);
        assert_close(single(params(), 5.)[0], 0.);
        assert_close(single(params(), 10.)[0], 1. - CONTINUOUS_ACTION_EPS);
    }

    #[test]
    fn do_not_preprocess_is_not_clamped() {
        assert_eq!(single(NormalizationParameters::do_not_preprocess(), 42.), vec![42.]);
    }

    #[test]
    fn columns_follow_canonical_order_and_absent_values_are_zero() {
        let norm = BTreeMap::from([
            (1, NormalizationParameters::enumeration(vec![0., 1.])),
            (2, NormalizationParameters::continuous(1., 1.)),
            (3, NormalizationParameters::binary()),
        ]);
        let pre = Preprocessor::new(&norm, Device::Cpu).unwrap();
        assert_eq!(pre.feature_ids(), &[3, 2, 1]);
        assert_eq!(pre.output_dim(), 4);

        let values = array![[1., 3., 1.], [0., 3., 0.]];
        let presence = array![[true, true, true], [true, false, true]];
        let out = pre.forward(values.view(), presence.view()).unwrap();
        assert_eq!(out, array![[1., 2., 0., 1.], [0., 0., 1., 0.]]);
    }

    #[test]
    fn wrong_widths_are_rejected() {
        let norm = BTreeMap::from([(1, NormalizationParameters::binary())]);
        let pre = Preprocessor::new(&norm, Device::Cpu).unwrap();

        let values = Array2::zeros((1, 2));
        let presence = Array2::from_elem((1, 2), true);
        assert!(matches!(
            pre.forward(values.view(), presence.view()),
            Err(NetBuilderErr::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn presence_rows_must_match() {
        let norm = BTreeMap::from([(1, NormalizationParameters::binary())]);
        let pre = Preprocessor::new(&norm, Device::Cpu).unwrap();

        let values = Array2::zeros((2, 1));
        let presence = Array2::from_elem((3, 1), true);
        assert!(matches!(
            pre.forward(values.view(), presence.view()),
            Err(NetBuilderErr::ShapeMismatch {
                what: "presence rows",
                got: 3,
                expected: 2
            })
        ));
    }

    #[test]
    fn malformed_normalization_is_rejected() {
        let norm = BTreeMap::from([(1, NormalizationParameters::continuous(0., -1.))]);
        assert!(matches!(
            Preprocessor::new(&norm, Device::Cpu),
            Err(NetBuilderErr::MalformedNormalization { feature_id: 1, .. })
        ));
    }
}
