//! Inference modules: a trained q-network bundled with the preprocessing it expects.

mod dqn_with_preprocessor;
mod predictor_wrapper;

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    error::{NetBuilderErr, Result},
    models::QNetwork,
    types::{IdListBatch, ModelFeatureConfig},
};

pub use dqn_with_preprocessor::{
    DiscreteDqnWithPreprocessor, DiscreteDqnWithPreprocessorWithIdList,
};
pub use predictor_wrapper::{DiscreteDqnPredictorWrapper, DiscreteDqnPredictorWrapperWithIdList};

/// Raw state features as they arrive at serving time.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingInput {
    /// Raw values, one column per feature in the serving module's `feature_ids` order.
    pub values: Array2<f32>,
    /// Whether each raw value is present.
    pub presence: Array2<bool>,
    /// Raw ids of every id-list feature, keyed by feature id.
    pub id_list_features: HashMap<i32, IdListBatch<i64>>,
}

impl ServingInput {
    /// Creates a `ServingInput` where every float value is present.
    pub fn dense(values: Array2<f32>) -> Self {
        let presence = Array2::from_elem(values.dim(), true);
        Self {
            values,
            presence,
            id_list_features: HashMap::new(),
        }
    }

    /// Lays out sparse state rows as dense columns following `feature_ids`; features a row
    /// doesn't mention are marked absent.
    ///
    /// Every id-list feature in `id_list_feature_ids` gets a batch even if no row mentions it,
    /// in which case all of its bags are empty.
    pub fn from_rows(
        rows: &[StateRow],
        feature_ids: &[i32],
        id_list_feature_ids: &[i32],
    ) -> Self {
        let dim = (rows.len(), feature_ids.len());
        let mut values = Array2::zeros(dim);
        let mut presence = Array2::from_elem(dim, false);
        let mut id_list_features: HashMap<i32, IdListBatch<i64>> = HashMap::new();

        for (i, row) in rows.iter().enumerate() {
            for (j, id) in feature_ids.iter().enumerate() {
                if let Some(&x) = row.float_features.get(id) {
                    values[(i, j)] = x;
                    presence[(i, j)] = true;
                }
            }
        }

        let id_list_ids: BTreeSet<i32> = rows
            .iter()
            .flat_map(|row| row.id_list_features.keys().copied())
            .chain(id_list_feature_ids.iter().copied())
            .collect();
        for id in id_list_ids {
            let batch = id_list_features.entry(id).or_default();
            for row in rows {
                let ids = row.id_list_features.get(&id).map(Vec::as_slice).unwrap_or(&[]);
                batch.lengths.push(ids.len());
                batch.values.extend_from_slice(ids);
            }
        }

        Self {
            values,
            presence,
            id_list_features,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.values.nrows()
    }
}

/// A single sparse state, as read from json.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateRow {
    #[serde(default)]
    pub float_features: HashMap<i32, f32>,
    #[serde(default)]
    pub id_list_features: HashMap<i32, Vec<i64>>,
}

/// The q-values of a batch of states, one column per action.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub action_names: Vec<String>,
    pub q_values: Array2<f32>,
}

impl Prediction {
    /// The highest valued action of every state.
    pub fn best_actions(&self) -> Vec<&str> {
        self.q_values
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |(bi, bq), (i, &q)| {
                        if q > bq { (i, q) } else { (bi, bq) }
                    })
                    .0;
                self.action_names[best].as_str()
            })
            .collect()
    }

    /// Pairs every action name with its q-value for state `row`.
    pub fn scores(&self, row: usize) -> Vec<(&str, f32)> {
        self.action_names
            .iter()
            .map(String::as_str)
            .zip(self.q_values.row(row).iter().copied())
            .collect()
    }
}

/// A deployable module: raw state in, named q-values out.
pub trait ServingModule: Send + Sync + fmt::Debug {
    fn action_names(&self) -> &[String];

    fn state_feature_config(&self) -> &ModelFeatureConfig;

    /// The feature ids in the order `ServingInput::values` columns are expected.
    fn feature_ids(&self) -> &[i32];

    /// The cpu, evaluation mode network this module runs.
    fn q_network(&self) -> &dyn QNetwork;

    fn predict(&self, input: &ServingInput) -> Result<Prediction>;

    /// Lays out sparse state rows the way this module expects them.
    fn input_from_rows(&self, rows: &[StateRow]) -> ServingInput {
        let id_list_feature_ids: Vec<i32> = self
            .state_feature_config()
            .id_list_feature_configs
            .iter()
            .map(|feature| feature.feature_id)
            .collect();

        ServingInput::from_rows(rows, self.feature_ids(), &id_list_feature_ids)
    }
}

pub(crate) fn check_action_count(q_network: &dyn QNetwork, action_names: &[String]) -> Result<()> {
    if q_network.output_dim() != action_names.len() {
        return Err(NetBuilderErr::ActionCountMismatch {
            got: q_network.output_dim(),
            expected: action_names.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn from_rows_marks_missing_features_absent() {
        let rows = vec![
            StateRow {
                float_features: HashMap::from([(1, 0.5), (2, 3.)]),
                id_list_features: HashMap::from([(100, vec![7, 8])]),
            },
            StateRow {
                float_features: HashMap::from([(2, -1.)]),
                ..Default::default()
            },
        ];

        let input = ServingInput::from_rows(&rows, &[2, 1], &[]);
        assert_eq!(input.values, array![[3., 0.5], [-1., 0.]]);
        assert_eq!(input.presence, array![[true, true], [true, false]]);
        assert_eq!(
            input.id_list_features[&100],
            IdListBatch::new(vec![2, 0], vec![7, 8])
        );
    }

    #[test]
    fn declared_id_list_features_get_empty_bags() {
        let rows = vec![StateRow {
            float_features: HashMap::from([(1, 0.5)]),
            ..Default::default()
        }];

        let input = ServingInput::from_rows(&rows, &[1], &[100]);
        assert_eq!(input.id_list_features.len(), 1);
        assert_eq!(
            input.id_list_features[&100],
            IdListBatch::new(vec![0], vec![])
        );
    }

    #[test]
    fn best_actions_pick_the_argmax() {
        let prediction = Prediction {
            action_names: vec!["left".into(), "right".into()],
            q_values: array![[0.1, 0.9], [2., -1.]],
        };

        assert_eq!(prediction.best_actions(), vec!["right", "left"]);
        assert_eq!(prediction.scores(1), vec![("left", 2.), ("right", -1.)]);
    }

    #[test]
    fn state_rows_deserialize_with_integer_keys() {
        let json = r#"{ "float_features": { "3": 1.5 }, "id_list_features": { "9": [1, 2] } }"#;
        let row: StateRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.float_features[&3], 1.5);
        assert_eq!(row.id_list_features[&9], vec![1, 2]);
    }
}
