use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{NetBuilderErr, Result};

/// A dense float feature of the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatFeatureInfo {
    pub name: String,
    pub feature_id: i32,
}

/// A sparse feature whose value is a bag of raw ids, looked up through `id_mapping_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdListFeatureConfig {
    pub name: String,
    pub feature_id: i32,
    pub id_mapping_name: String,
}

/// The raw ids an embedding table knows about; an id's row is its position in `ids`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdMapping {
    pub ids: Vec<i64>,
}

impl IdMapping {
    pub fn new(ids: Vec<i64>) -> Self {
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Builds the raw id to row lookup.
    pub fn index(&self) -> HashMap<i64, usize> {
        self.ids.iter().enumerate().map(|(i, &id)| (id, i)).collect()
    }
}

/// Describes the identity and shape of the state features a model consumes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelFeatureConfig {
    #[serde(default)]
    pub float_feature_infos: Vec<FloatFeatureInfo>,
    #[serde(default)]
    pub id_list_feature_configs: Vec<IdListFeatureConfig>,
    #[serde(default)]
    pub id_mapping_config: HashMap<String, IdMapping>,
}

impl ModelFeatureConfig {
    pub fn has_id_list_features(&self) -> bool {
        !self.id_list_feature_configs.is_empty()
    }

    /// Returns the mapping an id-list feature refers to.
    ///
    /// # Errors
    /// An `InvalidConfig` if the mapping isn't declared in `id_mapping_config`.
    pub fn id_mapping(&self, feature: &IdListFeatureConfig) -> Result<&IdMapping> {
        self.id_mapping_config
            .get(&feature.id_mapping_name)
            .ok_or_else(|| {
                NetBuilderErr::InvalidConfig(format!(
                    "id-list feature '{}' refers to undeclared id mapping '{}'",
                    feature.name, feature.id_mapping_name
                ))
            })
    }

    /// Checks that every id-list feature has a declared mapping and that names and ids are unique.
    pub fn validate(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();
        let mut ids = std::collections::HashSet::new();

        for feature in &self.id_list_feature_configs {
            self.id_mapping(feature)?;

            if !names.insert(feature.name.as_str()) || !ids.insert(feature.feature_id) {
                return Err(NetBuilderErr::InvalidConfig(format!(
                    "id-list feature '{}' ({}) is declared twice",
                    feature.name, feature.feature_id
                )));
            }
        }

        Ok(())
    }
}

/// A batch of bags, one per sample: sample `i` owns `lengths[i]` consecutive entries of `values`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdListBatch<T> {
    pub lengths: Vec<usize>,
    pub values: Vec<T>,
}

impl<T> IdListBatch<T> {
    pub fn new(lengths: Vec<usize>, values: Vec<T>) -> Self {
        Self { lengths, values }
    }

    pub fn batch_size(&self) -> usize {
        self.lengths.len()
    }

    /// Iterates over every sample's bag.
    ///
    /// # Errors
    /// A `ShapeMismatch` if the lengths don't add up to the amount of values.
    pub fn bags(&self) -> Result<impl Iterator<Item = &[T]>> {
        let total: usize = self.lengths.iter().sum();
        if total != self.values.len() {
            return Err(NetBuilderErr::ShapeMismatch {
                what: "id-list values",
                got: self.values.len(),
                expected: total,
            });
        }

        let mut start = 0;
        Ok(self.lengths.iter().map(move |&len| {
            let bag = &self.values[start..start + len];
            start += len;
            bag
        }))
    }
}

/// The input of a q-network: preprocessed float features plus id-list features already mapped to
/// embedding rows, keyed by feature name.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub float_features: Array2<f32>,
    pub id_list_features: HashMap<String, IdListBatch<usize>>,
}

impl ModelInput {
    pub fn new(float_features: Array2<f32>) -> Self {
        Self {
            float_features,
            id_list_features: HashMap::new(),
        }
    }

    pub fn with_id_list_features(
        mut self,
        id_list_features: HashMap<String, IdListBatch<usize>>,
    ) -> Self {
        self.id_list_features = id_list_features;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.float_features.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ModelFeatureConfig {
        ModelFeatureConfig {
            float_feature_infos: vec![FloatFeatureInfo {
                name: "age".into(),
                feature_id: 1,
            }],
            id_list_feature_configs: vec![IdListFeatureConfig {
                name: "pages".into(),
                feature_id: 100,
                id_mapping_name: "page_ids".into(),
            }],
            id_mapping_config: HashMap::from([(
                "page_ids".to_string(),
                IdMapping::new(vec![11, 22, 33]),
            )]),
        }
    }

    #[test]
    fn id_mapping_lookup() {
        let config = config();
        let mapping = config.id_mapping(&config.id_list_feature_configs[0]).unwrap();
        assert_eq!(mapping.index()[&22], 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn undeclared_mapping_is_invalid() {
        let mut config = config();
        config.id_mapping_config.clear();
        assert!(matches!(
            config.validate(),
            Err(NetBuilderErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn duplicated_id_list_features_are_invalid() {
        let mut config = config();
        let dup = config.id_list_feature_configs[0].clone();
        config.id_list_feature_configs.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn bags_split_values_by_length() {
        let batch = IdListBatch::new(vec![2, 0, 1], vec![1, 2, 3]);
        let bags: Vec<&[i32]> = batch.bags().unwrap().collect();
        assert_eq!(bags, vec![&[1, 2][..], &[][..], &[3][..]]);

        let bad = IdListBatch::new(vec![2], vec![1]);
        assert!(bad.bags().is_err());
    }

    #[test]
    fn feature_config_defaults_missing_sections() {
        let config: ModelFeatureConfig =
            serde_json::from_str(r#"{ "float_feature_infos": [] }"#).unwrap();
        assert!(!config.has_id_list_features());
    }
}
