use std::collections::HashMap;

use log::warn;
use ndarray::Array2;

use crate::{
    error::{NetBuilderErr, Result},
    models::QNetwork,
    preprocessing::Preprocessor,
    types::{IdListBatch, IdListFeatureConfig, ModelFeatureConfig, ModelInput},
};

use super::ServingInput;

fn check_compatible(model: &dyn QNetwork, preprocessor: &Preprocessor) -> Result<()> {
    if preprocessor.device() != model.device() {
        return Err(NetBuilderErr::InvalidConfig(format!(
            "the preprocessor is on {} but the model is on {}",
            preprocessor.device(),
            model.device()
        )));
    }
    if preprocessor.output_dim() != model.input_dim() {
        return Err(NetBuilderErr::ShapeMismatch {
            what: "preprocessed state width",
            got: preprocessor.output_dim(),
            expected: model.input_dim(),
        });
    }

    Ok(())
}

/// A q-network preceded by the preprocessing of its dense state features.
#[derive(Debug)]
pub struct DiscreteDqnWithPreprocessor {
    model: Box<dyn QNetwork>,
    preprocessor: Preprocessor,
}

impl DiscreteDqnWithPreprocessor {
    /// # Errors
    /// A `ShapeMismatch` if the preprocessor's output doesn't fit the model's input, or an
    /// `InvalidConfig` if they are placed on different devices.
    pub fn new(model: Box<dyn QNetwork>, preprocessor: Preprocessor) -> Result<Self> {
        check_compatible(model.as_ref(), &preprocessor)?;
        Ok(Self {
            model,
            preprocessor,
        })
    }

    pub fn model(&self) -> &dyn QNetwork {
        self.model.as_ref()
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn forward(&self, input: &ServingInput) -> Result<Array2<f32>> {
        let state = self
            .preprocessor
            .forward(input.values.view(), input.presence.view())?;

        self.model.forward(&ModelInput::new(state))
    }
}

/// An id-list feature ready for lookups: its declaration plus the raw id to row index.
#[derive(Debug)]
struct IdListLookup {
    feature: IdListFeatureConfig,
    rows: HashMap<i64, usize>,
}

/// A q-network preceded by dense preprocessing and by the translation of raw id-list ids into
/// embedding rows. Ids unknown to a feature's mapping are dropped from their bag.
#[derive(Debug)]
pub struct DiscreteDqnWithPreprocessorWithIdList {
    model: Box<dyn QNetwork>,
    preprocessor: Preprocessor,
    state_feature_config: ModelFeatureConfig,
    lookups: Vec<IdListLookup>,
}

impl DiscreteDqnWithPreprocessorWithIdList {
    /// # Errors
    /// A `ShapeMismatch` if the preprocessor's output doesn't fit the model's input, or an
    /// `InvalidConfig` if they are placed on different devices or an id-list feature refers to
    /// an undeclared mapping.
    pub fn new(
        model: Box<dyn QNetwork>,
        preprocessor: Preprocessor,
        state_feature_config: ModelFeatureConfig,
    ) -> Result<Self> {
        check_compatible(model.as_ref(), &preprocessor)?;
        state_feature_config.validate()?;

        let lookups: Vec<IdListLookup> = state_feature_config
            .id_list_feature_configs
            .iter()
            .map(|feature| {
                Ok(IdListLookup {
                    feature: feature.clone(),
                    rows: state_feature_config.id_mapping(feature)?.index(),
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            model,
            preprocessor,
            state_feature_config,
            lookups,
        })
    }

    pub fn model(&self) -> &dyn QNetwork {
        self.model.as_ref()
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn state_feature_config(&self) -> &ModelFeatureConfig {
        &self.state_feature_config
    }

    pub fn forward(&self, input: &ServingInput) -> Result<Array2<f32>> {
        let state = self
            .preprocessor
            .forward(input.values.view(), input.presence.view())?;

        let mut id_list_features = HashMap::with_capacity(self.lookups.len());
        for lookup in &self.lookups {
            let feature_id = lookup.feature.feature_id;
            let raw = input
                .id_list_features
                .get(&feature_id)
                .ok_or(NetBuilderErr::MissingIdListFeature { feature_id })?;

            id_list_features.insert(lookup.feature.name.clone(), lookup.map(raw)?);
        }

        let input = ModelInput::new(state).with_id_list_features(id_list_features);
        self.model.forward(&input)
    }
}

impl IdListLookup {
    fn map(&self, raw: &IdListBatch<i64>) -> Result<IdListBatch<usize>> {
        let mut mapped = IdListBatch::default();
        let mut dropped = 0;

        for bag in raw.bags()? {
            let before = mapped.values.len();
            for id in bag {
                match self.rows.get(id) {
                    Some(&row) => mapped.values.push(row),
                    None => dropped += 1,
                }
            }
            mapped.lengths.push(mapped.values.len() - before);
        }

        if dropped > 0 {
            warn!(
                feature = self.feature.name.as_str(), dropped = dropped;
                "dropped ids unknown to the feature's id mapping"
            );
        }

        Ok(mapped)
    }
}
