use crate::{
    error::Result,
    models::QNetwork,
    types::ModelFeatureConfig,
};

use super::{
    DiscreteDqnWithPreprocessor, DiscreteDqnWithPreprocessorWithIdList, Prediction, ServingInput,
    ServingModule, check_action_count,
};

/// The servable form of a dense-feature q-network: names the q-values it computes.
#[derive(Debug)]
pub struct DiscreteDqnPredictorWrapper {
    dqn_with_preprocessor: DiscreteDqnWithPreprocessor,
    action_names: Vec<String>,
    state_feature_config: ModelFeatureConfig,
}

impl DiscreteDqnPredictorWrapper {
    /// # Errors
    /// An `ActionCountMismatch` if the network's output width differs from the amount of actions.
    pub fn new(
        dqn_with_preprocessor: DiscreteDqnWithPreprocessor,
        action_names: Vec<String>,
        state_feature_config: ModelFeatureConfig,
    ) -> Result<Self> {
        check_action_count(dqn_with_preprocessor.model(), &action_names)?;

        Ok(Self {
            dqn_with_preprocessor,
            action_names,
            state_feature_config,
        })
    }
}

impl ServingModule for DiscreteDqnPredictorWrapper {
    fn action_names(&self) -> &[String] {
        &self.action_names
    }

    fn state_feature_config(&self) -> &ModelFeatureConfig {
        &self.state_feature_config
    }

    fn feature_ids(&self) -> &[i32] {
        self.dqn_with_preprocessor.preprocessor().feature_ids()
    }

    fn q_network(&self) -> &dyn QNetwork {
        self.dqn_with_preprocessor.model()
    }

    fn predict(&self, input: &ServingInput) -> Result<Prediction> {
        let q_values = self.dqn_with_preprocessor.forward(input)?;

        Ok(Prediction {
            action_names: self.action_names.clone(),
            q_values,
        })
    }
}

/// The servable form of a q-network that also consumes id-list features.
#[derive(Debug)]
pub struct DiscreteDqnPredictorWrapperWithIdList {
    dqn_with_preprocessor: DiscreteDqnWithPreprocessorWithIdList,
    action_names: Vec<String>,
    state_feature_config: ModelFeatureConfig,
}

impl DiscreteDqnPredictorWrapperWithIdList {
    /// # Errors
    /// An `ActionCountMismatch` if the network's output width differs from the amount of actions.
    pub fn new(
        dqn_with_preprocessor: DiscreteDqnWithPreprocessorWithIdList,
        action_names: Vec<String>,
        state_feature_config: ModelFeatureConfig,
    ) -> Result<Self> {
        check_action_count(dqn_with_preprocessor.model(), &action_names)?;

        Ok(Self {
            dqn_with_preprocessor,
            action_names,
            state_feature_config,
        })
    }
}

impl ServingModule for DiscreteDqnPredictorWrapperWithIdList {
    fn action_names(&self) -> &[String] {
        &self.action_names
    }

    fn state_feature_config(&self) -> &ModelFeatureConfig {
        &self.state_feature_config
    }

    fn feature_ids(&self) -> &[i32] {
        self.dqn_with_preprocessor.preprocessor().feature_ids()
    }

    fn q_network(&self) -> &dyn QNetwork {
        self.dqn_with_preprocessor.model()
    }

    fn predict(&self, input: &ServingInput) -> Result<Prediction> {
        let q_values = self.dqn_with_preprocessor.forward(input)?;

        Ok(Prediction {
            action_names: self.action_names.clone(),
            q_values,
        })
    }
}
