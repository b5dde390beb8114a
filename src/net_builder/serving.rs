//! The two ways of assembling a serving module around a trained q-network.

use log::info;
use machine_learning::arch::Device;

use crate::{
    error::{NetBuilderErr, Result},
    models::QNetwork,
    normalization::NormalizationMap,
    prediction::{
        DiscreteDqnPredictorWrapper, DiscreteDqnPredictorWrapperWithIdList,
        DiscreteDqnWithPreprocessor, DiscreteDqnWithPreprocessorWithIdList, ServingModule,
    },
    preprocessing::Preprocessor,
    types::ModelFeatureConfig,
};

/// Puts `q_network` in evaluation mode on the cpu and returns the copy a serving module owns.
fn export_copy(q_network: &mut dyn QNetwork) -> Box<dyn QNetwork> {
    q_network.to_device(Device::Cpu);
    q_network.eval();
    q_network.cpu_model()
}

/// Assembles the serving module of a network that only consumes dense float features.
///
/// # Errors
/// `UnexpectedIdListFeatures` if `state_feature_config` declares id-list features, plus any error
/// of the preprocessor or wrapper construction.
pub fn dense(
    q_network: &mut dyn QNetwork,
    state_normalization_parameters: &NormalizationMap,
    action_names: &[String],
    state_feature_config: &ModelFeatureConfig,
) -> Result<Box<dyn ServingModule>> {
    if state_feature_config.has_id_list_features() {
        return Err(NetBuilderErr::UnexpectedIdListFeatures {
            count: state_feature_config.id_list_feature_configs.len(),
        });
    }

    let state_preprocessor = Preprocessor::new(state_normalization_parameters, Device::Cpu)?;
    let dqn_with_preprocessor =
        DiscreteDqnWithPreprocessor::new(export_copy(q_network), state_preprocessor)?;
    let module = DiscreteDqnPredictorWrapper::new(
        dqn_with_preprocessor,
        action_names.to_vec(),
        state_feature_config.clone(),
    )?;

    info!(actions = action_names.len(); "built dense serving module");
    Ok(Box::new(module))
}

/// Assembles the serving module of a network that also consumes id-list features; both wrappers
/// carry the feature config so raw ids can be looked up at inference time.
pub fn with_id_list(
    q_network: &mut dyn QNetwork,
    state_normalization_parameters: &NormalizationMap,
    action_names: &[String],
    state_feature_config: &ModelFeatureConfig,
) -> Result<Box<dyn ServingModule>> {
    let state_preprocessor = Preprocessor::new(state_normalization_parameters, Device::Cpu)?;
    let dqn_with_preprocessor = DiscreteDqnWithPreprocessorWithIdList::new(
        export_copy(q_network),
        state_preprocessor,
        state_feature_config.clone(),
    )?;
    let module = DiscreteDqnPredictorWrapperWithIdList::new(
        dqn_with_preprocessor,
        action_names.to_vec(),
        state_feature_config.clone(),
    )?;

    info!(
        actions = action_names.len(),
        id_list_features = state_feature_config.id_list_feature_configs.len();
        "built id-list serving module"
    );
    Ok(Box::new(module))
}
