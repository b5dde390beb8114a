use std::{env, fs, process};

use anyhow::Context;
use log::info;

use dqn_net_builder::{ExportConfig, NetBuilderRegistry, StateRow};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [states.json]", args[0]);
        process::exit(1);
    }

    let config = ExportConfig::from_path(&args[1])
        .with_context(|| format!("failed to load export config from {}", args[1]))?;

    let registry = NetBuilderRegistry::with_defaults();
    let builder = registry.build(&config.net_builder)?;
    info!("using the {} net builder", builder.config_type());

    let mut q_network = builder.build_q_network(
        &config.state_feature_config,
        &config.normalization,
        config.action_names.len(),
    )?;

    let module = builder.build_serving_module(
        q_network.as_mut(),
        &config.normalization,
        &config.action_names,
        &config.state_feature_config,
    )?;

    let Some(states_path) = args.get(2) else {
        let q_network = module.q_network();
        println!(
            "{}: {} features -> {} actions ({} params)",
            builder.config_type(),
            q_network.input_dim(),
            q_network.output_dim(),
            q_network.num_params(),
        );
        return Ok(());
    };

    let content = fs::read_to_string(states_path)
        .with_context(|| format!("failed to read states from {states_path}"))?;
    let rows: Vec<StateRow> = serde_json::from_str(&content)?;
    info!("scoring {} states", rows.len());

    let input = module.input_from_rows(&rows);
    let prediction = module.predict(&input)?;

    for (i, best) in prediction.best_actions().into_iter().enumerate() {
        let q_values: serde_json::Map<String, serde_json::Value> = prediction
            .scores(i)
            .into_iter()
            .map(|(action, q)| (action.to_string(), serde_json::Value::from(q)))
            .collect();

        let line = serde_json::json!({ "best_action": best, "q_values": q_values });
        println!("{line}");
    }

    Ok(())
}
