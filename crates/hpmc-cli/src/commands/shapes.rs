use crate::cli::ShapesArgs;
use crate::config::{CliOverrides, PartialRunConfig, RunConfig};
use crate::error::{CliError, Result};
use hpmc::core::models::particle::ParticleStore;
use hpmc::engine::integrator::HpmcIntegrator;
use serde_json::{Map, Value};

/// Attaches an empty store so only the type table and shapes are needed.
fn shape_map(config: &RunConfig) -> Result<Map<String, Value>> {
    let names: Vec<&str> = config.types.keys().map(String::as_str).collect();
    let store = ParticleStore::with_types(config.sim_box.clone(), names.as_slice())
        .map_err(|e| CliError::Config(e.to_string()))?;

    let mut integrator = HpmcIntegrator::new(config.integrator.clone());
    integrator.attach(store);
    for (name, type_config) in &config.types {
        if let Some(spec) = &type_config.shape {
            integrator.set_shape(name, spec.clone())?;
        }
    }

    Ok(names
        .iter()
        .map(|name| name.to_string())
        .zip(integrator.type_shapes()?)
        .collect())
}

pub async fn run(args: ShapesArgs) -> Result<()> {
    let config = PartialRunConfig::from_file(&args.config)?.merge_with_cli(&CliOverrides::default())?;
    let shapes = shape_map(&config)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&Value::Object(shapes)).map_err(anyhow::Error::from)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::SPHERES;

    #[test]
    fn shapes_are_keyed_by_type_name() {
        let toml = format!("{SPHERES}\n[types.C]\nd = 0.0\n");
        let config = PartialRunConfig::from_toml(&toml)
            .unwrap()
            .merge_with_cli(&CliOverrides::default())
            .unwrap();
        let shapes = shape_map(&config).unwrap();
        assert_eq!(shapes["A"]["diameter"], 1.0);
        assert_eq!(shapes["B"]["diameter"], 0.5);
        assert_eq!(shapes["C"], Value::Null);
    }
}
