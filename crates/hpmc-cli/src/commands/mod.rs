pub mod overlaps;
pub mod run;
pub mod shapes;

use crate::config::RunConfig;
use crate::error::{CliError, Result};
use hpmc::core::io::snapshot;
use hpmc::core::models::builder::LatticeBuilder;
use hpmc::core::models::particle::ParticleStore;
use hpmc::engine::error::EngineError;
use hpmc::engine::integrator::HpmcIntegrator;
use std::path::Path;
use tracing::{debug, info};

/// Builds an integrator attached to the configured particles, with every type parameter and
/// overlap setting from `config` applied. Type ids follow the sorted type names.
pub fn prepare_integrator(config: &RunConfig, input: Option<&Path>) -> Result<HpmcIntegrator> {
    let names: Vec<&str> = config.types.keys().map(String::as_str).collect();
    let mut store = ParticleStore::with_types(config.sim_box.clone(), names.as_slice())
        .map_err(|e| CliError::Config(e.to_string()))?;

    match (input, &config.init) {
        (Some(path), _) => {
            info!("Loading initial configuration from {:?}", path);
            let count = snapshot::read_file(path, &mut store)?;
            debug!(count, "Snapshot loaded.");
        }
        (None, Some(init)) => {
            let type_ids = init
                .types
                .iter()
                .filter_map(|name| store.type_id(name))
                .collect();
            let builder = LatticeBuilder::new(init.count).types(type_ids);
            info!(
                count = init.count,
                spacing = builder.spacing(&store),
                "Placing particles on a lattice."
            );
            builder
                .populate(&mut store)
                .map_err(|e| CliError::Config(e.to_string()))?;
        }
        (None, None) => {
            return Err(CliError::Argument(
                "No initial configuration: pass --input or add an `[init]` section.".to_string(),
            ));
        }
    }

    let mut integrator = HpmcIntegrator::new(config.integrator.clone());
    integrator.attach(store);

    let params = integrator.params_mut()?;
    if let Some(ratio) = config.move_ratio {
        params.set_move_ratio(ratio).map_err(EngineError::from)?;
    }
    if let Some(nselect) = config.nselect {
        params.set_nselect(nselect).map_err(EngineError::from)?;
    }
    params.set_quermass(config.quermass);
    params
        .set_sweep_radius(config.sweep_radius)
        .map_err(EngineError::from)?;

    for (type_id, type_config) in config.types.values().enumerate() {
        if let Some(d) = type_config.d {
            params.set_d(type_id, d).map_err(EngineError::from)?;
        }
        if let Some(a) = type_config.a {
            params.set_a(type_id, a).map_err(EngineError::from)?;
        }
        params
            .set_fugacity(type_id, type_config.fugacity)
            .map_err(EngineError::from)?;
        params.set_ignore_statistics(type_id, type_config.ignore_statistics);
    }

    for (name, type_config) in &config.types {
        if let Some(spec) = &type_config.shape {
            integrator.set_shape(name, spec.clone())?;
        }
    }
    for check in &config.overlap_checks {
        integrator.set_overlap_check(&check.a, &check.b, check.enable)?;
    }

    Ok(integrator)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs;
    use std::path::{Path, PathBuf};

    pub const SPHERES: &str = r#"
[box]
lengths = [10.0, 10.0, 10.0]

[integrator]
seed = 11
sweeps = 5
backend = "serial"

[types.A]
shape = { type = "sphere", diameter = 1.0 }
d = 0.1

[types.B]
shape = { type = "sphere", diameter = 0.5 }
d = 0.1

[init]
count = 27
types = ["A", "B"]
"#;

    pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::config::{CliOverrides, PartialRunConfig};

    fn config(toml: &str) -> RunConfig {
        PartialRunConfig::from_toml(toml)
            .unwrap()
            .merge_with_cli(&CliOverrides::default())
            .unwrap()
    }

    #[test]
    fn lattice_initialization_applies_parameters() {
        let integrator = prepare_integrator(&config(SPHERES), None).unwrap();
        let store = integrator.store().unwrap();
        assert_eq!(store.len(), 27);
        assert_eq!(store.type_names(), ["A".to_string(), "B".to_string()]);
        assert_eq!(store.particles()[1].type_id, 1);

        let params = integrator.params().unwrap();
        assert_eq!(params.d(0), 0.1);
        assert!(params.shape(1).is_some());
        assert_eq!(integrator.count_overlaps().unwrap(), 0);
    }

    #[test]
    fn snapshot_input_replaces_the_lattice() {
        let dir = tempfile::tempdir().unwrap();
        let csv = "tag,type,x,y,z,qw,qx,qy,qz\n\
                   0,A,0.0,0.0,0.0,1.0,0.0,0.0,0.0\n\
                   1,B,0.6,0.0,0.0,1.0,0.0,0.0,0.0\n";
        let path = write(dir.path(), "in.csv", csv);

        let integrator = prepare_integrator(&config(SPHERES), Some(&path)).unwrap();
        assert_eq!(integrator.store().unwrap().len(), 2);
        assert_eq!(integrator.count_overlaps().unwrap(), 1);
    }

    #[test]
    fn overlap_checks_are_applied_by_name() {
        let toml = format!("{SPHERES}\n[[overlap-checks]]\na = \"A\"\nb = \"B\"\nenable = false\n");
        let dir = tempfile::tempdir().unwrap();
        let csv = "tag,type,x,y,z,qw,qx,qy,qz\n\
                   0,A,0.0,0.0,0.0,1.0,0.0,0.0,0.0\n\
                   1,B,0.6,0.0,0.0,1.0,0.0,0.0,0.0\n";
        let path = write(dir.path(), "in.csv", csv);

        let integrator = prepare_integrator(&config(&toml), Some(&path)).unwrap();
        assert_eq!(integrator.count_overlaps().unwrap(), 0);
    }

    #[test]
    fn overlap_checks_for_undeclared_types_are_skipped() {
        let toml = format!("{SPHERES}\n[[overlap-checks]]\na = \"A\"\nb = \"Z\"\nenable = false\n");
        let integrator = prepare_integrator(&config(&toml), None).unwrap();
        assert!(integrator.overlap_matrix().unwrap().entries().is_empty());
    }

    #[test]
    fn missing_initial_configuration_is_an_argument_error() {
        let toml = SPHERES.replace("[init]\ncount = 27\ntypes = [\"A\", \"B\"]\n", "");
        let result = prepare_integrator(&config(&toml), None);
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
