use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use hpmc::core::models::sim_box::{Dimensions, SimBox};
use hpmc::core::shapes::spec::ShapeSpec;
use hpmc::engine::config::{self as core_config, BackendKind, RebuildPolicy};
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const DEFAULT_SWEEPS: u64 = 1000;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialBoxConfig {
    lengths: Vec<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialIntegratorConfig {
    seed: Option<u64>,
    sweeps: Option<u64>,
    move_ratio: Option<f64>,
    nselect: Option<u32>,
    quermass: Option<bool>,
    sweep_radius: Option<f64>,
    rebuild: Option<RebuildPolicy>,
    backend: Option<BackendKind>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialTypeConfig {
    shape: Option<ShapeSpec>,
    d: Option<f64>,
    a: Option<f64>,
    fugacity: Option<f64>,
    ignore_statistics: Option<bool>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialOverlapCheck {
    a: String,
    b: String,
    enable: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialInitConfig {
    count: usize,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialRunConfig {
    #[serde(rename = "box")]
    sim_box: Option<PartialBoxConfig>,
    integrator: Option<PartialIntegratorConfig>,
    #[serde(default)]
    types: BTreeMap<String, PartialTypeConfig>,
    #[serde(default)]
    overlap_checks: Vec<PartialOverlapCheck>,
    init: Option<PartialInitConfig>,
}

/// Per-type settings after merging file and command line.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeConfig {
    pub shape: Option<ShapeSpec>,
    pub d: Option<f64>,
    pub a: Option<f64>,
    pub fugacity: f64,
    pub ignore_statistics: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlapCheck {
    pub a: String,
    pub b: String,
    pub enable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitConfig {
    pub count: usize,
    pub types: Vec<String>,
}

/// Everything a command needs to set up an integrator.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub sim_box: SimBox,
    pub integrator: core_config::IntegratorConfig,
    pub sweeps: u64,
    pub move_ratio: Option<f64>,
    pub nselect: Option<u32>,
    pub quermass: bool,
    pub sweep_radius: f64,
    /// Type name to settings. Type ids follow this (sorted) order.
    pub types: BTreeMap<String, TypeConfig>,
    pub overlap_checks: Vec<OverlapCheck>,
    pub init: Option<InitConfig>,
}

/// Command-line values that may override the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub sweeps: Option<u64>,
    pub seed: Option<u64>,
    pub backend: Option<BackendKind>,
    pub set_values: Vec<String>,
}

impl From<&RunArgs> for CliOverrides {
    fn from(args: &RunArgs) -> Self {
        Self {
            sweeps: args.sweeps,
            seed: args.seed,
            backend: args.backend.map(Into::into),
            set_values: args.set_values.clone(),
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: {} ({})",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| match e {
            CliError::FileParsing { source, .. } => CliError::FileParsing {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::FileParsing {
            path: "<inline>".into(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, overrides: &CliOverrides) -> Result<RunConfig> {
        self.apply_set_values(&overrides.set_values)?;

        let integrator = self.integrator.take().unwrap_or_default();

        let lengths = self
            .sim_box
            .take()
            .ok_or_else(|| CliError::Config("`box` section is required.".to_string()))?
            .lengths;
        let sim_box = match lengths.as_slice() {
            &[x, y] => SimBox::new(Vector3::new(x, y, 1.0), Dimensions::Two),
            &[x, y, z] => SimBox::new(Vector3::new(x, y, z), Dimensions::Three),
            _ => {
                return Err(CliError::Config(format!(
                    "`box.lengths` must have 2 or 3 entries, got {}.",
                    lengths.len()
                )));
            }
        }
        .map_err(|e| CliError::Config(e.to_string()))?;

        let seed = overrides
            .seed
            .or(integrator.seed)
            .ok_or_else(|| CliError::Config("`integrator.seed` is required.".to_string()))?;

        let mut builder = core_config::IntegratorConfigBuilder::new().seed(seed);
        if let Some(policy) = integrator.rebuild {
            builder = builder.rebuild(policy);
        }
        if let Some(backend) = overrides.backend.or(integrator.backend) {
            builder = builder.backend(backend);
        }
        let integrator_config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        if self.types.is_empty() {
            return Err(CliError::Config(
                "At least one `[types.<name>]` section is required.".to_string(),
            ));
        }
        let types = self
            .types
            .into_iter()
            .map(|(name, partial)| {
                let config = TypeConfig {
                    shape: partial.shape,
                    d: partial.d,
                    a: partial.a,
                    fugacity: partial.fugacity.unwrap_or(0.0),
                    ignore_statistics: partial.ignore_statistics.unwrap_or(false),
                };
                (name, config)
            })
            .collect::<BTreeMap<_, _>>();

        let check_name = |name: &str, section: &str| -> Result<()> {
            if types.contains_key(name) {
                Ok(())
            } else {
                Err(CliError::Config(format!(
                    "`{}` refers to undeclared type '{}'.",
                    section, name
                )))
            }
        };

        // Entries may name types that are not declared; the integrator skips those.
        let overlap_checks = self
            .overlap_checks
            .into_iter()
            .map(|p| OverlapCheck {
                a: p.a,
                b: p.b,
                enable: p.enable,
            })
            .collect();

        let init = match self.init {
            Some(p) => {
                for name in &p.types {
                    check_name(name, "init.types")?;
                }
                Some(InitConfig {
                    count: p.count,
                    types: p.types,
                })
            }
            None => None,
        };

        Ok(RunConfig {
            sim_box,
            integrator: integrator_config,
            sweeps: overrides
                .sweeps
                .or(integrator.sweeps)
                .unwrap_or(DEFAULT_SWEEPS),
            move_ratio: integrator.move_ratio,
            nselect: integrator.nselect,
            quermass: integrator.quermass.unwrap_or(false),
            sweep_radius: integrator.sweep_radius.unwrap_or(0.0),
            types,
            overlap_checks,
            init,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            if let Some(rest) = key.strip_prefix("types.") {
                let Some((name, field)) = rest.rsplit_once('.') else {
                    return Err(CliError::Config(format!(
                        "Invalid type key for --set: '{}'. Expected types.<name>.<field>.",
                        key
                    )));
                };
                let entry = self.types.entry(name.to_string()).or_default();
                match field {
                    "d" => entry.d = Some(parse_value(key, value_str)?),
                    "a" => entry.a = Some(parse_value(key, value_str)?),
                    "fugacity" => entry.fugacity = Some(parse_value(key, value_str)?),
                    "ignore-statistics" => {
                        entry.ignore_statistics = Some(parse_value(key, value_str)?)
                    }
                    _ => {
                        return Err(CliError::Config(format!(
                            "Unsupported configuration key for --set: '{}'",
                            key
                        )));
                    }
                }
                continue;
            }

            let integrator = self.integrator.get_or_insert_with(Default::default);
            match key {
                "integrator.seed" => integrator.seed = Some(parse_value(key, value_str)?),
                "integrator.sweeps" => integrator.sweeps = Some(parse_value(key, value_str)?),
                "integrator.move-ratio" => {
                    integrator.move_ratio = Some(parse_value(key, value_str)?)
                }
                "integrator.nselect" => integrator.nselect = Some(parse_value(key, value_str)?),
                "integrator.quermass" => integrator.quermass = Some(parse_value(key, value_str)?),
                "integrator.sweep-radius" => {
                    integrator.sweep_radius = Some(parse_value(key, value_str)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
[box]
lengths = [12.0, 12.0, 12.0]

[integrator]
seed = 7
sweeps = 50
nselect = 2
rebuild = { build-margin = 0.25 }
backend = "serial"

[types.A]
shape = { type = "sphere", diameter = 1.0 }
d = 0.2

[types.B]
shape = { type = "convex_polyhedron", vertices = [[0.5, 0.5, 0.5], [-0.5, 0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, -0.5]] }
a = 0.1

[[overlap-checks]]
a = "A"
b = "B"
enable = false

[init]
count = 64
types = ["A", "B"]
"#;

    #[test]
    fn full_config_merges_with_defaults() {
        let config = PartialRunConfig::from_toml(BASIC)
            .unwrap()
            .merge_with_cli(&CliOverrides::default())
            .unwrap();

        assert!(!config.sim_box.is_2d());
        assert_eq!(config.integrator.seed, 7);
        assert_eq!(config.integrator.backend, BackendKind::Serial);
        assert_eq!(config.integrator.rebuild, RebuildPolicy::BuildMargin(0.25));
        assert_eq!(config.sweeps, 50);
        assert_eq!(config.nselect, Some(2));
        assert_eq!(config.move_ratio, None);
        assert!(!config.quermass);
        assert_eq!(
            config.types.keys().cloned().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string()]
        );
        assert_eq!(config.types["A"].d, Some(0.2));
        assert_eq!(config.types["B"].a, Some(0.1));
        assert_eq!(config.types["B"].fugacity, 0.0);
        assert_eq!(
            config.overlap_checks,
            vec![OverlapCheck {
                a: "A".to_string(),
                b: "B".to_string(),
                enable: false,
            }]
        );
        assert_eq!(config.init.as_ref().map(|i| i.count), Some(64));
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let overrides = CliOverrides {
            sweeps: Some(5),
            seed: Some(99),
            backend: Some(BackendKind::Threaded),
            set_values: vec![
                "types.A.d=0.05".to_string(),
                "types.A.fugacity=1.5".to_string(),
                "integrator.quermass=true".to_string(),
                "integrator.sweep-radius=0.3".to_string(),
            ],
        };
        let config = PartialRunConfig::from_toml(BASIC)
            .unwrap()
            .merge_with_cli(&overrides)
            .unwrap();

        assert_eq!(config.sweeps, 5);
        assert_eq!(config.integrator.seed, 99);
        assert_eq!(config.integrator.backend, BackendKind::Threaded);
        assert_eq!(config.types["A"].d, Some(0.05));
        assert_eq!(config.types["A"].fugacity, 1.5);
        assert!(config.quermass);
        assert_eq!(config.sweep_radius, 0.3);
    }

    #[test]
    fn two_entry_lengths_make_a_planar_box() {
        let toml = r#"
[box]
lengths = [8.0, 6.0]
[integrator]
seed = 1
[types.S]
shape = { type = "convex_polygon", vertices = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]] }
"#;
        let config = PartialRunConfig::from_toml(toml)
            .unwrap()
            .merge_with_cli(&CliOverrides::default())
            .unwrap();
        assert!(config.sim_box.is_2d());
        assert_eq!(config.sim_box.lengths().x, 8.0);
        assert_eq!(config.sweeps, DEFAULT_SWEEPS);
    }

    #[test]
    fn missing_seed_is_reported() {
        let toml = "[box]\nlengths = [5.0, 5.0, 5.0]\n[types.A]\nd = 0.1\n";
        let err = PartialRunConfig::from_toml(toml)
            .unwrap()
            .merge_with_cli(&CliOverrides::default())
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("integrator.seed")));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let toml = "[box]\nlengths = [5.0, 5.0, 5.0]\nangles = [90.0]\n";
        assert!(matches!(
            PartialRunConfig::from_toml(toml),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn init_with_undeclared_type_fails() {
        let toml = r#"
[box]
lengths = [5.0, 5.0, 5.0]
[integrator]
seed = 3
[types.A]
d = 0.1
[init]
count = 8
types = ["A", "Z"]
"#;
        let err = PartialRunConfig::from_toml(toml)
            .unwrap()
            .merge_with_cli(&CliOverrides::default())
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("'Z'")));
    }

    #[test]
    fn bad_set_values_are_rejected() {
        let mut partial = PartialRunConfig::from_toml(BASIC).unwrap();
        assert!(partial.apply_set_values(&["integrator.seed".to_string()]).is_err());
        assert!(partial.apply_set_values(&["integrator.colour=red".to_string()]).is_err());
        assert!(partial.apply_set_values(&["types.A.d=fast".to_string()]).is_err());
        assert!(partial.apply_set_values(&["types.A.size=1".to_string()]).is_err());
    }
}
