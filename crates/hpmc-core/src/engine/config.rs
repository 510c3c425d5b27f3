use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// When the cell list is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RebuildPolicy {
    /// Rebuild before the first pass of every sweep, and whenever accumulated motion demands it.
    #[default]
    EverySweep,
    /// Size cells with this extra margin and rebuild only once accumulated displacement has
    /// used it up.
    BuildMargin(f64),
}

impl RebuildPolicy {
    pub fn margin(&self) -> f64 {
        match self {
            RebuildPolicy::EverySweep => 0.0,
            RebuildPolicy::BuildMargin(margin) => *margin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    Serial,
    Threaded,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "parallel") {
            BackendKind::Threaded
        } else {
            BackendKind::Serial
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegratorConfig {
    pub seed: u64,
    pub rebuild: RebuildPolicy,
    pub backend: BackendKind,
}

#[derive(Default)]
pub struct IntegratorConfigBuilder {
    seed: Option<u64>,
    rebuild: Option<RebuildPolicy>,
    backend: Option<BackendKind>,
}

impl IntegratorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn rebuild(mut self, policy: RebuildPolicy) -> Self {
        self.rebuild = Some(policy);
        self
    }
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> Result<IntegratorConfig, ConfigError> {
        let rebuild = self.rebuild.unwrap_or_default();
        if let RebuildPolicy::BuildMargin(margin) = rebuild {
            if !(margin.is_finite() && margin >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: "rebuild",
                    reason: format!("build margin must be finite and non-negative, got {margin}"),
                });
            }
        }
        Ok(IntegratorConfig {
            seed: self.seed.ok_or(ConfigError::MissingParameter("seed"))?,
            rebuild,
            backend: self.backend.unwrap_or_default(),
        })
    }
}
