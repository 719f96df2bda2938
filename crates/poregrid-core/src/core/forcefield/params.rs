use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Lennard-Jones parameters: well depth `epsilon` (K) and size `sigma` (Å).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LjParam {
    pub epsilon: f64,
    pub sigma: f64,
}

impl LjParam {
    pub fn new(epsilon: f64, sigma: f64) -> Self {
        Self { epsilon, sigma }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MixingRule {
    /// Geometric mean of well depths, arithmetic mean of sizes.
    #[default]
    LorentzBerthelot,
    /// Geometric mean of both well depths and sizes.
    Geometric,
}

impl MixingRule {
    pub fn combine(&self, first: &LjParam, second: &LjParam) -> LjParam {
        let epsilon = (first.epsilon * second.epsilon).sqrt();
        let sigma = match self {
            MixingRule::LorentzBerthelot => 0.5 * (first.sigma + second.sigma),
            MixingRule::Geometric => (first.sigma * second.sigma).sqrt(),
        };
        LjParam { epsilon, sigma }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct GlobalParams {
    pub cutoff: f64,
    #[serde(default)]
    pub mixing_rule: MixingRule,
}

/// Pairwise Lennard-Jones forcefield for adsorbate/framework interactions.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Forcefield {
    pub globals: GlobalParams,
    /// Per framework atom type parameters.
    pub framework: HashMap<String, LjParam>,
    /// Per adsorbate parameters.
    #[serde(default)]
    pub adsorbates: HashMap<String, LjParam>,
    /// Explicit cross terms keyed by adsorbate, then framework atom type.
    #[serde(default)]
    pub pairs: HashMap<String, HashMap<String, LjParam>>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid forcefield parameter '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

impl Forcefield {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let forcefield: Self = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        forcefield.validate()?;
        Ok(forcefield)
    }

    #[inline]
    pub fn cutoff(&self) -> f64 {
        self.globals.cutoff
    }

    #[inline]
    pub fn mixing_rule(&self) -> MixingRule {
        self.globals.mixing_rule
    }

    pub fn has_adsorbate(&self, adsorbate: &str) -> bool {
        self.adsorbates.contains_key(adsorbate) || self.pairs.contains_key(adsorbate)
    }

    /// Cross-interaction parameters between `adsorbate` and a framework atom
    /// of type `atom_type`.
    ///
    /// An explicit `[pairs.<adsorbate>]` entry takes precedence; otherwise the
    /// adsorbate and atom type parameters are combined with the mixing rule.
    pub fn cross_parameters(&self, adsorbate: &str, atom_type: &str) -> Option<LjParam> {
        if let Some(param) = self
            .pairs
            .get(adsorbate)
            .and_then(|pairs| pairs.get(atom_type))
        {
            return Some(*param);
        }
        let probe = self.adsorbates.get(adsorbate)?;
        let host = self.framework.get(atom_type)?;
        Some(self.globals.mixing_rule.combine(probe, host))
    }

    fn validate(&self) -> Result<(), ParamLoadError> {
        if !(self.globals.cutoff.is_finite() && self.globals.cutoff > 0.0) {
            return Err(ParamLoadError::Invalid {
                key: "globals.cutoff".to_string(),
                reason: format!("must be positive, got {}", self.globals.cutoff),
            });
        }

        let sections = [("framework", &self.framework), ("adsorbates", &self.adsorbates)];
        let tables = sections
            .into_iter()
            .flat_map(|(section, table)| {
                table
                    .iter()
                    .map(move |(k, v)| (format!("{section}.{k}"), v))
            })
            .chain(self.pairs.iter().flat_map(|(adsorbate, table)| {
                table
                    .iter()
                    .map(move |(k, v)| (format!("pairs.{adsorbate}.{k}"), v))
            }));

        for (key, param) in tables {
            if !(param.epsilon.is_finite() && param.epsilon >= 0.0) {
                return Err(ParamLoadError::Invalid {
                    key,
                    reason: format!("epsilon must be non-negative, got {}", param.epsilon),
                });
            }
            if !(param.sigma.is_finite() && param.sigma > 0.0) {
                return Err(ParamLoadError::Invalid {
                    key,
                    reason: format!("sigma must be positive, got {}", param.sigma),
                });
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Forcefield {
    type Err = ParamLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let forcefield: Self = toml::from_str(s).map_err(|e| ParamLoadError::Toml {
            path: "<string>".to_string(),
            source: e,
        })?;
        forcefield.validate()?;
        Ok(forcefield)
    }
}
