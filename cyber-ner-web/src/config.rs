//! Configuração do servidor: arquivo TOML opcional + variáveis de ambiente.
//!
//! ```toml
//! bind = "127.0.0.1:5001"
//! lexicon_path = "lexicon/extra.json"
//!
//! [pipeline]
//! max_len = 510
//! stride = 384
//! ```

use std::path::PathBuf;

use cyber_ner_core::{NerError, PipelineConfig, Result};
use serde::{Deserialize, Serialize};

/// Caminho do arquivo TOML de configuração.
pub const CONFIG_ENV: &str = "CYBER_NER_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Endereço de escuta.
    pub bind: String,
    /// Léxico extra (JSON) somado ao embutido.
    pub lexicon_path: Option<PathBuf>,
    pub pipeline: PipelineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5001".to_string(),
            lexicon_path: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| NerError::Config(format!("failed to parse server config: {}", e)))
    }

    /// Carrega a configuração do processo: arquivo de `CYBER_NER_CONFIG` (se houver)
    /// e depois as variáveis `CYBER_NER_*`.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                let content = std::fs::read_to_string(&path)?;
                Self::from_toml_str(&content)?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Aplica sobrescritas lidas por `lookup` (normalmente o ambiente).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("CYBER_NER_BIND") {
            self.bind = bind;
        }
        if let Some(path) = lookup("CYBER_NER_LEXICON") {
            self.lexicon_path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("CYBER_NER_MAX_LEN") {
            self.pipeline.max_len = parse_usize("CYBER_NER_MAX_LEN", &value)?;
        }
        if let Some(value) = lookup("CYBER_NER_STRIDE") {
            self.pipeline.stride = parse_usize("CYBER_NER_STRIDE", &value)?;
        }
        Ok(())
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| NerError::Config(format!("{} must be a positive integer, got {:?}", key, value)))
}
