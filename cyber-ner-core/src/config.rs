//! # Configuração do Pipeline
//!
//! Parâmetros imutáveis construídos na inicialização e passados por referência
//! ao [`NerPipeline`](crate::pipeline::NerPipeline). Podem vir de um arquivo TOML:
//!
//! ```toml
//! max_len = 510
//! stride = 384
//! background_label = "O"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{NerError, Result};

/// Limites da janela do classificador e rótulo de fundo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Número máximo de tokens de conteúdo por chamada ao classificador
    /// (sem contar os dois marcadores estruturais).
    pub max_len: usize,
    /// Avanço entre janelas consecutivas. Deve ser menor que `max_len`,
    /// e a sobreposição resultante é `max_len - stride`.
    pub stride: usize,
    /// Rótulo "sem entidade" excluído da votação.
    pub background_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_len: 510,
            stride: 384,
            background_label: "O".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Valida os invariantes da janela deslizante.
    pub fn validate(&self) -> Result<()> {
        if self.max_len == 0 {
            return Err(NerError::Config("max_len must be greater than 0".into()));
        }
        if self.stride == 0 {
            return Err(NerError::Config("stride must be greater than 0".into()));
        }
        if self.stride >= self.max_len {
            return Err(NerError::Config(format!(
                "stride ({}) must be smaller than max_len ({})",
                self.stride, self.max_len
            )));
        }
        if self.background_label.is_empty() {
            return Err(NerError::Config("background_label must not be empty".into()));
        }
        Ok(())
    }

    /// Lê a configuração de um texto TOML (campos ausentes usam o padrão).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| NerError::Config(format!("failed to parse pipeline config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_stride_must_be_smaller_than_window() {
        let config = PipelineConfig {
            max_len: 8,
            stride: 8,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(NerError::Config(_))));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = PipelineConfig::from_toml_str("max_len = 64\nstride = 48\n").unwrap();
        assert_eq!(config.max_len, 64);
        assert_eq!(config.stride, 48);
        assert_eq!(config.background_label, "O");
    }

    #[test]
    fn test_from_toml_rejects_zero_window() {
        assert!(PipelineConfig::from_toml_str("max_len = 0").is_err());
    }
}
