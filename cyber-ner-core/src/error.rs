//! # Erros do Pipeline
//!
//! Todos os estágios do pipeline retornam [`Result`]. Falhas do tokenizador ou do
//! classificador externos sobem inteiras até o chamador: o núcleo não tenta
//! recuperar nem devolve resultados parciais.

use thiserror::Error;

/// Resultado padrão das operações do crate.
pub type Result<T> = std::result::Result<T, NerError>;

/// Tipos de erro do reconhecimento de entidades.
#[derive(Error, Debug)]
pub enum NerError {
    /// Nenhum texto foi enviado. Cabe ao chamador rejeitar antes de invocar o núcleo.
    #[error("No text provided")]
    EmptyInput,

    /// Tokenizador/classificador não foram carregados.
    #[error("NER model not loaded")]
    ModelUnavailable,

    /// O tokenizador ou o classificador falharam durante uma chamada.
    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    /// A requisição foi abandonada entre sentenças ou janelas.
    #[error("Analysis cancelled")]
    Cancelled,

    /// Configuração inválida (ex: `stride >= max_len`).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Léxico inválido (termo vazio, regex que não compila...).
    #[error("Invalid lexicon: {0}")]
    Lexicon(String),

    /// Sequências de referência e predição não se alinham.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NerError {
    /// Atalho para construir uma falha de inferência.
    pub fn inference(msg: impl Into<String>) -> Self {
        NerError::InferenceFailure(msg.into())
    }
}
