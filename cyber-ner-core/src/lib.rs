//! # cyber-ner-core: Reconhecimento de Entidades em Textos de Cibersegurança
//!
//! Este crate encontra entidades de cibersegurança (grupos APT, malware,
//! ferramentas, vulnerabilidades, indicadores...) em documentos de tamanho
//! arbitrário, usando um classificador de tokens externo plugável.
//!
//! ## Arquitetura do Sistema
//!
//! O documento passa por um pipeline linear:
//!
//! 1.  **Sentenças** ([`sentence`]): divisão em `.`, `!` ou `?` seguidos de espaço.
//! 2.  **Palavras** ([`tokenizer`]): sequências de caracteres de token (`A-Z a-z 0-9 - _ . : /`).
//! 3.  **Classificação** ([`model`]): tokenizador de sub-palavras + classificador de tokens,
//!     com janela deslizante ([`window`]) para segmentos longos.
//! 4.  **Agregação** ([`tagger`]): voto por maioria dos rótulos de cada palavra.
//! 5.  **Saída** ([`pipeline`]): entidades por sentença e combinadas, com posições globais.
//!
//! O modelo padrão é o léxico de [`rule_based`] (gazetteers + regex), que
//! implementa as mesmas interfaces que um modelo transformer.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use cyber_ner_core::NerPipeline;
//!
//! let pipeline = NerPipeline::builtin().unwrap();
//! let analysis = pipeline
//!     .analyze("APT28 exploited CVE-2023-12345 in a phishing campaign.")
//!     .unwrap();
//!
//! for entity in &analysis.entities {
//!     println!("{} ({}) [{}..{}]", entity.word, entity.entity_type, entity.start, entity.end);
//! }
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: montagem do documento, cancelamento e eventos.
//! - [`eval`]: métricas de entidade (IOB2 estrito) para comparar modelos.
//! - [`config`]: parâmetros da janela deslizante.

pub mod config;
pub mod error;
pub mod eval;
pub mod model;
pub mod offset;
pub mod pipeline;
pub mod rule_based;
pub mod sentence;
pub mod span;
pub mod tagger;
pub mod tokenizer;
pub mod window;

pub use config::PipelineConfig;
pub use error::{NerError, Result};
pub use eval::{evaluate, EvaluationReport};
pub use model::{Encoding, NerModel, TokenClassifier, Tokenizer};
pub use pipeline::{Analysis, CancelToken, Entity, NerPipeline, PipelineEvent, SentenceEntities};
pub use rule_based::{build_lexicon_model, Lexicon};
pub use span::Span;
pub use tagger::WordEntity;
pub use tokenizer::Word;
