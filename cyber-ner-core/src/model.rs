//! # Modelo NER: Tokenizador e Classificador
//!
//! O pipeline não conhece a rede neural. Ele consome duas capacidades:
//!
//! - **[`Tokenizer`]**: quebra o texto em sub-palavras e devolve ids, máscara de
//!   atenção e o *offset mapping* (posição de cada sub-palavra no texto).
//! - **[`TokenClassifier`]**: prevê um id de rótulo por posição e traduz ids em
//!   rótulos (`"O"`, `"B-MALWARE"`, `"I-TOOL"`...).
//!
//! O [`NerModel`] agrupa as duas. Ele é montado uma vez na inicialização,
//! nunca mais muda, e pode ser compartilhado por quantas threads quiserem.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{NerError, Result};

/// Saída do tokenizador para um texto.
///
/// A primeira e a última posição são os marcadores estruturais
/// (ex: `[CLS]` e `[SEP]`) com offset `(0, 0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub ids: Vec<u32>,
    /// `(início, fim)` em bytes, relativos ao texto tokenizado.
    pub offsets: Vec<(usize, usize)>,
    pub attention_mask: Vec<u32>,
}

impl Encoding {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Confere se os três vetores têm o mesmo tamanho e se há os dois marcadores.
    pub fn check(&self) -> Result<()> {
        if self.offsets.len() != self.ids.len() || self.attention_mask.len() != self.ids.len() {
            return Err(NerError::inference(format!(
                "tokenizer returned {} ids, {} offsets and {} mask entries",
                self.ids.len(),
                self.offsets.len(),
                self.attention_mask.len()
            )));
        }
        if self.ids.len() < 2 {
            return Err(NerError::inference(
                "tokenizer output is missing the structural start/end tokens",
            ));
        }
        Ok(())
    }
}

/// Tokenizador de sub-palavras.
pub trait Tokenizer: Send + Sync {
    /// Tokeniza `text`. Com `max_length = Some(n)` a saída é truncada para no
    /// máximo `n` posições (marcadores incluídos); com `None` nada é descartado.
    fn encode(&self, text: &str, max_length: Option<usize>) -> Result<Encoding>;
}

/// Classificador de tokens (cabeça de token classification).
pub trait TokenClassifier: Send + Sync {
    /// Um id de rótulo previsto para cada posição de `ids`.
    fn classify(&self, ids: &[u32], attention_mask: &[u32]) -> Result<Vec<usize>>;

    /// Rótulo textual de um id (`id2label`).
    fn label_for_id(&self, id: usize) -> Option<&str>;
}

/// Par tokenizador + classificador, imutável após a construção.
#[derive(Clone)]
pub struct NerModel {
    pub tokenizer: Arc<dyn Tokenizer>,
    pub classifier: Arc<dyn TokenClassifier>,
}

impl NerModel {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, classifier: Arc<dyn TokenClassifier>) -> Self {
        Self {
            tokenizer,
            classifier,
        }
    }

    /// Classifica uma codificação já validada e devolve os rótulos textuais.
    ///
    /// Quantidade de previsões diferente da de tokens, ou id de rótulo
    /// desconhecido, viram [`NerError::InferenceFailure`].
    pub fn predict_labels(&self, encoding: &Encoding) -> Result<Vec<String>> {
        let predictions = self
            .classifier
            .classify(&encoding.ids, &encoding.attention_mask)?;
        if predictions.len() != encoding.len() {
            return Err(NerError::inference(format!(
                "classifier returned {} predictions for {} tokens",
                predictions.len(),
                encoding.len()
            )));
        }
        predictions
            .into_iter()
            .map(|id| {
                self.classifier
                    .label_for_id(id)
                    .map(str::to_string)
                    .ok_or_else(|| NerError::inference(format!("unknown label id {}", id)))
            })
            .collect()
    }
}

impl std::fmt::Debug for NerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NerModel").finish_non_exhaustive()
    }
}
