//! # Rótulos de Sub-palavras → Entidades de Palavra
//!
//! O classificador rotula sub-palavras no esquema **IOB**:
//!
//! - `B-TIPO`: início de uma entidade
//! - `I-TIPO`: continuação
//! - `O`: fora de entidade (rótulo de fundo)
//!
//! Este módulo faz os dois passos que transformam esses rótulos em entidades
//! de palavra inteira:
//!
//! 1. [`assign_labels`]: cada sub-palavra entrega seu rótulo à palavra que contém
//!    o ponto médio do seu intervalo.
//! 2. [`aggregate`]: cada palavra escolhe o tipo mais votado entre os rótulos
//!    que não são de fundo, sem o prefixo IOB.
//!
//! ## Exemplo
//!
//! `"CVE-2023-12345"` tokenizado como `cve`, `-`, `2023`, `-`, `123`, `45`
//! com rótulos `[B-VULNERABILITY, I-VULNERABILITY, I-VULNERABILITY, O, O, O]`
//! resulta em uma única entidade `VULNERABILITY` cobrindo a palavra toda.

use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::tokenizer::Word;

/// Entidade no nível de palavra, ainda no referencial do segmento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntity {
    pub word: String,
    pub entity_type: String,
    pub span: Span,
}

/// Remove o prefixo IOB (`B-` ou `I-`) de um rótulo.
///
/// `"B-MALWARE"` → `"MALWARE"`; rótulos sem prefixo voltam inalterados.
pub fn strip_iob_prefix(label: &str) -> &str {
    label
        .strip_prefix("B-")
        .or_else(|| label.strip_prefix("I-"))
        .unwrap_or(label)
}

/// Entrega o rótulo de cada sub-palavra à palavra correspondente.
///
/// - A primeira e a última posição são marcadores estruturais e são sempre ignoradas.
/// - Sub-palavras com intervalo vazio ou invertido (`start >= end`) são ignoradas.
/// - A palavra escolhida é a primeira, na ordem da lista, cujo intervalo contém
///   o ponto médio da sub-palavra; pontos médios em espaços entre palavras são descartados.
pub fn assign_labels<L: AsRef<str>>(words: &mut [Word], offsets: &[(usize, usize)], labels: &[L]) {
    let n = offsets.len().min(labels.len());
    if n < 2 {
        return;
    }
    for idx in 1..n - 1 {
        let (start, end) = offsets[idx];
        if end <= start {
            continue;
        }
        let mid = Span::new(start, end).midpoint();
        if let Some(word) = words.iter_mut().find(|w| w.span.contains(mid)) {
            word.labels.push(labels[idx].as_ref().to_string());
        }
    }
}

/// Tipo dominante entre os rótulos de uma palavra.
///
/// Descarta o rótulo de fundo, tira o prefixo IOB e conta as ocorrências.
/// Em caso de empate vence o tipo que apareceu primeiro.
pub fn dominant_type<'a>(labels: &'a [String], background: &str) -> Option<&'a str> {
    // (tipo, contagem) na ordem da primeira aparição
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for label in labels.iter().filter(|l| l.as_str() != background) {
        let entity_type = strip_iob_prefix(label);
        match counts.iter_mut().find(|(t, _)| *t == entity_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((entity_type, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (entity_type, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((entity_type, count));
        }
    }
    best.map(|(entity_type, _)| entity_type)
}

/// Converte as palavras rotuladas em entidades.
///
/// Palavras sem rótulos, ou só com rótulo de fundo, não geram entidade.
pub fn aggregate(words: &[Word], background: &str) -> Vec<WordEntity> {
    words
        .iter()
        .filter_map(|word| {
            let entity_type = dominant_type(&word.labels, background)?;
            Some(WordEntity {
                word: word.text.clone(),
                entity_type: entity_type.to_string(),
                span: word.span,
            })
        })
        .collect()
}
