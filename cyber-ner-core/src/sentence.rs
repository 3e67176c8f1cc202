//! # Divisão em Sentenças
//!
//! Primeiro nível de fatiamento do documento: limita o tamanho de cada chamada
//! ao classificador e cria fronteiras naturais para a deduplicação.
//!
//! A heurística corta depois de `.`, `!` ou `?` seguidos de espaço. Abreviações,
//! números decimais e URLs com ponto podem gerar cortes errados; a deduplicação
//! do montador de documento absorve esses artefatos.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Um segmento do documento com sua posição de origem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Texto aparado (sem espaços nas bordas).
    pub text: String,
    /// Offset de byte no documento original.
    pub offset: usize,
}

fn boundary_regex() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence boundary regex"))
}

/// Divide o documento em sentenças com seus offsets.
///
/// Retorna lista vazia quando nenhuma fronteira é encontrada (inclusive para
/// texto vazio). Nesse caso o chamador deve usar [`whole_document`].
///
/// O offset de cada pedaço é encontrado por busca a partir do fim do pedaço
/// anterior, para que um trecho repetido mais cedo no texto não seja escolhido.
pub fn split_sentences(document: &str) -> Vec<Sentence> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in boundary_regex().find_iter(document) {
        // corta logo depois da pontuação (sempre ASCII, 1 byte)
        pieces.push(&document[last..m.start() + 1]);
        last = m.end();
    }
    if pieces.is_empty() {
        return Vec::new();
    }
    pieces.push(&document[last..]);

    let mut sentences = Vec::with_capacity(pieces.len());
    let mut cursor = 0;
    for piece in pieces {
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(found) = document[cursor..].find(trimmed) {
            let offset = cursor + found;
            sentences.push(Sentence {
                text: trimmed.to_string(),
                offset,
            });
            cursor = offset + trimmed.len();
        }
    }
    sentences
}

/// Fallback para documentos sem fronteira de sentença: o documento aparado
/// vira um único segmento. O offset aponta para o primeiro caractere não-branco
/// (0 quando não há espaço à esquerda). Retorna `None` para texto em branco.
pub fn whole_document(document: &str) -> Option<Sentence> {
    let trimmed = document.trim();
    if trimmed.is_empty() {
        return None;
    }
    let offset = document.len() - document.trim_start().len();
    Some(Sentence {
        text: trimmed.to_string(),
        offset,
    })
}

/// Sentenças do documento, já aplicando o fallback de segmento único.
pub fn segment_document(document: &str) -> Vec<Sentence> {
    let sentences = split_sentences(document);
    if !sentences.is_empty() {
        return sentences;
    }
    whole_document(document).into_iter().collect()
}
