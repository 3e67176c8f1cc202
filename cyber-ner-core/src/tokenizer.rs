//! # Segmentação em Palavras
//!
//! Os modelos de classificação trabalham com sub-palavras, mas o usuário quer
//! entidades no nível de "palavra": um CVE, um hash, um caminho de arquivo.
//! Este módulo recorta o texto em palavras usando um alfabeto fixo.
//!
//! ## Alfabeto de token
//!
//! Letras e dígitos ASCII mais `- _ . : /`. Assim identificadores como
//! `CVE-2023-12345`, `/etc/passwd` ou `mimikatz.exe` ficam inteiros, enquanto
//! espaços e pontuação de prosa (`,`, `;`, `(`, aspas) separam palavras.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use cyber_ner_core::tokenizer::segment_words;
//!
//! let words = segment_words("APT28 exploited CVE-2023-12345, again.");
//! let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
//! assert_eq!(texts, ["APT28", "exploited", "CVE-2023-12345", "again."]);
//! ```

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Uma palavra candidata a entidade dentro de um segmento.
///
/// Criada uma única vez pelo segmentador; depois disso só `labels` muda,
/// acumulando os rótulos dos sub-tokens que caem dentro dela.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Word {
    /// Texto literal da palavra.
    pub text: String,
    /// Posição de byte relativa ao segmento.
    pub span: Span,
    /// Rótulos coletados, na ordem de chegada.
    pub labels: Vec<String>,
}

impl Word {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
            labels: Vec::new(),
        }
    }
}

/// Caracteres que podem compor uma palavra de token.
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '/')
}

/// Divide o texto em palavras disjuntas e ordenadas.
///
/// Cada sequência máxima de [`is_token_char`] vira uma [`Word`] com rótulos vazios;
/// qualquer outro caractere apenas avança a leitura. Texto só com espaços ou
/// pontuação produz uma lista vazia.
pub fn segment_words(text: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current_start: Option<usize> = None;

    for (byte_pos, ch) in text.char_indices() {
        if is_token_char(ch) {
            if current_start.is_none() {
                current_start = Some(byte_pos);
            }
        } else if let Some(start) = current_start.take() {
            push_word(&mut words, text, start, byte_pos);
        }
    }

    if let Some(start) = current_start {
        push_word(&mut words, text, start, text.len());
    }

    words
}

/// Fecha a palavra acumulada e adiciona à lista
fn push_word(words: &mut Vec<Word>, text: &str, start: usize, end: usize) {
    words.push(Word::new(&text[start..end], Span::new(start, end)));
}
