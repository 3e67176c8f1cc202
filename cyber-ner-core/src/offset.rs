//! # Conversão de Offsets: Byte → Caractere
//!
//! Internamente tudo é byte (é como `&str` é fatiado e como tokenizadores em
//! Rust reportam posições). A API devolve posições em caracteres, que é o que
//! um cliente conta ao destacar o texto:
//!
//! ```text
//! "café APT29"
//!  bytes:  c=0 a=1 f=2 é=3..5 ' '=5 A=6 ...
//!  chars:  c=0 a=1 f=2 é=3    ' '=4 A=5 ...
//! ```

/// Tabela de conversão de byte para índice de caractere de um documento.
#[derive(Debug, Clone)]
pub struct CharOffsets {
    /// `None` para documentos ASCII (conversão identidade).
    table: Option<Vec<usize>>,
}

impl CharOffsets {
    pub fn new(document: &str) -> Self {
        if document.is_ascii() {
            return Self { table: None };
        }
        // table[b] = número de caracteres antes do byte b
        let mut table = vec![0; document.len() + 1];
        let mut chars = 0;
        let mut iter = document.char_indices().peekable();
        for (byte, slot) in table.iter_mut().enumerate() {
            while let Some(&(pos, _)) = iter.peek() {
                if pos < byte {
                    chars += 1;
                    iter.next();
                } else {
                    break;
                }
            }
            *slot = chars;
        }
        Self { table: Some(table) }
    }

    /// Índice de caractere correspondente ao byte `byte`.
    pub fn to_char(&self, byte: usize) -> usize {
        match &self.table {
            None => byte,
            Some(table) => table[byte.min(table.len() - 1)],
        }
    }
}
