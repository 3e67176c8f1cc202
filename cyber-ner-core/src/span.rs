//! # Intervalos de Texto
//!
//! Um [`Span`] é um intervalo semiaberto `[start, end)` de posições em algum
//! referencial (sentença ou documento). Todo o pipeline trabalha com offsets
//! de byte; a conversão para caracteres acontece só na saída (ver [`crate::offset`]).

use serde::{Deserialize, Serialize};

/// Intervalo contíguo, 0-based e semiaberto.
///
/// # Exemplo
/// Em `"APT28 exploited"`, a palavra `"APT28"` ocupa `Span { start: 0, end: 5 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Posição inicial (inclusiva)
    pub start: usize,
    /// Posição final (exclusiva)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span invertido: {}..{}", start, end);
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Verifica se `pos` cai dentro do intervalo (`start <= pos < end`).
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Ponto médio usado para ligar um sub-token à sua palavra (arredonda para baixo).
    pub fn midpoint(&self) -> usize {
        (self.start + self.end) / 2
    }

    /// Desloca o intervalo para outro referencial (ex: sentença → documento).
    pub fn shift(&self, offset: usize) -> Span {
        Span {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}
