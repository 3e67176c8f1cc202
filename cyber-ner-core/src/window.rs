//! # Janela Deslizante sobre Tokens
//!
//! O classificador aceita no máximo `max_len` tokens de conteúdo por chamada
//! (mais os dois marcadores estruturais). Truncar descartaria entidades no fim
//! de textos longos, então segmentos maiores são divididos em janelas
//! sobrepostas:
//!
//! ```text
//! conteúdo:  t0 t1 t2 t3 t4 t5 t6 t7 t8 t9      (max_len = 4, stride = 3)
//! janela 0:  t0 t1 t2 t3
//! janela 1:           t3 t4 t5 t6
//! janela 2:                    t6 t7 t8 t9
//! ```
//!
//! Cada janela recebe uma cópia dos marcadores `[CLS]`/`[SEP]` do segmento, é
//! classificada sozinha e entrega seus rótulos ao mesmo acumulador de palavras.
//! Uma palavra cortada pela fronteira de janela recebe votos de todas as
//! janelas onde aparece, e a votação por maioria resolve a discordância.

use std::ops::Range;

use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{NerError, Result};
use crate::model::{Encoding, NerModel};
use crate::tagger::assign_labels;
use crate::tokenizer::Word;

/// Intervalos (em índices de conteúdo) de cada janela.
///
/// Janelas de tamanho `max_len` avançando `stride`; a última termina
/// exatamente em `content_len`. Todo índice `0..content_len` aparece em pelo
/// menos uma janela. Retorna [`NerError::Config`] se não valer `0 < stride < max_len`.
pub fn plan_windows(content_len: usize, max_len: usize, stride: usize) -> Result<Vec<Range<usize>>> {
    if stride == 0 || stride >= max_len {
        return Err(NerError::Config(format!(
            "window needs 0 < stride < max_len, got stride {} and max_len {}",
            stride, max_len
        )));
    }
    let mut windows = Vec::new();
    if content_len == 0 {
        return Ok(windows);
    }
    let mut start = 0;
    loop {
        let end = (start + max_len).min(content_len);
        windows.push(start..end);
        if end == content_len {
            break;
        }
        start += stride;
    }
    Ok(windows)
}

/// Monta a codificação de uma janela: marcador inicial + fatia de conteúdo + marcador final.
pub fn frame_window(encoding: &Encoding, window: Range<usize>) -> Encoding {
    let last = encoding.len() - 1;
    // conteúdo começa no índice 1 da codificação completa
    let content = (window.start + 1)..(window.end + 1);

    let mut ids = Vec::with_capacity(window.len() + 2);
    ids.push(encoding.ids[0]);
    ids.extend_from_slice(&encoding.ids[content.clone()]);
    ids.push(encoding.ids[last]);

    let mut offsets = Vec::with_capacity(window.len() + 2);
    offsets.push((0, 0));
    offsets.extend_from_slice(&encoding.offsets[content]);
    offsets.push((0, 0));

    let attention_mask = vec![1; ids.len()];
    Encoding {
        ids,
        offsets,
        attention_mask,
    }
}

/// Classifica um segmento longo janela por janela, acumulando os rótulos em `words`.
///
/// `should_stop` é consultado antes de cada janela; se retornar `true` a
/// classificação para com [`NerError::Cancelled`]. Retorna o número de janelas usadas.
pub fn classify_windowed(
    model: &NerModel,
    encoding: &Encoding,
    words: &mut [Word],
    config: &PipelineConfig,
    should_stop: &dyn Fn() -> bool,
) -> Result<usize> {
    let content_len = encoding.len().saturating_sub(2);
    let windows = plan_windows(content_len, config.max_len, config.stride)?;
    debug!(
        content_tokens = content_len,
        windows = windows.len(),
        "segment exceeds window, classifying with sliding window"
    );

    for window in &windows {
        if should_stop() {
            return Err(NerError::Cancelled);
        }
        let framed = frame_window(encoding, window.clone());
        let labels = model.predict_labels(&framed)?;
        assign_labels(words, &framed.offsets, &labels);
    }
    Ok(windows.len())
}
