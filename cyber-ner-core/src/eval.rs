//! # Avaliação no Nível de Entidade
//!
//! Acurácia por token engana em NER: quase todo token é `O`, então um modelo
//! que nunca encontra nada ainda acerta 90%+. Aqui as métricas contam
//! **entidades inteiras** extraídas no esquema IOB2 estrito:
//!
//! - uma entidade começa obrigatoriamente em `B-TIPO`;
//! - continua enquanto vierem `I-TIPO` do mesmo tipo;
//! - `I-TIPO` sem `B-` correspondente não forma entidade.
//!
//! Uma predição só conta como acerto se tipo, início e fim baterem exatamente
//! com a referência.
//!
//! ## Métricas
//!
//! | Métrica | Fórmula |
//! |---------|---------|
//! | Precisão | acertos / entidades previstas |
//! | Revocação | acertos / entidades de referência |
//! | F1 | 2·P·R / (P + R) |
//!
//! Divisões por zero valem 0. Também é reportada a matriz "O vs entidade" no
//! nível de token, que mostra se o modelo ao menos detecta que há algo ali.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{NerError, Result};

/// Entidade extraída de uma sequência de rótulos: (tipo, início, fim exclusivo).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabeledChunk {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
}

/// Precisão, revocação, F1 e suporte (número de entidades de referência).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl Scores {
    fn from_counts(counts: &ChunkCounts) -> Self {
        let precision = ratio(counts.correct, counts.predicted);
        let recall = ratio(counts.correct, counts.gold);
        Self {
            precision,
            recall,
            f1_score: f1(precision, recall),
            support: counts.gold,
        }
    }
}

/// Contagem de tokens `O` vs entidade (qualquer tipo).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfusionBreakdown {
    pub true_o_tokens: usize,
    pub true_entity_tokens: usize,
    pub true_o_pred_o: usize,
    pub true_o_pred_entity: usize,
    pub true_entity_pred_o: usize,
    pub true_entity_pred_entity: usize,
    pub entity_detection_precision: f64,
    pub entity_detection_recall: f64,
    pub entity_detection_f1: f64,
}

impl ConfusionBreakdown {
    fn merge(mut self, other: Self) -> Self {
        self.true_o_tokens += other.true_o_tokens;
        self.true_entity_tokens += other.true_entity_tokens;
        self.true_o_pred_o += other.true_o_pred_o;
        self.true_o_pred_entity += other.true_o_pred_entity;
        self.true_entity_pred_o += other.true_entity_pred_o;
        self.true_entity_pred_entity += other.true_entity_pred_entity;
        self
    }

    fn finish(mut self) -> Self {
        if self.true_entity_tokens > 0 {
            let precision = ratio(
                self.true_entity_pred_entity,
                self.true_entity_pred_entity + self.true_o_pred_entity,
            );
            let recall = ratio(self.true_entity_pred_entity, self.true_entity_tokens);
            self.entity_detection_precision = precision;
            self.entity_detection_recall = recall;
            self.entity_detection_f1 = f1(precision, recall);
        }
        self
    }
}

/// Relatório completo de uma avaliação.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub sequences: usize,
    pub total_tokens: usize,
    /// Média micro sobre todas as entidades.
    pub overall: Scores,
    /// Por tipo de entidade, em ordem alfabética.
    pub per_label: BTreeMap<String, Scores>,
    /// Média simples das métricas por tipo.
    pub macro_avg: Scores,
    pub confusion: ConfusionBreakdown,
}

#[derive(Debug, Clone, Copy, Default)]
struct ChunkCounts {
    correct: usize,
    predicted: usize,
    gold: usize,
}

/// Contagens parciais de uma sequência, somadas depois.
#[derive(Debug, Default)]
struct Tally {
    per_label: BTreeMap<String, ChunkCounts>,
    confusion: ConfusionBreakdown,
    tokens: usize,
}

impl Tally {
    fn merge(mut self, other: Tally) -> Tally {
        for (label, counts) in other.per_label {
            let entry = self.per_label.entry(label).or_default();
            entry.correct += counts.correct;
            entry.predicted += counts.predicted;
            entry.gold += counts.gold;
        }
        self.confusion = self.confusion.merge(other.confusion);
        self.tokens += other.tokens;
        self
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Extrai entidades de uma sequência IOB2 em modo estrito.
pub fn extract_chunks<S: AsRef<str>>(labels: &[S]) -> Vec<LabeledChunk> {
    let mut chunks = Vec::new();
    let mut current: Option<(&str, usize)> = None;

    for (i, label) in labels.iter().enumerate() {
        let label = label.as_ref();
        if let Some(entity_type) = label.strip_prefix("B-") {
            if let Some((t, start)) = current.take() {
                chunks.push(chunk(t, start, i));
            }
            current = Some((entity_type, i));
        } else if let Some(entity_type) = label.strip_prefix("I-") {
            match current {
                Some((t, _)) if t == entity_type => {}
                _ => {
                    if let Some((t, start)) = current.take() {
                        chunks.push(chunk(t, start, i));
                    }
                }
            }
        } else if let Some((t, start)) = current.take() {
            chunks.push(chunk(t, start, i));
        }
    }
    if let Some((t, start)) = current {
        chunks.push(chunk(t, start, labels.len()));
    }
    chunks
}

fn chunk(entity_type: &str, start: usize, end: usize) -> LabeledChunk {
    LabeledChunk {
        entity_type: entity_type.to_string(),
        start,
        end,
    }
}

fn tally_sequence(gold: &[String], pred: &[String], background: &str) -> Tally {
    let mut tally = Tally {
        tokens: gold.len(),
        ..Default::default()
    };

    let gold_chunks = extract_chunks(gold);
    let pred_chunks = extract_chunks(pred);
    let gold_set: HashSet<&LabeledChunk> = gold_chunks.iter().collect();

    for chunk in &gold_chunks {
        tally.per_label.entry(chunk.entity_type.clone()).or_default().gold += 1;
    }
    for chunk in &pred_chunks {
        let counts = tally.per_label.entry(chunk.entity_type.clone()).or_default();
        counts.predicted += 1;
        if gold_set.contains(chunk) {
            counts.correct += 1;
        }
    }

    let c = &mut tally.confusion;
    for (g, p) in gold.iter().zip(pred) {
        match (g == background, p == background) {
            (true, true) => c.true_o_pred_o += 1,
            (true, false) => c.true_o_pred_entity += 1,
            (false, true) => c.true_entity_pred_o += 1,
            (false, false) => c.true_entity_pred_entity += 1,
        }
    }
    c.true_o_tokens = c.true_o_pred_o + c.true_o_pred_entity;
    c.true_entity_tokens = c.true_entity_pred_o + c.true_entity_pred_entity;
    tally
}

/// Compara rótulos de referência e preditos, sequência a sequência.
///
/// As duas listas devem ter o mesmo número de sequências e cada par o mesmo
/// comprimento; caso contrário retorna [`NerError::Evaluation`].
pub fn evaluate(gold: &[Vec<String>], pred: &[Vec<String>]) -> Result<EvaluationReport> {
    if gold.len() != pred.len() {
        return Err(NerError::Evaluation(format!(
            "{} reference sequences but {} predicted",
            gold.len(),
            pred.len()
        )));
    }
    if let Some(i) = gold.iter().zip(pred).position(|(g, p)| g.len() != p.len()) {
        return Err(NerError::Evaluation(format!(
            "sequence {} has {} reference labels but {} predicted",
            i,
            gold[i].len(),
            pred[i].len()
        )));
    }

    let tally = gold
        .par_iter()
        .zip(pred.par_iter())
        .map(|(g, p)| tally_sequence(g, p, "O"))
        .reduce(Tally::default, Tally::merge);

    let mut total = ChunkCounts::default();
    let mut per_label = BTreeMap::new();
    for (label, counts) in &tally.per_label {
        total.correct += counts.correct;
        total.predicted += counts.predicted;
        total.gold += counts.gold;
        per_label.insert(label.clone(), Scores::from_counts(counts));
    }

    let macro_avg = if per_label.is_empty() {
        Scores::default()
    } else {
        let n = per_label.len() as f64;
        Scores {
            precision: per_label.values().map(|s| s.precision).sum::<f64>() / n,
            recall: per_label.values().map(|s| s.recall).sum::<f64>() / n,
            f1_score: per_label.values().map(|s| s.f1_score).sum::<f64>() / n,
            support: total.gold,
        }
    };

    Ok(EvaluationReport {
        sequences: gold.len(),
        total_tokens: tally.tokens,
        overall: Scores::from_counts(&total),
        per_label,
        macro_avg,
        confusion: tally.confusion.finish(),
    })
}
