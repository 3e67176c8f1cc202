//! # Pipeline NER: Montagem do Documento
//!
//! O pipeline coordena todos os módulos e transforma um documento de tamanho
//! arbitrário em uma lista de entidades com posições globais:
//!
//! 1. **Sentenças** ([`crate::sentence`]): divide o documento (com fallback de segmento único).
//! 2. **Palavras** ([`crate::tokenizer`]): recorta cada sentença em palavras de token.
//! 3. **Classificação**: tokeniza a sentença e classifica de uma vez, ou por
//!    janelas deslizantes ([`crate::window`]) quando passa de `max_len + 2` tokens.
//! 4. **Agregação** ([`crate::tagger`]): rótulos de sub-palavras → entidades de palavra.
//! 5. **Costura**: soma o offset da sentença e deduplica por `(início, fim)` global.
//!
//! O pipeline não guarda estado entre chamadas: `&NerPipeline` pode ser usado
//! por várias threads ao mesmo tempo. Qualquer falha do tokenizador ou do
//! classificador aborta a requisição inteira.
//!
//! Também emite eventos via canal (`mpsc`) para o servidor WebSocket acompanhar
//! o progresso sentença a sentença.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{NerError, Result};
use crate::model::NerModel;
use crate::offset::CharOffsets;
use crate::rule_based::{build_lexicon_model, Lexicon};
use crate::sentence::{segment_document, Sentence};
use crate::span::Span;
use crate::tagger::{aggregate, assign_labels, WordEntity};
use crate::tokenizer::segment_words;
use crate::window::classify_windowed;

/// Uma entidade final, em posições de caractere do documento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Texto literal da palavra (ex: "CVE-2023-12345")
    pub word: String,
    /// Tipo sem prefixo IOB (ex: "VULNERABILITY")
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
}

/// Entidades encontradas em uma sentença, já em coordenadas do documento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceEntities {
    pub text: String,
    /// Posição de caractere da sentença no documento.
    pub offset: usize,
    pub entities: Vec<Entity>,
}

/// Resultado de [`NerPipeline::analyze`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub text: String,
    pub per_sentence: Vec<SentenceEntities>,
    /// Entidades de todas as sentenças, sem repetir `(start, end)`.
    pub entities: Vec<Entity>,
    pub entity_count: usize,
}

/// Sentença como reportada nos eventos (offset em caracteres).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceInfo {
    pub text: String,
    pub offset: usize,
}

/// Eventos emitidos durante a análise.
///
/// Permitem que a interface acompanhe o documento sendo processado. Toda
/// execução termina com exatamente um `Done` ou um `Error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: documento dividido em sentenças.
    SentencesSplit {
        sentences: Vec<SentenceInfo>,
        total: usize,
    },
    /// **Passo 2 (opcional)**: sentença longa demais, classificada por janelas.
    SentenceWindowed {
        sentence_index: usize,
        token_count: usize,
        windows: usize,
    },
    /// **Passo 3**: entidades de uma sentença (antes da deduplicação global).
    ///
    /// Progresso provisório: se uma sentença seguinte falhar, a execução
    /// termina em `Error` e estas entidades não fazem parte de resultado algum.
    SentenceDone {
        sentence_index: usize,
        entities: Vec<Entity>,
    },
    /// **Conclusão**: resultado final consolidado.
    Done {
        result: Analysis,
        processing_ms: u64,
    },
    /// **Falha**: a requisição foi abortada sem resultado parcial.
    Error { message: String },
}

/// Sinal de cancelamento compartilhável entre threads.
///
/// Consultado entre sentenças e entre janelas. Cancelar não deixa efeito
/// colateral: a análise apenas retorna [`NerError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// O pipeline NER principal.
///
/// Dono do modelo e da configuração, ambos imutáveis. Construído uma vez na
/// inicialização e compartilhado por referência.
#[derive(Debug, Clone)]
pub struct NerPipeline {
    model: NerModel,
    config: PipelineConfig,
}

impl NerPipeline {
    /// Cria o pipeline validando a configuração.
    pub fn new(model: NerModel, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    /// Pipeline com o léxico embutido e a configuração padrão.
    pub fn builtin() -> Result<Self> {
        let model = build_lexicon_model(&Lexicon::builtin())?;
        Self::new(model, PipelineConfig::default())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model(&self) -> &NerModel {
        &self.model
    }

    /// Analisa um documento e retorna entidades por sentença e combinadas.
    ///
    /// Texto vazio (ou só espaços) retorna resultado vazio sem chamar o modelo.
    pub fn analyze(&self, text: &str) -> Result<Analysis> {
        self.run(text, &CancelToken::new(), None)
    }

    /// Igual a [`analyze`](Self::analyze), abandonando o trabalho se `cancel` for acionado.
    pub fn analyze_with_cancel(&self, text: &str, cancel: &CancelToken) -> Result<Analysis> {
        self.run(text, cancel, None)
    }

    /// Executa a análise enviando [`PipelineEvent`]s pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `SentencesSplit`
    /// 2. `SentenceWindowed` (só para sentenças longas) e `SentenceDone`, por sentença
    /// 3. `Done` ou `Error`
    ///
    /// Só o evento final é resultado. Os `SentenceDone` anteriores servem para
    /// a interface mostrar progresso e devem ser descartados se vier `Error`.
    pub fn analyze_streaming(&self, text: &str, cancel: &CancelToken, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();
        let terminal = match self.run(text, cancel, Some(&tx)) {
            Ok(result) => PipelineEvent::Done {
                result,
                processing_ms: start.elapsed().as_millis() as u64,
            },
            Err(err) => PipelineEvent::Error {
                message: err.to_string(),
            },
        };
        let _ = tx.send(terminal);
    }

    /// Analisa vários documentos independentes em paralelo (um resultado por entrada, na mesma ordem).
    pub fn analyze_batch(&self, texts: &[String]) -> Vec<Result<Analysis>> {
        texts.par_iter().map(|text| self.analyze(text)).collect()
    }

    fn run(
        &self,
        text: &str,
        cancel: &CancelToken,
        tx: Option<&mpsc::Sender<PipelineEvent>>,
    ) -> Result<Analysis> {
        let emit = |event: PipelineEvent| {
            if let Some(tx) = tx {
                let _ = tx.send(event);
            }
        };

        let sentences = segment_document(text);
        let chars = CharOffsets::new(text);
        emit(PipelineEvent::SentencesSplit {
            sentences: sentences
                .iter()
                .map(|s| SentenceInfo {
                    text: s.text.clone(),
                    offset: chars.to_char(s.offset),
                })
                .collect(),
            total: sentences.len(),
        });
        debug!(sentences = sentences.len(), chars = text.len(), "document split");

        self.assemble(text, &sentences, &chars, cancel, &emit)
    }

    /// Classifica cada sentença e costura o resultado no referencial do documento.
    ///
    /// `entities` recebe cada `(início, fim)` global uma única vez, mesmo que
    /// duas sentenças reportem a mesma palavra; `per_sentence` mantém todas.
    fn assemble(
        &self,
        text: &str,
        sentences: &[Sentence],
        chars: &CharOffsets,
        cancel: &CancelToken,
        emit: &dyn Fn(PipelineEvent),
    ) -> Result<Analysis> {
        let mut seen: HashSet<Span> = HashSet::new();
        let mut per_sentence = Vec::with_capacity(sentences.len());
        let mut entities = Vec::new();

        for (index, sentence) in sentences.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(NerError::Cancelled);
            }

            let local = self.analyze_sentence(sentence, index, cancel, emit)?;

            let mut sentence_entities = Vec::with_capacity(local.len());
            for word_entity in local {
                let global = word_entity.span.shift(sentence.offset);
                let entity = Entity {
                    word: word_entity.word,
                    entity_type: word_entity.entity_type,
                    start: chars.to_char(global.start),
                    end: chars.to_char(global.end),
                };
                if seen.insert(global) {
                    entities.push(entity.clone());
                }
                sentence_entities.push(entity);
            }

            emit(PipelineEvent::SentenceDone {
                sentence_index: index,
                entities: sentence_entities.clone(),
            });
            per_sentence.push(SentenceEntities {
                text: sentence.text.clone(),
                offset: chars.to_char(sentence.offset),
                entities: sentence_entities,
            });
        }

        let entity_count = entities.len();
        Ok(Analysis {
            text: text.to_string(),
            per_sentence,
            entities,
            entity_count,
        })
    }

    /// Entidades de uma sentença, em posições relativas à sentença.
    fn analyze_sentence(
        &self,
        sentence: &Sentence,
        index: usize,
        cancel: &CancelToken,
        emit: &dyn Fn(PipelineEvent),
    ) -> Result<Vec<WordEntity>> {
        let mut words = segment_words(&sentence.text);
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let encoding = self.model.tokenizer.encode(&sentence.text, None)?;
        encoding.check()?;

        if encoding.len() > self.config.max_len + 2 {
            let windows = classify_windowed(
                &self.model,
                &encoding,
                &mut words,
                &self.config,
                &|| cancel.is_cancelled(),
            )?;
            emit(PipelineEvent::SentenceWindowed {
                sentence_index: index,
                token_count: encoding.len(),
                windows,
            });
        } else {
            let labels = self.model.predict_labels(&encoding)?;
            assign_labels(&mut words, &encoding.offsets, &labels);
        }

        Ok(aggregate(&words, &self.config.background_label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Encoding, TokenClassifier, Tokenizer};
    use crate::rule_based::{build_lexicon_model, Lexicon};
    use std::sync::atomic::AtomicUsize;

    fn lexicon_pipeline(terms: &[(&str, &str)], config: PipelineConfig) -> NerPipeline {
        let mut lexicon = Lexicon::default();
        for (term, entity_type) in terms {
            lexicon.add_term(term, entity_type);
        }
        let model = build_lexicon_model(&lexicon).unwrap();
        NerPipeline::new(model, config).unwrap()
    }

    fn small_window() -> PipelineConfig {
        PipelineConfig {
            max_len: 8,
            stride: 5,
            ..Default::default()
        }
    }

    /// Um token por palavra; classificador roteirizado por posição (via id).
    struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn encode(&self, text: &str, _max_length: Option<usize>) -> Result<Encoding> {
            let mut ids = vec![0];
            let mut offsets = vec![(0, 0)];
            for word in segment_words(text) {
                ids.push(if word.text.starts_with("Emotet") { 7 } else { 5 });
                offsets.push((word.span.start, word.span.end));
            }
            ids.push(1);
            offsets.push((0, 0));
            let attention_mask = vec![1; ids.len()];
            Ok(Encoding {
                ids,
                offsets,
                attention_mask,
            })
        }
    }

    /// Conta chamadas e rotula o id 7 como malware.
    #[derive(Default)]
    struct CountingClassifier {
        calls: AtomicUsize,
    }

    impl TokenClassifier for CountingClassifier {
        fn classify(&self, ids: &[u32], _mask: &[u32]) -> Result<Vec<usize>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ids.iter().map(|&id| if id == 7 { 1 } else { 0 }).collect())
        }

        fn label_for_id(&self, id: usize) -> Option<&str> {
            ["O", "B-MALWARE"].get(id).copied()
        }
    }

    struct FailingClassifier;

    impl TokenClassifier for FailingClassifier {
        fn classify(&self, _ids: &[u32], _mask: &[u32]) -> Result<Vec<usize>> {
            Err(NerError::inference("device lost"))
        }

        fn label_for_id(&self, _id: usize) -> Option<&str> {
            Some("O")
        }
    }

    #[test]
    fn test_end_to_end_apt_and_cve() {
        // só APT28 e o padrão de CVE; "phishing" fica de fora
        let mut lexicon = Lexicon::builtin();
        lexicon.terms.retain(|t| t.term == "apt28");
        lexicon.patterns.retain(|p| p.name == "cve");
        let pipeline =
            NerPipeline::new(build_lexicon_model(&lexicon).unwrap(), PipelineConfig::default()).unwrap();

        let text = "APT28 exploited CVE-2023-12345 in a phishing campaign.";
        let result = pipeline.analyze(text).unwrap();
        assert_eq!(
            result.entities,
            vec![
                Entity { word: "APT28".into(), entity_type: "APT".into(), start: 0, end: 5 },
                Entity {
                    word: "CVE-2023-12345".into(),
                    entity_type: "VULNERABILITY".into(),
                    start: 16,
                    end: 30,
                },
            ]
        );
        assert_eq!(result.entity_count, 2);
        assert_eq!(result.per_sentence.len(), 1);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["entity_count"], 2);
        assert_eq!(json["entities"][1]["entity_type"], "VULNERABILITY");

        let only_apt = lexicon_pipeline(&[("apt28", "APT")], PipelineConfig::default());
        assert_eq!(only_apt.analyze(text).unwrap().entity_count, 1);
    }

    #[test]
    fn test_empty_input_never_calls_classifier() {
        let classifier = Arc::new(CountingClassifier::default());
        let model = NerModel::new(Arc::new(WordTokenizer), classifier.clone());
        let pipeline = NerPipeline::new(model, PipelineConfig::default()).unwrap();

        for text in ["", "   \n\t"] {
            let result = pipeline.analyze(text).unwrap();
            assert!(result.entities.is_empty());
            assert_eq!(result.entity_count, 0);
        }
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);

        let json = serde_json::to_value(pipeline.analyze("").unwrap()).unwrap();
        assert_eq!(json["entities"], serde_json::json!([]));
        assert_eq!(json["entity_count"], 0);
    }

    #[test]
    fn test_no_terminal_punctuation_uses_whole_document() {
        let pipeline = lexicon_pipeline(&[("emotet", "MALWARE")], PipelineConfig::default());
        let result = pipeline.analyze("  Emotet resurfaced again").unwrap();
        assert_eq!(result.per_sentence.len(), 1);
        assert_eq!(result.per_sentence[0].text, "Emotet resurfaced again");
        assert_eq!(result.per_sentence[0].offset, 2);
        assert_eq!(result.entities[0].start, 2);
        assert_eq!(result.entities[0].end, 8);
    }

    #[test]
    fn test_offsets_are_global_across_sentences() {
        let pipeline = lexicon_pipeline(&[("emotet", "MALWARE"), ("psexec", "TOOL")], PipelineConfig::default());
        let text = "Emotet spread. Operators then ran PsExec.";
        let result = pipeline.analyze(text).unwrap();
        let found: Vec<(&str, &str)> = result
            .entities
            .iter()
            .map(|e| (&text[e.start..e.end], e.entity_type.as_str()))
            .collect();
        assert_eq!(found, vec![("Emotet", "MALWARE"), ("PsExec.", "TOOL")]);
        assert_eq!(result.per_sentence[1].offset, 15);
    }

    #[test]
    fn test_multibyte_text_reports_char_offsets() {
        let pipeline = lexicon_pipeline(&[("ryuk", "MALWARE")], PipelineConfig::default());
        let text = "Relatório: Ryuk voltou";
        let result = pipeline.analyze(text).unwrap();
        let entity = &result.entities[0];
        let chars: Vec<char> = text.chars().collect();
        let word: String = chars[entity.start..entity.end].iter().collect();
        assert_eq!(word, "Ryuk");
        assert_eq!(entity.word, "Ryuk");
    }

    #[test]
    fn test_duplicate_spans_are_suppressed_from_combined() {
        let pipeline = lexicon_pipeline(&[("emotet", "MALWARE")], PipelineConfig::default());
        let doc = "Emotet is back. again";
        let mut sentences = segment_document(doc);
        assert_eq!(sentences.len(), 2);
        // simula um corte ruim que repete a primeira sentença
        sentences.insert(1, sentences[0].clone());

        let analysis = pipeline
            .assemble(doc, &sentences, &CharOffsets::new(doc), &CancelToken::new(), &|_| {})
            .unwrap();

        let expected = Entity {
            word: "Emotet".into(),
            entity_type: "MALWARE".into(),
            start: 0,
            end: 6,
        };
        assert_eq!(analysis.entities, vec![expected.clone()]);
        assert_eq!(analysis.entity_count, 1);
        assert_eq!(analysis.per_sentence.len(), 3);
        assert_eq!(analysis.per_sentence[0].entities, vec![expected.clone()]);
        assert_eq!(analysis.per_sentence[1].entities, vec![expected]);
        assert!(analysis.per_sentence[2].entities.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let pipeline = lexicon_pipeline(&[("lazarus", "APT"), ("wannacry", "MALWARE")], small_window());
        let text = "Lazarus deployed WannaCry. Researchers linked WannaCry to Lazarus! Done";
        let first = pipeline.analyze(text).unwrap();
        let second = pipeline.analyze(text).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.entity_count, 4);
    }

    #[test]
    fn test_windowed_matches_direct_classification() {
        let terms = [("mimikatz", "TOOL"), ("conti", "MALWARE"), ("fin7", "APT")];
        let text = "fin7 staged mimikatz on host alpha then pivoted with conti and mimikatz again using fin7 tooling";

        let direct = lexicon_pipeline(&terms, PipelineConfig::default());
        let windowed = lexicon_pipeline(&terms, small_window());

        let encoding = windowed.model().tokenizer.encode(text, None).unwrap();
        assert!(encoding.len() > windowed.config().max_len + 2);

        let a = direct.analyze(text).unwrap();
        let b = windowed.analyze(text).unwrap();
        assert_eq!(a.entities, b.entities);
        assert_eq!(b.entity_count, 5);
    }

    #[test]
    fn test_word_split_across_windows_keeps_one_entity() {
        // "x.y" vira três sub-tokens e cai entre duas janelas de 4
        let mut lexicon = Lexicon::default();
        lexicon.add_term("x", "MALWARE");
        let model = build_lexicon_model(&lexicon).unwrap();
        let config = PipelineConfig { max_len: 4, stride: 3, ..Default::default() };
        let pipeline = NerPipeline::new(model, config).unwrap();

        let result = pipeline.analyze("ab cd x.y ef gh ij").unwrap();
        assert_eq!(result.entity_count, 1);
        assert_eq!(result.entities[0].word, "x.y");
    }

    #[test]
    fn test_inference_failure_aborts_request() {
        let model = NerModel::new(Arc::new(WordTokenizer), Arc::new(FailingClassifier));
        let pipeline = NerPipeline::new(model, PipelineConfig::default()).unwrap();
        let err = pipeline.analyze("Emotet is back. It spreads.").unwrap_err();
        assert!(matches!(err, NerError::InferenceFailure(_)));
    }

    #[test]
    fn test_cancelled_before_any_call() {
        let classifier = Arc::new(CountingClassifier::default());
        let model = NerModel::new(Arc::new(WordTokenizer), classifier.clone());
        let pipeline = NerPipeline::new(model, PipelineConfig::default()).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = pipeline.analyze_with_cancel("Emotet is back.", &cancel).unwrap_err();
        assert!(matches!(err, NerError::Cancelled));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_streaming_events() {
        let classifier = Arc::new(CountingClassifier::default());
        let model = NerModel::new(Arc::new(WordTokenizer), classifier);
        let pipeline = NerPipeline::new(model, PipelineConfig::default()).unwrap();

        let (tx, rx) = mpsc::channel();
        pipeline.analyze_streaming("Emotet is back. Emotet again.", &CancelToken::new(), tx);
        let events: Vec<PipelineEvent> = rx.try_iter().collect();

        assert!(matches!(&events[0], PipelineEvent::SentencesSplit { total: 2, .. }));
        let done = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::SentenceDone { .. }))
            .count();
        assert_eq!(done, 2);
        match events.last().unwrap() {
            PipelineEvent::Done { result, .. } => assert_eq!(result.entity_count, 2),
            other => panic!("último evento deveria ser Done, veio {:?}", other),
        }
    }

    #[test]
    fn test_streaming_reports_error() {
        let model = NerModel::new(Arc::new(WordTokenizer), Arc::new(FailingClassifier));
        let pipeline = NerPipeline::new(model, PipelineConfig::default()).unwrap();
        let (tx, rx) = mpsc::channel();
        pipeline.analyze_streaming("Emotet", &CancelToken::new(), tx);
        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert!(matches!(events.last(), Some(PipelineEvent::Error { .. })));
        assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Done { .. })));
    }

    /// Falha a partir da segunda chamada.
    #[derive(Default)]
    struct FailsAfterFirstCall {
        calls: AtomicUsize,
    }

    impl TokenClassifier for FailsAfterFirstCall {
        fn classify(&self, ids: &[u32], _mask: &[u32]) -> Result<Vec<usize>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(NerError::inference("boom"));
            }
            Ok(ids.iter().map(|&id| if id == 7 { 1 } else { 0 }).collect())
        }

        fn label_for_id(&self, id: usize) -> Option<&str> {
            ["O", "B-MALWARE"].get(id).copied()
        }
    }

    #[test]
    fn test_streaming_failure_after_progress_ends_in_error_only() {
        let model = NerModel::new(Arc::new(WordTokenizer), Arc::new(FailsAfterFirstCall::default()));
        let pipeline = NerPipeline::new(model, PipelineConfig::default()).unwrap();
        let (tx, rx) = mpsc::channel();
        pipeline.analyze_streaming("Emotet is back. Emotet again.", &CancelToken::new(), tx);
        let events: Vec<PipelineEvent> = rx.try_iter().collect();

        let progress = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::SentenceDone { .. }))
            .count();
        assert_eq!(progress, 1);
        match events.last() {
            Some(PipelineEvent::Error { message }) => assert!(message.contains("boom")),
            other => panic!("último evento deveria ser Error, veio {:?}", other),
        }
        assert!(!events.iter().any(|e| matches!(e, PipelineEvent::Done { .. })));

        // a mesma falha sem streaming não devolve nada parcial
        let model = NerModel::new(Arc::new(WordTokenizer), Arc::new(FailsAfterFirstCall::default()));
        let pipeline = NerPipeline::new(model, PipelineConfig::default()).unwrap();
        assert!(pipeline.analyze("Emotet is back. Emotet again.").is_err());
    }

    #[test]
    fn test_batch_keeps_input_order() {
        let pipeline = lexicon_pipeline(&[("turla", "APT")], PipelineConfig::default());
        let texts = vec!["Turla".to_string(), String::new(), "nothing here".to_string()];
        let results = pipeline.analyze_batch(&texts);
        let counts: Vec<usize> = results.into_iter().map(|r| r.unwrap().entity_count).collect();
        assert_eq!(counts, vec![1, 0, 0]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let model = build_lexicon_model(&Lexicon::builtin()).unwrap();
        let config = PipelineConfig { max_len: 4, stride: 4, ..Default::default() };
        assert!(matches!(NerPipeline::new(model, config), Err(NerError::Config(_))));
    }
}
