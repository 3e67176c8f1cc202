//! # Modelo de Léxico: Gazetteers e Padrões Regex
//!
//! Um par tokenizador/classificador determinístico que implementa as mesmas
//! interfaces de um modelo transformer ([`Tokenizer`] e [`TokenClassifier`]).
//! Serve como modelo padrão do servidor e como modelo de referência nos testes.
//!
//! ## Como funciona
//!
//! O léxico tem dois tipos de entrada:
//!
//! - **Termos** (gazetteers): nomes conhecidos de grupos APT, malware,
//!   ferramentas, protocolos (ex: `apt28 → APT`, `mimikatz → TOOL`).
//! - **Padrões**: expressões regulares para indicadores com formato fixo
//!   (CVE, IPv4, hashes MD5/SHA-1/SHA-256).
//!
//! Na tokenização, uma palavra inteira que casa com um termo ou padrão vira um
//! único sub-token com id próprio. O resto é quebrado em sequências
//! alfanuméricas (termo conhecido → um sub-token) e, por fim, em caracteres.
//! O classificador só olha o id: ids de termo/padrão recebem `B-<TIPO>`,
//! todo o resto recebe `O`.
//!
//! ```text
//! "Mimikatz.exe dumped"  →  [CLS] mimikatz . e x e d u m p e d [SEP]
//!                              B-TOOL   O O O O O O O O O O
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{NerError, Result};
use crate::model::{Encoding, NerModel, TokenClassifier, Tokenizer};
use crate::tokenizer::{is_token_char, segment_words};

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;
pub const CLS_ID: u32 = 2;
pub const SEP_ID: u32 = 3;

const SPECIAL_TOKENS: usize = 4;

/// Gazetteer padrão: (termo, tipo de entidade)
const BUILTIN_TERMS: &[(&str, &str)] = &[
    // grupos APT
    ("apt1", "APT"), ("apt3", "APT"), ("apt10", "APT"), ("apt28", "APT"),
    ("apt29", "APT"), ("apt32", "APT"), ("apt33", "APT"), ("apt38", "APT"),
    ("apt41", "APT"), ("lazarus", "APT"), ("turla", "APT"), ("sandworm", "APT"),
    ("kimsuky", "APT"), ("fin7", "APT"), ("carbanak", "APT"), ("oilrig", "APT"),
    // famílias de malware
    ("emotet", "MALWARE"), ("trickbot", "MALWARE"), ("wannacry", "MALWARE"),
    ("notpetya", "MALWARE"), ("ryuk", "MALWARE"), ("conti", "MALWARE"),
    ("lockbit", "MALWARE"), ("qakbot", "MALWARE"), ("mirai", "MALWARE"),
    ("stuxnet", "MALWARE"), ("zeus", "MALWARE"), ("dridex", "MALWARE"),
    ("agenttesla", "MALWARE"), ("plugx", "MALWARE"), ("njrat", "MALWARE"),
    // ferramentas
    ("mimikatz", "TOOL"), ("metasploit", "TOOL"), ("psexec", "TOOL"),
    ("bloodhound", "TOOL"), ("nmap", "TOOL"), ("powershell", "TOOL"),
    ("rclone", "TOOL"), ("cobaltstrike", "TOOL"), ("sqlmap", "TOOL"),
    ("responder", "TOOL"), ("procdump", "TOOL"), ("adfind", "TOOL"),
    // protocolos
    ("smb", "PROTOCOL"), ("rdp", "PROTOCOL"), ("ssh", "PROTOCOL"),
    ("dns", "PROTOCOL"), ("ftp", "PROTOCOL"), ("ldap", "PROTOCOL"),
    // atividades ofensivas
    ("phishing", "ACTIVITY"), ("spearphishing", "ACTIVITY"),
    ("exfiltration", "ACTIVITY"), ("bruteforce", "ACTIVITY"),
];

/// Padrões padrão: (nome, regex sobre a palavra em minúsculas, tipo)
const BUILTIN_PATTERNS: &[(&str, &str, &str)] = &[
    ("cve", r"cve-\d{4}-\d{4,7}", "VULNERABILITY"),
    ("ipv4", r"(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)", "INDICATOR"),
    ("sha256", r"[0-9a-f]{64}", "HASH"),
    ("sha1", r"[0-9a-f]{40}", "HASH"),
    ("md5", r"[0-9a-f]{32}", "HASH"),
];

/// Entrada de gazetteer: uma palavra de token e seu tipo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconTerm {
    pub term: String,
    pub entity_type: String,
}

/// Padrão regex aplicado à palavra inteira (casamento completo, sem diferenciar maiúsculas).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconPattern {
    pub name: String,
    pub pattern: String,
    pub entity_type: String,
}

/// Conjunto de termos e padrões que alimenta o modelo de léxico.
///
/// Pode ser carregado de JSON:
///
/// ```json
/// { "terms": [{ "term": "blackcat", "entity_type": "MALWARE" }],
///   "patterns": [{ "name": "onion", "pattern": "[a-z2-7]{56}\\.onion", "entity_type": "DOMAIN" }] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default)]
    pub terms: Vec<LexiconTerm>,
    #[serde(default)]
    pub patterns: Vec<LexiconPattern>,
}

impl Lexicon {
    /// Léxico embutido de cibersegurança.
    pub fn builtin() -> Self {
        Self {
            terms: BUILTIN_TERMS
                .iter()
                .map(|(term, entity_type)| LexiconTerm {
                    term: term.to_string(),
                    entity_type: entity_type.to_string(),
                })
                .collect(),
            patterns: BUILTIN_PATTERNS
                .iter()
                .map(|(name, pattern, entity_type)| LexiconPattern {
                    name: name.to_string(),
                    pattern: pattern.to_string(),
                    entity_type: entity_type.to_string(),
                })
                .collect(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| NerError::Lexicon(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Acrescenta as entradas de `other` (em caso de termo repetido, vale o primeiro).
    pub fn extend(&mut self, other: Lexicon) {
        self.terms.extend(other.terms);
        self.patterns.extend(other.patterns);
    }

    pub fn add_term(&mut self, term: &str, entity_type: &str) {
        self.terms.push(LexiconTerm {
            term: term.to_string(),
            entity_type: entity_type.to_string(),
        });
    }
}

/// Vocabulário compilado, compartilhado pelo tokenizador e pelo classificador.
#[derive(Debug)]
struct Vocabulary {
    terms: HashMap<String, u32>,
    patterns: Vec<(Regex, u32)>,
    chars: HashMap<char, u32>,
    /// id de token → id de rótulo
    token_labels: Vec<usize>,
    /// id de rótulo → rótulo IOB
    labels: Vec<String>,
}

impl Vocabulary {
    fn build(lexicon: &Lexicon) -> Result<Self> {
        let mut labels = vec!["O".to_string()];
        let mut begin_label: HashMap<String, usize> = HashMap::new();
        let mut label_for_type = |entity_type: &str| -> Result<usize> {
            if entity_type.is_empty() || entity_type == "O" {
                return Err(NerError::Lexicon(format!(
                    "invalid entity type {:?}",
                    entity_type
                )));
            }
            if let Some(&id) = begin_label.get(entity_type) {
                return Ok(id);
            }
            let id = labels.len();
            labels.push(format!("B-{}", entity_type));
            labels.push(format!("I-{}", entity_type));
            begin_label.insert(entity_type.to_string(), id);
            Ok(id)
        };

        let mut token_labels = vec![0; SPECIAL_TOKENS];

        let mut patterns = Vec::with_capacity(lexicon.patterns.len());
        for entry in &lexicon.patterns {
            let regex = Regex::new(&format!("(?i)^(?:{})$", entry.pattern)).map_err(|e| {
                NerError::Lexicon(format!("pattern {:?} does not compile: {}", entry.name, e))
            })?;
            let label = label_for_type(&entry.entity_type)?;
            patterns.push((regex, token_labels.len() as u32));
            token_labels.push(label);
        }

        let mut terms = HashMap::with_capacity(lexicon.terms.len());
        for entry in &lexicon.terms {
            if entry.term.is_empty() || !entry.term.chars().all(is_token_char) {
                return Err(NerError::Lexicon(format!(
                    "term {:?} must be a single token word",
                    entry.term
                )));
            }
            let key = entry.term.to_ascii_lowercase();
            if terms.contains_key(&key) {
                warn!(term = %entry.term, "duplicate lexicon term ignored");
                continue;
            }
            let label = label_for_type(&entry.entity_type)?;
            terms.insert(key, token_labels.len() as u32);
            token_labels.push(label);
        }

        let mut chars = HashMap::new();
        for byte in 0x21u8..=0x7e {
            let ch = (byte as char).to_ascii_lowercase();
            if !chars.contains_key(&ch) {
                chars.insert(ch, token_labels.len() as u32);
                token_labels.push(0);
            }
        }

        Ok(Self {
            terms,
            patterns,
            chars,
            token_labels,
            labels,
        })
    }

    /// Id de palavra inteira (padrão ou termo), se houver.
    fn word_id(&self, word: &str) -> Option<u32> {
        let lower = word.to_ascii_lowercase();
        if let Some(&id) = self.terms.get(&lower) {
            return Some(id);
        }
        self.patterns
            .iter()
            .find(|(regex, _)| regex.is_match(&lower))
            .map(|(_, id)| *id)
    }

    fn char_id(&self, ch: char) -> u32 {
        self.chars
            .get(&ch.to_ascii_lowercase())
            .copied()
            .unwrap_or(UNK_ID)
    }
}

/// Tokenizador guiado pelo léxico.
#[derive(Debug, Clone)]
pub struct LexiconTokenizer {
    vocab: Arc<Vocabulary>,
}

/// Classificador que rotula ids de termos e padrões.
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    vocab: Arc<Vocabulary>,
}

/// Constrói o par tokenizador/classificador a partir de um léxico.
pub fn build_lexicon_model(lexicon: &Lexicon) -> Result<NerModel> {
    let vocab = Arc::new(Vocabulary::build(lexicon)?);
    Ok(NerModel::new(
        Arc::new(LexiconTokenizer {
            vocab: Arc::clone(&vocab),
        }),
        Arc::new(LexiconClassifier { vocab }),
    ))
}

/// Acumulador de sub-tokens durante a codificação
struct Pieces {
    ids: Vec<u32>,
    offsets: Vec<(usize, usize)>,
}

impl Pieces {
    fn push(&mut self, id: u32, start: usize, end: usize) {
        self.ids.push(id);
        self.offsets.push((start, end));
    }
}

impl LexiconTokenizer {
    /// Palavra de token: inteira, inteira sem `.`/`:` final, ou em pedaços.
    fn encode_word(&self, word: &str, base: usize, out: &mut Pieces) {
        if let Some(id) = self.vocab.word_id(word) {
            out.push(id, base, base + word.len());
            return;
        }
        let core = word.trim_end_matches(['.', ':']);
        if !core.is_empty() && core.len() < word.len() {
            if let Some(id) = self.vocab.word_id(core) {
                out.push(id, base, base + core.len());
                self.encode_pieces(&word[core.len()..], base + core.len(), out);
                return;
            }
        }
        self.encode_pieces(word, base, out);
    }

    /// Sequências alfanuméricas (termo → 1 pedaço, senão 1 por caractere) e pontuação isolada.
    fn encode_pieces(&self, part: &str, base: usize, out: &mut Pieces) {
        let bytes = part.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i].is_ascii_alphanumeric() {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                let run = &part[start..i];
                match self.vocab.terms.get(&run.to_ascii_lowercase()) {
                    Some(&id) => out.push(id, base + start, base + i),
                    None => {
                        for (j, ch) in run.char_indices() {
                            out.push(self.vocab.char_id(ch), base + start + j, base + start + j + 1);
                        }
                    }
                }
            } else {
                let ch = bytes[i] as char;
                out.push(self.vocab.char_id(ch), base + i, base + i + 1);
                i += 1;
            }
        }
    }

    /// Caracteres fora de palavras: espaços somem, o resto vira um pedaço cada.
    fn encode_gap(&self, text: &str, from: usize, to: usize, out: &mut Pieces) {
        for (i, ch) in text[from..to].char_indices() {
            if ch.is_whitespace() {
                continue;
            }
            let start = from + i;
            out.push(self.vocab.char_id(ch), start, start + ch.len_utf8());
        }
    }
}

impl Tokenizer for LexiconTokenizer {
    fn encode(&self, text: &str, max_length: Option<usize>) -> Result<Encoding> {
        let mut pieces = Pieces {
            ids: vec![CLS_ID],
            offsets: vec![(0, 0)],
        };

        let mut cursor = 0;
        for word in segment_words(text) {
            self.encode_gap(text, cursor, word.span.start, &mut pieces);
            self.encode_word(&word.text, word.span.start, &mut pieces);
            cursor = word.span.end;
        }
        self.encode_gap(text, cursor, text.len(), &mut pieces);

        if let Some(max_length) = max_length {
            let keep = max_length.max(2) - 1;
            pieces.ids.truncate(keep);
            pieces.offsets.truncate(keep);
        }
        pieces.push(SEP_ID, 0, 0);

        let attention_mask = vec![1; pieces.ids.len()];
        Ok(Encoding {
            ids: pieces.ids,
            offsets: pieces.offsets,
            attention_mask,
        })
    }
}

impl TokenClassifier for LexiconClassifier {
    fn classify(&self, ids: &[u32], attention_mask: &[u32]) -> Result<Vec<usize>> {
        ids.iter()
            .zip(attention_mask.iter().chain(std::iter::repeat(&1)))
            .map(|(&id, &mask)| {
                if mask == 0 || id == PAD_ID {
                    return Ok(0);
                }
                self.vocab
                    .token_labels
                    .get(id as usize)
                    .copied()
                    .ok_or_else(|| NerError::inference(format!("token id {} out of vocabulary", id)))
            })
            .collect()
    }

    fn label_for_id(&self, id: usize) -> Option<&str> {
        self.vocab.labels.get(id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_model() -> NerModel {
        build_lexicon_model(&Lexicon::builtin()).unwrap()
    }

    fn labels_for(model: &NerModel, text: &str) -> Vec<(String, String)> {
        let encoding = model.tokenizer.encode(text, None).unwrap();
        let labels = model.predict_labels(&encoding).unwrap();
        encoding
            .offsets
            .iter()
            .zip(labels)
            .skip(1)
            .take(encoding.len() - 2)
            .map(|(&(s, e), label)| (text[s..e].to_string(), label))
            .collect()
    }

    #[test]
    fn test_encoding_has_markers_and_offsets() {
        let model = builtin_model();
        let encoding = model.tokenizer.encode("APT28, go", None).unwrap();
        assert!(encoding.check().is_ok());
        assert_eq!(encoding.ids[0], CLS_ID);
        assert_eq!(*encoding.ids.last().unwrap(), SEP_ID);
        assert_eq!(
            encoding.offsets,
            vec![(0, 0), (0, 5), (5, 6), (7, 8), (8, 9), (0, 0)]
        );
    }

    #[test]
    fn test_terms_and_patterns_are_labelled() {
        let model = builtin_model();
        let pieces = labels_for(&model, "APT28 used Mimikatz.exe against 10.0.0.1 via CVE-2021-44228.");
        let tagged: Vec<(&str, &str)> = pieces
            .iter()
            .filter(|(_, l)| l != "O")
            .map(|(t, l)| (t.as_str(), l.as_str()))
            .collect();
        assert_eq!(
            tagged,
            vec![
                ("APT28", "B-APT"),
                ("Mimikatz", "B-TOOL"),
                ("10.0.0.1", "B-INDICATOR"),
                ("CVE-2021-44228", "B-VULNERABILITY"),
            ]
        );
    }

    #[test]
    fn test_unknown_words_fall_back_to_characters() {
        let model = builtin_model();
        let pieces = labels_for(&model, "zz9");
        let texts: Vec<&str> = pieces.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, ["z", "z", "9"]);
    }

    #[test]
    fn test_non_ascii_becomes_unknown() {
        let model = builtin_model();
        let encoding = model.tokenizer.encode("é", None).unwrap();
        assert_eq!(encoding.ids, vec![CLS_ID, UNK_ID, SEP_ID]);
        assert_eq!(encoding.offsets[1], (0, 2));
    }

    #[test]
    fn test_truncation_keeps_markers() {
        let model = builtin_model();
        let encoding = model.tokenizer.encode("abcdefgh", Some(5)).unwrap();
        assert_eq!(encoding.len(), 5);
        assert_eq!(encoding.ids[0], CLS_ID);
        assert_eq!(encoding.ids[4], SEP_ID);
        assert_eq!(encoding.offsets[3], (2, 3));
    }

    #[test]
    fn test_label_table() {
        let mut lexicon = Lexicon::default();
        lexicon.add_term("emotet", "MALWARE");
        lexicon.add_term("psexec", "TOOL");
        let model = build_lexicon_model(&lexicon).unwrap();
        let names: Vec<&str> = (0..5)
            .filter_map(|id| model.classifier.label_for_id(id))
            .collect();
        assert_eq!(names, ["O", "B-MALWARE", "I-MALWARE", "B-TOOL", "I-TOOL"]);
        assert!(model.classifier.label_for_id(5).is_none());
    }

    #[test]
    fn test_invalid_lexicon_entries() {
        let mut lexicon = Lexicon::default();
        lexicon.add_term("cobalt strike", "TOOL");
        assert!(matches!(build_lexicon_model(&lexicon), Err(NerError::Lexicon(_))));

        let lexicon = Lexicon::from_json_str(
            r#"{"patterns": [{"name": "broken", "pattern": "(", "entity_type": "X"}]}"#,
        )
        .unwrap();
        assert!(matches!(build_lexicon_model(&lexicon), Err(NerError::Lexicon(_))));
    }

    #[test]
    fn test_out_of_vocabulary_id_fails() {
        let model = builtin_model();
        assert!(model.classifier.classify(&[CLS_ID, 999_999, SEP_ID], &[1, 1, 1]).is_err());
    }

    #[test]
    fn test_lexicon_from_json_extends_builtin() {
        let mut lexicon = Lexicon::builtin();
        lexicon.extend(
            Lexicon::from_json_str(r#"{"terms": [{"term": "blackcat", "entity_type": "MALWARE"}]}"#)
                .unwrap(),
        );
        let model = build_lexicon_model(&lexicon).unwrap();
        let pieces = labels_for(&model, "BlackCat");
        assert_eq!(pieces, vec![("BlackCat".to_string(), "B-MALWARE".to_string())]);
    }
}
