use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNTITLED_CARD: &str = "Untitled card";

/// Grammar notes keyed by name (`gender`, `plural`, ...). Values are arbitrary JSON.
pub type Grammar = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub term_display: String,
    pub lemma: Option<String>,
    pub pos: Option<CardPos>,
    pub cefr: Option<String>,
    pub difficulty: Option<f64>,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub audio_url: Option<String>,
    pub pronunciation_ipa: Option<String>,
    pub example_de: Option<String>,
    pub example_hint: Option<String>,
    pub collocations: Vec<String>,
    pub pitfalls: Option<String>,
    pub grammar: Grammar,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Card {
    /// The headline shown on the back of the card.
    pub fn display_term(&self) -> &str {
        let term = self.term_display.trim();
        if !term.is_empty() {
            return term;
        }
        self.lemma
            .as_deref()
            .map(str::trim)
            .filter(|lemma| !lemma.is_empty())
            .unwrap_or(UNTITLED_CARD)
    }

    pub fn has_details(&self) -> bool {
        !self.grammar.is_empty()
            || !self.collocations.is_empty()
            || self.pitfalls.is_some()
            || !self.tags.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardPos {
    Noun,
    Verb,
    Adj,
    Adv,
    Phrase,
    Other,
}

impl CardPos {
    /// Maps a part-of-speech tag onto the known set. Unknown tags become `Other`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        let pos = match &tag.to_ascii_lowercase()[..] {
            "noun" => CardPos::Noun,
            "verb" => CardPos::Verb,
            "adj" => CardPos::Adj,
            "adv" => CardPos::Adv,
            "phrase" => CardPos::Phrase,
            _ => CardPos::Other,
        };
        Some(pos)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardPos::Noun => "noun",
            CardPos::Verb => "verb",
            CardPos::Adj => "adj",
            CardPos::Adv => "adv",
            CardPos::Phrase => "phrase",
            CardPos::Other => "other",
        }
    }
}

impl std::fmt::Display for CardPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
