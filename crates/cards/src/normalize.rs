use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde_json::Value;

use crate::card::{Card, CardPos, Grammar, UNTITLED_CARD};
use crate::image_url::normalize_image_url;

const GENERATED_ID_PREFIX: &str = "card-";
const GENERATED_ID_LEN: usize = 11;
const GENERATED_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const TERM_KEYS: &[&str] = &["term_display", "term", "word", "front", "front_text"];
const IMAGE_URL_KEYS: &[&str] = &["image_url", "image"];
const IMAGE_ALT_KEYS: &[&str] = &["image_alt", "image_caption"];
const EXAMPLE_KEYS: &[&str] = &["example_de", "example", "sentence_de"];
const HINT_KEYS: &[&str] = &["example_hint", "hint"];
const GRAMMAR_KEYS: &[&str] = &["grammar", "grammar_json"];

/// Maps a loosely-typed remote row onto a [`Card`].
///
/// Total: a missing or malformed field is replaced by its default and the row
/// is never rejected. A row that isn't a JSON object yields an all-default card.
pub fn normalize_card_row(row: &Value) -> Card {
    let image_url = first_string(row, IMAGE_URL_KEYS);
    Card {
        id: get_string(row.get("id")).unwrap_or_else(generate_card_id),
        term_display: first_string(row, TERM_KEYS).unwrap_or_else(|| UNTITLED_CARD.to_owned()),
        lemma: get_string(row.get("lemma")),
        pos: get_string(row.get("pos")).and_then(|tag| CardPos::from_tag(&tag)),
        cefr: get_string(row.get("cefr")),
        difficulty: get_number(row.get("difficulty")),
        image_url: normalize_image_url(image_url.as_deref()),
        image_alt: first_string(row, IMAGE_ALT_KEYS),
        audio_url: get_string(row.get("audio_url")),
        pronunciation_ipa: get_string(row.get("pronunciation_ipa")),
        example_de: first_string(row, EXAMPLE_KEYS),
        example_hint: first_string(row, HINT_KEYS),
        collocations: get_string_array(row.get("collocations")),
        pitfalls: get_string(row.get("pitfalls")),
        grammar: GRAMMAR_KEYS
            .iter()
            .find_map(|key| get_record(row.get(*key)))
            .unwrap_or_default(),
        tags: get_string_array(row.get("tags")),
        is_published: row
            .get("is_published")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        created_at: get_string(row.get("created_at")).unwrap_or_else(now_timestamp),
        updated_at: get_string(row.get("updated_at")).unwrap_or_else(now_timestamp),
    }
}

fn first_string(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| get_string(row.get(*key)))
}

/// A trimmed, non-empty string. Anything else is absent.
fn get_string(value: Option<&Value>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn get_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) if !text.trim().is_empty() => parse_number(text.trim())?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Decimal or exponent notation, or an unsigned `0x`/`0o`/`0b` integer literal.
fn parse_number(text: &str) -> Option<f64> {
    let radix = match text.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return text.parse::<f64>().ok(),
    };
    let digits = &text[2..];
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok().map(|number| number as f64)
}

/// Accepts either a JSON array of strings or a comma separated string.
fn get_string_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

fn get_record(value: Option<&Value>) -> Option<Grammar> {
    value?.as_object().cloned()
}

fn generate_card_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..GENERATED_ID_LEN)
        .map(|_| GENERATED_ID_ALPHABET[rng.gen_range(0..GENERATED_ID_ALPHABET.len())] as char)
        .collect();
    format!("{GENERATED_ID_PREFIX}{suffix}")
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
