use cards::{Card, Grammar};
use serde_json::Value;

use crate::viewer::CardViewer;

const PREFERRED_GRAMMAR_KEYS: &[&str] = &[
    "gender",
    "plural",
    "genitiv",
    "perfekt",
    "praeteritum",
    "konjunktiv2",
    "trennbar",
    "komparativ",
    "superlativ",
];

pub fn render_card(card: &Card, viewer: &CardViewer) -> String {
    let mut lines = vec![format!("[{} / {}]", viewer.index() + 1, viewer.len())];
    if viewer.revealed {
        render_back(card, viewer, &mut lines);
    } else {
        render_front(card, &mut lines);
    }
    lines.join("\n")
}

fn render_front(card: &Card, lines: &mut Vec<String>) {
    match (&card.image_url, &card.image_alt) {
        (Some(url), Some(alt)) => lines.push(format!("Image: {url} ({alt})")),
        (Some(url), None) => lines.push(format!("Image: {url}")),
        (None, _) => lines.push("Image: (none)".to_owned()),
    }
    lines.push("Press enter to reveal".to_owned());
}

fn render_back(card: &Card, viewer: &CardViewer, lines: &mut Vec<String>) {
    lines.push(card.display_term().to_owned());

    let mut meta = Vec::new();
    if let Some(ipa) = &card.pronunciation_ipa {
        meta.push(format!("/{ipa}/"));
    }
    if let Some(lemma) = &card.lemma {
        meta.push(format!("Lemma: {lemma}"));
    }
    if let Some(audio) = &card.audio_url {
        meta.push(format!("Audio: {audio}"));
    }
    if !meta.is_empty() {
        lines.push(meta.join("  "));
    }

    let difficulty = card
        .difficulty
        .filter(|difficulty| *difficulty != 0.0)
        .map(|difficulty| format!("Difficulty {difficulty}"));
    let chips = chips_row([
        card.pos.map(|pos| pos.to_string()),
        card.cefr.clone(),
        difficulty,
    ]);
    if !chips.is_empty() {
        lines.push(chips);
    }

    lines.push(String::new());
    lines.push("Example".to_owned());
    match &card.example_de {
        Some(example) => {
            lines.push(format!("  {example}"));
            match (&card.example_hint, viewer.show_hint) {
                (Some(hint), true) => lines.push(format!("  Hint: {hint}")),
                (Some(_), false) => lines.push("  (h) show hint".to_owned()),
                (None, _) => {}
            }
        }
        None => lines.push("  No example sentence yet.".to_owned()),
    }

    if card.has_details() {
        lines.push(String::new());
        render_details(card, viewer.details_open, lines);
    }
}

fn render_details(card: &Card, open: bool, lines: &mut Vec<String>) {
    if !open {
        lines.push("Details (d) +".to_owned());
        return;
    }
    lines.push("Details (d) -".to_owned());

    let rows = grammar_rows(&card.grammar);
    if !rows.is_empty() {
        lines.push("  GRAMMAR".to_owned());
        let width = rows
            .iter()
            .map(|(key, _)| pretty_key(key).chars().count())
            .max()
            .unwrap_or(0);
        for (key, value) in rows {
            let key = pretty_key(key);
            let padding = width - key.chars().count();
            lines.push(format!(
                "    {key}{}  {}",
                " ".repeat(padding),
                format_grammar_value(value)
            ));
        }
    }
    if !card.collocations.is_empty() {
        lines.push("  COLLOCATIONS".to_owned());
        for item in &card.collocations {
            lines.push(format!("    • {item}"));
        }
    }
    if let Some(pitfalls) = &card.pitfalls {
        lines.push(format!("  ! Pitfall: {pitfalls}"));
    }
    if !card.tags.is_empty() {
        lines.push("  TAGS".to_owned());
        lines.push(format!("    {}", chips_row(card.tags.iter().cloned().map(Some))));
    }
}

/// Blank chips are skipped; an empty row renders as an empty string.
pub fn chips_row(chips: impl IntoIterator<Item = Option<String>>) -> String {
    chips
        .into_iter()
        .flatten()
        .map(|chip| chip.trim().to_owned())
        .filter(|chip| !chip.is_empty())
        .map(|chip| format!("[{chip}]"))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Well-known grammar keys first, in their usual order, then the rest alphabetically.
pub fn grammar_rows(grammar: &Grammar) -> Vec<(&str, &Value)> {
    let preferred = PREFERRED_GRAMMAR_KEYS
        .iter()
        .filter_map(|key| grammar.get(*key).map(|value| (*key, value)));
    let mut remaining = grammar
        .iter()
        .map(|(key, value)| (key.as_str(), value))
        .filter(|(key, _)| !PREFERRED_GRAMMAR_KEYS.contains(key))
        .collect::<Vec<(&str, &Value)>>();
    remaining.sort_by(|(a, _), (b, _)| a.cmp(b));
    preferred.chain(remaining).collect()
}

/// `past_participle` -> `Past Participle`
pub fn pretty_key(key: &str) -> String {
    let mut pretty = String::with_capacity(key.len());
    let mut at_word_start = true;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if at_word_start && ch.is_alphanumeric() {
            pretty.extend(ch.to_uppercase());
        } else {
            pretty.push(ch);
        }
        at_word_start = !ch.is_alphanumeric();
    }
    pretty
}

pub fn format_grammar_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_owned(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => items
            .iter()
            .map(format_grammar_value)
            .collect::<Vec<String>>()
            .join(", "),
        Value::Object(entries) => entries
            .iter()
            .map(|(key, value)| format!("{}: {}", pretty_key(key), format_grammar_value(value)))
            .collect::<Vec<String>>()
            .join(" | "),
    }
}

pub fn render_summary(index: usize, card: &Card) -> String {
    let chips = chips_row([card.pos.map(|pos| pos.to_string()), card.cefr.clone()]);
    if chips.is_empty() {
        format!("{:>3}. {}", index + 1, card.display_term())
    } else {
        format!("{:>3}. {} {chips}", index + 1, card.display_term())
    }
}
