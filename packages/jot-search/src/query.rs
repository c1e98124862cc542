use std::sync::LazyLock;

use regex::Regex;

// Quotes pair left to right; a trailing unmatched quote never opens a span.
static QUOTED_SPAN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#""([^"]*)""#).expect("valid regex"));

/// A raw query split into exact-match phrases and the text left outside the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
	pub phrases: Vec<String>,
	pub free_text: String,
	lowered: Vec<String>,
}
impl ParsedQuery {
	/// Whether anything remains for the semantic step once quoted spans are removed.
	pub fn has_free_text(&self) -> bool {
		!self.free_text.is_empty()
	}

	/// Case-insensitive containment of every phrase.
	pub fn matches(&self, text: &str) -> bool {
		if self.lowered.is_empty() {
			return true;
		}
		if text.is_empty() {
			return false;
		}

		let text = text.to_lowercase();

		self.lowered.iter().all(|phrase| text.contains(phrase.as_str()))
	}
}

pub fn parse(query: &str) -> ParsedQuery {
	let phrases = extract_phrases(query);
	let lowered = phrases.iter().map(|phrase| phrase.to_lowercase()).collect();
	let stripped = QUOTED_SPAN.replace_all(query, " ");
	let free_text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

	ParsedQuery { phrases, free_text, lowered }
}

/// Phrases found between pairs of double quotes, in order of appearance.
///
/// Quotes pair strictly left to right, so `a "" b "c"` yields only `c`: the empty pair is
/// consumed and skipped rather than letting ` b ` become a phrase. Duplicates are kept.
pub fn extract_phrases(query: &str) -> Vec<String> {
	QUOTED_SPAN
		.captures_iter(query)
		.filter_map(|caps| caps.get(1))
		.map(|phrase| phrase.as_str())
		.filter(|phrase| !phrase.is_empty())
		.map(str::to_string)
		.collect()
}
