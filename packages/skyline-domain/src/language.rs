use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_script::{Script, UnicodeScript};

const UNKNOWN: &str = "unknown";
const MIN_CONFIDENCE: f64 = 0.5;

/// ISO 639-3 language code, or `unknown`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct LanguageTag(String);
impl LanguageTag {
	pub fn new(code: impl AsRef<str>) -> Self {
		Self(code.as_ref().trim().to_ascii_lowercase())
	}

	pub fn unknown() -> Self {
		Self(UNKNOWN.to_string())
	}

	pub fn is_unknown(&self) -> bool {
		self.0 == UNKNOWN
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl From<String> for LanguageTag {
	fn from(code: String) -> Self {
		Self::new(code)
	}
}
impl From<whatlang::Lang> for LanguageTag {
	fn from(lang: whatlang::Lang) -> Self {
		Self(lang.code().to_string())
	}
}
impl Display for LanguageTag {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

pub fn classify_language(text: &str) -> LanguageTag {
	let normalized: String = text.nfkc().collect();

	if !normalized.chars().any(char::is_alphabetic) {
		return LanguageTag::unknown();
	}
	if let Some(lang) = script_decided_language(normalized.as_str()) {
		return lang.into();
	}

	let Some(info) = whatlang::detect(normalized.as_str()) else {
		return LanguageTag::unknown();
	};

	if info.confidence() < MIN_CONFIDENCE {
		return LanguageTag::unknown();
	}

	info.lang().into()
}

// Kana and Hangul identify their language on their own, even in posts too short for the detector.
fn script_decided_language(input: &str) -> Option<whatlang::Lang> {
	for ch in input.chars() {
		match ch.script() {
			Script::Hiragana | Script::Katakana => return Some(whatlang::Lang::Jpn),
			Script::Hangul => return Some(whatlang::Lang::Kor),
			_ => {},
		}
	}

	None
}
