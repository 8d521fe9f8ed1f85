//! Denylist content filter applied to outgoing message bodies.
//!
//! The filter is a policy value: an ordered list of terms and a mask token.
//! Swapping the policy never touches the moderation queue, which only calls
//! [`ContentFilter::apply`].

use crate::defaults::{MessengerConfig, DEFAULT_FILTER_MASK, DEFAULT_FILTER_TERMS};

/// Result of running text through a [`ContentFilter`].
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FilterOutcome {
    /// Text with every match replaced by the mask.
    pub text: String,
    /// Whether at least one term was masked.
    pub was_filtered: bool,
    /// Number of masked occurrences across all terms.
    pub masked_count: u32,
}

/// Ordered, case-insensitive denylist.
///
/// Terms match as substrings, so `bad` also masks the start of `badly`.
/// Matching folds ASCII case only.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Object)]
pub struct ContentFilter {
    terms: Vec<String>,
    mask: String,
}

impl ContentFilter {
    /// Builds a filter from `terms` (in matching order) and `mask`.
    ///
    /// Terms are lowercased; empty terms are dropped. A blank mask, or one
    /// that itself contains a term, would let masked text still carry a
    /// term, so it is replaced by [`DEFAULT_FILTER_MASK`].
    #[must_use]
    pub fn new<I, S>(terms: I, mask: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<String> = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_ascii_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        let mut mask = mask.into();
        let folded = mask.to_ascii_lowercase();
        if mask.trim().is_empty() || terms.iter().any(|term| folded.contains(term.as_str())) {
            log::warn!("unusable filter mask {mask:?}, using {DEFAULT_FILTER_MASK:?}");
            mask = DEFAULT_FILTER_MASK.to_string();
        }
        Self { terms, mask }
    }

    /// Builds the filter described by `config`.
    #[must_use]
    pub fn from_config(config: &MessengerConfig) -> Self {
        Self::new(&config.filter_terms, config.filter_mask.clone())
    }

    /// Masks every occurrence of every term in `text`.
    ///
    /// The text is scanned once from the left. At each position the first
    /// term in list order that matches is masked and scanning resumes after
    /// it, so inserted masks are never scanned again.
    #[must_use]
    pub fn apply(&self, text: &str) -> FilterOutcome {
        // ASCII lowercasing keeps byte offsets identical, so positions in the
        // folded haystack index the original text directly.
        let haystack = text.to_ascii_lowercase();
        let mut out = String::with_capacity(text.len());
        let mut masked_count = 0u32;
        let mut copied = 0;
        let mut pos = 0;
        while let Some(rest) = haystack.get(pos..).filter(|rest| !rest.is_empty()) {
            let Some(term) = self.terms.iter().find(|term| rest.starts_with(term.as_str())) else {
                pos += rest.chars().next().map_or(1, char::len_utf8);
                continue;
            };
            out.push_str(&text[copied..pos]);
            out.push_str(&self.mask);
            pos += term.len();
            copied = pos;
            masked_count = masked_count.saturating_add(1);
        }
        out.push_str(&text[copied..]);
        FilterOutcome {
            text: out,
            was_filtered: masked_count > 0,
            masked_count,
        }
    }

    /// Returns the mask token written over each match.
    #[must_use]
    pub fn mask(&self) -> &str {
        &self.mask
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_TERMS, DEFAULT_FILTER_MASK)
    }
}

#[uniffi::export]
impl ContentFilter {
    /// Builds a filter from an ordered list of terms and a mask token.
    #[uniffi::constructor]
    #[must_use]
    pub fn with_terms(terms: Vec<String>, mask: String) -> Self {
        Self::new(terms, mask)
    }

    /// Builds the default filter.
    #[uniffi::constructor]
    #[must_use]
    pub fn standard() -> Self {
        Self::default()
    }

    /// Runs `text` through the filter.
    #[must_use]
    pub fn filter_text(&self, text: &str) -> FilterOutcome {
        self.apply(text)
    }

    /// Returns the normalised terms in matching order.
    #[must_use]
    pub fn terms(&self) -> Vec<String> {
        self.terms.clone()
    }
}
