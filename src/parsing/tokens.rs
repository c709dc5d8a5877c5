//! Text normalization and tokenization.
//!
//! Text is NFC-normalized first so composed and decomposed forms of the
//! same character compare equal. In the default mode tokens are the
//! maximal runs of non-whitespace and the normalized text is those tokens
//! joined by a single space, which makes indentation and trailing spaces
//! irrelevant. With whitespace kept, every whitespace run is a token of its
//! own and the text is kept verbatim.

use std::ops::Range;

use unicode_normalization::UnicodeNormalization;

/// Normalized text with token boundaries into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    tokens: Vec<Range<usize>>,
}

impl NormalizedText {
    /// Normalize `raw`.
    ///
    /// # Arguments
    ///
    /// * `raw` - Text as extracted by a parser
    /// * `keep_whitespace` - Keep whitespace runs as significant tokens
    #[must_use]
    pub fn new(raw: &str, keep_whitespace: bool) -> Self {
        let nfc: String = raw.nfc().collect();
        if keep_whitespace {
            let tokens = split_runs(&nfc);
            Self { text: nfc, tokens }
        } else {
            let mut text = String::with_capacity(nfc.len());
            let mut tokens = Vec::new();
            for word in nfc.split_whitespace() {
                if !text.is_empty() {
                    text.push(' ');
                }
                let start = text.len();
                text.push_str(word);
                tokens.push(start..text.len());
            }
            Self { text, tokens }
        }
    }

    /// The normalized text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume into the normalized text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }

    /// Iterate over tokens in order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(|r| &self.text[r.clone()])
    }

    /// Length in characters, the unit `min_length` is measured in.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// True when there are no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token windows of `size`, in order. Empty when there are fewer
    /// than `size` tokens.
    pub fn windows(&self, size: usize) -> impl Iterator<Item = Vec<&str>> + '_ {
        let tokens: Vec<&str> = self.tokens().collect();
        let count = if size == 0 || tokens.len() < size {
            0
        } else {
            tokens.len() - size + 1
        };
        (0..count).map(move |i| tokens[i..i + size].to_vec())
    }
}

/// Split into alternating whitespace / non-whitespace runs.
fn split_runs(text: &str) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (idx, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        match current {
            Some(prev) if prev == ws => {}
            Some(_) => {
                runs.push(start..idx);
                start = idx;
                current = Some(ws);
            }
            None => {
                start = idx;
                current = Some(ws);
            }
        }
    }
    if current.is_some() {
        runs.push(start..text.len());
    }
    runs
}
