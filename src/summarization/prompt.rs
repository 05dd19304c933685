//! Prompt assembly shared by every summarization backend.

use std::borrow::Cow;
use std::sync::OnceLock;

use tiktoken_rs::{CoreBPE, cl100k_base};

/// Rough characters-per-token ratio used when no tokenizer is available.
const FALLBACK_CHARS_PER_TOKEN: usize = 4;

pub(crate) const SYSTEM_PROMPT: &str = "You are an expert at creating engaging, concise summaries of academic papers. \
Create a summary that would be perfect for an Instagram post: informative, engaging, and accessible to a general audience. \
Include the key findings and why they matter. Use simple language and avoid jargon.";

static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn encoder() -> Option<&'static CoreBPE> {
    ENCODER
        .get_or_init(|| match cl100k_base() {
            Ok(encoder) => Some(encoder),
            Err(error) => {
                tracing::warn!(%error, "Tokenizer unavailable; truncating by characters");
                None
            }
        })
        .as_ref()
}

/// Build the user prompt carrying the length budget and the (truncated) paper text.
pub(crate) fn build_user_prompt(text: &str, max_length: usize, max_input_tokens: usize) -> String {
    let body = truncate_to_tokens(text, max_input_tokens);
    format!(
        "Please summarize the following academic paper in a way that would make sense for an Instagram post. \
Maximum length: {max_length} characters.\n\n{body}"
    )
}

/// Cut `text` down to at most `max_tokens` cl100k tokens.
pub(crate) fn truncate_to_tokens(text: &str, max_tokens: usize) -> Cow<'_, str> {
    let Some(encoder) = encoder() else {
        return truncate_chars(text, max_tokens.saturating_mul(FALLBACK_CHARS_PER_TOKEN));
    };

    let tokens = encoder.encode_ordinary(text);
    if tokens.len() <= max_tokens {
        return Cow::Borrowed(text);
    }

    tracing::debug!(
        tokens = tokens.len(),
        max_tokens,
        "Truncating paper text to fit the prompt budget"
    );
    match encoder.decode(tokens[..max_tokens].to_vec()) {
        Ok(truncated) => Cow::Owned(truncated),
        Err(_) => truncate_chars(text, max_tokens.saturating_mul(FALLBACK_CHARS_PER_TOKEN)),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(text[..cut].to_string()),
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_left_untouched() {
        let text = "Transformers are graph neural networks.";
        assert!(matches!(truncate_to_tokens(text, 1_000), Cow::Borrowed(_)));
    }

    #[test]
    fn long_text_is_cut_to_budget() {
        let text = "token ".repeat(500);
        let truncated = truncate_to_tokens(&text, 50);
        assert!(truncated.len() < text.len());
        assert!(text.starts_with(truncated.as_ref()));
    }

    #[test]
    fn char_truncation_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn user_prompt_mentions_budget() {
        let prompt = build_user_prompt("Body text", 280, 100);
        assert!(prompt.contains("Maximum length: 280 characters."));
        assert!(prompt.ends_with("Body text"));
    }
}
