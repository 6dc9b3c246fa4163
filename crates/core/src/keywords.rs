//! LLM-backed keyword synthesis.
//!
//! The keyword list stands in for a semantic embedding: it has no
//! geometric properties and is only ever used for substring-overlap
//! scoring. Failures degrade to an empty list so that neither ingestion
//! nor queries ever abort on a synthesis error.

use crate::models::ChatMessage;
use crate::traits::TextGenerator;

/// Only this many leading characters of the input are sent to the
/// generation service.
pub const KEYWORD_INPUT_CHARS: usize = 1_500;

const KEYWORD_INSTRUCTION: &str = "Extract the 5-10 most important keywords or key phrases from \
     the following text. Return only the keywords, comma-separated, nothing else.";

/// Reduces a text fragment to a short ranked list of salient keyword
/// phrases via the generation service. Returns an empty list on any
/// service error; callers treat that as "no semantic signal" and fall
/// back to pure lexical scoring.
pub async fn synthesize_keywords<G>(generator: &G, text: &str) -> Vec<String>
where
    G: TextGenerator + ?Sized,
{
    let excerpt: String = text.chars().take(KEYWORD_INPUT_CHARS).collect();
    let messages = [ChatMessage::user(format!(
        "{KEYWORD_INSTRUCTION}\n\n{excerpt}"
    ))];

    match generator.complete(&messages).await {
        Ok(reply) => parse_keyword_list(&reply),
        Err(error) => {
            tracing::warn!(%error, "keyword synthesis failed, continuing without keywords");
            Vec::new()
        }
    }
}

/// Splits a comma-separated reply into lowercased keyword phrases,
/// dropping empty entries. Duplicates are kept.
pub fn parse_keyword_list(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::traits::CompletionStream;
    use async_trait::async_trait;

    struct CannedGenerator {
        reply: Result<&'static str, ()>,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, QueryError> {
            match self.reply {
                Ok(reply) => Ok(reply.to_string()),
                Err(()) => Err(QueryError::Generation("connection reset".to_string())),
            }
        }

        async fn stream(&self, _messages: &[ChatMessage]) -> Result<CompletionStream, QueryError> {
            Err(QueryError::Generation("not streamed in tests".to_string()))
        }
    }

    #[test]
    fn keyword_list_is_lowercased_and_trimmed() {
        let parsed = parse_keyword_list(" Seed Fund ,  FinTech,, SIDBI ,");
        assert_eq!(parsed, vec!["seed fund", "fintech", "sidbi"]);
    }

    #[test]
    fn empty_reply_parses_to_empty_list() {
        assert!(parse_keyword_list("").is_empty());
        assert!(parse_keyword_list(" , , ").is_empty());
    }

    #[tokio::test]
    async fn service_reply_becomes_keyword_list() {
        let generator = CannedGenerator {
            reply: Ok("Startup India, seed funding, incubators"),
        };
        let keywords = synthesize_keywords(&generator, "some chunk text").await;
        assert_eq!(keywords, vec!["startup india", "seed funding", "incubators"]);
    }

    #[tokio::test]
    async fn service_failure_degrades_to_empty_list() {
        let generator = CannedGenerator { reply: Err(()) };
        let keywords = synthesize_keywords(&generator, "some chunk text").await;
        assert!(keywords.is_empty());
    }

    #[tokio::test]
    async fn input_is_truncated_before_sending() {
        struct LengthProbe;

        #[async_trait]
        impl TextGenerator for LengthProbe {
            async fn complete(&self, messages: &[ChatMessage]) -> Result<String, QueryError> {
                assert!(messages[0].content.chars().count() < KEYWORD_INPUT_CHARS + 200);
                Ok("keyword".to_string())
            }

            async fn stream(
                &self,
                _messages: &[ChatMessage],
            ) -> Result<CompletionStream, QueryError> {
                Err(QueryError::Generation("not streamed in tests".to_string()))
            }
        }

        let long_text = "funding ".repeat(2_000);
        let keywords = synthesize_keywords(&LengthProbe, &long_text).await;
        assert_eq!(keywords, vec!["keyword"]);
    }
}
