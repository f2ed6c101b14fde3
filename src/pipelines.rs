//! Single-purpose text pipelines: summarization, continuation, star-rating sentiment
//!
//! Each pipeline is one prompt over a [`ChatModel`]; the post-processing
//! (word limits, label normalization) is done here so results are bounded
//! regardless of how the model behaves.

use serde_json::Value;
use tracing::debug;

use crate::llm::{extract_json, ChatModel, LlmError, Message, Result};

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub text: String,
    pub original_words: usize,
    pub summary_words: usize,
}

/// Summarize `text` in roughly `min_words..=max_words` words; longer replies are cut at `max_words`
pub async fn summarize(
    model: &dyn ChatModel,
    text: &str,
    min_words: usize,
    max_words: usize,
) -> Result<Summary> {
    let prompt = format!(
        "Summarize the following text in between {} and {} words. \
         Reply with the summary only.\n\n{}",
        min_words, max_words, text
    );
    let reply = model.invoke(&[Message::user(prompt)], &[]).await?;
    let summary = truncate_words(&reply.content, max_words);
    Ok(Summary {
        original_words: word_count(text),
        summary_words: word_count(&summary),
        text: summary,
    })
}

/// `num_sequences` continuations of `prompt`, each starting with the prompt verbatim
pub async fn generate(
    model: &dyn ChatModel,
    prompt: &str,
    num_sequences: usize,
    max_new_words: usize,
) -> Result<Vec<String>> {
    let request = format!(
        "Continue the following text with at most {} more words. \
         Reply with the continuation only.\n\n{}",
        max_new_words, prompt
    );

    let mut sequences = Vec::with_capacity(num_sequences);
    for i in 0..num_sequences {
        let reply = model.invoke(&[Message::user(request.as_str())], &[]).await?;
        let continuation = reply.content.trim();
        let continuation = continuation.strip_prefix(prompt.trim()).unwrap_or(continuation);
        let continuation = truncate_words(continuation, max_new_words);
        debug!("Sequence {} has {} new words", i + 1, word_count(&continuation));

        let separator = match prompt.chars().last() {
            Some(last) if !last.is_whitespace() && !continuation.is_empty() => " ",
            _ => "",
        };
        sequences.push(format!("{}{}{}", prompt, separator, continuation));
    }
    Ok(sequences)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sentiment {
    /// "1 star" through "5 stars"
    pub label: String,
    /// Confidence in [0, 1]
    pub score: f64,
}

impl Sentiment {
    pub fn new(stars: u8, score: f64) -> Self {
        let stars = stars.clamp(1, 5);
        Self {
            label: if stars == 1 {
                "1 star".to_string()
            } else {
                format!("{} stars", stars)
            },
            score: score.clamp(0.0, 1.0),
        }
    }
}

const SENTIMENT_PROMPT: &str = "Rate the sentiment of the review below on a scale of 1 to 5 stars, \
where 1 is very negative and 5 is very positive. Reply with a JSON object \
{\"stars\": <integer 1-5>, \"confidence\": <number between 0 and 1>} and nothing else.";

fn parse_sentiment(reply: &str) -> Result<Sentiment> {
    let value = extract_json(reply)?;
    let stars = value
        .get("stars")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| LlmError::MissingField("stars".to_string()))?;
    let confidence = value.get("confidence").and_then(Value::as_f64).unwrap_or(1.0);
    Ok(Sentiment::new(stars.round().clamp(1.0, 5.0) as u8, confidence))
}

/// One rating per review, in order
pub async fn classify_sentiment(
    model: &dyn ChatModel,
    reviews: &[String],
) -> Result<Vec<Sentiment>> {
    let mut results = Vec::with_capacity(reviews.len());
    for review in reviews {
        let messages = [Message::system(SENTIMENT_PROMPT), Message::user(review.as_str())];
        let reply = model.invoke(&messages, &[]).await?;
        results.push(parse_sentiment(&reply.content)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_summary_is_capped() {
        let model = ScriptedModel::new("scripted").reply("one two three four five six");
        let summary = summarize(&model, "a b c d e f g h i j", 2, 4).await.unwrap();
        assert_eq!(summary.text, "one two three four");
        assert_eq!(summary.original_words, 10);
        assert_eq!(summary.summary_words, 4);
        assert!(model.requests()[0].last_user_text().unwrap().contains("between 2 and 4 words"));
    }

    #[tokio::test]
    async fn test_generate_prefixes_prompt() {
        let model = ScriptedModel::new("scripted")
            .reply("towards smarter tools for everyone")
            .reply("The AI boom has led to a shift in hiring");
        let out = generate(&model, "The AI boom has led to a shift", 2, 3).await.unwrap();
        assert_eq!(
            out,
            vec![
                "The AI boom has led to a shift towards smarter tools",
                "The AI boom has led to a shift in hiring",
            ]
        );
    }

    #[tokio::test]
    async fn test_generate_keeps_prompt_verbatim() {
        let model = ScriptedModel::new("scripted")
            .reply("there was a lighthouse.")
            .reply("");
        let out = generate(&model, "Once upon a time  ", 2, 10).await.unwrap();
        assert_eq!(
            out,
            vec![
                "Once upon a time  there was a lighthouse.",
                "Once upon a time  ",
            ]
        );
    }

    #[tokio::test]
    async fn test_sentiment_labels() {
        let model = ScriptedModel::new("scripted")
            .reply(r#"{"stars": 5, "confidence": 0.91}"#)
            .reply("```json\n{\"stars\": 1, \"confidence\": 1.7}\n```")
            .reply(r#"{"stars": 3}"#);
        let reviews = vec!["great".to_string(), "awful".to_string(), "fine".to_string()];
        let results = classify_sentiment(&model, &reviews).await.unwrap();
        assert_eq!(results[0], Sentiment::new(5, 0.91));
        assert_eq!(results[0].label, "5 stars");
        assert_eq!(results[1].label, "1 star");
        assert_eq!(results[1].score, 1.0);
        assert_eq!(results[2].label, "3 stars");
    }

    #[tokio::test]
    async fn test_sentiment_needs_stars() {
        let model = ScriptedModel::new("scripted").reply(r#"{"mood": "happy"}"#);
        let err = classify_sentiment(&model, &["ok".to_string()]).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingField(f) if f == "stars"));
    }
}
