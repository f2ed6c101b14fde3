//! Console front ends for the text pipelines

use anyhow::Result;

use super::Workbench;
use crate::pipelines::{classify_sentiment, generate as generate_text, summarize as summarize_text};

const MOVIE_REVIEWS: usize = 5;

async fn require_line(bench: &Workbench, prompt: &str) -> Result<String> {
    bench
        .read_line(prompt)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Input ended before a line was entered"))
}

pub async fn summarize(bench: &Workbench) -> Result<()> {
    let original =
        require_line(bench, "Enter a paragraph which you want to be summarized: ").await?;
    let cfg = &bench.config.pipelines;
    let model = bench.chat_model(&bench.config.models.gemini_lite);

    let summary = summarize_text(
        model.as_ref(),
        &original,
        cfg.summary_min_words,
        cfg.summary_max_words,
    )
    .await?;
    bench.say(&format!("\n\nSummary: {}", summary.text));
    bench.say(&format!("\nLength of original text: {}", summary.original_words));
    bench.say(&format!("\nLength of summary text: {}", summary.summary_words));
    Ok(())
}

pub async fn generate(bench: &Workbench) -> Result<()> {
    let starting_line = require_line(
        bench,
        "Enter a starting line for the text you want the model to generate: ",
    )
    .await?;
    let cfg = &bench.config.pipelines;
    let model = bench.chat_model(&bench.config.models.gemini_lite);

    let outputs = generate_text(
        model.as_ref(),
        &starting_line,
        cfg.num_sequences,
        cfg.max_new_words,
    )
    .await?;
    for (i, text) in outputs.iter().enumerate() {
        bench.say(&format!("\nGenerated Text {} : {}", i + 1, text));
    }
    Ok(())
}

pub async fn sentiment(bench: &Workbench) -> Result<()> {
    let mut reviews = Vec::with_capacity(MOVIE_REVIEWS);
    for i in 1..=MOVIE_REVIEWS {
        let prompt = if i == 1 {
            format!("Enter movie {}'s review: ", i)
        } else {
            format!("\nEnter movie {}'s review: ", i)
        };
        reviews.push(require_line(bench, &prompt).await?);
    }

    let model = bench.chat_model(&bench.config.models.gemini_lite);
    let results = classify_sentiment(model.as_ref(), &reviews).await?;
    for (i, result) in results.iter().enumerate() {
        bench.say(&format!("\nMovie Review {}:", i + 1));
        bench.say(&format!("  Predicted Label: {}", result.label));
        bench.say(&format!("  Confidence Score: {:.4}", result.score));
    }
    Ok(())
}
