//! Sentence-aligned chunking under a word budget.
//!
//! Documents are split into sentences first, then sentences are greedily
//! packed into chunks of at most [`MAX_WORD_COUNT`] whitespace-delimited
//! words. Sentences are never split: a single sentence longer than the
//! budget becomes its own oversized chunk.

use unicode_segmentation::UnicodeSegmentation;

/// Default word budget per chunk.
pub const MAX_WORD_COUNT: usize = 400;

/// Tuning knobs for the chunker.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum whitespace-delimited words per chunk.
    pub max_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_words: MAX_WORD_COUNT,
        }
    }
}

/// Segments text into trimmed, non-empty sentences (UAX#29 boundaries).
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Splits plain text into an ordered sequence of sentence-aligned chunks.
///
/// Pure function of its input: the emission position of each chunk is its
/// chunk index. Empty or whitespace-only input yields no chunks.
pub fn split_into_chunks(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut accumulator: Vec<&str> = Vec::new();
    let mut word_count = 0usize;

    for sentence in split_sentences(text) {
        let words = sentence.split_whitespace().count();
        if words == 0 {
            continue;
        }

        if word_count + words > config.max_words && !accumulator.is_empty() {
            chunks.push(accumulator.join(" "));
            accumulator.clear();
            accumulator.push(sentence);
            word_count = words;
        } else {
            accumulator.push(sentence);
            word_count += words;
        }
    }

    if !accumulator.is_empty() {
        chunks.push(accumulator.join(" "));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_count(chunk: &str) -> usize {
        chunk.split_whitespace().count()
    }

    #[test]
    fn short_sentences_share_one_chunk() {
        let chunks = split_into_chunks(
            "Cats are mammals. Dogs are mammals too.",
            &ChunkingConfig::default(),
        );
        assert_eq!(chunks, vec!["Cats are mammals. Dogs are mammals too."]);
    }

    #[test]
    fn breaks_before_exceeding_the_word_budget() {
        // Ten sentences of exactly 100 words each against a budget of 400
        // must pack as 4 + 4 + 2 sentences.
        let sentence = {
            let mut words = String::from("Start");
            for _ in 0..98 {
                words.push_str(" word");
            }
            words.push_str(" end.");
            words
        };
        let text = vec![sentence.clone(); 10].join(" ");

        let chunks = split_into_chunks(&text, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 3);
        assert_eq!(word_count(&chunks[0]), 400);
        assert_eq!(word_count(&chunks[1]), 400);
        assert_eq!(word_count(&chunks[2]), 200);
    }

    #[test]
    fn oversized_sentence_becomes_its_own_chunk() {
        let long_sentence = {
            let mut words = String::from("Very");
            for _ in 0..18 {
                words.push_str(" word");
            }
            words.push_str(" end.");
            words
        };
        let text = format!("Short one. {long_sentence} Short two.");

        let config = ChunkingConfig { max_words: 10 };
        let chunks = split_into_chunks(&text, &config);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "Short one.");
        assert_eq!(word_count(&chunks[1]), 20);
        assert_eq!(chunks[2], "Short two.");
    }

    #[test]
    fn no_chunk_is_empty_and_sentences_are_preserved_in_order() {
        let text = "One two three. Four five six seven. Eight nine. Ten.\n\nEleven twelve.";
        let config = ChunkingConfig { max_words: 5 };
        let chunks = split_into_chunks(text, &config);

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(!chunk.trim().is_empty());
        }

        // Concatenating all chunks reproduces every sentence in order.
        let rejoined = chunks.join(" ");
        let original: Vec<&str> = split_sentences(text);
        let reproduced: Vec<&str> = split_sentences(&rejoined);
        assert_eq!(original, reproduced);
    }

    #[test]
    fn cumulative_words_respect_budget_except_oversized_sentences() {
        let text = "Alpha beta gamma. Delta epsilon. Zeta eta theta iota kappa lambda mu. Nu xi.";
        let config = ChunkingConfig { max_words: 6 };
        for chunk in split_into_chunks(text, &config) {
            let words = word_count(&chunk);
            let sentences = split_sentences(&chunk).len();
            assert!(
                words <= config.max_words || sentences == 1,
                "chunk exceeds budget without being a single sentence: {chunk:?}"
            );
        }
    }

    #[test]
    fn empty_and_whitespace_input_yield_no_chunks() {
        let config = ChunkingConfig::default();
        assert!(split_into_chunks("", &config).is_empty());
        assert!(split_into_chunks(" \n\t ", &config).is_empty());
    }
}
