/// Splits long transcripts into chunks that fit a generation-service token
/// budget. Boundaries fall only between words, order is preserved, and
/// re-joining the chunks reproduces the original word sequence.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_tokens: usize,
}

impl TextChunker {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    /// Estimate the token cost of a single word: roughly three characters
    /// per token, plus one for the separating whitespace.
    fn estimate_tokens(word: &str) -> usize {
        word.chars().count().div_ceil(3) + 1
    }

    /// Greedily accumulate words into chunks whose running token estimate
    /// stays within the budget. A single word that alone exceeds the budget
    /// still gets its own chunk; it is never dropped or split mid-word.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_cost = 0usize;

        for word in text.split_whitespace() {
            let cost = Self::estimate_tokens(word);
            if !current.is_empty() && current_cost + cost > self.max_tokens {
                chunks.push(current.join(" "));
                current.clear();
                current_cost = 0;
            }
            current.push(word);
            current_cost += cost;
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunker = TextChunker::new(100);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn test_reconstruction_preserves_word_sequence() {
        let text = "the quick brown fox jumps over the lazy dog and keeps going";
        for budget in [1, 3, 5, 10, 100] {
            let chunker = TextChunker::new(budget);
            let chunks = chunker.chunk(text);
            let rejoined = chunks.join(" ");
            let expected: Vec<&str> = text.split_whitespace().collect();
            let actual: Vec<&str> = rejoined.split_whitespace().collect();
            assert_eq!(actual, expected, "budget {}", budget);
        }
    }

    #[test]
    fn test_chunks_respect_budget() {
        let text = "one two three four five six seven eight nine ten";
        let budget = 7;
        let chunker = TextChunker::new(budget);
        for chunk in chunker.chunk(text) {
            let cost: usize = chunk
                .split_whitespace()
                .map(TextChunker::estimate_tokens)
                .sum();
            assert!(cost <= budget, "chunk {:?} cost {}", chunk, cost);
        }
    }

    #[test]
    fn test_oversized_word_gets_own_chunk() {
        let chunker = TextChunker::new(2);
        let chunks = chunker.chunk("tiny incomprehensibilities tiny");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], "incomprehensibilities");
    }

    #[test]
    fn test_two_word_split_example() {
        // "this"=3, "cache"=3, "is"=2, "great"=3; budget 6 forces two
        // chunks of two words each
        let chunker = TextChunker::new(6);
        assert_eq!(
            chunker.chunk("this cache is great"),
            vec!["this cache".to_string(), "is great".to_string()]
        );
    }

    #[test]
    fn test_deterministic() {
        let chunker = TextChunker::new(12);
        let text = "lectures are long and transcripts are even longer than that";
        assert_eq!(chunker.chunk(text), chunker.chunk(text));
    }
}
