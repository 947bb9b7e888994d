use super::chunker::TextChunker;
use super::prompts::{NoteRequestBuilder, NoteStyle, PromptLibrary};
use crate::llm::{ChatMessage, LLM};
use std::sync::Arc;
use tracing::{debug, warn};

/// Marker line recorded in place of a chunk whose generation call failed,
/// so a degraded note is distinguishable from one with nothing to say.
pub const FAILED_CHUNK_MARKER: &str =
    "> [note generation failed for this part of the transcript]";

/// Outcome of one chunk's generation call.
#[derive(Debug, Clone)]
pub enum ChunkOutcome {
    Generated(String),
    Failed(String),
}

impl ChunkOutcome {
    fn rendered(&self) -> &str {
        match self {
            ChunkOutcome::Generated(text) => text,
            ChunkOutcome::Failed(_) => FAILED_CHUNK_MARKER,
        }
    }
}

/// The generated note for one section.
#[derive(Debug, Clone)]
pub struct SectionNote {
    /// Per-chunk outputs joined with blank-line separators, chunk order
    /// preserved. Empty when the transcript was empty or every chunk failed.
    pub text: String,
    pub chunk_count: usize,
    pub failed_chunks: usize,
}

impl SectionNote {
    /// An empty note is a soft failure, not "nothing to say"
    pub fn is_soft_failure(&self) -> bool {
        self.chunk_count > 0 && self.failed_chunks == self.chunk_count
    }
}

/// Drives chunking, prompt building, and per-chunk generation calls for one
/// section's transcript.
pub struct SectionNoteGenerator {
    chunker: TextChunker,
    builder: NoteRequestBuilder,
    llm: Arc<dyn LLM>,
    style: NoteStyle,
}

impl SectionNoteGenerator {
    pub fn new(
        llm: Arc<dyn LLM>,
        library: PromptLibrary,
        style: NoteStyle,
        chunk_token_budget: usize,
    ) -> Self {
        Self {
            chunker: TextChunker::new(chunk_token_budget),
            builder: NoteRequestBuilder::new(library),
            llm,
            style,
        }
    }

    /// Generate the note for one transcript. Chunks are processed strictly
    /// in order with one in-flight request; a failed chunk is caught,
    /// logged, and recorded as a marker so its siblings still contribute.
    pub async fn generate_section_note(&self, transcript: &str) -> SectionNote {
        let chunks = self.chunker.chunk(transcript);
        let chunk_count = chunks.len();
        debug!("Transcript split into {} chunks", chunk_count);

        let mut outcomes: Vec<ChunkOutcome> = Vec::with_capacity(chunk_count);
        for (index, chunk) in chunks.iter().enumerate() {
            outcomes.push(self.generate_chunk(index, chunk_count, chunk).await);
        }

        let failed_chunks = outcomes
            .iter()
            .filter(|o| matches!(o, ChunkOutcome::Failed(_)))
            .count();

        // All chunks failed: surface nothing rather than a page of markers
        let text = if chunk_count > 0 && failed_chunks == chunk_count {
            String::new()
        } else {
            outcomes
                .iter()
                .map(ChunkOutcome::rendered)
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        SectionNote {
            text,
            chunk_count,
            failed_chunks,
        }
    }

    async fn generate_chunk(&self, index: usize, total: usize, chunk: &str) -> ChunkOutcome {
        let (system, user) = self.builder.build(chunk, self.style);
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];

        match self.llm.chat(messages).await {
            Ok(response) => {
                debug!(
                    "Chunk {}/{} generated ({} chars, tokens: {:?})",
                    index + 1,
                    total,
                    response.content.len(),
                    response.tokens_used
                );
                ChunkOutcome::Generated(response.content)
            }
            Err(e) => {
                warn!("⚠️ Chunk {}/{} generation failed: {}", index + 1, total, e);
                ChunkOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMResponse;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns the user message content unchanged.
    struct EchoLLM {
        calls: AtomicUsize,
    }

    impl EchoLLM {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LLM for EchoLLM {
        async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let user = messages
                .iter()
                .find(|m| m.role == "user")
                .expect("user message");
            Ok(LLMResponse {
                content: user.content.clone(),
                tokens_used: None,
            })
        }
    }

    /// Fails on the chunk indices listed; echoes otherwise.
    struct FlakyLLM {
        calls: AtomicUsize,
        fail_on: Vec<usize>,
    }

    #[async_trait]
    impl LLM for FlakyLLM {
        async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&call) {
                return Err(anyhow!("transport error"));
            }
            let user = messages.iter().find(|m| m.role == "user").unwrap();
            Ok(LLMResponse {
                content: user.content.clone(),
                tokens_used: None,
            })
        }
    }

    fn echo_generator(llm: Arc<dyn LLM>, budget: usize) -> SectionNoteGenerator {
        SectionNoteGenerator::new(
            llm,
            crate::notes::prompts::passthrough_library(),
            NoteStyle::Cleaner,
            budget,
        )
    }

    #[tokio::test]
    async fn test_end_to_end_two_chunk_example() {
        let llm = Arc::new(EchoLLM::new());
        let generator = echo_generator(llm.clone(), 6);

        let note = generator.generate_section_note("this cache is great").await;

        assert_eq!(note.text, "this cache\n\nis great");
        assert_eq!(note.chunk_count, 2);
        assert_eq!(note.failed_chunks, 0);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_order_preserved() {
        let llm = Arc::new(EchoLLM::new());
        // budget 3 fits exactly one short word per chunk
        let generator = echo_generator(llm, 3);

        let note = generator.generate_section_note("aa bb cc").await;
        assert_eq!(note.text, "aa\n\nbb\n\ncc");
    }

    #[tokio::test]
    async fn test_partial_failure_isolated_to_one_chunk() {
        let llm = Arc::new(FlakyLLM {
            calls: AtomicUsize::new(0),
            fail_on: vec![1], // second chunk
        });
        let generator = echo_generator(llm, 3);

        let note = generator.generate_section_note("aa bb cc").await;

        assert_eq!(
            note.text,
            format!("aa\n\n{}\n\ncc", FAILED_CHUNK_MARKER)
        );
        assert_eq!(note.failed_chunks, 1);
        assert!(!note.is_soft_failure());
    }

    #[tokio::test]
    async fn test_all_chunks_failed_is_soft_failure() {
        let llm = Arc::new(FlakyLLM {
            calls: AtomicUsize::new(0),
            fail_on: vec![0, 1, 2],
        });
        let generator = echo_generator(llm, 3);

        let note = generator.generate_section_note("aa bb cc").await;

        assert!(note.text.is_empty());
        assert!(note.is_soft_failure());
    }

    #[tokio::test]
    async fn test_empty_transcript_makes_no_calls() {
        let llm = Arc::new(EchoLLM::new());
        let generator = echo_generator(llm.clone(), 10);

        let note = generator.generate_section_note("").await;

        assert!(note.text.is_empty());
        assert_eq!(note.chunk_count, 0);
        assert!(!note.is_soft_failure());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }
}
