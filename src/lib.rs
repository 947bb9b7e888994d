/// Course Notes Pipeline - Rust Implementation
///
/// Converts recorded lecture videos into structured study notes through a
/// resumable four-stage pipeline: audio extraction, speech transcription,
/// chunked LLM note generation, and course-level aggregation.

pub mod audio;
pub mod config;
pub mod course;
pub mod error;
pub mod llm;
pub mod notes;
pub mod processing;
pub mod transcription;

// Re-export main types for easy access
pub use crate::audio::{AudioExtractor, AudioInfo};
pub use crate::config::Config;
pub use crate::course::CourseLayout;
pub use crate::error::PipelineError;
pub use crate::llm::{LLMConfig, OpenAIChatClient, LLM};
pub use crate::notes::{
    CourseNoteOrchestrator, NoteRequestBuilder, NoteStyle, PromptLibrary, SectionNoteGenerator,
    TextChunker, AGGREGATE_FILENAME,
};
pub use crate::processing::{CoursePipeline, PipelineReport};
pub use crate::transcription::{Transcriber, XunfeiTranscriber};
