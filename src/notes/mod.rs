pub mod chunker;
pub mod generator;
pub mod orchestrator;
pub mod prompts;

pub use chunker::TextChunker;
pub use generator::{ChunkOutcome, SectionNote, SectionNoteGenerator};
pub use orchestrator::{CourseNoteOrchestrator, StageReport, AGGREGATE_FILENAME};
pub use prompts::{NoteRequestBuilder, NoteStyle, PromptLibrary, PromptSet};
