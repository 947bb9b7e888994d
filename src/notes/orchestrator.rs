use super::generator::{SectionNote, SectionNoteGenerator};
use crate::course::{section_base_name, sorted_files, write_atomic};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Reserved aggregate filename; always excluded from re-aggregation input.
pub const AGGREGATE_FILENAME: &str = "complete_notes.md";

/// Per-stage counters reported at the end of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Drives note generation for every section of a course and aggregates the
/// persisted notes into one course-level document.
pub struct CourseNoteOrchestrator {
    generator: Arc<SectionNoteGenerator>,
    worker_semaphore: Arc<Semaphore>,
}

impl CourseNoteOrchestrator {
    pub fn new(generator: SectionNoteGenerator, workers: usize) -> Self {
        Self {
            generator: Arc::new(generator),
            worker_semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Generate one note per transcript section, then aggregate. Sections
    /// whose note file already exists are skipped entirely, which makes the
    /// stage idempotent and safe to re-invoke after a crash or quota
    /// exhaustion.
    pub async fn generate_course_notes(
        &self,
        transcript_dir: &Path,
        note_dir: &Path,
        course_name: &str,
    ) -> Result<StageReport> {
        tokio::fs::create_dir_all(note_dir).await?;

        let transcripts = sorted_files(transcript_dir).await?;
        info!("📝 Found {} transcript sections", transcripts.len());

        let mut report = StageReport::default();
        let mut pending: Vec<(PathBuf, PathBuf, String)> = Vec::new();

        for transcript_path in transcripts {
            let base_name = section_base_name(&transcript_path)?;
            let note_path = note_dir.join(format!("{}.md", base_name));

            if note_path.exists() {
                debug!("⏭️ Note already exists, skipping section: {}", base_name);
                report.skipped += 1;
                continue;
            }

            pending.push((transcript_path, note_path, base_name));
        }

        let outcomes = self.generate_sections(pending).await;
        for succeeded in outcomes {
            if succeeded {
                report.processed += 1;
            } else {
                report.failed += 1;
            }
        }

        self.aggregate_notes(note_dir, course_name).await?;

        info!(
            "📝 Note stage: {} generated, {} skipped, {} failed",
            report.processed, report.skipped, report.failed
        );
        Ok(report)
    }

    /// Process pending sections under the worker pool. Chunks within a
    /// section stay strictly sequential; only whole sections overlap, and
    /// note files are written atomically, so resumability is unaffected.
    async fn generate_sections(&self, pending: Vec<(PathBuf, PathBuf, String)>) -> Vec<bool> {
        let total = pending.len();
        let mut handles = Vec::with_capacity(total);

        for (index, (transcript_path, note_path, base_name)) in pending.into_iter().enumerate() {
            let generator = Arc::clone(&self.generator);
            let semaphore = Arc::clone(&self.worker_semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return false,
                };

                info!("📝 Generating note {}/{}: {}", index + 1, total, base_name);
                process_section(&generator, &transcript_path, &note_path, &base_name).await
            }));
        }

        futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap_or(false))
            .collect()
    }

    /// Build the course-level document from the persisted note files. Always
    /// re-reads from disk, never from in-memory results, so the aggregate
    /// reflects the true state across multiple partial runs.
    pub async fn aggregate_notes(&self, note_dir: &Path, course_name: &str) -> Result<()> {
        let mut sections = Vec::new();

        for note_path in sorted_files(note_dir).await? {
            let file_name = note_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            // Only section notes are aggregated; the aggregate must never
            // ingest its own previous content, and the note directory also
            // holds the run summary JSON
            if file_name == AGGREGATE_FILENAME || !file_name.ends_with(".md") {
                continue;
            }

            match tokio::fs::read_to_string(&note_path).await {
                Ok(content) => sections.push(content.trim_end().to_string()),
                Err(e) => warn!("Failed to read note {}: {}", note_path.display(), e),
            }
        }

        let document = format!(
            "# {} Course Notes\n\n{}\n",
            course_name,
            sections.join("\n\n")
        );

        let aggregate_path = note_dir.join(AGGREGATE_FILENAME);
        write_atomic(&aggregate_path, &document).await?;

        info!(
            "📚 Aggregated {} section notes into {}",
            sections.len(),
            aggregate_path.display()
        );
        Ok(())
    }
}

/// Generate and persist one section's note. Returns false on failure so the
/// caller can count it; the error never propagates past the section. An
/// all-chunks-failed note is not written, so a re-run retries the section.
async fn process_section(
    generator: &SectionNoteGenerator,
    transcript_path: &Path,
    note_path: &Path,
    base_name: &str,
) -> bool {
    let transcript = match tokio::fs::read_to_string(transcript_path).await {
        Ok(text) => text,
        Err(e) => {
            warn!("⚠️ Cannot read transcript for {}: {}", base_name, e);
            return false;
        }
    };

    let note: SectionNote = generator.generate_section_note(&transcript).await;

    if note.is_soft_failure() {
        warn!(
            "⚠️ All {} chunks failed for section {}; note not written",
            note.chunk_count, base_name
        );
        return false;
    }

    if note.failed_chunks > 0 {
        warn!(
            "⚠️ Section {} degraded: {}/{} chunks failed",
            base_name, note.failed_chunks, note.chunk_count
        );
    }

    match write_atomic(note_path, &note.text).await {
        Ok(()) => {
            info!("✅ Note written: {}", note_path.display());
            true
        }
        Err(e) => {
            warn!("⚠️ Failed to write note for {}: {}", base_name, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, LLMResponse, LLM};
    use crate::notes::prompts::{passthrough_library, NoteStyle};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct EchoLLM {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LLM for EchoLLM {
        async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let user = messages.iter().find(|m| m.role == "user").unwrap();
            Ok(LLMResponse {
                content: user.content.clone(),
                tokens_used: None,
            })
        }
    }

    fn orchestrator(calls: Arc<AtomicUsize>) -> CourseNoteOrchestrator {
        let generator = SectionNoteGenerator::new(
            Arc::new(EchoLLM { calls }),
            passthrough_library(),
            NoteStyle::Cleaner,
            100,
        );
        CourseNoteOrchestrator::new(generator, 2)
    }

    async fn seed_transcripts(dir: &Path) {
        tokio::fs::create_dir_all(dir).await.unwrap();
        tokio::fs::write(dir.join("01_intro.txt"), "intro lecture")
            .await
            .unwrap();
        tokio::fs::write(dir.join("02_main.txt"), "main lecture")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_generates_notes_and_aggregate() {
        let tmp = TempDir::new().unwrap();
        let transcript_dir = tmp.path().join("Transcript");
        let note_dir = tmp.path().join("Note");
        seed_transcripts(&transcript_dir).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let report = orchestrator(calls.clone())
            .generate_course_notes(&transcript_dir, &note_dir, "Algebra")
            .await
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped, 0);

        let intro = tokio::fs::read_to_string(note_dir.join("01_intro.md"))
            .await
            .unwrap();
        assert_eq!(intro, "intro lecture");

        let aggregate = tokio::fs::read_to_string(note_dir.join(AGGREGATE_FILENAME))
            .await
            .unwrap();
        assert_eq!(
            aggregate,
            "# Algebra Course Notes\n\nintro lecture\n\nmain lecture\n"
        );
    }

    #[tokio::test]
    async fn test_second_run_skips_all_sections() {
        let tmp = TempDir::new().unwrap();
        let transcript_dir = tmp.path().join("Transcript");
        let note_dir = tmp.path().join("Note");
        seed_transcripts(&transcript_dir).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let orch = orchestrator(calls.clone());
        orch.generate_course_notes(&transcript_dir, &note_dir, "Algebra")
            .await
            .unwrap();
        let first_aggregate = tokio::fs::read_to_string(note_dir.join(AGGREGATE_FILENAME))
            .await
            .unwrap();
        let calls_after_first = calls.load(Ordering::SeqCst);

        let report = orch
            .generate_course_notes(&transcript_dir, &note_dir, "Algebra")
            .await
            .unwrap();

        // Zero generation calls on the second run
        assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.processed, 0);

        let second_aggregate = tokio::fs::read_to_string(note_dir.join(AGGREGATE_FILENAME))
            .await
            .unwrap();
        assert_eq!(first_aggregate, second_aggregate);
    }

    #[tokio::test]
    async fn test_aggregate_excludes_its_previous_content() {
        let tmp = TempDir::new().unwrap();
        let transcript_dir = tmp.path().join("Transcript");
        let note_dir = tmp.path().join("Note");
        seed_transcripts(&transcript_dir).await;
        tokio::fs::create_dir_all(&note_dir).await.unwrap();
        tokio::fs::write(note_dir.join(AGGREGATE_FILENAME), "STALE AGGREGATE")
            .await
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        orchestrator(calls)
            .generate_course_notes(&transcript_dir, &note_dir, "Algebra")
            .await
            .unwrap();

        let aggregate = tokio::fs::read_to_string(note_dir.join(AGGREGATE_FILENAME))
            .await
            .unwrap();
        assert!(!aggregate.contains("STALE AGGREGATE"));
        assert!(aggregate.starts_with("# Algebra Course Notes\n"));
    }

    #[tokio::test]
    async fn test_partially_seeded_note_dir_only_generates_missing() {
        let tmp = TempDir::new().unwrap();
        let transcript_dir = tmp.path().join("Transcript");
        let note_dir = tmp.path().join("Note");
        seed_transcripts(&transcript_dir).await;
        tokio::fs::create_dir_all(&note_dir).await.unwrap();
        tokio::fs::write(note_dir.join("01_intro.md"), "hand-written note")
            .await
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let report = orchestrator(calls)
            .generate_course_notes(&transcript_dir, &note_dir, "Algebra")
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.processed, 1);

        // Existing note untouched, aggregate in filename order
        let aggregate = tokio::fs::read_to_string(note_dir.join(AGGREGATE_FILENAME))
            .await
            .unwrap();
        assert_eq!(
            aggregate,
            "# Algebra Course Notes\n\nhand-written note\n\nmain lecture\n"
        );
    }
}
