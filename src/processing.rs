use crate::audio::AudioExtractor;
use crate::config::Config;
use crate::course::{
    section_base_name, sorted_files, sorted_files_with_extensions, write_atomic, CourseLayout,
};
use crate::error::PipelineError;
use crate::llm::{create_llm, LLM};
use crate::notes::{CourseNoteOrchestrator, PromptLibrary, SectionNoteGenerator, StageReport};
use crate::transcription::{Transcriber, XunfeiTranscriber};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Summary of one pipeline run, persisted next to the notes as
/// `processing_summary.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub course: String,
    pub extraction: StageReport,
    pub transcription: StageReport,
    pub notes: StageReport,
}

/// Sequences the course pipeline: audio extraction → transcription → note
/// generation, each stage gated on the previous stage's outputs. Every
/// stage skips units whose output already exists, so a partially completed
/// course can be re-run without redoing finished work.
pub struct CoursePipeline {
    config: Config,
    audio_extractor: AudioExtractor,
    transcriber: Arc<dyn Transcriber>,
    note_orchestrator: CourseNoteOrchestrator,
}

impl CoursePipeline {
    /// Build the pipeline with its real collaborators. The configuration
    /// must already be validated.
    pub fn new(config: Config) -> Result<Self> {
        let transcriber: Arc<dyn Transcriber> =
            Arc::new(XunfeiTranscriber::new(config.speech.clone())?);
        let llm: Arc<dyn LLM> = Arc::from(create_llm(&config.llm)?);
        Self::with_collaborators(config, transcriber, llm)
    }

    /// Build the pipeline with injected collaborators (used by tests)
    pub fn with_collaborators(
        config: Config,
        transcriber: Arc<dyn Transcriber>,
        llm: Arc<dyn LLM>,
    ) -> Result<Self> {
        let style = config.note_style()?;
        let generator = SectionNoteGenerator::new(
            llm,
            PromptLibrary::builtin(),
            style,
            config.notes.chunk_token_budget,
        );
        let note_orchestrator = CourseNoteOrchestrator::new(generator, config.notes.workers);

        Ok(Self {
            audio_extractor: AudioExtractor::new(config.audio.target_format.clone()),
            transcriber,
            note_orchestrator,
            config,
        })
    }

    /// Run the full pipeline for the configured course.
    pub async fn run(&self) -> Result<PipelineReport> {
        let layout = CourseLayout::new(&self.config.course.root_dir, &self.config.course.name);
        layout.ensure_directories().await?;

        info!("🚀 Processing course: {}", layout.name);

        let mut report = PipelineReport {
            course: layout.name.clone(),
            ..PipelineReport::default()
        };

        // The whole pipeline is gated on videos being present
        let videos = sorted_files_with_extensions(
            &layout.playback_dir,
            &self.config.audio.supported_extensions,
        )
        .await?;
        if videos.is_empty() {
            warn!(
                "{}",
                PipelineError::StageInputMissing {
                    stage: "audio extraction".to_string(),
                    dir: layout.playback_dir.clone(),
                }
            );
            self.save_summary(&layout, &report).await;
            return Ok(report);
        }

        info!("📹 Found {} lecture videos", videos.len());
        report.extraction = self.extract_stage(&layout, &videos).await;

        let soundtracks = sorted_files(&layout.soundtrack_dir).await?;
        if soundtracks.is_empty() {
            warn!(
                "{}",
                PipelineError::StageInputMissing {
                    stage: "transcription".to_string(),
                    dir: layout.soundtrack_dir.clone(),
                }
            );
            self.save_summary(&layout, &report).await;
            return Ok(report);
        }

        report.transcription = self.transcribe_stage(&layout, &soundtracks).await;

        let transcripts = sorted_files(&layout.transcript_dir).await?;
        if transcripts.is_empty() {
            warn!(
                "{}",
                PipelineError::StageInputMissing {
                    stage: "note generation".to_string(),
                    dir: layout.transcript_dir.clone(),
                }
            );
            self.save_summary(&layout, &report).await;
            return Ok(report);
        }

        report.notes = self
            .note_orchestrator
            .generate_course_notes(&layout.transcript_dir, &layout.note_dir, &layout.name)
            .await?;

        self.save_summary(&layout, &report).await;

        info!("🎉 Course processed: {}", layout.name);
        Ok(report)
    }

    /// Extract the soundtrack of every video lacking one. Per-file failures
    /// are logged and counted; siblings still complete.
    async fn extract_stage(&self, layout: &CourseLayout, videos: &[PathBuf]) -> StageReport {
        info!("🎵 Extracting audio from videos...");
        let mut report = StageReport::default();

        for video_path in videos {
            let base_name = match section_base_name(video_path) {
                Ok(name) => name,
                Err(e) => {
                    warn!("⚠️ Skipping video: {}", e);
                    report.failed += 1;
                    continue;
                }
            };
            let audio_path = layout
                .soundtrack_dir
                .join(format!("{}.{}", base_name, self.config.audio.target_format));

            if self.config.audio.skip_existing && audio_path.exists() {
                report.skipped += 1;
                continue;
            }

            match self
                .audio_extractor
                .extract_soundtrack(video_path, &layout.soundtrack_dir)
                .await
            {
                Ok(_) => report.processed += 1,
                Err(e) => {
                    warn!("⚠️ Audio extraction failed for {}: {}", base_name, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "🎵 Extraction stage: {} extracted, {} skipped, {} failed",
            report.processed, report.skipped, report.failed
        );
        report
    }

    /// Transcribe every soundtrack lacking a transcript. Transcripts are
    /// written atomically under the same base name.
    async fn transcribe_stage(
        &self,
        layout: &CourseLayout,
        soundtracks: &[PathBuf],
    ) -> StageReport {
        info!("🎤 Transcribing audio files...");
        let mut report = StageReport::default();

        for audio_path in soundtracks {
            let base_name = match section_base_name(audio_path) {
                Ok(name) => name,
                Err(e) => {
                    warn!("⚠️ Skipping soundtrack: {}", e);
                    report.failed += 1;
                    continue;
                }
            };
            let transcript_path = layout.transcript_dir.join(format!("{}.txt", base_name));

            if self.config.audio.skip_existing && transcript_path.exists() {
                report.skipped += 1;
                continue;
            }

            match self.transcriber.transcribe(audio_path).await {
                Ok(text) => match write_atomic(&transcript_path, &text).await {
                    Ok(()) => report.processed += 1,
                    Err(e) => {
                        warn!("⚠️ Failed to write transcript for {}: {}", base_name, e);
                        report.failed += 1;
                    }
                },
                Err(e) => {
                    warn!("⚠️ Transcription failed for {}: {}", base_name, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "🎤 Transcription stage: {} transcribed, {} skipped, {} failed",
            report.processed, report.skipped, report.failed
        );
        report
    }

    /// Persist the run summary; failure here is not worth failing the run.
    async fn save_summary(&self, layout: &CourseLayout, report: &PipelineReport) {
        let summary_path = layout.note_dir.join("processing_summary.json");
        match serde_json::to_string_pretty(report) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&summary_path, json).await {
                    warn!("Failed to save processing summary: {}", e);
                } else {
                    info!("💾 Summary saved to: {}", summary_path.display());
                }
            }
            Err(e) => warn!("Failed to serialize processing summary: {}", e),
        }
    }
}
