//! File-level translation loop.
//!
//! Reads a script, runs every non-blank line through the context builder and
//! the translate/edit pipeline, and writes the result once all lines are
//! done. Blank lines pass through untouched so the output has exactly the
//! same line count and order as the input.

use crate::console::Console;
use crate::context::ContextBuilder;
use crate::error::ScriptError;
use crate::pipeline::TranslatePipeline;
use crate::script::ScriptCodec;
use std::path::Path;
use std::time::{Duration, Instant};

/// Progress snapshot taken before a line is processed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Lines already passed (0-based index of the current line).
    pub line: usize,
    pub total: usize,
    /// Integer percentage, rounded down.
    pub percent: usize,
    pub elapsed: Duration,
    /// Linear estimate of the remaining time.
    pub eta: Duration,
}

impl Progress {
    pub fn compute(line: usize, total: usize, elapsed: Duration) -> Self {
        let percent = if total == 0 { 100 } else { line * 100 / total };

        let eta = if line > 0 {
            let secs = elapsed.as_secs_f64() / line as f64 * total as f64 - elapsed.as_secs_f64();
            Duration::from_secs_f64(secs.max(0.0))
        } else {
            Duration::ZERO
        };

        Self {
            line,
            total,
            percent,
            elapsed,
            eta,
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Working with line {}/{} ({}%) total time: {:.1} min, ETA: {:.1} min",
            self.line,
            self.total,
            self.percent,
            self.elapsed.as_secs_f64() / 60.0,
            self.eta.as_secs_f64() / 60.0
        )
    }
}

/// Mutable state of a single file run.
#[derive(Debug)]
pub struct RunState {
    started: Instant,
    total_lines: usize,
    translated_lines: usize,
    degraded_lines: usize,
}

impl RunState {
    pub fn start(total_lines: usize) -> Self {
        Self {
            started: Instant::now(),
            total_lines,
            translated_lines: 0,
            degraded_lines: 0,
        }
    }

    pub fn progress(&self, line: usize) -> Progress {
        Progress::compute(line, self.total_lines, self.started.elapsed())
    }

    fn record(&mut self, degraded: bool) {
        self.translated_lines += 1;
        if degraded {
            self.degraded_lines += 1;
        }
    }

    pub fn finish(self) -> RunSummary {
        RunSummary {
            total_lines: self.total_lines,
            translated_lines: self.translated_lines,
            degraded_lines: self.degraded_lines,
            elapsed: self.started.elapsed(),
        }
    }
}

/// What happened during a file run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_lines: usize,
    /// Non-blank lines sent through the pipeline.
    pub translated_lines: usize,
    /// Lines whose output contains the no-response sentinel.
    pub degraded_lines: usize,
    pub elapsed: Duration,
}

/// Translates whole script files line by line.
pub struct FileTranslator {
    pipeline: TranslatePipeline,
    context: Option<ContextBuilder>,
    codec: ScriptCodec,
    console: Console,
}

impl FileTranslator {
    /// `context` is `None` when scene context is disabled.
    pub fn new(pipeline: TranslatePipeline, context: Option<ContextBuilder>) -> Self {
        Self {
            pipeline,
            context,
            codec: ScriptCodec::default(),
            console: Console::new(),
        }
    }

    pub fn with_codec(mut self, codec: ScriptCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Translate `input` and write the result to `output`.
    ///
    /// Nothing is written until every line is done.
    pub async fn translate_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<RunSummary, ScriptError> {
        let lines = self.codec.read_lines(input)?;

        let mut state = RunState::start(lines.len());
        let result = self.translate_lines(&lines, &mut state).await;
        let summary = state.finish();

        self.console.success("Translation done successfully! (100%)");
        self.console.info(&format!(
            "done in {:.1} min",
            summary.elapsed.as_secs_f64() / 60.0
        ));

        self.codec.write_lines(output, &result)?;
        Ok(summary)
    }

    /// Translate every non-blank line, keeping blank lines as they are.
    pub async fn translate_lines(&self, lines: &[String], state: &mut RunState) -> Vec<String> {
        let mut result = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                result.push(line.clone());
                continue;
            }

            self.console.step(&state.progress(index).message());

            let context = match &self.context {
                Some(builder) => builder.build(lines, index),
                None => String::new(),
            };

            let translated = self.pipeline.run(line, &context).await;
            if translated.degraded {
                self.console
                    .warning(&format!("Line {} fell back to the no-response placeholder", index + 1));
            }
            state.record(translated.degraded);

            result.push(format!("{}\n", translated.text));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::error::GenerationError;
    use crate::llm::{Generator, LlmClient, RetryPolicy};
    use crate::lookup::{NameDictionary, SpeakerDatabase};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Echoes the text on the prompt's second-to-last line, after its label.
    #[derive(Default)]
    struct EchoGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lines: Vec<&str> = prompt.lines().collect();
            let echoed = lines
                .len()
                .checked_sub(2)
                .and_then(|i| lines[i].split_once(": "))
                .map(|(_, text)| text.to_string())
                .unwrap_or_default();
            Ok(echoed)
        }
    }

    fn translator(generator: Arc<EchoGenerator>, context: Option<ContextBuilder>) -> FileTranslator {
        let console = Console::with_colors(false);
        let llm = LlmClient::new(generator, RetryPolicy::attempt_marker(3))
            .with_console(console.clone());
        let pipeline =
            TranslatePipeline::new(llm, &GenerationConfig::default()).with_console(console.clone());
        FileTranslator::new(pipeline, context).with_console(console)
    }

    #[tokio::test]
    async fn test_end_to_end_preserves_lines() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.ks");
        let output = dir.path().join("output.ks");
        std::fs::write(&input, "Hello\n\nWorld\n").unwrap();

        let generator = Arc::new(EchoGenerator::default());
        let summary = translator(generator.clone(), None)
            .translate_file(&input, &output)
            .await
            .unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, "Hello\n\nWorld\n");
        assert_eq!(summary.total_lines, 3);
        assert_eq!(summary.translated_lines, 2);
        assert_eq!(summary.degraded_lines, 0);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_whitespace_lines_pass_through_exactly() {
        let generator = Arc::new(EchoGenerator::default());
        let names = Arc::new(NameDictionary::default());
        let speakers = Arc::new(SpeakerDatabase::default());
        let context = ContextBuilder::new(names, speakers);
        let translator = translator(generator, Some(context));

        let lines: Vec<String> = ["  \t\n", "「はい」\r\n", "\n", "last"]
            .iter()
            .map(|l| l.to_string())
            .collect();
        let mut state = RunState::start(lines.len());
        let result = translator.translate_lines(&lines, &mut state).await;

        assert_eq!(result.len(), lines.len());
        assert_eq!(result[0], "  \t\n");
        assert_eq!(result[1], "「はい」\n");
        assert_eq!(result[2], "\n");
        assert_eq!(result[3], "last\n");
    }

    #[tokio::test]
    async fn test_interrupted_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("output.ks");

        let result = translator(Arc::new(EchoGenerator::default()), None)
            .translate_file(&dir.path().join("missing.ks"), &output)
            .await;

        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_progress_first_line() {
        let progress = Progress::compute(0, 10, Duration::from_secs(5));
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.eta, Duration::ZERO);
    }

    #[test]
    fn test_progress_linear_eta() {
        let progress = Progress::compute(3, 10, Duration::from_secs(30));
        assert_eq!(progress.percent, 30);
        assert_eq!(progress.eta.as_secs(), 70);
        assert_eq!(
            progress.message(),
            "Working with line 3/10 (30%) total time: 0.5 min, ETA: 1.2 min"
        );
    }

    #[test]
    fn test_progress_percent_floors() {
        assert_eq!(Progress::compute(2, 3, Duration::ZERO).percent, 66);
    }
}
