//! kag-translate CLI - translate KAG scene scripts from Japanese to Russian.

use anyhow::{Context, Result};
use clap::Parser;
use kag_translate::config::Config;
use kag_translate::console::Console;
use kag_translate::context::ContextBuilder;
use kag_translate::llm::{LlmClient, OpenAiGenerator, RetryPolicy};
use kag_translate::lookup::{NameDictionary, SpeakerDatabase};
use kag_translate::orchestrator::FileTranslator;
use kag_translate::pipeline::TranslatePipeline;
use kag_translate::script::ScriptCodec;
use std::path::PathBuf;
use std::sync::Arc;

/// Translate a KAG scene script line by line with an LLM.
#[derive(Parser, Debug)]
#[command(name = "kag-translate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Script file to translate.
    input: PathBuf,

    /// Where to write the translated script.
    output: PathBuf,

    /// Text encoding of the input and output files.
    #[arg(long)]
    encoding: Option<String>,

    /// Translate without scene context.
    #[arg(long)]
    no_context: bool,

    /// Number of lines before and after each line to include as context.
    #[arg(long)]
    window_size: Option<usize>,

    /// Print every prompt before it is sent.
    #[arg(long)]
    show_prompts: bool,

    /// Use this config file instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    console.section("kag-translate");

    console.step("Loading configuration...");
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;
    console.success(&format!(
        "Using model {} at {}",
        config.api.model, config.api.base_url
    ));

    let codec = ScriptCodec::for_label(&config.io.encoding)?;

    let context = if config.context.enabled {
        console.step("Loading name dictionary and speaker database...");
        let names = NameDictionary::load(&config.names_path()?)
            .context("Failed to load name dictionary")?;
        let speakers = SpeakerDatabase::load(&config.speakers_path()?)
            .context("Failed to load speaker database")?;
        console.success(&format!(
            "Loaded {} names and {} speakers",
            names.len(),
            speakers.len()
        ));

        Some(
            ContextBuilder::new(Arc::new(names), Arc::new(speakers))
                .with_window_size(config.context.window_size),
        )
    } else {
        console.info("Scene context disabled");
        None
    };

    let generator = Arc::new(OpenAiGenerator::new(config.api.clone()));
    let llm = LlmClient::new(
        generator,
        RetryPolicy::attempt_marker(config.generation.retry_count),
    )
    .with_console(console.clone());
    let pipeline = TranslatePipeline::new(llm, &config.generation)
        .with_show_prompts(config.debug.show_prompts)
        .with_console(console.clone());

    let translator = FileTranslator::new(pipeline, context)
        .with_codec(codec)
        .with_console(console.clone());

    console.step(&format!("Translating {}...", args.input.display()));
    let summary = translator
        .translate_file(&args.input, &args.output)
        .await
        .context("Translation failed")?;

    console.success(&format!(
        "Wrote {} ({} of {} lines translated)",
        args.output.display(),
        summary.translated_lines,
        summary.total_lines
    ));

    if summary.degraded_lines > 0 {
        console.warning(&format!(
            "{} lines got no response from the model and contain a placeholder",
            summary.degraded_lines
        ));
    }

    console.section("Done!");
    Ok(())
}

/// Applies command line overrides on top of the loaded config.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(encoding) = &args.encoding {
        config.io.encoding = encoding.clone();
    }
    if args.no_context {
        config.context.enabled = false;
    }
    if let Some(window_size) = args.window_size {
        config.context.window_size = window_size;
    }
    if args.show_prompts {
        config.debug.show_prompts = true;
    }
}
