use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

// Import from pdfoutline-core
use pdfoutline_core::{
    ConfigManager, DebugConfig, OutlineConfig, OutlineProcessor, PipelineStages, Preset,
    ProfileSummary, StepProfiler,
};

#[derive(Parser)]
#[command(name = "pdfoutline")]
#[command(about = "Extract a title and H1/H2/H3 outline from PDF text spans")]
struct Args {
    /// Path to the span dump (JSON) produced by the PDF text extractor
    #[arg(short, long)]
    input: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Built-in parameter preset: balanced, strict or lenient
    #[arg(short, long, default_value = "balanced")]
    preset: String,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Print the outline JSON to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Dump all intermediate pipeline stage outputs to a directory
    /// Captures: TextElements, FontProfile, ScoredElements, Headings and the final Document
    #[arg(long)]
    dump_stages: bool,

    /// Directory for stage dump output (default: test_outputs/stages)
    #[arg(long, default_value = "test_outputs/stages")]
    stages_dir: String,

    /// Trace elements whose text contains one of these patterns through every rule
    #[arg(long, value_delimiter = ',')]
    debug_filter: Vec<String>,

    /// Debug-level logging (RUST_LOG still wins when set)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    log::info!("🦀 PDF Outline Extractor");

    if args.show_configs {
        show_help();
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        log::warn!("⚠️  No input given, use --input <span dump>");
        return Ok(());
    };

    // Check if input file exists
    if !Path::new(input).exists() {
        log::warn!("⚠️  Input not found at: {}", input);
        log::warn!("   Please check the file path.");
        return Ok(());
    }

    let config = load_config(&args)?;
    let mut processor = OutlineProcessor::new(config).context("invalid configuration")?;

    if !args.debug_filter.is_empty() {
        log::info!("🔍 Tracing elements matching: {:?}", args.debug_filter);
        processor.set_debug_config(DebugConfig::new(true, args.debug_filter.clone()));
    }

    log::info!("📄 Processing: {}", input);

    // Stage dump mode: capture and save all intermediates
    if args.dump_stages {
        log::info!("🔬 Pipeline stage dump mode");
        let mut profiler = StepProfiler::new(args.profile);
        let stages = processor
            .capture_stages(Path::new(input), &mut profiler)
            .with_context(|| format!("stage dump failed for {input}"))?;
        save_stages(&stages, &profiler.summary(), input, &args.stages_dir)?;
        profiler.log_summary();
        log::info!("✅ All stages dumped to: {}", args.stages_dir);
        return Ok(());
    }

    let document = if args.profile {
        let mut profiler = StepProfiler::new(true);
        let document = match processor.capture_stages(Path::new(input), &mut profiler) {
            Ok(stages) => stages.document,
            Err(e) => {
                log::warn!("⚠️  Failed to process {}: {}, reporting empty outline", input, e);
                pdfoutline_core::Document::empty()
            }
        };
        profiler.log_summary();
        document
    } else {
        processor.process_file(Path::new(input))
    };

    log::info!("✅ Successfully processed document");
    log::info!("📊 Outline metrics:");
    log::info!("   - Title: \"{}\"", document.title);
    log::info!("   - Entries: {}", document.outline.len());

    if args.stdout {
        println!("{}", document.to_json_pretty()?);
        return Ok(());
    }

    // Generate output path
    let output_path = if let Some(output) = &args.output {
        output.clone()
    } else {
        let input_name = Path::new(input)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let config_suffix = args
            .config
            .as_ref()
            .and_then(|p| Path::new(p).file_stem())
            .and_then(|s| s.to_str())
            .map(|s| format!("_{s}"))
            .unwrap_or_default();
        format!("{input_name}{config_suffix}_outline.json")
    };

    document
        .save_to_json(Path::new(&output_path))
        .with_context(|| format!("failed to write {output_path}"))?;
    log::info!("💾 Outline saved to: {}", output_path);

    Ok(())
}

/// Custom config file wins over the preset
fn load_config(args: &Args) -> Result<OutlineConfig> {
    if let Some(config_path) = &args.config {
        let config = OutlineConfig::load_from_file(config_path)
            .with_context(|| format!("failed to load config {config_path}"))?;
        log::info!("📋 Loaded config from: {}", config_path);
        return Ok(config);
    }

    let preset = Preset::parse(&args.preset)
        .with_context(|| format!("unknown preset '{}'", args.preset))?;
    log::info!("📋 Using {:?} preset", preset);
    Ok(OutlineConfig::for_preset(preset))
}

fn show_help() {
    println!("\n📋 Available Configuration Options:");
    println!("  --input <path>          Span dump (JSON) to process");
    println!("  --config <path>         Load custom config file (YAML)");
    println!("  --preset <name>         balanced (default), strict or lenient");
    println!("  --output <path>         Output file path (auto-generated if not specified)");
    println!("  --stdout                Print the outline JSON instead of writing a file");
    println!("  --profile               Time every pipeline step");
    println!("  --dump-stages           Write every intermediate stage to --stages-dir");
    println!("  --debug-filter <a,b>    Trace matching elements through the rules");
    println!("  --verbose               Debug-level logging");

    println!("\n🎛️  Presets:");
    let manager = ConfigManager::new();
    for preset in manager.presets() {
        let config = manager.get_config(*preset);
        println!(
            "  {:<10} threshold {:.2}, repetition limit {}",
            format!("{:?}", preset).to_lowercase(),
            config.scoring.acceptance_threshold,
            config.noise_filter.repetition_threshold
        );
    }

    println!("\n📄 Output Format:");
    println!("  {{ \"title\": \"...\", \"outline\": [ {{ \"level\": \"H1\", \"text\": \"...\", \"page\": 1 }} ] }}");

    println!("\n📝 Usage Examples:");
    println!("  cargo run -- -i spans.json");
    println!("  cargo run -- -i spans.json -o /path/to/outline.json");
    println!("  cargo run -- -i spans.json -p strict --profile");
    println!("  cargo run -- -i spans.json -c config.yaml --dump-stages");
}

fn save_stages(
    stages: &PipelineStages,
    profile: &ProfileSummary,
    input: &str,
    output_dir: &str,
) -> Result<()> {
    use std::fs;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {output_dir}"))?;

    // Stage 1: TextElements
    let te_path = format!("{}/stage1_text_elements.json", output_dir);
    fs::write(&te_path, serde_json::to_string_pretty(&stages.text_elements)?)?;
    log::info!("  💾 {} ({} elements)", te_path, stages.text_elements.len());

    // Stage 2: Font profile
    let fp_path = format!("{}/stage2_font_profile.json", output_dir);
    fs::write(&fp_path, serde_json::to_string_pretty(&stages.font_profile)?)?;
    log::info!("  💾 {}", fp_path);

    // Stage 3: Scored elements
    let se_path = format!("{}/stage3_scored_elements.json", output_dir);
    fs::write(&se_path, serde_json::to_string_pretty(&stages.scored_elements)?)?;
    log::info!("  💾 {} ({} elements)", se_path, stages.scored_elements.len());

    // Stage 4: Headings after the rule pipeline
    let hd_path = format!("{}/stage4_headings.json", output_dir);
    fs::write(&hd_path, serde_json::to_string_pretty(&stages.headings)?)?;
    log::info!("  💾 {} ({} headings)", hd_path, stages.headings.len());

    // Stage 5: Final document
    let doc_path = format!("{}/stage5_document.json", output_dir);
    stages.document.save_to_json(Path::new(&doc_path))?;
    log::info!("  💾 {} ({} entries)", doc_path, stages.document.outline.len());

    // Summary file: quick reference for validation scripts
    let summary = serde_json::json!({
        "input": input,
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "title": stages.title,
        "validation": stages.validation,
        "stage_counts": {
            "text_elements": stages.text_elements.len(),
            "scored_elements": stages.scored_elements.len(),
            "heading_candidates": stages.scored_elements.iter().filter(|e| e.is_heading()).count(),
            "headings": stages.headings.len(),
            "outline_entries": stages.document.outline.len(),
        },
        "profile": profile,
    });
    let summary_path = format!("{}/summary.json", output_dir);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    log::info!("  💾 {}", summary_path);

    Ok(())
}
