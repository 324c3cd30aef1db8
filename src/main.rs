use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use voice_emotion::model::config::{MODEL_CONFIG_FILE, PREPROCESSOR_CONFIG_FILE, WEIGHTS_FILE};
use voice_emotion::audio::TARGET_SAMPLE_RATE;
use voice_emotion::{AudioFormat, ClassifierConfig, EmotionClassifier, EmotionResult, Waveform};

/// Classify the emotion in a short voice recording
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Audio file to classify (wav, mp3, flac, m4a, ogg)
    file: PathBuf,

    /// Directory containing the model artifacts
    #[arg(short, long, default_value = "./model")]
    model_dir: PathBuf,

    /// Number of threads for inference
    #[arg(long, default_value = "2")]
    threads: usize,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    if !check_model_files(&args.model_dir) {
        anyhow::bail!("model artifacts missing in {:?}", args.model_dir);
    }

    let format = declared_format(&args.file)?;
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {:?}", args.file))?;

    info!("Classifying {:?} ({} bytes, {})", args.file, bytes.len(), format);

    let config = ClassifierConfig {
        model_dir: args.model_dir,
        n_threads: args.threads,
        ..Default::default()
    };
    let classifier = EmotionClassifier::new(config);

    info!("Loading emotion model...");
    classifier.preload().context("model loading failed")?;

    match classifier
        .normalize(&bytes, format)
        .and_then(|waveform| {
            classifier
                .classify_waveform(&waveform)
                .map(|result| (waveform, result))
        }) {
        Ok((waveform, result)) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
                print_audio_info(&waveform);
            }
            Ok(())
        }
        Err(e) => {
            // Full detail for operators, sanitized message for the user
            error!("Classification failed: {}", e.cause());
            eprintln!("\n{}", e.user_message());
            std::process::exit(1);
        }
    }
}

/// Infer the declared container format from the file extension
fn declared_format(path: &Path) -> Result<AudioFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .context("file has no extension; supported: wav, mp3, flac, m4a, ogg")?;
    AudioFormat::from_extension(ext).map_err(|e| anyhow::anyhow!("{}", e))
}

/// Verify the three required artifacts before doing any work
fn check_model_files(model_dir: &Path) -> bool {
    let mut ok = true;
    for file in [WEIGHTS_FILE, MODEL_CONFIG_FILE, PREPROCESSOR_CONFIG_FILE] {
        let path = model_dir.join(file);
        if !path.exists() {
            error!("Missing model artifact: {:?}", path);
            ok = false;
        }
    }
    if !ok {
        eprintln!("\nModel artifacts not found in {:?}", model_dir);
        eprintln!("Expected files:");
        eprintln!("  {}", WEIGHTS_FILE);
        eprintln!("  {}", MODEL_CONFIG_FILE);
        eprintln!("  {}", PREPROCESSOR_CONFIG_FILE);
        eprintln!("\nSpecify a custom directory with: --model-dir /path/to/model");
    }
    ok
}

/// Render the ranked score table with the fixed display identities
fn print_result(result: &EmotionResult) {
    let dominant = result.scores[0];
    println!(
        "\n{} Dominant emotion: {} ({:.1}% confidence)\n",
        dominant.emotion.emoji(),
        dominant.emotion,
        dominant.probability * 100.0
    );

    for score in &result.scores {
        let bar_len = (score.probability * 40.0).round() as usize;
        let marker = if score.emotion == result.dominant { " *" } else { "" };
        println!(
            "  {} {:<10} {:>5.1}%  {}  [{}]{}",
            score.emotion.emoji(),
            score.emotion.label(),
            score.probability * 100.0,
            "#".repeat(bar_len),
            score.color(),
            marker
        );
    }
    println!();
}

/// Stats of the clip as the model saw it, after normalization
fn print_audio_info(waveform: &Waveform) {
    println!("Audio information:");
    println!("  Duration:    {:.2}s", waveform.duration_secs());
    println!("  Sample rate: {} Hz", TARGET_SAMPLE_RATE);
    println!("  Samples:     {}", waveform.len());
}
