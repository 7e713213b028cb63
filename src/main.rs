//! charlens CLI - train a recognition model or run it against an image.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use charlens::config::{load_parameters, TrainingParameters};
use charlens::detect::ComponentDetector;
use charlens::synth::{load_font, SampleBuilder, Synthesizer};
use charlens::vision::load_image;
use charlens::{Charset, Model, Recognizer, TrainingEvent, TrainingWorker};

/// Short-string OCR: synthesize training data, train, recognize.
#[derive(Parser, Debug)]
#[command(name = "charlens")]
#[command(about = "Train and run a short-string OCR model")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model from synthesized images
    Train {
        /// Characters the model should recognize
        #[arg(short, long)]
        charset: String,

        /// Font files used for synthesis
        #[arg(short, long, required = true, num_args = 1..)]
        fonts: Vec<PathBuf>,

        /// Background images used for synthesis
        #[arg(short, long, required = true, num_args = 1..)]
        backgrounds: Vec<PathBuf>,

        /// Where to write the trained model
        #[arg(short, long, default_value = "model.json")]
        output: PathBuf,

        /// Optional TOML file overriding the default training parameters
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
    /// Recognize text in an image using a trained model
    Recognize {
        /// Path to a model produced by `train`
        #[arg(short, long)]
        model: PathBuf,

        /// Image to recognize
        image: PathBuf,
    },
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    match args.command {
        Command::Train {
            charset,
            fonts,
            backgrounds,
            output,
            params,
        } => train(&charset, &fonts, &backgrounds, &output, params.as_deref()),
        Command::Recognize { model, image } => recognize(&model, &image),
    }
}

fn train(
    charset: &str,
    fonts: &[PathBuf],
    backgrounds: &[PathBuf],
    output: &std::path::Path,
    params_path: Option<&std::path::Path>,
) -> Result<()> {
    let charset = Charset::new(charset)?;

    let params = match params_path {
        Some(path) => load_parameters(path)
            .with_context(|| format!("failed to load parameters from {path:?}"))?,
        None => TrainingParameters::default(),
    };

    let fonts = fonts
        .iter()
        .map(|path| load_font(path))
        .collect::<Result<Vec<_>, _>>()?;
    let backgrounds = backgrounds
        .iter()
        .map(|path| Ok(load_image(path)?.to_rgba8()))
        .collect::<Result<Vec<_>, charlens::OcrError>>()?;

    info!(
        "training over {} fonts, {} backgrounds, {} classes",
        fonts.len(),
        backgrounds.len(),
        charset.len()
    );

    let synthesizer = Synthesizer::new(fonts, backgrounds)?;
    let builder = SampleBuilder::new(
        synthesizer,
        ComponentDetector::default(),
        charset.clone(),
        params.max_text_length,
        params.max_attempts,
    );

    let (worker, events) = TrainingWorker::new(Arc::new(builder), charset, params);
    worker.start();

    for event in events {
        match event {
            TrainingEvent::Progress(error) => info!("test error: {error:.4}"),
            TrainingEvent::Finished(model) => {
                model.save(output)?;
                info!("model written to {output:?}");
                break;
            }
        }
    }

    Ok(())
}

fn recognize(model_path: &std::path::Path, image_path: &std::path::Path) -> Result<()> {
    let model = Model::load(model_path)?;
    let image = load_image(image_path)?;

    let recognizer = Recognizer::from_model(model, ComponentDetector::default());
    match recognizer.recognize(&image) {
        Some(text) => println!("{text}"),
        None => anyhow::bail!("recognizer was busy"),
    }

    Ok(())
}
