use clap::{Parser, ValueEnum};
use geoshape::{
    BinarizationMode, DetectorConfig, FrameReport, FrameSink, FrameSource, ShapeDetector,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "geoshape")]
#[command(about = "Geoshape - detect simple geometric shapes and their color in video frames", long_about = None)]
struct Cli {
    /// Input image, or a directory of frames read in name order
    input: PathBuf,

    /// Binarization variant (overrides the config file)
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Odd Gaussian kernel size (overrides the config file)
    #[arg(long)]
    blur: Option<u32>,

    /// JSON configuration file; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write annotated frames into this directory
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Canny edges, 5x5 blur
    Edge,
    /// Fixed threshold at 60, 7x7 blur
    Threshold,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    /// JSON list of per-frame reports
    Json,
    /// Plain text, one label per line
    Text,
    /// TSV format: frame\tlabel\tx,y,w,h
    Tsv,
}

fn build_config(cli: &Cli) -> Result<DetectorConfig, geoshape::DetectError> {
    let mut cfg = match (&cli.config, cli.mode) {
        (Some(path), _) => DetectorConfig::from_json_file(path)?,
        (None, Some(Mode::Threshold)) => DetectorConfig::threshold(),
        (None, _) => DetectorConfig::edge(),
    };

    // Switching mode on top of a config file keeps its other fields
    match cli.mode {
        Some(Mode::Edge) => cfg.binarization = BinarizationMode::Edge,
        Some(Mode::Threshold) => cfg.binarization = BinarizationMode::Threshold,
        None => {}
    }
    if let Some(k) = cli.blur {
        cfg.blur_kernel_size = k;
    }
    Ok(cfg)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let detector = ShapeDetector::new(build_config(&cli)?)?;
    let source = FrameSource::open(&cli.input)?;
    let sink = cli.annotate.as_ref().map(FrameSink::new).transpose()?;

    let mut reports = Vec::with_capacity(source.len());
    for (index, name, frame) in source {
        let frame = match frame {
            Ok(f) => f,
            Err(e) => {
                log::warn!("skipping frame {} ({}): {}", index, name, e);
                continue;
            }
        };

        let detection = detector.run(&frame, sink.is_some());
        log::info!(
            "frame {} ({}): {} shapes in {:.1} ms",
            index,
            name,
            detection.records.len(),
            detection.elapse * 1000.0
        );
        if let (Some(sink), Some(annotated)) = (&sink, &detection.annotated) {
            sink.write(index, annotated)?;
        }
        reports.push(FrameReport {
            index,
            name,
            records: detection.records,
        });
    }

    // Output results
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Text => {
            for record in reports.iter().flat_map(|r| &r.records) {
                println!("{}", record.label);
            }
        }
        OutputFormat::Tsv => {
            for report in &reports {
                for record in &report.records {
                    let b = record.bbox;
                    println!("{}\t{}\t{},{},{},{}", report.index, record.label, b.x, b.y, b.width, b.height);
                }
            }
        }
    }

    Ok(())
}
