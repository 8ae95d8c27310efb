use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use lottie_data::LottieJson;
use lottie_optimize::images::{recompress_assets, QualityPolicy, TargetFormat};
use lottie_optimize::report::{serialized_size, SizeReport};
use lottie_optimize::{Diagnostics, OptimizeConfig, Optimizer};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every pass and write the optimized animation
    Optimize(OptimizeArgs),
    /// Recompress embedded images only
    Images(ImagesArgs),
    /// Print size, asset and keyframe diagnostics; writes nothing
    Analyze {
        /// Lottie JSON file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct OptimizeArgs {
    /// Lottie JSON file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output path (defaults to <INPUT stem>.min.json; may equal INPUT)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// JSON config file; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Decimal places kept on floats
    #[arg(long)]
    precision: Option<u32>,

    /// Skip embedded image recompression
    #[arg(long)]
    no_images: bool,

    /// Keep assets the root layers never reach
    #[arg(long)]
    keep_unused: bool,

    /// Strip layer names (breaks name-based expressions)
    #[arg(long)]
    strip_names: bool,

    #[command(flatten)]
    images: ImageArgs,
}

#[derive(Args, Debug)]
struct ImagesArgs {
    /// Lottie JSON file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output path (defaults to <INPUT stem>.min.json; may equal INPUT)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    images: ImageArgs,
}

#[derive(Args, Debug, Default)]
struct ImageArgs {
    /// Fixed encoder quality (1-100); disables size-dependent quality
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100), conflicts_with_all = ["min_quality", "max_quality"])]
    quality: Option<u8>,

    /// Quality used for the largest images
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    min_quality: Option<u8>,

    /// Quality used for small images
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    max_quality: Option<u8>,

    /// Downscale images larger than this many pixels on either side
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Target image format
    #[arg(long, value_enum)]
    format: Option<ImageFormat>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum ImageFormat {
    Jpeg,
    Png,
}

impl From<ImageFormat> for TargetFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => TargetFormat::Jpeg,
            ImageFormat::Png => TargetFormat::Png,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

impl ImageArgs {
    fn apply(&self, config: &mut OptimizeConfig) {
        let images = &mut config.images;
        if let Some(quality) = self.quality {
            images.quality = QualityPolicy::Fixed { quality };
        } else if self.min_quality.is_some() || self.max_quality.is_some() {
            let (default_min, default_max) = match images.quality {
                QualityPolicy::Dynamic { min, max } => (min, max),
                QualityPolicy::Fixed { quality } => (quality, quality),
            };
            images.quality = QualityPolicy::Dynamic {
                min: self.min_quality.unwrap_or(default_min),
                max: self.max_quality.unwrap_or(default_max),
            };
        }
        if let Some(max) = self.max_dimension {
            images.max_dimension = Some(max);
        }
        if let Some(format) = self.format {
            images.format = format.into();
        }
    }
}

impl OptimizeArgs {
    fn build_config(&self) -> Result<OptimizeConfig> {
        let mut config = match &self.config {
            Some(path) => OptimizeConfig::from_path(path)?,
            None => OptimizeConfig::default(),
        };
        if let Some(precision) = self.precision {
            config.policy.precision = precision;
        }
        if self.no_images {
            config.recompress_images = false;
        }
        if self.keep_unused {
            config.remove_unused_assets = false;
        }
        if self.strip_names {
            config.policy.names = true;
        }
        self.images.apply(&mut config);
        Ok(config)
    }
}

/// `<stem>.min.json` next to `input`; an existing `.min` suffix is not repeated.
fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let stem = stem.strip_suffix(".min").unwrap_or(stem);
    input.with_file_name(format!("{stem}.min.json"))
}

fn init_logging(level: LogLevel, format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }
}

fn run_optimize(args: &OptimizeArgs) -> Result<()> {
    let config = args.build_config()?;
    let output = args.output.clone().unwrap_or_else(|| default_output(&args.input));

    info!("Input: {:?}", args.input);
    info!("Output: {:?}", output);

    let summary = Optimizer::new(config)
        .optimize_file(&args.input, &output)
        .with_context(|| format!("Failed to optimize {:?}", args.input))?;

    if let Some(images) = summary.images {
        if images.failed > 0 {
            info!("{} image(s) kept their original payload", images.failed);
        }
    }
    println!("{}: {}", output.display(), summary.size);
    Ok(())
}

fn run_images(args: &ImagesArgs) -> Result<()> {
    let mut config = OptimizeConfig::default();
    args.images.apply(&mut config);
    let output = args.output.clone().unwrap_or_else(|| default_output(&args.input));

    let mut doc = LottieJson::from_path(&args.input)
        .with_context(|| format!("Failed to load {:?}", args.input))?;
    let before = serialized_size(&doc)?;
    let stats = recompress_assets(&mut doc.assets, &config.images);
    let after = serialized_size(&doc)?;
    doc.write_to_path(&output)?;

    info!(
        processed = stats.processed,
        replaced = stats.replaced,
        failed = stats.failed,
        "Recompressed embedded images"
    );
    println!("{}: {}", output.display(), SizeReport { before, after });
    Ok(())
}

fn run_analyze(input: &Path) -> Result<()> {
    let doc = LottieJson::from_path(input).with_context(|| format!("Failed to load {:?}", input))?;
    let diagnostics = Diagnostics::analyze(&doc)?;
    println!("{}", input.display());
    println!();
    print!("{}", diagnostics);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_format);

    let result = match &cli.command {
        Command::Optimize(args) => run_optimize(args),
        Command::Images(args) => run_images(args),
        Command::Analyze { input } => run_analyze(input),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_optimize_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "lottie-optimize",
            "optimize",
            "intro.json",
            "--precision",
            "3",
            "--no-images",
            "--strip-names",
            "--min-quality",
            "50",
        ])
        .unwrap();
        let Command::Optimize(args) = cli.command else {
            panic!("Expected optimize");
        };
        let config = args.build_config().unwrap();
        assert_eq!(config.policy.precision, 3);
        assert!(!config.recompress_images);
        assert!(config.remove_unused_assets);
        assert!(config.policy.names);
        assert_eq!(config.images.quality, QualityPolicy::Dynamic { min: 50, max: 85 });
    }

    #[test]
    fn test_quality_conflicts_with_range() {
        let res = Cli::try_parse_from([
            "lottie-optimize",
            "images",
            "a.json",
            "--quality",
            "70",
            "--max-quality",
            "90",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_images_args() {
        let cli = Cli::try_parse_from([
            "lottie-optimize",
            "images",
            "a.json",
            "-o",
            "b.json",
            "--quality",
            "70",
            "--format",
            "png",
            "--max-dimension",
            "1024",
        ])
        .unwrap();
        let Command::Images(args) = cli.command else {
            panic!("Expected images");
        };
        let mut config = OptimizeConfig::default();
        args.images.apply(&mut config);
        assert_eq!(args.output, Some(PathBuf::from("b.json")));
        assert_eq!(config.images.quality, QualityPolicy::Fixed { quality: 70 });
        assert_eq!(config.images.format, TargetFormat::Png);
        assert_eq!(config.images.max_dimension, Some(1024));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output(Path::new("assets/hero.json")),
            PathBuf::from("assets/hero.min.json")
        );
        assert_eq!(
            default_output(Path::new("assets/hero.min.json")),
            PathBuf::from("assets/hero.min.json")
        );
    }

    #[test]
    fn test_run_optimize_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.json");
        std::fs::write(
            &input,
            r#"{"v":"5.5.2","fr":30,"ip":0,"op":60,"ddd":0,"layers":[{"ind":1,"ty":3,"sr":1,"ip":0,"op":60,"ks":{"o":{"a":0,"k":100.0}}}]}"#,
        )
        .unwrap();
        let args = OptimizeArgs {
            input: input.clone(),
            output: None,
            config: None,
            precision: None,
            no_images: false,
            keep_unused: false,
            strip_names: false,
            images: ImageArgs::default(),
        };
        run_optimize(&args).unwrap();

        let written = std::fs::read_to_string(dir.path().join("scene.min.json")).unwrap();
        assert_eq!(
            written,
            r#"{"ip":0,"op":60,"layers":[{"ty":3,"ind":1,"ks":{"o":{"a":0,"k":100}}}]}"#
        );
    }

    #[test]
    fn test_run_analyze_missing_file_fails() {
        assert!(run_analyze(Path::new("/no/such/file.json")).is_err());
    }
}
