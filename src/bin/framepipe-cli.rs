use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use framepipe::{
    FramePipeError, FrameRate, PixelFormat, ProgressCallback, ProgressInfo, ReaderOptions,
    ToolLogLevel, ToolOptions, Transcoder, VideoCodec, VideoReader, WriterOptions, codec,
    probe_frame_rate,
};

const CLI_AFTER_HELP: &str = "Examples:\n  framepipe probe input.mp4 --json\n  framepipe extract input.mp4 --out frames --every 10 --progress\n  framepipe transcode input.mp4 output.mp4 --swap-channels\n  framepipe completions zsh > _framepipe";

#[derive(Debug, Parser)]
#[command(
    name = "framepipe",
    version,
    about = "Pull frames out of videos and push them back in through ffmpeg pipes",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// Directory containing ffmpeg and ffprobe (defaults to $FF_PREFIX, then PATH).
    #[arg(long, global = true)]
    ff_prefix: Option<PathBuf>,

    /// ffmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    tool_log_level: Option<String>,

    /// Pixel format of decoded frames (rgb8, rgba8, gray8).
    #[arg(long, global = true)]
    pixel_format: Option<String>,

    /// Bytes requested from ffmpeg per read.
    #[arg(long, global = true)]
    chunk_size: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the frame rate of a video.
    #[command(
        about = "Probe the frame rate of a video",
        visible_alias = "fps",
        after_help = "Examples:\n  framepipe probe input.mp4\n  framepipe probe input.mp4 --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract frames to an output directory.
    #[command(
        about = "Extract video frames",
        after_help = "Examples:\n  framepipe extract input.mp4 --out frames\n  framepipe extract input.mp4 --out frames --every 30 --ext jpg --progress"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Output directory for extracted frame images.
        #[arg(long)]
        out: PathBuf,
        /// Keep every Nth frame.
        #[arg(long, default_value_t = 1)]
        every: u64,
        /// Output image extension (png, jpg, jpeg, bmp, tiff).
        #[arg(long, default_value = "png")]
        ext: String,
    },

    /// Decode, transform, and re-encode a video.
    #[command(
        about = "Re-encode a video frame by frame",
        after_help = "Examples:\n  framepipe transcode input.mp4 output.mp4\n  framepipe transcode input.mp4 output.mkv --codec h265 --crf 22 --fps 24000/1001"
    )]
    Transcode {
        /// Input video path.
        input: PathBuf,
        /// Output video path.
        output: PathBuf,
        /// Output frame rate as num/den (probed from the input when omitted).
        #[arg(long)]
        fps: Option<String>,
        /// Output codec: h264 | h265 | mpeg4.
        #[arg(long, default_value = "h264")]
        codec: String,
        /// Constant rate factor.
        #[arg(long)]
        crf: Option<u32>,
        /// Swap the red and blue channels of every frame.
        #[arg(long)]
        swap_channels: bool,
        /// Convert every frame to grayscale.
        #[arg(long)]
        grayscale: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_pixel_format(value: &str) -> Option<PixelFormat> {
    match value.to_ascii_lowercase().as_str() {
        "rgb8" | "rgb" => Some(PixelFormat::Rgb8),
        "rgba8" | "rgba" => Some(PixelFormat::Rgba8),
        "gray8" | "gray" | "greyscale" | "grayscale" => Some(PixelFormat::Gray8),
        _ => None,
    }
}

fn parse_codec(value: &str) -> Option<VideoCodec> {
    match value.to_ascii_lowercase().as_str() {
        "h264" | "avc" | "x264" => Some(VideoCodec::H264),
        "h265" | "hevc" | "x265" => Some(VideoCodec::H265),
        "mpeg4" | "mp4v" => Some(VideoCodec::Mpeg4),
        _ => None,
    }
}

fn tool_options(global: &GlobalOptions) -> Result<ToolOptions, Box<dyn std::error::Error>> {
    let mut tools = ToolOptions::from_env();
    if let Some(prefix) = &global.ff_prefix {
        tools = tools.with_prefix(prefix);
    }
    if let Some(level) = &global.tool_log_level {
        let parsed: ToolLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --tool-log-level: {level}"))?;
        tools = tools.with_log_level(parsed);
    }
    Ok(tools)
}

fn reader_options(global: &GlobalOptions) -> Result<ReaderOptions, Box<dyn std::error::Error>> {
    let mut options = ReaderOptions::new().with_tools(tool_options(global)?);
    if let Some(pixel_str) = &global.pixel_format {
        let pixel = parse_pixel_format(pixel_str)
            .ok_or(format!("unsupported --pixel-format: {pixel_str}"))?;
        options = options.with_pixel_format(pixel);
    }
    if let Some(chunk_size) = global.chunk_size {
        options = options.with_chunk_size(chunk_size);
    }
    Ok(options)
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn warn(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

fn spinner(enabled: bool) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} {pos} frames {msg} [{elapsed_precise}]",
    )?);
    Ok(Some(bar))
}

struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        self.bar.set_message(format!("({:.1} fps)", info.throughput));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { input, json } => {
            let tools = tool_options(&cli.global)?;
            let probe = probe_frame_rate(&input, &tools);
            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "numerator": probe.rate.numerator,
                    "denominator": probe.rate.denominator,
                    "fps": probe.rate.as_f64(),
                    "fallback": probe.is_fallback(),
                    "warning": probe.warning,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                if let Some(warning) = &probe.warning {
                    warn(warning);
                }
                println!("Frame rate: {} ({:.3} fps)", probe.rate, probe.rate.as_f64());
            }
        }
        Commands::Extract {
            input,
            out,
            every,
            ext,
        } => {
            if every == 0 {
                return Err("--every must be greater than 0".into());
            }

            if out.exists() {
                if !cli.global.overwrite {
                    return Err(format!(
                        "output directory already exists: {} (use --overwrite)",
                        out.display()
                    )
                    .into());
                }
                warn(&format!("writing into existing directory {}", out.display()));
            }
            fs::create_dir_all(&out)?;

            let ext_clean = ext.trim_start_matches('.').to_ascii_lowercase();
            let mut reader = VideoReader::open_with_options(&input, reader_options(&cli.global)?)?;
            let progress_bar = spinner(cli.global.progress)?;
            let mut extracted = 0_u64;
            let mut skipped = 0_u64;

            for result in reader.frames() {
                let (index, image) = match result {
                    Ok(frame) => frame,
                    Err(error @ FramePipeError::FrameDecode { .. }) => {
                        warn(&error.to_string());
                        skipped += 1;
                        continue;
                    }
                    Err(FramePipeError::SourceStalled { .. }) => continue,
                    Err(error) => return Err(error.into()),
                };
                if let Some(bar) = &progress_bar {
                    bar.inc(1);
                }
                if index % every != 0 {
                    continue;
                }

                let output_path = out.join(format!("frame_{index:06}.{ext_clean}"));
                if output_path.exists() && !cli.global.overwrite {
                    return Err(format!(
                        "output file already exists: {} (use --overwrite)",
                        output_path.display()
                    )
                    .into());
                }
                image.save(&output_path)?;
                extracted += 1;

                if cli.global.verbose {
                    eprintln!("saved frame {} -> {}", index, output_path.display());
                }
            }

            if cli.global.verbose {
                eprintln!("read {} bytes from ffmpeg", reader.bytes_read());
            }
            reader.close()?;
            if let Some(bar) = progress_bar {
                bar.finish_with_message("done");
            }
            if skipped > 0 {
                warn(&format!("{skipped} frame(s) could not be decoded"));
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Extracted {extracted} frame(s) to {}", out.display()).green()
            );
        }
        Commands::Transcode {
            input,
            output,
            fps,
            codec: codec_name,
            crf,
            swap_channels,
            grayscale,
        } => {
            ensure_writable_path(&output, cli.global.overwrite)?;
            let video_codec =
                parse_codec(&codec_name).ok_or(format!("unsupported --codec: {codec_name}"))?;

            let reader = reader_options(&cli.global)?;
            let mut writer = WriterOptions::new()
                .with_tools(reader.tools.clone())
                .with_codec(video_codec)
                .with_overwrite(cli.global.overwrite);
            if let Some(crf) = crf {
                writer = writer.with_crf(crf);
            }

            let mut transcoder = Transcoder::new(&input, &output)
                .with_reader_options(reader)
                .with_writer_options(writer);
            if let Some(fps) = &fps {
                transcoder = transcoder.with_frame_rate(fps.parse::<FrameRate>()?);
            }
            let progress_bar = spinner(cli.global.progress)?;
            if let Some(bar) = &progress_bar {
                transcoder = transcoder.with_progress(Arc::new(BarProgress { bar: bar.clone() }));
            }

            let verbose = cli.global.verbose;
            let summary = transcoder.run(|index, mut frame| {
                if swap_channels {
                    frame = codec::swap_red_blue(frame);
                }
                if grayscale {
                    frame = frame.grayscale();
                }
                if verbose {
                    eprintln!("{index}: {} x {}", frame.width(), frame.height());
                }
                Ok(frame)
            })?;

            if let Some(bar) = progress_bar {
                bar.finish_with_message("done");
            }
            if let Some(warning) = &summary.probe_warning {
                warn(warning);
            }
            if summary.frames_skipped > 0 {
                warn(&format!(
                    "{} frame(s) could not be decoded",
                    summary.frames_skipped
                ));
            }
            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Wrote {} frame(s) at {} to {}",
                    summary.frames_written,
                    summary.frame_rate,
                    output.display()
                )
                .green()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framepipe", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, parse_codec, parse_pixel_format};
    use clap::CommandFactory;
    use framepipe::{PixelFormat, VideoCodec};

    #[test]
    fn parse_pixel_format_aliases() {
        assert_eq!(parse_pixel_format("RGB"), Some(PixelFormat::Rgb8));
        assert_eq!(parse_pixel_format("rgba8"), Some(PixelFormat::Rgba8));
        assert_eq!(parse_pixel_format("grayscale"), Some(PixelFormat::Gray8));
        assert!(parse_pixel_format("yuv420p").is_none());
    }

    #[test]
    fn parse_codec_aliases() {
        assert_eq!(parse_codec("h264"), Some(VideoCodec::H264));
        assert_eq!(parse_codec("HEVC"), Some(VideoCodec::H265));
        assert_eq!(parse_codec("mpeg4"), Some(VideoCodec::Mpeg4));
        assert!(parse_codec("vp9").is_none());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
