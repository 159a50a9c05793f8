//! Stillframe CLI
//!
//! Command-line interface for inspecting images and driving the source.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use stillframe::{
    decode, FixedCaps, Framerate, ImageSource, PixelFormat, Resolution, SourceConfig, VideoCaps,
};

#[derive(Parser)]
#[command(name = "stillframe")]
#[command(about = "Static image video source - decode once, serve frames forever")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an image and print what was found
    Info {
        /// Image path (png, jpg/jpeg/jpp)
        location: PathBuf,
    },

    /// List output formats and their plane layout
    Formats {
        /// Resolution used for the layout table (e.g., 1920x1080)
        #[arg(short, long, default_value = "1920x1080")]
        resolution: String,
    },

    /// Serve frames from an image
    Run {
        /// Image path (overrides the config file)
        #[arg(short, long)]
        location: Option<PathBuf>,

        /// TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Framerate (e.g., 30/1 or 30)
        #[arg(long)]
        fps: Option<Framerate>,

        /// Forced output width
        #[arg(long)]
        width: Option<u32>,

        /// Forced output height
        #[arg(long)]
        height: Option<u32>,

        /// Output pixel format fixed on the link (RGBA, BGRA, ARGB, ABGR, NV12, I420)
        #[arg(long)]
        format: Option<PixelFormat>,

        /// Stop after this many frames (runs until Ctrl+C if unset)
        #[arg(short = 'n', long)]
        frames: Option<u64>,

        /// Write raw frames to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pace frames at the configured framerate
        #[arg(long)]
        realtime: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stillframe=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { location } => cmd_info(location),
        Commands::Formats { resolution } => cmd_formats(&resolution),
        Commands::Run {
            location,
            config,
            fps,
            width,
            height,
            format,
            frames,
            output,
            realtime,
        } => {
            let mut source_config = match config {
                Some(path) => SourceConfig::from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SourceConfig::default(),
            };
            if let Some(location) = location {
                source_config.location = Some(location);
            }
            if let Some(fps) = fps {
                source_config.set_framerate(fps);
            }
            if let Some(width) = width {
                source_config.width = width;
            }
            if let Some(height) = height {
                source_config.height = height;
            }

            cmd_run(source_config, format, frames, output, realtime).await
        }
    }
}

fn cmd_info(location: PathBuf) -> anyhow::Result<()> {
    let kind = decode::ImageKind::from_path(&location)?;
    let image = decode::decode_file(&location)?;

    println!("Stillframe {}", stillframe::VERSION);
    println!("==============\n");
    println!("File: {}", location.display());
    println!("Kind: {}", kind);
    println!("Size: {}", image.resolution());
    println!("RGBA bytes: {}", image.pixels().len());

    Ok(())
}

fn cmd_formats(resolution: &str) -> anyhow::Result<()> {
    let resolution = parse_resolution(resolution)?;

    println!("Output formats at {}", resolution);
    println!("=======================\n");

    for format in PixelFormat::ALL {
        println!(
            "{:<6} {} bytes{}",
            format.name(),
            format.frame_size(resolution),
            if format.is_yuv() { " (BT.601)" } else { "" }
        );
        for (i, plane) in format.plane_layouts(resolution).iter().enumerate() {
            println!(
                "  plane {}: offset={} stride={} len={}",
                i, plane.offset, plane.stride, plane.len
            );
        }
    }

    Ok(())
}

fn parse_resolution(s: &str) -> anyhow::Result<Resolution> {
    let (w, h) = s
        .split_once('x')
        .with_context(|| format!("resolution '{}' is not WxH", s))?;
    Ok(Resolution::new(w.trim().parse()?, h.trim().parse()?))
}

async fn cmd_run(
    config: SourceConfig,
    format: Option<PixelFormat>,
    frames: Option<u64>,
    output: Option<PathBuf>,
    realtime: bool,
) -> anyhow::Result<()> {
    let mut source = ImageSource::new(config, FixedCaps::new());
    source.start()?;

    // Without --format the source fixes RGBA itself
    let loaded = source.source_image().map(|image| image.resolution());
    if let (Some(format), Some(resolution)) = (format, loaded) {
        let caps = VideoCaps::new(format, resolution, source.config().framerate);
        source.negotiator_mut().set_current(Some(caps));
    }

    let mut writer = match &output {
        Some(path) => Some(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let mut ticker = tokio::time::interval(Duration::from_nanos(source.frame_duration_ns()));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let framerate = source.config().framerate;
    println!(
        "Serving frames at {} ({:.2} fps). Press Ctrl+C to stop.\n",
        framerate,
        framerate.as_f64()
    );

    let start = std::time::Instant::now();
    let mut emitted = 0u64;
    let mut bytes_written = 0u64;

    while frames.map_or(true, |limit| emitted < limit) {
        if realtime {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut ctrl_c => break,
            }
        } else if interrupted(&mut ctrl_c).await {
            break;
        }

        let frame = source.next_frame()?;
        if emitted == 0 {
            println!(
                "Format: {} {} ({} bytes/frame)",
                frame.format(),
                frame.resolution(),
                frame.data().len()
            );
        }
        if let Some(w) = writer.as_mut() {
            w.write_all(frame.data())?;
            bytes_written += frame.data().len() as u64;
        }
        emitted += 1;
    }

    if let Some(mut w) = writer {
        w.flush()?;
    }

    let elapsed = start.elapsed();
    source.stop();

    println!("\nStatistics:");
    println!("  Frames served: {}", emitted);
    println!("  Bytes written: {}", bytes_written);
    println!("  Elapsed: {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Poll Ctrl+C once without waiting
async fn interrupted<F: std::future::Future + Unpin>(signal: &mut F) -> bool {
    tokio::select! {
        biased;
        _ = signal => true,
        _ = std::future::ready(()) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_interrupted_polls_without_waiting() {
        let mut pending = std::future::pending::<()>();
        assert!(!interrupted(&mut pending).await);

        let mut fired = std::future::ready(());
        assert!(interrupted(&mut fired).await);
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("640x480").unwrap(), Resolution::new(640, 480));
        assert!(parse_resolution("640").is_err());
        assert!(parse_resolution("wide x tall").is_err());
    }
}
