//! Swap the red and blue channels of every frame in a video.
//!
//! Usage:
//!   cargo run --example swap_channels -- <input_file> [output_file]

use std::error::Error;

use framepipe::{ToolOptions, VideoReader, VideoWriter, WriterOptions, codec, probe_frame_rate};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let input_path = args.next().unwrap_or_else(|| "input.mp4".to_string());
    let output_path = args.next().unwrap_or_else(|| "swapped.mp4".to_string());

    let probe = probe_frame_rate(&input_path, &ToolOptions::from_env());
    if let Some(warning) = &probe.warning {
        eprintln!("{warning}");
    }
    println!("Frame rate: {}", probe.rate);

    let mut reader = VideoReader::open(&input_path)?;
    let mut writer = VideoWriter::create(&output_path, probe.rate, WriterOptions::new())?;

    while let Some(frame) = reader.next_frame()? {
        writer.write_frame(&codec::swap_red_blue(frame))?;
        print!("\rWrote {} frames", writer.frames_written());
    }
    println!();

    reader.close()?;
    let written = writer.finish()?;
    println!("Done: {written} frames -> {output_path}");
    Ok(())
}
