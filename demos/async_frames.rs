//! Async frame reading example (feature = "async").
//!
//! Usage:
//!   cargo run --features=async --example async_frames -- <input_file>

use std::error::Error;

use tokio_stream::StreamExt;
use framepipe::{FrameStream, PixelFormat, ReaderOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "input.mp4".to_string());

    println!("Streaming {input_path}...");
    let options = ReaderOptions::new().with_pixel_format(PixelFormat::Rgba8);
    let mut stream = FrameStream::open(&input_path, options);

    let mut count = 0u64;
    while let Some(result) = stream.next().await {
        let (frame_number, image) = result?;
        if count == 0 {
            image.save("async_first_frame.png")?;
            println!(
                "Saved async_first_frame.png ({}x{})",
                image.width(),
                image.height(),
            );
        }
        count += 1;
        print!("\rProcessed frame {frame_number} ({count} total)");
    }
    println!();

    println!("Done!");
    Ok(())
}
