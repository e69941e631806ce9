//! Benchmarks for the frame scanner and PNG codec.
//!
//! Run with: cargo bench
//!
//! Works on a synthetic in-memory stream, so no fixtures or `ffmpeg` are
//! needed.

use std::{hint::black_box, io::Cursor, time::Duration};

use criterion::{BenchmarkId, Criterion, Throughput};
use framepipe::{FrameReader, FrameScanner, ReaderOptions, ReaderSource, codec};
use image::{DynamicImage, Rgb, RgbImage};

const FRAME_COUNT: usize = 60;

fn synthetic_stream(width: u32, height: u32) -> Vec<u8> {
    let mut stream = Vec::new();
    for index in 0..FRAME_COUNT {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x + index as u32) as u8, y as u8, (x ^ y) as u8])
        });
        let payload = codec::encode_frame(&DynamicImage::ImageRgb8(image)).unwrap();
        stream.extend_from_slice(&payload);
    }
    stream
}

fn benchmark_scanner_chunk_sizes(criterion: &mut Criterion) {
    let stream = synthetic_stream(160, 120);
    let mut group = criterion.benchmark_group("scan payloads");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    for chunk_size in [64_usize, 1024, 16 * 1024, 256 * 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |bencher, &chunk_size| {
                bencher.iter(|| {
                    let source = ReaderSource::new(Cursor::new(stream.as_slice()));
                    let mut scanner = FrameScanner::with_chunk_size(source, chunk_size);
                    let mut total = 0;
                    while let Some(length) = scanner.next_payload_with(|payload| payload.len()).unwrap() {
                        total += length;
                    }
                    black_box(total)
                });
            },
        );
    }
    group.finish();
}

fn benchmark_decode_frames(criterion: &mut Criterion) {
    let stream = synthetic_stream(320, 240);

    criterion.bench_function("scan and decode 60 frames (320x240)", |bencher| {
        bencher.iter(|| {
            let source = ReaderSource::new(Cursor::new(stream.as_slice()));
            let mut reader = FrameReader::new(source, &ReaderOptions::new());
            let mut count = 0;
            while let Some(frame) = reader.next_frame().unwrap() {
                black_box(frame);
                count += 1;
            }
            count
        });
    });
}

fn benchmark_encode_frame(criterion: &mut Criterion) {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(320, 240, |x, y| {
        Rgb([x as u8, y as u8, 128])
    }));

    criterion.bench_function("encode frame (320x240)", |bencher| {
        bencher.iter(|| codec::encode_frame(black_box(&image)).unwrap());
    });

    criterion.bench_function("swap red/blue (320x240)", |bencher| {
        bencher.iter(|| codec::swap_red_blue(black_box(image.clone())));
    });
}

criterion::criterion_group!(
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = benchmark_scanner_chunk_sizes, benchmark_decode_frames, benchmark_encode_frame
);
criterion::criterion_main!(benches);
