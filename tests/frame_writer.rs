//! FrameWriter integration tests.
//!
//! Frames are written into in-memory sinks and read back with the frame
//! reader; no `ffmpeg` is involved.

use std::io::{Cursor, Error as IoError, ErrorKind, Write};

use framepipe::{
    ByteSink, FramePipeError, FrameReader, FrameWriter, ReaderOptions, ReaderSource, WriterSink,
    codec,
};
use image::{DynamicImage, Rgb, RgbImage};

fn checkerboard(size: u32, tone: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([tone, tone, tone])
        } else {
            Rgb([0, 255 - tone, 0])
        }
    }))
}

/// Accepts at most `limit` bytes in total, then fails every write.
struct LimitedWriter {
    accepted: Vec<u8>,
    limit: usize,
}

impl Write for LimitedWriter {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        let room = self.limit - self.accepted.len();
        if room == 0 {
            return Err(IoError::new(ErrorKind::BrokenPipe, "reader went away"));
        }
        let count = room.min(bytes.len());
        self.accepted.extend_from_slice(&bytes[..count]);
        Ok(count)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Records whether it was closed.
#[derive(Default)]
struct RecordingSink {
    bytes: Vec<u8>,
    closes: usize,
}

impl ByteSink for &mut RecordingSink {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.bytes.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn close(&mut self) -> Result<(), FramePipeError> {
        self.closes += 1;
        Ok(())
    }
}

#[test]
fn written_frames_read_back_identically() {
    let frames: Vec<_> = (0..4).map(|index| checkerboard(9, index * 60)).collect();

    let mut writer = FrameWriter::new(WriterSink::new(Vec::new()));
    for frame in &frames {
        writer.write_frame(frame).unwrap();
    }
    assert_eq!(writer.frames_written(), 4);
    let bytes_written = writer.bytes_written();

    let stream = {
        let mut sink = WriterSink::new(Vec::new());
        for frame in &frames {
            sink.write(&codec::encode_frame(frame).unwrap()).unwrap();
        }
        sink.into_inner().unwrap()
    };
    assert_eq!(stream.len() as u64, bytes_written);
    assert_eq!(writer.finish().unwrap(), 4);

    let mut reader = FrameReader::new(ReaderSource::new(Cursor::new(stream)), &ReaderOptions::new());
    for expected in &frames {
        assert_eq!(reader.next_frame().unwrap().as_ref(), Some(expected));
    }
    assert!(reader.next_frame().unwrap().is_none());
}

#[test]
fn short_write_is_reported_for_that_frame() {
    let frame = checkerboard(16, 128);
    let payload_len = codec::encode_frame(&frame).unwrap().len();
    let sink = WriterSink::new(LimitedWriter {
        accepted: Vec::new(),
        limit: payload_len / 2,
    });

    let mut writer = FrameWriter::new(sink);
    match writer.write_frame(&frame) {
        Err(FramePipeError::ShortWrite { written, expected }) => {
            assert_eq!(written, payload_len / 2);
            assert_eq!(expected, payload_len);
        }
        other => panic!("expected a short write, got {other:?}"),
    }
    assert_eq!(writer.frames_written(), 0);
    assert_eq!(writer.bytes_written(), (payload_len / 2) as u64);

    // Nothing is accepted any more, so the next frame is an I/O error.
    assert!(matches!(
        writer.write_frame(&frame),
        Err(FramePipeError::IoError(_))
    ));
}

#[test]
fn writing_after_close_fails() {
    let mut sink = WriterSink::new(Vec::new());
    sink.close().unwrap();
    assert!(sink.is_closed());
    let error = sink.write(b"late").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::BrokenPipe);
}

#[test]
fn finish_closes_the_sink_once() {
    let mut recording = RecordingSink::default();
    {
        let mut writer = FrameWriter::new(&mut recording);
        writer.write_frame(&checkerboard(4, 1)).unwrap();
        assert_eq!(writer.finish().unwrap(), 1);
    }
    assert_eq!(recording.closes, 1);
    assert!(!recording.bytes.is_empty());
}

#[test]
fn drop_closes_an_unfinished_writer() {
    let mut recording = RecordingSink::default();
    {
        let mut writer = FrameWriter::new(&mut recording);
        writer.write_frame(&checkerboard(4, 2)).unwrap();
    }
    assert_eq!(recording.closes, 1);
}
