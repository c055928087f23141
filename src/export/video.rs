//! Video output through an opaque frame sink.
//!
//! `FfmpegSink` pipes raw RGB24 frames into an `ffmpeg` child process;
//! `PngSequenceSink` writes numbered PNGs for hosts without an encoder.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::debug;

use crate::export::ExportError;
use crate::export::frames::FrameRenderer;
use crate::stimulus::sample::Coordinates;

pub trait FrameSink {
    fn push_frame(&mut self, rgb: &[u8]) -> Result<(), ExportError>;

    /// Flush and close; returns the artifact path.
    fn finish(self: Box<Self>) -> Result<PathBuf, ExportError>;
}

/// Dropping an unfinished sink kills the encoder and removes the partial file.
pub struct FfmpegSink {
    path: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    finished: bool,
}

impl FfmpegSink {
    pub fn spawn(ffmpeg: &str, path: &Path, width: u32, height: u32, fps: u32) -> Result<Self, ExportError> {
        let encoder_err = |reason: String| ExportError::Encoder {
            path: path.display().to_string(),
            reason,
        };
        let mut child = Command::new(ffmpeg)
            .args(["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{width}x{height}")])
            .args(["-r", &fps.to_string()])
            .args(["-i", "-", "-an", "-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| encoder_err(format!("cannot run `{ffmpeg}` (is ffmpeg installed?): {e}")))?;
        let stdin = child.stdin.take();
        if stdin.is_none() {
            return Err(encoder_err("encoder stdin unavailable".to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdin,
            finished: false,
        })
    }
}

impl FrameSink for FfmpegSink {
    fn push_frame(&mut self, rgb: &[u8]) -> Result<(), ExportError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| ExportError::Encoder {
            path: self.path.display().to_string(),
            reason: "encoder already closed".to_string(),
        })?;
        stdin.write_all(rgb).map_err(|source| ExportError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn finish(mut self: Box<Self>) -> Result<PathBuf, ExportError> {
        // Closing stdin signals end of stream.
        drop(self.stdin.take());
        let status = self.child.wait().map_err(|source| ExportError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        if !status.success() {
            return Err(ExportError::Encoder {
                path: self.path.display().to_string(),
                reason: format!("ffmpeg exited with {status}"),
            });
        }
        self.finished = true;
        Ok(self.path.clone())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        if std::fs::remove_file(&self.path).is_ok() {
            debug!(target: "export", "removed partial {}", self.path.display());
        }
    }
}

pub struct PngSequenceSink {
    dir: PathBuf,
    width: u32,
    height: u32,
    next: usize,
}

impl PngSequenceSink {
    pub fn create(dir: &Path, width: u32, height: u32) -> Result<Self, ExportError> {
        std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            width,
            height,
            next: 0,
        })
    }
}

impl FrameSink for PngSequenceSink {
    fn push_frame(&mut self, rgb: &[u8]) -> Result<(), ExportError> {
        let path = self.dir.join(format!("frame{:05}.png", self.next));
        image::save_buffer(&path, rgb, self.width, self.height, image::ColorType::Rgb8).map_err(
            |source| ExportError::Image {
                path: path.display().to_string(),
                source,
            },
        )?;
        self.next += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf, ExportError> {
        Ok(self.dir)
    }
}

/// One frame per coordinate row, in order.
pub fn write_video(
    renderer: &FrameRenderer,
    coords: &Coordinates,
    mut sink: Box<dyn FrameSink>,
) -> Result<PathBuf, ExportError> {
    let mut buf = renderer.blank_frame();
    for i in 0..coords.len() {
        let [x1, y1, x2, y2] = coords.row(i);
        renderer.render(&mut buf, (x1, y1), (x2, y2))?;
        sink.push_frame(&buf)?;
    }
    let path = sink.finish()?;
    debug!(target: "export", "wrote {} frames to {}", coords.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;

    #[test]
    fn png_sequence_writes_one_file_per_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let frames_dir = dir.path().join("frames");
        let cfg = RenderConfig {
            width: 32,
            height: 24,
            disc_radius: 3,
            ..RenderConfig::default()
        };
        let renderer = FrameRenderer::new(&cfg);
        let mut coords = Coordinates::default();
        coords.push([0.0, 0.0, 5.0, 5.0]);
        coords.push([1.0, -1.0, 4.0, 4.0]);
        coords.push([2.0, -2.0, 3.0, 3.0]);

        let sink = PngSequenceSink::create(&frames_dir, cfg.width, cfg.height).expect("sink");
        let out = write_video(&renderer, &coords, Box::new(sink)).expect("video");
        assert_eq!(out, frames_dir);

        let count = std::fs::read_dir(&frames_dir).expect("read dir").count();
        assert_eq!(count, 3);
        let img = image::open(frames_dir.join("frame00002.png")).expect("decode");
        assert_eq!((img.width(), img.height()), (32, 24));
    }

    #[test]
    fn missing_encoder_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = FfmpegSink::spawn(
            "definitely-not-an-encoder-binary",
            &dir.path().join("x.mp4"),
            8,
            8,
            60,
        );
        assert!(matches!(res, Err(ExportError::Encoder { .. })));
    }

    /// Stand-in encoder: copies stdin into its last argument, then exits with `code`.
    #[cfg(unix)]
    fn fake_encoder(dir: &Path, code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(format!("fake-encoder-{code}"));
        let script = format!("#!/bin/sh\nfor a; do out=$a; done\ncat > \"$out\"\nexit {code}\n");
        std::fs::write(&path, script).expect("script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    #[cfg(unix)]
    fn wait_for(path: &Path) {
        for _ in 0..500 {
            if path.exists() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("{} never appeared", path.display());
    }

    #[cfg(unix)]
    #[test]
    fn finished_encoder_output_is_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let encoder = fake_encoder(dir.path(), 0);
        let out = dir.path().join("ok.mp4");
        let mut sink = Box::new(
            FfmpegSink::spawn(encoder.to_str().expect("utf8"), &out, 2, 2, 60).expect("spawn"),
        );
        sink.push_frame(&[7u8; 12]).expect("frame");
        sink.push_frame(&[9u8; 12]).expect("frame");
        assert_eq!(sink.finish().expect("finish"), out);
        assert_eq!(std::fs::read(&out).expect("output").len(), 24);
    }

    #[cfg(unix)]
    #[test]
    fn abandoned_encoder_is_killed_and_partial_file_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let encoder = fake_encoder(dir.path(), 0);
        let out = dir.path().join("partial.mp4");
        let mut sink =
            FfmpegSink::spawn(encoder.to_str().expect("utf8"), &out, 2, 2, 60).expect("spawn");
        sink.push_frame(&[1u8; 12]).expect("frame");
        wait_for(&out);
        drop(sink);
        assert!(!out.exists());
    }

    #[cfg(unix)]
    #[test]
    fn failed_encoder_leaves_no_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let encoder = fake_encoder(dir.path(), 3);
        let out = dir.path().join("failed.mp4");
        let mut sink = Box::new(
            FfmpegSink::spawn(encoder.to_str().expect("utf8"), &out, 2, 2, 60).expect("spawn"),
        );
        sink.push_frame(&[1u8; 12]).expect("frame");
        let err = sink.finish().expect_err("non-zero exit");
        assert!(matches!(err, ExportError::Encoder { .. }));
        assert!(!out.exists());
    }
}
