//! Out-of-process model adapters.
//!
//! The configured program receives the image as PNG on stdin and prints a
//! JSON document on stdout. A non-zero exit status or unparsable output is a
//! [`ModelError`].

use crate::codec::encode_rgb_png;
use crate::error::ModelError;
use crate::model::{InstanceSegmenter, LocatorOutput, ObjectLocator};
use plaque_core::{BinaryMask, FrameSize, MaskError, RgbImage, RgbImageView};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Program plus arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Run to completion with `input` on stdin; returns captured stdout.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, input), fields(program = %self.program, input_len = input.len()))
    )]
    pub fn run(&self, input: &[u8]) -> Result<Vec<u8>, ModelError> {
        log::debug!("running `{}` {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ModelError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        // Feed stdin from a second thread so a child that streams output
        // before draining its input cannot deadlock on a full pipe.
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> std::io::Result<()> {
                if let Some(mut stdin) = stdin {
                    stdin.write_all(input)?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            if let Ok(Err(e)) = writer.join() {
                // Models that ignore stdin close it early; only the exit status matters.
                log::debug!("`{}` did not consume its input: {e}", self.program);
            }
            output
        })
        .map_err(|source| ModelError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(ModelError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

fn png_input(image: &RgbImageView<'_>) -> Result<Vec<u8>, ModelError> {
    let owned = RgbImage {
        width: image.width,
        height: image.height,
        data: image.data.to_vec(),
    };
    Ok(encode_rgb_png(&owned)?)
}

/// Object locator backed by an external program.
///
/// Expected stdout:
/// `{"frame":{"width":640,"height":640},"detections":[{"bbox":[x1,y1,x2,y2],"confidence":0.93,"class_label":"teeth"}]}`
#[derive(Clone, Debug)]
pub struct ProcessLocator {
    command: CommandSpec,
}

impl ProcessLocator {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl ObjectLocator for ProcessLocator {
    fn detect(&self, image: &RgbImageView<'_>) -> Result<LocatorOutput, ModelError> {
        let stdout = self.command.run(&png_input(image)?)?;
        Ok(serde_json::from_slice(&stdout)?)
    }
}

/// Uncompressed row-major run-length mask, runs alternating from `false`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRle {
    pub width: usize,
    pub height: usize,
    pub counts: Vec<usize>,
}

impl MaskRle {
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub fn decode(&self) -> Result<BinaryMask, ModelError> {
        Ok(BinaryMask::from_rle(self.width, self.height, &self.counts)?)
    }

    /// Decode only when the declared size is `expected`.
    pub fn decode_sized(&self, expected: FrameSize) -> Result<BinaryMask, ModelError> {
        if self.size() != expected {
            return Err(MaskError::SizeMismatch {
                mask: self.size(),
                image: expected,
            }
            .into());
        }
        self.decode()
    }
}

/// Stdout document of a segmenter program.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmenterOutput {
    #[serde(default)]
    pub masks: Vec<MaskRle>,
}

/// Instance segmenter backed by an external program.
#[derive(Clone, Debug)]
pub struct ProcessSegmenter {
    command: CommandSpec,
}

impl ProcessSegmenter {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl InstanceSegmenter for ProcessSegmenter {
    fn predict(&self, image: &RgbImageView<'_>) -> Result<Vec<BinaryMask>, ModelError> {
        let stdout = self.command.run(&png_input(image)?)?;
        let parsed: SegmenterOutput = serde_json::from_slice(&stdout)?;
        let expected = FrameSize::new(image.width, image.height);
        parsed
            .masks
            .iter()
            .map(|m| m.decode_sized(expected))
            .collect()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    fn tiny() -> RgbImage {
        RgbImage::from_pixel(4, 2, [10, 20, 30])
    }

    #[test]
    fn locator_parses_program_output() {
        let locator = ProcessLocator::new(sh(
            r#"cat > /dev/null; echo '{"frame":{"width":4,"height":2},"detections":[{"bbox":[0,0,2,2],"confidence":0.7}]}'"#,
        ));
        let out = locator.detect(&tiny().view()).expect("detect");
        assert_eq!(out.frame.width, 4);
        assert_eq!(out.detections.len(), 1);
    }

    #[test]
    fn segmenter_decodes_rle_masks() {
        let segmenter = ProcessSegmenter::new(sh(
            r#"cat > /dev/null; echo '{"masks":[{"width":4,"height":2,"counts":[1,2,5]},{"width":4,"height":2,"counts":[0,8]}]}'"#,
        ));
        let masks = segmenter.predict(&tiny().view()).expect("predict");
        assert_eq!(masks.len(), 2);
        assert_eq!(masks[0].count(), 2);
        assert_eq!(masks[1].count(), 8);
    }

    #[test]
    fn mask_sized_for_another_image_is_rejected_before_decoding() {
        let segmenter = ProcessSegmenter::new(sh(
            r#"cat > /dev/null; echo '{"masks":[{"width":18446744073709551615,"height":2,"counts":[1]}]}'"#,
        ));
        let err = segmenter.predict(&tiny().view()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Mask(MaskError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn overflowing_runs_are_a_mask_error() {
        let rle = MaskRle {
            width: 4,
            height: 2,
            counts: vec![usize::MAX, 9],
        };
        let err = rle.decode_sized(FrameSize::new(4, 2)).unwrap_err();
        assert!(matches!(err, ModelError::Mask(MaskError::RleOverflow { .. })));
    }

    #[test]
    fn failing_program_reports_status_and_stderr() {
        let locator = ProcessLocator::new(sh("echo weights missing >&2; exit 3"));
        let err = locator.detect(&tiny().view()).unwrap_err();
        match err {
            ModelError::Failed { stderr, .. } => assert_eq!(stderr, "weights missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_output_is_rejected() {
        let segmenter = ProcessSegmenter::new(sh("echo not-json"));
        let err = segmenter.predict(&tiny().view()).unwrap_err();
        assert!(matches!(err, ModelError::Output(_)));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let locator = ProcessLocator::new(CommandSpec::new("/nonexistent/teeth-locator"));
        let err = locator.detect(&tiny().view()).unwrap_err();
        assert!(matches!(err, ModelError::Spawn { .. }));
    }
}
