use std::io::{BufRead, Cursor, Seek};
use std::path::Path;
use std::process::Command;

use anyhow::Result;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use tempdir::TempDir;

use crate::models::InferenceRequest;

pub const PICKER_TITLE: &str = "Take or Choose an Image";
pub const PICKER_MESSAGE: &str = "Please use the included otoscope to take a photo with your \
     camera, or choose one you have already taken from your photo library.";

/// File extensions offered by the library picker
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp", "bmp"];

/// Placeholder in the camera command replaced by the capture file path
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Library,
}

impl ImageSource {
    pub fn label(self) -> &'static str {
        match self {
            ImageSource::Camera => "Take Photo",
            ImageSource::Library => "Choose Photo",
        }
    }
}

/// Sources to offer the user. Without a camera the library is the only choice
/// and no prompt is needed.
pub fn source_choices(camera_available: bool) -> Vec<ImageSource> {
    if camera_available {
        vec![ImageSource::Camera, ImageSource::Library]
    } else {
        vec![ImageSource::Library]
    }
}

/// A decoded image with the orientation recorded by its source.
/// The orientation has not been applied to the pixels yet.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    pub image: DynamicImage,
    pub orientation: Orientation,
}

impl AcquiredImage {
    pub fn into_request(self) -> InferenceRequest {
        InferenceRequest::new(self.image, self.orientation)
    }

    /// Upright copy for previews
    pub fn upright(&self) -> DynamicImage {
        let mut image = self.image.clone();
        image.apply_orientation(self.orientation);
        image
    }
}

pub fn decode_file(path: &Path) -> Result<AcquiredImage> {
    let reader = ImageReader::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
    decode(reader).map_err(|e| anyhow::anyhow!("Failed to decode {}: {}", path.display(), e))
}

pub fn decode_bytes(bytes: &[u8]) -> Result<AcquiredImage> {
    decode(ImageReader::new(Cursor::new(bytes)))
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))
}

fn decode<R: BufRead + Seek>(reader: ImageReader<R>) -> Result<AcquiredImage> {
    let mut decoder = reader.with_guessed_format()?.into_decoder()?;
    let orientation = decoder.orientation().unwrap_or_else(|e| {
        log::warn!("Could not read image orientation, assuming upright: {}", e);
        Orientation::NoTransforms
    });
    let image = DynamicImage::from_decoder(decoder)?;

    if image.width() == 0 || image.height() == 0 {
        anyhow::bail!("Image has no pixels");
    }

    Ok(AcquiredImage { image, orientation })
}

/// Take a photo by running an external capture command.
///
/// Every `{output}` in the arguments is replaced with the path the command
/// must write the photo to.
pub fn capture_with_command(command: &[String]) -> Result<AcquiredImage> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Camera command is empty"))?;

    let dir = TempDir::new("otofind-capture")?;
    let output = dir.path().join("capture.jpg");
    let output_str = output.to_string_lossy();
    let args: Vec<String> = args
        .iter()
        .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output_str))
        .collect();

    log::debug!("Running camera command: {} {}", program, args.join(" "));
    let status = Command::new(program)
        .args(&args)
        .status()
        .map_err(|e| anyhow::anyhow!("Failed to run camera command '{}': {}", program, e))?;

    if !status.success() {
        anyhow::bail!("Camera command '{}' exited with {}", program, status);
    }
    if !output.exists() {
        anyhow::bail!("Camera command '{}' did not write a photo", program);
    }

    let bytes = std::fs::read(&output)
        .map_err(|e| anyhow::anyhow!("Failed to read captured photo: {}", e))?;
    decode_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_source_choices() {
        assert_eq!(
            source_choices(true),
            vec![ImageSource::Camera, ImageSource::Library]
        );
        assert_eq!(source_choices(false), vec![ImageSource::Library]);
        assert_eq!(ImageSource::Camera.label(), "Take Photo");
    }

    #[test]
    fn test_decode_bytes_without_exif_is_upright() {
        let acquired = decode_bytes(&png_bytes(30, 20)).unwrap();
        assert_eq!((acquired.image.width(), acquired.image.height()), (30, 20));
        assert_eq!(acquired.orientation, Orientation::NoTransforms);
    }

    #[test]
    fn test_decode_garbage_is_an_error() {
        assert!(decode_bytes(b"definitely not an image").is_err());
        assert!(decode_file(Path::new("/nonexistent/eardrum.jpg")).is_err());
    }

    #[test]
    fn test_upright_applies_orientation() {
        let acquired = AcquiredImage {
            image: DynamicImage::new_rgb8(30, 20),
            orientation: Orientation::Rotate270,
        };
        let upright = acquired.upright();
        assert_eq!((upright.width(), upright.height()), (20, 30));

        let request = acquired.into_request();
        assert_eq!(request.orientation, Orientation::Rotate270);
        assert_eq!(request.image.width(), 30);
    }

    #[test]
    fn test_empty_camera_command() {
        assert!(capture_with_command(&[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_with_command_copies_photo() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("otoscope.png");
        std::fs::write(&source, png_bytes(16, 12)).unwrap();

        let command = vec![
            "cp".to_string(),
            source.to_string_lossy().to_string(),
            OUTPUT_PLACEHOLDER.to_string(),
        ];
        let acquired = capture_with_command(&command).unwrap();
        assert_eq!((acquired.image.width(), acquired.image.height()), (16, 12));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_camera_command() {
        let command = vec!["false".to_string()];
        assert!(capture_with_command(&command).is_err());
    }
}
