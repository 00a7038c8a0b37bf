use anyhow::Result;
use image::metadata::Orientation;
use image::{DynamicImage, imageops::FilterType};

/// Rotate/flip pixels so the image is upright
pub fn normalize_orientation(mut image: DynamicImage, orientation: Orientation) -> DynamicImage {
    image.apply_orientation(orientation);
    image
}

/// Crop the largest centred region with the target aspect ratio, then scale it
/// to exactly `width` x `height`.
pub fn center_crop(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    let (src_w, src_h) = (image.width(), image.height());
    if src_w == 0 || src_h == 0 {
        anyhow::bail!("Cannot crop an empty image ({}x{})", src_w, src_h);
    }
    if width == 0 || height == 0 {
        anyhow::bail!("Invalid model input size {}x{}", width, height);
    }

    let target_ratio = width as f64 / height as f64;
    let src_ratio = src_w as f64 / src_h as f64;

    let (crop_w, crop_h) = if src_ratio > target_ratio {
        // Too wide: keep full height
        (((src_h as f64) * target_ratio).round() as u32, src_h)
    } else {
        (src_w, ((src_w as f64) / target_ratio).round() as u32)
    };
    let crop_w = crop_w.clamp(1, src_w);
    let crop_h = crop_h.clamp(1, src_h);

    let x = (src_w - crop_w) / 2;
    let y = (src_h - crop_h) / 2;

    Ok(image
        .crop_imm(x, y, crop_w, crop_h)
        .resize_exact(width, height, FilterType::Triangle))
}

/// RGB pixels laid out as a `[1, 3, height, width]` tensor with values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ModelInput {
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let plane = (width * height) as usize;
        let mut data = vec![0.0f32; 3 * plane];

        for (x, y, pixel) in rgb.enumerate_pixels() {
            let offset = y as usize * width as usize + x as usize;
            for c in 0..3 {
                data[c * plane + offset] = pixel[c] as f32 / 255.0;
            }
        }

        Self {
            width,
            height,
            data,
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.height as usize, self.width as usize]
    }

    pub fn value(&self, channel: usize, y: u32, x: u32) -> f32 {
        let plane = (self.width * self.height) as usize;
        self.data[channel * plane + y as usize * self.width as usize + x as usize]
    }
}

/// Center-crop to the model's input size and convert to a tensor layout
pub fn prepare_input(image: &DynamicImage, input_size: (u32, u32)) -> Result<ModelInput> {
    let (width, height) = input_size;
    let cropped = center_crop(image, width, height)?;
    Ok(ModelInput::from_image(&cropped))
}
