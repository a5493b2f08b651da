use crate::config::InputLayout;
use image::{ImageReader, RgbImage};
use ndarray::{Array, Ix4};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("unable to read image: {0}")]
    Read(#[from] std::io::Error),
    #[error("unable to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Source neighbours and weight of one output coordinate.
#[derive(Debug, Clone, Copy)]
struct Tap {
    lower: usize,
    upper: usize,
    frac: f32,
}

/// Half-pixel-centre bilinear sampling positions, no antialiasing.
fn bilinear_taps(src: u32, dst: u32) -> Vec<Tap> {
    let scale = src as f32 / dst as f32;
    let last = src as usize - 1;
    (0..dst)
        .map(|d| {
            let pos = ((d as f32 + 0.5) * scale - 0.5).clamp(0.0, last as f32);
            let lower = pos.floor() as usize;
            Tap {
                lower,
                upper: (lower + 1).min(last),
                frac: pos - lower as f32,
            }
        })
        .collect()
}

/// Decodes `image_data` into a `[1, size, size, 3]` (or `[1, 3, size, size]`)
/// tensor of RGB values scaled to `[0, 1]`.
///
/// Animated formats contribute their first frame only, alpha is dropped and
/// grayscale is expanded to three channels. Resizing is bilinear on float
/// values, so nothing is rounded back to 8 bits before scaling.
pub fn transform_image(
    image_data: &[u8],
    size: u32,
    layout: InputLayout,
) -> Result<Array<f32, Ix4>, PreprocessError> {
    let image_reader = ImageReader::new(Cursor::new(image_data)).with_guessed_format()?;
    let rgb = image_reader.decode()?.to_rgb8();
    tracing::debug!("Decoded {}x{} image", rgb.width(), rgb.height());

    Ok(resize_bilinear(&rgb, size, layout))
}

fn resize_bilinear(rgb: &RgbImage, size: u32, layout: InputLayout) -> Array<f32, Ix4> {
    let x_taps = bilinear_taps(rgb.width(), size);
    let y_taps = bilinear_taps(rgb.height(), size);

    let side = size as usize;
    let mut input = match layout {
        InputLayout::Nhwc => Array::zeros((1, side, side, 3)),
        InputLayout::Nchw => Array::zeros((1, 3, side, side)),
    };

    let px = |x: usize, y: usize, c: usize| rgb.get_pixel(x as u32, y as u32).0[c] as f32;

    for (y, ty) in y_taps.iter().enumerate() {
        for (x, tx) in x_taps.iter().enumerate() {
            for channel in 0..3 {
                let top = px(tx.lower, ty.lower, channel) * (1. - tx.frac)
                    + px(tx.upper, ty.lower, channel) * tx.frac;
                let bottom = px(tx.lower, ty.upper, channel) * (1. - tx.frac)
                    + px(tx.upper, ty.upper, channel) * tx.frac;
                let value = (top * (1. - ty.frac) + bottom * ty.frac) / 255.;
                match layout {
                    InputLayout::Nhwc => input[[0, y, x, channel]] = value,
                    InputLayout::Nchw => input[[0, channel, y, x]] = value,
                }
            }
        }
    }

    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{
        codecs::gif::GifEncoder, Delay, Frame, ImageBuffer, Luma, Rgb, Rgba, RgbaImage,
    };

    fn encode_png(img: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_transform_image_nhwc() {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(40, 70, Rgb([255, 0, 0]));
        let input = transform_image(&encode_png(&img), 100, InputLayout::Nhwc).unwrap();

        assert_eq!(input.shape(), &[1, 100, 100, 3]);
        assert!((input[[0, 50, 50, 0]] - 1.0).abs() < 1e-6);
        assert!(input[[0, 50, 50, 1]].abs() < 1e-6);
        assert!(input[[0, 99, 0, 2]].abs() < 1e-6);
    }

    #[test]
    fn test_transform_image_nchw() {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(100, 100, Rgb([0, 0, 255]));
        let input = transform_image(&encode_png(&img), 100, InputLayout::Nchw).unwrap();

        assert_eq!(input.shape(), &[1, 3, 100, 100]);
        assert!((input[[0, 2, 10, 90]] - 1.0).abs() < 1e-6);
        assert!(input[[0, 0, 10, 90]].abs() < 1e-6);
    }

    #[test]
    fn test_white_image_is_all_ones() {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(50, 50, Rgb([255, 255, 255]));
        let input = transform_image(&encode_png(&img), 100, InputLayout::Nhwc).unwrap();

        assert!(input.iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_values_stay_in_unit_range() {
        let img = ImageBuffer::from_fn(37, 23, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        });
        let input = transform_image(&encode_png(&img), 100, InputLayout::Nhwc).unwrap();

        assert!(input.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_grayscale_is_expanded_to_rgb() {
        let img = ImageBuffer::<Luma<u8>, Vec<u8>>::from_pixel(10, 10, Luma([255]));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();

        let input = transform_image(cursor.get_ref(), 100, InputLayout::Nhwc).unwrap();
        assert_eq!(input.shape(), &[1, 100, 100, 3]);
        assert!((input[[0, 0, 0, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_animated_gif_uses_first_frame() {
        let red = RgbaImage::from_pixel(20, 20, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 255, 255]));
        let mut data = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut data);
            encoder
                .encode_frames(vec![
                    Frame::from_parts(red, 0, 0, Delay::from_numer_denom_ms(100, 1)),
                    Frame::from_parts(blue, 0, 0, Delay::from_numer_denom_ms(100, 1)),
                ])
                .unwrap();
        }

        let input = transform_image(&data, 100, InputLayout::Nhwc).unwrap();
        assert!(input[[0, 50, 50, 0]] > 0.9);
        assert!(input[[0, 50, 50, 2]] < 0.1);
    }

    #[test]
    fn test_downscale_samples_without_blurring() {
        // 3-px wide vertical stripes, 12 -> 4 lands every sample on a pixel centre
        let img = ImageBuffer::from_fn(12, 12, |x, _| {
            let v = if (x / 3) % 2 == 0 { 255 } else { 0 };
            Rgb([v, v, v])
        });
        let input = transform_image(&encode_png(&img), 4, InputLayout::Nhwc).unwrap();

        let row: Vec<f32> = (0..4).map(|x| input[[0, 0, x, 0]]).collect();
        assert_eq!(row, vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_downscale_interpolates_between_neighbours() {
        // red ramps along x, green along y; 10 -> 4 samples at 0.75, 3.25, 5.75, 8.25
        let img = ImageBuffer::from_fn(10, 10, |x, y| Rgb([(x * 25) as u8, (y * 25) as u8, 0]));
        let input = transform_image(&encode_png(&img), 4, InputLayout::Nhwc).unwrap();

        let expected: [f32; 4] = [18.75, 81.25, 143.75, 206.25];
        for (i, e) in expected.iter().enumerate() {
            assert!((input[[0, 2, i, 0]] - e / 255.).abs() < 1e-5);
            assert!((input[[0, i, 2, 1]] - e / 255.).abs() < 1e-5);
        }
    }

    #[test]
    fn test_upscale_clamps_at_the_edges() {
        // 4 -> 8 samples at -0.25 (clamped to 0) .. 3.25 (clamped to 3)
        let img = ImageBuffer::from_fn(4, 4, |x, _| Rgb([(x * 25) as u8, 0, 0]));
        let input = transform_image(&encode_png(&img), 8, InputLayout::Nchw).unwrap();

        assert_eq!(input[[0, 0, 0, 0]], 0.0);
        assert!((input[[0, 0, 0, 1]] - 6.25 / 255.).abs() < 1e-5);
        assert!((input[[0, 0, 0, 7]] - 75. / 255.).abs() < 1e-5);
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let result = transform_image(b"definitely not an image", 100, InputLayout::Nhwc);
        assert!(matches!(result, Err(PreprocessError::Decode(_))));
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        assert!(transform_image(&[], 100, InputLayout::Nhwc).is_err());
    }
}
