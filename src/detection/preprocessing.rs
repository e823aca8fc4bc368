use image::{Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use imageproc::map::{blue_channel, green_channel, red_channel};
use imageproc::morphology::{Mask, grayscale_open};
use palette::{FromColor, Hsv, Srgb};

/// Apply Gaussian blur to reduce sensor noise. A sigma of zero returns a copy.
pub fn apply_blur(img: &RgbImage, sigma: f32) -> RgbImage {
    if sigma <= 0.0 {
        return img.clone();
    }
    gaussian_blur_f32(img, sigma)
}

/// Convert one RGB pixel to 8-bit HSV: hue is halved into 0..180 so it fits a byte,
/// saturation and value are scaled to 0..=255.
pub fn rgb_to_hsv8(rgb: [u8; 3]) -> [u8; 3] {
    let srgb: Srgb<f32> = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format();
    let hsv: Hsv = Hsv::from_color(srgb);

    let hue = if hsv.saturation > 0.0 {
        (hsv.hue.into_positive_degrees() / 2.0).round() as u32 % 180
    } else {
        0
    };
    let saturation = (hsv.saturation * 255.0).round().clamp(0.0, 255.0) as u8;
    let value = (hsv.value * 255.0).round().clamp(0.0, 255.0) as u8;
    [hue as u8, saturation, value]
}

/// Convert a whole image to 8-bit HSV, stored channel-for-channel in an `RgbImage`
pub fn to_hsv(img: &RgbImage) -> RgbImage {
    let mut hsv = RgbImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        hsv.put_pixel(x, y, Rgb(rgb_to_hsv8(pixel.0)));
    }
    hsv
}

/// Grayscale opening (erosion then dilation) with a `size`x`size` square,
/// applied independently to each channel of a 3-channel image.
pub fn open_channels(img: &RgbImage, size: u32) -> RgbImage {
    if size <= 1 {
        return img.clone();
    }
    let mask = Mask::square(u8::try_from(size / 2).unwrap_or(u8::MAX));
    let [r, g, b] = [red_channel(img), green_channel(img), blue_channel(img)]
        .map(|channel| grayscale_open(&channel, &mask));

    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        Rgb([r.get_pixel(x, y)[0], g.get_pixel(x, y)[0], b.get_pixel(x, y)[0]])
    })
}
