use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Largest dimensions that fit in a `max_edge` square while keeping the aspect ratio.
    ///
    /// Never upscales; each side is rounded and kept at one pixel or more.
    pub fn fit_within(orig_width: u32, orig_height: u32, max_edge: u32) -> (u32, u32) {
        if orig_width == 0 || orig_height == 0 {
            return (1, 1);
        }
        let scale = (max_edge as f64 / orig_width as f64)
            .min(max_edge as f64 / orig_height as f64)
            .min(1.0);

        let width = ((orig_width as f64 * scale).round() as u32).max(1);
        let height = ((orig_height as f64 * scale).round() as u32).max(1);
        (width, height)
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width.max(1) as f32;
        let height_ratio = orig_height as f32 / new_height.max(1) as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Downscale `img` to fit within `max_edge`, returning it unchanged when already small enough.
    pub fn resize_to_fit(img: DynamicImage, max_edge: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) = Self::fit_within(orig_width, orig_height, max_edge);
        if (width, height) == (orig_width, orig_height) {
            return img;
        }
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }
}
