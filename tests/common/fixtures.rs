use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use page_reader::normalize::transform;
use tempfile::NamedTempFile;

pub const PAGE_WIDTH: u32 = 1000;
pub const PAGE_HEIGHT: u32 = 1400;
pub const BLOCK_WIDTH: u32 = 600;
pub const BLOCK_HEIGHT: u32 = 300;

pub fn page_center() -> (f32, f32) {
    (PAGE_WIDTH as f32 / 2.0, PAGE_HEIGHT as f32 / 2.0)
}

/// An all-white page.
pub fn blank_page() -> DynamicImage {
    DynamicImage::ImageRgb8(
        DynamicImage::ImageLuma8(GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([255])))
            .to_rgb8(),
    )
}

/// White page with one black "text block" centred on it.
pub fn block_page() -> GrayImage {
    let mut page = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([255]));
    let x = ((PAGE_WIDTH - BLOCK_WIDTH) / 2) as i32;
    let y = ((PAGE_HEIGHT - BLOCK_HEIGHT) / 2) as i32;
    draw_filled_rect_mut(
        &mut page,
        Rect::at(x, y).of_size(BLOCK_WIDTH, BLOCK_HEIGHT),
        Luma([0]),
    );
    page
}

/// White page with rows of small glyph-like strokes filling the block area.
/// The gaps are narrow enough for dilation to merge them into one block.
pub fn glyph_page() -> GrayImage {
    let mut page = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, Luma([255]));
    let (lines, glyphs) = (7, 23);
    let grid_width = glyphs * 26 - 6;
    let grid_height = lines * 40 - 10;
    let left = (PAGE_WIDTH as i32 - grid_width) / 2;
    let top = (PAGE_HEIGHT as i32 - grid_height) / 2;
    for line in 0..lines {
        for glyph in 0..glyphs {
            let x = left + glyph * 26;
            let y = top + line * 40;
            draw_filled_rect_mut(&mut page, Rect::at(x, y).of_size(20, 30), Luma([0]));
        }
    }
    page
}

/// Paint a band of `width` pixels at `intensity` along every image edge,
/// like a table visible around the page.
pub fn with_surround(mut img: GrayImage, width: u32, intensity: u8) -> GrayImage {
    let (w, h) = img.dimensions();
    let fill = Luma([intensity]);
    draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(w, width), fill);
    draw_filled_rect_mut(&mut img, Rect::at(0, (h - width) as i32).of_size(w, width), fill);
    draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(width, h), fill);
    draw_filled_rect_mut(&mut img, Rect::at((w - width) as i32, 0).of_size(width, h), fill);
    img
}

/// The block page turned counter-clockwise by `angle` degrees, as a colour
/// photo would arrive.
pub fn rotated_block_page(angle: f32) -> DynamicImage {
    let rotated = transform::rotate(&block_page(), page_center(), angle);
    DynamicImage::ImageRgb8(DynamicImage::ImageLuma8(rotated).to_rgb8())
}

/// A rotated page photographed on a darker surface.
pub fn photo_on_table(page: &GrayImage, angle: f32) -> DynamicImage {
    let rotated = transform::rotate(page, page_center(), angle);
    DynamicImage::ImageLuma8(with_surround(rotated, 60, 40))
}

/// Writes the image to a temp PNG file that is removed when dropped.
pub fn write_temp_png(img: &DynamicImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// Asserts `actual` is within `tolerance` of `expected`.
pub fn assert_near(actual: f32, expected: f32, tolerance: f32, what: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{what}: expected {expected} ± {tolerance}, got {actual}"
    );
}
