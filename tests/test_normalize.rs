mod common;

use common::*;
use image::{DynamicImage, GrayImage};
use page_reader::image_io;
use page_reader::normalize::geometry::{canonical_angle, upright_size};

const SIZE_TOLERANCE: u32 = 60;

fn assert_block_sized(img: &image::GrayImage) {
    let (w, h) = img.dimensions();
    assert!(w.abs_diff(BLOCK_WIDTH) <= SIZE_TOLERANCE, "width {w}");
    assert!(h.abs_diff(BLOCK_HEIGHT) <= SIZE_TOLERANCE, "height {h}");
}

#[test]
fn skewed_block_yields_corrective_angle() {
    let estimate = PageNormalizer::new().estimate(rotated_block_page(12.0)).unwrap();

    assert_near(canonical_angle(estimate.angle), -12.0, 1.0, "canonical angle");
    assert_near(estimate.center.0, 500.0, 3.0, "center x");
    assert_near(estimate.center.1, 700.0, 3.0, "center y");

    let (w, h) = upright_size(&estimate);
    assert_near(w, BLOCK_WIDTH as f32, 30.0, "upright width");
    assert_near(h, BLOCK_HEIGHT as f32, 30.0, "upright height");
}

#[test]
fn dark_surround_does_not_hide_the_text_block() {
    for page in [block_page(), glyph_page()] {
        let estimate = PageNormalizer::new().estimate(photo_on_table(&page, 12.0)).unwrap();

        assert_near(canonical_angle(estimate.angle), -12.0, 1.0, "canonical angle");
        assert_near(estimate.center.0, 500.0, 5.0, "center x");
        assert_near(estimate.center.1, 700.0, 5.0, "center y");
        let (w, h) = upright_size(&estimate);
        assert_near(w, BLOCK_WIDTH as f32, 30.0, "upright width");
        assert_near(h, BLOCK_HEIGHT as f32, 30.0, "upright height");
    }
}

#[test]
fn glyph_page_on_a_table_normalizes_to_the_block() {
    let page = PageNormalizer::new()
        .normalize(photo_on_table(&glyph_page(), -7.0))
        .unwrap();
    assert_block_sized(&page);
}

#[test]
fn blank_page_on_a_table_has_no_region() {
    let blank = GrayImage::from_pixel(PAGE_WIDTH, PAGE_HEIGHT, image::Luma([255]));
    let err = PageNormalizer::new()
        .normalize(photo_on_table(&blank, 10.0))
        .unwrap_err();
    assert!(matches!(err.root_cause(), NormalizeError::NoRegionFound), "{err:?}");
}

#[test]
fn opposite_skew_is_mirrored() {
    let estimate = PageNormalizer::new().estimate(rotated_block_page(-20.0)).unwrap();
    assert_near(canonical_angle(estimate.angle), 20.0, 1.0, "canonical angle");
}

#[test]
fn perspective_output_is_the_levelled_block() {
    let page = PageNormalizer::new()
        .normalize(rotated_block_page(12.0))
        .unwrap();

    assert_block_sized(&page);
    let (w, h) = page.dimensions();
    assert_eq!(page.get_pixel(0, 0)[0], 255, "border is white");
    assert_eq!(page.get_pixel(w / 2, h / 2)[0], 0, "block is black");
    assert!(page.pixels().all(|p| p[0] == 0 || p[0] == 255), "output is binary");
}

#[test]
fn rotate_strategy_crops_to_the_block() {
    let page = PageNormalizer::new()
        .with_strategy(CorrectionStrategy::Rotate)
        .normalize(rotated_block_page(12.0))
        .unwrap();

    assert_block_sized(&page);
    let (w, h) = page.dimensions();
    assert_eq!(page.get_pixel(0, 0)[0], 255);
    assert_eq!(page.get_pixel(w / 2, h / 2)[0], 0);
}

#[test]
fn straight_page_needs_no_rotation() {
    let input = DynamicImage::ImageLuma8(block_page());
    let estimate = PageNormalizer::new().estimate(input.clone()).unwrap();
    assert_near(canonical_angle(estimate.angle), 0.0, 0.5, "canonical angle");

    let page = PageNormalizer::new().normalize(input).unwrap();
    assert_block_sized(&page);

    // Only thresholding and padding touched it: the block interior is solid.
    let (w, h) = page.dimensions();
    for y in (h / 4)..(3 * h / 4) {
        for x in (w / 4)..(3 * w / 4) {
            assert_eq!(page.get_pixel(x, y)[0], 0, "({x}, {y})");
        }
    }
}

#[test]
fn fixed_cutoff_is_honoured() {
    let page = PageNormalizer::new()
        .with_cutoff(Some(140))
        .normalize(rotated_block_page(5.0))
        .unwrap();
    assert_block_sized(&page);
}

#[test]
fn blank_page_has_no_region() {
    let err = PageNormalizer::new().normalize(blank_page()).unwrap_err();

    assert!(matches!(err.root_cause(), NormalizeError::NoRegionFound), "{err:?}");
    assert_eq!(err.stage(), Some(Stage::RegionDetection));
    assert_eq!(err.to_string(), "Region Detection failed");
}

#[test]
fn diagnostics_do_not_change_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let debug_dir = dir.path().join("debug");

    let plain = PageNormalizer::new()
        .normalize(rotated_block_page(12.0))
        .unwrap();
    let traced = PageNormalizer::new()
        .with_debug_dir(Some(debug_dir.clone()))
        .normalize(rotated_block_page(12.0))
        .unwrap();
    assert_eq!(plain, traced);

    for stage_dir in [
        "00_input",
        "01_grayscale_conversion",
        "02_threshold",
        "03_dilation",
        "04_region_detection",
        "05_perspective_warp",
        "06_binarization",
        "07_border_padding",
    ] {
        assert!(debug_dir.join(stage_dir).join("01.png").is_file(), "{stage_dir}");
    }

    // A used directory is refused.
    let err = PageNormalizer::new()
        .with_debug_dir(Some(debug_dir))
        .normalize(rotated_block_page(12.0))
        .unwrap_err();
    assert!(matches!(err, NormalizeError::Diagnostics { .. }), "{err:?}");
}

#[test]
fn parallel_runs_match_sequential_runs() {
    let angles = [8.0_f32, -15.0];
    let sequential: Vec<_> = angles
        .iter()
        .map(|&a| PageNormalizer::new().normalize(rotated_block_page(a)).unwrap())
        .collect();

    let parallel: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = angles
            .iter()
            .map(|&a| s.spawn(move || PageNormalizer::new().normalize(rotated_block_page(a))))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect()
    });

    assert_eq!(sequential, parallel);
}

#[test]
fn normalizes_from_a_file() {
    let file = write_temp_png(&rotated_block_page(12.0));
    let img = image_io::decode_file(file.path()).unwrap();
    let page = PageNormalizer::new().normalize(img).unwrap();
    assert_block_sized(&page);
}

#[test]
fn corrupt_file_is_a_decode_error() {
    let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    std::fs::write(file.path(), b"\x89PNG but not really").unwrap();

    let err = image_io::decode_file(file.path()).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Decode));
    assert!(matches!(err.root_cause(), NormalizeError::Decode { .. }), "{err:?}");
}
