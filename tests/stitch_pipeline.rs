use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use stitchkit::{
    FixedMemory, StitchkitError, calculate_batch_size, estimate_output_size, stitch_images,
};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "stitchkit_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn exts() -> Vec<String> {
    vec!["jpg".to_string(), "png".to_string(), "tiff".to_string()]
}

/// Each image is a solid colour so its band can be identified in the output.
fn write_band(dir: &Path, name: &str, w: u32, h: u32, shade: u8) {
    RgbImage::from_pixel(w, h, Rgb([shade, 255 - shade, shade / 2]))
        .save(dir.join(name))
        .unwrap();
}

#[test]
fn stitched_output_is_sorted_by_name_and_sized_by_sum() {
    let src = temp_dir("pipeline_order_src");
    let out = temp_dir("pipeline_order_out").join("stitched.png");
    std::fs::create_dir_all(&src).unwrap();

    // written out of order on purpose
    write_band(&src, "c.png", 6, 3, 90);
    write_band(&src, "a.png", 6, 2, 30);
    write_band(&src, "b.tiff", 6, 4, 60);
    std::fs::write(src.join("readme.txt"), b"not an image").unwrap();

    let report = stitch_images(&src, &out, 2, &exts()).unwrap();
    assert_eq!((report.width, report.height), (6, 9));
    assert_eq!(report.images, 3);
    assert_eq!(report.batches, 2);

    let stitched = image::open(&out).unwrap().to_rgb8();
    assert_eq!(stitched.dimensions(), (6, 9));
    assert_eq!(stitched.get_pixel(0, 0).0, [30, 225, 15]);
    assert_eq!(stitched.get_pixel(5, 2).0, [60, 195, 30]);
    assert_eq!(stitched.get_pixel(5, 5).0, [60, 195, 30]);
    assert_eq!(stitched.get_pixel(0, 6).0, [90, 165, 45]);
    assert_eq!(stitched.get_pixel(0, 8).0, [90, 165, 45]);

    std::fs::remove_dir_all(&src).ok();
    std::fs::remove_dir_all(out.parent().unwrap()).ok();
}

#[test]
fn repeated_stitching_is_byte_identical() {
    let src = temp_dir("pipeline_determinism_src");
    let out_dir = temp_dir("pipeline_determinism_out");
    std::fs::create_dir_all(&src).unwrap();
    for i in 0..4u8 {
        write_band(&src, &format!("image_{i}.png"), 5, 2 + u32::from(i), i * 50);
    }

    let first = out_dir.join("one.tiff");
    let second = out_dir.join("two.tiff");
    stitch_images(&src, &first, 1, &exts()).unwrap();
    stitch_images(&src, &second, 3, &exts()).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());

    std::fs::remove_dir_all(&src).ok();
    std::fs::remove_dir_all(&out_dir).ok();
}

#[test]
fn empty_folder_fails_everywhere() {
    let src = temp_dir("pipeline_empty");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("notes.txt"), b"x").unwrap();
    let out = src.join("out").join("never.png");

    let err = stitch_images(&src, &out, 4, &exts()).unwrap_err();
    assert!(matches!(err, StitchkitError::EmptySource(_)));
    assert!(!out.exists());

    let err = calculate_batch_size(&src, &FixedMemory(1 << 30), 0.5, 10, &exts()).unwrap_err();
    assert!(matches!(err, StitchkitError::EmptySource(_)));

    let err = estimate_output_size(&src, 10, &exts()).unwrap_err();
    assert!(matches!(err, StitchkitError::EmptySource(_)));

    std::fs::remove_dir_all(&src).ok();
}

#[test]
fn batch_size_comes_from_first_sorted_image() {
    let src = temp_dir("pipeline_batch");
    std::fs::create_dir_all(&src).unwrap();
    // b is larger but sorts second
    write_band(&src, "b.png", 100, 100, 10);
    write_band(&src, "a.png", 10, 10, 10);

    // 10x10x3 = 300 bytes per image; 3000 * 0.5 = 1500 -> 5
    let batch = calculate_batch_size(&src, &FixedMemory(3000), 0.5, 200, &exts()).unwrap();
    assert_eq!(batch, 5);

    let capped = calculate_batch_size(&src, &FixedMemory(3000), 0.5, 2, &exts()).unwrap();
    assert_eq!(capped, 2);

    assert!(calculate_batch_size(&src, &FixedMemory(3000), 0.0, 2, &exts()).is_err());

    let est = estimate_output_size(&src, 200, &exts()).unwrap();
    assert_eq!((est.width, est.height, est.total_kib), (10, 10, 58));

    std::fs::remove_dir_all(&src).ok();
}

#[test]
fn zero_batch_size_does_not_write_output() {
    let src = temp_dir("pipeline_zero_batch");
    std::fs::create_dir_all(&src).unwrap();
    write_band(&src, "a.png", 2, 2, 0);
    let out = src.join("out.png");

    let err = stitch_images(&src, &out, 0, &exts()).unwrap_err();
    assert!(matches!(err, StitchkitError::Validation(_)));
    assert!(!out.exists());

    std::fs::remove_dir_all(&src).ok();
}
