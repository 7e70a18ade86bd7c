use atlas_gen_core::config::AtlasConfig;
use atlas_gen_core::model::{InputManifest, Manifest};
use atlas_gen_core::pipeline::generate;
use atlas_gen_core::source::{load_directory, sha256_hex};
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;

fn write_png(dir: &Path, name: &str, w: u32, h: u32, color: [u8; 4]) {
    RgbaImage::from_pixel(w, h, Rgba(color))
        .save(dir.join(name))
        .expect("write test image");
}

#[test]
fn single_small_image_yields_one_tight_atlas() {
    let input = tempfile::tempdir().expect("tempdir");
    let output = tempfile::tempdir().expect("tempdir");
    write_png(input.path(), "poster.png", 100, 50, [200, 40, 40, 255]);

    let cfg = AtlasConfig::default();
    let images = load_directory(input.path(), cfg.max_image_size).expect("load");
    assert_eq!(images.len(), 1);
    let source_sha = sha256_hex(&fs::read(input.path().join("poster.png")).expect("read"));
    assert_eq!(images[0].sha256, source_sha);

    let manifest = generate(&images, None, &cfg, output.path()).expect("generate");

    assert_eq!(manifest.version, 1);
    assert_eq!(manifest.total_images, 1);
    assert_eq!(manifest.max_atlas_size, 2048);
    assert_eq!(manifest.padding, 2);
    // one atlas at scale 1 terminates the downscale sweep immediately
    assert_eq!(manifest.atlases.len(), 1);

    let record = &manifest.atlases[0];
    assert_eq!(record.file, "atlas_x01_00.png");
    assert_eq!((record.scale, record.index), (1, 0));
    assert_eq!((record.width, record.height), (104, 54));
    assert_eq!(record.count, 1);

    let atlas_path = output.path().join("atlas_x01_00.png");
    let png = image::open(&atlas_path).expect("open atlas").to_rgba8();
    assert_eq!(png.dimensions(), (104, 54));
    assert_eq!(record.sha, sha256_hex(&fs::read(&atlas_path).expect("read atlas")));
    assert_eq!(record.sha.len(), 64);

    let uv = record.uv.get("poster.png").expect("uv entry");
    assert_eq!((uv.width, uv.height), (100, 50));
    assert_eq!(uv.rect_x, 2.0 / 104.0);
    assert_eq!(uv.rect_y, 1.0 - 52.0 / 54.0);
    assert_eq!(uv.rect_width, 100.0 / 104.0);
    assert_eq!(uv.rect_height, 50.0 / 54.0);

    // images_metadata is generated with the source hash when no input
    // manifest exists
    let meta = manifest.images_metadata.get("poster.png").expect("metadata");
    assert_eq!(meta.get("sha").and_then(|v| v.as_str()), Some(source_sha.as_str()));

    // the manifest on disk round-trips
    let text = fs::read_to_string(output.path().join("manifest.json")).expect("read manifest");
    let reread: Manifest = serde_json::from_str(&text).expect("parse manifest");
    assert_eq!(reread.atlases.len(), 1);
    assert_eq!(reread.atlases[0].sha, record.sha);
}

#[test]
fn reruns_are_byte_identical() {
    let input = tempfile::tempdir().expect("tempdir");
    write_png(input.path(), "a.png", 120, 40, [1, 2, 3, 255]);
    write_png(input.path(), "b.png", 60, 90, [9, 8, 7, 255]);

    let cfg = AtlasConfig::default();
    let images = load_directory(input.path(), cfg.max_image_size).expect("load");

    let out_a = tempfile::tempdir().expect("tempdir");
    let out_b = tempfile::tempdir().expect("tempdir");
    generate(&images, None, &cfg, out_a.path()).expect("first run");
    generate(&images, None, &cfg, out_b.path()).expect("second run");

    let manifest_a = fs::read(out_a.path().join("manifest.json")).expect("read");
    let manifest_b = fs::read(out_b.path().join("manifest.json")).expect("read");
    assert_eq!(manifest_a, manifest_b);

    let png_a = fs::read(out_a.path().join("atlas_x01_00.png")).expect("read");
    let png_b = fs::read(out_b.path().join("atlas_x01_00.png")).expect("read");
    assert_eq!(png_a, png_b);
}

#[test]
fn input_manifest_order_and_metadata_flow_through() {
    let input = tempfile::tempdir().expect("tempdir");
    let output = tempfile::tempdir().expect("tempdir");
    write_png(input.path(), "a.png", 20, 10, [0, 0, 0, 255]);
    write_png(input.path(), "b.png", 30, 30, [255, 255, 255, 255]);

    let input_manifest: InputManifest = serde_json::from_str(
        r#"{
            "version": 1,
            "images": {
                "b.png": { "title": "Second", "url": "https://example.org/b" },
                "a.png": { "title": "First", "url": "" }
            },
            "metadata": { "max_atlas_size": 1024, "padding": 0, "site": "demo" }
        }"#,
    )
    .expect("parse input manifest");
    assert_eq!(input_manifest.max_atlas_size(), Some(1024));
    assert_eq!(input_manifest.padding(), Some(0));
    assert_eq!(input_manifest.max_image_size(), None);

    let cfg = AtlasConfig {
        max_atlas_size: 1024,
        padding: 0,
        max_image_size: 1024,
    };
    let images = load_directory(input.path(), cfg.max_image_size).expect("load");
    let manifest = generate(&images, Some(&input_manifest), &cfg, output.path()).expect("generate");

    // images_metadata keeps the input manifest order, not the load order
    let keys: Vec<&String> = manifest.images_metadata.keys().collect();
    assert_eq!(keys, ["b.png", "a.png"]);
    let b_meta = manifest.images_metadata.get("b.png").expect("entry");
    assert_eq!(b_meta.get("title").and_then(|v| v.as_str()), Some("Second"));
    assert_eq!(b_meta.get("sha").and_then(|v| v.as_str()).map(str::len), Some(64));

    // the metadata block passes through untouched
    let metadata = manifest.metadata.as_ref().expect("metadata block");
    assert_eq!(metadata.get("site").and_then(|v| v.as_str()), Some("demo"));
    assert_eq!(manifest.max_atlas_size, 1024);
    assert_eq!(manifest.padding, 0);
}
