use atlas_gen_core::config::PlacementStrategy;
use atlas_gen_core::search::{pack_single_atlas, PackItem};
use image::RgbaImage;

#[test]
fn single_image_is_cropped_tight_with_padding() {
    let image = RgbaImage::from_pixel(100, 50, image::Rgba([10, 20, 30, 255]));
    let items = [PackItem {
        name: "poster.png",
        image: &image,
    }];
    let atlas = pack_single_atlas(&items, 2048, 2, PlacementStrategy::BestAreaFit)
        .expect("one small image must pack");

    assert_eq!((atlas.width, atlas.height), (104, 54));
    assert_eq!(atlas.canvas.dimensions(), (104, 54));
    assert_eq!(atlas.uv.len(), 1);

    let uv = atlas.uv.get("poster.png").expect("uv entry");
    assert_eq!((uv.width, uv.height), (100, 50));
    assert_eq!(uv.rect_x, 2.0 / 104.0);
    assert_eq!(uv.rect_y, 1.0 - 52.0 / 54.0);
    assert_eq!(uv.rect_width, 100.0 / 104.0);
    assert_eq!(uv.rect_height, 50.0 / 54.0);

    // the image content sits at (padding, padding) in the canvas
    assert_eq!(atlas.canvas.get_pixel(2, 2), &image::Rgba([10, 20, 30, 255]));
    assert_eq!(atlas.canvas.get_pixel(0, 0), &image::Rgba([0, 0, 0, 0]));
}

#[test]
fn packing_stops_at_first_item_that_does_not_fit() {
    let big = RgbaImage::new(2000, 2000);
    let small = RgbaImage::new(10, 10);

    // the oversized head blocks everything behind it
    let items = [
        PackItem { name: "big", image: &big },
        PackItem { name: "small", image: &small },
    ];
    assert!(pack_single_atlas(&items, 1024, 0, PlacementStrategy::BestAreaFit).is_none());

    // with the small item first, only the big one is left out
    let items = [
        PackItem { name: "small", image: &small },
        PackItem { name: "big", image: &big },
    ];
    let atlas = pack_single_atlas(&items, 1024, 0, PlacementStrategy::BestAreaFit)
        .expect("small item fits");
    assert_eq!(atlas.uv.len(), 1);
    assert!(atlas.uv.contains_key("small"));
}

#[test]
fn uv_round_trip_matches_pixel_placement() {
    let sizes = [(100u32, 50u32), (30, 90), (64, 64), (7, 3)];
    let images: Vec<RgbaImage> = sizes.iter().map(|&(w, h)| RgbaImage::new(w, h)).collect();
    let names = ["a", "b", "c", "d"];
    let items: Vec<PackItem<'_>> = names
        .iter()
        .zip(&images)
        .map(|(name, image)| PackItem { name, image })
        .collect();

    let atlas = pack_single_atlas(&items, 2048, 2, PlacementStrategy::BottomLeft)
        .expect("all items fit");
    assert_eq!(atlas.uv.len(), 4);

    let w = atlas.width as f64;
    let h = atlas.height as f64;
    for uv in atlas.uv.values() {
        // recover the pixel position from the normalized rect
        let px = uv.rect_x * w;
        assert!(px >= 0.0 && px <= w - uv.width as f64 + 1e-6);
        let py_top = (1.0 - uv.rect_y) * h - uv.height as f64;
        assert!(py_top >= 0.0 - 1e-6 && py_top <= h - uv.height as f64 + 1e-6);
        assert!((uv.rect_width * w - uv.width as f64).abs() < 1e-6);
        assert!((uv.rect_height * h - uv.height as f64).abs() < 1e-6);
    }
}

#[test]
fn empty_input_yields_no_atlas() {
    let items: [PackItem<'_>; 0] = [];
    assert!(pack_single_atlas(&items, 2048, 2, PlacementStrategy::BestAreaFit).is_none());
}

#[test]
fn padding_zero_packs_edge_to_edge() {
    let a = RgbaImage::new(1024, 1024);
    let b = RgbaImage::new(1024, 1024);
    let items = [
        PackItem { name: "a", image: &a },
        PackItem { name: "b", image: &b },
    ];
    let atlas = pack_single_atlas(&items, 2048, 0, PlacementStrategy::BestAreaFit)
        .expect("both halves fit");
    assert_eq!(atlas.uv.len(), 2);
    let area = atlas.width as u64 * atlas.height as u64;
    assert_eq!(area, 2 * 1024 * 1024);
    let score = atlas.score();
    assert_eq!(score.count, 2);
    assert!((score.efficiency() - 1.0).abs() < 1e-12);
}
