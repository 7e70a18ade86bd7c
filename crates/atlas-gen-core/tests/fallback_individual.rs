use atlas_gen_core::config::AtlasConfig;
use atlas_gen_core::pipeline::individual_atlases;
use atlas_gen_core::search::{find_best_single_atlas, PackItem};
use image::RgbaImage;

#[test]
fn oversized_image_is_downscaled_into_its_own_atlas() {
    let cfg = AtlasConfig {
        max_atlas_size: 2048,
        padding: 2,
        max_image_size: 3000,
    };
    let image = RgbaImage::new(3000, 3000);
    let items = [PackItem {
        name: "huge.png",
        image: &image,
    }];

    // the search cannot host it, which is what routes the caller here
    assert!(find_best_single_atlas(&items, cfg.padding).is_none());

    let atlases = individual_atlases(&items, &cfg);
    assert_eq!(atlases.len(), 1);
    let built = &atlases[0];
    assert!(built.atlas.width <= 2048 && built.atlas.height <= 2048);
    assert_eq!(built.sort_strategy, "individual");
    assert_eq!(built.placement_strategy, "none");

    let uv = built.atlas.uv.get("huge.png").expect("uv entry");
    // content spans the whole atlas minus padding
    assert_eq!(uv.width + 2 * cfg.padding, built.atlas.width);
    assert_eq!(uv.height + 2 * cfg.padding, built.atlas.height);
    assert_eq!(uv.rect_x, cfg.padding as f64 / built.atlas.width as f64);
    assert_eq!(
        uv.rect_y,
        1.0 - (cfg.padding + uv.height) as f64 / built.atlas.height as f64
    );
}

#[test]
fn small_images_keep_their_size_in_fallback() {
    let cfg = AtlasConfig::default();
    let a = RgbaImage::new(40, 30);
    let b = RgbaImage::new(10, 90);
    let items = [
        PackItem { name: "a.png", image: &a },
        PackItem { name: "b.png", image: &b },
    ];
    let atlases = individual_atlases(&items, &cfg);
    assert_eq!(atlases.len(), 2);
    assert_eq!(
        (atlases[0].atlas.width, atlases[0].atlas.height),
        (44, 34)
    );
    assert_eq!(
        (atlases[1].atlas.width, atlases[1].atlas.height),
        (14, 94)
    );
    let uv = atlases[0].atlas.uv.get("a.png").expect("uv entry");
    assert_eq!((uv.width, uv.height), (40, 30));
}
