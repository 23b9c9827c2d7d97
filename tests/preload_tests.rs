//! End-to-end preload tests over HTTP and the filesystem.

use image::Rgba;
use marker_icons::{
    AssetLoader, AssetManifest, AssetSource, ColorKey, IconCategory, IconKey, ImageLoader,
    LoadError, Palette, PreloadConfig, Preloader, to_rgba,
};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BACKGROUND_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="40"><rect width="40" height="40" fill="#0000ff"/></svg>"##;
const DIRECTION_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="40"><rect x="10" y="0" width="20" height="10" fill="#00ff00"/></svg>"##;
const ICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24"><rect width="24" height="24" fill="#000000"/></svg>"##;

const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn svg_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "image/svg+xml")
}

async fn mount_assets(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/assets/background.svg"))
        .respond_with(svg_response(BACKGROUND_SVG))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assets/direction.svg"))
        .respond_with(svg_response(DIRECTION_SVG))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assets/icon/boat.svg"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such icon"))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/assets/icon/[a-z]+\.svg$"))
        .respond_with(svg_response(ICON_SVG))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_icon_degrades_only_its_category() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let config = PreloadConfig::with_asset_dir(format!("{}/assets/", server.uri()));
    let loader = config.loader().expect("Failed to build loader");
    let cache = config.preloader(loader).expect("Invalid config").run().await;

    assert_eq!(cache.len(), 88);
    assert!(cache.is_complete());
    assert_eq!(cache.degraded_count(), 4);
    assert_eq!(cache.background().center_pixel(), Some(BLUE));
    assert_eq!(cache.direction().pixel(20, 5), Some(Rgba([0, 255, 0, 255])));

    let palette = Palette::default();
    for key in IconKey::all() {
        let icon = cache.get(key.category, key.color).expect("entry present");
        assert_eq!(icon.tint(), palette.resolve(key.color), "{key}");
        assert_eq!(icon.bitmap().data.dimensions(), (40, 40), "{key}");

        if key.category == IconCategory::Boat {
            assert!(icon.is_degraded(), "{key}");
            assert_eq!(icon.bitmap(), cache.background(), "{key}");
        } else {
            assert!(!icon.is_degraded(), "{key}");
            assert_eq!(icon.bitmap().center_pixel(), Some(to_rgba(icon.tint())), "{key}");
            assert_eq!(icon.bitmap().pixel(2, 2), Some(BLUE), "{key}");
        }
    }

    let error = cache.get(IconCategory::Car, ColorKey::Error).unwrap();
    assert_eq!(error.bitmap().center_pixel(), Some(Rgba([211, 47, 47, 255])));
}

#[tokio::test]
async fn test_server_failure_yields_placeholder_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = PreloadConfig::with_asset_dir(format!("{}/assets/", server.uri()));
    let loader = config.loader().expect("Failed to build loader");
    let cache = config.preloader(loader).expect("Invalid config").run().await;

    let white = Rgba([255, 255, 255, 255]);
    assert!(cache.is_complete());
    assert_eq!(cache.degraded_count(), 88);
    assert_eq!(cache.background().data.dimensions(), (32, 32));
    assert_eq!(cache.background().center_pixel(), Some(white));
    assert_eq!(cache.direction(), cache.background());
    for (_, icon) in cache.iter() {
        assert_eq!(icon.bitmap(), cache.background());
    }
}

#[tokio::test]
async fn test_http_status_error_carries_body() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let loader = AssetLoader::new(1.0).expect("Failed to build loader");
    let source = AssetSource::parse(&format!("{}/assets/icon/boat.svg", server.uri())).unwrap();

    match loader.load_image(&source).await {
        Err(LoadError::HttpStatus {
            status, message, ..
        }) => {
            assert_eq!(status, 404);
            assert_eq!(message.as_deref(), Some("no such icon"));
        }
        other => panic!("expected HTTP status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pixel_ratio_scales_every_entry() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let mut config = PreloadConfig::with_asset_dir(format!("{}/assets/", server.uri()));
    config.pixel_ratio = 2.0;
    let loader = config.loader().expect("Failed to build loader");
    let cache = config.preloader(loader).expect("Invalid config").run().await;

    assert_eq!(cache.background().data.dimensions(), (80, 80));
    let truck = cache.get(IconCategory::Truck, ColorKey::Info).unwrap();
    assert_eq!(truck.bitmap().data.dimensions(), (80, 80));
    assert_eq!(truck.bitmap().scale, 2.0);
    assert_eq!(truck.bitmap().center_pixel(), Some(to_rgba(truck.tint())));
}

#[tokio::test]
async fn test_asset_directory_with_missing_icon() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let icon_dir = dir.path().join("icon");
    tokio::fs::create_dir_all(&icon_dir).await.unwrap();
    tokio::fs::write(dir.path().join("background.svg"), BACKGROUND_SVG)
        .await
        .unwrap();
    tokio::fs::write(dir.path().join("direction.svg"), DIRECTION_SVG)
        .await
        .unwrap();
    for category in IconCategory::ALL {
        if category != IconCategory::Crane {
            tokio::fs::write(icon_dir.join(category.file_name()), ICON_SVG)
                .await
                .unwrap();
        }
    }

    let loader = AssetLoader::new(1.0).expect("Failed to build loader");
    let cache = Preloader::new(loader, AssetManifest::from_dir(dir.path()))
        .with_palette(Palette::dark())
        .run()
        .await;

    assert!(cache.is_complete());
    assert_eq!(cache.degraded_count(), 4);
    assert!(cache.get(IconCategory::Crane, ColorKey::Neutral).unwrap().is_degraded());

    let success = cache.lookup("offroad", ColorKey::Success).unwrap();
    assert!(!success.is_degraded());
    assert_eq!(
        success.bitmap().center_pixel(),
        Some(to_rgba(Palette::dark().success))
    );
}

#[tokio::test]
async fn test_dark_session_selects_dark_palette() {
    let server = MockServer::start().await;
    mount_assets(&server).await;

    let session = marker_icons::Session::from_json(
        r#"{ "server": {}, "user": { "attributes": { "darkMode": true } } }"#,
    )
    .unwrap();
    let mut config = PreloadConfig::with_asset_dir(format!("{}/assets/", server.uri()));
    config.apply_session(&session);

    let loader = config.loader().expect("Failed to build loader");
    let cache = config.preloader(loader).expect("Invalid config").run().await;

    let bus = cache.lookup("trolleybus", ColorKey::Error).unwrap();
    assert_eq!(bus.tint(), Palette::dark().error);
    assert_eq!(bus.bitmap().center_pixel(), Some(to_rgba(Palette::dark().error)));
}
