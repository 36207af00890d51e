// tests/copy_tasks.rs

mod common;

use sitepipe::tasks::copy::copy_glob;
use sitepipe_test_utils::builders::{ConfigFileBuilder, SiteFixture};
use sitepipe_test_utils::{init_tracing, with_timeout};

const FONT_BYTES: &[u8] = &[0x77, 0x4f, 0x46, 0x46, 0x00, 0x01, 0xff, 0xfe];

#[tokio::test]
async fn copy_js_mirrors_paths_below_the_glob_base() {
    init_tracing();
    let fixture = SiteFixture::new();
    fixture
        .write("src/app.js", "console.log('app');\n")
        .write("src/lib/util.js", "export const x = 1;\n")
        .write("src/lib/notes.txt", "not a script");
    let cfg = ConfigFileBuilder::new().build();
    let runner = common::pipeline_runner(&fixture, &cfg);

    with_timeout(runner.run_task("copyJs")).await.unwrap();

    assert_eq!(fixture.read("build/app.js"), "console.log('app');\n");
    assert_eq!(fixture.read("build/lib/util.js"), "export const x = 1;\n");
    assert!(!fixture.exists("build/lib/notes.txt"));
}

#[tokio::test]
async fn fonts_and_images_land_in_their_asset_directories() {
    init_tracing();
    let fixture = SiteFixture::new();
    fixture
        .write("src/assets/fonts/Inter.woff", FONT_BYTES)
        .write("src/assets/fonts/sub/Mono.ttf", FONT_BYTES)
        .write("src/assets/fonts/readme.md", "ignored")
        .write("src/assets/images/logo.svg", "<svg/>")
        .write("src/assets/images/photos/cat.jpg", [0xff_u8, 0xd8, 0xff]);
    let cfg = ConfigFileBuilder::new().build();
    let runner = common::pipeline_runner(&fixture, &cfg);

    with_timeout(runner.run_task("copyFonts")).await.unwrap();
    with_timeout(runner.run_task("copyImages")).await.unwrap();

    assert_eq!(fixture.read_bytes("build/assets/fonts/Inter.woff"), FONT_BYTES);
    assert_eq!(fixture.read_bytes("build/assets/fonts/sub/Mono.ttf"), FONT_BYTES);
    assert!(!fixture.exists("build/assets/fonts/readme.md"));
    assert_eq!(fixture.read("build/assets/images/logo.svg"), "<svg/>");
    assert_eq!(
        fixture.read_bytes("build/assets/images/photos/cat.jpg"),
        vec![0xff, 0xd8, 0xff]
    );
}

#[tokio::test]
async fn stage_copies_the_whole_build_output() {
    init_tracing();
    let fixture = SiteFixture::new();
    fixture
        .write("build/index.html", "<html></html>")
        .write("build/css/main.css", ".a{}")
        .write("build/assets/fonts/Inter.woff", FONT_BYTES);
    let cfg = ConfigFileBuilder::new().build();
    let runner = common::pipeline_runner(&fixture, &cfg);

    with_timeout(runner.run_task("copyToFirebase")).await.unwrap();

    assert_eq!(fixture.read("y/index.html"), "<html></html>");
    assert_eq!(fixture.read("y/css/main.css"), ".a{}");
    assert_eq!(fixture.read_bytes("y/assets/fonts/Inter.woff"), FONT_BYTES);
}

#[tokio::test]
async fn stage_directory_is_configurable() {
    init_tracing();
    let fixture = SiteFixture::new();
    fixture.write("build/index.html", "hi");
    let cfg = ConfigFileBuilder::new().with_stage("public").build();
    let runner = common::pipeline_runner(&fixture, &cfg);

    with_timeout(runner.run_task("copyToFirebase")).await.unwrap();

    assert_eq!(fixture.read("public/index.html"), "hi");
    assert!(!fixture.exists("y"));
}

#[tokio::test]
async fn missing_source_directory_copies_nothing() {
    let fixture = SiteFixture::new();
    let site = fixture.default_site();

    let written = copy_glob(site.root(), site.scripts(), site.build_dir())
        .await
        .unwrap();

    assert!(written.is_empty());
    assert!(!fixture.exists("build"));
}

#[tokio::test]
async fn copying_again_overwrites_previous_output() {
    let fixture = SiteFixture::new();
    fixture.write("src/app.js", "v1");
    let site = fixture.default_site();

    copy_glob(site.root(), site.scripts(), site.build_dir()).await.unwrap();
    fixture.write("src/app.js", "v2");
    let written = copy_glob(site.root(), site.scripts(), site.build_dir())
        .await
        .unwrap();

    assert_eq!(written, vec![fixture.path("build/app.js")]);
    assert_eq!(fixture.read("build/app.js"), "v2");
}
