//! End-to-end rendering tests against a real headless Chrome
//!
//! Run with: `cargo test --test render_chrome -- --ignored`

use mdshot::{RenderOptions, Renderer};

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn hello_heading_reaches_done() {
    let renderer = Renderer::new(RenderOptions::default());
    let image = renderer.render("# Hello").await.expect("render failed");

    assert!(image.width > 0, "image width must be positive");
    assert!(image.height > 0, "image height must be positive");
    // A heading with padding stands taller than a bare single text line.
    assert!(image.height > 40);
    // The content shrink-wraps: narrower than the first-pass viewport even
    // on a 2x display.
    assert!(image.width < 1200 * 2);
    assert_eq!(&image.png_data[0..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn identical_input_is_dimension_stable() {
    let renderer = Renderer::new(RenderOptions::default());
    let markdown = "# Title\n\nA paragraph with **bold** and `code`.\n\n- one\n- two\n";

    let first = renderer.render(markdown).await.expect("first render failed");
    let second = renderer.render(markdown).await.expect("second render failed");

    assert_eq!((first.width, first.height), (second.width, second.height));
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn longer_documents_render_taller() {
    let renderer = Renderer::new(RenderOptions::default());

    let short = renderer.render("# Hello").await.expect("short render failed");
    let long = renderer
        .render("# Hello\n\nFirst paragraph.\n\nSecond paragraph.\n\n- a\n- b\n- c\n\n> quoted\n")
        .await
        .expect("long render failed");

    assert!(long.height > short.height);
}
