//! Document composition for the render surface
//!
//! A render document is a static HTML template with two substitution points:
//! the Markdown payload and the bundled Markdown-to-HTML converter source.
//! The payload travels base64-encoded and is decoded inside the document, so
//! raw text is never string-interpolated into markup and cannot break out of
//! its embedding context. The composed document is loaded through a `data:`
//! URL, which keeps the whole round trip in memory.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as Base64Engine;

/// Element id of the content container the prober measures
pub const CONTAINER_ID: &str = "markdown-container";

/// Document-level flag the template sets once the converted DOM is mounted
pub const READY_FLAG: &str = "markdownRendered";

/// Global symbol under which the bundled converter registers itself
pub const CONVERTER_SYMBOL: &str = "mdjs";

const TEMPLATE: &str = include_str!("assets/renderer.html");
const CONVERTER_SOURCE: &str = include_str!("assets/markdown.js");

const PAYLOAD_TOKEN: &str = "{{MARKDOWN_CONTENT}}";
const SCRIPT_TOKEN: &str = "{{MARKDOWN_SCRIPT}}";

/// Build a self-contained render document for the given Markdown source.
pub fn compose_document(markdown: &str) -> String {
    let payload = STANDARD.encode(markdown.as_bytes());
    TEMPLATE
        .replace(SCRIPT_TOKEN, CONVERTER_SOURCE)
        .replace(PAYLOAD_TOKEN, &payload)
}

/// Wrap a composed document in an in-memory content address.
pub fn data_url(html: &str) -> String {
    format!(
        "data:text/html;charset=utf-8;base64,{}",
        STANDARD.encode(html.as_bytes())
    )
}
