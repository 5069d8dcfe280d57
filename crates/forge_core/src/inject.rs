//! Embeds a manifest into an HTML page so the game can start without fetching
//! `manifest.json` first.

use crate::atomic_write;
use crate::error::InjectError;
use crate::manifest::Manifest;
use std::path::Path;
use tracing::info;

/// `id` of the injected script element.
pub const MANIFEST_ELEMENT_ID: &str = "forge-manifest";

fn script_open() -> String {
    format!(r#"<script id="{MANIFEST_ELEMENT_ID}" type="application/json">"#)
}

const SCRIPT_CLOSE: &str = "</script>";

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets intact.
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

fn script_element(manifest: &Manifest) -> Result<String, InjectError> {
    let json = serde_json::to_string(manifest)?.replace("</", r"<\/");
    Ok(format!("{}{json}{SCRIPT_CLOSE}", script_open()))
}

/// Returns `html` with the manifest embedded.
///
/// An existing manifest element is replaced in place; otherwise the element
/// goes right before `</head>`, falling back to `</body>`.
pub fn inject_manifest(html: &str, manifest: &Manifest) -> Result<String, InjectError> {
    let element = script_element(manifest)?;

    let open = script_open();
    if let Some(start) = html.find(&open) {
        let body_start = start + open.len();
        if let Some(close) = html[body_start..].find(SCRIPT_CLOSE) {
            let end = body_start + close + SCRIPT_CLOSE.len();
            return Ok(format!("{}{element}{}", &html[..start], &html[end..]));
        }
    }

    let at = find_ci(html, "</head>")
        .or_else(|| find_ci(html, "</body>"))
        .ok_or(InjectError::NoInsertionPoint)?;

    Ok(format!("{}{element}\n{}", &html[..at], &html[at..]))
}

/// Reads `input`, injects the manifest at `manifest_path` and writes the page
/// to `output` (or back to `input`).
pub fn inject_file(
    input: &Path,
    output: Option<&Path>,
    manifest_path: &Path,
) -> Result<Manifest, InjectError> {
    let manifest = Manifest::load(manifest_path)?;
    let html = std::fs::read_to_string(input)?;

    let injected = inject_manifest(&html, &manifest)?;

    let output = output.unwrap_or(input);
    atomic_write(output, injected.as_bytes())?;

    info!(
        "Injected {} manifest entries into {}",
        manifest.len(),
        output.display()
    );

    Ok(manifest)
}
