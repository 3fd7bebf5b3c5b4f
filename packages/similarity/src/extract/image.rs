//! Image discovery and perceptual hashing.
//!
//! Every discovered image is reduced to a 64-bit hash: downsample to an
//! 8x8 grid, convert to luminance, threshold each cell against the grid
//! mean. Hashes are compared by Hamming distance, so the bit length is
//! constant across all images. A fetch or decode failure for one image
//! produces no artefact and never aborts the page or the other images.

use image::imageops::FilterType;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::traits::fetcher::Fetcher;
use crate::types::artefact::{ImageArtefact, IMAGE_HASH_BITS};
use crate::types::config::ExtractConfig;

/// Side length of the downsampled luminance grid (8x8 = 64 hash bits).
const HASH_GRID: u32 = 8;

/// Resolve the page's image URLs against its final URL, deduplicated in
/// document order and capped at `max`.
pub fn image_urls(html: &str, page_url: &str, max: usize) -> Vec<Url> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let selector = Selector::parse("img[src]").expect("img selector");

    let mut seen = std::collections::HashSet::new();
    let mut urls = Vec::new();
    for element in document.select(&selector) {
        if urls.len() >= max {
            break;
        }
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let src = src.trim();
        if src.is_empty() || src.starts_with("data:") {
            continue;
        }
        if let Ok(resolved) = base.join(src) {
            if (resolved.scheme() == "http" || resolved.scheme() == "https")
                && seen.insert(resolved.to_string())
            {
                urls.push(resolved);
            }
        }
    }
    urls
}

/// Perceptual hash of an encoded image, or `None` if it cannot be decoded.
pub fn hash_image(bytes: &[u8]) -> Option<u64> {
    let decoded = image::load_from_memory(bytes).ok()?;
    let gray = decoded
        .resize_exact(HASH_GRID, HASH_GRID, FilterType::Triangle)
        .to_luma8();

    let cells: Vec<u8> = gray.pixels().map(|p| p.0[0]).collect();
    debug_assert_eq!(cells.len() as u32, IMAGE_HASH_BITS);
    let mean = cells.iter().map(|&v| v as f64).sum::<f64>() / cells.len() as f64;

    let mut hash = 0u64;
    for (bit, &value) in cells.iter().enumerate() {
        if value as f64 >= mean {
            hash |= 1 << bit;
        }
    }
    Some(hash)
}

/// Fetch and hash the images discovered on a page.
pub async fn image_artefacts(
    html: &str,
    page_url: &str,
    config: &ExtractConfig,
    fetcher: &dyn Fetcher,
) -> Vec<ImageArtefact> {
    let urls = image_urls(html, page_url, config.max_images_per_page);

    let mut artefacts = Vec::new();
    for url in urls {
        let fetched = match fetcher.fetch(url.as_str(), config.image_timeout).await {
            Ok(fetched) => fetched,
            Err(err) => {
                debug!(url = %url, error = %err, "image fetch failed, no artefact");
                continue;
            }
        };
        let Some(hash) = hash_image(&fetched.body) else {
            debug!(url = %url, "image decode failed, no artefact");
            continue;
        };
        artefacts.push(ImageArtefact {
            url: url.to_string(),
            page_url: page_url.to_string(),
            hash,
            byte_size: fetched.body.len(),
        });
    }
    artefacts
}
