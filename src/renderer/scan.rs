//! Page counting by scanning raw PDF bytes
//!
//! Good enough to drive navigation without a PDF engine: counts page
//! objects, falling back to the largest `/Count` of a page tree node when
//! the page objects live in compressed object streams.

use std::sync::LazyLock;

use regex::bytes::Regex;

use super::PageCounter;

/// How far into the file the `%PDF-` marker may appear
const HEADER_WINDOW: usize = 1024;

static PAGE_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)/Type\s*/Page\b").unwrap_or_else(|e| panic!("page object regex: {e}"))
});

static PAGE_TREE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)/Count\s+(\d+)").unwrap_or_else(|e| panic!("page count regex: {e}"))
});

#[derive(Clone, Copy, Debug, Default)]
pub struct ScanCounter;

impl ScanCounter {
    fn has_header(bytes: &[u8]) -> bool {
        let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
        window.windows(5).any(|w| w == b"%PDF-")
    }
}

impl PageCounter for ScanCounter {
    fn count_pages(&self, bytes: &[u8]) -> Option<u32> {
        if !Self::has_header(bytes) {
            return None;
        }

        let objects = PAGE_OBJECT.find_iter(bytes).count();
        if objects > 0 {
            return u32::try_from(objects).ok();
        }

        PAGE_TREE_COUNT
            .captures_iter(bytes)
            .filter_map(|caps| std::str::from_utf8(&caps[1]).ok()?.parse::<u32>().ok())
            .max()
            .filter(|&count| count > 0)
    }
}
