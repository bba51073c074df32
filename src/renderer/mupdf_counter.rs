//! MuPDF-backed page counting

use log::warn;
use mupdf::Document;

use super::PageCounter;
use crate::resource::PDF_MIME;

#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfCounter;

impl PageCounter for MupdfCounter {
    fn count_pages(&self, bytes: &[u8]) -> Option<u32> {
        let doc = match Document::from_bytes(bytes, PDF_MIME) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("MuPDF could not parse document: {e}");
                return None;
            }
        };
        let count = doc.page_count().ok()?;
        u32::try_from(count).ok().filter(|&count| count > 0)
    }
}
