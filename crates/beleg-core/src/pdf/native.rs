//! In-process PDF handling using lopdf and pdf-extract.
//!
//! There is no renderer here. Scanned receipts are PDFs wrapping one image
//! per page, so "rasterizing" means pulling those embedded images out at
//! their native resolution.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PdfBackend, Result};
use crate::error::PdfError;

/// PDF backend that needs no external tools.
#[derive(Debug, Clone, Default)]
pub struct NativePdfBackend;

impl NativePdfBackend {
    pub fn new() -> Self {
        Self
    }

    /// Parse the document, decrypting empty-password PDFs.
    ///
    /// Returns the document and the bytes pdf-extract should read.
    fn load(&self, data: &[u8]) -> Result<(Document, Vec<u8>)> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok((doc, raw))
    }

    /// Images referenced from a page's XObject resources.
    fn page_images(&self, doc: &Document, page_id: ObjectId) -> Vec<DynamicImage> {
        let Some(resources) = page_resources(doc, page_id) else {
            return Vec::new();
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Vec::new();
        };
        let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) else {
            return Vec::new();
        };

        xobj_dict
            .iter()
            .filter_map(|(_name, obj_ref)| doc.dereference(obj_ref).ok())
            .filter_map(|(_, obj)| decode_image_object(doc, obj))
            .collect()
    }

    /// Every image object in the document, for PDFs without page resources.
    fn all_images(&self, doc: &Document) -> Vec<DynamicImage> {
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut images = Vec::new();

        for (id, object) in doc.objects.iter() {
            if !seen.insert(*id) {
                continue;
            }
            if let Some(img) = decode_image_object(doc, object) {
                images.push(img);
            }
        }

        debug!("Found {} images in document", images.len());
        images
    }
}

impl PdfBackend for NativePdfBackend {
    fn extract_text_layer(&self, data: &[u8]) -> Result<String> {
        let (_, raw) = self.load(data)?;

        // pdf-extract panics on some malformed content streams that lopdf accepts.
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(&raw))) {
            Ok(result) => result.map_err(|e| PdfError::TextExtraction(e.to_string())),
            Err(payload) => Err(PdfError::TextExtraction(format!(
                "text extraction aborted: {}",
                panic_message(&*payload)
            ))),
        }
    }

    fn rasterize(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        let (doc, _) = self.load(data)?;
        trace!("Native backend uses embedded resolution, ignoring {} dpi", dpi);

        let mut pages = Vec::new();
        for (number, page_id) in doc.get_pages() {
            // The largest image on a scanned page is the scan itself
            let largest = self
                .page_images(&doc, page_id)
                .into_iter()
                .max_by_key(|img| img.width() as u64 * img.height() as u64);

            match largest {
                Some(img) => {
                    debug!("Page {}: embedded image {}x{}", number, img.width(), img.height());
                    pages.push(img);
                }
                None => debug!("Page {}: no embedded image", number),
            }
        }

        if pages.is_empty() {
            pages = self.all_images(&doc);
        }
        if pages.is_empty() {
            return Err(PdfError::Rasterize("no embedded page images".to_string()));
        }

        Ok(pages)
    }

    fn probe(&self) -> Result<String> {
        Ok("in-process (lopdf, pdf-extract)".to_string())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Resources dictionary for a page, following inheritance up the page tree.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}

fn decode_image_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Skipping image with unsupported filter");
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    decode_raw(&data, width, height, color_space, bits)
}

fn decode_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize).checked_mul(height as usize)?;
    let rgb_len = pixels.checked_mul(3)?;
    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= rgb_len => {
            RgbImage::from_raw(width, height, data[..rgb_len].to_vec()).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: colorspace={:?}, data_len={}",
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}
