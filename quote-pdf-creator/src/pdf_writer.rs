//! PDF assembly for rasterized quotes
//!
//! The document bitmap is embedded once as an image XObject. Every page draws
//! that same image at its placement offset, clipped to the content area, so
//! each page shows one slice of the document.

use crate::error::{ExportError, Result};
use crate::pagination::{PageLayout, Placement, RenderedImage};
use crate::raster::RenderedBitmap;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::debug;
use lopdf::{
    content::{Content, Operation},
    Dictionary, Document, Object, ObjectId, Stream, StringFormat,
};
use std::io::Write;

const POINTS_PER_MM: f32 = 72.0 / 25.4;
const IMAGE_RESOURCE: &str = "Im0";

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Builds one PDF from a bitmap and its page placements
pub struct QuotePdfGenerator {
    layout: PageLayout,
    title: Option<String>,
    document: Document,
    pages_id: ObjectId,
    image_id: ObjectId,
}

impl QuotePdfGenerator {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            title: None,
            document: Document::with_version("1.5"),
            pages_id: (0, 0), // set in initialize_document
            image_id: (0, 0), // set in add_document_image
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Assemble the PDF and return its bytes. Nothing is written to disk.
    pub fn generate(mut self, bitmap: &RenderedBitmap, placements: &[Placement]) -> Result<Vec<u8>> {
        self.layout.validate()?;
        if placements.is_empty() {
            return Err(ExportError::geometry("no page placements to draw"));
        }

        self.initialize_document();
        self.add_document_image(bitmap)?;

        let image = bitmap.rendered_image();
        for placement in placements {
            let page_id = self.create_page(placement, &image)?;
            self.add_page_to_tree(page_id)?;
        }
        debug!("PDF assembled with {} pages", self.page_count()?);

        self.document.compress();
        let mut bytes = Vec::new();
        self.document.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn initialize_document(&mut self) {
        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Kids", Object::Array(vec![]));
        pages_dict.set("Count", Object::Integer(0));
        let pages_id = self.document.add_object(Object::Dictionary(pages_dict));

        let mut info_dict = Dictionary::new();
        info_dict.set("Producer", Object::string_literal("Quote PDF Creator"));
        info_dict.set("Creator", Object::string_literal("Quote Generator"));
        if let Some(title) = &self.title {
            info_dict.set("Title", text_string(title));
        }
        let info_id = self.document.add_object(Object::Dictionary(info_dict));

        let mut catalog_dict = Dictionary::new();
        catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog_dict.set("Pages", Object::Reference(pages_id));
        let catalog_id = self.document.add_object(Object::Dictionary(catalog_dict));

        self.document.trailer.set("Root", Object::Reference(catalog_id));
        self.document.trailer.set("Info", Object::Reference(info_id));
        self.pages_id = pages_id;
    }

    fn add_document_image(&mut self, bitmap: &RenderedBitmap) -> Result<()> {
        let image = bitmap.rendered_image();
        image.validate()?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bitmap.rgb_bytes())?;
        let compressed = encoder.finish()?;

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(image.pixel_width as i64));
        dict.set("Height", Object::Integer(image.pixel_height as i64));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

        let mut stream = Stream::new(dict, compressed);
        // already deflated above
        stream.allows_compression = false;
        self.image_id = self.document.add_object(stream);
        Ok(())
    }

    fn create_page(&mut self, placement: &Placement, image: &RenderedImage) -> Result<ObjectId> {
        let layout = self.layout;
        let scaled_height = layout.scaled_height(image);

        // PDF space grows upwards from the bottom-left corner.
        let image_top = layout.margin + placement.vertical_offset;
        let image_bottom = layout.page_height - image_top - scaled_height;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "re",
                    vec![
                        Object::Real(mm_to_pt(layout.margin)),
                        Object::Real(mm_to_pt(layout.margin)),
                        Object::Real(mm_to_pt(layout.content_width())),
                        Object::Real(mm_to_pt(layout.usable_height())),
                    ],
                ),
                Operation::new("W", vec![]),
                Operation::new("n", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(mm_to_pt(layout.content_width())),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(mm_to_pt(scaled_height)),
                        Object::Real(mm_to_pt(layout.margin)),
                        Object::Real(mm_to_pt(image_bottom)),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self.document.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(self.pages_id));
        page_dict.set("Resources", self.create_resources_dict());
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(mm_to_pt(layout.page_width)),
                Object::Real(mm_to_pt(layout.page_height)),
            ]),
        );
        page_dict.set("Contents", Object::Reference(content_id));

        Ok(self.document.add_object(Object::Dictionary(page_dict)))
    }

    fn create_resources_dict(&self) -> Object {
        let mut xobjects = Dictionary::new();
        xobjects.set(IMAGE_RESOURCE, Object::Reference(self.image_id));

        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));
        resources.set(
            "ProcSet",
            Object::Array(vec![Object::Name(b"PDF".to_vec()), Object::Name(b"ImageC".to_vec())]),
        );
        Object::Dictionary(resources)
    }

    fn add_page_to_tree(&mut self, page_id: ObjectId) -> Result<()> {
        let pages_dict = self.document.get_object_mut(self.pages_id)?.as_dict_mut()?;
        let kids = pages_dict.get_mut(b"Kids")?.as_array_mut()?;
        kids.push(Object::Reference(page_id));
        let count = kids.len() as i64;
        pages_dict.set("Count", Object::Integer(count));
        Ok(())
    }

    fn page_count(&self) -> Result<usize> {
        let pages_obj = self.document.get_object(self.pages_id)?;
        Ok(pages_obj.as_dict()?.get(b"Kids")?.as_array()?.len())
    }
}

/// PDF text string; non-ASCII text is written as UTF-16BE with a byte order mark
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut utf16be = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        utf16be.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(utf16be, StringFormat::Hexadecimal)
}
