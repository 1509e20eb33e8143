// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — inspect pages, pull text, and cut single pages out of an
// existing PDF using the `lopdf` crate.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use tracing::{debug, info, instrument, warn};
use vitrine_core::error::{Result, VitrineError};

/// US Letter in points; used when a page carries no usable MediaBox.
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: &[&[u8]] = &[b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

fn pdf_err(context: &str, err: impl std::fmt::Display) -> VitrineError {
    VitrineError::PdfError(format!("{context}: {err}"))
}

/// Read-only view over a loaded PDF.
pub struct PdfReader {
    document: Document,
    /// Page number (1-indexed) to page object.
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());
        let document = Document::load(path_ref)
            .map_err(|err| pdf_err(&format!("failed to open {}", path_ref.display()), err))?;
        Ok(Self::wrap(document))
    }

    /// Load a PDF already held in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document =
            Document::load_mem(data).map_err(|err| pdf_err("failed to load PDF from memory", err))?;
        Ok(Self::wrap(document))
    }

    fn wrap(document: Document) -> Self {
        let pages = document.get_pages();
        debug!(pages = pages.len(), "PDF loaded");
        Self { document, pages }
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Page numbers in document order.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        self.pages.get(&page_number).copied().ok_or_else(|| {
            VitrineError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                self.pages.len()
            ))
        })
    }

    /// Walk from a page up its /Parent chain until `key` is found.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.document.get_dictionary(page_id).ok()?;
        // Page trees deeper than this are malformed or cyclic.
        for _ in 0..32 {
            if let Ok(value) = current.get(key) {
                return Some(value);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.document.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    /// Width and height of a page in points, from its (possibly inherited)
    /// MediaBox.
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        let page_id = self.page_id(page_number)?;
        let Some(media_box) = self.inherited(page_id, b"MediaBox") else {
            warn!(page_number, "page has no MediaBox, assuming US Letter");
            return Ok(DEFAULT_PAGE_SIZE);
        };

        let corners: Vec<f32> = match self.resolve(media_box) {
            Object::Array(values) => values
                .iter()
                .filter_map(|value| number(self.resolve(value)))
                .collect(),
            _ => Vec::new(),
        };
        match corners.as_slice() {
            [x0, y0, x1, y1] => Ok(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => {
                warn!(page_number, "malformed MediaBox, assuming US Letter");
                Ok(DEFAULT_PAGE_SIZE)
            }
        }
    }

    // -- Text -----------------------------------------------------------------

    /// Text of a single page, without trailing whitespace.
    pub fn page_text(&self, page_number: u32) -> Result<String> {
        self.page_id(page_number)?;
        let text = self
            .document
            .extract_text(&[page_number])
            .map_err(|err| pdf_err(&format!("text extraction failed on page {page_number}"), err))?;
        Ok(text.trim_end().to_owned())
    }

    /// Text of every page in order, joined with `\n`.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn full_text(&self) -> Result<String> {
        let mut texts = Vec::with_capacity(self.pages.len());
        for page_number in self.page_numbers() {
            texts.push(self.page_text(page_number)?);
        }
        let joined = texts.join("\n");
        debug!(chars = joined.len(), "document text extracted");
        Ok(joined)
    }

    // -- Extraction -----------------------------------------------------------

    /// Cut a single page (1-indexed) out into a standalone PDF.
    #[instrument(skip(self), fields(page_number))]
    pub fn extract_page(&self, page_number: u32) -> Result<Vec<u8>> {
        let page_id = self.page_id(page_number)?;
        let page = self
            .document
            .get_dictionary(page_id)
            .map_err(|err| pdf_err(&format!("cannot read page {page_number}"), err))?;

        let mut target = Document::with_version("1.5");
        let pages_id = target.new_object_id();
        let mut copied = BTreeMap::new();

        let mut cloned = clone_dictionary(&self.document, &mut target, page, &mut copied);
        for key in INHERITABLE {
            if cloned.get(key).is_err() {
                if let Some(value) = self.inherited(page_id, key) {
                    let value = deep_clone_object(&self.document, &mut target, value, &mut copied);
                    cloned.set(key.to_vec(), value);
                }
            }
        }
        cloned.set("Parent", Object::Reference(pages_id));
        let new_page_id = target.add_object(cloned);

        target.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(new_page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = target.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        target.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        target
            .save_to(&mut output)
            .map_err(|err| pdf_err("failed to serialise extracted page", err))?;

        debug!(page_number, output_bytes = output.len(), "Page extracted");
        Ok(output)
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    copied: &mut BTreeMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        // /Parent is patched by the caller; following it would drag in the
        // whole source page tree.
        if key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), deep_clone_object(source, target, value, copied));
    }
    new_dict
}

/// Copy `object` into `target`, following references. Each source object is
/// copied once; `copied` maps source ids to target ids, which also breaks
/// reference cycles.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    copied: &mut BTreeMap<ObjectId, ObjectId>,
) -> Object {
    match object {
        Object::Dictionary(dict) => {
            Object::Dictionary(clone_dictionary(source, target, dict, copied))
        }
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| deep_clone_object(source, target, item, copied))
                .collect(),
        ),
        Object::Reference(ref_id) => {
            if let Some(existing) = copied.get(ref_id) {
                return Object::Reference(*existing);
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    let new_id = target.new_object_id();
                    copied.insert(*ref_id, new_id);
                    let cloned = deep_clone_object(source, target, referenced, copied);
                    target.objects.insert(new_id, cloned);
                    Object::Reference(new_id)
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Object::Null
                }
            }
        }
        Object::Stream(stream) => Object::Stream(lopdf::Stream::new(
            clone_dictionary(source, target, &stream.dict, copied),
            stream.content.clone(),
        )),
        other => other.clone(),
    }
}
