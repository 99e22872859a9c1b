//! PDF merging: concatenate the pages of several PDFs, in order, into one
//! document.
//!
//! Each input is loaded with `lopdf`, its objects are renumbered past the
//! ones already collected, and its pages are lifted out of their page tree.
//! `finish` then builds a single flat `Pages` node and a fresh `Catalog`.
//! Document-level structures of the inputs (outlines, names, forms) are
//! dropped; page content and everything it references is kept.

use crate::error::MergeError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::debug;

/// Page attributes that may be inherited from an ancestor `Pages` node.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed input.
const MAX_TREE_DEPTH: usize = 64;

/// Accumulates pages from successive PDFs.
#[derive(Debug)]
pub struct PdfMerger {
    max_id: u32,
    pages: Vec<(ObjectId, Dictionary)>,
    objects: BTreeMap<ObjectId, Object>,
    documents: usize,
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfMerger {
    pub fn new() -> Self {
        Self {
            max_id: 1,
            pages: Vec::new(),
            objects: BTreeMap::new(),
            documents: 0,
        }
    }

    /// Number of pages collected so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append every page of `pdf`, after the pages already collected.
    pub fn append(&mut self, pdf: &[u8]) -> Result<(), MergeError> {
        let index = self.documents;
        let mut doc = Document::load_mem(pdf).map_err(|e| MergeError::Load {
            index,
            detail: e.to_string(),
        })?;

        doc.renumber_objects_with(self.max_id);
        self.max_id = doc.max_id + 1;

        // `get_pages` is keyed by page number, so values come out in reading order.
        let mut added = 0;
        for page_id in doc.get_pages().into_values() {
            let Ok(dict) = doc.get_dictionary(page_id) else {
                continue;
            };
            let mut page = dict.clone();
            inherit_attributes(&doc, &mut page);
            self.pages.push((page_id, page));
            added += 1;
        }

        for (id, object) in doc.objects {
            match object.type_name().unwrap_or("") {
                "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
                _ => {
                    self.objects.insert(id, object);
                }
            }
        }

        self.documents += 1;
        debug!("Merged document {} ({} page(s), {} total)", index, added, self.pages.len());
        Ok(())
    }

    /// Assemble the collected pages into one serialized PDF.
    ///
    /// With nothing appended this yields a valid document with zero pages.
    pub fn finish(self) -> Result<Vec<u8>, MergeError> {
        let mut document = Document::with_version("1.5");
        document.objects = self.objects;
        document.max_id = self.max_id;

        let pages_id = document.new_object_id();
        let mut kids = Vec::with_capacity(self.pages.len());
        for (page_id, mut page) in self.pages {
            page.set("Parent", Object::Reference(pages_id));
            document.objects.insert(page_id, Object::Dictionary(page));
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        let pages = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ]);
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = document.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        document.trailer.set("Root", Object::Reference(catalog_id));

        document.renumber_objects();

        let mut out = Vec::new();
        document
            .save_to(&mut out)
            .map_err(|e| MergeError::Save(e.to_string()))?;
        Ok(out)
    }
}

/// Merge `pdfs` in order. Convenience wrapper over [`PdfMerger`].
pub fn merge_all<'a>(pdfs: impl IntoIterator<Item = &'a [u8]>) -> Result<Vec<u8>, MergeError> {
    let mut merger = PdfMerger::new();
    for pdf in pdfs {
        merger.append(pdf)?;
    }
    merger.finish()
}

/// Copy attributes the page inherits from its ancestors onto the page itself,
/// since the ancestors are not carried over.
fn inherit_attributes(doc: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
}
