//! Page-level access on a loaded document
//!
//! Geometry and resources may be inherited from the page tree, so lookups
//! walk the `Parent` chain the way viewers do.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::coords::PageSize;
use crate::error::CompileError;

/// Deepest page tree we follow before giving up on inheritance.
const MAX_TREE_DEPTH: usize = 32;

/// Follow a reference to the object it names. Direct objects pass through.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up a page attribute, inheriting from ancestors if the page lacks it.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent_id).ok()?;
    }
    None
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(n) => Some(*n as f64),
        _ => None,
    }
}

/// Parse a box array [x1, y1, x2, y2]
fn parse_box_array(doc: &Document, array: &[Object]) -> Option<[f64; 4]> {
    if array.len() != 4 {
        return None;
    }
    let mut result = [0.0; 4];
    for (slot, obj) in result.iter_mut().zip(array) {
        *slot = number(resolve(doc, obj)?)?;
    }
    Some(result)
}

/// Width and height of the page's MediaBox. Pages with no usable MediaBox
/// anywhere in their tree are treated as US Letter.
pub fn page_size(doc: &Document, page_id: ObjectId) -> PageSize {
    inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .and_then(|array| parse_box_array(doc, array))
        .map(|[x1, y1, x2, y2]| PageSize::new((x2 - x1).abs(), (y2 - y1).abs()))
        .unwrap_or_else(PageSize::letter)
}

/// Sizes of every page, in page order
pub fn page_sizes(doc: &Document) -> Vec<PageSize> {
    doc.get_pages()
        .into_values()
        .map(|page_id| page_size(doc, page_id))
        .collect()
}

/// An owned copy of the page's effective resources, with the resource
/// categories resolved to direct dictionaries.
pub fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let categories: Vec<Vec<u8>> = resources.iter().map(|(key, _)| key.clone()).collect();
    for key in categories {
        let resolved = resources
            .get(&key)
            .ok()
            .and_then(|value| resolve(doc, value))
            .and_then(|value| value.as_dict().ok())
            .cloned();
        if let Some(dict) = resolved {
            resources.set(key, Object::Dictionary(dict));
        }
    }
    resources
}

/// Names already defined in one resource category (e.g. `Font`).
pub fn resource_names(resources: &Dictionary, category: &[u8]) -> Vec<Vec<u8>> {
    match resources.get(category) {
        Ok(Object::Dictionary(dict)) => dict.iter().map(|(key, _)| key.clone()).collect(),
        _ => Vec::new(),
    }
}

/// Add entries to one resource category, creating it if needed.
pub fn insert_resources(
    resources: &mut Dictionary,
    category: &[u8],
    entries: impl IntoIterator<Item = (Vec<u8>, ObjectId)>,
) {
    let mut dict = match resources.get(category) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    for (name, id) in entries {
        dict.set(name, Object::Reference(id));
    }
    resources.set(category.to_vec(), Object::Dictionary(dict));
}

/// Store resources directly on the page, replacing any reference or
/// inherited value. Other pages that shared the old dictionary keep it.
pub fn set_resources(
    doc: &mut Document,
    page_id: ObjectId,
    resources: Dictionary,
) -> Result<(), CompileError> {
    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| CompileError::Page(e.to_string()))?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// References to the page's existing content streams, in order.
fn content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, CompileError> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| CompileError::Page(e.to_string()))?;

    let refs = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    Ok(refs)
}

/// Append an overlay content stream to the page.
///
/// Existing content is wrapped in `q`/`Q` so graphics state it leaves behind
/// (transforms, colors) cannot shift the overlay.
pub fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    overlay: Vec<u8>,
) -> Result<(), CompileError> {
    let existing = content_refs(doc, page_id)?;
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let contents = if existing.is_empty() {
        vec![Object::Reference(overlay_id)]
    } else {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        let mut contents = Vec::with_capacity(existing.len() + 3);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(restore_id));
        contents.push(Object::Reference(overlay_id));
        contents
    };

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| CompileError::Page(e.to_string()))?;
    page.set("Contents", Object::Array(contents));
    Ok(())
}
