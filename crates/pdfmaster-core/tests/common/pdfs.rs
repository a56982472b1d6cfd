//! PDF fixtures and content inspection helpers

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Install a test-writer subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Serialized PDF with one page per `(width, height)`. Each page carries a
/// short text content stream of its own.
pub fn pdf_with_pages(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for (i, &(width, height)) in sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(10), Object::Integer(10)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            lopdf::Dictionary::new(),
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => sizes.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

pub fn letter_pdf(pages: usize) -> Vec<u8> {
    pdf_with_pages(&vec![(612, 792); pages])
}

pub fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).unwrap().get_pages().len()
}

/// Every operation painted on a page, original content included
pub fn page_ops(bytes: &[u8], page_index: usize) -> Vec<Operation> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().values().nth(page_index).unwrap();
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}

pub fn operators(bytes: &[u8], page_index: usize) -> Vec<String> {
    page_ops(bytes, page_index)
        .into_iter()
        .map(|op| op.operator)
        .collect()
}

pub fn numbers(op: &Operation) -> Vec<f32> {
    op.operands
        .iter()
        .filter_map(|v| match v {
            Object::Real(r) => Some(*r),
            Object::Integer(i) => Some(*i as f32),
            _ => None,
        })
        .collect()
}

/// Numeric operands of every `operator` on the page, in paint order
pub fn operands(bytes: &[u8], page_index: usize, operator: &str) -> Vec<Vec<f32>> {
    page_ops(bytes, page_index)
        .iter()
        .filter(|op| op.operator == operator)
        .map(numbers)
        .collect()
}

/// Literal strings shown with `Tj` on the page
pub fn shown_text(bytes: &[u8], page_index: usize) -> Vec<String> {
    page_ops(bytes, page_index)
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(text, _)) => Some(String::from_utf8_lossy(text).into_owned()),
            _ => None,
        })
        .collect()
}
