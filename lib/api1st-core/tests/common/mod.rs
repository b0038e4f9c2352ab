#![allow(dead_code, missing_docs, clippy::expect_used)]
use std::path::PathBuf;

use serde_json::Value;
use tracing::info;

use api1st_core::{
    Diagnostics, Document, DocumentRef, FileLoader, REF_KEY, Reference, ReferenceKind, Resolver,
};

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn file_resolver() -> Resolver<Diagnostics> {
    init_tracing();
    Resolver::builder().with_loader(FileLoader::new()).build()
}

pub fn load_fixture(resolver: &mut Resolver, name: &str) -> DocumentRef {
    let path = fixture(name);
    resolver
        .load(&path.display().to_string())
        .expect("fixture should load")
}

/// Collects every `$ref` value of a tree, in document order.
pub fn references(tree: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(tree, &mut found);
    found
}

fn collect_references(node: &Value, found: &mut Vec<String>) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get(REF_KEY) {
                found.push(reference.clone());
            }
            for value in map.values() {
                collect_references(value, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, found);
            }
        }
        _ => {}
    }
}

/// Checks that every internal reference of the document has a target.
pub fn assert_no_dangling_reference(document: &Document) {
    for raw in references(document.tree()) {
        let reference = Reference::parse(&raw);
        if reference.kind() == ReferenceKind::Internal {
            assert!(
                document.find(reference.fragment()).is_some(),
                "dangling reference '{raw}' in {}",
                document.locator()
            );
        }
    }
}
