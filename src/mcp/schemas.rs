//! JSON schema builders for MCP tools.

use serde_json::{Map, Value};

/// Build the schema describing the `upload-document` tool input.
pub(crate) fn upload_document_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "text".into(),
        string_schema("Raw document text to register. Provide either `text` or `path`."),
    );
    properties.insert(
        "path".into(),
        string_schema("Local path of a PDF or text file to extract and register."),
    );
    properties.insert(
        "filename".into(),
        string_schema("Display name; defaults to the file name of `path` or 'untitled'."),
    );
    properties.insert(
        "content_type".into(),
        string_schema("Optional MIME type overriding extension-based format detection."),
    );

    finalize_object_schema(properties, &[])
}

/// Build the schema describing the `list-documents` tool input.
pub(crate) fn list_documents_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "filename".into(),
        string_schema("Optional case-insensitive filename fragment to filter by"),
    );
    finalize_object_schema(properties, &[])
}

/// Schema for tools addressing a single document.
pub(crate) fn document_id_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("doc_id".into(), doc_id_schema());
    finalize_object_schema(properties, &["doc_id"])
}

/// Build the schema describing the `query-document` tool input.
pub(crate) fn query_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("doc_id".into(), doc_id_schema());
    properties.insert(
        "query".into(),
        string_schema("Natural language question answered from the document only"),
    );
    finalize_object_schema(properties, &["doc_id", "query"])
}

/// Schema representing an empty object (used for parameterless tools).
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

fn doc_id_schema() -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("integer".into()));
    schema.insert(
        "description".into(),
        Value::String("Document identifier returned by upload-document".into()),
    );
    schema.insert("minimum".into(), Value::Number(1.into()));
    Value::Object(schema)
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}
