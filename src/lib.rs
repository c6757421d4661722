pub mod annotations;
pub mod refs;
pub mod render;
pub mod schema;
pub mod sink;
pub mod sql;

use tracing::debug;
use wasm_bindgen::prelude::*;

use annotations::Annotations;
use refs::ReverseIndex;
use render::{DanglingPolicy, RenderError, RenderOptions, RenderSummary, Renderer};
use schema::Schema;
use sink::{DocumentId, DocumentSink, MemorySink};
use sql::{Dialect, parse_sql};

/// Index `schema` and render the documents for `subset` (all tables when `None`).
pub fn render_schema(
    schema: &Schema,
    annotations: &Annotations,
    subset: Option<&[String]>,
    options: RenderOptions,
    sink: &mut dyn DocumentSink,
) -> Result<RenderSummary, RenderError> {
    let index = ReverseIndex::build(schema);
    debug!(references = index.len(), targets = ?index.targets(), "built reverse index");
    Renderer::new(options).render(schema, annotations, &index, subset, sink)
}

/// SQL text and annotation text in, `(file name, html)` pairs out.
pub fn render_sql(
    sql: &str,
    annotations: Option<&str>,
    dialect: Dialect,
    schema_name: &str,
    options: RenderOptions,
) -> Result<Vec<(String, String)>, String> {
    let schema = parse_sql(sql, dialect, schema_name).map_err(|e| e.to_string())?;
    let annotations = match annotations {
        Some(text) => Annotations::parse(text).map_err(|e| e.to_string())?,
        None => Annotations::new(),
    };

    let mut sink = MemorySink::new();
    render_schema(&schema, &annotations, None, options, &mut sink).map_err(|e| e.to_string())?;
    Ok(sink
        .into_documents()
        .into_iter()
        .map(|(id, html): (DocumentId, String)| (id.file_name(), html))
        .collect())
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Render a SQL dump to an object mapping file names to HTML.
#[wasm_bindgen(js_name = "schemaToHtml")]
pub fn schema_to_html(
    sql: &str,
    annotations: Option<String>,
    dialect: Option<String>,
    schema_name: Option<String>,
) -> Result<js_sys::Object, String> {
    let dialect = match dialect.as_deref() {
        Some(name) => name.parse::<Dialect>()?,
        None => Dialect::Auto,
    };
    let options = RenderOptions {
        dangling: DanglingPolicy::Unlinked,
    };
    let documents = render_sql(
        sql,
        annotations.as_deref(),
        dialect,
        schema_name.as_deref().unwrap_or("schema"),
        options,
    )?;

    let out = js_sys::Object::new();
    for (name, html) in documents {
        js_sys::Reflect::set(&out, &JsValue::from_str(&name), &JsValue::from_str(&html))
            .map_err(|_| format!("Failed to store {}", name))?;
    }
    Ok(out)
}
