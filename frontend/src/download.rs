//! Browser downloads of generated text files.

use benchscope_core::export::{self, ExportFormat};
use benchscope_core::table::TableRow;
use wasm_bindgen::{JsCast, JsValue};

/// Saves `content` as a file through a temporary object URL.
pub fn download_text(filename: &str, mime: &str, content: &str) -> Result<(), JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(content));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let anchor: web_sys::HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();

    web_sys::Url::revoke_object_url(&url)
}

/// Renders the rows with the visible columns and downloads the result.
pub fn download_table<R: TableRow>(
    format: ExportFormat,
    rows: &[R],
    columns: &[R::Column],
    filename: &str,
    caption: &str,
) {
    let content = export::render(format, rows, columns, Some(caption));
    if let Err(e) = download_text(filename, format.mime_type(), &content) {
        log::error!("download of {} failed: {:?}", filename, e);
    }
}
