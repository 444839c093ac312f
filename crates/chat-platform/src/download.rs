//! Browser file download — saves a transcript by clicking a transient
//! data-URI anchor element.

use wasm_bindgen::JsCast;
use web_sys::HtmlAnchorElement;

use chat_types::{ChatError, Result};

/// Trigger a download of `content` as `filename`.
pub fn download_text(filename: &str, mime: &str, content: &str) -> Result<()> {
    let encoded: String = js_sys::encode_uri_component(content).into();
    let href = format!("data:{};charset=utf-8,{}", mime, encoded);

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ChatError::JsInterop("no document".to_string()))?;

    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(|e| ChatError::JsInterop(format!("{:?}", e)))?
        .dyn_into()
        .map_err(|_| ChatError::JsInterop("not an anchor element".to_string()))?;

    anchor.set_href(&href);
    anchor.set_download(filename);
    anchor.click();
    Ok(())
}
