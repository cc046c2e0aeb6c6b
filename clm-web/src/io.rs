//! Browser storage and downloads using Web APIs

use wasm_bindgen::prelude::*;
use web_sys::{Blob, HtmlAnchorElement, Storage, Url};

use clm_core::{ClmError, KeyValueStore};

fn storage_error(e: JsValue) -> ClmError {
    ClmError::Storage(format!("{:?}", e))
}

/// `sessionStorage` or `localStorage` behind the app's store trait.
pub struct BrowserStore {
    storage: Storage,
}

impl BrowserStore {
    pub fn session() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let storage = window.session_storage()?.ok_or("No sessionStorage")?;
        Ok(Self { storage })
    }

    pub fn local() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let storage = window.local_storage()?.ok_or("No localStorage")?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> clm_core::Result<Option<String>> {
        self.storage.get_item(key).map_err(storage_error)
    }

    fn set(&mut self, key: &str, value: &str) -> clm_core::Result<()> {
        self.storage.set_item(key, value).map_err(storage_error)
    }

    fn remove(&mut self, key: &str) -> clm_core::Result<()> {
        self.storage.remove_item(key).map_err(storage_error)
    }
}

/// Download JSON as a file
pub fn download_json(filename: &str, json: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;

    // Create a blob from the JSON content
    let blob_parts = js_sys::Array::new();
    blob_parts.push(&JsValue::from_str(json));

    let blob_options = web_sys::BlobPropertyBag::new();
    blob_options.set_type("application/json");

    let blob = Blob::new_with_str_sequence_and_options(&blob_parts, &blob_options)?;

    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;

    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();

    Url::revoke_object_url(&url)?;

    Ok(())
}
