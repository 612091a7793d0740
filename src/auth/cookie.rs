use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Name/path-scoped cookie facility the session binding mirrors ID tokens
/// into.
pub trait CookieStore: Send + Sync + 'static {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, path: &str);
    fn delete(&self, name: &str, path: &str);
}

/// Process-local store for native targets and tests.
#[derive(Default)]
pub struct MemoryCookieStore {
    cookies: Mutex<HashMap<String, String>>,
}

impl MemoryCookieStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.lock().unwrap().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str, _path: &str) {
        self.cookies
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    fn delete(&self, name: &str, _path: &str) {
        self.cookies.lock().unwrap().remove(name);
    }
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub use wasm::DocumentCookieStore;

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
mod wasm {
    use super::CookieStore;
    use wasm_bindgen::JsCast;
    use web_sys::HtmlDocument;

    /// Cookie store backed by `document.cookie`.
    #[derive(Clone, Copy, Default)]
    pub struct DocumentCookieStore;

    fn html_document() -> Option<HtmlDocument> {
        web_sys::window()?
            .document()?
            .dyn_into::<HtmlDocument>()
            .ok()
    }

    impl CookieStore for DocumentCookieStore {
        fn get(&self, name: &str) -> Option<String> {
            let cookies = html_document()?.cookie().ok()?;
            cookies.split(';').find_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                (key == name).then(|| value.to_string())
            })
        }

        fn set(&self, name: &str, value: &str, path: &str) {
            if let Some(document) = html_document() {
                if document
                    .set_cookie(&format!("{name}={value}; path={path}"))
                    .is_err()
                {
                    log::warn!("failed to write session cookie {name}");
                }
            }
        }

        fn delete(&self, name: &str, path: &str) {
            if let Some(document) = html_document() {
                if document
                    .set_cookie(&format!("{name}=; path={path}; max-age=0"))
                    .is_err()
                {
                    log::warn!("failed to delete session cookie {name}");
                }
            }
        }
    }
}
