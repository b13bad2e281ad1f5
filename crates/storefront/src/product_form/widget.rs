//! Subscription widget loader.
//!
//! The widget is a third-party script that finds `#cb-widget-container`,
//! reads its `data-*` attributes and renders the purchase options. Pages
//! register the script through [`HeadScripts`], a reference-counted
//! registry rendered into `<head>`, so a page holding several product forms
//! still includes the script once.

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::WidgetConfig;

/// Reference-counted set of `<script src>` tags for one rendered page.
#[derive(Debug, Clone, Default)]
pub struct HeadScripts {
    entries: Arc<Mutex<Vec<(String, usize)>>>,
}

impl HeadScripts {
    /// Register `src`, or bump its count if already present.
    ///
    /// The script stays registered until every returned handle is dropped.
    #[must_use]
    pub fn acquire(&self, src: &str) -> ScriptHandle {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|(s, _)| s == src) {
            Some((_, count)) => *count += 1,
            None => entries.push((src.to_string(), 1)),
        }
        ScriptHandle {
            scripts: self.clone(),
            src: src.to_string(),
        }
    }

    /// Registered sources in registration order, each exactly once.
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(src, _)| src.clone())
            .collect()
    }

    fn release(&self, src: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = entries.iter().position(|(s, _)| s == src)
            && let Some((_, count)) = entries.get_mut(pos)
        {
            *count -= 1;
            if *count == 0 {
                entries.remove(pos);
            }
        }
    }
}

/// Keeps a script registered in [`HeadScripts`]; releases it on drop.
#[derive(Debug)]
pub struct ScriptHandle {
    scripts: HeadScripts,
    src: String,
}

impl ScriptHandle {
    #[must_use]
    pub fn src(&self) -> &str {
        &self.src
    }
}

impl Drop for ScriptHandle {
    fn drop(&mut self) {
        self.scripts.release(&self.src);
    }
}

/// Data the widget script reads from its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetContainer {
    /// Payload JSON (`data-product`).
    pub product: Arc<str>,
    /// Currency symbol (`data-currency`).
    pub currency: String,
    /// Style JSON (`data-cb_config`).
    pub config: String,
}

/// Loads the widget script and builds its container.
#[derive(Debug, Clone)]
pub struct WidgetLoader {
    script_url: String,
    style_config: String,
}

impl WidgetLoader {
    #[must_use]
    pub fn new(config: &WidgetConfig) -> Self {
        Self {
            script_url: config.script_url.clone(),
            style_config: config.style_config.clone(),
        }
    }

    #[must_use]
    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    /// Register the widget script on a page.
    #[must_use]
    pub fn load(&self, scripts: &HeadScripts) -> ScriptHandle {
        scripts.acquire(&self.script_url)
    }

    #[must_use]
    pub fn container(&self, product: Arc<str>, currency: &str) -> WidgetContainer {
        WidgetContainer {
            product,
            currency: currency.to_string(),
            config: self.style_config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "https://widgets.example/index.js";

    #[test]
    fn test_acquire_is_idempotent() {
        let scripts = HeadScripts::default();
        let first = scripts.acquire(SRC);
        let second = scripts.acquire(SRC);
        assert_eq!(scripts.scripts(), vec![SRC.to_string()]);
        assert_eq!(first.src(), second.src());
    }

    #[test]
    fn test_last_release_removes_script() {
        let scripts = HeadScripts::default();
        let first = scripts.acquire(SRC);
        let second = scripts.acquire(SRC);

        drop(first);
        assert_eq!(scripts.scripts(), vec![SRC.to_string()]);

        drop(second);
        assert!(scripts.scripts().is_empty());
    }

    #[test]
    fn test_scripts_keep_registration_order() {
        let scripts = HeadScripts::default();
        let _a = scripts.acquire("https://a.example/a.js");
        let _b = scripts.acquire("https://b.example/b.js");
        let _a_again = scripts.acquire("https://a.example/a.js");
        assert_eq!(
            scripts.scripts(),
            vec![
                "https://a.example/a.js".to_string(),
                "https://b.example/b.js".to_string()
            ]
        );
    }

    #[test]
    fn test_reacquire_after_release() {
        let scripts = HeadScripts::default();
        drop(scripts.acquire(SRC));
        let _handle = scripts.acquire(SRC);
        assert_eq!(scripts.scripts(), vec![SRC.to_string()]);
    }

    #[test]
    fn test_loader_container() {
        let loader = WidgetLoader::new(&WidgetConfig {
            script_url: SRC.to_string(),
            style_config: r##"{"bgColor":"#FFFFFF"}"##.to_string(),
        });
        let scripts = HeadScripts::default();
        let _handle = loader.load(&scripts);
        assert_eq!(scripts.scripts(), vec![SRC.to_string()]);

        let container = loader.container(Arc::from("{}"), "$");
        assert_eq!(&*container.product, "{}");
        assert_eq!(container.currency, "$");
        assert_eq!(container.config, r##"{"bgColor":"#FFFFFF"}"##);
    }
}
