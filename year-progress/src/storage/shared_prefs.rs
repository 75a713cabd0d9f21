//! Shared preference store
//!
//! A named namespace of string values that another process (the live
//! wallpaper service) opens by name and reads on its own schedule. Nothing
//! here notifies the reader; it simply sees the latest values next time
//! it looks.
//!
//! The file backend uses the Android `shared_prefs/<namespace>.xml` layout:
//!
//! ```xml
//! <?xml version='1.0' encoding='utf-8' standalone='yes' ?>
//! <map>
//!     <string name="dotSize">20</string>
//! </map>
//! ```

use crate::error::{AppError, Result};
use async_trait::async_trait;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::fs;

#[async_trait]
pub trait SharedPreferences: Send + Sync {
    /// Namespace the reading process opens
    fn namespace(&self) -> &str;

    /// Every key in the namespace
    async fn get_all(&self) -> Result<BTreeMap<String, String>>;

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.get_all().await?;
        Ok(entries.remove(key))
    }

    /// Write each entry, leaving keys not mentioned untouched
    async fn put_strings(&self, entries: &[(&str, String)]) -> Result<()>;

    /// Remove every key in the namespace
    async fn clear(&self) -> Result<()>;
}

fn xml_error(e: impl std::fmt::Display) -> AppError {
    AppError::SharedPrefs(format!("XML error: {}", e))
}

/// Android-style XML file per namespace
pub struct XmlSharedPreferences {
    namespace: String,
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl XmlSharedPreferences {
    /// Preferences stored at `<dir>/<namespace>.xml`
    pub fn new(dir: &Path, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            path: dir.join(format!("{}.xml", namespace)),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read(&self.path).await?;
        let content = String::from_utf8(content).map_err(xml_error)?;
        parse_prefs_xml(&content)
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let xml = render_prefs_xml(entries)?;
        super::write_atomic(&self.path, &xml).await
    }
}

#[async_trait]
impl SharedPreferences for XmlSharedPreferences {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_all(&self) -> Result<BTreeMap<String, String>> {
        self.read_entries().await
    }

    async fn put_strings(&self, entries: &[(&str, String)]) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut current = match self.read_entries().await {
            Ok(current) => current,
            Err(AppError::SharedPrefs(e)) => {
                tracing::warn!("Shared preferences {:?} unreadable, rewriting: {}", self.path, e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };

        for (key, value) in entries {
            current.insert((*key).to_string(), value.clone());
        }
        self.write_entries(&current).await?;

        tracing::debug!(
            "Wrote {} shared preference(s) to namespace {}",
            entries.len(),
            self.namespace
        );
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_entries(&BTreeMap::new()).await
    }
}

/// Serialize entries as an Android shared preferences document
fn render_prefs_xml(entries: &BTreeMap<String, String>) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), Some("yes"))))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("map")))
        .map_err(xml_error)?;

    for (key, value) in entries {
        let mut element = BytesStart::new("string");
        element.push_attribute(("name", key.as_str()));
        writer
            .write_event(Event::Start(element))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("string")))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("map")))
        .map_err(xml_error)?;

    Ok(writer.into_inner())
}

/// Parse an Android shared preferences document.
///
/// `<string>` entries keep their text; typed entries (`<int>`, `<boolean>`,
/// ...) written by other tools are read from their `value` attribute.
fn parse_prefs_xml(content: &str) -> Result<BTreeMap<String, String>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut entries = BTreeMap::new();
    let mut open_string: Option<String> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(element) if element.name().as_ref() == b"string" => {
                let key = attribute(&element, "name")?;
                entries.insert(key.clone(), String::new());
                open_string = Some(key);
            }
            Event::Text(text) => {
                if let Some(key) = &open_string {
                    let value = text.unescape().map_err(xml_error)?.into_owned();
                    entries.insert(key.clone(), value);
                }
            }
            Event::End(element) if element.name().as_ref() == b"string" => {
                open_string = None;
            }
            Event::Empty(element) if element.name().as_ref() == b"string" => {
                entries.insert(attribute(&element, "name")?, String::new());
            }
            Event::Empty(element) if element.name().as_ref() != b"map" => {
                let key = attribute(&element, "name")?;
                let value = attribute(&element, "value")?;
                entries.insert(key, value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<String> {
    let attr = element
        .try_get_attribute(name)
        .map_err(xml_error)?
        .ok_or_else(|| {
            AppError::SharedPrefs(format!(
                "<{}> element missing {} attribute",
                String::from_utf8_lossy(element.name().as_ref()),
                name
            ))
        })?;
    Ok(attr.unescape_value().map_err(xml_error)?.into_owned())
}

/// In-process namespace with switchable write failures, for tests
pub struct MemorySharedPreferences {
    namespace: String,
    entries: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemorySharedPreferences {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            entries: Mutex::new(BTreeMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write return an error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::SharedPrefs(format!(
                "namespace {} is not writable",
                self.namespace
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SharedPreferences for MemorySharedPreferences {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_all(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.lock().clone())
    }

    async fn put_strings(&self, entries: &[(&str, String)]) -> Result<()> {
        self.check_writable()?;
        let mut current = self.lock();
        for (key, value) in entries {
            current.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.check_writable()?;
        self.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_prefs() -> (XmlSharedPreferences, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let prefs = XmlSharedPreferences::new(&temp_dir.path().join("shared_prefs"), "TestPrefs");
        (prefs, temp_dir)
    }

    #[tokio::test]
    async fn test_file_named_after_namespace() {
        let (prefs, temp) = create_test_prefs();
        assert_eq!(prefs.namespace(), "TestPrefs");
        assert_eq!(
            prefs.path(),
            temp.path().join("shared_prefs").join("TestPrefs.xml")
        );
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (prefs, _temp) = create_test_prefs();

        prefs
            .put_strings(&[("dotSize", "20".to_string()), ("todayColor", "#FF6B35".to_string())])
            .await
            .unwrap();

        assert_eq!(prefs.get_string("dotSize").await.unwrap().as_deref(), Some("20"));
        assert_eq!(
            prefs.get_string("todayColor").await.unwrap().as_deref(),
            Some("#FF6B35")
        );
        assert_eq!(prefs.get_string("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_keeps_other_keys() {
        let (prefs, _temp) = create_test_prefs();

        prefs.put_strings(&[("a", "1".to_string())]).await.unwrap();
        prefs.put_strings(&[("b", "2".to_string())]).await.unwrap();
        prefs.put_strings(&[("a", "3".to_string())]).await.unwrap();

        let all = prefs.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["a"], "3");
        assert_eq!(all["b"], "2");
    }

    #[tokio::test]
    async fn test_written_file_uses_android_layout() {
        let (prefs, _temp) = create_test_prefs();
        prefs
            .put_strings(&[("label", "a < b & \"c\"".to_string())])
            .await
            .unwrap();

        let content = std::fs::read_to_string(prefs.path()).unwrap();
        assert!(content.starts_with("<?xml"));
        assert!(content.contains("<map>"));
        assert!(content.contains("<string name=\"label\">"));
        assert!(!content.contains("a < b"));

        assert_eq!(
            prefs.get_string("label").await.unwrap().as_deref(),
            Some("a < b & \"c\"")
        );
    }

    #[test]
    fn test_parse_typed_and_empty_entries() {
        let xml = r#"<?xml version='1.0' encoding='utf-8' standalone='yes' ?>
<map>
    <string name="completedColor">#FFFFFF</string>
    <boolean name="showTodayHighlight" value="true" />
    <int name="gridCols" value="15" />
    <string name="blank" />
</map>"#;

        let entries = parse_prefs_xml(xml).unwrap();
        assert_eq!(entries["completedColor"], "#FFFFFF");
        assert_eq!(entries["showTodayHighlight"], "true");
        assert_eq!(entries["gridCols"], "15");
        assert_eq!(entries["blank"], "");
    }

    #[tokio::test]
    async fn test_clear() {
        let (prefs, _temp) = create_test_prefs();
        prefs.put_strings(&[("a", "1".to_string())]).await.unwrap();
        prefs.clear().await.unwrap();
        assert!(prefs.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_rewritten_on_put() {
        let (prefs, _temp) = create_test_prefs();
        std::fs::create_dir_all(prefs.path().parent().unwrap()).unwrap();
        std::fs::write(prefs.path(), "<map><string name=\"a\">1</map>").unwrap();

        assert!(prefs.get_all().await.is_err());

        prefs.put_strings(&[("b", "2".to_string())]).await.unwrap();
        let all = prefs.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["b"], "2");
    }

    #[tokio::test]
    async fn test_non_utf8_file_rewritten_on_put() {
        let (prefs, _temp) = create_test_prefs();
        std::fs::create_dir_all(prefs.path().parent().unwrap()).unwrap();
        std::fs::write(prefs.path(), [0xff, 0xfe]).unwrap();

        assert!(matches!(
            prefs.get_all().await,
            Err(AppError::SharedPrefs(_))
        ));

        prefs.put_strings(&[("dotSize", "12".to_string())]).await.unwrap();
        assert_eq!(prefs.get_string("dotSize").await.unwrap().as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn test_memory_prefs_failure_injection() {
        let prefs = MemorySharedPreferences::new("Mem");
        prefs.put_strings(&[("k", "v".to_string())]).await.unwrap();

        prefs.set_fail_writes(true);
        assert!(prefs.put_strings(&[("k", "w".to_string())]).await.is_err());
        assert!(prefs.clear().await.is_err());
        assert_eq!(prefs.get_string("k").await.unwrap().as_deref(), Some("v"));
    }
}
