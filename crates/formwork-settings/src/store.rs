//! The settings store: authored forms and their active flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use formwork_core::Form;
use formwork_resolver::validate_form;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SettingsError};

/// A stored form with its id and active flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    pub id: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(flatten)]
    pub form: Form,
}

fn default_active() -> bool {
    true
}

/// On-disk shape of the settings file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    forms: Vec<FormRecord>,
}

/// Build a form id: the title with whitespace replaced by `-`, then `-` and
/// the creation time in base-36 milliseconds.
pub fn form_id(title: &str, created_millis: u64) -> String {
    let slug: String = title
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    format!("{}-{}", slug, to_base36(created_millis))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Authored forms backed by a JSON file.
///
/// Mutations only touch memory; call [`SettingsStore::save`] to persist.
#[derive(Debug)]
pub struct SettingsStore {
    file_path: PathBuf,
    forms: Vec<FormRecord>,
}

impl SettingsStore {
    /// An empty store that will save to `file_path`.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            forms: Vec::new(),
        }
    }

    /// Load the store from `file_path`. A missing or empty file is an empty
    /// store.
    pub fn load(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        let settings = if file_path.exists() {
            let content = fs::read_to_string(&file_path)?;
            if content.trim().is_empty() {
                SettingsFile::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            SettingsFile::default()
        };

        tracing::debug!(path = %file_path.display(), forms = settings.forms.len(), "loaded settings");
        Ok(Self {
            file_path,
            forms: settings.forms,
        })
    }

    /// Write the store to its file. The file is replaced atomically.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.file_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let settings = SettingsFile {
            forms: self.forms.clone(),
        };
        let content = serde_json::to_string_pretty(&settings)?;

        let temp_path = self.file_path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.file_path)?;

        tracing::debug!(path = %self.file_path.display(), forms = self.forms.len(), "saved settings");
        Ok(())
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// All forms, newest first.
    pub fn forms(&self) -> &[FormRecord] {
        &self.forms
    }

    pub fn active_forms(&self) -> impl Iterator<Item = &FormRecord> {
        self.forms.iter().filter(|record| record.active)
    }

    pub fn get(&self, id: &str) -> Result<&FormRecord> {
        self.forms
            .iter()
            .find(|record| record.id == id)
            .ok_or_else(|| SettingsError::FormNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut FormRecord> {
        self.forms
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| SettingsError::FormNotFound(id.to_string()))
    }

    /// Add a new active form in front of the others and return its id.
    pub fn create(&mut self, form: Form) -> Result<String> {
        self.create_at(form, now_millis())
    }

    /// Like [`SettingsStore::create`], with an explicit creation time.
    pub fn create_at(&mut self, form: Form, created_millis: u64) -> Result<String> {
        check(&form)?;

        let mut millis = created_millis;
        let mut id = form_id(&form.title, millis);
        while self.forms.iter().any(|record| record.id == id) {
            millis += 1;
            id = form_id(&form.title, millis);
        }

        tracing::debug!(id = %id, "created form");
        self.forms.insert(
            0,
            FormRecord {
                id: id.clone(),
                active: true,
                form,
            },
        );
        Ok(id)
    }

    /// Replace a form's definition, keeping its id and active flag.
    pub fn update(&mut self, id: &str, form: Form) -> Result<()> {
        check(&form)?;
        self.get_mut(id)?.form = form;
        tracing::debug!(id, "updated form");
        Ok(())
    }

    /// Flip a form's active flag and return the new value.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let record = self.get_mut(id)?;
        record.active = !record.active;
        tracing::debug!(id, active = record.active, "toggled form");
        Ok(record.active)
    }

    pub fn delete(&mut self, id: &str) -> Result<FormRecord> {
        let index = self
            .forms
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| SettingsError::FormNotFound(id.to_string()))?;
        tracing::debug!(id, "deleted form");
        Ok(self.forms.remove(index))
    }
}

fn check(form: &Form) -> Result<()> {
    validate_form(form).map_err(|errors| SettingsError::InvalidForm {
        title: form.title.clone(),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::{DropdownOptions, Field};

    fn expenses() -> Form {
        Form::new("Monthly expenses", "expenses/")
            .with_field(Field::text("Name", "field-name"))
            .with_field(Field::dropdown(
                "Category",
                "field-category",
                DropdownOptions::expression("{{%%categories/%%}}"),
            ))
            .with_field(Field::text("Slug", "field-slug").with_expression("{{$$.field-name}}"))
    }

    #[test]
    fn test_form_id() {
        assert_eq!(form_id("Monthly expenses", 35), "Monthly-expenses-z");
        assert_eq!(form_id("a\tb", 36), "a-b-10");
        assert_eq!(form_id("x", 0), "x-0");
    }

    #[test]
    fn test_create_prepends_active_forms() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::new(dir.path().join("settings.json"));
        let first = store.create_at(expenses(), 1).unwrap();
        let second = store.create_at(Form::new("Notes", "notes/"), 2).unwrap();
        assert_eq!(store.forms()[0].id, second);
        assert_eq!(store.forms()[1].id, first);
        assert!(store.get(&first).unwrap().active);
    }

    #[test]
    fn test_create_avoids_id_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::new(dir.path().join("settings.json"));
        let a = store.create_at(Form::new("Same", "a/"), 10).unwrap();
        let b = store.create_at(Form::new("Same", "b/"), 10).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_create_rejects_invalid_references() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::new(dir.path().join("settings.json"));
        let form = Form::new("Bad", "bad/")
            .with_field(Field::text("A", "a").with_expression("{{$$.b}}"))
            .with_field(Field::text("B", "b"));
        match store.create(form) {
            Err(SettingsError::InvalidForm { errors, .. }) => assert_eq!(errors.len(), 1),
            other => panic!("Expected invalid form, got {:?}", other),
        }
        assert!(store.forms().is_empty());
    }

    #[test]
    fn test_toggle_update_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::new(dir.path().join("settings.json"));
        let id = store.create_at(expenses(), 5).unwrap();

        assert!(!store.toggle(&id).unwrap());
        assert_eq!(store.active_forms().count(), 0);

        let mut form = expenses();
        form.submit_label = "Save".to_string();
        store.update(&id, form).unwrap();
        assert_eq!(store.get(&id).unwrap().form.submit_label, "Save");
        assert!(!store.get(&id).unwrap().active);

        let removed = store.delete(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(matches!(store.delete(&id), Err(SettingsError::FormNotFound(_))));
        assert!(matches!(store.toggle("nope"), Err(SettingsError::FormNotFound(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut store = SettingsStore::new(&path);
        let id = store.create_at(expenses(), 1_716_155_614_454).unwrap();
        store.save().unwrap();

        let loaded = SettingsStore::load(&path).unwrap();
        assert_eq!(loaded.forms(), store.forms());
        assert_eq!(loaded.get(&id).unwrap().form.fields.len(), 3);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::load(dir.path().join("absent.json")).unwrap();
        assert!(store.forms().is_empty());
    }

    #[test]
    fn test_load_plugin_style_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"{"forms":[{"id":"Expenses-lwf3k2","active":false,"title":"Expenses",
                "path":"expenses/","submitLabel":"Add","formFields":[
                {"type":"text","name":"Field 01","className":"field01",
                 "content":{"expression":"{{%%expenses/1716155614454.md%%.category}}"}},
                {"type":"dropdown","name":"Field 04","className":"field04",
                 "content":{"expression":"{{$$.field01}}"},"options":{"value":["a","b"]}}]}]}"#,
        )
        .unwrap();

        let store = SettingsStore::load(&path).unwrap();
        let record = store.get("Expenses-lwf3k2").unwrap();
        assert!(!record.active);
        let options = record.form.fields[1].options().unwrap();
        assert_eq!(options.value, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
