//! Template persistence.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::TemplateError;
use crate::models::template::Template;

/// Result type for template store operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// A keyed collection of templates. Names are unique; list order is
/// insertion order, which is also classification tie-break order.
pub trait TemplateStore {
    /// All templates in stored order.
    fn list(&self) -> Result<Vec<Template>>;

    /// Look up a template by name.
    fn get(&self, name: &str) -> Result<Template> {
        self.list()?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    /// Insert a template, replacing any existing one with the same name
    /// in place.
    fn put(&mut self, template: Template) -> Result<()>;

    /// Remove a template by name, returning it.
    fn remove(&mut self, name: &str) -> Result<Template>;
}

fn upsert(templates: &mut Vec<Template>, template: Template) -> Result<()> {
    if template.name.trim().is_empty() {
        return Err(TemplateError::EmptyName);
    }
    match templates.iter_mut().find(|t| t.name == template.name) {
        Some(existing) => *existing = template,
        None => templates.push(template),
    }
    Ok(())
}

fn take(templates: &mut Vec<Template>, name: &str) -> Result<Template> {
    let index = templates
        .iter()
        .position(|t| t.name == name)
        .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
    Ok(templates.remove(index))
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    templates: Vec<Template>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from templates, later duplicates replacing earlier ones.
    pub fn with_templates(templates: impl IntoIterator<Item = Template>) -> Result<Self> {
        let mut store = Self::new();
        for template in templates {
            store.put(template)?;
        }
        Ok(store)
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn list(&self) -> Result<Vec<Template>> {
        Ok(self.templates.clone())
    }

    fn put(&mut self, template: Template) -> Result<()> {
        upsert(&mut self.templates, template)
    }

    fn remove(&mut self, name: &str) -> Result<Template> {
        take(&mut self.templates, name)
    }
}

/// Store backed by a JSON array on disk. A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct JsonTemplateStore {
    path: PathBuf,
}

impl JsonTemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Template>> {
        if !self.path.exists() {
            debug!("Template store {} does not exist yet", self.path.display());
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let templates: Vec<Template> = serde_json::from_str(&content)?;
        debug!("Loaded {} templates from {}", templates.len(), self.path.display());
        Ok(templates)
    }

    fn write(&self, templates: &[Template]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(templates)?;
        std::fs::write(&self.path, content)?;
        info!("Saved {} templates to {}", templates.len(), self.path.display());
        Ok(())
    }
}

impl TemplateStore for JsonTemplateStore {
    fn list(&self) -> Result<Vec<Template>> {
        self.load()
    }

    fn put(&mut self, template: Template) -> Result<()> {
        let mut templates = self.load()?;
        upsert(&mut templates, template)?;
        self.write(&templates)
    }

    fn remove(&mut self, name: &str) -> Result<Template> {
        let mut templates = self.load()?;
        let removed = take(&mut templates, name)?;
        self.write(&templates)?;
        Ok(removed)
    }
}
