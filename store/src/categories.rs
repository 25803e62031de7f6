use crate::write_atomic;
use rfetcher_core::{Category, StoreError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HEADER: &str = "# Auto-category mapping file\n# Format: Category: keyword1, keyword2, ...\n\n";

/// Category name to wanted-keyword mapping backed by a plain text file.
///
/// Each line reads `Name: kw1, kw2, ...`. Blank lines, `#` comments and
/// lines without a colon are ignored. Every mutation rewrites the file.
#[derive(Debug, Clone)]
pub struct CategoryStore {
    path: PathBuf,
    categories: Vec<Category>,
}

impl CategoryStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let categories = match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No category file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(source) => {
                return Err(StoreError::ReadFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        debug!(
            "Loaded {} categories from {}",
            categories.len(),
            path.display()
        );
        Ok(Self { path, categories })
    }

    /// A later line for an existing name replaces its keywords in place.
    pub fn parse(content: &str) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, keywords)) = line.split_once(':') else {
                continue;
            };

            let name = name.trim();
            let keywords: Vec<String> = keywords
                .split(',')
                .map(str::trim)
                .filter(|kw| !kw.is_empty())
                .map(str::to_string)
                .collect();

            match categories.iter_mut().find(|c| c.name == name) {
                Some(existing) => existing.keywords = keywords,
                None => categories.push(Category::new(name, keywords)),
            }
        }

        categories
    }

    pub fn render(&self) -> String {
        let mut out = String::from(HEADER);
        for category in &self.categories {
            out.push_str(&category.name);
            out.push_str(": ");
            out.push_str(&category.keywords.join(", "));
            out.push('\n');
        }
        out
    }

    pub fn save(&self) -> Result<(), StoreError> {
        write_atomic(&self.path, self.render().as_bytes())?;
        debug!("Saved {} categories to {}", self.len(), self.path.display());
        Ok(())
    }

    pub fn upsert(&mut self, name: &str, keywords: Vec<String>) -> Result<(), StoreError> {
        match self.categories.iter_mut().find(|c| c.name == name) {
            Some(existing) => {
                existing.keywords = keywords;
                info!("Updated category '{}'", name);
            }
            None => {
                self.categories.push(Category::new(name, keywords));
                info!("Added category '{}'", name);
            }
        }
        self.save()
    }

    /// Returns whether a category was removed. The file is only rewritten
    /// when something changed.
    pub fn remove(&mut self, name: &str) -> Result<bool, StoreError> {
        let before = self.categories.len();
        self.categories.retain(|c| c.name != name);
        if self.categories.len() == before {
            return Ok(false);
        }
        info!("Deleted category '{}'", name);
        self.save()?;
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
