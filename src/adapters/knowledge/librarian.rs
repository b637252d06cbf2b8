//! Cheat-sheet backed knowledge provider.
//!
//! Each role reads a fixed set of markdown cheat sheets from
//! `{cheat_sheets_dir}/{name}.md`. Sheets are read on first use and cached
//! for the life of the librarian.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::ports::{KnowledgeError, KnowledgeProvider};

const SEPARATOR_WIDTH: usize = 60;

/// Role to cheat-sheet names, in the order they are presented.
const ROLE_SHEETS: &[(&str, &[&str])] = &[
    ("discovery", &["mom_test", "spin_selling"]),
    ("legacy", &["legacy_code_feathers", "c4_model", "refactoring_fowler"]),
    ("architect", &["eip_hohpe", "atam"]),
    ("estimator", &["mcconnell_estimation"]),
    ("proposal", &["minto_pyramid", "scqa_framework"]),
    // Fact extraction works from the client's documents alone.
    ("miner", &[]),
];

/// Cheat sheets configured for `role`, if the role is known.
pub fn sheets_for_role(role: &str) -> Option<&'static [&'static str]> {
    let role = role.to_lowercase();
    ROLE_SHEETS
        .iter()
        .find(|(name, _)| *name == role)
        .map(|(_, sheets)| *sheets)
}

/// Loads framework knowledge for agents and their critics.
#[derive(Debug)]
pub struct Librarian {
    /// `None` for in-memory libraries; nothing is read from disk
    dir: Option<PathBuf>,
    /// Sheet name to content; `None` records a sheet known to be missing
    cache: RwLock<HashMap<String, Option<String>>>,
}

impl Librarian {
    /// Library reading `{cheat_sheets_dir}/{name}.md` on demand.
    pub fn new(cheat_sheets_dir: impl AsRef<Path>) -> Self {
        let dir = cheat_sheets_dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Cheat sheets directory not found, agents will run without framework knowledge");
        }
        Self {
            dir: Some(dir),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Library backed only by `sheets` (sheet name to content).
    pub fn in_memory(sheets: HashMap<String, String>) -> Self {
        Self {
            dir: None,
            cache: RwLock::new(sheets.into_iter().map(|(name, text)| (name, Some(text))).collect()),
        }
    }

    async fn load_sheet(&self, name: &str) -> Option<String> {
        if let Some(cached) = self.cache.read().await.get(name) {
            return cached.clone();
        }

        let loaded = match &self.dir {
            Some(dir) => {
                let path = dir.join(format!("{name}.md"));
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => {
                        debug!(sheet = name, bytes = text.len(), "Loaded cheat sheet");
                        Some(text)
                    }
                    Err(err) => {
                        warn!(sheet = name, path = %path.display(), error = %err, "Cheat sheet not found");
                        None
                    }
                }
            }
            None => None,
        };

        self.cache.write().await.insert(name.to_string(), loaded.clone());
        loaded
    }

    async fn section(&self, name: &str) -> String {
        let rule = "=".repeat(SEPARATOR_WIDTH);
        let body = self
            .load_sheet(name)
            .await
            .unwrap_or_else(|| format!("(Cheat sheet {name}.md not found)"));
        format!("{rule}\n{}\n{rule}\n\n{body}", format!("{name}.md").to_uppercase())
    }
}

#[async_trait]
impl KnowledgeProvider for Librarian {
    async fn context_for_agent(&self, role: &str) -> Result<String, KnowledgeError> {
        let sheets = sheets_for_role(role).ok_or_else(|| KnowledgeError::UnknownRole(role.to_string()))?;
        let mut sections = Vec::with_capacity(sheets.len());
        for name in sheets {
            sections.push(self.section(name).await);
        }
        Ok(sections.join("\n\n"))
    }
}
