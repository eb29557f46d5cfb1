//! Prompt templates
//!
//! Each stage's system and user prompts are Markdown assets under `prompts/`,
//! embedded at build time. A directory of `<name>.md` files can replace any of
//! them at runtime without touching stage code.
//!
//! Templates use `{placeholder}` slots. Rendering is a single pass, so text
//! substituted into a slot is never scanned for further placeholders.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// The six templates the pipeline uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateName {
    ResearchSystem,
    ResearchUser,
    WritingSystem,
    WritingUser,
    ReviewSystem,
    ReviewUser,
}

impl TemplateName {
    pub const ALL: [TemplateName; 6] = [
        TemplateName::ResearchSystem,
        TemplateName::ResearchUser,
        TemplateName::WritingSystem,
        TemplateName::WritingUser,
        TemplateName::ReviewSystem,
        TemplateName::ReviewUser,
    ];

    /// File stem used for overrides, e.g. `research.user`
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateName::ResearchSystem => "research.system",
            TemplateName::ResearchUser => "research.user",
            TemplateName::WritingSystem => "writing.system",
            TemplateName::WritingUser => "writing.user",
            TemplateName::ReviewSystem => "review.system",
            TemplateName::ReviewUser => "review.user",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            TemplateName::ResearchSystem => include_str!("../../prompts/research.system.md"),
            TemplateName::ResearchUser => include_str!("../../prompts/research.user.md"),
            TemplateName::WritingSystem => include_str!("../../prompts/writing.system.md"),
            TemplateName::WritingUser => include_str!("../../prompts/writing.user.md"),
            TemplateName::ReviewSystem => include_str!("../../prompts/review.system.md"),
            TemplateName::ReviewUser => include_str!("../../prompts/review.user.md"),
        }
    }
}

/// A named text template with `{placeholder}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self {
            text: text.trim_end().to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fill `{key}` slots from `vars`; unknown slots are left as written
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let replacement = after.find('}').and_then(|close| {
                let key = &after[..close];
                vars.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| (*v, close))
            });

            match replacement {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// The full set of templates for one run
#[derive(Debug, Clone)]
pub struct PromptSet {
    templates: HashMap<TemplateName, PromptTemplate>,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptSet {
    /// Templates compiled into the binary
    pub fn builtin() -> Self {
        let templates = TemplateName::ALL
            .iter()
            .map(|name| (*name, PromptTemplate::new(name.builtin())))
            .collect();
        Self { templates }
    }

    /// Built-ins overlaid with `<dir>/<name>.md` files that exist
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut set = Self::builtin();
        let Some(dir) = dir else {
            return Ok(set);
        };

        for name in TemplateName::ALL {
            let path = dir.join(format!("{}.md", name.as_str()));
            if path.is_file() {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read prompt {}", path.display()))?;
                tracing::debug!("Prompt override {} from {}", name.as_str(), path.display());
                set = set.with_template(name, PromptTemplate::new(text));
            }
        }
        Ok(set)
    }

    pub fn with_template(mut self, name: TemplateName, template: PromptTemplate) -> Self {
        self.templates.insert(name, template);
        self
    }

    pub fn get(&self, name: TemplateName) -> &PromptTemplate {
        // builtin() fills every name and with_template only replaces
        &self.templates[&name]
    }
}
