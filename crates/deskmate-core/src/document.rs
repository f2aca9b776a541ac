//! Document collaborators: plain-text extraction and notes export.
//!
//! Extraction never fails loudly. Unreadable files, unsupported extensions and
//! missing converters all collapse to an empty string, which callers treat as
//! "no extractable text".

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use std::process::Command;

/// File formats the extractor knows how to turn into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Pdf,
    Word,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "doc" | "docx" => Some(Self::Word),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentReader;

impl DocumentReader {
    pub fn new() -> Self {
        Self
    }

    /// Extract plain text from `path`, or an empty string on any failure.
    pub fn extract(&self, path: &Path) -> String {
        let Some(kind) = DocumentKind::from_path(path) else {
            tracing::warn!(path = %path.display(), "unsupported document type");
            return String::new();
        };
        let result = match kind {
            DocumentKind::Text => self.read_file_content(path),
            DocumentKind::Pdf => {
                run_converter("pdftotext", &["-layout", "-enc", "UTF-8"], path, &["-"])
            }
            DocumentKind::Word => run_converter("pandoc", &["--to", "plain"], path, &[]),
        };
        match result {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "text extraction failed");
                String::new()
            }
        }
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }
}

fn run_converter(program: &str, args: &[&str], input: &Path, trailing: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .arg(input)
        .args(trailing)
        .output()
        .with_context(|| format!("failed to run {program}"))?;
    if !output.status.success() {
        return Err(anyhow!("{program} failed: {}", String::from_utf8_lossy(&output.stderr).trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// `abstract_summary` -> `AbstractSummary`
pub fn section_heading(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Write `sections` in order as a Markdown document at `path`, creating
/// parent directories as needed.
pub fn export_sections(sections: &[(String, String)], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let mut out = String::new();
    for (key, text) in sections {
        out.push_str("# ");
        out.push_str(&section_heading(key));
        out.push_str("\n\n");
        out.push_str(text.trim_end());
        out.push_str("\n\n");
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
