use std::collections::HashSet;
use std::path::Path;

/// Result of expanding a set of user-supplied patterns: concrete files in
/// first-occurrence order, plus the patterns that matched nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    pub files: Vec<String>,
    pub unmatched: Vec<String>,
}

/// Expands path patterns (literal files, directories, `*`/`?` wildcards and
/// recursive `**` globs) into the list of convertible files.
pub struct PatternExpander {
    extensions: Vec<String>,
}

impl PatternExpander {
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Expand `patterns` in input order. Each file appears at most once, at
    /// the position of its first match. Files with unrecognized extensions
    /// are dropped silently; a pattern is reported unmatched only when it
    /// matched no file at all.
    pub fn expand(&self, patterns: &[String]) -> Expansion {
        let mut seen: HashSet<String> = HashSet::new();
        let mut expansion = Expansion::default();

        for raw in patterns {
            let pattern = raw.trim();
            if pattern.is_empty() {
                continue;
            }

            let matched = if pattern.contains(['*', '?', '[']) {
                self.expand_glob(pattern, &mut seen, &mut expansion.files)
            } else {
                self.expand_literal(pattern, &mut seen, &mut expansion.files)
            };

            if matched == 0 {
                expansion.unmatched.push(pattern.to_string());
            }
        }

        expansion
    }

    /// Returns how many existing files the glob matched, supported or not.
    fn expand_glob(
        &self,
        pattern: &str,
        seen: &mut HashSet<String>,
        files: &mut Vec<String>,
    ) -> usize {
        let entries = match glob::glob(pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Malformed glob pattern '{}': {}", pattern, e);
                return 0;
            }
        };

        let mut matched = 0;
        for path in entries.flatten() {
            if !path.is_file() {
                continue;
            }
            matched += 1;
            if self.is_supported(&path) {
                push_unique(&path, seen, files);
            }
        }
        matched
    }

    fn expand_literal(
        &self,
        pattern: &str,
        seen: &mut HashSet<String>,
        files: &mut Vec<String>,
    ) -> usize {
        let path = Path::new(pattern);

        if path.is_file() {
            if self.is_supported(path) {
                push_unique(path, seen, files);
            }
            return 1;
        }

        // A directory expands to its directly contained supported files.
        if path.is_dir() {
            let entries = match std::fs::read_dir(path) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Cannot read directory '{}': {}", pattern, e);
                    return 0;
                }
            };
            let mut matched = 0;
            for entry in entries.flatten() {
                let child = entry.path();
                if child.is_file() && self.is_supported(&child) {
                    matched += 1;
                    push_unique(&child, seen, files);
                }
            }
            return matched;
        }

        0
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == &ext.to_lowercase()))
            .unwrap_or(false)
    }
}

fn push_unique(path: &Path, seen: &mut HashSet<String>, files: &mut Vec<String>) {
    let key = path.to_string_lossy().into_owned();
    if seen.insert(key.clone()) {
        files.push(key);
    }
}
