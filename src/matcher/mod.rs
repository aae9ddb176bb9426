//! The ignore matcher decides which paths are excluded from indexing.
//!
//! Layered rule sets, checked in order: force-include overrides, built-in
//! defaults, `.gitignore`, `.claudeignore`, and custom CLI exclude patterns.
//! `reload()` re-parses both ignore files when the watcher sees them change.

mod defaults;

pub use defaults::{DEFAULT_IGNORE_PATTERNS, PRUNE_DIR_NAMES};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use globset::{GlobBuilder, GlobMatcher};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::{IndexError, Result};

/// Default maximum file size: 1 MiB.
const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;

/// A built-in ignore pattern, precompiled at construction.
enum DefaultRule {
    /// Bare name: matches the basename or any path component, case-insensitive.
    Name(String),
    /// Shell glob: matched against the basename and the full relative path.
    Glob(GlobMatcher),
}

/// A user-supplied shell glob, kept with its source text.
struct CompiledGlob {
    pattern: String,
    matcher: GlobMatcher,
}

/// The two on-disk ignore rule sets. Swapped atomically by `reload()`.
struct IgnoreFiles {
    git: Option<Gitignore>,
    claude: Option<Gitignore>,
}

/// Configuration for [`IgnoreMatcher::new`].
pub struct MatcherOptions {
    pub root_dir: PathBuf,
    pub custom_patterns: Vec<String>,
    pub force_include_patterns: Vec<String>,
    pub max_file_size_bytes: u64,
}

/// Composite filter deciding per-path inclusion during indexing.
///
/// Thread-safe: `reload()` takes the write lock, the `should_ignore*` checks
/// take the read lock. Defaults, custom patterns, and force-include patterns
/// are immutable after construction.
pub struct IgnoreMatcher {
    root_dir: PathBuf,
    max_file_size_bytes: u64,
    default_rules: Vec<DefaultRule>,
    custom_globs: Vec<CompiledGlob>,
    force_include: Vec<CompiledGlob>,
    ignore_files: RwLock<IgnoreFiles>,
}

impl IgnoreMatcher {
    /// Build a matcher for the given root. Fails when a custom or
    /// force-include pattern is not a valid shell glob.
    pub fn new(options: MatcherOptions) -> Result<Self> {
        let max_file_size_bytes = if options.max_file_size_bytes == 0 {
            DEFAULT_MAX_FILE_SIZE_BYTES
        } else {
            options.max_file_size_bytes
        };

        let default_rules = DEFAULT_IGNORE_PATTERNS
            .iter()
            .map(|pattern| {
                if pattern.contains(['*', '?', '[']) {
                    compile_shell_glob(pattern, true).map(DefaultRule::Glob)
                } else {
                    Ok(DefaultRule::Name(pattern.to_lowercase()))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let custom_globs = compile_glob_list(&options.custom_patterns)?;
        let force_include = compile_glob_list(&options.force_include_patterns)?;

        let ignore_files = IgnoreFiles {
            git: load_ignore_file(&options.root_dir, ".gitignore"),
            claude: load_ignore_file(&options.root_dir, ".claudeignore"),
        };

        Ok(Self {
            root_dir: options.root_dir,
            max_file_size_bytes,
            default_rules,
            custom_globs,
            force_include,
            ignore_files: RwLock::new(ignore_files),
        })
    }

    /// Whether the given absolute path must be excluded from indexing.
    pub fn should_ignore(&self, absolute_path: &Path) -> bool {
        let relative_path = self.relative(absolute_path);
        let base_name = base_name_of(&relative_path);

        // Force-include overrides every exclude layer below.
        if self.matches_force_include(&relative_path, base_name) {
            return false;
        }

        if self.matches_default_patterns(&relative_path, base_name) {
            return true;
        }

        // Directory-only gitignore rules need to know whether this is a dir.
        let is_dir = fs::metadata(absolute_path)
            .map(|m| m.is_dir())
            .unwrap_or(false);

        {
            let files = match self.ignore_files.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(ref git) = files.git {
                if git.matched(&relative_path, is_dir).is_ignore() {
                    return true;
                }
            }
            if let Some(ref claude) = files.claude {
                if claude.matched(&relative_path, is_dir).is_ignore() {
                    return true;
                }
            }
        }

        self.custom_globs
            .iter()
            .any(|glob| glob.matcher.is_match(&relative_path) || glob.matcher.is_match(base_name))
    }

    /// Whether a directory should be skipped entirely during traversal.
    ///
    /// `.git` is pruned unconditionally. Other well-known directories are
    /// pruned lexically unless an active force-include pattern could match
    /// files inside them, in which case the walker must descend.
    pub fn should_ignore_dir(&self, absolute_path: &Path) -> bool {
        let dir_name = absolute_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        if dir_name == ".git" {
            return true;
        }

        if PRUNE_DIR_NAMES.contains(&dir_name) {
            if !self.force_include.is_empty() && self.force_include_may_descend(dir_name) {
                return false;
            }
            return true;
        }

        self.should_ignore(absolute_path)
    }

    /// Whether the file exceeds the configured size limit.
    pub fn is_file_too_large(&self, size_bytes: u64) -> bool {
        size_bytes > self.max_file_size_bytes
    }

    /// The configured maximum file size.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_bytes
    }

    /// Re-parse `.gitignore` and `.claudeignore` from disk and swap both rule
    /// sets atomically. Called when the watcher sees either file change.
    pub fn reload(&self) {
        let fresh = IgnoreFiles {
            git: load_ignore_file(&self.root_dir, ".gitignore"),
            claude: load_ignore_file(&self.root_dir, ".claudeignore"),
        };
        let mut files = match self.ignore_files.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *files = fresh;
    }

    /// Path relative to the root, normalized to forward slashes.
    fn relative(&self, absolute_path: &Path) -> String {
        let rel = absolute_path
            .strip_prefix(&self.root_dir)
            .unwrap_or(absolute_path);
        rel.to_string_lossy().replace('\\', "/")
    }

    fn matches_force_include(&self, relative_path: &str, base_name: &str) -> bool {
        self.force_include
            .iter()
            .any(|glob| glob.matcher.is_match(relative_path) || glob.matcher.is_match(base_name))
    }

    fn matches_default_patterns(&self, relative_path: &str, base_name: &str) -> bool {
        let base_lower = base_name.to_lowercase();
        self.default_rules.iter().any(|rule| match rule {
            DefaultRule::Name(name) => {
                base_lower == *name
                    || relative_path
                        .split('/')
                        .any(|part| part.to_lowercase() == *name)
            }
            DefaultRule::Glob(matcher) => {
                matcher.is_match(base_name) || matcher.is_match(relative_path)
            }
        })
    }

    /// Whether any force-include pattern could match a file below the named
    /// directory: a recursive `**` pattern reaches everywhere, and a pattern
    /// naming the directory as a component reaches inside it.
    fn force_include_may_descend(&self, dir_name: &str) -> bool {
        self.force_include.iter().any(|glob| {
            glob.pattern.contains("**")
                || glob
                    .pattern
                    .split('/')
                    .any(|part| part.eq_ignore_ascii_case(dir_name))
        })
    }
}

fn compile_glob_list(patterns: &[String]) -> Result<Vec<CompiledGlob>> {
    patterns
        .iter()
        .map(|pattern| {
            compile_shell_glob(pattern, false).map(|matcher| CompiledGlob {
                pattern: pattern.clone(),
                matcher,
            })
        })
        .collect()
}

fn compile_shell_glob(pattern: &str, case_insensitive: bool) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .case_insensitive(case_insensitive)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| IndexError::Config(format!("invalid ignore pattern '{}': {}", pattern, e)))
}

fn base_name_of(relative_path: &str) -> &str {
    relative_path.rsplit('/').next().unwrap_or(relative_path)
}

/// Parse one ignore file with full gitignore semantics. A missing or
/// unreadable file yields an empty rule set.
fn load_ignore_file(root_dir: &Path, file_name: &str) -> Option<Gitignore> {
    let path = root_dir.join(file_name);
    if !path.exists() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(root_dir);
    if builder.add(&path).is_some() {
        return None;
    }
    builder.build().ok()
}
