//! Inverted full-text index over file contents.
//!
//! The inverted structure narrows the candidate set; case-insensitive line
//! scanning over the raw content is the ground truth for user-visible
//! matches. A side mapping keeps the raw content of every indexed file so
//! that line extraction and the read operation never touch disk.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use globset::GlobBuilder;
use regex::{Regex, RegexBuilder};

use crate::error::{IndexError, Result};

use super::DEFAULT_MAX_RESULTS;

/// How many inverted-index hits to consider per query, as a multiple of the
/// requested result count. Leaves room for the path/glob post-filters.
const RESULT_WINDOW_FACTOR: usize = 5;

/// Split a text into lowercase word-level tokens. Word characters are
/// alphanumerics and `_`; everything else separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// A single matched line with optional surrounding context.
#[derive(Debug, Clone)]
pub struct LineMatch {
    /// 1-based line number.
    pub line_number: usize,
    pub line_text: String,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

/// All line matches within one file.
#[derive(Debug, Clone)]
pub struct ContentSearchResult {
    pub relative_path: String,
    pub matches: Vec<LineMatch>,
}

/// Parameters for [`ContentIndex::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Plain text for word match, `"..."` for exact phrase, `/.../` for regex.
    pub query: String,
    /// Exact relative path filter. Overrides `file_glob` when non-empty.
    pub file_path: String,
    /// Doublestar glob filter.
    pub file_glob: String,
    /// Maximum number of file results; `<= 0` uses the default of 50.
    pub max_results: i64,
    /// Context lines before and after each match; `< 0` is treated as 0.
    pub context_lines: i64,
}

/// Syntactic query form, decided purely by delimiters.
enum ParsedQuery {
    Word(String),
    Phrase(String),
    Regex(String),
}

fn parse_query(query: &str) -> ParsedQuery {
    let query = query.trim();
    if query.starts_with('/') && query.ends_with('/') && query.len() > 2 {
        return ParsedQuery::Regex(query[1..query.len() - 1].to_string());
    }
    if query.starts_with('"') && query.ends_with('"') && query.len() > 2 {
        return ParsedQuery::Phrase(query[1..query.len() - 1].to_string());
    }
    ParsedQuery::Word(query.to_string())
}

/// Decides whether a content line is a user-visible match.
enum LineMatcher {
    /// Case-insensitive substring (word and phrase queries).
    Substring(String),
    /// Case-insensitive regular expression (`/.../` queries).
    Regex(Regex),
}

impl LineMatcher {
    fn is_match(&self, line: &str) -> bool {
        match self {
            LineMatcher::Substring(term) => line.to_lowercase().contains(term.as_str()),
            LineMatcher::Regex(re) => re.is_match(line),
        }
    }
}

#[derive(Default)]
struct ContentInner {
    next_seq: u64,
    /// relative path → document entry
    docs: HashMap<String, DocEntry>,
    /// token → sorted document sequence numbers
    postings: HashMap<String, Vec<u64>>,
    /// sequence number → relative path
    seq_paths: HashMap<u64, String>,
    /// relative path → raw file content. Keys always equal the doc keys.
    contents: HashMap<String, String>,
}

struct DocEntry {
    seq: u64,
    /// unique tokens of the content, for posting cleanup on update/remove
    tokens: Vec<String>,
    #[allow(dead_code)]
    language: String,
}

impl ContentInner {
    fn remove_doc_postings(&mut self, seq: u64, tokens: &[String]) {
        for token in tokens {
            if let Some(postings) = self.postings.get_mut(token) {
                postings.retain(|s| *s != seq);
                if postings.is_empty() {
                    self.postings.remove(token);
                }
            }
        }
    }
}

/// In-memory inverted index plus raw-content side mapping, guarded by a
/// single reader-writer lock so readers never see one without the other.
#[derive(Default)]
pub struct ContentIndex {
    inner: RwLock<ContentInner>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a file's content in the index.
    pub fn index_file(&self, relative_path: &str, content: &str, language: &str) -> Result<()> {
        let tokens: Vec<String> = {
            let set: BTreeSet<String> = tokenize(content).into_iter().collect();
            set.into_iter().collect()
        };

        let mut inner = self.write_inner();

        // Replacing an existing document keeps its sequence number so result
        // ordering stays stable across updates.
        let seq = match inner.docs.remove(relative_path) {
            Some(old) => {
                inner.remove_doc_postings(old.seq, &old.tokens);
                old.seq
            }
            None => {
                let seq = inner.next_seq;
                inner.next_seq += 1;
                inner.seq_paths.insert(seq, relative_path.to_string());
                seq
            }
        };

        for token in &tokens {
            let postings = inner.postings.entry(token.clone()).or_default();
            if let Err(pos) = postings.binary_search(&seq) {
                postings.insert(pos, seq);
            }
        }

        inner.docs.insert(
            relative_path.to_string(),
            DocEntry {
                seq,
                tokens,
                language: language.to_string(),
            },
        );
        inner
            .contents
            .insert(relative_path.to_string(), content.to_string());

        Ok(())
    }

    /// Remove a file from both the inverted structure and the content map.
    pub fn remove_file(&self, relative_path: &str) {
        let mut inner = self.write_inner();
        if let Some(entry) = inner.docs.remove(relative_path) {
            inner.remove_doc_postings(entry.seq, &entry.tokens);
            inner.seq_paths.remove(&entry.seq);
        }
        inner.contents.remove(relative_path);
    }

    /// Raw content of an indexed file, or `None` when not indexed.
    pub fn get_file_content(&self, relative_path: &str) -> Option<String> {
        let normalized = relative_path.replace('\\', "/");
        self.read_inner().contents.get(&normalized).cloned()
    }

    /// Number of indexed documents.
    pub fn document_count(&self) -> usize {
        self.read_inner().docs.len()
    }

    /// Drop every document and start from a fresh empty structure.
    pub fn clear(&self) {
        let mut inner = self.write_inner();
        *inner = ContentInner::default();
    }

    /// Full-text search across all indexed files.
    ///
    /// Returns per-file line matches grouped in the order the inverted
    /// structure returned the documents, plus the total line match count.
    pub fn search(&self, options: &SearchOptions) -> Result<(Vec<ContentSearchResult>, usize)> {
        let max_results = if options.max_results <= 0 {
            DEFAULT_MAX_RESULTS as usize
        } else {
            options.max_results as usize
        };
        let context_lines = options.context_lines.max(0) as usize;

        let parsed = parse_query(&options.query);
        let line_matcher = match &parsed {
            ParsedQuery::Word(term) | ParsedQuery::Phrase(term) => {
                LineMatcher::Substring(term.to_lowercase())
            }
            ParsedQuery::Regex(pattern) => {
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| IndexError::InvalidRegex {
                        pattern: pattern.clone(),
                        source,
                    })?;
                LineMatcher::Regex(re)
            }
        };

        let glob_matcher = if options.file_path.is_empty() && !options.file_glob.is_empty() {
            let pattern = options.file_glob.replace('\\', "/");
            let matcher = GlobBuilder::new(&pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| IndexError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?
                .compile_matcher();
            Some(matcher)
        } else {
            None
        };
        let normalized_file_path = options.file_path.replace('\\', "/");

        let inner = self.read_inner();

        let mut candidates = Self::collect_candidates(&inner, &parsed);
        candidates.truncate(max_results.saturating_mul(RESULT_WINDOW_FACTOR));

        let mut results: Vec<ContentSearchResult> = Vec::new();
        let mut total_matches = 0;

        for seq in candidates {
            let relative_path = match inner.seq_paths.get(&seq) {
                Some(p) => p,
                None => continue,
            };
            // A concurrent removal may have raced the candidate collection.
            let content = match inner.contents.get(relative_path) {
                Some(c) => c,
                None => continue,
            };

            if !normalized_file_path.is_empty() {
                if relative_path != &normalized_file_path {
                    continue;
                }
            } else if let Some(ref glob) = glob_matcher {
                if !glob.is_match(relative_path.as_str()) {
                    continue;
                }
            }

            let matches = find_matching_lines(content, &line_matcher, context_lines);
            if matches.is_empty() {
                continue;
            }

            total_matches += matches.len();
            results.push(ContentSearchResult {
                relative_path: relative_path.clone(),
                matches,
            });

            if results.len() >= max_results {
                break;
            }
        }

        Ok((results, total_matches))
    }

    /// Candidate documents for a parsed query, in insertion order.
    ///
    /// Word queries take the union of the per-token posting lists, phrase
    /// queries the intersection. Regex queries consider every document,
    /// because a pattern may span token boundaries and line-level matching
    /// is the ground truth anyway.
    fn collect_candidates(inner: &ContentInner, parsed: &ParsedQuery) -> Vec<u64> {
        match parsed {
            ParsedQuery::Word(term) => {
                let mut seqs = BTreeSet::new();
                for token in tokenize(term) {
                    if let Some(postings) = inner.postings.get(&token) {
                        seqs.extend(postings.iter().copied());
                    }
                }
                seqs.into_iter().collect()
            }
            ParsedQuery::Phrase(phrase) => {
                let tokens = tokenize(phrase);
                if tokens.is_empty() {
                    return Vec::new();
                }
                let mut iter = tokens.iter();
                let first = iter.next().unwrap();
                let mut seqs: Vec<u64> = inner.postings.get(first).cloned().unwrap_or_default();
                for token in iter {
                    let postings = match inner.postings.get(token) {
                        Some(p) => p,
                        None => return Vec::new(),
                    };
                    seqs = sorted_intersect(&seqs, postings);
                    if seqs.is_empty() {
                        break;
                    }
                }
                seqs
            }
            ParsedQuery::Regex(_) => {
                let mut seqs: Vec<u64> = inner.seq_paths.keys().copied().collect();
                seqs.sort_unstable();
                seqs
            }
        }
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, ContentInner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, ContentInner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Intersection of two sorted sequence lists.
fn sorted_intersect(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Scan content line by line, recording 1-based line numbers and up to
/// `context_lines` lines before and after each hit, clamped to file bounds.
fn find_matching_lines(
    content: &str,
    matcher: &LineMatcher,
    context_lines: usize,
) -> Vec<LineMatch> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut matches = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if !matcher.is_match(line) {
            continue;
        }

        let start = idx.saturating_sub(context_lines);
        let end = (idx + context_lines + 1).min(lines.len());

        matches.push(LineMatch {
            line_number: idx + 1,
            line_text: line.to_string(),
            context_before: lines[start..idx].iter().map(|l| l.to_string()).collect(),
            context_after: lines[idx + 1..end].iter().map(|l| l.to_string()).collect(),
        });
    }

    matches
}
