//! Built-in ignore patterns applied before any ignore file or custom pattern.

/// Patterns that are always excluded from indexing. These cover directories
/// and files that are never useful for code search.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Dependencies
    "node_modules",
    "vendor",
    "bower_components",
    ".npm",
    ".yarn",
    ".pnp.*",
    // Build output
    "dist",
    "build",
    "out",
    "target",
    "bin",
    "obj",
    // IDE / Editor
    ".idea",
    ".vscode",
    ".vs",
    "*.swp",
    "*.swo",
    "*~",
    // OS files
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    // Python
    "__pycache__",
    "*.pyc",
    "*.pyo",
    ".venv",
    "venv",
    ".env",
    // Go
    ".go",
    // Compiled / Binary extensions
    "*.exe",
    "*.dll",
    "*.so",
    "*.dylib",
    "*.o",
    "*.a",
    "*.lib",
    "*.class",
    "*.jar",
    "*.war",
    // Archives
    "*.zip",
    "*.tar",
    "*.tar.gz",
    "*.tgz",
    "*.rar",
    "*.7z",
    // Images
    "*.png",
    "*.jpg",
    "*.jpeg",
    "*.gif",
    "*.bmp",
    "*.ico",
    "*.webp",
    "*.tiff",
    // Fonts
    "*.woff",
    "*.woff2",
    "*.ttf",
    "*.eot",
    "*.otf",
    // Media
    "*.mp3",
    "*.mp4",
    "*.avi",
    "*.mov",
    "*.wav",
    "*.flac",
    // Documents
    "*.pdf",
    "*.doc",
    "*.docx",
    "*.xls",
    "*.xlsx",
    "*.ppt",
    "*.pptx",
    // Minified files
    "*.min.js",
    "*.min.css",
    // Lock files
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Gemfile.lock",
    "poetry.lock",
    "Cargo.lock",
    "go.sum",
    "composer.lock",
    // Source maps
    "*.map",
    // Coverage
    "coverage",
    ".nyc_output",
    "htmlcov",
    // Cache
    ".cache",
    ".parcel-cache",
    ".next",
    ".nuxt",
    // Logs
    "*.log",
    // Database files
    "*.sqlite",
    "*.sqlite3",
    "*.db",
];

/// Directory names pruned lexically by `should_ignore_dir` without consulting
/// the lock-protected ignore state.
pub const PRUNE_DIR_NAMES: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "__pycache__",
    ".idea",
    ".vscode",
    ".vs",
    ".next",
    ".nuxt",
    ".cache",
    ".parcel-cache",
    "coverage",
    ".nyc_output",
    "htmlcov",
    ".venv",
    "venv",
    ".env",
];
