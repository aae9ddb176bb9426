//! Language detection from file extensions and well-known basenames,
//! plus binary content sniffing.

use std::path::Path;

/// Extension (without dot, lowercase) → language label.
const EXTENSION_TO_LANGUAGE: &[(&str, &str)] = &[
    // Go
    ("go", "Go"),
    // JavaScript / TypeScript
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("mts", "TypeScript"),
    ("cts", "TypeScript"),
    // Python
    ("py", "Python"),
    ("pyi", "Python"),
    ("pyw", "Python"),
    // Rust
    ("rs", "Rust"),
    // Java / Kotlin
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    // C / C++
    ("c", "C"),
    ("h", "C"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("hxx", "C++"),
    // C#
    ("cs", "C#"),
    ("csx", "C#"),
    // Swift
    ("swift", "Swift"),
    // Dart
    ("dart", "Dart"),
    // Ruby
    ("rb", "Ruby"),
    ("erb", "Ruby"),
    // PHP
    ("php", "PHP"),
    // Shell
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("zsh", "Shell"),
    ("fish", "Shell"),
    ("ps1", "PowerShell"),
    ("psm1", "PowerShell"),
    ("psd1", "PowerShell"),
    // Web
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("sass", "Sass"),
    ("less", "Less"),
    // Data / Config
    ("json", "JSON"),
    ("jsonc", "JSON"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
    ("toml", "TOML"),
    ("xml", "XML"),
    ("xsl", "XML"),
    ("xslt", "XML"),
    ("ini", "INI"),
    ("env", "Env"),
    ("properties", "Properties"),
    // Markup
    ("md", "Markdown"),
    ("mdx", "Markdown"),
    ("rst", "reStructuredText"),
    ("tex", "LaTeX"),
    // SQL
    ("sql", "SQL"),
    // GraphQL
    ("graphql", "GraphQL"),
    ("gql", "GraphQL"),
    // Protocol Buffers
    ("proto", "Protobuf"),
    // Docker
    ("dockerfile", "Dockerfile"),
    // Terraform
    ("tf", "Terraform"),
    ("tfvars", "Terraform"),
    // Lua
    ("lua", "Lua"),
    // R
    ("r", "R"),
    ("rmd", "R"),
    // Scala
    ("scala", "Scala"),
    // Elixir / Erlang
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("erl", "Erlang"),
    ("hrl", "Erlang"),
    // Haskell
    ("hs", "Haskell"),
    // Zig
    ("zig", "Zig"),
    // Vue / Svelte
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    // Misc
    ("txt", "Text"),
    ("csv", "CSV"),
    ("svg", "SVG"),
    ("bat", "Batch"),
    ("cmd", "Batch"),
    ("makefile", "Makefile"),
    ("cmake", "CMake"),
    ("gradle", "Gradle"),
];

/// Sentinel for unrecognized files.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Detect the language of a file from its extension, falling back to
/// well-known basenames (Makefile, Dockerfile, ...) for extensionless files.
/// Case-insensitive on both extension and basename.
pub fn detect_language(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext {
        Some(ext) => EXTENSION_TO_LANGUAGE
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, lang)| *lang)
            .unwrap_or(UNKNOWN_LANGUAGE),
        None => {
            let base = path
                .file_name()
                .and_then(|b| b.to_str())
                .map(|b| b.to_lowercase())
                .unwrap_or_default();
            match base.as_str() {
                "makefile" | "gnumakefile" => "Makefile",
                "dockerfile" => "Dockerfile",
                "gemfile" | "rakefile" => "Ruby",
                ".gitignore" | ".gitattributes" => "Git Config",
                ".env" => "Env",
                _ => UNKNOWN_LANGUAGE,
            }
        }
    }
}

/// Check whether the given bytes look like binary content.
/// Scans the first 512 bytes (or less) for a null byte.
pub fn is_binary_content(data: &[u8]) -> bool {
    let check = data.len().min(512);
    data[..check].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect_language(Path::new("src/main.go")), "Go");
        assert_eq!(detect_language(Path::new("app.ts")), "TypeScript");
        assert_eq!(detect_language(Path::new("lib.rs")), "Rust");
        assert_eq!(detect_language(Path::new("query.sql")), "SQL");
    }

    #[test]
    fn test_detect_case_insensitive_extension() {
        assert_eq!(detect_language(Path::new("MAIN.GO")), "Go");
        assert_eq!(detect_language(Path::new("Report.MD")), "Markdown");
    }

    #[test]
    fn test_detect_by_basename() {
        assert_eq!(detect_language(Path::new("Makefile")), "Makefile");
        assert_eq!(detect_language(Path::new("makefile")), "Makefile");
        assert_eq!(detect_language(Path::new("docker/Dockerfile")), "Dockerfile");
        assert_eq!(detect_language(Path::new("Gemfile")), "Ruby");
        assert_eq!(detect_language(Path::new(".gitignore")), "Git Config");
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_language(Path::new("data.xyz123")), UNKNOWN_LANGUAGE);
        assert_eq!(detect_language(Path::new("README")), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_cmakelists_has_txt_extension() {
        // CMakeLists.txt carries a .txt extension, so the extension table wins.
        assert_eq!(detect_language(Path::new("CMakeLists.txt")), "Text");
    }

    #[test]
    fn test_binary_detection() {
        assert!(is_binary_content(&[0x7f, b'E', b'L', b'F', 0x00, 0x01]));
        assert!(!is_binary_content(b"package main\n\nfunc main() {}\n"));
    }

    #[test]
    fn test_binary_detection_empty_is_text() {
        assert!(!is_binary_content(&[]));
    }

    #[test]
    fn test_binary_detection_only_first_512_bytes() {
        let mut data = vec![b'a'; 513];
        data[512] = 0;
        assert!(!is_binary_content(&data));

        let mut data = vec![b'a'; 512];
        data[511] = 0;
        assert!(is_binary_content(&data));
    }
}
