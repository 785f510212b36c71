//! Share/export formatting for saved snippets.
//!
//! Renders one or more snippets as Markdown, plain text, fenced code or
//! JSON. Combined output is a single document with a suggested file name;
//! split output is one document per snippet keyed by file name (the shape
//! a Gist upload wants).

use crate::store::Snippet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SLUG_MAX_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareFormat {
    Markdown,
    Plain,
    Code,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShareOptions {
    pub format: ShareFormat,
    pub include_title: bool,
    pub include_meta: bool,
    pub combine: bool,
    /// Fence language, or `auto` to use each snippet's detected language.
    pub language: String,
}

impl Default for ShareOptions {
    fn default() -> Self {
        Self {
            format: ShareFormat::Markdown,
            include_title: true,
            include_meta: false,
            combine: true,
            language: "auto".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ShareOutput {
    Single {
        content: String,
        #[serde(rename = "defaultName")]
        default_name: String,
    },
    Files {
        #[serde(rename = "filesMap")]
        files: BTreeMap<String, String>,
    },
}

/// Lowercase, dash-separated, at most 60 chars; `snippet` when nothing is left.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug.truncate(SLUG_MAX_CHARS);
    if slug.is_empty() {
        "snippet".to_string()
    } else {
        slug
    }
}

/// File extension for a fence language; `txt` for anything unknown.
pub fn lang_to_ext(lang: Option<&str>) -> &'static str {
    let Some(lang) = lang else {
        return "txt";
    };
    match lang.to_lowercase().as_str() {
        "javascript" => "js",
        "typescript" => "ts",
        "python" => "py",
        "go" => "go",
        "ruby" => "rb",
        "java" => "java",
        "csharp" => "cs",
        "cpp" => "cpp",
        "c" => "c",
        "rust" => "rs",
        "php" => "php",
        "swift" => "swift",
        "kotlin" => "kt",
        "scala" => "scala",
        "shell" | "bash" => "sh",
        "html" => "html",
        "css" => "css",
        "json" => "json",
        "yaml" | "yml" => "yml",
        "md" => "md",
        _ => "txt",
    }
}

fn fence_language<'a>(snippet: &'a Snippet, options: &'a ShareOptions) -> &'a str {
    if options.language == "auto" {
        snippet.language.as_deref().unwrap_or("")
    } else {
        &options.language
    }
}

fn format_timestamp(ms: i64) -> Option<String> {
    use chrono::TimeZone;
    chrono::Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn meta_parts(snippet: &Snippet) -> Vec<String> {
    let mut meta = Vec::new();
    if !snippet.tags.is_empty() {
        meta.push(format!("tags: {}", snippet.tags.join(", ")));
    }
    if let Some(created) = format_timestamp(snippet.created_at) {
        meta.push(format!("created: {}", created));
    }
    if let Some(updated) = format_timestamp(snippet.updated_at) {
        meta.push(format!("updated: {}", updated));
    }
    meta
}

fn push_fenced(parts: &mut Vec<String>, lang: &str, body: &str) {
    parts.push(format!("```{}", lang));
    parts.push(body.to_string());
    parts.push("```".to_string());
    parts.push(String::new());
}

pub fn format_markdown(snippets: &[Snippet], options: &ShareOptions) -> String {
    let mut parts = Vec::new();
    for s in snippets {
        if options.include_title && !s.title.is_empty() {
            parts.push(format!("## {}", s.title));
        }
        if options.include_meta {
            let meta = meta_parts(s);
            if !meta.is_empty() {
                parts.push(format!("> {}", meta.join(" | ")));
            }
        }
        push_fenced(&mut parts, fence_language(s, options), &s.body);
    }
    parts.join("\n")
}

pub fn format_plain(snippets: &[Snippet], options: &ShareOptions) -> String {
    let mut parts = Vec::new();
    for s in snippets {
        if options.include_title && !s.title.is_empty() {
            parts.push(s.title.clone());
        }
        if options.include_meta {
            let meta = meta_parts(s);
            if !meta.is_empty() {
                parts.push(meta.join(" | "));
            }
        }
        parts.push(s.body.clone());
        parts.push(String::new());
    }
    parts.join("\n")
}

/// Fenced code only. Titles become `//` comments when requested.
pub fn format_code(snippets: &[Snippet], options: &ShareOptions) -> String {
    let mut parts = Vec::new();
    for s in snippets {
        if options.include_title && !s.title.is_empty() {
            parts.push(format!("// {}", s.title));
        }
        push_fenced(&mut parts, fence_language(s, options), &s.body);
    }
    parts.join("\n")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    id: &'a str,
    title: &'a str,
    body: &'a str,
    language: Option<&'a str>,
    tags: &'a [String],
    created_at: i64,
    updated_at: i64,
}

pub fn format_json(snippets: &[Snippet]) -> Result<String, serde_json::Error> {
    let rows: Vec<JsonExport<'_>> = snippets
        .iter()
        .map(|s| JsonExport {
            id: &s.id,
            title: &s.title,
            body: &s.body,
            language: s.language.as_deref(),
            tags: &s.tags,
            created_at: s.created_at,
            updated_at: s.updated_at,
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}

fn render(snippets: &[Snippet], options: &ShareOptions) -> Result<String, serde_json::Error> {
    Ok(match options.format {
        ShareFormat::Markdown => format_markdown(snippets, options),
        ShareFormat::Plain => format_plain(snippets, options),
        ShareFormat::Code => format_code(snippets, options),
        ShareFormat::Json => format_json(snippets)?,
    })
}

fn extension(format: ShareFormat, snippet: Option<&Snippet>, options: &ShareOptions) -> &'static str {
    match format {
        ShareFormat::Markdown => "md",
        ShareFormat::Plain => "txt",
        ShareFormat::Json => "json",
        ShareFormat::Code => {
            let lang = if options.language == "auto" {
                snippet.and_then(|s| s.language.as_deref())
            } else {
                Some(options.language.as_str())
            };
            lang_to_ext(lang)
        }
    }
}

pub fn format_for_share(snippets: &[Snippet], options: &ShareOptions) -> Result<ShareOutput, serde_json::Error> {
    let format = options.format;

    if options.combine || snippets.len() <= 1 || format == ShareFormat::Json {
        let content = render(snippets, options)?;
        let first = snippets.first();
        let base = first
            .filter(|s| !s.title.is_empty())
            .map(|s| slugify(&s.title))
            .unwrap_or_else(|| "snippets".to_string());
        let default_name = format!("{}.{}", base, extension(format, first, options));
        return Ok(ShareOutput::Single { content, default_name });
    }

    let mut files = BTreeMap::new();
    for s in snippets {
        let content = render(std::slice::from_ref(s), options)?;
        let stem = if s.title.is_empty() { &s.id } else { &s.title };
        let name = format!("{}.{}", slugify(stem), extension(format, Some(s), options));
        files.insert(name, content);
    }
    Ok(ShareOutput::Files { files })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(id: &str, title: &str, body: &str, language: Option<&str>) -> Snippet {
        Snippet {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            category: "code".to_string(),
            tags: vec!["rust".to_string(), "async".to_string()],
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
            ai_summary: None,
            ai_tags: None,
            language: language.map(str::to_string),
            image_file: None,
        }
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("***"), "snippet");
        assert_eq!(slugify(&"x".repeat(80)).len(), 60);
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(lang_to_ext(Some("Rust")), "rs");
        assert_eq!(lang_to_ext(Some("bash")), "sh");
        assert_eq!(lang_to_ext(Some("klingon")), "txt");
        assert_eq!(lang_to_ext(None), "txt");
    }

    #[test]
    fn markdown_combined() {
        let list = vec![snippet("1", "Spawn a task", "tokio::spawn(f);", Some("rust"))];
        let out = format_for_share(&list, &ShareOptions::default()).unwrap();
        assert_eq!(
            out,
            ShareOutput::Single {
                content: "## Spawn a task\n```rust\ntokio::spawn(f);\n```\n".to_string(),
                default_name: "spawn-a-task.md".to_string(),
            }
        );
    }

    #[test]
    fn markdown_meta_line() {
        let list = vec![snippet("1", "T", "b", None)];
        let options = ShareOptions {
            include_meta: true,
            ..ShareOptions::default()
        };
        let md = format_markdown(&list, &options);
        assert!(md.contains("> tags: rust, async | created: "));
    }

    #[test]
    fn code_uses_override_language_for_extension() {
        let list = vec![snippet("1", "Query", "SELECT 1;", None)];
        let options = ShareOptions {
            format: ShareFormat::Code,
            include_title: false,
            language: "python".to_string(),
            ..ShareOptions::default()
        };
        match format_for_share(&list, &options).unwrap() {
            ShareOutput::Single { content, default_name } => {
                assert_eq!(content, "```python\nSELECT 1;\n```\n");
                assert_eq!(default_name, "query.py");
            }
            other => panic!("expected single output, got {:?}", other),
        }
    }

    #[test]
    fn split_output_has_one_file_per_snippet() {
        let list = vec![
            snippet("1", "First", "a", None),
            snippet("2", "", "b", None),
        ];
        let options = ShareOptions {
            format: ShareFormat::Plain,
            combine: false,
            ..ShareOptions::default()
        };
        match format_for_share(&list, &options).unwrap() {
            ShareOutput::Files { files } => {
                assert_eq!(files.len(), 2);
                assert_eq!(files["first.txt"], "First\na\n");
                assert_eq!(files["2.txt"], "b\n");
            }
            other => panic!("expected files, got {:?}", other),
        }
    }

    #[test]
    fn json_is_never_split() {
        let list = vec![snippet("1", "A", "a", None), snippet("2", "B", "b", Some("go"))];
        let options = ShareOptions {
            format: ShareFormat::Json,
            combine: false,
            ..ShareOptions::default()
        };
        match format_for_share(&list, &options).unwrap() {
            ShareOutput::Single { content, default_name } => {
                assert_eq!(default_name, "a.json");
                let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
                assert_eq!(parsed.as_array().unwrap().len(), 2);
                assert_eq!(parsed[1]["language"], "go");
                assert_eq!(parsed[0]["createdAt"], 1_700_000_000_000i64);
            }
            other => panic!("expected single output, got {:?}", other),
        }
    }

    #[test]
    fn empty_selection_names_file_snippets() {
        match format_for_share(&[], &ShareOptions::default()).unwrap() {
            ShareOutput::Single { default_name, .. } => assert_eq!(default_name, "snippets.md"),
            other => panic!("expected single output, got {:?}", other),
        }
    }
}
