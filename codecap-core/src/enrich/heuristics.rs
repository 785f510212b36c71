//! Content structure heuristics for recognized text.
//!
//! Detects whether a crop looks like tabular data or source code. Cheap,
//! line-based checks only; OCR output is too noisy for anything smarter.

/// Returns true if the text appears to contain tabular data.
///
/// Looks for a delimiter (tab or pipe) on most lines, or for whitespace
/// gaps that line up across rows.
pub fn detect_table_structure(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return false;
    }
    let majority = lines.len() / 2;

    for delimiter in ['\t', '|'] {
        if lines.iter().filter(|l| l.contains(delimiter)).count() > majority {
            return true;
        }
    }

    let gaps: Vec<Vec<usize>> = lines.iter().map(|line| column_gaps(line)).collect();
    let Some(reference) = gaps.first() else {
        return false;
    };
    if reference.is_empty() {
        return false;
    }

    let aligned = gaps
        .iter()
        .filter(|row| {
            row.iter()
                .any(|p| reference.iter().any(|r| p.abs_diff(*r) <= 2))
        })
        .count();
    aligned > majority
}

/// Byte offsets where a run of two or more spaces starts.
fn column_gaps(line: &str) -> Vec<usize> {
    let bytes = line.as_bytes();
    let mut gaps = Vec::new();
    let mut i = 1;
    while i + 1 < bytes.len() {
        if bytes[i] == b' ' && bytes[i + 1] == b' ' && bytes[i - 1] != b' ' {
            gaps.push(i);
        }
        i += 1;
    }
    gaps
}

/// Returns true if the text appears to be source code or a stack trace.
///
/// At least two independent indicators must fire: keywords, trailing
/// brackets, indentation, error markers, comments.
pub fn detect_code_structure(text: &str) -> bool {
    const KEYWORDS: [&str; 12] = [
        "import ", "from ", "const ", "let ", "var ", "function ", "def ", "class ", "if ", "for ",
        "while ", "return ",
    ];

    let trimmed_lines = || text.lines().map(str::trim);

    let has_keyword = trimmed_lines().any(|l| KEYWORDS.iter().any(|kw| l.starts_with(kw)));
    let has_trailing_bracket = trimmed_lines().any(|l| l.ends_with(['{', '}', ')', ';']));
    let indented = text
        .lines()
        .filter(|l| l.starts_with("  ") || l.starts_with('\t'))
        .count()
        > 1;
    let has_error_marker = trimmed_lines().any(|l| {
        l.starts_with("Error")
            || l.starts_with("Traceback")
            || l.starts_with("Exception")
            || l.starts_with("at ")
            || l.contains("error[E")
            || l.contains("panic!")
    });
    let has_comment = trimmed_lines().any(|l| {
        l.starts_with("//") || l.starts_with('#') || l.starts_with("/*") || l.starts_with('*')
    });

    [has_keyword, has_trailing_bracket, indented, has_error_marker, has_comment]
        .iter()
        .filter(|fired| **fired)
        .count()
        >= 2
}
