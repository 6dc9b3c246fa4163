use crate::error::IngestError;
use crate::models::DocumentCategory;
use regex::Regex;

/// Declared file type, derived from the uploaded file name. Anything
/// unrecognized falls back to a plain text decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Markdown,
    Csv,
    Json,
    Pdf,
    Other,
}

impl FileKind {
    pub fn from_path(path: &str) -> Self {
        let extension = path
            .rsplit('.')
            .next()
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => FileKind::Text,
            "md" | "markdown" => FileKind::Markdown,
            "csv" => FileKind::Csv,
            "json" => FileKind::Json,
            "pdf" => FileKind::Pdf,
            _ => FileKind::Other,
        }
    }

    pub fn category(&self) -> DocumentCategory {
        match self {
            FileKind::Pdf => DocumentCategory::Report,
            FileKind::Csv => DocumentCategory::Dataset,
            FileKind::Json => DocumentCategory::Structured,
            FileKind::Text | FileKind::Markdown => DocumentCategory::Notes,
            FileKind::Other => DocumentCategory::Other,
        }
    }
}

/// Minimum viable yield: below this the document is unusable and the
/// caller must mark it `error` instead of chunking.
pub const MIN_EXTRACTED_CHARS: usize = 10;

/// Yield floor for the PDF text-object scan before the whole-file
/// printable fallback kicks in.
const PDF_FALLBACK_THRESHOLD: usize = 100;

/// Extracts plain text from raw file bytes according to the declared
/// type. Text-like formats decode verbatim; JSON is re-serialized with
/// stable indentation (invalid syntax propagates as a parse error); PDF
/// goes through the heuristic scanner below. Yields under
/// [`MIN_EXTRACTED_CHARS`] fail with `IngestError::Extraction`.
pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String, IngestError> {
    let text = match kind {
        FileKind::Text | FileKind::Markdown | FileKind::Csv | FileKind::Other => {
            String::from_utf8_lossy(bytes).into_owned()
        }
        FileKind::Json => {
            let value: serde_json::Value = serde_json::from_slice(bytes)?;
            serde_json::to_string_pretty(&value)?
        }
        FileKind::Pdf => extract_pdf_text(bytes)?,
    };

    let yield_chars = text.trim().chars().count();
    if yield_chars < MIN_EXTRACTED_CHARS {
        return Err(IngestError::Extraction(format!(
            "extracted only {yield_chars} characters, need at least {MIN_EXTRACTED_CHARS}"
        )));
    }

    Ok(text)
}

/// Best-effort text recovery from PDF bytes. This is a heuristic scan,
/// not a parser: it takes the literal string operands of `Tj` and `TJ`
/// show operators inside `BT`/`ET` text objects, plus printable-ASCII
/// runs inside `stream` blocks. When the combined yield stays under
/// [`PDF_FALLBACK_THRESHOLD`] chars it rescans the whole file for longer
/// printable runs. Compressed or encrypted content streams produce
/// little or nothing; that limitation is accepted.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, IngestError> {
    // Latin-1 decode keeps byte offsets stable for the regex scan.
    let raw: String = bytes.iter().map(|&b| b as char).collect();

    let text_object_re = Regex::new(r"(?s)BT(.*?)ET")?;
    let show_re = Regex::new(r"\(((?:[^()\\]|\\.)*)\)\s*Tj")?;
    let array_show_re = Regex::new(r"(?s)\[(.*?)\]\s*TJ")?;
    let literal_re = Regex::new(r"\(((?:[^()\\]|\\.)*)\)")?;
    let stream_re = Regex::new(r"(?s)stream(.*?)endstream")?;

    let mut fragments = Vec::new();

    for object in text_object_re.captures_iter(&raw) {
        let body = &object[1];

        for show in show_re.captures_iter(body) {
            push_fragment(&mut fragments, unescape_literal(&show[1]));
        }
        for array in array_show_re.captures_iter(body) {
            for literal in literal_re.captures_iter(&array[1]) {
                push_fragment(&mut fragments, unescape_literal(&literal[1]));
            }
        }
    }

    for block in stream_re.captures_iter(&raw) {
        fragments.extend(printable_runs(&block[1], 10));
    }

    let combined = fragments.join(" ");
    if combined.trim().chars().count() < PDF_FALLBACK_THRESHOLD {
        let runs = printable_runs(&raw, 20);
        if !runs.is_empty() {
            return Ok(runs.join(" "));
        }
    }

    Ok(combined)
}

fn push_fragment(fragments: &mut Vec<String>, text: String) {
    if !text.trim().is_empty() {
        fragments.push(text);
    }
}

/// Resolves the backslash escapes PDF literal strings use for
/// parentheses, backslash, newline, carriage return, and tab. Unknown
/// escapes keep the escaped character as-is.
fn unescape_literal(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

/// Contiguous runs of printable ASCII of at least `min_len` characters,
/// trimmed, whitespace-only runs dropped.
fn printable_runs(text: &str, min_len: usize) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if (' '..='~').contains(&c) {
            current.push(c);
        } else {
            flush_run(&mut runs, &mut current, min_len);
        }
    }
    flush_run(&mut runs, &mut current, min_len);

    runs
}

fn flush_run(runs: &mut Vec<String>, current: &mut String, min_len: usize) {
    if current.len() >= min_len {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            runs.push(trimmed.to_string());
        }
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_dispatches_on_extension() {
        assert_eq!(FileKind::from_path("report.PDF"), FileKind::Pdf);
        assert_eq!(FileKind::from_path("notes.md"), FileKind::Markdown);
        assert_eq!(FileKind::from_path("deals.csv"), FileKind::Csv);
        assert_eq!(FileKind::from_path("rounds.json"), FileKind::Json);
        assert_eq!(FileKind::from_path("blob.bin"), FileKind::Other);
    }

    #[test]
    fn plain_text_passes_through_verbatim() {
        let text = "Seed funding rounds closed in Q3.";
        let extracted = extract_text(text.as_bytes(), FileKind::Text).unwrap();
        assert_eq!(extracted, text);
    }

    #[test]
    fn json_round_trips_structurally() {
        let input = br#"{"sector":"fintech","rounds":[{"amount":12.5},{"amount":3}]}"#;
        let extracted = extract_text(input, FileKind::Json).unwrap();

        let original: serde_json::Value = serde_json::from_slice(input).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(&extracted).unwrap();
        assert_eq!(original, reparsed);
        // Pretty printing is stable across runs.
        assert_eq!(extracted, extract_text(input, FileKind::Json).unwrap());
    }

    #[test]
    fn invalid_json_propagates_parse_error() {
        let result = extract_text(b"{not json", FileKind::Json);
        assert!(matches!(result, Err(IngestError::Parse(_))));
    }

    #[test]
    fn short_yield_is_an_extraction_error() {
        let result = extract_text(b"tiny", FileKind::Text);
        assert!(matches!(result, Err(IngestError::Extraction(_))));
    }

    #[test]
    fn pdf_text_objects_yield_show_operands() {
        // Enough operand text to clear the whole-file fallback
        // threshold, so the assertions exercise the text-object scan.
        let pdf = b"%PDF-1.4\nBT /F1 12 Tf (Startup India Seed Fund Scheme) Tj \
            (provides grants to eligible incubators and accelerators across participating states) Tj ET\n\
            BT [(applications close) -250 (on 31 March)] TJ ET\n%%EOF";
        let text = extract_pdf_text(pdf).unwrap();
        assert!(text.contains("Startup India Seed Fund Scheme"));
        assert!(text.contains("applications close"));
        assert!(text.contains("on 31 March"));
    }

    #[test]
    fn pdf_literal_escapes_are_resolved() {
        let pdf = br"BT (Fund \(FoF\) backs\nSIDBI \\ DPIIT) Tj (padding operand long enough to keep the combined yield above the whole-file fallback threshold) Tj ET";
        let text = extract_pdf_text(pdf).unwrap();
        assert!(text.contains("Fund (FoF) backs\nSIDBI \\ DPIIT"));
    }

    #[test]
    fn pdf_stream_blocks_contribute_printable_runs() {
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"BT (short heading that clears the fallback threshold easily, plus padding text to stay above one hundred characters) Tj ET\n");
        pdf.extend_from_slice(b"stream\n\x01\x02grant disbursal schedule for incubators\x03\nendstream");
        let text = extract_pdf_text(&pdf).unwrap();
        assert!(text.contains("grant disbursal schedule for incubators"));
    }

    #[test]
    fn sparse_pdf_falls_back_to_whole_file_scan() {
        // No text objects at all; only the whole-file printable scan
        // (runs >= 20 chars) can recover anything.
        let pdf = b"\x00\x01\x02 credit guarantee scheme for startups \x03\x04";
        let text = extract_pdf_text(pdf).unwrap();
        assert!(text.contains("credit guarantee scheme for startups"));
    }

    #[test]
    fn printable_runs_respect_minimum_length() {
        let runs = printable_runs("ab\u{1}longer printable run here\u{2}cd", 10);
        assert_eq!(runs, vec!["longer printable run here".to_string()]);
    }
}
