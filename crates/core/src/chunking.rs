use crate::error::IngestError;
use crate::models::IngestionOptions;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
    pub min_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 800,
            overlap: 150,
            min_chars: 50,
        }
    }
}

impl From<&IngestionOptions> for ChunkingConfig {
    fn from(value: &IngestionOptions) -> Self {
        Self {
            size: value.chunk_size,
            overlap: value.chunk_overlap,
            min_chars: value.min_chunk_chars,
        }
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits normalized text into overlapping fixed-size windows.
///
/// The text is whitespace-normalized first, then a window of
/// `config.size` characters advances by `size - overlap` per step.
/// Windows whose trimmed length does not exceed `config.min_chars` are
/// dropped. Pure and deterministic: the same input and config always
/// produce the same sequence.
///
/// `overlap >= size` would make the walk never advance and is rejected
/// as a configuration error.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>, IngestError> {
    if config.size == 0 || config.overlap >= config.size {
        return Err(IngestError::InvalidChunkConfig(format!(
            "overlap {} must be smaller than size {}",
            config.overlap, config.size
        )));
    }

    let normalized = normalize_whitespace(text);
    let chars: Vec<char> = normalized.chars().collect();
    let step = config.size - config.overlap;

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + config.size).min(chars.len());
        let window: String = chars[start..end].iter().collect();

        if window.trim().chars().count() > config.min_chars {
            chunks.push(window);
        }

        if end == chars.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_normalized() {
        let input = "A  \t  lot\nof   spacing";
        assert_eq!(normalize_whitespace(input), "A lot of spacing");
    }

    #[test]
    fn overlap_equal_to_size_is_rejected() {
        let config = ChunkingConfig {
            size: 100,
            overlap: 100,
            min_chars: 10,
        };
        let result = chunk_text("some text", &config);
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }

    #[test]
    fn short_text_yields_single_chunk() {
        // Duplicated sentence collapses under normalization and stays
        // well below the 800-char window.
        let text = "  Seed   funding   for  startups.  Seed funding for startups. ";
        let chunks = chunk_text(text, &ChunkingConfig::default()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0],
            "Seed funding for startups. Seed funding for startups."
        );
    }

    #[test]
    fn text_below_minimum_floor_yields_no_chunks() {
        let chunks = chunk_text("too short", &ChunkingConfig::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = chunk_text("   \n\t  ", &ChunkingConfig::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn windows_overlap_and_reconstruct_the_source() {
        let config = ChunkingConfig {
            size: 100,
            overlap: 20,
            min_chars: 5,
        };
        let text = (0..40)
            .map(|i| format!("sentence number {i} about funding"))
            .collect::<Vec<_>>()
            .join(" ");
        let normalized = normalize_whitespace(&text);
        let chunks = chunk_text(&text, &config).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(chunk.chars().count(), config.size);
        }

        // Each consecutive pair shares the configured overlap, so the
        // unique spans stitch back into the normalized source.
        let step = config.size - config.overlap;
        let mut rebuilt: Vec<char> = chunks[0].chars().collect();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(config.overlap));
        }
        assert_eq!(rebuilt.into_iter().collect::<String>(), normalized);

        for pair in chunks.windows(2) {
            let head: Vec<char> = pair[0].chars().collect();
            let tail: Vec<char> = pair[1].chars().collect();
            assert_eq!(&head[step..], &tail[..config.overlap]);
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let config = ChunkingConfig {
            size: 64,
            overlap: 16,
            min_chars: 5,
        };
        let text = "fintech seed rounds in india ".repeat(30);
        let first = chunk_text(&text, &config).unwrap();
        let second = chunk_text(&text, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn trailing_fragment_below_floor_is_dropped() {
        let config = ChunkingConfig {
            size: 50,
            overlap: 10,
            min_chars: 45,
        };
        // 85 chars: the final window starting at 40 holds 45 chars,
        // which does not exceed the 45-char floor.
        let text = "x".repeat(85);
        let chunks = chunk_text(&text, &config).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chars().count(), 50);
    }
}
