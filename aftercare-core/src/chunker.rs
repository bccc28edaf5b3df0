//! Offline chunking of paginated reference text.
//!
//! Pages are scanned line by line for section headers, split into sentences,
//! and accumulated into bounded, overlapping chunks tagged with the page and
//! section they started in. The heuristics are plain string transforms so
//! they can be tested in isolation.

use crate::models::{Chunk, Page};

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub min_words: usize,
    pub max_words: usize,
    pub overlap_words: usize,
    pub file_label: String,
}

impl ChunkerConfig {
    pub fn new(file_label: impl Into<String>) -> Self {
        Self {
            min_words: 300,
            max_words: 500,
            overlap_words: 60,
            file_label: file_label.into(),
        }
    }
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Treats a line as a section header when it is entirely upper-case with at
/// most 10 words, or ends with a colon and stays under the same word limit.
pub fn guess_section_header(line: &str) -> Option<String> {
    let text = line.trim();
    if text.is_empty() {
        return None;
    }
    if is_upper(text) && word_count(text) <= 10 {
        return Some(text.to_string());
    }
    if let Some(stripped) = text.strip_suffix(':') {
        if word_count(stripped) <= 10 {
            return Some(stripped.to_string());
        }
    }
    None
}

// At least one cased character and none lower-case.
fn is_upper(s: &str) -> bool {
    let mut has_cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Lightweight sentence splitter. A boundary is a `.`, `!`, or `?` followed
/// by whitespace and then an upper-case letter, digit, or open parenthesis.
pub fn split_sentences(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let chars: Vec<(usize, char)> = trimmed.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && chars[j].1.is_whitespace() {
                j += 1;
            }
            if j > i + 1 && j < chars.len() {
                let next = chars[j].1;
                if next.is_ascii_uppercase() || next.is_ascii_digit() || next == '(' {
                    let sentence = trimmed[start..pos + c.len_utf8()].trim();
                    if !sentence.is_empty() {
                        sentences.push(sentence.to_string());
                    }
                    start = chars[j].0;
                    i = j;
                    continue;
                }
            }
        }
        i += 1;
    }

    let last = trimmed[start..].trim();
    if !last.is_empty() {
        sentences.push(last.to_string());
    }
    sentences
}

/// Converts ordered pages into provenance-tagged chunks.
///
/// Every emitted chunk except the final tail has a word count within
/// `[min_words, max_words]`; chunks shorter than `max(50, min_words / 2)`
/// words are dropped by the post-filter.
pub fn chunk_pages(pages: &[Page], config: &ChunkerConfig) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current_section: Option<String> = None;
    let mut buffer: Vec<String> = Vec::new();
    let mut buffer_words = 0usize;
    let mut buffer_page: Option<u32> = None;
    let mut chunk_idx = 0usize;

    for page in pages {
        // Headers persist across pages until replaced; header lines stay in
        // the sentence stream.
        for line in page.text.lines() {
            if let Some(header) = guess_section_header(line) {
                current_section = Some(header);
            }
        }
        let page_text = page.text.lines().collect::<Vec<_>>().join(" ");

        for sentence in split_sentences(&page_text) {
            let candidate_words = word_count(&sentence);
            if buffer_page.is_none() {
                buffer_page = Some(page.number);
            }

            if buffer_words + candidate_words > config.max_words && buffer_words >= config.min_words
            {
                let start_page = buffer_page.unwrap_or(page.number);
                chunks.push(Chunk {
                    id: format!("{}-p{}-c{}", config.file_label, start_page, chunk_idx),
                    file: config.file_label.clone(),
                    page: start_page,
                    section: current_section.clone(),
                    text: buffer.join(" "),
                });
                chunk_idx += 1;

                if config.overlap_words > 0 {
                    // Retain tail sentences until overlap_words is covered.
                    let mut retained: Vec<String> = Vec::new();
                    let mut running = 0usize;
                    for s in buffer.iter().rev() {
                        if running >= config.overlap_words {
                            break;
                        }
                        running += word_count(s);
                        retained.push(s.clone());
                    }
                    retained.reverse();
                    buffer = retained;
                    buffer_words = running;
                } else {
                    buffer.clear();
                    buffer_words = 0;
                }
                buffer_page = Some(page.number);
            }

            buffer_words += candidate_words;
            buffer.push(sentence);
        }

        // A page boundary that already satisfies the size limits closes the
        // chunk, so chunks don't span pages needlessly.
        if buffer_words >= config.min_words && buffer_words <= config.max_words {
            let start_page = buffer_page.unwrap_or(page.number);
            chunks.push(Chunk {
                id: format!("{}-p{}-c{}", config.file_label, start_page, chunk_idx),
                file: config.file_label.clone(),
                page: start_page,
                section: current_section.clone(),
                text: buffer.join(" "),
            });
            chunk_idx += 1;
            buffer.clear();
            buffer_words = 0;
            buffer_page = None;
        }
    }

    if !buffer.is_empty() {
        chunks.push(Chunk {
            id: format!("{}-tail-c{}", config.file_label, chunk_idx),
            file: config.file_label.clone(),
            page: buffer_page.unwrap_or(1),
            section: current_section,
            text: buffer.join(" "),
        });
    }

    let floor = std::cmp::max(50, config.min_words / 2);
    chunks.retain(|c| word_count(&c.text) >= floor);
    chunks
}
