//! Citation labels derived from retrieved-chunk provenance.

use crate::models::{Citation, RetrievedChunk};

pub fn citation_for(chunk: &RetrievedChunk) -> Citation {
    Citation {
        page: chunk.metadata.page,
        section: chunk.metadata.section.clone(),
        score: Some(chunk.distance),
    }
}

/// Section, then `p. {page}`, joined with `"; "`; `"reference"` when neither
/// is present.
pub fn citation_label(citation: &Citation) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(section) = &citation.section {
        parts.push(section.clone());
    }
    if let Some(page) = citation.page {
        parts.push(format!("p. {page}"));
    }
    if parts.is_empty() {
        "reference".to_string()
    } else {
        parts.join("; ")
    }
}

/// Inline citation string built from the first 3 citations, e.g.
/// `[Diet; p. 12], [p. 14]`. Empty when there are none.
pub fn inline_citations(citations: &[Citation]) -> String {
    citations
        .iter()
        .take(3)
        .map(|c| format!("[{}]", citation_label(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(section: Option<&str>, page: Option<u32>) -> Citation {
        Citation {
            page,
            section: section.map(str::to_string),
            score: None,
        }
    }

    #[test]
    fn label_rules() {
        assert_eq!(citation_label(&citation(Some("Diet"), None)), "Diet");
        assert_eq!(citation_label(&citation(None, Some(12))), "p. 12");
        assert_eq!(
            citation_label(&citation(Some("Diet"), Some(12))),
            "Diet; p. 12"
        );
        assert_eq!(citation_label(&citation(None, None)), "reference");
    }

    #[test]
    fn inline_uses_first_three_only() {
        let citations = vec![
            citation(Some("Diet"), Some(3)),
            citation(None, Some(7)),
            citation(None, None),
            citation(Some("Never shown"), Some(99)),
        ];
        assert_eq!(
            inline_citations(&citations),
            "[Diet; p. 3], [p. 7], [reference]"
        );
    }

    #[test]
    fn inline_empty_when_no_citations() {
        assert_eq!(inline_citations(&[]), "");
    }
}
