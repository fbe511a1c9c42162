//! Context assembly.
//!
//! Formats retrieved passages into the grounding block handed to the
//! LLM. Citation ordinals are 1-based and correspond exactly to the
//! passage's position in the response `sources` array, so the UI can
//! render matching citation cards.

use super::retriever::RetrievedPassage;

const PASSAGE_DELIMITER: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct ContextAssembler {
    /// Total character budget for the assembled block.
    max_chars: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self { max_chars: 4000 }
    }
}

impl ContextAssembler {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Concatenate passages in rank order under the character budget.
    ///
    /// When the budget runs out, whole lower-ranked passages are
    /// dropped; a higher-ranked passage is never cut to make room for
    /// a lower-ranked one. Dropped passages keep their ordinal in
    /// `sources`, so the numbering of what remains stays aligned.
    pub fn build_context(&self, passages: &[RetrievedPassage]) -> String {
        let mut context = String::new();

        for (i, passage) in passages.iter().enumerate() {
            let entry = format!(
                "[{}] Source: {}\n{}",
                i + 1,
                passage.filename,
                passage.preview
            );

            let needed = if context.is_empty() {
                entry.chars().count()
            } else {
                entry.chars().count() + PASSAGE_DELIMITER.len()
            };
            if context.chars().count() + needed > self.max_chars {
                tracing::debug!(
                    "Context budget reached, dropping passages ranked {} and below",
                    i + 1
                );
                break;
            }

            if !context.is_empty() {
                context.push_str(PASSAGE_DELIMITER);
            }
            context.push_str(&entry);
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(filename: &str, preview: &str, score: f32) -> RetrievedPassage {
        RetrievedPassage {
            chunk_id: filename.to_string(),
            filename: filename.to_string(),
            preview: preview.to_string(),
            relevance_score: score,
            web_url: None,
            has_watermark: false,
        }
    }

    #[test]
    fn ordinals_match_source_positions() {
        let assembler = ContextAssembler::default();
        let passages = vec![
            passage("Architectural Plans", "Gothic Quarter drawings.", 0.91),
            passage("Trade Union Records", "Union meeting minutes.", 0.42),
        ];

        let context = assembler.build_context(&passages);
        let first = context.find("[1] Source: Architectural Plans").unwrap();
        let second = context.find("[2] Source: Trade Union Records").unwrap();
        assert!(first < second);
        assert!(context.contains("Gothic Quarter drawings."));
    }

    #[test]
    fn empty_passages_give_empty_context() {
        let assembler = ContextAssembler::default();
        assert!(assembler.build_context(&[]).is_empty());
    }

    #[test]
    fn lower_ranked_passages_are_dropped_whole() {
        let assembler = ContextAssembler::new(120);
        let passages = vec![
            passage("first.pdf", &"a".repeat(80), 0.9),
            passage("second.pdf", &"b".repeat(80), 0.5),
            passage("third.pdf", &"c".repeat(10), 0.1),
        ];

        let context = assembler.build_context(&passages);
        // The top passage fits whole and is untouched.
        assert!(context.contains(&"a".repeat(80)));
        // The second does not fit, so it and everything below is gone;
        // the third is not promoted past the gap.
        assert!(!context.contains("second.pdf"));
        assert!(!context.contains("third.pdf"));
    }

    #[test]
    fn budget_never_cuts_inside_a_passage() {
        let assembler = ContextAssembler::new(60);
        let passages = vec![
            passage("solo.pdf", &"x".repeat(30), 0.9),
            passage("next.pdf", &"y".repeat(30), 0.8),
        ];

        let context = assembler.build_context(&passages);
        assert!(context.contains(&"x".repeat(30)));
        assert!(!context.contains('y'));
    }
}
