//! Credit cost estimation for speech synthesis.
//!
//! Cost is derived from the number of characters sent to the synthesis
//! provider: one credit covers up to [`CHARS_PER_CREDIT`] characters, and
//! any remainder rounds up to a whole credit. Characters are Unicode
//! scalar values, not bytes, so multi-byte text is not overbilled.
//!
//! Counting differs by granularity. Block and chapter estimates count the
//! node texts exactly as written. Project estimates count one trailing
//! space after every node, matching how the full-book text is stitched
//! together for the provider.

use thiserror::Error;

use crate::core::documents::{Block, Chapter};

/// Number of characters covered by a single credit.
pub const CHARS_PER_CREDIT: u64 = 1000;

/// Errors that can occur during cost estimation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CostError {
    /// The block contains no nodes to synthesize.
    #[error("block has no synthesizable nodes")]
    EmptyBlock,
}

/// A character count and the credits it will cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostEstimate {
    /// Characters that will be sent to the synthesis provider.
    pub character_count: u64,
    /// Credits required, rounded up to a whole credit.
    pub credit_cost: u64,
}

impl CostEstimate {
    fn from_characters(character_count: u64) -> Self {
        Self {
            character_count,
            credit_cost: credits_for(character_count),
        }
    }
}

/// Converts a character count to a credit cost, rounding up.
pub fn credits_for(character_count: u64) -> u64 {
    character_count.div_ceil(CHARS_PER_CREDIT)
}

/// Estimates the cost of synthesizing a single block.
///
/// Node texts are counted back to back with no separator. A block with no
/// nodes is an error, since there is nothing to synthesize.
pub fn estimate_block(block: &Block) -> Result<CostEstimate, CostError> {
    if block.nodes.is_empty() {
        return Err(CostError::EmptyBlock);
    }
    let characters = block
        .nodes
        .iter()
        .map(|node| node.text().chars().count() as u64)
        .sum();
    Ok(CostEstimate::from_characters(characters))
}

/// Estimates the cost of synthesizing a whole chapter.
///
/// All node texts across all blocks are counted with no separator. An
/// empty chapter costs zero.
pub fn estimate_chapter(chapter: &Chapter) -> CostEstimate {
    let characters = chapter
        .blocks
        .iter()
        .flat_map(|block| block.nodes.iter())
        .map(|node| node.text().chars().count() as u64)
        .sum();
    CostEstimate::from_characters(characters)
}

/// Estimates the cost of synthesizing the complete audiobook.
///
/// Every node contributes its text plus one trailing space, so the count
/// is slightly higher than the sum of the chapter estimates.
pub fn estimate_project(chapters: &[Chapter]) -> CostEstimate {
    let characters = chapters
        .iter()
        .flat_map(|chapter| chapter.blocks.iter())
        .flat_map(|block| block.nodes.iter())
        .map(|node| node.text().chars().count() as u64 + 1)
        .sum();
    CostEstimate::from_characters(characters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::documents::{BlockKind, Node};

    fn node(text: &str) -> Node {
        Node::TtsNode {
            text: text.to_string(),
            voice_id: "v1".to_string(),
        }
    }

    fn block(texts: &[&str]) -> Block {
        Block {
            block_id: "b1".to_string(),
            sub_type: BlockKind::Paragraph,
            nodes: texts.iter().map(|t| node(t)).collect(),
        }
    }

    fn chapter(blocks: Vec<Block>) -> Chapter {
        Chapter {
            id: "c1".to_string(),
            title: "Chapter One".to_string(),
            blocks,
        }
    }

    #[test]
    fn test_credits_round_up() {
        assert_eq!(credits_for(0), 0);
        assert_eq!(credits_for(1), 1);
        assert_eq!(credits_for(999), 1);
        assert_eq!(credits_for(1000), 1);
        assert_eq!(credits_for(1001), 2);
        assert_eq!(credits_for(2500), 3);
    }

    #[test]
    fn test_block_counts_nodes_without_separator() {
        let estimate = estimate_block(&block(&["Hello", " world"])).unwrap();
        assert_eq!(estimate.character_count, 11);
        assert_eq!(estimate.credit_cost, 1);
    }

    #[test]
    fn test_empty_block_is_an_error() {
        assert_eq!(estimate_block(&block(&[])), Err(CostError::EmptyBlock));
    }

    #[test]
    fn test_characters_are_scalar_values_not_bytes() {
        // 4 characters, more than 4 bytes in UTF-8.
        let estimate = estimate_block(&block(&["héllö"])).unwrap();
        assert_eq!(estimate.character_count, 5);
    }

    #[test]
    fn test_chapter_counts_across_blocks() {
        let ch = chapter(vec![block(&["abc"]), block(&["de", "fgh"])]);
        let estimate = estimate_chapter(&ch);
        assert_eq!(estimate.character_count, 8);
        assert_eq!(estimate.credit_cost, 1);
    }

    #[test]
    fn test_empty_chapter_costs_zero() {
        let estimate = estimate_chapter(&chapter(Vec::new()));
        assert_eq!(estimate.character_count, 0);
        assert_eq!(estimate.credit_cost, 0);
    }

    #[test]
    fn test_project_adds_one_space_per_node() {
        let chapters = vec![
            chapter(vec![block(&["abc"]), block(&["de", "fgh"])]),
            chapter(vec![block(&["ij"])]),
        ];
        // 3 + 2 + 3 + 2 characters plus one trailing space per node.
        let estimate = estimate_project(&chapters);
        assert_eq!(estimate.character_count, 14);
    }

    #[test]
    fn test_project_exceeds_chapter_sum_at_credit_boundary() {
        // Exactly 1000 characters in one node: one credit as a chapter,
        // two credits as a project because of the trailing space.
        let text = "a".repeat(1000);
        let ch = chapter(vec![block(&[text.as_str()])]);
        assert_eq!(estimate_chapter(&ch).credit_cost, 1);
        assert_eq!(estimate_project(std::slice::from_ref(&ch)).credit_cost, 2);
    }
}
