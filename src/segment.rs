//! Markdown block segmentation.
//!
//! Splits a source document into its ordered top-level blocks:
//! paragraphs, headings, lists, fenced code, tables. These blocks are
//! what the sync engine pairs across the two panes (by ordinal position,
//! so both documents must be segmented by the same rules). No rendering
//! happens here; a block's text is the raw source slice.

use pulldown_cmark::{Event, Options, Parser};

/// One top-level block of a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Stable within a single document load ("blk0", "blk1", ...).
    pub id: String,
    pub text: String,
}

/// Split a markdown source into ordered top-level blocks.
///
/// Whitespace-only input yields an empty list; a pane with no blocks
/// simply never takes part in synchronization.
pub fn split_blocks(markdown: &str) -> Vec<Block> {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;

    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut block_start = 0usize;

    for (event, range) in Parser::new_ext(markdown, options).into_offset_iter() {
        match event {
            Event::Start(_) => {
                if depth == 0 {
                    block_start = range.start;
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    push_block(&mut blocks, &markdown[block_start..range.end]);
                }
            }
            // Thematic breaks have no Start/End pair.
            Event::Rule if depth == 0 => {
                push_block(&mut blocks, &markdown[range]);
            }
            _ => {}
        }
    }

    blocks
}

fn push_block(blocks: &mut Vec<Block>, text: &str) {
    let text = text.trim_end();
    if text.is_empty() {
        return;
    }
    blocks.push(Block {
        id: format!("blk{}", blocks.len()),
        text: text.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let blocks = split_blocks("First paragraph.\n\nSecond paragraph.\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "First paragraph.");
        assert_eq!(blocks[1].text, "Second paragraph.");
    }

    #[test]
    fn heading_is_its_own_block() {
        let blocks = split_blocks("# Title\n\nBody text.\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "# Title");
    }

    #[test]
    fn fenced_code_stays_one_block_across_blank_lines() {
        let md = "```rust\nlet a = 1;\n\nlet b = 2;\n```\n";
        let blocks = split_blocks(md);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text.contains("let a = 1;"));
        assert!(blocks[0].text.contains("let b = 2;"));
    }

    #[test]
    fn list_is_one_block() {
        let md = "- one\n- two\n- three\n\nAfter the list.\n";
        let blocks = split_blocks(md);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].text.starts_with("- one"));
        assert!(blocks[0].text.ends_with("- three"));
    }

    #[test]
    fn rule_is_a_block() {
        let blocks = split_blocks("before\n\n---\n\nafter\n");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].text, "---");
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert!(split_blocks("").is_empty());
        assert!(split_blocks("   \n\n  \n").is_empty());
    }

    #[test]
    fn ids_are_sequential() {
        let blocks = split_blocks("a\n\nb\n\nc\n");
        let ids: Vec<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["blk0", "blk1", "blk2"]);
    }

    #[test]
    fn nested_structures_do_not_split_the_outer_block() {
        let md = "> quoted\n>\n> still quoted\n";
        let blocks = split_blocks(md);
        assert_eq!(blocks.len(), 1);
    }
}
