#![no_main]

use libfuzzer_sys::fuzz_target;
use tandem::segment::split_blocks;

fuzz_target!(|data: &[u8]| {
    let Ok(markdown) = std::str::from_utf8(data) else {
        return;
    };

    let blocks = split_blocks(markdown);

    for (i, block) in blocks.iter().enumerate() {
        // Ids are sequential and text is never empty.
        assert_eq!(block.id, format!("blk{i}"));
        assert!(!block.text.is_empty());
        // Every block is a literal slice of the input.
        assert!(
            markdown.contains(&block.text),
            "block {i} is not a source slice",
        );
    }
});
