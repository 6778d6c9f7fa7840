//! `<MaskData>` elements: markup-level unmasking without placeholders.
//!
//! Pages can wrap a raw token in a `MaskData` element instead of binding it
//! through a placeholder:
//!
//! ```html
//! <p>Phone: <MaskData>_mask|GM|bm9uY2U|ZW5j|bWFj|138****5678</MaskData></p>
//! ```
//!
//! The processor replaces each such element with a text node holding the
//! display segment of its trimmed text content.

use tracing::debug;

use crate::token::extract_str;
use crate::tree::Node;

/// Tag name recognized by [`process_mask_data_tags`], compared ignoring ASCII case.
pub const MASK_DATA_TAG: &str = "MaskData";

/// Replace every `MaskData` element under `root` (and `root` itself) with a
/// text node. Returns how many elements were replaced.
///
/// Nested `MaskData` elements collapse with their outermost ancestor, whose
/// text content already includes theirs.
pub fn process_mask_data_tags(root: &mut Node) -> usize {
    let replaced = replace_tags(root);
    if replaced > 0 {
        debug!(replaced, "MaskData tags processed");
    }
    replaced
}

fn replace_tags(node: &mut Node) -> usize {
    if is_mask_data(node) {
        let content = node.text_content();
        *node = Node::Text(extract_str(content.trim()).to_string());
        return 1;
    }

    match node {
        Node::Element(element) => element.children.iter_mut().map(replace_tags).sum(),
        Node::Text(_) => 0,
    }
}

fn is_mask_data(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|element| element.tag.eq_ignore_ascii_case(MASK_DATA_TAG))
}
