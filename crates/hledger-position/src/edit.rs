//! Incremental text-edit application for `textDocument/didChange`.

use crate::LineIndex;

/// Apply a single content change to a text buffer, returning the next
/// canonical text.
///
/// `range` is a 0-based `(line, utf16_character)` pair per the protocol.
/// `None` replaces the whole document, as does the empty `(0,0)..(0,0)`
/// range the client uses to signal full-document replacement. Inverted
/// ranges are normalized by swapping their byte offsets before splicing.
pub fn apply_change(
    text: &str,
    range: Option<((u32, u32), (u32, u32))>,
    replacement: &str,
) -> String {
    let Some((start, end)) = range else {
        return replacement.to_string();
    };
    if start == (0, 0) && end == (0, 0) {
        return replacement.to_string();
    }

    let index = LineIndex::new(text);
    let mut start_byte = index.position_to_offset(text, start.0, start.1);
    let mut end_byte = index.position_to_offset(text, end.0, end.1);
    if start_byte > end_byte {
        std::mem::swap(&mut start_byte, &mut end_byte);
    }

    let mut next = String::with_capacity(text.len() - (end_byte - start_byte) + replacement.len());
    next.push_str(&text[..start_byte]);
    next.push_str(replacement);
    next.push_str(&text[end_byte..]);
    next
}
