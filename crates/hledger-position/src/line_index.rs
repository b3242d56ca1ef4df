//! Line index for efficient byte ↔ UTF-16 position conversion.

/// Precomputed line-start offsets over a text buffer.
///
/// The index stores only byte offsets; conversion methods take the text
/// they were built from. Lookups are a binary search over line starts plus
/// a linear scan within one line counting UTF-16 code units per code point
/// (code points >= U+10000 count as two units).
///
/// Positions outside the buffer clamp to the nearest valid position.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build the index for a text buffer. `\n`, `\r\n` and lone `\r` all
    /// terminate a line.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\n' {
                line_starts.push(i + 1);
            } else if bytes[i] == b'\r' {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                    line_starts.push(i + 2);
                    i += 1;
                } else {
                    line_starts.push(i + 1);
                }
            }
            i += 1;
        }
        Self { line_starts }
    }

    /// Number of lines in the indexed text.
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Byte offset of the start of `line` (0-based), if the line exists.
    pub fn line_start(&self, line: u32) -> Option<usize> {
        self.line_starts.get(line as usize).copied()
    }

    /// The text of `line` without its trailing line break.
    pub fn line_text<'a>(&self, text: &'a str, line: u32) -> Option<&'a str> {
        let start = self.line_start(line)?;
        let end = self.line_end(text, line as usize);
        text.get(start..end)
    }

    /// Convert a byte offset to a 0-based `(line, utf16_character)` pair.
    pub fn offset_to_position(&self, text: &str, offset: usize) -> (u32, u32) {
        let offset = offset.min(text.len());
        let line =
            self.line_starts.binary_search(&offset).unwrap_or_else(|i| i.saturating_sub(1));
        let line_start = self.line_starts[line];
        let column: usize =
            text[line_start..offset].chars().map(|c| c.len_utf16()).sum();
        (line as u32, column as u32)
    }

    /// Convert a 0-based `(line, utf16_character)` position to a byte offset.
    ///
    /// Out-of-range lines clamp to the end of the text; out-of-range
    /// characters clamp to the end of the line.
    pub fn position_to_offset(&self, text: &str, line: u32, character: u32) -> usize {
        let line = line as usize;
        if line >= self.line_starts.len() {
            return text.len();
        }
        let line_start = self.line_starts[line];
        let line_end = self.line_end(text, line);
        let line_text = &text[line_start..line_end];

        let mut utf16 = 0usize;
        let mut byte = 0usize;
        for ch in line_text.chars() {
            if utf16 >= character as usize {
                break;
            }
            utf16 += ch.len_utf16();
            byte += ch.len_utf8();
        }
        line_start + byte
    }

    /// Length of `line` in UTF-16 code units, excluding the line break.
    pub fn line_utf16_len(&self, text: &str, line: u32) -> u32 {
        match self.line_text(text, line) {
            Some(lt) => lt.chars().map(|c| c.len_utf16()).sum::<usize>() as u32,
            None => 0,
        }
    }

    /// End offset of `line` excluding its trailing `\r`/`\n` bytes.
    fn line_end(&self, text: &str, line: usize) -> usize {
        let next = if line + 1 < self.line_starts.len() {
            self.line_starts[line + 1]
        } else {
            return text.len();
        };
        let bytes = text.as_bytes();
        let mut end = next;
        while end > self.line_starts[line]
            && (bytes[end - 1] == b'\n' || bytes[end - 1] == b'\r')
        {
            end -= 1;
        }
        end
    }
}
