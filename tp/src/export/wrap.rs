//! Greedy word wrapping

/// Wrap `text` to at most `width` characters per line
///
/// Existing line breaks are kept, blank lines included. Words longer than
/// `width` are split across lines. Leading indentation of a source line is
/// kept on its first wrapped line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    wrap_by(text, width.max(1) as f32, |s| s.chars().count() as f32)
}

/// Wrap `text` so that `measure` of every line is at most `max_width`
///
/// Same rules as [`wrap_text`], with the width of a line given by `measure`
/// (for example the rendered width in a proportional font). A single
/// character wider than `max_width` still gets a line of its own.
pub fn wrap_by<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut out = Vec::new();

    for source in text.lines() {
        let indent: String = source.chars().take_while(|c| c.is_whitespace()).collect();
        let mut current = indent;
        let mut has_word = false;

        for word in source.split_whitespace() {
            let mut word = word.to_string();

            loop {
                let candidate = if has_word {
                    format!("{} {}", current, word)
                } else {
                    format!("{}{}", current, word)
                };
                if measure(&candidate) <= max_width {
                    current = candidate;
                    has_word = true;
                    break;
                }

                if has_word {
                    out.push(std::mem::take(&mut current));
                    has_word = false;
                    continue;
                }

                if !current.is_empty() {
                    // Indent alone leaves no room; drop it
                    current.clear();
                    continue;
                }

                // Word alone is wider than a line
                let split = split_point(&word, max_width, &measure);
                let rest = word.split_off(split);
                out.push(word);
                if rest.is_empty() {
                    break;
                }
                word = rest;
            }
        }

        if has_word {
            out.push(current);
        } else if source.trim().is_empty() {
            out.push(String::new());
        }
    }

    out
}

/// Byte offset of the longest prefix of `word` that fits, at least one char
fn split_point<F>(word: &str, max_width: f32, measure: &F) -> usize
where
    F: Fn(&str) -> f32,
{
    let mut split = word.chars().next().map(char::len_utf8).unwrap_or(0);
    for (offset, c) in word.char_indices().skip(1) {
        let end = offset + c.len_utf8();
        if measure(&word[..end]) > max_width {
            break;
        }
        split = end;
    }
    split
}
