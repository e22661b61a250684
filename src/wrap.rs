//! Word wrapping for fixed-width terminals without autowrap.
//!
//! Widths count characters, not display cells: the target device is a 7-bit
//! character terminal where every glyph is one column.

/// Reflow `text` so that no line is longer than `width` characters.
///
/// Explicit newlines are always kept. Lines break at spaces where possible and
/// the space at a forced break is dropped; a word longer than `width` is split
/// hard at exactly `width` characters.
#[must_use]
pub fn word_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let chars: Vec<char> = text.replace("\r\n", "\n").chars().collect();
    let mut wrapper = Wrapper::default();
    let mut rest: &[char] = &chars;

    while !rest.is_empty() {
        let space_left = width as isize - wrapper.line_len as isize;

        if rest.len() as isize <= space_left {
            wrapper.push(rest);
            break;
        }

        // The newline may sit one past the edge: it is never printed.
        if let Some(newline) = rest.iter().position(|&ch| ch == '\n') {
            let chunk = newline + 1;
            if chunk as isize <= space_left + 1 {
                wrapper.push(&rest[..chunk]);
                wrapper.join();
                rest = &rest[chunk..];
                continue;
            }
        }

        match rest.iter().position(|&ch| ch == ' ') {
            Some(word_len) if (word_len as isize) < space_left => {
                wrapper.push(&rest[..=word_len]);
                rest = &rest[word_len + 1..];
            }
            Some(word_len) if word_len as isize == space_left => {
                // Exact fit: the space becomes the line break.
                wrapper.push(&rest[..word_len]);
                wrapper.join();
                rest = &rest[word_len + 1..];
            }
            _ if wrapper.line_len > 0 => {
                wrapper.drop_trailing_space();
                wrapper.join();
            }
            _ => {
                let split = width.min(rest.len());
                wrapper.push(&rest[..split]);
                wrapper.join();
                rest = &rest[split..];
            }
        }
    }

    wrapper.join();
    wrapper.wrapped.split('\n').map(str::to_string).collect()
}

#[derive(Default)]
struct Wrapper {
    wrapped: String,
    line: String,
    line_len: usize,
}

impl Wrapper {
    fn push(&mut self, chars: &[char]) {
        self.line.extend(chars);
        self.line_len += chars.len();
    }

    fn drop_trailing_space(&mut self) {
        if self.line.ends_with(' ') {
            self.line.pop();
            self.line_len -= 1;
        }
    }

    fn join(&mut self) {
        if self.line.is_empty() {
            return;
        }
        if !self.wrapped.is_empty() && !self.wrapped.ends_with('\n') {
            self.wrapped.push('\n');
        }
        self.wrapped.push_str(&self.line);
        self.line.clear();
        self.line_len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("The quick brown fox", 10, &["The quick", "brown fox"])]
    #[case("hello world", 5, &["hello", "world"])]
    #[case("abcdefghijkl", 5, &["abcde", "fghij", "kl"])]
    #[case("a\n\nb", 10, &["a", "", "b"])]
    #[case("short", 80, &["short"])]
    #[case("", 10, &[""])]
    #[case("ab cdefghijklmno", 5, &["ab", "cdefg", "hijkl", "mno"])]
    #[case("aaaa bbbb\nccc", 5, &["aaaa", "bbbb", "ccc"])]
    #[case("line one\r\nline two", 40, &["line one", "line two"])]
    fn wraps_examples(#[case] text: &str, #[case] width: usize, #[case] expected: &[&str]) {
        assert_eq!(word_wrap(text, width), expected);
    }

    #[test]
    fn newline_right_at_the_edge_is_a_single_break() {
        assert_eq!(word_wrap("aaaaa\nbbbbb cc", 5), vec!["aaaaa", "bbbbb", "cc"]);
    }

    #[test]
    fn zero_width_behaves_like_one_column() {
        assert_eq!(word_wrap("ab", 0), vec!["a", "b"]);
    }

    proptest! {
        #[test]
        fn no_line_exceeds_width(text in "[a-z \n]{0,200}", width in 1usize..40) {
            for line in word_wrap(&text, width) {
                prop_assert!(line.chars().count() <= width, "{line:?} longer than {width}");
            }
        }

        #[test]
        fn only_break_spaces_are_dropped(text in "[a-z \n]{0,200}", width in 1usize..40) {
            let wrapped = word_wrap(&text, width).join("\n");
            let visible = |s: &str| s.chars().filter(|c| *c != ' ' && *c != '\n').collect::<String>();
            prop_assert_eq!(visible(&wrapped), visible(&text));
            prop_assert_eq!(
                wrapped.matches('\n').count() >= text.matches('\n').count(),
                true
            );
        }
    }
}
