use crate::Word;

/// Comparators that split a word even when typed without surrounding spaces
/// (`service_name=cpq`). Order matters: two-char operators are cut out first so
/// `<=` never ends up as `<` followed by `=`.
pub(crate) const SPECIAL_WORDS: [&str; 6] = ["<=", "!=", ">=", "=", ">", "<"];

/// Splits raw input into words.
///
/// `cursor` is the text cursor as a char index into `input`. The word
/// containing the char right before the cursor is marked with
/// [`Word::being_typed`]; at most one word is ever marked.
///
/// The scan is lenient: unterminated quotes and a trailing backslash never
/// fail, so every keystroke yields something the parser can work with.
pub fn tokenize(input: &str, cursor: Option<usize>) -> Vec<Word> {
    let mut tokenizer = Tokenizer::new(cursor);
    for (index, ch) in input.chars().enumerate() {
        tokenizer.feed(index, ch);
    }
    tokenizer.finish()
}

struct Tokenizer {
    words: Vec<Word>,
    current: String,
    current_len: usize,
    being_typed: Option<usize>,
    cursor: Option<usize>,
    escaped: bool,
    in_quotes: bool,
}

impl Tokenizer {
    fn new(cursor: Option<usize>) -> Self {
        Self {
            words: Vec::new(),
            current: String::new(),
            current_len: 0,
            being_typed: None,
            cursor,
            escaped: false,
            in_quotes: false,
        }
    }

    fn feed(&mut self, index: usize, ch: char) {
        if self.escaped {
            self.escaped = false;
            self.append(index, ch);
            return;
        }
        if self.in_quotes && ch != '"' && ch != '\\' {
            self.append(index, ch);
            return;
        }
        match ch {
            '\\' => self.escaped = true,
            ' ' | '\t' | '\n' | '\r' => self.flush(false),
            ',' | '(' | ')' => {
                self.flush(false);
                self.append(index, ch);
                self.flush(false);
            }
            '"' => {
                // Flushing on the opening quote too keeps `service_name="cpq"`
                // as two words.
                let closing = self.in_quotes;
                self.flush(closing);
                self.in_quotes = !closing;
            }
            _ => self.append(index, ch),
        }
    }

    fn finish(mut self) -> Vec<Word> {
        let quoted = self.in_quotes;
        self.flush(quoted);
        self.words
    }

    fn append(&mut self, index: usize, ch: char) {
        self.current.push(ch);
        self.current_len += 1;
        if self.cursor == Some(index + 1) {
            self.being_typed = Some(self.current_len);
        }
    }

    fn flush(&mut self, quoted: bool) {
        let text = std::mem::take(&mut self.current);
        let being_typed = self.being_typed.take();
        self.current_len = 0;
        if text.is_empty() {
            return;
        }

        if quoted {
            self.words.push(Word {
                text,
                being_typed,
                quoted: true,
            });
            return;
        }

        let mut marker = being_typed;
        let mut start = 0;
        for piece in split_special_words(&text) {
            let len = piece.chars().count();
            // Only the first piece reaching the offset gets it: a cursor right
            // after `=` in `a=b` belongs to `=`, not to `b`.
            let being_typed = match marker {
                Some(offset) if offset - start <= len => {
                    marker = None;
                    Some(offset - start)
                }
                _ => None,
            };
            start += len;
            self.words.push(Word {
                text: piece.to_string(),
                being_typed,
                quoted: false,
            });
        }
    }
}

/// Cuts every [`SPECIAL_WORDS`] occurrence out of `word` as its own piece.
/// Concatenating the result gives back `word`.
pub(crate) fn split_special_words(word: &str) -> Vec<&str> {
    let mut splits = vec![word];
    for special in SPECIAL_WORDS {
        let mut next = Vec::with_capacity(splits.len());
        for split in splits {
            if SPECIAL_WORDS.contains(&split) {
                next.push(split);
                continue;
            }
            let mut rest = split;
            while let Some(at) = rest.find(special) {
                if at > 0 {
                    next.push(&rest[..at]);
                }
                next.push(&rest[at..at + special.len()]);
                rest = &rest[at + special.len()..];
            }
            if !rest.is_empty() {
                next.push(rest);
            }
        }
        splits = next;
    }
    splits
}

pub(crate) fn contains_special_word(text: &str) -> bool {
    SPECIAL_WORDS.iter().any(|special| text.contains(special))
}
