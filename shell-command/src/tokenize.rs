#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    /// `|`
    Pipe,
    /// `<`
    RedirectIn,
    /// `>`
    RedirectOut,
    /// `>>`
    RedirectAppend,
    /// `<<`
    HereDoc,
    /// `&`
    Background,
}

impl Token {
    pub fn word(text: &str) -> Self {
        Token::Word(text.to_string())
    }
}

/// Splits an (already expanded) command line into words and operators.
///
/// Double quotes group and are stripped; a backslash takes the next
/// character literally both inside and outside double quotes, and an escaped
/// newline disappears. Single quotes group without any escaping. Operators
/// are only recognised outside quotes. An unterminated quote swallows the
/// rest of the line into the final word.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Tracks whether a word is in progress even when it is empty (`""`).
    let mut in_word = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => flush(&mut tokens, &mut current, &mut in_word),
            '\\' => match chars.next() {
                Some('\n') | None => {}
                Some(next) => {
                    current.push(next);
                    in_word = true;
                }
            },
            '"' => {
                in_word = true;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some('\n') | None => {}
                            Some(next) => current.push(next),
                        },
                        _ => current.push(c),
                    }
                }
            }
            '\'' => {
                in_word = true;
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    current.push(c);
                }
            }
            '|' | '&' | '<' | '>' => {
                flush(&mut tokens, &mut current, &mut in_word);
                let doubled = matches!(c, '<' | '>') && chars.peek() == Some(&c);
                if doubled {
                    chars.next();
                }
                tokens.push(match (c, doubled) {
                    ('|', _) => Token::Pipe,
                    ('&', _) => Token::Background,
                    ('<', false) => Token::RedirectIn,
                    ('<', true) => Token::HereDoc,
                    ('>', false) => Token::RedirectOut,
                    _ => Token::RedirectAppend,
                });
            }
            _ => {
                current.push(c);
                in_word = true;
            }
        }
    }
    flush(&mut tokens, &mut current, &mut in_word);

    tokens
}

fn flush(tokens: &mut Vec<Token>, current: &mut String, in_word: &mut bool) {
    if *in_word {
        tokens.push(Token::Word(std::mem::take(current)));
        *in_word = false;
    }
}
