/// Substitutes `$NAME` and `${NAME}` with values from the process
/// environment. Unset variables expand to the empty string.
pub fn expand_env(line: &str) -> String {
    expand_env_with(line, |name| std::env::var(name).ok())
}

/// Single left-to-right substitution pass; substituted values are never
/// rescanned. A backslash protects the following character, so `\$HOME`
/// reaches the tokenizer untouched.
pub fn expand_env_with<F>(line: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '$' => match chars.peek() {
                Some('{') => {
                    chars.next();
                    let mut name = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        name.push(c);
                    }
                    out.push_str(&lookup(&name).unwrap_or_default());
                }
                Some(&c) if is_name_char(c) => {
                    let mut name = String::new();
                    while let Some(&c) = chars.peek() {
                        if !is_name_char(c) {
                            break;
                        }
                        name.push(c);
                        chars.next();
                    }
                    out.push_str(&lookup(&name).unwrap_or_default());
                }
                _ => out.push('$'),
            },
            _ => out.push(c),
        }
    }

    out
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
