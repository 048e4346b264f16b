use keyvalues::ContentTree;
use std::iter::Peekable;
use std::str::Chars;

/// Malformed text VDF input. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextVdfDecodeError {
    #[error("line {line}: unterminated quoted string")]
    UnterminatedString { line: usize },

    #[error("line {line}: expected a key, found '{{'")]
    UnexpectedOpenBrace { line: usize },

    #[error("line {line}: '}}' without a matching '{{'")]
    UnexpectedCloseBrace { line: usize },

    #[error("line {line}: key \"{key}\" has no value")]
    MissingValue { key: String, line: usize },

    #[error("block \"{key}\" opened on line {line} is never closed")]
    UnclosedBlock { key: String, line: usize },
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Str(String),
    Open,
    Close,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skips whitespace, `//` comments and `[$PLATFORM]` conditionals.
    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() != Some(&'/') {
                        return;
                    }
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '[' => {
                    while let Some(c) = self.bump() {
                        if c == ']' || c == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    /// Returns the next token with the line it started on.
    fn next_token(&mut self) -> Result<Option<(Token, usize)>, TextVdfDecodeError> {
        self.skip_trivia();
        let line = self.line;
        let c = match self.chars.peek() {
            Some(&c) => c,
            None => return Ok(None),
        };
        let token = match c {
            '{' => {
                self.bump();
                Token::Open
            }
            '}' => {
                self.bump();
                Token::Close
            }
            '"' => {
                self.bump();
                Token::Str(self.quoted(line)?)
            }
            _ => Token::Str(self.bare()),
        };
        Ok(Some((token, line)))
    }

    fn quoted(&mut self, line: usize) -> Result<String, TextVdfDecodeError> {
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(TextVdfDecodeError::UnterminatedString { line }),
                Some('"') => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(other) => {
                        s.push('\\');
                        s.push(other);
                    }
                    None => return Err(TextVdfDecodeError::UnterminatedString { line }),
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
                break;
            }
            s.push(c);
            self.bump();
        }
        s
    }
}

/// Parses text VDF into a tree whose leaves are all strings.
///
/// Duplicate keys in one block resolve to the last occurrence.
pub fn parse(text: &str) -> Result<ContentTree, TextVdfDecodeError> {
    let mut lexer = Lexer::new(text);
    parse_block(&mut lexer, None)
}

fn parse_block(
    lexer: &mut Lexer<'_>,
    opened: Option<(&str, usize)>,
) -> Result<ContentTree, TextVdfDecodeError> {
    let mut tree = ContentTree::new();
    loop {
        let (token, line) = match lexer.next_token()? {
            Some(t) => t,
            None => {
                return match opened {
                    Some((key, line)) => Err(TextVdfDecodeError::UnclosedBlock {
                        key: key.to_string(),
                        line,
                    }),
                    None => Ok(tree),
                }
            }
        };

        let key = match token {
            Token::Str(key) => key,
            Token::Close if opened.is_some() => return Ok(tree),
            Token::Close => return Err(TextVdfDecodeError::UnexpectedCloseBrace { line }),
            Token::Open => return Err(TextVdfDecodeError::UnexpectedOpenBrace { line }),
        };

        match lexer.next_token()? {
            Some((Token::Str(value), _)) => {
                tree.insert(key, value);
            }
            Some((Token::Open, _)) => {
                let child = parse_block(lexer, Some((&key, line)))?;
                tree.insert(key, child);
            }
            Some((Token::Close, _)) | None => {
                return Err(TextVdfDecodeError::MissingValue { key, line });
            }
        }
    }
}
