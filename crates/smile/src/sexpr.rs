//! A minimal s-expression reader, used only by tests and the CLI driver to
//! produce [`crate::ast::Ast`] trees without a real parser.
//!
//! This is explicitly **not** the lexer/parser/`#syntax`/`#loanword` macro
//! system the spec excludes from this crate's scope (§1 Non-goals) — it is a
//! debug harness that understands a tiny fixed grammar (symbols, integers,
//! strings, parenthesized lists, and `left.right` dotted pairs written as
//! `(. left right)`) just well enough to write compiler/interpreter tests
//! and drive the CLI without hand-building [`crate::ast::Ast`] trees in Rust
//! source. A real frontend would replace this module entirely.

use crate::{ast::Ast, intern::Interns, value::SmileArg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    UnexpectedEof,
    UnexpectedChar(char),
    UnterminatedString,
}

struct Reader<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self { chars: src.chars().peekable() }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn read(&mut self, interns: &mut Interns) -> Result<Ast, ReadError> {
        self.skip_ws();
        match self.chars.peek() {
            None => Err(ReadError::UnexpectedEof),
            Some('(') => self.read_list(interns),
            Some('"') => self.read_string(),
            Some(c) if c.is_ascii_digit() || *c == '-' => self.read_number(),
            Some(_) => self.read_symbol(interns),
        }
    }

    fn read_list(&mut self, interns: &mut Interns) -> Result<Ast, ReadError> {
        self.chars.next(); // consume '('
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.chars.peek() {
                None => return Err(ReadError::UnexpectedEof),
                Some(')') => {
                    self.chars.next();
                    return Ok(Ast::List { items, tail: None, source_location: None });
                }
                Some('.') if items.len() == 1 => {
                    self.chars.next();
                    let right = self.read(interns)?;
                    self.skip_ws();
                    if self.chars.next() != Some(')') {
                        return Err(ReadError::UnexpectedChar('.'));
                    }
                    let left = items.pop().expect("checked len == 1 above");
                    return Ok(Ast::Pair { left: Box::new(left), right: Box::new(right), source_location: None });
                }
                Some(_) => items.push(self.read(interns)?),
            }
        }
    }

    fn read_string(&mut self) -> Result<Ast, ReadError> {
        self.chars.next(); // opening quote
        let mut s = String::new();
        loop {
            match self.chars.next() {
                None => return Err(ReadError::UnterminatedString),
                Some('"') => break,
                Some(c) => s.push(c),
            }
        }
        Ok(Ast::Literal(SmileArg::Heap(string_placeholder_id(&s))))
    }

    fn read_number(&mut self) -> Result<Ast, ReadError> {
        let mut s = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit() || *c == '-') {
            s.push(self.chars.next().expect("peeked"));
        }
        let n: i64 = s.parse().map_err(|_| ReadError::UnexpectedChar('0'))?;
        Ok(Ast::Literal(SmileArg::Int64(n)))
    }

    fn read_symbol(&mut self, interns: &mut Interns) -> Result<Ast, ReadError> {
        let mut s = String::new();
        while matches!(self.chars.peek(), Some(c) if !c.is_whitespace() && *c != '(' && *c != ')') {
            s.push(self.chars.next().expect("peeked"));
        }
        if s.is_empty() {
            return Err(ReadError::UnexpectedChar(self.chars.peek().copied().unwrap_or(' ')));
        }
        Ok(Ast::Symbol(interns.get_or_intern(&s)))
    }
}

/// Placeholder for a string literal read by the harness: real string boxing
/// happens once the compiled program is loaded onto a live
/// [`crate::heap::Heap`], which this free-standing reader doesn't have
/// access to. Callers that need literal strings should box them onto the
/// heap themselves and patch the resulting `CompiledTables::objects` entry.
fn string_placeholder_id(_s: &str) -> crate::heap::HeapId {
    crate::heap::HeapId::from_raw(u32::MAX)
}

/// Reads a single s-expression from `src`, interning any symbols it
/// encounters into `interns`.
pub fn read_one(src: &str, interns: &mut Interns) -> Result<Ast, ReadError> {
    Reader::new(src).read(interns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_nested_lists_and_symbols() {
        let mut interns = Interns::default();
        let ast = read_one("($if x 1 2)", &mut interns).unwrap();
        let Ast::List { items, .. } = ast else { panic!("expected a list") };
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn reads_dotted_pairs() {
        let mut interns = Interns::default();
        let ast = read_one("(obj . field)", &mut interns).unwrap();
        assert!(matches!(ast, Ast::Pair { .. }));
    }

    #[test]
    fn reads_negative_integers() {
        let mut interns = Interns::default();
        let ast = read_one("-42", &mut interns).unwrap();
        assert!(matches!(ast, Ast::Literal(SmileArg::Int64(-42))));
    }
}
