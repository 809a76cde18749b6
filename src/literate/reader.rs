use crate::literate::{Block, CrossReference, DeclarationBlock, Document};
use crate::parser::ast::ByteRange;
use crate::parser::{parse_declaration_at, ParseError};
use multipeek::{multipeek, MultiPeek};
use std::str::CharIndices;

/// Split a literate document into prose, declarations and cross-references.
///
/// `\fun{...}` and `\class{...}` start an embedded declaration, `@name` and `!name` are
/// cross-references. Text inside `{...}` is copied verbatim, so braces can be used to write a
/// literal `@` or `!` in front of a name.
pub fn read_document(source: &str) -> Result<Document, ParseError> {
    let mut reader = Reader {
        source,
        chars: multipeek(source.char_indices()),
        blocks: vec![],
        text: String::new(),
    };
    reader.read()?;
    Ok(Document {
        blocks: reader.blocks,
    })
}

struct Reader<'a> {
    source: &'a str,
    chars: MultiPeek<CharIndices<'a>>,
    blocks: Vec<Block>,
    text: String,
}

impl<'a> Reader<'a> {
    fn read(&mut self) -> Result<(), ParseError> {
        while let Some((offset, c)) = self.chars.next() {
            match c {
                '\\' => self.backslash(offset)?,
                '@' | '!' => self.cross_reference(offset, c),
                '{' => self.group(),
                c => self.text.push(c),
            }
        }
        self.flush_text();
        Ok(())
    }

    fn backslash(&mut self, offset: usize) -> Result<(), ParseError> {
        if self.peek() == Some('\\') {
            self.chars.next();
            self.text.push_str("\\\\");
            return Ok(());
        }

        let command = &self.source[offset + 1..];
        if !(command.starts_with("fun{") || command.starts_with("class{")) {
            self.text.push('\\');
            return Ok(());
        }

        self.flush_text();
        let (declaration, range) = parse_declaration_at(self.source, offset)?;
        tracing::debug!(
            name = %declaration.qualified_name(),
            start = range.start,
            end = range.end,
            "read declaration"
        );
        self.blocks
            .push(Block::Declaration(DeclarationBlock { declaration, range }));
        self.skip_to(range.end);
        Ok(())
    }

    fn cross_reference(&mut self, offset: usize, marker: char) {
        let name_start = offset + marker.len_utf8();
        let mut name_end = name_start;
        while let Some(&(i, c)) = self.chars.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            name_end = i + c.len_utf8();
            self.chars.next();
        }
        if name_end == name_start {
            self.text.push(marker);
            return;
        }

        self.flush_text();
        let reference = CrossReference::new(
            &self.source[name_start..name_end],
            ByteRange::new(offset, name_end),
        );
        self.blocks.push(if marker == '@' {
            Block::UpReference(reference)
        } else {
            Block::DownReference(reference)
        });
    }

    /// Copy everything up to the matching closing brace.
    fn group(&mut self) {
        self.text.push('{');
        let mut depth = 1;
        for (_, c) in self.chars.by_ref() {
            self.text.push(c);
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.blocks
                .push(Block::RawText(std::mem::take(&mut self.text)));
        }
    }

    fn skip_to(&mut self, end: usize) {
        while let Some(&(i, _)) = self.chars.peek() {
            if i >= end {
                break;
            }
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::read_document;
    use crate::literate::Block;
    use crate::parser::ast::ByteRange;
    use crate::printer::display_document;
    use insta::assert_snapshot;

    fn kinds(source: &str) -> Vec<String> {
        read_document(source)
            .unwrap()
            .blocks
            .iter()
            .map(|block| match block {
                Block::RawText(text) => format!("text {text:?}"),
                Block::Declaration(d) => format!("declaration {}", d.declaration.qualified_name()),
                Block::UpReference(r) => format!("up {}", r.name),
                Block::DownReference(r) => format!("down {}", r.name),
            })
            .collect()
    }

    #[test]
    fn splits_prose_declarations_and_references() {
        let blocks = kinds(r"We use !add here. \fun{add}{a, b}{ return a + b; } So @add adds.");
        assert_eq!(
            blocks,
            vec![
                r#"text "We use ""#,
                "down add",
                r#"text " here. ""#,
                "declaration add",
                r#"text " So ""#,
                "up add",
                r#"text " adds.""#,
            ]
        );
    }

    #[test]
    fn markers_without_a_name_are_text() {
        assert_eq!(kinds("Wow! me@ @"), vec![r#"text "Wow! me@ @""#]);
    }

    #[test]
    fn braces_and_other_commands_are_copied_verbatim() {
        let source = r"\section{A @b} \\fun{x} {nested {@c} !d} \emph{e}";
        let document = read_document(source).unwrap();
        assert_eq!(document.blocks, vec![Block::RawText(source.to_owned())]);
    }

    #[test]
    fn unterminated_groups_run_to_the_end() {
        assert_eq!(kinds("a {b @c"), vec![r#"text "a {b @c""#]);
    }

    #[test]
    fn declaration_and_reference_ranges_point_into_the_source() {
        let source = r"@Point \class{Point}{ x := 1; }!x";
        let document = read_document(source).unwrap();
        let Block::Declaration(d) = &document.blocks[2] else {
            panic!("expected a declaration")
        };
        assert_eq!(&source[d.range.start..d.range.end], r"\class{Point}{ x := 1; }");
        let Block::DownReference(r) = &document.blocks[3] else {
            panic!("expected a down reference")
        };
        assert_eq!(r.range, ByteRange::new(31, 33));
        assert_snapshot!(display_document(&document).unwrap(), @r###"
        @Point \class{Point}{
            (x := (1));
        }!x
        "###);
    }

    #[test]
    fn parse_errors_in_declarations_are_reported() {
        let error = read_document("text\n\\fun{f}{a b}{}").unwrap_err();
        assert_eq!((error.line, error.column), (2, 11));
        assert_eq!(error.message, "expected RightBrace, found Identifier");
    }
}
