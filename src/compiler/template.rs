use std::path::Path;
use std::path::PathBuf;

use tracing::warn;

use crate::CompileError;

/// 1-based position inside a template source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// One parsed element. Literal text between tags is carried as a node
/// with the synthetic `#text` tag and `text` set.
#[derive(Debug)]
pub struct ControlTemplate {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<ControlTemplate>,
    pub text: Option<String>,
    pub location: SourceLocation,
}

impl ControlTemplate {
    pub fn attribute(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_literal(&self) -> bool {
        self.tag == "#text"
    }
}

/// Parse result: the page directive's title plus the root elements in
/// source order.
#[derive(Debug, Default)]
pub struct ParsedTemplate {
    pub title: String,
    pub roots: Vec<ControlTemplate>,
}

const KNOWN_TAGS: &[&str] = &[
    "form",
    "textbox",
    "label",
    "button",
    "panel",
    "requiredvalidator",
    "rangevalidator",
    "comparevalidator",
    "patternvalidator",
    "customvalidator",
];

/// Single-pass recursive-descent scanner over the template source.
///
/// Grammar: an optional `<%@ page ... %>` directive, `<%-- --%>`
/// comments, nested control tags with quoted attributes, and literal
/// text everywhere else. A `<` that does not open a recognized
/// construct is literal text.
pub(crate) struct TemplateParser {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    path: PathBuf,
    strict: bool,
}

impl TemplateParser {
    pub(crate) fn new(
        source: &str,
        path: &Path,
        strict: bool,
    ) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            path: path.to_path_buf(),
            strict,
        }
    }

    pub(crate) fn parse(mut self) -> Result<ParsedTemplate, CompileError> {
        let mut template = ParsedTemplate::default();
        let mut roots = Vec::new();
        self.parse_children(None, &mut roots, &mut template.title)?;
        template.roots = roots;
        Ok(template)
    }

    // ===== scanning primitives =====

    fn loc(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn starts_with(
        &self,
        prefix: &str,
    ) -> bool {
        self.chars[self.pos..]
            .iter()
            .zip(prefix.chars())
            .filter(|(a, b)| **a == *b)
            .count()
            == prefix.chars().count()
    }

    fn eat(
        &mut self,
        prefix: &str,
    ) -> bool {
        if self.starts_with(prefix) {
            for _ in prefix.chars() {
                self.bump();
            }
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
    }

    fn error(
        &self,
        at: SourceLocation,
        message: impl Into<String>,
    ) -> CompileError {
        CompileError::Syntax {
            path: self.path.clone(),
            line: at.line,
            column: at.column,
            message: message.into(),
        }
    }

    // ===== grammar =====

    /// Parses siblings until EOF or the closing tag of `enclosing`.
    fn parse_children(
        &mut self,
        enclosing: Option<&str>,
        out: &mut Vec<ControlTemplate>,
        title: &mut String,
    ) -> Result<(), CompileError> {
        loop {
            self.collect_literal(out);

            if self.peek().is_none() {
                return match enclosing {
                    Some(tag) => {
                        Err(self.error(self.loc(), format!("unclosed <{tag}> at end of template")))
                    }
                    None => Ok(()),
                };
            }

            if self.starts_with("<%--") {
                self.skip_comment()?;
            } else if self.starts_with("<%@") {
                self.parse_directive(title)?;
            } else if self.starts_with("</") {
                let at = self.loc();
                self.eat("</");
                let name = self.parse_name();
                self.skip_whitespace();
                if !self.eat(">") {
                    return Err(self.error(at, format!("malformed closing tag </{name}")));
                }
                return match enclosing {
                    Some(tag) if tag == name => Ok(()),
                    Some(tag) => {
                        Err(self.error(at, format!("expected </{tag}> but found </{name}>")))
                    }
                    None => Err(self.error(at, format!("unexpected closing tag </{name}>"))),
                };
            } else {
                self.parse_element(out, title)?;
            }
        }
    }

    /// Consumes literal text up to the next construct opener or EOF.
    fn collect_literal(
        &mut self,
        out: &mut Vec<ControlTemplate>,
    ) {
        let at = self.loc();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '<' {
                let next = self.chars.get(self.pos + 1).copied();
                let opens = matches!(next, Some(n) if n.is_ascii_alphabetic())
                    || self.starts_with("</")
                    || self.starts_with("<%");
                if opens {
                    break;
                }
            }
            text.push(c);
            self.bump();
        }
        if !text.trim().is_empty() {
            out.push(ControlTemplate {
                tag: "#text".to_string(),
                attributes: Vec::new(),
                children: Vec::new(),
                text: Some(text),
                location: at,
            });
        }
    }

    fn skip_comment(&mut self) -> Result<(), CompileError> {
        let at = self.loc();
        self.eat("<%--");
        while self.peek().is_some() {
            if self.eat("--%>") {
                return Ok(());
            }
            self.bump();
        }
        Err(self.error(at, "unterminated comment"))
    }

    fn parse_directive(
        &mut self,
        title: &mut String,
    ) -> Result<(), CompileError> {
        let at = self.loc();
        self.eat("<%@");
        self.skip_whitespace();
        let name = self.parse_name().to_ascii_lowercase();
        let attributes = self.parse_attributes(at)?;
        self.skip_whitespace();
        if !self.eat("%>") {
            return Err(self.error(at, "unterminated directive"));
        }

        if name != "page" {
            if self.strict {
                return Err(self.error(at, format!("unknown directive '{name}'")));
            }
            warn!("ignoring unknown directive '{}' in {:?}", name, self.path);
            return Ok(());
        }
        for (attr, value) in attributes {
            match attr.as_str() {
                "title" => *title = value,
                other => {
                    if self.strict {
                        return Err(
                            self.error(at, format!("unknown page directive attribute '{other}'"))
                        );
                    }
                    warn!("ignoring page directive attribute '{}' in {:?}", other, self.path);
                }
            }
        }
        Ok(())
    }

    fn parse_element(
        &mut self,
        out: &mut Vec<ControlTemplate>,
        title: &mut String,
    ) -> Result<(), CompileError> {
        let at = self.loc();
        self.eat("<");
        let name = self.parse_name().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error(at, "malformed tag"));
        }
        let attributes = self.parse_attributes(at)?;
        self.skip_whitespace();
        let self_closing = self.eat("/>");
        if !self_closing && !self.eat(">") {
            return Err(self.error(at, format!("unterminated <{name}> tag")));
        }

        let known = KNOWN_TAGS.contains(&name.as_str());
        if !known && self.strict {
            return Err(self.error(at, format!("unknown tag <{name}>")));
        }

        let mut children = Vec::new();
        if !self_closing {
            self.parse_children(Some(&name), &mut children, title)?;
        }

        if known {
            out.push(ControlTemplate {
                tag: name,
                attributes,
                children,
                text: None,
                location: at,
            });
        } else {
            // Lenient mode drops the unknown wrapper but keeps whatever
            // it contained.
            warn!("skipping unknown tag <{}> in {:?}", name, self.path);
            out.extend(children);
        }
        Ok(())
    }

    fn parse_name(&mut self) -> String {
        let mut name = String::new();
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            name.push(self.bump().unwrap_or_default());
        }
        name
    }

    fn parse_attributes(
        &mut self,
        element_at: SourceLocation,
    ) -> Result<Vec<(String, String)>, CompileError> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(c) if c.is_ascii_alphabetic() => {}
                _ => return Ok(attributes),
            }
            let at = self.loc();
            let name = self.parse_name().to_ascii_lowercase();
            self.skip_whitespace();
            if !self.eat("=") {
                return Err(self.error(at, format!("attribute '{name}' has no value")));
            }
            self.skip_whitespace();
            let quote = match self.peek() {
                Some(q @ ('"' | '\'')) => q,
                _ => {
                    return Err(self.error(at, format!("attribute '{name}' value must be quoted")))
                }
            };
            self.bump();
            let mut value = String::new();
            loop {
                match self.bump() {
                    Some(c) if c == quote => break,
                    Some(c) => value.push(c),
                    None => {
                        return Err(
                            self.error(element_at, format!("unterminated value for '{name}'"))
                        )
                    }
                }
            }
            attributes.push((name, value));
        }
    }
}
