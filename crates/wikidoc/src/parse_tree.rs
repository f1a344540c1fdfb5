//! Minimal reader for the XML parse trees the wiki emits for revision text.
//!
//! Only what those trees use is supported: elements, attributes, text, the predefined
//! entities and numeric character references. Comments, processing instructions and a
//! doctype are skipped; CDATA sections become text.

use crate::error::WikidocError;

/// Deepest element nesting [`parse`] accepts. Deeper trees are rejected rather than walked.
pub const MAX_DEPTH: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First direct child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|element| element.name == name)
    }

    /// Concatenated text of every descendant, markup removed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => collect_text(child, out),
        }
    }
}

/// Parses a complete document and returns its root element.
pub fn parse(input: &str) -> Result<Element, WikidocError> {
    let mut reader = Reader {
        src: input,
        pos: 0,
        depth: 0,
    };
    reader.skip_misc()?;
    let root = reader.element()?;
    reader.skip_misc()?;
    if !reader.at_end() {
        return Err(reader.error("content after root element"));
    }
    Ok(root)
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error(&self, message: &str) -> WikidocError {
        WikidocError::TemplateTree(format!("{message} at byte {}", self.pos))
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn skip_past(&mut self, terminator: &str) -> Result<&'a str, WikidocError> {
        let rest = self.rest();
        match rest.find(terminator) {
            Some(idx) => {
                self.pos += idx + terminator.len();
                Ok(&rest[..idx])
            }
            None => Err(self.error(&format!("unterminated construct, expected {terminator:?}"))),
        }
    }

    /// Skips whitespace, comments, processing instructions and a doctype.
    fn skip_misc(&mut self) -> Result<(), WikidocError> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if rest.starts_with("<!DOCTYPE") || rest.starts_with("<!doctype") {
                self.skip_past(">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn name(&mut self) -> Result<String, WikidocError> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '=' | '<'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += end;
        Ok(rest[..end].to_string())
    }

    fn element(&mut self) -> Result<Element, WikidocError> {
        if !self.rest().starts_with('<') {
            return Err(self.error("expected '<'"));
        }
        self.pos += 1;
        let name = self.name()?;
        let mut element = Element {
            name,
            ..Element::default()
        };

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(element);
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.is_empty() {
                return Err(self.error("unterminated start tag"));
            }
            let attribute = self.attribute()?;
            element.attributes.push(attribute);
        }

        if self.depth >= MAX_DEPTH {
            return Err(self.error(&format!(
                "nesting too deep (more than {MAX_DEPTH} levels)"
            )));
        }
        self.depth += 1;
        self.content(&mut element)?;
        self.depth -= 1;
        Ok(element)
    }

    fn attribute(&mut self) -> Result<(String, String), WikidocError> {
        let key = self.name()?;
        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            return Err(self.error("expected '=' after attribute name"));
        }
        self.pos += 1;
        self.skip_whitespace();
        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected quoted attribute value")),
        };
        self.pos += 1;
        let raw = self.skip_past(&quote.to_string())?;
        Ok((key, decode_entities(raw)))
    }

    fn content(&mut self, element: &mut Element) -> Result<(), WikidocError> {
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(&format!("unclosed element <{}>", element.name)));
            }
            if let Some(after) = rest.strip_prefix("</") {
                let end = after
                    .find('>')
                    .ok_or_else(|| self.error("unterminated end tag"))?;
                let closing = after[..end].trim();
                if closing != element.name {
                    return Err(self.error(&format!(
                        "mismatched end tag </{closing}> for <{}>",
                        element.name
                    )));
                }
                self.pos += 2 + end + 1;
                return Ok(());
            }
            if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if rest.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".len();
                let text = self.skip_past("]]>")?;
                push_text(element, text.to_string());
            } else if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with('<') {
                let child = self.element()?;
                element.children.push(Node::Element(child));
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                self.pos += end;
                push_text(element, decode_entities(&rest[..end]));
            }
        }
    }
}

/// Appends text, merging with a preceding text node.
fn push_text(element: &mut Element, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(previous)) = element.children.last_mut() {
        previous.push_str(&text);
    } else {
        element.children.push(Node::Text(text));
    }
}

/// Decodes predefined entities and numeric references; unknown entities are kept verbatim.
pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|end| *end <= 12)
            .and_then(|end| decode_entity(&candidate[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
