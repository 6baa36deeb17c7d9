//! CSS selector subset for the in-memory page
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! selectors (`[a]`, `[a=v]`, `[a~=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`),
//! `:not(<compound>)`, `:nth-child(<n>)`, `:first-child`, the descendant and
//! child (`>`) combinators, and comma-separated lists. That covers every
//! selector in the stock adapter table.

use super::document::{Document, NodeId};

// ==================== TYPE DEFINITIONS ====================

/// Selector parse failure
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorError {
    pub selector: String,
    pub position: usize,
    pub message: String,
}

impl std::fmt::Display for SelectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {} in {:?}",
            self.message, self.position, self.selector
        )
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
}

impl AttrSelector {
    fn matches(&self, actual: Option<&str>) -> bool {
        let actual = match actual {
            Some(a) => a,
            None => return false,
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == self.value,
            AttrOp::Includes => actual.split_whitespace().any(|w| w == self.value),
            AttrOp::Prefix => !self.value.is_empty() && actual.starts_with(&self.value),
            AttrOp::Suffix => !self.value.is_empty() && actual.ends_with(&self.value),
            AttrOp::Substring => !self.value.is_empty() && actual.contains(&self.value),
        }
    }
}

/// One compound selector: `div.card[data-x]:not(.hidden)`
#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    negations: Vec<Compound>,
    nth_child: Option<usize>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.negations.is_empty()
            && self.nth_child.is_none()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let tag = match doc.tag(node) {
            Some(t) => t,
            None => return false,
        };
        if let Some(want) = &self.tag {
            if want != "*" && !want.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attr(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = doc.attr(node, "class").unwrap_or("");
            let has_all = self
                .classes
                .iter()
                .all(|c| class_attr.split_whitespace().any(|have| have == c));
            if !has_all {
                return false;
            }
        }
        if !self.attrs.iter().all(|a| a.matches(doc.attr(node, &a.name))) {
            return false;
        }
        if let Some(n) = self.nth_child {
            if doc.element_index(node) != Some(n) {
                return false;
            }
        }
        self.negations.iter().all(|neg| !neg.matches(doc, node))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

/// `a > b c`, stored left to right
#[derive(Debug, Clone, PartialEq)]
struct Complex {
    parts: Vec<Compound>,
    /// `combinators[i]` joins `parts[i]` and `parts[i + 1]`
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_at(doc, node, self.parts.len() - 1)
    }

    fn matches_at(&self, doc: &Document, node: NodeId, idx: usize) -> bool {
        if !self.parts[idx].matches(doc, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => doc
                .parent_element(node)
                .map(|parent| self.matches_at(doc, parent, idx - 1))
                .unwrap_or(false),
            Combinator::Descendant => {
                let mut current = doc.parent_element(node);
                while let Some(ancestor) = current {
                    if self.matches_at(doc, ancestor, idx - 1) {
                        return true;
                    }
                    current = doc.parent_element(ancestor);
                }
                false
            }
        }
    }
}

/// Parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        Parser::new(source).parse_list()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the element matches any alternative
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, node))
    }
}

// ==================== PARSER ====================

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> SelectorError {
        SelectorError {
            selector: self.source.to_string(),
            position: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '-' || c == '_') {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_list(&mut self) -> Result<Selector, SelectorError> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            alternatives.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(_) => return Err(self.error("unexpected character")),
            }
        }
        Ok(Selector {
            source: self.source.to_string(),
            alternatives,
        })
    }

    fn parse_complex(&mut self) -> Result<Complex, SelectorError> {
        let mut parts = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    Combinator::Child
                }
                None | Some(',') => break,
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.error("unexpected character")),
            };
            combinators.push(combinator);
            parts.push(self.parse_compound()?);
        }

        Ok(Complex { parts, combinators })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();

        if self.eat('*') {
            compound.tag = Some("*".to_string());
        } else if matches!(self.peek(), Some(c) if c.is_alphabetic()) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.pos += 1;
                    self.parse_pseudo(&mut compound)?;
                }
                _ => break,
            }
        }

        if compound.is_empty() {
            return Err(self.error("expected selector"));
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();

        let op = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some('=') => AttrOp::Equals,
            Some('~') => AttrOp::Includes,
            Some('^') => AttrOp::Prefix,
            Some('$') => AttrOp::Suffix,
            Some('*') => AttrOp::Substring,
            _ => return Err(self.error("expected attribute operator")),
        };
        self.pos += 1;
        if op != AttrOp::Equals && !self.eat('=') {
            return Err(self.error("expected '='"));
        }
        self.skip_whitespace();

        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c != quote) {
                    self.pos += 1;
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                if !self.eat(quote) {
                    return Err(self.error("unterminated string"));
                }
                value
            }
            _ => self.ident()?,
        };

        self.skip_whitespace();
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(AttrSelector { name, op, value })
    }

    fn parse_pseudo(&mut self, compound: &mut Compound) -> Result<(), SelectorError> {
        let name = self.ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => {
                compound.nth_child = Some(1);
            }
            "nth-child" => {
                if !self.eat('(') {
                    return Err(self.error("expected '('"));
                }
                self.skip_whitespace();
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let n = digits
                    .parse::<usize>()
                    .map_err(|_| self.error("expected child index"))?;
                self.skip_whitespace();
                if !self.eat(')') {
                    return Err(self.error("expected ')'"));
                }
                compound.nth_child = Some(n);
            }
            "not" => {
                if !self.eat('(') {
                    return Err(self.error("expected '('"));
                }
                self.skip_whitespace();
                let inner = self.parse_compound()?;
                self.skip_whitespace();
                if !self.eat(')') {
                    return Err(self.error("expected ')'"));
                }
                compound.negations.push(inner);
            }
            _ => return Err(self.error("unsupported pseudo-class")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stock_selectors() {
        for source in [
            "#jobDescriptionText",
            ".jobsearch-CompanyInfoWithReview > div > div > div:nth-child(2)",
            "#mosaic-provider-jobcards .companyLocation, #mosaic-provider-jobcards .companyLocation span:not(.companyLocation--extras)",
            r#".jobsearch-CompanyInfoWithReview [data-testid="inlineHeader-companyLocation"]"#,
            r#".companyInfo li[data-cy="companyLocation"]"#,
            ".jobs-description footer button",
            ".header-details li, .JobInfoCard .q-item__section--main",
        ] {
            assert!(Selector::parse(source).is_ok(), "failed to parse {}", source);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div >").is_err());
        assert!(Selector::parse("[data-x=").is_err());
        assert!(Selector::parse("a:hover").is_err());
        assert!(Selector::parse("div, ").is_err());
        let err = Selector::parse("div)").unwrap_err();
        assert_eq!(err.position, 3);
    }

    #[test]
    fn test_matching() {
        let mut doc = Document::new();
        let body = doc.body();
        let card = doc.append_element(body, "div", &[("class", "card selected"), ("id", "c1")]);
        let first = doc.append_element(card, "span", &[("class", "loc")]);
        let second = doc.append_element(card, "span", &[("class", "loc extras"), ("data-cy", "companyLocation")]);

        let sel = |s: &str| Selector::parse(s).unwrap();
        assert!(sel("div.card.selected").matches(&doc, card));
        assert!(sel("#c1 > span").matches(&doc, first));
        assert!(sel("body span").matches(&doc, second));
        assert!(!sel("body > span").matches(&doc, second));
        assert!(sel("span:not(.extras)").matches(&doc, first));
        assert!(!sel("span:not(.extras)").matches(&doc, second));
        assert!(sel("span:nth-child(2)").matches(&doc, second));
        assert!(sel("span:first-child").matches(&doc, first));
        assert!(sel(r#"[data-cy="companyLocation"]"#).matches(&doc, second));
        assert!(sel("[data-cy^=company]").matches(&doc, second));
        assert!(sel("[class~=extras]").matches(&doc, second));
        assert!(!sel("[class~=extra]").matches(&doc, second));
        assert!(sel("p, .loc").matches(&doc, first));
        assert!(sel("*").matches(&doc, card));
    }
}
