//! In-memory stylesheet rule lists (a minimal CSSOM)

use cssparser::{ParseError, Parser, ParserInput, ToCss, Token};

/// A stylesheet as the runtime sees it: an optional source URL plus the
/// current rule list, which may have diverged from any text it was parsed from.
///
/// Sheets are shared through `Arc`; two owners pointing at the same `Arc` are
/// the same sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleSheet {
    href: Option<String>,
    rules: Vec<String>,
}

impl StyleSheet {
    /// A constructed sheet with no source URL.
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            href: None,
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a sheet from CSS text, one rule per top-level statement.
    pub fn parse(text: &str) -> Self {
        Self {
            href: None,
            rules: split_rules(text),
        }
    }

    /// A sheet loaded from `href` (e.g. a `<link>` or a `blob:` URL).
    pub fn with_href<I, S>(href: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            href: Some(href.into()),
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Insert a rule, clamping `index` to the end of the list.
    pub fn insert_rule(&mut self, rule: impl Into<String>, index: usize) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule.into());
    }

    pub fn delete_rule(&mut self, index: usize) -> Option<String> {
        if index < self.rules.len() {
            Some(self.rules.remove(index))
        } else {
            None
        }
    }

    /// Rule text joined one rule per line.
    pub fn css_text(&self) -> String {
        self.rules.join("\n")
    }

    /// True when every rule of `self` has an identical counterpart at the same
    /// index in `other`. Extra trailing rules in `other` are not considered.
    pub fn rules_match(&self, other: &StyleSheet) -> bool {
        self.rules.iter().enumerate().all(|(i, rule)| {
            other
                .rules
                .get(i)
                .map(|o| rule_tokens(o) == rule_tokens(rule))
                .unwrap_or(false)
        })
    }
}

/// Split CSS text into top-level rules.
///
/// Block rules end with their block; statement at-rules such as `@import`
/// end at a top-level `;`. Comments and whitespace between rules are dropped.
pub fn split_rules(text: &str) -> Vec<String> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();
    let mut start = parser.position();
    let mut empty = true;

    loop {
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::WhiteSpace(_) | Token::Comment(_) if empty => start = parser.position(),
            Token::Semicolon => {
                push_rule(&mut rules, parser.slice_from(start));
                start = parser.position();
                empty = true;
            }
            Token::CurlyBracketBlock => {
                let _ = parser.parse_nested_block(skip_block);
                push_rule(&mut rules, parser.slice_from(start));
                start = parser.position();
                empty = true;
            }
            _ => empty = false,
        }
    }
    push_rule(&mut rules, parser.slice_from(start));
    rules
}

fn skip_block<'i>(block: &mut Parser<'i, '_>) -> Result<(), ParseError<'i, ()>> {
    while block.next_including_whitespace_and_comments().is_ok() {}
    Ok(())
}

fn push_rule(rules: &mut Vec<String>, text: &str) {
    let rule = text.trim();
    if !rule.is_empty() && rule != ";" {
        rules.push(rule.to_string());
    }
}

/// Serialized tokens of a rule, ignoring comments and insignificant whitespace.
///
/// Whitespace runs collapse to one token and are dropped next to `{ } ; : ,`.
/// String and url contents are kept exactly.
pub fn rule_tokens(rule: &str) -> Vec<String> {
    let mut input = ParserInput::new(rule);
    let mut parser = Parser::new(&mut input);
    let mut out = Vec::new();
    collect_tokens(&mut parser, &mut out);
    out
}

fn collect_tokens(parser: &mut Parser<'_, '_>, out: &mut Vec<String>) {
    loop {
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::Comment(_) => {}
            Token::WhiteSpace(_) => {
                if out.last().is_some_and(|last| last != " " && !is_separator(last)) {
                    out.push(" ".to_string());
                }
            }
            _ => {
                let text = token.to_css_string();
                if is_separator(&text) {
                    trim_space(out);
                }
                out.push(text);
                let close = match token {
                    Token::CurlyBracketBlock => "}",
                    Token::SquareBracketBlock => "]",
                    Token::ParenthesisBlock | Token::Function(_) => ")",
                    _ => continue,
                };
                let _ = parser.parse_nested_block::<_, (), ()>(|block| {
                    collect_tokens(block, out);
                    Ok(())
                });
                trim_space(out);
                out.push(close.to_string());
            }
        }
    }
    trim_space(out);
}

fn is_separator(token: &str) -> bool {
    matches!(token, "{" | "}" | ";" | ":" | ",")
}

fn trim_space(out: &mut Vec<String>) {
    if out.last().is_some_and(|last| last == " ") {
        out.pop();
    }
}
