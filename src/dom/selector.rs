//! Compound selectors: `tag`, `#id`, `.class`, `[attr]` and `[attr="value"]`
//! concatenated without combinators, e.g. `.card--expandable[data-expandable]`.

use super::DomError;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttrMatch>,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let invalid = || DomError::InvalidSelector(source.to_string());
        let text = source.trim();
        if text.is_empty() {
            return Err(invalid());
        }

        let mut selector = Selector::default();
        let mut chars = text.chars().peekable();

        let read_ident = |chars: &mut std::iter::Peekable<std::str::Chars<'_>>| {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if !is_ident_char(c) {
                    break;
                }
                ident.push(c);
                chars.next();
            }
            ident
        };

        if chars.peek() == Some(&'*') {
            chars.next();
        } else if chars.peek().is_some_and(|c| c.is_alphabetic()) {
            selector.tag = Some(read_ident(&mut chars).to_ascii_lowercase());
        }

        while let Some(c) = chars.next() {
            match c {
                '#' => {
                    let ident = read_ident(&mut chars);
                    if ident.is_empty() || selector.id.is_some() {
                        return Err(invalid());
                    }
                    selector.id = Some(ident);
                }
                '.' => {
                    let ident = read_ident(&mut chars);
                    if ident.is_empty() {
                        return Err(invalid());
                    }
                    selector.classes.push(ident);
                }
                '[' => {
                    let name = read_ident(&mut chars);
                    if name.is_empty() {
                        return Err(invalid());
                    }
                    let value = match chars.next() {
                        Some(']') => None,
                        Some('=') => {
                            let mut value = String::new();
                            let quote = match chars.peek() {
                                Some(&q) if q == '"' || q == '\'' => {
                                    chars.next();
                                    Some(q)
                                }
                                _ => None,
                            };
                            loop {
                                match (chars.next(), quote) {
                                    (Some(c), Some(q)) if c == q => break,
                                    (Some(']'), None) => break,
                                    (Some(c), _) => value.push(c),
                                    (None, _) => return Err(invalid()),
                                }
                            }
                            if quote.is_some() && chars.next() != Some(']') {
                                return Err(invalid());
                            }
                            Some(value)
                        }
                        _ => return Err(invalid()),
                    };
                    selector.attributes.push(AttrMatch { name, value });
                }
                _ => return Err(invalid()),
            }
        }

        Ok(selector)
    }

    pub(super) fn matches<'a>(
        &self,
        tag: &str,
        classes: &[String],
        attribute: impl Fn(&str) -> Option<&'a str>,
    ) -> bool {
        if let Some(expected) = &self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| classes.contains(c)) {
            return false;
        }
        self.attributes.iter().all(|m| match (attribute(&m.name), &m.value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        })
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(selector: &str, tag: &str, classes: &[&str], attrs: &[(&str, &str)]) -> bool {
        let selector = Selector::parse(selector).unwrap();
        let classes: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
        selector.matches(tag, &classes, |name| {
            attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
        })
    }

    #[test]
    fn card_marker_needs_class_and_attribute() {
        let sel = ".card--expandable[data-expandable]";
        assert!(check(sel, "article", &["card", "card--expandable"], &[("data-expandable", "")]));
        assert!(!check(sel, "article", &["card--expandable"], &[]));
        assert!(!check(sel, "article", &["card"], &[("data-expandable", "")]));
    }

    #[test]
    fn id_and_tag() {
        assert!(check("#faq", "div", &[], &[("id", "faq")]));
        assert!(check("button#faq", "BUTTON", &[], &[("id", "faq")]));
        assert!(!check("section#faq", "div", &[], &[("id", "faq")]));
    }

    #[test]
    fn attribute_values_quoted_and_bare() {
        assert!(check("[data-group=\"a\"]", "div", &[], &[("data-group", "a")]));
        assert!(check("[data-group='a']", "div", &[], &[("data-group", "a")]));
        assert!(check("[data-group=a]", "div", &[], &[("data-group", "a")]));
        assert!(!check("[data-group=a]", "div", &[], &[("data-group", "b")]));
    }

    #[test]
    fn rejects_combinators_and_garbage() {
        for bad in ["", "div p", "a > b", "#", ".", "[x", "[=a]", "a,b"] {
            assert!(Selector::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
