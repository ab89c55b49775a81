//! Link substitution inside comment tokens.
//!
//! A [`LinkRules`] pairs a matcher pattern with a generator that maps each
//! matched substring to a target. The CSS lexer applies the rules when it
//! emits a comment token, splitting the comment text into literal and
//! linked segments.

use regex::Regex;

use super::LinkSegment;

type Generator = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Matcher + generator pair applied to comment text.
pub struct LinkRules {
    matcher: Regex,
    generator: Generator,
}

impl std::fmt::Debug for LinkRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkRules")
            .field("matcher", &self.matcher.as_str())
            .finish_non_exhaustive()
    }
}

impl LinkRules {
    pub fn new(
        matcher: Regex,
        generator: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        LinkRules {
            matcher,
            generator: Box::new(generator),
        }
    }

    /// Parse the `"pattern -> template"` declaration form, where `%s` in
    /// the template is replaced with the matched text.
    ///
    /// Returns `None` when the declaration has no ` -> ` separator or the
    /// pattern is not a valid regex.
    pub fn from_declaration(decl: &str) -> Option<Self> {
        let (pattern, template) = decl.split_once(" -> ")?;
        let matcher = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!("ignoring link declaration with bad pattern: {e}");
                return None;
            }
        };
        let template = template.to_string();
        Some(LinkRules::new(matcher, move |m| {
            Some(template.replace("%s", m))
        }))
    }

    /// Split `text` into literal and linked segments covering it exactly.
    /// Returns `None` when nothing matched, so the caller can emit a plain
    /// token instead.
    pub fn split(&self, text: &str) -> Option<Vec<LinkSegment>> {
        let mut segments = Vec::new();
        let mut cursor = 0;
        for m in self.matcher.find_iter(text) {
            if m.start() > cursor {
                segments.push(LinkSegment {
                    text: text[cursor..m.start()].to_string(),
                    href: None,
                });
            }
            segments.push(LinkSegment {
                text: m.as_str().to_string(),
                href: (self.generator)(m.as_str()),
            });
            cursor = m.end();
        }
        if segments.is_empty() {
            return None;
        }
        if cursor < text.len() {
            segments.push(LinkSegment {
                text: text[cursor..].to_string(),
                href: None,
            });
        }
        Some(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_form_substitutes_matches() {
        let rules =
            LinkRules::from_declaration(r"bug-\d+ -> https://bugs.example/%s").unwrap();
        let segments = rules.split("/* see bug-42 and bug-7 */").unwrap();
        let texts: Vec<_> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["/* see ", "bug-42", " and ", "bug-7", " */"]);
        assert_eq!(
            segments[1].href.as_deref(),
            Some("https://bugs.example/bug-42")
        );
        assert!(segments[0].href.is_none());
    }

    #[test]
    fn segments_cover_full_text() {
        let rules = LinkRules::from_declaration(r"\w+\.css -> /files/%s").unwrap();
        let text = "/* imports a.css then b.css */";
        let joined: String = rules
            .split(text)
            .unwrap()
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn no_match_yields_none() {
        let rules = LinkRules::from_declaration(r"bug-\d+ -> %s").unwrap();
        assert!(rules.split("/* nothing here */").is_none());
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(LinkRules::from_declaration("no separator").is_none());
    }
}
