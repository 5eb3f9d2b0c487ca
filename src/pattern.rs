//! Route templates compiled to anchored regular expressions.
//!
//! A template is split on `/`. Each segment is either matched verbatim or is
//! a typed variable written `<name:kind>`:
//!
//! | kind     | matches                                   |
//! |----------|-------------------------------------------|
//! | `int`    | one or more ASCII digits                  |
//! | `string` | one or more characters other than `/`     |
//! | `path`   | one or more characters, lazily            |
//!
//! `path` is lazy so that literal segments after it still anchor:
//! `/<p:path>/edit` on `/a/b/edit` captures `p = "a/b"`.
//!
//! The pattern is anchored at both ends and keeps the template's trailing
//! slash: `/users/` does not match `/users`.
//!
//! A segment that is wrapped in `<` `>` but is not a valid variable (unknown
//! kind, bad name, missing colon) is rejected at compile time rather than
//! silently matched as a literal.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([a-zA-Z][0-9A-Za-z_]*):([a-z]+)>$").expect("variable grammar is a valid regex")
});

/// Path variables extracted by a match, keyed by variable name.
pub type Params = HashMap<String, String>;

/// The type of a path variable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Int,
    String,
    Path,
}

impl Kind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "int"    => Some(Self::Int),
            "string" => Some(Self::String),
            "path"   => Some(Self::Path),
            _        => None,
        }
    }

    fn class(self) -> &'static str {
        match self {
            Self::Int    => "[0-9]+",
            Self::String => "[^/]+",
            Self::Path   => ".+?",
        }
    }
}

/// One `/`-separated piece of a template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Literal(String),
    Variable { name: String, kind: Kind },
}

/// A compiled route template.
///
/// ```rust
/// use sprig::PathPattern;
///
/// let pattern = PathPattern::compile("/users/<id:int>").unwrap();
/// let params = pattern.captures("/users/42").unwrap();
/// assert_eq!(params["id"], "42");
/// assert!(pattern.captures("/users/alice").is_none());
/// ```
#[derive(Clone)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
    regex: Regex,
}

impl PathPattern {
    /// Compiles `template`. The same template always yields the same pattern.
    pub fn compile(template: &str) -> Result<Self, Error> {
        let segments = parse(template)?;
        let source = translate(&segments);
        let regex = Regex::new(&source).map_err(|source| Error::Pattern {
            template: template.to_owned(),
            source,
        })?;
        Ok(Self { template: template.to_owned(), segments, regex })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The generated regular expression, e.g. `^/users/(?P<id>[0-9]+)$`.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Matches `path` and returns every variable it captured.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        let params = self
            .variables()
            .filter_map(|name| caps.name(name).map(|m| (name.to_owned(), m.as_str().to_owned())))
            .collect();
        Some(params)
    }

    /// Variable names in template order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("template", &self.template)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, Error> {
    let mut segments = Vec::new();
    for raw in template.trim_start_matches('/').split('/') {
        let segment = parse_segment(template, raw)?;
        if let Segment::Variable { name, .. } = &segment {
            let seen = segments
                .iter()
                .any(|s| matches!(s, Segment::Variable { name: n, .. } if n == name));
            if seen {
                return Err(Error::DuplicateVariable {
                    template: template.to_owned(),
                    name: name.clone(),
                });
            }
        }
        segments.push(segment);
    }
    Ok(segments)
}

fn parse_segment(template: &str, raw: &str) -> Result<Segment, Error> {
    if !(raw.starts_with('<') && raw.ends_with('>')) {
        return Ok(Segment::Literal(raw.to_owned()));
    }
    let invalid = || Error::InvalidVariable {
        template: template.to_owned(),
        segment: raw.to_owned(),
    };
    let caps = VARIABLE.captures(raw).ok_or_else(invalid)?;
    let kind = Kind::parse(&caps[2]).ok_or_else(invalid)?;
    Ok(Segment::Variable { name: caps[1].to_owned(), kind })
}

fn translate(segments: &[Segment]) -> String {
    let mut source = String::from("^");
    for segment in segments {
        source.push('/');
        match segment {
            Segment::Literal(text) => source.push_str(&regex::escape(text)),
            Segment::Variable { name, kind } => {
                source.push_str("(?P<");
                source.push_str(name);
                source.push('>');
                source.push_str(kind.class());
                source.push(')');
            }
        }
    }
    source.push('$');
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(template: &str) -> String {
        PathPattern::compile(template).unwrap().as_str().to_owned()
    }

    fn capture(template: &str, path: &str) -> Params {
        PathPattern::compile(template)
            .unwrap()
            .captures(path)
            .unwrap_or_else(|| panic!("`{template}` should match `{path}`"))
    }

    fn rejects(template: &str, path: &str) {
        let pattern = PathPattern::compile(template).unwrap();
        assert!(!pattern.is_match(path), "`{template}` should not match `{path}`");
    }

    #[test]
    fn generated_patterns() {
        assert_eq!(source("/test"), "^/test$");
        assert_eq!(source("/test/"), "^/test/$");
        assert_eq!(source("/"), "^/$");
        assert_eq!(source(""), "^/$");
        assert_eq!(source("/test/<someint:int>"), "^/test/(?P<someint>[0-9]+)$");
        assert_eq!(source("/test/<someint:int>/"), "^/test/(?P<someint>[0-9]+)/$");
        assert_eq!(source("/test/<someint:int>/data"), "^/test/(?P<someint>[0-9]+)/data$");
        assert_eq!(source("/<somestr:string>/"), "^/(?P<somestr>[^/]+)/$");
        assert_eq!(source("/<somestr:path>/"), "^/(?P<somestr>.+?)/$");
        assert_eq!(
            source("/<somestr:path>/<someint:int>"),
            "^/(?P<somestr>.+?)/(?P<someint>[0-9]+)$"
        );
    }

    #[test]
    fn compilation_is_deterministic() {
        assert_eq!(source("/a/<b:string>/<c:path>"), source("/a/<b:string>/<c:path>"));
    }

    #[test]
    fn literal_templates_match_only_themselves() {
        for template in ["/", "/test", "/test/", "/a.b/c+d", "/x(y)/[z]"] {
            let pattern = PathPattern::compile(template).unwrap();
            assert!(pattern.is_match(template), "{template}");
            assert_eq!(pattern.captures(template).unwrap().len(), 0);
        }
        rejects("/test", "/test/");
        rejects("/test/", "/test");
        rejects("/test", "/tesT");
        rejects("/test", "/testx");
        rejects("/a.b", "/aXb");
        rejects("/test", "/prefix/test");
    }

    #[test]
    fn int_variables() {
        assert_eq!(capture("/test/<n:int>", "/test/9")["n"], "9");
        rejects("/test/<n:int>", "/test/abc");
        rejects("/test/<n:int>", "/test/something");
        rejects("/test/<n:int>", "/test/");
        rejects("/test/<n:int>", "/test/-1");
    }

    #[test]
    fn string_variables() {
        assert_eq!(capture("/<s:string>/", "/Hello+World/")["s"], "Hello+World");
        assert_eq!(capture("/<s:string>", "/Hello+World")["s"], "Hello+World");
        assert_eq!(capture("/<s:string>/something", "/hello/something")["s"], "hello");
        rejects("/<s:string>/something", "/hello/something/");
        rejects("/<s:string>/something", "/hello/something/something");
    }

    #[test]
    fn path_variables_stop_at_trailing_literals() {
        assert_eq!(capture("/<p:path>/something", "/a/b/something")["p"], "a/b");
        assert_eq!(
            capture("/<p:path>/something", "/hello/something/something")["p"],
            "hello/something"
        );
        assert_eq!(capture("/<p:path>", "/a/b/c")["p"], "a/b/c");
        assert_eq!(capture("/<p:path>/", "/a/b/c/")["p"], "a/b/c");
    }

    #[test]
    fn several_variables() {
        let params = capture("/<dir:path>/<n:int>", "/docs/2024/7");
        assert_eq!(params["dir"], "docs/2024");
        assert_eq!(params["n"], "7");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn malformed_variables_are_rejected() {
        for template in ["/<bad:type>", "/<1abc:int>", "/<noKind>", "/<:int>", "/<a-b:int>"] {
            match PathPattern::compile(template) {
                Err(Error::InvalidVariable { segment, .. }) => {
                    assert_eq!(format!("/{segment}"), template);
                }
                other => panic!("`{template}` should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn segments_and_variables() {
        let pattern = PathPattern::compile("/files/<dir:path>/v<n>/<n:int>").unwrap();
        assert_eq!(
            pattern.segments(),
            [
                Segment::Literal("files".to_owned()),
                Segment::Variable { name: "dir".to_owned(), kind: Kind::Path },
                Segment::Literal("v<n>".to_owned()),
                Segment::Variable { name: "n".to_owned(), kind: Kind::Int },
            ]
        );
        assert_eq!(pattern.variables().collect::<Vec<_>>(), ["dir", "n"]);
    }

    #[test]
    fn one_letter_names_are_allowed() {
        assert_eq!(capture("/<x:int>", "/1")["x"], "1");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        assert!(matches!(
            PathPattern::compile("/<a:int>/<a:string>"),
            Err(Error::DuplicateVariable { name, .. }) if name == "a"
        ));
    }

    #[test]
    fn angle_brackets_inside_literals_are_verbatim() {
        let pattern = PathPattern::compile("/a<b>c").unwrap();
        assert!(pattern.is_match("/a<b>c"));
    }
}
