use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Term {
    Iri(Cow<'static, str>),
    Keyword(Cow<'static, str>),
}

impl Default for Term {
    fn default() -> Self {
        Term::Iri(Cow::default())
    }
}

impl Term {
    pub(crate) fn new_keyword(keyword: &str) -> Term {
        Term::Keyword(Cow::Owned(keyword.to_owned()))
    }

    pub(crate) const fn const_keyword(keyword: &'static str) -> Term {
        Term::Keyword(Cow::Borrowed(keyword))
    }

    pub(crate) fn new_iri(iri: &str) -> Term {
        Term::Iri(Cow::Owned(iri.to_owned()))
    }

    pub(crate) fn as_str(&self) -> &str {
        match self {
            Term::Iri(iri) => iri,
            Term::Keyword(keyword) => keyword,
        }
    }

    pub(crate) fn is_keyword(&self) -> bool {
        matches!(self, Term::Keyword(_))
    }

    /// Append a suffix to an IRI. Keywords never act as prefixes, so they
    /// come back unchanged.
    pub(crate) fn join(&self, suffix: &str) -> Term {
        match self {
            Term::Iri(iri) => Term::Iri(Cow::Owned(format!("{iri}{suffix}"))),
            Term::Keyword(_) => self.clone(),
        }
    }
}

pub(crate) const CONTEXT: Term = Term::const_keyword("@context");
pub(crate) const TYPE: Term = Term::const_keyword("@type");
pub(crate) const VALUE: Term = Term::const_keyword("@value");
pub(crate) const VOCAB: Term = Term::const_keyword("@vocab");

/// Characters that terminate a namespace IRI, see
/// https://www.w3.org/TR/json-ld11/#dfn-gen-delim
pub(crate) const GEN_DELIMS: [char; 7] = [':', '/', '?', '#', '[', ']', '@'];

pub(crate) fn is_keyword(value: &str) -> bool {
    [
        "@base",
        "@container",
        "@context",
        "@direction",
        "@graph",
        "@id",
        "@import",
        "@include",
        "@index",
        "@json",
        "@language",
        "@list",
        "@nest",
        "@none",
        "@prefix",
        "@propagate",
        "@protected",
        "@reverse",
        "@set",
        "@type",
        "@value",
        "@version",
        "@vocab",
    ]
    .contains(&value)
}
