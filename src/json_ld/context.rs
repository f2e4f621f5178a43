use std::collections::BTreeMap;

use anyhow::{Context as AnyhowContext, Result, bail};
use serde_json::{Value as JsonValue, json};

use super::vocab::{self, Term, is_keyword};

/// An active context built from locally supplied context definitions.
#[derive(Debug, Clone, Default)]
pub(crate) struct Context {
    pub(crate) language: Option<String>,
    pub(crate) vocab: Option<Term>,
    pub(crate) term_map: BTreeMap<String, Term>,
}

impl Context {
    pub(crate) fn insert(&mut self, term: &str, definition: Term) {
        self.term_map.insert(term.to_owned(), definition);
    }
    pub(crate) fn get_term(&self, term: &str) -> Option<&Term> {
        self.term_map.get(term)
    }

    /// Expand a property key against this context, treating it as
    /// vocabulary relative.
    pub(crate) fn expand_iri(&self, value: &str) -> Term {
        if is_keyword(value) {
            return Term::new_keyword(value);
        }
        if let Some(definition) = self.get_term(value) {
            return definition.clone();
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Term::new_iri(value);
            }
            if let Some(definition) = self.get_term(prefix) {
                return definition.join(suffix);
            }
            return Term::new_iri(value);
        }
        if let Some(vocab) = &self.vocab {
            return vocab.join(value);
        }
        Term::new_iri(value)
    }
}

impl TryFrom<&JsonValue> for Context {
    type Error = anyhow::Error;

    /// Convert a document's `@context` to an active context using the
    /// algorithm defined in https://www.w3.org/TR/json-ld11-api/#algorithm
    ///
    /// Only local contexts are processed. Remote contexts are rejected
    /// instead of being dereferenced, and term definitions keep just the
    /// IRI mapping.
    fn try_from(value: &JsonValue) -> Result<Context> {
        let node = value.as_object().context("value should be a JSON object")?;
        let Some(context_def) = node.get(vocab::CONTEXT.as_str()) else {
            return Ok(Context::default());
        };
        // 4.1.2.4 Normalize context to an array
        let contexts = if context_def.is_array() {
            context_def
                .as_array()
                .context("context should either be an object, or an array of them")?
                .to_owned()
        } else {
            vec![context_def.to_owned()]
        };

        let mut result = Context::default();
        for context in &contexts {
            match context {
                // 4.1.2.5.1 override
                JsonValue::Null => {
                    result = Context::default();
                }
                // 4.1.2.5.2
                JsonValue::String(remote_context) => {
                    bail!("remote context {remote_context} is not supported");
                }
                // 4.1.2.5.4
                JsonValue::Object(_) => {
                    process_context_definition(context, &mut result)?;
                }
                // 4.1.2.5.3
                _ => {
                    bail!("invalid local context (not null, string, or map)");
                }
            }
        }

        Ok(result)
    }
}

fn process_context_definition(context: &JsonValue, result: &mut Context) -> Result<()> {
    let mut defined = BTreeMap::new();

    // 4.1.2.5.5
    match context.get("@version") {
        Some(JsonValue::Number(number)) => {
            if number.as_f64().unwrap_or_default() != 1.1 {
                bail!("invalid @version value {number}");
            }
        }
        Some(value) => {
            bail!("invalid @version value {value}");
        }
        None => {}
    }
    // skip @import

    // skip @base

    // 4.1.2.5.8
    match context.get("@vocab") {
        Some(JsonValue::Null) => {
            result.vocab = None;
        }
        Some(JsonValue::String(value)) => {
            result.vocab = Some(iri_expand(result, value, context, &mut defined)?);
        }
        Some(value) => bail!("invalid vocabulary mapping {value}"),
        None => {}
    }
    // 4.1.2.5.9
    match context.get("@language") {
        Some(JsonValue::Null) => {
            result.language = None;
        }
        Some(JsonValue::String(lang)) => {
            result.language = Some(lang.to_owned());
        }
        Some(value) => bail!("invalid default language {value}"),
        None => {}
    }
    // skip @direction

    // skip @propagate

    // 4.1.2.5.13
    let entries = context.as_object().context("local context should be a map")?;
    for (key, value) in entries {
        if [
            "@base",
            "@direction",
            "@import",
            "@language",
            "@propagate",
            "@protected",
            "@version",
            "@vocab",
        ]
        .contains(&key.as_str())
        {
            continue;
        }
        create_term_definition(result, context, key, value, &mut defined)?;
    }

    Ok(())
}

fn create_term_definition(
    result: &mut Context,
    context: &JsonValue,
    term: &str,
    value: &JsonValue,
    defined: &mut BTreeMap<String, bool>,
) -> Result<()> {
    // 4.2.2.1
    match defined.get(term) {
        Some(true) => return Ok(()),
        Some(false) => bail!("cyclic IRI mapping found for {term}"),
        _ => {}
    }
    // 4.2.2.2
    if term.is_empty() {
        bail!("invalid term definition (empty string)");
    }
    defined.insert(term.to_owned(), false);

    // 4.2.2.5
    if term.starts_with('@') && term.is_ascii() {
        bail!("keyword redefinition error ({term})");
    }
    // 4.2.2.6
    result.term_map.remove(term);

    let value = match value {
        // 4.2.2.7
        JsonValue::Null => json!({ "@id": null }),
        // 4.2.2.8
        JsonValue::String(id) => json!({ "@id": id }),
        // 4.2.2.9
        JsonValue::Object(_) => value.clone(),
        _ => bail!("invalid term definition for {term}"),
    };
    let JsonValue::Object(entries) = &value else {
        bail!("invalid term definition for {term}");
    };

    // skipping @protected, @type and @reverse processing

    let definition = match entries.get("@id") {
        // 4.2.2.14.1, the term is explicitly unmapped
        Some(JsonValue::Null) => None,
        Some(JsonValue::String(id)) => {
            // 4.2.2.14.2.2
            if id.starts_with('@') && !is_keyword(id) {
                bail!("invalid keyword alias {id}");
            }
            // 4.2.2.14.2.3
            let definition = iri_expand(result, id, context, defined)?;
            if definition == vocab::CONTEXT {
                bail!("invalid keyword alias error (@context cannot be aliased)");
            }
            // 4.2.2.14.2.4
            if term.contains(':') || term.contains('/') {
                // 4.2.2.14.2.4.1
                defined.insert(term.to_owned(), true);
                // 4.2.2.14.2.4.2
                if definition != iri_expand(result, term, context, defined)? {
                    bail!("invalid IRI mapping (term mismatch for {term})");
                }
            }
            Some(definition)
        }
        // 4.2.2.14.2.1
        Some(_) => bail!("invalid IRI mapping error (@id of {term} is not a string)"),
        // 4.2.2.15
        None if term.contains(':') => {
            let (term_prefix, suffix) = term
                .split_once(':')
                .context("compact IRI should contain a colon")?;
            if suffix.starts_with("//") {
                Some(Term::new_iri(term))
            } else {
                // 4.2.2.15.1
                if let Some(prefix_value) = context.get(term_prefix) {
                    create_term_definition(result, context, term_prefix, prefix_value, defined)?;
                }
                // 4.2.2.15.2
                match result.get_term(term_prefix) {
                    Some(prefix) => Some(prefix.join(suffix)),
                    // 4.2.2.15.3
                    None => Some(Term::new_iri(term)),
                }
            }
        }
        // 4.2.2.16
        None if term.contains('/') => Some(iri_expand(result, term, context, defined)?),
        // 4.2.2.18
        None => match &result.vocab {
            Some(vocab) => Some(vocab.join(term)),
            None => bail!("invalid IRI mapping (no @vocab to resolve {term})"),
        },
    };

    // skip @container, @index, @context, @language, @direction, @nest

    // 4.2.2.25
    match entries.get("@prefix") {
        Some(JsonValue::Bool(is_prefix)) => {
            if *is_prefix && definition.as_ref().is_some_and(Term::is_keyword) {
                bail!("invalid term definition (keyword as prefix)");
            }
        }
        Some(_) => {
            bail!("invalid @prefix value for {term}")
        }
        _ => {}
    }

    for entry in entries.keys() {
        if ![
            "@id",
            "@reverse",
            "@container",
            "@context",
            "@direction",
            "@index",
            "@language",
            "@nest",
            "@prefix",
            "@protected",
            "@type",
        ]
        .contains(&entry.as_str())
        {
            bail!("invalid term definition (unknown keyword {entry})");
        }
    }

    if let Some(definition) = definition {
        result.insert(term, definition);
    }
    defined.insert(term.to_owned(), true);

    Ok(())
}

fn iri_expand(
    active_context: &mut Context,
    value: &str,
    local_context: &JsonValue,
    defined: &mut BTreeMap<String, bool>,
) -> Result<Term> {
    // 5.2.2.1
    if is_keyword(value) {
        return Ok(Term::new_keyword(value));
    }
    // 5.2.2.3
    if let Some(entry_value) = local_context.get(value) {
        if defined.get(value).is_none() {
            create_term_definition(active_context, local_context, value, entry_value, defined)?;
        }
    }
    // 5.2.2.4 and 5.2.2.5, assume vocab is true
    if let Some(definition) = active_context.get_term(value) {
        return Ok(definition.clone());
    }
    // 5.2.2.6.1
    if let Some((prefix, suffix)) = value.split_once(':') {
        // 5.2.2.6.2
        if prefix == "_" || suffix.starts_with("//") {
            return Ok(Term::new_iri(value));
        }
        // 5.2.2.6.3
        if let Some(prefix_value) = local_context.get(prefix) {
            if !matches!(defined.get(prefix), Some(true)) {
                create_term_definition(
                    active_context,
                    local_context,
                    prefix,
                    prefix_value,
                    defined,
                )?;
            }
        }
        // 5.2.2.6.4, assume prefix is true
        if let Some(definition) = active_context.get_term(prefix) {
            return Ok(definition.join(suffix));
        }
        // 5.2.2.6.5
        return Ok(Term::new_iri(value));
    }
    // 5.2.2.7
    if let Some(vocab) = &active_context.vocab {
        return Ok(vocab.join(value));
    }
    // skip document relative

    Ok(Term::new_iri(value))
}
