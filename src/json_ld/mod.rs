//! Just enough JSON-LD

mod context;
mod expand;
mod namespaces;
mod vocab;

pub(crate) use self::context::Context;
pub(crate) use self::expand::expand_keys;
pub(crate) use self::namespaces::{NamespaceContext, normalize_context_document, normalize_namespace};
pub(crate) use self::vocab::{CONTEXT, TYPE, Term, VALUE};
