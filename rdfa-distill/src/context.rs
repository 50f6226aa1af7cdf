//! Evaluation contexts and CURIE/Term/IRI resolution.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use curie::{Curie, ExpansionError, PrefixMapping};
use icu::locale::LanguageIdentifier;
use indexmap::IndexMap;
use oxiri::{Iri, IriParseError};
use oxrdf::{NamedNode, NamedNodeRef, NamedOrBlankNode};

use crate::host::{Version, initial_context_prefixes};
use crate::{Options, PGType, trace};

pub(crate) type SharedList = RefCell<Vec<Rc<oxrdf::Term>>>;

/// Predicate → ordered sequence of values, accumulated by `@inlist`.
///
/// Insertion order is the document order in which predicates first appear,
/// and each list's members are pushed in document order.
#[derive(Default)]
pub(crate) struct ListMapping {
    lists: IndexMap<NamedNode, Rc<SharedList>>,
}

impl ListMapping {
    pub fn ensure_list(&mut self, predicate: &NamedNode) -> Rc<SharedList> {
        if let Some(list) = self.lists.get(predicate) {
            return list.clone();
        }

        trace!(" - Created new list for predicate: {}", predicate);
        let shared_list: Rc<SharedList> = Default::default();
        let replaced = self.lists.insert(predicate.clone(), shared_list.clone());
        debug_assert!(replaced.is_none());
        shared_list
    }

    pub fn insert_value(&mut self, predicate: NamedNode, term: Rc<oxrdf::Term>) {
        trace!(" - Inserting into list ({predicate}): {}", term);
        self.lists.entry(predicate).or_default().borrow_mut().push(term);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NamedNode, &Rc<SharedList>)> {
        self.lists.iter()
    }
}

/// Presence/value of one attribute: an absent attribute is distinct from a
/// present attribute whose value resolved to nothing.
#[derive(Clone)]
pub(crate) enum Attr<T> {
    Missing,
    Empty,
    Value(T),
}

impl<T> Attr<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attr<U> {
        match self {
            Attr::Missing => Attr::Missing,
            Attr::Empty => Attr::Empty,
            Attr::Value(v) => Attr::Value(f(v)),
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Attr::Missing)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Attr::Value(v) => Some(v),
            Attr::Missing | Attr::Empty => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Attr::Value(v) => Some(v),
            Attr::Missing | Attr::Empty => None,
        }
    }
}

/// A `@rel`/`@rev` predicate awaiting the subject a descendant element will
/// establish.
#[derive(Clone, Debug)]
pub(crate) enum IncompleteTriple {
    List(Rc<SharedList>),
    Forward(NamedNode),
    Reverse(NamedNode),
}

// “During processing, each rule is applied using information provided by an
//  evaluation context. An initial context is created when processing begins.
#[derive(Clone)]
pub(crate) struct EvaluationContext {
    /// Represents `[_:]`, which RDFa permits but Turtle-derived node types
    /// do not; every occurrence maps to this one node.
    pub empty_bnode: oxrdf::BlankNode,

    // “The base. [...] it establishes an IRI against which relative paths
    //  can be resolved.
    pub base: Iri<String>,

    // “The parent subject. The initial value will be the same as the initial
    //  value of base, but it will usually change during the course of
    //  processing.
    pub parent_subject: Rc<NamedOrBlankNode>,

    // “The parent object. In some situations the object of a statement
    //  becomes the subject of any nested statements; this member conveys
    //  that value down.
    pub parent_object: Option<Rc<NamedOrBlankNode>>,

    // “A list of current, in-scope IRI mappings.
    pub iri_mappings: Rc<PrefixMapping>,

    // “A list of incomplete triples, completed when the next subject is
    //  specified (part of the process called chaining).
    pub incomplete_triples: Vec<IncompleteTriple>,

    // “A list mapping that associates IRIs with lists.
    pub list_mapping: Rc<RefCell<ListMapping>>,

    // “The language. Note that there is no default language.
    pub language: Option<Rc<LanguageIdentifier>>,

    // “The term mappings, a list of terms and their associated IRIs.
    pub term_mappings: Rc<BTreeMap<String, NamedNode>>,

    // “The default vocabulary, a value to use as the prefix IRI when a term
    //  unknown to the processor is used.
    pub default_vocab: Option<NamedNode>,
}

impl EvaluationContext {
    pub fn new(options: &Options, base: Iri<String>) -> Self {
        let mut iri_mappings = PrefixMapping::default();
        for (prefix, iri) in initial_context_prefixes().mappings() {
            iri_mappings.add_prefix(prefix, iri).unwrap();
        }
        let term_mappings = Rc::new(options.host_language.initial_terms().clone());

        Self {
            empty_bnode: oxrdf::BlankNode::default(),
            // resolve the base to remove any fragment so that it can be used
            // directly as the "empty CURIE" value
            base: base.resolve("").unwrap(),
            parent_subject: Rc::new(NamedNode::new_unchecked(base.into_inner()).into()),
            parent_object: None,
            iri_mappings: Rc::new(iri_mappings),
            incomplete_triples: Default::default(),
            list_mapping: Default::default(),
            language: None,
            term_mappings,
            default_vocab: options.host_language.default_vocabulary(),
        }
    }
}

pub(crate) enum CurieError {
    EmptyCurie,
    InvalidIri(String),
    Expansion(ExpansionError),
}

pub(crate) struct NotCurie;
pub(crate) struct NotTerm;

/// Schemes a predicate-position token may legitimately start with. Anything
/// else that looks like `prefix:suffix` with an undeclared prefix is treated
/// as an unresolved CURIE, not an IRI.
const KNOWN_SCHEMES: &[&str] = &[
    "data", "did", "doi", "file", "ftp", "geo", "http", "https", "irc", "ldap", "mailto", "news",
    "sip", "sms", "ssh", "tag", "tel", "urn", "ws", "wss", "xmpp",
];

// “During the course of processing a number of locally scoped values are
//  needed.
#[derive(Clone)]
pub(crate) struct LocalScope<'a> {
    pub report: &'a dyn Fn(PGType, String),
    pub eval_context: &'a EvaluationContext,
    pub version: Version,
    /// Usually the context base; `xml:base` may rebase the subtree.
    pub base: Iri<String>,
    // “An initially empty list of IRI mappings, called the local list of IRI
    //  mappings.
    pub iri_mappings: Rc<PrefixMapping>,
    // “An initially empty list of incomplete triples.
    pub incomplete_triples: Vec<IncompleteTriple>,
    // “An initially empty language value.
    pub current_language: Option<Rc<LanguageIdentifier>>,
    // “A skip element flag, which indicates whether the current element can
    //  safely be ignored since it has no relevant RDFa attributes.
    pub skip_element: bool,
    // “A new subject value.
    pub new_subject: Option<Rc<NamedOrBlankNode>>,
    // “A value for the current object resource, the resource to use when
    //  creating triples that have a resource object.
    pub current_object_resource: Option<Rc<NamedOrBlankNode>>,
    // “A value for the typed resource, the source for creating rdf:type
    //  relationships to types specified in @typeof.
    pub typed_resource: Option<Rc<NamedOrBlankNode>>,
    // “The local term mappings.
    pub term_mappings: Rc<BTreeMap<String, NamedNode>>,
    // “The local list mapping.
    pub list_mappings: Rc<RefCell<ListMapping>>,
    // “A local default vocabulary.
    pub default_vocab: Option<NamedNode>,
}

impl<'a> LocalScope<'a> {
    pub fn new(
        eval_context: &'a EvaluationContext,
        version: Version,
        report: &'a dyn Fn(PGType, String),
    ) -> Self {
        Self {
            report,
            eval_context,
            version,
            base: eval_context.base.clone(),
            skip_element: false,
            new_subject: None,
            current_object_resource: None,
            typed_resource: None,
            iri_mappings: eval_context.iri_mappings.clone(),
            incomplete_triples: Default::default(),
            list_mappings: eval_context.list_mapping.clone(),
            current_language: eval_context.language.clone(),
            term_mappings: eval_context.term_mappings.clone(),
            default_vocab: eval_context.default_vocab.clone(),
        }
    }

    /// An empty CURIE resolves to the (fragmentless) base value.
    pub fn empty_curie(&self) -> NamedNodeRef<'_> {
        NamedNodeRef::new_unchecked(self.base.as_str())
    }

    // When resolving a term, the outcome might be that it _must_ be ignored.
    // This is indicated by returning [`None`].
    pub fn resolve_term(&self, term: &str) -> Result<Option<NamedNode>, NotTerm> {
        // [rdfa-core] 7.5.3
        // > term     ::=  NCNameStartChar termChar*
        // > termChar ::=  ( NameChar - ':' ) | '/'
        //
        // i.e. a 'term' is an XML NCName that also permits slash as a
        // non-leading character.
        if term.is_empty()
            || term.starts_with('/')
            || term
                .split('/')
                .any(|s| rxml_validation::validate_ncname(s).is_err())
        {
            return Err(NotTerm);
        }

        if !self.version.is_1_1() {
            // RDFa 1.0 has no default vocabulary; reserved words are matched
            // case-insensitively against the host term set.
            return Ok(self.lookup_term_ci(term).or_else(|| {
                (self.report)(
                    PGType::UnresolvedTerm,
                    format!("Term `{term}` is not defined by the host language"),
                );
                None
            }));
        }

        // > If there is a local default vocabulary the IRI is obtained by
        // > concatenating that value and the term.
        if let Some(vocab) = &self.default_vocab {
            let mut iri = vocab.as_str().to_string();
            iri.push_str(term);
            let named_node = NamedNode::new(iri).expect("always a valid IRI");
            Ok(Some(named_node))
        }
        // > Otherwise, check if the term matches an item in the list of
        // > local term mappings. First compare against the list
        // > case-sensitively,
        else if let Some(term_iri) = self.term_mappings.get(term) {
            Ok(Some(term_iri.clone()))
        }
        // > and if there is no match then compare case-insensitively.
        else if let Some(term_iri) = self.lookup_term_ci(term) {
            Ok(Some(term_iri))
        } else {
            // > Otherwise, the term has no associated IRI and MUST be
            // > ignored.
            (self.report)(
                PGType::UnresolvedTerm,
                format!("Term `{term}` has no associated IRI"),
            );
            Ok(None)
        }
    }

    fn lookup_term_ci(&self, term: &str) -> Option<NamedNode> {
        self.term_mappings
            .iter()
            .find_map(|(key, iri)| key.eq_ignore_ascii_case(term).then(|| iri.clone()))
    }

    /// Resolves a (non-safe) CURIE to an IRI or bnode.
    pub fn resolve_curie(&self, value: &str) -> Result<NamedOrBlankNode, CurieError> {
        if value.is_empty() {
            return Err(CurieError::EmptyCurie);
        }

        let curie = if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" {
                if suffix.is_empty() {
                    // [_:] always denotes the same per-parse node.
                    return Ok(self.eval_context.empty_bnode.clone().into());
                }

                return match oxrdf::BlankNode::new(suffix) {
                    Ok(node) => Ok(node.into()),
                    Err(_) => Err(CurieError::InvalidIri(value.to_string())),
                };
            }

            Curie::new(Some(prefix), suffix)
        } else {
            Curie::new(None, value)
        };

        match self.iri_mappings.expand_curie(&curie) {
            Ok(iri) => {
                // Usually the expansion is absolute, but a relative IRI can
                // (though it should not) be used as a prefix, so resolve it.
                match self.resolve_relative_iri(&iri) {
                    Ok(absolute_iri) => Ok(absolute_iri.into()),
                    Err(_) => Err(CurieError::InvalidIri(iri)),
                }
            }
            Err(err) => Err(CurieError::Expansion(err)),
        }
    }

    /// Resolves a SafeCURIE or CURIE to an IRI or bnode.
    pub fn resolve_safecuri_or_curie(
        &self,
        value: &str,
    ) -> Result<Option<NamedOrBlankNode>, NotCurie> {
        if value.starts_with('[') && value.ends_with(']') {
            match self.resolve_curie(&value[1..value.len() - 1]) {
                Ok(iri) => Ok(Some(iri)),
                Err(err) => {
                    // A failed SafeCURIE MUST be ignored; `[]` and an
                    // undeclared default prefix are deliberate no-values,
                    // anything else is reported.
                    match err {
                        CurieError::EmptyCurie
                        | CurieError::Expansion(ExpansionError::MissingDefault) => {}
                        CurieError::InvalidIri(iri) => {
                            (self.report)(
                                PGType::UnresolvedCurie,
                                format!(
                                    "Invalid CURIE: {value} (expanded to invalid IRI value <{iri}>)",
                                ),
                            );
                        }
                        CurieError::Expansion(ExpansionError::Invalid) => {
                            (self.report)(
                                PGType::UnresolvedCurie,
                                format!("Invalid CURIE: {value} (no such prefix defined)"),
                            );
                        }
                    }
                    Ok(None)
                }
            }
        } else {
            match self.resolve_curie(value) {
                Ok(value) => Ok(Some(value)),
                Err(_) => Err(NotCurie),
            }
        }
    }

    /// Resolves an IRI-only attribute value (`@href`/`@src`).
    pub fn attribute_iri(&self, value: &str) -> Option<NamedNode> {
        self.resolve_relative_iri(value).ok()
    }

    /// Resolves an IRI reference against the local base.
    pub fn resolve_relative_iri(&self, value: &str) -> Result<NamedNode, IriParseError> {
        let iri = self.base.resolve(value)?;
        debug_assert!(Iri::parse(iri.as_str()).is_ok());
        Ok(NamedNode::new_unchecked(iri.into_inner()))
    }

    pub fn safecuri_or_curie_or_iri(&self, value: &str) -> Option<NamedOrBlankNode> {
        match self.resolve_safecuri_or_curie(value) {
            Ok(val) => val, // value, or MUST be ignored
            Err(NotCurie) => {
                // not a CURIE; fall back to a (possibly relative) IRI
                match self.resolve_relative_iri(value) {
                    Ok(val) => Some(val.into()),
                    Err(err) => {
                        (self.report)(
                            PGType::Warning,
                            format!("Invalid IRI: <{value}> ({err})"),
                        );
                        None
                    }
                }
            }
        }
    }

    pub fn curie_or_absiri(&self, value: &str) -> Option<NamedOrBlankNode> {
        match self.resolve_curie(value) {
            Ok(val) => Some(val),
            Err(CurieError::InvalidIri(iri)) => {
                (self.report)(
                    PGType::UnresolvedCurie,
                    format!("Invalid CURIE: {value} (expanded to invalid IRI value <{iri}>)"),
                );
                None
            }
            Err(_) => {
                // Not a declared CURIE. Only an absolute IRI remains valid
                // here; a prefixed token with an undeclared prefix is dropped
                // and reported rather than mistaken for an exotic scheme.
                let Some((scheme, rest)) = value.split_once(':') else {
                    (self.report)(
                        PGType::Warning,
                        format!("Invalid IRI: <{value}> (not an absolute IRI)"),
                    );
                    return None;
                };

                if rest.starts_with("//")
                    || KNOWN_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
                {
                    match NamedNode::new(value.to_string()) {
                        Ok(iri) => Some(iri.into()),
                        Err(err) => {
                            (self.report)(
                                PGType::Warning,
                                format!("Invalid IRI: <{value}> ({err})"),
                            );
                            None
                        }
                    }
                } else {
                    (self.report)(
                        PGType::UnresolvedCurie,
                        format!("CURIE `{value}` uses an undeclared prefix `{scheme}`"),
                    );
                    None
                }
            }
        }
    }

    pub fn term_or_curie_or_absiri(&self, value: &str) -> Option<NamedOrBlankNode> {
        match self.resolve_term(value) {
            Ok(result) => result.map(NamedOrBlankNode::from), // value, or MUST be ignored
            Err(NotTerm) => self.curie_or_absiri(value),
        }
    }

    pub fn many_curie_or_absiri(&self, value: &str) -> Vec<NamedOrBlankNode> {
        value
            .split_ascii_whitespace()
            .filter_map(|v| self.curie_or_absiri(v))
            .collect()
    }

    pub fn many_term_or_curie_or_absiri(&self, value: &str) -> Vec<NamedOrBlankNode> {
        value
            .split_ascii_whitespace()
            .filter_map(|v| self.term_or_curie_or_absiri(v))
            .collect()
    }
}
