//! Host languages, RDFa versions, and the initial contexts they seed.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use curie::PrefixMapping;
use oxrdf::NamedNode;

/// Host markup languages understood by the distiller.
///
/// The host language controls which initial term mapping is seeded, whether
/// `@lang` applies in addition to `xml:lang`, and whether `xml:base` rebases
/// a subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, derive_more::FromStr)]
pub enum HostLanguage {
    Html4,
    #[default]
    Html5,
    Xhtml1,
    Xhtml5,
    Xml,
    Svg,
}

impl HostLanguage {
    /// XML-family hosts take base and language from `xml:base`/`xml:lang`
    /// only; the HTML family also honors `@lang` and the `<base>` element.
    pub fn is_xml(self) -> bool {
        matches!(self, HostLanguage::Xml | HostLanguage::Svg)
    }

    pub(crate) fn initial_terms(self) -> &'static BTreeMap<String, NamedNode> {
        match self {
            // The XHTML Metainformation Vocabulary supplies the reserved
            // link-relation terms for the older host languages.
            HostLanguage::Html4 | HostLanguage::Xhtml1 => xhtml_vocabulary_terms(),
            _ => initial_context_terms(),
        }
    }

    // [html-rdfa] 3.1
    // “The default vocabulary URI is undefined.
    pub(crate) fn default_vocabulary(self) -> Option<NamedNode> {
        None
    }
}

/// RDFa language version.
///
/// RDFa 1.0 predates `@prefix`, `@vocab` and `@inlist`: prefixes come from
/// `@xmlns:*` only, terms are matched case-insensitively against the host
/// vocabulary, `@src` sits on the subject side, and an element with markup
/// content and no `@content`/`@datatype` produces an `rdf:XMLLiteral`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Version {
    Rdfa1_0,
    #[default]
    Rdfa1_1,
}

impl Version {
    pub fn is_1_1(self) -> bool {
        matches!(self, Version::Rdfa1_1)
    }
}

impl FromStr for Version {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1.0" | "rdfa1.0" => Ok(Version::Rdfa1_0),
            "1.1" | "rdfa1.1" => Ok(Version::Rdfa1_1),
            _ => Err(UnknownVersion),
        }
    }
}

#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("unknown RDFa version; expected `1.0` or `1.1`")]
pub struct UnknownVersion;

pub fn initial_context_terms() -> &'static BTreeMap<String, NamedNode> {
    // https://www.w3.org/2011/rdfa-context/rdfa-1.1
    // Vocabulary terms
    static INITIAL_CONTEXT: OnceLock<BTreeMap<String, NamedNode>> = OnceLock::new();
    INITIAL_CONTEXT.get_or_init(|| {
        [
            (
                "describedBy".to_string(),
                NamedNode::new_unchecked("http://www.w3.org/2007/05/powder-s#describedby"),
            ),
            (
                "license".to_string(),
                NamedNode::new_unchecked("http://www.w3.org/1999/xhtml/vocab#license"),
            ),
            (
                "role".to_string(),
                NamedNode::new_unchecked("http://www.w3.org/1999/xhtml/vocab#role"),
            ),
        ]
        .into_iter()
        .collect()
    })
}

/// Reserved terms of the XHTML Metainformation Vocabulary, used as the
/// initial term mapping for the XHTML1/HTML4 host languages.
pub fn xhtml_vocabulary_terms() -> &'static BTreeMap<String, NamedNode> {
    static XHTML_TERMS: OnceLock<BTreeMap<String, NamedNode>> = OnceLock::new();
    XHTML_TERMS.get_or_init(|| {
        [
            "alternate",
            "appendix",
            "bookmark",
            "chapter",
            "cite",
            "contents",
            "copyright",
            "first",
            "glossary",
            "help",
            "icon",
            "index",
            "last",
            "license",
            "meta",
            "next",
            "p3pv1",
            "prev",
            "previous",
            "role",
            "section",
            "start",
            "stylesheet",
            "subsection",
            "top",
            "up",
        ]
        .into_iter()
        .map(|term| {
            let iri = format!("http://www.w3.org/1999/xhtml/vocab#{term}");
            (term.to_string(), NamedNode::new_unchecked(iri))
        })
        .collect()
    })
}

pub fn initial_context_prefixes() -> &'static PrefixMapping {
    static INITIAL_CONTEXT: OnceLock<PrefixMapping> = OnceLock::new();
    // https://www.w3.org/2011/rdfa-context/rdfa-1.1
    // Vocabulary prefixes
    INITIAL_CONTEXT.get_or_init(|| {
        let mut mapping = PrefixMapping::default();
        for (prefix, iri) in [
            // Defined by [rdfa-core]
            ("", "http://www.w3.org/1999/xhtml/vocab#"),
            // W3C documents
            ("as", "https://www.w3.org/ns/activitystreams#"),
            ("csvw", "http://www.w3.org/ns/csvw#"),
            ("dcat", "http://www.w3.org/ns/dcat#"),
            ("dqv", "http://www.w3.org/ns/dqv#"),
            ("duv", "http://www.w3.org/ns/duv#"),
            ("grddl", "http://www.w3.org/2003/g/data-view#"),
            ("jsonld", "http://json-ld.org/vocab#"),
            ("ma", "http://www.w3.org/ns/ma-ont#"),
            ("org", "http://www.w3.org/ns/org#"),
            ("owl", "http://www.w3.org/2002/07/owl#"),
            ("prov", "http://www.w3.org/ns/prov#"),
            ("qb", "http://purl.org/linked-data/cube#"),
            ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
            ("rdfa", "http://www.w3.org/ns/rdfa#"),
            ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
            ("rif", "http://www.w3.org/2007/rif#"),
            ("rr", "http://www.w3.org/ns/r2rml#"),
            ("sd", "http://www.w3.org/ns/sparql-service-description#"),
            ("skos", "http://www.w3.org/2004/02/skos/core#"),
            ("skosxl", "http://www.w3.org/2008/05/skos-xl#"),
            ("sosa", "http://www.w3.org/ns/sosa/"),
            ("ssn", "http://www.w3.org/ns/ssn/"),
            ("time", "http://www.w3.org/2006/time#"),
            ("void", "http://rdfs.org/ns/void#"),
            ("wdr", "http://www.w3.org/2007/05/powder#"),
            ("wdrs", "http://www.w3.org/2007/05/powder-s#"),
            ("xhv", "http://www.w3.org/1999/xhtml/vocab#"),
            ("xml", "http://www.w3.org/XML/1998/namespace"),
            ("xsd", "http://www.w3.org/2001/XMLSchema#"),
            // "widely used"
            ("cc", "http://creativecommons.org/ns#"),
            ("ctag", "http://commontag.org/ns#"),
            ("dc", "http://purl.org/dc/terms/"),
            ("dc11", "http://purl.org/dc/elements/1.1/"),
            ("dcterms", "http://purl.org/dc/terms/"),
            ("foaf", "http://xmlns.com/foaf/0.1/"),
            ("gr", "http://purl.org/goodrelations/v1#"),
            ("ical", "http://www.w3.org/2002/12/cal/icaltzd#"),
            ("og", "http://ogp.me/ns#"),
            ("rev", "http://purl.org/stuff/rev#"),
            ("schema", "http://schema.org/"),
            ("schemas", "https://schema.org/"),
            ("sioc", "http://rdfs.org/sioc/ns#"),
            ("v", "http://rdf.data-vocabulary.org/#"),
            ("vcard", "http://www.w3.org/2006/vcard/ns#"),
        ] {
            mapping.add_prefix(prefix, iri).unwrap();
        }
        mapping
    })
}
