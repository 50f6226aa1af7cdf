//! Extraction of RDF statements from RDFa-annotated HTML/XML/SVG markup.
//!
//! The distiller walks an already-parsed element tree and produces an
//! ordered stream of [`Statement`]s belonging to two logical graphs: the
//! output graph (the data the document expresses) and the processor graph
//! (diagnostics about the distillation itself).

use std::convert::Infallible;
use std::str::FromStr;

use oxiri::Iri;
use oxrdf::{Graph, NamedNode, NamedNodeRef, Triple};

macro_rules! trace {
    ($($args:expr),*) => {
        #[cfg(debug_assertions)]
        println!($($args),*);
    };
}
pub(crate) use trace;

mod context;
mod distill;
mod expansion;
mod host;
mod literal;
mod vocab;

pub use distill::Distiller;
pub use host::{
    HostLanguage, UnknownVersion, Version, initial_context_prefixes, initial_context_terms,
    xhtml_vocabulary_terms,
};

/// The logical graph a statement belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphName {
    Output,
    Processor,
}

/// One produced statement: a triple tagged with its logical graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub triple: Triple,
    pub graph: GraphName,
}

/// Which logical graph(s) the distillation result carries.
///
/// Parses from a single token, or a comma/whitespace-separated list of
/// tokens; unrecognized tokens are ignored and an empty selection falls back
/// to the output graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphSelection {
    pub output: bool,
    pub processor: bool,
}

impl GraphSelection {
    pub fn output() -> Self {
        Self {
            output: true,
            processor: false,
        }
    }

    pub fn processor() -> Self {
        Self {
            output: false,
            processor: true,
        }
    }

    pub fn both() -> Self {
        Self {
            output: true,
            processor: true,
        }
    }

    pub fn includes(self, graph: GraphName) -> bool {
        match graph {
            GraphName::Output => self.output,
            GraphName::Processor => self.processor,
        }
    }
}

impl Default for GraphSelection {
    fn default() -> Self {
        Self::output()
    }
}

impl FromStr for GraphSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut selection = Self {
            output: false,
            processor: false,
        };
        for token in s.split(|c: char| c == ',' || c.is_whitespace()).map(str::trim) {
            match token {
                "output" => selection.output = true,
                "processor" => selection.processor = true,
                _ => {}
            }
        }
        if !selection.output && !selection.processor {
            selection.output = true;
        }
        Ok(selection)
    }
}

/// Configuration for one distillation run.
#[derive(Clone, Debug)]
pub struct Options {
    /// IRI against which relative references resolve; a `<base>` element
    /// (HTML hosts) or `xml:base` (XML hosts) can override it.
    pub base: Iri<String>,
    pub host_language: HostLanguage,
    pub version: Version,
    /// Entail additional statements from the known vocabulary closures.
    pub vocab_expansion: bool,
    /// Treat lexical forms that do not match their built-in XSD datatype as
    /// fatal instead of keeping them verbatim.
    pub validate: bool,
    pub rdfagraph: GraphSelection,
}

impl Options {
    pub fn new(base: Iri<String>) -> Self {
        Self {
            base,
            host_language: HostLanguage::default(),
            version: Version::default(),
            vocab_expansion: false,
            validate: false,
            rdfagraph: GraphSelection::default(),
        }
    }
}

#[derive(derive_more::Error, derive_more::Display, derive_more::From, Debug)]
pub enum Error {
    #[display("IRI parse error: `{iri}`")]
    IriParseError {
        source: oxiri::IriParseError,
        iri: String,
    },

    #[display("@prefix syntax error: prefix must end with ':'.")]
    NoColonPrefix,

    #[display("invalid lexical form for <{datatype}>: \"{value}\"")]
    InvalidLiteral { value: String, datatype: NamedNode },
}

/// Processor-graph condition classes.
#[derive(Clone, Copy, Debug)]
pub(crate) enum PGType {
    Error,
    Warning,
    Info,
    UnresolvedCurie,
    UnresolvedTerm,
}

impl PGType {
    pub(crate) fn iri(self) -> NamedNodeRef<'static> {
        match self {
            PGType::Error => vocab::rdfa::ERROR,
            PGType::Warning => vocab::rdfa::WARNING,
            PGType::Info => vocab::rdfa::INFO,
            PGType::UnresolvedCurie => vocab::rdfa::UNRESOLVED_CURIE,
            PGType::UnresolvedTerm => vocab::rdfa::UNRESOLVED_TERM,
        }
    }
}

/// The result of one parse: the full statement sequence plus the configured
/// graph selection.
pub struct Distillation {
    pub(crate) statements: Vec<Statement>,
    pub(crate) selection: GraphSelection,
}

impl Distillation {
    /// Every produced statement, both graphs, in emission order and
    /// unfiltered.
    pub fn all_statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Materializes both graphs, deduplicating statements.
    pub fn into_graphs(self) -> (Graph, Graph) {
        let mut output = Graph::new();
        let mut processor = Graph::new();
        for statement in &self.statements {
            match statement.graph {
                GraphName::Output => {
                    output.insert(&statement.triple);
                }
                GraphName::Processor => {
                    processor.insert(&statement.triple);
                }
            }
        }
        (output, processor)
    }
}

impl IntoIterator for Distillation {
    type Item = Statement;
    type IntoIter = Statements;

    fn into_iter(self) -> Statements {
        Statements {
            inner: self.statements.into_iter(),
            selection: self.selection,
        }
    }
}

/// Single-pass, non-restartable stream of statements, filtered to the
/// selected graph(s). Re-running the parse is the only way to observe the
/// sequence again.
pub struct Statements {
    inner: std::vec::IntoIter<Statement>,
    selection: GraphSelection,
}

impl Iterator for Statements {
    type Item = Statement;

    fn next(&mut self) -> Option<Statement> {
        let selection = self.selection;
        self.inner.by_ref().find(|s| selection.includes(s.graph))
    }
}

/// Distills a document into its statement stream.
pub fn distill(input: &str, options: Options) -> Result<Distillation, Error> {
    Distiller::new(options).distill(input)
}

/// Distills a document into caller-supplied output and processor graphs.
/// Both graphs are always filled; `rdfagraph` filtering only applies to the
/// statement stream.
pub fn process(
    input: &str,
    options: Options,
    output_graph: &mut Graph,
    processor_graph: &mut Graph,
) -> Result<(), Error> {
    let distillation = distill(input, options)?;
    for statement in distillation.all_statements() {
        match statement.graph {
            GraphName::Output => {
                output_graph.insert(&statement.triple);
            }
            GraphName::Processor => {
                processor_graph.insert(&statement.triple);
            }
        }
    }
    Ok(())
}
