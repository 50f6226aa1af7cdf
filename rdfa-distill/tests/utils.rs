#![allow(unused)]

use std::collections::HashSet;

use itertools::Itertools;
use oxrdf::Graph;
use rdfa_distill::Options;

pub fn base() -> oxiri::Iri<String> {
    oxiri::Iri::parse("http://example/".to_string()).unwrap()
}

pub fn default_options() -> Options {
    Options::new(base())
}

pub fn serialize_graph(graph: Graph, base: &str) -> String {
    // NB: rdf_canon is used because the canonicalization provided by oxrdf
    // hangs
    let idents = rdf_canon::issue_graph_with::<sha2::Sha256>(&graph, &Default::default()).unwrap();
    let graph = rdf_canon::relabel_graph(&graph, &idents).unwrap();

    let mut output = Vec::new();
    let mut ttl = oxttl::TurtleSerializer::new().with_base_iri(base).unwrap();

    // slow but makes test output nicer
    let mut prefixes_to_use = HashSet::new();
    let mut add_prefix = |full_iri: &str| {
        if let Some((known_prefix, iri)) = rdfa_distill::initial_context_prefixes()
            .mappings()
            .find(|(prefix, iri)| !prefix.is_empty() && full_iri.starts_with(*iri))
        {
            prefixes_to_use.insert((known_prefix, iri));
        }
    };

    for triple in graph.iter() {
        if let oxrdf::SubjectRef::NamedNode(n) = triple.subject {
            add_prefix(n.as_str());
        }

        add_prefix(triple.predicate.as_str());

        if let oxrdf::TermRef::NamedNode(n) = triple.object {
            add_prefix(n.as_str());
        } else if let oxrdf::TermRef::Literal(l) = triple.object {
            if !l.is_plain() {
                add_prefix(l.datatype().as_str());
            }
        }
    }

    for (prefix, iri) in prefixes_to_use {
        ttl = ttl.with_prefix(prefix, iri).unwrap();
    }

    let mut ttl = ttl.for_writer(&mut output);
    for triple in graph.iter().sorted_by_cached_key(|t| {
        (
            t.subject.to_string(),
            if t.predicate.as_str() == "http://www.w3.org/1999/02/22-rdf-syntax-ns#type" {
                // make "a" come first
                None
            } else {
                Some(t.predicate.to_string())
            },
            t.object.to_string(),
        )
    }) {
        ttl.serialize_triple(triple).unwrap();
    }

    ttl.finish().unwrap();

    String::from_utf8_lossy(&output).into_owned()
}

pub fn parse_ttl(ttl: &str, base: &str) -> Graph {
    let mut graph = Graph::new();
    let parser = oxttl::TurtleParser::new()
        .with_base_iri(base)
        .unwrap()
        .for_slice(ttl.as_bytes());
    for triple in parser {
        graph.insert(&triple.unwrap());
    }
    graph
}

/// Parses with the given options and asserts that the output graph is
/// equivalent to the expected Turtle.
pub fn assert_graph_with(html: &str, options: Options, ttl: &str) {
    let base = options.base.clone();

    let mut output_graph = Graph::new();
    let mut processor_graph = Graph::new();
    rdfa_distill::process(html, options, &mut output_graph, &mut processor_graph).unwrap();

    let ttl_graph = parse_ttl(ttl, base.as_str());

    let serialized = serialize_graph(output_graph, base.as_str());
    let expected = serialize_graph(ttl_graph, base.as_str());

    pretty_assertions::assert_eq!(serialized, expected);
}

pub fn assert_graph(html: &str, ttl: &str) {
    assert_graph_with(html, default_options(), ttl);
}
