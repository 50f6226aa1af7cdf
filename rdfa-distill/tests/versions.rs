//! RDFa 1.0 / 1.1 rule differences and host-language selection.

use rdfa_distill::{GraphSelection, HostLanguage, Version};

mod utils;

fn options_1_0(host: HostLanguage) -> rdfa_distill::Options {
    let mut options = utils::default_options();
    options.version = Version::Rdfa1_0;
    options.host_language = host;
    options
}

#[test]
fn rdfa_1_0_auto_xml_literal_for_markup_content() {
    utils::assert_graph_with(
        r#"<!DOCTYPE html>
        <html><body>
          <div about="" property="rdf:value">A <b>bold</b> move</div>
        </body></html>"#,
        options_1_0(HostLanguage::Xhtml1),
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        <> rdf:value "A <b>bold</b> move"^^rdf:XMLLiteral ."#,
    );
}

#[test]
fn rdfa_1_1_keeps_markup_content_plain() {
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html><body>
          <div about="" property="rdf:value">A <b>bold</b> move</div>
        </body></html>"#,
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        <> rdf:value "A bold move" ."#,
    );
}

#[test]
fn rdfa_1_0_ignores_prefix_attribute() {
    let source = r#"<!DOCTYPE html>
    <html prefix="ex: http://example/x#"><body>
      <span about="" property="ex:p">V</span>
    </body></html>"#;

    let mut options = options_1_0(HostLanguage::Xhtml1);
    options.rdfagraph = GraphSelection::both();

    let statements: Vec<_> = rdfa_distill::distill(source, options)
        .unwrap()
        .into_iter()
        .collect();

    assert!(
        statements
            .iter()
            .all(|s| s.graph == rdfa_distill::GraphName::Processor)
    );
}

#[test]
fn rdfa_1_0_honors_xmlns_prefixes() {
    utils::assert_graph_with(
        r#"<!DOCTYPE html>
        <html xmlns:ex="http://example/x#"><body>
          <span about="" property="ex:p">V</span>
        </body></html>"#,
        options_1_0(HostLanguage::Xhtml1),
        r#"<> <http://example/x#p> "V" ."#,
    );
}

#[test]
fn rdfa_1_0_terms_match_case_insensitively() {
    utils::assert_graph_with(
        r#"<!DOCTYPE html>
        <html><body>
          <span about="" rel="NEXT" href="http://example/n">next</span>
        </body></html>"#,
        options_1_0(HostLanguage::Xhtml1),
        r#"@prefix xhv: <http://www.w3.org/1999/xhtml/vocab#> .
        <> xhv:next <http://example/n> ."#,
    );
}

#[test]
fn rdfa_1_0_ignores_vocab() {
    let source = r#"<!DOCTYPE html>
    <html><body vocab="http://schema.org/">
      <span about="" property="name">V</span>
    </body></html>"#;

    let mut options = options_1_0(HostLanguage::Xhtml1);
    options.rdfagraph = GraphSelection::both();

    let statements: Vec<_> = rdfa_distill::distill(source, options)
        .unwrap()
        .into_iter()
        .collect();

    // no usesVocabulary, no vocabulary-minted property
    assert!(
        statements
            .iter()
            .all(|s| s.graph == rdfa_distill::GraphName::Processor)
    );
}

#[test]
fn html5_terms_are_the_core_initial_context() {
    // `license` is a term in both eras; `stylesheet` is XHTML1-only.
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html><body>
          <a about="" rel="license" href="http://example/l">license</a>
        </body></html>"#,
        r#"@prefix xhv: <http://www.w3.org/1999/xhtml/vocab#> .
        <> xhv:license <http://example/l> ."#,
    );
}

#[test]
fn xml_host_honors_xml_base() {
    let mut options = utils::default_options();
    options.host_language = HostLanguage::Svg;

    utils::assert_graph_with(
        r#"<svg xml:base="http://svg.example/dir/">
          <desc about="shape" property="dc:title">A shape</desc>
        </svg>"#,
        options,
        r#"@prefix dc: <http://purl.org/dc/terms/> .
        <http://svg.example/dir/shape> dc:title "A shape" ."#,
    );
}
