//! Literal construction: datatype sniffing for `<time>`/`@datetime`,
//! language tags, XML literals, and lexical validation.

use rstest::rstest;

mod utils;

#[rstest]
#[case("2011-06-28Z", "http://www.w3.org/2001/XMLSchema#date")]
#[case("00:00:00Z", "http://www.w3.org/2001/XMLSchema#time")]
#[case("2011-06-28T00:00:00Z", "http://www.w3.org/2001/XMLSchema#dateTime")]
#[case("2011-06-28T00:00:00-08:00", "http://www.w3.org/2001/XMLSchema#dateTime")]
#[case("2011", "http://www.w3.org/2001/XMLSchema#gYear")]
#[case("2011-06", "http://www.w3.org/2001/XMLSchema#gYearMonth")]
#[case("P2011Y06M28DT00H00M00S", "http://www.w3.org/2001/XMLSchema#duration")]
fn datetime_datatype_is_sniffed(#[case] datetime: &str, #[case] datatype: &str) {
    let html = format!(
        r#"<!DOCTYPE html>
        <html><body>
          <time property="rdf:value" datetime="{datetime}">whenever</time>
        </body></html>"#
    );
    let ttl = format!(
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        <> rdf:value "{datetime}"^^<{datatype}> ."#
    );
    utils::assert_graph(&html, &ttl);
}

#[test]
fn datetime_not_matching_any_pattern_stays_plain() {
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html><body>
          <time property="rdf:value" datetime="foo">Foo</time>
        </body></html>"#,
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        <> rdf:value "foo" ."#,
    );
}

#[test]
fn datetime_not_matching_keeps_language() {
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html><body>
          <time property="rdf:value" lang="en" datetime="D-Day">Foo</time>
        </body></html>"#,
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        <> rdf:value "D-Day"@en ."#,
    );
}

#[test]
fn explicit_datatype_overrides_datetime_sniffing() {
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html><body>
          <time property="rdf:value" datetime="2012-03-18T00:00:00Z" datatype="xsd:string">whenever</time>
        </body></html>"#,
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        <> rdf:value "2012-03-18T00:00:00Z"^^xsd:string ."#,
    );
}

#[test]
fn content_overrides_datetime() {
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html><body>
          <time property="rdf:value" datetime="2012-03-18" content="this">18 March 2012</time>
        </body></html>"#,
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        <> rdf:value "this" ."#,
    );
}

#[test]
fn time_element_text_is_sniffed() {
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html><body>
          <time property="rdf:value">2012-03-18</time>
        </body></html>"#,
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        <> rdf:value "2012-03-18"^^xsd:date ."#,
    );
}

#[test]
fn nearest_ancestor_language_tags_the_literal() {
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html lang="en"><body>
          <span about="" property="dc:title">Title</span>
          <span about="" property="dc:description" lang="de">Titel</span>
        </body></html>"#,
        r#"@prefix dc: <http://purl.org/dc/terms/> .
        <> dc:title "Title"@en ;
           dc:description "Titel"@de ."#,
    );
}

#[test]
fn empty_datatype_forces_plain_literal() {
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html><body>
          <time property="rdf:value" datatype="" datetime="2012-03-18">x</time>
        </body></html>"#,
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        <> rdf:value "2012-03-18" ."#,
    );
}

#[test]
fn xml_literal_serializes_child_markup() {
    utils::assert_graph(
        r#"<!DOCTYPE html>
        <html><body>
          <div about="" property="rdf:value" datatype="rdf:XMLLiteral">A <b>bold</b> move</div>
        </body></html>"#,
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        <> rdf:value "A <b>bold</b> move"^^rdf:XMLLiteral ."#,
    );
}

#[rstest]
#[case("xsd:boolean", "foo")]
#[case("xsd:date", "2011-07")]
#[case("xsd:date", "2010-1-1")]
#[case("xsd:dateTime", "2010-01-01")]
#[case("xsd:decimal", "12.xyz")]
#[case("xsd:double", "xy.z")]
#[case("xsd:integer", "+1.0z")]
#[case("xsd:time", "00:00")]
fn malformed_literal_kept_verbatim_without_validation(#[case] datatype: &str, #[case] value: &str) {
    let html = format!(
        r#"<!DOCTYPE html>
        <html><body>
          <span about="" property="rdf:value" datatype="{datatype}" content="{value}"></span>
        </body></html>"#
    );
    let datatype_iri = datatype.replace("xsd:", "http://www.w3.org/2001/XMLSchema#");
    let ttl = format!(
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        <> rdf:value "{value}"^^<{datatype_iri}> ."#
    );
    utils::assert_graph(&html, &ttl);
}

#[rstest]
#[case("xsd:boolean", "foo")]
#[case("xsd:date", "2011-07")]
#[case("xsd:dateTime", "2010-01-01")]
#[case("xsd:decimal", "12.xyz")]
#[case("xsd:double", "xy.z")]
#[case("xsd:integer", "+1.0z")]
#[case("xsd:time", "00:00")]
fn malformed_literal_is_fatal_when_validating(#[case] datatype: &str, #[case] value: &str) {
    let html = format!(
        r#"<!DOCTYPE html>
        <html><body>
          <span about="" property="rdf:value" datatype="{datatype}" content="{value}"></span>
        </body></html>"#
    );

    let mut options = utils::default_options();
    options.validate = true;

    let result = rdfa_distill::distill(&html, options);
    assert!(matches!(
        result,
        Err(rdfa_distill::Error::InvalidLiteral { .. })
    ));
}

#[test]
fn valid_literal_passes_validation() {
    let html = r#"<!DOCTYPE html>
        <html><body>
          <span about="" property="rdf:value" datatype="xsd:date" content="2011-07-01"></span>
        </body></html>"#;

    let mut options = utils::default_options();
    options.validate = true;

    utils::assert_graph_with(
        html,
        options,
        r#"@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        <> rdf:value "2011-07-01"^^xsd:date ."#,
    );
}
