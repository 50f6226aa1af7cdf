//! Vocabulary expansion over the precomputed FOAF closure.

mod utils;

const SOURCE: &str = r##"<!DOCTYPE html>
<html><body>
  <div about="#me" typeof="foaf:Person">
    <span property="foaf:name">Gregg Kellogg</span>
  </div>
</body></html>"##;

#[test]
fn expansion_disabled_by_default() {
    utils::assert_graph(
        SOURCE,
        r#"@prefix foaf: <http://xmlns.com/foaf/0.1/> .
        <#me> a foaf:Person ;
              foaf:name "Gregg Kellogg" ."#,
    );
}

#[test]
fn subclass_and_subproperty_closures_entail_statements() {
    let mut options = utils::default_options();
    options.vocab_expansion = true;

    utils::assert_graph_with(
        SOURCE,
        options,
        r#"@prefix foaf: <http://xmlns.com/foaf/0.1/> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        <#me> a foaf:Person,
              foaf:Agent,
              <http://www.w3.org/2000/10/swap/pim/contact#Person>,
              <http://www.w3.org/2003/01/geo/wgs84_pos#SpatialThing> ;
           foaf:name "Gregg Kellogg" ;
           rdfs:label "Gregg Kellogg" ."#,
    );
}

#[test]
fn expansion_only_touches_known_namespaces() {
    let source = r##"<!DOCTYPE html>
    <html><body>
      <div about="#x" typeof="schema:Thing">
        <span property="schema:name">Thing</span>
      </div>
    </body></html>"##;

    let mut options = utils::default_options();
    options.vocab_expansion = true;

    utils::assert_graph_with(
        source,
        options,
        r#"@prefix schema: <http://schema.org/> .
        <#x> a schema:Thing ;
             schema:name "Thing" ."#,
    );
}

#[test]
fn transitive_pairs_come_from_the_closure_data() {
    let source = r##"<!DOCTYPE html>
    <html><body>
      <div about="#acct" typeof="foaf:OnlineChatAccount"></div>
    </body></html>"##;

    let mut options = utils::default_options();
    options.vocab_expansion = true;

    utils::assert_graph_with(
        source,
        options,
        r#"@prefix foaf: <http://xmlns.com/foaf/0.1/> .
        <#acct> a foaf:OnlineChatAccount,
                foaf:OnlineAccount,
                <http://www.w3.org/2002/07/owl#Thing> ."#,
    );
}
