//! Vocabulary expansion: entailment of additional statements from
//! precomputed `rdfs:subClassOf`/`rdfs:subPropertyOf` closures of known
//! vocabularies.
//!
//! Closures are plain read-only data keyed by namespace IRI, loaded once and
//! never mutated, so they are safe to share between parses running on
//! different threads. The pairs are already transitive; expansion is a
//! single pass, not a fixed point.

use std::collections::HashSet;

use oxrdf::vocab::rdf;
use oxrdf::{NamedNode, Term, Triple};

use crate::{GraphName, Statement};

pub(crate) struct VocabularyClosure {
    pub namespace: &'static str,
    pub sub_classes: &'static [(&'static str, &'static str)],
    pub sub_properties: &'static [(&'static str, &'static str)],
}

const FOAF: &str = "http://xmlns.com/foaf/0.1/";

static CLOSURES: &[VocabularyClosure] = &[VocabularyClosure {
    namespace: FOAF,
    sub_classes: &[
        ("http://xmlns.com/foaf/0.1/Person", "http://xmlns.com/foaf/0.1/Agent"),
        ("http://xmlns.com/foaf/0.1/Person", "http://www.w3.org/2000/10/swap/pim/contact#Person"),
        ("http://xmlns.com/foaf/0.1/Person", "http://www.w3.org/2003/01/geo/wgs84_pos#SpatialThing"),
        ("http://xmlns.com/foaf/0.1/Organization", "http://xmlns.com/foaf/0.1/Agent"),
        ("http://xmlns.com/foaf/0.1/Group", "http://xmlns.com/foaf/0.1/Agent"),
        ("http://xmlns.com/foaf/0.1/Image", "http://xmlns.com/foaf/0.1/Document"),
        ("http://xmlns.com/foaf/0.1/PersonalProfileDocument", "http://xmlns.com/foaf/0.1/Document"),
        ("http://xmlns.com/foaf/0.1/OnlineAccount", "http://www.w3.org/2002/07/owl#Thing"),
        ("http://xmlns.com/foaf/0.1/OnlineGamingAccount", "http://xmlns.com/foaf/0.1/OnlineAccount"),
        ("http://xmlns.com/foaf/0.1/OnlineGamingAccount", "http://www.w3.org/2002/07/owl#Thing"),
        ("http://xmlns.com/foaf/0.1/OnlineEcommerceAccount", "http://xmlns.com/foaf/0.1/OnlineAccount"),
        ("http://xmlns.com/foaf/0.1/OnlineEcommerceAccount", "http://www.w3.org/2002/07/owl#Thing"),
        ("http://xmlns.com/foaf/0.1/OnlineChatAccount", "http://xmlns.com/foaf/0.1/OnlineAccount"),
        ("http://xmlns.com/foaf/0.1/OnlineChatAccount", "http://www.w3.org/2002/07/owl#Thing"),
    ],
    sub_properties: &[
        ("http://xmlns.com/foaf/0.1/aimChatID", "http://xmlns.com/foaf/0.1/nick"),
        ("http://xmlns.com/foaf/0.1/skypeID", "http://xmlns.com/foaf/0.1/nick"),
        ("http://xmlns.com/foaf/0.1/icqChatID", "http://xmlns.com/foaf/0.1/nick"),
        ("http://xmlns.com/foaf/0.1/yahooChatID", "http://xmlns.com/foaf/0.1/nick"),
        ("http://xmlns.com/foaf/0.1/msnChatID", "http://xmlns.com/foaf/0.1/nick"),
        ("http://xmlns.com/foaf/0.1/name", "http://www.w3.org/2000/01/rdf-schema#label"),
        ("http://xmlns.com/foaf/0.1/homepage", "http://xmlns.com/foaf/0.1/page"),
        ("http://xmlns.com/foaf/0.1/homepage", "http://xmlns.com/foaf/0.1/isPrimaryTopicOf"),
        ("http://xmlns.com/foaf/0.1/weblog", "http://xmlns.com/foaf/0.1/page"),
        ("http://xmlns.com/foaf/0.1/openid", "http://xmlns.com/foaf/0.1/isPrimaryTopicOf"),
        ("http://xmlns.com/foaf/0.1/openid", "http://xmlns.com/foaf/0.1/page"),
        ("http://xmlns.com/foaf/0.1/tipjar", "http://xmlns.com/foaf/0.1/page"),
        ("http://xmlns.com/foaf/0.1/img", "http://xmlns.com/foaf/0.1/depiction"),
        ("http://xmlns.com/foaf/0.1/isPrimaryTopicOf", "http://xmlns.com/foaf/0.1/page"),
    ],
}];

fn class_supers(class: &NamedNode) -> impl Iterator<Item = NamedNode> + '_ {
    CLOSURES
        .iter()
        .filter(|closure| class.as_str().starts_with(closure.namespace))
        .flat_map(|closure| closure.sub_classes.iter())
        .filter(|(sub, _)| *sub == class.as_str())
        .map(|(_, superclass)| NamedNode::new_unchecked(superclass.to_string()))
}

fn property_supers(property: &NamedNode) -> impl Iterator<Item = NamedNode> + '_ {
    CLOSURES
        .iter()
        .filter(|closure| property.as_str().starts_with(closure.namespace))
        .flat_map(|closure| closure.sub_properties.iter())
        .filter(|(sub, _)| *sub == property.as_str())
        .map(|(_, superproperty)| NamedNode::new_unchecked(superproperty.to_string()))
}

/// Adds the entailed statements for every `rdf:type` and property usage in
/// the output stream. Additions are deduplicated against statements already
/// present.
pub(crate) fn expand(statements: &mut Vec<Statement>) {
    let mut seen: HashSet<Triple> = statements
        .iter()
        .filter(|statement| statement.graph == GraphName::Output)
        .map(|statement| statement.triple.clone())
        .collect();

    let mut additions = Vec::new();
    for statement in statements.iter() {
        if statement.graph != GraphName::Output {
            continue;
        }
        let triple = &statement.triple;

        if triple.predicate.as_ref() == rdf::TYPE {
            if let Term::NamedNode(class) = &triple.object {
                for superclass in class_supers(class) {
                    let entailed =
                        Triple::new(triple.subject.clone(), rdf::TYPE, superclass);
                    if seen.insert(entailed.clone()) {
                        additions.push(entailed);
                    }
                }
            }
        }

        for superproperty in property_supers(&triple.predicate) {
            let entailed = Triple::new(
                triple.subject.clone(),
                superproperty,
                triple.object.clone(),
            );
            if seen.insert(entailed.clone()) {
                additions.push(entailed);
            }
        }
    }

    statements.extend(additions.into_iter().map(|triple| Statement {
        triple,
        graph: GraphName::Output,
    }));
}
