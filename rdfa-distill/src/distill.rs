//! The distillation engine: a depth-first, context-propagating walk over the
//! element tree that turns RDFa attributes into statements.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::str::FromStr;

use icu::locale::LanguageIdentifier;
use itertools::Itertools;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Term, Triple};
use scraper::{ElementRef, Html};
use vec1::{Size0Error, Vec1};

use crate::context::{Attr, EvaluationContext, IncompleteTriple, LocalScope};
use crate::host::Version;
use crate::literal::LiteralBuilder;
use crate::vocab::{dc, rdfa, xhv};
use crate::{
    Distillation, Error, GraphName, Options, PGType, Statement, expansion, trace,
};

/// Runs the distillation over a whole document.
///
/// A `Distiller` is single-use: build one per parse, optionally attach a
/// processor callback, and call [`Distiller::distill`].
pub struct Distiller<'cb> {
    options: Options,
    statements: RefCell<Vec<Statement>>,
    callback: RefCell<Option<Box<dyn FnMut(&Triple) + 'cb>>>,
    vocabularies: RefCell<HashSet<NamedNode>>,
    document_subject: RefCell<Option<NamedNode>>,
}

enum Relation {
    Forward(NamedNode),
    Reverse(NamedNode),
    List(NamedNode),
}

/// Which RDFa attributes are present on this element, and what their values
/// resolved to, before any of the subject/object decision steps run.
struct ElementAttrs<'a> {
    content: Option<&'a str>,
    inlist: bool,
    property: Attr<Vec1<NamedNode>>,
    relations: Option<Vec<Relation>>,
    type_of: Attr<Vec1<NamedOrBlankNode>>,
    about: Attr<Rc<NamedOrBlankNode>>,
    resource_present: bool,
    resource_value: Option<Rc<NamedOrBlankNode>>,
    datatype: Attr<NamedNode>,
}

impl<'cb> Distiller<'cb> {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            statements: RefCell::new(Vec::new()),
            callback: RefCell::new(None),
            vocabularies: RefCell::new(HashSet::new()),
            document_subject: RefCell::new(None),
        }
    }

    /// Attaches a sink invoked with each processor-graph triple as it is
    /// produced, independent of the configured graph selection.
    pub fn with_processor_callback(self, callback: impl FnMut(&Triple) + 'cb) -> Self {
        *self.callback.borrow_mut() = Some(Box::new(callback));
        self
    }

    pub fn distill(self, input: &str) -> Result<Distillation, Error> {
        let doc = Html::parse_document(input);
        if let Some(err) = doc.errors.first() {
            self.report(
                PGType::Error,
                &format!("Markup is not well-formed: {err}"),
            );
        }

        let mut base = self.options.base.clone();
        if !self.options.host_language.is_xml() {
            let base_sel = scraper::selector::Selector::parse("html>head>base").unwrap();
            if let Some(base_el) = doc.select(&base_sel).next() {
                if let Some(href) = base_el.attr("href") {
                    base = base.resolve(href).map_err(|source| Error::IriParseError {
                        source,
                        iri: href.to_string(),
                    })?;
                    trace!("<base> found: {base}");
                }
            }
        }

        *self.document_subject.borrow_mut() = Some(NamedNode::new_unchecked(
            base.resolve("").unwrap().into_inner(),
        ));

        let eval_context = EvaluationContext::new(&self.options, base);
        self.traverse(&eval_context, doc.root_element())?;

        self.property_copying();

        let selection = self.options.rdfagraph;
        let mut statements = self.statements.into_inner();
        if self.options.vocab_expansion {
            expansion::expand(&mut statements);
        }

        Ok(Distillation {
            statements,
            selection,
        })
    }

    fn traverse(&self, eval_context: &EvaluationContext, element: ElementRef) -> Result<(), Error> {
        if self.graph_island(eval_context, element) {
            return Ok(());
        }

        let child_context = self.process_element(eval_context, element)?;

        for child in element.children() {
            if let Some(child) = ElementRef::wrap(child) {
                self.traverse(&child_context, child)?;
            }
        }

        // [rdfa-core] 7.5: 14.
        // “For each IRI in the local list mapping, if the equivalent list
        //  does not exist in the evaluation context, indicating that the
        //  list was originally instantiated on the current element, use the
        //  list as follows:
        //
        // A mapping freshly allocated here is complete once the subtree has
        // been processed; this frame owns it and emits its lists.
        if !Rc::ptr_eq(&child_context.list_mapping, &eval_context.list_mapping) {
            self.finalize_lists(&child_context);
        }

        Ok(())
    }

    fn finalize_lists(&self, ctx: &EvaluationContext) {
        for (predicate, list) in ctx.list_mapping.borrow().iter() {
            // “If there are zero items in the list associated with the IRI,
            //  generate a triple pointing at rdf:nil.
            let mut rest: NamedOrBlankNode = rdf::NIL.into_owned().into();
            for item in list.borrow().iter().rev() {
                let node = BlankNode::default();
                self.emit_output(Triple::new(
                    node.clone(),
                    rdf::FIRST,
                    item.as_ref().clone(),
                ));
                self.emit_output(Triple::new(node.clone(), rdf::REST, as_term(&rest)));
                rest = node.into();
            }
            self.emit_output(Triple::new(
                as_subject(&ctx.parent_subject),
                predicate.clone(),
                as_term(&rest),
            ));
        }
    }

    /// Recognizes `<script>` elements embedding a foreign graph syntax.
    /// Their content is handed to the parser for that syntax and merged into
    /// the output; the subtree gets no further RDFa processing.
    fn graph_island(&self, eval_context: &EvaluationContext, element: ElementRef) -> bool {
        if element.value().name() != "script" {
            return false;
        }
        let Some(media_type) = element.value().attr("type") else {
            return false;
        };
        let media_type = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let turtle = match media_type.as_str() {
            "text/turtle" | "application/turtle" | "application/x-turtle" => true,
            "text/ntriples" | "application/n-triples" => false,
            _ => return false,
        };

        let text = element.text().join("");
        let text = strip_cdata(&text);

        let mut merged = 0usize;
        let result: Result<(), String> = if turtle {
            match oxttl::TurtleParser::new().with_base_iri(eval_context.base.as_str()) {
                Ok(parser) => parser
                    .for_slice(text.as_bytes())
                    .try_for_each(|triple| match triple {
                        Ok(triple) => {
                            self.emit_output(triple);
                            merged += 1;
                            Ok(())
                        }
                        Err(err) => Err(err.to_string()),
                    }),
                Err(err) => Err(err.to_string()),
            }
        } else {
            oxttl::NTriplesParser::new()
                .for_slice(text.as_bytes())
                .try_for_each(|triple| match triple {
                    Ok(triple) => {
                        self.emit_output(triple);
                        merged += 1;
                        Ok(())
                    }
                    Err(err) => Err(err.to_string()),
                })
        };

        match result {
            Ok(()) => self.report(
                PGType::Info,
                &format!("Merged {merged} statements from embedded {media_type} graph"),
            ),
            Err(err) => self.report(
                PGType::Error,
                &format!("Embedded {media_type} graph could not be parsed: {err}"),
            ),
        }

        true
    }

    fn emit_output(&self, triple: Triple) {
        trace!("- Emitting output triple: {triple}");
        self.statements.borrow_mut().push(Statement {
            triple,
            graph: GraphName::Output,
        });
    }

    fn report(&self, pg_type: PGType, message: &str) {
        let subject = BlankNode::default();
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let triples = [
            Triple::new(subject.clone(), rdf::TYPE, pg_type.iri().into_owned()),
            Triple::new(
                subject.clone(),
                dc::DESCRIPTION.into_owned(),
                Literal::new_simple_literal(message),
            ),
            Triple::new(
                subject,
                dc::DATE.into_owned(),
                Literal::new_typed_literal(today, xsd::DATE),
            ),
        ];

        for triple in triples {
            trace!("- Emitting processor triple: {triple}");
            if let Some(callback) = self.callback.borrow_mut().as_mut() {
                callback(&triple);
            }
            self.statements.borrow_mut().push(Statement {
                triple,
                graph: GraphName::Processor,
            });
        }
    }

    /// Emits `usesVocabulary` once per distinct `@vocab` IRI.
    fn record_vocabulary(&self, vocabulary: &NamedNode) {
        if self.vocabularies.borrow_mut().insert(vocabulary.clone()) {
            let document = self
                .document_subject
                .borrow()
                .clone()
                .expect("document subject is set before traversal");
            self.emit_output(Triple::new(
                document,
                rdfa::USES_VOCABULARY.into_owned(),
                vocabulary.clone(),
            ));
        }
    }

    fn process_element(
        &self,
        eval_context: &EvaluationContext,
        element: ElementRef,
    ) -> Result<EvaluationContext, Error> {
        let report = |pg_type: PGType, message: String| self.report(pg_type, &message);

        let el = element.value();
        let version = self.options.version;
        let host = self.options.host_language;

        // The root element is the only one processed without a parent
        // object.
        let is_root = eval_context.parent_object.is_none();

        if cfg!(debug_assertions) {
            let attrs = el.attrs().map(|(n, v)| format!("@{n}='{v}'")).join(" ");
            trace!("<{}> {attrs}", el.name());
        }

        // [rdfa-core] 7.5: 1.
        let mut local = LocalScope::new(eval_context, version, &report);

        // xml:base rebases the subtree in XML-family host languages.
        if host.is_xml() {
            if let Some(xml_base) = qualified_attr(el, "xml:base") {
                match local.base.resolve(xml_base) {
                    Ok(resolved) => {
                        trace!("- xml:base is now: {resolved}");
                        local.base = resolved.resolve("").unwrap();
                    }
                    Err(err) => {
                        report(PGType::Warning, format!("Invalid xml:base ({xml_base}): {err}"));
                    }
                }
            }
        }

        // [rdfa-core] 7.5: 2.
        // > Next the current element is examined for any change to the
        // > default vocabulary via @vocab.
        if version.is_1_1() {
            if let Some(vocab) = el.attr("vocab") {
                if vocab.is_empty() {
                    trace!("- @vocab is empty, resetting default vocabulary");
                    // > If the value is empty, then the local default
                    // > vocabulary MUST be reset to the Host Language
                    // > defined default (if any).
                    local.default_vocab = host.default_vocabulary();
                } else if let Ok(vocab) = local.resolve_relative_iri(vocab) {
                    trace!("- default vocabulary is now: {vocab}");
                    self.record_vocabulary(&vocab);
                    local.default_vocab = Some(vocab);
                }
            }
        }

        // 3.
        // “Next, the current element is examined for IRI mappings and these
        //  are added to the local list of IRI mappings. Note that an IRI
        //  mapping will simply overwrite any current mapping in the list
        //  that has the same name.
        let xmlns_prefixes = el
            .attrs
            .iter()
            .filter_map(|(qn, val)| {
                if qn.prefix.as_deref() == Some("xmlns") {
                    Some((qn.local.as_ref(), val.as_ref()))
                } else {
                    // HTML parsing leaves the whole qualified name in the
                    // local part.
                    (*qn.local).strip_prefix("xmlns:").map(|p| (p, val.as_ref()))
                }
            })
            .collect::<Vec<(&str, &str)>>();

        let prefixes = if version.is_1_1() {
            el.attr("prefix")
                .map(|x| {
                    x.split_ascii_whitespace()
                        .tuples()
                        .map(|(prefix, value)| {
                            if let Some(prefix) = prefix.strip_suffix(':') {
                                Ok((prefix, value))
                            } else {
                                Err(Error::NoColonPrefix)
                            }
                        })
                        .collect::<Result<Vec<_>, Error>>()
                })
                .transpose()?
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        if !xmlns_prefixes.is_empty() || !prefixes.is_empty() {
            let mut mappings = Rc::unwrap_or_clone(local.iri_mappings);
            // a "no prefix" mapping is never set: that is a MUST NOT

            // @xmlns:* first, then @prefix, so @prefix wins on conflict
            for (prefix, iri) in xmlns_prefixes.into_iter().chain(prefixes) {
                if mappings.add_prefix(prefix, iri).is_err() {
                    report(
                        PGType::Warning,
                        format!("Cannot map prefix `{prefix}`: the prefix is reserved"),
                    );
                }
            }

            local.iri_mappings = Rc::new(mappings);
        }

        // 4. Language
        // “The current element is also parsed for any language information,
        //  and if present, current language is set accordingly.
        let lang_attr = if host.is_xml() {
            qualified_attr(el, "xml:lang")
        } else {
            qualified_attr(el, "xml:lang").or(el.attr("lang"))
        };
        if let Some(lang) = lang_attr {
            if lang.is_empty() {
                local.current_language = None;
            } else {
                match LanguageIdentifier::from_str(lang) {
                    Ok(lang) => {
                        trace!("- current language is now: {lang}");
                        local.current_language = Some(Rc::new(lang));
                    }
                    Err(err) => {
                        report(
                            PGType::Warning,
                            format!("Invalid language identifier ({lang}): {err}"),
                        );
                    }
                }
            }
        }

        let attrs = gather_attrs(element, &local, version);

        // [role-attribute]
        // > Each value of @role forms a triple with the `role` term of the
        // > XHTML vocabulary as its predicate. If @id is present, it
        // > supplies the subject by concatenating the base, '#', and its
        // > value; otherwise the subject is a unique newly created bnode.
        if let Some(role) = el.attr("role") {
            let role_subject: NamedOrBlankNode = if let Some(id) = el.attr("id") {
                NamedNode::new(local.base.to_string() + "#" + id)
                    .map(Into::into)
                    .unwrap_or_else(|_| BlankNode::default().into())
            } else {
                BlankNode::default().into()
            };

            // > An RDFa Processor MUST behave as if there is an in-scope
            // > vocabulary of http://www.w3.org/1999/xhtml/vocab# for the
            // > value(s) of the @role attribute.
            let role_scope = LocalScope {
                default_vocab: Some(NamedNode::new_unchecked(xhv::VOCABULARY.to_string())),
                ..local.clone()
            };

            for role in role_scope.many_term_or_curie_or_absiri(role) {
                self.emit_output(Triple::new(
                    as_subject(&role_subject),
                    xhv::ROLE.into_owned(),
                    as_term(&role),
                ));
            }
        }

        // 5.
        // “If the current element contains no @rel or @rev attribute, then
        //  the next step is to establish a value for new subject.
        if attrs.relations.is_none() {
            // 5.1
            // “If the current element contains the @property attribute, but
            //  does not contain either the @content or @datatype attributes.
            if version.is_1_1()
                && attrs.property.is_present()
                && attrs.content.is_none()
                && !attrs.datatype.is_present()
            {
                // > by using the resource from @about, if present,
                if let Some(about) = attrs.about.value() {
                    trace!("- Using @about as new subject");
                    local.new_subject = Some(about.clone());
                }
                // > otherwise, if the element is the root element of the
                // > document, then act as if there is an empty @about
                // > present,
                else if is_root {
                    trace!("- Using empty @about as new subject");
                    local.new_subject = Some(Rc::new(local.empty_curie().into()));
                }
                // > otherwise, if parent object is present, new subject is
                // > set to the value of parent object.
                else if eval_context.parent_object.is_some() {
                    local.new_subject = eval_context.parent_object.clone();
                }

                // “If @typeof is present then typed resource is set to the
                //  resource obtained from the first match from the
                //  following rules:
                if attrs.type_of.is_present() {
                    if let Some(about) = attrs.about.value() {
                        local.typed_resource = Some(about.clone());
                    } else if is_root {
                        local.typed_resource = Some(Rc::new(local.empty_curie().into()));
                    } else {
                        // “by using @resource/@href/@src, otherwise a newly
                        //  created bnode.
                        let typed_resource = if let Some(resource) = &attrs.resource_value {
                            resource.clone()
                        } else {
                            trace!("- Using new blank node as typed resource");
                            Rc::new(BlankNode::default().into())
                        };

                        // “The value of the current object resource is then
                        //  set to the value of typed resource.
                        local.typed_resource = Some(typed_resource.clone());
                        local.current_object_resource = Some(typed_resource);
                    }
                }
            }
            // 5.2: “otherwise:
            else {
                // [html-rdfa] extension #8
                let is_head_or_body =
                    !host.is_xml() && (el.name() == "head" || el.name() == "body");

                // > If the element contains an @about, @href, @src, or
                // > @resource attribute, new subject is set to the resource
                // > obtained as follows:
                if attrs.about.is_present() || attrs.resource_present {
                    if let Some(about) = attrs.about.value() {
                        trace!("- Using @about as new subject");
                        local.new_subject = Some(about.clone());
                    } else if let Some(resource) = &attrs.resource_value {
                        trace!("- Using @resource/@href/@src as new subject");
                        local.new_subject = Some(resource.clone());
                    }
                }

                // [html-rdfa] extension #8: head and body inherit the
                // parent object when no resource attribute provides an IRI.
                if local.new_subject.is_none() && is_head_or_body {
                    local.new_subject = eval_context.parent_object.clone();
                }

                // > otherwise, if no resource is provided by a resource
                // > attribute, then the first match from the following rules
                // > will apply:
                if local.new_subject.is_none() {
                    // > if the element is the root element of the document,
                    // > then act as if there is an empty @about present;
                    if is_root {
                        local.new_subject = Some(Rc::new(local.empty_curie().into()));
                    }
                    // > otherwise, if @typeof is present, then new subject
                    // > is set to be a newly created bnode;
                    else if attrs.type_of.is_present() {
                        local.new_subject = Some(Rc::new(BlankNode::default().into()));
                    }
                    // > otherwise, if parent object is present, new subject
                    // > is set to the value of parent object. Additionally,
                    // > if @property is not present then the skip element
                    // > flag is set to 'true'.
                    else if eval_context.parent_object.is_some() {
                        local.new_subject = eval_context.parent_object.clone();

                        if !attrs.property.is_present() {
                            trace!("- Skip element set to 'true' (no @property).");
                            local.skip_element = true;
                        }
                    }

                    debug_assert!(local.new_subject.is_some());
                }

                // “Finally, if @typeof is present, set the typed resource
                //  to the value of new subject.
                if attrs.type_of.is_present() {
                    local.typed_resource = local.new_subject.clone();
                }
            }
        }
        // 6.
        // > If the current element does contain a @rel or @rev attribute,
        // > then the next step is to establish both a value for new subject
        // > and a value for current object resource.
        else {
            if let Some(about) = attrs.about.value() {
                trace!("- Using @about as new subject");
                local.new_subject = Some(about.clone());

                // “if the @typeof attribute is present, set typed resource
                //  to new subject.
                if attrs.type_of.is_present() {
                    local.typed_resource = local.new_subject.clone();
                }
            }

            // “If no resource is provided then the first match from the
            //  following rules will apply:
            if local.new_subject.is_none() {
                if is_root {
                    local.new_subject = Some(Rc::new(local.empty_curie().into()));
                } else {
                    local.new_subject = eval_context.parent_object.clone();
                }
            }

            // > Then the current object resource is set to the resource
            // > obtained from the first match from the following rules:
            if let Some(resource) = &attrs.resource_value {
                local.current_object_resource = Some(resource.clone());
            }
            // “otherwise, if @typeof is present and @about is not, use a
            //  newly created bnode.
            else if attrs.type_of.is_present() && !attrs.about.is_present() {
                local.current_object_resource = Some(Rc::new(BlankNode::default().into()));
            }

            // “If @typeof is present and @about is not, set typed resource
            //  to current object resource.
            if attrs.type_of.is_present() && !attrs.about.is_present() {
                local.typed_resource = local.current_object_resource.clone();
            }

            debug_assert!(local.new_subject.is_some());
        }

        // 7.
        // “If in any of the previous steps a typed resource was set to a
        //  non-null value, it is now used to provide a subject for type
        //  values.
        if let Some(typed_resource) = local.typed_resource.as_deref() {
            if let Some(type_of) = attrs.type_of.value() {
                for type_iri in type_of {
                    self.emit_output(Triple::new(
                        as_subject(typed_resource),
                        rdf::TYPE,
                        as_term(type_iri),
                    ));
                }
            }
        }

        // 8.
        // “If in any of the previous steps a new subject was set to a
        //  non-null value different from the parent object, the list
        //  mapping taken from the evaluation context is set to a new, empty
        //  mapping.
        if let Some(new_subject) = &local.new_subject {
            if Some(new_subject) != eval_context.parent_object.as_ref() {
                trace!("- Setting new list mapping");
                local.list_mappings = Default::default();
            }
        }

        // 9.
        // “If in any of the previous steps a current object resource was
        //  set to a non-null value, it is now used to generate triples and
        //  add entries to the local list mapping.
        if let Some(current_object_resource) = local.current_object_resource.clone() {
            if let Some(relations) = &attrs.relations {
                let term: Rc<Term> = Rc::new(as_term(&current_object_resource));
                for relation in relations {
                    match relation {
                        // > If the element contains both the @inlist and
                        // > the @rel attributes, each resource adds an
                        // > entry to the list mapping.
                        Relation::List(predicate) => {
                            local
                                .list_mappings
                                .borrow_mut()
                                .insert_value(predicate.clone(), term.clone());
                        }
                        Relation::Forward(predicate) => {
                            self.emit_output(Triple::new(
                                as_subject(local.new_subject.as_deref().unwrap()),
                                predicate.clone(),
                                as_term(&current_object_resource),
                            ));
                        }
                        Relation::Reverse(predicate) => {
                            self.emit_output(Triple::new(
                                as_subject(&current_object_resource),
                                predicate.clone(),
                                as_term(local.new_subject.as_deref().unwrap()),
                            ));
                        }
                    }
                }
            }
        }
        // 10.
        // > If however current object resource was set to null, but there
        // > are predicates present, then they must be stored as incomplete
        // > triples, pending the discovery of a subject that can be used as
        // > the object. Also, current object resource should be set to a
        // > newly created bnode.
        else if let Some(relations) = &attrs.relations {
            trace!("- storing incomplete triples against new blank node");
            local.current_object_resource = Some(Rc::new(BlankNode::default().into()));
            for relation in relations {
                match relation {
                    Relation::List(predicate) => {
                        let list = local.list_mappings.borrow_mut().ensure_list(predicate);
                        local.incomplete_triples.push(IncompleteTriple::List(list));
                    }
                    Relation::Forward(predicate) => {
                        local
                            .incomplete_triples
                            .push(IncompleteTriple::Forward(predicate.clone()));
                    }
                    Relation::Reverse(predicate) => {
                        local
                            .incomplete_triples
                            .push(IncompleteTriple::Reverse(predicate.clone()));
                    }
                }
            }
        }

        // 11. current property value
        if let Some(properties) = attrs.property.into_value() {
            let language = local.current_language.as_ref().map(|l| l.to_string());
            let builder = LiteralBuilder {
                element,
                content: attrs.content,
                datatype: &attrs.datatype,
                language: language.as_deref(),
                version,
                validate: self.options.validate,
                relations_present: attrs.relations.is_some(),
                about_present: attrs.about.is_present(),
                typeof_present: attrs.type_of.is_present(),
                resource_value: attrs.resource_value.as_deref(),
                typed_resource: local.typed_resource.as_deref(),
            };
            let current_property_value = builder.build()?;

            // “If the element also includes the @inlist attribute, the
            //  current property value is added to the local list mapping.
            if attrs.inlist {
                let term: Rc<Term> = Rc::new(current_property_value);
                for property in properties {
                    local
                        .list_mappings
                        .borrow_mut()
                        .insert_value(property, term.clone());
                }
            }
            // “Otherwise the current property value is used to generate a
            //  triple: subject = new subject, predicate = full IRI,
            //  object = current property value.
            else if let Some(subject) = local.new_subject.as_deref() {
                for property in properties {
                    self.emit_output(Triple::new(
                        as_subject(subject),
                        property,
                        current_property_value.clone(),
                    ));
                }
            }
        }

        // 12.
        // “If the skip element flag is 'false', and new subject was set to
        //  a non-null value, then any incomplete triples within the current
        //  context should be completed. Note that it is the list received
        //  as part of the evaluation context that is used here, not the
        //  local one.
        if !local.skip_element {
            if let Some(new_subject) = &local.new_subject {
                for incomplete in eval_context.incomplete_triples.iter() {
                    match incomplete {
                        // “If direction is 'none', the new subject is added
                        //  to the list from the iterated incomplete triple.
                        IncompleteTriple::List(list) => {
                            list.borrow_mut().push(Rc::new(as_term(new_subject)));
                        }
                        // “If direction is 'forward':
                        //  subject = parent subject, object = new subject.
                        IncompleteTriple::Forward(predicate) => {
                            self.emit_output(Triple::new(
                                as_subject(&eval_context.parent_subject),
                                predicate.clone(),
                                as_term(new_subject),
                            ));
                        }
                        // “If direction is 'reverse':
                        //  subject = new subject, object = parent subject.
                        IncompleteTriple::Reverse(predicate) => {
                            self.emit_output(Triple::new(
                                as_subject(new_subject),
                                predicate.clone(),
                                as_term(&eval_context.parent_subject),
                            ));
                        }
                    }
                }
            }
        }

        // 13.
        // “Next, all elements that are children of the current element are
        //  processed using a new evaluation context.
        //
        // “If the skip element flag is 'true' then the new evaluation
        //  context is a copy of the current context that was passed in to
        //  this level of processing, with the language and list of IRI
        //  mappings values replaced with the local values.
        if local.skip_element {
            Ok(EvaluationContext {
                base: local.base,
                language: local.current_language,
                iri_mappings: local.iri_mappings,
                default_vocab: local.default_vocab,
                ..eval_context.clone()
            })
        } else {
            // “Otherwise, the values are:
            Ok(EvaluationContext {
                empty_bnode: eval_context.empty_bnode.clone(),
                base: local.base,
                // “the parent subject is set to the value of new subject,
                //  if non-null, or the value of the parent subject of the
                //  current evaluation context;
                parent_subject: local
                    .new_subject
                    .clone()
                    .unwrap_or_else(|| eval_context.parent_subject.clone()),
                // “the parent object is set to the value of current object
                //  resource, if non-null, or the value of new subject, if
                //  non-null, or the value of the parent subject of the
                //  current evaluation context;
                parent_object: Some(
                    local
                        .current_object_resource
                        .as_ref()
                        .or(local.new_subject.as_ref())
                        .cloned()
                        .unwrap_or_else(|| eval_context.parent_subject.clone()),
                ),
                iri_mappings: local.iri_mappings,
                incomplete_triples: local.incomplete_triples,
                list_mapping: local.list_mappings,
                language: local.current_language,
                default_vocab: local.default_vocab,
                term_mappings: local.term_mappings,
            })
        }
    }

    /// Rewrites `rdfa:copy` references: every subject carrying one receives
    /// the properties of the referenced `rdfa:Pattern`, iterated to a fixed
    /// point, after which the pattern triples themselves are removed.
    fn property_copying(&self) {
        loop {
            let output = self.output_snapshot();
            let mut present: HashSet<Triple> = output.iter().cloned().collect();
            let mut added_any = false;

            for copy in output.iter().filter(|t| is_copy(t)) {
                let Some(target) = resource_object(&copy.object) else {
                    continue;
                };
                if !present.contains(&pattern_type_triple(&target)) {
                    continue;
                }

                let target_subject = as_subject(&target);
                for triple in output.iter().filter(|t| t.subject == target_subject) {
                    let copied = Triple::new(
                        copy.subject.clone(),
                        triple.predicate.clone(),
                        triple.object.clone(),
                    );
                    if present.insert(copied.clone()) {
                        self.emit_output(copied);
                        added_any = true;
                    }
                }
            }

            if !added_any {
                break;
            }
        }

        let output = self.output_snapshot();
        let mut to_remove: HashSet<Triple> = HashSet::new();
        for copy in output.iter().filter(|t| is_copy(t)) {
            to_remove.insert(copy.clone());
            let Some(target) = resource_object(&copy.object) else {
                continue;
            };
            if !output.contains(&pattern_type_triple(&target)) {
                continue;
            }

            // the copying subject picked up the rdfa:Pattern type as well
            to_remove.insert(Triple::new(
                copy.subject.clone(),
                rdf::TYPE,
                rdfa::PATTERN.into_owned(),
            ));

            let target_subject = as_subject(&target);
            for triple in output.iter().filter(|t| t.subject == target_subject) {
                to_remove.insert(triple.clone());
            }
        }

        if !to_remove.is_empty() {
            self.statements
                .borrow_mut()
                .retain(|statement| {
                    statement.graph != GraphName::Output || !to_remove.contains(&statement.triple)
                });
        }
    }

    fn output_snapshot(&self) -> Vec<Triple> {
        self.statements
            .borrow()
            .iter()
            .filter(|statement| statement.graph == GraphName::Output)
            .map(|statement| statement.triple.clone())
            .collect()
    }
}

fn is_copy(triple: &Triple) -> bool {
    triple.predicate.as_ref() == rdfa::COPY
}

fn pattern_type_triple(target: &NamedOrBlankNode) -> Triple {
    Triple::new(as_subject(target), rdf::TYPE, rdfa::PATTERN.into_owned())
}

fn resource_object(term: &Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(n) => Some(n.clone().into()),
        Term::BlankNode(n) => Some(n.clone().into()),
        _ => None,
    }
}

fn as_subject(node: &NamedOrBlankNode) -> oxrdf::Subject {
    match node {
        NamedOrBlankNode::NamedNode(n) => n.clone().into(),
        NamedOrBlankNode::BlankNode(b) => b.clone().into(),
    }
}

fn as_term(node: &NamedOrBlankNode) -> Term {
    match node {
        NamedOrBlankNode::NamedNode(n) => n.clone().into(),
        NamedOrBlankNode::BlankNode(b) => b.clone().into(),
    }
}

/// Looks an attribute up under its qualified name, falling back to the
/// prefix/local split some tree builders produce for foreign content.
fn qualified_attr<'a>(el: &'a scraper::node::Element, name: &str) -> Option<&'a str> {
    el.attr(name).or_else(|| {
        let (prefix, local) = name.split_once(':')?;
        el.attrs
            .iter()
            .find(|(qn, _)| qn.prefix.as_deref() == Some(prefix) && &*qn.local == local)
            .map(|(_, value)| value.as_ref())
    })
}

fn strip_cdata(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn gather_attrs<'a>(
    element: ElementRef<'a>,
    local: &LocalScope,
    version: Version,
) -> ElementAttrs<'a> {
    let el = element.value();

    let attr_iri = |name: &str| match el.attr(name) {
        None => Attr::Missing,
        Some(v) => match local.attribute_iri(v) {
            None => Attr::Empty,
            Some(v) => Attr::Value(v),
        },
    };

    let attr1 = |name: &str| match el.attr(name) {
        None => Attr::Missing,
        Some(v) => match local.safecuri_or_curie_or_iri(v) {
            None => Attr::Empty,
            Some(v) => Attr::Value(v),
        },
    };

    let attr_many = |name: &str, proj: &dyn Fn(&str) -> Vec<NamedOrBlankNode>| match el.attr(name) {
        None => Attr::Missing,
        Some(v) => match Vec1::try_from_vec(proj(v)) {
            Err(Size0Error) => Attr::Empty,
            Ok(v) => Attr::Value(v),
        },
    };

    let attr_many_pred =
        |name: &'static str, proj: &dyn Fn(&str) -> Vec<NamedOrBlankNode>| match el.attr(name) {
            None => Attr::Missing,
            Some(v) => {
                let data = proj(v)
                    .into_iter()
                    .filter_map(|v| to_predicate(local.report, name, v))
                    .collect();
                match Vec1::try_from_vec(data) {
                    Err(Size0Error) => Attr::Empty,
                    Ok(v) => Attr::Value(v),
                }
            }
        };

    let property: Attr<Vec1<NamedNode>> =
        attr_many_pred("property", &|v| local.many_term_or_curie_or_absiri(v));

    let inlist = version.is_1_1() && el.attr("inlist").is_some();

    let rel_dir = if inlist { Relation::List } else { Relation::Forward };
    let rev_dir = Relation::Reverse;

    let rel: Option<Vec<Relation>>;
    let rev: Option<Vec<Relation>>;

    if property.is_present() {
        // [html-rdfa] extension #7
        // > if the @property attribute and the @rel and/or @rev attribute
        // > exists on the same element, the non-CURIE and non-URI @rel and
        // > @rev values are ignored. If, after this, the value of @rel
        // > and/or @rev becomes empty, then the processor MUST act as if
        // > the respective attribute is not present.
        rel = match attr_many_pred("rel", &|v| local.many_curie_or_absiri(v)) {
            Attr::Missing | Attr::Empty => None,
            Attr::Value(v) => Some(v.into_iter().map(rel_dir).collect()),
        };
        rev = match attr_many_pred("rev", &|v| local.many_curie_or_absiri(v)) {
            Attr::Missing | Attr::Empty => None,
            Attr::Value(v) => Some(v.into_iter().map(rev_dir).collect()),
        };
    } else {
        rel = match attr_many_pred("rel", &|v| local.many_term_or_curie_or_absiri(v)) {
            Attr::Missing => None,
            Attr::Empty => Some(Vec::new()),
            Attr::Value(v) => Some(v.into_iter().map(rel_dir).collect()),
        };
        rev = match attr_many_pred("rev", &|v| local.many_term_or_curie_or_absiri(v)) {
            Attr::Missing => None,
            Attr::Empty => Some(Vec::new()),
            Attr::Value(v) => Some(v.into_iter().map(rev_dir).collect()),
        };
    }

    let relations = match (rel, rev) {
        (None, None) => None,
        (Some(rel), None) => Some(rel),
        (None, Some(rev)) => Some(rev),
        (Some(mut rel), Some(rev)) => {
            rel.extend(rev);
            Some(rel)
        }
    };

    let type_of: Attr<Vec1<NamedOrBlankNode>> =
        attr_many("typeof", &|v| local.many_term_or_curie_or_absiri(v));

    let mut about: Attr<Rc<NamedOrBlankNode>> = attr1("about").map(Rc::new);
    let resource: Attr<Rc<NamedOrBlankNode>> = attr1("resource").map(Rc::new);
    let href: Attr<NamedNode> = attr_iri("href");
    let src: Attr<NamedNode> = attr_iri("src");

    if !version.is_1_1() && !about.is_present() {
        // RDFa 1.0 puts @src on the subject side.
        about = src.clone().map(|iri| Rc::new(iri.into()));
    }

    let resource_present =
        resource.is_present() || href.is_present() || (version.is_1_1() && src.is_present());

    let resource_value: Option<Rc<NamedOrBlankNode>> = resource
        .value()
        .cloned()
        .or_else(|| Some(Rc::new(href.clone().into_value()?.into())))
        .or_else(|| {
            if version.is_1_1() {
                Some(Rc::new(src.clone().into_value()?.into()))
            } else {
                None
            }
        });

    let datatype: Attr<NamedNode> = match el.attr("datatype") {
        None => Attr::Missing,
        Some(v) if v.is_empty() => Attr::Empty,
        Some(v) => match local.term_or_curie_or_absiri(v) {
            Some(NamedOrBlankNode::NamedNode(dt)) => Attr::Value(dt),
            Some(NamedOrBlankNode::BlankNode(node)) => {
                (local.report)(
                    PGType::Warning,
                    format!("@datatype cannot refer to a bnode: [{node}]"),
                );
                Attr::Empty
            }
            None => Attr::Empty,
        },
    };

    ElementAttrs {
        content: el.attr("content"),
        inlist,
        property,
        relations,
        type_of,
        about,
        resource_present,
        resource_value,
        datatype,
    }
}

fn to_predicate(
    report: &dyn Fn(PGType, String),
    name: &str,
    value: NamedOrBlankNode,
) -> Option<NamedNode> {
    match value {
        NamedOrBlankNode::NamedNode(iri) => Some(iri),
        NamedOrBlankNode::BlankNode(node) => {
            report(
                PGType::Warning,
                format!("@{name} cannot refer to a bnode: [{node}]"),
            );
            None
        }
    }
}
