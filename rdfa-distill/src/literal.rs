//! Construction of property values: plain, language-tagged and typed
//! literals, datatype sniffing for `<time>`-style content, and
//! validating-mode lexical checks.

use std::borrow::Cow;
use std::str::FromStr;

use itertools::Itertools;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, Term};
use scraper::ElementRef;

use crate::Error;
use crate::context::Attr;
use crate::host::Version;

/// Inputs for the current property value of one element.
///
/// Resource-position fallbacks live here too: when no literal-bearing
/// attribute applies, the property value may be the element's resource.
pub(crate) struct LiteralBuilder<'a> {
    pub element: ElementRef<'a>,
    pub content: Option<&'a str>,
    pub datatype: &'a Attr<NamedNode>,
    pub language: Option<&'a str>,
    pub version: Version,
    pub validate: bool,
    pub relations_present: bool,
    pub about_present: bool,
    pub typeof_present: bool,
    pub resource_value: Option<&'a NamedOrBlankNode>,
    pub typed_resource: Option<&'a NamedOrBlankNode>,
}

impl LiteralBuilder<'_> {
    // [rdfa-core] 7.5: 11.
    // “The next step of the iteration is to establish any current property
    //  value.
    pub fn build(&self) -> Result<Term, Error> {
        let el = self.element.value();

        let mut inferred_datatype: Option<NamedNodeRef<'static>> = None;
        let content_val: Cow<str> = if let Some(content) = self.content {
            content.into()
        } else {
            // [html-rdfa] extensions #9 & #10: the value of @datetime (or
            // the text of a <time> element) supplies the literal, with its
            // datatype inferred from the lexical form.
            let timeish = el.attr("datetime").map(Cow::Borrowed).or_else(|| {
                (el.name() == "time").then(|| Cow::Owned(self.element.text().join("")))
            });

            if let Some(value) = timeish {
                inferred_datatype = sniff_temporal(&value);
                value
            } else {
                Cow::Owned(self.element.text().join(""))
            }
        };

        let value = match self.datatype {
            // “otherwise, as a plain literal if @datatype is present but has
            //  an empty value.
            Attr::Empty => plain_or_tagged(&content_val, self.language).into(),

            Attr::Value(datatype) => {
                if datatype.as_str() == rdf::XML_LITERAL.as_str()
                    || datatype.as_str() == "http://www.w3.org/1999/02/22-rdf-syntax-ns#HTML"
                {
                    // “The value of the XML literal is a string created by
                    //  serializing to text all nodes that are descendants of
                    //  the current element, i.e., not including the element
                    //  itself.
                    Literal::new_typed_literal(self.element.inner_html(), datatype.clone()).into()
                } else {
                    // “as a typed literal if @datatype is present and does
                    //  not have an empty value.
                    if self.validate && !lexical_conforms(&content_val, datatype.as_ref()) {
                        return Err(Error::InvalidLiteral {
                            value: content_val.into_owned(),
                            datatype: datatype.clone(),
                        });
                    }
                    Literal::new_typed_literal(content_val, datatype.clone()).into()
                }
            }

            Attr::Missing => self.untyped_value(&content_val, inferred_datatype),
        };

        Ok(value)
    }

    fn untyped_value(&self, content_val: &str, inferred: Option<NamedNodeRef<'static>>) -> Term {
        // RDFa 1.0: markup content with no @content and no @datatype is an
        // XML literal.
        if !self.version.is_1_1() && self.content.is_none() && self.has_markup_children() {
            return Literal::new_typed_literal(self.element.inner_html(), rdf::XML_LITERAL).into();
        }

        // “Otherwise, if the value of @datetime lexically matches a valid
        //  xsd:date, xsd:time, xsd:dateTime, xsd:duration, xsd:gYear, or
        //  xsd:gYearMonth a typed literal must be generated, with its
        //  datatype set to the matching xsd datatype.
        if let Some(datatype) = inferred {
            return Literal::new_typed_literal(content_val, datatype).into();
        }

        // “otherwise, as a plain literal using the value of @content if
        //  @content is present.
        if let Some(content) = self.content {
            return plain_or_tagged(content, self.language).into();
        }

        // “otherwise, if the @rel, @rev, and @content attributes are not
        //  present, as a resource obtained from @resource/@href/@src.
        if self.version.is_1_1() && !self.relations_present {
            if let Some(resource) = self.resource_value {
                return resource.clone().into();
            }
        }

        // “otherwise, if @typeof is present and @about is not, the value of
        //  typed resource.
        if self.version.is_1_1() && self.typeof_present && !self.about_present {
            if let Some(typed) = self.typed_resource {
                return typed.clone().into();
            }
        }

        // “otherwise as a plain literal.
        plain_or_tagged(content_val, self.language).into()
    }

    fn has_markup_children(&self) -> bool {
        self.element.children().any(|child| child.value().is_element())
    }
}

fn plain_or_tagged(value: &str, language: Option<&str>) -> Literal {
    match language {
        Some(language) => Literal::new_language_tagged_literal_unchecked(value, language),
        None => Literal::new_simple_literal(value),
    }
}

/// Matches a lexical form against the fixed-format temporal datatypes, most
/// specific first.
fn sniff_temporal(value: &str) -> Option<NamedNodeRef<'static>> {
    if oxsdatatypes::Duration::from_str(value).is_ok() {
        Some(xsd::DURATION)
    } else if oxsdatatypes::DateTime::from_str(value).is_ok() {
        Some(xsd::DATE_TIME)
    } else if oxsdatatypes::Date::from_str(value).is_ok() {
        Some(xsd::DATE)
    } else if oxsdatatypes::Time::from_str(value).is_ok() {
        Some(xsd::TIME)
    } else if oxsdatatypes::GYearMonth::from_str(value).is_ok() {
        Some(xsd::G_YEAR_MONTH)
    } else if oxsdatatypes::GYear::from_str(value).is_ok() {
        Some(xsd::G_YEAR)
    } else {
        None
    }
}

/// Whether a lexical form is in the lexical space of a built-in XSD
/// datatype. Datatypes outside the checked set conform trivially.
pub(crate) fn lexical_conforms(value: &str, datatype: NamedNodeRef) -> bool {
    if datatype == xsd::BOOLEAN {
        oxsdatatypes::Boolean::from_str(value).is_ok()
    } else if datatype == xsd::INTEGER {
        oxsdatatypes::Integer::from_str(value).is_ok()
    } else if datatype == xsd::DECIMAL {
        oxsdatatypes::Decimal::from_str(value).is_ok()
    } else if datatype == xsd::DOUBLE {
        oxsdatatypes::Double::from_str(value).is_ok()
    } else if datatype == xsd::FLOAT {
        oxsdatatypes::Float::from_str(value).is_ok()
    } else if datatype == xsd::DATE {
        oxsdatatypes::Date::from_str(value).is_ok()
    } else if datatype == xsd::TIME {
        oxsdatatypes::Time::from_str(value).is_ok()
    } else if datatype == xsd::DATE_TIME {
        oxsdatatypes::DateTime::from_str(value).is_ok()
    } else if datatype == xsd::DURATION {
        oxsdatatypes::Duration::from_str(value).is_ok()
    } else if datatype == xsd::G_YEAR {
        oxsdatatypes::GYear::from_str(value).is_ok()
    } else if datatype == xsd::G_YEAR_MONTH {
        oxsdatatypes::GYearMonth::from_str(value).is_ok()
    } else if datatype == xsd::G_MONTH_DAY {
        oxsdatatypes::GMonthDay::from_str(value).is_ok()
    } else if datatype == xsd::G_DAY {
        oxsdatatypes::GDay::from_str(value).is_ok()
    } else if datatype == xsd::G_MONTH {
        oxsdatatypes::GMonth::from_str(value).is_ok()
    } else {
        true
    }
}
