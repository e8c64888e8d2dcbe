//! Reading WebEx service responses.
//!
//! Every response is a `serv:message` whose header says whether the call
//! worked and whose `serv:body/serv:bodyContent` carries the payload. Only
//! that shape is understood here; payload fields are picked out by the
//! typed readers in [`super::responses`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::errors::{codes, ErrorSet, ProviderError};

/// One element of a response document: qualified name, text, children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first child called `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }

    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        names.iter().try_fold(self, |el, name| el.child(name))
    }

    fn take_path(mut self, names: &[&str]) -> Option<XmlElement> {
        for name in names {
            let index = self.children.iter().position(|c| c.name == *name)?;
            self = self.children.swap_remove(index);
        }
        Some(self)
    }
}

fn malformed(detail: impl Into<String>) -> ProviderError {
    ProviderError::MalformedEnvelope(detail.into())
}

fn element_name(start: &BytesStart<'_>) -> Result<String, ProviderError> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_string)
        .map_err(|e| malformed(format!("element name is not UTF-8: {}", e)))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ProviderError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(malformed("more than one root element")),
    }
    Ok(())
}

/// Parse a response body into an element tree.
pub fn parse_document(raw: &str) -> Result<XmlElement, ProviderError> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(XmlElement::new(element_name(&e)?)),
            Ok(Event::Empty(e)) => {
                let element = XmlElement::new(element_name(&e)?);
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| malformed("unbalanced end tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(t)) => {
                if let Some(current) = stack.last_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| malformed(format!("bad text content: {}", e)))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(malformed(format!(
                    "invalid XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    if !stack.is_empty() {
        return Err(malformed("document ended inside an element"));
    }

    root.ok_or_else(|| malformed("empty document"))
}

const MESSAGE: &str = "serv:message";
const RESPONSE_PATH: [&str; 2] = ["serv:header", "serv:response"];
const BODY_PATH: [&str; 2] = ["serv:body", "serv:bodyContent"];

/// A parsed `serv:message` with its header already interpreted.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub success: bool,
    pub errors: ErrorSet,
    document: XmlElement,
}

impl ServiceResponse {
    pub fn parse(raw: &str) -> Result<Self, ProviderError> {
        let document = parse_document(raw)?;
        if document.name != MESSAGE {
            return Err(malformed(format!(
                "expected {} root, found {}",
                MESSAGE, document.name
            )));
        }

        let response = document
            .path(&RESPONSE_PATH)
            .ok_or_else(|| malformed("response header missing"))?;

        let success = response.child_text("serv:result") == Some("SUCCESS");

        let mut errors = ErrorSet::new();
        if !success {
            let reason = response.child_text("serv:reason").unwrap_or_default();
            let code = response
                .child_text("serv:exceptionID")
                .filter(|c| !c.is_empty())
                .unwrap_or(codes::UNKNOWN);
            errors.insert(code, reason);
        }

        Ok(Self {
            success,
            errors,
            document,
        })
    }

    /// Extract `serv:body/serv:bodyContent`.
    ///
    /// An empty `bodyContent` is a valid, empty payload. A missing one is
    /// `MalformedEnvelope`.
    pub fn into_body(self) -> Result<XmlElement, ProviderError> {
        self.document
            .take_path(&BODY_PATH)
            .ok_or_else(|| malformed("serv:body/serv:bodyContent missing"))
    }
}
