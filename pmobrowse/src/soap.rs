//! SOAP envelopes for the ContentDirectory `Browse` action.

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::trace;
use xmltree::{Element, EmitterConfig, XMLNode};

pub const CONTENT_DIRECTORY_URN: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";

/// `SOAPAction` header value of a Browse call.
pub const BROWSE_SOAP_ACTION: &str = "urn:schemas-upnp-org:service:ContentDirectory:1#Browse";

pub const BROWSE_DIRECT_CHILDREN: &str = "BrowseDirectChildren";

/// Fault markers searched for when the body is not a readable envelope.
const FAULT_MARKERS: &[&str] = &["soap:Fault", "SOAP-ENV:Fault"];

fn build_envelope(body_child: Element) -> Result<String, xmltree::Error> {
    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));

    let mut envelope = Element::new("s:Envelope");
    envelope.attributes.insert(
        "xmlns:s".to_string(),
        "http://schemas.xmlsoap.org/soap/envelope/".to_string(),
    );
    envelope.attributes.insert(
        "s:encodingStyle".to_string(),
        "http://schemas.xmlsoap.org/soap/encoding/".to_string(),
    );
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(true)
        .normalize_empty_elements(false)
        .perform_indent(true)
        .indent_string("  ");
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Builds a `u:<action>` request envelope for `service_urn`.
pub fn build_soap_request(
    service_urn: &str,
    action: &str,
    args: &[(&str, &str)],
) -> Result<String, xmltree::Error> {
    let mut request = Element::new(&format!("u:{}", action));
    request
        .attributes
        .insert("xmlns:u".to_string(), service_urn.to_string());

    for (name, value) in args {
        let mut child = Element::new(name);
        child.children.push(XMLNode::Text((*value).to_string()));
        request.children.push(XMLNode::Element(child));
    }

    build_envelope(request)
}

/// Browse request listing the direct children of `object_id`.
pub fn build_browse_request(object_id: &str, requested_count: u32) -> Result<String, xmltree::Error> {
    let requested_count = requested_count.to_string();
    build_soap_request(
        CONTENT_DIRECTORY_URN,
        "Browse",
        &[
            ("ObjectID", object_id),
            ("BrowseFlag", BROWSE_DIRECT_CHILDREN),
            ("Filter", "*"),
            ("StartingIndex", "0"),
            ("RequestedCount", &requested_count),
            ("SortCriteria", ""),
        ],
    )
}

/// Whether a response body carries a SOAP fault.
///
/// A fault is a `Fault` element placed directly under the envelope `Body`,
/// whatever its prefix. Escaped DIDL-Lite inside `<Result>` is text and never
/// matches. Bodies that cannot be read as XML, or that have no `Body`, are
/// searched for the `soap:Fault` and `SOAP-ENV:Fault` markers instead.
pub fn contains_fault(body: &str) -> bool {
    match body_fault(body) {
        Ok(Some(found)) => found,
        Ok(None) => has_fault_marker(body),
        Err(err) => {
            trace!("Response is not a readable SOAP envelope: {}", err);
            has_fault_marker(body)
        }
    }
}

fn has_fault_marker(body: &str) -> bool {
    FAULT_MARKERS.iter().any(|marker| body.contains(marker))
}

/// `Some(found)` once a `Body` element was read, `None` when there is none.
fn body_fault(body: &str) -> Result<Option<bool>, quick_xml::Error> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                match body_depth {
                    None if e.local_name().as_ref() == b"Body" => body_depth = Some(depth),
                    Some(d) if depth == d + 1 && e.local_name().as_ref() == b"Fault" => {
                        return Ok(Some(true));
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if body_depth == Some(depth) && e.local_name().as_ref() == b"Fault" {
                    return Ok(Some(true));
                }
            }
            Event::End(_) => {
                if body_depth == Some(depth) {
                    return Ok(Some(false));
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => return Ok(body_depth.map(|_| false)),
            _ => {}
        }
    }
}
