//! XML to JSON tree conversion.
//!
//! Query-API providers answer with XML while the rest of the pipeline works
//! on [`serde_json::Value`] trees. The conversion follows the common
//! xml-to-json convention:
//!
//! - an element with only text becomes a string leaf, an empty element
//!   becomes `""`
//! - an element with children becomes an object; siblings sharing a name
//!   collapse into an array
//! - attributes become `-name` fields, text alongside children or
//!   attributes becomes a `#content` field
//! - the document root becomes a single-key object named after the root
//!   element
//!
//! Repeated-element ambiguity (one occurrence parses as a scalar, many as an
//! array) is deliberately preserved here; callers that need uniform arrays
//! run their own normalization pass on the returned tree.

use crate::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Convert an XML document into a JSON value tree.
pub fn from_xml(content: &str) -> Result<Value> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element::document()];
    loop {
        match reader
            .read_event()
            .map_err(|e| Error::decode("malformed XML response").with_source(e))?
        {
            Event::Start(e) => {
                let el = Element::open(&e)?;
                stack.push(el);
            }
            Event::Empty(e) => {
                let el = Element::open(&e)?;
                let (name, value) = el.close();
                attach(&mut stack, name, value)?;
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .filter(|_| !stack.is_empty())
                    .ok_or_else(|| Error::decode("unbalanced XML close tag"))?;
                let (name, value) = el.close();
                attach(&mut stack, name, value)?;
            }
            Event::Text(t) => {
                let text = t
                    .decode()
                    .map_err(|e| Error::decode("malformed XML text").with_source(e))?;
                top(&mut stack)?.text.push_str(&text);
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t).into_owned();
                top(&mut stack)?.text.push_str(&text);
            }
            Event::GeneralRef(e) => {
                let name = String::from_utf8_lossy(&e).into_owned();
                let top = top(&mut stack)?;
                match resolve_reference(&name) {
                    Some(c) => top.text.push(c),
                    None => {
                        top.text.push('&');
                        top.text.push_str(&name);
                        top.text.push(';');
                    }
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctypes
            _ => continue,
        }
    }

    let doc = stack
        .pop()
        .ok_or_else(|| Error::decode("empty XML document"))?;
    if !stack.is_empty() {
        return Err(Error::decode("unclosed XML element"));
    }
    let mut map = Map::new();
    for (name, value) in doc.children {
        insert_grouped(&mut map, name, value);
    }
    Ok(Value::Object(map))
}

struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<(String, Value)>,
    text: String,
}

impl Element {
    fn document() -> Self {
        Self {
            name: String::new(),
            attrs: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn open(e: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| Error::decode("malformed XML attribute").with_source(e))?;
            let key = format!("-{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr
                .unescape_value()
                .map_err(|e| Error::decode("malformed XML attribute").with_source(e))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        if self.attrs.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }
        let mut map = Map::new();
        for (key, value) in self.attrs {
            map.insert(key, Value::String(value));
        }
        if !self.text.is_empty() {
            map.insert("#content".to_string(), Value::String(self.text));
        }
        for (name, value) in self.children {
            insert_grouped(&mut map, name, value);
        }
        (self.name, Value::Object(map))
    }
}

fn top<'a>(stack: &'a mut [Element]) -> Result<&'a mut Element> {
    stack
        .last_mut()
        .ok_or_else(|| Error::decode("text outside of XML document"))
}

fn attach(stack: &mut [Element], name: String, value: Value) -> Result<()> {
    top(stack)?.children.push((name, value));
    Ok(())
}

/// Repeated sibling names collapse into an array, in document order.
fn insert_grouped(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        None => {
            map.insert(key, value);
        }
        Some(Value::Array(siblings)) => siblings.push(value),
        Some(slot) => {
            let first = slot.take();
            *slot = Value::Array(vec![first, value]);
        }
    }
}

fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_text_and_empty_leaves() {
        let tree = from_xml("<a><b>hello</b><c/><d></d></a>").unwrap();
        assert_eq!(tree, json!({"a": {"b": "hello", "c": "", "d": ""}}));
    }

    #[test]
    fn test_single_vs_repeated_siblings() {
        let tree = from_xml("<r><item>1</item></r>").unwrap();
        assert_eq!(tree, json!({"r": {"item": "1"}}));

        let tree = from_xml("<r><item>1</item><item>2</item><item>3</item></r>").unwrap();
        assert_eq!(tree, json!({"r": {"item": ["1", "2", "3"]}}));
    }

    #[test]
    fn test_attributes_and_mixed_content() {
        let tree = from_xml(r#"<a xmlns="ns"><b id="7">x</b></a>"#).unwrap();
        assert_eq!(
            tree,
            json!({"a": {"-xmlns": "ns", "b": {"-id": "7", "#content": "x"}}})
        );
    }

    #[test]
    fn test_nested_objects() {
        let xml = "\
            <DescribeVolumesResponse>\
              <volumeSet>\
                <item><volumeId>vol-1</volumeId><size>10</size></item>\
              </volumeSet>\
            </DescribeVolumesResponse>";
        let tree = from_xml(xml).unwrap();
        assert_eq!(
            tree,
            json!({
                "DescribeVolumesResponse": {
                    "volumeSet": {
                        "item": {"volumeId": "vol-1", "size": "10"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_entity_references() {
        let tree = from_xml("<a>x &amp; y &#33;</a>").unwrap();
        assert_eq!(tree, json!({"a": "x & y !"}));
    }

    #[test]
    fn test_malformed_document() {
        assert!(from_xml("<a><b></a>").is_err());
    }
}
