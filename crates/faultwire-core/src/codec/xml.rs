use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use regex::Regex;
use serde_json::Value;

use crate::codec::{CodecError, MAX_XML_DEPTH, Result};
use crate::representation::{ErrorRepresentation, HandlerInfo, StackFrame};

const ROOT: &str = "error";
const CAUSE: &str = "cause";
const JSON_ATTR: &str = "json";

pub(super) fn encode(rep: &ErrorRepresentation) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    write_representation(&mut writer, ROOT, rep)?;
    Ok(writer.into_inner())
}

pub(super) fn decode(text: &str) -> Result<ErrorRepresentation> {
    let root = parse_tree(text)?;
    if root.name != ROOT {
        return Err(xml_error(format!("unexpected root element `{}`", root.name)));
    }
    read_representation(&root)
}

fn write_representation(writer: &mut Writer<Vec<u8>>, element: &str, rep: &ErrorRepresentation) -> Result<()> {
    start(writer, element)?;

    if let Some(id) = &rep.id {
        text_element(writer, "id", id)?;
    }
    if let Some(timestamp) = &rep.timestamp {
        text_element(writer, "timestamp", &timestamp.to_string())?;
    }
    text_element(writer, "status", &rep.status.to_string())?;

    let scalars = [
        ("statusText", &rep.status_text),
        ("errorCode", &rep.error_code),
    ];
    for (name, value) in scalars {
        if let Some(value) = value {
            text_element(writer, name, value)?;
        }
    }
    if rep.error_code_inherited {
        text_element(writer, "errorCodeInherited", "true")?;
    }

    let scalars = [
        ("message", &rep.message),
        ("exceptionType", &rep.exception_type),
        ("application", &rep.application),
        ("path", &rep.path),
    ];
    for (name, value) in scalars {
        if let Some(value) = value {
            text_element(writer, name, value)?;
        }
    }

    if let Some(handler) = &rep.handler {
        start(writer, "handler")?;
        text_element(writer, "typeName", &handler.type_name)?;
        text_element(writer, "methodName", &handler.method_name)?;
        if !handler.method_parameter_types.is_empty() {
            start(writer, "methodParameterTypes")?;
            for parameter in &handler.method_parameter_types {
                text_element(writer, "methodParameterType", parameter)?;
            }
            end(writer, "methodParameterTypes")?;
        }
        end(writer, "handler")?;
    }

    if let Some(frames) = &rep.stack_trace {
        start(writer, "stackTrace")?;
        for frame in frames {
            start(writer, "stackTraceElement")?;
            if let Some(declaring) = &frame.declaring_type {
                text_element(writer, "declaringType", declaring)?;
            }
            text_element(writer, "methodName", &frame.method_name)?;
            if let Some(file) = &frame.file_name {
                text_element(writer, "fileName", file)?;
            }
            if let Some(line) = frame.line_number {
                text_element(writer, "lineNumber", &line.to_string())?;
            }
            end(writer, "stackTraceElement")?;
        }
        end(writer, "stackTrace")?;
    }

    if let Some(cause) = &rep.cause {
        write_representation(writer, CAUSE, cause)?;
    }

    for (key, value) in &rep.extensions {
        if !is_xml_name(key) {
            tracing::debug!(key, "skipping extension that is not a valid XML element name");
            continue;
        }
        match value {
            Value::String(text) => text_element(writer, key, text)?,
            other => {
                let json = serde_json::to_string(other)?;
                let mut tag = BytesStart::new(key.as_str());
                tag.push_attribute((JSON_ATTR, "true"));
                writer.write_event(Event::Start(tag)).map_err(xml_error)?;
                writer.write_event(Event::Text(BytesText::new(&json))).map_err(xml_error)?;
                end(writer, key)?;
            }
        }
    }

    end(writer, element)
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name))).map_err(xml_error)
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    start(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(text))).map_err(xml_error)?;
    end(writer, name)
}

fn is_xml_name(key: &str) -> bool {
    fn re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9._-]*$").expect("must be valid regex"))
    }
    re().is_match(key) && !key.to_ascii_lowercase().starts_with("xml")
}

fn xml_error(e: impl fmt::Display) -> CodecError {
    CodecError::Xml(e.to_string())
}

/// Minimal element tree; attributes other than the JSON marker are ignored
#[derive(Debug, Default)]
struct Node {
    name: String,
    json: bool,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut json = false;
        for attribute in start.attributes() {
            let attribute = attribute.map_err(xml_error)?;
            if attribute.key.local_name().as_ref() == JSON_ATTR.as_bytes() {
                json = attribute.unescape_value().map_err(xml_error)?.trim() == "true";
            }
        }
        Ok(Self {
            name,
            json,
            ..Self::default()
        })
    }

    fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|child| child.text.clone())
    }
}

fn parse_tree(text: &str) -> Result<Node> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => {
                if stack.len() >= MAX_XML_DEPTH {
                    return Err(CodecError::TooDeep);
                }
                stack.push(Node::from_start(&start)?);
            }
            Event::Empty(start) => {
                let node = Node::from_start(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| xml_error("unbalanced end tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_error("unexpected end of document"));
    }
    root.ok_or_else(|| xml_error("document has no root element"))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(xml_error("multiple root elements")),
    }
    Ok(())
}

fn read_representation(node: &Node) -> Result<ErrorRepresentation> {
    let mut rep = ErrorRepresentation {
        id: None,
        timestamp: None,
        status: crate::representation::DEFAULT_STATUS,
        status_text: None,
        error_code: None,
        error_code_inherited: false,
        message: None,
        exception_type: None,
        application: None,
        path: None,
        handler: None,
        stack_trace: None,
        cause: None,
        extensions: IndexMap::new(),
    };

    for child in &node.children {
        let text = child.text.clone();
        match child.name.as_str() {
            "id" => rep.id = Some(text),
            "timestamp" => {
                rep.timestamp = Some(text.trim().parse().map_err(|_| CodecError::InvalidField {
                    field: "timestamp",
                    value: text.clone(),
                })?);
            }
            "status" => {
                rep.status = text.trim().parse().map_err(|_| CodecError::InvalidField {
                    field: "status",
                    value: text.clone(),
                })?;
            }
            "statusText" => rep.status_text = Some(text),
            "errorCode" => rep.error_code = Some(text),
            "errorCodeInherited" => rep.error_code_inherited = text.trim().eq_ignore_ascii_case("true"),
            "message" => rep.message = Some(text),
            "exceptionType" => rep.exception_type = Some(text),
            "application" => rep.application = Some(text),
            "path" => rep.path = Some(text),
            "handler" => rep.handler = Some(read_handler(child)),
            "stackTrace" => rep.stack_trace = Some(read_stack_trace(child)?),
            CAUSE => rep.cause = Some(Box::new(read_representation(child)?)),
            _ => {
                let value = if child.json {
                    serde_json::from_str(&text)?
                } else {
                    Value::String(text)
                };
                rep.extensions.insert(child.name.clone(), value);
            }
        }
    }

    Ok(rep)
}

fn read_handler(node: &Node) -> HandlerInfo {
    HandlerInfo {
        type_name: node.child_text("typeName").unwrap_or_default(),
        method_name: node.child_text("methodName").unwrap_or_default(),
        method_parameter_types: node
            .child("methodParameterTypes")
            .map(|types| types.children.iter().map(|t| t.text.clone()).collect())
            .unwrap_or_default(),
    }
}

fn read_stack_trace(node: &Node) -> Result<Vec<StackFrame>> {
    node.children
        .iter()
        .map(|element| {
            let line_number = element
                .child_text("lineNumber")
                .map(|line| {
                    line.trim().parse().map_err(|_| CodecError::InvalidField {
                        field: "lineNumber",
                        value: line.clone(),
                    })
                })
                .transpose()?;

            Ok(StackFrame {
                declaring_type: element.child_text("declaringType"),
                method_name: element.child_text("methodName").unwrap_or_default(),
                file_name: element.child_text("fileName"),
                line_number,
            })
        })
        .collect()
}
