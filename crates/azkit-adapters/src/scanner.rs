//! Discovers `@FunctionName` methods by reading Java sources.
//!
//! This is a lexical scan, not a Java parser: comments are stripped, then
//! every `@FunctionName("...")` is followed to the method it annotates.
//! Binding annotations on the method and on its parameters become
//! [`Binding`]s; their attributes are carried over as JSON values.

use std::path::Path;
use std::sync::LazyLock;

use azkit_core::{
    application::{
        ApplicationError,
        ports::{AnnotatedFunction, FunctionScanner},
    },
    domain::{Binding, BindingEnum},
    error::AzkitResult,
};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

static FUNCTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(?:[\w.]+\.)?FunctionName\s*\(\s*(?:value\s*=\s*)?"([^"]+)"\s*\)"#)
        .expect("valid FunctionName regex")
});
static PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").expect("valid package regex")
});
static CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclass\s+(\w+)").expect("valid class regex"));
static ANNOTATION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([\w.]+)").expect("valid annotation regex"));

const STORAGE_ACCOUNT: &str = "StorageAccount";

/// Scans `*.java` files below a root directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaSourceScanner;

impl JavaSourceScanner {
    pub fn new() -> Self {
        Self
    }
}

impl FunctionScanner for JavaSourceScanner {
    #[instrument(skip(self))]
    fn find_functions(&self, root: &Path) -> AzkitResult<Vec<AnnotatedFunction>> {
        if !root.exists() {
            debug!(root = %root.display(), "Source root does not exist");
            return Ok(Vec::new());
        }

        let mut functions = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| ApplicationError::ScanFailed {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "java") {
                continue;
            }
            let source =
                std::fs::read_to_string(path).map_err(|e| ApplicationError::ScanFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            let found = scan_source(&source);
            if !found.is_empty() {
                debug!(file = %path.display(), count = found.len(), "Found functions");
            }
            functions.extend(found);
        }
        Ok(functions)
    }
}

/// Every annotated function declared in one Java compilation unit.
pub fn scan_source(source: &str) -> Vec<AnnotatedFunction> {
    let source = strip_comments(source);
    let package = PACKAGE
        .captures(&source)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let mut functions = Vec::new();
    for caps in FUNCTION_NAME.captures_iter(&source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(class) = CLASS
            .captures_iter(&source[..whole.start()])
            .last()
            .map(|c| c[1].to_string())
        else {
            warn!(function = name.as_str(), "@FunctionName outside of a class");
            continue;
        };

        match parse_method(&source[whole.end()..]) {
            Some(method) => {
                let entry_point = [package.as_str(), &class, &method.name]
                    .iter()
                    .filter(|s| !s.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(".");
                functions.push(AnnotatedFunction {
                    name: name.as_str().to_string(),
                    entry_point,
                    bindings: method.bindings,
                    returns_value: method.return_type != "void",
                });
            }
            None => warn!(function = name.as_str(), "Cannot find the annotated method"),
        }
    }
    functions
}

struct Annotation {
    name: String,
    /// Raw text between the parentheses, if any.
    arguments: Option<String>,
}

struct Method {
    name: String,
    return_type: String,
    bindings: Vec<Binding>,
}

/// Parse what follows `@FunctionName(...)`: more annotations, then the header.
fn parse_method(rest: &str) -> Option<Method> {
    let mut method_annotations = Vec::new();
    let mut cursor = rest.trim_start();
    while cursor.starts_with('@') {
        let (annotation, remaining) = parse_annotation(cursor)?;
        method_annotations.push(annotation);
        cursor = remaining.trim_start();
    }

    let open = cursor.find('(')?;
    let header: Vec<&str> = cursor[..open].split_whitespace().collect();
    let name = header.last()?.to_string();
    let return_type = header
        .len()
        .checked_sub(2)
        .and_then(|i| header.get(i))
        .map(|t| t.to_string())
        .unwrap_or_else(|| "void".into());
    let (params, _) = balanced(&cursor[open..], '(', ')')?;

    let storage_account = method_annotations
        .iter()
        .find(|a| a.name == STORAGE_ACCOUNT)
        .and_then(|a| a.arguments.as_deref())
        .and_then(|args| parse_arguments(args).into_iter().find(|(k, _)| k == "value"))
        .and_then(|(_, v)| v.as_str().map(str::to_string));

    let mut bindings: Vec<Binding> = method_annotations
        .iter()
        .chain(parameter_annotations(params).iter())
        .filter_map(to_binding)
        .collect();

    if let Some(connection) = storage_account {
        for binding in &mut bindings {
            let is_storage = matches!(binding.binding_type.as_str(), "blob" | "blobTrigger" | "queue" | "queueTrigger" | "table");
            if is_storage && !binding.attributes.contains_key("connection") {
                binding
                    .attributes
                    .insert("connection".into(), Value::String(connection.clone()));
            }
        }
    }

    Some(Method {
        name,
        return_type,
        bindings,
    })
}

fn parameter_annotations(params: &str) -> Vec<Annotation> {
    let mut found = Vec::new();
    let mut cursor = params;
    while let Some(at) = find_outside_strings(cursor, '@') {
        match parse_annotation(&cursor[at..]) {
            Some((annotation, remaining)) => {
                found.push(annotation);
                cursor = remaining;
            }
            None => cursor = &cursor[at + 1..],
        }
    }
    found
}

/// `@Name` or `@Name(...)` at the start of `text`.
fn parse_annotation(text: &str) -> Option<(Annotation, &str)> {
    let caps = ANNOTATION_NAME.captures(text)?;
    let qualified = caps.get(1)?.as_str();
    let name = qualified.rsplit('.').next().unwrap_or(qualified).to_string();
    let after_name = &text[caps.get(0)?.end()..];

    let trimmed = after_name.trim_start();
    if trimmed.starts_with('(') {
        let (arguments, remaining) = balanced(trimmed, '(', ')')?;
        Some((
            Annotation {
                name,
                arguments: Some(arguments.to_string()),
            },
            remaining,
        ))
    } else {
        Some((
            Annotation {
                name,
                arguments: None,
            },
            after_name,
        ))
    }
}

fn to_binding(annotation: &Annotation) -> Option<Binding> {
    let kind = BindingEnum::from_annotation(&annotation.name)?;
    let arguments = annotation
        .arguments
        .as_deref()
        .map(parse_arguments)
        .unwrap_or_default();

    let name = arguments
        .iter()
        .find(|(k, _)| k == "name")
        .and_then(|(_, v)| v.as_str())
        .unwrap_or_default()
        .to_string();
    Some(
        arguments
            .into_iter()
            .filter(|(k, _)| k != "name")
            .fold(Binding::new(kind, name), |binding, (k, v)| {
                binding.with_attribute(k, v)
            }),
    )
}

/// `key = value, ...` pairs; a lone value is keyed `value`.
fn parse_arguments(arguments: &str) -> Vec<(String, Value)> {
    split_top_level(arguments)
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .map(|part| match find_outside_strings(part, '=') {
            Some(eq) => (part[..eq].trim().to_string(), parse_value(&part[eq + 1..])),
            None => ("value".to_string(), parse_value(part)),
        })
        .collect()
}

fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        return Value::Array(
            split_top_level(inner)
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .map(parse_value)
                .collect(),
        );
    }
    if let Some(literal) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return Value::String(literal.replace("\\\"", "\"").replace("\\\\", "\\"));
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.trim_end_matches(['L', 'l']).parse::<i64>() {
        return Value::from(n);
    }
    // Enum constants keep only their last segment, e.g. `HttpMethod.GET`.
    Value::String(raw.rsplit('.').next().unwrap_or(raw).to_string())
}

/// Whether the scan is inside a `"..."` string or a `'...'` char literal.
#[derive(Default)]
struct Literal {
    delimiter: Option<char>,
    escaped: bool,
}

impl Literal {
    /// Feed one char; true when it is part of a literal, quotes included.
    fn step(&mut self, c: char) -> bool {
        match self.delimiter {
            Some(delimiter) => {
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == delimiter {
                    self.delimiter = None;
                }
                true
            }
            None if c == '"' || c == '\'' => {
                self.delimiter = Some(c);
                true
            }
            None => false,
        }
    }
}

/// Split on commas that sit outside literals, braces and parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut literal = Literal::default();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if literal.step(c) {
            continue;
        }
        match c {
            '{' | '(' => depth += 1,
            '}' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn find_outside_strings(text: &str, needle: char) -> Option<usize> {
    let mut literal = Literal::default();
    text.char_indices()
        .find(|&(_, c)| !literal.step(c) && c == needle)
        .map(|(i, _)| i)
}

/// Content between the opening delimiter at `text[0]` and its match, plus the
/// text after the closing delimiter.
fn balanced(text: &str, open: char, close: char) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut literal = Literal::default();
    for (i, c) in text.char_indices() {
        if literal.step(c) {
            continue;
        }
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some((&text[open.len_utf8()..i], &text[i + close.len_utf8()..]));
            }
        }
    }
    None
}

/// Drop `//` and `/* */` comments, leaving string and char literals intact.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut literal = Literal::default();
    while let Some(c) = chars.next() {
        if literal.step(c) {
            out.push(c);
            continue;
        }
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = ' ';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTTP_FUNCTION: &str = r#"
package com.example;

import com.microsoft.azure.functions.*;

/**
 * Sample. @FunctionName("Commented") must not be picked up.
 */
public class Function {
    // @FunctionName("AlsoCommented")
    @FunctionName("HttpExample")
    public HttpResponseMessage run(
            @HttpTrigger(
                name = "req",
                methods = {HttpMethod.GET, HttpMethod.POST},
                authLevel = AuthorizationLevel.ANONYMOUS,
                route = "items/{id}")
                HttpRequestMessage<Optional<String>> request,
            final ExecutionContext context) {
        return request.createResponseBuilder(HttpStatus.OK).body("a, b (c)").build();
    }
}
"#;

    #[test]
    fn finds_http_function_with_attributes() {
        let functions = scan_source(HTTP_FUNCTION);
        assert_eq!(functions.len(), 1);

        let function = &functions[0];
        assert_eq!(function.name, "HttpExample");
        assert_eq!(function.entry_point, "com.example.Function.run");
        assert!(function.returns_value);

        let binding = &function.bindings[0];
        assert_eq!(binding.binding_type, "httpTrigger");
        assert_eq!(binding.name, "req");
        assert_eq!(binding.attributes["authLevel"], "ANONYMOUS");
        assert_eq!(binding.attributes["methods"], serde_json::json!(["GET", "POST"]));
        assert_eq!(binding.attributes["route"], "items/{id}");
    }

    #[test]
    fn method_level_output_and_storage_account() {
        let source = r#"
package com.example.queue;
public class Copier {
    @FunctionName("Copy")
    @StorageAccount("AzureWebJobsStorage")
    @QueueOutput(name = "$return", queueName = "out")
    public String copy(@QueueTrigger(name = "msg", queueName = "in") String msg) {
        return msg;
    }

    @FunctionName("Tick")
    public void tick(@TimerTrigger(name = "timer", schedule = "0 */5 * * * *") String timer) {}
}
"#;
        let functions = scan_source(source);
        assert_eq!(functions.len(), 2);

        let copy = &functions[0];
        assert_eq!(copy.entry_point, "com.example.queue.Copier.copy");
        assert_eq!(copy.bindings.len(), 2);
        assert_eq!(copy.bindings[0].name, "$return");
        assert!(copy
            .bindings
            .iter()
            .all(|b| b.attributes["connection"] == "AzureWebJobsStorage"));

        let tick = &functions[1];
        assert!(!tick.returns_value);
        assert_eq!(tick.bindings[0].attributes["schedule"], "0 */5 * * * *");
    }

    #[test]
    fn unknown_annotations_are_ignored() {
        let source = r#"
public class Blobs {
    @FunctionName("Blob")
    public void run(
        @BlobTrigger(name = "content", path = "c/{name}", dataType = "binary") byte[] content,
        @BindingName("name") String name) {}
}
"#;
        let functions = scan_source(source);
        assert_eq!(functions[0].entry_point, "Blobs.run");
        assert_eq!(functions[0].bindings.len(), 1);
        assert_eq!(functions[0].bindings[0].attributes["dataType"], "binary");
    }

    #[test]
    fn char_literals_do_not_open_strings() {
        let source = r#"
package com.example;
public class Quotes {
    private static final char QUOTE = '"';
    private static final char APOSTROPHE = '\'';
    private static final char BRACE = '}';

    // @FunctionName("Ghost") isn't wired up
    @FunctionName("Echo")
    public String echo(@HttpTrigger(name = "req", authLevel = AuthorizationLevel.FUNCTION) String body) {
        return body.replace('"', '/') + "/*" + '{';
    }

    @FunctionName("Ping")
    public void ping(@TimerTrigger(name = "timer", schedule = "0 * * * * *") String timer) {}
}
"#;
        let functions = scan_source(source);
        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Echo", "Ping"]);
        assert_eq!(functions[0].entry_point, "com.example.Quotes.echo");
        assert_eq!(functions[1].entry_point, "com.example.Quotes.ping");
    }

    #[test]
    fn scanner_walks_nested_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("com").join("example");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Function.java"), HTTP_FUNCTION).unwrap();
        std::fs::write(dir.join("README.md"), "@FunctionName(\"Nope\")").unwrap();

        let functions = JavaSourceScanner.find_functions(tmp.path()).unwrap();
        assert_eq!(functions.len(), 1);
        assert!(JavaSourceScanner
            .find_functions(&tmp.path().join("missing"))
            .unwrap()
            .is_empty());
    }
}
