use std::sync::LazyLock;

use regex::Regex;

/// Pattern every new function name must match.
pub const FUNCTION_NAME_PATTERN: &str = r"^[a-zA-Z][a-zA-Z\d_\-]*$";

static FUNCTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FUNCTION_NAME_PATTERN).expect("Invalid function name regex"));

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "true", "false", "null", "_",
];

/// Centralized validation for user-supplied identifiers.
pub struct DomainValidator;

impl DomainValidator {
    pub fn is_function_name(input: &str) -> bool {
        !input.is_empty() && FUNCTION_NAME.is_match(input)
    }

    /// A dot-separated sequence of Java identifiers, none of them a keyword.
    pub fn is_package_name(input: &str) -> bool {
        !input.is_empty() && input.split('.').all(is_java_identifier)
    }
}

fn is_java_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && !JAVA_KEYWORDS.contains(&segment)
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
