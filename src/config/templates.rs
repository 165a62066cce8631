//! Message template engine
//!
//! Renders message card templates with a small Jinja-style syntax:
//!
//! - `{{ name }}` substitutes a value, optionally through filters:
//!   `{{ hosts | join(", ") }}`, `{{ name | tojson }}`, `upper`, `lower`,
//!   `default("n/a")`
//! - `{% if name %}`, `{% if not name %}`, `{% if name == "literal" %}` and
//!   `{% if name != "literal" %}` with optional `{% else %}`, closed by
//!   `{% endif %}`
//!
//! Strings render as raw text, numbers and booleans as JSON literals, lists
//! and objects as JSON text. Undefined names are an error unless a
//! `default` filter supplies a value.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{NotifierError, Result};

/// Named values available to a template
pub type TemplateContext = HashMap<String, Value>;

/// Compiled message template
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    source_name: String,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Expr(Expression),
    If {
        condition: Condition,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Expression {
    variable: String,
    filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Join(String),
    ToJson,
    Upper,
    Lower,
    Default(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Truthy { variable: String, negated: bool },
    Equals { variable: String, literal: Value, negated: bool },
}

enum Token {
    Text(String),
    Expr(String),
    Tag(String),
}

/// Block terminator found while parsing nested nodes
#[derive(Debug, PartialEq)]
enum BlockEnd {
    Else,
    EndIf,
}

impl TemplateEngine {
    /// Read and compile a template file
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| NotifierError::TemplateReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_source(&path.display().to_string(), &source)
    }

    /// Compile template text; `source_name` is used in error messages
    pub fn from_source(source_name: &str, source: &str) -> Result<Self> {
        let render_error = |reason: String| NotifierError::TemplateRenderError {
            path: source_name.to_string(),
            reason,
        };

        let tokens = tokenize(source).map_err(render_error)?;
        let mut pos = 0;
        let (nodes, end) = parse_block(&tokens, &mut pos).map_err(render_error)?;
        match end {
            None => Ok(Self {
                source_name: source_name.to_string(),
                nodes,
            }),
            Some(BlockEnd::Else) => Err(render_error("`else` without matching `if`".to_string())),
            Some(BlockEnd::EndIf) => {
                Err(render_error("`endif` without matching `if`".to_string()))
            }
        }
    }

    /// Render the template against a set of named values
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut output = String::new();
        render_nodes(&self.nodes, context, &mut output).map_err(|reason| {
            NotifierError::TemplateRenderError {
                path: self.source_name.clone(),
                reason,
            }
        })?;
        Ok(output)
    }
}

/// Split template text into literal text, `{{ }}` expressions and `{% %}` tags
fn tokenize(source: &str) -> std::result::Result<Vec<Token>, String> {
    let pattern = Regex::new(r"(?s)\{\{(.*?)\}\}|\{%(.*?)%\}")
        .map_err(|e| format!("internal template pattern error: {}", e))?;

    let mut tokens = Vec::new();
    let mut last = 0;
    for captures in pattern.captures_iter(source) {
        let whole = match captures.get(0) {
            Some(whole) => whole,
            None => continue,
        };
        if whole.start() > last {
            tokens.push(Token::Text(source[last..whole.start()].to_string()));
        }
        if let Some(expr) = captures.get(1) {
            tokens.push(Token::Expr(expr.as_str().trim().to_string()));
        } else if let Some(tag) = captures.get(2) {
            tokens.push(Token::Tag(tag.as_str().trim().to_string()));
        }
        last = whole.end();
    }

    let rest = &source[last..];
    if rest.contains("{{") || rest.contains("{%") {
        return Err("unterminated `{{` or `{%` delimiter".to_string());
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    Ok(tokens)
}

fn parse_block(
    tokens: &[Token],
    pos: &mut usize,
) -> std::result::Result<(Vec<Node>, Option<BlockEnd>), String> {
    let mut nodes = Vec::new();

    while *pos < tokens.len() {
        let token = &tokens[*pos];
        *pos += 1;

        match token {
            Token::Text(text) => nodes.push(Node::Text(text.clone())),
            Token::Expr(expr) => nodes.push(Node::Expr(parse_expression(expr)?)),
            Token::Tag(tag) => {
                if let Some(condition) = tag.strip_prefix("if ") {
                    let condition = parse_condition(condition)?;
                    let (then_branch, end) = parse_block(tokens, pos)?;
                    let else_branch = match end {
                        Some(BlockEnd::EndIf) => Vec::new(),
                        Some(BlockEnd::Else) => match parse_block(tokens, pos)? {
                            (branch, Some(BlockEnd::EndIf)) => branch,
                            (_, Some(BlockEnd::Else)) => {
                                return Err("duplicate `else` in `if` block".to_string())
                            }
                            (_, None) => return Err("unclosed `if` block".to_string()),
                        },
                        None => return Err("unclosed `if` block".to_string()),
                    };
                    nodes.push(Node::If {
                        condition,
                        then_branch,
                        else_branch,
                    });
                } else if tag == "else" {
                    return Ok((nodes, Some(BlockEnd::Else)));
                } else if tag == "endif" {
                    return Ok((nodes, Some(BlockEnd::EndIf)));
                } else {
                    return Err(format!("unsupported tag `{{% {} %}}`", tag));
                }
            }
        }
    }

    Ok((nodes, None))
}

fn parse_expression(source: &str) -> std::result::Result<Expression, String> {
    let mut parts = split_outside_quotes(source, '|').into_iter();
    let variable = parts.next().unwrap_or_default();
    let variable = parse_identifier(&variable)?;

    let filters = parts
        .map(|part| parse_filter(&part))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Expression { variable, filters })
}

fn parse_filter(source: &str) -> std::result::Result<Filter, String> {
    let source = source.trim();
    let (name, argument) = match source.find('(') {
        Some(open) => {
            let inner = source[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| format!("missing `)` in filter `{}`", source))?;
            (source[..open].trim(), Some(parse_literal(inner)?))
        }
        None => (source, None),
    };

    match (name, argument) {
        ("join", Some(Value::String(separator))) => Ok(Filter::Join(separator)),
        ("join", None) => Ok(Filter::Join(String::new())),
        ("tojson", None) => Ok(Filter::ToJson),
        ("upper", None) => Ok(Filter::Upper),
        ("lower", None) => Ok(Filter::Lower),
        ("default", Some(value)) => Ok(Filter::Default(value)),
        _ => Err(format!("unknown filter `{}`", source)),
    }
}

fn parse_condition(source: &str) -> std::result::Result<Condition, String> {
    let source = source.trim();

    for (operator, negated) in [("==", false), ("!=", true)] {
        if let Some((left, right)) = source.split_once(operator) {
            return Ok(Condition::Equals {
                variable: parse_identifier(left)?,
                literal: parse_literal(right)?,
                negated,
            });
        }
    }

    match source.strip_prefix("not ") {
        Some(rest) => Ok(Condition::Truthy {
            variable: parse_identifier(rest)?,
            negated: true,
        }),
        None => Ok(Condition::Truthy {
            variable: parse_identifier(source)?,
            negated: false,
        }),
    }
}

fn parse_identifier(source: &str) -> std::result::Result<String, String> {
    let name = source.trim();
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name.to_string())
    } else {
        Err(format!("invalid variable name `{}`", name))
    }
}

/// Parse a quoted string or a JSON literal (number, true, false, null)
fn parse_literal(source: &str) -> std::result::Result<Value, String> {
    let source = source.trim();
    for quote in ['"', '\''] {
        if source.len() >= 2 && source.starts_with(quote) && source.ends_with(quote) {
            return Ok(Value::String(source[1..source.len() - 1].to_string()));
        }
    }
    serde_json::from_str(source).map_err(|_| format!("invalid literal `{}`", source))
}

fn split_outside_quotes(source: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in source.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == separator => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts
}

fn render_nodes(
    nodes: &[Node],
    context: &TemplateContext,
    output: &mut String,
) -> std::result::Result<(), String> {
    for node in nodes {
        match node {
            Node::Text(text) => output.push_str(text),
            Node::Expr(expr) => output.push_str(&display(&evaluate(expr, context)?)),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let branch = if is_satisfied(condition, context) {
                    then_branch
                } else {
                    else_branch
                };
                render_nodes(branch, context, output)?;
            }
        }
    }
    Ok(())
}

fn evaluate(expr: &Expression, context: &TemplateContext) -> std::result::Result<Value, String> {
    let mut value = context.get(&expr.variable).cloned();

    for filter in &expr.filters {
        value = Some(match (filter, value) {
            (Filter::Default(fallback), None | Some(Value::Null)) => fallback.clone(),
            (Filter::Default(_), Some(current)) => current,
            (_, None) => return Err(format!("undefined variable `{}`", expr.variable)),
            (Filter::Join(separator), Some(Value::Array(items))) => Value::String(
                items
                    .iter()
                    .map(display)
                    .collect::<Vec<_>>()
                    .join(separator),
            ),
            (Filter::Join(_), Some(_)) => {
                return Err(format!("`join` expects a list in `{}`", expr.variable))
            }
            (Filter::ToJson, Some(current)) => Value::String(current.to_string()),
            (Filter::Upper, Some(current)) => Value::String(display(&current).to_uppercase()),
            (Filter::Lower, Some(current)) => Value::String(display(&current).to_lowercase()),
        });
    }

    value.ok_or_else(|| format!("undefined variable `{}`", expr.variable))
}

fn is_satisfied(condition: &Condition, context: &TemplateContext) -> bool {
    match condition {
        Condition::Truthy { variable, negated } => {
            is_truthy(context.get(variable).unwrap_or(&Value::Null)) != *negated
        }
        Condition::Equals {
            variable,
            literal,
            negated,
        } => (context.get(variable).unwrap_or(&Value::Null) == literal) != *negated,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
