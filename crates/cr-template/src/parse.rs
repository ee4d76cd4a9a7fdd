use cr_core::{ContextKind, ReportError, SectionKind, SourceLocation, TemplateNode};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenKind {
    Section(SectionKind),
    Repeat,
}

impl OpenKind {
    fn directive_name(&self) -> &'static str {
        match self {
            Self::Section(kind) => kind.directive_name(),
            Self::Repeat => "repeat",
        }
    }
}

#[derive(Debug)]
struct OpenSection {
    kind: OpenKind,
    path: String,
    body: Vec<TemplateNode>,
    else_body: Option<Vec<TemplateNode>>,
    in_else: bool,
    opened_at: usize,
}

/// Parses a template source into a node tree. Single left-to-right scan with
/// an explicit open-section stack; no backtracking. Same source always yields
/// a structurally identical tree.
pub fn parse(source: &str) -> Result<Vec<TemplateNode>, ReportError> {
    let path_token = Regex::new(r"^(@index|@last|this|[A-Za-z_][A-Za-z0-9_]*)(\.[A-Za-z0-9_]+)*$")
        .expect("path token regex must compile");

    let mut root: Vec<TemplateNode> = Vec::new();
    let mut stack: Vec<OpenSection> = Vec::new();
    let mut in_script = false;
    let mut cursor = 0usize;

    while cursor < source.len() {
        let Some(open_rel) = source[cursor..].find("{{") else {
            push_literal(&mut root, &mut stack, &source[cursor..], &mut in_script);
            break;
        };

        let open_at = cursor + open_rel;
        if open_rel > 0 {
            push_literal(&mut root, &mut stack, &source[cursor..open_at], &mut in_script);
        }

        let Some(close_rel) = source[open_at + 2..].find("}}") else {
            return Err(ReportError::with_location(
                "TEMPLATE_UNTERMINATED_DIRECTIVE",
                "Directive opened with \"{{\" is never closed with \"}}\".",
                location_at(source, open_at),
            ));
        };

        let inner = source[open_at + 2..open_at + 2 + close_rel].trim();
        cursor = open_at + 2 + close_rel + 2;

        if inner.is_empty() {
            return Err(ReportError::with_location(
                "TEMPLATE_EMPTY_DIRECTIVE",
                "Directive \"{{}}\" has no content.",
                location_at(source, open_at),
            ));
        }

        if let Some(rest) = inner.strip_prefix('#') {
            let (name, path) = split_directive(rest);
            let kind = match name {
                "each" => OpenKind::Section(SectionKind::Each),
                "if" => OpenKind::Section(SectionKind::If),
                "unless" => OpenKind::Section(SectionKind::Unless),
                "repeat" => OpenKind::Repeat,
                _ => {
                    return Err(ReportError::with_location(
                        "TEMPLATE_UNKNOWN_DIRECTIVE",
                        format!("Unknown section directive \"#{}\".", name),
                        location_at(source, open_at),
                    ));
                }
            };
            let Some(path) = path else {
                return Err(ReportError::with_location(
                    "TEMPLATE_DIRECTIVE_ARG",
                    format!("Section directive \"#{}\" requires a path argument.", name),
                    location_at(source, open_at),
                ));
            };
            if !path_token.is_match(path) {
                return Err(ReportError::with_location(
                    "TEMPLATE_BAD_PATH",
                    format!("Invalid path \"{}\" in directive \"#{}\".", path, name),
                    location_at(source, open_at),
                ));
            }
            stack.push(OpenSection {
                kind,
                path: path.to_string(),
                body: Vec::new(),
                else_body: None,
                in_else: false,
                opened_at: open_at,
            });
            continue;
        }

        if let Some(name) = inner.strip_prefix('/') {
            let name = name.trim();
            let Some(open) = stack.pop() else {
                return Err(ReportError::with_location(
                    "TEMPLATE_CLOSE_WITHOUT_OPEN",
                    format!("Closing directive \"/{}\" has no open section.", name),
                    location_at(source, open_at),
                ));
            };
            if open.kind.directive_name() != name {
                return Err(ReportError::with_location(
                    "TEMPLATE_SECTION_MISMATCH",
                    format!(
                        "Closing directive \"/{}\" does not match open section \"#{}\".",
                        name,
                        open.kind.directive_name()
                    ),
                    location_at(source, open_at),
                ));
            }
            let node = match open.kind {
                OpenKind::Section(section) => TemplateNode::Section {
                    section,
                    path: open.path,
                    body: open.body,
                    else_body: open.else_body,
                },
                OpenKind::Repeat => TemplateNode::Repeat {
                    path: open.path,
                    body: open.body,
                },
            };
            push_node(&mut root, &mut stack, node);
            continue;
        }

        if inner == "else" {
            let Some(open) = stack.last_mut() else {
                return Err(ReportError::with_location(
                    "TEMPLATE_ELSE_PLACEMENT",
                    "\"{{else}}\" outside of any section.",
                    location_at(source, open_at),
                ));
            };
            if open.kind != OpenKind::Section(SectionKind::If) || open.in_else {
                return Err(ReportError::with_location(
                    "TEMPLATE_ELSE_PLACEMENT",
                    "\"{{else}}\" is only allowed once inside an \"#if\" section.",
                    location_at(source, open_at),
                ));
            }
            open.in_else = true;
            open.else_body = Some(Vec::new());
            continue;
        }

        let node = match inner {
            "@index" => TemplateNode::ContextRef {
                context: ContextKind::Index,
            },
            "@last" => TemplateNode::ContextRef {
                context: ContextKind::Last,
            },
            // Inside a script region `this` must embed raw, so it goes
            // through the variable pathway like any other raw reference.
            "this" if !in_script => TemplateNode::ContextRef {
                context: ContextKind::This,
            },
            path => {
                if !path_token.is_match(path) {
                    return Err(ReportError::with_location(
                        "TEMPLATE_BAD_PATH",
                        format!("Invalid variable path \"{}\".", path),
                        location_at(source, open_at),
                    ));
                }
                TemplateNode::Variable {
                    path: path.to_string(),
                    raw: in_script,
                }
            }
        };
        push_node(&mut root, &mut stack, node);
    }

    if let Some(open) = stack.last() {
        return Err(ReportError::with_location(
            "TEMPLATE_UNCLOSED_SECTION",
            format!(
                "Section \"#{} {}\" is never closed.",
                open.kind.directive_name(),
                open.path
            ),
            location_at(source, open.opened_at),
        ));
    }

    Ok(root)
}

fn split_directive(rest: &str) -> (&str, Option<&str>) {
    let rest = rest.trim();
    match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => {
            let arg = arg.trim();
            (name, (!arg.is_empty()).then_some(arg))
        }
        None => (rest, None),
    }
}

fn push_node(root: &mut Vec<TemplateNode>, stack: &mut [OpenSection], node: TemplateNode) {
    let target = match stack.last_mut() {
        Some(open) if open.in_else => open
            .else_body
            .as_mut()
            .expect("else body exists once in_else is set"),
        Some(open) => &mut open.body,
        None => root,
    };
    target.push(node);
}

fn push_literal(
    root: &mut Vec<TemplateNode>,
    stack: &mut [OpenSection],
    text: &str,
    in_script: &mut bool,
) {
    if text.is_empty() {
        return;
    }
    *in_script = script_state_after(text, *in_script);
    push_node(
        root,
        stack,
        TemplateNode::Literal {
            text: text.to_string(),
        },
    );
}

// Tracks whether the scan position sits inside a <script> element so that
// variables embedded there can be tagged raw at parse time.
fn script_state_after(text: &str, mut in_script: bool) -> bool {
    let lower = text.to_ascii_lowercase();
    let mut position = 0usize;
    loop {
        let open = lower[position..].find("<script");
        let close = lower[position..].find("</script");
        match (open, close) {
            (None, None) => return in_script,
            (Some(open_at), None) => {
                in_script = true;
                position += open_at + "<script".len();
            }
            (None, Some(close_at)) => {
                in_script = false;
                position += close_at + "</script".len();
            }
            (Some(open_at), Some(close_at)) => {
                if open_at < close_at {
                    in_script = true;
                    position += open_at + "<script".len();
                } else {
                    in_script = false;
                    position += close_at + "</script".len();
                }
            }
        }
    }
}

fn location_at(source: &str, offset: usize) -> SourceLocation {
    let mut line = 1usize;
    let mut column = 1usize;
    for ch in source[..offset].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    SourceLocation { line, column }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_literals_and_variables() {
        let nodes = parse("Hello {{metadata.product_name}}!").expect("template should parse");
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[0],
            TemplateNode::Literal {
                text: "Hello ".to_string()
            }
        );
        assert_eq!(
            nodes[1],
            TemplateNode::Variable {
                path: "metadata.product_name".to_string(),
                raw: false,
            }
        );
        assert_eq!(
            nodes[2],
            TemplateNode::Literal {
                text: "!".to_string()
            }
        );
    }

    #[test]
    fn parse_builds_nested_sections() {
        let nodes = parse("{{#each items}}{{#if this.flag}}x{{else}}y{{/if}}{{/each}}")
            .expect("template should parse");
        assert_eq!(nodes.len(), 1);
        let TemplateNode::Section {
            section: SectionKind::Each,
            path,
            body,
            else_body,
        } = &nodes[0]
        else {
            panic!("expected each section");
        };
        assert_eq!(path, "items");
        assert!(else_body.is_none());
        assert_eq!(body.len(), 1);
        let TemplateNode::Section {
            section: SectionKind::If,
            else_body,
            ..
        } = &body[0]
        else {
            panic!("expected if section");
        };
        assert!(else_body.is_some());
    }

    #[test]
    fn parse_is_idempotent_for_same_source() {
        let source = "{{#each a}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}";
        let first = parse(source).expect("parse");
        let second = parse(source).expect("parse");
        assert_eq!(first, second);
    }

    #[test]
    fn parse_tags_variables_inside_script_blocks_as_raw() {
        let nodes = parse("<p>{{a}}</p><script>var d = {{chart.data}};</script>{{b}}")
            .expect("template should parse");
        let raw_flags: Vec<bool> = nodes
            .iter()
            .filter_map(|node| match node {
                TemplateNode::Variable { raw, .. } => Some(*raw),
                _ => None,
            })
            .collect();
        assert_eq!(raw_flags, vec![false, true, false]);
    }

    #[test]
    fn parse_routes_this_through_raw_variable_inside_script() {
        let nodes = parse("{{this}}<script>{{this}}</script>").expect("template should parse");
        assert_eq!(
            nodes[0],
            TemplateNode::ContextRef {
                context: ContextKind::This
            }
        );
        assert_eq!(
            nodes[2],
            TemplateNode::Variable {
                path: "this".to_string(),
                raw: true,
            }
        );
    }

    #[test]
    fn parse_rejects_mismatched_close() {
        let error = parse("{{#each x}}...{{/if}}").expect_err("mismatched close should fail");
        assert_eq!(error.code, "TEMPLATE_SECTION_MISMATCH");
        assert!(error.message.contains("/if"));
        assert!(error.message.contains("#each"));
    }

    #[test]
    fn parse_rejects_close_without_open() {
        let error = parse("text {{/each}}").expect_err("close without open should fail");
        assert_eq!(error.code, "TEMPLATE_CLOSE_WITHOUT_OPEN");
    }

    #[test]
    fn parse_rejects_unclosed_section_with_location() {
        let error = parse("line one\n{{#if a}}body").expect_err("unclosed section should fail");
        assert_eq!(error.code, "TEMPLATE_UNCLOSED_SECTION");
        let location = error.location.expect("location");
        assert_eq!(location.line, 2);
        assert_eq!(location.column, 1);
    }

    #[test]
    fn parse_rejects_unterminated_directive() {
        let error = parse("hello {{name").expect_err("unterminated directive should fail");
        assert_eq!(error.code, "TEMPLATE_UNTERMINATED_DIRECTIVE");
    }

    #[test]
    fn parse_rejects_else_outside_if() {
        let error =
            parse("{{#each x}}{{else}}{{/each}}").expect_err("else outside if should fail");
        assert_eq!(error.code, "TEMPLATE_ELSE_PLACEMENT");

        let error = parse("{{else}}").expect_err("bare else should fail");
        assert_eq!(error.code, "TEMPLATE_ELSE_PLACEMENT");
    }

    #[test]
    fn parse_rejects_bad_paths_and_unknown_directives() {
        let error = parse("{{a..b}}").expect_err("empty segment should fail");
        assert_eq!(error.code, "TEMPLATE_BAD_PATH");

        let error = parse("{{#with x}}{{/with}}").expect_err("unknown directive should fail");
        assert_eq!(error.code, "TEMPLATE_UNKNOWN_DIRECTIVE");

        let error = parse("{{#each}}{{/each}}").expect_err("missing arg should fail");
        assert_eq!(error.code, "TEMPLATE_DIRECTIVE_ARG");

        let error = parse("{{}}").expect_err("empty directive should fail");
        assert_eq!(error.code, "TEMPLATE_EMPTY_DIRECTIVE");
    }

    #[test]
    fn script_state_tracks_open_and_close_in_order() {
        assert!(script_state_after("<script>", false));
        assert!(!script_state_after("<script></script>", false));
        assert!(script_state_after("</script><script>", false));
        assert!(!script_state_after("no markers", false));
        assert!(script_state_after("no markers", true));
        assert!(!script_state_after("</SCRIPT>", true));
    }
}
