//! HTML to export blocks
//!
//! Walks the top-level elements of rendered page HTML and classifies each one
//! into an [`ExportBlock`]. Every block's text is whitespace-normalized except
//! code, which keeps its exact contents.

use super::html::ContentSource;
use crate::utils::normalize_whitespace;
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub checked: bool,
    pub text: String,
}

/// Block-level unit handed to page renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExportBlock {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    List { ordered: bool, items: Vec<String> },
    TaskList { items: Vec<TaskItem> },
    Code { text: String },
    Quote { text: String },
    Table { rows: Vec<Vec<String>> },
    HorizontalRule,
}

/// Classify the top-level elements of an HTML fragment
///
/// Falls back to one paragraph holding all the fragment's text when no
/// element produced a block.
pub fn extract_blocks(html: &str) -> Vec<ExportBlock> {
    extract_with_fallback(html, None)
}

/// Blocks for raw persisted page content (editor JSON, Markdown or plain text)
pub fn extract_content_blocks(raw: &str) -> Vec<ExportBlock> {
    if raw.trim().is_empty() {
        return extract_with_fallback("", None);
    }
    match ContentSource::detect(raw) {
        ContentSource::Document(doc) => {
            let html = super::html::render_html(&doc);
            extract_with_fallback(&html, Some(doc.plain_text()))
        }
        source @ ContentSource::Legacy(_) => extract_with_fallback(&source.to_html(), None),
    }
}

fn extract_with_fallback(html: &str, fallback_text: Option<String>) -> Vec<ExportBlock> {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();

    let mut blocks: Vec<ExportBlock> = root
        .children()
        .filter_map(ElementRef::wrap)
        .filter_map(classify)
        .collect();

    if blocks.is_empty() {
        let text = fallback_text.unwrap_or_else(|| collect_text(root));
        blocks.push(ExportBlock::Paragraph {
            text: normalize_whitespace(&text),
        });
    }
    blocks
}

/// Text of `el` and its descendants, with each `<br>` read as a space
fn collect_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if element.name() == "br" => out.push(' '),
            _ => {}
        }
    }
    out
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&collect_text(el))
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn descendant_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.descendants().skip(1).filter_map(ElementRef::wrap)
}

fn classify(el: ElementRef<'_>) -> Option<ExportBlock> {
    let name = el.value().name();
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse().unwrap_or(1);
            non_empty(element_text(el)).map(|text| ExportBlock::Heading { level, text })
        }
        "ul" | "ol" => classify_list(el, name == "ol"),
        "pre" => Some(ExportBlock::Code {
            text: el.text().collect(),
        }),
        "blockquote" => non_empty(element_text(el)).map(|text| ExportBlock::Quote { text }),
        "table" => classify_table(el),
        "hr" => Some(ExportBlock::HorizontalRule),
        _ => non_empty(element_text(el)).map(|text| ExportBlock::Paragraph { text }),
    }
}

fn checkbox(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    descendant_elements(item).find(|el| {
        el.value().name() == "input"
            && el
                .value()
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
    })
}

fn is_task_item(item: ElementRef<'_>) -> bool {
    item.value().attr("data-type") == Some("taskItem")
        || item.value().attr("data-checked").is_some()
        || checkbox(item).is_some()
}

fn is_checked(item: ElementRef<'_>) -> bool {
    match item.value().attr("data-checked") {
        Some(flag) => flag == "true",
        None => checkbox(item).is_some_and(|input| input.value().attr("checked").is_some()),
    }
}

fn classify_list(el: ElementRef<'_>, ordered: bool) -> Option<ExportBlock> {
    let items: Vec<ElementRef<'_>> = child_elements(el)
        .filter(|child| child.value().name() == "li")
        .collect();

    let is_task_list =
        el.value().attr("data-type") == Some("taskList") || items.iter().any(|i| is_task_item(*i));

    if is_task_list {
        let items: Vec<TaskItem> = items
            .into_iter()
            .filter_map(|item| {
                non_empty(element_text(item)).map(|text| TaskItem {
                    checked: is_checked(item),
                    text,
                })
            })
            .collect();
        return (!items.is_empty()).then_some(ExportBlock::TaskList { items });
    }

    let items: Vec<String> = items
        .into_iter()
        .filter_map(|item| non_empty(element_text(item)))
        .collect();
    (!items.is_empty()).then_some(ExportBlock::List { ordered, items })
}

fn classify_table(el: ElementRef<'_>) -> Option<ExportBlock> {
    let rows: Vec<Vec<String>> = descendant_elements(el)
        .filter(|row| row.value().name() == "tr")
        .map(|row| {
            child_elements(row)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(element_text)
                .collect::<Vec<String>>()
        })
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
        .collect();
    (!rows.is_empty()).then_some(ExportBlock::Table { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_paragraphs() {
        let blocks = extract_blocks("<h2>  Title \n here </h2><p>Body   text</p><h3>   </h3>");
        assert_eq!(
            blocks,
            vec![
                ExportBlock::Heading {
                    level: 2,
                    text: "Title here".to_string()
                },
                ExportBlock::Paragraph {
                    text: "Body text".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_code_keeps_whitespace() {
        let blocks = extract_blocks("<pre><code>fn main() {\n    run();\n}</code></pre>");
        assert_eq!(
            blocks,
            vec![ExportBlock::Code {
                text: "fn main() {\n    run();\n}".to_string()
            }]
        );
    }

    #[test]
    fn test_plain_list_ordered_flag() {
        let blocks = extract_blocks("<ol><li>one</li><li> two </li></ol><ul><li>x</li></ul>");
        assert_eq!(
            blocks,
            vec![
                ExportBlock::List {
                    ordered: true,
                    items: vec!["one".to_string(), "two".to_string()]
                },
                ExportBlock::List {
                    ordered: false,
                    items: vec!["x".to_string()]
                },
            ]
        );
    }

    #[test]
    fn test_one_checkbox_makes_task_list() {
        let html = r#"<ul><li>plain</li><li><input type="checkbox" checked=""> done</li></ul>"#;
        assert_eq!(
            extract_blocks(html),
            vec![ExportBlock::TaskList {
                items: vec![
                    TaskItem {
                        checked: false,
                        text: "plain".to_string()
                    },
                    TaskItem {
                        checked: true,
                        text: "done".to_string()
                    },
                ]
            }]
        );
    }

    #[test]
    fn test_table_drops_empty_rows() {
        let html = "<table><tbody><tr><th>A</th><th>B</th></tr><tr><td> </td><td></td></tr><tr><td>1</td><td></td></tr></tbody></table>";
        assert_eq!(
            extract_blocks(html),
            vec![ExportBlock::Table {
                rows: vec![
                    vec!["A".to_string(), "B".to_string()],
                    vec!["1".to_string(), String::new()],
                ]
            }]
        );
    }

    #[test]
    fn test_falls_back_to_total_text() {
        assert_eq!(
            extract_blocks("<p>  </p>"),
            vec![ExportBlock::Paragraph {
                text: String::new()
            }]
        );
        assert_eq!(
            extract_blocks("loose text"),
            vec![ExportBlock::Paragraph {
                text: "loose text".to_string()
            }]
        );
    }

    #[test]
    fn test_line_break_separates_words() {
        let blocks = extract_blocks("<p>line1<br>line2</p><ul><li><p>a<br/>b</p></li></ul>");
        assert_eq!(
            blocks,
            vec![
                ExportBlock::Paragraph {
                    text: "line1 line2".to_string()
                },
                ExportBlock::List {
                    ordered: false,
                    items: vec!["a b".to_string()]
                },
            ]
        );
    }

    #[test]
    fn test_rule_and_quote() {
        assert_eq!(
            extract_blocks("<blockquote><p>said</p></blockquote><hr>"),
            vec![
                ExportBlock::Quote {
                    text: "said".to_string()
                },
                ExportBlock::HorizontalRule,
            ]
        );
    }

    #[test]
    fn test_block_serialization_tags() {
        let json = serde_json::to_value(ExportBlock::TaskList {
            items: vec![TaskItem {
                checked: true,
                text: "t".to_string(),
            }],
        })
        .unwrap();
        assert_eq!(json["type"], "taskList");
        assert_eq!(
            serde_json::to_value(ExportBlock::HorizontalRule).unwrap()["type"],
            "horizontalRule"
        );
    }
}
