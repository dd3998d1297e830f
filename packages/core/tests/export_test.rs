//! Integration tests for the export pipeline
//!
//! Tests cover:
//! - Block extraction from persisted editor JSON
//! - Legacy Markdown and plain-text content
//! - Export through the application controller to a file

use anyhow::Result;
use tempfile::TempDir;
use unfold_core::app::{AppController, ExportOptions};
use unfold_core::config::AppConfig;
use unfold_core::export::{
    extract_content_blocks, ExportBlock, ExportPayload, ExportTheme, PrintScope, PrintableNode,
    TaskItem, Typography,
};
use unfold_core::models::{Document, DocumentNode, NodeKind};

const RICH_PAGE: &str = r#"{"type":"doc","content":[
    {"type":"heading","attrs":{"level":1},"content":[{"type":"text","text":"Weekly   plan"}]},
    {"type":"paragraph","content":[
        {"type":"text","text":"Ship the "},
        {"type":"text","marks":[{"type":"bold"}],"text":"export"},
        {"type":"text","text":" path."}
    ]},
    {"type":"paragraph"},
    {"type":"taskList","content":[
        {"type":"taskItem","attrs":{"checked":true},"content":[{"type":"paragraph","content":[{"type":"text","text":"draft"}]}]},
        {"type":"taskItem","attrs":{"checked":false},"content":[{"type":"paragraph","content":[{"type":"text","text":"review"}]}]}
    ]},
    {"type":"orderedList","attrs":{"start":1},"content":[
        {"type":"listItem","content":[{"type":"paragraph","content":[{"type":"text","text":"first"}]}]}
    ]},
    {"type":"codeBlock","attrs":{"language":"rust"},"content":[{"type":"text","text":"let x = 1;\n  let y = 2;"}]},
    {"type":"blockquote","content":[{"type":"paragraph","content":[{"type":"text","text":"quoted"}]}]},
    {"type":"table","content":[
        {"type":"tableRow","content":[
            {"type":"tableHeader","content":[{"type":"paragraph","content":[{"type":"text","text":"Day"}]}]},
            {"type":"tableHeader","content":[{"type":"paragraph","content":[{"type":"text","text":"Task"}]}]}
        ]},
        {"type":"tableRow","content":[
            {"type":"tableCell","content":[{"type":"paragraph"}]},
            {"type":"tableCell","content":[{"type":"paragraph"}]}
        ]},
        {"type":"tableRow","content":[
            {"type":"tableCell","content":[{"type":"paragraph","content":[{"type":"text","text":"Mon"}]}]},
            {"type":"tableCell","content":[{"type":"paragraph","content":[{"type":"text","text":"Write"}]}]}
        ]}
    ]},
    {"type":"horizontalRule"}
]}"#;

fn s(text: &str) -> String {
    text.to_string()
}

#[test]
fn test_editor_json_to_blocks() {
    let blocks = extract_content_blocks(RICH_PAGE);
    assert_eq!(
        blocks,
        vec![
            ExportBlock::Heading {
                level: 1,
                text: s("Weekly plan")
            },
            ExportBlock::Paragraph {
                text: s("Ship the export path.")
            },
            ExportBlock::TaskList {
                items: vec![
                    TaskItem {
                        checked: true,
                        text: s("draft")
                    },
                    TaskItem {
                        checked: false,
                        text: s("review")
                    },
                ]
            },
            ExportBlock::List {
                ordered: true,
                items: vec![s("first")]
            },
            ExportBlock::Code {
                text: s("let x = 1;\n  let y = 2;")
            },
            ExportBlock::Quote { text: s("quoted") },
            ExportBlock::Table {
                rows: vec![vec![s("Day"), s("Task")], vec![s("Mon"), s("Write")]]
            },
            ExportBlock::HorizontalRule,
        ]
    );
}

#[test]
fn test_legacy_markdown_content() {
    let blocks = extract_content_blocks("## Notes\n\n- [ ] call\n- [x] mail\n\nplain *text*\n");
    assert_eq!(
        blocks,
        vec![
            ExportBlock::Heading {
                level: 2,
                text: s("Notes")
            },
            ExportBlock::TaskList {
                items: vec![
                    TaskItem {
                        checked: false,
                        text: s("call")
                    },
                    TaskItem {
                        checked: true,
                        text: s("mail")
                    },
                ]
            },
            ExportBlock::Paragraph {
                text: s("plain text")
            },
        ]
    );
}

#[test]
fn test_empty_document_falls_back_to_text() {
    let doc = Document::from_blocks(vec![DocumentNode::paragraph("")]);
    assert_eq!(
        extract_content_blocks(&doc.to_json()),
        vec![ExportBlock::Paragraph { text: String::new() }]
    );
    assert_eq!(
        extract_content_blocks(""),
        vec![ExportBlock::Paragraph { text: String::new() }]
    );
}

#[test]
fn test_hard_break_keeps_words_apart() {
    let doc = Document::from_blocks(vec![DocumentNode::new(
        NodeKind::Paragraph,
        vec![
            DocumentNode::text("line1"),
            DocumentNode::new(NodeKind::HardBreak, Vec::new()),
            DocumentNode::text("line2"),
        ],
    )]);
    assert_eq!(
        extract_content_blocks(&doc.to_json()),
        vec![ExportBlock::Paragraph {
            text: s("line1 line2")
        }]
    );
}

#[test]
fn test_payload_pages_follow_selection() {
    let nodes = vec![
        PrintableNode {
            id: s("a"),
            name: s("Parent"),
            content: RICH_PAGE.to_string(),
            depth: 0,
        },
        PrintableNode {
            id: s("b"),
            name: s("Child"),
            content: String::new(),
            depth: 1,
        },
    ];
    let payload = ExportPayload::build("Parent", &nodes, ExportTheme::Light, Typography::default());
    assert_eq!(payload.pages.len(), 2);
    assert_eq!(payload.pages[0].blocks.len(), 8);
    assert_eq!(payload.pages[1].depth, 1);
}

#[tokio::test]
async fn test_export_current_page_to_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = AppConfig::with_root(temp_dir.path());
    let mut app = AppController::open(config.clone()).await?;

    let id = app.workspace().add_node(None).await?.unwrap();
    app.open_page(&id).await?;
    app.session_mut().unwrap().edit(|doc| {
        doc.set_content(vec![
            DocumentNode::heading(1, "Trip: Rome/Paris"),
            DocumentNode::paragraph("Pack light."),
        ]);
        Ok(())
    })?;

    let path = app
        .export(PrintScope::Current, ExportOptions::default())
        .await?
        .expect("page exported");
    assert_eq!(path, config.export_dir.join("Trip Rome Paris.txt"));

    let text = std::fs::read_to_string(&path)?;
    assert!(text.starts_with("Trip: Rome/Paris\n"));
    assert!(text.contains("# Trip: Rome/Paris"));
    assert!(text.contains("Pack light."));

    app.shutdown().await
}

#[tokio::test]
async fn test_export_without_open_page_selects_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let app = AppController::open(AppConfig::with_root(temp_dir.path())).await?;

    assert!(app
        .export(PrintScope::Current, ExportOptions::default())
        .await?
        .is_none());

    // an empty space has nothing to print either
    assert!(app
        .export(PrintScope::Space, ExportOptions::default())
        .await?
        .is_none());
    app.shutdown().await
}
