//! MessageView scenarios driven through the public event API.

use chatline_tui_messages::{
    parse_jsonl, AgentEvent, ItemKind, MessageView, ToolCallUpdate, ToolStatus, ViewEffect,
};
use chatline_tui_render::line_text;
use ratatui::{backend::TestBackend, Terminal};
use serde_json::{json, Map, Value};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn text(s: &str) -> AgentEvent {
    AgentEvent::AppendText {
        text: s.to_string(),
    }
}

fn draw(view: &mut MessageView, width: u16, height: u16) -> Terminal<TestBackend> {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| view.draw(frame, frame.area())).unwrap();
    terminal
}

#[test]
fn test_streaming_text_scenario() {
    let mut view = MessageView::default();

    view.apply(text(""));
    assert!(view.is_busy());
    assert!(view.items().is_empty());

    view.apply(text("Hello"));
    assert!(!view.is_busy());
    assert_eq!(view.items().len(), 1);

    view.apply(text(" world"));
    assert_eq!(view.items().len(), 1);
    match view.items()[0].kind() {
        ItemKind::Text(block) => assert_eq!(block.content, "Hello world"),
        other => panic!("expected text, got {}", other.name()),
    }
}

#[test]
fn test_tool_lifecycle_scenario() {
    let mut view = MessageView::default();
    view.apply(AgentEvent::ToolCall(ToolCallUpdate {
        call_id: "t1".to_string(),
        status: "pending".to_string(),
        input: object(json!({"command": "ls"})),
        ..Default::default()
    }));
    view.apply(AgentEvent::ToolCall(ToolCallUpdate {
        call_id: "t1".to_string(),
        status: "completed".to_string(),
        output: "a.txt\nb.txt".to_string(),
        ..Default::default()
    }));

    assert_eq!(view.items().len(), 1);
    let tool = view.items()[0].kind().tool().unwrap();
    assert_eq!(tool.status, ToolStatus::Success);
    assert!(tool.output.contains("a.txt") && tool.output.contains("b.txt"));

    let transcript = view.transcript(80);
    assert!(transcript.contains("a.txt"));
    assert!(transcript.contains("b.txt"));
    assert!(!transcript.contains("hidden"));
}

#[test]
fn test_cache_survives_unrelated_updates() {
    let mut view = MessageView::default();
    view.resize(60, 20);
    view.apply(text("first"));
    view.apply(AgentEvent::Divider { iteration: 1 });
    let generation = view.items()[0].render_generation();

    view.apply(AgentEvent::UserMessage {
        text: "more".to_string(),
    });
    view.apply(AgentEvent::Divider { iteration: 2 });
    assert_eq!(view.items()[0].render_generation(), generation);
}

#[test]
fn test_index_stays_consistent_through_promotion() {
    let mut view = MessageView::default();
    view.resize(60, 20);
    for (id, status) in [("a", "pending"), ("s", "pending"), ("b", "running")] {
        view.apply(AgentEvent::ToolCall(ToolCallUpdate {
            call_id: id.to_string(),
            status: status.to_string(),
            ..Default::default()
        }));
    }
    view.apply(AgentEvent::ToolCall(ToolCallUpdate {
        call_id: "s".to_string(),
        status: "completed".to_string(),
        input: object(json!({"subagent_type": "explore"})),
        session_id: "ses_7".to_string(),
        ..Default::default()
    }));

    assert_eq!(view.items().len(), 3);
    assert!(matches!(view.items()[1].kind(), ItemKind::Subagent(_)));
    assert!(view.tool_index().dangling_entries(view.items()).is_empty());
}

#[test]
fn test_click_subagent_emits_effect() {
    let mut view = MessageView::default();
    view.apply(AgentEvent::ToolCall(ToolCallUpdate {
        call_id: "s".to_string(),
        status: "completed".to_string(),
        input: object(json!({"subagent_type": "explore", "description": "scan"})),
        session_id: "ses_1".to_string(),
        ..Default::default()
    }));
    draw(&mut view, 60, 20);

    assert_eq!(
        view.click(5, 0),
        Some(ViewEffect::OpenSubagent {
            session_id: "ses_1".to_string(),
            subagent_type: "explore".to_string(),
        })
    );
    assert_eq!(view.click(5, 19), None);
}

#[test]
fn test_click_expands_truncated_tool() {
    let output: Vec<String> = (1..=15).map(|i| format!("row {i}")).collect();
    let mut view = MessageView::default();
    view.apply(AgentEvent::ToolCall(ToolCallUpdate {
        call_id: "t".to_string(),
        status: "completed".to_string(),
        kind: "bash".to_string(),
        output: output.join("\n"),
        ..Default::default()
    }));
    draw(&mut view, 60, 40);
    assert!(view.transcript(60).contains("… (5 lines hidden)"));

    assert_eq!(view.click(3, 1), None);
    assert_eq!(view.items()[0].is_expanded(), Some(true));
    let transcript = view.transcript(60);
    assert!(transcript.contains("row 15"));
    assert!(!transcript.contains("hidden"));
}

#[test]
fn test_autoscroll_follows_stream_until_user_scrolls() {
    let mut view = MessageView::default();
    for i in 0..30 {
        view.apply(AgentEvent::UserMessage {
            text: format!("message {i}"),
        });
    }
    let terminal = draw(&mut view, 40, 10);
    assert!(view.viewport().is_at_bottom());

    let buffer = terminal.backend().buffer();
    let rows: Vec<String> = (0..10)
        .map(|y| (0..40).map(|x| buffer[(x, y)].symbol().to_string()).collect())
        .collect();
    assert!(rows.iter().any(|r| r.contains("message 29")));

    let up = crossterm::event::KeyEvent::new(
        crossterm::event::KeyCode::Up,
        crossterm::event::KeyModifiers::NONE,
    );
    assert!(view.handle_key(&up));
    let offset = view.viewport().offset();
    view.apply(text("new content"));
    assert_eq!(view.viewport().offset(), offset);
    assert!(!view.viewport().is_auto_scroll());
}

#[test]
fn test_replay_stream() {
    let stream = r#"
{"type":"user_message","text":"fix the bug"}
{"type":"append_thinking","text":""}
{"type":"append_thinking","text":"Looking at the code"}
{"type":"tool_call","call_id":"e1","kind":"edit","status":"pending","input":{"filePath":"src/lib.rs"}}
{"type":"tool_call","call_id":"e1","status":"completed","input":{"filePath":"src/lib.rs","oldString":"let x = 1;\n","newString":"let x = 2;\n"}}
{"type":"append_text","text":"Done."}
{"type":"finish","duration_ms":2300,"model":"model-a","provider":"acme"}
"#;
    let mut view = MessageView::default();
    for event in parse_jsonl(stream).unwrap() {
        view.apply(event);
    }

    let kinds: Vec<&str> = view.items().iter().map(|i| i.kind().name()).collect();
    assert_eq!(kinds, vec!["user", "thinking", "tool", "text", "info"]);

    let transcript = view.transcript(100);
    assert!(transcript.contains("src/lib.rs  +1 -1"));
    assert!(transcript.contains("Thought"));
    assert!(transcript.contains("◆ model-a · acme · 2.3s"));

    let first_line = line_text(&view.items()[4].render_fresh(100, view.context())[0]);
    assert_eq!(first_line, "  ◆ model-a · acme · 2.3s");
}
