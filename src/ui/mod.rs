//! Server-rendered chat widget.
//!
//! Templates live in `templates/` and are compiled into the binary. Every
//! template name ends in `.html`, so minijinja escapes all interpolated text.
//!
//! # Structure
//!
//! - `page.html`: full page (sidebar + chat shell)
//! - `sidebar.html`: brand, quick prompts, campus resources, export link
//! - `chat/shell.html`: the swappable conversation panel
//! - `chat/header.html`, `chat/message_list.html`, `chat/input_area.html`

use std::fmt::Write as _;

use minijinja::{Environment, context};
use serde::Serialize;

use crate::config::WidgetConfig;
use crate::conversation::{Conversation, Message, Origin};

const TEMPLATES: &[(&str, &str)] = &[
    ("page.html", include_str!("../../templates/page.html")),
    ("sidebar.html", include_str!("../../templates/sidebar.html")),
    ("chat/shell.html", include_str!("../../templates/chat/shell.html")),
    ("chat/header.html", include_str!("../../templates/chat/header.html")),
    (
        "chat/message_list.html",
        include_str!("../../templates/chat/message_list.html"),
    ),
    (
        "chat/input_area.html",
        include_str!("../../templates/chat/input_area.html"),
    ),
];

/// Label shown under user messages.
const USER_LABEL: &str = "You";

/// Per-message template data.
#[derive(Debug, Serialize)]
struct MessageView<'a> {
    id: u64,
    origin: &'static str,
    author: &'a str,
    lines: Vec<&'a str>,
}

/// Renders the widget for a conversation.
#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
    widget: WidgetConfig,
}

impl Renderer {
    pub fn new(widget: WidgetConfig) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env, widget })
    }

    /// Full HTML page.
    pub fn page(&self, conversation: &Conversation) -> Result<String, minijinja::Error> {
        self.render("page.html", conversation)
    }

    /// The conversation panel alone, for HTMX swaps.
    pub fn panel(&self, conversation: &Conversation) -> Result<String, minijinja::Error> {
        self.render("chat/shell.html", conversation)
    }

    /// Plain-text transcript for download.
    #[must_use]
    pub fn transcript(&self, conversation: &Conversation) -> String {
        let mut out = format!(
            "{} transcript\nConversation: {}\nStarted: {}\n\n",
            self.widget.assistant_name,
            conversation.id(),
            conversation.created_at().to_rfc3339(),
        );
        for message in conversation.list() {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "{}: {}", self.author(message.origin()), message.text());
        }
        out
    }

    fn author(&self, origin: Origin) -> &str {
        match origin {
            Origin::User => USER_LABEL,
            Origin::Assistant => &self.widget.assistant_name,
        }
    }

    fn render(&self, name: &str, conversation: &Conversation) -> Result<String, minijinja::Error> {
        let messages = conversation.list();
        let views: Vec<MessageView<'_>> = messages.iter().map(|m| self.view(m)).collect();

        self.env.get_template(name)?.render(context! {
            conversation_id => conversation.id(),
            widget => &self.widget,
            messages => views,
            status => conversation.status(),
            draft => conversation.draft(),
        })
    }

    fn view<'a>(&'a self, message: &'a Message) -> MessageView<'a> {
        MessageView {
            id: message.id(),
            origin: message.origin().as_str(),
            author: self.author(message.origin()),
            lines: message.text().split('\n').collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::DEFAULT_WELCOME;

    fn renderer() -> Renderer {
        Renderer::new(WidgetConfig::default()).unwrap()
    }

    #[test]
    fn test_page_contains_widget_pieces() {
        let conversation = Conversation::new("conv-1", DEFAULT_WELCOME);
        let html = renderer().page(&conversation).unwrap();

        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("Campusly"));
        assert!(html.contains(r#"value="conv-1""#));
        assert!(html.contains("Library hours"));
        assert!(html.contains("Report a facility issue"));
        assert!(html.contains("it-support@vit.ac.in"));
        assert!(html.contains("/api/conversations/conv-1/transcript"));
        assert!(html.contains(">Online<"));
    }

    #[test]
    fn test_every_submit_path_disables_all_inputs() {
        let conversation = Conversation::new("conv-1", DEFAULT_WELCOME);
        let html = renderer().page(&conversation).unwrap();

        let quick_prompt_disables =
            r#"hx-disabled-elt=".quick-prompt, #chat-form button, #chat-form input[name='message']""#;
        let quick_prompt_forms = html.matches(quick_prompt_disables).count();
        assert_eq!(quick_prompt_forms, WidgetConfig::default().quick_prompts.len());
        assert!(html.contains(
            r#"hx-disabled-elt="find input[name='message'], find button, .quick-prompt""#
        ));
        assert!(html.contains(r#"<script src="/static/vendor/htmx-2.0.8.min.js"></script>"#));
    }

    #[test]
    fn test_panel_escapes_message_text() {
        let conversation = Conversation::new("conv-1", DEFAULT_WELCOME);
        let id = conversation.next_id();
        conversation.append(Message::new(id, Origin::User, "<script>alert(1)</script>"));

        let html = renderer().panel(&conversation).unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.starts_with(r#"<main id="conversation-panel""#));
    }

    #[test]
    fn test_panel_splits_lines() {
        let conversation = Conversation::new("conv-1", "line one\nline two");
        let html = renderer().panel(&conversation).unwrap();
        assert!(html.contains("line one<br>line two<br>"));
    }

    #[test]
    fn test_panel_reflects_status() {
        let conversation = Conversation::new("conv-1", DEFAULT_WELCOME);
        conversation.set_connected(false);
        conversation.set_pending(true);

        let html = renderer().panel(&conversation).unwrap();

        assert!(html.contains(">Offline<"));
        assert!(html.contains("typing htmx-indicator active"));
        assert!(html.contains("Campusly is typing..."));
        assert!(html.contains("disabled>Send</button>"));
    }

    #[test]
    fn test_panel_keeps_draft() {
        let conversation = Conversation::new("conv-1", DEFAULT_WELCOME);
        conversation.set_draft("Library ho\"urs");

        let html = renderer().panel(&conversation).unwrap();

        assert!(html.contains("value=\"Library ho&quot;urs\""));
    }

    #[test]
    fn test_transcript_export() {
        let conversation = Conversation::new("conv-1", DEFAULT_WELCOME);
        let id = conversation.next_id();
        conversation.append(Message::new(id, Origin::User, "Library hours"));
        let id = conversation.next_id();
        conversation.append(Message::new(id, Origin::Assistant, "9am–9pm"));

        let text = renderer().transcript(&conversation);

        assert!(text.starts_with("Campusly transcript\nConversation: conv-1\n"));
        assert!(text.ends_with(&format!(
            "Campusly: {DEFAULT_WELCOME}\nYou: Library hours\nCampusly: 9am–9pm\n"
        )));
    }
}
