use std::fmt::Write;

use frontdesk_core::{HelpRequest, RequestBoard, timestamp};

const STYLE: &str = r#"
    body { font-family: ui-sans-serif, system-ui, sans-serif; margin: 24px; background: #f7f9fc; color: #14213d; }
    .card { background: white; border: 1px solid #dfe7f3; border-radius: 10px; padding: 12px; margin-bottom: 16px; }
    .grid { display: grid; grid-template-columns: 1fr 1fr 1fr; gap: 16px; }
    textarea, input[type=text] { width: 100%; box-sizing: border-box; }
    .muted { color: #6b7a90; font-size: 0.85em; }
"#;

const ASK_BODY: &str = r#"
  <h1>Ask AI</h1>
  <div class="card">
    <input type="text" id="question" placeholder="Type your question" />
    <button onclick="ask()">Ask</button>
    <pre id="answer"></pre>
  </div>
  <div class="card">
    <button onclick="joinVoice()">Talk to us</button>
    <pre id="voice"></pre>
  </div>
  <script>
    async function ask() {
      const question = document.getElementById('question').value;
      const res = await fetch('/receive_call', {
        method: 'POST',
        headers: {'content-type': 'application/json'},
        body: JSON.stringify({question})
      });
      const el = document.getElementById('answer');
      if (!res.ok) { el.textContent = await res.text(); return; }
      el.textContent = (await res.json()).response;
    }
    async function joinVoice() {
      const res = await fetch('/get_livekit_token');
      const el = document.getElementById('voice');
      if (!res.ok) { el.textContent = await res.text(); return; }
      const t = await res.json();
      el.textContent = `room=${t.room}\nidentity=${t.identity}\nurl=${t.url}`;
    }
  </script>
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head>\n  <meta charset=\"utf-8\" />\n  <title>{title}</title>\n  <style>{STYLE}</style>\n</head>\n<body>{body}</body>\n</html>"
    )
}

pub fn ask() -> String {
    page("Ask AI", ASK_BODY)
}

pub fn dashboard(board: &RequestBoard) -> String {
    let mut body = String::from("\n  <h1>Supervisor Dashboard</h1>\n  <div class=\"grid\">\n");

    body.push_str("    <div class=\"card\"><h3>Pending</h3>\n");
    if board.pending.is_empty() {
        body.push_str("      <p class=\"muted\">Nothing waiting.</p>\n");
    }
    for req in &board.pending {
        let _ = writeln!(
            body,
            r#"      <form method="post" action="/supervisor/answer">
        <b>#{id}</b> {question}<br/><span class="muted">asked {asked}</span>
        <input type="hidden" name="id" value="{id}" />
        <textarea name="answer" rows="2"></textarea>
        <button type="submit">Answer</button>
      </form><hr/>"#,
            id = req.id,
            question = escape_html(&req.question),
            asked = timestamp::display(&req.created_at),
        );
    }
    body.push_str("    </div>\n");

    body.push_str("    <div class=\"card\"><h3>Resolved</h3>\n");
    for req in &board.resolved {
        let when = req.resolved_at.as_ref().map(timestamp::display);
        push_settled(&mut body, req, req.answer.as_deref().unwrap_or_default(), when);
    }
    body.push_str("    </div>\n");

    body.push_str("    <div class=\"card\"><h3>Unresolved</h3>\n");
    for req in &board.unresolved {
        let when = req.timeout_at.as_ref().map(timestamp::display);
        push_settled(&mut body, req, "timed out", when);
    }
    body.push_str("    </div>\n  </div>\n");

    page("Supervisor Dashboard", &body)
}

fn push_settled(body: &mut String, req: &HelpRequest, outcome: &str, when: Option<String>) {
    let _ = writeln!(
        body,
        "      <div><b>#{}</b> {}<br/>{} <span class=\"muted\">{}</span></div><hr/>",
        req.id,
        escape_html(&req.question),
        escape_html(outcome),
        when.unwrap_or_default(),
    );
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_in_questions() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn empty_board_says_nothing_waiting() {
        let html = dashboard(&RequestBoard::default());
        assert!(html.contains("Nothing waiting."));
        assert!(!html.contains("<form"));
    }
}
