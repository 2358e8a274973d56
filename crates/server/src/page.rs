use shared::protocol::{Notice, NoticeKind};

const STYLE: &str = r#"
body {
    margin: 0;
    min-height: 100vh;
    display: flex;
    flex-direction: column;
    align-items: center;
    justify-content: center;
    font-family: system-ui, sans-serif;
    background: linear-gradient(135deg, #eff6ff 0%, #e0e7ff 100%);
}
h1 { font-size: 1.875rem; color: #1f2937; margin-bottom: 2rem; }
.counter-card {
    background: rgba(255, 255, 255, 0.9);
    border: 1px solid rgba(255, 255, 255, 0.3);
    border-radius: 1rem;
    box-shadow: 0 25px 50px -12px rgba(0, 0, 0, 0.25);
    padding: 2rem;
}
.counter-display {
    font-size: 4rem;
    font-weight: bold;
    color: #2563eb;
    text-align: center;
    margin: 2rem 0;
}
.controls { display: flex; gap: 1rem; justify-content: center; margin-top: 1.5rem; }
.controls button { font-size: 1.125rem; font-weight: 600; border-radius: 0.5rem; padding: 0.75rem 2rem; cursor: pointer; }
.increment { color: #fff; border: none; background: linear-gradient(45deg, #3b82f6 0%, #1d4ed8 100%); }
.reset { color: #374151; background: transparent; border: 2px solid #d1d5db; }
.notice { margin-top: 1rem; padding: 0.5rem 1rem; border-radius: 0.5rem; }
.notice-positive { background: #dcfce7; color: #166534; }
.notice-info { background: #dbeafe; color: #1e40af; }
.hints { margin-top: 2rem; text-align: center; color: #4b5563; font-size: 0.875rem; }
"#;

/// Full HTML for the counter page. Buttons post back to the page routes.
pub(crate) fn render_counter_page(count: i64, notice: Option<&Notice>) -> String {
    let notice_html = notice.map(render_notice).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Simple Counter</title>
<style>{STYLE}</style>
</head>
<body>
<h1>Simple Counter</h1>
<div class="counter-card">
<div class="counter-display" id="count">{count}</div>
<div class="controls">
<form method="post" action="/counter/increment"><button class="increment" type="submit">Increment</button></form>
<form method="post" action="/counter/reset"><button class="reset" type="submit">Reset</button></form>
</div>
</div>
{notice_html}
<div class="hints">
<p>Click "Increment" to increase the counter</p>
<p>Click "Reset" to set counter back to 0</p>
</div>
</body>
</html>
"#
    )
}

fn render_notice(notice: &Notice) -> String {
    let class = match notice.kind {
        NoticeKind::Positive => "notice-positive",
        NoticeKind::Info => "notice-info",
    };
    format!(
        r#"<div class="notice {class}" role="status">{}</div>"#,
        escape_html(&notice.text)
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
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
    fn page_shows_count_and_both_controls() {
        let html = render_counter_page(7, None);
        assert!(html.contains("Simple Counter"));
        assert!(html.contains(r#"id="count">7</div>"#));
        assert!(html.contains("Increment"));
        assert!(html.contains("Reset"));
        assert!(!html.contains("role=\"status\""));
    }

    #[test]
    fn notice_is_rendered_with_its_kind() {
        let html = render_counter_page(0, Some(&Notice::reset()));
        assert!(html.contains(r#"class="notice notice-info""#));
        assert!(html.contains("Counter reset to 0"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
