//! Minimal static HTML rendering for tables and embedded SVG charts.

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
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

/// Render a `<table>`; cells are escaped.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::from("<table>\n<thead><tr>");
    for h in headers {
        out.push_str(&format!("<th>{}</th>", escape(h)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// Wrap already-rendered body markup into a standalone page.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n<h2>{title}</h2>\n{body}</body>\n</html>\n",
        title = escape(title),
    )
}

const STYLE: &str = "body { font-family: sans-serif; margin: 1.5em; }
table { border-collapse: collapse; font-size: 13px; }
th, td { border: 1px solid #ccc; padding: 3px 8px; text-align: right; }
th { background: #f0f0f0; }
td:first-child { text-align: left; }
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("A&B <x> \"q\""), "A&amp;B &lt;x&gt; &quot;q&quot;");
    }

    #[test]
    fn table_and_page() {
        let t = table(&["Bond ID", "Spread (bp)"], &[vec!["X<1>".to_string(), "4.20".to_string()]]);
        assert!(t.contains("<th>Spread (bp)</th>"));
        assert!(t.contains("<td>X&lt;1&gt;</td><td>4.20</td>"));

        let p = page("DI & co", &t);
        assert!(p.starts_with("<!DOCTYPE html>"));
        assert!(p.contains("<title>DI &amp; co</title>"));
        assert!(p.contains(&t));
    }
}
