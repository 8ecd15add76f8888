// src/report/markdown.rs
// =============================================================================
// Small helpers that format the individual lines of the report.
//
// Depth is shown as an arrow whose shaft grows with the depth:
//   depth 0 -> ">"
//   depth 1 -> "->"
//   depth 2 -> "-->"
// =============================================================================

pub fn depth_arrow(depth: usize) -> String {
    format!("{}>", "-".repeat(depth))
}

pub fn heading(text: &str, level: usize) -> String {
    format!("{} {}", "#".repeat(level), text)
}

// A heading that belongs to a crawled page, indented by the page's depth
pub fn page_heading(text: &str, level: usize, depth: usize) -> String {
    heading(&format!("{} {}", depth_arrow(depth), text), level)
}

pub fn link_info(url: &str, depth: usize, broken: bool) -> String {
    let kind = if broken { "broken link" } else { "link to" };
    format!("<br>{} {} <a>{}</a>", depth_arrow(depth), kind, url)
}

pub fn depth_marker(depth: usize) -> String {
    format!("<br>depth:{}", depth)
}

// Splits an "h{level}:{text}" string as produced by the page analyzer
//
// The level is a single digit from 1 to 6. Returns None for anything else.
pub fn parse_heading(raw: &str) -> Option<(usize, &str)> {
    let (level, text) = raw.strip_prefix('h')?.split_once(':')?;
    match level.as_bytes() {
        [digit @ b'1'..=b'6'] => Some((usize::from(digit - b'0'), text)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_arrow() {
        assert_eq!(depth_arrow(0), ">");
        assert_eq!(depth_arrow(3), "--->");
    }

    #[test]
    fn test_link_info() {
        assert_eq!(
            link_info("https://a.test/", 0, false),
            "<br>> link to <a>https://a.test/</a>"
        );
        assert_eq!(
            link_info("https://a.test/x", 2, true),
            "<br>--> broken link <a>https://a.test/x</a>"
        );
    }

    #[test]
    fn test_page_heading() {
        assert_eq!(page_heading("Install", 2, 1), "## -> Install");
    }

    #[test]
    fn test_parse_heading() {
        assert_eq!(parse_heading("h2:Getting started"), Some((2, "Getting started")));
        assert_eq!(parse_heading("h1:Ratio 1:2"), Some((1, "Ratio 1:2")));
        assert_eq!(parse_heading("h1:"), Some((1, "")));
        assert_eq!(parse_heading("h7:Too deep"), None);
        assert_eq!(parse_heading("h0:Zero"), None);
        assert_eq!(parse_heading("p:Paragraph"), None);
        assert_eq!(parse_heading("h2 no colon"), None);
        assert_eq!(parse_heading("h01:Leading zero"), None);
        assert_eq!(parse_heading("h+1:Plus sign"), None);
        assert_eq!(parse_heading("h12:Two digits"), None);
    }
}
