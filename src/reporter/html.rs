//! XHTML rendering of ANSI-coloured script output.

use regex::Regex;
use std::sync::LazyLock;

pub const HTML_HEADER: &str = r#"
<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<meta http-equiv="Content-Type" content="application/xml+xhtml; charset=UTF-8"/>
<title>stdin</title>
</head>
<body style="color:white; background-color:black">
<pre>"#;

pub const HTML_FOOTER: &str = r#"
</pre>
</body>
</html>"#;

/// CSI sequences, charset designations and OSC strings.
static ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b(?:\[([0-9;?]*)([@-~])|[()][0-9A-Za-z]|\][^\x07\x1b]*(?:\x07|\x1b\\))")
        .expect("escape sequence pattern is valid")
});

const BASIC: [&str; 8] = [
    "#000000", "#aa0000", "#00aa00", "#aa5500", "#0000aa", "#aa00aa", "#00aaaa", "#aaaaaa",
];
const BRIGHT: [&str; 8] = [
    "#555555", "#ff5555", "#55ff55", "#ffff55", "#5555ff", "#ff55ff", "#55ffff", "#ffffff",
];

/// Full report page: header, converted output, footer.
pub fn render_page(raw: &[u8]) -> Vec<u8> {
    let body = ansi_to_html(raw);
    let mut page = Vec::with_capacity(HTML_HEADER.len() + body.len() + HTML_FOOTER.len());
    page.extend_from_slice(HTML_HEADER.as_bytes());
    page.extend_from_slice(body.as_bytes());
    page.extend_from_slice(HTML_FOOTER.as_bytes());
    page
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Style {
    fg: Option<String>,
    bg: Option<String>,
    bold: bool,
    faint: bool,
    italic: bool,
    underline: bool,
    strike: bool,
}

impl Style {
    fn css(&self) -> String {
        let mut rules = Vec::new();
        if let Some(fg) = &self.fg {
            rules.push(format!("color:{fg}"));
        }
        if let Some(bg) = &self.bg {
            rules.push(format!("background-color:{bg}"));
        }
        if self.bold {
            rules.push("font-weight:bold".to_string());
        }
        if self.faint {
            rules.push("opacity:0.67".to_string());
        }
        if self.italic {
            rules.push("font-style:italic".to_string());
        }
        match (self.underline, self.strike) {
            (true, true) => rules.push("text-decoration:underline line-through".to_string()),
            (true, false) => rules.push("text-decoration:underline".to_string()),
            (false, true) => rules.push("text-decoration:line-through".to_string()),
            (false, false) => {}
        }
        rules.join(";")
    }

    /// Apply one SGR parameter list.
    fn apply(&mut self, params: &str) {
        let codes: Vec<u32> = if params.is_empty() {
            vec![0]
        } else {
            params.split(';').map(|p| p.parse().unwrap_or(0)).collect()
        };

        let mut i = 0;
        while i < codes.len() {
            match codes[i] {
                0 => *self = Style::default(),
                1 => self.bold = true,
                2 => self.faint = true,
                3 => self.italic = true,
                4 => self.underline = true,
                9 => self.strike = true,
                22 => {
                    self.bold = false;
                    self.faint = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                29 => self.strike = false,
                c @ 30..=37 => self.fg = Some(BASIC[(c - 30) as usize].to_string()),
                39 => self.fg = None,
                c @ 40..=47 => self.bg = Some(BASIC[(c - 40) as usize].to_string()),
                49 => self.bg = None,
                c @ 90..=97 => self.fg = Some(BRIGHT[(c - 90) as usize].to_string()),
                c @ 100..=107 => self.bg = Some(BRIGHT[(c - 100) as usize].to_string()),
                c @ (38 | 48) => {
                    let (color, used) = extended_color(&codes[i + 1..]);
                    if c == 38 {
                        self.fg = color;
                    } else {
                        self.bg = color;
                    }
                    i += used;
                }
                _ => {}
            }
            i += 1;
        }
    }
}

/// Parse the tail of a `38`/`48` sequence; returns the colour and how many
/// parameters it consumed.
fn extended_color(rest: &[u32]) -> (Option<String>, usize) {
    match rest {
        [5, n, ..] => (Some(palette_256(*n)), 2),
        [2, r, g, b, ..] => (
            Some(format!("#{:02x}{:02x}{:02x}", r.min(&255), g.min(&255), b.min(&255))),
            4,
        ),
        _ => (None, rest.len()),
    }
}

fn palette_256(n: u32) -> String {
    match n {
        0..=7 => BASIC[n as usize].to_string(),
        8..=15 => BRIGHT[(n - 8) as usize].to_string(),
        16..=231 => {
            const LEVELS: [u32; 6] = [0, 95, 135, 175, 215, 255];
            let n = n - 16;
            format!(
                "#{:02x}{:02x}{:02x}",
                LEVELS[(n / 36) as usize],
                LEVELS[((n / 6) % 6) as usize],
                LEVELS[(n % 6) as usize]
            )
        }
        232..=255 => {
            let level = 8 + 10 * (n - 232);
            format!("#{level:02x}{level:02x}{level:02x}")
        }
        _ => BRIGHT[7].to_string(),
    }
}

/// Convert ANSI-coloured text to escaped HTML with inline-styled spans.
///
/// SGR sequences become `<span style="…">` elements; every other escape
/// sequence is dropped.
pub fn ansi_to_html(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let mut html = String::with_capacity(text.len());
    let mut style = Style::default();
    let mut span_open = false;
    let mut last = 0;

    for caps in ESCAPE.captures_iter(&text) {
        let Some(whole) = caps.get(0) else { continue };
        html.push_str(&html_escape(&text[last..whole.start()]));
        last = whole.end();

        if caps.get(2).map(|m| m.as_str()) != Some("m") {
            continue;
        }

        let mut next = style.clone();
        next.apply(caps.get(1).map_or("", |m| m.as_str()));
        if next == style {
            continue;
        }
        if span_open {
            html.push_str("</span>");
            span_open = false;
        }
        let css = next.css();
        if !css.is_empty() {
            html.push_str(&format!("<span style=\"{css}\">"));
            span_open = true;
        }
        style = next;
    }

    html.push_str(&html_escape(&text[last..]));
    if span_open {
        html.push_str("</span>");
    }
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
