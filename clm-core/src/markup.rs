//! Reads the small HTML subset the template and renderer produce into
//! display blocks.
//!
//! Recognised tags: `h1`-`h6`, `p`, `strong`/`b`, and `span` (a highlighted
//! answer). Anything else is dropped, keeping its text.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Heading(u8),
    Paragraph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentStyle {
    Plain,
    Bold,
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub style: SegmentStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    pub segments: Vec<Segment>,
}

impl Block {
    fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            segments: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn push(&mut self, text: &str, style: SegmentStyle) {
        match self.segments.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.segments.push(Segment {
                text: text.to_string(),
                style,
            }),
        }
    }

    /// Drop leading whitespace of the first segment and trailing whitespace
    /// of the last, then any segments left empty.
    fn trim(&mut self) {
        if let Some(first) = self.segments.first_mut() {
            first.text = first.text.trim_start().to_string();
        }
        if let Some(last) = self.segments.last_mut() {
            last.text = last.text.trim_end().to_string();
        }
        self.segments.retain(|s| !s.text.is_empty());
    }
}

struct Parser {
    blocks: Vec<Block>,
    current: Option<Block>,
    bold: usize,
    highlight: usize,
}

impl Parser {
    fn style(&self) -> SegmentStyle {
        if self.highlight > 0 {
            SegmentStyle::Highlight
        } else if self.bold > 0 {
            SegmentStyle::Bold
        } else {
            SegmentStyle::Plain
        }
    }

    fn open_block(&mut self, kind: BlockKind) {
        self.close_block();
        self.current = Some(Block::new(kind));
    }

    fn close_block(&mut self) {
        if let Some(mut block) = self.current.take() {
            block.trim();
            if !block.segments.is_empty() {
                self.blocks.push(block);
            }
        }
    }

    fn text(&mut self, raw: &str) {
        let text: String = decode_entities(raw)
            .chars()
            .map(|c| if c == '\n' || c == '\t' || c == '\r' { ' ' } else { c })
            .collect();
        if text.is_empty() {
            return;
        }
        let style = self.style();
        match self.current.as_mut() {
            Some(block) => block.push(&text, style),
            None if !text.trim().is_empty() => {
                let mut block = Block::new(BlockKind::Paragraph);
                block.push(&text, style);
                self.current = Some(block);
            }
            None => {}
        }
    }

    fn tag(&mut self, tag: &str) {
        let closing = tag.starts_with('/');
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match (name.as_str(), closing) {
            ("p", false) => self.open_block(BlockKind::Paragraph),
            (h, false) if heading_level(h).is_some() => {
                self.open_block(BlockKind::Heading(heading_level(h).unwrap_or(1)))
            }
            ("p", true) => self.close_block(),
            (h, true) if heading_level(h).is_some() => self.close_block(),
            ("strong" | "b", false) => self.bold += 1,
            ("strong" | "b", true) => self.bold = self.bold.saturating_sub(1),
            ("span", false) => self.highlight += 1,
            ("span", true) => self.highlight = self.highlight.saturating_sub(1),
            ("br", _) => self.text(" "),
            _ => {}
        }
    }
}

fn heading_level(name: &str) -> Option<u8> {
    let digit = name.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

/// Split markup into display blocks. Never fails: an unterminated tag is
/// kept as text.
pub fn parse(html: &str) -> Vec<Block> {
    let mut parser = Parser {
        blocks: Vec::new(),
        current: None,
        bold: 0,
        highlight: 0,
    };

    let mut rest = html;
    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => match rest.find('>') {
                Some(end) => {
                    parser.tag(&rest[1..end]);
                    rest = &rest[end + 1..];
                }
                None => {
                    parser.text(rest);
                    rest = "";
                }
            },
            Some(start) => {
                parser.text(&rest[..start]);
                rest = &rest[start..];
            }
            None => {
                parser.text(rest);
                rest = "";
            }
        }
    }
    parser.close_block();
    parser.blocks
}

/// Block texts separated by blank lines. Highlight ranges on the Document
/// page index into this string.
pub fn to_plain_text(html: &str) -> String {
    parse(html)
        .iter()
        .map(Block::text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_and_segments() {
        let blocks = parse(
            "<h2>PENSION</h2>\n<p><strong>Employer:</strong> <span class=\"x\">Acme &amp; Co</span> ltd</p>",
        );
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Heading(2));
        assert_eq!(blocks[0].text(), "PENSION");

        let styles: Vec<_> = blocks[1].segments.iter().map(|s| s.style).collect();
        assert_eq!(
            styles,
            vec![
                SegmentStyle::Bold,
                SegmentStyle::Plain,
                SegmentStyle::Highlight,
                SegmentStyle::Plain
            ]
        );
        assert_eq!(blocks[1].text(), "Employer: Acme & Co ltd");
    }

    #[test]
    fn test_plain_text_joins_blocks() {
        assert_eq!(to_plain_text("<h1>A</h1>\n<p> b  c </p>\n<p></p> "), "A\n\nb  c");
    }

    #[test]
    fn test_stray_text_and_broken_tags() {
        let blocks = parse("loose text <p>x</p> <unclosed");
        assert_eq!(blocks[0].text(), "loose text");
        assert_eq!(blocks[1].text(), "x");
        assert_eq!(blocks[2].text(), "<unclosed");
    }

    #[test]
    fn test_escape_round_trip() {
        let raw = "<b>\"Tom & Jerry's\"</b>";
        assert_eq!(decode_entities(&escape_html(raw)), raw);
    }
}
