/// Minimal markup writer used by the Render phase.
///
/// Attribute values and text content are entity-escaped; the engine does
/// not attempt to reproduce the legacy renderer's exact output.
#[derive(Debug, Default)]
pub struct HtmlWriter {
    buf: String,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &mut self,
        tag: &str,
        attrs: &[(String, String)],
    ) {
        self.buf.push('<');
        self.buf.push_str(tag);
        self.write_attrs(attrs);
        self.buf.push('>');
    }

    pub fn self_closing(
        &mut self,
        tag: &str,
        attrs: &[(String, String)],
    ) {
        self.buf.push('<');
        self.buf.push_str(tag);
        self.write_attrs(attrs);
        self.buf.push_str(" />");
    }

    pub fn close(
        &mut self,
        tag: &str,
    ) {
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
    }

    pub fn text(
        &mut self,
        text: &str,
    ) {
        Self::escape_into(text, false, &mut self.buf);
    }

    /// Verbatim output for literal template content.
    pub fn raw(
        &mut self,
        content: &str,
    ) {
        self.buf.push_str(content);
    }

    pub fn into_string(self) -> String {
        self.buf
    }

    fn write_attrs(
        &mut self,
        attrs: &[(String, String)],
    ) {
        for (name, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(name);
            self.buf.push_str("=\"");
            Self::escape_into(value, true, &mut self.buf);
            self.buf.push('"');
        }
    }

    fn escape_into(
        input: &str,
        in_attribute: bool,
        out: &mut String,
    ) {
        for c in input.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' if in_attribute => out.push_str("&quot;"),
                _ => out.push(c),
            }
        }
    }
}
