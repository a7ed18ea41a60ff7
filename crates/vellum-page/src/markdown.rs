//! Markdown import
//!
//! Renders markdown into a page body. Prose is rendered to HTML fragments by
//! pulldown-cmark; fenced code blocks become real `pre > code` elements so the
//! diagram scanner can find and replace them.

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::error::Result;
use crate::node::NodeId;
use crate::page::Page;

impl Page {
    /// Build a page whose body holds the rendered markdown
    #[must_use]
    pub fn from_markdown(markdown: &str) -> Self {
        let mut page = Self::new();
        let body = page.body();
        page.append_markdown(body, markdown)
            .expect("appending to the body of a fresh page cannot fail");
        page
    }

    /// Render markdown and append the result to `parent`
    pub fn append_markdown(&mut self, parent: NodeId, markdown: &str) -> Result<()> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut prose: Vec<Event<'_>> = Vec::new();
        let mut code: Option<(Option<String>, String)> = None;

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    self.flush_prose(parent, &mut prose)?;
                    code = Some((code_language(&kind), String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((language, text)) = code.take() {
                        self.append_code_block(parent, language.as_deref(), &text)?;
                    }
                }
                Event::Text(chunk) if code.is_some() => {
                    if let Some((_, text)) = code.as_mut() {
                        text.push_str(&chunk);
                    }
                }
                event if code.is_none() => prose.push(event),
                _ => {}
            }
        }

        self.flush_prose(parent, &mut prose)
    }

    /// Append `<pre><code class="language-…">text</code></pre>` to `parent`
    pub fn append_code_block(
        &mut self,
        parent: NodeId,
        language: Option<&str>,
        text: &str,
    ) -> Result<NodeId> {
        let pre = self.append_element(parent, "pre")?;
        let code = self.append_element(pre, "code")?;
        if let Some(language) = language {
            self.set_attribute(code, "class", format!("language-{language}"))?;
        }
        self.append_text(code, text)?;
        Ok(pre)
    }

    fn flush_prose(&mut self, parent: NodeId, prose: &mut Vec<Event<'_>>) -> Result<()> {
        if prose.is_empty() {
            return Ok(());
        }
        let mut html_output = String::new();
        html::push_html(&mut html_output, prose.drain(..));
        self.append_html(parent, html_output)?;
        Ok(())
    }
}

fn code_language(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info
            .split_ascii_whitespace()
            .next()
            .map(|lang| lang.to_string()),
        CodeBlockKind::Indented => None,
    }
}
