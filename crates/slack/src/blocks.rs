use orderwatch_core::{AnalysisResult, DetailEntry, FooterLink};
use serde::Serialize;

/// Slack rejects section blocks with more than ten fields.
pub const MAX_FIELDS_PER_SECTION: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        block_id: String,
        text: TextObject,
    },
    Divider {
        block_id: String,
    },
    Section {
        block_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    Context {
        block_id: String,
        elements: Vec<TextObject>,
    },
}

impl Block {
    pub fn block_id(&self) -> &str {
        match self {
            Self::Header { block_id, .. }
            | Self::Divider { block_id }
            | Self::Section { block_id, .. }
            | Self::Context { block_id, .. } => block_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn header(mut self, block_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.blocks
            .push(Block::Header { block_id: block_id.into(), text: TextObject::plain(text) });
        self
    }

    pub fn divider(mut self, block_id: impl Into<String>) -> Self {
        self.blocks.push(Block::Divider { block_id: block_id.into() });
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        let (text, fields) = builder.build();
        self.blocks.push(Block::Section { block_id: block_id.into(), text, fields });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
    fields: Vec<TextObject>,
}

impl SectionBuilder {
    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    pub fn field(&mut self, text: impl Into<String>) -> &mut Self {
        self.fields.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> (Option<TextObject>, Vec<TextObject>) {
        (self.text, self.fields)
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// Header, divider, narrative, chunked detail sections, divider, footer links.
pub fn order_summary_message(analysis: &AnalysisResult) -> MessageTemplate {
    let mut builder = MessageBuilder::new(format!("Order {} status", analysis.order_name))
        .header("order.summary.header.v1", analysis.header.clone())
        .divider("order.summary.divider.top.v1")
        .section("order.summary.narrative.v1", |section| {
            section.mrkdwn(analysis.narrative.join("\n"));
        });

    for (index, chunk) in analysis.details.chunks(MAX_FIELDS_PER_SECTION).enumerate() {
        builder = builder.section(format!("order.summary.details.{index}.v1"), |section| {
            for entry in chunk {
                section.field(detail_field(entry));
            }
        });
    }

    builder
        .divider("order.summary.divider.bottom.v1")
        .context("order.summary.footer.v1", |context| {
            for link in &analysis.footer_links {
                context.mrkdwn(footer_link(link));
            }
        })
        .build()
}

pub fn not_found_message(order_name: &str) -> MessageTemplate {
    MessageBuilder::new(format!("Order {order_name} not found"))
        .section("order.not_found.summary.v1", |section| {
            section.mrkdwn(format!(":mag: No order named `{order_name}` was found."));
        })
        .build()
}

pub fn lookup_failed_message(user_message: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(user_message.to_owned())
        .section("order.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {user_message}"));
        })
        .context("order.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

fn detail_field(entry: &DetailEntry) -> String {
    format!("*{}*\n{}", entry.label, entry.value)
}

fn footer_link(link: &FooterLink) -> String {
    format!("<{}|{}>", link.url, link.label)
}
