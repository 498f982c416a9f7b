use serde::Serialize;

use kronos_core::TimestampAction;

pub const SELECT_ACTION_ID: &str = "select-action";
pub const SUBMIT_ACTION_ID: &str = "button-go";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        emoji: Option<bool>,
    },
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into(), emoji: None }
    }

    pub fn plain_emoji(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into(), emoji: Some(true) }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub action_id: String,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { text: TextObject::plain(label), style: None, value: None, action_id: action_id.into() }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub text: TextObject,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StaticSelect {
    pub placeholder: TextObject,
    pub options: Vec<SelectOption>,
    pub action_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Button(ButtonElement),
    StaticSelect(StaticSelect),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: TextObject,
    },
    Context {
        elements: Vec<TextObject>,
    },
    Divider,
    Section {
        text: TextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        block_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<Element>,
    },
    Actions {
        elements: Vec<Element>,
    },
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

    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Header { text: TextObject::plain_emoji(text) });
        self
    }

    pub fn context<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { elements: builder.build() });
        self
    }

    pub fn divider(mut self) -> Self {
        self.blocks.push(Block::Divider);
        self
    }

    pub fn section(mut self, text: TextObject) -> Self {
        self.blocks.push(Block::Section { text, block_id: None, accessory: None });
        self
    }

    pub fn select_section(
        mut self,
        block_id: impl Into<String>,
        text: TextObject,
        select: StaticSelect,
    ) -> Self {
        self.blocks.push(Block::Section {
            text,
            block_id: Some(block_id.into()),
            accessory: Some(Element::StaticSelect(select)),
        });
        self
    }

    pub fn actions<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<Element>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(Element::Button(button));
        self
    }

    fn build(self) -> Vec<Element> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain_emoji(text));
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

pub fn action_select() -> StaticSelect {
    StaticSelect {
        placeholder: TextObject::plain("Action"),
        options: TimestampAction::ALL
            .into_iter()
            .map(|action| SelectOption {
                text: TextObject::plain(action.menu_label()),
                value: action.code().to_owned(),
            })
            .collect(),
        action_id: SELECT_ACTION_ID.to_owned(),
    }
}

/// Ephemeral menu shown by `/services`. The selector lives in
/// `select_block_id`, which is where interaction flattening looks for the
/// chosen action.
pub fn welcome_menu(select_block_id: &str) -> MessageTemplate {
    MessageBuilder::new("Welcome to Kronos!")
        .header("Welcome to Kronos!")
        .context(|context| {
            context.plain(
                "Payreto's timestamp logging app, you may reuse the form below as needed.",
            );
        })
        .divider()
        .select_section(
            select_block_id,
            TextObject::mrkdwn("Please select a timestamp action to log..."),
            action_select(),
        )
        .actions(|actions| {
            actions.button(
                ButtonElement::new(SUBMIT_ACTION_ID, "Go").style(ButtonStyle::Primary).value("go"),
            );
        })
        .build()
}

pub fn acknowledgement_message(text: &str) -> MessageTemplate {
    MessageBuilder::new(text).section(TextObject::mrkdwn(text)).build()
}
