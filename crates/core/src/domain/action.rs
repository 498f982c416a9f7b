use std::fmt;

use serde::{Deserialize, Serialize};

/// The timestamp actions offered in the Kronos menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimestampAction {
    #[serde(rename = "clock-in")]
    ClockIn,
    #[serde(rename = "clock-out")]
    ClockOut,
    #[serde(rename = "break-15")]
    Break15,
    #[serde(rename = "break-30")]
    Break30,
    #[serde(rename = "break-60")]
    Break60,
    #[serde(rename = "break-90")]
    Break90,
    #[serde(rename = "back")]
    Back,
}

impl TimestampAction {
    /// Menu order.
    pub const ALL: [TimestampAction; 7] = [
        Self::ClockIn,
        Self::Break15,
        Self::Break30,
        Self::Break60,
        Self::Break90,
        Self::Back,
        Self::ClockOut,
    ];

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.code() == code)
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::ClockIn => "clock-in",
            Self::ClockOut => "clock-out",
            Self::Break15 => "break-15",
            Self::Break30 => "break-30",
            Self::Break60 => "break-60",
            Self::Break90 => "break-90",
            Self::Back => "back",
        }
    }

    /// Label shown in the selector, with its Slack emoji.
    pub fn menu_label(self) -> &'static str {
        match self {
            Self::ClockIn => ":clock1: Clock In",
            Self::ClockOut => ":house: Clock Out",
            Self::Break15 => ":coffee: Break 15 mins.",
            Self::Break30 => ":coffee: Break 30 mins.",
            Self::Break60 => ":knife_fork_plate: Break 60 mins. / Lunch",
            Self::Break90 => ":coffee: Break 90 mins.",
            Self::Back => ":arrow_backward: Back from break",
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            Self::ClockIn => "has clocked in",
            Self::ClockOut => "has clocked out",
            Self::Break15 => "is on a 15-minute break",
            Self::Break30 => "is on a 30-minute break",
            Self::Break60 => "is on a 60-minute break / lunch",
            Self::Break90 => "is on a 90-minute break",
            Self::Back => "is back from break",
        }
    }
}

impl fmt::Display for TimestampAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Renders the acknowledgement sentence for `action_code`.
///
/// Unknown codes are a normal outcome and render a fallback sentence. A
/// non-empty `note` is appended in quotes.
pub fn describe_action(action_code: &str, actor_id: &str, note: &str) -> String {
    let mention = format!("<@{actor_id}>");
    let message = match TimestampAction::parse(action_code) {
        Some(action) => format!("{mention} {}.", action.phrase()),
        None => format!("{mention} used an unknown command."),
    };

    if note.is_empty() {
        message
    } else {
        format!("{message} \"{note}\"")
    }
}
