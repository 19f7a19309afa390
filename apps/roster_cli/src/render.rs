//! Terminal rendering of the UI event stream.

use std::fmt::Write as _;

use roster_client::{DisplayMessage, MessageKind, RosterView, UiEvent, UiVisibility};

/// Last known state of each screen region, folded from `UiEvent`s.
#[derive(Debug, Default)]
pub struct Screen {
    visibility: Option<UiVisibility>,
    roster: Option<RosterView>,
    roster_failure: Option<String>,
    messages: Vec<DisplayMessage>,
}

impl Screen {
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::SessionChanged(visibility) => self.visibility = Some(visibility),
            UiEvent::RosterRendered(view) => {
                self.roster = Some(view);
                self.roster_failure = None;
            }
            UiEvent::RosterFailed(text) => {
                self.roster = None;
                self.roster_failure = Some(text);
            }
            UiEvent::MessageShown(message) => self.messages.push(message),
            UiEvent::MessageCleared | UiEvent::SignupFormReset => {}
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match self.visibility.as_ref().and_then(|v| v.user_info.as_deref()) {
            Some(username) => {
                let _ = writeln!(out, "Signed in as {username}");
            }
            None => {
                let _ = writeln!(out, "Not signed in (run `roster login` to manage activities)");
            }
        }
        out.push('\n');

        if let Some(failure) = &self.roster_failure {
            let _ = writeln!(out, "{failure}");
        } else if let Some(view) = &self.roster {
            render_roster(&mut out, view);
            if self
                .visibility
                .as_ref()
                .is_some_and(|v| v.signup_form_visible)
            {
                render_signup_form(&mut out, view);
            }
        }

        for message in &self.messages {
            let _ = writeln!(out, "[{}] {}", kind_label(message.kind), message.text);
        }
        out
    }
}

fn kind_label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Success => "success",
        MessageKind::Error => "error",
        MessageKind::Info => "info",
    }
}

fn render_roster(out: &mut String, view: &RosterView) {
    for card in &view.cards {
        let _ = writeln!(out, "== {} ==", card.name);
        let _ = writeln!(out, "{}", card.description);
        let _ = writeln!(out, "Schedule: {}", card.schedule);
        let _ = writeln!(out, "Availability: {}", card.availability());
        match card.placeholder() {
            Some(placeholder) => {
                let _ = writeln!(out, "  ({placeholder})");
            }
            None => {
                let _ = writeln!(out, "Participants:");
                for row in &card.participants {
                    let _ = writeln!(
                        out,
                        "  - {}    [remove: roster unregister --activity {:?} --email {}]",
                        row.email, row.remove.activity, row.remove.email
                    );
                }
            }
        }
        out.push('\n');
    }
}

fn render_signup_form(out: &mut String, view: &RosterView) {
    let _ = writeln!(
        out,
        "Sign up a student: roster signup --activity <ACTIVITY> --email <EMAIL>"
    );
    let _ = writeln!(out, "  activities: {}", view.activity_options.join(", "));
    out.push('\n');
}
