//! View-agnostic render model of the roster.

use shared::domain::{Activity, Roster};

pub const NO_PARTICIPANTS_PLACEHOLDER: &str = "No participants yet";
pub const ROSTER_LOAD_FAILED: &str = "Failed to load activities. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalControl {
    pub activity: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub email: String,
    pub remove: RemovalControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCard {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub spots_left: i64,
    pub participants: Vec<ParticipantRow>,
}

impl ActivityCard {
    fn from_activity(activity: &Activity) -> Self {
        let participants = activity
            .participants
            .iter()
            .map(|email| ParticipantRow {
                email: email.clone(),
                remove: RemovalControl {
                    activity: activity.name.clone(),
                    email: email.clone(),
                },
            })
            .collect();
        Self {
            name: activity.name.clone(),
            description: activity.description.clone(),
            schedule: activity.schedule.clone(),
            spots_left: activity.spots_left(),
            participants,
        }
    }

    pub fn availability(&self) -> String {
        format!("{} spots left", self.spots_left)
    }

    /// `None` when there are participant rows to show instead.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.participants
            .is_empty()
            .then_some(NO_PARTICIPANTS_PLACEHOLDER)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterView {
    pub cards: Vec<ActivityCard>,
    /// Choices for the signup form's activity selector, rebuilt from scratch
    /// on every render.
    pub activity_options: Vec<String>,
}

impl RosterView {
    pub fn render(roster: &Roster) -> Self {
        Self {
            cards: roster.iter().map(ActivityCard::from_activity).collect(),
            activity_options: roster.names().map(str::to_string).collect(),
        }
    }

    pub fn card(&self, name: &str) -> Option<&ActivityCard> {
        self.cards.iter().find(|card| card.name == name)
    }
}
