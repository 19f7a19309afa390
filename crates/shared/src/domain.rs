use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::protocol::ActivityDetails;

/// One extracurricular activity as last reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub max_participants: i64,
    pub participants: Vec<String>,
}

impl Activity {
    pub fn from_details(name: impl Into<String>, details: ActivityDetails) -> Self {
        Self {
            name: name.into(),
            description: details.description,
            schedule: details.schedule,
            max_participants: details.max_participants,
            participants: details.participants,
        }
    }

    /// Capacity is enforced by the server; this is display-only and can go
    /// negative if the server over-fills an activity.
    pub fn spots_left(&self) -> i64 {
        self.max_participants - self.participants.len() as i64
    }

    pub fn details(&self) -> ActivityDetails {
        ActivityDetails {
            description: self.description.clone(),
            schedule: self.schedule.clone(),
            max_participants: self.max_participants,
            participants: self.participants.clone(),
        }
    }
}

/// The full activity collection keyed by name, in the order the server
/// returned it.
///
/// On the wire this is a JSON object `name -> details`. Decoding walks the
/// object entries directly so document order survives without an ordered
/// map type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    activities: Vec<Activity>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries with a name already present replace the earlier one in
    /// place, matching how a JSON object with duplicate keys is read.
    pub fn insert(&mut self, activity: Activity) {
        if let Some(existing) = self
            .activities
            .iter_mut()
            .find(|existing| existing.name == activity.name)
        {
            *existing = activity;
        } else {
            self.activities.push(activity);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.activities.iter().find(|activity| activity.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Activity> {
        self.activities
            .iter_mut()
            .find(|activity| activity.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.activities.iter().map(|activity| activity.name.as_str())
    }
}

impl FromIterator<Activity> for Roster {
    fn from_iter<T: IntoIterator<Item = Activity>>(iter: T) -> Self {
        let mut roster = Roster::new();
        for activity in iter {
            roster.insert(activity);
        }
        roster
    }
}

impl Serialize for Roster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.activities.len()))?;
        for activity in &self.activities {
            map.serialize_entry(&activity.name, &activity.details())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RosterVisitor;

        impl<'de> Visitor<'de> for RosterVisitor {
            type Value = Roster;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of activity name to activity details")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Roster, A::Error> {
                let mut roster = Roster::new();
                while let Some((name, details)) = access.next_entry::<String, ActivityDetails>()? {
                    roster.insert(Activity::from_details(name, details));
                }
                Ok(roster)
            }
        }

        deserializer.deserialize_map(RosterVisitor)
    }
}
