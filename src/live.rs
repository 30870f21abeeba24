use chrono::{DateTime, Duration, Utc};
use dashmap::{mapref::entry::Entry, DashMap};

use crate::location::Location;

const UPDATE_INTERVAL_MINS: i64 = 10;
// roughly 100 meters in degrees
const MIN_MOVE_DEGREES: f64 = 0.001;

pub const MAX_SESSION_AGE_HOURS: i64 = 24;

/// Outcome of feeding one live location update into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    /// First update from this chat, a session was started.
    Started,
    /// Interval elapsed and the user moved, a fresh fact is due.
    Refresh,
    /// The user moved but the interval has not elapsed yet.
    TooSoon,
    /// Nothing worth reacting to.
    Unchanged,
}

#[derive(Debug, Clone, Copy)]
pub struct Status {
    pub minutes_since_update: i64,
    pub minutes_until_refresh: i64,
    pub facts_sent: u32,
}

#[derive(Debug)]
struct Session {
    latitude: f64,
    longitude: f64,
    last_update: DateTime<Utc>,
    facts_sent: u32,
}

impl Session {
    fn new(location: Location) -> Self {
        Self {
            latitude: location.latitude(),
            longitude: location.longitude(),
            last_update: Utc::now(),
            facts_sent: 1,
        }
    }

    fn distance_moved(&self, location: Location) -> f64 {
        let lat_diff = location.latitude() - self.latitude;
        let lon_diff = location.longitude() - self.longitude;

        (lat_diff.powi(2) + lon_diff.powi(2)).sqrt()
    }
}

/// Per-chat live location sessions. A chat gets a fresh fact only after the
/// update interval elapsed and the position moved past the threshold.
#[derive(Debug)]
pub struct LiveSessions {
    sessions: DashMap<i64, Session>,
    update_interval: Duration,
    min_move: f64,
}

impl LiveSessions {
    pub fn new() -> Self {
        Self::with_limits(Duration::minutes(UPDATE_INTERVAL_MINS), MIN_MOVE_DEGREES)
    }

    fn with_limits(update_interval: Duration, min_move: f64) -> Self {
        Self {
            sessions: DashMap::new(),
            update_interval,
            min_move,
        }
    }

    pub fn track(&self, chat: i64, location: Location) -> Track {
        let mut session = match self.sessions.entry(chat) {
            Entry::Vacant(entry) => {
                entry.insert(Session::new(location));

                return Track::Started;
            }
            Entry::Occupied(entry) => entry.into_ref(),
        };

        let moved = session.distance_moved(location) >= self.min_move;
        let elapsed = Utc::now() - session.last_update >= self.update_interval;

        if moved && elapsed {
            session.latitude = location.latitude();
            session.longitude = location.longitude();
            session.last_update = Utc::now();
            session.facts_sent += 1;

            Track::Refresh
        } else if moved {
            Track::TooSoon
        } else {
            Track::Unchanged
        }
    }

    pub fn stop(&self, chat: i64) -> bool {
        self.sessions.remove(&chat).is_some()
    }

    pub fn status(&self, chat: i64) -> Option<Status> {
        self.sessions.get(&chat).map(|session| {
            let minutes_since_update = (Utc::now() - session.last_update).num_minutes();
            let minutes_until_refresh =
                (self.update_interval.num_minutes() - minutes_since_update).max(0);

            Status {
                minutes_since_update,
                minutes_until_refresh,
                facts_sent: session.facts_sent,
            }
        })
    }

    /// Drops sessions without an update for longer than `max_age`. Returns
    /// how many were removed.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let before = self.sessions.len();
        let now = Utc::now();

        self.sessions
            .retain(|_, session| now - session.last_update <= max_age);

        before - self.sessions.len()
    }
}

impl Default for LiveSessions {
    fn default() -> Self {
        Self::new()
    }
}
