//! Key schema for the durable store.
//!
//! | Key | Value |
//! |-----|-------|
//! | `voicelog:config:observed-groups` | JSON array of group ids |
//! | `voicelog:config:excluded-rooms` | JSON array of room ids |
//! | `voicelog:cache:participants` | JSON object, participant id -> participant info |
//! | `voicelog:cache:groups` | JSON object, group id -> group info |
//! | `voicelog:cache:rooms` | JSON object, room id -> room info |
//! | `voicelog:log` | JSON array of log events, newest first |

/// Observed group ids.
pub const OBSERVED_GROUPS: &str = "voicelog:config:observed-groups";

/// Excluded room ids.
pub const EXCLUDED_ROOMS: &str = "voicelog:config:excluded-rooms";

/// Participant entity cache.
pub const PARTICIPANT_CACHE: &str = "voicelog:cache:participants";

/// Group entity cache.
pub const GROUP_CACHE: &str = "voicelog:cache:groups";

/// Room entity cache.
pub const ROOM_CACHE: &str = "voicelog:cache:rooms";

/// The event log.
pub const EVENT_LOG: &str = "voicelog:log";
