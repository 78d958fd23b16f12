//! Pure classification of a snapshot transition into a [`LogEvent`].
//!
//! Attribute flips and the active list are both driven by
//! [`ATTRIBUTE_RULES`], so adding an attribute means adding one row.

use voicelog_types::{
    Attribute, Attributes, ChangeFlag, LogEvent, MoveKind, RoomId, SessionStateSnapshot,
};

/// One row of the attribute table.
#[derive(Debug, Clone, Copy)]
pub struct AttributeRule {
    /// The attribute this row describes.
    pub attribute: Attribute,
    /// Reads the attribute from an attribute set.
    pub read: fn(&Attributes) -> bool,
    /// Flag emitted on a `false -> true` flip.
    pub on: ChangeFlag,
    /// Flag emitted on a `true -> false` flip.
    pub off: ChangeFlag,
}

/// The attribute table. Row order is the order of both `changes` and
/// `active` on every emitted event.
pub const ATTRIBUTE_RULES: [AttributeRule; 6] = [
    AttributeRule {
        attribute: Attribute::SelfMuted,
        read: |a| a.self_muted,
        on: ChangeFlag::SelfMuteOn,
        off: ChangeFlag::SelfMuteOff,
    },
    AttributeRule {
        attribute: Attribute::SelfDeafened,
        read: |a| a.self_deafened,
        on: ChangeFlag::SelfDeafOn,
        off: ChangeFlag::SelfDeafOff,
    },
    AttributeRule {
        attribute: Attribute::GroupMuted,
        read: |a| a.group_muted,
        on: ChangeFlag::GroupMuteOn,
        off: ChangeFlag::GroupMuteOff,
    },
    AttributeRule {
        attribute: Attribute::GroupDeafened,
        read: |a| a.group_deafened,
        on: ChangeFlag::GroupDeafOn,
        off: ChangeFlag::GroupDeafOff,
    },
    AttributeRule {
        attribute: Attribute::Streaming,
        read: |a| a.streaming,
        on: ChangeFlag::StreamOn,
        off: ChangeFlag::StreamOff,
    },
    AttributeRule {
        attribute: Attribute::VideoEnabled,
        read: |a| a.video_enabled,
        on: ChangeFlag::VideoOn,
        off: ChangeFlag::VideoOff,
    },
];

/// Transition kind from the snapshot's current and previous room.
pub fn move_kind(room: Option<&RoomId>, previous: Option<&RoomId>) -> MoveKind {
    match (room, previous) {
        (Some(now), Some(before)) if now != before => MoveKind::Move,
        (Some(_), None) => MoveKind::Join,
        (None, Some(_)) => MoveKind::Leave,
        _ => MoveKind::Stay,
    }
}

/// Attribute flips from `prior` to `current`, in table order.
pub fn changes(prior: &Attributes, current: &Attributes) -> Vec<ChangeFlag> {
    ATTRIBUTE_RULES
        .iter()
        .filter_map(|rule| match ((rule.read)(prior), (rule.read)(current)) {
            (false, true) => Some(rule.on),
            (true, false) => Some(rule.off),
            _ => None,
        })
        .collect()
}

/// Attributes currently true, in table order.
pub fn active(current: &Attributes) -> Vec<Attribute> {
    ATTRIBUTE_RULES
        .iter()
        .filter(|rule| (rule.read)(current))
        .map(|rule| rule.attribute)
        .collect()
}

/// Classify `snapshot` against the participant's `prior` tracked state.
///
/// Without a prior state no change flags are produced; the active list is
/// always filled.
pub fn classify(
    snapshot: &SessionStateSnapshot,
    prior: Option<&SessionStateSnapshot>,
    at: i64,
) -> LogEvent {
    LogEvent {
        participant_id: snapshot.participant_id.clone(),
        group_id: snapshot.group_id.clone(),
        room_id: snapshot.room_id.clone(),
        previous_room_id: snapshot.previous_room_id.clone(),
        changes: prior
            .map(|p| changes(&p.attributes, &snapshot.attributes))
            .unwrap_or_default(),
        move_kind: move_kind(
            snapshot.room_id.as_ref(),
            snapshot.previous_room_id.as_ref(),
        ),
        active: active(&snapshot.attributes),
        at,
    }
}

#[cfg(test)]
mod tests {
    use voicelog_types::{GroupId, ParticipantId};

    use super::*;

    fn snap(room: Option<&str>, previous: Option<&str>, attributes: Attributes) -> SessionStateSnapshot {
        SessionStateSnapshot {
            participant_id: ParticipantId::new("p1"),
            group_id: GroupId::new("g1"),
            room_id: room.map(RoomId::new),
            previous_room_id: previous.map(RoomId::new),
            attributes,
        }
    }

    #[test]
    fn move_kind_table() {
        let a = RoomId::new("a");
        let b = RoomId::new("b");
        assert_eq!(move_kind(Some(&a), Some(&b)), MoveKind::Move);
        assert_eq!(move_kind(Some(&a), None), MoveKind::Join);
        assert_eq!(move_kind(None, Some(&a)), MoveKind::Leave);
        assert_eq!(move_kind(Some(&a), Some(&a)), MoveKind::Stay);
        assert_eq!(move_kind(None, None), MoveKind::Stay);
    }

    #[test]
    fn table_covers_every_attribute_once() {
        let attributes: Vec<Attribute> = ATTRIBUTE_RULES.iter().map(|r| r.attribute).collect();
        assert_eq!(attributes, Attribute::ALL.to_vec());
    }

    #[test]
    fn table_accessors_read_their_own_attribute() {
        for rule in &ATTRIBUTE_RULES {
            for attribute in Attribute::ALL {
                let mut set = Attributes::default();
                match attribute {
                    Attribute::SelfMuted => set.self_muted = true,
                    Attribute::SelfDeafened => set.self_deafened = true,
                    Attribute::GroupMuted => set.group_muted = true,
                    Attribute::GroupDeafened => set.group_deafened = true,
                    Attribute::Streaming => set.streaming = true,
                    Attribute::VideoEnabled => set.video_enabled = true,
                }
                assert_eq!((rule.read)(&set), rule.attribute == attribute);
                assert_eq!((rule.read)(&set), set.get(rule.attribute));
            }
        }
    }

    #[test]
    fn join_without_prior_has_no_changes() {
        let attrs = Attributes {
            self_muted: true,
            video_enabled: true,
            ..Attributes::default()
        };
        let event = classify(&snap(Some("r1"), None, attrs), None, 42);
        assert_eq!(event.move_kind, MoveKind::Join);
        assert!(event.changes.is_empty());
        assert_eq!(event.active, vec![Attribute::SelfMuted, Attribute::VideoEnabled]);
        assert_eq!(event.at, 42);
    }

    #[test]
    fn flips_are_reported_in_table_order() {
        let before = Attributes {
            self_muted: true,
            streaming: false,
            group_deafened: true,
            ..Attributes::default()
        };
        let after = Attributes {
            self_muted: false,
            streaming: true,
            group_deafened: true,
            ..Attributes::default()
        };
        let prior = snap(Some("r1"), Some("r1"), before);
        let event = classify(&snap(Some("r1"), Some("r1"), after), Some(&prior), 1);

        assert_eq!(event.move_kind, MoveKind::Stay);
        assert_eq!(
            event.changes,
            vec![ChangeFlag::SelfMuteOff, ChangeFlag::StreamOn]
        );
        assert_eq!(
            event.active,
            vec![Attribute::GroupDeafened, Attribute::Streaming]
        );
    }

    #[test]
    fn unchanged_attributes_produce_no_flags() {
        let attrs = Attributes {
            self_deafened: true,
            ..Attributes::default()
        };
        let prior = snap(Some("r1"), None, attrs);
        let event = classify(&snap(Some("r2"), Some("r1"), attrs), Some(&prior), 1);
        assert_eq!(event.move_kind, MoveKind::Move);
        assert!(event.changes.is_empty());
        assert_eq!(event.active, vec![Attribute::SelfDeafened]);
    }
}
