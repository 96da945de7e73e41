//! Player registration and reconnection.
//!
//! Registration reserves an identity in a room before any WebSocket
//! exists; the returned session token is the secret that lets the same
//! person re-claim the identity after a dropped connection. The actor
//! calls [`register`] on its serialized path, so there are no races
//! between two people grabbing the same name.

use std::collections::HashSet;

use rand::Rng;
use tracing::info;

use trivium_game::Room;
use trivium_game::config::MAX_PLAYER_NAME_LENGTH;
use trivium_protocol::{GameStatus, PlayerId};

use crate::error::RegistrationError;

/// A successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A fresh identity was reserved.
    Registered {
        /// The canonical (trimmed) identity.
        player_id: PlayerId,
        /// Reconnection secret; shown to this client only.
        token: String,
    },
    /// An existing, currently-detached identity was re-claimed with a
    /// matching token.
    Resumed { player_id: PlayerId, token: String },
}

/// Registers `name` in the room, or resumes an existing registration.
///
/// `attached` is the set of players with a live connection; a name that
/// is registered *and* attached can't be claimed at all, while a
/// detached one can be resumed with the right token.
pub fn register(
    room: &mut Room,
    attached: &HashSet<PlayerId>,
    name: &str,
    resume_token: Option<&str>,
) -> Result<RegisterOutcome, RegistrationError> {
    let player_id = validate_name(name)?;

    if room.players.contains(&player_id) {
        if attached.contains(&player_id) {
            return Err(RegistrationError::NameTaken);
        }
        // Detached identity: resumable with the original token.
        let known = room.session_tokens.get(&player_id);
        return match (known, resume_token) {
            (Some(known), Some(offered)) if known == offered => {
                info!(code = %room.code, %player_id, "player resumed");
                Ok(RegisterOutcome::Resumed {
                    player_id,
                    token: known.clone(),
                })
            }
            _ => Err(RegistrationError::InvalidToken),
        };
    }

    if room.status != GameStatus::Waiting {
        return Err(RegistrationError::GameInProgress);
    }

    let token = generate_token();
    room.players.insert(player_id.clone());
    room.scores.insert(player_id.clone(), 0);
    room.session_tokens.insert(player_id.clone(), token.clone());
    if room.host_id.is_none() {
        room.host_id = Some(player_id.clone());
    }

    info!(code = %room.code, %player_id,
        host = room.is_host(&player_id), "player registered");
    Ok(RegisterOutcome::Registered { player_id, token })
}

/// Validates a display name and produces the canonical identity.
///
/// Rules: 1–20 characters after trimming; no control or invisible
/// characters; no `<`/`>` (cheap markup injection guard — the name is
/// echoed to every client).
pub fn validate_name(raw: &str) -> Result<PlayerId, RegistrationError> {
    const INVISIBLE: [char; 7] = [
        '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}',
        '\u{2060}', '\u{FEFF}',
    ];

    let name = raw.trim();
    if name.is_empty() {
        return Err(RegistrationError::InvalidName("name is empty"));
    }
    if name.chars().count() > MAX_PLAYER_NAME_LENGTH {
        return Err(RegistrationError::InvalidName("name too long"));
    }
    for c in name.chars() {
        if c.is_control() || INVISIBLE.contains(&c) {
            return Err(RegistrationError::InvalidName(
                "name contains invisible characters",
            ));
        }
        if c == '<' || c == '>' {
            return Err(RegistrationError::InvalidName(
                "name contains markup characters",
            ));
        }
    }
    Ok(PlayerId(name.to_string()))
}

/// Generates a random 32-character hex string (128 bits of entropy),
/// enough that guessing a live token is infeasible.
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trivium_protocol::RoomCode;

    fn pid(name: &str) -> PlayerId {
        PlayerId::from(name)
    }

    fn room() -> Room {
        Room::new(RoomCode::new("AB3D"))
    }

    // =====================================================================
    // Name validation
    // =====================================================================

    #[test]
    fn test_name_is_trimmed() {
        assert_eq!(validate_name("  Alice  "), Ok(pid("Alice")));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_name_length_limit_counts_characters() {
        assert!(validate_name(&"x".repeat(20)).is_ok());
        assert!(validate_name(&"x".repeat(21)).is_err());
        // 20 multi-byte characters are fine.
        assert!(validate_name(&"é".repeat(20)).is_ok());
    }

    #[test]
    fn test_invisible_characters_rejected() {
        assert!(validate_name("Al\u{200B}ice").is_err());
        assert!(validate_name("Ali\u{0007}ce").is_err());
    }

    #[test]
    fn test_markup_characters_rejected() {
        assert!(validate_name("<b>Alice</b>").is_err());
    }

    #[test]
    fn test_unicode_names_allowed() {
        assert_eq!(validate_name("Zoë 🦀"), Ok(pid("Zoë 🦀")));
    }

    // =====================================================================
    // Registration
    // =====================================================================

    #[test]
    fn test_first_registrant_becomes_host() {
        let mut room = room();
        let outcome =
            register(&mut room, &HashSet::new(), "Alice", None).unwrap();

        let RegisterOutcome::Registered { player_id, token } = outcome else {
            panic!("expected fresh registration");
        };
        assert_eq!(player_id, pid("Alice"));
        assert_eq!(token.len(), 32);
        assert_eq!(room.host_id, Some(pid("Alice")));
        assert_eq!(room.scores[&pid("Alice")], 0);
    }

    #[test]
    fn test_second_registrant_is_not_host() {
        let mut room = room();
        register(&mut room, &HashSet::new(), "Alice", None).unwrap();
        register(&mut room, &HashSet::new(), "Bob", None).unwrap();
        assert_eq!(room.host_id, Some(pid("Alice")));
        assert_eq!(room.players.len(), 2);
    }

    #[test]
    fn test_tokens_are_unique_per_player() {
        let mut room = room();
        let RegisterOutcome::Registered { token: t1, .. } =
            register(&mut room, &HashSet::new(), "Alice", None).unwrap()
        else {
            panic!()
        };
        let RegisterOutcome::Registered { token: t2, .. } =
            register(&mut room, &HashSet::new(), "Bob", None).unwrap()
        else {
            panic!()
        };
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_attached_name_cannot_be_claimed() {
        let mut room = room();
        let RegisterOutcome::Registered { token, .. } =
            register(&mut room, &HashSet::new(), "Alice", None).unwrap()
        else {
            panic!()
        };

        let attached = HashSet::from([pid("Alice")]);
        // Even the right token doesn't evict a live connection.
        assert_eq!(
            register(&mut room, &attached, "Alice", Some(&token)),
            Err(RegistrationError::NameTaken)
        );
    }

    #[test]
    fn test_detached_name_resumes_with_matching_token() {
        let mut room = room();
        let RegisterOutcome::Registered { token, .. } =
            register(&mut room, &HashSet::new(), "Alice", None).unwrap()
        else {
            panic!()
        };

        let outcome =
            register(&mut room, &HashSet::new(), "Alice", Some(&token))
                .unwrap();
        assert_eq!(
            outcome,
            RegisterOutcome::Resumed { player_id: pid("Alice"), token }
        );
    }

    #[test]
    fn test_resume_rejects_wrong_or_missing_token() {
        let mut room = room();
        register(&mut room, &HashSet::new(), "Alice", None).unwrap();

        assert_eq!(
            register(&mut room, &HashSet::new(), "Alice", Some("bogus")),
            Err(RegistrationError::InvalidToken)
        );
        assert_eq!(
            register(&mut room, &HashSet::new(), "Alice", None),
            Err(RegistrationError::InvalidToken)
        );
    }

    #[test]
    fn test_new_player_rejected_mid_game() {
        let mut room = room();
        register(&mut room, &HashSet::new(), "Alice", None).unwrap();
        room.status = GameStatus::Playing;

        assert_eq!(
            register(&mut room, &HashSet::new(), "Bob", None),
            Err(RegistrationError::GameInProgress)
        );
    }

    #[test]
    fn test_resume_works_mid_game() {
        let mut room = room();
        let RegisterOutcome::Registered { token, .. } =
            register(&mut room, &HashSet::new(), "Alice", None).unwrap()
        else {
            panic!()
        };
        room.status = GameStatus::Playing;

        assert!(
            register(&mut room, &HashSet::new(), "Alice", Some(&token)).is_ok()
        );
    }
}
