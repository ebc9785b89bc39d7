//! Integration tests for the relay — cross-layer tests that verify the
//! admission flow (token → identity → registry) and multi-session fan-out
//! scenarios end to end, without a network in the way.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use crate::auth::token::{create_session_token, validate_session_token};
    use crate::engine::events::ChatFrame;
    use crate::engine::relay::ChatRelay;
    use crate::engine::validation::MAX_MESSAGE_LENGTH;

    const SECRET: &str = "test-secret";

    // ── Helpers ──────────────────────────────────────────────────

    fn setup_relay() -> Arc<ChatRelay> {
        Arc::new(ChatRelay::new(MAX_MESSAGE_LENGTH))
    }

    /// Run the admission flow the WebSocket handler performs: validate the
    /// token, bind the identity from its claims, connect.
    fn admit_with_token(
        relay: &ChatRelay,
        room: &str,
        token: &str,
    ) -> Result<(uuid::Uuid, mpsc::Receiver<ChatFrame>), String> {
        let claims = validate_session_token(token, SECRET).map_err(|e| e.to_string())?;
        relay.connect(room, &claims.display_name())
    }

    fn token_for(name: &str) -> String {
        create_session_token(&format!("user-{name}"), name, SECRET, 1).unwrap()
    }

    fn drain(rx: &mut mpsc::Receiver<ChatFrame>) {
        while rx.try_recv().is_ok() {}
    }

    // ── Admission ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_admission_with_valid_token() {
        let relay = setup_relay();

        let (sid, _rx) = admit_with_token(&relay, "case-42", &token_for("Alice")).unwrap();

        assert!(relay.get_session(sid).is_some());
        assert_eq!(relay.members("case-42"), vec!["Alice"]);
    }

    #[tokio::test]
    async fn test_admission_rejected_without_valid_token() {
        let relay = setup_relay();

        assert!(admit_with_token(&relay, "case-42", "").is_err());
        assert!(admit_with_token(&relay, "case-42", "garbage").is_err());

        // Nothing was admitted.
        assert_eq!(relay.session_count(), 0);
        assert_eq!(relay.room_count(), 0);
    }

    #[tokio::test]
    async fn test_admission_with_foreign_secret_rejected() {
        let relay = setup_relay();
        let forged = create_session_token("user-1", "Alice", "other-secret", 1).unwrap();

        assert!(admit_with_token(&relay, "case-42", &forged).is_err());
        assert_eq!(relay.session_count(), 0);
    }

    #[tokio::test]
    async fn test_identity_bound_from_token_claims() {
        let relay = setup_relay();

        let (_sid, _rx) = admit_with_token(&relay, "case-42", &token_for("Priya")).unwrap();
        assert_eq!(relay.members("case-42"), vec!["Priya"]);

        // A token with a blank name claim binds the fallback identity.
        let blank = create_session_token("user-2", "  ", SECRET, 1).unwrap();
        let (_sid2, _rx2) = admit_with_token(&relay, "case-43", &blank).unwrap();
        assert_eq!(relay.members("case-43"), vec!["User"]);
    }

    // ── Fan-out scenarios ────────────────────────────────────────

    #[tokio::test]
    async fn test_two_party_case_room_exchange() {
        let relay = setup_relay();

        let (victim, mut victim_rx) =
            admit_with_token(&relay, "case-42", &token_for("Dana")).unwrap();
        let (lawyer, mut lawyer_rx) =
            admit_with_token(&relay, "case-42", &token_for("Sam")).unwrap();

        relay.broadcast(victim, "I uploaded the lease agreement").unwrap();
        relay.broadcast(lawyer, "Got it, reviewing now").unwrap();

        // Both parties see both messages, sender echo included.
        let first = victim_rx.try_recv().unwrap();
        assert_eq!(first.username, "Dana");
        let second = victim_rx.try_recv().unwrap();
        assert_eq!(second.username, "Sam");
        assert_eq!(second.message, "Got it, reviewing now");

        assert_eq!(lawyer_rx.try_recv().unwrap().username, "Dana");
        assert_eq!(lawyer_rx.try_recv().unwrap().username, "Sam");
    }

    #[tokio::test]
    async fn test_messages_never_cross_cases() {
        let relay = setup_relay();

        let (a, mut a_rx) = admit_with_token(&relay, "case-1", &token_for("Alice")).unwrap();
        let (_c, mut c_rx) = admit_with_token(&relay, "case-2", &token_for("Carol")).unwrap();

        relay.broadcast(a, "sensitive detail about case 1").unwrap();

        drain(&mut a_rx);
        assert!(
            c_rx.try_recv().is_err(),
            "a session in another room must never receive the message"
        );
    }

    #[tokio::test]
    async fn test_sender_order_survives_interleaving() {
        let relay = setup_relay();

        let (alice, _alice_rx) = admit_with_token(&relay, "case-9", &token_for("Alice")).unwrap();
        let (bob, mut bob_rx) = admit_with_token(&relay, "case-9", &token_for("Bob")).unwrap();
        let (_eve, mut eve_rx) = admit_with_token(&relay, "case-9", &token_for("Eve")).unwrap();

        relay.broadcast(alice, "one").unwrap();
        relay.broadcast(bob, "interleaved").unwrap();
        relay.broadcast(alice, "two").unwrap();

        // Every recipient sees Alice's messages in send order, wherever
        // Bob's lands between them.
        let eve_msgs: Vec<String> = std::iter::from_fn(|| eve_rx.try_recv().ok())
            .map(|f| f.message)
            .collect();
        let alice_positions: Vec<usize> = eve_msgs
            .iter()
            .enumerate()
            .filter(|(_, m)| *m == "one" || *m == "two")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(eve_msgs.len(), 3);
        assert!(alice_positions[0] < alice_positions[1]);
        assert_eq!(eve_msgs[alice_positions[0]], "one");
        assert_eq!(eve_msgs[alice_positions[1]], "two");

        drain(&mut bob_rx);
    }

    #[tokio::test]
    async fn test_leaver_stops_receiving_midway() {
        let relay = setup_relay();

        let (alice, _alice_rx) = admit_with_token(&relay, "case-9", &token_for("Alice")).unwrap();
        let (bob, mut bob_rx) = admit_with_token(&relay, "case-9", &token_for("Bob")).unwrap();

        relay.broadcast(alice, "before").unwrap();
        relay.disconnect(bob);
        relay.broadcast(alice, "after").unwrap();

        assert_eq!(bob_rx.try_recv().unwrap().message, "before");
        assert!(bob_rx.try_recv().is_err(), "no delivery after removal completed");
    }

    #[tokio::test]
    async fn test_double_close_leaves_registry_consistent() {
        let relay = setup_relay();

        let (alice, _rx) = admit_with_token(&relay, "case-9", &token_for("Alice")).unwrap();
        let (_bob, _bob_rx) = admit_with_token(&relay, "case-9", &token_for("Bob")).unwrap();

        relay.disconnect(alice);
        assert_eq!(relay.members("case-9"), vec!["Bob"]);

        relay.disconnect(alice);
        assert_eq!(relay.members("case-9"), vec!["Bob"]);
        assert_eq!(relay.occupancy("case-9"), 1);
    }

    #[tokio::test]
    async fn test_whitespace_body_produces_no_traffic() {
        let relay = setup_relay();

        let (alice, mut alice_rx) = admit_with_token(&relay, "case-9", &token_for("Alice")).unwrap();
        let (_bob, mut bob_rx) = admit_with_token(&relay, "case-9", &token_for("Bob")).unwrap();

        assert!(relay.broadcast(alice, "   ").is_err());

        assert!(alice_rx.try_recv().is_err());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_restart_forgets_membership() {
        // "Restart" is just a fresh relay: membership is memory-only.
        let relay = setup_relay();
        let (_sid, _rx) = admit_with_token(&relay, "case-42", &token_for("Alice")).unwrap();
        assert_eq!(relay.occupancy("case-42"), 1);

        let restarted = setup_relay();
        assert_eq!(restarted.occupancy("case-42"), 0);
        assert_eq!(restarted.room_count(), 0);
    }
}
