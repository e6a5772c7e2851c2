//! Property-based tests for the sync session state machine

use proptest::prelude::*;

use attendsync::shared::progress::SyncProgressMessage;
use attendsync::shared::session::{SyncPhase, SyncSession};

fn progress_updates() -> impl Strategy<Value = Vec<(String, u8)>> {
    prop::collection::vec(("\\PC{0,24}", 0..=100u8), 0..24)
}

proptest! {
    /// The displayed percentage never goes backwards, whatever the wire says.
    #[test]
    fn test_percent_never_decreases(updates in progress_updates()) {
        let mut session = SyncSession::new("42");
        session.streaming();
        let mut last = 0u8;
        for (message, progress) in updates {
            session.apply(SyncProgressMessage::progress(message, progress));
            prop_assert!(session.percent >= last);
            last = session.percent;
        }
    }

    /// Completion pins the percentage to 100 regardless of what preceded it.
    #[test]
    fn test_complete_always_lands_on_100(updates in progress_updates()) {
        let mut session = SyncSession::new("42");
        session.streaming();
        for (message, progress) in updates {
            session.apply(SyncProgressMessage::progress(message, progress));
        }
        session.apply(SyncProgressMessage::complete("Sync complete"));
        prop_assert_eq!(session.phase, SyncPhase::Complete);
        prop_assert_eq!(session.percent, 100);
    }

    /// The log records every non-terminal message verbatim, in arrival order.
    #[test]
    fn test_log_keeps_every_message_in_order(updates in progress_updates()) {
        let mut session = SyncSession::new("42");
        session.streaming();
        for (message, progress) in updates.iter() {
            session.apply(SyncProgressMessage::progress(message.clone(), *progress));
        }
        prop_assert_eq!(session.log.len(), updates.len());
        for (entry, (message, progress)) in session.log.iter().zip(updates.iter()) {
            prop_assert_eq!(&entry.message, message);
            prop_assert_eq!(entry.progress, *progress);
        }
    }

    /// Once terminal, a session is deaf to further messages.
    #[test]
    fn test_terminal_sessions_ignore_followups(updates in progress_updates()) {
        let mut session = SyncSession::new("42");
        session.streaming();
        session.apply(SyncProgressMessage::complete("Sync complete"));
        let log_len = session.log.len();
        for (message, progress) in updates {
            session.apply(SyncProgressMessage::progress(message, progress));
        }
        prop_assert_eq!(session.phase, SyncPhase::Complete);
        prop_assert_eq!(session.percent, 100);
        prop_assert_eq!(session.log.len(), log_len);
    }
}
