//! Property-based tests for the progress stream decoder

use proptest::prelude::*;

use attendsync::client::FrameDecoder;
use attendsync::shared::progress::SyncProgressMessage;

fn any_message() -> impl Strategy<Value = SyncProgressMessage> {
    ("\\PC{0,32}", 0..=100u8, 0..4usize).prop_map(|(message, progress, kind)| match kind {
        0 => SyncProgressMessage::status(message, progress),
        1 => SyncProgressMessage::progress(message, progress),
        2 => SyncProgressMessage::complete(message),
        _ => SyncProgressMessage::error(message),
    })
}

fn wire_for(messages: &[SyncProgressMessage]) -> String {
    messages
        .iter()
        .map(|msg| format!("data: {}\n\n", serde_json::to_string(msg).unwrap()))
        .collect()
}

proptest! {
    /// However the wire is cut into chunks, the same messages come out in
    /// the same order.
    #[test]
    fn test_decoding_is_chunking_invariant(
        messages in prop::collection::vec(any_message(), 1..6),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let wire = wire_for(&messages);
        let bytes = wire.as_bytes();
        let mut points: Vec<usize> = cuts.iter().map(|cut| cut.index(bytes.len())).collect();
        points.sort_unstable();

        let mut decoder = FrameDecoder::new();
        let mut decoded = Vec::new();
        let mut start = 0;
        for point in points {
            decoded.extend(decoder.push(&bytes[start..point]));
            start = point;
        }
        decoded.extend(decoder.push(&bytes[start..]));
        decoded.extend(decoder.finish());

        prop_assert_eq!(decoded, messages);
    }

    /// Garbage in, no panic out; the buffer is always fully drained by the
    /// end of the stream.
    #[test]
    fn test_arbitrary_bytes_never_panic(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..8)
    ) {
        let mut decoder = FrameDecoder::new();
        for chunk in &chunks {
            let _ = decoder.push(chunk);
        }
        let _ = decoder.finish();
        prop_assert_eq!(decoder.buffered(), 0);
    }
}
