use replay::{PayloadHeader, ReplayKind, playable, storage, transcode, wire};

fn run(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_add(seed) % 8).collect()
}

#[test]
fn test_episode_payload_to_storage_and_back() {
    let streams: Vec<Vec<u8>> = (0..5).map(|i| run(40 + i * 7, i as u8)).collect();
    let header = PayloadHeader {
        query_type: 1,
        replay_id: 777,
        level_id: 12,
        user_id: 5,
    };
    let payload = wire::encode_payload(&header, ReplayKind::Episode, &streams).unwrap();

    let transcoded = transcode(&payload, ReplayKind::Episode).unwrap();
    assert_eq!(transcoded.framecount, (40 + 47 + 54 + 61 + 68) as u32);

    let stored = storage::decode(&transcoded.encoded).unwrap();
    assert_eq!(stored, streams);
    assert_eq!(playable(&stored[0]).count(), 39);
}

#[test]
fn test_wrong_kind_is_corrupt() {
    let header = PayloadHeader::default();
    let payload = wire::encode_payload(&header, ReplayKind::Level, &[run(10, 0)]).unwrap();

    let err = transcode(&payload, ReplayKind::Story).unwrap_err();
    assert!(err.is_corrupt_payload());
}

#[test]
fn test_stream_count_must_match_kind() {
    let err = wire::encode_payload(&PayloadHeader::default(), ReplayKind::Episode, &[run(3, 0)])
        .unwrap_err();
    assert!(!err.is_corrupt_payload());
}
