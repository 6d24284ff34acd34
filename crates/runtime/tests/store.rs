use std::fs;
use std::io::Write;

use board_core::{
    ArchiveId, Demo, DemoState, GlobalKey, Highscoreable, HighscoreableId, RawScore,
};
use chrono::Utc;
use runtime::repository::{
    ArchiveRepository, BoardCommit, BoardRepository, CommitRow, FileStore, NewArchive,
    PropertyRepository, RepositoryError,
};

fn commit(key: HighscoreableId, entries: &[RawScore]) -> BoardCommit {
    let mut commit = BoardCommit::new(key, Utc::now());
    for (rank, entry) in entries.iter().enumerate() {
        commit.rows.push(CommitRow {
            rank,
            tied_rank: rank,
            entry: entry.clone(),
        });
        commit.new_archives.push(NewArchive {
            entry: entry.clone(),
            cheated: false,
        });
    }
    commit
}

#[test]
fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let key = HighscoreableId::episode(3);
    {
        let store = FileStore::open(dir.path()).unwrap();
        store
            .register(vec![Highscoreable::new(key, "episode:3")])
            .unwrap();
        let receipt = store
            .commit_board(commit(key, &[RawScore::new(7, "seven", 350_000, 42)]))
            .unwrap();
        assert_eq!(receipt.new_archives.len(), 1);
    }

    let store = FileStore::open(dir.path()).unwrap();
    let board = store.board(key).unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].replay_id, 42);
    assert!(store.find_player(7).unwrap().is_some());
    assert_eq!(store.pending_demos().unwrap().len(), 1);
    assert!(store.highscoreable(key).unwrap().unwrap().has_scores);
}

#[test]
fn test_commit_to_unknown_entity_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let key = HighscoreableId::level(8);

    let err = store
        .commit_board(commit(key, &[RawScore::new(1, "a", 90_000, 5)]))
        .unwrap_err();

    assert!(matches!(err, RepositoryError::UnknownHighscoreable(k) if k == key));
    assert!(store.board(key).unwrap().is_empty());
    assert!(store.players().unwrap().is_empty());
    assert!(store.find_archive(key.category, 5).unwrap().is_none());
    assert_eq!(fs::metadata(dir.path().join("journal.log")).unwrap().len(), 0);
}

#[test]
fn test_rejected_write_is_not_journaled() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();

    let err = store
        .save_demo(Demo::pending(ArchiveId(3)), DemoState::Pending, None)
        .unwrap_err();

    assert!(matches!(err, RepositoryError::ArchiveNotFound(ArchiveId(3))));
    assert_eq!(fs::metadata(dir.path().join("journal.log")).unwrap().len(), 0);
}

#[test]
fn test_writes_replay_from_journal_and_compact() {
    let dir = tempfile::tempdir().unwrap();
    let key = HighscoreableId::level(8);
    let id = {
        let store = FileStore::open(dir.path()).unwrap().with_compact_after(100);
        store
            .register(vec![Highscoreable::new(key, "level:8")])
            .unwrap();
        let receipt = store
            .commit_board(commit(key, &[RawScore::new(1, "a", 90_000, 5)]))
            .unwrap();
        store
            .set_property(GlobalKey::NextScoreSync, "2026-01-01T00:00:00Z".into())
            .unwrap();
        receipt.new_archives[0]
    };
    // nothing compacted yet, everything lives in the journal
    assert!(!dir.path().join("store.bin").exists());

    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(store.board(key).unwrap().len(), 1);
    assert!(store.demo(id).unwrap().unwrap().is_pending());
    assert!(store.property(GlobalKey::NextScoreSync).unwrap().is_some());

    store.compact().unwrap();
    assert_eq!(fs::metadata(dir.path().join("journal.log")).unwrap().len(), 0);
    drop(store);

    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(store.board(key).unwrap().len(), 1);
    assert_eq!(store.players().unwrap().len(), 1);
}

#[test]
fn test_stale_demo_write_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let key = HighscoreableId::level(8);
    let store = FileStore::open(dir.path()).unwrap();
    store
        .register(vec![Highscoreable::new(key, "level:8")])
        .unwrap();
    let id = store
        .commit_board(commit(key, &[RawScore::new(1, "a", 90_000, 5)]))
        .unwrap()
        .new_archives[0];

    let mut stored = Demo::pending(id);
    stored.mark_downloaded().unwrap();
    stored.store(vec![7; 16]).unwrap();
    assert!(store.save_demo(stored, DemoState::Pending, Some(60)).unwrap());
    assert!(
        !store
            .save_demo(Demo::pending(id), DemoState::Pending, None)
            .unwrap()
    );
    drop(store);

    let store = FileStore::open(dir.path()).unwrap();
    let demo = store.demo(id).unwrap().unwrap();
    assert_eq!(demo.state, DemoState::Stored);
    assert_eq!(demo.data, Some(vec![7; 16]));
}

#[test]
fn test_failed_compaction_keeps_journal() {
    let dir = tempfile::tempdir().unwrap();
    let key = HighscoreableId::level(8);
    let store = FileStore::open(dir.path()).unwrap().with_compact_after(1);
    store
        .register(vec![Highscoreable::new(key, "level:8")])
        .unwrap();

    // a directory where the temp file goes makes compaction fail
    fs::create_dir(dir.path().join("store.bin.tmp")).unwrap();
    store
        .commit_board(commit(key, &[RawScore::new(1, "a", 90_000, 5)]))
        .unwrap();
    assert!(matches!(store.compact().unwrap_err(), RepositoryError::Io(_)));
    assert_eq!(store.board(key).unwrap().len(), 1);
    drop(store);

    fs::remove_dir(dir.path().join("store.bin.tmp")).unwrap();
    let reopened = FileStore::open(dir.path()).unwrap();
    assert_eq!(reopened.board(key).unwrap().len(), 1);
    assert_eq!(reopened.pending_demos().unwrap().len(), 1);
}

#[test]
fn test_torn_journal_record_is_dropped_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let key = HighscoreableId::level(8);
    {
        let store = FileStore::open(dir.path()).unwrap();
        store
            .register(vec![Highscoreable::new(key, "level:8")])
            .unwrap();
    }
    let mut journal = fs::OpenOptions::new()
        .append(true)
        .open(dir.path().join("journal.log"))
        .unwrap();
    journal.write_all(&[64, 0, 0, 0, 1]).unwrap();
    drop(journal);

    let store = FileStore::open(dir.path()).unwrap();
    assert!(store.highscoreable(key).unwrap().is_some());
    store
        .commit_board(commit(key, &[RawScore::new(1, "a", 90_000, 5)]))
        .unwrap();
    drop(store);

    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(store.board(key).unwrap().len(), 1);
}
