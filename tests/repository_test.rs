//! Task-storage integration tests.
//!
//! Exercises the repository, resolver, lane store, filename codec, and tag
//! extractor together over a real temporary board root.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use lanefile::config::BoardConfig;
use lanefile::models::{TaskId, TaskUpdate};
use lanefile::storage::{LaneStore, TaskRepository, filename, tags};
use lanefile::Error;
use tempfile::TempDir;

fn board() -> (TempDir, TaskRepository) {
    let tmp = TempDir::new().expect("temp board root");
    let repo = TaskRepository::new(&BoardConfig::new(tmp.path()));
    (tmp, repo)
}

mod codec {
    use super::*;

    #[test]
    fn test_id_roundtrip_for_canonical_ids() {
        for _ in 0..16 {
            let id = TaskId::generate();
            for title in ["", "Fix bug", "  spaced   out  ", "dash-y title"] {
                let name = filename::encode(title, &id);
                assert_eq!(filename::decode(&name).id(), &id);
            }
        }
    }

    #[test]
    fn test_canonical_filename_layout() {
        let id = TaskId::new("00000000-0000-4000-8000-000000000000");
        assert_eq!(
            filename::encode("Ship the fix", &id),
            "Ship-the-fix-00000000-0000-4000-8000-000000000000.md"
        );
    }

    #[test]
    fn test_legacy_stem_is_the_id() {
        let decoded = filename::decode("some-old-task.md");
        assert_eq!(decoded.id().as_str(), "some-old-task");
        assert_eq!(decoded.title(), "");
    }
}

mod tag_extraction {
    use super::*;

    #[test]
    fn test_order_and_duplicates_preserved() {
        assert_eq!(tags::extract("#a #b #a"), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_tags_match_created_content() {
        let (_tmp, repo) = board();
        let content = "look at #urgent and #backend, then #urgent again";
        let task = repo.create_task("inbox", "t", content).unwrap();
        assert_eq!(task.tags, tags::extract(content));
        assert_eq!(task.tags, vec!["urgent", "backend", "urgent"]);
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn test_end_to_end_board_flow() {
        let (tmp, repo) = board();
        let store = LaneStore::new(tmp.path());

        repo.create_lane(Some("backlog")).unwrap();
        let task = repo.create_task("backlog", "Fix bug", "desc").unwrap();
        assert_eq!(store.list_lane_files("backlog").unwrap().len(), 1);

        let moved = repo.move_task(&task.id, "backlog", "done").unwrap();
        assert_eq!(moved.lane, "done");
        assert_eq!(store.list_lane_files("done").unwrap().len(), 1);
        assert_eq!(store.list_lane_files("backlog").unwrap().len(), 0);
    }

    #[test]
    fn test_get_returns_written_content() {
        let (_tmp, repo) = board();
        let task = repo.create_task("inbox", "Note", "verbatim body\n").unwrap();
        let fetched = repo.get_task(&task.id, None).unwrap();
        assert_eq!(fetched.content, "verbatim body\n");
        assert_eq!(fetched.title, "Note");
    }

    #[test]
    fn test_content_never_embeds_title() {
        let (_tmp, repo) = board();
        let task = repo.create_task("inbox", "My Title", "plain body").unwrap();
        assert!(!task.content.contains("My Title"));
        assert!(task.path.file_name().unwrap().to_str().unwrap().starts_with("My-Title-"));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let (_tmp, repo) = board();
        let task = repo.create_task("inbox", "t", "c").unwrap();
        repo.delete_task(&task.id, Some("inbox")).unwrap();
        assert!(matches!(
            repo.get_task(&task.id, None),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_moves_and_rewrites_in_one_call() {
        let (tmp, repo) = board();
        let task = repo.create_task("a", "t", "old").unwrap();

        let updated = repo
            .update_task(
                &task.id,
                TaskUpdate {
                    content: Some("new".to_string()),
                    lane: Some("a".to_string()),
                    new_lane: Some("b".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.lane, "b");
        assert_eq!(updated.content, "new");
        assert!(tmp.path().join("b").join(task.path.file_name().unwrap()).exists());
    }

    #[test]
    fn test_legacy_files_resolve_and_read() {
        let (tmp, repo) = board();
        let id = TaskId::generate();
        let lane = tmp.path().join("old");
        std::fs::create_dir_all(&lane).unwrap();
        std::fs::write(lane.join(format!("{id}.md")), "body, see #archive").unwrap();

        let task = repo.get_task(&id, None).unwrap();
        assert_eq!(task.lane, "old");
        assert_eq!(task.title, "");
        assert_eq!(task.tags, vec!["archive"]);
    }

    #[test]
    fn test_rename_task_then_resolve_by_id() {
        let (_tmp, repo) = board();
        let task = repo.create_task("inbox", "Before", "body").unwrap();
        let renamed = repo.update_task_title(&task.id, "After rename", "inbox").unwrap();
        assert_eq!(renamed.title, "After rename");

        let fetched = repo.get_task(&task.id, None).unwrap();
        assert_eq!(fetched.title, "After rename");
        assert_eq!(fetched.content, "body");
    }
}

mod lanes {
    use super::*;

    #[test]
    fn test_lane_ops() {
        let (tmp, repo) = board();
        repo.create_lane(Some("todo")).unwrap();
        repo.create_task("todo", "t", "c").unwrap();

        repo.rename_lane("todo", "doing").unwrap();
        assert!(tmp.path().join("doing").is_dir());
        assert!(!tmp.path().join("todo").exists());

        repo.delete_lane("doing").unwrap();
        assert!(!tmp.path().join("doing").exists());
    }

    #[test]
    fn test_generated_lane_name_is_random_id() {
        let (_tmp, repo) = board();
        let a = repo.create_lane(None).unwrap();
        let b = repo.create_lane(None).unwrap();
        assert_ne!(a.name, b.name);
        assert!(TaskId::is_canonical(&a.name));
    }
}
