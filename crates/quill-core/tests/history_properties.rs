//! Property tests for commit/undo sequences.

use proptest::prelude::*;
use quill_core::{Config, Repository};
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum Op {
    Commit(Vec<u8>),
    Undo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => prop::collection::vec(any::<u8>(), 0..64).prop_map(Op::Commit),
        2 => Just(Op::Undo),
    ]
}

fn in_memory() -> Config {
    Config {
        persist: Some(false),
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// History and undo stack track a simple model stack of file versions.
    #[test]
    fn prop_commit_undo_matches_model(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("tracked.bin");
            std::fs::write(&path, b"initial").unwrap();
            let mut repo = Repository::open(dir.path(), in_memory()).await.unwrap();

            // Content captured by each live commit, oldest first.
            let mut model: Vec<Vec<u8>> = Vec::new();
            let mut current = b"initial".to_vec();

            for op in ops {
                match op {
                    Op::Commit(next) => {
                        repo.stage("tracked.bin").await.unwrap();
                        let commit = repo.commit("step").await.unwrap();
                        model.push(current.clone());
                        prop_assert_eq!(commit.id.get(), model.len() as u64);

                        std::fs::write(&path, &next).unwrap();
                        current = next;
                    }
                    Op::Undo => match model.pop() {
                        Some(expected) => {
                            repo.undo().await.unwrap();
                            current = std::fs::read(&path).unwrap();
                            prop_assert_eq!(&current, &expected);
                        }
                        None => {
                            prop_assert!(repo.undo().await.is_err());
                        }
                    },
                }

                let ids: Vec<u64> = repo.log().map(|c| c.id.get()).collect();
                let expected: Vec<u64> = (1..=model.len() as u64).collect();
                prop_assert_eq!(&ids, &expected);
                prop_assert_eq!(repo.undo_stack().len(), model.len());
                prop_assert_eq!(repo.undo_stack().peek().map(|id| id.get()), ids.last().copied());
            }
            Ok(())
        })?;
    }

    /// M commits followed by M undos empties everything.
    #[test]
    fn prop_full_unwind(count in 1usize..8) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("a.txt"), b"0").unwrap();
            let mut repo = Repository::open(dir.path(), in_memory()).await.unwrap();

            for i in 0..count {
                repo.stage("a.txt").await.unwrap();
                repo.commit(&format!("c{i}")).await.unwrap();
                std::fs::write(dir.path().join("a.txt"), format!("{}", i + 1)).unwrap();
            }
            for _ in 0..count {
                repo.undo().await.unwrap();
            }

            prop_assert!(repo.history().is_empty());
            prop_assert!(repo.undo_stack().is_empty());
            prop_assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"0".to_vec());
            Ok(())
        })?;
    }
}
