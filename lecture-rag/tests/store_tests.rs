//! Persistence of corpus bundles.

use std::fs;

use lecture_rag::store::{CHUNKS_FILE, MANIFEST_FILE, METADATA_FILE, VECTORS_FILE};
use lecture_rag::{Chunk, ChunkMetadata, CorpusIndex, FlatL2Index, IndexStore, RagError};

fn five_chunk_corpus() -> CorpusIndex {
    let vectors = vec![
        vec![0.0, 0.0, 1.0],
        vec![1.0, 0.5, 0.0],
        vec![0.2, 0.9, 0.1],
        vec![-1.0, 0.0, 0.3],
        vec![0.5, 0.5, 0.5],
    ];
    let chunks = ["intro", "loss", "gradients", "regularization", "summary"]
        .iter()
        .enumerate()
        .map(|(i, text)| Chunk {
            text: format!("{text} section"),
            metadata: ChunkMetadata::new(if i < 3 { "a.pdf" } else { "b.pdf" }, i % 3),
        })
        .collect();
    CorpusIndex::new("nomic-embed-text", FlatL2Index::build(&vectors).unwrap(), chunks).unwrap()
}

#[test]
fn round_trip_preserves_search_results() {
    let temp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(temp.path().join("index"));
    let corpus = five_chunk_corpus();
    store.save(&corpus).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, corpus);
    assert_eq!(loaded.embedding_model(), "nomic-embed-text");

    for query in [[0.1, 0.1, 0.9], [1.0, 1.0, 1.0], [-0.5, 0.2, 0.0]] {
        assert_eq!(
            loaded.index().search(&query, 3).unwrap(),
            corpus.index().search(&query, 3).unwrap()
        );
    }
}

#[test]
fn missing_directory_means_no_index() {
    let temp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(temp.path().join("never-built"));
    assert!(store.load().unwrap().is_none());
    assert!(!store.exists());
}

#[test]
fn any_missing_artifact_means_no_index() {
    for artifact in [MANIFEST_FILE, VECTORS_FILE, CHUNKS_FILE, METADATA_FILE] {
        let temp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(temp.path().join("index"));
        store.save(&five_chunk_corpus()).unwrap();
        fs::remove_file(store.dir().join(artifact)).unwrap();

        assert!(store.load().unwrap().is_none(), "{artifact} removed");
        assert!(matches!(store.load_required(), Err(RagError::IndexUnavailable(_))));
    }
}

#[test]
fn disagreeing_artifacts_are_reported() {
    let temp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(temp.path().join("index"));
    store.save(&five_chunk_corpus()).unwrap();

    let texts: Vec<String> =
        serde_json::from_str(&fs::read_to_string(store.dir().join(CHUNKS_FILE)).unwrap()).unwrap();
    fs::write(store.dir().join(CHUNKS_FILE), serde_json::to_string(&texts[..4]).unwrap()).unwrap();

    assert!(matches!(store.load(), Err(RagError::IndexUnavailable(_))));
}

#[test]
fn corrupt_artifact_is_an_error_not_absence() {
    let temp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(temp.path().join("index"));
    store.save(&five_chunk_corpus()).unwrap();
    fs::write(store.dir().join(METADATA_FILE), "{not json").unwrap();

    assert!(matches!(store.load(), Err(RagError::Json(_))));
}

#[test]
fn saving_over_an_existing_bundle_replaces_it() {
    let temp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(temp.path().join("index"));
    store.save(&five_chunk_corpus()).unwrap();

    let smaller = CorpusIndex::new(
        "other-model",
        FlatL2Index::build(&[vec![1.0, 1.0]]).unwrap(),
        vec![Chunk { text: "only".into(), metadata: ChunkMetadata::new("c.pdf", 0) }],
    )
    .unwrap();
    let manifest = store.save(&smaller).unwrap();

    assert_eq!(manifest.chunk_count, 1);
    assert_eq!(store.load_required().unwrap(), smaller);
}

#[test]
fn save_refuses_to_replace_a_directory_that_is_not_an_index() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("lectures");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("notes.txt"), "week one notes").unwrap();

    let err = IndexStore::new(&dir).save(&five_chunk_corpus()).unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));

    assert_eq!(fs::read_to_string(dir.join("notes.txt")).unwrap(), "week one notes");
    assert!(!dir.join(MANIFEST_FILE).exists());
    let entries: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["lectures".to_string()]);
}

#[test]
fn save_refuses_to_replace_a_plain_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("index");
    fs::write(&path, "not a directory").unwrap();

    let err = IndexStore::new(&path).save(&five_chunk_corpus()).unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "not a directory");
}

#[test]
fn save_fills_an_existing_empty_directory() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("index");
    fs::create_dir(&dir).unwrap();

    let store = IndexStore::new(&dir);
    store.save(&five_chunk_corpus()).unwrap();
    assert_eq!(store.load_required().unwrap(), five_chunk_corpus());
}
