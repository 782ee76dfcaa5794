//! Property tests for word-window chunking.

use lecture_rag::{Chunker, Document, WordWindowChunker, build_corpus_chunks, chunk_text};
use proptest::prelude::*;

fn arb_words() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z]{1,8}", 0..120)
}

/// Join words with a random mix of spaces, tabs and newlines.
fn arb_text() -> impl Strategy<Value = (Vec<String>, String)> {
    arb_words().prop_flat_map(|words| {
        let n = words.len();
        proptest::collection::vec(prop_oneof![Just(" "), Just("  "), Just("\n"), Just("\t ")], n)
            .prop_map(move |seps| {
                let text = words
                    .iter()
                    .zip(seps)
                    .map(|(word, sep)| format!("{word}{sep}"))
                    .collect::<String>();
                (words.clone(), text)
            })
    })
}

fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..30).prop_flat_map(|size| (Just(size), 0..size))
}

/// **Property 1: Chunk coverage**
/// *For any* text and valid parameters, every word of the text appears in at
/// least one chunk, and each chunk is exactly the words of its window.
mod prop_chunk_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn every_word_is_covered_and_windows_are_exact(
            (words, text) in arb_text(),
            (size, overlap) in arb_params(),
        ) {
            let chunker = WordWindowChunker::new(size, overlap).unwrap();
            let chunks = chunker.split(&text);
            let ranges: Vec<_> = chunker.windows(words.len()).collect();

            prop_assert_eq!(chunks.len(), ranges.len());
            for (chunk, range) in chunks.iter().zip(&ranges) {
                prop_assert_eq!(chunk, &words[range.clone()].join(" "));
                prop_assert!(range.len() <= size);
            }

            let mut covered = vec![false; words.len()];
            for range in &ranges {
                for slot in &mut covered[range.clone()] {
                    *slot = true;
                }
            }
            prop_assert!(covered.iter().all(|&c| c));
            if let Some(last) = ranges.last() {
                prop_assert_eq!(last.end, words.len());
            }
        }

        #[test]
        fn consecutive_chunks_share_overlap_words(
            (words, text) in arb_text(),
            (size, overlap) in arb_params(),
        ) {
            let chunker = WordWindowChunker::new(size, overlap).unwrap();
            let ranges: Vec<_> = chunker.windows(words.len()).collect();
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[1].start - pair[0].start, size - overlap);
                if pair[0].len() == size {
                    prop_assert_eq!(pair[0].end - pair[1].start, overlap);
                }
            }
            prop_assert_eq!(chunk_text(&text, size, overlap).unwrap(), chunker.split(&text));
        }
    }
}

/// **Property 2: Chunk id contiguity**
/// *For any* set of documents, the corpus chunk list is grouped by document in
/// input order and each document's `chunk_id`s run `0..n` without gaps.
mod prop_chunk_id_contiguity {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn ids_are_contiguous_per_document(
            texts in proptest::collection::vec(arb_text(), 0..6),
            (size, overlap) in arb_params(),
        ) {
            let documents: Vec<Document> = texts
                .iter()
                .enumerate()
                .map(|(i, (_, text))| Document::new(format!("doc_{i}.pdf"), text.clone()))
                .collect();
            let chunker = WordWindowChunker::new(size, overlap).unwrap();
            let corpus = build_corpus_chunks(&documents, &chunker);

            let mut offset = 0;
            for document in &documents {
                let own = chunker.chunk(document);
                let slice = &corpus[offset..offset + own.len()];
                for (expected_id, chunk) in slice.iter().enumerate() {
                    prop_assert_eq!(&chunk.metadata.doc_name, &document.name);
                    prop_assert_eq!(chunk.metadata.chunk_id, expected_id);
                }
                offset += own.len();
            }
            prop_assert_eq!(offset, corpus.len());
        }
    }
}

#[test]
fn ten_words_size_four_overlap_one() {
    let text = "w0 w1 w2 w3 w4 w5 w6 w7 w8 w9";
    assert_eq!(
        chunk_text(text, 4, 1).unwrap(),
        vec!["w0 w1 w2 w3", "w3 w4 w5 w6", "w6 w7 w8 w9", "w9"]
    );
}

#[test]
fn line_breaks_are_collapsed() {
    let chunks = chunk_text("first line\nsecond\n\nline", 10, 2).unwrap();
    assert_eq!(chunks, vec!["first line second line"]);
}

#[test]
fn overlap_not_smaller_than_size_is_rejected() {
    assert!(chunk_text("a b c", 2, 2).is_err());
    assert!(chunk_text("a b c", 0, 0).is_err());
}
