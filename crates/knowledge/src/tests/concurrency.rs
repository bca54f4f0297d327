//! Overlapping writers against one index file.

use super::*;
use crate::store::IndexStore;
use crate::types::ChunkRecord;

fn upload(file: &str, n: usize) -> Vec<ChunkRecord> {
    (0..n)
        .map(|i| ChunkRecord::new(file, format!("{} chunk {}", file, i), vec![0.5; 4]))
        .collect()
}

/// Two read-modify-write cycles on the bare store that both load before
/// either saves: the second save drops the first upload.
#[tokio::test]
async fn test_unguarded_store_loses_an_overlapping_upload() {
    let temp = TempDir::new().unwrap();
    let store = IndexStore::new(temp.path().join("index.json"));
    store.save(&upload("existing.txt", 1)).await.unwrap();

    let mut first = store.load().await;
    let mut second = store.load().await;

    first.extend(upload("first.txt", 2));
    store.save(&first).await.unwrap();

    second.extend(upload("second.txt", 3));
    store.save(&second).await.unwrap();

    let files: Vec<String> = store
        .load()
        .await
        .into_iter()
        .map(|r| r.file_name)
        .collect();
    assert_eq!(files.len(), 4);
    assert!(!files.iter().any(|f| f == "first.txt"));
}

#[tokio::test]
async fn test_concurrent_ingests_through_pipeline_keep_every_chunk() {
    let (_temp, config) = temp_config();
    let pipeline = Arc::new(pipeline_with(
        &config,
        CountingProvider::new(),
        CannedLlm::new(),
    ));

    let ingests = (0..8).map(|i| {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            pipeline
                .ingest_text(&alphabet_text(900), &format!("report-{}.txt", i))
                .await
        })
    });

    let mut total = 0;
    for handle in futures::future::join_all(ingests).await {
        total += handle.unwrap().unwrap().chunks;
    }

    assert_eq!(total, 24);
    let stats = pipeline.stats().await;
    assert_eq!(stats.chunks, 24);
    assert_eq!(stats.files, 8);
}

#[tokio::test]
async fn test_query_during_ingest_sees_complete_index() {
    let (_temp, config) = temp_config();
    let pipeline = Arc::new(pipeline_with(
        &config,
        CountingProvider::new(),
        CannedLlm::new(),
    ));
    pipeline
        .ingest_text("Initial discharge letter.", "letter.txt")
        .await
        .unwrap();

    let writer = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            for i in 0..5 {
                pipeline
                    .ingest_text(&alphabet_text(700), &format!("scan-{}.txt", i))
                    .await
                    .unwrap();
            }
        })
    };

    for _ in 0..5 {
        let response = pipeline
            .ask(crate::types::AskRequest::new("discharge letter"))
            .await
            .unwrap();
        assert!(!response.sources.is_empty());
    }

    writer.await.unwrap();
    assert_eq!(pipeline.stats().await.chunks, 1 + 5 * 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_name_uploads_in_flight_stay_separate() {
    let (_temp, config) = temp_config();
    let pipeline = Arc::new(pipeline_with(
        &config,
        CountingProvider::new(),
        CannedLlm::new(),
    ));

    let uploads = (0..40).map(|i| {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            let body = format!("unique document body number {}", i);
            pipeline.ingest_upload(body.as_bytes(), "scan.txt").await
        })
    });

    for handle in futures::future::join_all(uploads).await {
        assert_eq!(handle.unwrap().unwrap().chunks, 1);
    }

    let mut texts: Vec<String> = pipeline
        .store()
        .load()
        .await
        .into_iter()
        .map(|r| r.text)
        .collect();
    texts.sort();
    let mut expected: Vec<String> = (0..40)
        .map(|i| format!("unique document body number {}", i))
        .collect();
    expected.sort();
    assert_eq!(texts, expected);

    let leftovers = std::fs::read_dir(config.upload_dir()).unwrap().count();
    assert_eq!(leftovers, 0);
}
