//! Tests for the typed client against the in-memory store.

use std::sync::Arc;

use super::*;

const KS: &str = "test_keyspace";
const TABLE: &str = "vectors";

fn client_with(store: InMemoryVectorStore, encoding: VectorEncoding) -> (Arc<InMemoryVectorStore>, VectorStoreClient) {
    let store = Arc::new(store);
    let client = VectorStoreClient::new(store.clone(), encoding);
    (store, client)
}

#[tokio::test]
async fn test_write_then_read_middle_key() {
    let (_, client) = client_with(InMemoryVectorStore::default(), VectorEncoding::Floats);

    client.write(KS, TABLE, "k1", &[1.0, 2.0, 3.0]).await.unwrap();
    client.write(KS, TABLE, "k2", &[4.0, 5.0, 6.0]).await.unwrap();
    client.write(KS, TABLE, "k3", &[7.0, 8.0, 9.0]).await.unwrap();

    let got = client.read(KS, TABLE, "k2").await.unwrap();
    assert_eq!(got, Some(vec![4.0, 5.0, 6.0]));
}

#[tokio::test]
async fn test_read_unknown_key_is_not_found() {
    let (_, client) = client_with(InMemoryVectorStore::default(), VectorEncoding::Floats);
    assert_eq!(client.read(KS, TABLE, "never_written").await.unwrap(), None);
}

#[tokio::test]
async fn test_rewriting_same_key_is_idempotent() {
    let (store, client) = client_with(InMemoryVectorStore::default(), VectorEncoding::Floats);

    client.write(KS, TABLE, "dup", &[0.1, 0.2]).await.unwrap();
    let once = client.read(KS, TABLE, "dup").await.unwrap();
    client.write(KS, TABLE, "dup", &[0.1, 0.2]).await.unwrap();
    let twice = client.read(KS, TABLE, "dup").await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(store.len(KS, TABLE), 1);
}

#[tokio::test]
async fn test_packed_round_trip_with_padding() {
    let store = InMemoryVectorStore::new(VectorEncoding::PackedF32Le).with_padding(12);
    let (_, client) = client_with(store, VectorEncoding::PackedF32Le);

    let written = [0.125_f32, 3.5, -7.25];
    client.write(KS, TABLE, "p", &written).await.unwrap();

    let read = client.read(KS, TABLE, "p").await.unwrap().unwrap();
    assert_eq!(read.len(), 12);
    for (a, b) in read.iter().take(3).zip(written.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
    assert!(read[3..].iter().all(|v| *v == 0.0));
}

#[tokio::test]
async fn test_mixed_encoding_read_fails_loudly() {
    let store = InMemoryVectorStore::new(VectorEncoding::PackedF32Le);
    let (_, client) = client_with(store, VectorEncoding::Floats);

    client.write(KS, TABLE, "x", &[1.0, 2.0]).await.unwrap();
    let err = client.read(KS, TABLE, "x").await.unwrap_err();
    assert!(matches!(err, StoreError::Encoding(_)));
}

#[tokio::test]
async fn test_update_and_delete() {
    let (store, client) = client_with(InMemoryVectorStore::default(), VectorEncoding::Floats);

    assert!(!client.update(KS, TABLE, "missing", &[1.0]).await.unwrap());

    client.write(KS, TABLE, "key", &[0.5, 1.2, 3.4]).await.unwrap();
    assert!(client.update(KS, TABLE, "key", &[2.3, 4.5, 6.7]).await.unwrap());
    assert_eq!(store.get(KS, TABLE, "key"), Some(vec![2.3, 4.5, 6.7]));

    assert!(client.delete(KS, TABLE, "key").await.unwrap());
    assert!(!client.delete(KS, TABLE, "key").await.unwrap());
    assert_eq!(client.read(KS, TABLE, "key").await.unwrap(), None);
}

#[tokio::test]
async fn test_keyspaces_are_isolated() {
    let (_, client) = client_with(InMemoryVectorStore::default(), VectorEncoding::Floats);

    client.write("utility", TABLE, "shared_key", &[1.0]).await.unwrap();
    assert_eq!(client.read("fraud", TABLE, "shared_key").await.unwrap(), None);
}

#[tokio::test]
async fn test_batch_write_preserves_entries() {
    let (store, client) = client_with(InMemoryVectorStore::default(), VectorEncoding::Floats);

    let a = [1.0_f32, 0.0];
    let b = [0.0_f32, 1.0];
    let response = client
        .batch_write(KS, TABLE, vec![("a", &a[..]), ("b", &b[..])])
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(store.batch_calls(), 1);
    assert_eq!(store.get(KS, TABLE, "b"), Some(vec![0.0, 1.0]));
}

#[tokio::test]
async fn test_search_orders_and_truncates() {
    let (_, client) = client_with(InMemoryVectorStore::default(), VectorEncoding::Floats);

    for i in 0..20 {
        let v = [i as f32, (i * 2) as f32, 1.0];
        client.write(KS, TABLE, &format!("row_{}", i), &v).await.unwrap();
    }
    // Different dimension never matches
    client.write(KS, TABLE, "wide", &[1.0, 2.0, 3.0, 4.0]).await.unwrap();

    let matches = client.search(KS, TABLE, &[5.0, 10.0, 1.0], 4, Metric::Euclidean).await.unwrap();
    assert_eq!(matches.len(), 4);
    assert_eq!(matches[0].key, "row_5");
    assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(matches.iter().all(|m| m.key != "wide"));
}

#[tokio::test]
async fn test_search_empty_table() {
    let (_, client) = client_with(InMemoryVectorStore::default(), VectorEncoding::Floats);
    let matches = client.search(KS, TABLE, &[1.0, 2.0], 5, Metric::Cosine).await.unwrap();
    assert!(matches.is_empty());
}
