use std::sync::Arc;

use super::*;
use crate::logic::store::{InMemoryVectorStore, VectorEncoding, VectorStoreClient};
use crate::logic::testing::FaultyStore;

const KS: &str = "utility_keyspace";
const TABLE: &str = "rates";

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

async fn seeded(store: &Arc<InMemoryVectorStore>) -> VectorStoreClient {
    let client = VectorStoreClient::new(store.clone(), VectorEncoding::Floats);
    client.write(KS, TABLE, "k1", &[1.0, 2.0, 3.0]).await.unwrap();
    client.write(KS, TABLE, "k2", &[4.0, 5.0, 6.0]).await.unwrap();
    client.write(KS, TABLE, "k3", &[7.0, 8.0, 9.0]).await.unwrap();
    client
}

#[tokio::test]
async fn test_never_written_key_is_missing_not_error() {
    let store = Arc::new(InMemoryVectorStore::default());
    let client = seeded(&store).await;
    let retriever = Retriever::new(client);

    let fetched = retriever.fetch(&keys(&["k1", "ghost", "k3"]), KS, TABLE, 3).await;

    assert_eq!(fetched.len(), 3);
    assert_eq!(fetched[1], Fetched::Missing { key: "ghost".to_string() });

    let summary = RetrievalSummary::from_fetched(fetched);
    assert_eq!(summary.keys, keys(&["k1", "k3"]));
    assert_eq!(summary.found(), 2);
    assert_eq!(summary.vectors[1].as_slice(), &[7.0, 8.0, 9.0]);
    assert_eq!(summary.missing, keys(&["ghost"]));
    assert!(summary.failed.is_empty());
}

#[tokio::test]
async fn test_padding_is_stripped_to_expected_dim() {
    let store = Arc::new(InMemoryVectorStore::new(VectorEncoding::PackedF32Le).with_padding(16));
    let client = VectorStoreClient::new(store.clone(), VectorEncoding::PackedF32Le);
    client.write(KS, TABLE, "85001", &[0.25, -1.5, 3.0]).await.unwrap();

    let fetched = Retriever::new(client).fetch(&keys(&["85001"]), KS, TABLE, 3).await;

    match &fetched[0] {
        Fetched::Found { vector, .. } => assert_eq!(vector.as_slice(), &[0.25, -1.5, 3.0]),
        other => panic!("expected Found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_short_stored_vector_is_failed() {
    let store = Arc::new(InMemoryVectorStore::default());
    let client = seeded(&store).await;

    let fetched = Retriever::new(client).fetch(&keys(&["k2"]), KS, TABLE, 5).await;

    match &fetched[0] {
        Fetched::Failed { key, error } => {
            assert_eq!(key, "k2");
            assert!(error.contains("expected 5, got 3"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_read_failure_does_not_stop_later_reads() {
    let mut faulty = FaultyStore::new();
    faulty.unreadable_keys.insert("k1".to_string());
    let store = faulty.shared();
    let client = store.client();
    for (key, v) in [("k1", [1.0, 1.0]), ("k2", [2.0, 2.0])] {
        client.write(KS, TABLE, key, &v).await.unwrap();
    }

    let summary = Retriever::new(client).fetch_summary(&keys(&["k1", "k2"]), KS, TABLE, 2).await;

    assert_eq!(summary.keys, keys(&["k2"]));
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "k1");
}

#[tokio::test]
async fn test_unreplicated_write_shows_up_as_missing() {
    let mut faulty = FaultyStore::new();
    faulty.lost_keys.insert("late".to_string());
    let store = faulty.shared();
    let client = store.client();
    assert!(client.write(KS, TABLE, "late", &[1.0]).await.unwrap());

    let fetched = Retriever::new(client).fetch(&keys(&["late"]), KS, TABLE, 1).await;
    assert_eq!(fetched, vec![Fetched::Missing { key: "late".to_string() }]);
}

#[tokio::test]
async fn test_cancelled_retriever_skips_reads() {
    let store = Arc::new(InMemoryVectorStore::default());
    let client = seeded(&store).await;
    let control = RunControl::new();
    control.cancel();

    let fetched = Retriever::new(client).with_control(control).fetch(&keys(&["k1", "k2"]), KS, TABLE, 3).await;

    assert!(fetched.iter().all(|f| matches!(f, Fetched::Failed { .. })));
    assert_eq!(fetched[1].key(), "k2");
}
