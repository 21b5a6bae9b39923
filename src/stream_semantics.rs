// Exploratory tests pinning down the stream and task behaviour the view-models rely on

use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinSet;

#[tokio::test]
async fn map_transforms_each_item() {
    let doubled: Vec<i32> = stream::iter(1..=3).map(|n| n * 2).collect().await;
    assert_eq!(doubled, vec![2, 4, 6]);
}

#[tokio::test]
async fn zip_pairs_items_and_stops_at_shorter() {
    let zipped: Vec<(i32, &str)> = stream::iter(1..=3)
        .zip(stream::iter(["one", "two"]))
        .collect()
        .await;
    assert_eq!(zipped, vec![(1, "one"), (2, "two")]);
}

#[tokio::test]
async fn select_merges_both_sources() {
    let mut merged: Vec<i32> = stream::select(stream::iter(vec![1, 3]), stream::iter(vec![2, 4]))
        .collect()
        .await;
    merged.sort_unstable();
    assert_eq!(merged, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn combine_latest_over_watch_channels() {
    let (name_tx, mut name_rx) = watch::channel("flour");
    let (qty_tx, mut qty_rx) = watch::channel(1);

    let combine = |name: &watch::Receiver<&str>, qty: &watch::Receiver<i32>| {
        format!("{} x{}", *name.borrow(), *qty.borrow())
    };
    assert_eq!(combine(&name_rx, &qty_rx), "flour x1");

    qty_tx.send(3).unwrap();
    qty_rx.changed().await.unwrap();
    assert_eq!(combine(&name_rx, &qty_rx), "flour x3");

    name_tx.send("sugar").unwrap();
    name_rx.changed().await.unwrap();
    assert_eq!(combine(&name_rx, &qty_rx), "sugar x3");
}

#[tokio::test]
async fn watch_conflates_to_latest_value() {
    let (tx, mut rx) = watch::channel(0);
    for n in 1..=5 {
        tx.send(n).unwrap();
    }
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), 5);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn late_watch_subscriber_sees_current_value() {
    let (tx, _rx) = watch::channel("Initial");
    tx.send_replace("Loading");

    let late = tx.subscribe();
    assert_eq!(*late.borrow(), "Loading");
}

#[tokio::test]
async fn shared_source_runs_once_for_all_subscribers() {
    let runs = Arc::new(AtomicUsize::new(0));
    let (tx, mut first) = broadcast::channel(8);
    let mut second = tx.subscribe();

    runs.fetch_add(1, Ordering::SeqCst);
    for n in 1..=3 {
        tx.send(n).unwrap();
    }

    let mut seen_first = Vec::new();
    let mut seen_second = Vec::new();
    for _ in 0..3 {
        seen_first.push(first.recv().await.unwrap());
        seen_second.push(second.recv().await.unwrap());
    }
    assert_eq!(seen_first, vec![1, 2, 3]);
    assert_eq!(seen_second, vec![1, 2, 3]);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cold_stream_reruns_for_each_collector() {
    let runs = Arc::new(AtomicUsize::new(0));
    let make_stream = {
        let runs = Arc::clone(&runs);
        move || {
            let runs = Arc::clone(&runs);
            stream::once(async move { runs.fetch_add(1, Ordering::SeqCst) })
                .flat_map(|_| stream::iter(1..=3))
        }
    };

    let first: Vec<i32> = make_stream().collect().await;
    let second: Vec<i32> = make_stream().collect().await;

    assert_eq!(first, second);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cold_stream_does_nothing_until_polled() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let lazy = stream::once(async move { counter.fetch_add(1, Ordering::SeqCst) });

    tokio::task::yield_now().await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    let _: Vec<usize> = lazy.collect().await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn aborting_parent_drops_child_set() {
    let (child_dropped_tx, child_dropped_rx) = oneshot::channel::<()>();
    let (started_tx, started_rx) = oneshot::channel();

    let parent = tokio::spawn(async move {
        let mut children = JoinSet::new();
        children.spawn(async move {
            // Dropping the sender signals the receiver when this task is aborted
            let _guard = child_dropped_tx;
            std::future::pending::<()>().await;
        });
        let _ = started_tx.send(());
        std::future::pending::<()>().await;
        drop(children);
    });

    started_rx.await.unwrap();
    parent.abort();
    assert!(parent.await.unwrap_err().is_cancelled());

    let dropped = tokio::time::timeout(Duration::from_secs(1), child_dropped_rx).await;
    assert!(matches!(dropped, Ok(Err(_))));
}

#[tokio::test]
async fn failing_child_does_not_cancel_siblings_in_join_set() {
    let mut set = JoinSet::new();
    set.spawn(async { Err::<i32, &str>("burnt") });
    set.spawn(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(42)
    });

    let mut results = Vec::new();
    while let Some(result) = set.join_next().await {
        results.push(result.unwrap());
    }
    results.sort();
    assert_eq!(results, vec![Ok(42), Err("burnt")]);
}
