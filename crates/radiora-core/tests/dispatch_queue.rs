//! Tests for dispatch::FeedbackQueue

use parking_lot::Mutex;
use radiora_core::{decode, Feedback, FeedbackQueue, FeedbackTag, ObserverKey, QueueError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

fn lzc(zone: u32) -> Feedback {
    decode(&format!("LZC,{},ON", zone)).unwrap()
}

#[tokio::test]
async fn test_delivery_preserves_fifo_order() {
    let queue = FeedbackQueue::start().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let s = seen.clone();
    queue
        .set_observer(ObserverKey::Any, move |feedback| {
            s.lock().push(feedback.to_string());
        })
        .unwrap();

    queue.enqueue(lzc(1)).unwrap();
    queue.enqueue(Feedback::Prompt).unwrap();
    queue.enqueue(lzc(2)).unwrap();

    wait_until(|| seen.lock().len() == 3).await;
    assert_eq!(*seen.lock(), vec!["LZC,1,ON", "!", "LZC,2,ON"]);

    queue.stop().unwrap();
}

#[tokio::test]
async fn test_many_items_from_another_thread_stay_ordered() {
    let queue = Arc::new(FeedbackQueue::start().unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let s = seen.clone();
    queue
        .set_observer(FeedbackTag::LocalZoneChange, move |feedback| {
            if let Feedback::LocalZoneChange(z) = feedback {
                s.lock().push(z.zone_number);
            }
        })
        .unwrap();

    let producer = queue.clone();
    std::thread::spawn(move || {
        for zone in 1..=200 {
            producer.enqueue(lzc(zone)).unwrap();
        }
    })
    .join()
    .unwrap();

    wait_until(|| seen.lock().len() == 200).await;
    let expected: Vec<u32> = (1..=200).collect();
    assert_eq!(*seen.lock(), expected);

    queue.stop().unwrap();
}

#[tokio::test]
async fn test_second_registration_replaces_first() {
    let queue = FeedbackQueue::start().unwrap();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let f = first.clone();
    queue
        .set_observer(FeedbackTag::Prompt, move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    let s = second.clone();
    queue
        .set_observer(FeedbackTag::Prompt, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    queue.enqueue(Feedback::Prompt).unwrap();
    queue.enqueue(Feedback::Prompt).unwrap();

    wait_until(|| second.load(Ordering::SeqCst) == 2).await;
    assert_eq!(first.load(Ordering::SeqCst), 0);

    queue.stop().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_discards_buffered_items_and_waits_for_running_observer() {
    let queue = FeedbackQueue::start().unwrap();
    let entered = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));
    let delivered = Arc::new(AtomicUsize::new(0));

    let (e, f, d) = (entered.clone(), finished.clone(), delivered.clone());
    queue
        .set_observer(ObserverKey::Any, move |_| {
            d.fetch_add(1, Ordering::SeqCst);
            e.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(100));
            f.store(true, Ordering::SeqCst);
        })
        .unwrap();

    queue.enqueue(lzc(1)).unwrap();
    queue.enqueue(lzc(2)).unwrap();
    queue.enqueue(lzc(3)).unwrap();

    wait_until(|| entered.load(Ordering::SeqCst)).await;
    queue.stop().unwrap();

    // stop returned only after the in-flight observer completed
    assert!(finished.load(Ordering::SeqCst));
    assert_eq!(queue.pending(), 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(delivered.load(Ordering::SeqCst), 1);

    assert_eq!(queue.enqueue(lzc(4)), Err(QueueError::Stopped));
}

#[tokio::test]
async fn test_observer_may_register_observers() {
    let queue = Arc::new(FeedbackQueue::start().unwrap());
    let late = Arc::new(AtomicUsize::new(0));

    let q = queue.clone();
    let l = late.clone();
    queue
        .set_observer(FeedbackTag::Prompt, move |_| {
            let l = l.clone();
            q.set_observer(FeedbackTag::LocalZoneChange, move |_| {
                l.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        })
        .unwrap();

    queue.enqueue(Feedback::Prompt).unwrap();
    queue.enqueue(lzc(9)).unwrap();

    wait_until(|| late.load(Ordering::SeqCst) == 1).await;

    queue.stop().unwrap();
}

#[tokio::test]
async fn test_observer_panic_faults_queue() {
    let queue = FeedbackQueue::start().unwrap();
    queue
        .set_observer(FeedbackTag::Prompt, |_| panic!("observer exploded"))
        .unwrap();

    queue.enqueue(Feedback::Prompt).unwrap();

    wait_until(|| queue.is_faulted()).await;
    assert!(!queue.is_running());
    assert_eq!(queue.enqueue(Feedback::Prompt), Err(QueueError::Faulted));
    assert_eq!(
        queue.set_observer(FeedbackTag::LocalZoneChange, |_| {}),
        Err(QueueError::Faulted)
    );

    let err = queue.stop().unwrap_err();
    assert_eq!(
        err,
        QueueError::ObserverPanicked {
            message: "observer exploded".to_string()
        }
    );
    assert!(!err.is_contract_violation());
}

#[tokio::test]
async fn test_unobserved_feedback_is_dropped() {
    let queue = FeedbackQueue::start().unwrap();
    let count = Arc::new(AtomicUsize::new(0));

    queue.enqueue(lzc(1)).unwrap();

    let c = count.clone();
    queue
        .set_observer(FeedbackTag::Prompt, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    queue.enqueue(Feedback::Prompt).unwrap();

    wait_until(|| count.load(Ordering::SeqCst) == 1).await;
    assert_eq!(queue.pending(), 0);

    queue.stop().unwrap();
}

#[tokio::test]
async fn test_blocking_observer_does_not_stall_runtime() {
    // default current-thread runtime: observers must not run on it
    let queue = FeedbackQueue::start().unwrap();
    let entered = Arc::new(AtomicBool::new(false));

    let e = entered.clone();
    queue
        .set_observer(FeedbackTag::Prompt, move |_| {
            e.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(500));
        })
        .unwrap();
    queue.enqueue(Feedback::Prompt).unwrap();
    wait_until(|| entered.load(Ordering::SeqCst)).await;

    let ticks = Arc::new(AtomicUsize::new(0));
    let t = ticks.clone();
    let ticker = tokio::spawn(async move {
        loop {
            t.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let started = std::time::Instant::now();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(started.elapsed() < Duration::from_millis(300));
    assert!(ticks.load(Ordering::SeqCst) > 0);

    ticker.abort();
    queue.stop().unwrap();
}

#[test]
fn test_queue_runs_without_async_runtime() {
    let queue = FeedbackQueue::start().unwrap();
    let count = Arc::new(AtomicUsize::new(0));

    let c = count.clone();
    queue
        .set_observer(ObserverKey::Any, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    queue.enqueue(Feedback::Prompt).unwrap();
    queue.enqueue(lzc(3)).unwrap();

    for _ in 0..400 {
        if count.load(Ordering::SeqCst) == 2 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(count.load(Ordering::SeqCst), 2);
    queue.stop().unwrap();
}
