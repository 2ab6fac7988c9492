// tests/completion.rs

use runxfer::exec::completion::Completion;

#[tokio::test]
async fn only_the_first_resolution_is_observed() {
    let (completion, rx) = Completion::new();

    assert!(!completion.is_resolved());
    assert!(completion.resolve(1));
    assert!(!completion.resolve(2));
    assert!(completion.is_resolved());

    assert_eq!(rx.await, Ok(1));
}

#[tokio::test]
async fn concurrent_resolvers_race_safely() {
    let (completion, rx) = Completion::new();
    let completion = std::sync::Arc::new(completion);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let completion = completion.clone();
            tokio::spawn(async move { completion.resolve(i) })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.expect("resolver task") {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    assert!(rx.await.is_ok());
}

#[test]
fn dropped_receiver_reports_unresolved_send() {
    let (completion, rx) = Completion::<u8>::new();
    drop(rx);

    assert!(!completion.resolve(1));
    assert!(completion.is_resolved());
}
