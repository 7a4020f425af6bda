use crate::server::store::UserRecord;
use core::time::Duration;
use roster_tonic_core::{Error, Result, proto::User};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Applies a `ListUsers` filter and page size to a store snapshot.
///
/// - A non-empty `filter` keeps records whose name or email contains it,
///   ignoring case.
/// - A positive `page_size` keeps at most that many records, in snapshot
///   order. Zero or negative keeps everything.
pub fn select_users(
    snapshot: Vec<Arc<UserRecord>>,
    filter: &str,
    page_size: i32,
) -> Vec<Arc<UserRecord>> {
    let limit = usize::try_from(page_size)
        .ok()
        .filter(|n| *n > 0)
        .unwrap_or(usize::MAX);

    if filter.is_empty() {
        return snapshot.into_iter().take(limit).collect();
    }

    let needle = filter.to_lowercase();
    snapshot
        .into_iter()
        .filter(|user| user.matches_filter(&needle))
        .take(limit)
        .collect()
}

/// Emits `records` to a `ListUsers` response channel.
///
/// Cancellation is checked before every emission and interrupts the pacing
/// `delay` and any wait on a full channel:
///
/// - The client going away (receiver dropped) ends the stream quietly and
///   returns the number of records already emitted.
/// - `shutdown` firing returns [`Error::ServiceShutdown`].
///
/// # Arguments
///
/// - `records`: The selected records, in emission order.
/// - `tx`: Response channel backing the gRPC stream.
/// - `shutdown`: Service-wide shutdown token.
/// - `delay`: Pause between consecutive records. `Duration::ZERO` disables it.
pub async fn stream_users(
    records: Vec<Arc<UserRecord>>,
    tx: mpsc::Sender<core::result::Result<User, Status>>,
    shutdown: CancellationToken,
    delay: Duration,
) -> Result<usize> {
    let mut emitted = 0;

    for record in records {
        if emitted > 0 && !delay.is_zero() {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => return Err(Error::ServiceShutdown),
                () = tx.closed() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        if shutdown.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }
        if tx.is_closed() {
            break;
        }

        let user = User::from(record.as_ref());
        tokio::select! {
            biased;
            () = shutdown.cancelled() => return Err(Error::ServiceShutdown),
            sent = tx.send(Ok(user)) => {
                if sent.is_err() {
                    break;
                }
            }
        }
        emitted += 1;
    }

    if tx.is_closed() {
        tracing::debug!(emitted, "Client cancelled ListUsers stream");
    }
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::store::{UserDraft, UserStore};

    fn populated(names: &[&str]) -> UserStore {
        let store = UserStore::new();
        for (i, name) in names.iter().enumerate() {
            store
                .create(UserDraft {
                    name: (*name).to_string(),
                    email: format!("{}{i}@example.com", name.to_lowercase()),
                    age: 20 + i as i32,
                })
                .unwrap();
        }
        store
    }

    fn names(records: &[Arc<UserRecord>]) -> Vec<&str> {
        records.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn filter_is_case_insensitive_on_name_and_email() {
        let store = populated(&["Ann", "Bob", "Joanna"]);

        let selected = select_users(store.list_all(), "ann", 0);
        assert_eq!(names(&selected), ["Ann", "Joanna"]);

        let selected = select_users(store.list_all(), "BOB1@EXAMPLE", 0);
        assert_eq!(names(&selected), ["Bob"]);

        assert!(select_users(store.list_all(), "zed", 0).is_empty());
    }

    #[test]
    fn page_size_truncates_in_snapshot_order() {
        let store = populated(&["A", "B", "C", "D", "E"]);

        assert_eq!(names(&select_users(store.list_all(), "", 2)), ["A", "B"]);
        assert_eq!(select_users(store.list_all(), "", 0).len(), 5);
        assert_eq!(select_users(store.list_all(), "", -4).len(), 5);
        assert_eq!(select_users(store.list_all(), "", 50).len(), 5);
    }

    #[test]
    fn filter_applies_before_page_size() {
        let store = populated(&["Ann", "Bob", "Annette", "Hanna"]);
        let selected = select_users(store.list_all(), "ann", 2);
        assert_eq!(names(&selected), ["Ann", "Annette"]);
    }

    #[tokio::test]
    async fn streams_every_record_in_order() {
        let store = populated(&["A", "B", "C", "D", "E"]);
        let (tx, mut rx) = mpsc::channel(8);

        let emitted = stream_users(
            store.list_all(),
            tx,
            CancellationToken::new(),
            Duration::ZERO,
        )
        .await
        .unwrap();
        assert_eq!(emitted, 5);

        let mut ids = Vec::new();
        while let Some(user) = rx.recv().await {
            ids.push(user.unwrap().id);
        }
        assert_eq!(ids, [1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn client_cancellation_ends_stream_without_error() {
        let store = populated(&["A", "B", "C", "D", "E"]);
        let (tx, mut rx) = mpsc::channel(1);

        let producer = tokio::spawn(stream_users(
            store.list_all(),
            tx,
            CancellationToken::new(),
            Duration::from_millis(500),
        ));

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.id, 1);
        drop(rx);

        let emitted = producer.await.unwrap().unwrap();
        assert!(emitted < 5, "emitted {emitted}");
    }

    #[tokio::test]
    async fn shutdown_interrupts_pacing() {
        let store = populated(&["A", "B", "C"]);
        let (tx, mut rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();

        let producer = tokio::spawn(stream_users(
            store.list_all(),
            tx,
            shutdown.clone(),
            Duration::from_secs(60),
        ));

        rx.recv().await.unwrap().unwrap();
        shutdown.cancel();

        let result = producer.await.unwrap();
        assert_eq!(result, Err(Error::ServiceShutdown));
    }

    #[tokio::test]
    async fn empty_selection_emits_nothing() {
        let (tx, mut rx) = mpsc::channel(1);
        let emitted = stream_users(Vec::new(), tx, CancellationToken::new(), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(emitted, 0);
        assert!(rx.recv().await.is_none());
    }
}
