//! Pipeline orchestration for row-by-row transfers

use super::{
    Connector, Extractor, Loader, LogObserver, TransferObserver, TransferResult, Transformer,
};
use crate::error::{Side, TransferError};
use futures::StreamExt;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    SourceConnecting,
    TargetConnecting,
    Streaming,
    Draining,
    Closed,
    Failed,
}

impl PipelineState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Init, SourceConnecting)
                | (SourceConnecting, TargetConnecting)
                | (SourceConnecting, Failed)
                | (TargetConnecting, Streaming)
                | (TargetConnecting, Failed)
                | (Streaming, Streaming)
                | (Streaming, Draining)
                | (Draining, Closed)
        )
    }

}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::SourceConnecting => "source-connecting",
            Self::TargetConnecting => "target-connecting",
            Self::Streaming => "streaming",
            Self::Draining => "draining",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// ETL pipeline that moves rows from a source connector to a target connector
///
/// Rows are processed strictly one at a time, in the order the source yields
/// them: fetch, transform, load, then the next fetch. Transform failures and
/// load failures are counted and reported but never stop the run. Connection
/// failures and query failures do.
///
/// Both connections are released on every path out of [`Pipeline::run`]:
/// gracefully via `close` when the run returns, and by drop if the future is
/// abandoned or a panic unwinds through it.
///
/// # Type Parameters
/// - `S`: source connector, whose connection is an [`Extractor`]
/// - `T`: transformer from the extractor's items to the loader's items
/// - `D`: target connector, whose connection is a [`Loader`]
///
/// # Example
/// ```no_run
/// use rowpipe::client::{ConnectionConfig, MySqlSource, PostgresTarget};
/// use rowpipe::etl::Pipeline;
/// use rowpipe::rows::{RowMapper, TableName};
///
/// # async fn example() -> eyre::Result<()> {
/// let source = MySqlSource::new(
///     ConnectionConfig::new("localhost", 3306, "etl", "secret", "shop"),
///     TableName::parse("customers")?,
/// );
/// let target = PostgresTarget::new(
///     ConnectionConfig::new("localhost", 5432, "etl", "secret", "warehouse"),
///     TableName::parse("public.customers")?,
/// );
///
/// let result = Pipeline::new(source, RowMapper, target).run().await?;
/// println!("Inserted {} rows", result.rows_inserted);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<S, T, D> {
    source: S,
    transformer: T,
    target: D,
    observer: Box<dyn TransferObserver>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl<S, T, D> Pipeline<S, T, D>
where
    S: Connector,
    S::Connection: Extractor<Item = T::Input>,
    T: Transformer,
    T::Output: Display + Sync,
    D: Connector,
    D::Connection: Loader<Item = T::Output>,
{
    /// Create a new pipeline reporting through [`LogObserver`]
    pub fn new(source: S, transformer: T, target: D) -> Self {
        Self {
            source,
            transformer,
            target,
            observer: Box::new(LogObserver),
            cancel: CancellationToken::new(),
            timeout: None,
        }
    }

    /// Report events to `observer` instead of the log
    pub fn with_observer(mut self, observer: impl TransferObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Stop streaming as soon as `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Deadline applied to every row fetch and every insert
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the transfer once
    ///
    /// Returns the counters of a run that streamed to the end, or stopped
    /// early on a mid-stream fetch failure (see
    /// [`TransferResult::stream_error`]).
    ///
    /// # Errors
    /// Returns a fatal [`TransferError`]: connection failure on either side,
    /// source query failure, or cancellation
    pub async fn run(&self) -> Result<TransferResult, TransferError> {
        let started = Instant::now();
        let mut state = PipelineState::Init;

        self.transition(&mut state, PipelineState::SourceConnecting);
        let source_endpoint = self.source.describe();
        self.observer.connecting(Side::Source, &source_endpoint);
        let mut extractor = match self.source.connect().await {
            Ok(extractor) => extractor,
            Err(e) => {
                self.transition(&mut state, PipelineState::Failed);
                self.observer.failed(&e);
                return Err(e);
            }
        };
        self.observer.connected(Side::Source, &source_endpoint);

        self.transition(&mut state, PipelineState::TargetConnecting);
        let target_endpoint = self.target.describe();
        self.observer.connecting(Side::Target, &target_endpoint);
        let mut loader = match self.target.connect().await {
            Ok(loader) => loader,
            Err(e) => {
                self.transition(&mut state, PipelineState::Failed);
                let closed = extractor.close().await;
                self.observer.released(Side::Source, closed.as_ref().err());
                self.observer.failed(&e);
                return Err(e);
            }
        };
        self.observer.connected(Side::Target, &target_endpoint);

        self.transition(&mut state, PipelineState::Streaming);
        let outcome = self.stream(&mut extractor, &mut loader, &mut state).await;

        self.transition(&mut state, PipelineState::Draining);
        let closed = extractor.close().await;
        self.observer.released(Side::Source, closed.as_ref().err());
        let closed = loader.close().await;
        self.observer.released(Side::Target, closed.as_ref().err());
        self.transition(&mut state, PipelineState::Closed);

        match outcome {
            Ok(mut result) => {
                result.elapsed = started.elapsed();
                self.observer.finished(&result);
                Ok(result)
            }
            Err(e) => {
                self.observer.failed(&e);
                Err(e)
            }
        }
    }

    /// Drive the read → transform → load loop until the source is exhausted
    async fn stream(
        &self,
        extractor: &mut S::Connection,
        loader: &mut D::Connection,
        state: &mut PipelineState,
    ) -> Result<TransferResult, TransferError> {
        let mut result = TransferResult::default();
        let mut rows = extractor.extract().await?;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(TransferError::Cancelled),
                next = self.deadline("row fetch", rows.next()) => next,
            };

            let input = match next {
                Ok(None) => break,
                Ok(Some(Ok(input))) => input,
                Ok(Some(Err(e))) | Err(e) => {
                    self.observer.stream_truncated(&e);
                    result.stream_error = Some(e.to_string());
                    break;
                }
            };
            result.rows_read += 1;

            match self.transformer.transform(input) {
                Ok(output) => match self.deadline("insert", loader.load(&output)).await {
                    Ok(Ok(())) => result.rows_inserted += 1,
                    Ok(Err(e)) | Err(e) => {
                        result.rows_failed += 1;
                        self.observer.insert_failed(&output, &e);
                    }
                },
                Err(reason) => {
                    result.rows_skipped += 1;
                    self.observer.row_skipped(result.rows_read, &reason);
                }
            }
            self.transition(state, PipelineState::Streaming);
        }

        Ok(result)
    }

    async fn deadline<F: Future>(
        &self,
        operation: &str,
        fut: F,
    ) -> Result<F::Output, TransferError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| TransferError::Timeout {
                    operation: operation.to_string(),
                    limit,
                }),
            None => Ok(fut.await),
        }
    }

    fn transition(&self, state: &mut PipelineState, next: PipelineState) {
        debug_assert!(
            state.can_transition_to(next),
            "illegal pipeline transition {} -> {}",
            state,
            next
        );
        self.observer.state_changed(*state, next);
        *state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::RowStream;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    type Events = Arc<Mutex<Vec<String>>>;

    struct MockSource {
        rows: Vec<Result<i64, String>>,
        refuse: bool,
        bad_query: bool,
        fetch_delay: Option<Duration>,
        events: Events,
    }

    impl MockSource {
        fn new(rows: Vec<Result<i64, String>>, events: &Events) -> Self {
            Self {
                rows,
                refuse: false,
                bad_query: false,
                fetch_delay: None,
                events: events.clone(),
            }
        }
    }

    struct MockExtractor {
        rows: Vec<Result<i64, String>>,
        bad_query: bool,
        fetch_delay: Option<Duration>,
        events: Events,
    }

    impl Connector for MockSource {
        type Connection = MockExtractor;

        fn describe(&self) -> String {
            "mock@source".to_string()
        }

        async fn connect(&self) -> Result<MockExtractor, TransferError> {
            if self.refuse {
                return Err(TransferError::connection(Side::Source, self.describe(), "refused"));
            }
            self.events.lock().unwrap().push("source open".to_string());
            Ok(MockExtractor {
                rows: self.rows.clone(),
                bad_query: self.bad_query,
                fetch_delay: self.fetch_delay,
                events: self.events.clone(),
            })
        }
    }

    impl Extractor for MockExtractor {
        type Item = i64;

        async fn extract(&mut self) -> Result<RowStream<'_, i64>, TransferError> {
            if self.bad_query {
                return Err(TransferError::Query("table does not exist".to_string()));
            }
            let rows = self.rows.clone().into_iter().map(|r| r.map_err(TransferError::Stream));
            let rows = futures::stream::iter(rows);
            match self.fetch_delay {
                Some(delay) => Ok(rows
                    .then(move |row| async move {
                        tokio::time::sleep(delay).await;
                        row
                    })
                    .boxed()),
                None => Ok(rows.boxed()),
            }
        }

        async fn close(self) -> Result<(), TransferError> {
            self.events.lock().unwrap().push("source closed".to_string());
            Ok(())
        }
    }

    /// Rejects negative numbers, doubles the rest
    struct Doubler;

    impl Transformer for Doubler {
        type Input = i64;
        type Output = i64;
        type Error = String;

        fn transform(&self, input: i64) -> Result<i64, String> {
            if input < 0 {
                return Err(format!("negative input {}", input));
            }
            Ok(input * 2)
        }
    }

    struct MockTarget {
        refuse: bool,
        reject: Vec<i64>,
        insert_delay: Option<Duration>,
        cancel_after_insert: Option<CancellationToken>,
        stored: Arc<Mutex<Vec<i64>>>,
        events: Events,
    }

    impl MockTarget {
        fn new(events: &Events) -> Self {
            Self {
                refuse: false,
                reject: Vec::new(),
                insert_delay: None,
                cancel_after_insert: None,
                stored: Arc::new(Mutex::new(Vec::new())),
                events: events.clone(),
            }
        }
    }

    struct MockLoader {
        reject: Vec<i64>,
        insert_delay: Option<Duration>,
        cancel_after_insert: Option<CancellationToken>,
        stored: Arc<Mutex<Vec<i64>>>,
        events: Events,
    }

    impl Connector for MockTarget {
        type Connection = MockLoader;

        fn describe(&self) -> String {
            "mock@target".to_string()
        }

        async fn connect(&self) -> Result<MockLoader, TransferError> {
            if self.refuse {
                return Err(TransferError::connection(Side::Target, self.describe(), "refused"));
            }
            self.events.lock().unwrap().push("target open".to_string());
            Ok(MockLoader {
                reject: self.reject.clone(),
                insert_delay: self.insert_delay,
                cancel_after_insert: self.cancel_after_insert.clone(),
                stored: self.stored.clone(),
                events: self.events.clone(),
            })
        }
    }

    #[async_trait]
    impl Loader for MockLoader {
        type Item = i64;

        async fn load(&mut self, item: &i64) -> Result<(), TransferError> {
            if let Some(delay) = self.insert_delay {
                tokio::time::sleep(delay).await;
            }
            if self.reject.contains(item) {
                return Err(TransferError::Insert(format!("duplicate key {}", item)));
            }
            self.stored.lock().unwrap().push(*item);
            if let Some(token) = &self.cancel_after_insert {
                token.cancel();
            }
            Ok(())
        }

        async fn close(self) -> Result<(), TransferError> {
            self.events.lock().unwrap().push("target closed".to_string());
            Ok(())
        }
    }

    struct StateRecorder(Arc<Mutex<Vec<PipelineState>>>);

    impl TransferObserver for StateRecorder {
        fn state_changed(&self, _from: PipelineState, to: PipelineState) {
            let mut states = self.0.lock().unwrap();
            if states.last() != Some(&to) {
                states.push(to);
            }
        }
    }

    #[tokio::test]
    async fn test_pipeline_counts_every_outcome() {
        let events = Events::default();
        let source = MockSource::new(vec![Ok(1), Ok(-1), Ok(2), Ok(3)], &events);
        let mut target = MockTarget::new(&events);
        target.reject = vec![4];
        let stored = target.stored.clone();

        let result = Pipeline::new(source, Doubler, target).run().await.unwrap();

        assert_eq!(result.rows_read, 4);
        assert_eq!(result.rows_inserted, 2);
        assert_eq!(result.rows_skipped, 1);
        assert_eq!(result.rows_failed, 1);
        assert!(result.is_balanced());
        assert!(result.is_complete());
        assert_eq!(*stored.lock().unwrap(), vec![2, 6]);
    }

    #[tokio::test]
    async fn test_empty_source() {
        let events = Events::default();
        let source = MockSource::new(vec![], &events);
        let target = MockTarget::new(&events);

        let result = Pipeline::new(source, Doubler, target).run().await.unwrap();
        assert_eq!(result, TransferResult { elapsed: result.elapsed, ..Default::default() });
    }

    #[tokio::test]
    async fn test_state_sequence_on_success() {
        let events = Events::default();
        let states = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(
            MockSource::new(vec![Ok(1)], &events),
            Doubler,
            MockTarget::new(&events),
        )
        .with_observer(StateRecorder(states.clone()));

        pipeline.run().await.unwrap();

        use PipelineState::*;
        assert_eq!(
            *states.lock().unwrap(),
            vec![SourceConnecting, TargetConnecting, Streaming, Draining, Closed]
        );
    }

    #[tokio::test]
    async fn test_source_refused_never_opens_target() {
        let events = Events::default();
        let mut source = MockSource::new(vec![Ok(1)], &events);
        source.refuse = true;
        let states = Arc::new(Mutex::new(Vec::new()));

        let err = Pipeline::new(source, Doubler, MockTarget::new(&events))
            .with_observer(StateRecorder(states.clone()))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Connection { side: Side::Source, .. }));
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(states.lock().unwrap().last(), Some(&PipelineState::Failed));
    }

    #[tokio::test]
    async fn test_target_refused_releases_source() {
        let events = Events::default();
        let mut target = MockTarget::new(&events);
        target.refuse = true;

        let err = Pipeline::new(MockSource::new(vec![Ok(1)], &events), Doubler, target)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Connection { side: Side::Target, .. }));
        assert_eq!(*events.lock().unwrap(), vec!["source open", "source closed"]);
    }

    #[tokio::test]
    async fn test_query_failure_is_fatal_and_releases_both() {
        let events = Events::default();
        let mut source = MockSource::new(vec![Ok(1)], &events);
        source.bad_query = true;

        let err = Pipeline::new(source, Doubler, MockTarget::new(&events))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Query(_)));
        assert_eq!(
            *events.lock().unwrap(),
            vec!["source open", "target open", "source closed", "target closed"]
        );
    }

    #[tokio::test]
    async fn test_mid_stream_failure_truncates() {
        let events = Events::default();
        let source = MockSource::new(
            vec![Ok(1), Err("lost connection".to_string()), Ok(2)],
            &events,
        );
        let target = MockTarget::new(&events);
        let stored = target.stored.clone();

        let result = Pipeline::new(source, Doubler, target).run().await.unwrap();

        assert_eq!(result.rows_read, 1);
        assert_eq!(result.rows_inserted, 1);
        assert!(!result.is_complete());
        assert!(result.stream_error.unwrap().contains("lost connection"));
        assert_eq!(*stored.lock().unwrap(), vec![2]);
        assert!(events.lock().unwrap().contains(&"target closed".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_row() {
        let events = Events::default();
        let token = CancellationToken::new();
        token.cancel();

        let err = Pipeline::new(
            MockSource::new(vec![Ok(1), Ok(2)], &events),
            Doubler,
            MockTarget::new(&events),
        )
        .with_cancellation(token)
        .run()
        .await
        .unwrap_err();

        assert!(matches!(err, TransferError::Cancelled));
        let events = events.lock().unwrap();
        assert!(events.contains(&"source closed".to_string()));
        assert!(events.contains(&"target closed".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_mid_stream_releases_both() {
        let events = Events::default();
        let token = CancellationToken::new();
        let mut target = MockTarget::new(&events);
        target.cancel_after_insert = Some(token.clone());
        let stored = target.stored.clone();

        let err = Pipeline::new(
            MockSource::new(vec![Ok(1), Ok(2), Ok(3)], &events),
            Doubler,
            target,
        )
        .with_cancellation(token)
        .run()
        .await
        .unwrap_err();

        assert!(matches!(err, TransferError::Cancelled));
        assert_eq!(*stored.lock().unwrap(), vec![2]);
        assert_eq!(
            *events.lock().unwrap(),
            vec!["source open", "target open", "source closed", "target closed"]
        );
    }

    #[tokio::test]
    async fn test_slow_insert_counts_as_failed_row() {
        let events = Events::default();
        let mut target = MockTarget::new(&events);
        target.insert_delay = Some(Duration::from_millis(200));
        let stored = target.stored.clone();

        let result = Pipeline::new(
            MockSource::new(vec![Ok(1), Ok(2), Ok(3)], &events),
            Doubler,
            target,
        )
        .with_timeout(Duration::from_millis(20))
        .run()
        .await
        .unwrap();

        assert_eq!(result.rows_read, 3);
        assert_eq!(result.rows_failed, 3);
        assert_eq!(result.rows_inserted, 0);
        assert!(result.is_complete());
        assert!(stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slow_fetch_truncates_stream() {
        let events = Events::default();
        let mut source = MockSource::new(vec![Ok(1), Ok(2)], &events);
        source.fetch_delay = Some(Duration::from_millis(200));

        let result = Pipeline::new(source, Doubler, MockTarget::new(&events))
            .with_timeout(Duration::from_millis(20))
            .run()
            .await
            .unwrap();

        assert_eq!(result.rows_read, 0);
        assert_eq!(
            result.stream_error.as_deref(),
            Some("row fetch timed out after 20ms")
        );
        assert!(events.lock().unwrap().contains(&"source closed".to_string()));
    }

    #[tokio::test]
    async fn test_timeout_leaves_fast_rows_alone() {
        let events = Events::default();
        let target = MockTarget::new(&events);
        let stored = target.stored.clone();

        let result = Pipeline::new(MockSource::new(vec![Ok(1), Ok(2)], &events), Doubler, target)
            .with_timeout(Duration::from_secs(5))
            .run()
            .await
            .unwrap();

        assert_eq!(result.rows_inserted, 2);
        assert_eq!(*stored.lock().unwrap(), vec![2, 4]);
    }

    #[test]
    fn test_state_transitions() {
        use PipelineState::*;
        assert!(Init.can_transition_to(SourceConnecting));
        assert!(SourceConnecting.can_transition_to(Failed));
        assert!(TargetConnecting.can_transition_to(Failed));
        assert!(Streaming.can_transition_to(Streaming));
        assert!(!Streaming.can_transition_to(Failed));
        assert!(!Init.can_transition_to(Streaming));
        assert!(!Closed.can_transition_to(Init));
        assert!(!Failed.can_transition_to(Closed));
    }
}
