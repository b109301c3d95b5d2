use std::{
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use futures::Stream;
use serde_json::Value;
use shared::protocol::{Operation, Query};
use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::{connector::ExampleConnector, error::ConnectorError};

/// A bound query: operation plus variables, runnable once or as a live feed.
pub struct QueryRef<O: Query> {
    connector: ExampleConnector,
    variables: O::Variables,
}

impl<O: Query> QueryRef<O> {
    pub(crate) fn new(connector: ExampleConnector, variables: O::Variables) -> Self {
        Self {
            connector,
            variables,
        }
    }

    pub fn variables(&self) -> &O::Variables {
        &self.variables
    }

    pub async fn execute(&self) -> Result<O::Data, ConnectorError> {
        self.connector.execute::<O>(&self.variables).await
    }

    /// Re-runs the query every `period` and yields a result whenever the
    /// returned data differs from the last one seen. The first successful
    /// result is always yielded. Dropping the subscription stops polling.
    pub fn subscribe(self, period: Duration) -> Result<QuerySubscription<O::Data>, ConnectorError>
    where
        O: 'static,
        O::Data: 'static,
    {
        let variables =
            serde_json::to_value(&self.variables).map_err(|e| ConnectorError::Decode {
                operation: O::NAME.to_string(),
                message: e.to_string(),
            })?;
        let (tx, rx) = mpsc::channel(8);
        let connector = self.connector;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Value> = None;

            loop {
                ticker.tick().await;
                let item = match connector
                    .execute_raw(O::NAME, O::KIND, variables.clone())
                    .await
                {
                    Ok(data) if last.as_ref() == Some(&data) => continue,
                    Ok(data) => {
                        let decoded = serde_json::from_value::<O::Data>(data.clone()).map_err(
                            |e| ConnectorError::Decode {
                                operation: O::NAME.to_string(),
                                message: e.to_string(),
                            },
                        );
                        last = Some(data);
                        debug!(operation = O::NAME, "subscription observed new data");
                        decoded
                    }
                    Err(error) => {
                        warn!(operation = O::NAME, %error, "subscription poll failed");
                        Err(error)
                    }
                };
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        Ok(QuerySubscription {
            inner: ReceiverStream::new(rx),
            task,
        })
    }
}

pub struct QuerySubscription<T> {
    inner: ReceiverStream<Result<T, ConnectorError>>,
    pub(crate) task: JoinHandle<()>,
}

impl<T> Stream for QuerySubscription<T> {
    type Item = Result<T, ConnectorError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<T> Drop for QuerySubscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
