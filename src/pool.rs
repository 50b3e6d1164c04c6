//! Fire a batch of requests and collect the results as they complete.
//!
//! Each submitted [`Request`] runs on its own blocking worker of a private
//! tokio runtime. Nothing is shared between in-flight requests except a
//! [`DnsCache`](crate::dns::DnsCache) the caller chose to share.
//!
//! The pool blocks the calling thread while collecting, so it must not be
//! driven from inside an async context.

use crate::base::neterror::NetError;
use crate::http::response::Response;
use crate::urlrequest::request::Request;
use http::Method;
use std::fmt;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::task::{JoinError, JoinSet};

pub type PoolResult = Result<Response, NetError>;

pub struct RequestPool {
    // Dropped before the runtime that runs them.
    tasks: JoinSet<PoolResult>,
    runtime: Runtime,
}

impl RequestPool {
    /// Create a pool with its own multi-thread runtime.
    pub fn new() -> Result<Self, NetError> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("latticenet-pool")
            .build()
            .map_err(|e| NetError::TaskFailed(e.to_string()))?;
        Ok(Self {
            tasks: JoinSet::new(),
            runtime,
        })
    }

    /// Run `request` as a `method` request in the background.
    pub fn submit(&mut self, method: Method, mut request: Request) {
        request.set_method(method);
        tracing::debug!(method = %request.method(), url = %request.url(), "request submitted");
        self.tasks
            .spawn_blocking_on(move || request.exec(), self.runtime.handle());
    }

    pub fn get(&mut self, request: Request) {
        self.submit(Method::GET, request);
    }

    pub fn head(&mut self, request: Request) {
        self.submit(Method::HEAD, request);
    }

    pub fn post(&mut self, request: Request) {
        self.submit(Method::POST, request);
    }

    pub fn put(&mut self, request: Request) {
        self.submit(Method::PUT, request);
    }

    pub fn patch(&mut self, request: Request) {
        self.submit(Method::PATCH, request);
    }

    pub fn delete(&mut self, request: Request) {
        self.submit(Method::DELETE, request);
    }

    pub fn options(&mut self, request: Request) {
        self.submit(Method::OPTIONS, request);
    }

    pub fn trace(&mut self, request: Request) {
        self.submit(Method::TRACE, request);
    }

    /// Requests submitted but not yet collected.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every pending request, in completion order.
    pub fn perform(&mut self) -> Vec<PoolResult> {
        let Self { tasks, runtime } = self;
        runtime.block_on(async {
            let mut results = Vec::with_capacity(tasks.len());
            while let Some(joined) = tasks.join_next().await {
                results.push(flatten(joined));
            }
            results
        })
    }

    /// Take the next completed request, waiting at most `timeout`.
    ///
    /// `None` when nothing completed in time or nothing is pending.
    pub fn poll_next(&mut self, timeout: Duration) -> Option<PoolResult> {
        let Self { tasks, runtime } = self;
        if tasks.is_empty() {
            return None;
        }
        runtime.block_on(async {
            match tokio::time::timeout(timeout, tasks.join_next()).await {
                Ok(joined) => joined.map(flatten),
                Err(_) => {
                    tracing::trace!(timeout_ms = timeout.as_millis() as u64, "no request completed in time");
                    None
                }
            }
        })
    }
}

fn flatten(joined: Result<PoolResult, JoinError>) -> PoolResult {
    joined.map_err(|e| NetError::TaskFailed(e.to_string()))?
}

impl fmt::Debug for RequestPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPool")
            .field("pending", &self.tasks.len())
            .finish()
    }
}
