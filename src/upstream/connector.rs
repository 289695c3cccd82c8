//! Backend connector with a global cap on reusable connections.
//!
//! # Responsibilities
//! - Open TCP connections to preview services through [`HttpConnector`]
//! - Bound how many connections the pool may keep across every host
//!
//! # Design Decisions
//! - A connection that got a permit is poolable and holds the permit until
//!   it closes, so idle connections across all hosts never exceed the cap
//! - Over the cap, requests are not queued: the connection is marked
//!   poisoned and closed after its one request

use std::error::Error;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Uri;
use futures_util::future::{BoxFuture, FutureExt};
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper_util::client::legacy::connect::{Connected, Connection, HttpConnector};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tower::Service;

use crate::upstream::dns::ServiceResolver;

type BoxError = Box<dyn Error + Send + Sync>;

/// [`HttpConnector`] wrapper that hands out pool slots.
#[derive(Clone)]
pub struct BoundedConnector {
    inner: HttpConnector<ServiceResolver>,
    slots: Arc<Semaphore>,
}

impl BoundedConnector {
    pub fn new(inner: HttpConnector<ServiceResolver>, max_idle_connections: usize) -> Self {
        Self {
            inner,
            slots: Arc::new(Semaphore::new(max_idle_connections)),
        }
    }

    /// Pool slots not held by any open connection.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

impl Service<Uri> for BoundedConnector {
    type Response = BackendStream;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let slots = Arc::clone(&self.slots);
        let connecting = self.inner.call(uri);

        async move {
            let io = connecting.await?;
            let slot = slots.try_acquire_owned().ok();
            if slot.is_none() {
                tracing::debug!("Backend pool full, connection will not be reused");
            }
            Ok(BackendStream { io, slot })
        }
        .boxed()
    }
}

/// A backend TCP stream and the pool slot it holds, if any.
pub struct BackendStream {
    io: TokioIo<TcpStream>,
    slot: Option<OwnedSemaphorePermit>,
}

impl BackendStream {
    /// Whether the pool may keep this connection after its request.
    pub fn is_poolable(&self) -> bool {
        self.slot.is_some()
    }
}

impl Connection for BackendStream {
    fn connected(&self) -> Connected {
        let connected = self.io.connected();
        if self.slot.is_none() {
            connected.poison();
        }
        connected
    }
}

impl Read for BackendStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_read(cx, buf)
    }
}

impl Write for BackendStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.io).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_shutdown(cx)
    }

    fn is_write_vectored(&self) -> bool {
        self.io.is_write_vectored()
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.io).poll_write_vectored(cx, bufs)
    }
}
