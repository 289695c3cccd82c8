//! Request body wrapper that reports when the body has been fully sent.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use tokio::sync::Notify;

/// Notifies `sent` once the inner body reaches its end.
///
/// Hyper may check [`HttpBody::is_end_stream`] instead of polling a final
/// frame, so both paths notify. Repeated notifications collapse into one
/// stored permit.
pub struct NotifyOnEnd {
    inner: Body,
    sent: Arc<Notify>,
}

impl NotifyOnEnd {
    pub fn new(inner: Body, sent: Arc<Notify>) -> Self {
        Self { inner, sent }
    }
}

impl HttpBody for NotifyOnEnd {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let frame = Pin::new(&mut self.inner).poll_frame(cx);
        if matches!(frame, Poll::Ready(None)) {
            self.sent.notify_one();
        }
        frame
    }

    fn is_end_stream(&self) -> bool {
        let end = self.inner.is_end_stream();
        if end {
            self.sent.notify_one();
        }
        end
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
