//! Pass-through response body that records what it forwards.

use axum::body::Body;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::task::{Context, Poll};

use super::finalizer::Finalizer;
use crate::error::PanicFault;
use crate::recorder::ResponseRecorder;

/// Wraps the handler's response body.
///
/// Every frame is forwarded unchanged the moment the inner body yields it;
/// data frames are also copied into the recorder. The record is finalized
/// once: at end of stream, on a stream error, on a panic inside the stream,
/// or when the body is dropped early (client gone).
pub(crate) struct RecordingBody {
    inner: Body,
    recorder: ResponseRecorder,
    finalizer: Option<Finalizer>,
}

impl RecordingBody {
    pub(crate) fn new(inner: Body, recorder: ResponseRecorder, finalizer: Finalizer) -> Self {
        Self {
            inner,
            recorder,
            finalizer: Some(finalizer),
        }
    }

    fn finish(&mut self) {
        if let Some(finalizer) = self.finalizer.take() {
            let elapsed = finalizer.elapsed();
            finalizer.complete(&self.recorder, elapsed);
        }
    }
}

impl HttpBody for RecordingBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;

        // The inner body is not polled again once finished.
        if this.finalizer.is_none() {
            return Poll::Ready(None);
        }

        let polled = catch_unwind(AssertUnwindSafe(|| Pin::new(&mut this.inner).poll_frame(cx)));

        match polled {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(Some(Ok(frame)))) => {
                if let Some(data) = frame.data_ref() {
                    this.recorder.write(data);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Ok(Poll::Ready(Some(Err(e)))) => {
                tracing::warn!(error = %e, "Response body stream failed while recording");
                this.finish();
                Poll::Ready(Some(Err(e)))
            }
            Ok(Poll::Ready(None)) => {
                this.finish();
                Poll::Ready(None)
            }
            Err(payload) => {
                // Status and headers are already sent, so the stream just ends.
                PanicFault::from_payload(payload).report();
                this.finish();
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.finalizer.is_none() || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for RecordingBody {
    fn drop(&mut self) {
        self.finish();
    }
}
