use crate::engine::{Progress, ProgressStream};
use crate::error::{BuildError, BuildResult};
use futures_util::StreamExt;
use std::io::{self, Write};
use tokio_util::sync::CancellationToken;

/// Writes engine progress to the output sink as it arrives.
///
/// Errors embedded in the stream are written like any other message and
/// logged; they do not fail the build or push.
pub fn write_progress(out: &mut dyn Write, progress: &Progress) -> io::Result<()> {
    if let Some(stream) = &progress.stream {
        out.write_all(stream.as_bytes())?;
    }

    if let Some(status) = &progress.status {
        match &progress.progress {
            Some(bar) if !bar.is_empty() => writeln!(out, "{} {}", status, bar)?,
            _ => writeln!(out, "{}", status)?,
        }
    }

    if let Some(error) = &progress.error {
        tracing::warn!("Engine reported an error in its progress stream: {}", error);
        writeln!(out, "{}", error)?;
    }

    out.flush()
}

/// Forwards every message of `stream` to `out` until the engine closes it.
///
/// Returns `Cancelled` as soon as `cancel` fires; the stream is dropped,
/// which closes the engine connection.
pub(crate) async fn drain(
    mut stream: ProgressStream<'_>,
    out: &mut (dyn Write + Send),
    cancel: &CancellationToken,
) -> BuildResult<()> {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BuildError::Cancelled),
            next = stream.next() => next,
        };

        match next {
            Some(progress) => write_progress(out, &progress?)?,
            None => return Ok(()),
        }
    }
}
