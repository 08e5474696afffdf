//! Image push
//!
//! Pushes a verified image to the registry the auth was issued for.

use crate::auth::RegistryAuth;
use crate::builder::BuildOutput;
use crate::engine::ImageEngine;
use crate::error::BuildResult;
use crate::progress::drain;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct ImagePusher {
    engine: Arc<dyn ImageEngine>,
    auth: RegistryAuth,
}

impl ImagePusher {
    pub fn new(engine: Arc<dyn ImageEngine>, auth: RegistryAuth) -> Self {
        Self { engine, auth }
    }

    /// Pushes `output`, writing progress to `out`.
    ///
    /// Errors reported inside the progress stream are written out but do not
    /// fail the push; transport failures and cancellation do.
    pub async fn push(
        &self,
        output: &BuildOutput,
        out: &mut (dyn Write + Send),
        cancel: &CancellationToken,
    ) -> BuildResult<()> {
        let tag = output.tag();
        tracing::info!("Pushing image: {}", tag);

        let stream = self.engine.push_image(tag, self.auth.credentials());
        drain(stream, out, cancel).await?;

        tracing::info!("Successfully pushed: {}", tag);
        Ok(())
    }
}
