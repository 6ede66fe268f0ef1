use std::future::Future;
use std::pin::Pin;

use driveup_protocol::UploadOutcome;
use driveup_relay::{RelayClient, RelayError, UploadRequest};
use driveup_transfer::SelectedFile;
use tokio_util::sync::CancellationToken;

/// Boxed future returned by [`Uploader::upload`].
pub type UploadFuture<'a> =
    Pin<Box<dyn Future<Output = Result<UploadOutcome, RelayError>> + Send + 'a>>;

/// Performs one upload. Implemented by [`RelayClient`]; mocked in tests.
pub trait Uploader: Send + Sync {
    fn upload(
        &self,
        file: SelectedFile,
        new_name: String,
        cancel: CancellationToken,
    ) -> UploadFuture<'_>;
}

impl Uploader for RelayClient {
    fn upload(
        &self,
        file: SelectedFile,
        new_name: String,
        cancel: CancellationToken,
    ) -> UploadFuture<'_> {
        Box::pin(RelayClient::upload(
            self,
            UploadRequest::new(file, new_name).with_cancel(cancel),
        ))
    }
}
