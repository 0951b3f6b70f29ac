pub mod publisher;
pub mod sync;

pub use publisher::{PublishedFolder, Publisher};
pub use sync::{AwsCliSync, LocalMirrorSync, RemoteSync};

impl<T: RemoteSync + ?Sized> RemoteSync for &T {
    fn sync(
        &self,
        local: &std::path::Path,
        remote: &str,
        exclude: &[String],
        quiet_errors: bool,
    ) -> crate::error::Result<()> {
        (**self).sync(local, remote, exclude, quiet_errors)
    }
}
