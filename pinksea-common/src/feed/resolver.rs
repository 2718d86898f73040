use crate::model::author::{Did, Handle};
use std::error::Error;

/// Turns an author's DID into their current handle.
///
/// `Ok(None)` means the DID resolved but carries no valid handle.
pub trait HandleResolver {
    type Error: Error + Send + Sync + 'static;

    fn resolve_handle(
        &self,
        did: &Did,
    ) -> impl Future<Output = Result<Option<Handle>, Self::Error>> + Send;
}
