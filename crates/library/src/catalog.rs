use common::{song_key, RemoteSong};
use remote::{RemoteError, RemoteLibrary};
use tracing::{debug, warn};

use crate::filter::SongFilter;
use crate::reconcile::KeyedCollection;

#[derive(Clone, Debug, Default)]
pub struct RemoteLoad {
    pub included: Vec<RemoteSong>,
    pub filtered: Vec<RemoteSong>,
}

impl RemoteLoad {
    /// Keys every included song. Songs without a track number get `"0"`
    /// written into their record as a side effect.
    pub fn keyed(&mut self) -> KeyedCollection<RemoteSong> {
        self.included
            .iter_mut()
            .map(|song| (song_key(song), song.clone()))
            .collect()
    }
}

/// Lists the remote library once and splits it through `filter`.
///
/// Falls back to the uploaded-songs listing only when the server does not
/// support the full listing.
pub async fn load_remote<R: RemoteLibrary + ?Sized>(
    remote: &R,
    filter: &SongFilter,
) -> Result<RemoteLoad, RemoteError> {
    let songs = match remote.list_all_songs().await {
        Ok(songs) => songs,
        Err(err) if err.is_unsupported() => {
            warn!("Full listing unavailable ({}); using uploaded songs", err);
            remote.list_uploaded_songs().await?
        }
        Err(err) => return Err(err),
    };
    let (included, filtered) = filter.partition(songs);
    debug!(
        "Remote listing: {} songs kept, {} filtered",
        included.len(),
        filtered.len()
    );
    Ok(RemoteLoad { included, filtered })
}
