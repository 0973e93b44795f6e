//! Orphaned media sweep.
//!
//! A crash between a media release and the record persist can strand
//! blobs that no message references. The sweep is the out-of-band
//! recovery for that window: list the media collection, collect every
//! key referenced by any thread record, delete the rest.

use std::collections::HashSet;
use tracing::{debug, info};
use waymark_core::{Error, Result, SweepReport, Thread};

use crate::blob::Collection;
use crate::threads::ThreadStore;

/// Delete media blobs referenced by no thread record.
///
/// Conservative on unknowns: an unreadable thread record aborts the
/// sweep before anything is deleted. Intended to run while mutations
/// are quiesced.
pub async fn sweep_orphaned_media(store: &ThreadStore) -> Result<SweepReport> {
    let blobs = store.blobs();
    let media_keys = blobs.list(Collection::Media).await?;
    let referenced = referenced_media(store).await?;

    let mut report = SweepReport {
        scanned: media_keys.len(),
        referenced: 0,
        removed: 0,
    };
    for key in media_keys {
        if referenced.contains(&key) {
            report.referenced += 1;
        } else if blobs.delete(Collection::Media, &key).await? {
            debug!(
                subsystem = "store",
                component = "sweep",
                media_key = %key,
                "removed orphaned blob"
            );
            report.removed += 1;
        }
    }

    info!(
        subsystem = "store",
        component = "sweep",
        op = "sweep",
        scanned = report.scanned,
        referenced = report.referenced,
        removed = report.removed,
        "media sweep complete"
    );
    Ok(report)
}

/// Media keys referenced by any message of any thread record. Fails on
/// a malformed record: with references unknown, nothing may be deleted.
async fn referenced_media(store: &ThreadStore) -> Result<HashSet<String>> {
    let blobs = store.blobs();
    let keys = blobs.list(Collection::Threads).await?;
    let mut referenced = HashSet::new();
    for key in keys {
        let data = match blobs.get(Collection::Threads, &key).await {
            Ok(data) => data,
            Err(Error::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        let thread: Thread = serde_json::from_slice(&data)
            .map_err(|e| Error::Serialization(format!("thread record {}: {}", key, e)))?;
        referenced.extend(thread.media_keys());
    }
    Ok(referenced)
}
