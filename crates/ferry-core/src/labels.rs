//! Label synchronization.

use crate::error::Result;
use crate::gateway::RepoGateway;

use std::collections::HashSet;
use tracing::{debug, info};

/// Make the destination's label set a superset of the source's.
///
/// Labels are matched by name only; a pre-existing destination label keeps
/// its own color even when the source disagrees. Returns the number of
/// labels created.
pub async fn sync_labels(source: &dyn RepoGateway, dest: &dyn RepoGateway) -> Result<usize> {
    let existing: HashSet<String> = dest
        .list_labels()
        .await?
        .into_iter()
        .map(|label| label.name)
        .collect();

    let mut created = 0;
    for label in source.list_labels().await? {
        if existing.contains(&label.name) {
            debug!("label {} already exists in destination", label.name);
            continue;
        }
        dest.create_label(&label).await?;
        info!("created label {} ({})", label.name, label.color);
        created += 1;
    }

    Ok(created)
}
