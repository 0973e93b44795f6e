//! Journey template repository.
//!
//! Journeys are immutable after creation: there is no update operation,
//! only create, read, list, and delete.

use std::sync::Arc;
use tracing::{info, warn};
use waymark_core::{CreateJourneyRequest, Error, Journey, Result};

use crate::blob::{BlobStore, Collection};

/// CRUD over journey records in the journeys collection.
#[derive(Clone)]
pub struct JourneyStore {
    blobs: Arc<dyn BlobStore>,
}

impl JourneyStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Create and persist a journey with a fresh id.
    pub async fn create(&self, req: CreateJourneyRequest) -> Result<Journey> {
        let journey = Journey::new(req.name, req.description, req.initial_message);
        self.put_record(&journey).await?;
        info!(
            subsystem = "store",
            component = "journeys",
            op = "create",
            journey_id = %journey.id,
            "journey created"
        );
        Ok(journey)
    }

    /// Load a journey by id.
    pub async fn get(&self, id: &str) -> Result<Journey> {
        let data = match self.blobs.get(Collection::Journeys, id).await {
            Ok(data) => data,
            Err(Error::NotFound(_)) => return Err(Error::JourneyNotFound(id.to_string())),
            Err(e) => return Err(e),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    /// List all journeys as full records. Malformed records are skipped
    /// so one corrupt file cannot take down the listing.
    pub async fn list(&self) -> Result<Vec<Journey>> {
        let keys = self.blobs.list(Collection::Journeys).await?;
        let mut journeys = Vec::with_capacity(keys.len());
        for key in keys {
            let data = match self.blobs.get(Collection::Journeys, &key).await {
                Ok(data) => data,
                // Removed between list and read
                Err(Error::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            match serde_json::from_slice::<Journey>(&data) {
                Ok(journey) => journeys.push(journey),
                Err(e) => {
                    warn!(
                        subsystem = "store",
                        component = "journeys",
                        journey_id = %key,
                        error = %e,
                        "skipping malformed journey record"
                    );
                }
            }
        }
        Ok(journeys)
    }

    /// Delete a journey record. Threads referencing it are untouched;
    /// creating a new thread against it afterwards fails NotFound.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.blobs.delete(Collection::Journeys, id).await?;
        if removed {
            info!(
                subsystem = "store",
                component = "journeys",
                op = "delete",
                journey_id = %id,
                "journey deleted"
            );
        }
        Ok(removed)
    }

    async fn put_record(&self, journey: &Journey) -> Result<()> {
        let data = serde_json::to_vec_pretty(journey)?;
        self.blobs.put(Collection::Journeys, &journey.id, &data).await
    }
}
