//! # MongoDB
//!
//! Document store holding the three dashboard collections.
//!
//! ## Requirements
//!
//! - Schema-less collections, populated by the external ingestion job
//! - Read-only from this process, whole-collection fetches only
//! - Collections in the hundreds of documents, no pagination needed
//!
//! ## Implementation
//!
//! - One client created at startup and shared through [`AppState`]
//! - The driver pools connections internally and connects lazily
//! - Every fetch projects out `_id`; the frontend never sees object ids
//! - No sort is applied, documents come back in the server's natural order
//!
//! [`AppState`]: crate::state::AppState
use futures::TryStreamExt;
use mongodb::{
    Client, Database,
    bson::{Document, doc},
    options::ClientOptions,
};

pub const DATABASE_NAME: &str = "community_data";

pub const HOUSING_COLLECTION: &str = "housing_projects";
pub const VOLUNTEER_COLLECTION: &str = "volunteer_engagement";
pub const COMMUNITY_COLLECTION: &str = "community_impact";

pub async fn init_mongo(uri: &str) -> Database {
    let client_options = ClientOptions::parse(uri).await.unwrap();
    let client = Client::with_options(client_options).unwrap();

    client.database(DATABASE_NAME)
}

pub async fn fetch_all(
    db: &Database,
    collection: &str,
) -> Result<Vec<Document>, mongodb::error::Error> {
    db.collection::<Document>(collection)
        .find(doc! {})
        .projection(doc! { "_id": 0 })
        .await?
        .try_collect()
        .await
}
