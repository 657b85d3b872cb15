use std::{collections::HashMap, sync::Arc};

use axum::{Json, extract::State};
use mongodb::bson::{Bson, Document};

use crate::{
    database::{COMMUNITY_COLLECTION, HOUSING_COLLECTION, VOLUNTEER_COLLECTION, fetch_all},
    error::AppError,
    state::AppState,
};

pub const HOUSE_ID_FIELD: &str = "House ID";
pub const PROJECT_ID_FIELD: &str = "Project ID";
pub const LOCATION_FIELD: &str = "Location";

/// Sentinel location for community records whose project id matches nothing.
pub const UNKNOWN_LOCATION: &str = "Unknown";

pub async fn housing_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Document>>, AppError> {
    let housing = fetch_all(&state.db, HOUSING_COLLECTION).await?;

    Ok(Json(housing))
}

pub async fn volunteers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Document>>, AppError> {
    let volunteers = fetch_all(&state.db, VOLUNTEER_COLLECTION).await?;

    Ok(Json(volunteers))
}

/// Community impact records, each annotated with the location of the housing
/// project its `Project ID` points at.
///
/// The join runs in application memory: one pass over the housing collection
/// to build the id-to-location index, one pass over the community collection
/// to annotate. Housing documents are not part of the response.
pub async fn community_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Document>>, AppError> {
    let mut community = fetch_all(&state.db, COMMUNITY_COLLECTION).await?;
    let housing = fetch_all(&state.db, HOUSING_COLLECTION).await?;

    let index = location_index(&housing);
    annotate_locations(&mut community, &index);

    Ok(Json(community))
}

/// Join keys are compared by their text rendering so string and numeric ids
/// can still find each other after a lossy spreadsheet import.
fn join_key(id: &Bson) -> String {
    match id {
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn location_index(housing: &[Document]) -> HashMap<String, Bson> {
    let mut index = HashMap::new();

    for house in housing {
        let (Some(id), Some(location)) = (
            house.get(HOUSE_ID_FIELD),
            house.get(LOCATION_FIELD),
        ) else {
            continue;
        };

        // Duplicate House IDs resolve to whichever document the server
        // returned last; the data is assumed unique but never enforced.
        index.insert(join_key(id), location.clone());
    }

    index
}

fn annotate_locations(community: &mut [Document], index: &HashMap<String, Bson>) {
    for record in community.iter_mut() {
        let location = record
            .get(PROJECT_ID_FIELD)
            .map(join_key)
            .and_then(|key| index.get(&key))
            .cloned()
            .unwrap_or_else(|| Bson::String(UNKNOWN_LOCATION.to_string()));

        record.insert(LOCATION_FIELD, location);
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use super::*;

    fn annotated(housing: Vec<Document>, mut community: Vec<Document>) -> Vec<Document> {
        let index = location_index(&housing);
        annotate_locations(&mut community, &index);
        community
    }

    #[test]
    fn matched_project_gets_housing_location() {
        let community = annotated(
            vec![doc! { "House ID": "H1", "Location": "Downtown" }],
            vec![doc! { "Project ID": "H1", "Score": 5 }],
        );

        assert_eq!(
            community,
            vec![doc! { "Project ID": "H1", "Score": 5, "Location": "Downtown" }]
        );
    }

    #[test]
    fn unmatched_project_falls_back_to_unknown() {
        let community = annotated(
            vec![doc! { "House ID": "H1", "Location": "Downtown" }],
            vec![doc! { "Project ID": "H9", "Score": 1 }],
        );

        assert_eq!(community[0].get_str("Location").unwrap(), "Unknown");
    }

    #[test]
    fn missing_project_id_falls_back_to_unknown() {
        let community = annotated(
            vec![doc! { "House ID": "H1", "Location": "Downtown" }],
            vec![doc! { "Score": 3 }],
        );

        assert_eq!(community[0].get_str("Location").unwrap(), "Unknown");
    }

    #[test]
    fn empty_collections_produce_empty_response() {
        assert_eq!(annotated(vec![], vec![]), vec![]);
    }

    #[test]
    fn join_never_drops_or_duplicates_records() {
        let community = annotated(
            vec![doc! { "House ID": "H1", "Location": "Downtown" }],
            vec![
                doc! { "Project ID": "H1" },
                doc! { "Project ID": "H2" },
                doc! { "Volunteers": 12 },
            ],
        );

        assert_eq!(community.len(), 3);
        for record in &community {
            assert!(record.contains_key("Location"));
        }
    }

    #[test]
    fn duplicate_house_ids_resolve_to_one_of_the_candidates() {
        // Whichever housing document iterates last wins; the winner is not
        // part of the contract, only that exactly one candidate is chosen.
        let community = annotated(
            vec![
                doc! { "House ID": "H1", "Location": "Downtown" },
                doc! { "House ID": "H1", "Location": "Uptown" },
            ],
            vec![doc! { "Project ID": "H1" }],
        );

        let location = community[0].get_str("Location").unwrap();
        assert!(location == "Downtown" || location == "Uptown");
    }

    #[test]
    fn numeric_ids_participate_in_the_join() {
        let community = annotated(
            vec![doc! { "House ID": 7, "Location": "North" }],
            vec![doc! { "Project ID": 7 }],
        );

        assert_eq!(community[0].get_str("Location").unwrap(), "North");
    }

    #[test]
    fn housing_documents_missing_join_fields_are_skipped() {
        let community = annotated(
            vec![
                doc! { "Location": "Nowhere" },
                doc! { "House ID": "H2" },
                doc! { "House ID": "H1", "Location": "Downtown" },
            ],
            vec![doc! { "Project ID": "H2" }, doc! { "Project ID": "H1" }],
        );

        assert_eq!(community[0].get_str("Location").unwrap(), "Unknown");
        assert_eq!(community[1].get_str("Location").unwrap(), "Downtown");
    }

    #[test]
    fn existing_location_on_community_record_is_overwritten() {
        let community = annotated(
            vec![doc! { "House ID": "H1", "Location": "Downtown" }],
            vec![doc! { "Project ID": "H1", "Location": "Stale" }],
        );

        assert_eq!(community[0].get_str("Location").unwrap(), "Downtown");
        assert_eq!(
            community[0].iter().filter(|(key, _)| *key == "Location").count(),
            1
        );
    }

    #[test]
    fn non_string_locations_are_carried_through() {
        let community = annotated(
            vec![doc! { "House ID": "H1", "Location": 40104 }],
            vec![doc! { "Project ID": "H1" }],
        );

        assert_eq!(community[0].get_i32("Location").unwrap(), 40104);
    }

    #[test]
    fn response_serializes_to_the_wire_shape() {
        let community = annotated(
            vec![doc! { "House ID": "H1", "Location": "Downtown" }],
            vec![doc! { "Project ID": "H1", "Score": 5 }],
        );

        let json = serde_json::to_value(&community).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "Project ID": "H1", "Score": 5, "Location": "Downtown" }
            ])
        );
    }
}
