// SPDX-License-Identifier: MIT

//! MongoDB client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts)
//! - Plans (itineraries with embedded stops/cities)
//! - Places and Cities (enrichment caches keyed by external place id)
//! - Bookmarks (user/plan join collection)
//! - Raw provider payloads (schema-versioned cache)

use crate::db::collections;
use crate::error::{AppError, Result};
use crate::geo::BoundingBox;
use crate::models::{
    Bookmark, CachedPlacePayload, Category, City, Place, Plan, PlanCity, PlanSummary, User,
};
use bson::{doc, oid::ObjectId, Document};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::options::{IndexOptions, ReturnDocument, UpdateOneModel, WriteModel};
use mongodb::{Collection, IndexModel, Namespace};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// MongoDB database client.
#[derive(Clone)]
pub struct Db {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Mongo(DbInner),
    /// Offline: every operation errors.
    Offline,
    /// Hash-map-backed enrichment cache collections; everything else
    /// behaves like `Offline`.
    Memory(Arc<Mutex<MemoryStore>>),
}

#[derive(Clone)]
struct DbInner {
    client: mongodb::Client,
    db: mongodb::Database,
}

#[derive(Default)]
struct MemoryStore {
    places: HashMap<String, Place>,
    cities: HashMap<String, City>,
    payloads: HashMap<String, (i32, String)>,
}

fn lock(store: &Arc<Mutex<MemoryStore>>) -> Result<MutexGuard<'_, MemoryStore>> {
    store
        .lock()
        .map_err(|_| AppError::Database("Memory store lock poisoned".to_string()))
}

/// Parse a path parameter into an object id.
///
/// A malformed id can never match a stored document, so it maps to 404
/// rather than 400.
pub fn parse_object_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw)
        .map_err(|_| AppError::NotFound(format!("Item not found with the id: {}", raw)))
}

impl Db {
    /// Connect to MongoDB and select the application database.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let client = mongodb::Client::with_uri_str(uri)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to MongoDB: {}", e)))?;
        let db = client.database(db_name);

        tracing::info!(db = db_name, "Connected to MongoDB");

        Ok(Self {
            backend: Backend::Mongo(DbInner { client, db }),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    /// Create an in-memory client for testing the enrichment cache
    /// protocol. Place, city and raw-payload operations work against
    /// process-local maps; everything else errors like [`Db::new_mock`].
    pub fn new_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::default()),
        }
    }

    fn get(&self) -> Result<&DbInner> {
        match &self.backend {
            Backend::Mongo(inner) => Ok(inner),
            _ => Err(AppError::Database(
                "Database not connected (offline mode)".to_string(),
            )),
        }
    }

    fn memory(&self) -> Option<&Arc<Mutex<MemoryStore>>> {
        match &self.backend {
            Backend::Memory(store) => Some(store),
            _ => None,
        }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Result<Collection<T>> {
        Ok(self.get()?.db.collection::<T>(name))
    }

    fn namespace(&self, coll: &str) -> Result<Namespace> {
        Ok(Namespace::new(self.get()?.db.name(), coll))
    }

    /// Create the unique and geospatial indexes the schema relies on.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.collection::<User>(collections::USERS)?
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        self.collection::<Place>(collections::PLACES)?
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "place_id": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.collection::<Place>(collections::PLACES)?
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "location": "2dsphere" })
                    .build(),
            )
            .await?;

        self.collection::<Plan>(collections::PLANS)?
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "start_location": "2dsphere" })
                    .build(),
            )
            .await?;

        self.collection::<City>(collections::CITIES)?
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "place_id": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        self.collection::<Bookmark>(collections::BOOKMARKS)?
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "plan_id": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        self.collection::<Category>(collections::CATEGORIES)?
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        self.collection::<CachedPlacePayload>(collections::PLACE_PAYLOADS)?
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "place_id": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        tracing::info!("Indexes ensured");
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn insert_user(&self, user: &User) -> Result<ObjectId> {
        let result = self
            .collection::<User>(collections::USERS)?
            .insert_one(user)
            .await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Database("Inserted user id is not an ObjectId".to_string()))
    }

    /// Look up a user by email (stored lowercase).
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .collection::<User>(collections::USERS)?
            .find_one(doc! { "email": email })
            .await?)
    }

    pub async fn find_user(&self, user_id: ObjectId) -> Result<Option<User>> {
        Ok(self
            .collection::<User>(collections::USERS)?
            .find_one(doc! { "_id": user_id })
            .await?)
    }

    // ─── Plan Operations ─────────────────────────────────────────

    pub async fn insert_plan(&self, plan: &Plan) -> Result<Plan> {
        let result = self
            .collection::<Plan>(collections::PLANS)?
            .insert_one(plan)
            .await?;
        let mut created = plan.clone();
        created.id = result.inserted_id.as_object_id();
        Ok(created)
    }

    pub async fn find_plan(&self, plan_id: ObjectId) -> Result<Option<Plan>> {
        Ok(self
            .collection::<Plan>(collections::PLANS)?
            .find_one(doc! { "_id": plan_id })
            .await?)
    }

    pub async fn find_plan_owned(
        &self,
        plan_id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Option<Plan>> {
        Ok(self
            .collection::<Plan>(collections::PLANS)?
            .find_one(doc! { "_id": plan_id, "user_id": user_id })
            .await?)
    }

    /// Apply a `$set` update to a plan owned by `user_id`, returning the
    /// updated document.
    pub async fn update_plan_owned(
        &self,
        plan_id: ObjectId,
        user_id: ObjectId,
        mut fields: Document,
    ) -> Result<Option<Plan>> {
        fields.insert("updated_at", Utc::now().to_rfc3339());
        Ok(self
            .collection::<Plan>(collections::PLANS)?
            .find_one_and_update(
                doc! { "_id": plan_id, "user_id": user_id },
                doc! { "$set": fields },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn delete_plan_owned(&self, plan_id: ObjectId, user_id: ObjectId) -> Result<bool> {
        let result = self
            .collection::<Plan>(collections::PLANS)?
            .delete_one(doc! { "_id": plan_id, "user_id": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    /// List plan summaries matching `filter` with skip/limit pagination.
    pub async fn list_plan_summaries(
        &self,
        filter: Document,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<PlanSummary>> {
        let cursor = self
            .collection::<PlanSummary>(collections::PLANS)?
            .find(filter)
            .projection(summary_projection())
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count_plans(&self, filter: Document) -> Result<u64> {
        Ok(self
            .collection::<Plan>(collections::PLANS)?
            .count_documents(filter)
            .await?)
    }

    /// Plans whose start location falls within the bounding box.
    pub async fn plan_summaries_within(
        &self,
        bbox: &BoundingBox,
        limit: i64,
    ) -> Result<Vec<PlanSummary>> {
        let filter = doc! {
            "start_location": {
                "$geoWithin": { "$geometry": bbox.to_polygon() }
            }
        };
        let cursor = self
            .collection::<PlanSummary>(collections::PLANS)?
            .find(filter)
            .projection(summary_projection())
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Persist route enrichment results onto a plan.
    pub async fn set_plan_route(
        &self,
        plan_id: ObjectId,
        polyline: &str,
        distance: f64,
        duration: f64,
    ) -> Result<()> {
        self.collection::<Plan>(collections::PLANS)?
            .update_one(
                doc! { "_id": plan_id },
                doc! { "$set": {
                    "polyline": polyline,
                    "distance": distance,
                    "duration": duration,
                    "updated_at": Utc::now().to_rfc3339(),
                } },
            )
            .await?;
        Ok(())
    }

    // ─── Place Operations ────────────────────────────────────────

    pub async fn find_place(&self, place_id: &str) -> Result<Option<Place>> {
        if let Some(store) = self.memory() {
            return Ok(lock(store)?.places.get(place_id).cloned());
        }
        Ok(self
            .collection::<Place>(collections::PLACES)?
            .find_one(doc! { "place_id": place_id })
            .await?)
    }

    /// Batch-fetch places by external id. Result order is unspecified.
    pub async fn find_places_by_ids(&self, place_ids: &[String]) -> Result<Vec<Place>> {
        if place_ids.is_empty() {
            return Ok(vec![]);
        }
        let cursor = self
            .collection::<Place>(collections::PLACES)?
            .find(doc! { "place_id": { "$in": place_ids } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Insert freshly created raw places as one bulk operation.
    pub async fn insert_places(&self, places: &[Place]) -> Result<()> {
        if places.is_empty() {
            return Ok(());
        }
        let ns = self.namespace(collections::PLACES)?;
        let models = places
            .iter()
            .map(|place| {
                let document = bson::to_document(place)
                    .map_err(|e| AppError::Database(format!("Failed to encode place: {}", e)))?;
                Ok(WriteModel::InsertOne(
                    mongodb::options::InsertOneModel::builder()
                        .namespace(ns.clone())
                        .document(document)
                        .build(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        self.get()?.client.bulk_write(models).await?;
        Ok(())
    }

    /// Upsert an enriched place keyed by its external id.
    pub async fn upsert_place(&self, place: &Place) -> Result<()> {
        if let Some(store) = self.memory() {
            lock(store)?
                .places
                .insert(place.place_id.clone(), place.clone());
            return Ok(());
        }
        let mut fields = bson::to_document(place)
            .map_err(|e| AppError::Database(format!("Failed to encode place: {}", e)))?;
        // Keyed by place_id; _id and created_at belong to the original insert.
        fields.remove("_id");
        let created_at = fields.remove("created_at");
        self.collection::<Place>(collections::PLACES)?
            .update_one(
                doc! { "place_id": &place.place_id },
                doc! {
                    "$set": fields,
                    "$setOnInsert": { "created_at": created_at.unwrap_or(bson::Bson::Null) },
                },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    /// Places within the bounding box, capped at `limit`.
    pub async fn places_within(&self, bbox: &BoundingBox, limit: i64) -> Result<Vec<Place>> {
        let filter = doc! {
            "location": {
                "$geoWithin": { "$geometry": bbox.to_polygon() }
            }
        };
        let cursor = self
            .collection::<Place>(collections::PLACES)?
            .find(filter)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    // ─── City Operations ─────────────────────────────────────────

    pub async fn find_city(&self, place_id: &str) -> Result<Option<City>> {
        if let Some(store) = self.memory() {
            return Ok(lock(store)?.cities.get(place_id).cloned());
        }
        Ok(self
            .collection::<City>(collections::CITIES)?
            .find_one(doc! { "place_id": place_id })
            .await?)
    }

    /// Batch-fetch cities by external id. Result order is unspecified.
    pub async fn find_cities_by_ids(&self, place_ids: &[String]) -> Result<Vec<City>> {
        if place_ids.is_empty() {
            return Ok(vec![]);
        }
        let cursor = self
            .collection::<City>(collections::CITIES)?
            .find(doc! { "place_id": { "$in": place_ids } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Upsert an enriched city keyed by its external id.
    pub async fn upsert_city(&self, city: &City) -> Result<()> {
        if let Some(store) = self.memory() {
            lock(store)?.cities.insert(city.place_id.clone(), city.clone());
            return Ok(());
        }
        let mut fields = bson::to_document(city)
            .map_err(|e| AppError::Database(format!("Failed to encode city: {}", e)))?;
        fields.remove("_id");
        let created_at = fields.remove("created_at");
        // The plans counter is owned by plan creation, not enrichment.
        fields.remove("plans");
        self.collection::<City>(collections::CITIES)?
            .update_one(
                doc! { "place_id": &city.place_id },
                doc! {
                    "$set": fields,
                    "$setOnInsert": {
                        "created_at": created_at.unwrap_or(bson::Bson::Null),
                        "plans": 0,
                    },
                },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    /// Register a new plan's city references: upsert each referenced city
    /// and bump its plans counter, as a single bulk operation.
    pub async fn register_plan_cities(&self, cities: &[PlanCity]) -> Result<()> {
        if cities.is_empty() {
            return Ok(());
        }
        let ns = self.namespace(collections::CITIES)?;
        let now = Utc::now().to_rfc3339();
        let models: Vec<WriteModel> = cities
            .iter()
            .map(|city| {
                WriteModel::UpdateOne(
                    UpdateOneModel::builder()
                        .namespace(ns.clone())
                        .filter(doc! { "place_id": &city.place_id })
                        .update(doc! {
                            "$inc": { "plans": 1 },
                            "$set": { "updated_at": &now },
                            "$setOnInsert": {
                                "place_id": &city.place_id,
                                "name": &city.name,
                                "state": "",
                                "country": "",
                                "image_url": "",
                                "created_at": &now,
                            },
                        })
                        .upsert(true)
                        .build(),
                )
            })
            .collect();

        self.get()?.client.bulk_write(models).await?;
        Ok(())
    }

    // ─── Category Operations ─────────────────────────────────────

    /// All categories, alphabetical.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let cursor = self
            .collection::<Category>(collections::CATEGORIES)?
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_category(&self, category_id: ObjectId) -> Result<Option<Category>> {
        Ok(self
            .collection::<Category>(collections::CATEGORIES)?
            .find_one(doc! { "_id": category_id })
            .await?)
    }

    pub async fn insert_category(&self, category: &Category) -> Result<Category> {
        let result = self
            .collection::<Category>(collections::CATEGORIES)?
            .insert_one(category)
            .await?;
        let mut created = category.clone();
        created.id = result.inserted_id.as_object_id();
        Ok(created)
    }

    // ─── Bookmark Operations ─────────────────────────────────────

    /// The subset of `plan_ids` the user has bookmarked, as one batch query.
    pub async fn bookmarked_ids_among(
        &self,
        user_id: ObjectId,
        plan_ids: &[ObjectId],
    ) -> Result<HashSet<ObjectId>> {
        #[derive(serde::Deserialize)]
        struct BookmarkedPlanId {
            plan_id: ObjectId,
        }

        if plan_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let cursor = self
            .collection::<BookmarkedPlanId>(collections::BOOKMARKS)?
            .find(doc! {
                "user_id": user_id,
                "plan_id": { "$in": plan_ids },
            })
            .projection(doc! { "plan_id": 1 })
            .await?;
        let bookmarks: Vec<BookmarkedPlanId> = cursor.try_collect().await?;
        Ok(bookmarks.into_iter().map(|b| b.plan_id).collect())
    }

    /// All plan ids the user has bookmarked.
    pub async fn bookmarked_plan_ids(&self, user_id: ObjectId) -> Result<Vec<ObjectId>> {
        let values = self
            .collection::<Bookmark>(collections::BOOKMARKS)?
            .distinct("plan_id", doc! { "user_id": user_id })
            .await?;
        Ok(values
            .into_iter()
            .filter_map(|v| v.as_object_id())
            .collect())
    }

    pub async fn insert_bookmark(&self, user_id: ObjectId, plan_id: ObjectId) -> Result<()> {
        let bookmark = Bookmark {
            id: None,
            user_id,
            plan_id,
            created_at: Utc::now(),
        };
        self.collection::<Bookmark>(collections::BOOKMARKS)?
            .insert_one(&bookmark)
            .await?;
        Ok(())
    }

    pub async fn delete_bookmark(&self, user_id: ObjectId, plan_id: ObjectId) -> Result<bool> {
        let result = self
            .collection::<Bookmark>(collections::BOOKMARKS)?
            .delete_one(doc! { "user_id": user_id, "plan_id": plan_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    /// Cascade: remove every bookmark referencing a deleted plan.
    pub async fn delete_plan_bookmarks(&self, plan_id: ObjectId) -> Result<u64> {
        let result = self
            .collection::<Bookmark>(collections::BOOKMARKS)?
            .delete_many(doc! { "plan_id": plan_id })
            .await?;
        Ok(result.deleted_count)
    }

    // ─── Raw Payload Cache Operations ────────────────────────────

    /// Schema version of the cached raw payload, if any.
    pub async fn cached_payload_version(&self, place_id: &str) -> Result<Option<i32>> {
        if let Some(store) = self.memory() {
            return Ok(lock(store)?.payloads.get(place_id).map(|(v, _)| *v));
        }
        Ok(self
            .collection::<CachedPlacePayload>(collections::PLACE_PAYLOADS)?
            .find_one(doc! { "place_id": place_id })
            .await?
            .map(|payload| payload.version))
    }

    /// Store or overwrite the raw payload for a place id.
    pub async fn upsert_cached_payload(
        &self,
        place_id: &str,
        version: i32,
        data: &str,
    ) -> Result<()> {
        if let Some(store) = self.memory() {
            lock(store)?
                .payloads
                .insert(place_id.to_string(), (version, data.to_string()));
            return Ok(());
        }
        let now = Utc::now().to_rfc3339();
        self.collection::<CachedPlacePayload>(collections::PLACE_PAYLOADS)?
            .update_one(
                doc! { "place_id": place_id },
                doc! {
                    "$set": { "version": version, "data": data, "updated_at": &now },
                    "$setOnInsert": { "place_id": place_id, "created_at": &now },
                },
            )
            .upsert(true)
            .await?;
        Ok(())
    }
}

fn summary_projection() -> Document {
    let mut projection = Document::new();
    for field in PlanSummary::PROJECTION {
        projection.insert(*field, 1);
    }
    projection
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_id_maps_to_not_found() {
        let err = parse_object_id("not-an-id").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let oid = ObjectId::new();
        assert_eq!(parse_object_id(&oid.to_hex()).unwrap(), oid);
    }

    #[tokio::test]
    async fn test_mock_db_rejects_operations() {
        let db = Db::new_mock();
        let err = db.find_place("abc").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_memory_db_round_trips_cache_entries() {
        let db = Db::new_memory();
        assert!(db.find_place("x").await.unwrap().is_none());

        let mut place = Place::from_raw_stop("A", "", "", &[1.0, 2.0]);
        place.place_id = "x".to_string();
        db.upsert_place(&place).await.unwrap();
        assert!(db.find_place("x").await.unwrap().is_some());

        db.upsert_cached_payload("x", 3, "{}").await.unwrap();
        assert_eq!(db.cached_payload_version("x").await.unwrap(), Some(3));

        // Non-cache operations still behave like the offline mock.
        assert!(db.find_user_by_email("a@b.c").await.is_err());
    }

    #[test]
    fn test_summary_projection_covers_summary_fields() {
        let projection = summary_projection();
        assert!(projection.contains_key("title"));
        assert!(projection.contains_key("start_location"));
        assert!(!projection.contains_key("stops"));
        assert!(!projection.contains_key("polyline"));
    }
}
