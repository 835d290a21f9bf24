//! Index handle: validated, typed access to a remote vector index

use crate::api::types::*;
use crate::api::VectorsApi;
use crate::config::IndexConfig;
use crate::distance::DistanceMetric;
use crate::error::{NeighborError, Result};
use crate::filter::Filter;
use crate::id::{IdType, ItemId};
use crate::vector::Vector;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of vectors per PutVectors / DeleteVectors call
pub const MAX_BATCH_SIZE: usize = 500;

/// Default page size for [`Index::find_in_batches`]
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Default number of neighbors returned by a search
pub const DEFAULT_COUNT: usize = 5;

const DATA_TYPE: &str = "float32";

/// An item stored in an index
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub vector: Vector,
    pub metadata: Option<Metadata>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, vector: impl Into<Vector>) -> Self {
        Self {
            id: id.into(),
            vector: vector.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A search hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: ItemId,
    pub distance: f64,
    pub metadata: Option<Metadata>,
}

/// Options for [`Index::find_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    pub with_metadata: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self { with_metadata: true }
    }
}

/// Options for [`Index::find_in_batches`] and [`Index::batches`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Page size; the service accepts 1 to 1000
    pub batch_size: u32,
    pub with_metadata: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_PAGE_SIZE,
            with_metadata: true,
        }
    }
}

impl BatchOptions {
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_metadata(mut self, with_metadata: bool) -> Self {
        self.with_metadata = with_metadata;
        self
    }
}

/// Options for [`Index::search`] and [`Index::search_id`]
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Number of neighbors to return
    pub count: usize,
    pub with_metadata: bool,
    pub filter: Option<Filter>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            with_metadata: false,
            filter: None,
        }
    }
}

impl SearchOptions {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_metadata(mut self, with_metadata: bool) -> Self {
        self.with_metadata = with_metadata;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Handle to a remote index.
///
/// Holds configuration only; every operation is forwarded to the
/// [`VectorsApi`] after local validation.
#[derive(Clone)]
pub struct Index {
    client: Arc<dyn VectorsApi>,
    config: IndexConfig,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index").field("config", &self.config).finish()
    }
}

impl Index {
    /// Create a handle. No remote call is made.
    pub fn new(client: Arc<dyn VectorsApi>, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// Create a handle and the remote index.
    pub async fn create_new(client: Arc<dyn VectorsApi>, config: IndexConfig) -> Result<Self> {
        let index = Self::new(client, config)?;
        index.create().await?;
        Ok(index)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    pub fn distance(&self) -> DistanceMetric {
        self.config.distance
    }

    pub fn id_type(&self) -> IdType {
        self.config.id_type
    }

    pub fn non_filterable(&self) -> &[String] {
        &self.config.non_filterable
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Create the remote index.
    pub async fn create(&self) -> Result<()> {
        let metadata_configuration = if self.config.non_filterable.is_empty() {
            None
        } else {
            Some(MetadataConfiguration {
                non_filterable_metadata_keys: self.config.non_filterable.clone(),
            })
        };

        self.client
            .create_index(&CreateIndexRequest {
                vector_bucket_name: self.config.bucket.clone(),
                index_name: self.config.name.clone(),
                data_type: DATA_TYPE.to_string(),
                dimension: self.config.dimensions,
                distance_metric: self.config.distance,
                metadata_configuration,
            })
            .await
    }

    /// Whether the remote index exists.
    pub async fn exists(&self) -> Result<bool> {
        match self.client.get_index(&self.index_ref()).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Description of the remote index.
    pub async fn info(&self) -> Result<IndexInfo> {
        Ok(self.client.get_index(&self.index_ref()).await?.index)
    }

    /// Delete the remote index.
    pub async fn drop(&self) -> Result<()> {
        self.client.delete_index(&self.index_ref()).await
    }

    /// Add or replace an item.
    pub async fn add(&self, id: impl Into<ItemId>, vector: impl Into<Vector>) -> Result<()> {
        self.add_all([Item::new(id, vector)]).await
    }

    /// Add or replace an item with metadata.
    pub async fn add_with_metadata(
        &self,
        id: impl Into<ItemId>,
        vector: impl Into<Vector>,
        metadata: Metadata,
    ) -> Result<()> {
        self.add_all([Item::new(id, vector).with_metadata(metadata)]).await
    }

    /// Add or replace items.
    ///
    /// Every item is validated before the first request, so a bad item
    /// fails the whole call without writing anything. Items are sent in
    /// chunks of [`MAX_BATCH_SIZE`]; a remote failure part-way leaves
    /// earlier chunks written.
    pub async fn add_all(&self, items: impl IntoIterator<Item = Item>) -> Result<()> {
        let vectors = items
            .into_iter()
            .map(|item| {
                item.vector.check_dimension(self.config.dimensions)?;
                Ok(PutInputVector {
                    key: self.item_id(item.id)?.key(),
                    data: VectorData {
                        float32: item.vector.into_inner(),
                    },
                    metadata: item.metadata,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for batch in vectors.chunks(MAX_BATCH_SIZE) {
            debug!(index = %self.config.name, count = batch.len(), "putting vectors");
            self.client
                .put_vectors(&PutVectorsRequest {
                    vector_bucket_name: self.config.bucket.clone(),
                    index_name: self.config.name.clone(),
                    vectors: batch.to_vec(),
                })
                .await?;
        }
        Ok(())
    }

    /// Whether an item with `id` exists.
    pub async fn member(&self, id: impl Into<ItemId>) -> Result<bool> {
        let id = self.item_id(id.into())?;

        let response = self
            .client
            .get_vectors(&GetVectorsRequest {
                vector_bucket_name: self.config.bucket.clone(),
                index_name: self.config.name.clone(),
                keys: vec![id.key()],
                return_data: false,
                return_metadata: false,
            })
            .await?;
        Ok(!response.vectors.is_empty())
    }

    /// Alias for [`Index::member`].
    pub async fn include(&self, id: impl Into<ItemId>) -> Result<bool> {
        self.member(id).await
    }

    /// Remove an item. Removing a missing item is not an error.
    pub async fn remove(&self, id: impl Into<ItemId>) -> Result<()> {
        let id: ItemId = id.into();
        self.remove_all([id]).await
    }

    /// Remove items, in chunks of [`MAX_BATCH_SIZE`].
    pub async fn remove_all<I>(&self, ids: impl IntoIterator<Item = I>) -> Result<()>
    where
        I: Into<ItemId>,
    {
        let keys = ids
            .into_iter()
            .map(|id| self.item_id(id.into()).map(|id| id.key()))
            .collect::<Result<Vec<_>>>()?;

        for batch in keys.chunks(MAX_BATCH_SIZE) {
            debug!(index = %self.config.name, count = batch.len(), "deleting vectors");
            self.client
                .delete_vectors(&DeleteVectorsRequest {
                    vector_bucket_name: self.config.bucket.clone(),
                    index_name: self.config.name.clone(),
                    keys: batch.to_vec(),
                })
                .await?;
        }
        Ok(())
    }

    /// Fetch an item with its metadata.
    pub async fn find(&self, id: impl Into<ItemId>) -> Result<Option<Item>> {
        self.find_with(id, FindOptions::default()).await
    }

    /// Fetch an item.
    pub async fn find_with(&self, id: impl Into<ItemId>, options: FindOptions) -> Result<Option<Item>> {
        let id = self.item_id(id.into())?;

        let response = self
            .client
            .get_vectors(&GetVectorsRequest {
                vector_bucket_name: self.config.bucket.clone(),
                index_name: self.config.name.clone(),
                keys: vec![id.key()],
                return_data: true,
                return_metadata: options.with_metadata,
            })
            .await?;

        response
            .vectors
            .into_iter()
            .next()
            .map(|v| self.to_item(v, options.with_metadata))
            .transpose()
    }

    /// Iterate over every item, one page at a time.
    ///
    /// An empty index yields a single empty page.
    pub async fn find_in_batches<F>(&self, options: BatchOptions, mut f: F) -> Result<()>
    where
        F: FnMut(Vec<Item>),
    {
        let mut batches = self.batches(options);
        while let Some(batch) = batches.next_batch().await? {
            f(batch);
        }
        Ok(())
    }

    /// Page cursor over every item.
    pub fn batches(&self, options: BatchOptions) -> Batches<'_> {
        Batches {
            index: self,
            request: ListVectorsRequest {
                vector_bucket_name: self.config.bucket.clone(),
                index_name: self.config.name.clone(),
                max_results: Some(options.batch_size),
                next_token: None,
                return_data: true,
                return_metadata: options.with_metadata,
            },
            with_metadata: options.with_metadata,
            done: false,
        }
    }

    /// Nearest neighbors of `vector`, closest first.
    pub async fn search(&self, vector: impl Into<Vector>, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let vector = vector.into();
        vector.check_dimension(self.config.dimensions)?;
        self.query(vector, options.count, options).await
    }

    /// Nearest neighbors of an existing item, excluding the item itself.
    pub async fn search_id(&self, id: impl Into<ItemId>, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let id = self.item_id(id.into())?;

        let item = self
            .find_with(id.clone(), FindOptions { with_metadata: false })
            .await?
            .ok_or_else(|| NeighborError::ItemNotFound { id: id.key() })?;

        let results = self
            .query(item.vector, options.count.saturating_add(1), options)
            .await?;
        Ok(results
            .into_iter()
            .filter(|r| r.id != id)
            .take(options.count)
            .collect())
    }

    async fn query(&self, vector: Vector, top_k: usize, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .query_vectors(&QueryVectorsRequest {
                vector_bucket_name: self.config.bucket.clone(),
                index_name: self.config.name.clone(),
                top_k,
                query_vector: VectorData {
                    float32: vector.into_inner(),
                },
                filter: options.filter.clone(),
                return_metadata: options.with_metadata,
                return_distance: true,
            })
            .await?;

        response
            .vectors
            .into_iter()
            .map(|v| {
                let reported = v.distance.ok_or_else(|| {
                    NeighborError::InvalidResponse(format!("missing distance for key {}", v.key))
                })?;
                Ok(SearchResult {
                    id: self.config.id_type.parse_key(&v.key)?,
                    distance: self.config.distance.normalize(reported),
                    metadata: if options.with_metadata {
                        Some(v.metadata.unwrap_or_default())
                    } else {
                        None
                    },
                })
            })
            .collect()
    }

    fn item_id(&self, id: ItemId) -> Result<ItemId> {
        self.config.id_type.coerce(id)
    }

    fn to_item(&self, v: OutputVector, with_metadata: bool) -> Result<Item> {
        let data = v.data.ok_or_else(|| {
            NeighborError::InvalidResponse(format!("missing vector data for key {}", v.key))
        })?;
        Ok(Item {
            id: self.config.id_type.parse_key(&v.key)?,
            vector: Vector::new(data.float32),
            metadata: if with_metadata {
                Some(v.metadata.unwrap_or_default())
            } else {
                None
            },
        })
    }

    fn index_ref(&self) -> IndexRef {
        IndexRef {
            vector_bucket_name: self.config.bucket.clone(),
            index_name: self.config.name.clone(),
        }
    }
}

/// Cursor over the pages of a ListVectors scan
pub struct Batches<'a> {
    index: &'a Index,
    request: ListVectorsRequest,
    with_metadata: bool,
    done: bool,
}

impl Batches<'_> {
    /// Fetch the next page, or `None` once the scan is complete.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<Item>>> {
        if self.done {
            return Ok(None);
        }

        let response = self.index.client.list_vectors(&self.request).await?;
        // the cursor only advances once the page converts, so a failed
        // page is fetched again by the next call
        let batch = response
            .vectors
            .into_iter()
            .map(|v| self.index.to_item(v, self.with_metadata))
            .collect::<Result<Vec<_>>>()?;

        match response.next_token.filter(|t| !t.is_empty()) {
            Some(token) => self.request.next_token = Some(token),
            None => self.done = true,
        }
        debug!(index = %self.index.config.name, count = batch.len(), "listed vectors");
        Ok(Some(batch))
    }
}
