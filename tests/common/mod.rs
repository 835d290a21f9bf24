//! Recording test double for the remote API.

#![allow(dead_code)]

use async_trait::async_trait;
use neighbor_s3::api::*;
use neighbor_s3::{Metadata, NeighborError, Result, ServiceError, ServiceErrorKind};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

/// A request received by [`MockApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateIndex(CreateIndexRequest),
    GetIndex(IndexRef),
    DeleteIndex(IndexRef),
    PutVectors(PutVectorsRequest),
    GetVectors(GetVectorsRequest),
    DeleteVectors(DeleteVectorsRequest),
    ListVectors(ListVectorsRequest),
    QueryVectors(QueryVectorsRequest),
}

/// A scripted response, consumed in order
#[derive(Debug, Clone)]
pub enum Reply {
    Index(IndexInfo),
    Vectors(Vec<OutputVector>),
    Page(ListVectorsResponse),
    Fail(ServiceError),
}

/// Records every call and answers from a queue of scripted replies.
///
/// Successful PutVectors / DeleteVectors calls update an in-memory store,
/// and GetVectors without a scripted reply answers from it. Other
/// operations without a scripted reply succeed with an empty response,
/// except GetIndex, which answers not-found.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<VecDeque<Reply>>,
    stored: Mutex<BTreeMap<String, PutInputVector>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, reply: Reply) -> &Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Keys currently held in the store.
    pub fn stored_keys(&self) -> Vec<String> {
        self.stored.lock().unwrap().keys().cloned().collect()
    }

    fn lookup(&self, request: &GetVectorsRequest) -> Vec<OutputVector> {
        let stored = self.stored.lock().unwrap();
        request
            .keys
            .iter()
            .filter_map(|key| stored.get(key))
            .map(|v| OutputVector {
                key: v.key.clone(),
                data: request.return_data.then(|| v.data.clone()),
                metadata: if request.return_metadata { v.metadata.clone() } else { None },
                distance: None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Option<Reply> {
        self.calls.lock().unwrap().push(call);
        self.replies.lock().unwrap().pop_front()
    }

    fn expect_empty(&self, call: Call) -> Result<()> {
        match self.record(call) {
            None => Ok(()),
            Some(Reply::Fail(e)) => Err(e.into()),
            Some(other) => panic!("unexpected reply {:?}", other),
        }
    }
}

pub fn not_found() -> ServiceError {
    ServiceError::new(
        ServiceErrorKind::NotFound,
        404,
        "The specified index could not be found",
    )
}

pub fn conflict() -> ServiceError {
    ServiceError::new(
        ServiceErrorKind::Conflict,
        409,
        "An index with the specified name already exists",
    )
}

pub fn validation(message: &str) -> ServiceError {
    ServiceError::new(ServiceErrorKind::Validation, 400, message)
}

pub fn metadata(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

pub fn hit(key: &str, distance: f64) -> OutputVector {
    OutputVector::new(key).with_distance(distance)
}

pub fn stored(key: &str, data: &[f32]) -> OutputVector {
    OutputVector::new(key).with_data(data.to_vec())
}

#[async_trait]
impl VectorsApi for MockApi {
    async fn create_index(&self, request: &CreateIndexRequest) -> Result<()> {
        self.expect_empty(Call::CreateIndex(request.clone()))
    }

    async fn get_index(&self, request: &IndexRef) -> Result<GetIndexResponse> {
        match self.record(Call::GetIndex(request.clone())) {
            Some(Reply::Index(index)) => Ok(GetIndexResponse { index }),
            Some(Reply::Fail(e)) => Err(e.into()),
            None => Err(NeighborError::Service(not_found())),
            Some(other) => panic!("unexpected reply {:?}", other),
        }
    }

    async fn delete_index(&self, request: &IndexRef) -> Result<()> {
        self.expect_empty(Call::DeleteIndex(request.clone()))
    }

    async fn put_vectors(&self, request: &PutVectorsRequest) -> Result<()> {
        self.expect_empty(Call::PutVectors(request.clone()))?;
        let mut stored = self.stored.lock().unwrap();
        for vector in &request.vectors {
            stored.insert(vector.key.clone(), vector.clone());
        }
        Ok(())
    }

    async fn get_vectors(&self, request: &GetVectorsRequest) -> Result<GetVectorsResponse> {
        match self.record(Call::GetVectors(request.clone())) {
            Some(Reply::Vectors(vectors)) => Ok(GetVectorsResponse { vectors }),
            Some(Reply::Fail(e)) => Err(e.into()),
            None => Ok(GetVectorsResponse {
                vectors: self.lookup(request),
            }),
            Some(other) => panic!("unexpected reply {:?}", other),
        }
    }

    async fn delete_vectors(&self, request: &DeleteVectorsRequest) -> Result<()> {
        self.expect_empty(Call::DeleteVectors(request.clone()))?;
        let mut stored = self.stored.lock().unwrap();
        for key in &request.keys {
            stored.remove(key);
        }
        Ok(())
    }

    async fn list_vectors(&self, request: &ListVectorsRequest) -> Result<ListVectorsResponse> {
        match self.record(Call::ListVectors(request.clone())) {
            Some(Reply::Page(page)) => Ok(page),
            Some(Reply::Fail(e)) => Err(e.into()),
            None => Ok(ListVectorsResponse::default()),
            Some(other) => panic!("unexpected reply {:?}", other),
        }
    }

    async fn query_vectors(&self, request: &QueryVectorsRequest) -> Result<QueryVectorsResponse> {
        match self.record(Call::QueryVectors(request.clone())) {
            Some(Reply::Vectors(vectors)) => Ok(QueryVectorsResponse { vectors }),
            Some(Reply::Fail(e)) => Err(e.into()),
            None => Ok(QueryVectorsResponse::default()),
            Some(other) => panic!("unexpected reply {:?}", other),
        }
    }
}
