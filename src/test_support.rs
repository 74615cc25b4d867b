//! Shared test doubles for the store and upstream seams.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::store::{KeyValueStore, ScanPage, StoreError};
use crate::upstream::{
    AbilitySlot, NamedResource, SpeciesApi, SpeciesDetail, SpeciesPage, Sprites, StatEntry,
    TypeSlot, UpstreamError,
};

// == Unreachable Store ==
/// A store whose every operation fails, as if the server were down.
#[derive(Debug, Default)]
pub struct UnreachableStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl KeyValueStore for UnreachableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        unavailable()
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        unavailable()
    }

    async fn increment(&self, _key: &str) -> Result<i64, StoreError> {
        unavailable()
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
        unavailable()
    }

    async fn ttl(&self, _key: &str) -> Result<Option<Duration>, StoreError> {
        unavailable()
    }

    async fn scan(&self, _cursor: u64, _pattern: &str, _count: usize) -> Result<ScanPage, StoreError> {
        unavailable()
    }

    async fn delete_many(&self, _keys: &[String]) -> Result<u64, StoreError> {
        unavailable()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        unavailable()
    }
}

// == Fake Species Api ==
/// In-process catalog that records every call it receives.
#[derive(Debug, Default)]
pub struct FakeSpeciesApi {
    names: Vec<String>,
    failing: HashSet<String>,
    list_calls: Mutex<Vec<(u32, u32)>>,
    detail_calls: Mutex<Vec<String>>,
}

impl FakeSpeciesApi {
    pub fn with_names(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Makes detail lookups for `name` fail with a server error.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn list_calls(&self) -> Vec<(u32, u32)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }

    fn resource(name: &str) -> NamedResource {
        NamedResource::new(name, format!("https://catalog.test/pokemon/{}/", name))
    }
}

#[async_trait]
impl SpeciesApi for FakeSpeciesApi {
    async fn list(&self, offset: u32, limit: u32) -> Result<SpeciesPage, UpstreamError> {
        self.list_calls.lock().unwrap().push((offset, limit));

        let results = self
            .names
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|n| Self::resource(n))
            .collect();

        Ok(SpeciesPage {
            count: self.names.len() as u64,
            next: None,
            previous: None,
            results,
        })
    }

    async fn detail(&self, identifier: &str) -> Result<SpeciesDetail, UpstreamError> {
        self.detail_calls.lock().unwrap().push(identifier.to_string());

        let url = format!("https://catalog.test/pokemon/{}", identifier);
        if self.failing.contains(identifier) {
            return Err(UpstreamError::Status { status: 500, url });
        }
        let Some(index) = self.names.iter().position(|n| n == identifier) else {
            return Err(UpstreamError::Status { status: 404, url });
        };

        Ok(SpeciesDetail {
            id: index as u64 + 1,
            name: identifier.to_string(),
            height: 10,
            weight: 100,
            sprites: Sprites {
                front_default: Some(format!("https://img.test/{}.png", index + 1)),
                other: None,
            },
            types: vec![TypeSlot {
                slot: 1,
                kind: NamedResource::new("normal", "https://catalog.test/type/1/"),
            }],
            abilities: vec![AbilitySlot {
                ability: NamedResource::new("run-away", "https://catalog.test/ability/50/"),
                is_hidden: false,
                slot: 1,
            }],
            stats: vec![StatEntry {
                base_stat: 50,
                effort: 0,
                stat: NamedResource::new("hp", "https://catalog.test/stat/1/"),
            }],
        })
    }
}
