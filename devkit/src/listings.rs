//! Canned listing source

use async_trait::async_trait;
use hostwatch_core::{Error, Listing, ListingSource, Result};
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::fixtures;

enum Reply {
    Text(String),
    Fail(String),
}

/// `ListingSource` answering from strings, counting every fetch
#[derive(Default)]
pub struct StaticListings {
    replies: Mutex<HashMap<Listing, Reply>>,
    fetches: Mutex<HashMap<Listing, usize>>,
}

impl StaticListings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every listing with the matching fixture
    pub fn standard() -> Self {
        Self::new()
            .with(Listing::FirewallRules, fixtures::UFW_STATUS)
            .with(Listing::OpenPorts, fixtures::SS_TULN)
            .with(Listing::Services, fixtures::SYSTEMCTL_UNITS)
    }

    pub fn with(self, listing: Listing, text: &str) -> Self {
        self.set(listing, text);
        self
    }

    pub fn set(&self, listing: Listing, text: &str) {
        self.replies.lock().insert(listing, Reply::Text(text.to_string()));
    }

    /// Make `listing` fail like a command exiting non-zero
    pub fn fail(&self, listing: Listing, reason: &str) {
        self.replies.lock().insert(listing, Reply::Fail(reason.to_string()));
    }

    pub fn fetches(&self, listing: Listing) -> usize {
        self.fetches.lock().get(&listing).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ListingSource for StaticListings {
    async fn fetch(&self, listing: Listing) -> Result<String> {
        *self.fetches.lock().entry(listing).or_insert(0) += 1;

        match self.replies.lock().get(&listing) {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Fail(reason)) => Err(Error::Command {
                command: listing.to_string(),
                reason: reason.clone(),
            }),
            None => Err(Error::Command {
                command: listing.to_string(),
                reason: "no scripted output".to_string(),
            }),
        }
    }
}
