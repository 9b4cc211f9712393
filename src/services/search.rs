// src/services/search.rs

//! Sieve search over schedules and catalogues.
//!
//! One algorithm serves every collection type: a [`Sieve`] holds the
//! query, collections expose their items and text fields through
//! [`Searchable`], and multi-collection searches aggregate per-collection
//! misses into a single summarizing error.

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};
use crate::models::{BroadcastRecord, Catalogue, CatalogueEntry, ListingsWindow, ScheduleDay};

/// The two query forms.
#[derive(Debug, Clone)]
pub enum Query {
    /// Whole-field equality
    Exact(String),
    /// Regex match anywhere in the field
    Regex(Regex),
}

impl Query {
    fn matches(&self, field: &str) -> bool {
        match self {
            Self::Exact(term) => field == term,
            Self::Regex(re) => re.is_match(field),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Exact(term) => format!("{term:?}"),
            Self::Regex(re) => format!("/{}/", re.as_str()),
        }
    }
}

/// A collection the sieve can search.
pub trait Searchable {
    type Item;

    fn items(&self) -> Vec<&Self::Item>;

    /// Human-readable scope for miss reporting.
    fn scope(&self) -> String;

    /// The item's searchable text fields. With `all_fields`, secondary
    /// fields join the primary title.
    fn fields(item: &Self::Item, all_fields: bool) -> Vec<&str>;
}

impl Searchable for ScheduleDay {
    type Item = BroadcastRecord;

    fn items(&self) -> Vec<&BroadcastRecord> {
        self.broadcasts.iter().collect()
    }

    fn scope(&self) -> String {
        ScheduleDay::scope(self)
    }

    fn fields(item: &BroadcastRecord, all_fields: bool) -> Vec<&str> {
        if all_fields {
            vec![&item.title, &item.subtitle, &item.synopsis]
        } else {
            vec![&item.title]
        }
    }
}

impl Searchable for Catalogue {
    type Item = CatalogueEntry;

    fn items(&self) -> Vec<&CatalogueEntry> {
        self.entries().collect()
    }

    fn scope(&self) -> String {
        Catalogue::scope(self)
    }

    fn fields(item: &CatalogueEntry, all_fields: bool) -> Vec<&str> {
        let mut fields = vec![item.title.as_str()];
        if all_fields {
            if let Some(genre) = &item.genre {
                fields.push(genre);
            }
        }
        fields
    }
}

/// A configured search.
#[derive(Debug, Clone)]
pub struct Sieve {
    query: Query,
    all_fields: bool,
}

impl Sieve {
    /// Whole-field equality search.
    pub fn exact(term: impl Into<String>) -> Self {
        Self {
            query: Query::Exact(term.into()),
            all_fields: false,
        }
    }

    /// Regex search. Invalid patterns are caller errors.
    pub fn regex(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| Error::config(format!("invalid search pattern {pattern:?}: {e}")))?;
        Ok(Self {
            query: Query::Regex(re),
            all_fields: false,
        })
    }

    /// Match against secondary fields (subtitle, synopsis, genre) as well
    /// as the title.
    pub fn all_fields(mut self, all_fields: bool) -> Self {
        self.all_fields = all_fields;
        self
    }

    fn hits<'c, C: Searchable>(&self, collection: &'c C) -> Vec<&'c C::Item> {
        collection
            .items()
            .into_iter()
            .filter(|item| {
                C::fields(item, self.all_fields)
                    .into_iter()
                    .any(|field| self.query.matches(field))
            })
            .collect()
    }

    /// All matches in one collection; no match is an error naming the
    /// collection's scope.
    pub fn search<'c, C: Searchable>(&self, collection: &'c C) -> Result<Vec<&'c C::Item>> {
        let hits = self.hits(collection);
        if hits.is_empty() {
            return Err(Error::not_found(self.query.describe(), collection.scope()));
        }
        Ok(hits)
    }

    /// First match in one collection.
    pub fn search_first<'c, C: Searchable>(&self, collection: &'c C) -> Result<&'c C::Item> {
        Ok(self.search(collection)?.remove(0))
    }

    /// All matches across several collections. Only when every collection
    /// misses does the search fail, with one error summarizing all the
    /// scopes searched.
    pub fn search_across<'c, C, I>(&self, collections: I) -> Result<Vec<&'c C::Item>>
    where
        C: Searchable + 'c,
        I: IntoIterator<Item = &'c C>,
    {
        let mut hits = Vec::new();
        let mut scopes = Vec::new();
        for collection in collections {
            scopes.push(collection.scope());
            hits.extend(self.hits(collection));
        }
        if hits.is_empty() {
            return Err(Error::not_found(self.query.describe(), scopes.join(", ")));
        }
        Ok(hits)
    }

    /// First match across several collections, in collection order.
    pub fn search_first_across<'c, C, I>(&self, collections: I) -> Result<&'c C::Item>
    where
        C: Searchable + 'c,
        I: IntoIterator<Item = &'c C>,
    {
        Ok(self.search_across(collections)?.remove(0))
    }

    /// First matching broadcast in a listings window, scanning days
    /// chronologically.
    pub fn search_window<'c>(&self, window: &'c ListingsWindow) -> Result<&'c BroadcastRecord> {
        self.search_first_across(window.days()).map_err(|err| match err {
            Error::NotFound { target, .. } => Error::not_found(target, window.scope()),
            other => other,
        })
    }
}
