//! Remote Function Catalog
//!
//! The daemon publishes its callable functions through paginated
//! `Admin_availableFunctions` replies. The catalog merges pages as they
//! arrive (later pages win on name collisions), counts them to know which
//! page to ask for next, and resolves call arguments against each
//! function's registered defaults.

use crate::protocol::reply::FunctionEntries;
use crate::protocol::{Args, PAGE_ARG};
use serde_bencode::value::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from catalog lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown remote function: {0}")]
    UnknownFunction(String),
}

/// A remotely callable function and its argument defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDescriptor {
    name: String,
    defaults: Args,
}

impl FunctionDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, defaults: Args) -> Self {
        Self {
            name: name.into(),
            defaults,
        }
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument name → default value.
    pub fn defaults(&self) -> &Args {
        &self.defaults
    }
}

/// What to do after a catalog page has been merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageOutcome {
    /// Request this page next.
    NextPage(u32),
    /// Discovery is finished after this many pages.
    Complete { pages: u32 },
}

/// Arguments ready to be sent for one call.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedCall {
    /// Defaults with caller overrides applied.
    pub args: Args,
    /// Pagination cursor in effect, if any.
    pub cursor: Option<i64>,
    /// Caller keys the function does not take; not sent.
    pub ignored: Vec<String>,
}

/// Accumulated function directory.
#[derive(Clone, Debug, Default)]
pub struct FunctionCatalog {
    functions: BTreeMap<String, FunctionDescriptor>,
    pages_received: u32,
}

impl FunctionCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart page counting; known functions are kept.
    pub fn reset_pages(&mut self) {
        self.pages_received = 0;
    }

    /// Number of pages merged since the last reset.
    pub fn pages_received(&self) -> u32 {
        self.pages_received
    }

    /// Merge one page and decide what comes next.
    pub fn merge_page(&mut self, entries: FunctionEntries, more: bool) -> PageOutcome {
        self.merge_entries(entries);
        self.pages_received += 1;

        if more {
            PageOutcome::NextPage(self.pages_received)
        } else {
            PageOutcome::Complete {
                pages: self.pages_received,
            }
        }
    }

    /// Merge entries without counting a page.
    pub fn merge_entries(&mut self, entries: FunctionEntries) {
        for (name, defaults) in entries {
            self.functions
                .insert(name.clone(), FunctionDescriptor::new(name, defaults));
        }
    }

    /// Register a single function directly.
    pub fn insert(&mut self, descriptor: FunctionDescriptor) {
        self.functions.insert(descriptor.name.clone(), descriptor);
    }

    /// Look up a function by name.
    pub fn get(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    /// Check if a function is known.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of known functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if no function is known.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Iterate over known function names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Resolve the arguments for a call.
    ///
    /// Starts from the registered defaults and overwrites each argument
    /// the caller supplied. A `page` override is always carried; an explicit
    /// `cursor` replaces it.
    pub fn resolve_args(
        &self,
        name: &str,
        cursor: Option<i64>,
        overrides: &Args,
    ) -> Result<ResolvedCall, CatalogError> {
        let descriptor = self
            .get(name)
            .ok_or_else(|| CatalogError::UnknownFunction(name.to_string()))?;

        let mut args: Args = descriptor
            .defaults
            .iter()
            .map(|(arg, default)| {
                let value = overrides.get(arg).unwrap_or(default);
                (arg.clone(), value.clone())
            })
            .collect();

        let keyword_page = overrides.get(PAGE_ARG);
        if let Some(page) = keyword_page {
            args.insert(PAGE_ARG.to_string(), page.clone());
        }

        let cursor = match (cursor, keyword_page) {
            (Some(c), _) => {
                args.insert(PAGE_ARG.to_string(), Value::Int(c));
                Some(c)
            }
            (None, Some(Value::Int(c))) => Some(*c),
            (None, _) => None,
        };

        let ignored = overrides
            .keys()
            .filter(|k| k.as_str() != PAGE_ARG && !descriptor.defaults.contains_key(*k))
            .cloned()
            .collect();

        Ok(ResolvedCall {
            args,
            cursor,
            ignored,
        })
    }
}
