//! Query builder for the REST table service.
//!
//! Mirrors the subset of the PostgREST surface the feed needs:
//! projection (including embedded joins), equality filters, ordering,
//! single-row reads, insert and upsert.

use super::client::{RequestFailure, SupabaseClient};
use nerdfeed_core::{FeedError, Result};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Sort direction for `Table::order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// A request against one relation, built up fluently.
///
/// ```ignore
/// let profile: Option<Profile> = client
///     .from("profiles")
///     .select("*")
///     .eq("id", user_id)
///     .fetch_optional()
///     .await?;
/// ```
#[derive(Clone)]
pub struct Table {
    client: SupabaseClient,
    name: String,
    params: Vec<(String, String)>,
    single: bool,
}

impl SupabaseClient {
    /// Starts a query against `table`.
    pub fn from(&self, table: impl Into<String>) -> Table {
        Table {
            client: self.clone(),
            name: table.into(),
            params: Vec::new(),
            single: false,
        }
    }
}

impl Table {
    /// Column projection, e.g. `"*, profiles:author(display_name, avatar_url)"`.
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    /// Equality filter on `column`.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.params
            .push(("order".to_string(), format!("{}.{}", column, order.as_str())));
        self
    }

    /// Expect exactly one row; zero rows becomes `FeedError::NotFound`.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Runs a read and decodes the body into `T`.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<T> {
        let url = self.client.endpoint(&["rest", "v1", self.name.as_str()])?;
        let mut request = self.client.request(Method::GET, url).query(&self.params);
        if self.single {
            request = request.header(reqwest::header::ACCEPT, SINGLE_OBJECT);
        }

        match self.client.execute(request).await {
            Ok(response) => Ok(response.json::<T>().await?),
            Err(RequestFailure::Api(err)) if self.single && err.is_no_rows() => {
                Err(FeedError::not_found("row", self.describe()))
            }
            Err(failure) => Err(failure.into()),
        }
    }

    /// Single-row read that maps "no rows" to `Ok(None)`.
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>> {
        match self.single().fetch::<T>().await {
            Ok(row) => Ok(Some(row)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Inserts one row without reading it back.
    pub async fn insert<T: Serialize + ?Sized>(self, row: &T) -> Result<()> {
        let url = self.client.endpoint(&["rest", "v1", self.name.as_str()])?;
        let request = self
            .client
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(row);
        self.client.send(request).await?;
        Ok(())
    }

    /// Inserts one row, merging into an existing row that matches the
    /// uniqueness key `on_conflict` (comma-separated columns).
    pub async fn upsert<T: Serialize + ?Sized>(self, row: &T, on_conflict: &str) -> Result<()> {
        let url = self.client.endpoint(&["rest", "v1", self.name.as_str()])?;
        let request = self
            .client
            .request(Method::POST, url)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row);
        self.client.send(request).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        let filters: Vec<String> = self
            .params
            .iter()
            .filter(|(key, _)| key != "select" && key != "order")
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        if filters.is_empty() {
            self.name.clone()
        } else {
            format!("{}?{}", self.name, filters.join("&"))
        }
    }
}
