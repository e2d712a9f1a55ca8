//! Table repository
//!
//! A [`TableRepository`] is bound to one record type and one table. It reads
//! and writes records through a [`ConnectionProvider`] without any SQL written
//! per record type: statements are rendered from the record's field list.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tablerepo::{ConnectionProvider, TableRepository};
//!
//! let provider = ConnectionProvider::open_in_memory()?;
//! let movies = TableRepository::<Movie>::new(&provider)?;
//! movies.reset_table()?;
//!
//! let mut movie = Movie::new("pop", 8.01, None);
//! let id = movies.insert(&mut movie);
//! let found = movies.search_by_column("title", "po")?;
//! ```
//!
//! `insert`, `update` and `delete` report failure as a sentinel (`-1` or
//! `false`) and log the cause; their `try_` forms return the error instead.

mod binding;
mod statement;

pub use binding::{RepositoryConfig, TableBinding};

use crate::database::core::connection::{ConnectionProvider, Params};
use crate::database::core::schema::resolve_create_table_statement;
use crate::error::{Error, Result};
use crate::record::codec::{bind_params, from_row, to_column_values};
use crate::record::{assign_identity, identity_of, Column, FieldMapping, Record};
use statement::{Statements, SEARCH_PARAM};
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// CRUD, search and table lifecycle for records of type `R`
pub struct TableRepository<'a, R: Record> {
    provider: &'a ConnectionProvider,
    binding: TableBinding,
    mapping: FieldMapping,
    statements: Statements,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: Record> TableRepository<'a, R> {
    /// Bind `R` to its default table
    pub fn new(provider: &'a ConnectionProvider) -> Result<Self> {
        Self::with_binding(provider, TableBinding::of::<R>()?)
    }

    /// Bind `R` according to `config`
    pub fn with_config(
        provider: &'a ConnectionProvider,
        config: &RepositoryConfig,
    ) -> Result<Self> {
        Self::with_binding(provider, TableBinding::from_config::<R>(config)?)
    }

    pub fn with_binding(provider: &'a ConnectionProvider, binding: TableBinding) -> Result<Self> {
        let mapping = FieldMapping::of::<R>()?;
        let statements = Statements::build(provider.dialect(), binding.table(), &mapping)?;
        debug!(
            "{} repository bound to table {} ({})",
            binding.type_name(),
            binding.table(),
            provider.dialect()
        );

        Ok(Self {
            provider,
            binding,
            mapping,
            statements,
            _record: PhantomData,
        })
    }

    pub fn binding(&self) -> &TableBinding {
        &self.binding
    }

    pub fn field_mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn table_name(&self) -> &str {
        self.binding.table()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every row of the table, in the engine's natural order
    pub fn get_all(&self) -> Result<Vec<R>> {
        self.fetch(&self.statements.select_all, &Params::new())
    }

    /// The record with identity `id`, or `None`
    pub fn get_one_by_id(&self, id: i64) -> Result<Option<R>> {
        let params = self.id_params(id);
        let row = self
            .provider
            .with_connection(|conn| conn.query_one(&self.statements.select_by_id, &params))?;
        row.map(from_row::<R>).transpose()
    }

    /// Records whose `column` contains `text`
    ///
    /// The column is checked against the record's fields before any SQL is
    /// built. Matching uses `LIKE` with the engine's default collation.
    pub fn search_by_column(&self, column: &str, text: &str) -> Result<Vec<R>> {
        self.search_by_columns(&[column], text)
    }

    /// Records where any of `columns` contains `text`
    pub fn search_by_columns(&self, columns: &[&str], text: &str) -> Result<Vec<R>> {
        let columns = columns
            .iter()
            .map(|name| self.mapping.column(self.binding.table(), name))
            .collect::<Result<Vec<Column>>>()?;
        let sql = self.statements.search(&columns)?;
        let params = Params::new().with_value(SEARCH_PARAM, format!("%{}%", text));
        self.fetch(&sql, &params)
    }

    pub fn count(&self) -> Result<u64> {
        let row = self
            .provider
            .with_connection(|conn| conn.query_one(&self.statements.count, &Params::new()))?;
        let mut row =
            row.ok_or_else(|| Error::database("COUNT returned no rows", &self.statements.count))?;
        let count: i64 = row.take("count")?;
        u64::try_from(count)
            .map_err(|_| Error::database("COUNT returned a negative value", &self.statements.count))
    }

    pub fn table_exists(&self) -> Result<bool> {
        self.provider
            .with_connection(|conn| conn.table_exists(self.binding.table()))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert `record` and store the assigned identity in it
    ///
    /// Returns the new identity, or `-1` when the insert fails.
    pub fn insert(&self, record: &mut R) -> i64 {
        match self.try_insert(record) {
            Ok(id) => id,
            Err(e) => {
                warn!("insert into {} failed: {}", self.binding.table(), e);
                -1
            }
        }
    }

    pub fn try_insert(&self, record: &mut R) -> Result<i64> {
        let values = to_column_values(record)?;
        let params = bind_params(&self.statements.payload, &values)?;

        let id = self.provider.with_connection(|conn| {
            conn.execute(&self.statements.insert, &params)?;
            conn.last_insert_id()
        })?;
        assign_identity(record, id)?;
        Ok(id)
    }

    /// Insert each record in turn, returning how many succeeded
    ///
    /// Not transactional: a failure is logged and the remaining records are
    /// still attempted, and earlier inserts stay committed.
    pub fn insert_many(&self, records: &mut [R]) -> usize {
        let mut inserted = 0;
        for record in records.iter_mut() {
            if self.insert(record) >= 0 {
                inserted += 1;
            }
        }
        inserted
    }

    /// Write every non-identity field of `record` to its row
    ///
    /// Returns whether the statement ran without error.
    pub fn update(&self, record: &R) -> bool {
        match self.try_update(record) {
            Ok(_) => true,
            Err(e) => {
                warn!("update of {} failed: {}", self.binding.table(), e);
                false
            }
        }
    }

    /// Returns the number of rows the engine reports as affected
    pub fn try_update(&self, record: &R) -> Result<usize> {
        let id = identity_of(record)?.ok_or_else(|| {
            Error::Mapping(format!(
                "cannot update {} without an id",
                self.binding.type_name()
            ))
        })?;
        let sql = self.statements.update.as_deref().ok_or_else(|| {
            Error::Mapping(format!(
                "{} has no columns besides its id to update",
                self.binding.type_name()
            ))
        })?;

        let values = to_column_values(record)?;
        let mut params = bind_params(&self.statements.payload, &values)?;
        params.insert(self.statements.identity.placeholder(), id);

        self.provider
            .with_connection(|conn| conn.execute(sql, &params))
    }

    /// Delete the row with identity `id`
    ///
    /// Returns whether the statement ran without error, matched or not.
    pub fn delete(&self, id: i64) -> bool {
        match self.try_delete(id) {
            Ok(_) => true,
            Err(e) => {
                warn!("delete from {} failed: {}", self.binding.table(), e);
                false
            }
        }
    }

    pub fn try_delete(&self, id: i64) -> Result<usize> {
        let params = self.id_params(id);
        self.provider
            .with_connection(|conn| conn.execute(&self.statements.delete_by_id, &params))
    }

    // =========================================================================
    // Table lifecycle
    // =========================================================================

    /// Create the table with `sql`, or with the record's resolved statement
    pub fn create_table(&self, sql: Option<&str>) -> Result<()> {
        let resolved;
        let sql = match sql {
            Some(sql) => sql,
            None => {
                resolved = resolve_create_table_statement::<R>(
                    self.binding.table(),
                    self.provider.dialect(),
                )?;
                resolved.as_str()
            }
        };

        self.provider
            .with_connection(|conn| conn.execute(sql, &Params::new()))?;
        info!("Created table {}", self.binding.table());
        Ok(())
    }

    pub fn drop_table(&self) -> Result<()> {
        self.provider
            .with_connection(|conn| conn.execute(&self.statements.drop_table, &Params::new()))?;
        info!("Dropped table {}", self.binding.table());
        Ok(())
    }

    /// Remove every row, keeping the table
    pub fn delete_all_rows(&self) -> Result<usize> {
        self.provider
            .with_connection(|conn| conn.execute(&self.statements.delete_all, &Params::new()))
    }

    /// Drop, recreate and clear the table
    pub fn reset_table(&self) -> Result<()> {
        self.drop_table()?;
        self.create_table(None)?;
        self.delete_all_rows()?;
        info!("Reset table {}", self.binding.table());
        Ok(())
    }

    fn id_params(&self, id: i64) -> Params {
        Params::new().with_value(self.statements.identity.placeholder(), id)
    }

    fn fetch(&self, sql: &str, params: &Params) -> Result<Vec<R>> {
        let rows = self
            .provider
            .with_connection(|conn| conn.query(sql, params))?;
        rows.into_iter().map(from_row::<R>).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::testing::{Dvd, Movie};

    fn movie_repo(provider: &ConnectionProvider) -> TableRepository<'_, Movie> {
        let repo = TableRepository::<Movie>::new(provider).unwrap();
        repo.reset_table().unwrap();
        repo
    }

    fn seed_titles(repo: &TableRepository<'_, Movie>) {
        let mut movies = vec![
            Movie::new("Deadman", 5.0, None),
            Movie::new("Batman", 9.99, Some("action")),
            Movie::new("Superwoman", 7.5, Some("action")),
            Movie::new("Car", 3.0, Some("family")),
        ];
        assert_eq!(repo.insert_many(&mut movies), 4);
    }

    fn titles(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.title.as_str()).collect()
    }

    #[test]
    fn test_pop_scenario() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);

        let mut movie = Movie::new("pop", 8.01, None);
        let id = repo.insert(&mut movie);
        assert_eq!(id, 1);
        assert_eq!(movie.id, Some(1));

        let all = repo.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, Some(1));
        assert_eq!(all[0].title, "pop");
        assert_eq!(all[0].price, 8.01);
        assert_eq!(all[0].category, None);
    }

    #[test]
    fn test_insert_then_get_round_trip() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);

        let mut movie = Movie::new("Batman", 9.99, Some("action"));
        let id = repo.try_insert(&mut movie).unwrap();

        let found = repo.get_one_by_id(id).unwrap().unwrap();
        assert_eq!(found, movie);
    }

    #[test]
    fn test_get_one_by_id_missing() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);
        assert_eq!(repo.get_one_by_id(99).unwrap(), None);
        assert!(repo.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_update_then_get() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);

        let mut movie = Movie::new("Batman", 9.99, None);
        let id = repo.insert(&mut movie);

        movie.price = 4.5;
        movie.category = Some("classic".to_string());
        assert!(repo.update(&movie));

        let found = repo.get_one_by_id(id).unwrap().unwrap();
        assert_eq!(found.price, 4.5);
        assert_eq!(found.category.as_deref(), Some("classic"));
        assert_eq!(found.title, "Batman");
    }

    #[test]
    fn test_update_without_id() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);

        let movie = Movie::new("never stored", 1.0, None);
        assert!(matches!(repo.try_update(&movie), Err(Error::Mapping(_))));
        assert!(!repo.update(&movie));
    }

    #[test]
    fn test_delete_then_get() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);

        let mut movie = Movie::new("Deadman", 5.0, None);
        let id = repo.insert(&mut movie);
        assert!(repo.delete(id));
        assert_eq!(repo.get_one_by_id(id).unwrap(), None);

        // No match is still a successful statement
        assert!(repo.delete(id));
        assert_eq!(repo.try_delete(id).unwrap(), 0);
    }

    #[test]
    fn test_search_by_column() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);
        seed_titles(&repo);

        let found = repo.search_by_column("title", "man").unwrap();
        assert_eq!(titles(&found), vec!["Deadman", "Batman", "Superwoman"]);

        let found = repo.search_by_column("title", "Car").unwrap();
        assert_eq!(titles(&found), vec!["Car"]);

        assert!(repo.search_by_column("title", "zzz").unwrap().is_empty());
    }

    #[test]
    fn test_search_by_columns() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);
        seed_titles(&repo);

        let found = repo
            .search_by_columns(&["title", "category"], "fam")
            .unwrap();
        assert_eq!(titles(&found), vec!["Car"]);
    }

    #[test]
    fn test_unknown_column_runs_no_sql() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        // The table is never created, so any executed SQL would fail as a
        // database error rather than an invalid column.
        let repo = TableRepository::<Movie>::new(&provider).unwrap();

        match repo.search_by_column("title; DROP TABLE movie", "x") {
            Err(Error::InvalidColumn { table, column }) => {
                assert_eq!(table, "movie");
                assert_eq!(column, "title; DROP TABLE movie");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(!repo.table_exists().unwrap());
    }

    #[test]
    fn test_reset_table_is_idempotent() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);
        seed_titles(&repo);
        assert_eq!(repo.count().unwrap(), 4);

        repo.reset_table().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
        repo.reset_table().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.table_exists().unwrap());

        // Identities restart after the drop
        let mut movie = Movie::new("pop", 8.01, None);
        assert_eq!(repo.insert(&mut movie), 1);
    }

    #[test]
    fn test_insert_many_assigns_increasing_ids() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = movie_repo(&provider);

        let mut movies = vec![
            Movie::new("a", 1.0, None),
            Movie::new("b", 2.0, None),
            Movie::new("c", 3.0, None),
        ];
        assert_eq!(repo.insert_many(&mut movies), 3);

        let ids: Vec<i64> = movies.iter().filter_map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(titles(&repo.get_all().unwrap()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_many_continues_past_failure() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = TableRepository::<Movie>::new(&provider).unwrap();
        repo.create_table(Some(
            "CREATE TABLE movie (id INTEGER PRIMARY KEY AUTOINCREMENT, \
             title TEXT NOT NULL UNIQUE, price REAL, category TEXT)",
        ))
        .unwrap();

        let mut movies = vec![
            Movie::new("A", 1.0, None),
            Movie::new("A", 2.0, None),
            Movie::new("B", 3.0, None),
        ];
        assert_eq!(repo.insert_many(&mut movies), 2);

        let ids: Vec<Option<i64>> = movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![Some(1), None, Some(2)]);

        // The first insert stays committed and the last one still ran
        let stored = repo.get_all().unwrap();
        assert_eq!(titles(&stored), vec!["A", "B"]);
        assert_eq!(stored[0].price, 1.0);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_insert_failure_returns_sentinel() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = TableRepository::<Movie>::new(&provider).unwrap();

        let mut movie = Movie::new("no table yet", 1.0, None);
        assert_eq!(repo.insert(&mut movie), -1);
        assert_eq!(movie.id, None);
        match repo.try_insert(&mut movie) {
            Err(Error::Database { sql, .. }) => {
                assert!(sql.unwrap_or_default().starts_with("INSERT INTO"))
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_create_table_with_explicit_sql() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let repo = TableRepository::<Dvd>::with_config(
            &provider,
            &RepositoryConfig::default().with_table("dvds"),
        )
        .unwrap();

        repo.create_table(Some(
            "CREATE TABLE dvds (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, \
             category TEXT, price REAL, voteAverage REAL, numVotes INTEGER)",
        ))
        .unwrap();
        assert!(repo.table_exists().unwrap());

        let mut dvd = Dvd::new("Batman", "action", 9.99, 7.5, 1200);
        let id = repo.insert(&mut dvd);
        assert_eq!(repo.get_one_by_id(id).unwrap(), Some(dvd));
    }

    #[test]
    fn test_repositories_share_a_provider() {
        let provider = ConnectionProvider::open_in_memory().unwrap();
        let movies = movie_repo(&provider);
        let dvds = TableRepository::<Dvd>::new(&provider).unwrap();
        dvds.reset_table().unwrap();

        let mut movie = Movie::new("pop", 8.01, None);
        let mut dvd = Dvd::new("Car", "family", 3.0, 6.1, 40);
        assert_eq!(movies.insert(&mut movie), 1);
        assert_eq!(dvds.insert(&mut dvd), 1);
        assert_eq!(dvds.binding().table(), "dvd");
    }

    #[test]
    fn test_file_database_per_operation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.sqlite3");
        let provider =
            ConnectionProvider::connect(DatabaseConfig::sqlite(path.to_str().unwrap())).unwrap();
        let repo = movie_repo(&provider);

        let mut movie = Movie::new("pop", 8.01, None);
        let id = repo.insert(&mut movie);
        assert_eq!(id, 1);
        assert_eq!(repo.get_one_by_id(1).unwrap(), Some(movie));
    }
}
