//! DVD Catalog Example
//!
//! Stores a small DVD catalog, lists it, and searches it by title or
//! category, the way a voting site's listing page would.
//!
//! # Configuration
//!
//! Connection settings come from `MYSQL_HOST`, `MYSQL_PORT`, `MYSQL_USER`,
//! `MYSQL_PASSWORD` and `MYSQL_DATABASE` (MySQL needs the `mysql` feature),
//! or `SQLITE_PATH`, read from the environment or a `.env` file. With none
//! set, an in-memory SQLite database is used.
//!
//! # Running
//!
//! ```bash
//! cargo run --example dvd_catalog
//! SQLITE_PATH=/tmp/evote.sqlite3 cargo run --example dvd_catalog
//! ```

use tablerepo::{
    assign, ConnectionProvider, DatabaseConfig, Field, FieldType, Record, RepositoryConfig,
    TableRepository,
};
use tracing::Level;

#[derive(Debug, Default, Clone)]
struct Dvd {
    id: Option<i64>,
    title: String,
    category: String,
    price: f64,
    /// 0 to 100
    vote_average: i64,
    num_votes: i64,
}

impl Dvd {
    fn new(title: &str, category: &str, price: f64, vote_average: i64, num_votes: i64) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            category: category.to_string(),
            price,
            vote_average,
            num_votes,
        }
    }

    /// Star rating shown next to each title
    fn stars(&self) -> &'static str {
        if self.num_votes < 1 {
            return "(no votes yet)";
        }
        match self.vote_average {
            v if v > 80 => "*****",
            v if v > 60 => "****",
            v if v > 45 => "***",
            v if v > 25 => "**",
            v if v > 10 => "*",
            _ => "half a star",
        }
    }
}

impl Record for Dvd {
    const TYPE_NAME: &'static str = "Dvd";
    const FIELDS: &'static [Field<Self>] = &[
        Field::new(
            "id",
            FieldType::Integer,
            |d: &Dvd| d.id.into(),
            |d: &mut Dvd, v| assign(&mut d.id, v),
        ),
        Field::new(
            "title",
            FieldType::Text,
            |d: &Dvd| (&d.title).into(),
            |d: &mut Dvd, v| assign(&mut d.title, v),
        ),
        Field::new(
            "category",
            FieldType::Text,
            |d: &Dvd| (&d.category).into(),
            |d: &mut Dvd, v| assign(&mut d.category, v),
        ),
        Field::new(
            "price",
            FieldType::Float,
            |d: &Dvd| d.price.into(),
            |d: &mut Dvd, v| assign(&mut d.price, v),
        ),
        Field::new(
            "voteAverage",
            FieldType::Integer,
            |d: &Dvd| d.vote_average.into(),
            |d: &mut Dvd, v| assign(&mut d.vote_average, v),
        ),
        Field::new(
            "numVotes",
            FieldType::Integer,
            |d: &Dvd| d.num_votes.into(),
            |d: &mut Dvd, v| assign(&mut d.num_votes, v),
        ),
    ];
}

/// The catalog table, plus the one query the generic repository lacks
struct DvdRepository<'a> {
    table: TableRepository<'a, Dvd>,
}

impl<'a> DvdRepository<'a> {
    fn new(provider: &'a ConnectionProvider) -> tablerepo::Result<Self> {
        let config = RepositoryConfig::default()
            .with_table("dvds")
            .with_qualifier("evote");
        Ok(Self {
            table: TableRepository::with_config(provider, &config)?,
        })
    }

    fn search_by_title_or_category(&self, text: &str) -> tablerepo::Result<Vec<Dvd>> {
        self.table.search_by_columns(&["title", "category"], text)
    }
}

fn print_dvds(dvds: &[Dvd]) {
    for dvd in dvds {
        println!(
            "   id = {:<3} title = {:<12} category = {:<8} price = {:>6.2}  {}",
            dvd.id.unwrap_or_default(),
            dvd.title,
            dvd.category,
            dvd.price,
            dvd.stars()
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    println!("=== DVD Catalog Example ===\n");

    let config = match DatabaseConfig::load(None) {
        Ok(config) => config,
        Err(e) => {
            println!("No database configured ({}), using in-memory SQLite\n", e);
            DatabaseConfig::in_memory()
        }
    };
    let provider = ConnectionProvider::connect(config)?;
    let repo = DvdRepository::new(&provider)?;

    println!("1. Resetting table '{}':", repo.table.table_name());
    repo.table.reset_table()?;

    println!("\n2. Stocking the catalog:");
    let mut dvds = vec![
        Dvd::new("Deadman", "western", 4.99, 72, 310),
        Dvd::new("Batman", "action", 9.99, 85, 1200),
        Dvd::new("Superwoman", "action", 7.50, 50, 95),
        Dvd::new("Car", "family", 3.00, 20, 0),
    ];
    let inserted = repo.table.insert_many(&mut dvds);
    println!("   Inserted {} of {} DVDs", inserted, dvds.len());

    println!("\n3. Full listing:");
    print_dvds(&repo.table.get_all()?);

    println!("\n4. Searching title or category for 'man':");
    print_dvds(&repo.search_by_title_or_category("man")?);

    println!("\n5. Repricing and removing:");
    if let Some(mut batman) = dvds.iter().find(|d| d.title == "Batman").cloned() {
        batman.price = 5.99;
        println!("   Updated Batman: {}", repo.table.update(&batman));
    }
    if let Some(id) = dvds.iter().find(|d| d.title == "Car").and_then(|d| d.id) {
        println!("   Deleted Car: {}", repo.table.delete(id));
    }
    print_dvds(&repo.table.get_all()?);

    println!("\n6. Rejected search column:");
    match repo.table.search_by_column("title; DROP TABLE dvds", "x") {
        Ok(_) => println!("   unexpectedly accepted"),
        Err(e) => println!("   {}", e),
    }

    println!("\n   {} DVDs remain", repo.table.count()?);
    println!("\n=== Example Complete ===");
    Ok(())
}
