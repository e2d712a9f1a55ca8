//! Record types shared by the unit tests

use crate::record::{assign, Field, FieldType, Record};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Movie {
    pub id: Option<i64>,
    pub title: String,
    pub price: f64,
    pub category: Option<String>,
}

impl Movie {
    pub fn new(title: &str, price: f64, category: Option<&str>) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            price,
            category: category.map(str::to_string),
        }
    }
}

impl Record for Movie {
    const TYPE_NAME: &'static str = "Movie";
    const FIELDS: &'static [Field<Self>] = &[
        Field::new(
            "id",
            FieldType::Integer,
            |m: &Movie| m.id.into(),
            |m: &mut Movie, v| assign(&mut m.id, v),
        ),
        Field::new(
            "title",
            FieldType::Text,
            |m: &Movie| (&m.title).into(),
            |m: &mut Movie, v| assign(&mut m.title, v),
        ),
        Field::new(
            "price",
            FieldType::Float,
            |m: &Movie| m.price.into(),
            |m: &mut Movie, v| assign(&mut m.price, v),
        ),
        Field::new(
            "category",
            FieldType::Text,
            |m: &Movie| m.category.clone().into(),
            |m: &mut Movie, v| assign(&mut m.category, v),
        ),
    ];
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dvd {
    pub id: Option<i64>,
    pub title: String,
    pub category: String,
    pub price: f64,
    pub vote_average: f64,
    pub num_votes: i64,
}

impl Dvd {
    pub fn new(title: &str, category: &str, price: f64, vote_average: f64, num_votes: i64) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            category: category.to_string(),
            price,
            vote_average,
            num_votes,
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
            FieldType::Float,
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
