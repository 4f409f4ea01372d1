pub mod claims;
pub mod errors;
pub mod search;
pub mod token;

pub use self::{
    claims::{Audience, Claims},
    errors::{DatastoreError, ErrorResponse, TokenError},
    search::{GetResponse, Hit, Hits, SearchResponse, Shards, TotalHits, WriteResponse},
    token::TokenPair,
};
