pub mod jwt_service;
pub mod opensearch_service;

pub use self::{
    jwt_service::{SigningAlgorithm, TokenIssuer, TokenValidator},
    opensearch_service::{OpenSearchClient, OpenSearchConfig},
};
