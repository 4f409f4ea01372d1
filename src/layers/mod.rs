pub mod authentication;

pub use self::authentication::{AuthenticationLayer, AuthenticationService};
