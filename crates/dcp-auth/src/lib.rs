// crates/dcp-auth/src/lib.rs
//
// dcp-auth: bearer tokens for the submission service, minted from a
// service-account key.

pub mod key;
pub mod token;

pub use key::ServiceAccountKey;
pub use token::{
    audience_for, Claims, ServiceAccountTokenSource, StaticToken, DEV_AUDIENCE, PROD_AUDIENCE,
};
