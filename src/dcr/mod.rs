//! FDX dynamic client registration: request validation, normalization, and
//! response rendering.

pub mod registration;
pub mod response;
pub mod rules;
pub mod types;

// Re-export frequently used items from each module
pub use registration::{CredentialIssuer, RegistrationValidator};
pub use types::{
    AllowedGrantType, ConsentDurationType, CoreClientMetadata, FdxClientMetadata, FdxScope,
    RegistrationRequest, RegistrationResponse, RegistryReference, TokenEndpointAuthMethod,
    is_acceptable_scope_token,
};
