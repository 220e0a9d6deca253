pub mod access_policy;
pub mod auth;
pub mod gateway;
pub mod headers;
pub mod route_table;

pub use access_policy::AccessPolicy;
pub use auth::{IdentityClaims, TokenVerifier, VerificationError};
pub use gateway::GatewayService;
pub use route_table::{ResolvedRoute, RouteError, RouteTable};
