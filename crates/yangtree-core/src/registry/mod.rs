//! Cross-module registries: identities and features

mod feature;
mod identity;
pub mod if_feature;

pub use feature::{Feature, FeatureRegistry, REMOVED_BY_IF_FEATURE};
pub use identity::{Identity, IdentityRegistry, IdentityRegistryBuilder, RegistryError};
pub use if_feature::{IfFeatureError, IfFeatureExpr};
