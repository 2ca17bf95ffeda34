//! Shared test helpers and behaviour tests for plugin discovery.

use std::path::Path;

use mockall::mock;

use crate::error::DiscoveryError;
use crate::introspect::Introspector;


mock! {
    pub Introspector {}
    impl Introspector for Introspector {
        fn introspect(&self, binary: &Path) -> Result<Vec<u8>, DiscoveryError>;
    }
}
