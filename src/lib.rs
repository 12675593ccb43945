use std::path::Path;

pub mod client;
pub mod config;
pub mod error;
pub mod handle;
pub mod lineage;
pub mod lockfile;
pub mod object;
pub mod registry;
pub mod resolver;

pub use error::RegistryError;
pub use object::{DeploymentRecord, Network, NetworkRegistry, Selector};
pub use registry::RegistryStore;
pub use resolver::{resolve, Resolution};

/// Load the deployment record that operations on `network` should target, from the local registry document
pub fn load_deployment<P: AsRef<Path>>(
    path: P,
    network: Network,
    selector: Selector,
) -> error::Result<DeploymentRecord> {
    RegistryStore::new(path).read(|registry| {
        resolve(registry, network, selector).map(|resolution| resolution.record.clone())
    })
}
