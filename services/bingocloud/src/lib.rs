//! BingoCloud driver for stratus.
//!
//! BingoCloud speaks an EC2-flavored query API: every call is a signed
//! form-encoded POST answered with XML. [`Client`] owns the endpoint,
//! credentials and signing; [`Region`] hands out the resource adapters
//! (storages, disks, snapshots, load balancers, security groups, ...).
//!
//! ## Quick Start
//!
//! ```no_run
//! use stratus_bingocloud::{Client, Config};
//! use stratus_core::Context;
//! use stratus_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = Context::default().with_http_send(ReqwestHttpSend::default());
//!     let config = Config::new()
//!         .with_endpoint("http://198.51.100.10:8080/api")
//!         .with_access_key_id("your-access-key-id")
//!         .with_secret_access_key("your-secret-access-key");
//!
//!     let client = Client::new(config, ctx).await?;
//!     for region in client.regions() {
//!         println!("{}: {}", region.id(), region.name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Credential Sources
//!
//! [`Config::from_env`] fills unset fields from `BINGO_ENDPOINT`,
//! `BINGO_ACCESS_KEY_ID` and `BINGO_SECRET_ACCESS_KEY`.

mod constants;

mod config;
pub use config::Config;

mod client;
pub use client::Client;

mod response;

mod region;
pub use region::Region;

mod instance;

mod storage;
pub use storage::Storage;

mod disk;
pub use disk::Disk;

mod snapshot;
pub use snapshot::Snapshot;

mod instance_backup;
pub use instance_backup::InstanceBackup;

mod loadbalancer;
pub use loadbalancer::Loadbalancer;

mod loadbalancer_backend_group;
pub use loadbalancer_backend_group::BackendGroup;

mod loadbalancer_backend;
pub use loadbalancer_backend::Backend;

mod loadbalancer_cert;
pub use loadbalancer_cert::Certificate;

mod secgroup;
pub use secgroup::{SecurityGroup, SecurityGroupRule};

mod monitor;
