//! `deployconf` - Deployment configuration loading and validation
//!
//! Reads a YAML file declaring the `binaries`, `sites`, `permissions` and
//! `acls` of a deployment, validates it against a fixed schema and exposes
//! the result as a queryable [`config::Config`].
//!
//! ```no_run
//! use deployconf::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("deploy.yml")?;
//! let php = config.binary("php")?;
//! if let Some(prod) = config.site("prod") {
//!     println!("{} deploys with {php}", prod.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
