//! Small host-management helpers used before and around a deployment.
//!
//! - [`size`]: human-readable byte sizes
//! - [`net`]: netmask conversion and DNS reachability probing
//! - [`yaml`]: YAML syntax validation of user-edited files
//! - [`users`]: local account lookups

pub mod net;
pub mod size;
pub mod users;
pub mod yaml;

pub use net::{check_dns, dns_ok, netmask_to_cidr, DEFAULT_PROBE_TIMEOUT};
pub use size::{bytes_to_human, SizeUnit};
pub use users::{current_user, home_dir_of, user_exists};
pub use yaml::valid_yaml;
