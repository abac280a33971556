//! Network helpers: netmask conversion and DNS reachability.

use std::net::Ipv4Addr;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Timeout applied to reachability probes when none is given.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Converts a dotted-quad netmask to its prefix length.
///
/// The result is the number of one-bits across all four octets, so
/// `255.255.255.0` gives `24`.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] if `netmask` is not a dotted quad.
pub fn netmask_to_cidr(netmask: &str) -> Result<u32> {
    let addr: Ipv4Addr = netmask
        .trim()
        .parse()
        .map_err(|_| Error::invalid_value(format!("'{netmask}' is not a dotted-quad netmask")))?;

    Ok(addr.octets().iter().map(|octet| octet.count_ones()).sum())
}

/// Checks whether `host_name` resolves, giving up after `timeout`.
///
/// A resolution that fails or does not finish in time counts as "not OK";
/// this function never errors. The lookup is abandoned when the timeout
/// fires.
pub async fn dns_ok(host_name: &str, timeout: Option<Duration>) -> bool {
    let timeout = timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT);

    match tokio::time::timeout(timeout, tokio::net::lookup_host((host_name, 0))).await {
        Ok(Ok(mut addrs)) => addrs.next().is_some(),
        Ok(Err(e)) => {
            trace!(host = %host_name, error = %e, "DNS lookup failed");
            false
        }
        Err(_) => {
            debug!(host = %host_name, timeout = ?timeout, "DNS lookup timed out");
            false
        }
    }
}

/// Returns the hosts that fail [`dns_ok`], sorted by name.
///
/// Lookups run concurrently; each one is bounded by `timeout`.
pub async fn check_dns<S: AsRef<str>>(host_list: &[S], timeout: Option<Duration>) -> Vec<String> {
    let probes = host_list.iter().map(|host| async move {
        let host = host.as_ref();
        (host, dns_ok(host, timeout).await)
    });

    let mut failed: Vec<String> = join_all(probes)
        .await
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(host, _)| host.to_string())
        .collect();

    failed.sort();
    failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_netmask_to_cidr() {
        assert_eq!(netmask_to_cidr("255.255.255.0").unwrap(), 24);
        assert_eq!(netmask_to_cidr("255.255.0.0").unwrap(), 16);
        assert_eq!(netmask_to_cidr("255.255.255.255").unwrap(), 32);
        assert_eq!(netmask_to_cidr("255.255.240.0").unwrap(), 20);
        assert_eq!(netmask_to_cidr("0.0.0.0").unwrap(), 0);
    }

    #[test]
    fn test_netmask_rejects_garbage() {
        assert!(netmask_to_cidr("255.255.255").is_err());
        assert!(netmask_to_cidr("255.255.256.0").is_err());
        assert!(netmask_to_cidr("mask").is_err());
    }

    #[tokio::test]
    async fn test_dns_ok_for_literal_address() {
        assert!(dns_ok("127.0.0.1", None).await);
    }

    #[tokio::test]
    async fn test_dns_fails_for_reserved_tld() {
        assert!(!dns_ok("copilot-probe.invalid", Some(Duration::from_secs(5))).await);
    }

    #[tokio::test]
    async fn test_check_dns_reports_sorted_failures() {
        let hosts = ["z.invalid", "127.0.0.1", "a.invalid"];
        let failed = check_dns(&hosts, Some(Duration::from_secs(5))).await;
        assert_eq!(failed, vec!["a.invalid", "z.invalid"]);
    }
}
