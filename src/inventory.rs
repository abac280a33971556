//! Host lists for playbook runs.
//!
//! Hosts are entered one per line. A line may end in an inclusive numeric
//! range such as `osd[1-3]`, which stands for `osd1`, `osd2` and `osd3`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Expands newline-separated host text into individual host names.
///
/// Blank lines are dropped. A line containing `[` is split into a prefix and
/// a bracketed `start-end` range, producing one host per integer in the range.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] when a bracketed range is malformed.
pub fn expand_hosts(host_text: &str) -> Result<Vec<String>> {
    let mut hosts = Vec::new();

    for line in host_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.find('[') {
            Some(bracket) => {
                let prefix = &line[..bracket];
                let (start, end) = parse_range(line, &line[bracket + 1..])?;
                hosts.extend((start..=end).map(|n| format!("{prefix}{n}")));
            }
            None => hosts.push(line.to_string()),
        }
    }

    Ok(hosts)
}

fn parse_range(line: &str, range: &str) -> Result<(u64, u64)> {
    let malformed = || Error::invalid_value(format!("malformed host range in '{line}'"));

    let body = range.strip_suffix(']').ok_or_else(malformed)?;
    let (start, end) = body.split_once('-').ok_or_else(malformed)?;
    let start: u64 = start.trim().parse().map_err(|_| malformed())?;
    let end: u64 = end.trim().parse().map_err(|_| malformed())?;

    Ok((start, end))
}

/// An ordered list of target hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostList {
    hosts: Vec<String>,
}

impl HostList {
    /// Creates a host list from already-expanded names, dropping repeats.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for host in hosts {
            list.push(host);
        }
        list
    }

    /// Parses newline-separated host text, expanding numeric ranges.
    pub fn parse(host_text: &str) -> Result<Self> {
        Ok(Self::new(expand_hosts(host_text)?))
    }

    /// Appends a host unless it is already present.
    pub fn push(&mut self, host: impl Into<String>) {
        let host = host.into();
        if !self.hosts.contains(&host) {
            self.hosts.push(host);
        }
    }

    /// Number of hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Iterates over the host names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    /// Host names as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.hosts
    }

    /// Renders the list as an inline inventory source (`a,b,`).
    ///
    /// The trailing comma is what marks the argument as a host list rather
    /// than an inventory path.
    pub fn inventory_arg(&self) -> String {
        let mut arg = self.hosts.join(",");
        arg.push(',');
        arg
    }
}

impl fmt::Display for HostList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hosts.join(", "))
    }
}

impl<'a> IntoIterator for &'a HostList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.iter()
    }
}

impl FromIterator<String> for HostList {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self::new(iter)
    }
}
