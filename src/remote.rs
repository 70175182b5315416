use std::fmt::Display;

const HTTPS_PREFIX: &str = "https://";
const SSH_PREFIX: &str = "git@";

/// The transport of a remote URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    /// `https://<host>/<path>`
    Https,
    /// `git@<host>:<path>`
    Ssh,
    /// Every other form (`ssh://`, `file://`, local paths, etc.)
    Unsupported,
}

impl Transport {
    /// Classify the transport of a remote URL by its prefix.
    pub fn of(url: &str) -> Self {
        if url.starts_with(HTTPS_PREFIX) {
            Transport::Https
        } else if url.starts_with(SSH_PREFIX) {
            Transport::Ssh
        } else {
            Transport::Unsupported
        }
    }
}

impl Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Https => write!(f, "HTTPS"),
            Transport::Ssh => write!(f, "SSH"),
            Transport::Unsupported => write!(f, "unsupported transport"),
        }
    }
}

/// Rewrite the remote URL to the other transport, returns None if it is not possible.
///
/// `https://<host>/<path>` becomes `git@<host>:<path>` and the other way around.
/// The path is carried verbatim (including the `.git` suffix), so rewriting twice
/// results in the original URL.
pub fn to_alternate(url: &str) -> Option<String> {
    match Transport::of(url) {
        Transport::Https => https_to_ssh(url),
        Transport::Ssh => ssh_to_https(url),
        Transport::Unsupported => None,
    }
}

fn https_to_ssh(url: &str) -> Option<String> {
    let rest = url.strip_prefix(HTTPS_PREFIX)?;
    let (host, path) = rest.split_once('/')?;

    // Credentials or ports in the authority have no scp-like equivalent.
    if host.is_empty()
        || path.is_empty()
        || path.starts_with('/')
        || host.contains('@')
        || host.contains(':')
    {
        return None;
    }

    Some(format!("{SSH_PREFIX}{host}:{path}"))
}

fn ssh_to_https(url: &str) -> Option<String> {
    let rest = url.strip_prefix(SSH_PREFIX)?;
    let (host, path) = rest.split_once(':')?;

    if host.is_empty()
        || path.is_empty()
        || path.starts_with('/')
        || host.contains('/')
        || host.contains('@')
    {
        return None;
    }

    Some(format!("{HTTPS_PREFIX}{host}/{path}"))
}
