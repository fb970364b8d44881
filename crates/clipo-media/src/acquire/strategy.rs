//! Access strategies tried by the acquisition chain.

use std::fmt;
use std::path::PathBuf;

/// Client identities tried without authentication, in order.
pub const CLIENT_PROFILES: [&str; 6] = ["android", "ios", "tv", "web", "mweb", "tv_embedded"];

/// Browsers whose session stores are borrowed, in order.
pub const BROWSERS: [&str; 3] = ["chrome", "edge", "firefox"];

/// Variants of the interactive device-authorization flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAuthVariant {
    /// OAuth device flow with the downloader's default client
    Default,
    /// OAuth device flow pinned to the TV client
    TvClient,
}

/// One way of reaching the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessStrategy {
    /// Authenticate with a cookie jar from disk
    StoredCredential { cookies: PathBuf },
    /// Unauthenticated request posing as a specific client
    ClientProfile(&'static str),
    /// Reuse a locally installed browser's session
    BrowserSession(&'static str),
    /// Operator completes a login challenge out of band
    DeviceAuthorization(DeviceAuthVariant),
}

impl AccessStrategy {
    /// Downloader arguments selecting this strategy.
    pub fn ytdlp_args(&self) -> Vec<String> {
        match self {
            AccessStrategy::StoredCredential { cookies } => vec![
                "--cookies".to_string(),
                cookies.to_string_lossy().to_string(),
            ],
            AccessStrategy::ClientProfile(client) => vec![
                "--extractor-args".to_string(),
                format!("youtube:player_client={}", client),
            ],
            AccessStrategy::BrowserSession(browser) => vec![
                "--cookies-from-browser".to_string(),
                browser.to_string(),
            ],
            AccessStrategy::DeviceAuthorization(variant) => {
                let mut args = vec![
                    "--username".to_string(),
                    "oauth2".to_string(),
                    "--password".to_string(),
                    String::new(),
                ];
                if *variant == DeviceAuthVariant::TvClient {
                    args.push("--extractor-args".to_string());
                    args.push("youtube:player_client=tv".to_string());
                }
                args
            }
        }
    }

    /// Needs a human to finish a login challenge.
    pub fn is_interactive(&self) -> bool {
        matches!(self, AccessStrategy::DeviceAuthorization(_))
    }
}

impl fmt::Display for AccessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessStrategy::StoredCredential { .. } => write!(f, "cookie file"),
            AccessStrategy::ClientProfile(client) => write!(f, "client {}", client),
            AccessStrategy::BrowserSession(browser) => write!(f, "browser {}", browser),
            AccessStrategy::DeviceAuthorization(DeviceAuthVariant::Default) => {
                write!(f, "device auth")
            }
            AccessStrategy::DeviceAuthorization(DeviceAuthVariant::TvClient) => {
                write!(f, "device auth (tv)")
            }
        }
    }
}

/// Phases of the chain, from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquisitionPhase {
    StoredCredential,
    MultiClient,
    BrowserSession,
    DeviceAuthorization,
}

impl AcquisitionPhase {
    pub const ALL: [AcquisitionPhase; 4] = [
        AcquisitionPhase::StoredCredential,
        AcquisitionPhase::MultiClient,
        AcquisitionPhase::BrowserSession,
        AcquisitionPhase::DeviceAuthorization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionPhase::StoredCredential => "stored_credential",
            AcquisitionPhase::MultiClient => "multi_client",
            AcquisitionPhase::BrowserSession => "browser_session",
            AcquisitionPhase::DeviceAuthorization => "device_authorization",
        }
    }

    /// 1-based position in the chain.
    pub fn number(&self) -> usize {
        match self {
            AcquisitionPhase::StoredCredential => 1,
            AcquisitionPhase::MultiClient => 2,
            AcquisitionPhase::BrowserSession => 3,
            AcquisitionPhase::DeviceAuthorization => 4,
        }
    }

    /// Strategies of this phase. The stored-credential phase needs a prepared cookie file.
    pub fn strategies(&self, cookies: Option<&PathBuf>) -> Vec<AccessStrategy> {
        match self {
            AcquisitionPhase::StoredCredential => cookies
                .map(|path| AccessStrategy::StoredCredential {
                    cookies: path.clone(),
                })
                .into_iter()
                .collect(),
            AcquisitionPhase::MultiClient => CLIENT_PROFILES
                .into_iter()
                .map(AccessStrategy::ClientProfile)
                .collect(),
            AcquisitionPhase::BrowserSession => BROWSERS
                .into_iter()
                .map(AccessStrategy::BrowserSession)
                .collect(),
            AcquisitionPhase::DeviceAuthorization => vec![
                AccessStrategy::DeviceAuthorization(DeviceAuthVariant::Default),
                AccessStrategy::DeviceAuthorization(DeviceAuthVariant::TvClient),
            ],
        }
    }
}

impl fmt::Display for AcquisitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_strategies() {
        assert!(AcquisitionPhase::StoredCredential.strategies(None).is_empty());
        let jar = PathBuf::from("/tmp/job/cookies.txt");
        assert_eq!(
            AcquisitionPhase::StoredCredential.strategies(Some(&jar)),
            vec![AccessStrategy::StoredCredential { cookies: jar.clone() }]
        );
        assert_eq!(AcquisitionPhase::MultiClient.strategies(None).len(), 6);
        assert_eq!(
            AcquisitionPhase::BrowserSession.strategies(None)[1],
            AccessStrategy::BrowserSession("edge")
        );
        assert_eq!(AcquisitionPhase::DeviceAuthorization.strategies(None).len(), 2);
    }

    #[test]
    fn test_strategy_args() {
        let args = AccessStrategy::ClientProfile("ios").ytdlp_args();
        assert_eq!(args, vec!["--extractor-args", "youtube:player_client=ios"]);

        let args = AccessStrategy::DeviceAuthorization(DeviceAuthVariant::TvClient).ytdlp_args();
        assert_eq!(args[1], "oauth2");
        assert!(args.contains(&"youtube:player_client=tv".to_string()));
        assert!(AccessStrategy::DeviceAuthorization(DeviceAuthVariant::Default).is_interactive());
        assert!(!AccessStrategy::BrowserSession("chrome").is_interactive());
    }
}
