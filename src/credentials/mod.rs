//! Bearer credential acquisition.
//!
//! The controller acquires one credential at startup from the credential
//! provider and hands it to the recognition client. There is no ambient
//! global store: the credential is owned by whoever needs it.
//!
//! ## Usage
//!
//! ```no_run
//! use voicecmd::config::CredentialConfig;
//! use voicecmd::credentials::CredentialManager;
//!
//! # async fn example() -> voicecmd::Result<()> {
//! let config = CredentialConfig {
//!     token_url: "https://tokens.example/issue".into(),
//!     ..CredentialConfig::default()
//! };
//! let manager = CredentialManager::new(&config)?;
//! let credential = manager.acquire().await?;
//! println!("{}", credential.bearer_header());
//! # Ok(())
//! # }
//! ```

mod provider;
mod types;

pub use provider::CredentialManager;
pub use types::Credential;
