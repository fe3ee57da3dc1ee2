//! Session cookie settings read from the environment.
//!
//! Debug builds tolerate missing or malformed toggles (with a warning) so a
//! developer can start the server with no setup. Release builds refuse to
//! start unless every toggle is present and valid.

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Session settings derived from the environment.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build session settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use telemetry_backend::inbound::http::session_config::{
///     BuildMode, session_settings_from_env,
/// };
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
///
/// let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
/// assert!(settings.cookie_secure);
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = toggle(env, mode, COOKIE_SECURE_ENV, BOOL_EXPECTED, parse_bool, true)?;
    let default_same_site = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };
    let same_site = toggle(
        env,
        mode,
        SAMESITE_ENV,
        SAMESITE_EXPECTED,
        parse_same_site,
        default_same_site,
    )?;
    if same_site == SameSite::None && !cookie_secure {
        if mode.is_debug() {
            warn!("SESSION_SAMESITE=None with SESSION_COOKIE_SECURE=0; browsers may reject the cookie");
        } else {
            return Err(SessionConfigError::InsecureSameSiteNone);
        }
    }
    let allow_ephemeral = toggle(env, mode, ALLOW_EPHEMERAL_ENV, BOOL_EXPECTED, parse_bool, false)?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = session_key(env, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

/// Read one toggle. Debug builds fall back to `default`; release builds fail.
fn toggle<E: Env, T>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    expected: &'static str,
    parse: fn(&str) -> Option<T>,
    default: T,
) -> Result<T, SessionConfigError> {
    let Some(value) = env.string(name) else {
        if mode.is_debug() {
            warn!(variable = name, "not set; using default");
            return Ok(default);
        }
        return Err(SessionConfigError::MissingEnv { name });
    };
    match parse(&value) {
        Some(parsed) => Ok(parsed),
        None if mode.is_debug() => {
            warn!(variable = name, %value, "invalid value; using default");
            Ok(default)
        }
        None => Err(SessionConfigError::InvalidEnv {
            name,
            value,
            expected,
        }),
    }
}

fn session_key<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                if mode.is_debug() {
                    warn!(path = %path.display(), length, "session key too short; using temporary key");
                    return Ok(Key::generate());
                }
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead { path, source }),
    }
}

/// Short, non-reversible fingerprint of the signing key for startup logs.
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(digest.get(..8).unwrap_or_default())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Some(SameSite::Lax),
        "strict" => Some(SameSite::Strict),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::MockEnv;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct TempKeyFile {
        file: NamedTempFile,
    }

    impl TempKeyFile {
        fn new(len: usize) -> Self {
            let mut file = NamedTempFile::new().expect("create key file");
            file.write_all(&vec![b'a'; len]).expect("write key file");
            Self { file }
        }

        fn path_str(&self) -> String {
            self.file.path().to_str().expect("utf-8 temp path").to_owned()
        }
    }

    fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |key| vars.get(key).cloned());
        env
    }

    fn release_env(key: &TempKeyFile, overrides: &[(&'static str, &'static str)]) -> MockEnv {
        let key_path = key.path_str();
        let mut vars: Vec<(&str, &str)> = vec![
            (KEY_FILE_ENV, key_path.as_str()),
            (COOKIE_SECURE_ENV, "1"),
            (SAMESITE_ENV, "Strict"),
            (ALLOW_EPHEMERAL_ENV, "0"),
        ];
        for (name, value) in overrides {
            vars.retain(|(existing, _)| existing != name);
            vars.push((*name, *value));
        }
        mock_env(&vars)
    }

    #[rstest]
    fn release_accepts_complete_configuration() {
        let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
        let settings =
            session_settings_from_env(&release_env(&key, &[]), BuildMode::Release)
                .expect("valid release settings");
        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Strict);
    }

    #[rstest]
    #[case(COOKIE_SECURE_ENV, "maybe")]
    #[case(SAMESITE_ENV, "sideways")]
    #[case(ALLOW_EPHEMERAL_ENV, "perhaps")]
    fn release_rejects_invalid_toggles(#[case] name: &'static str, #[case] value: &'static str) {
        let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
        let err = session_settings_from_env(&release_env(&key, &[(name, value)]), BuildMode::Release)
            .err()
            .expect("invalid toggle");
        assert!(matches!(err, SessionConfigError::InvalidEnv { name: n, .. } if n == name));
    }

    #[rstest]
    fn release_rejects_missing_toggles() {
        let err = session_settings_from_env(&mock_env(&[]), BuildMode::Release)
            .err()
            .expect("missing toggle");
        assert!(matches!(
            err,
            SessionConfigError::MissingEnv { name: COOKIE_SECURE_ENV }
        ));
    }

    #[rstest]
    fn release_rejects_short_keys() {
        let key = TempKeyFile::new(8);
        let err = session_settings_from_env(&release_env(&key, &[]), BuildMode::Release)
            .err()
            .expect("short key");
        assert!(matches!(err, SessionConfigError::KeyTooShort { length: 8, .. }));
    }

    #[rstest]
    fn release_rejects_insecure_same_site_none() {
        let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
        let env = release_env(&key, &[(COOKIE_SECURE_ENV, "0"), (SAMESITE_ENV, "None")]);
        let err = session_settings_from_env(&env, BuildMode::Release)
            .err()
            .expect("insecure none");
        assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
    }

    #[rstest]
    fn release_rejects_ephemeral_keys() {
        let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
        let env = release_env(&key, &[(ALLOW_EPHEMERAL_ENV, "1")]);
        let err = session_settings_from_env(&env, BuildMode::Release)
            .err()
            .expect("ephemeral");
        assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
    }

    #[rstest]
    fn debug_falls_back_to_defaults() {
        let env = mock_env(&[
            (KEY_FILE_ENV, "/nonexistent/session-key"),
            (SAMESITE_ENV, "sideways"),
        ]);
        let settings =
            session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Lax);
    }

    #[rstest]
    fn fingerprint_is_sixteen_hex_chars() {
        let fp = key_fingerprint(&Key::generate());
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
