use std::env;
use std::path::PathBuf;

/// Process-level configuration, sourced from the environment (a `.env` file
/// is honored when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub media_root: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")?;
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));

        Ok(Self {
            database_url,
            jwt_secret,
            session_ttl_hours,
            media_root,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Tests in this module mutate process-wide environment variables and
    // must not run concurrently.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let _guard = ENV_LOCK.lock().unwrap();

        env::set_var("DATABASE_URL", "postgres://localhost/plateful");
        env::set_var("JWT_SECRET", "test-secret");
        env::remove_var("SESSION_TTL_HOURS");
        env::remove_var("MEDIA_ROOT");

        let config = Config::from_env().unwrap();
        assert_eq!(config.session_ttl_hours, 1);
        assert_eq!(config.media_root, PathBuf::from("media"));
    }

    #[test]
    fn explicit_vars_override_the_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();

        env::set_var("DATABASE_URL", "postgres://localhost/plateful");
        env::set_var("JWT_SECRET", "test-secret");
        env::set_var("SESSION_TTL_HOURS", "12");
        env::set_var("MEDIA_ROOT", "/srv/media");

        let config = Config::from_env().unwrap();
        assert_eq!(config.session_ttl_hours, 12);
        assert_eq!(config.media_root, PathBuf::from("/srv/media"));

        env::remove_var("SESSION_TTL_HOURS");
        env::remove_var("MEDIA_ROOT");
    }
}
