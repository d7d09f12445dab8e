// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub app_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    // Staff access configuration
    pub staff_emails: Vec<String>,
    pub admin_access_key: String,
    // Legacy form mirror (fire-and-forget sink, may be unset)
    pub legacy_form_endpoint: Option<String>,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let app_url = std::env::var("APP_URL").expect("APP_URL must be set");
        let admin_access_key =
            std::env::var("ADMIN_ACCESS_KEY").expect("ADMIN_ACCESS_KEY must be set");

        // Comma-separated allow-list of staff emails for the admin surface
        let staff_emails = std::env::var("STAFF_EMAILS")
            .unwrap_or_else(|_| "".to_string())
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect::<Vec<String>>();

        let legacy_form_endpoint = std::env::var("LEGACY_FORM_ENDPOINT").ok();

        Config {
            database_url,
            app_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port: 8000,
            staff_emails,
            admin_access_key,
            legacy_form_endpoint,
        }
    }
}
