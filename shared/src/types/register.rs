use serde::Deserialize;

/// Registration form fields (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegistrationData {
    /// Build from decoded form pairs. Username and email are trimmed,
    /// the password is taken verbatim.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut data = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "username" => data.username = value.trim().to_string(),
                "email" => data.email = value.trim().to_string(),
                "password" => data.password = value,
                _ => {}
            }
        }
        data
    }

    pub fn has_missing_field(&self) -> bool {
        self.username.is_empty() || self.email.is_empty() || self.password.is_empty()
    }
}
