use serde::Deserialize;

/// Login form fields (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginData {
    /// Build from decoded form pairs. The username is trimmed, the password
    /// is taken verbatim.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut data = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "username" => data.username = value.trim().to_string(),
                "password" => data.password = value,
                _ => {}
            }
        }
        data
    }

    pub fn has_missing_field(&self) -> bool {
        self.username.is_empty() || self.password.is_empty()
    }
}

/// Error codes carried in `?error=<code>` on the login and register pages.
///
/// The numeric value is what travels over the wire; the server resolves it
/// back to text when rendering the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    MissingInput = 1,
    InvalidInput = 2,
    UserExists = 3,
    BadCredentials = 4,
    CreateFailed = 5,
    Generic = 6,
}

impl AuthErrorCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::MissingInput),
            2 => Some(Self::InvalidInput),
            3 => Some(Self::UserExists),
            4 => Some(Self::BadCredentials),
            5 => Some(Self::CreateFailed),
            6 => Some(Self::Generic),
            _ => None,
        }
    }

    /// Parse the raw `error` query value. Garbage resolves to `None` so the
    /// page simply renders without a banner.
    pub fn from_query_value(raw: &str) -> Option<Self> {
        raw.trim().parse::<u8>().ok().and_then(Self::from_code)
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::MissingInput => "Please fill all the information input",
            Self::InvalidInput => "Please check the input",
            Self::UserExists => "An account with this username or email already exists",
            // Never say which of the two was wrong.
            Self::BadCredentials => "Username or password is not correct",
            Self::CreateFailed => "Fail to create new user",
            Self::Generic => "Something went wrong, please try again",
        }
    }
}
