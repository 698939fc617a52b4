//! `USER_ID` login outcomes, grounded on `bancho/constants.py::LoginError`.

use std::fmt;

/// A negative `USER_ID` payload value on login is one of these instead of
/// an actual user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginError {
    AuthenticationError,
    UpdateNeeded,
    Restricted,
    NotActivated,
    ServerError,
    NeedSupporter,
    PasswordReset,
    VerificationNeeded,
}

impl LoginError {
    /// Returns `None` if `value` isn't one of the negative error codes
    /// (i.e. login actually succeeded and `value` is a real user id).
    pub fn from_user_id(value: i32) -> Option<Self> {
        Some(match value {
            -1 => Self::AuthenticationError,
            -2 => Self::UpdateNeeded,
            -3 => Self::Restricted,
            -4 => Self::NotActivated,
            -5 => Self::ServerError,
            -6 => Self::NeedSupporter,
            -7 => Self::PasswordReset,
            -8 => Self::VerificationNeeded,
            _ => return None,
        })
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AuthenticationError => {
                "Authentication failed. Please check your username/password!"
            }
            Self::UpdateNeeded => {
                "It seems like this version of osu! is too old. Please check for any updates!"
            }
            Self::Restricted => "You are banned.",
            Self::NotActivated => "Your account was either restricted or is not activated.",
            Self::ServerError => "A server error occured.",
            Self::NeedSupporter => "You need to be a supporter to use tourney clients.",
            Self::PasswordReset => "Your account password has been reset.",
            Self::VerificationNeeded => "",
        }
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for LoginError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_user_id_is_not_an_error() {
        assert_eq!(LoginError::from_user_id(1001), None);
    }

    #[test]
    fn negative_codes_map_to_errors() {
        assert_eq!(
            LoginError::from_user_id(-1),
            Some(LoginError::AuthenticationError)
        );
        assert_eq!(
            LoginError::from_user_id(-8),
            Some(LoginError::VerificationNeeded)
        );
    }
}
