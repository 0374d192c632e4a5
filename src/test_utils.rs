pub mod fixtures {
    use crate::{auth::Claims, models::domain::User};

    /// User whose id and username are both `user_id`.
    pub fn user(user_id: &str) -> User {
        let mut user = User::test_user(user_id);
        user.id = user_id.to_string();
        user
    }

    pub fn claims(user_id: &str) -> Claims {
        Claims::new(&user(user_id), 1)
    }

    pub fn staff_claims(user_id: &str) -> Claims {
        let mut user = user(user_id);
        user.is_staff = true;
        Claims::new(&user, 1)
    }
}

pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixture_ids_match_usernames() {
        let claims = claims("alice");
        assert_eq!(claims.user_id(), "alice");
        assert_eq!(claims.username, "alice");
        assert!(!claims.is_staff);
        assert!(staff_claims("mod").is_staff);
    }
}
