use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};

/// Compile-time permission requirement for [`crate::Authorized`].
pub trait RequiredPermission {
    /// Permission string the token must carry; empty means any verified token passes.
    const PERMISSION: &'static str;
}

/// A valid token is enough; no particular permission is checked.
#[derive(Debug, Clone, Copy)]
pub struct NoPermission;

impl RequiredPermission for NoPermission {
    const PERMISSION: &'static str = "";
}

/// Declare marker types implementing [`RequiredPermission`].
///
/// ```ignore
/// permissions! {
///     PostDrinks => "post:drinks",
/// }
/// ```
#[macro_export]
macro_rules! permissions {
    ($($(#[$meta:meta])* $name:ident => $value:literal),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl $crate::RequiredPermission for $name {
                const PERMISSION: &'static str = $value;
            }
        )+
    };
}

pub fn check_permissions(permission: &str, claims: &Claims) -> AuthResult<()> {
    let granted = claims
        .permissions
        .as_ref()
        .ok_or(AuthError::MissingPermissions)?;

    if permission.is_empty() || granted.contains(permission) {
        Ok(())
    } else {
        Err(AuthError::InvalidPermissions(permission.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn claims(value: Value) -> Claims {
        match value {
            Value::Object(map) => Claims::try_from(map).expect("claims"),
            other => panic!("expected object, got {other}"),
        }
    }

    crate::permissions! {
        DeleteDrinks => "delete:drinks",
    }

    #[test]
    fn missing_permissions_claim_is_400_regardless_of_requirement() {
        let claims = claims(json!({ "exp": 4_102_444_800i64 }));
        for required in ["", "get:drinks-detail"] {
            let err = check_permissions(required, &claims).unwrap_err();
            assert_eq!(err, AuthError::MissingPermissions);
            assert_eq!(err.status().as_u16(), 400);
            assert_eq!(err.code(), "missing_permissions");
        }
    }

    #[test]
    fn absent_permission_is_403() {
        let claims = claims(json!({
            "exp": 4_102_444_800i64,
            "permissions": ["get:drinks-detail"]
        }));
        let err = check_permissions(DeleteDrinks::PERMISSION, &claims).unwrap_err();
        assert_eq!(err.code(), "invalid_permissions");
        assert_eq!(err.status().as_u16(), 403);
    }

    #[test]
    fn present_or_empty_requirement_passes() {
        let claims = claims(json!({
            "exp": 4_102_444_800i64,
            "permissions": ["get:drinks-detail"]
        }));
        assert!(check_permissions("get:drinks-detail", &claims).is_ok());
        assert!(check_permissions(NoPermission::PERMISSION, &claims).is_ok());
    }
}
